use anyhow::{Result, anyhow};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use console::style;
use dialoguer::{Select, theme::ColorfulTheme};
use indicatif::{ProgressBar, ProgressStyle};
use scanr_core::backend::pattern::PatternRegistry;
use scanr_core::capture;
use scanr_core::device::{ColorMode, DeviceInfo, MAX_RESOLUTION, MIN_RESOLUTION};
use scanr_core::session::{ScanOutcome, ScanRequest, SessionController};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scanr")]
#[command(about = "A safe, interactive scanning tool", version)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a page interactively and save it as PNG
    Scan {
        /// Base name of the output file; `.png` is appended
        #[arg(required = true)]
        name: String,

        /// Resolution in DPI
        #[arg(
            short,
            long,
            default_value_t = 300,
            value_parser = clap::value_parser!(u32)
                .range(i64::from(MIN_RESOLUTION)..=i64::from(MAX_RESOLUTION))
        )]
        resolution: u32,

        /// Color mode
        #[arg(short, long, value_enum, default_value = "color")]
        mode: ModeArg,

        /// Use the scanner with this label instead of asking
        #[arg(short, long)]
        device: Option<String>,
    },
    /// List available scanners
    List,
    /// Launch an external scanner application and pick up its newest output
    Capture {
        /// The application to launch
        #[arg(required = true)]
        command: PathBuf,

        /// The directory the application saves into
        #[arg(required = true)]
        dir: PathBuf,
    },
}

/// Command-line spelling of the color modes.
#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Color,
    Gray,
    Lineart,
}

impl From<ModeArg> for ColorMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Color => ColorMode::Color,
            ModeArg::Gray => ColorMode::Gray,
            ModeArg::Lineart => ColorMode::Lineart,
        }
    }
}

/// Presents an interactive menu for the user to select a scanner.
fn select_device(devices: &[DeviceInfo], prompt: &str) -> Result<String> {
    if devices.is_empty() {
        return Err(anyhow!("No scanners found."));
    }

    let items: Vec<String> = devices.iter().map(|d| d.to_string()).collect();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact()?;

    Ok(devices[selection].display_label())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    match cli.command {
        Commands::Scan {
            name,
            resolution,
            mode,
            device,
        } => {
            let mut controller = SessionController::new(PatternRegistry::new());

            let devices = controller.devices()?;
            let label = match device {
                Some(label) => label,
                None => select_device(&devices, "Select a scanner")?,
            };
            let mode = ColorMode::from(mode);

            println!(
                "Scanning at {} DPI in {} mode.",
                style(resolution).cyan(),
                style(mode).cyan()
            );
            println!("  Scanner: {}", style(&label).cyan());
            println!("  Output:  {}", style(format!("{name}.png")).cyan());
            println!();

            // Scanners do not announce a total length up front, so progress
            // is a byte-counting spinner rather than a bar.
            let pb = ProgressBar::new_spinner();
            pb.set_prefix("Scanning");
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{prefix:12} [{elapsed_precise}] [{spinner}] {bytes} ({bytes_per_sec}) {msg}")
                    .unwrap(),
            );
            pb.enable_steady_tick(Duration::from_millis(100));

            let request = ScanRequest {
                device: label.clone(),
                resolution,
                mode,
                output_name: name.clone(),
            };
            let progress = pb.clone();
            let started = controller.start_scan(request, move |bytes| progress.set_position(bytes));
            if let Err(e) = started {
                pb.finish_and_clear();
                return Err(e.into());
            }

            let outcome = controller
                .wait_outcome()
                .ok_or_else(|| anyhow!("no scan in progress"))?;

            match outcome {
                ScanOutcome::Success => {
                    pb.finish_with_message("Scan complete.");
                    println!(
                        "\n✨ Saved {} from {}.",
                        style(format!("{name}.png")).cyan(),
                        style(&label).cyan()
                    );
                }
                ScanOutcome::Failure { message } => {
                    pb.finish_and_clear();
                    return Err(anyhow!(message));
                }
            }
        }
        Commands::List => {
            let controller = SessionController::new(PatternRegistry::new());
            let devices = controller.devices()?;
            if devices.is_empty() {
                println!("No scanners found.");
                return Ok(());
            }

            println!("Found {} scanners:", devices.len());
            println!(
                "\n  {:<20} {:<15} {:<20} {}",
                "LABEL", "VENDOR", "MODEL", "DEVICE"
            );
            println!("  {:-<20} {:-<15} {:-<20} {:-<25}", "", "", "", "");
            for info in devices {
                let vendor = if info.vendor.is_empty() { "-" } else { &info.vendor };
                let model = if info.model.is_empty() { "-" } else { &info.model };
                println!(
                    "  {:<20} {:<15} {:<20} {}",
                    info.display_label(),
                    vendor,
                    model,
                    info.name
                );
            }
        }
        Commands::Capture { command, dir } => {
            println!(
                "Launching {} and watching {}.",
                style(command.display()).cyan(),
                style(dir.display()).cyan()
            );

            let file = capture::run(&command, &dir)?;
            println!(
                "\n✨ Picked up the most recent capture: {}",
                style(file.display()).cyan()
            );
        }
    }

    Ok(())
}
