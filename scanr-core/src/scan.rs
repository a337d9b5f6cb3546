//! Contains the logic for driving one scan attempt against a device.
use crate::device::ScanConfig;
use crate::error::{Result, ScanError};
use crate::registry::{OPT_MODE, OPT_RESOLUTION, OptionValue, ScanDevice};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Runs one scan against `device` and writes the first acquired page to
/// `output_path` as PNG.
///
/// This is the whole of a scan attempt: the configuration is applied, a
/// single-image session is opened, and the read loop pulls chunks until the
/// device signals end-of-data. The loop is where the long blocking I/O of a
/// scan happens, so callers that must stay responsive run this function on a
/// dedicated thread, as
/// [`SessionController`](crate::session::SessionController) does.
///
/// # Arguments
///
/// * `device` - The scanner to drive. Borrowed for the duration of the scan.
/// * `config` - Resolution and color mode to apply before acquiring.
/// * `output_path` - Where the PNG is written.
/// * `on_session_start` - Closure called once, after the options are applied
///   and the acquisition session is open.
/// * `on_progress` - Closure called after every chunk with the cumulative
///   number of bytes read so far. Scanners do not announce a total up front,
///   so there is no length callback to pair with it.
///
/// # Errors
///
/// This function returns an error if:
/// - The device rejects the resolution or mode option.
/// - The session cannot be opened, or the read loop fails mid-scan.
/// - The session yields zero pages ([`ScanError::NoImageData`]).
/// - The output path is not writable.
///
/// The first error wins; nothing is retried. No file is left behind unless
/// the page was written completely.
pub fn run<F>(
    device: &mut dyn ScanDevice,
    config: &ScanConfig,
    output_path: &Path,
    on_session_start: impl FnOnce(),
    mut on_progress: F,
) -> Result<PathBuf>
where
    F: FnMut(u64),
{
    device.set_option(OPT_RESOLUTION, OptionValue::Int(i64::from(config.resolution)))?;
    device.set_option(
        OPT_MODE,
        OptionValue::Str(config.color_mode.option_value().to_string()),
    )?;
    debug!(
        device = %device.info().display_label(),
        resolution = config.resolution,
        mode = %config.color_mode,
        "options applied"
    );

    let first_page = {
        let mut session = device.begin_session(false)?;
        on_session_start();

        let mut read_total: u64 = 0;
        while let Some(chunk) = session.read_chunk()? {
            read_total += chunk.len() as u64;
            on_progress(read_total);
        }
        debug!(bytes = read_total, "end of scan data");

        session.take_pages().into_iter().next()
    };

    let page = first_page.ok_or(ScanError::NoImageData)?;
    page.save_png(output_path)?;
    debug!(path = %output_path.display(), "page saved");

    Ok(output_path.to_path_buf())
}
