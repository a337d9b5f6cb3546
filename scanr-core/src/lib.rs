//! The core, UI-agnostic library for the `scanr` scanning utility.
//!
//! `scanr-core` is designed to be used as a library by any front-end, whether
//! it's a command-line interface (like `scanr`) or a graphical user
//! interface. It handles device enumeration, the scan-session lifecycle, and
//! persistence of the acquired image, over a pluggable device registry.
//!
//! The library is structured into several key modules:
//! - [`registry`]: The narrow contract a scanning backend implements.
//! - [`device`]: Device identity and the per-scan configuration.
//! - [`scan`]: Drives one scan attempt end-to-end.
//! - [`session`]: The session controller: one scan in flight, one terminal
//!   outcome per request, delivered off the caller's thread.
//! - [`backend`]: Built-in backends (the synthetic pattern scanner).
//! - [`capture`]: Fallback capture through an external scanner application.
//!
//! The scan worker blocks for the duration of the acquisition, so
//! interactive callers go through [`session::SessionController`], which runs
//! it on a background thread and reports progress via a callback, allowing
//! the calling application to display progress in any way it chooses.
//!
//! ## Example: Scanning a Page with Progress Reporting
//!
//! ```rust,no_run
//! use scanr_core::backend::pattern::PatternRegistry;
//! use scanr_core::device::ColorMode;
//! use scanr_core::session::{ScanOutcome, ScanRequest, SessionController};
//!
//! fn main() -> scanr_core::error::Result<()> {
//!     let mut controller = SessionController::new(PatternRegistry::new());
//!
//!     // A real app would build this from user input; device labels come
//!     // from `controller.devices()`.
//!     let request = ScanRequest {
//!         device: "Pattern".to_string(),
//!         resolution: 300,
//!         mode: ColorMode::Color,
//!         output_name: "page".to_string(),
//!     };
//!
//!     controller.start_scan(request, |bytes| {
//!         println!("{bytes} bytes acquired");
//!     })?;
//!
//!     match controller.wait_outcome() {
//!         Some(ScanOutcome::Success) => println!("saved page.png"),
//!         Some(ScanOutcome::Failure { message }) => eprintln!("scan failed: {message}"),
//!         None => {}
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod capture;
pub mod device;
pub mod error;
pub mod page;
pub mod registry;
pub mod scan;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;
