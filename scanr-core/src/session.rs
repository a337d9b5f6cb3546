//! The session controller: one scan in flight, one outcome per request.

use crate::device::{ColorMode, DeviceInfo, ScanConfig};
use crate::error::{Result, ScanError};
use crate::registry::DeviceRegistry;
use crate::scan;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Reported when the worker thread dies without sending an outcome.
const WORKER_DIED: &str = "scan worker terminated unexpectedly";

/// One scan order, constructed by a front-end and consumed exactly once.
#[derive(Clone, Debug)]
pub struct ScanRequest {
    /// Display label of the scanner to use, as produced by
    /// [`DeviceInfo::display_label`].
    pub device: String,
    /// Requested resolution in DPI.
    pub resolution: u32,
    /// Requested color mode.
    pub mode: ColorMode,
    /// Base name of the output file; the controller appends `.png` and
    /// resolves the result against the process working directory.
    pub output_name: String,
}

/// The terminal result of one scan attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The page was acquired and is durably on disk.
    Success,
    /// The attempt failed; `message` is the underlying error's description,
    /// suitable for showing to the user unchanged.
    Failure {
        /// Why the scan failed.
        message: String,
    },
}

enum SessionState {
    Idle,
    Scanning { outcome: mpsc::Receiver<ScanOutcome> },
}

/// Mediates between a front-end and the scan worker.
///
/// The controller owns the device registry and an explicit two-state session
/// model: `Idle` and `Scanning`. [`start_scan`](Self::start_scan) moves it to
/// `Scanning`; consuming the outcome through one of the `*_outcome` methods
/// moves it back. While `Scanning`, further `start_scan` calls fail with
/// [`ScanError::Busy`]; the gate is this state value, not a disabled button
/// in the UI, so programmatic callers cannot race past it.
///
/// There is no cancellation: once the worker's read loop has started it runs
/// to completion or failure. [`wait_outcome_timeout`](Self::wait_outcome_timeout)
/// bounds how long a caller waits, not how long the worker runs.
pub struct SessionController<R> {
    registry: R,
    state: SessionState,
}

impl<R: DeviceRegistry> SessionController<R> {
    /// Creates a controller over an owned registry.
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            state: SessionState::Idle,
        }
    }

    /// True while a worker is running and its outcome has not been consumed.
    pub fn is_scanning(&self) -> bool {
        matches!(self.state, SessionState::Scanning { .. })
    }

    /// Enumerates the registry's devices as identifying info, for menus and
    /// listings.
    pub fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let devices = self.registry.list_devices()?;
        Ok(devices.iter().map(|d| d.info().clone()).collect())
    }

    /// Validates `request` and starts the scan worker for it.
    ///
    /// Validation is synchronous and starts no worker: the output name must
    /// be non-empty and `request.device` must match the display label of a
    /// currently attached scanner. A fresh enumeration is taken per request,
    /// so a device plugged in after the controller was created is found.
    ///
    /// On success the matched device handle is moved onto a background
    /// thread, the controller transitions to `Scanning`, and `on_progress`
    /// is invoked from that thread with cumulative bytes read. The terminal
    /// outcome is retrieved with [`poll_outcome`](Self::poll_outcome),
    /// [`wait_outcome`](Self::wait_outcome), or
    /// [`wait_outcome_timeout`](Self::wait_outcome_timeout).
    ///
    /// # Errors
    ///
    /// [`ScanError::Busy`] while a previous outcome is pending,
    /// [`ScanError::EmptyOutputName`] and [`ScanError::DeviceNotFound`] for
    /// invalid requests, or the registry's own enumeration failure.
    pub fn start_scan<F>(&mut self, request: ScanRequest, on_progress: F) -> Result<()>
    where
        F: FnMut(u64) + Send + 'static,
    {
        if self.is_scanning() {
            return Err(ScanError::Busy);
        }
        if request.output_name.is_empty() {
            return Err(ScanError::EmptyOutputName);
        }

        let mut devices = self.registry.list_devices()?;
        let position = devices
            .iter()
            .position(|d| d.info().display_label() == request.device)
            .ok_or_else(|| ScanError::DeviceNotFound(request.device.clone()))?;
        let mut device = devices.swap_remove(position);

        let config = ScanConfig {
            resolution: request.resolution,
            color_mode: request.mode,
        };
        let output_path = output_path(&request.output_name);
        debug!(
            device = %request.device,
            path = %output_path.display(),
            "starting scan worker"
        );

        let (tx, rx) = mpsc::channel();
        // The worker is never joined; its lifetime is tracked through the
        // outcome channel.
        let _worker = thread::Builder::new()
            .name("scan-worker".to_string())
            .spawn(move || {
                let result = scan::run(&mut *device, &config, &output_path, || {}, on_progress);
                let outcome = match result {
                    Ok(_) => ScanOutcome::Success,
                    Err(e) => ScanOutcome::Failure {
                        message: e.to_string(),
                    },
                };
                // The receiver may already be gone if the controller was
                // dropped; the outcome is simply discarded then.
                tx.send(outcome).ok();
            })
            .map_err(|e| ScanError::acquisition(format!("failed to start scan worker: {e}")))?;

        self.state = SessionState::Scanning { outcome: rx };
        Ok(())
    }

    /// Returns the pending outcome without blocking.
    ///
    /// `None` while the controller is idle or the worker is still running.
    /// Returning `Some` consumes the outcome and moves the controller back
    /// to idle; every accepted request yields exactly one `Some` across the
    /// `*_outcome` methods.
    pub fn poll_outcome(&mut self) -> Option<ScanOutcome> {
        let SessionState::Scanning { outcome } = &self.state else {
            return None;
        };
        let received = match outcome.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => ScanOutcome::Failure {
                message: WORKER_DIED.to_string(),
            },
        };
        self.finish(received)
    }

    /// Blocks until the pending outcome arrives.
    ///
    /// `None` if the controller is idle. A hung device blocks this call
    /// indefinitely; use [`wait_outcome_timeout`](Self::wait_outcome_timeout)
    /// to bound the wait.
    pub fn wait_outcome(&mut self) -> Option<ScanOutcome> {
        let SessionState::Scanning { outcome } = &self.state else {
            return None;
        };
        let received = match outcome.recv() {
            Ok(outcome) => outcome,
            Err(_) => ScanOutcome::Failure {
                message: WORKER_DIED.to_string(),
            },
        };
        self.finish(received)
    }

    /// Blocks for at most `timeout` waiting for the pending outcome.
    ///
    /// On expiry returns `None` and stays in `Scanning`: the worker keeps
    /// running and its outcome can still be consumed later. Callers that
    /// give up on a stuck device abandon the controller rather than the
    /// worker being aborted.
    pub fn wait_outcome_timeout(&mut self, timeout: Duration) -> Option<ScanOutcome> {
        let SessionState::Scanning { outcome } = &self.state else {
            return None;
        };
        let received = match outcome.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => ScanOutcome::Failure {
                message: WORKER_DIED.to_string(),
            },
        };
        self.finish(received)
    }

    fn finish(&mut self, outcome: ScanOutcome) -> Option<ScanOutcome> {
        debug!(success = matches!(&outcome, ScanOutcome::Success), "scan finished");
        self.state = SessionState::Idle;
        Some(outcome)
    }
}

/// `<name>.png`, relative to the process working directory.
fn output_path(output_name: &str) -> PathBuf {
    PathBuf::from(format!("{output_name}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeDevice, FakeRegistry, Gate};
    use tempfile::tempdir;

    fn request(device: &str, resolution: u32, output_name: &str) -> ScanRequest {
        ScanRequest {
            device: device.to_string(),
            resolution,
            mode: ColorMode::Color,
            output_name: output_name.to_string(),
        }
    }

    #[test]
    fn empty_output_name_fails_before_any_session_is_opened() {
        let device = FakeDevice::named("Scanner-A").with_chunked_page(3);
        let sessions = device.session_count();
        let mut controller = SessionController::new(FakeRegistry::with_device(device));

        let err = controller
            .start_scan(request("Scanner-A", 300, ""), |_| {})
            .unwrap_err();

        assert!(matches!(err, ScanError::EmptyOutputName));
        assert_eq!(sessions.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(!controller.is_scanning());
    }

    #[test]
    fn unknown_device_fails_synchronously() {
        let device = FakeDevice::named("Scanner-A").with_chunked_page(3);
        let mut controller = SessionController::new(FakeRegistry::with_device(device));

        let err = controller
            .start_scan(request("Scanner-B", 300, "out"), |_| {})
            .unwrap_err();

        assert!(matches!(err, ScanError::DeviceNotFound(_)));
        assert!(err.to_string().contains("Scanner-B"));
        assert!(!controller.is_scanning());
    }

    #[test]
    fn a_valid_request_yields_exactly_one_success_and_one_file() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("testscan").to_string_lossy().to_string();
        let device = FakeDevice::named("Scanner-A").with_chunked_page(10);
        let mut controller = SessionController::new(FakeRegistry::with_device(device));

        controller
            .start_scan(request("Scanner-A", 300, &name), |_| {})
            .unwrap();
        assert!(controller.is_scanning());

        assert_eq!(controller.wait_outcome(), Some(ScanOutcome::Success));
        assert!(dir.path().join("testscan.png").exists());

        // The outcome was consumed; nothing further arrives.
        assert_eq!(controller.poll_outcome(), None);
        assert_eq!(controller.wait_outcome(), None);
        assert!(!controller.is_scanning());
    }

    #[test]
    fn an_option_rejection_reaches_the_caller_with_its_cause() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("rejected").to_string_lossy().to_string();
        let device = FakeDevice::named("Scanner-A").with_chunked_page(3);
        let mut controller = SessionController::new(FakeRegistry::with_device(device));

        controller
            .start_scan(request("Scanner-A", 5000, &name), |_| {})
            .unwrap();

        match controller.wait_outcome() {
            Some(ScanOutcome::Failure { message }) => {
                assert!(message.contains("5000"));
                assert!(message.contains("resolution"));
            }
            other => panic!("expected a failure, got {other:?}"),
        }
        assert!(!dir.path().join("rejected.png").exists());
        assert!(!controller.is_scanning());
    }

    #[test]
    fn zero_pages_fails_and_writes_no_file() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("empty").to_string_lossy().to_string();
        let device = FakeDevice::named("Scanner-A");
        let mut controller = SessionController::new(FakeRegistry::with_device(device));

        controller
            .start_scan(request("Scanner-A", 300, &name), |_| {})
            .unwrap();

        assert_eq!(
            controller.wait_outcome(),
            Some(ScanOutcome::Failure {
                message: "no image data".to_string()
            })
        );
        assert!(!dir.path().join("empty.png").exists());
    }

    #[test]
    fn a_second_request_is_rejected_while_one_is_in_flight() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("gated").to_string_lossy().to_string();
        let gate = Gate::default();
        let device = FakeDevice::named("Scanner-A")
            .with_chunked_page(3)
            .gated_by(gate.clone());
        let sessions = device.session_count();
        let mut controller = SessionController::new(FakeRegistry::with_device(device));

        controller
            .start_scan(request("Scanner-A", 300, &name), |_| {})
            .unwrap();

        let err = controller
            .start_scan(request("Scanner-A", 300, &name), |_| {})
            .unwrap_err();
        assert!(matches!(err, ScanError::Busy));

        gate.open();
        assert_eq!(controller.wait_outcome(), Some(ScanOutcome::Success));
        assert_eq!(sessions.load(std::sync::atomic::Ordering::SeqCst), 1);

        // Back to idle: the controller accepts a fresh request.
        controller
            .start_scan(request("Scanner-A", 300, &name), |_| {})
            .unwrap();
        assert_eq!(controller.wait_outcome(), Some(ScanOutcome::Success));
    }

    #[test]
    fn a_bounded_wait_expires_without_ending_the_session() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("slow").to_string_lossy().to_string();
        let gate = Gate::default();
        let device = FakeDevice::named("Scanner-A")
            .with_chunked_page(3)
            .gated_by(gate.clone());
        let mut controller = SessionController::new(FakeRegistry::with_device(device));

        controller
            .start_scan(request("Scanner-A", 300, &name), |_| {})
            .unwrap();

        assert_eq!(
            controller.wait_outcome_timeout(Duration::from_millis(20)),
            None
        );
        assert!(controller.is_scanning());

        gate.open();
        assert_eq!(controller.wait_outcome(), Some(ScanOutcome::Success));
    }

    #[test]
    fn a_dead_worker_is_reported_as_a_failure() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("dead").to_string_lossy().to_string();
        let device = FakeDevice::named("Scanner-A")
            .with_chunked_page(3)
            .panicking_on_read();
        let mut controller = SessionController::new(FakeRegistry::with_device(device));

        controller
            .start_scan(request("Scanner-A", 300, &name), |_| {})
            .unwrap();

        assert_eq!(
            controller.wait_outcome(),
            Some(ScanOutcome::Failure {
                message: WORKER_DIED.to_string()
            })
        );
        assert!(!controller.is_scanning());
    }

    #[test]
    fn progress_reaches_the_caller_from_the_worker_thread() {
        let dir = tempdir().unwrap();
        let name = dir.path().join("progress").to_string_lossy().to_string();
        let device = FakeDevice::named("Scanner-A").with_chunked_page(10);
        let mut controller = SessionController::new(FakeRegistry::with_device(device));

        let (tx, rx) = mpsc::channel();
        controller
            .start_scan(request("Scanner-A", 300, &name), move |bytes| {
                tx.send(bytes).ok();
            })
            .unwrap();

        assert_eq!(controller.wait_outcome(), Some(ScanOutcome::Success));
        let seen: Vec<u64> = rx.iter().collect();
        assert_eq!(seen.len(), 10);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn output_path_appends_the_png_extension() {
        assert_eq!(output_path("testscan"), PathBuf::from("testscan.png"));
    }
}
