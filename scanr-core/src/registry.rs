//! The device-registry contract consumed by the core.
//!
//! A registry backend owns the scanning subsystem: it performs any
//! subsystem-wide initialization when constructed and tears it down in its
//! `Drop` impl, so holding a registry value is holding the subsystem.
//! The rest of the library only ever sees the narrow capability set below:
//! enumeration, per-device options, and chunked single-image acquisition.
//!
//! The built-in [`PatternRegistry`](crate::backend::pattern::PatternRegistry)
//! implements this contract against a synthetic device; hardware backends
//! implement it against their native APIs.

use crate::device::DeviceInfo;
use crate::error::Result;
use crate::page::Page;
use std::fmt;

/// Option name for the resolution setting, in DPI.
pub const OPT_RESOLUTION: &str = "resolution";
/// Option name for the color mode setting.
pub const OPT_MODE: &str = "mode";

/// A value passed to [`ScanDevice::set_option`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    /// An integer option, e.g. resolution.
    Int(i64),
    /// A string option, e.g. color mode.
    Str(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(v) => write!(f, "{v}"),
            OptionValue::Str(v) => f.write_str(v),
        }
    }
}

/// Enumerates attached scanners.
pub trait DeviceRegistry {
    /// Returns a handle for every scanner currently attached.
    ///
    /// May be called repeatedly; the order of the returned devices is
    /// backend-defined. Each returned handle owns its device for as long as
    /// the caller keeps it.
    fn list_devices(&self) -> Result<Vec<Box<dyn ScanDevice>>>;
}

/// One scanner, with a mutable option set and the ability to open
/// acquisition sessions.
///
/// Handles are `Send` so a scan worker can own one on a background thread.
pub trait ScanDevice: Send {
    /// Identifying strings for this device.
    fn info(&self) -> &DeviceInfo;

    /// Applies one option.
    ///
    /// Fails with a backend-defined message if `name` is unrecognized or
    /// `value` is out of range for this device.
    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()>;

    /// Opens an acquisition session.
    ///
    /// `multiple = false` instructs the device to produce exactly one
    /// logical image; `true` requests a batch (e.g. from a document feeder).
    fn begin_session(&mut self, multiple: bool) -> Result<Box<dyn ScanSession + '_>>;
}

/// One acquisition in progress against a device.
pub trait ScanSession {
    /// Pulls the next chunk of scan data.
    ///
    /// Returns `Ok(None)` when the device signals end-of-data for the
    /// current image; any other termination of the read loop is an error.
    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>>;

    /// Consumes the pages acquired so far.
    ///
    /// Called after [`read_chunk`](Self::read_chunk) has returned
    /// end-of-data; a session that completed without producing data returns
    /// an empty vector.
    fn take_pages(&mut self) -> Vec<Page>;
}
