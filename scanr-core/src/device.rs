use std::fmt;

/// Lowest resolution accepted for a scan, in DPI.
pub const MIN_RESOLUTION: u32 = 50;
/// Highest resolution accepted for a scan, in DPI.
pub const MAX_RESOLUTION: u32 = 1200;

/// Describes one scanner attached to the system.
///
/// This struct holds the identifying strings reported by a device registry
/// backend. It is populated by the backend's enumeration and consumed by the
/// front-end to build selection menus, via [`DeviceInfo::display_label`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    /// The backend-assigned device name (e.g., `genesys:libusb:001:004`).
    pub name: String,
    /// The hardware vendor, if the backend reports one.
    pub vendor: String,
    /// The hardware model, if the backend reports one.
    pub model: String,
}

impl DeviceInfo {
    /// The label shown to the user and used to address the device in a
    /// [`ScanRequest`](crate::session::ScanRequest).
    ///
    /// Prefers the model string; when the backend reports none, falls back to
    /// the last whitespace-separated token of the device name. The fallback
    /// keeps backend names like `Canon LiDE 220 flatbed scanner` addressable
    /// without exposing the full bus path.
    pub fn display_label(&self) -> String {
        if !self.model.is_empty() {
            return self.model.clone();
        }
        self.name
            .split_whitespace()
            .last()
            .unwrap_or(self.name.as_str())
            .to_string()
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vendor_info = if !self.vendor.is_empty() {
            format!(" ({})", self.vendor)
        } else {
            String::new()
        };

        write!(f, "{:<25}{} [{}]", self.display_label(), vendor_info, self.name)
    }
}

/// The color mode requested for an acquisition.
///
/// Rendered to the registry's string option values at the boundary, so the
/// rest of the library never handles free-form mode strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// 24-bit RGB.
    #[default]
    Color,
    /// 8-bit grayscale.
    Gray,
    /// 1-bit black and white.
    Lineart,
}

impl ColorMode {
    /// The string value understood by registry backends for this mode.
    pub fn option_value(self) -> &'static str {
        match self {
            ColorMode::Color => "Color",
            ColorMode::Gray => "Gray",
            ColorMode::Lineart => "Lineart",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_value())
    }
}

/// The per-scan device configuration applied before a session is opened.
///
/// Translated into individual `set_option` calls by the scan worker; backends
/// are free to reject values they cannot honor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    /// Requested resolution in DPI. The interactive front-end clamps this to
    /// [`MIN_RESOLUTION`]..=[`MAX_RESOLUTION`]; backends enforce their own
    /// limits for callers that bypass it.
    pub resolution: u32,
    /// Requested color mode.
    pub color_mode: ColorMode,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            resolution: 300,
            color_mode: ColorMode::Color,
        }
    }
}
