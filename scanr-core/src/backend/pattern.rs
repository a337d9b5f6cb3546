//! A registry with one virtual scanner that renders a deterministic test
//! page, in the spirit of SANE's `test` backend.
//!
//! The virtual device validates options exactly like a hardware backend
//! would: resolutions outside the supported range, unknown modes, and
//! unrecognized option names are all rejected with a message. The rendered
//! page scales with the configured resolution, so the whole
//! configure/acquire/persist path can be exercised without a scanner
//! attached.

use crate::device::{ColorMode, DeviceInfo, MAX_RESOLUTION, MIN_RESOLUTION, ScanConfig};
use crate::error::{Result, ScanError};
use crate::page::{Page, PixelFormat};
use crate::registry::{
    DeviceRegistry, OPT_MODE, OPT_RESOLUTION, OptionValue, ScanDevice, ScanSession,
};

/// Simulated scan area, in inches.
const AREA_WIDTH_IN: u32 = 2;
/// Height is 14/5 inches, kept as a ratio so the math stays integral.
const AREA_HEIGHT_NUM: u32 = 14;
const AREA_HEIGHT_DEN: u32 = 5;

/// Pixel rows served per read chunk.
const CHUNK_ROWS: usize = 16;

/// Classic color bars, left to right.
const BARS: [[u8; 3]; 8] = [
    [255, 255, 255],
    [255, 255, 0],
    [0, 255, 255],
    [0, 255, 0],
    [255, 0, 255],
    [255, 0, 0],
    [0, 0, 255],
    [0, 0, 0],
];

/// The registry of virtual pattern scanners. Construction and `Drop` are the
/// whole subsystem lifecycle; there is nothing to initialize.
#[derive(Debug, Default)]
pub struct PatternRegistry;

impl PatternRegistry {
    /// Creates the registry.
    pub fn new() -> Self {
        Self
    }
}

impl DeviceRegistry for PatternRegistry {
    fn list_devices(&self) -> Result<Vec<Box<dyn ScanDevice>>> {
        Ok(vec![Box::new(PatternScanner::new())])
    }
}

/// The virtual scanner handed out by [`PatternRegistry`].
pub struct PatternScanner {
    info: DeviceInfo,
    config: ScanConfig,
}

impl PatternScanner {
    fn new() -> Self {
        Self {
            info: DeviceInfo {
                name: "pattern:virtual:0".to_string(),
                vendor: "scanr project".to_string(),
                model: "Pattern".to_string(),
            },
            config: ScanConfig::default(),
        }
    }

    fn page_geometry(&self) -> (u32, u32) {
        let width = self.config.resolution * AREA_WIDTH_IN;
        let height = self.config.resolution * AREA_HEIGHT_NUM / AREA_HEIGHT_DEN;
        (width, height)
    }

    fn render(&self) -> Page {
        let (width, height) = self.page_geometry();
        match self.config.color_mode {
            ColorMode::Color => {
                let mut data = Vec::with_capacity((width * height * 3) as usize);
                for _y in 0..height {
                    for x in 0..width {
                        let bar = (x as usize * BARS.len()) / width as usize;
                        data.extend_from_slice(&BARS[bar]);
                    }
                }
                Page {
                    width,
                    height,
                    format: PixelFormat::Rgb8,
                    data,
                }
            }
            ColorMode::Gray => {
                let mut data = Vec::with_capacity((width * height) as usize);
                for _y in 0..height {
                    for x in 0..width {
                        data.push((x * 255 / width.max(1)) as u8);
                    }
                }
                Page {
                    width,
                    height,
                    format: PixelFormat::Gray8,
                    data,
                }
            }
            ColorMode::Lineart => {
                // 1-bit output delivered as thresholded grayscale.
                let cell = (self.config.resolution / 25).max(1);
                let mut data = Vec::with_capacity((width * height) as usize);
                for y in 0..height {
                    for x in 0..width {
                        let dark = ((x / cell) + (y / cell)) % 2 == 0;
                        data.push(if dark { 0x00 } else { 0xFF });
                    }
                }
                Page {
                    width,
                    height,
                    format: PixelFormat::Gray8,
                    data,
                }
            }
        }
    }
}

impl ScanDevice for PatternScanner {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn set_option(&mut self, name: &str, value: OptionValue) -> Result<()> {
        match name {
            OPT_RESOLUTION => {
                let OptionValue::Int(dpi) = value else {
                    return Err(ScanError::configuration(name, "expects an integer value"));
                };
                if !(i64::from(MIN_RESOLUTION)..=i64::from(MAX_RESOLUTION)).contains(&dpi) {
                    return Err(ScanError::configuration(
                        name,
                        format!("{dpi} is out of range [{MIN_RESOLUTION}, {MAX_RESOLUTION}]"),
                    ));
                }
                self.config.resolution = dpi as u32;
                Ok(())
            }
            OPT_MODE => {
                let OptionValue::Str(mode) = value else {
                    return Err(ScanError::configuration(name, "expects a string value"));
                };
                self.config.color_mode = match mode.as_str() {
                    "Color" => ColorMode::Color,
                    "Gray" => ColorMode::Gray,
                    "Lineart" => ColorMode::Lineart,
                    other => {
                        return Err(ScanError::configuration(
                            name,
                            format!("unsupported mode '{other}'"),
                        ));
                    }
                };
                Ok(())
            }
            other => Err(ScanError::configuration(other, "unrecognized option")),
        }
    }

    // The pattern device has no feeder; a session yields one page whether or
    // not a batch was requested.
    fn begin_session(&mut self, _multiple: bool) -> Result<Box<dyn ScanSession + '_>> {
        let page = self.render();
        let row_bytes = page.width as usize * page.format.bytes_per_pixel();
        Ok(Box::new(PatternSession {
            data: page.data.clone(),
            chunk_len: row_bytes * CHUNK_ROWS,
            offset: 0,
            pages: vec![page],
        }))
    }
}

struct PatternSession {
    data: Vec<u8>,
    chunk_len: usize,
    offset: usize,
    pages: Vec<Page>,
}

impl ScanSession for PatternSession {
    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.offset >= self.data.len() {
            return Ok(None);
        }
        let end = (self.offset + self.chunk_len).min(self.data.len());
        let chunk = self.data[self.offset..end].to_vec();
        self.offset = end;
        Ok(Some(chunk))
    }

    fn take_pages(&mut self) -> Vec<Page> {
        std::mem::take(&mut self.pages)
    }
}
