//! The acquired page and its persistence to disk.

use crate::error::{Result, ScanError};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Pixel layout of a [`Page`] buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// One byte per pixel, grayscale. Lineart backends deliver their
    /// thresholded output in this format as well.
    Gray8,
    /// Three bytes per pixel, RGB.
    Rgb8,
}

impl PixelFormat {
    /// Bytes used by one pixel in this format.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// One image retrieved from a scan session.
///
/// Pages live only for the duration of a scan attempt: the worker saves the
/// first page of the session and drops the rest.
#[derive(Clone, Debug)]
pub struct Page {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Layout of `data`.
    pub format: PixelFormat,
    /// Raw pixel bytes, row-major, no padding.
    pub data: Vec<u8>,
}

impl Page {
    fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Encodes the page as PNG at `path`.
    ///
    /// The file is flushed and fsynced before this returns, so a successful
    /// return means the image is durably on disk. On failure a partially
    /// written file is removed best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Persistence`] if the pixel buffer does not match
    /// the stated geometry, the path is not writable, or encoding fails.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        if self.data.len() != self.expected_len() {
            return Err(ScanError::persistence(
                path,
                format!(
                    "pixel buffer holds {} bytes, geometry requires {}",
                    self.data.len(),
                    self.expected_len()
                ),
            ));
        }

        let color_type = match self.format {
            PixelFormat::Gray8 => ExtendedColorType::L8,
            PixelFormat::Rgb8 => ExtendedColorType::Rgb8,
        };

        let file =
            File::create(path).map_err(|e| ScanError::persistence(path, e.to_string()))?;
        let mut writer = BufWriter::new(file);

        if let Err(e) = PngEncoder::new(&mut writer).write_image(
            &self.data,
            self.width,
            self.height,
            color_type,
        ) {
            drop(writer);
            std::fs::remove_file(path).ok();
            return Err(ScanError::persistence(path, e.to_string()));
        }

        if let Err(e) = writer.flush().and_then(|()| writer.get_ref().sync_all()) {
            drop(writer);
            std::fs::remove_file(path).ok();
            return Err(ScanError::persistence(path, e.to_string()));
        }

        Ok(())
    }
}
