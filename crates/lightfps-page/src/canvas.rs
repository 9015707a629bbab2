//! Raster canvas with origin tainting.

use std::io::Cursor;

use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::{PageError, PageResult};
use crate::resource::Resource;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// A decoded image. Animated formats keep only their first frame.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pixels: RgbaImage,
    cross_origin: bool,
}

impl LoadedImage {
    pub fn decode(bytes: &[u8], cross_origin: bool) -> PageResult<Self> {
        let img = image::load_from_memory(bytes).map_err(|e| PageError::Decode(e.to_string()))?;
        Ok(Self {
            pixels: img.to_rgba8(),
            cross_origin,
        })
    }

    pub fn from_resource(resource: &Resource) -> PageResult<Self> {
        Self::decode(&resource.bytes, resource.cross_origin)
    }

    pub fn natural_width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_cross_origin(&self) -> bool {
        self.cross_origin
    }
}

/// A 2D canvas. Drawing cross-origin pixels taints it permanently.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
    tainted: bool,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            tainted: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_tainted(&self) -> bool {
        self.tainted
    }

    /// Draw `image` with its top-left corner at `(x, y)`, clipped.
    pub fn draw_image(&mut self, image: &LoadedImage, x: i64, y: i64) {
        image::imageops::replace(&mut self.pixels, &image.pixels, x, y);
        if image.cross_origin {
            self.tainted = true;
        }
    }

    /// Export as a PNG data URL. Only PNG is produced; other MIME types fall
    /// back to PNG.
    pub fn to_data_url(&self, _mime: &str) -> PageResult<String> {
        if self.tainted {
            return Err(PageError::CanvasTainted);
        }
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.pixels.clone())
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| PageError::Encode(e.to_string()))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(buffer.into_inner());
        Ok(format!("{PNG_DATA_URL_PREFIX}{encoded}"))
    }
}

/// Decode a base64 `data:` URL back to bytes.
pub fn decode_data_url(url: &str) -> PageResult<Vec<u8>> {
    let (_, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .ok_or_else(|| PageError::Decode(format!("not a base64 data URL: {url:.32}")))?;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| PageError::Decode(e.to_string()))
}
