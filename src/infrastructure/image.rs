//! Photo uploads: PNG/base64 encoding for the advice request and a small
//! colour thumbnail for the terminal preview.

use crate::domain::{EncodedImage, InputError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Downscaled RGB pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl Thumbnail {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels[(y * self.width + x) as usize]
    }
}

pub struct ImageCodec;

impl ImageCodec {
    /// Reads a jpg/jpeg/png file and re-encodes it as base64 PNG.
    pub fn encode_file(path: &str) -> Result<EncodedImage, InputError> {
        let path_ref = Path::new(path);
        let extension = path_ref
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(InputError::UnsupportedImage(path.to_string()));
        }

        let image = image::open(path_ref).map_err(|e| InputError::Image(e.to_string()))?;
        let file_name = path_ref
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(path)
            .to_string();

        Self::encode_image(file_name, &image)
    }

    pub fn encode_image(file_name: impl Into<String>, image: &DynamicImage) -> Result<EncodedImage, InputError> {
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| InputError::Image(e.to_string()))?;

        Ok(EncodedImage {
            file_name: file_name.into(),
            width: image.width(),
            height: image.height(),
            base64_png: STANDARD.encode(png.into_inner()),
        })
    }

    pub fn decode(encoded: &EncodedImage) -> Result<DynamicImage, InputError> {
        let bytes = STANDARD
            .decode(&encoded.base64_png)
            .map_err(|e| InputError::Image(e.to_string()))?;
        image::load_from_memory_with_format(&bytes, ImageFormat::Png).map_err(|e| InputError::Image(e.to_string()))
    }

    /// Fits the image into `max_width` x `max_height` pixels, keeping the aspect ratio.
    pub fn thumbnail(encoded: &EncodedImage, max_width: u32, max_height: u32) -> Result<Thumbnail, InputError> {
        let image = Self::decode(encoded)?;
        let small = image.thumbnail(max_width.max(1), max_height.max(1)).to_rgb8();

        Ok(Thumbnail {
            width: small.width(),
            height: small.height(),
            pixels: small.pixels().map(|pixel| pixel.0).collect(),
        })
    }
}
