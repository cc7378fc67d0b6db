//! QR code rendering

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{imageops, ImageBuffer, ImageFormat, Rgb, RgbImage};
use qrcode::QrCode;

use crate::domain::DomainError;

/// Renders payloads as PNG QR codes in the dashboard palette
#[derive(Debug, Clone)]
pub struct QrRenderer {
    dark: Rgb<u8>,
    light: Rgb<u8>,
    module_size: u32,
    border_modules: u32,
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self {
            dark: Rgb([0x00, 0xff, 0x88]),
            light: Rgb([0x0a, 0x0f, 0x0a]),
            module_size: 10,
            border_modules: 5,
        }
    }
}

impl QrRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn render_image(&self, data: &str) -> Result<RgbImage, DomainError> {
        let code = QrCode::new(data.as_bytes())
            .map_err(|e| DomainError::validation(format!("Cannot encode QR payload: {}", e)))?;

        let symbol = code
            .render::<Rgb<u8>>()
            .dark_color(self.dark)
            .light_color(self.light)
            .module_dimensions(self.module_size, self.module_size)
            .quiet_zone(false)
            .build();

        let border = self.border_modules * self.module_size;
        let mut canvas: RgbImage = ImageBuffer::from_pixel(
            symbol.width() + 2 * border,
            symbol.height() + 2 * border,
            self.light,
        );
        imageops::overlay(&mut canvas, &symbol, i64::from(border), i64::from(border));

        Ok(canvas)
    }

    /// PNG bytes for `data`
    pub fn render_png(&self, data: &str) -> Result<Vec<u8>, DomainError> {
        let image = self.render_image(data)?;
        let mut buffer = Cursor::new(Vec::new());

        image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| DomainError::internal(format!("Failed to encode PNG: {}", e)))?;

        Ok(buffer.into_inner())
    }

    /// Base64-encoded PNG, for embedding in JSON
    pub fn render_base64(&self, data: &str) -> Result<String, DomainError> {
        Ok(STANDARD.encode(self.render_png(data)?))
    }
}
