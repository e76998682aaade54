use std::io::Cursor;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use qrcode::QrCode;

const QR_MIN_PX: u32 = 200;

pub fn qr_code_png(text: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(text.as_bytes()).context("encode qr code")?;
    let image = code
        .render::<image::Luma<u8>>()
        .min_dimensions(QR_MIN_PX, QR_MIN_PX)
        .build();
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .context("encode qr png")?;
    Ok(png)
}

pub fn qr_code_base64(text: &str) -> Result<String> {
    qr_code_png(text).map(|png| encode_base64(&png))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
