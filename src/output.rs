//! Startup banner: the shareable URL as text and as a scannable QR code.

use anyhow::{Context, Result};
use qrcode::render::unicode;
use qrcode::QrCode;

/// Renders `url` as a terminal QR code using half-height unicode blocks.
pub fn generate_qr(url: &str) -> Result<String> {
    let code = QrCode::new(url.as_bytes()).context("failed to generate QR code")?;

    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

/// Prints the advertised URL and its QR rendering. A QR failure is reported
/// but not fatal — the URL alone is enough to connect.
pub fn print_banner(url: &str) {
    println!("Listening on {url}");
    match generate_qr(url) {
        Ok(qr) => println!("{qr}"),
        Err(err) => eprintln!("failed to render QR code: {err}"),
    }
}
