//! QR codes for share links

use anyhow::{Result, anyhow};
use qrcode::QrCode;
use qrcode::render::{svg, unicode};

/// Default rendered QR size in pixels
pub const QR_SIZE: u32 = 200;

fn encode(link: &str) -> Result<QrCode> {
    QrCode::new(link.as_bytes())
        .map_err(|e| anyhow!("cannot encode {} byte link as QR code: {e:?}", link.len()))
}

/// Render `link` as an SVG QR code at least `size` pixels square
pub fn qr_svg(link: &str, size: u32) -> Result<String> {
    let code = encode(link)?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(size, size)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

/// Render `link` as a QR code made of half-block characters for a terminal
pub fn qr_terminal(link: &str) -> Result<String> {
    let code = encode(link)?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_has_requested_size() {
        let svg = qr_svg("https://cardling.app/#/view/abc", QR_SIZE).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#000000"));
    }

    #[test]
    fn terminal_rendering_is_multiline() {
        let text = qr_terminal("hello").unwrap();
        assert!(text.lines().count() > 5);
    }

    #[test]
    fn oversized_links_are_errors() {
        let link = "x".repeat(8_000);
        assert!(qr_svg(&link, QR_SIZE).is_err());
    }
}
