//! cardling-export: getting a postcard out of the editor.
//!
//! - [`svg`]: render a snapshot as a canvas-sized SVG image
//! - [`share`]: pack a rendered postcard into a share link and back
//! - [`qr`]: QR codes for share links

pub mod qr;
pub mod share;
pub mod svg;

pub use qr::{QR_SIZE, qr_svg, qr_terminal};
pub use share::{
    ShareEnvelope, VIEW_ROUTE, decode_payload, encode_payload, open_link, payload_from_link,
    share_link,
};
pub use svg::{export_svg, save_svg};
