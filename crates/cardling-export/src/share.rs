//! Shareable postcard links.
//!
//! A link carries the rendered postcard inside the URL fragment:
//! `{base}/#/view/{payload}`, where the payload is the JSON envelope
//! `{"cardling": "<data url>"}`, deflated and then encoded as unpadded
//! URL-safe base64.

use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use cardling_core::data_url;
use data_encoding::BASE64URL_NOPAD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Route prefix, inside the fragment, of the view page
pub const VIEW_ROUTE: &str = "#/view/";

/// Largest envelope a payload may inflate to
const MAX_ENVELOPE_BYTES: u64 = 16 * 1024 * 1024;

/// What a share link carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEnvelope {
    /// The rendered postcard as a `data:` URL
    pub cardling: String,
}

impl ShareEnvelope {
    /// Wrap a rendered SVG postcard
    pub fn from_svg(svg: &str) -> Self {
        Self {
            cardling: data_url::encode("image/svg+xml", svg.as_bytes()),
        }
    }

    /// MIME type and bytes of the embedded image
    pub fn image(&self) -> Result<(String, Vec<u8>)> {
        data_url::parse(&self.cardling).context("share link does not carry an image")
    }
}

/// Encode an envelope into a URL-safe payload
pub fn encode_payload(envelope: &ShareEnvelope) -> Result<String> {
    let json = serde_json::to_vec(envelope).context("encode share envelope")?;
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&json).context("compress share envelope")?;
    let compressed = encoder.finish().context("compress share envelope")?;
    debug!(json = json.len(), compressed = compressed.len(), "share envelope compressed");
    Ok(BASE64URL_NOPAD.encode(&compressed))
}

/// Decode a payload produced by [`encode_payload`]
pub fn decode_payload(payload: &str) -> Result<ShareEnvelope> {
    let compressed = BASE64URL_NOPAD
        .decode(payload.trim().as_bytes())
        .context("share payload is not valid base64")?;

    let mut json = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(MAX_ENVELOPE_BYTES + 1)
        .read_to_end(&mut json)
        .context("share payload is not compressed data")?;
    if json.len() as u64 > MAX_ENVELOPE_BYTES {
        bail!("share payload inflates past {MAX_ENVELOPE_BYTES} bytes");
    }

    serde_json::from_slice(&json).context("share payload is not a cardling envelope")
}

/// Build the full share link for `envelope`
pub fn share_link(base_url: &str, envelope: &ShareEnvelope) -> Result<String> {
    let payload = encode_payload(envelope)?;
    let link = format!("{}/{}{}", base_url.trim_end_matches('/'), VIEW_ROUTE, payload);
    debug!(len = link.len(), "share link built");
    Ok(link)
}

/// Extract the payload from a share link, or accept a bare payload
pub fn payload_from_link(link: &str) -> Result<&str> {
    let link = link.trim();
    let payload = match link.find(VIEW_ROUTE) {
        Some(at) => &link[at + VIEW_ROUTE.len()..],
        None if !link.contains('/') => link,
        None => bail!("not a cardling share link: missing {VIEW_ROUTE}"),
    };
    if payload.is_empty() {
        bail!("share link has an empty payload");
    }
    Ok(payload)
}

/// Decode the envelope a share link carries
pub fn open_link(link: &str) -> Result<ShareEnvelope> {
    decode_payload(payload_from_link(link)?)
}
