//! `data:` URLs for embedded images.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    MissingScheme,

    #[error("only base64 data URLs are supported")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    Payload(String),
}

/// Encode bytes as a base64 `data:` URL
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 `data:` URL into its MIME type and decoded bytes
pub fn parse(url: &str) -> Result<(String, Vec<u8>), DataUrlError> {
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::MissingScheme)?;
    let (meta, payload) = rest.split_once(',').ok_or(DataUrlError::MissingScheme)?;
    let mime = meta.strip_suffix(";base64").ok_or(DataUrlError::NotBase64)?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| DataUrlError::Payload(e.to_string()))?;
    Ok((mime.to_string(), bytes))
}
