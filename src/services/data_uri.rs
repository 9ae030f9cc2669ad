// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Decoding of `data:<mime>;base64,<payload>` attachment URIs.

use crate::models::Attachment;
use base64::{engine::general_purpose::STANDARD, Engine as _};

const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, thiserror::Error)]
pub enum DataUriError {
    #[error("Invalid data URI")]
    Invalid,

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A decoded data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

/// Split a base64 data URI into its bytes and mime type.
///
/// The mime type is everything between `data:` and the first `;base64,`
/// and may be empty.
pub fn decode_data_uri(uri: &str) -> Result<DataUri, DataUriError> {
    let rest = uri.strip_prefix("data:").ok_or(DataUriError::Invalid)?;
    let (mime, payload) = rest.split_once(BASE64_MARKER).ok_or(DataUriError::Invalid)?;

    let data = STANDARD.decode(payload.trim())?;
    Ok(DataUri {
        mime: mime.to_string(),
        data,
    })
}

impl Attachment {
    /// Decode this attachment's URL as a data URI.
    pub fn decode(&self) -> Result<DataUri, DataUriError> {
        decode_data_uri(&self.url)
    }
}
