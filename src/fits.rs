//! Minimal FITS signature checks
//!
//! A FITS file is a sequence of 2880-byte blocks. The primary header starts
//! with the 80-character card `SIMPLE  =                    T`. Only this
//! card is inspected; the rest of the file is treated as opaque bytes.

use crate::error::{Error, Result};

/// Size of a FITS logical record
pub const FITS_BLOCK_LEN: usize = 2880;

/// Size of a FITS header card
pub const FITS_CARD_LEN: usize = 80;

/// Keyword and value indicator at the start of every primary header
pub const FITS_SIGNATURE: &[u8] = b"SIMPLE  =";

/// Number of leading bytes needed to run every check in this module
pub const SNIFF_LEN: usize = FITS_BLOCK_LEN;

/// Returns true if the payload is an HTML page rather than binary data
///
/// Several archives answer HTTP 200 with an HTML error page, so the body is
/// sniffed in addition to the declared content type.
pub fn looks_like_html(head: &[u8], content_type: Option<&str>) -> bool {
    if content_type.is_some_and(|ct| {
        let ct = ct.to_ascii_lowercase();
        ct.starts_with("text/html") || ct.starts_with("application/xhtml")
    }) {
        return true;
    }

    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let body = &head[start..];
    let prefix = &body[..body.len().min(16)];
    let prefix = String::from_utf8_lossy(prefix).to_ascii_lowercase();
    prefix.starts_with("<!doctype")
        || prefix.starts_with("<html")
        || prefix.starts_with("<head")
        || prefix.starts_with("<body")
        || prefix.starts_with("<?xml")
}

/// Check that `head` begins with a conforming primary header card
///
/// # Errors
///
/// Returns [`Error::InvalidResponse`] if the signature is missing or `SIMPLE` is not `T`.
pub fn check_primary_header(head: &[u8]) -> Result<()> {
    if head.len() < FITS_CARD_LEN {
        return Err(Error::invalid_response(format!(
            "payload too short for a FITS header card ({} bytes)",
            head.len()
        )));
    }
    if !head.starts_with(FITS_SIGNATURE) {
        return Err(Error::invalid_response("missing FITS signature"));
    }

    // Fixed-format logical value sits in column 30
    let value = String::from_utf8_lossy(&head[FITS_SIGNATURE.len()..30]);
    if value.trim() != "T" {
        return Err(Error::invalid_response(format!(
            "primary header declares SIMPLE = {}",
            value.trim()
        )));
    }
    Ok(())
}

/// Check that a payload length can hold a FITS file
///
/// # Errors
///
/// Returns [`Error::InvalidResponse`] for payloads shorter than one block.
pub fn check_length(len: u64) -> Result<()> {
    if len < FITS_BLOCK_LEN as u64 {
        return Err(Error::invalid_response(format!(
            "payload of {len} bytes is smaller than one FITS block; the field likely has no data"
        )));
    }
    Ok(())
}
