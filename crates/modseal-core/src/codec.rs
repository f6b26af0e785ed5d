//! Signature header codec
//!
//! A signed module is laid out as a single header line followed by the body:
//!
//! ```text
//! # Signature: <base64>\n
//! <body bytes, preserved verbatim>
//! ```
//!
//! Header detection is a fixed-prefix check on the first line. A body whose
//! own first line starts with [`SIGNATURE_PREFIX`] is indistinguishable from
//! a signed file; changing that would change the on-disk format.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::crypto::Signature;
use crate::error::Result;

/// Literal prefix of the signature header line
pub const SIGNATURE_PREFIX: &str = "# Signature: ";

/// A module split into its optional header signature and its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<'a> {
    /// Signature text after the prefix, trailing whitespace removed
    pub signature: Option<Cow<'a, str>>,
    /// Every byte after the header line, or the whole input without a header
    pub body: &'a [u8],
}

/// Split raw module content into header signature and body.
///
/// Only the first line is ever considered. A header line that is the only
/// line of the file (no terminator) yields an empty body.
pub fn extract(raw: &[u8]) -> Extracted<'_> {
    let (first_line, rest) = match raw.iter().position(|&b| b == b'\n') {
        Some(newline) => (&raw[..newline], &raw[newline + 1..]),
        None => (raw, &raw[raw.len()..]),
    };

    match first_line.strip_prefix(SIGNATURE_PREFIX.as_bytes()) {
        Some(payload) => {
            let end = payload
                .iter()
                .rposition(|b| !b.is_ascii_whitespace())
                .map_or(0, |i| i + 1);
            Extracted {
                // Non-UTF-8 payloads become replacement characters, which can
                // never decode as base64, so such files simply fail to verify.
                signature: Some(String::from_utf8_lossy(&payload[..end])),
                body: rest,
            }
        }
        None => Extracted {
            signature: None,
            body: raw,
        },
    }
}

/// Prepend a signature header to `body`. The body is not transformed.
pub fn embed(body: &[u8], signature: &Signature) -> Vec<u8> {
    let mut content = Vec::with_capacity(SIGNATURE_PREFIX.len() + signature.len() + 1 + body.len());
    content.extend_from_slice(SIGNATURE_PREFIX.as_bytes());
    content.extend_from_slice(signature.as_str().as_bytes());
    content.push(b'\n');
    content.extend_from_slice(body);
    content
}

/// A module file read from disk
#[derive(Debug, Clone)]
pub struct SignedFile {
    path: PathBuf,
    content: Vec<u8>,
}

impl SignedFile {
    /// Read a module file
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Wrap content that is already in memory
    pub fn from_content(path: PathBuf, content: Vec<u8>) -> Self {
        Self { path, content }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw stored bytes, header included
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Header and body view of the content
    pub fn extracted(&self) -> Extracted<'_> {
        extract(&self.content)
    }

    /// Signature carried in the header, if any
    pub fn signature(&self) -> Option<Cow<'_, str>> {
        self.extracted().signature
    }

    /// Canonical body (stale header stripped)
    pub fn body(&self) -> &[u8] {
        self.extracted().body
    }

    /// File name for display
    pub fn name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.path.to_string_lossy())
    }
}
