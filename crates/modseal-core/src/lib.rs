//! Modseal Core - Signed script modules
//!
//! This crate protects a directory of dynamically-loaded script modules from
//! tampering. Each module carries its RSA signature inline as the first line:
//!
//! ```text
//! # Signature: <base64 PKCS#1 v1.5 / SHA-256 signature over the rest>
//! print('hi')
//! ```
//!
//! - [`keystore`] persists the RSA key pair as PEM files
//! - [`codec`] splits and re-embeds the signature header
//! - [`crypto`] signs and verifies module bodies
//! - [`batch`] drives signing and verification across a module directory
//! - [`resolver`] maps room identifiers to trusted modules for serving
//! - [`rooms`] holds per-room seating grids for the web front end

pub mod batch;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod lock;
pub mod resolver;
pub mod rooms;
pub mod storage;

pub use batch::{
    BatchProcessor, FileStatus, SignOutcome, SignReport, SignStatus, VerifyOutcome, VerifyReport,
};
pub use codec::{embed, extract, Extracted, SignedFile, SIGNATURE_PREFIX};
pub use config::ModsealConfig;
pub use crypto::{sign, verify, KeyPair, PrivateKey, PublicKey, Signature};
pub use error::{Error, Result};
pub use keystore::{KeyBootstrap, KeyStore};
pub use resolver::{ModuleLoader, ModuleResolver, TrustedModule};
pub use rooms::{RoomLayout, RoomStore, Seat};

/// Minimum accepted RSA modulus size in bits
pub const MIN_KEY_BITS: usize = 4096;

/// Default RSA modulus size in bits
pub const DEFAULT_KEY_BITS: usize = 4096;

/// Default module file extension (without the dot)
pub const DEFAULT_MODULE_EXTENSION: &str = "py";

/// Module served when a room has no module of its own
pub const DEFAULT_MODULE_NAME: &str = "default";
