//! Batch signing and verification
//!
//! Drives the codec and the signer/verifier over every module in a directory.
//! Modules are the regular files directly inside the directory with the
//! configured extension, processed in path order.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codec::{self, SignedFile};
use crate::config::ModsealConfig;
use crate::crypto::{self, PrivateKey, PublicKey, Signature};
use crate::error::{Error, Result};
use crate::keystore::KeyStore;
use crate::lock::DirLock;
use crate::storage;

/// Verification state of one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Header present and signature matches the body
    Valid,
    /// Header present but the signature does not match (tampered or foreign key)
    Invalid,
    /// No signature header
    Unsigned,
}

impl FileStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, FileStatus::Valid)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileStatus::Valid => "valid",
            FileStatus::Invalid => "invalid",
            FileStatus::Unsigned => "unsigned",
        };
        f.write_str(name)
    }
}

/// Check a module file already in memory
pub fn verify_module(file: &SignedFile, key: &PublicKey) -> FileStatus {
    let extracted = file.extracted();
    match extracted.signature {
        None => FileStatus::Unsigned,
        Some(signature) if crypto::verify(extracted.body, &signature, key) => FileStatus::Valid,
        Some(_) => FileStatus::Invalid,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Per-file verification results plus the aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    pub files: Vec<VerifyOutcome>,
    /// True when every file is valid (and for an empty directory)
    pub all_valid: bool,
}

impl VerifyReport {
    pub fn new(files: Vec<VerifyOutcome>) -> Self {
        let all_valid = files.iter().all(|f| f.status.is_valid());
        Self { files, all_valid }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files that are invalid or unsigned
    pub fn failures(&self) -> impl Iterator<Item = &VerifyOutcome> {
        self.files.iter().filter(|f| !f.status.is_valid())
    }

    /// Status recorded for `path`, if it was part of the run
    pub fn status_of(&self, path: &Path) -> Option<FileStatus> {
        self.files.iter().find(|f| f.path == path).map(|f| f.status)
    }

    /// Count files by status (valid, invalid, unsigned)
    pub fn count_by_status(&self) -> (usize, usize, usize) {
        self.files.iter().fold((0, 0, 0), |(v, i, u), f| match f.status {
            FileStatus::Valid => (v + 1, i, u),
            FileStatus::Invalid => (v, i + 1, u),
            FileStatus::Unsigned => (v, i, u + 1),
        })
    }
}

/// What signing did to one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignStatus {
    /// File rewritten with a new header
    Signed,
    /// Header already matched; file left untouched
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOutcome {
    pub path: PathBuf,
    pub status: SignStatus,
    pub signature: Signature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignReport {
    pub files: Vec<SignOutcome>,
}

impl SignReport {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn signed_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == SignStatus::Signed)
            .count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.files.len() - self.signed_count()
    }
}

/// Signs and verifies every module in one directory
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    modules_dir: PathBuf,
    extension: String,
}

impl BatchProcessor {
    pub fn new(modules_dir: PathBuf, extension: &str) -> Self {
        Self {
            modules_dir,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn from_config(config: &ModsealConfig) -> Self {
        Self::new(config.modules_dir.clone(), config.extension())
    }

    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    /// List module files in path order.
    ///
    /// A directory that does not exist holds no modules.
    pub fn modules(&self) -> Result<Vec<PathBuf>> {
        if !self.modules_dir.exists() {
            debug!("{} does not exist", self.modules_dir.display());
            return Ok(Vec::new());
        }
        if !self.modules_dir.is_dir() {
            return Err(Error::NotADirectory(self.modules_dir.clone()));
        }

        let extension = OsStr::new(&self.extension);
        let mut modules = Vec::new();
        for entry in std::fs::read_dir(&self.modules_dir)? {
            let path = entry?.path();
            if path.extension() == Some(extension) && path.is_file() {
                modules.push(path);
            }
        }
        modules.sort();
        Ok(modules)
    }

    /// Sign every module with `key`.
    ///
    /// Any existing header is stripped before signing, so running this twice
    /// leaves every file byte-identical the second time. The directory lock
    /// is held from the first rewrite on; runs that rewrite nothing never
    /// take it.
    pub fn sign_all(&self, key: &PrivateKey) -> Result<SignReport> {
        let modules = self.modules()?;
        if modules.is_empty() {
            info!("No modules found in {}", self.modules_dir.display());
            return Ok(SignReport::default());
        }
        info!("Signing {} module(s) in {}", modules.len(), self.modules_dir.display());

        let mut lock = None;
        let mut report = SignReport::default();
        for path in modules {
            let (signature, update) = resign(&path, key)?;
            let status = match update {
                Some(content) => {
                    if lock.is_none() {
                        lock = Some(DirLock::acquire(&self.modules_dir)?);
                    }
                    storage::write_atomic(&path, &content)?;
                    SignStatus::Signed
                }
                None => SignStatus::Unchanged,
            };
            report.files.push(SignOutcome {
                path,
                status,
                signature,
            });
        }
        Ok(report)
    }

    /// Verify every module against `key`. Never modifies files.
    pub fn verify_all(&self, key: &PublicKey) -> Result<VerifyReport> {
        let modules = self.modules()?;
        info!("Verifying {} module(s) in {}", modules.len(), self.modules_dir.display());

        let mut outcomes = Vec::with_capacity(modules.len());
        for path in modules {
            let file = SignedFile::read(&path)?;
            let status = verify_module(&file, key);
            if status.is_valid() {
                debug!("{}: signature valid", file.name());
            } else {
                warn!("{}: {}", file.name(), status);
            }
            outcomes.push(VerifyOutcome { path, status });
        }

        let report = VerifyReport::new(outcomes);
        info!(all_valid = report.all_valid, "Verification finished");
        Ok(report)
    }

    /// Bootstrap keys if needed, then sign everything
    pub fn sign_with(&self, keys: &KeyStore) -> Result<SignReport> {
        keys.ensure_key_exists()?;
        let key = keys.load_private()?;
        self.sign_all(&key)
    }

    /// Verify everything against the stored public key
    pub fn verify_with(&self, keys: &KeyStore) -> Result<VerifyReport> {
        let key = keys.load_public()?;
        self.verify_all(&key)
    }
}

/// Compute the signature for `path` and the content to write, if any
fn resign(path: &Path, key: &PrivateKey) -> Result<(Signature, Option<Vec<u8>>)> {
    let file = SignedFile::read(path)?;
    let body = file.body();
    let signature = crypto::sign(body, key)?;
    let content = codec::embed(body, &signature);

    if content == file.content() {
        debug!("{}: already signed", file.name());
        Ok((signature, None))
    } else {
        debug!("{}: signing", file.name());
        Ok((signature, Some(content)))
    }
}
