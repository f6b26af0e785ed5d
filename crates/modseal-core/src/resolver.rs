//! Module resolution for serving
//!
//! The web layer asks for a room's module by identifier. Rooms without a
//! module of their own get the default module. Nothing is handed out until
//! its signature has been checked.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::batch::{verify_module, FileStatus};
use crate::codec::SignedFile;
use crate::config::ModsealConfig;
use crate::crypto::PublicKey;
use crate::error::{Error, Result};

/// Room and module identifiers: ASCII letters, digits, `-` and `_`
pub fn is_valid_module_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Maps room identifiers to module files
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    modules_dir: PathBuf,
    extension: String,
    default_module: String,
}

impl ModuleResolver {
    pub fn new(modules_dir: PathBuf, extension: &str, default_module: &str) -> Self {
        Self {
            modules_dir,
            extension: extension.trim_start_matches('.').to_string(),
            default_module: default_module.to_string(),
        }
    }

    pub fn from_config(config: &ModsealConfig) -> Self {
        Self::new(
            config.modules_dir.clone(),
            config.extension(),
            &config.default_module,
        )
    }

    fn module_path(&self, id: &str) -> PathBuf {
        self.modules_dir.join(format!("{}.{}", id, self.extension))
    }

    /// Path of the module to serve for `room_id`
    pub fn resolve(&self, room_id: &str) -> Result<PathBuf> {
        if !is_valid_module_id(room_id) {
            return Err(Error::InvalidModuleId(room_id.to_string()));
        }

        let specific = self.module_path(room_id);
        if specific.is_file() {
            return Ok(specific);
        }

        let default_path = self.module_path(&self.default_module);
        if default_path.is_file() {
            debug!("No module for room {}, using default", room_id);
            return Ok(default_path);
        }

        Err(Error::ModuleNotFound {
            room_id: room_id.to_string(),
            default_path,
        })
    }
}

/// A module whose signature checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedModule {
    pub path: PathBuf,
    /// Module body with the signature header removed
    pub body: Vec<u8>,
}

impl TrustedModule {
    /// Body as text, if it is UTF-8
    pub fn source(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// Resolves and verifies modules before they are served
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    resolver: ModuleResolver,
    public_key: PublicKey,
}

impl ModuleLoader {
    pub fn new(resolver: ModuleResolver, public_key: PublicKey) -> Self {
        Self {
            resolver,
            public_key,
        }
    }

    /// Load the module for `room_id`, refusing anything that does not verify
    pub fn load(&self, room_id: &str) -> Result<TrustedModule> {
        let path = self.resolver.resolve(room_id)?;
        let file = SignedFile::read(&path)?;

        match verify_module(&file, &self.public_key) {
            FileStatus::Valid => Ok(TrustedModule {
                body: file.body().to_vec(),
                path,
            }),
            status => {
                warn!("Refusing to serve {} ({})", path.display(), status);
                Err(Error::UntrustedModule { path, status })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchProcessor;
    use crate::crypto::test_keys::pair;

    fn setup(files: &[(&str, &str)]) -> (tempfile::TempDir, ModuleResolver) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let resolver = ModuleResolver::new(dir.path().to_path_buf(), "py", "default");
        (dir, resolver)
    }

    #[test]
    fn test_module_ids() {
        assert!(is_valid_module_id("room-101_b"));
        for bad in ["", "..", "../etc/passwd", "a/b", "a\\b", "room.py", "räum"] {
            assert!(!is_valid_module_id(bad), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_resolve_specific_module() {
        let (dir, resolver) = setup(&[("lab1.py", ""), ("default.py", "")]);
        assert_eq!(resolver.resolve("lab1").unwrap(), dir.path().join("lab1.py"));
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let (dir, resolver) = setup(&[("default.py", "")]);
        assert_eq!(resolver.resolve("lab2").unwrap(), dir.path().join("default.py"));
    }

    #[test]
    fn test_resolve_without_default() {
        let (_dir, resolver) = setup(&[]);
        assert!(matches!(
            resolver.resolve("lab2"),
            Err(Error::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (_dir, resolver) = setup(&[("default.py", "")]);
        assert!(matches!(
            resolver.resolve("../secret"),
            Err(Error::InvalidModuleId(_))
        ));
    }

    #[test]
    fn test_loader_serves_only_valid_modules() {
        let (dir, resolver) = setup(&[("lab1.py", "print('lab')\n"), ("default.py", "print('default')\n")]);
        BatchProcessor::new(dir.path().to_path_buf(), "py")
            .sign_all(&pair(0).private)
            .unwrap();
        let loader = ModuleLoader::new(resolver, pair(0).public.clone());

        let module = loader.load("lab1").unwrap();
        assert_eq!(module.source(), Some("print('lab')\n"));

        let fallback = loader.load("unknown").unwrap();
        assert_eq!(fallback.body, b"print('default')\n");

        let signed = std::fs::read_to_string(dir.path().join("lab1.py")).unwrap();
        std::fs::write(dir.path().join("lab1.py"), signed.replace("print('lab')", "print('pwned')")).unwrap();
        assert!(matches!(
            loader.load("lab1"),
            Err(Error::UntrustedModule {
                status: FileStatus::Invalid,
                ..
            })
        ));

        std::fs::write(dir.path().join("lab1.py"), "print('lab')\n").unwrap();
        assert!(matches!(
            loader.load("lab1"),
            Err(Error::UntrustedModule {
                status: FileStatus::Unsigned,
                ..
            })
        ));
    }

    #[test]
    fn test_loader_rejects_foreign_key() {
        let (dir, resolver) = setup(&[("default.py", "x = 1\n")]);
        BatchProcessor::new(dir.path().to_path_buf(), "py")
            .sign_all(&pair(0).private)
            .unwrap();
        let loader = ModuleLoader::new(resolver, pair(1).public.clone());

        assert!(loader.load("any").is_err());
    }
}
