//! Modseal configuration
//!
//! Paths to the module directory and key files, plus signing parameters.
//! Stored as JSON; every field has a default relative to a base directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{DEFAULT_KEY_BITS, DEFAULT_MODULE_EXTENSION, DEFAULT_MODULE_NAME, MIN_KEY_BITS};

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.json";

/// Configuration directory under the user config dir
const CONFIG_DIR_NAME: &str = "modseal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModsealConfig {
    /// Directory holding the module files
    #[serde(default = "default_modules_dir")]
    pub modules_dir: PathBuf,

    /// PEM private key location
    #[serde(default = "default_private_key")]
    pub private_key: PathBuf,

    /// PEM public key location
    #[serde(default = "default_public_key")]
    pub public_key: PathBuf,

    /// Extension of module files, without the dot
    #[serde(default = "default_module_extension")]
    pub module_extension: String,

    /// Module served to rooms without a module of their own
    #[serde(default = "default_module_name")]
    pub default_module: String,

    /// RSA modulus size for newly generated keys
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,
}

fn default_modules_dir() -> PathBuf {
    PathBuf::from("modules")
}

fn default_private_key() -> PathBuf {
    PathBuf::from("private_key.pem")
}

fn default_public_key() -> PathBuf {
    PathBuf::from("public_key.pem")
}

fn default_module_extension() -> String {
    DEFAULT_MODULE_EXTENSION.to_string()
}

fn default_module_name() -> String {
    DEFAULT_MODULE_NAME.to_string()
}

fn default_key_bits() -> usize {
    DEFAULT_KEY_BITS
}

impl Default for ModsealConfig {
    fn default() -> Self {
        Self {
            modules_dir: default_modules_dir(),
            private_key: default_private_key(),
            public_key: default_public_key(),
            module_extension: default_module_extension(),
            default_module: default_module_name(),
            key_bits: default_key_bits(),
        }
    }
}

impl ModsealConfig {
    /// Defaults laid out under `root`: `modules/` next to the two PEM files
    pub fn with_root(root: &Path) -> Self {
        Self::default().rooted_at(root)
    }

    /// Resolve relative paths against `root`
    pub fn rooted_at(mut self, root: &Path) -> Self {
        self.modules_dir = root.join(&self.modules_dir);
        self.private_key = root.join(&self.private_key);
        self.public_key = root.join(&self.public_key);
        self
    }

    /// Get the user configuration file path
    pub fn discover() -> Option<PathBuf> {
        // Try XDG_CONFIG_HOME first, then the platform config dir
        if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg_config).join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
        }

        dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration from file
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let config = config.rooted_at(base);
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        crate::storage::write_atomic(path, content.as_bytes())
    }

    /// Reject settings no batch run could work with
    pub fn validate(&self) -> Result<()> {
        if self.key_bits < MIN_KEY_BITS {
            return Err(Error::Config(format!(
                "key_bits must be at least {}, got {}",
                MIN_KEY_BITS, self.key_bits
            )));
        }
        let extension = self.module_extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "invalid module_extension {:?}",
                self.module_extension
            )));
        }
        if !crate::resolver::is_valid_module_id(&self.default_module) {
            return Err(Error::Config(format!(
                "invalid default_module {:?}",
                self.default_module
            )));
        }
        Ok(())
    }

    /// Module extension without a leading dot
    pub fn extension(&self) -> &str {
        self.module_extension.trim_start_matches('.')
    }
}
