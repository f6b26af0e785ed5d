//! CLI command implementations

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use modseal_core::{
    BatchProcessor, FileStatus, KeyBootstrap, KeyStore, ModsealConfig, SignReport, SignStatus,
    VerifyReport,
};

/// Modseal - signed script modules
#[derive(Parser, Debug)]
#[command(name = "modseal")]
#[command(about = "Sign and verify script modules with an inline RSA signature header")]
#[command(version)]
pub struct Cli {
    /// Operation to run; signs then verifies when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base directory for the default module and key locations
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// JSON configuration file (paths inside it are relative to the file)
    #[arg(long, global = true, conflicts_with = "root")]
    pub config: Option<PathBuf>,

    /// Override the modules directory
    #[arg(long, global = true)]
    pub modules_dir: Option<PathBuf>,

    /// Override the private key location
    #[arg(long, global = true)]
    pub private_key: Option<PathBuf>,

    /// Override the public key location
    #[arg(long, global = true)]
    pub public_key: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Sign all modules (creates a key pair if none exists)
    Sign,

    /// Verify the signatures of all modules
    Verify {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a new RSA key pair, replacing any existing one
    Keygen,

    /// Display the public key for sharing
    Pubkey,
}

/// Result of a command that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// At least one module was invalid or unsigned
    VerificationFailed,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::VerificationFailed => ExitCode::from(1),
        }
    }
}

/// Build the effective configuration: file (explicit or user-level), then overrides
pub fn resolve_config(cli: &Cli) -> anyhow::Result<ModsealConfig> {
    let mut config = match (&cli.config, &cli.root) {
        (Some(path), _) => ModsealConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        (None, Some(root)) => ModsealConfig::with_root(root),
        (None, None) => match ModsealConfig::discover().filter(|p| p.is_file()) {
            Some(path) => {
                debug!("Using user config {}", path.display());
                ModsealConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?
            }
            None => ModsealConfig::with_root(Path::new(".")),
        },
    };

    if let Some(dir) = &cli.modules_dir {
        config.modules_dir = dir.clone();
    }
    if let Some(path) = &cli.private_key {
        config.private_key = path.clone();
    }
    if let Some(path) = &cli.public_key {
        config.public_key = path.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Run the CLI, writing user-facing output to `out`
pub fn run(cli: &Cli, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let config = resolve_config(cli)?;
    let keys = KeyStore::from_config(&config)?;
    let batch = BatchProcessor::from_config(&config);

    match &cli.command {
        Some(Commands::Sign) => sign(&keys, &batch, out),
        Some(Commands::Verify { json }) => verify(&keys, &batch, *json, out),
        Some(Commands::Keygen) => keygen(&keys, out),
        Some(Commands::Pubkey) => pubkey(&keys, out),
        None => {
            writeln!(out, "=== SIGNING MODULES ===")?;
            sign(&keys, &batch, out)?;
            writeln!(out, "\n=== VERIFYING SIGNATURES ===")?;
            verify(&keys, &batch, false, out)
        }
    }
}

fn keygen(keys: &KeyStore, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let pair = keys.generate()?;
    writeln!(out, "Generated new RSA key pair:")?;
    writeln!(out, "  Private key: {}", keys.private_key_path().display())?;
    writeln!(out, "  Public key: {}", keys.public_key_path().display())?;
    writeln!(out, "  Fingerprint: {}", pair.public.fingerprint())?;
    Ok(Outcome::Success)
}

fn pubkey(keys: &KeyStore, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let public = keys.load_public()?;
    writeln!(out, "Public Key (share this for verification):")?;
    writeln!(out, "{}", "=".repeat(50))?;
    write!(out, "{}", public.to_pem()?)?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "Fingerprint (SHA-256): {}", public.fingerprint())?;
    Ok(Outcome::Success)
}

fn sign(keys: &KeyStore, batch: &BatchProcessor, out: &mut impl Write) -> anyhow::Result<Outcome> {
    match keys.ensure_key_exists()? {
        KeyBootstrap::Existing => {}
        KeyBootstrap::PublicRestored => {
            writeln!(out, "Restored public key: {}", keys.public_key_path().display())?;
        }
        KeyBootstrap::Generated => {
            writeln!(out, "Generated new RSA key pair:")?;
            writeln!(out, "  Private key: {}", keys.private_key_path().display())?;
            writeln!(out, "  Public key: {}", keys.public_key_path().display())?;
        }
    }

    let private = keys.load_private()?;
    let report = batch.sign_all(&private)?;
    write!(out, "{}", render_sign_report(&report, batch.modules_dir()))?;
    info!(
        signed = report.signed_count(),
        unchanged = report.unchanged_count(),
        "Signing finished"
    );
    Ok(Outcome::Success)
}

fn verify(
    keys: &KeyStore,
    batch: &BatchProcessor,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    let public = keys.load_public()?;
    let report = batch.verify_all(&public)?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(out, "{}", render_verify_report(&report, batch.modules_dir()))?;
    }

    Ok(if report.all_valid {
        Outcome::Success
    } else {
        Outcome::VerificationFailed
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Human-readable summary of a signing run
pub fn render_sign_report(report: &SignReport, modules_dir: &Path) -> String {
    if report.is_empty() {
        return format!("No module files found in {}\n", modules_dir.display());
    }

    let mut text = format!("Found {} module file(s) to sign:\n", report.files.len());
    for file in &report.files {
        let name = display_name(&file.path);
        match file.status {
            SignStatus::Signed => text.push_str(&format!("✓ Signed {}\n", name)),
            SignStatus::Unchanged => text.push_str(&format!("✓ {} already signed\n", name)),
        }
    }
    text.push_str(&format!(
        "\n✓ All {} files signed successfully!\n",
        report.files.len()
    ));
    text
}

/// Human-readable summary of a verification run
pub fn render_verify_report(report: &VerifyReport, modules_dir: &Path) -> String {
    if report.is_empty() {
        return format!("No module files found in {}\n", modules_dir.display());
    }

    let mut text = format!("Verifying {} module file(s):\n", report.files.len());
    for file in &report.files {
        let name = display_name(&file.path);
        let line = match file.status {
            FileStatus::Valid => format!("✓ {}: Signature valid\n", name),
            FileStatus::Invalid => format!("✗ {}: Signature invalid\n", name),
            FileStatus::Unsigned => format!("✗ {}: No signature found\n", name),
        };
        text.push_str(&line);
    }

    if report.all_valid {
        text.push_str(&format!(
            "\n✓ All {} files have valid signatures!\n",
            report.files.len()
        ));
    } else {
        let (_, invalid, unsigned) = report.count_by_status();
        text.push_str(&format!(
            "\n✗ Some files have invalid or missing signatures! ({} invalid, {} unsigned)\n",
            invalid, unsigned
        ));
    }
    text
}
