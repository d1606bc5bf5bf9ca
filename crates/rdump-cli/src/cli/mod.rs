//! CLI for rdump: one invocation, one backup.

use anyhow::{bail, Result};
use clap::Parser;
use rdump_core::config::{self, RdumpConfig};
use rdump_core::logging;
use rdump_core::observer::TracingObserver;
use rdump_core::session::{SessionOptions, WebSession};
use rdump_core::DumpRequest;
use std::path::{Path, PathBuf};

/// Retrieves a database dump from a Drupal site through the Backup and Migrate
/// quick backup form.
#[derive(Debug, Parser)]
#[command(name = "rdump", version)]
#[command(
    about = "Download a database dump from a Drupal Backup and Migrate page",
    long_about = None
)]
pub struct Cli {
    /// URL of the Backup and Migrate page (e.g. https://example.org/admin/config/system/backup_migrate).
    pub url: String,

    /// User name, used when the page asks for a login.
    #[arg(short, long, default_value = "")]
    pub user: String,

    /// Password, used when the page asks for a login.
    #[arg(short, long, default_value = "")]
    pub password: String,

    /// Existing directory the dump (and rdump.log) is written to.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output: PathBuf,

    /// No log file and no console output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file to use instead of ~/.config/rdump/config.toml.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        if !self.quiet {
            init_logging(&self.output);
        }

        let result = self.dump();
        if let Err(err) = &result {
            if err.downcast_ref::<rdump_core::DumpError>().is_none() {
                tracing::error!("{:#}", err);
            }
        }
        result
    }

    fn dump(&self) -> Result<()> {
        validate_output_dir(&self.output)?;
        let cfg = load_config(self.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        let browser = WebSession::new(SessionOptions::from(&cfg))?;
        let request = DumpRequest {
            url: self.url.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            output_dir: self.output.clone(),
        };
        let saved = rdump_core::run(browser, &request, &TracingObserver)?;

        tracing::info!(
            "successfully downloaded {} file(s) [{}] to {}",
            saved.len(),
            saved.join(", "),
            self.output.display()
        );
        for name in &saved {
            println!("{}", name);
        }
        Ok(())
    }
}

/// Log file in the output directory when possible, console only otherwise.
fn init_logging(output: &Path) {
    if output.is_dir() {
        match logging::init_logging(output) {
            Ok(_) => return,
            Err(e) => eprintln!("rdump: logging to console only: {:#}", e),
        }
    }
    if let Err(e) = logging::init_logging_stderr() {
        eprintln!("rdump: no logging available: {:#}", e);
    }
}

fn load_config(path: Option<&Path>) -> Result<RdumpConfig> {
    match path {
        Some(p) => config::load_from(p),
        None => config::load_or_init(),
    }
}

/// The output directory must already exist; it is never created.
pub(crate) fn validate_output_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        bail!("output directory {} does not exist", dir.display());
    }
    if !dir.is_dir() {
        bail!("output path {} is not a directory", dir.display());
    }
    Ok(())
}
