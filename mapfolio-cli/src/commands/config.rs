//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show`, and `config init`.

use std::path::Path;

use clap::Subcommand;
use mapfolio::config::{config_file_path, ConfigFile};

use crate::error::CliError;

const MASK: &str = "********";

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration with secrets masked
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand. `path` overrides the default file location.
pub fn run(
    command: ConfigCommands,
    config: &ConfigFile,
    path: Option<&Path>,
) -> Result<(), CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Path => run_path(&path),
        ConfigCommands::Show => run_show(config),
        ConfigCommands::Init { force } => run_init(&path, force),
    }
}

fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    if !path.exists() {
        println!("(file does not exist, defaults are in effect)");
    }
    Ok(())
}

fn run_show(config: &ConfigFile) -> Result<(), CliError> {
    print!("{}", masked(config).to_ini_string());
    Ok(())
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        )));
    }
    ConfigFile::default().save_to(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Copy of `config` with the listing token and API key replaced by a mask.
fn masked(config: &ConfigFile) -> ConfigFile {
    let mut shown = config.clone();
    if shown.listing.token.is_some() {
        shown.listing.token = Some(MASK.to_string());
    }
    if shown.geocoding.api_key.is_some() {
        shown.geocoding.api_key = Some(MASK.to_string());
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_masked_hides_secrets() {
        let mut config = ConfigFile::default();
        config.listing.token = Some("secret-token".to_string());
        config.geocoding.api_key = Some("secret-key".to_string());

        let text = masked(&config).to_ini_string();
        assert!(!text.contains("secret-token"));
        assert!(!text.contains("secret-key"));
        assert!(text.contains(MASK));
    }

    #[test]
    fn test_masked_leaves_unset_secrets_empty() {
        let shown = masked(&ConfigFile::default());
        assert!(shown.listing.token.is_none());
        assert!(shown.geocoding.api_key.is_none());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mapfolio").join("config.ini");

        run_init(&path, false).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());

        assert!(matches!(run_init(&path, false), Err(CliError::Config(_))));
        assert!(run_init(&path, true).is_ok());
    }
}
