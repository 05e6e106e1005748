//! Shared context for running CLI commands.

use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use esq_config::{Config, discover_config_files};
use tracing::debug;

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (may be default if no config files found).
    pub config: Config,
    /// Config files that contributed to `config`, highest precedence first.
    pub config_files: Vec<PathBuf>,
}

impl CommandContext {
    /// Loads the current directory and configuration.
    ///
    /// With `explicit` set, exactly that file is loaded and discovery is skipped.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        let config_files = match explicit {
            Some(path) => vec![path.to_path_buf()],
            None => discover_config_files(&cwd),
        };
        let config = load_config_or_failure(&config_files)?;
        debug!(
            files = config_files.len(),
            relations = config.relations.len(),
            "loaded configuration"
        );
        Ok(Self {
            cwd,
            config,
            config_files,
        })
    }

    /// Loads only the current directory, skipping configuration parsing.
    ///
    /// Used for `init`, which should work even when an existing config file is invalid.
    pub fn load_cwd_only() -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        Ok(Self {
            cwd,
            config: Config::default(),
            config_files: Vec::new(),
        })
    }
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}

/// Loads configuration from the given files or exits with an error.
fn load_config_or_failure(files: &[PathBuf]) -> Result<Config, ExitCode> {
    Config::load_from_files(files).map_err(|e| {
        eprintln!("error: failed to load configuration: {e}");
        ExitCode::FAILURE
    })
}
