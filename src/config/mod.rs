use crate::hunk::DEFAULT_CONTEXT_LINES;
use crate::patch::DEFAULT_FUZZ_WINDOW;
use crate::render::RenderStyle;
use crate::review::ReviewMode;
use crate::tree::WalkPolicy;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE: &str = ".dap.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings that can live in a config file. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Unchanged lines around each hunk.
    pub context_lines: usize,
    /// How far (in lines) a hunk may have drifted and still be placed.
    pub fuzz_window: usize,
    /// Path substrings excluded from directory walks.
    pub ignore_paths: Vec<String>,
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    pub review: ReviewMode,
    pub style: RenderStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
            fuzz_window: DEFAULT_FUZZ_WINDOW,
            ignore_paths: vec![".git".to_string(), ".terraform".to_string()],
            include_hidden: false,
            follow_symlinks: false,
            review: ReviewMode::default(),
            style: RenderStyle::default(),
        }
    }
}

impl Config {
    /// Load `explicit` if given, else `.dap.toml` from the working directory
    /// if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Path::new(CONFIG_FILE);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn walk_policy(&self) -> WalkPolicy {
        WalkPolicy {
            include_hidden: self.include_hidden,
            follow_symlinks: self.follow_symlinks,
            ignore_substrings: self.ignore_paths.clone(),
        }
    }
}
