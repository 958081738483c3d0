// config.rs
use cli_log::warn;
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Full configuration of a session, loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ollama model to use; the built-in default when absent.
    pub model: Option<String>,

    /// Number of rounds the environment is driven for.
    pub rounds: usize,

    /// Whether the operator review gate runs between rounds.
    pub review: bool,

    /// Enables extra startup output.
    pub debug: bool,

    /// The team roster.
    pub roles: Vec<RoleConfig>,
}

/// One configured role: a display name plus the preset it is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    pub name: String,
    pub preset: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: None,
            rounds: 5,
            review: true,
            debug: false,
            roles: vec![
                RoleConfig {
                    name: "Alice".to_string(),
                    preset: "product_manager".to_string(),
                },
                RoleConfig {
                    name: "Bob".to_string(),
                    preset: "architect".to_string(),
                },
                RoleConfig {
                    name: "Charlie".to_string(),
                    preset: "engineer".to_string(),
                },
                RoleConfig {
                    name: "Dana".to_string(),
                    preset: "qa".to_string(),
                },
            ],
        }
    }
}

impl Config {
    /// Loads a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Loads `path` when present, falling back to the built-in team on a
    /// missing or unreadable file.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("could not load {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
