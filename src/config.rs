//! # Module Configuration
//!
//! A module config file declares the boards available to the drivers and the
//! components to build on top of them.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [[board]]
//! name = "local"
//! pins = ["11", "13", "15", "16"]
//!
//! [[component]]
//! name = "press"
//! api = "gripper"
//! model = "erh:viam_gripper_gpio:gripper-press"
//!
//! [component.attributes]
//! board = "local"
//! grab_pins = { "11" = true }
//! open_pins = { "13" = true }
//! wait_pins = { "15" = false }
//! grab_time_ms = 1500
//! ```
//!
//! - `attributes` is decoded by the component's model into its typed config
//!   and validated there.
//! - A changed component is never patched in place; see `Host::reconfigure`.
//!
//! ## Example: Rust Usage
//!
//! ```rust
//! use gripper_gpio::config::ModuleConfig;
//! let toml_str = r#"
//! [[board]]
//! name = "local"
//! pins = ["8"]
//!
//! [[component]]
//! name = "door"
//! api = "button"
//! model = "button"
//! attributes = { board = "local", pin = "8" }
//! "#;
//! let config: ModuleConfig = toml::from_str(toml_str).unwrap();
//! assert_eq!(config.boards[0].pins, vec!["8".to_string()]);
//! assert_eq!(config.components[0].attributes["pin"].as_str(), Some("8"));
//! assert!(config.validate().is_ok());
//! ```

use crate::hardware::SimBoard;
use crate::resource::Api;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("duplicate {kind} name '{name}'")]
    Duplicate { kind: &'static str, name: String },
    #[error("{kind} name must not be empty")]
    EmptyName { kind: &'static str },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModuleConfig {
    #[serde(default, rename = "board")]
    pub boards: Vec<BoardConfig>,
    #[serde(default, rename = "component")]
    pub components: Vec<ComponentConfig>,
}

/// A simulated board exposing a fixed set of named pins.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoardConfig {
    pub name: String,
    #[serde(default)]
    pub pins: Vec<String>,
}

impl BoardConfig {
    pub fn build(&self) -> SimBoard {
        SimBoard::new(&self.name, self.pins.iter().cloned())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComponentConfig {
    pub name: String,
    pub api: Api,
    /// `namespace:family:name`, or a bare name from this module's family.
    pub model: String,
    #[serde(default)]
    pub attributes: toml::Table,
}

impl ModuleConfig {
    /// Structural checks only; component attributes are validated by their
    /// models at construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut boards = HashSet::new();
        for board in &self.boards {
            if board.name.is_empty() {
                return Err(ConfigError::EmptyName { kind: "board" });
            }
            if !boards.insert(board.name.as_str()) {
                return Err(ConfigError::Duplicate { kind: "board", name: board.name.clone() });
            }
        }
        let mut components = HashSet::new();
        for component in &self.components {
            if component.name.is_empty() {
                return Err(ConfigError::EmptyName { kind: "component" });
            }
            if !components.insert(component.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "component",
                    name: component.name.clone(),
                });
            }
        }
        Ok(())
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<ModuleConfig, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path.display(), e);
        ConfigError::Io(e)
    })?;
    let config: ModuleConfig = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_component_names_rejected() {
        let config: ModuleConfig = toml::from_str(
            r#"
            [[component]]
            name = "a"
            api = "switch"
            model = "switch"

            [[component]]
            name = "a"
            api = "button"
            model = "button"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Duplicate { kind: "component", .. })
        ));
    }

    #[test]
    fn test_unknown_api_is_parse_error() {
        let result: Result<ModuleConfig, _> = toml::from_str(
            r#"
            [[component]]
            name = "a"
            api = "arm"
            model = "switch"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_board_build_exposes_pins() {
        let board = BoardConfig { name: "local".into(), pins: vec!["1".into(), "2".into()] };
        assert_eq!(board.build().pin_names(), vec!["1".to_string(), "2".to_string()]);
    }
}
