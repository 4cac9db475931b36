// src/resource.rs - Component names, models, per-call options and lifecycle
use crate::context::Context;
use crate::error::{DriverError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const NAMESPACE: &str = "erh";
pub const FAMILY: &str = "viam_gripper_gpio";

/// The component API a model implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Api {
    Gripper,
    Switch,
    Button,
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Api::Gripper => "gripper",
            Api::Switch => "switch",
            Api::Button => "button",
        };
        f.write_str(name)
    }
}

/// A fully qualified model triple, `namespace:family:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Model {
    pub namespace: String,
    pub family: String,
    pub name: String,
}

impl Model {
    /// A model in this module's family.
    pub fn in_family(name: &str) -> Self {
        Self {
            namespace: NAMESPACE.to_string(),
            family: FAMILY.to_string(),
            name: name.to_string(),
        }
    }

    /// Accepts either the full triple or a bare model name within this family.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [name] if !name.is_empty() => Ok(Self::in_family(name)),
            [ns, family, name] if !ns.is_empty() && !family.is_empty() && !name.is_empty() => Ok(Self {
                namespace: ns.to_string(),
                family: family.to_string(),
                name: name.to_string(),
            }),
            _ => Err(DriverError::UnknownModel(s.to_string())),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.family, self.name)
    }
}

pub fn gripper_model() -> Model {
    Model::in_family("gripper")
}

pub fn gripper_press_model() -> Model {
    Model::in_family("gripper-press")
}

pub fn switch_model() -> Model {
    Model::in_family("switch")
}

pub fn switch_one_of_model() -> Model {
    Model::in_family("switch-one-of")
}

pub fn button_model() -> Model {
    Model::in_family("button")
}

/// Typed per-call options.
///
/// The only recognised key is `force`: when set, `grab`/`open` skip the
/// already-there short circuit and replay the full pin sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Extra {
    #[serde(default)]
    pub force: bool,
}

impl Extra {
    pub fn forced() -> Self {
        Self { force: true }
    }

    /// Reads options from an opaque map. `force` counts only when it is
    /// literally `true`; other keys are ignored.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            force: matches!(map.get("force"), Some(Value::Bool(true))),
        }
    }

    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Self::from_map(map),
            _ => Self::default(),
        }
    }
}

/// Behaviour shared by every constructed component.
#[async_trait]
pub trait Resource: Send + Sync {
    fn name(&self) -> &str;

    async fn do_command(&mut self, _ctx: &Context, _cmd: &Value) -> Result<Value> {
        Ok(Value::Null)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_parse_and_display() {
        let model = Model::parse("erh:viam_gripper_gpio:gripper-press").unwrap();
        assert_eq!(model, gripper_press_model());
        assert_eq!(model.to_string(), "erh:viam_gripper_gpio:gripper-press");
        assert_eq!(Model::parse("button").unwrap(), button_model());
        assert!(Model::parse("erh::button").is_err());
        assert!(Model::parse("a:b").is_err());
    }

    #[test]
    fn test_force_requires_literal_true() {
        assert!(Extra::from_value(Some(&json!({"force": true}))).force);
        assert!(!Extra::from_value(Some(&json!({"force": "true"}))).force);
        assert!(!Extra::from_value(Some(&json!({"force": 1}))).force);
        assert!(!Extra::from_value(Some(&json!({}))).force);
        assert!(!Extra::from_value(None).force);
    }
}
