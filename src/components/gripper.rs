// src/components/gripper.rs - Latching gripper: pins are set and left set
use super::{Component, Gripper, ValidateConfig};
use crate::context::Context;
use crate::error::{DriverError, Result};
use crate::geometry::{Geometry, GeometryConfig, parse_geometries};
use crate::hardware::{Board, Dependencies, GpioPin, resolve_pin};
use crate::resource::{Extra, Resource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GripperConfig {
    #[serde(default)]
    pub board: String,
    #[serde(default)]
    pub pin: String,
    /// Single pin mode: level that opens the gripper.
    #[serde(default)]
    pub open_high: bool,
    /// Pin name -> "high" | "low".
    #[serde(default)]
    pub grab_pins: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub open_pins: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub geometries: Vec<GeometryConfig>,
}

fn check_levels(path: &str, role: &str, pins: &BTreeMap<String, String>) -> Result<()> {
    for level in pins.values() {
        if level != "high" && level != "low" {
            return Err(DriverError::validation(path, format!("{role} must be 'high' or 'low'")));
        }
    }
    Ok(())
}

impl ValidateConfig for GripperConfig {
    fn validate(&self, path: &str) -> Result<Vec<String>> {
        if self.board.is_empty() {
            return Err(DriverError::required(path, "board"));
        }

        let grab_len = self.grab_pins.as_ref().map_or(0, |p| p.len());
        let open_len = self.open_pins.as_ref().map_or(0, |p| p.len());

        if self.pin.is_empty() && (self.grab_pins.is_none() || self.open_pins.is_none()) {
            return Err(DriverError::validation(
                path,
                "either pin or grab_pins and open_pins must be specified",
            ));
        }
        if !self.pin.is_empty() && (grab_len > 0 || open_len > 0) {
            return Err(DriverError::validation(
                path,
                "pin cannot be used with grab_pins, open_pins, or wait_pins",
            ));
        }
        if self.pin.is_empty() && grab_len == 0 {
            return Err(DriverError::validation(path, "grab_pins must not be empty"));
        }
        if self.pin.is_empty() && open_len == 0 {
            return Err(DriverError::validation(path, "open_pins must not be empty"));
        }
        if let Some(pins) = &self.grab_pins {
            check_levels(path, "grab_pins", pins)?;
        }
        if let Some(pins) = &self.open_pins {
            check_levels(path, "open_pins", pins)?;
        }
        Ok(vec![self.board.clone()])
    }
}

enum GripperPins {
    Single { pin: Arc<dyn GpioPin>, open_high: bool },
    Roles {
        grab: Vec<(Arc<dyn GpioPin>, bool)>,
        open: Vec<(Arc<dyn GpioPin>, bool)>,
    },
}

fn resolve_levels(
    board: &dyn Board,
    levels: Option<&BTreeMap<String, String>>,
) -> Result<Vec<(Arc<dyn GpioPin>, bool)>> {
    levels
        .into_iter()
        .flatten()
        .map(|(name, level)| Ok((resolve_pin(board, name)?, level == "high")))
        .collect()
}

pub struct GpioGripper {
    name: String,
    pins: GripperPins,
    geometries: Vec<Geometry>,
}

impl GpioGripper {
    pub fn new(name: &str, config: &GripperConfig, deps: &Dependencies) -> Result<Self> {
        let board = deps.board(&config.board)?;
        let pins = if !config.pin.is_empty() {
            GripperPins::Single {
                pin: resolve_pin(board.as_ref(), &config.pin)?,
                open_high: config.open_high,
            }
        } else {
            GripperPins::Roles {
                grab: resolve_levels(board.as_ref(), config.grab_pins.as_ref())?,
                open: resolve_levels(board.as_ref(), config.open_pins.as_ref())?,
            }
        };
        let geometries = parse_geometries(name, &config.geometries)?;
        tracing::info!("{}: gripper on board {}", name, config.board);
        Ok(Self {
            name: name.to_string(),
            pins,
            geometries,
        })
    }

    async fn apply(&self, ctx: &Context, opening: bool, extra: &Extra) -> Result<()> {
        match &self.pins {
            GripperPins::Single { pin, open_high } => {
                let high = if opening { *open_high } else { !*open_high };
                pin.set(ctx, high, extra).await?;
            }
            GripperPins::Roles { grab, open } => {
                let pins = if opening { open } else { grab };
                for (pin, high) in pins {
                    pin.set(ctx, *high, extra).await?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for GpioGripper {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Gripper for GpioGripper {
    async fn grab(&mut self, ctx: &Context, extra: &Extra) -> Result<bool> {
        tracing::debug!("{}: grab", self.name);
        self.apply(ctx, false, extra).await?;
        Ok(false)
    }

    async fn open(&mut self, ctx: &Context, extra: &Extra) -> Result<()> {
        tracing::debug!("{}: open", self.name);
        self.apply(ctx, true, extra).await
    }

    async fn geometries(&self, _ctx: &Context, _extra: &Extra) -> Result<Vec<Geometry>> {
        Ok(self.geometries.clone())
    }
}

pub fn construct(name: &str, config: &GripperConfig, deps: &Dependencies) -> Result<Component> {
    Ok(Component::Gripper(Box::new(GpioGripper::new(name, config, deps)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{PinWrite, SimBoard};

    fn roles(grab: &[(&str, &str)], open: &[(&str, &str)]) -> GripperConfig {
        let map = |pins: &[(&str, &str)]| -> Option<BTreeMap<String, String>> {
            Some(pins.iter().map(|(p, l)| (p.to_string(), l.to_string())).collect())
        };
        GripperConfig {
            board: "local".into(),
            grab_pins: map(grab),
            open_pins: map(open),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_level_strings() {
        let config = roles(&[("1", "high")], &[("2", "on")]);
        assert_eq!(
            config.validate("g").unwrap_err().to_string(),
            "g: open_pins must be 'high' or 'low'"
        );
        assert!(roles(&[("1", "high")], &[("2", "low")]).validate("g").is_ok());
    }

    #[test]
    fn test_validate_needs_both_maps_present() {
        let mut config = roles(&[("1", "high")], &[]);
        config.open_pins = None;
        assert_eq!(
            config.validate("g").unwrap_err().to_string(),
            "g: either pin or grab_pins and open_pins must be specified"
        );
        let config = roles(&[("1", "high")], &[]);
        assert_eq!(config.validate("g").unwrap_err().to_string(), "g: open_pins must not be empty");
    }

    #[test]
    fn test_validate_single_pin() {
        let config = GripperConfig { board: "local".into(), pin: "5".into(), ..Default::default() };
        assert!(config.validate("g").is_ok());
        let mixed = GripperConfig { pin: "5".into(), ..roles(&[("1", "high")], &[("2", "low")]) };
        assert!(mixed.validate("g").is_err());
    }

    #[tokio::test]
    async fn test_single_pin_follows_open_high() {
        let board = SimBoard::new("local", ["5"]);
        let deps = Dependencies::new().with_board(Arc::new(board.clone()));
        let config = GripperConfig {
            board: "local".into(),
            pin: "5".into(),
            open_high: true,
            ..Default::default()
        };
        let mut gripper = GpioGripper::new("g", &config, &deps).unwrap();
        let ctx = Context::background();
        assert!(!gripper.grab(&ctx, &Extra::default()).await.unwrap());
        gripper.open(&ctx, &Extra::default()).await.unwrap();
        assert_eq!(board.writes(), vec![PinWrite::new("5", false), PinWrite::new("5", true)]);
    }

    #[tokio::test]
    async fn test_role_pins_are_left_set() {
        let board = SimBoard::new("local", ["1", "2", "3"]);
        let deps = Dependencies::new().with_board(Arc::new(board.clone()));
        let config = roles(&[("1", "high"), ("2", "low")], &[("3", "high")]);
        let mut gripper = GpioGripper::new("g", &config, &deps).unwrap();
        let ctx = Context::background();
        gripper.grab(&ctx, &Extra::default()).await.unwrap();
        gripper.grab(&ctx, &Extra::default()).await.unwrap();
        assert_eq!(
            board.writes(),
            vec![
                PinWrite::new("1", true),
                PinWrite::new("2", false),
                PinWrite::new("1", true),
                PinWrite::new("2", false),
            ]
        );
        gripper.open(&ctx, &Extra::default()).await.unwrap();
        assert_eq!(board.level("3"), Some(true));
        assert_eq!(board.level("1"), Some(true));
    }

    #[tokio::test]
    async fn test_holding_is_not_sensed() {
        let board = SimBoard::new("local", ["5"]);
        let deps = Dependencies::new().with_board(Arc::new(board));
        let config = GripperConfig { board: "local".into(), pin: "5".into(), ..Default::default() };
        let gripper = GpioGripper::new("g", &config, &deps).unwrap();
        let ctx = Context::background();
        assert!(matches!(
            gripper.is_holding_something(&ctx, &Extra::default()).await,
            Err(DriverError::Unimplemented(_))
        ));
        assert!(!gripper.is_moving(&ctx).await.unwrap());
        assert!(gripper.geometries(&ctx, &Extra::default()).await.unwrap().is_empty());
    }
}
