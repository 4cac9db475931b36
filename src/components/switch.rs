// src/components/switch.rs - Two position switch on a single pin
use super::{Component, Switch, ValidateConfig};
use crate::context::Context;
use crate::error::{DriverError, Result};
use crate::hardware::{Dependencies, GpioPin, resolve_pin};
use crate::resource::{Extra, Resource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SwitchConfig {
    #[serde(default)]
    pub board: String,
    #[serde(default)]
    pub pin: String,
}

impl ValidateConfig for SwitchConfig {
    fn validate(&self, path: &str) -> Result<Vec<String>> {
        if self.board.is_empty() {
            return Err(DriverError::required(path, "board"));
        }
        if self.pin.is_empty() {
            return Err(DriverError::required(path, "pin"));
        }
        Ok(vec![self.board.clone()])
    }
}

pub struct GpioSwitch {
    name: String,
    pin: Arc<dyn GpioPin>,
    position: u32,
}

impl GpioSwitch {
    pub fn new(name: &str, config: &SwitchConfig, deps: &Dependencies) -> Result<Self> {
        let board = deps.board(&config.board)?;
        let pin = resolve_pin(board.as_ref(), &config.pin)?;
        tracing::info!("{}: switch on {}:{}", name, config.board, config.pin);
        Ok(Self {
            name: name.to_string(),
            pin,
            position: 0,
        })
    }
}

#[async_trait]
impl Resource for GpioSwitch {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Switch for GpioSwitch {
    async fn set_position(&mut self, ctx: &Context, position: u32, extra: &Extra) -> Result<()> {
        if position > 1 {
            return Err(DriverError::InvalidArgument(format!(
                "gpio set_position only supports 0 and 1, not {position}"
            )));
        }
        self.position = position;
        self.pin.set(ctx, position == 1, extra).await?;
        Ok(())
    }

    async fn get_position(&self, _ctx: &Context, _extra: &Extra) -> Result<u32> {
        Ok(self.position)
    }

    async fn get_number_of_positions(&self, _ctx: &Context, _extra: &Extra) -> Result<(u32, Vec<String>)> {
        Ok((2, vec!["off".to_string(), "on".to_string()]))
    }
}

pub fn construct(name: &str, config: &SwitchConfig, deps: &Dependencies) -> Result<Component> {
    Ok(Component::Switch(Box::new(GpioSwitch::new(name, config, deps)?)))
}
