// src/components/button.rs - Momentary button: pin high for a few seconds, then low
use super::{Button, Component, ValidateConfig};
use crate::context::Context;
use crate::error::{DriverError, Result};
use crate::hardware::{Dependencies, GpioPin, resolve_pin};
use crate::resource::{Extra, Resource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ButtonConfig {
    #[serde(default)]
    pub board: String,
    #[serde(default)]
    pub pin: String,
    /// Press length. Zero or negative falls back to one second.
    #[serde(default)]
    pub seconds: i64,
}

impl ValidateConfig for ButtonConfig {
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

pub struct GpioButton {
    name: String,
    pin: Arc<dyn GpioPin>,
    press: Duration,
}

impl GpioButton {
    pub fn new(name: &str, config: &ButtonConfig, deps: &Dependencies) -> Result<Self> {
        let board = deps.board(&config.board)?;
        let pin = resolve_pin(board.as_ref(), &config.pin)?;
        let seconds = if config.seconds <= 0 { 1 } else { config.seconds as u64 };
        tracing::info!("{}: button on {}:{} ({}s press)", name, config.board, config.pin, seconds);
        Ok(Self {
            name: name.to_string(),
            pin,
            press: Duration::from_secs(seconds),
        })
    }
}

#[async_trait]
impl Resource for GpioButton {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Button for GpioButton {
    /// The pin is driven low again on every path once it went high, including
    /// cancellation.
    async fn push(&mut self, ctx: &Context, extra: &Extra) -> Result<()> {
        self.pin.set(ctx, true, extra).await?;
        let held = ctx.hold(self.press).await;
        let released = self.pin.set(&Context::background(), false, extra).await;
        match (held, released) {
            (Err(e), Err(re)) => {
                tracing::warn!("{}: release after interrupted push failed: {}", self.name, re);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), released) => Ok(released?),
        }
    }
}

pub fn construct(name: &str, config: &ButtonConfig, deps: &Dependencies) -> Result<Component> {
    Ok(Component::Button(Box::new(GpioButton::new(name, config, deps)?)))
}
