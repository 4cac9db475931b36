//! Gripper driven by momentary "press" pins.
//!
//! Two wiring modes:
//!
//! - single pin: both `grab` and `open` pulse `pin` to its active level for
//!   `seconds`, then release it. Either pulse leaves the driver in
//!   [`PressPosition::Grabbed`], so in this mode a `grab` only fires when
//!   forced and every `open` fires.
//! - role pins: `grab_pins`, `open_pins` and optional `wait_pins`, each mapping
//!   a pin name to its active level. A move asserts the wait pins, releases the
//!   opposite role, asserts the target role, holds for the role's time, then
//!   releases the target role and the wait pins.
//!
//! The driver starts out in [`PressPosition::Grabbed`], so the first `grab`
//! without `force` does nothing while the first `open` always runs.

use super::{Component, Gripper, ValidateConfig};
use crate::context::Context;
use crate::error::{DriverError, Result};
use crate::hardware::{Board, Dependencies, GpioPin, resolve_pin};
use crate::resource::{Extra, Resource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_SECONDS: u64 = 3;
const DEFAULT_HOLD_MS: u64 = 3000;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PressConfig {
    #[serde(default)]
    pub board: String,
    /// Single pin mode. Mutually exclusive with the role pin maps.
    #[serde(default)]
    pub pin: String,
    /// Level the single pin is pulsed to. Defaults to high.
    #[serde(default)]
    pub active_high: Option<bool>,
    /// Pulse length in single pin mode; zero disables every hold.
    #[serde(default)]
    pub seconds: Option<u64>,
    /// Pin name -> active level. An absent map and an empty one are
    /// reported differently by validation.
    #[serde(default)]
    pub grab_pins: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    pub open_pins: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    pub wait_pins: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    pub open_time_ms: Option<u64>,
    #[serde(default)]
    pub grab_time_ms: Option<u64>,
}

impl ValidateConfig for PressConfig {
    fn validate(&self, path: &str) -> Result<Vec<String>> {
        if self.board.is_empty() {
            return Err(DriverError::required(path, "board"));
        }
        let len = |pins: &Option<BTreeMap<String, bool>>| pins.as_ref().map_or(0, |p| p.len());
        if self.pin.is_empty() && self.grab_pins.is_none() && self.open_pins.is_none() {
            return Err(DriverError::validation(
                path,
                "either pin or grab_pins and open_pins must be specified",
            ));
        }
        if !self.pin.is_empty()
            && (len(&self.grab_pins) > 0 || len(&self.open_pins) > 0 || len(&self.wait_pins) > 0)
        {
            return Err(DriverError::validation(
                path,
                "pin cannot be used with grab_pins, open_pins, or wait_pins",
            ));
        }
        if self.pin.is_empty() && len(&self.grab_pins) == 0 {
            return Err(DriverError::validation(path, "grab_pins must not be empty"));
        }
        if self.pin.is_empty() && len(&self.open_pins) == 0 {
            return Err(DriverError::validation(path, "open_pins must not be empty"));
        }
        Ok(vec![self.board.clone()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressPosition {
    Open,
    Grabbed,
}

impl fmt::Display for PressPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PressPosition::Open => f.write_str("open"),
            PressPosition::Grabbed => f.write_str("grabbed"),
        }
    }
}

/// Pins that make up one role, each with its active level. Ordered by pin name.
#[derive(Clone, Default)]
struct RolePins {
    pins: Vec<(Arc<dyn GpioPin>, bool)>,
}

impl RolePins {
    fn resolve(board: &dyn Board, levels: Option<&BTreeMap<String, bool>>) -> Result<Self> {
        let pins = levels
            .into_iter()
            .flatten()
            .map(|(name, level)| Ok((resolve_pin(board, name)?, *level)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { pins })
    }

    fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Drives every pin to its active level, or to the opposite when
    /// releasing. Stops at the first failed write.
    async fn drive(&self, ctx: &Context, activate: bool, extra: &Extra) -> Result<()> {
        for (pin, level) in &self.pins {
            let high = if activate { *level } else { !*level };
            pin.set(ctx, high, extra).await?;
        }
        Ok(())
    }
}

enum PressPins {
    Single { pin: Arc<dyn GpioPin>, active_high: bool },
    Roles { grab: RolePins, open: RolePins, wait: RolePins },
}

pub struct GripperPress {
    name: String,
    pins: PressPins,
    seconds: u64,
    grab_time: Duration,
    open_time: Duration,
    position: PressPosition,
}

impl GripperPress {
    pub fn new(name: &str, config: &PressConfig, deps: &Dependencies) -> Result<Self> {
        let board = deps.board(&config.board)?;

        let pins = if !config.pin.is_empty() {
            PressPins::Single {
                pin: resolve_pin(board.as_ref(), &config.pin)?,
                active_high: config.active_high.unwrap_or(true),
            }
        } else {
            PressPins::Roles {
                grab: RolePins::resolve(board.as_ref(), config.grab_pins.as_ref())?,
                open: RolePins::resolve(board.as_ref(), config.open_pins.as_ref())?,
                wait: RolePins::resolve(board.as_ref(), config.wait_pins.as_ref())?,
            }
        };

        let gripper = Self {
            name: name.to_string(),
            pins,
            seconds: config.seconds.unwrap_or(DEFAULT_SECONDS),
            grab_time: Duration::from_millis(config.grab_time_ms.unwrap_or(DEFAULT_HOLD_MS)),
            open_time: Duration::from_millis(config.open_time_ms.unwrap_or(DEFAULT_HOLD_MS)),
            position: PressPosition::Grabbed,
        };
        tracing::info!(
            "{}: gripper-press on board {} (seconds={}, grab={:?}, open={:?})",
            gripper.name,
            config.board,
            gripper.seconds,
            gripper.grab_time,
            gripper.open_time
        );
        Ok(gripper)
    }

    pub fn position(&self) -> PressPosition {
        self.position
    }

    async fn move_to(&mut self, ctx: &Context, target: PressPosition, extra: &Extra) -> Result<()> {
        if !extra.force && self.position == target {
            tracing::debug!("{}: already {}, skipping", self.name, target);
            return Ok(());
        }
        tracing::info!("{}: moving to {}{}", self.name, target, if extra.force { " (forced)" } else { "" });

        let (assert, release, wait, hold) = match &self.pins {
            PressPins::Single { pin, active_high } => {
                let (pin, active_high) = (pin.clone(), *active_high);
                return self.pulse(ctx, pin, active_high, extra).await;
            }
            PressPins::Roles { grab, open, wait } => match target {
                PressPosition::Grabbed => (grab.clone(), open.clone(), wait.clone(), self.grab_time),
                PressPosition::Open => (open.clone(), grab.clone(), wait.clone(), self.open_time),
            },
        };

        if !wait.is_empty() {
            wait.drive(ctx, true, extra).await?;
        }
        release.drive(ctx, false, extra).await?;
        assert.drive(ctx, true, extra).await?;
        self.position = target;

        if hold.is_zero() || self.seconds == 0 {
            return Ok(());
        }
        if let Err(e) = ctx.hold(hold).await {
            tracing::warn!("{}: hold interrupted ({}), releasing pins", self.name, e);
            let background = Context::background();
            if let Err(re) = assert.drive(&background, false, extra).await {
                tracing::warn!("{}: release after interruption failed: {}", self.name, re);
            }
            if !wait.is_empty() {
                if let Err(re) = wait.drive(&background, false, extra).await {
                    tracing::warn!("{}: wait pin release after interruption failed: {}", self.name, re);
                }
            }
            return Err(e);
        }

        assert.drive(ctx, false, extra).await?;
        if !wait.is_empty() {
            wait.drive(ctx, false, extra).await?;
        }
        Ok(())
    }

    async fn pulse(
        &mut self,
        ctx: &Context,
        pin: Arc<dyn GpioPin>,
        active_high: bool,
        extra: &Extra,
    ) -> Result<()> {
        pin.set(ctx, active_high, extra).await?;
        // A pulse never records Open, whichever way it was requested.
        self.position = PressPosition::Grabbed;
        if self.seconds == 0 {
            return Ok(());
        }
        if let Err(e) = ctx.hold(Duration::from_secs(self.seconds)).await {
            tracing::warn!("{}: pulse interrupted ({}), releasing pin {}", self.name, e, pin.name());
            if let Err(re) = pin.set(&Context::background(), !active_high, extra).await {
                tracing::warn!("{}: release after interruption failed: {}", self.name, re);
            }
            return Err(e);
        }
        pin.set(ctx, !active_high, extra).await?;
        Ok(())
    }
}

#[async_trait]
impl Resource for GripperPress {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Gripper for GripperPress {
    async fn grab(&mut self, ctx: &Context, extra: &Extra) -> Result<bool> {
        self.move_to(ctx, PressPosition::Grabbed, extra).await?;
        Ok(false)
    }

    async fn open(&mut self, ctx: &Context, extra: &Extra) -> Result<()> {
        self.move_to(ctx, PressPosition::Open, extra).await
    }
}

pub fn construct(name: &str, config: &PressConfig, deps: &Dependencies) -> Result<Component> {
    Ok(Component::Gripper(Box::new(GripperPress::new(name, config, deps)?)))
}
