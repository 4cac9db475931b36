//! N position selector switch.
//!
//! Position `p` in `1..=N` drives pin `p - 1` high and every other pin low;
//! position 0 drives all pins low. `do_command` understands two payloads:
//!
//! ```json
//! {"cycle": true, "min": 0, "max": 3, "cycles": 1, "sleep-millis": 500}
//! {"set": 2}
//! ```

use super::{Component, Switch, ValidateConfig};
use crate::context::Context;
use crate::error::{DriverError, Result};
use crate::hardware::{Dependencies, GpioPin, resolve_pin};
use crate::resource::{Extra, Resource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_SLEEP_MILLIS: i64 = 500;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SwitchOneOfConfig {
    #[serde(default)]
    pub board: String,
    #[serde(default)]
    pub pins: Vec<String>,
    /// One label per pin, reported after the implicit "off" position.
    #[serde(default)]
    pub names: Vec<String>,
}

impl ValidateConfig for SwitchOneOfConfig {
    fn validate(&self, path: &str) -> Result<Vec<String>> {
        if self.board.is_empty() {
            return Err(DriverError::required(path, "board"));
        }
        if self.pins.is_empty() {
            return Err(DriverError::required(path, "pins"));
        }
        if self.names.len() != self.pins.len() {
            return Err(DriverError::validation(path, "pins and names have to be the same length"));
        }
        Ok(vec![self.board.clone()])
    }
}

/// Options of the `cycle` command. `max` is exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOptions {
    pub min: i64,
    pub max: i64,
    pub cycles: i64,
    pub sleep: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchCommand {
    Cycle(CycleOptions),
    Set(u32),
}

/// Integer attribute with a fallback; floats are truncated, anything else
/// falls back to `default`.
fn int_attr(map: &Map<String, Value>, key: &str, default: i64) -> i64 {
    match map.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        _ => default,
    }
}

fn position_from(value: &Value) -> Result<u32> {
    let bad = || DriverError::InvalidArgument(format!("bad type for 'set' {value}"));
    let Value::Number(n) = value else {
        return Err(bad());
    };
    let position = if let Some(v) = n.as_u64() {
        v
    } else if let Some(f) = n.as_f64().filter(|f| *f >= 0.0) {
        f as u64
    } else {
        return Err(DriverError::InvalidArgument(format!("set position {n} is negative")));
    };
    u32::try_from(position).map_err(|_| DriverError::InvalidArgument(format!("set position {position} is out of range")))
}

impl SwitchCommand {
    /// `pin_count` supplies the default `max` of a cycle.
    pub fn parse(cmd: &Value, pin_count: usize) -> Result<Self> {
        let Value::Object(map) = cmd else {
            return Err(DriverError::InvalidArgument("command must be an object".to_string()));
        };
        if matches!(map.get("cycle"), Some(Value::Bool(true))) {
            return Ok(SwitchCommand::Cycle(CycleOptions {
                min: int_attr(map, "min", 0),
                max: int_attr(map, "max", pin_count as i64),
                cycles: int_attr(map, "cycles", 1),
                sleep: Duration::from_millis(int_attr(map, "sleep-millis", DEFAULT_SLEEP_MILLIS).max(0) as u64),
            }));
        }
        match map.get("set") {
            Some(value) => Ok(SwitchCommand::Set(position_from(value)?)),
            None => Err(DriverError::InvalidArgument("no set".to_string())),
        }
    }
}

pub struct SwitchOneOf {
    name: String,
    pins: Vec<Arc<dyn GpioPin>>,
    labels: Vec<String>,
    position: u32,
}

impl SwitchOneOf {
    pub fn new(name: &str, config: &SwitchOneOfConfig, deps: &Dependencies) -> Result<Self> {
        let board = deps.board(&config.board)?;
        let pins = config
            .pins
            .iter()
            .map(|p| resolve_pin(board.as_ref(), p))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!("{}: {}-way switch on board {}", name, pins.len(), config.board);
        Ok(Self {
            name: name.to_string(),
            pins,
            labels: config.names.clone(),
            position: 0,
        })
    }

    /// Steps through `min..max` `cycles` times, then returns to where it began.
    pub async fn cycle(&mut self, ctx: &Context, options: &CycleOptions) -> Result<()> {
        let start = self.position;
        let no_extra = Extra::default();
        tracing::info!(
            "{}: cycling {}..{} x{} every {:?}",
            self.name,
            options.min,
            options.max,
            options.cycles,
            options.sleep
        );
        for _ in 0..options.cycles.max(0) {
            for i in options.min..options.max {
                let position = u32::try_from(i)
                    .map_err(|_| DriverError::InvalidArgument(format!("set_position wrong {i}")))?;
                self.set_position(ctx, position, &no_extra).await?;
                if let Err(e) = ctx.hold(options.sleep).await {
                    tracing::warn!("{}: cycle interrupted, restoring position {}", self.name, start);
                    if let Err(re) = self.set_position(&Context::background(), start, &no_extra).await {
                        tracing::warn!("{}: restore after interruption failed: {}", self.name, re);
                    }
                    return Err(e);
                }
            }
        }
        self.set_position(ctx, start, &no_extra).await
    }
}

#[async_trait]
impl Resource for SwitchOneOf {
    fn name(&self) -> &str {
        &self.name
    }

    async fn do_command(&mut self, ctx: &Context, cmd: &Value) -> Result<Value> {
        match SwitchCommand::parse(cmd, self.pins.len())? {
            SwitchCommand::Cycle(options) => self.cycle(ctx, &options).await?,
            SwitchCommand::Set(position) => self.set_position(ctx, position, &Extra::default()).await?,
        }
        Ok(Value::Null)
    }
}

#[async_trait]
impl Switch for SwitchOneOf {
    /// Every pin is written even when an earlier write fails; all failures
    /// are reported together.
    async fn set_position(&mut self, ctx: &Context, position: u32, extra: &Extra) -> Result<()> {
        if position as usize > self.pins.len() {
            return Err(DriverError::InvalidArgument(format!("set_position wrong {position}")));
        }
        self.position = position;

        let mut errors = Vec::new();
        for (idx, pin) in self.pins.iter().enumerate() {
            let high = idx + 1 == position as usize;
            if let Err(e) = pin.set(ctx, high, extra).await {
                errors.push(DriverError::from(e));
            }
        }
        DriverError::combine(errors)
    }

    async fn get_position(&self, _ctx: &Context, _extra: &Extra) -> Result<u32> {
        Ok(self.position)
    }

    async fn get_number_of_positions(&self, _ctx: &Context, _extra: &Extra) -> Result<(u32, Vec<String>)> {
        let mut labels = vec!["off".to_string()];
        labels.extend(self.labels.iter().cloned());
        Ok((labels.len() as u32, labels))
    }
}

pub fn construct(name: &str, config: &SwitchOneOfConfig, deps: &Dependencies) -> Result<Component> {
    Ok(Component::Switch(Box::new(SwitchOneOf::new(name, config, deps)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate() {
        let config = SwitchOneOfConfig {
            board: "local".into(),
            pins: vec!["1".into(), "2".into()],
            names: vec!["a".into()],
        };
        assert_eq!(
            config.validate("s").unwrap_err().to_string(),
            "s: pins and names have to be the same length"
        );
        let config = SwitchOneOfConfig { board: "local".into(), ..Default::default() };
        assert_eq!(config.validate("s").unwrap_err().to_string(), "s: \"pins\" is required");
    }

    #[test]
    fn test_parse_cycle_defaults() {
        let cmd = SwitchCommand::parse(&json!({"cycle": true}), 4).unwrap();
        assert_eq!(
            cmd,
            SwitchCommand::Cycle(CycleOptions {
                min: 0,
                max: 4,
                cycles: 1,
                sleep: Duration::from_millis(500),
            })
        );
    }

    #[test]
    fn test_parse_cycle_options() {
        let cmd = SwitchCommand::parse(
            &json!({"cycle": true, "min": 1, "max": 3.0, "cycles": 2, "sleep-millis": 10}),
            4,
        )
        .unwrap();
        let SwitchCommand::Cycle(options) = cmd else {
            panic!("expected cycle");
        };
        assert_eq!((options.min, options.max, options.cycles), (1, 3, 2));
        assert_eq!(options.sleep, Duration::from_millis(10));
    }

    #[test]
    fn test_parse_set_variants() {
        assert_eq!(SwitchCommand::parse(&json!({"set": 2}), 4).unwrap(), SwitchCommand::Set(2));
        assert_eq!(SwitchCommand::parse(&json!({"set": 3.0}), 4).unwrap(), SwitchCommand::Set(3));
        assert!(matches!(
            SwitchCommand::parse(&json!({"set": "2"}), 4),
            Err(DriverError::InvalidArgument(msg)) if msg.starts_with("bad type for 'set'")
        ));
        assert!(SwitchCommand::parse(&json!({"set": -1}), 4).is_err());
        assert!(matches!(
            SwitchCommand::parse(&json!({"cycle": false}), 4),
            Err(DriverError::InvalidArgument(msg)) if msg == "no set"
        ));
    }
}
