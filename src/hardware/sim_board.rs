// src/hardware/sim_board.rs - In-memory board that records every pin write
use super::{Board, BoardError, GpioPin};
use crate::context::Context;
use crate::resource::Extra;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded `set` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinWrite {
    pub pin: String,
    pub high: bool,
}

impl PinWrite {
    pub fn new(pin: &str, high: bool) -> Self {
        Self {
            pin: pin.to_string(),
            high,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    levels: BTreeMap<String, bool>,
    writes: Vec<PinWrite>,
    failing: HashSet<String>,
}

/// Simulated board with a fixed pin set.
///
/// Writes are recorded in call order across all pins, so a test can assert
/// the exact sequence a driver produced. Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct SimBoard {
    name: String,
    state: Arc<Mutex<SimState>>,
}

impl SimBoard {
    pub fn new<I, S>(name: &str, pins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let levels = pins.into_iter().map(|p| (p.into(), false)).collect();
        Self {
            name: name.to_string(),
            state: Arc::new(Mutex::new(SimState {
                levels,
                ..Default::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn pin_names(&self) -> Vec<String> {
        self.state().levels.keys().cloned().collect()
    }

    pub fn level(&self, pin: &str) -> Option<bool> {
        self.state().levels.get(pin).copied()
    }

    pub fn writes(&self) -> Vec<PinWrite> {
        self.state().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state().writes.clear();
    }

    /// Makes every subsequent write to `pin` fail.
    pub fn fail_pin(&self, pin: &str) {
        self.state().failing.insert(pin.to_string());
    }

    pub fn heal_pin(&self, pin: &str) {
        self.state().failing.remove(pin);
    }
}

impl Board for SimBoard {
    fn name(&self) -> &str {
        &self.name
    }

    fn gpio_pin_by_name(&self, name: &str) -> Result<Arc<dyn GpioPin>, BoardError> {
        if !self.state().levels.contains_key(name) {
            return Err(BoardError::PinNotFound(name.to_string()));
        }
        Ok(Arc::new(SimPin {
            board: self.name.clone(),
            name: name.to_string(),
            state: self.state.clone(),
        }))
    }
}

struct SimPin {
    board: String,
    name: String,
    state: Arc<Mutex<SimState>>,
}

#[async_trait]
impl GpioPin for SimPin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set(&self, _ctx: &Context, high: bool, _extra: &Extra) -> Result<(), BoardError> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.failing.contains(&self.name) {
            tracing::warn!("{}: injected write failure on pin {}", self.board, self.name);
            return Err(BoardError::Write {
                pin: self.name.clone(),
                reason: "simulated fault".to_string(),
            });
        }
        tracing::debug!("{}: pin {} <- {}", self.board, self.name, if high { "high" } else { "low" });
        state.levels.insert(self.name.clone(), high);
        state.writes.push(PinWrite::new(&self.name, high));
        Ok(())
    }

    async fn get(&self, _ctx: &Context, _extra: &Extra) -> Result<bool, BoardError> {
        let state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.levels.get(&self.name).copied().ok_or_else(|| BoardError::Read {
            pin: self.name.clone(),
            reason: "pin vanished".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_are_recorded_in_order() {
        let board = SimBoard::new("local", ["1", "2"]);
        let ctx = Context::background();
        let extra = Extra::default();
        let one = board.gpio_pin_by_name("1").unwrap();
        let two = board.gpio_pin_by_name("2").unwrap();
        two.set(&ctx, true, &extra).await.unwrap();
        one.set(&ctx, true, &extra).await.unwrap();
        two.set(&ctx, false, &extra).await.unwrap();
        assert_eq!(
            board.writes(),
            vec![PinWrite::new("2", true), PinWrite::new("1", true), PinWrite::new("2", false)]
        );
        assert_eq!(board.level("1"), Some(true));
        assert_eq!(board.level("2"), Some(false));
        assert!(one.get(&ctx, &extra).await.unwrap());
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_level_untouched() {
        let board = SimBoard::new("local", ["1"]);
        board.fail_pin("1");
        let pin = board.gpio_pin_by_name("1").unwrap();
        let err = pin.set(&Context::background(), true, &Extra::default()).await.unwrap_err();
        assert!(matches!(err, BoardError::Write { .. }));
        assert_eq!(board.level("1"), Some(false));
        assert!(board.writes().is_empty());

        board.heal_pin("1");
        assert!(pin.set(&Context::background(), true, &Extra::default()).await.is_ok());
    }

    #[test]
    fn test_unknown_pin() {
        let board = SimBoard::new("local", ["1"]);
        assert!(matches!(
            board.gpio_pin_by_name("99").err(),
            Some(BoardError::PinNotFound(p)) if p == "99"
        ));
    }
}
