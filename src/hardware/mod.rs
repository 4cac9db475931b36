// src/hardware/mod.rs - Board abstraction consumed by the drivers
pub mod sim_board;

pub use sim_board::{PinWrite, SimBoard};

use crate::context::Context;
use crate::error::DriverError;
use crate::resource::Extra;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoardError {
    #[error("pin '{0}' not found")]
    PinNotFound(String),
    #[error("failed to set pin '{pin}': {reason}")]
    Write { pin: String, reason: String },
    #[error("failed to read pin '{pin}': {reason}")]
    Read { pin: String, reason: String },
}

/// A single digital output line owned by a board.
#[async_trait]
pub trait GpioPin: Send + Sync {
    fn name(&self) -> &str;
    async fn set(&self, ctx: &Context, high: bool, extra: &Extra) -> Result<(), BoardError>;
    async fn get(&self, ctx: &Context, extra: &Extra) -> Result<bool, BoardError>;
}

pub trait Board: Send + Sync {
    fn name(&self) -> &str;
    fn gpio_pin_by_name(&self, name: &str) -> Result<Arc<dyn GpioPin>, BoardError>;
}

/// Boards a component may depend on, keyed by board name.
#[derive(Clone, Default)]
pub struct Dependencies {
    boards: HashMap<String, Arc<dyn Board>>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, board: Arc<dyn Board>) {
        self.boards.insert(board.name().to_string(), board);
    }

    pub fn with_board(mut self, board: Arc<dyn Board>) -> Self {
        self.insert(board);
        self
    }

    pub fn board(&self, name: &str) -> Result<Arc<dyn Board>, DriverError> {
        self.boards
            .get(name)
            .cloned()
            .ok_or_else(|| DriverError::BoardNotFound(name.to_string()))
    }

    pub fn board_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.boards.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Resolves a pin on `board`, mapping a missing pin to a dependency error.
pub fn resolve_pin(board: &dyn Board, pin: &str) -> Result<Arc<dyn GpioPin>, DriverError> {
    board.gpio_pin_by_name(pin).map_err(|e| match e {
        BoardError::PinNotFound(pin) => DriverError::PinNotFound {
            board: board.name().to_string(),
            pin,
        },
        other => DriverError::PinWrite(other),
    })
}
