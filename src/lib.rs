// gripper_gpio: GPIO-backed gripper, switch and button drivers

pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod geometry;
pub mod hardware;
pub mod host;
pub mod registry;
pub mod resource;

pub use components::{Button, Component, Gripper, Switch};
pub use context::{CancelHandle, Context};
pub use error::{DriverError, Result};
pub use hardware::{Board, BoardError, Dependencies, GpioPin, SimBoard};
pub use host::Host;
pub use registry::Registry;
pub use resource::{Api, Extra, Model};
