// src/components/mod.rs - Component APIs and the drivers implementing them
pub mod button;
pub mod gripper;
pub mod gripper_press;
pub mod switch;
pub mod switch_one_of;

use crate::context::Context;
use crate::error::{DriverError, Result};
use crate::geometry::Geometry;
use crate::resource::{Api, Extra, Resource};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[async_trait]
pub trait Gripper: Resource {
    /// Closes the gripper. The boolean reports whether something is held;
    /// these drivers have no sensing and always answer `false`.
    async fn grab(&mut self, ctx: &Context, extra: &Extra) -> Result<bool>;

    async fn open(&mut self, ctx: &Context, extra: &Extra) -> Result<()>;

    async fn is_moving(&self, _ctx: &Context) -> Result<bool> {
        Ok(false)
    }

    async fn stop(&mut self, _ctx: &Context, _extra: &Extra) -> Result<()> {
        Ok(())
    }

    async fn geometries(&self, _ctx: &Context, _extra: &Extra) -> Result<Vec<Geometry>> {
        Ok(Vec::new())
    }

    async fn is_holding_something(&self, _ctx: &Context, _extra: &Extra) -> Result<bool> {
        Err(DriverError::Unimplemented("is_holding_something"))
    }
}

#[async_trait]
pub trait Switch: Resource {
    async fn set_position(&mut self, ctx: &Context, position: u32, extra: &Extra) -> Result<()>;
    async fn get_position(&self, ctx: &Context, extra: &Extra) -> Result<u32>;
    /// Number of positions and a label for each one.
    async fn get_number_of_positions(&self, ctx: &Context, extra: &Extra) -> Result<(u32, Vec<String>)>;
}

#[async_trait]
pub trait Button: Resource {
    async fn push(&mut self, ctx: &Context, extra: &Extra) -> Result<()>;
}

/// A constructed driver, tagged with the API it serves.
pub enum Component {
    Gripper(Box<dyn Gripper>),
    Switch(Box<dyn Switch>),
    Button(Box<dyn Button>),
}

impl Component {
    pub fn api(&self) -> Api {
        match self {
            Component::Gripper(_) => Api::Gripper,
            Component::Switch(_) => Api::Switch,
            Component::Button(_) => Api::Button,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Component::Gripper(g) => g.name(),
            Component::Switch(s) => s.name(),
            Component::Button(b) => b.name(),
        }
    }

    pub async fn do_command(&mut self, ctx: &Context, cmd: &Value) -> Result<Value> {
        match self {
            Component::Gripper(g) => g.do_command(ctx, cmd).await,
            Component::Switch(s) => s.do_command(ctx, cmd).await,
            Component::Button(b) => b.do_command(ctx, cmd).await,
        }
    }

    pub async fn close(&mut self) -> Result<()> {
        match self {
            Component::Gripper(g) => g.close().await,
            Component::Switch(s) => s.close().await,
            Component::Button(b) => b.close().await,
        }
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Component({} {})", self.api(), self.name())
    }
}

/// Validation shared by every driver config. Returns the names of the boards
/// the component depends on.
pub trait ValidateConfig {
    fn validate(&self, path: &str) -> Result<Vec<String>>;
}

/// Decodes a component's `attributes` table into its typed config.
pub fn decode_attributes<T: DeserializeOwned>(path: &str, attributes: &toml::Table) -> Result<T> {
    toml::Value::Table(attributes.clone())
        .try_into()
        .map_err(|source| DriverError::Attributes {
            path: path.to_string(),
            source,
        })
}
