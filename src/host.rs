// src/host.rs - Owns boards and constructed components; drives their lifecycle
use crate::components::{Button, Component, Gripper, Switch};
use crate::config::{ComponentConfig, ModuleConfig};
use crate::error::{DriverError, Result};
use crate::hardware::{Board, Dependencies};
use crate::registry::Registry;
use crate::resource::Api;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Calls into a single component are serialised by `&mut` access; the host
/// never runs two operations on the same instance at once.
pub struct Host {
    registry: Registry,
    deps: Dependencies,
    components: BTreeMap<String, (ComponentConfig, Component)>,
}

impl Host {
    pub fn new(registry: Registry, deps: Dependencies) -> Self {
        Self {
            registry,
            deps,
            components: BTreeMap::new(),
        }
    }

    /// Builds every board and component in `config`. The first component
    /// that fails to construct aborts the whole start-up.
    pub fn from_config(registry: Registry, config: &ModuleConfig) -> Result<Self> {
        let mut deps = Dependencies::new();
        for board in &config.boards {
            tracing::info!("Board '{}' with {} pins", board.name, board.pins.len());
            deps.insert(Arc::new(board.build()) as Arc<dyn Board>);
        }
        let mut host = Self::new(registry, deps);
        for component in &config.components {
            host.add_component(component.clone())?;
        }
        Ok(host)
    }

    pub fn add_component(&mut self, config: ComponentConfig) -> Result<()> {
        if self.components.contains_key(&config.name) {
            return Err(DriverError::DuplicateComponent(config.name));
        }
        let component = self.registry.construct(&config, &self.deps)?;
        self.components.insert(config.name.clone(), (config, component));
        Ok(())
    }

    /// Applies a new configuration. No driver has a hot-reload path: the old
    /// instance is closed and a fresh one is built. If construction fails the
    /// component is gone.
    pub async fn reconfigure(&mut self, config: ComponentConfig) -> Result<()> {
        let Some((_, mut old)) = self.components.remove(&config.name) else {
            return Err(DriverError::ComponentNotFound(config.name));
        };
        if let Err(e) = old.close().await {
            tracing::warn!("Closing '{}' before rebuild failed: {}", config.name, e);
        }
        let component = self.registry.construct(&config, &self.deps)?;
        tracing::info!("Rebuilt '{}'", config.name);
        self.components.insert(config.name.clone(), (config, component));
        Ok(())
    }

    pub async fn remove(&mut self, name: &str) -> Result<()> {
        let (_, mut component) = self
            .components
            .remove(name)
            .ok_or_else(|| DriverError::ComponentNotFound(name.to_string()))?;
        component.close().await
    }

    pub fn names(&self) -> Vec<(String, Api, String)> {
        self.components
            .iter()
            .map(|(name, (config, component))| (name.clone(), component.api(), config.model.clone()))
            .collect()
    }

    pub fn component(&mut self, name: &str) -> Result<&mut Component> {
        self.components
            .get_mut(name)
            .map(|(_, component)| component)
            .ok_or_else(|| DriverError::ComponentNotFound(name.to_string()))
    }

    pub fn gripper(&mut self, name: &str) -> Result<&mut dyn Gripper> {
        match self.component(name)? {
            Component::Gripper(g) => Ok(g.as_mut()),
            other => Err(wrong_api(name, Api::Gripper, other.api())),
        }
    }

    pub fn switch(&mut self, name: &str) -> Result<&mut dyn Switch> {
        match self.component(name)? {
            Component::Switch(s) => Ok(s.as_mut()),
            other => Err(wrong_api(name, Api::Switch, other.api())),
        }
    }

    pub fn button(&mut self, name: &str) -> Result<&mut dyn Button> {
        match self.component(name)? {
            Component::Button(b) => Ok(b.as_mut()),
            other => Err(wrong_api(name, Api::Button, other.api())),
        }
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.deps
    }

    pub async fn close_all(&mut self) {
        for (name, (_, mut component)) in std::mem::take(&mut self.components) {
            if let Err(e) = component.close().await {
                tracing::warn!("Closing '{}' failed: {}", name, e);
            }
        }
    }
}

fn wrong_api(name: &str, requested: Api, actual: Api) -> DriverError {
    DriverError::WrongApi {
        name: name.to_string(),
        expected: requested.to_string(),
        actual: actual.to_string(),
    }
}
