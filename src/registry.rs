// src/registry.rs - Explicit model table used to construct components
use crate::components::{self, Component, ValidateConfig, decode_attributes};
use crate::config::ComponentConfig;
use crate::error::{DriverError, Result};
use crate::hardware::Dependencies;
use crate::resource::{self, Api, Model};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

type Constructor = Box<dyn Fn(&ComponentConfig, &Dependencies) -> Result<Component> + Send + Sync>;

struct Registration {
    api: Api,
    constructor: Constructor,
}

/// Maps each model to the API it serves and how to build it.
///
/// Built once at start-up; nothing registers itself implicitly.
#[derive(Default)]
pub struct Registry {
    models: HashMap<Model, Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five drivers shipped in this crate.
    pub fn with_builtin_models() -> Self {
        let mut registry = Self::new();
        let results = [
            registry.register(Api::Gripper, resource::gripper_model(), components::gripper::construct),
            registry.register(Api::Gripper, resource::gripper_press_model(), components::gripper_press::construct),
            registry.register(Api::Switch, resource::switch_model(), components::switch::construct),
            registry.register(Api::Switch, resource::switch_one_of_model(), components::switch_one_of::construct),
            registry.register(Api::Button, resource::button_model(), components::button::construct),
        ];
        for result in results {
            if let Err(e) = result {
                tracing::error!("Failed to register builtin model: {}", e);
            }
        }
        registry
    }

    /// Registers `model`. The constructor receives the decoded, validated
    /// config; boards named by validation are checked before it runs.
    pub fn register<C, F>(&mut self, api: Api, model: Model, constructor: F) -> Result<()>
    where
        C: DeserializeOwned + ValidateConfig + 'static,
        F: Fn(&str, &C, &Dependencies) -> Result<Component> + Send + Sync + 'static,
    {
        if self.models.contains_key(&model) {
            return Err(DriverError::DuplicateModel(model.to_string()));
        }
        tracing::debug!("Registering {} model {}", api, model);
        let constructor: Constructor = Box::new(move |config: &ComponentConfig, deps: &Dependencies| {
            let path = config.name.as_str();
            let typed: C = decode_attributes(path, &config.attributes)?;
            for board in typed.validate(path)? {
                deps.board(&board)?;
            }
            constructor(&config.name, &typed, deps)
        });
        self.models.insert(model, Registration { api, constructor });
        Ok(())
    }

    pub fn construct(&self, config: &ComponentConfig, deps: &Dependencies) -> Result<Component> {
        let model = Model::parse(&config.model)?;
        let registration = self
            .models
            .get(&model)
            .ok_or_else(|| DriverError::UnknownModel(model.to_string()))?;
        if registration.api != config.api {
            return Err(DriverError::ApiMismatch {
                model: model.to_string(),
                registered: registration.api.to_string(),
                requested: config.api.to_string(),
            });
        }
        tracing::info!("Constructing {} '{}' ({})", config.api, config.name, model);
        let component = (registration.constructor)(config, deps).inspect_err(|e| {
            tracing::error!("Failed to construct '{}': {}", config.name, e);
        })?;
        Ok(component)
    }

    pub fn models(&self) -> Vec<(Api, Model)> {
        let mut models: Vec<_> = self
            .models
            .iter()
            .map(|(model, reg)| (reg.api, model.clone()))
            .collect();
        models.sort_by_key(|(_, model)| model.to_string());
        models
    }
}
