//! Collision geometry attached to a gripper.
//!
//! ```toml
//! [[component.attributes.geometries]]
//! type = "box"
//! x = 80.0
//! y = 40.0
//! z = 120.0
//! label = "jaws"
//! ```

use crate::error::{DriverError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryType {
    Box,
    Sphere,
    Capsule,
}

/// Geometry as written in configuration. Dimensions are millimetres.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeometryConfig {
    pub r#type: GeometryType,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub l: f64,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Box { x: f64, y: f64, z: f64 },
    Sphere { radius: f64 },
    Capsule { radius: f64, length: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub shape: Shape,
    pub label: String,
}

impl GeometryConfig {
    pub fn parse(&self, path: &str) -> Result<Geometry> {
        let shape = match self.r#type {
            GeometryType::Box => {
                if self.x <= 0.0 || self.y <= 0.0 || self.z <= 0.0 {
                    return Err(DriverError::validation(path, "box dimensions x, y and z must be > 0"));
                }
                Shape::Box { x: self.x, y: self.y, z: self.z }
            }
            GeometryType::Sphere => {
                if self.r <= 0.0 {
                    return Err(DriverError::validation(path, "sphere radius r must be > 0"));
                }
                Shape::Sphere { radius: self.r }
            }
            GeometryType::Capsule => {
                if self.r <= 0.0 {
                    return Err(DriverError::validation(path, "capsule radius r must be > 0"));
                }
                if self.l < 2.0 * self.r {
                    return Err(DriverError::validation(path, "capsule length l must be at least 2 * r"));
                }
                Shape::Capsule { radius: self.r, length: self.l }
            }
        };
        Ok(Geometry {
            shape,
            label: self.label.clone().unwrap_or_default(),
        })
    }
}

pub fn parse_geometries(path: &str, configs: &[GeometryConfig]) -> Result<Vec<Geometry>> {
    configs
        .iter()
        .enumerate()
        .map(|(i, gc)| gc.parse(&format!("{path}.geometries.{i}")))
        .collect()
}
