// src/error.rs - Error types surfaced by drivers, the registry and the host
use crate::hardware::BoardError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{path}: {message}")]
    ConfigValidation { path: String, message: String },
    #[error("{path}: \"{field}\" is required")]
    FieldRequired { path: String, field: &'static str },
    #[error("{path}: invalid attributes: {source}")]
    Attributes {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("board '{0}' not found in dependencies")]
    BoardNotFound(String),
    #[error("pin '{pin}' not found on board '{board}'")]
    PinNotFound { board: String, pin: String },
    #[error(transparent)]
    PinWrite(#[from] BoardError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("unknown model '{0}'")]
    UnknownModel(String),
    #[error("model '{model}' implements {registered}, not {requested}")]
    ApiMismatch {
        model: String,
        registered: String,
        requested: String,
    },
    #[error("component '{name}' is a {actual}, not a {expected}")]
    WrongApi { name: String, expected: String, actual: String },
    #[error("model '{0}' is already registered")]
    DuplicateModel(String),
    #[error("component '{0}' not found")]
    ComponentNotFound(String),
    #[error("component '{0}' already exists")]
    DuplicateComponent(String),
    #[error("{0} not implemented")]
    Unimplemented(&'static str),
    #[error("{}", join_errors(.0))]
    Combined(Vec<DriverError>),
}

fn join_errors(errors: &[DriverError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl DriverError {
    pub fn validation(path: &str, message: impl Into<String>) -> Self {
        DriverError::ConfigValidation {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub fn required(path: &str, field: &'static str) -> Self {
        DriverError::FieldRequired {
            path: path.to_string(),
            field,
        }
    }

    /// Collapses a list of failures: none is `Ok`, one is returned as-is.
    pub fn combine(mut errors: Vec<DriverError>) -> Result<(), DriverError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(DriverError::Combined(errors)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DriverError::Cancelled)
    }
}

pub type Result<T, E = DriverError> = std::result::Result<T, E>;
