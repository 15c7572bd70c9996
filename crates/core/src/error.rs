use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("JDK not found: {name}")]
    NotFound { name: String },

    #[error("JDK already exists: {name}")]
    AlreadyExists { name: String },

    #[error("{path} is already registered as {name}")]
    PathAlreadyRegistered { path: String, name: String },

    #[error("Invalid Java installation path: {path}")]
    InvalidPath { path: String },

    #[error("No JDK is currently selected")]
    NoCurrent,

    #[error("jenv is already initialized")]
    AlreadyInitialized,
}

pub type Result<T> = std::result::Result<T, CoreError>;
