use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Route file Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid route: {0}")]
    InvalidRoute(String),
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

// Pathing oracle Error Type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathingError {
    #[error("Pathing request timed out")]
    Timeout,
    #[error("Pathing service unavailable: {0}")]
    Unavailable(String),
    #[error("Pathing service failed: {0}")]
    Service(String),
}
