//! Error types for the georeference tiling pipeline.

use thiserror::Error;

/// Result type alias using GeorefError.
pub type GeorefResult<T> = Result<T, GeorefError>;

/// Primary error type for pipeline operations.
///
/// Every variant is a deterministic function of the input, so none of them
/// are worth retrying without changing the description or configuration.
#[derive(Debug, Error)]
pub enum GeorefError {
    // === Input Errors ===
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error(
        "Insufficient control points: {points} supplied, a polynomial of order {order} needs at least {required}"
    )]
    InsufficientControlPoints {
        points: usize,
        required: usize,
        order: u32,
    },

    #[error("Invalid configuration value for '{param}': {message}")]
    InvalidConfig { param: String, message: String },

    // === Numerical Errors ===
    #[error("Degenerate control point layout: {0}")]
    DegenerateFit(String),

    #[error("Empty raster: {0}")]
    EmptyRaster(String),

    // === Encoding Errors ===
    #[error("Failed to decode image: {0}")]
    Image(String),

    #[error("Failed to encode tile: {0}")]
    Encode(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl GeorefError {
    /// True when the error is caused by the description or configuration,
    /// meaning the caller has to fix its input rather than the tool.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            GeorefError::MalformedInput(_)
                | GeorefError::InsufficientControlPoints { .. }
                | GeorefError::InvalidConfig { .. }
                | GeorefError::DegenerateFit(_)
                | GeorefError::EmptyRaster(_)
                | GeorefError::Json(_)
        )
    }

    /// Short machine-readable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            GeorefError::MalformedInput(_) => "malformed_input",
            GeorefError::InsufficientControlPoints { .. } => "insufficient_control_points",
            GeorefError::InvalidConfig { .. } => "invalid_config",
            GeorefError::DegenerateFit(_) => "degenerate_fit",
            GeorefError::EmptyRaster(_) => "empty_raster",
            GeorefError::Image(_) => "image",
            GeorefError::Encode(_) => "encode",
            GeorefError::Io(_) => "io",
            GeorefError::Json(_) => "json",
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        GeorefError::MalformedInput(message.into())
    }

    pub fn invalid_config(param: impl Into<String>, message: impl Into<String>) -> Self {
        GeorefError::InvalidConfig {
            param: param.into(),
            message: message.into(),
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for GeorefError {
    fn from(err: std::io::Error) -> Self {
        GeorefError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GeorefError {
    fn from(err: serde_json::Error) -> Self {
        GeorefError::Json(err.to_string())
    }
}
