use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("coordinate out of range: ({latitude}, {longitude})")]
pub struct CoordinateError {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no branches registered")]
    EmptyRegistry,
}

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("location lookup not supported: {0}")]
    Unsupported(String),

    #[error("geolocation service failed: {0}")]
    Service(String),

    #[error("geolocation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geolocation returned an invalid position: {0}")]
    InvalidCoordinate(#[from] CoordinateError),
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("branch file is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("invalid value '{value}' in column '{column}' on line {line}")]
    InvalidValue {
        column: &'static str,
        value: String,
        line: u64,
    },

    #[error("branch id '{0}' is listed more than once")]
    DuplicateId(String),

    #[error("branch '{id}' has an invalid position: {source}")]
    InvalidCoordinate {
        id: String,
        #[source]
        source: CoordinateError,
    },

    #[error("unknown branch '{0}'")]
    UnknownFacility(String),

    #[error("unsupported branch file format: {0}")]
    UnsupportedFormat(String),
}
