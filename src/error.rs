use thiserror::Error;

/// Top-level error kinds for the routing core.
///
/// `SearchTimeout` and `Unreachable` are not always fatal — the orchestrator
/// downgrades them to best-effort results when the companion pipeline still
/// produced routes. They are represented here so callers can make that
/// judgment instead of losing the distinction to a generic error string.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("weather provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("weather provider timed out after {0:?}")]
    ProviderTimeout(std::time::Duration),

    #[error("no productive heading from origin")]
    Unreachable,

    #[error("search hit its wave/time cap before finding a solution")]
    SearchTimeout,

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error, PartialEq, Clone, Copy)]
pub enum GeoError {
    #[error("latitude {0} out of range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} out of range [-180, 180]")]
    LongitudeOutOfRange(f64),
}

pub type Result<T> = std::result::Result<T, RouterError>;
