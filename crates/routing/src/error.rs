use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("directions request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("directions service answered HTTP {0}")]
    Status(u16),

    #[error("malformed directions response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no route found ({0})")]
    NoRoute(String),

    #[error("a route needs at least two coordinates, got {0}")]
    TooFewCoordinates(usize),
}
