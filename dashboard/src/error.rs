use thiserror::Error;

/// User-correctable input problems. The message is what the status line shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ticker required")]
    MissingTicker,
    #[error("start required")]
    MissingStart,
    #[error("end required")]
    MissingEnd,
    #[error("start must be on or before end")]
    InvertedRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Non-2xx response; `excerpt` is the leading slice of the body.
    #[error("HTTP {status}: {excerpt}")]
    Http { status: u16, excerpt: String },
    #[error("Unexpected response shape from /api/factors.")]
    Shape,
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid JSON in response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("No data to plot.")]
    Empty,
}

/// Everything an Action can fail with; reduced to one status-line message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl DashboardError {
    pub fn is_validation(&self) -> bool {
        matches!(self, DashboardError::Validation(_))
    }
}
