/// Failure to fetch a snapshot from the intake API.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("GET {path} returned {status}: {message}")]
    Api {
        path: String,
        status: u16,
        message: String,
    },
    #[error("no response within {0:?}")]
    TimedOut(std::time::Duration),
}

pub type DashboardResult<T> = std::result::Result<T, DashboardError>;
