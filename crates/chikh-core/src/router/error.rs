use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouterError {
    #[error("Invalid route path: {0:?} (must start with '/')")]
    InvalidPath(String),

    #[error("Duplicate route path: {0}")]
    DuplicateRoute(String),

    #[error("Landing route {0} is not in the routing table")]
    UnknownLandingRoute(String),

    #[error("Landing route {0} requires sign-in")]
    ProtectedLandingRoute(String),
}
