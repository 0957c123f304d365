// Error types for the gantry routing engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidRoutePattern { pattern: String, reason: String },

    #[error("route already registered: {0}")]
    RouteConflict(String),

    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("method not allowed for {path}; allowed: {allowed:?}")]
    MethodNotAllowed { path: String, allowed: Vec<String> },

    #[error("route lookup failed: {0}")]
    RouteLookup(String),

    #[error("no executable handler: {0}")]
    Handler(String),

    #[error("route cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::RouteNotFound(_) => 404,
            Error::MethodNotAllowed { .. } => 405,
            Error::InvalidRoutePattern { .. } => 500,
            Error::RouteConflict(_) => 500,
            Error::RouteLookup(_) => 500,
            Error::Handler(_) => 500,
            Error::Cache(_) => 500,
            Error::Io(_) => 500,
        }
    }

    /// The methods a 405 response should advertise in its `Allow` header,
    /// if this error carries them
    pub fn allowed_methods(&self) -> Option<&[String]> {
        match self {
            Error::MethodNotAllowed { allowed, .. } => Some(allowed),
            _ => None,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code())
    }
}
