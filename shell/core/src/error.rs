//! Engine errors

use thiserror::Error;

use crate::surface::SurfaceError;

/// Errors returned by the [`Application`](crate::Application)
#[derive(Debug, Error)]
pub enum ShellError {
    /// The surface failed to initialize, suspend or resume
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// No surface was installed and no factory is configured
    #[error("no surface installed and no surface factory configured")]
    NoSurface,

    /// The execution contexts were already started
    #[error("application is already running or has run")]
    AlreadyRunning,

    /// An execution context thread could not be started
    #[error("failed to spawn {context} thread: {source}")]
    Spawn {
        /// Name of the execution context
        context: &'static str,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// A replacement surface failed to initialize while running
    #[error("replacement surface failed to initialize: {0}")]
    Replacement(SurfaceError),
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, ShellError>;
