//! Client-side library: API access, persisted session and the tab shell.

pub mod api;
pub mod session;
pub mod shell;
pub mod storage;

use thiserror::Error;

pub use api::{AuthApi, AuthPayload, HttpAuthApi};
pub use session::{SessionContext, SessionState, SessionUser};
pub use shell::{Panel, Shell, Tab};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error text reported by the server envelope.
    #[error("{0}")]
    Api(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
