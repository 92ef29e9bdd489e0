use crate::controller::SessionId;
use ulid::Ulid;

pub type ManipulatorResult<T> = Result<T, ManipulatorError>;

#[derive(thiserror::Error, Debug)]
pub enum ManipulatorError {
    /// A drag or resize was started without a component to act on.
    #[error("target required")]
    TargetRequired,

    #[error("target component not found: {0}")]
    TargetNotFound(Ulid),

    #[error("an interaction session is already active")]
    SessionActive,

    #[error("no interaction session is active")]
    NoActiveSession,

    #[error("unknown session: {0:?}")]
    UnknownSession(SessionId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ManipulatorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
