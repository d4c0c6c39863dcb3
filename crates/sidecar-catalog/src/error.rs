#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to decode catalog state")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode catalog state")]
    Encode(#[source] serde_json::Error),
    #[error("no listener named '{0}' is registered")]
    NoSuchListener(String),
    #[error("listener '{0}' requires a buffered channel (capacity >= 1)")]
    UnbufferedListener(String),
    #[error("a listener named '{0}' is already registered")]
    DuplicateListener(String),
}

pub type Result<T> = std::result::Result<T, Error>;
