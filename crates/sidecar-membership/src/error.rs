#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("node metadata does not fit within the {limit}-byte budget")]
    NodeMetaTooLarge { limit: usize },
    #[error("failed to encode node metadata")]
    EncodeMeta(#[source] serde_json::Error),
    #[error("failed to decode anti-entropy state")]
    DecodeState(#[source] sidecar_catalog::Error),
    #[error("failed to encode local state")]
    EncodeState(#[source] sidecar_catalog::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
