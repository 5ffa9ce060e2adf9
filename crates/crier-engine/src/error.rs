use crier_core::errors::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("recipient source error: {0}")]
    Source(#[from] SourceError),
}
