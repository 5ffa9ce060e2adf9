/// Failure listing the recipient roster. A collaborator concern; the
/// engine propagates it instead of absorbing it.
#[derive(Clone, Debug, thiserror::Error)]
#[error("recipient source unavailable: {0}")]
pub struct SourceError(pub String);

/// Failure delivering to a single recipient. The reason is opaque to
/// the dispatcher — only its occurrence is counted.
#[derive(Clone, Debug, thiserror::Error)]
#[error("delivery failed: {0}")]
pub struct SendError(pub String);
