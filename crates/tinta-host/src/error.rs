use tinta_core::PixelError;

/// Failures of a single arena primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("compute module cannot allocate {requested} bytes")]
    OutOfCapacity { requested: usize },
    /// An offset/size mismatch between host and module. Never performed.
    #[error("arena contract violation: {0}")]
    ContractViolation(String),
}

/// Why a transform call failed. The caller's buffer is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("compute module is not ready")]
    NotReady,
    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(#[from] PixelError),
    #[error("compute module cannot allocate {requested} bytes")]
    Allocation { requested: usize },
    #[error("compute module is busy with another transform")]
    Busy,
    /// Internal: the invoker and the arena disagreed about a region.
    #[error("arena contract violation: {0}")]
    ContractViolation(String),
}

impl From<ArenaError> for TransformError {
    fn from(err: ArenaError) -> Self {
        match err {
            ArenaError::OutOfCapacity { requested } => Self::Allocation { requested },
            ArenaError::ContractViolation(detail) => Self::ContractViolation(detail),
        }
    }
}
