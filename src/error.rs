use thiserror::Error;

/// Failure modes of a tempo analysis. None of them carries a fallback BPM.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("no peaks detected down to threshold {floor:.2}")]
    NoPeaksDetected { floor: f32 },
    #[error("no tempo candidate found from {peaks} peak(s)")]
    NoTempoCandidate { peaks: usize },
    #[error("analysis incomplete: {0}")]
    AnalysisIncomplete(String),
}

impl AnalysisError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
