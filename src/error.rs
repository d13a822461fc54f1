use thiserror::Error;

/// Failures surfaced by the analysis pipeline.
///
/// Every variant renders a short message meant to be shown to the user as-is.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Could not read video information: {0}")]
    Metadata(String),

    #[error("Error downloading video: {0}")]
    Download(String),

    #[error("Video is over the {budget_mb}MB limit and this platform cannot be analyzed by URL")]
    SizeBudgetExceeded { budget_mb: f64 },

    #[error("File size {size_mb:.1}MB exceeds the {budget_mb}MB limit. Please upload a smaller file.")]
    UploadTooLarge { size_mb: f64, budget_mb: f64 },

    #[error("Error analyzing video: {0}")]
    Transport(String),

    #[error("Failed to parse analysis results: {reason}")]
    Parse { reason: String, excerpt: String },

    #[error("Invalid portfolio: {0}")]
    InvalidPortfolio(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalyzerError {
    /// Soft errors degrade the result instead of aborting the invocation.
    pub fn is_soft(&self) -> bool {
        matches!(self, AnalyzerError::Metadata(_))
    }

    /// Diagnostic excerpt of the raw service reply, for parse failures.
    pub fn excerpt(&self) -> Option<&str> {
        match self {
            AnalyzerError::Parse { excerpt, .. } => Some(excerpt),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
