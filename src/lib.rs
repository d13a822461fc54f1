pub mod analysis;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod extractors;
pub mod pipeline;
pub mod portfolio;
pub mod utils;

pub use crate::analysis::{AnalysisClient, AnalysisRequest, AnalysisResult, AnalysisService, ContentPayload, RiskLevel};
pub use crate::core::{AcquiredContent, ProviderEngine, VideoAcquirer, VideoInfoResolver, VideoMetadata, VideoProvider};
pub use crate::error::AnalyzerError;
pub use crate::pipeline::{AnalysisMethod, AnalysisReport, Analyzer, UploadedVideo, VideoInput};
pub use crate::portfolio::{InvestmentType, Portfolio, PortfolioEntry};
