pub mod client;
pub mod gemini;
pub mod parser;
pub mod request;
pub mod result;

pub use client::{AnalysisClient, AnalysisService};
pub use gemini::GeminiService;
pub use parser::parse;
pub use request::{AnalysisRequest, ContentPayload};
pub use result::{validate, AnalysisResult, RiskLevel};
