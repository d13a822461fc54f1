use crate::config::Config;
use crate::error::AnalyzerError;
use crate::pipeline::{AnalysisMethod, AnalysisReport, Analyzer, UploadedVideo, VideoInput, VideoSource};
use crate::portfolio::{Portfolio, PortfolioEntry};
use crate::utils::mime_for_path;
use anyhow::{Context, Result};
use clap::Parser;
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vidfolio")]
#[command(about = "Analyze a video for relevance to your investment portfolio")]
#[command(version)]
pub struct Cli {
    /// Video URL to analyze
    #[arg(value_name = "URL", required_unless_present = "upload", conflicts_with = "upload")]
    pub url: Option<String>,

    /// Analyze a local video file instead of a URL
    #[arg(short, long, value_name = "FILE")]
    pub upload: Option<PathBuf>,

    /// MIME type of the uploaded file (guessed from its extension by default)
    #[arg(long, requires = "upload")]
    pub mime_type: Option<String>,

    /// Portfolio JSON file, e.g. {"AAPL": {"type": "Stock", "amount": 1000, "notes": ""}}
    #[arg(short, long, value_name = "FILE")]
    pub portfolio: Option<PathBuf>,

    /// Holding as SYMBOL:TYPE:AMOUNT[:NOTES]; may be repeated
    #[arg(short = 'H', long = "holding", value_name = "SPEC")]
    pub holdings: Vec<String>,

    /// Config file (defaults to ./vidfolio.toml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum video size in MB
    #[arg(long)]
    pub max_size_mb: Option<f64>,

    /// Download videos even when the platform can be analyzed by URL
    #[arg(long)]
    pub prefer_download: bool,

    /// Print the analysis result as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(max_size_mb) = self.max_size_mb {
            config.size_budget_mb = max_size_mb;
        }
        config.prefer_download |= self.prefer_download;

        let portfolio = self.load_portfolio()?;
        if portfolio.is_empty() {
            anyhow::bail!("Please add your investment details with --portfolio or --holding to get started");
        }

        let analyzer = Analyzer::from_config(&config)?;
        let input = self.video_input(&analyzer).await?;

        match analyzer.analyze(input, &portfolio).await {
            Ok(report) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&report.result)?);
                } else {
                    print!("{}", render_report(&report));
                }
                Ok(())
            }
            Err(e) => {
                if let Some(excerpt) = e.excerpt() {
                    eprintln!("Raw response: {}...", excerpt);
                }
                Err(e.into())
            }
        }
    }

    fn load_portfolio(&self) -> Result<Portfolio> {
        let mut portfolio = match &self.portfolio {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read portfolio {}", path.display()))?;
                Portfolio::from_json(&json)?
            }
            None => Portfolio::new(),
        };

        for holding in &self.holdings {
            let (symbol, entry) = parse_holding(holding)?;
            portfolio.insert(symbol, entry)?;
        }

        Ok(portfolio)
    }

    async fn video_input(&self, analyzer: &Analyzer) -> Result<VideoInput> {
        let Some(path) = &self.upload else {
            let url = self
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Either a URL or --upload is required"))?;
            return Ok(VideoInput::Url(url));
        };

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let upload = UploadedVideo {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.mp4".to_string()),
            mime_type: self
                .mime_type
                .clone()
                .unwrap_or_else(|| mime_for_path(path).to_string()),
            bytes,
        };

        if upload.size_mb() > analyzer.size_budget_mb() {
            return Err(AnalyzerError::UploadTooLarge {
                size_mb: upload.size_mb(),
                budget_mb: analyzer.size_budget_mb(),
            }
            .into());
        }

        Ok(VideoInput::Upload(upload))
    }
}

/// Parse `SYMBOL:TYPE:AMOUNT[:NOTES]`.
pub fn parse_holding(holding: &str) -> Result<(String, PortfolioEntry)> {
    let mut parts = holding.splitn(4, ':');
    let (Some(symbol), Some(kind), Some(amount)) = (parts.next(), parts.next(), parts.next()) else {
        anyhow::bail!("Invalid holding '{}', expected SYMBOL:TYPE:AMOUNT[:NOTES]", holding);
    };
    let notes = parts.next().unwrap_or("");

    let amount: f64 = amount
        .trim()
        .parse()
        .with_context(|| format!("Invalid amount in holding '{}'", holding))?;
    let entry = PortfolioEntry::new(kind.parse()?, amount, notes.trim())?;

    Ok((symbol.trim().to_string(), entry))
}

pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &AnalysisReport) -> std::fmt::Result {
    match &report.source {
        VideoSource::Url(metadata) => {
            writeln!(out, "Video Information")?;
            writeln!(out, "  Title: {}", metadata.title)?;
            writeln!(out, "  Duration: {} seconds", metadata.duration)?;
            writeln!(out, "  Platform: {}", metadata.platform)?;
        }
        VideoSource::Upload {
            filename,
            mime_type,
            size_mb,
        } => {
            writeln!(out, "File Information")?;
            writeln!(out, "  Filename: {}", filename)?;
            writeln!(out, "  Size: {:.1} MB", size_mb)?;
            writeln!(out, "  Type: {}", mime_type)?;
        }
    }

    let method = match report.method {
        AnalysisMethod::RemoteReference => "video URL sent directly",
        AnalysisMethod::DownloadedInline => "downloaded and uploaded inline",
        AnalysisMethod::UploadedInline => "uploaded file sent inline",
    };
    writeln!(out, "Analysis Method: {}", method)?;
    for warning in &report.warnings {
        writeln!(out, "Warning: {}", warning)?;
    }
    writeln!(out)?;

    let result = &report.result;
    let band = match result.relevance_score {
        s if s >= 80 => "Highly Relevant",
        s if s >= 50 => "Moderately Relevant",
        _ => "Low Relevance",
    };
    writeln!(out, "{} - Score: {}/100", band, result.relevance_score)?;

    if !result.content_summary.is_empty() {
        writeln!(out, "Content: {}", result.content_summary)?;
    }
    writeln!(out, "Relevance: {}", result.summary)?;

    for (heading, items) in [
        ("Matching Investments", &result.specific_matches),
        ("Key Insights", &result.key_insights),
        ("Suggested Actions", &result.action_items),
    ] {
        write_list(out, heading, items)?;
    }

    writeln!(
        out,
        "Risk Level: {}",
        result.risk_assessment.as_str().to_uppercase()
    )?;
    write_list(out, "Visual Elements", &result.visual_elements)?;

    Ok(())
}

fn write_list(out: &mut String, heading: &str, items: &[String]) -> std::fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", heading)?;
    for item in items {
        writeln!(out, "- {}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, RiskLevel};
    use crate::core::{Platform, VideoMetadata};
    use crate::portfolio::InvestmentType;

    #[test]
    fn test_parse_holding() {
        let (symbol, entry) = parse_holding("BTC:Cryptocurrency:1500.5:cold wallet: ledger").unwrap();
        assert_eq!(symbol, "BTC");
        assert_eq!(entry.investment_type, InvestmentType::Cryptocurrency);
        assert_eq!(entry.amount, 1500.5);
        assert_eq!(entry.notes, "cold wallet: ledger");

        let (_, entry) = parse_holding("VTI:etf:300").unwrap();
        assert_eq!(entry.investment_type, InvestmentType::Etf);
        assert!(entry.notes.is_empty());
    }

    #[test]
    fn test_parse_holding_rejects_bad_specs() {
        assert!(parse_holding("AAPL").is_err());
        assert!(parse_holding("AAPL:Stock:lots").is_err());
        assert!(parse_holding("AAPL:Stock:-10").is_err());
        assert!(parse_holding("AAPL:Painting:10").is_err());
    }

    #[test]
    fn test_cli_requires_url_or_upload() {
        assert!(Cli::try_parse_from(["vidfolio"]).is_err());
        assert!(Cli::try_parse_from(["vidfolio", "https://youtu.be/x", "--upload", "a.mp4"]).is_err());

        let cli = Cli::try_parse_from(["vidfolio", "https://youtu.be/x", "-H", "AAPL:Stock:10"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://youtu.be/x"));
        assert_eq!(cli.holdings, vec!["AAPL:Stock:10"]);
    }

    #[test]
    fn test_render_report() {
        let report = AnalysisReport {
            source: VideoSource::Url(VideoMetadata {
                title: "Fed Day".to_string(),
                duration: 600,
                url: "https://youtu.be/x".to_string(),
                platform: Platform::YouTube,
            }),
            method: AnalysisMethod::RemoteReference,
            result: AnalysisResult {
                relevance_score: 85,
                specific_matches: vec!["AAPL".to_string()],
                risk_assessment: RiskLevel::Medium,
                ..AnalysisResult::default()
            },
            warnings: vec![],
        };

        let rendered = render_report(&report);
        assert!(rendered.contains("Title: Fed Day"));
        assert!(rendered.contains("Highly Relevant - Score: 85/100"));
        assert!(rendered.contains("Matching Investments\n- AAPL"));
        assert!(rendered.contains("Risk Level: MEDIUM"));
        assert!(rendered.contains("Relevance: No summary available"));
        assert!(!rendered.contains("Key Insights"));
        assert!(!rendered.contains("Content:"));
    }
}
