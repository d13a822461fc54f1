use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestmentType {
    Stock,
    Cryptocurrency,
    #[serde(rename = "ETF")]
    Etf,
    #[serde(rename = "Mutual Fund")]
    MutualFund,
    Bond,
    Commodity,
}

impl fmt::Display for InvestmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvestmentType::Stock => "Stock",
            InvestmentType::Cryptocurrency => "Cryptocurrency",
            InvestmentType::Etf => "ETF",
            InvestmentType::MutualFund => "Mutual Fund",
            InvestmentType::Bond => "Bond",
            InvestmentType::Commodity => "Commodity",
        };
        f.write_str(name)
    }
}

impl FromStr for InvestmentType {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "stock" => Ok(InvestmentType::Stock),
            "cryptocurrency" | "crypto" => Ok(InvestmentType::Cryptocurrency),
            "etf" => Ok(InvestmentType::Etf),
            "mutualfund" => Ok(InvestmentType::MutualFund),
            "bond" => Ok(InvestmentType::Bond),
            "commodity" => Ok(InvestmentType::Commodity),
            _ => Err(AnalyzerError::InvalidPortfolio(format!(
                "unknown investment type '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    pub amount: f64,
    #[serde(default)]
    pub notes: String,
}

impl PortfolioEntry {
    pub fn new(investment_type: InvestmentType, amount: f64, notes: impl Into<String>) -> Result<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(AnalyzerError::InvalidPortfolio(format!(
                "amount must be a non-negative number, got {}",
                amount
            )));
        }

        Ok(Self {
            investment_type,
            amount,
            notes: notes.into(),
        })
    }
}

/// Holdings keyed by symbol. Ordered, so the prompt rendering is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Portfolio {
    entries: BTreeMap<String, PortfolioEntry>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON mapping of symbol to entry, validating every amount.
    pub fn from_json(json: &str) -> Result<Self> {
        let portfolio: Portfolio = serde_json::from_str(json)
            .map_err(|e| AnalyzerError::InvalidPortfolio(e.to_string()))?;

        let mut validated = Portfolio::new();
        for (symbol, entry) in portfolio.entries {
            let entry = PortfolioEntry::new(entry.investment_type, entry.amount, entry.notes)?;
            validated.insert(symbol, entry)?;
        }
        Ok(validated)
    }

    /// Add or replace the holding for `symbol`.
    pub fn insert(&mut self, symbol: impl Into<String>, entry: PortfolioEntry) -> Result<()> {
        let symbol = symbol.into().trim().to_string();
        if symbol.is_empty() {
            return Err(AnalyzerError::InvalidPortfolio(
                "symbol must not be empty".to_string(),
            ));
        }
        self.entries.insert(symbol, entry);
        Ok(())
    }

    pub fn remove(&mut self, symbol: &str) -> Option<PortfolioEntry> {
        self.entries.remove(symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&PortfolioEntry> {
        self.entries.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PortfolioEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty JSON block embedded in the analysis prompt.
    pub fn to_prompt_block(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}
