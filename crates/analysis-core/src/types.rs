use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar data, ordered ascending by timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Raw fundamentals snapshot as the provider returned it.
///
/// Field availability is not guaranteed: any of these can be missing for a
/// given ticker, and `None` means "unknown", not zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalsSnapshot {
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub total_debt: Option<f64>,
    pub total_cash: Option<f64>,
    pub beta: Option<f64>,
    pub currency: Option<String>,
}

/// Fundamentals after gap-filling. Same shape as the snapshot; produced
/// once per analysis run and never cached by the core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsProfile {
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub total_debt: Option<f64>,
    pub total_cash: Option<f64>,
    pub beta: Option<f64>,
    pub currency: Option<String>,
}

impl From<FundamentalsSnapshot> for FundamentalsProfile {
    fn from(s: FundamentalsSnapshot) -> Self {
        Self {
            current_price: s.current_price,
            regular_market_price: s.regular_market_price,
            market_cap: s.market_cap,
            fifty_two_week_high: s.fifty_two_week_high,
            shares_outstanding: s.shares_outstanding,
            free_cash_flow: s.free_cash_flow,
            total_debt: s.total_debt,
            total_cash: s.total_cash,
            beta: s.beta,
            currency: s.currency,
        }
    }
}

/// Lightweight quote: last traded price plus shares outstanding.
/// Used as a fallback source during normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FastQuote {
    pub last_price: Option<f64>,
    pub shares: Option<f64>,
}

/// User-supplied DCF assumptions as fractional decimals (0.10 = 10%)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DcfAssumptions {
    pub growth_rate: f64,
    pub terminal_growth_rate: f64,
    pub discount_rate: f64,
}

/// News article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub publisher: Option<String>,
    pub url: Option<String>,
    pub published: Option<DateTime<Utc>>,
}
