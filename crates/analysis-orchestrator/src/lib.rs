use analysis_core::{
    Bar, DcfAssumptions, FundamentalsProfile, MarketDataSource, NewsArticle, StatementTable,
};
use fundamental_analysis::{compute_dcf, compute_wacc, normalize_fundamentals, Wacc};
use serde::{Deserialize, Serialize};
use technical_analysis::{compute_indicators, IndicatorSeries};

pub const DEFAULT_GROWTH_RATE: f64 = 0.10;
pub const DEFAULT_TERMINAL_GROWTH_RATE: f64 = 0.025;
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.10;

/// How many trailing bars feed the normalizer's price fallback
const RECENT_PRICE_TAIL: usize = 5;

/// Everything one analysis run produced for a ticker.
///
/// Metrics fail independently: a `None` WACC or intrinsic value means that
/// metric was unavailable, while the rest of the report still holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerReport {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub profile: FundamentalsProfile,
    pub indicators: IndicatorSeries,
    pub wacc: Option<Wacc>,
    pub intrinsic_value: Option<f64>,
    /// The assumptions the DCF actually ran with
    pub assumptions: DcfAssumptions,
    pub news: Vec<NewsArticle>,
}

/// Run the full pipeline for one ticker: fetch, normalize, and derive
/// indicators, WACC, and the DCF estimate.
///
/// Every provider call is wrapped independently, so one failed fetch
/// degrades that slice of the report instead of aborting the run. When the
/// caller supplies no assumptions, the computed WACC (when available)
/// becomes the discount rate.
pub async fn analyze_ticker(
    source: &dyn MarketDataSource,
    symbol: &str,
    period: &str,
    interval: &str,
    assumptions: Option<DcfAssumptions>,
) -> TickerReport {
    let bars = source
        .price_history(symbol, period, interval)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Price history unavailable for {}: {}", symbol, e);
            Vec::new()
        });

    let snapshot = source.fundamentals_snapshot(symbol).await.unwrap_or_else(|e| {
        tracing::warn!("Fundamentals snapshot unavailable for {}: {}", symbol, e);
        Default::default()
    });
    let fast_quote = source.fast_quote(symbol).await.unwrap_or_else(|e| {
        tracing::warn!("Fast quote unavailable for {}: {}", symbol, e);
        Default::default()
    });
    let cash_flow = fetch_table(source.cash_flow_statement(symbol).await, symbol, "cash flow");
    let balance_sheet = fetch_table(source.balance_sheet(symbol).await, symbol, "balance sheet");
    let income = fetch_table(source.income_statement(symbol).await, symbol, "income statement");

    let recent = &bars[bars.len().saturating_sub(RECENT_PRICE_TAIL)..];
    let profile = normalize_fundamentals(snapshot, &cash_flow, &balance_sheet, &fast_quote, recent);

    let indicators = compute_indicators(&bars);
    let wacc = compute_wacc(&profile, &income);

    let assumptions = assumptions.unwrap_or(DcfAssumptions {
        growth_rate: DEFAULT_GROWTH_RATE,
        terminal_growth_rate: DEFAULT_TERMINAL_GROWTH_RATE,
        discount_rate: wacc.map(|w| w.wacc).unwrap_or(DEFAULT_DISCOUNT_RATE),
    });
    let intrinsic_value = compute_dcf(&profile, &assumptions);

    let news = source.news(symbol).await.unwrap_or_else(|e| {
        tracing::warn!("News unavailable for {}: {}", symbol, e);
        Vec::new()
    });

    TickerReport {
        symbol: symbol.to_string(),
        bars,
        profile,
        indicators,
        wacc,
        intrinsic_value,
        assumptions,
        news,
    }
}

fn fetch_table(
    result: Result<StatementTable, analysis_core::AnalysisError>,
    symbol: &str,
    what: &str,
) -> StatementTable {
    result.unwrap_or_else(|e| {
        tracing::warn!("{} unavailable for {}: {}", what, symbol, e);
        StatementTable::new()
    })
}
