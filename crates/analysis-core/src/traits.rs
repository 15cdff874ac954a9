use crate::{AnalysisError, Bar, FastQuote, FundamentalsSnapshot, NewsArticle, StatementTable};
use async_trait::async_trait;

/// Market data provider contract.
///
/// Every method is a single synchronous attempt from the caller's point of
/// view: it returns data or an error, and the caller decides how a failure
/// degrades. The core never retries here.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Price history at the requested period/interval ("1y", "1d" style).
    async fn price_history(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<Bar>, AnalysisError>;

    async fn fundamentals_snapshot(
        &self,
        symbol: &str,
    ) -> Result<FundamentalsSnapshot, AnalysisError>;

    async fn fast_quote(&self, symbol: &str) -> Result<FastQuote, AnalysisError>;

    async fn cash_flow_statement(&self, symbol: &str) -> Result<StatementTable, AnalysisError>;

    async fn balance_sheet(&self, symbol: &str) -> Result<StatementTable, AnalysisError>;

    async fn income_statement(&self, symbol: &str) -> Result<StatementTable, AnalysisError>;

    async fn news(&self, symbol: &str) -> Result<Vec<NewsArticle>, AnalysisError>;
}
