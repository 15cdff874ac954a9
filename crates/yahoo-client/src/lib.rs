use analysis_core::{
    AnalysisError, Bar, FastQuote, FundamentalsSnapshot, MarketDataSource, NewsArticle,
    StatementTable, ROW_CAPITAL_EXPENDITURE, ROW_CASH_AND_EQUIVALENTS, ROW_CASH_EQUIVALENTS_STI,
    ROW_FREE_CASH_FLOW, ROW_INTEREST_EXPENSE, ROW_LONG_TERM_DEBT, ROW_OPERATING_CASH_FLOW,
    ROW_TOTAL_DEBT,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) ticker-scope/0.1";

/// Ranges the chart endpoint accepts
const VALID_RANGES: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];
/// Bar intervals the chart endpoint accepts
const VALID_INTERVALS: &[&str] = &[
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Need to wait until the oldest request falls out of the window
            let wait_until = ts.front().unwrap().checked_add(self.window).unwrap();
            let sleep_dur = wait_until.duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for Yahoo API slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Yahoo Finance market data client.
///
/// Unauthenticated endpoints; Yahoo throttles aggressively, so all calls
/// go through the shared rate limiter and a bounded 429 retry.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl YahooClient {
    pub fn new() -> Self {
        // Conservative default for the public endpoints. Override with
        // YAHOO_RATE_LIMIT for a local proxy.
        let rate_limit: usize = std::env::var("YAHOO_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, AnalysisError> {
        let request = builder
            .build()
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 10u64;
            tracing::warn!(
                "Yahoo 429 rate limited, waiting {}s before retry {}/3",
                wait_secs,
                attempt + 1
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(AnalysisError::ApiError(
            "Rate limited by Yahoo after 3 retries".to_string(),
        ))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AnalysisError> {
        let response = self.send_request(self.client.get(url).query(query)).await?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))
    }

    async fn chart(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<ChartResult, AnalysisError> {
        let url = format!("{}/v8/finance/chart/{}", BASE_URL, symbol);
        let response: ChartResponse = self
            .get_json(&url, &[("range", range), ("interval", interval), ("includePrePost", "false")])
            .await?;

        response
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| {
                AnalysisError::InsufficientData(format!("No chart data for {}", symbol))
            })
    }

    async fn quote_summary(
        &self,
        symbol: &str,
        modules: &str,
    ) -> Result<QuoteSummaryResult, AnalysisError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", BASE_URL, symbol);
        let response: QuoteSummaryResponse =
            self.get_json(&url, &[("modules", modules)]).await?;

        response
            .quote_summary
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| {
                AnalysisError::InsufficientData(format!("No quote summary for {}", symbol))
            })
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn price_history(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<Bar>, AnalysisError> {
        // Reject unsupported parameters locally instead of bouncing them
        // off the endpoint.
        if !VALID_RANGES.contains(&period) {
            return Err(AnalysisError::InvalidData(format!(
                "Unsupported period '{}'",
                period
            )));
        }
        if !VALID_INTERVALS.contains(&interval) {
            return Err(AnalysisError::InvalidData(format!(
                "Unsupported interval '{}'",
                interval
            )));
        }

        let result = self.chart(symbol, period, interval).await?;
        Ok(bars_from_chart(result))
    }

    async fn fundamentals_snapshot(
        &self,
        symbol: &str,
    ) -> Result<FundamentalsSnapshot, AnalysisError> {
        let summary = self
            .quote_summary(symbol, "price,summaryDetail,defaultKeyStatistics,financialData")
            .await?;

        let price = summary.price.unwrap_or_default();
        let detail = summary.summary_detail.unwrap_or_default();
        let stats = summary.key_statistics.unwrap_or_default();
        let financial = summary.financial_data.unwrap_or_default();

        Ok(FundamentalsSnapshot {
            current_price: raw(&financial.current_price),
            regular_market_price: raw(&price.regular_market_price),
            market_cap: raw(&price.market_cap),
            fifty_two_week_high: raw(&detail.fifty_two_week_high),
            shares_outstanding: raw(&stats.shares_outstanding),
            free_cash_flow: raw(&financial.free_cash_flow),
            total_debt: raw(&financial.total_debt),
            total_cash: raw(&financial.total_cash),
            beta: raw(&detail.beta),
            currency: price.currency,
        })
    }

    async fn fast_quote(&self, symbol: &str) -> Result<FastQuote, AnalysisError> {
        let url = format!("{}/v7/finance/quote", BASE_URL);
        let response: QuoteV7Response = self.get_json(&url, &[("symbols", symbol)]).await?;

        let quote = response
            .quote_response
            .result
            .into_iter()
            .next()
            .unwrap_or_default();

        Ok(FastQuote {
            last_price: quote.regular_market_price,
            shares: quote.shares_outstanding,
        })
    }

    async fn cash_flow_statement(&self, symbol: &str) -> Result<StatementTable, AnalysisError> {
        let summary = self.quote_summary(symbol, "cashflowStatementHistory").await?;
        let periods = summary
            .cash_flow_history
            .map(|h| h.statements)
            .unwrap_or_default();

        let mut table = StatementTable::new();
        if periods.is_empty() {
            return Ok(table);
        }

        table.insert_row(
            ROW_FREE_CASH_FLOW,
            periods.iter().map(|p| raw(&p.free_cash_flow)).collect(),
        );
        table.insert_row(
            ROW_OPERATING_CASH_FLOW,
            periods.iter().map(|p| raw(&p.operating_cash_flow)).collect(),
        );
        table.insert_row(
            ROW_CAPITAL_EXPENDITURE,
            periods.iter().map(|p| raw(&p.capital_expenditure)).collect(),
        );
        Ok(table)
    }

    async fn balance_sheet(&self, symbol: &str) -> Result<StatementTable, AnalysisError> {
        let summary = self.quote_summary(symbol, "balanceSheetHistory").await?;
        let periods = summary
            .balance_sheet_history
            .map(|h| h.statements)
            .unwrap_or_default();

        let mut table = StatementTable::new();
        if periods.is_empty() {
            return Ok(table);
        }

        table.insert_row(
            ROW_CASH_AND_EQUIVALENTS,
            periods.iter().map(|p| raw(&p.cash)).collect(),
        );
        table.insert_row(
            ROW_CASH_EQUIVALENTS_STI,
            periods
                .iter()
                .map(|p| sum_present(raw(&p.cash), raw(&p.short_term_investments)))
                .collect(),
        );
        table.insert_row(
            ROW_LONG_TERM_DEBT,
            periods.iter().map(|p| raw(&p.long_term_debt)).collect(),
        );
        // Yahoo reports debt split short/long; the canonical row carries
        // whatever components were present.
        table.insert_row(
            ROW_TOTAL_DEBT,
            periods
                .iter()
                .map(|p| sum_present(raw(&p.short_long_term_debt), raw(&p.long_term_debt)))
                .collect(),
        );
        Ok(table)
    }

    async fn income_statement(&self, symbol: &str) -> Result<StatementTable, AnalysisError> {
        let summary = self.quote_summary(symbol, "incomeStatementHistory").await?;
        let periods = summary
            .income_history
            .map(|h| h.statements)
            .unwrap_or_default();

        let mut table = StatementTable::new();
        if periods.is_empty() {
            return Ok(table);
        }

        table.insert_row(
            ROW_INTEREST_EXPENSE,
            periods.iter().map(|p| raw(&p.interest_expense)).collect(),
        );
        Ok(table)
    }

    async fn news(&self, symbol: &str) -> Result<Vec<NewsArticle>, AnalysisError> {
        let url = format!("{}/v1/finance/search", BASE_URL);
        let response: SearchResponse = self
            .get_json(&url, &[("q", symbol), ("newsCount", "10"), ("quotesCount", "0")])
            .await?;

        Ok(response
            .news
            .into_iter()
            .filter_map(|item| {
                let title = item.title?;
                Some(NewsArticle {
                    title,
                    publisher: item.publisher,
                    url: item.link,
                    published: item
                        .provider_publish_time
                        .and_then(|ts| DateTime::from_timestamp(ts, 0)),
                })
            })
            .collect())
    }
}

fn bars_from_chart(result: ChartResult) -> Vec<Bar> {
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            Some(Bar {
                timestamp: DateTime::from_timestamp(ts, 0)?,
                open: *quote.open.get(i)?.as_ref()?,
                high: *quote.high.get(i)?.as_ref()?,
                low: *quote.low.get(i)?.as_ref()?,
                close: *quote.close.get(i)?.as_ref()?,
                volume: *quote.volume.get(i)?.as_ref()?,
            })
        })
        .collect()
}

/// Both sides absent stays unknown; otherwise missing components count as zero.
fn sum_present(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        _ => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}

/// Yahoo wraps numbers as `{"raw": ..., "fmt": "..."}`
#[derive(Debug, Clone, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw)
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSummaryResult {
    price: Option<PriceModule>,
    #[serde(rename = "summaryDetail")]
    summary_detail: Option<SummaryDetailModule>,
    #[serde(rename = "defaultKeyStatistics")]
    key_statistics: Option<KeyStatisticsModule>,
    #[serde(rename = "financialData")]
    financial_data: Option<FinancialDataModule>,
    #[serde(rename = "cashflowStatementHistory")]
    cash_flow_history: Option<CashFlowHistoryModule>,
    #[serde(rename = "balanceSheetHistory")]
    balance_sheet_history: Option<BalanceSheetHistoryModule>,
    #[serde(rename = "incomeStatementHistory")]
    income_history: Option<IncomeHistoryModule>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceModule {
    #[serde(rename = "marketCap")]
    market_cap: Option<RawValue>,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<RawValue>,
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetailModule {
    #[serde(rename = "fiftyTwoWeekHigh")]
    fifty_two_week_high: Option<RawValue>,
    beta: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyStatisticsModule {
    #[serde(rename = "sharesOutstanding")]
    shares_outstanding: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct FinancialDataModule {
    #[serde(rename = "currentPrice")]
    current_price: Option<RawValue>,
    #[serde(rename = "freeCashflow")]
    free_cash_flow: Option<RawValue>,
    #[serde(rename = "totalDebt")]
    total_debt: Option<RawValue>,
    #[serde(rename = "totalCash")]
    total_cash: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct CashFlowHistoryModule {
    #[serde(rename = "cashflowStatements", default)]
    statements: Vec<CashFlowPeriod>,
}

#[derive(Debug, Deserialize)]
struct CashFlowPeriod {
    #[serde(rename = "totalCashFromOperatingActivities")]
    operating_cash_flow: Option<RawValue>,
    #[serde(rename = "capitalExpenditures")]
    capital_expenditure: Option<RawValue>,
    #[serde(rename = "freeCashFlow")]
    free_cash_flow: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct BalanceSheetHistoryModule {
    #[serde(rename = "balanceSheetStatements", default)]
    statements: Vec<BalanceSheetPeriod>,
}

#[derive(Debug, Deserialize)]
struct BalanceSheetPeriod {
    cash: Option<RawValue>,
    #[serde(rename = "shortTermInvestments")]
    short_term_investments: Option<RawValue>,
    #[serde(rename = "longTermDebt")]
    long_term_debt: Option<RawValue>,
    #[serde(rename = "shortLongTermDebt")]
    short_long_term_debt: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct IncomeHistoryModule {
    #[serde(rename = "incomeStatementHistory", default)]
    statements: Vec<IncomePeriod>,
}

#[derive(Debug, Deserialize)]
struct IncomePeriod {
    #[serde(rename = "interestExpense")]
    interest_expense: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct QuoteV7Response {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteV7Envelope,
}

#[derive(Debug, Deserialize)]
struct QuoteV7Envelope {
    #[serde(default)]
    result: Vec<QuoteV7>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteV7 {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "sharesOutstanding")]
    shares_outstanding: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNewsItem>,
}

#[derive(Debug, Deserialize)]
struct SearchNewsItem {
    title: Option<String>,
    publisher: Option<String>,
    link: Option<String>,
    #[serde(rename = "providerPublishTime")]
    provider_publish_time: Option<i64>,
}
