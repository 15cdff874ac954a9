use analysis_core::Bar;
use serde::{Deserialize, Serialize};

use crate::indicators::{macd, rsi, sma};

pub const SMA_SHORT_WINDOW: usize = 20;
pub const SMA_LONG_WINDOW: usize = 50;
pub const RSI_WINDOW: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Indicator columns parallel to a bar sequence.
///
/// Every column has the same length as the bars it was computed over;
/// entries before an indicator's window fills are `None`, never zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub sma_20: Vec<Option<f64>>,
    pub sma_50: Vec<Option<f64>>,
    pub rsi_14: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.sma_20.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sma_20.is_empty()
    }
}

/// Compute the standard indicator set over a price history.
///
/// Pure and deterministic. A series shorter than the smallest window still
/// yields a full-length result with all-`None` columns.
pub fn compute_indicators(bars: &[Bar]) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let macd_series = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);

    IndicatorSeries {
        sma_20: sma(&closes, SMA_SHORT_WINDOW),
        sma_50: sma(&closes, SMA_LONG_WINDOW),
        rsi_14: rsi(&closes, RSI_WINDOW),
        macd: macd_series.macd_line,
        macd_signal: macd_series.signal_line,
    }
}
