/// Simple Moving Average.
///
/// The output is aligned to the input: index `i` holds the average of the
/// trailing `period` values ending at `i`, and indices before the window
/// fills are `None`.
pub fn sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }

    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result[i] = Some(sum / period as f64);
    }
    result
}

/// Exponential Moving Average, seeded with the SMA of the first window.
pub fn ema(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut prev = data[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(prev);

    for i in period..data.len() {
        prev = (data[i] - prev) * multiplier + prev;
        result[i] = Some(prev);
    }
    result
}

/// Relative Strength Index using Wilder's average-gain/average-loss
/// smoothing. First defined value is at index `period`.
pub fn rsi(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period + 1 {
        return result;
    }

    // gains[k]/losses[k] correspond to the change into data[k + 1]
    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);
    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
    result[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in period + 1..data.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i - 1]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i - 1]) / period as f64;
        result[i] = Some(rsi_value(avg_gain, avg_loss));
    }
    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss == 0.0 {
        100.0
    } else {
        avg_gain / avg_loss
    };
    100.0 - (100.0 / (1.0 + rs))
}

/// MACD (Moving Average Convergence Divergence)
pub struct MacdSeries {
    pub macd_line: Vec<Option<f64>>,
    pub signal_line: Vec<Option<f64>>,
}

/// MACD line as fast EMA minus slow EMA, with a `signal_period` EMA of the
/// MACD line as the signal. Both columns stay aligned to the input; the
/// MACD line is defined from index `slow_period - 1` and the signal from
/// `slow_period + signal_period - 2`.
pub fn macd(
    data: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdSeries {
    let mut macd_line = vec![None; data.len()];
    let mut signal_line = vec![None; data.len()];

    if fast_period == 0
        || slow_period == 0
        || signal_period == 0
        || slow_period < fast_period
        || data.len() < slow_period
    {
        return MacdSeries { macd_line, signal_line };
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    for i in slow_period - 1..data.len() {
        if let (Some(fast), Some(slow)) = (ema_fast[i], ema_slow[i]) {
            macd_line[i] = Some(fast - slow);
        }
    }

    // Signal is an EMA over the defined portion of the MACD line,
    // re-padded back to the input alignment.
    let defined: Vec<f64> = macd_line.iter().flatten().copied().collect();
    let offset = slow_period - 1;
    for (j, value) in ema(&defined, signal_period).into_iter().enumerate() {
        signal_line[offset + j] = value;
    }

    MacdSeries { macd_line, signal_line }
}
