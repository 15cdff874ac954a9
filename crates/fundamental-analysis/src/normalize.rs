use analysis_core::{
    Bar, FastQuote, FundamentalsProfile, FundamentalsSnapshot, StatementTable,
    ROW_CAPITAL_EXPENDITURE, ROW_CASH_AND_EQUIVALENTS, ROW_CASH_EQUIVALENTS_STI,
    ROW_FREE_CASH_FLOW, ROW_LONG_TERM_DEBT, ROW_OPERATING_CASH_FLOW, ROW_TOTAL_DEBT,
};

/// Reconcile a raw fundamentals snapshot against the statements, a fast
/// quote, and a recent price-history tail.
///
/// Each fallback fires only when the target field is still `None`, so a
/// provider-supplied value is never overwritten by a lower-confidence
/// source and re-running on an already-filled profile is a no-op. A
/// missing table or row just leaves the field unset.
pub fn normalize_fundamentals(
    snapshot: FundamentalsSnapshot,
    cash_flow: &StatementTable,
    balance_sheet: &StatementTable,
    fast_quote: &FastQuote,
    recent_bars: &[Bar],
) -> FundamentalsProfile {
    let mut profile = FundamentalsProfile::from(snapshot);

    if profile.current_price.is_none() || profile.regular_market_price.is_none() {
        if let Some(price) = resolve_price(fast_quote, recent_bars) {
            profile.current_price.get_or_insert(price);
            profile.regular_market_price.get_or_insert(price);
        }
    }

    if profile.shares_outstanding.is_none() {
        profile.shares_outstanding = fast_quote.shares;
    }

    if profile.free_cash_flow.is_none() {
        profile.free_cash_flow = resolve_free_cash_flow(cash_flow);
    }

    if profile.total_debt.is_none() {
        profile.total_debt = resolve_total_debt(balance_sheet);
    }

    if profile.total_cash.is_none() {
        profile.total_cash = resolve_total_cash(balance_sheet);
    }

    profile
}

/// Fast-quote last price, else the close of the most recent bar in the
/// trailing window.
fn resolve_price(fast_quote: &FastQuote, recent_bars: &[Bar]) -> Option<f64> {
    fast_quote
        .last_price
        .or_else(|| recent_bars.last().map(|b| b.close))
}

/// A reported "Free Cash Flow" row (first non-null, non-zero period), else
/// operating cash flow plus capital expenditure. Capex is stored signed
/// negative, so the sum is the subtraction.
fn resolve_free_cash_flow(cash_flow: &StatementTable) -> Option<f64> {
    cash_flow.first_nonzero(ROW_FREE_CASH_FLOW).or_else(|| {
        cash_flow
            .first_joint(ROW_OPERATING_CASH_FLOW, ROW_CAPITAL_EXPENDITURE)
            .map(|(ocf, capex)| ocf + capex)
    })
}

/// "Total Debt", else "Long Term Debt" as a partial proxy.
fn resolve_total_debt(balance_sheet: &StatementTable) -> Option<f64> {
    balance_sheet
        .latest(ROW_TOTAL_DEBT)
        .or_else(|| balance_sheet.latest(ROW_LONG_TERM_DEBT))
}

fn resolve_total_cash(balance_sheet: &StatementTable) -> Option<f64> {
    balance_sheet
        .latest(ROW_CASH_AND_EQUIVALENTS)
        .or_else(|| balance_sheet.latest(ROW_CASH_EQUIVALENTS_STI))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bar(close: f64) -> Bar {
        Bar {
            timestamp: Utc::now(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }

    fn empty() -> (StatementTable, StatementTable, FastQuote) {
        (StatementTable::new(), StatementTable::new(), FastQuote::default())
    }

    #[test]
    fn price_prefers_fast_quote_over_history() {
        let (cf, bs, _) = empty();
        let quote = FastQuote { last_price: Some(101.5), shares: None };
        let profile = normalize_fundamentals(
            FundamentalsSnapshot::default(),
            &cf,
            &bs,
            &quote,
            &[bar(99.0), bar(100.0)],
        );

        assert_eq!(profile.current_price, Some(101.5));
        assert_eq!(profile.regular_market_price, Some(101.5));
    }

    #[test]
    fn price_falls_back_to_last_close() {
        let (cf, bs, quote) = empty();
        let profile = normalize_fundamentals(
            FundamentalsSnapshot::default(),
            &cf,
            &bs,
            &quote,
            &[bar(99.0), bar(100.0)],
        );

        assert_eq!(profile.current_price, Some(100.0));
        assert_eq!(profile.regular_market_price, Some(100.0));
    }

    #[test]
    fn price_stays_none_without_sources() {
        let (cf, bs, quote) = empty();
        let profile =
            normalize_fundamentals(FundamentalsSnapshot::default(), &cf, &bs, &quote, &[]);

        assert_eq!(profile.current_price, None);
    }

    #[test]
    fn shares_never_overwritten() {
        let (cf, bs, _) = empty();
        let quote = FastQuote { last_price: None, shares: Some(999.0) };
        let snapshot = FundamentalsSnapshot {
            shares_outstanding: Some(500.0),
            ..Default::default()
        };
        let profile = normalize_fundamentals(snapshot, &cf, &bs, &quote, &[]);

        assert_eq!(profile.shares_outstanding, Some(500.0));
    }

    #[test]
    fn shares_filled_from_fast_quote() {
        let (cf, bs, _) = empty();
        let quote = FastQuote { last_price: None, shares: Some(999.0) };
        let profile =
            normalize_fundamentals(FundamentalsSnapshot::default(), &cf, &bs, &quote, &[]);

        assert_eq!(profile.shares_outstanding, Some(999.0));
    }

    #[test]
    fn fcf_direct_row_skips_null_and_zero_periods() {
        let (_, bs, quote) = empty();
        let mut cf = StatementTable::new();
        cf.insert_row(ROW_FREE_CASH_FLOW, vec![None, Some(0.0), Some(42.0)]);
        let profile =
            normalize_fundamentals(FundamentalsSnapshot::default(), &cf, &bs, &quote, &[]);

        assert_eq!(profile.free_cash_flow, Some(42.0));
    }

    #[test]
    fn fcf_falls_back_to_ocf_plus_capex() {
        let (_, bs, quote) = empty();
        let mut cf = StatementTable::new();
        cf.insert_row(ROW_OPERATING_CASH_FLOW, vec![Some(100.0), Some(90.0)]);
        cf.insert_row(ROW_CAPITAL_EXPENDITURE, vec![Some(-30.0), Some(-20.0)]);
        let profile =
            normalize_fundamentals(FundamentalsSnapshot::default(), &cf, &bs, &quote, &[]);

        assert_eq!(profile.free_cash_flow, Some(70.0));
    }

    #[test]
    fn fcf_fallback_scans_for_jointly_reported_period() {
        let (_, bs, quote) = empty();
        let mut cf = StatementTable::new();
        cf.insert_row(ROW_OPERATING_CASH_FLOW, vec![Some(100.0), Some(80.0)]);
        cf.insert_row(ROW_CAPITAL_EXPENDITURE, vec![None, Some(-25.0)]);
        let profile =
            normalize_fundamentals(FundamentalsSnapshot::default(), &cf, &bs, &quote, &[]);

        assert_eq!(profile.free_cash_flow, Some(55.0));
    }

    #[test]
    fn debt_prefers_total_debt_row() {
        let (cf, _, quote) = empty();
        let mut bs = StatementTable::new();
        bs.insert_row(ROW_TOTAL_DEBT, vec![Some(300.0)]);
        bs.insert_row(ROW_LONG_TERM_DEBT, vec![Some(200.0)]);
        let profile =
            normalize_fundamentals(FundamentalsSnapshot::default(), &cf, &bs, &quote, &[]);

        assert_eq!(profile.total_debt, Some(300.0));
    }

    #[test]
    fn debt_uses_long_term_proxy() {
        let (cf, _, quote) = empty();
        let mut bs = StatementTable::new();
        bs.insert_row(ROW_LONG_TERM_DEBT, vec![Some(200.0)]);
        let profile =
            normalize_fundamentals(FundamentalsSnapshot::default(), &cf, &bs, &quote, &[]);

        assert_eq!(profile.total_debt, Some(200.0));
    }

    #[test]
    fn cash_chain_order() {
        let (cf, _, quote) = empty();
        let mut bs = StatementTable::new();
        bs.insert_row(ROW_CASH_EQUIVALENTS_STI, vec![Some(150.0)]);
        let profile =
            normalize_fundamentals(FundamentalsSnapshot::default(), &cf, &bs, &quote, &[]);
        assert_eq!(profile.total_cash, Some(150.0));

        bs.insert_row(ROW_CASH_AND_EQUIVALENTS, vec![Some(120.0)]);
        let profile =
            normalize_fundamentals(FundamentalsSnapshot::default(), &cf, &bs, &quote, &[]);
        assert_eq!(profile.total_cash, Some(120.0));
    }

    #[test]
    fn normalization_is_idempotent() {
        let quote = FastQuote { last_price: Some(50.0), shares: Some(10.0) };
        let mut cf = StatementTable::new();
        cf.insert_row(ROW_OPERATING_CASH_FLOW, vec![Some(100.0)]);
        cf.insert_row(ROW_CAPITAL_EXPENDITURE, vec![Some(-30.0)]);
        let mut bs = StatementTable::new();
        bs.insert_row(ROW_TOTAL_DEBT, vec![Some(40.0)]);
        bs.insert_row(ROW_CASH_AND_EQUIVALENTS, vec![Some(15.0)]);

        let once = normalize_fundamentals(
            FundamentalsSnapshot::default(),
            &cf,
            &bs,
            &quote,
            &[bar(49.0)],
        );

        // Feed the filled profile back through as if it were the snapshot.
        let again = normalize_fundamentals(
            FundamentalsSnapshot {
                current_price: once.current_price,
                regular_market_price: once.regular_market_price,
                market_cap: once.market_cap,
                fifty_two_week_high: once.fifty_two_week_high,
                shares_outstanding: once.shares_outstanding,
                free_cash_flow: once.free_cash_flow,
                total_debt: once.total_debt,
                total_cash: once.total_cash,
                beta: once.beta,
                currency: once.currency.clone(),
            },
            &cf,
            &bs,
            &quote,
            &[bar(49.0)],
        );

        assert_eq!(once, again);
    }

    #[test]
    fn snapshot_values_survive_unchanged() {
        let (cf, bs, quote) = empty();
        let snapshot = FundamentalsSnapshot {
            current_price: Some(12.0),
            market_cap: Some(1_000.0),
            beta: Some(1.1),
            currency: Some("KRW".to_string()),
            ..Default::default()
        };
        let profile = normalize_fundamentals(snapshot, &cf, &bs, &quote, &[]);

        assert_eq!(profile.current_price, Some(12.0));
        assert_eq!(profile.market_cap, Some(1_000.0));
        assert_eq!(profile.beta, Some(1.1));
        assert_eq!(profile.currency.as_deref(), Some("KRW"));
    }
}
