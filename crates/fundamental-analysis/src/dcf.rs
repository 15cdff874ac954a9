use analysis_core::{DcfAssumptions, FundamentalsProfile};

/// Explicit projection horizon in years
pub const DCF_HORIZON_YEARS: i32 = 5;

/// Intrinsic value per share from a normalized profile and user-supplied
/// assumptions.
///
/// Requires free cash flow and shares outstanding; net debt defaults each
/// missing side to zero independently. `None` signals the computation
/// could not complete, never a panic.
pub fn compute_dcf(profile: &FundamentalsProfile, assumptions: &DcfAssumptions) -> Option<f64> {
    let free_cash_flow = profile.free_cash_flow?;
    let shares_outstanding = profile.shares_outstanding?;
    let net_debt = profile.total_debt.unwrap_or(0.0) - profile.total_cash.unwrap_or(0.0);

    intrinsic_value_per_share(free_cash_flow, assumptions, shares_outstanding, net_debt)
}

/// Five-year projected-and-discounted cash flows plus a Gordon-growth
/// terminal value, netted for debt and divided across shares.
///
/// Degenerate inputs (discount rate equal to the terminal growth rate,
/// zero shares) yield `None`. A negative result is a valid output and is
/// surfaced as-is.
pub fn intrinsic_value_per_share(
    free_cash_flow: f64,
    assumptions: &DcfAssumptions,
    shares_outstanding: f64,
    net_debt: f64,
) -> Option<f64> {
    let DcfAssumptions { growth_rate, terminal_growth_rate, discount_rate } = *assumptions;

    if discount_rate == terminal_growth_rate || shares_outstanding == 0.0 {
        return None;
    }

    let discounted_projections: f64 = (1..=DCF_HORIZON_YEARS)
        .map(|i| {
            free_cash_flow * (1.0 + growth_rate).powi(i) / (1.0 + discount_rate).powi(i)
        })
        .sum();

    let terminal_fcf =
        free_cash_flow * (1.0 + growth_rate).powi(DCF_HORIZON_YEARS) * (1.0 + terminal_growth_rate);
    let terminal_value = terminal_fcf / (discount_rate - terminal_growth_rate);
    let discounted_terminal = terminal_value / (1.0 + discount_rate).powi(DCF_HORIZON_YEARS);

    let enterprise_value = discounted_projections + discounted_terminal;
    let equity_value = enterprise_value - net_debt;

    Some(equity_value / shares_outstanding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assumptions(growth: f64, terminal: f64, discount: f64) -> DcfAssumptions {
        DcfAssumptions {
            growth_rate: growth,
            terminal_growth_rate: terminal,
            discount_rate: discount,
        }
    }

    #[test]
    fn fixed_inputs_produce_known_value() {
        // growth == discount makes each projected year discount back to
        // the base FCF, and the terminal PV collapses to
        // fcf * (1 + terminal) / (discount - terminal).
        let value = intrinsic_value_per_share(
            100.0,
            &assumptions(0.10, 0.025, 0.10),
            10.0,
            50.0,
        )
        .unwrap();

        let expected = (5.0 * 100.0 + 100.0 * 1.025 / 0.075 - 50.0) / 10.0;
        assert!((value - expected).abs() < 1e-6);
    }

    #[test]
    fn rerun_is_bit_identical() {
        let a = intrinsic_value_per_share(100.0, &assumptions(0.10, 0.025, 0.10), 10.0, 50.0);
        let b = intrinsic_value_per_share(100.0, &assumptions(0.10, 0.025, 0.10), 10.0, 50.0);
        assert_eq!(a, b);
    }

    #[test]
    fn equal_discount_and_terminal_rate_is_degenerate() {
        let value = intrinsic_value_per_share(100.0, &assumptions(0.10, 0.05, 0.05), 10.0, 0.0);
        assert!(value.is_none());
    }

    #[test]
    fn zero_shares_is_degenerate() {
        let value = intrinsic_value_per_share(100.0, &assumptions(0.10, 0.025, 0.10), 0.0, 0.0);
        assert!(value.is_none());
    }

    #[test]
    fn negative_value_surfaces_unclamped() {
        // Massive net debt pushes equity value below zero.
        let value = intrinsic_value_per_share(
            100.0,
            &assumptions(0.02, 0.01, 0.12),
            10.0,
            1_000_000.0,
        )
        .unwrap();
        assert!(value < 0.0);
    }

    #[test]
    fn profile_requires_fcf_and_shares() {
        let a = assumptions(0.10, 0.025, 0.10);

        let missing_fcf = FundamentalsProfile {
            shares_outstanding: Some(10.0),
            ..Default::default()
        };
        assert!(compute_dcf(&missing_fcf, &a).is_none());

        let missing_shares = FundamentalsProfile {
            free_cash_flow: Some(100.0),
            ..Default::default()
        };
        assert!(compute_dcf(&missing_shares, &a).is_none());
    }

    #[test]
    fn net_debt_sides_default_to_zero_independently() {
        let a = assumptions(0.10, 0.025, 0.10);

        let with_cash_only = FundamentalsProfile {
            free_cash_flow: Some(100.0),
            shares_outstanding: Some(10.0),
            total_cash: Some(50.0),
            ..Default::default()
        };
        let with_neither = FundamentalsProfile {
            free_cash_flow: Some(100.0),
            shares_outstanding: Some(10.0),
            ..Default::default()
        };

        let v_cash = compute_dcf(&with_cash_only, &a).unwrap();
        let v_none = compute_dcf(&with_neither, &a).unwrap();

        // Cash with no debt means negative net debt: value per share rises
        // by cash / shares.
        assert!((v_cash - v_none - 5.0).abs() < 1e-9);
    }
}
