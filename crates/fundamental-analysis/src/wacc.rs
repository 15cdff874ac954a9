use analysis_core::{
    FundamentalsProfile, StatementTable, ROW_INTEREST_EXPENSE,
    ROW_INTEREST_EXPENSE_NON_OPERATING,
};
use serde::{Deserialize, Serialize};

/// Approx. 10y Treasury yield
pub const RISK_FREE_RATE: f64 = 0.0425;
/// Historical average range is 4-6%
pub const EQUITY_RISK_PREMIUM: f64 = 0.05;
/// US corporate tax rate
pub const CORPORATE_TAX_RATE: f64 = 0.21;
/// Used when interest expense or total debt cannot pin down a real figure
pub const FALLBACK_COST_OF_DEBT: f64 = 0.045;

/// Weighted average cost of capital with its two legs.
/// All three come together or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wacc {
    pub wacc: f64,
    pub cost_of_equity: f64,
    pub cost_of_debt: f64,
}

/// Compute WACC from a normalized profile and an income statement.
///
/// Returns `None` when beta or market cap is unknown; a company with no
/// (or unknown) debt degenerates to the all-equity case where WACC equals
/// the CAPM cost of equity.
pub fn compute_wacc(profile: &FundamentalsProfile, income: &StatementTable) -> Option<Wacc> {
    let beta = profile.beta?;
    let cost_of_equity = RISK_FREE_RATE + beta * EQUITY_RISK_PREMIUM;

    let interest_expense = income
        .latest(ROW_INTEREST_EXPENSE)
        .or_else(|| income.latest(ROW_INTEREST_EXPENSE_NON_OPERATING))
        .map(f64::abs)
        .unwrap_or(0.0);

    let market_cap = profile.market_cap?;

    let total_debt = match profile.total_debt {
        Some(debt) if debt > 0.0 => debt,
        // No debt on the books: the blend collapses to the equity leg
        _ => {
            return Some(Wacc {
                wacc: cost_of_equity,
                cost_of_equity,
                cost_of_debt: 0.0,
            })
        }
    };

    let cost_of_debt = if interest_expense > 0.0 {
        interest_expense / total_debt
    } else {
        FALLBACK_COST_OF_DEBT
    };

    let total_value = market_cap + total_debt;
    let equity_weight = market_cap / total_value;
    let debt_weight = total_debt / total_value;
    let wacc = equity_weight * cost_of_equity
        + debt_weight * cost_of_debt * (1.0 - CORPORATE_TAX_RATE);

    Some(Wacc { wacc, cost_of_equity, cost_of_debt })
}
