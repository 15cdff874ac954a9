use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Canonical row labels. Providers report statements under varying names;
// adapters map onto these so the valuation layer can look rows up blind.
pub const ROW_FREE_CASH_FLOW: &str = "Free Cash Flow";
pub const ROW_OPERATING_CASH_FLOW: &str = "Operating Cash Flow";
pub const ROW_CAPITAL_EXPENDITURE: &str = "Capital Expenditure";
pub const ROW_TOTAL_DEBT: &str = "Total Debt";
pub const ROW_LONG_TERM_DEBT: &str = "Long Term Debt";
pub const ROW_CASH_AND_EQUIVALENTS: &str = "Cash And Cash Equivalents";
pub const ROW_CASH_EQUIVALENTS_STI: &str = "Cash Cash Equivalents And Short Term Investments";
pub const ROW_INTEREST_EXPENSE: &str = "Interest Expense";
pub const ROW_INTEREST_EXPENSE_NON_OPERATING: &str = "Interest Expense Non Operating";

/// A financial statement as a table of line items.
///
/// Each row maps a label ("Operating Cash Flow", "Total Debt", ...) to the
/// reported values per period, most-recent period first. A `None` entry is
/// a period the provider reported no figure for. Read-only once fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementTable {
    rows: HashMap<String, Vec<Option<f64>>>,
}

impl StatementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn insert_row(&mut self, label: impl Into<String>, periods: Vec<Option<f64>>) {
        self.rows.insert(label.into(), periods);
    }

    pub fn row(&self, label: &str) -> Option<&[Option<f64>]> {
        self.rows.get(label).map(|v| v.as_slice())
    }

    /// Value for the most recent period, if reported.
    pub fn latest(&self, label: &str) -> Option<f64> {
        self.row(label)?.first().copied().flatten()
    }

    /// First reported value scanning from the most recent period.
    pub fn first_reported(&self, label: &str) -> Option<f64> {
        self.row(label)?.iter().flatten().next().copied()
    }

    /// First reported non-zero value scanning from the most recent period.
    pub fn first_nonzero(&self, label: &str) -> Option<f64> {
        self.row(label)?.iter().flatten().find(|v| **v != 0.0).copied()
    }

    /// First period (most-recent first) where both rows report a value.
    pub fn first_joint(&self, a: &str, b: &str) -> Option<(f64, f64)> {
        let row_a = self.row(a)?;
        let row_b = self.row(b)?;
        row_a
            .iter()
            .zip(row_b.iter())
            .find_map(|(va, vb)| Some(((*va)?, (*vb)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StatementTable {
        let mut t = StatementTable::new();
        t.insert_row("Operating Cash Flow", vec![None, Some(80.0), Some(75.0)]);
        t.insert_row("Capital Expenditure", vec![Some(-25.0), Some(-30.0), None]);
        t.insert_row("Free Cash Flow", vec![Some(0.0), None, Some(50.0)]);
        t
    }

    #[test]
    fn latest_skips_nothing() {
        let t = table();
        assert_eq!(t.latest("Operating Cash Flow"), None);
        assert_eq!(t.latest("Capital Expenditure"), Some(-25.0));
        assert_eq!(t.latest("Missing Row"), None);
    }

    #[test]
    fn first_reported_scans_most_recent_first() {
        let t = table();
        assert_eq!(t.first_reported("Operating Cash Flow"), Some(80.0));
    }

    #[test]
    fn first_nonzero_skips_zero_periods() {
        let t = table();
        assert_eq!(t.first_nonzero("Free Cash Flow"), Some(50.0));
    }

    #[test]
    fn first_joint_requires_both_reported() {
        let t = table();
        // Period 0 lacks OCF, period 2 lacks capex; period 1 has both.
        assert_eq!(
            t.first_joint("Operating Cash Flow", "Capital Expenditure"),
            Some((80.0, -30.0))
        );
        assert_eq!(t.first_joint("Operating Cash Flow", "Missing"), None);
    }

    #[test]
    fn empty_table() {
        let t = StatementTable::new();
        assert!(t.is_empty());
        assert_eq!(t.latest("anything"), None);
    }
}
