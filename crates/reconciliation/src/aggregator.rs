//! Revenue aggregation — sums matched rows into a per-connection total,
//! across every selected tab, enforcing currency homogeneity.

use crate::matcher::MatchOutcome;
use crate::validator::{parse_date, RecordValidator};
use marketpulse_connectors::FetchWindow;
use marketpulse_core::types::MappingConfig;
use marketpulse_core::{MarketPulseError, PulseResult, Table};
use std::collections::BTreeSet;

/// Aggregated revenue for one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOutcome {
    pub total: f64,
    /// Rows that contributed after window filtering, summed across tabs.
    pub contributing_rows: usize,
    pub currency: Option<String>,
}

/// Sum the mapped revenue column over matched rows across all tabs of one
/// logical connection.
///
/// A currency column with more than one distinct code among matched rows
/// aborts this connection with `MultiCurrency`; unparseable revenue cells
/// contribute zero and are validator-flagged; rows whose date parses but
/// falls outside the window are excluded.
pub fn aggregate_revenue(
    tabs: &[(&Table, MatchOutcome)],
    mapping: &MappingConfig,
    window: Option<&FetchWindow>,
    validator: &mut RecordValidator,
) -> PulseResult<AggregateOutcome> {
    let revenue_field = mapping
        .revenue_field
        .as_deref()
        .ok_or_else(|| MarketPulseError::MissingMapping("no revenue column mapped".into()))?;

    // Currency homogeneity is checked over all matched rows before any
    // summation, so a mixed-currency sheet never produces a partial total.
    let mut currencies: BTreeSet<String> = BTreeSet::new();
    if let Some(currency_field) = mapping.currency_field.as_deref() {
        for (table, outcome) in tabs {
            if let Some(col) = table.column_index(currency_field) {
                for &row in &outcome.rows {
                    let code = table.cell(row, col).trim().to_uppercase();
                    if !code.is_empty() {
                        currencies.insert(code);
                    }
                }
            }
        }
        if currencies.len() > 1 {
            let found: Vec<String> = currencies.into_iter().collect();
            return Err(MarketPulseError::MultiCurrency(found.join(", ")));
        }
    }

    let mut total = 0.0;
    let mut contributing_rows = 0;
    for (table, outcome) in tabs {
        let Some(revenue_col) = table.column_index(revenue_field) else {
            continue;
        };
        let date_col = mapping
            .date_field
            .as_deref()
            .and_then(|f| table.column_index(f));

        for &row in &outcome.rows {
            if let (Some(col), Some(window)) = (date_col, window) {
                // Only rows whose date parses are subject to the window.
                if let Some(date) = parse_date(table.cell(row, col)) {
                    if !window.contains(date) {
                        continue;
                    }
                }
            }
            contributing_rows += 1;
            if let Some(value) = validator.parse_cell("revenue", table.cell(row, revenue_col)) {
                total += value;
            }
        }
    }

    Ok(AggregateOutcome {
        total,
        contributing_rows,
        currency: currencies.into_iter().next(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatchMethod;
    use chrono::NaiveDate;

    fn mapping() -> MappingConfig {
        MappingConfig {
            id_field: Some("Campaign".into()),
            revenue_field: Some("Revenue".into()),
            ..Default::default()
        }
    }

    fn all_rows(table: &Table) -> MatchOutcome {
        MatchOutcome {
            rows: (0..table.row_count()).collect(),
            method: MatchMethod::IdMatch,
        }
    }

    #[test]
    fn sums_across_multiple_tabs() {
        let tab1 = Table::new(
            "Jan",
            vec!["Campaign".into(), "Revenue".into()],
            vec![vec!["101".into(), "$1,500.00".into()]],
        );
        let tab2 = Table::new(
            "Feb",
            vec!["Campaign".into(), "Revenue".into()],
            vec![vec!["101".into(), "2500".into()]],
        );
        let mut validator = RecordValidator::new("c");
        let m1 = all_rows(&tab1);
        let m2 = all_rows(&tab2);
        let outcome =
            aggregate_revenue(&[(&tab1, m1), (&tab2, m2)], &mapping(), None, &mut validator)
                .unwrap();
        assert_eq!(outcome.total, 4000.0);
        assert_eq!(outcome.contributing_rows, 2);
    }

    #[test]
    fn mixed_currencies_abort_the_connection() {
        let tab = Table::new(
            "Orders",
            vec!["Campaign".into(), "Revenue".into(), "Currency".into()],
            vec![
                vec!["101".into(), "100".into(), "USD".into()],
                vec!["101".into(), "200".into(), "EUR".into()],
            ],
        );
        let mut m = mapping();
        m.currency_field = Some("Currency".into());
        let mut validator = RecordValidator::new("c");
        let matched = all_rows(&tab);
        let result = aggregate_revenue(&[(&tab, matched)], &m, None, &mut validator);
        assert!(matches!(result, Err(MarketPulseError::MultiCurrency(_))));
    }

    #[test]
    fn homogeneous_currency_is_reported() {
        let tab = Table::new(
            "Orders",
            vec!["Campaign".into(), "Revenue".into(), "Currency".into()],
            vec![
                vec!["101".into(), "100".into(), "usd".into()],
                vec!["101".into(), "200".into(), "USD".into()],
            ],
        );
        let mut m = mapping();
        m.currency_field = Some("Currency".into());
        let mut validator = RecordValidator::new("c");
        let matched = all_rows(&tab);
        let outcome = aggregate_revenue(&[(&tab, matched)], &m, None, &mut validator).unwrap();
        assert_eq!(outcome.currency.as_deref(), Some("USD"));
        assert_eq!(outcome.total, 300.0);
    }

    #[test]
    fn unparseable_cells_contribute_zero_but_are_flagged() {
        let tab = Table::new(
            "Orders",
            vec!["Campaign".into(), "Revenue".into()],
            vec![
                vec!["101".into(), "pending".into()],
                vec!["101".into(), "250".into()],
            ],
        );
        let mut validator = RecordValidator::new("c");
        let matched = all_rows(&tab);
        let outcome = aggregate_revenue(&[(&tab, matched)], &mapping(), None, &mut validator).unwrap();
        assert_eq!(outcome.total, 250.0);
        assert_eq!(outcome.contributing_rows, 2);
        assert_eq!(validator.errors().len(), 1);
        assert_eq!(validator.errors()[0].value, "pending");
    }

    #[test]
    fn window_excludes_dated_rows_outside_lookback() {
        let tab = Table::new(
            "Orders",
            vec!["Campaign".into(), "Revenue".into(), "Date".into()],
            vec![
                vec!["101".into(), "100".into(), "2024-01-10".into()],
                vec!["101".into(), "200".into(), "2024-03-10".into()],
                vec!["101".into(), "400".into(), "not a date".into()],
            ],
        );
        let mut m = mapping();
        m.date_field = Some("Date".into());
        let window = FetchWindow {
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        };
        let mut validator = RecordValidator::new("c");
        let matched = all_rows(&tab);
        let outcome =
            aggregate_revenue(&[(&tab, matched)], &m, Some(&window), &mut validator).unwrap();
        // In-window row plus the undated row; the January row is excluded.
        assert_eq!(outcome.total, 600.0);
        assert_eq!(outcome.contributing_rows, 2);
    }
}
