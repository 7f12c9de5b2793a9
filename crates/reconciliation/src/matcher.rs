//! Campaign matcher — decides which rows of an arbitrary revenue source
//! belong to the campaign under reconciliation.

use marketpulse_core::types::{CampaignIdentity, MappingConfig};
use marketpulse_core::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a row set was attributed to the campaign. Variants are ordered by
/// precedence; a larger variant means lower confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ExplicitSelection,
    IdMatch,
    NameMatch,
    FallbackAllRows,
}

/// Indices of the matched rows in one tab, plus the method that produced
/// them.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub rows: Vec<usize>,
    pub method: MatchMethod,
}

/// Strip everything but digits from an identifier cell. Tolerates
/// namespace-style prefixes such as `urn:li:sponsoredCampaign:123456`.
pub fn normalize_id(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Match rows in strict precedence order; the first method that yields at
/// least one row wins. When nothing matches, all rows are returned flagged
/// as `FallbackAllRows` rather than silently zeroing out revenue.
pub fn match_rows(table: &Table, mapping: &MappingConfig, identity: &CampaignIdentity) -> MatchOutcome {
    let identifier_column = mapping
        .id_field
        .as_deref()
        .and_then(|f| table.column_index(f))
        .or_else(|| {
            mapping
                .name_field
                .as_deref()
                .and_then(|f| table.column_index(f))
        });

    // 1. Explicit crosswalk selection.
    if let (Some(selected), Some(col)) = (mapping.selected_identifier.as_deref(), identifier_column)
    {
        let rows = filter_rows(table, col, |cell| {
            let wanted = normalize_id(selected);
            if wanted.is_empty() {
                cell.trim().eq_ignore_ascii_case(selected.trim())
            } else {
                normalize_id(cell) == wanted
            }
        });
        if !rows.is_empty() {
            return MatchOutcome {
                rows,
                method: MatchMethod::ExplicitSelection,
            };
        }
    }

    // 2. Normalized numeric-ID match against known ad-platform IDs.
    if let Some(col) = mapping.id_field.as_deref().and_then(|f| table.column_index(f)) {
        let known: HashSet<String> = identity.ids.iter().map(u64::to_string).collect();
        if !known.is_empty() {
            let rows = filter_rows(table, col, |cell| {
                let id = normalize_id(cell);
                !id.is_empty() && known.contains(&id)
            });
            if !rows.is_empty() {
                return MatchOutcome {
                    rows,
                    method: MatchMethod::IdMatch,
                };
            }
        }
    }

    // 3. Case-insensitive name match, substring containment in either
    //    direction to tolerate naming drift between systems.
    if let Some(col) = mapping
        .name_field
        .as_deref()
        .and_then(|f| table.column_index(f))
    {
        let target = identity.name.trim().to_lowercase();
        if !target.is_empty() {
            let rows = filter_rows(table, col, |cell| {
                let value = cell.trim().to_lowercase();
                !value.is_empty() && (value.contains(&target) || target.contains(&value))
            });
            if !rows.is_empty() {
                return MatchOutcome {
                    rows,
                    method: MatchMethod::NameMatch,
                };
            }
        }
    }

    // 4. Fallback: every row, low confidence.
    MatchOutcome {
        rows: (0..table.row_count()).collect(),
        method: MatchMethod::FallbackAllRows,
    }
}

fn filter_rows<F: Fn(&str) -> bool>(table: &Table, col: usize, predicate: F) -> Vec<usize> {
    (0..table.row_count())
        .filter(|&row| predicate(table.cell(row, col)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            "Deals",
            vec!["Campaign ID".into(), "Campaign".into(), "Revenue".into()],
            vec![
                vec!["urn:li:sponsoredCampaign:101".into(), "Q4 Wine — Brand Search".into(), "1000".into()],
                vec!["202".into(), "Q4 Wine".into(), "2000".into()],
                vec!["303".into(), "Spring Shoes".into(), "3000".into()],
            ],
        )
    }

    fn identity() -> CampaignIdentity {
        CampaignIdentity {
            ids: vec![101],
            name: "Q4 Wine".into(),
        }
    }

    fn mapping() -> MappingConfig {
        MappingConfig {
            id_field: Some("Campaign ID".into()),
            name_field: Some("Campaign".into()),
            revenue_field: Some("Revenue".into()),
            ..Default::default()
        }
    }

    #[test]
    fn explicit_selection_beats_everything() {
        let mut m = mapping();
        m.selected_identifier = Some("303".into());
        let outcome = match_rows(&table(), &m, &identity());
        assert_eq!(outcome.method, MatchMethod::ExplicitSelection);
        assert_eq!(outcome.rows, vec![2]);
    }

    #[test]
    fn id_match_wins_over_name_match() {
        // Row 0 matches by ID (101), rows 0 and 1 would match by name.
        let outcome = match_rows(&table(), &mapping(), &identity());
        assert_eq!(outcome.method, MatchMethod::IdMatch);
        assert_eq!(outcome.rows, vec![0]);
    }

    #[test]
    fn id_normalization_strips_urn_prefix() {
        assert_eq!(normalize_id("urn:li:sponsoredCampaign:101"), "101");
        assert_eq!(normalize_id("  202 "), "202");
        assert_eq!(normalize_id("none"), "");
    }

    #[test]
    fn name_match_accepts_containment_in_both_directions() {
        let mut m = mapping();
        m.id_field = None;
        let outcome = match_rows(&table(), &m, &identity());
        assert_eq!(outcome.method, MatchMethod::NameMatch);
        // "Q4 Wine — Brand Search" contains "Q4 Wine"; "Q4 Wine" equals it.
        assert_eq!(outcome.rows, vec![0, 1]);
    }

    #[test]
    fn fallback_returns_all_rows_never_empty() {
        let outcome = match_rows(
            &table(),
            &mapping(),
            &CampaignIdentity {
                ids: vec![999],
                name: "Completely Different".into(),
            },
        );
        assert_eq!(outcome.method, MatchMethod::FallbackAllRows);
        assert_eq!(outcome.rows, vec![0, 1, 2]);
    }

    #[test]
    fn unmapped_identifier_columns_fall_back() {
        let m = MappingConfig {
            revenue_field: Some("Revenue".into()),
            ..Default::default()
        };
        let outcome = match_rows(&table(), &m, &identity());
        assert_eq!(outcome.method, MatchMethod::FallbackAllRows);
        assert_eq!(outcome.rows.len(), 3);
    }
}
