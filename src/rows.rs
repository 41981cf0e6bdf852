//! Row normalizer.
//! Filters, ranks and truncates raw sheet records, and computes derived metrics.
//! Malformed numbers never raise: ranks fall back to a sentinel, ratios to a literal "0".

use std::collections::HashMap;
use std::fmt;

/// One ranked entity: column header -> raw cell text.
pub type RowRecord = HashMap<String, String>;

/// Rank given to rows whose rank cell is not an integer; sorts them last.
pub const RANK_SENTINEL: i64 = 999_999;

pub fn parse_rank_or_sentinel(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(RANK_SENTINEL)
}

/// Cell value for `key`, empty when the column is missing from the record.
pub fn field<'a>(row: &'a RowRecord, key: &str) -> &'a str {
    row.get(key).map(String::as_str).unwrap_or("")
}

/// Drops rows with a blank rank, sorts ascending by rank (stable) and keeps at most `max_rows`.
pub fn normalize(rows: Vec<RowRecord>, rank_field: &str, max_rows: usize) -> Vec<RowRecord> {
    let mut ranked: Vec<(i64, RowRecord)> = rows
        .into_iter()
        .filter(|row| !field(row, rank_field).trim().is_empty())
        .map(|row| (parse_rank_or_sentinel(field(&row, rank_field)), row))
        .collect();

    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.truncate(max_rows);
    ranked.into_iter().map(|(_, row)| row).collect()
}

/// Result of a derived-metric formula.
#[derive(Clone, Debug, PartialEq)]
pub enum DerivedValue {
    Number(f64),
    /// Emitted verbatim when an input is not numeric (historical output prints "0").
    Literal(&'static str),
}

impl fmt::Display for DerivedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole numbers keep one decimal: 15 prints as "15.0"
            DerivedValue::Number(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
            DerivedValue::Number(v) => write!(f, "{}", v),
            DerivedValue::Literal(s) => f.write_str(s),
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}

// Ties go to even, so 1/8 shows as 0.12.
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Kill/death/assist ratio: `(kills + assists) / deaths`, rounded to 2 decimals.
///
/// Zero deaths yields the plain sum instead of dividing.
pub fn kda_ratio(kills: &str, deaths: &str, assists: &str) -> DerivedValue {
    let (Some(kills), Some(deaths), Some(assists)) =
        (parse_number(kills), parse_number(deaths), parse_number(assists))
    else {
        return DerivedValue::Literal("0");
    };

    if deaths == 0.0 {
        DerivedValue::Number(round2(kills + assists))
    } else {
        DerivedValue::Number(round2((kills + assists) / deaths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RowRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ranks(rows: &[RowRecord], field_name: &str) -> Vec<String> {
        rows.iter().map(|r| field(r, field_name).to_string()).collect()
    }

    #[test]
    fn test_normalize_drops_blank_and_sorts() {
        let rows = vec![
            row(&[("Rank", "2"), ("Pseudo", "b")]),
            row(&[("Rank", ""), ("Pseudo", "blank")]),
            row(&[("Rank", "1"), ("Pseudo", "a")]),
        ];
        let out = normalize(rows, "Rank", 5);
        assert_eq!(ranks(&out, "Pseudo"), vec!["a", "b"]);
    }

    #[test]
    fn test_normalize_whitespace_rank_is_blank() {
        let rows = vec![row(&[("Rank", "   ")]), row(&[("Pseudo", "no rank column")])];
        assert!(normalize(rows, "Rank", 5).is_empty());
    }

    #[test]
    fn test_normalize_truncates_to_max_rows() {
        let rows = (1..=10)
            .rev()
            .map(|i| row(&[("Rank", i.to_string().as_str())]))
            .collect();
        let out = normalize(rows, "Rank", 3);
        assert_eq!(ranks(&out, "Rank"), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_unparseable_ranks_sort_last_and_keep_order() {
        let rows = vec![
            row(&[("Rank", "n/a"), ("Pseudo", "first bad")]),
            row(&[("Rank", "3"), ("Pseudo", "three")]),
            row(&[("Rank", "x"), ("Pseudo", "second bad")]),
            row(&[("Rank", " 1 "), ("Pseudo", "one")]),
        ];
        let out = normalize(rows, "Rank", 10);
        assert_eq!(
            ranks(&out, "Pseudo"),
            vec!["one", "three", "first bad", "second bad"]
        );
    }

    #[test]
    fn test_output_sorted_non_decreasing() {
        let rows = ["5", "2", "9", "2", "abc", "1"]
            .iter()
            .map(|r| row(&[("Rank", *r)]))
            .collect();
        let out = normalize(rows, "Rank", 10);
        let parsed: Vec<i64> = out
            .iter()
            .map(|r| parse_rank_or_sentinel(field(r, "Rank")))
            .collect();
        assert!(parsed.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_parse_rank_or_sentinel() {
        assert_eq!(parse_rank_or_sentinel("7"), 7);
        assert_eq!(parse_rank_or_sentinel(" 12\t"), 12);
        assert_eq!(parse_rank_or_sentinel("2.0"), RANK_SENTINEL);
    }

    #[test]
    fn test_kda_zero_deaths_is_sum() {
        let kda = kda_ratio("10", "0", "5");
        assert_eq!(kda, DerivedValue::Number(15.0));
        assert_eq!(kda.to_string(), "15.0");
    }

    #[test]
    fn test_kda_ratio() {
        assert_eq!(kda_ratio("10", "5", "5"), DerivedValue::Number(3.0));
        assert_eq!(kda_ratio("4", "3", "3").to_string(), "2.33");
    }

    #[test]
    fn test_kda_rounds_ties_to_even() {
        assert_eq!(kda_ratio("1", "8", "0").to_string(), "0.12");
        assert_eq!(kda_ratio("5", "8", "0").to_string(), "0.62");
        assert_eq!(kda_ratio("3", "8", "0").to_string(), "0.38");
    }

    #[test]
    fn test_kda_unparseable_is_literal_zero() {
        let kda = kda_ratio("x", "5", "5");
        assert_eq!(kda, DerivedValue::Literal("0"));
        assert_eq!(kda.to_string(), "0");
        assert_eq!(kda_ratio("", "1", "1"), DerivedValue::Literal("0"));
    }
}
