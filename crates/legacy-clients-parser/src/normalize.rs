use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::errors::RejectReason;
use crate::model::LegacyClientRecord;
use crate::schema::{ColumnKind, CLIENT_COLUMNS, IDENTIFIER_COLUMN};

/// Lookup of raw cell text by header name.
pub trait RawRow {
    fn get(&self, column: &str) -> Option<&str>;
}

impl RawRow for HashMap<String, String> {
    fn get(&self, column: &str) -> Option<&str> {
        HashMap::get(self, column).map(String::as_str)
    }
}

impl RawRow for HashMap<&str, &str> {
    fn get(&self, column: &str) -> Option<&str> {
        HashMap::get(self, column).copied()
    }
}

impl RawRow for BTreeMap<String, String> {
    fn get(&self, column: &str) -> Option<&str> {
        BTreeMap::get(self, column).map(String::as_str)
    }
}

/// Tokens recognised in boolean columns, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlagTokens {
    pub truth_token: String,
    pub false_token: Option<String>,
}

impl Default for FlagTokens {
    fn default() -> Self {
        Self {
            truth_token: "T".to_string(),
            false_token: Some("F".to_string()),
        }
    }
}

pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Total over every input: yields `Some(true)`, `Some(false)` or `None`.
pub fn parse_flag(raw: Option<&str>, tokens: &FlagTokens) -> Option<bool> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.eq_ignore_ascii_case(tokens.truth_token.trim()) {
        return Some(true);
    }
    match &tokens.false_token {
        Some(token) if trimmed.eq_ignore_ascii_case(token.trim()) => Some(false),
        _ => None,
    }
}

pub fn parse_integer(raw: Option<&str>) -> Option<i64> {
    raw?.trim().parse::<i64>().ok()
}

/// A zero key is treated the same as a missing one.
pub fn parse_identifier(raw: Option<&str>) -> Option<i64> {
    parse_integer(raw).filter(|id| *id != 0)
}

/// Convert one raw row into a record. Field-level problems degrade to absent
/// values; only a missing identifier rejects the row.
pub fn normalize_row<R>(row: &R, tokens: &FlagTokens) -> Result<LegacyClientRecord, RejectReason>
where
    R: RawRow + ?Sized,
{
    let legacy_client_id =
        parse_identifier(row.get(IDENTIFIER_COLUMN)).ok_or(RejectReason::MissingIdentifier)?;

    let mut record = LegacyClientRecord::new(legacy_client_id);

    for spec in CLIENT_COLUMNS.iter() {
        let raw = row.get(spec.source);
        match spec.kind {
            ColumnKind::Identifier => {}
            ColumnKind::Text => {
                if let Some(slot) = record.text_slot(spec.field) {
                    *slot = clean_text(raw);
                }
            }
            ColumnKind::Flag => {
                if let Some(slot) = record.flag_slot(spec.field) {
                    *slot = parse_flag(raw, tokens);
                }
            }
            ColumnKind::Integer => {
                if let Some(slot) = record.integer_slot(spec.field) {
                    *slot = parse_integer(raw);
                }
            }
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn clean_text_trims_and_drops_blank() {
        assert_eq!(clean_text(Some("  Agro Forte ")), Some("Agro Forte".into()));
        assert_eq!(clean_text(Some("   \t ")), None);
        assert_eq!(clean_text(Some("")), None);
        assert_eq!(clean_text(None), None);
    }

    #[test]
    fn parse_flag_is_total() {
        let tokens = FlagTokens::default();
        let cases = [
            ("T", Some(true)),
            ("t", Some(true)),
            (" T ", Some(true)),
            ("F", Some(false)),
            ("f", Some(false)),
            ("", None),
            ("   ", None),
            ("yes", None),
            ("TRUE", None),
            ("0", None),
            ("\u{00e9}", None),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_flag(Some(input), &tokens), expected, "input {input:?}");
        }
        assert_eq!(parse_flag(None, &tokens), None);
    }

    #[test]
    fn parse_flag_without_false_token_never_yields_false() {
        let tokens = FlagTokens {
            truth_token: "S".into(),
            false_token: None,
        };
        assert_eq!(parse_flag(Some("s"), &tokens), Some(true));
        assert_eq!(parse_flag(Some("N"), &tokens), None);
        assert_eq!(parse_flag(Some("F"), &tokens), None);
    }

    #[test]
    fn parse_integer_never_raises() {
        assert_eq!(parse_integer(Some("42")), Some(42));
        assert_eq!(parse_integer(Some(" -7 ")), Some(-7));
        assert_eq!(parse_integer(Some("+3")), Some(3));
        assert_eq!(parse_integer(Some("12px")), None);
        assert_eq!(parse_integer(Some("1.5")), None);
        assert_eq!(parse_integer(Some("99999999999999999999")), None);
        assert_eq!(parse_integer(Some("")), None);
        assert_eq!(parse_integer(None), None);
    }

    #[test]
    fn normalizes_example_row() {
        let raw = row(&[
            ("idCLIENTES", "1781"),
            ("DESCRICAO", "Agro Forte"),
            ("ATIVO", "T"),
        ]);

        let record = normalize_row(&raw, &FlagTokens::default()).expect("record");

        let mut expected = LegacyClientRecord::new(1781);
        expected.descricao = Some("Agro Forte".into());
        expected.ativo = Some(true);
        assert_eq!(record, expected);
    }

    #[test]
    fn empty_identifier_rejects_row() {
        let raw = row(&[("idCLIENTES", ""), ("DESCRICAO", "Sem id")]);
        assert_eq!(
            normalize_row(&raw, &FlagTokens::default()),
            Err(RejectReason::MissingIdentifier)
        );
    }

    #[test]
    fn zero_or_garbage_identifier_rejects_row() {
        for id in ["0", "abc", "   "] {
            let raw = row(&[("idCLIENTES", id)]);
            assert_eq!(
                normalize_row(&raw, &FlagTokens::default()),
                Err(RejectReason::MissingIdentifier),
                "id {id:?}"
            );
        }
    }

    #[test]
    fn bad_fields_degrade_to_absent() {
        let raw = row(&[
            ("idCLIENTES", "10"),
            ("LOGOALTURA", "tall"),
            ("LOGOLARGURA", " 120 "),
            ("AUTOSIZE", "maybe"),
            ("EMAIL", "   "),
        ]);

        let record = normalize_row(&raw, &FlagTokens::default()).expect("record");
        assert_eq!(record.logo_altura, None);
        assert_eq!(record.logo_largura, Some(120));
        assert_eq!(record.auto_size, None);
        assert_eq!(record.email, None);
    }

    #[test]
    fn borrowed_map_rows_work() {
        let raw: HashMap<&str, &str> = [("idCLIENTES", "5"), ("UF", " sp ")].into_iter().collect();
        let record = normalize_row(&raw, &FlagTokens::default()).expect("record");
        assert_eq!(record.uf.as_deref(), Some("sp"));
    }
}
