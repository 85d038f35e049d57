//! Argument validation.
//!
//! Requests are decoded leniently; these helpers enforce presence and size
//! limits per field when a handler actually needs the value.

use crate::error::{EditResult, ValidationError};
use crate::model::Annotation;

use super::ValuePair;

/// Conservative upper bound for free-form text fields.
pub const MAX_TEXT_LEN: usize = 16 * 1024;

/// Upper bound for an embedded import document.
pub const MAX_DOCUMENT_LEN: usize = 64 * 1024 * 1024;

const ANONYMOUS: &str = "anonymous";

fn too_long(field: &str, max_length: usize) -> ValidationError {
    ValidationError::FieldTooLong {
        field: field.to_string(),
        max_length,
    }
}

/// Requires a non-blank value and returns it trimmed.
pub(crate) fn require<'a>(field: &str, value: Option<&'a str>) -> EditResult<&'a str> {
    match optional(field, value)? {
        Some(v) => Ok(v),
        None => Err(ValidationError::MissingParameter {
            field: field.to_string(),
        }
        .into()),
    }
}

/// Trims a value; blank counts as absent.
pub(crate) fn optional<'a>(field: &str, value: Option<&'a str>) -> EditResult<Option<&'a str>> {
    let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if v.len() > MAX_TEXT_LEN {
        return Err(too_long(field, MAX_TEXT_LEN).into());
    }
    Ok(Some(v))
}

/// Requires a non-empty list.
pub(crate) fn require_list<'a, T>(field: &str, value: Option<&'a [T]>) -> EditResult<&'a [T]> {
    match value {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(ValidationError::MissingParameter {
            field: field.to_string(),
        }
        .into()),
    }
}

/// Requires an import document within [`MAX_DOCUMENT_LEN`].
pub(crate) fn require_document<'a>(field: &str, value: Option<&'a str>) -> EditResult<&'a str> {
    let Some(doc) = value.filter(|v| !v.trim().is_empty()) else {
        return Err(ValidationError::MissingParameter {
            field: field.to_string(),
        }
        .into());
    };
    if doc.len() > MAX_DOCUMENT_LEN {
        return Err(too_long(field, MAX_DOCUMENT_LEN).into());
    }
    Ok(doc)
}

/// Annotations from `values`. Pairs missing a key or a value are skipped.
pub(crate) fn annotations(values: &[ValuePair]) -> EditResult<Vec<Annotation>> {
    let mut out = Vec::with_capacity(values.len());
    for pair in values {
        let (Some(key), Some(value)) = (
            optional("request.arguments.values.key", pair.key.as_deref())?,
            optional("request.arguments.values.value", pair.value.as_deref())?,
        ) else {
            continue;
        };
        out.push(Annotation::new(key, value));
    }
    Ok(out)
}

/// Values of every `id` pair, for search queries.
pub(crate) fn query_ids(values: &[ValuePair]) -> EditResult<Vec<String>> {
    let mut ids = Vec::new();
    for pair in values {
        if pair.key.as_deref().map(str::trim) != Some("id") {
            continue;
        }
        if let Some(id) = optional("request.arguments.values.value", pair.value.as_deref())? {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

/// Normalizes a caller id: blank ids and `anonymous` (any case) are no user.
#[must_use]
pub fn normalize_user_id(uid: Option<&str>) -> Option<String> {
    uid.map(str::trim)
        .filter(|u| !u.is_empty() && !u.eq_ignore_ascii_case(ANONYMOUS))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_trims_and_rejects_blank() {
        assert_eq!(require("f", Some("  x ")).unwrap(), "x");
        assert!(require("f", Some("   ")).unwrap_err().is_missing_parameter());
        assert!(require("f", None).unwrap_err().is_missing_parameter());
    }

    #[test]
    fn overlong_text_is_rejected() {
        let long = "a".repeat(MAX_TEXT_LEN + 1);
        let err = require("request.arguments.subject", Some(&long)).unwrap_err();
        assert!(err.to_string().contains("maximum length"));
    }

    #[test]
    fn empty_lists_are_missing() {
        let empty: Vec<ValuePair> = Vec::new();
        assert!(require_list("request.arguments.values", Some(empty.as_slice())).is_err());
        assert!(require_list::<ValuePair>("request.arguments.values", None).is_err());
    }

    #[test]
    fn incomplete_pairs_are_skipped() {
        let values = vec![
            ValuePair::new("comment", "a"),
            ValuePair {
                key: Some("comment".to_string()),
                ..ValuePair::default()
            },
            ValuePair::new(" ", "b"),
        ];
        let anns = annotations(&values).unwrap();
        assert_eq!(anns, vec![Annotation::new("comment", "a")]);
    }

    #[test]
    fn query_ids_only_take_id_keys() {
        let values = vec![ValuePair::new("id", "GO:1"), ValuePair::new("title", "x")];
        assert_eq!(query_ids(&values).unwrap(), vec!["GO:1".to_string()]);
    }

    #[test]
    fn anonymous_is_no_user() {
        assert_eq!(normalize_user_id(Some("Anonymous")), None);
        assert_eq!(normalize_user_id(Some(" ")), None);
        assert_eq!(normalize_user_id(None), None);
        assert_eq!(normalize_user_id(Some(" u1 ")).as_deref(), Some("u1"));
    }
}
