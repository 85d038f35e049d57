//! Model export and import.

use std::fmt::Write as _;

use crate::error::{EditError, EditResult, ValidationError};
use crate::model::Model;
use crate::store::ModelDocument;

/// Line-oriented text renderings of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyFormat {
    /// One `type` or `fact` line per assertion, tab separated.
    Tsv,
    /// One line per individual, types in the expression language.
    Manchester,
}

impl LegacyFormat {
    /// Parses `arguments.format`; absent means [`LegacyFormat::Tsv`].
    ///
    /// # Errors
    /// `InvalidField` for an unknown format.
    pub fn parse(format: Option<&str>) -> EditResult<Self> {
        match format.map(str::trim) {
            None | Some("" | "tsv") => Ok(Self::Tsv),
            Some("manchester") => Ok(Self::Manchester),
            Some(other) => Err(ValidationError::InvalidField {
                field: "request.arguments.format".to_string(),
                reason: format!("unsupported export format: {other}"),
            }
            .into()),
        }
    }
}

/// The model as a pretty-printed JSON document.
///
/// # Errors
/// Internal error if serialization fails.
pub fn export_json(model: &Model) -> EditResult<String> {
    serde_json::to_string_pretty(&ModelDocument::from_model(model))
        .map_err(|e| EditError::internal(format!("failed to serialize model {}: {e}", model.id())))
}

/// The model in a legacy text rendering.
#[must_use]
pub fn export_legacy(model: &Model, format: LegacyFormat) -> String {
    let mut out = String::new();
    match format {
        LegacyFormat::Tsv => {
            for entity in model.entities() {
                for ty in &entity.types {
                    let _ = writeln!(out, "type\t{}\t{ty}", entity.id);
                }
            }
            for relation in model.relations() {
                let key = &relation.key;
                let _ = writeln!(out, "fact\t{}\t{}\t{}", key.subject, key.predicate, key.object);
            }
        }
        LegacyFormat::Manchester => {
            for entity in model.entities() {
                let types: Vec<String> = entity.types.iter().map(ToString::to_string).collect();
                let _ = writeln!(out, "Individual: {} Types: {}", entity.id, types.join(", "));
            }
        }
    }
    out
}

/// Parses a document produced by [`export_json`].
///
/// # Errors
/// `InvalidField` naming `request.arguments.importModel` if the text is not a
/// model document.
pub fn parse_document(text: &str) -> EditResult<ModelDocument> {
    serde_json::from_str(text).map_err(|e| {
        ValidationError::InvalidField {
            field: "request.arguments.importModel".to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Expression, TermId};
    use crate::model::{Entity, EntityId, ModelId, Relation, RelationKey};
    use crate::undo::{Change, ChangeSet};

    fn model() -> Model {
        let mut model = Model::new(ModelId::new("gomodel:x"));
        let mut set = ChangeSet::new();
        let mut a = Entity::new(EntityId::new("a"));
        a.types.insert(Expression::class("GO:1"));
        a.types
            .insert(Expression::restriction("part of", Expression::class("GO:2")));
        set.record(&mut model, Change::AddEntity { entity: a });
        set.record(&mut model, Change::AddEntity { entity: Entity::new(EntityId::new("b")) });
        set.record(
            &mut model,
            Change::AddRelation {
                relation: Relation::new(RelationKey::new(EntityId::new("a"), TermId::from("R"), EntityId::new("b"))),
            },
        );
        model
    }

    #[test]
    fn format_parsing() {
        assert_eq!(LegacyFormat::parse(None).unwrap(), LegacyFormat::Tsv);
        assert_eq!(LegacyFormat::parse(Some("manchester")).unwrap(), LegacyFormat::Manchester);
        let err = LegacyFormat::parse(Some("rdf")).unwrap_err();
        assert!(err.to_string().contains("format"));
    }

    #[test]
    fn tsv_has_one_line_per_assertion() {
        let text = export_legacy(&model(), LegacyFormat::Tsv);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.contains(&"fact\ta\tR\tb"));
        assert!(lines.contains(&"type\ta\t'part of' some GO:2"));
    }

    #[test]
    fn manchester_has_one_line_per_individual() {
        let text = export_legacy(&model(), LegacyFormat::Manchester);
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("Individual: a Types: GO:1, 'part of' some GO:2"));
    }

    #[test]
    fn json_export_parses_back() {
        let json = export_json(&model()).unwrap();
        let doc = parse_document(&json).unwrap();
        assert_eq!(doc.individuals.len(), 2);
        assert!(parse_document("{not json").unwrap_err().is_validation());
    }
}
