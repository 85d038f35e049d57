//! Logical type expressions.
//!
//! Edits arrive as nested, tagged [`ExpressionNode`] trees. The [`Resolver`]
//! turns them into validated [`Expression`] values, resolving every leaf
//! against the background [`Taxonomy`] and, for foreign identifiers, an
//! [`IdentifierLookup`]. Literal leaves may embed a small textual language
//! (`'has part' some X or Y`), parsed by [`parser`] into the same AST.

mod lookup;
pub mod parser;
mod resolver;
mod taxonomy;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use lookup::{IdentifierLookup, LookupEntry, NoLookup, PatternLookup, StaticLookup};
pub use resolver::{resolve, Resolver};
pub use taxonomy::{ClassDef, InMemoryTaxonomy, Taxonomy, TaxonomyDocument, TermInfo};

/// Identifier of a taxonomy term (class or relation), e.g. `GO:0005623`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(String);

impl TermId {
    /// Wraps an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TermId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TermId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A resolved logical expression.
///
/// Operands of intersections and unions are sets: structural equality does not
/// depend on the order in which they were written.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    /// A named class.
    Class {
        /// Class id.
        id: TermId,
    },
    /// Existential restriction: related via `relation` to some `filler`.
    Restriction {
        /// Relation id.
        relation: TermId,
        /// Filler expression.
        filler: Box<Expression>,
    },
    /// Conjunction.
    Intersection {
        /// Operands.
        operands: BTreeSet<Expression>,
    },
    /// Disjunction.
    Union {
        /// Operands.
        operands: BTreeSet<Expression>,
    },
}

impl Expression {
    /// A named class.
    #[must_use]
    pub fn class(id: impl Into<TermId>) -> Self {
        Self::Class { id: id.into() }
    }

    /// `relation some filler`.
    #[must_use]
    pub fn restriction(relation: impl Into<TermId>, filler: Self) -> Self {
        Self::Restriction {
            relation: relation.into(),
            filler: Box::new(filler),
        }
    }

    /// Conjunction of the operands; a single operand is returned as is.
    #[must_use]
    pub fn intersection(operands: impl IntoIterator<Item = Self>) -> Self {
        let mut operands: BTreeSet<Self> = operands.into_iter().collect();
        if operands.len() == 1 {
            if let Some(only) = operands.pop_first() {
                return only;
            }
        }
        Self::Intersection { operands }
    }

    /// Disjunction of the operands; a single operand is returned as is.
    #[must_use]
    pub fn union(operands: impl IntoIterator<Item = Self>) -> Self {
        let mut operands: BTreeSet<Self> = operands.into_iter().collect();
        if operands.len() == 1 {
            if let Some(only) = operands.pop_first() {
                return only;
            }
        }
        Self::Union { operands }
    }

    /// Returns the class id if this is a named class.
    #[must_use]
    pub fn as_class(&self) -> Option<&TermId> {
        match self {
            Self::Class { id } => Some(id),
            _ => None,
        }
    }

    /// Named classes asserted directly: the class itself or the named operands
    /// of a top-level intersection.
    #[must_use]
    pub fn direct_classes(&self) -> Vec<&TermId> {
        match self {
            Self::Class { id } => vec![id],
            Self::Intersection { operands } => operands.iter().flat_map(Self::direct_classes).collect(),
            Self::Restriction { .. } | Self::Union { .. } => Vec::new(),
        }
    }

    /// Every class and relation id mentioned anywhere, in post-order.
    #[must_use]
    pub fn signature(&self) -> Vec<&TermId> {
        let mut out = Vec::new();
        self.collect_signature(&mut out);
        out
    }

    fn collect_signature<'a>(&'a self, out: &mut Vec<&'a TermId>) {
        match self {
            Self::Class { id } => out.push(id),
            Self::Restriction { relation, filler } => {
                filler.collect_signature(out);
                out.push(relation);
            }
            Self::Intersection { operands } | Self::Union { operands } => {
                for op in operands {
                    op.collect_signature(out);
                }
            }
        }
    }

    /// Returns true if the id occurs anywhere in the expression.
    #[must_use]
    pub fn mentions(&self, term: &str) -> bool {
        self.signature().iter().any(|t| t.as_str() == term)
    }

    const fn is_compound(&self) -> bool {
        matches!(self, Self::Intersection { .. } | Self::Union { .. })
    }
}

/// Writes a term, quoting it when it would not survive re-parsing bare.
pub(crate) fn write_term(f: &mut impl fmt::Write, term: &str) -> fmt::Result {
    if parser::needs_quotes(term) {
        write!(f, "'{term}'")
    } else {
        f.write_str(term)
    }
}

impl fmt::Display for Expression {
    /// Renders the expression in the textual mini-language, using ids.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn operand(f: &mut fmt::Formatter<'_>, e: &Expression) -> fmt::Result {
            if e.is_compound() {
                write!(f, "({e})")
            } else {
                write!(f, "{e}")
            }
        }

        match self {
            Self::Class { id } => write_term(f, id.as_str()),
            Self::Restriction { relation, filler } => {
                write_term(f, relation.as_str())?;
                f.write_str(" some ")?;
                operand(f, filler)
            }
            Self::Intersection { operands } | Self::Union { operands } => {
                let sep = if matches!(self, Self::Union { .. }) { " or " } else { " and " };
                for (idx, op) in operands.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(sep)?;
                    }
                    operand(f, op)?;
                }
                Ok(())
            }
        }
    }
}

/// Wire form of an expression as sent by clients.
///
/// `type` is one of `class`, `svf`, `intersection`, `union`. Which of the
/// other fields are required depends on the tag; the resolver reports a
/// missing parameter otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionNode {
    /// Node tag.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Relation of an `svf` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_prop: Option<String>,
    /// Class id, quoted label, or embedded compound expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
    /// Child nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expressions: Option<Vec<ExpressionNode>>,
}

impl ExpressionNode {
    /// A `class` node.
    #[must_use]
    pub fn class(literal: impl Into<String>) -> Self {
        Self {
            kind: Some("class".to_string()),
            literal: Some(literal.into()),
            ..Self::default()
        }
    }

    /// An `svf` node with a literal filler.
    #[must_use]
    pub fn svf(on_prop: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            kind: Some("svf".to_string()),
            on_prop: Some(on_prop.into()),
            literal: Some(literal.into()),
            ..Self::default()
        }
    }

    /// An `svf` node with nested filler nodes.
    #[must_use]
    pub fn svf_nested(on_prop: impl Into<String>, expressions: Vec<Self>) -> Self {
        Self {
            kind: Some("svf".to_string()),
            on_prop: Some(on_prop.into()),
            expressions: Some(expressions),
            ..Self::default()
        }
    }

    /// An `intersection` or `union` node.
    #[must_use]
    pub fn group(kind: &str, expressions: Vec<Self>) -> Self {
        Self {
            kind: Some(kind.to_string()),
            expressions: Some(expressions),
            ..Self::default()
        }
    }
}
