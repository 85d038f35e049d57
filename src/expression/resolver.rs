//! Resolution of wire expression trees into validated expressions.

use std::collections::HashSet;

use crate::error::{EditError, EditResult, ExecutionError, ValidationError};
use crate::model::Model;

use super::parser::{self, TermMapper};
use super::{Expression, ExpressionNode, IdentifierLookup, Taxonomy, TermId};

/// Resolves [`ExpressionNode`] trees and embedded expression text.
///
/// Resolution never touches the model; the model only contributes its taxon
/// context for foreign identifier lookups. Unresolvable identifiers are
/// collected bottom-up over the whole tree and reported together, the first
/// one (innermost, leftmost) naming the error.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    taxonomy: &'a dyn Taxonomy,
    lookup: &'a dyn IdentifierLookup,
    taxon: Option<&'a str>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver without taxon context.
    #[must_use]
    pub fn new(taxonomy: &'a dyn Taxonomy, lookup: &'a dyn IdentifierLookup) -> Self {
        Self {
            taxonomy,
            lookup,
            taxon: None,
        }
    }

    /// Uses the model's taxon context for lookups.
    #[must_use]
    pub fn for_model(mut self, model: &'a Model) -> Self {
        self.taxon = model.taxon();
        self
    }

    /// Resolves one wire node.
    ///
    /// # Errors
    /// - `MissingParameter` when a field required by the node's tag is absent
    /// - `InvalidField` for an unknown tag or malformed embedded text
    /// - `UnknownIdentifier` when any id or label cannot be resolved
    pub fn resolve(&self, node: &ExpressionNode) -> EditResult<Expression> {
        let mut unresolved = Vec::new();
        let expr = self.node(node, &mut unresolved)?;
        finish(expr, unresolved)
    }

    /// Resolves a list of nodes, failing on the first bad one.
    ///
    /// # Errors
    /// See [`Resolver::resolve`].
    pub fn resolve_all(&self, nodes: &[ExpressionNode]) -> EditResult<Vec<Expression>> {
        nodes.iter().map(|n| self.resolve(n)).collect()
    }

    /// Parses and resolves embedded expression text.
    ///
    /// # Errors
    /// See [`Resolver::resolve`].
    pub fn resolve_text(&self, text: &str) -> EditResult<Expression> {
        let mut unresolved = Vec::new();
        let expr = self.text(text, &mut unresolved)?;
        finish(expr, unresolved)
    }

    fn node(&self, node: &ExpressionNode, unresolved: &mut Vec<String>) -> EditResult<Expression> {
        let kind = node
            .kind
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| EditError::missing("expression.type"))?;

        match kind {
            "class" => {
                let literal = required_literal(node)?;
                if parser::is_compound(literal) {
                    self.text(literal, unresolved)
                } else {
                    Ok(Expression::Class {
                        id: self.class_term(literal, unresolved),
                    })
                }
            }
            "svf" => {
                let on_prop = node
                    .on_prop
                    .as_deref()
                    .filter(|p| !p.trim().is_empty())
                    .ok_or_else(|| EditError::missing("expression.onProp"))?;

                let filler = match (&node.expressions, node.literal.as_deref()) {
                    (Some(children), _) if !children.is_empty() => {
                        Expression::intersection(self.children(children, unresolved)?)
                    }
                    (_, Some(literal)) if !literal.trim().is_empty() => {
                        if parser::is_compound(literal) {
                            self.text(literal, unresolved)?
                        } else {
                            Expression::Class {
                                id: self.class_term(literal, unresolved),
                            }
                        }
                    }
                    _ => return Err(EditError::missing("expression.literal")),
                };

                let relation = self.relation_term(on_prop, unresolved);
                Ok(Expression::Restriction {
                    relation,
                    filler: Box::new(filler),
                })
            }
            "intersection" | "union" => {
                let children = node
                    .expressions
                    .as_deref()
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| EditError::missing("expression.expressions"))?;
                let operands = self.children(children, unresolved)?;
                Ok(if kind == "union" {
                    Expression::union(operands)
                } else {
                    Expression::intersection(operands)
                })
            }
            other => Err(ValidationError::InvalidField {
                field: "expression.type".to_string(),
                reason: format!("unknown expression type '{other}'"),
            }
            .into()),
        }
    }

    fn children(&self, nodes: &[ExpressionNode], unresolved: &mut Vec<String>) -> EditResult<Vec<Expression>> {
        nodes.iter().map(|n| self.node(n, unresolved)).collect()
    }

    fn text(&self, text: &str, unresolved: &mut Vec<String>) -> EditResult<Expression> {
        let mut mapper = ResolvingMapper {
            resolver: self,
            unresolved,
        };
        parser::parse_with(text, &mut mapper).map_err(|e| {
            ValidationError::InvalidField {
                field: "expression.literal".to_string(),
                reason: format!("could not parse \"{text}\": {e}"),
            }
            .into()
        })
    }

    fn class_term(&self, identifier: &str, unresolved: &mut Vec<String>) -> TermId {
        let identifier = identifier.trim();
        if let Some(id) = self.taxonomy.class(identifier) {
            return id;
        }
        if !self.lookup.lookup(identifier, self.taxon).is_empty() {
            return TermId::from(identifier);
        }
        unresolved.push(identifier.to_string());
        TermId::from(identifier)
    }

    fn relation_term(&self, identifier: &str, unresolved: &mut Vec<String>) -> TermId {
        let identifier = identifier.trim();
        if let Some(id) = self.taxonomy.relation(identifier) {
            return id;
        }
        unresolved.push(identifier.to_string());
        TermId::from(identifier)
    }
}

struct ResolvingMapper<'r, 'a> {
    resolver: &'r Resolver<'a>,
    unresolved: &'r mut Vec<String>,
}

impl TermMapper for ResolvingMapper<'_, '_> {
    fn class(&mut self, name: &str) -> TermId {
        self.resolver.class_term(name, self.unresolved)
    }

    fn relation(&mut self, name: &str) -> TermId {
        self.resolver.relation_term(name, self.unresolved)
    }
}

fn required_literal(node: &ExpressionNode) -> EditResult<&str> {
    node.literal
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| EditError::missing("expression.literal"))
}

fn finish(expr: Expression, unresolved: Vec<String>) -> EditResult<Expression> {
    let mut seen = HashSet::with_capacity(unresolved.len());
    let mut ordered = unresolved.into_iter().filter(|id| seen.insert(id.clone()));
    let Some(id) = ordered.next() else {
        return Ok(expr);
    };
    Err(ExecutionError::UnknownIdentifier {
        id,
        others: ordered.collect(),
    }
    .into())
}

/// Resolves `node` in the context of `model`.
///
/// # Errors
/// See [`Resolver::resolve`].
pub fn resolve(
    model: &Model,
    node: &ExpressionNode,
    taxonomy: &dyn Taxonomy,
    lookup: &dyn IdentifierLookup,
) -> EditResult<Expression> {
    Resolver::new(taxonomy, lookup).for_model(model).resolve(node)
}
