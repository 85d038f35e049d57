//! Entity kinds and operations, and the routing facts derived from them.

use std::fmt;

/// Kind of object a request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A whole model.
    Model,
    /// One individual of a model.
    Individual,
    /// One fact between two individuals.
    Edge,
    /// Relation metadata of the taxonomy.
    Relations,
    /// Evidence types of the taxonomy.
    Evidence,
}

impl EntityKind {
    /// Wire label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Individual => "individual",
            Self::Edge => "edge",
            Self::Relations => "relations",
            Self::Evidence => "evidence",
        }
    }

    /// Parses a wire label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "model" => Some(Self::Model),
            "individual" => Some(Self::Individual),
            "edge" => Some(Self::Edge),
            "relations" => Some(Self::Relations),
            "evidence" => Some(Self::Evidence),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operation named by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Read an individual or a whole model.
    Get,
    /// Create an individual.
    Create,
    /// Create two individuals and the fact between them.
    CreateComposite,
    /// Assert type expressions.
    AddType,
    /// Retract type expressions.
    RemoveType,
    /// Add a fact.
    Add,
    /// Remove an individual or a fact.
    Remove,
    /// Add annotations.
    AddAnnotation,
    /// Remove annotations.
    RemoveAnnotation,
    /// Create a model seeded from the seed corpus.
    Generate,
    /// Create an empty model.
    GenerateBlank,
    /// Serialize a model as a JSON document.
    Export,
    /// Serialize a model in a line-oriented text format.
    ExportLegacy,
    /// Create a model from an exported document.
    Import,
    /// Validate and persist a model.
    Store,
    /// List every known model id.
    AllModelIds,
    /// List the well-known annotations of every model.
    AllModelMeta,
    /// Find models mentioning identifiers.
    Search,
    /// Revert the most recent edit.
    Undo,
    /// Re-apply the most recently reverted edit.
    Redo,
    /// Summarize the undo and redo stacks.
    GetUndoRedo,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Self; 21] = [
        Self::Get,
        Self::Create,
        Self::CreateComposite,
        Self::AddType,
        Self::RemoveType,
        Self::Add,
        Self::Remove,
        Self::AddAnnotation,
        Self::RemoveAnnotation,
        Self::Generate,
        Self::GenerateBlank,
        Self::Export,
        Self::ExportLegacy,
        Self::Import,
        Self::Store,
        Self::AllModelIds,
        Self::AllModelMeta,
        Self::Search,
        Self::Undo,
        Self::Redo,
        Self::GetUndoRedo,
    ];

    /// Wire label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Create => "create",
            Self::CreateComposite => "create-composite",
            Self::AddType => "add-type",
            Self::RemoveType => "remove-type",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::AddAnnotation => "add-annotation",
            Self::RemoveAnnotation => "remove-annotation",
            Self::Generate => "generate",
            Self::GenerateBlank => "generate-blank",
            Self::Export => "export",
            Self::ExportLegacy => "export-legacy",
            Self::Import => "import",
            Self::Store => "store",
            Self::AllModelIds => "all-model-ids",
            Self::AllModelMeta => "all-model-meta",
            Self::Search => "search",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::GetUndoRedo => "get-undo-redo",
        }
    }

    /// Parses a wire label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.label() == label)
    }

    /// Returns true if the operation changes state and so needs privilege.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        !matches!(
            self,
            Self::Get
                | Self::Export
                | Self::ExportLegacy
                | Self::AllModelIds
                | Self::AllModelMeta
                | Self::Search
                | Self::GetUndoRedo
        )
    }

    /// Returns true if the operation creates the batch's model.
    #[must_use]
    pub const fn creates_model(self) -> bool {
        matches!(self, Self::Generate | Self::GenerateBlank | Self::Import)
    }

    /// Returns true if `entity` supports this operation.
    #[must_use]
    pub const fn supported_by(self, entity: EntityKind) -> bool {
        match entity {
            EntityKind::Individual => matches!(
                self,
                Self::Get
                    | Self::Create
                    | Self::CreateComposite
                    | Self::AddType
                    | Self::RemoveType
                    | Self::Remove
                    | Self::AddAnnotation
                    | Self::RemoveAnnotation
            ),
            EntityKind::Edge => matches!(
                self,
                Self::Add | Self::Remove | Self::AddAnnotation | Self::RemoveAnnotation
            ),
            EntityKind::Model => !matches!(
                self,
                Self::Create | Self::CreateComposite | Self::AddType | Self::RemoveType | Self::Add | Self::Remove
            ),
            EntityKind::Relations | EntityKind::Evidence => matches!(self, Self::Get),
        }
    }

    /// Returns true if the pair is a meta operation.
    #[must_use]
    pub const fn is_meta(self, entity: EntityKind) -> bool {
        match entity {
            EntityKind::Relations | EntityKind::Evidence => true,
            EntityKind::Model => matches!(
                self,
                Self::Export
                    | Self::ExportLegacy
                    | Self::Store
                    | Self::AllModelIds
                    | Self::AllModelMeta
                    | Self::Search
                    | Self::GetUndoRedo
            ),
            EntityKind::Individual | EntityKind::Edge => false,
        }
    }

    /// Returns true if the pair works on an existing, bound model.
    #[must_use]
    pub const fn needs_model(self, entity: EntityKind) -> bool {
        match entity {
            EntityKind::Individual | EntityKind::Edge => true,
            EntityKind::Model => !matches!(
                self,
                Self::Generate
                    | Self::GenerateBlank
                    | Self::Import
                    | Self::AllModelIds
                    | Self::AllModelMeta
                    | Self::Search
            ),
            EntityKind::Relations | EntityKind::Evidence => false,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
