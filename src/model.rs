// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Data-model descriptions.
//!
//! A [`ModelDescription`] is the structural view of one ORM entity: its name,
//! primary key and ordered attributes. It is supplied by the caller (usually
//! generated from the ORM's metadata) and never mutated by this crate.
//!
//! # Example
//!
//! ```
//! use typesense_sync::model::{Attribute, ModelDescription, NativeType, RelationTarget};
//!
//! let book = ModelDescription::new("Book")
//!     .attribute(Attribute::new("id", NativeType::BigAuto))
//!     .attribute(Attribute::new("title", NativeType::Char))
//!     .attribute(Attribute::foreign_key(
//!         "author",
//!         RelationTarget::primary_key("Author", NativeType::BigAuto),
//!     ))
//!     .attribute(Attribute::new("published_date", NativeType::Date));
//!
//! assert_eq!(book.collection_name(), "book");
//! assert_eq!(book.position("author"), Some(2));
//! assert!(book.get("author").unwrap().is_relation());
//! ```

use std::fmt;

/// Native (ORM-side) attribute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Auto,
    SmallAuto,
    BigAuto,
    Char,
    Text,
    Email,
    Url,
    Slug,
    Uuid,
    FilePath,
    IpAddress,
    Json,
    Integer,
    SmallInteger,
    PositiveInteger,
    PositiveSmallInteger,
    BigInteger,
    PositiveBigInteger,
    Boolean,
    Date,
    DateTime,
    Decimal,
    Float,
    Binary,
    Duration,
    Time,
    /// Relation attribute; see [`Attribute::relation`] for its target.
    Relation,
}

impl NativeType {
    /// Floating-point-like types usable as geopoint coordinates.
    #[must_use]
    pub fn is_coordinate(&self) -> bool {
        matches!(self, Self::Float | Self::Decimal)
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "AutoField",
            Self::SmallAuto => "SmallAutoField",
            Self::BigAuto => "BigAutoField",
            Self::Char => "CharField",
            Self::Text => "TextField",
            Self::Email => "EmailField",
            Self::Url => "URLField",
            Self::Slug => "SlugField",
            Self::Uuid => "UUIDField",
            Self::FilePath => "FilePathField",
            Self::IpAddress => "GenericIPAddressField",
            Self::Json => "JSONField",
            Self::Integer => "IntegerField",
            Self::SmallInteger => "SmallIntegerField",
            Self::PositiveInteger => "PositiveIntegerField",
            Self::PositiveSmallInteger => "PositiveSmallIntegerField",
            Self::BigInteger => "BigIntegerField",
            Self::PositiveBigInteger => "PositiveBigIntegerField",
            Self::Boolean => "BooleanField",
            Self::Date => "DateField",
            Self::DateTime => "DateTimeField",
            Self::Decimal => "DecimalField",
            Self::Float => "FloatField",
            Self::Binary => "BinaryField",
            Self::Duration => "DurationField",
            Self::Time => "TimeField",
            Self::Relation => "RelatedField",
        };
        write!(f, "{}", name)
    }
}

/// Kind of relation an attribute represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Many-to-one (forward).
    ForeignKey,
    /// One-to-one (forward).
    OneToOne,
    /// Many-to-many. Only indexable through an explicit link model.
    ManyToMany,
    /// Reverse side of another model's foreign key (one-to-many children).
    Reverse,
}

impl RelationKind {
    /// Whether this side of the relation points at a single parent row.
    #[must_use]
    pub fn is_parent(&self) -> bool {
        matches!(self, Self::ForeignKey | Self::OneToOne)
    }
}

/// Target of a relation attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationTarget {
    /// Related model name (e.g. "Author").
    pub model: String,
    pub kind: RelationKind,
    /// Field(s) on the related model the relation points at.
    /// More than one means a composite key.
    pub to_fields: Vec<String>,
    /// Native type of the (first) target field.
    pub to_field_type: NativeType,
    /// Whether the target field is the related model's primary key.
    pub to_primary_key: bool,
    /// Explicit link model for many-to-many relations.
    pub through: Option<String>,
}

impl RelationTarget {
    /// Foreign key pointing at the related model's `id` primary key.
    pub fn primary_key(model: impl Into<String>, pk_type: NativeType) -> Self {
        Self {
            model: model.into(),
            kind: RelationKind::ForeignKey,
            to_fields: vec!["id".to_string()],
            to_field_type: pk_type,
            to_primary_key: true,
            through: None,
        }
    }

    /// Foreign key pointing at a non-primary-key unique field.
    pub fn to_field(
        model: impl Into<String>,
        field: impl Into<String>,
        field_type: NativeType,
    ) -> Self {
        Self {
            model: model.into(),
            kind: RelationKind::ForeignKey,
            to_fields: vec![field.into()],
            to_field_type: field_type,
            to_primary_key: false,
            through: None,
        }
    }

    /// Composite foreign key over several target fields.
    pub fn composite<I, S>(model: impl Into<String>, fields: I, first_type: NativeType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            model: model.into(),
            kind: RelationKind::ForeignKey,
            to_fields: fields.into_iter().map(Into::into).collect(),
            to_field_type: first_type,
            to_primary_key: false,
            through: None,
        }
    }

    /// Many-to-many relation, optionally through an explicit link model.
    pub fn many_to_many(model: impl Into<String>, through: Option<String>) -> Self {
        Self {
            model: model.into(),
            kind: RelationKind::ManyToMany,
            to_fields: vec!["id".to_string()],
            to_field_type: NativeType::BigAuto,
            to_primary_key: true,
            through,
        }
    }

    /// Reverse side of a foreign key declared on `model`.
    pub fn reverse(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            kind: RelationKind::Reverse,
            to_fields: vec!["id".to_string()],
            to_field_type: NativeType::BigAuto,
            to_primary_key: true,
            through: None,
        }
    }

    /// Mark the relation as one-to-one.
    #[must_use]
    pub fn one_to_one(mut self) -> Self {
        self.kind = RelationKind::OneToOne;
        self
    }
}

/// One attribute of a data model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub native_type: NativeType,
    pub nullable: bool,
    pub relation: Option<RelationTarget>,
}

impl Attribute {
    /// Scalar, non-nullable attribute.
    pub fn new(name: impl Into<String>, native_type: NativeType) -> Self {
        Self {
            name: name.into(),
            native_type,
            nullable: false,
            relation: None,
        }
    }

    /// Forward relation (foreign key, one-to-one or many-to-many).
    pub fn foreign_key(name: impl Into<String>, target: RelationTarget) -> Self {
        Self {
            name: name.into(),
            native_type: NativeType::Relation,
            nullable: false,
            relation: Some(target),
        }
    }

    /// Reverse relation exposed on the parent model (e.g. `Book.chapter`).
    pub fn reverse(name: impl Into<String>, child_model: impl Into<String>) -> Self {
        Self::foreign_key(name, RelationTarget::reverse(child_model))
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    /// Relation kind, if this is a relation attribute.
    #[must_use]
    pub fn relation_kind(&self) -> Option<RelationKind> {
        self.relation.as_ref().map(|r| r.kind)
    }
}

/// Structural description of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescription {
    /// Model (type) name, e.g. "GeoPoint".
    pub name: String,
    /// Human-readable name; takes precedence over `name` when deriving
    /// the collection name.
    pub verbose_name: Option<String>,
    /// Primary-key attribute name.
    pub primary_key: String,
    /// Attributes in declaration order.
    pub attributes: Vec<Attribute>,
}

impl ModelDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verbose_name: None,
            primary_key: "id".to_string(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    #[must_use]
    pub fn primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Append an attribute (declaration order is preserved).
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Declared position of an attribute.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Default collection name: snake_case of the verbose name, falling back
    /// to the model name.
    #[must_use]
    pub fn collection_name(&self) -> String {
        match self.verbose_name.as_deref() {
            Some(verbose) if !verbose.trim().is_empty() => snake_case(verbose),
            _ => snake_case(&self.name),
        }
    }
}

/// Capability to describe a data model.
///
/// Queried once per derivation; implementations should return a consistent
/// snapshot.
pub trait DataModel: Send + Sync {
    fn describe(&self) -> ModelDescription;
}

impl DataModel for ModelDescription {
    fn describe(&self) -> ModelDescription {
        self.clone()
    }
}

/// Convert a model or verbose name to snake_case.
///
/// CamelCase boundaries, whitespace, `-` and `.` all become a single `_`.
/// Runs of capitals are kept together ("HTTPServer" → "http_server").
#[must_use]
pub fn snake_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() || c == '-' || c == '.' || c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }

        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }

    words.join("_")
}
