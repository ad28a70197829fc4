// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field descriptors.
//!
//! Maps one model attribute (or one latitude/longitude pair) to exactly one
//! [`SchemaField`]. The native → engine type table is total over the
//! supported native types:
//!
//! ```text
//! Char Text Email Url Slug Uuid FilePath IpAddress Json   → string
//! Auto SmallAuto Integer SmallInteger Positive(Small)Int  → int32
//! BigAuto BigInteger PositiveBigInteger Date DateTime     → int64
//! Decimal Float                                           → float
//! Boolean                                                 → bool
//! (lat, lon) pair                                         → geopoint
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Attribute, NativeType};

use super::SchemaError;

/// Engine field type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "string[]")]
    StringArray,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int32[]")]
    Int32Array,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "int64[]")]
    Int64Array,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "float[]")]
    FloatArray,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "bool[]")]
    BoolArray,
    #[serde(rename = "geopoint")]
    Geopoint,
    #[serde(rename = "geopoint[]")]
    GeopointArray,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "object[]")]
    ObjectArray,
    #[serde(rename = "string*")]
    StringAuto,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "auto")]
    Auto,
}

impl FieldType {
    /// Numeric scalar types the engine sorts on by default.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Float)
    }

    /// Nested-object types (require `enable_nested_fields`).
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object | Self::ObjectArray)
    }

    /// Types a relation id field may carry.
    #[must_use]
    pub fn is_reference_type(&self) -> bool {
        matches!(self, Self::String | Self::Int32 | Self::Int64 | Self::Float)
    }

    /// Sortability when the configuration does not say otherwise.
    #[must_use]
    pub fn default_sort(&self) -> bool {
        self.is_numeric() || *self == Self::Geopoint
    }

    /// Map a native type; `None` for unsupported types.
    #[must_use]
    pub fn from_native(native: NativeType) -> Option<Self> {
        use NativeType as N;
        match native {
            N::Char | N::Text | N::Email | N::Url | N::Slug | N::Uuid | N::FilePath
            | N::IpAddress | N::Json => Some(Self::String),
            N::Auto | N::SmallAuto | N::Integer | N::SmallInteger | N::PositiveInteger
            | N::PositiveSmallInteger => Some(Self::Int32),
            N::BigAuto | N::BigInteger | N::PositiveBigInteger | N::Date | N::DateTime => {
                Some(Self::Int64)
            }
            N::Decimal | N::Float => Some(Self::Float),
            N::Boolean => Some(Self::Bool),
            N::Binary | N::Duration | N::Time | N::Relation => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::String => "string",
            Self::StringArray => "string[]",
            Self::Int32 => "int32",
            Self::Int32Array => "int32[]",
            Self::Int64 => "int64",
            Self::Int64Array => "int64[]",
            Self::Float => "float",
            Self::FloatArray => "float[]",
            Self::Bool => "bool",
            Self::BoolArray => "bool[]",
            Self::Geopoint => "geopoint",
            Self::GeopointArray => "geopoint[]",
            Self::Object => "object",
            Self::ObjectArray => "object[]",
            Self::StringAuto => "string*",
            Self::Image => "image",
            Self::Auto => "auto",
        };
        write!(f, "{}", tag)
    }
}

fn default_true() -> bool {
    true
}

/// One field of a collection schema, as sent to (and read back from) the
/// engine. Unknown keys in engine responses are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub facet: bool,
    #[serde(default)]
    pub sort: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default = "default_true")]
    pub index: bool,
    /// Join reference, `"{collection}.{field}"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl SchemaField {
    /// Indexed, required field with the type's default sortability.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            facet: false,
            sort: field_type.default_sort(),
            optional: false,
            index: true,
            reference: None,
        }
    }

    #[must_use]
    pub fn facet(mut self, facet: bool) -> Self {
        self.facet = facet;
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Per-field flags resolved from the collection configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFlags {
    pub facet: bool,
    /// `None` keeps the type's default sortability.
    pub sort: Option<bool>,
}

impl FieldFlags {
    fn apply(self, field: SchemaField) -> SchemaField {
        let sort = self.sort.unwrap_or(field.sort);
        field.facet(self.facet).sort(sort)
    }
}

/// Map an attribute's native type, naming the attribute on failure.
pub fn map_native_type(attribute: &Attribute) -> Result<FieldType, SchemaError> {
    FieldType::from_native(attribute.native_type).ok_or_else(|| SchemaError::UnsupportedFieldType {
        attribute: attribute.name.clone(),
        native_type: attribute.native_type,
    })
}

/// Describe one scalar attribute.
pub fn describe_attribute(
    attribute: &Attribute,
    flags: FieldFlags,
) -> Result<SchemaField, SchemaError> {
    let field_type = map_native_type(attribute)?;
    let field = SchemaField::new(attribute.name.clone(), field_type).optional(attribute.nullable);
    Ok(flags.apply(field))
}

/// Describe a latitude/longitude pair as one `geopoint` field named
/// `{lat}_{lon}`.
///
/// Either side may be missing from the model (`None`); that, a pair reusing
/// one attribute twice, or a non floating-point coordinate is rejected.
pub fn describe_geopoint(
    lat_name: &str,
    lon_name: &str,
    lat: Option<&Attribute>,
    lon: Option<&Attribute>,
    flags: FieldFlags,
) -> Result<SchemaField, SchemaError> {
    let invalid = |reason: &str| SchemaError::InvalidGeopointPair {
        lat: lat_name.to_string(),
        lon: lon_name.to_string(),
        reason: reason.to_string(),
    };

    let (lat, lon) = match (lat, lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        (None, Some(_)) => return Err(invalid("latitude attribute is not in the model")),
        (Some(_), None) => return Err(invalid("longitude attribute is not in the model")),
        (None, None) => return Err(invalid("neither attribute is in the model")),
    };

    if lat.name == lon.name {
        return Err(invalid("latitude and longitude must be different attributes"));
    }

    for coordinate in [lat, lon] {
        if !coordinate.native_type.is_coordinate() {
            return Err(invalid(&format!(
                "'{}' is {}, expected a float or decimal",
                coordinate.name, coordinate.native_type
            )));
        }
    }

    let field = SchemaField::new(format!("{}_{}", lat.name, lon.name), FieldType::Geopoint)
        .optional(lat.nullable || lon.nullable);
    Ok(flags.apply(field))
}
