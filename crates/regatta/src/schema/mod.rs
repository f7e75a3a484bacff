// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema dialect: parsing, validation, and canonicalization.
//!
//! The supported dialect is a record-oriented structural schema language
//! encoded as JSON. Primitive types are `null`, `boolean`, `int`, `long`,
//! `float`, `double`, `string`, and `bytes`; complex types are named
//! records with ordered fields, enums, arrays, maps, unions (JSON arrays),
//! and fixed-size byte arrays.
//!
//! Parsing produces a [`Schema`]: the validated type tree plus its
//! canonical text and structural fingerprint. Canonicalization is a pure
//! function -- two inputs denote the same schema iff their canonical
//! texts are byte-identical.

use std::fmt;

use md5::{Digest, Md5};

mod canonical;
mod parser;

use crate::error::RegistryError;

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// 16-byte structural fingerprint of a canonical schema text.
///
/// Derived state: the command log persists canonical text only, and every
/// node recomputes fingerprints during replay.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Compute the fingerprint of a canonical text.
    pub fn of(canonical_text: &str) -> Self {
        let mut hasher = Md5::new();
        hasher.update(canonical_text.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..]);
        Self(bytes)
    }

    /// Raw digest bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint(")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Type tree
// ---------------------------------------------------------------------------

/// A node in the structural type tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    Record(RecordType),
    Enum(EnumType),
    Array(Box<SchemaType>),
    Map(Box<SchemaType>),
    Union(Vec<SchemaType>),
    Fixed(FixedType),
}

impl SchemaType {
    /// Fully-qualified name for named types, `None` otherwise.
    pub fn name(&self) -> Option<&str> {
        match self {
            SchemaType::Record(r) => Some(&r.name),
            SchemaType::Enum(e) => Some(&e.name),
            SchemaType::Fixed(x) => Some(&x.name),
            _ => None,
        }
    }

    /// Short kind label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaType::Null => "null",
            SchemaType::Boolean => "boolean",
            SchemaType::Int => "int",
            SchemaType::Long => "long",
            SchemaType::Float => "float",
            SchemaType::Double => "double",
            SchemaType::String => "string",
            SchemaType::Bytes => "bytes",
            SchemaType::Record(_) => "record",
            SchemaType::Enum(_) => "enum",
            SchemaType::Array(_) => "array",
            SchemaType::Map(_) => "map",
            SchemaType::Union(_) => "union",
            SchemaType::Fixed(_) => "fixed",
        }
    }
}

/// A named record with ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    /// Fully-qualified name (namespace folded in).
    pub name: String,
    pub fields: Vec<Field>,
}

/// A single record field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: SchemaType,
    /// Default value, verbatim from the source document. Semantic for
    /// compatibility: a reader-only field without a default is a breaking
    /// change.
    pub default: Option<serde_json::Value>,
}

/// A named enum with ordered symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub symbols: Vec<String>,
}

/// A named fixed-size byte array.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedType {
    pub name: String,
    pub size: u64,
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// A parsed, validated, canonicalized schema.
#[derive(Debug, Clone)]
pub struct Schema {
    root: SchemaType,
    canonical_text: String,
    fingerprint: Fingerprint,
}

impl Schema {
    /// Parse and canonicalize a schema document.
    ///
    /// Rejects structurally invalid documents with
    /// [`RegistryError::InvalidSchema`].
    pub fn parse(text: &str) -> Result<Self, RegistryError> {
        let root = parser::parse_document(text)?;
        let canonical_text = canonical::emit(&root);
        let fingerprint = Fingerprint::of(&canonical_text);

        Ok(Self {
            root,
            canonical_text,
            fingerprint,
        })
    }

    pub fn root(&self) -> &SchemaType {
        &self.root
    }

    pub fn canonical_text(&self) -> &str {
        &self.canonical_text
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_text == other.canonical_text
    }
}

impl Eq for Schema {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_does_not_change_fingerprint() {
        let a = Schema::parse("{   \"type\":   \"string\"}").unwrap();
        let b = Schema::parse("{\"type\":\"string\"}").unwrap();
        assert_eq!(a.canonical_text(), b.canonical_text());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn different_schemas_have_different_fingerprints() {
        let a = Schema::parse("\"string\"").unwrap();
        let b = Schema::parse("\"int\"").unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_formats_as_hex() {
        let fp = Fingerprint::of("\"string\"");
        let hex = fp.to_string();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
