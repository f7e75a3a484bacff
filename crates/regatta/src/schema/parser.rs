// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON document parser and validator for the schema dialect.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use super::{EnumType, Field, FixedType, RecordType, SchemaType};
use crate::error::RegistryError;

/// Parse a schema document into a validated type tree.
pub(super) fn parse_document(text: &str) -> Result<SchemaType, RegistryError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| invalid(format!("not valid JSON: {}", e)))?;

    let mut ctx = Context::default();
    ctx.parse(&value, None)
}

fn invalid(detail: impl Into<String>) -> RegistryError {
    RegistryError::InvalidSchema(detail.into())
}

/// Parse-time state: completed named-type definitions, keyed by
/// fully-qualified name. A name becomes referenceable only once its
/// definition is complete, so self-recursive types are rejected.
#[derive(Default)]
struct Context {
    defined: HashMap<String, SchemaType>,
}

impl Context {
    fn parse(
        &mut self,
        value: &Value,
        enclosing_ns: Option<&str>,
    ) -> Result<SchemaType, RegistryError> {
        match value {
            Value::String(name) => self.parse_name(name, enclosing_ns),
            Value::Array(branches) => self.parse_union(branches, enclosing_ns),
            Value::Object(attrs) => self.parse_object(attrs, enclosing_ns),
            other => Err(invalid(format!(
                "expected a type, found {}",
                json_kind(other)
            ))),
        }
    }

    /// A bare string: a primitive, or a reference to a completed
    /// named-type definition.
    fn parse_name(
        &mut self,
        name: &str,
        enclosing_ns: Option<&str>,
    ) -> Result<SchemaType, RegistryError> {
        if let Some(primitive) = primitive_type(name) {
            return Ok(primitive);
        }

        if !name.contains('.') {
            if let Some(ns) = enclosing_ns {
                if let Some(ty) = self.defined.get(&format!("{}.{}", ns, name)) {
                    return Ok(ty.clone());
                }
            }
        }
        if let Some(ty) = self.defined.get(name) {
            return Ok(ty.clone());
        }

        Err(invalid(format!("unknown type: {}", name)))
    }

    fn parse_union(
        &mut self,
        branches: &[Value],
        enclosing_ns: Option<&str>,
    ) -> Result<SchemaType, RegistryError> {
        if branches.is_empty() {
            return Err(invalid("union must have at least one branch"));
        }

        let mut types = Vec::with_capacity(branches.len());
        let mut seen = HashSet::new();
        for branch in branches {
            let ty = self.parse(branch, enclosing_ns)?;
            if matches!(ty, SchemaType::Union(_)) {
                return Err(invalid("unions may not immediately contain unions"));
            }
            // Named branches are distinguished by full name, unnamed ones
            // by kind; two branches with the same key are ambiguous.
            let key = ty.name().unwrap_or_else(|| ty.kind()).to_string();
            if !seen.insert(key.clone()) {
                return Err(invalid(format!("duplicate union branch: {}", key)));
            }
            types.push(ty);
        }

        Ok(SchemaType::Union(types))
    }

    fn parse_object(
        &mut self,
        attrs: &Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<SchemaType, RegistryError> {
        let type_attr = attrs
            .get("type")
            .ok_or_else(|| invalid("missing \"type\" attribute"))?;

        match type_attr {
            Value::String(s) => match s.as_str() {
                "record" => self.parse_record(attrs, enclosing_ns),
                "enum" => self.parse_enum(attrs, enclosing_ns),
                "fixed" => self.parse_fixed(attrs, enclosing_ns),
                "array" => {
                    let items = attrs
                        .get("items")
                        .ok_or_else(|| invalid("array is missing \"items\""))?;
                    Ok(SchemaType::Array(Box::new(
                        self.parse(items, enclosing_ns)?,
                    )))
                }
                "map" => {
                    let values = attrs
                        .get("values")
                        .ok_or_else(|| invalid("map is missing \"values\""))?;
                    Ok(SchemaType::Map(Box::new(
                        self.parse(values, enclosing_ns)?,
                    )))
                }
                // Object form of a primitive or a named reference, e.g.
                // {"type":"string"}. Unknown attributes are elided.
                other => self.parse_name(other, enclosing_ns),
            },
            // The "type" attribute may itself be a complex schema.
            nested => self.parse(nested, enclosing_ns),
        }
    }

    fn parse_record(
        &mut self,
        attrs: &Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<SchemaType, RegistryError> {
        let (full_name, own_ns) = qualified_name(attrs, enclosing_ns)?;

        let raw_fields = match attrs.get("fields") {
            Some(Value::Array(fields)) => fields,
            Some(_) => return Err(invalid("record \"fields\" must be an array")),
            None => return Err(invalid("record is missing \"fields\"")),
        };

        let mut fields = Vec::with_capacity(raw_fields.len());
        let mut names = HashSet::new();
        for raw in raw_fields {
            let field_attrs = match raw {
                Value::Object(map) => map,
                other => {
                    return Err(invalid(format!(
                        "record field must be an object, found {}",
                        json_kind(other)
                    )))
                }
            };

            let name = required_string(field_attrs, "name", "field")?;
            if !valid_name_segment(name) {
                return Err(invalid(format!("invalid field name: {}", name)));
            }
            if !names.insert(name.to_string()) {
                return Err(invalid(format!("duplicate field name: {}", name)));
            }

            let type_attr = field_attrs
                .get("type")
                .ok_or_else(|| invalid(format!("field {} is missing \"type\"", name)))?;
            let ty = self.parse(type_attr, own_ns.as_deref())?;

            fields.push(Field {
                name: name.to_string(),
                ty,
                default: field_attrs.get("default").cloned(),
            });
        }

        let record = SchemaType::Record(RecordType {
            name: full_name.clone(),
            fields,
        });
        self.define(full_name, record.clone())?;
        Ok(record)
    }

    fn parse_enum(
        &mut self,
        attrs: &Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<SchemaType, RegistryError> {
        let (full_name, _) = qualified_name(attrs, enclosing_ns)?;

        let raw_symbols = match attrs.get("symbols") {
            Some(Value::Array(symbols)) => symbols,
            Some(_) => return Err(invalid("enum \"symbols\" must be an array")),
            None => return Err(invalid("enum is missing \"symbols\"")),
        };
        if raw_symbols.is_empty() {
            return Err(invalid("enum must have at least one symbol"));
        }

        let mut symbols = Vec::with_capacity(raw_symbols.len());
        let mut seen = HashSet::new();
        for raw in raw_symbols {
            let symbol = match raw {
                Value::String(s) => s,
                other => {
                    return Err(invalid(format!(
                        "enum symbol must be a string, found {}",
                        json_kind(other)
                    )))
                }
            };
            if !valid_name_segment(symbol) {
                return Err(invalid(format!("invalid enum symbol: {}", symbol)));
            }
            if !seen.insert(symbol.clone()) {
                return Err(invalid(format!("duplicate enum symbol: {}", symbol)));
            }
            symbols.push(symbol.clone());
        }

        let ty = SchemaType::Enum(EnumType {
            name: full_name.clone(),
            symbols,
        });
        self.define(full_name, ty.clone())?;
        Ok(ty)
    }

    fn parse_fixed(
        &mut self,
        attrs: &Map<String, Value>,
        enclosing_ns: Option<&str>,
    ) -> Result<SchemaType, RegistryError> {
        let (full_name, _) = qualified_name(attrs, enclosing_ns)?;

        let size = match attrs.get("size") {
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| invalid("fixed \"size\" must be a non-negative integer"))?,
            Some(_) => return Err(invalid("fixed \"size\" must be a non-negative integer")),
            None => return Err(invalid("fixed is missing \"size\"")),
        };

        let ty = SchemaType::Fixed(FixedType {
            name: full_name.clone(),
            size,
        });
        self.define(full_name, ty.clone())?;
        Ok(ty)
    }

    fn define(&mut self, full_name: String, ty: SchemaType) -> Result<(), RegistryError> {
        if self.defined.insert(full_name.clone(), ty).is_some() {
            return Err(invalid(format!("duplicate type name: {}", full_name)));
        }
        Ok(())
    }
}

/// Resolve the fully-qualified name of a named type: an already-dotted
/// `name` wins, then an explicit `namespace` attribute, then the
/// enclosing namespace. Returns the full name and the namespace nested
/// definitions inherit.
fn qualified_name(
    attrs: &Map<String, Value>,
    enclosing_ns: Option<&str>,
) -> Result<(String, Option<String>), RegistryError> {
    let name = required_string(attrs, "name", "named type")?;

    let (full, ns) = if let Some(dot) = name.rfind('.') {
        (name.to_string(), Some(name[..dot].to_string()))
    } else {
        match attrs.get("namespace") {
            Some(Value::String(ns)) if ns.is_empty() => (name.to_string(), None),
            Some(Value::String(ns)) => (format!("{}.{}", ns, name), Some(ns.clone())),
            Some(_) => return Err(invalid("\"namespace\" must be a string")),
            None => match enclosing_ns {
                Some(ns) => (format!("{}.{}", ns, name), Some(ns.to_string())),
                None => (name.to_string(), None),
            },
        }
    };

    for segment in full.split('.') {
        if !valid_name_segment(segment) {
            return Err(invalid(format!("invalid name: {}", full)));
        }
    }

    Ok((full, ns))
}

fn required_string<'a>(
    attrs: &'a Map<String, Value>,
    key: &str,
    context: &str,
) -> Result<&'a str, RegistryError> {
    match attrs.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) => Err(invalid(format!("{} \"{}\" must be non-empty", context, key))),
        Some(_) => Err(invalid(format!("{} \"{}\" must be a string", context, key))),
        None => Err(invalid(format!("{} is missing \"{}\"", context, key))),
    }
}

fn valid_name_segment(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn primitive_type(name: &str) -> Option<SchemaType> {
    match name {
        "null" => Some(SchemaType::Null),
        "boolean" => Some(SchemaType::Boolean),
        "int" => Some(SchemaType::Int),
        "long" => Some(SchemaType::Long),
        "float" => Some(SchemaType::Float),
        "double" => Some(SchemaType::Double),
        "string" => Some(SchemaType::String),
        "bytes" => Some(SchemaType::Bytes),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<SchemaType, RegistryError> {
        parse_document(text)
    }

    #[test]
    fn bare_and_object_primitives_are_equivalent() {
        assert_eq!(parse("\"string\"").unwrap(), SchemaType::String);
        assert_eq!(parse("{\"type\":\"string\"}").unwrap(), SchemaType::String);
    }

    #[test]
    fn record_with_fields() {
        let ty = parse(
            r#"{"type":"record","name":"r","fields":[
                {"name":"f","type":"string"},
                {"name":"g","type":"int","default":0}
            ]}"#,
        )
        .unwrap();

        let SchemaType::Record(record) = ty else {
            panic!("expected record");
        };
        assert_eq!(record.name, "r");
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[1].default, Some(serde_json::json!(0)));
    }

    #[test]
    fn namespace_folds_into_full_name() {
        let ty = parse(
            r#"{"type":"record","name":"User","namespace":"com.example","fields":[
                {"name":"tag","type":{"type":"enum","name":"Tag","symbols":["A"]}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(ty.name(), Some("com.example.User"));
        let SchemaType::Record(record) = ty else {
            panic!("expected record");
        };
        // Nested named types inherit the enclosing namespace.
        assert_eq!(record.fields[0].ty.name(), Some("com.example.Tag"));
    }

    #[test]
    fn reference_to_completed_definition_resolves() {
        let ty = parse(
            r#"{"type":"record","name":"Pair","fields":[
                {"name":"a","type":{"type":"fixed","name":"Id","size":8}},
                {"name":"b","type":"Id"}
            ]}"#,
        )
        .unwrap();

        let SchemaType::Record(record) = ty else {
            panic!("expected record");
        };
        assert_eq!(record.fields[0].ty, record.fields[1].ty);
    }

    #[test]
    fn self_recursive_reference_is_rejected() {
        let err = parse(
            r#"{"type":"record","name":"Node","fields":[
                {"name":"next","type":"Node"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema(_)));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = parse("\"sting\"").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema(_)));
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let err = parse(
            r#"{"type":"record","name":"r","fields":[
                {"name":"f","type":"string"},
                {"name":"f","type":"int"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema(_)));
    }

    #[test]
    fn union_branches_must_be_distinct() {
        assert!(parse(r#"["null","string"]"#).is_ok());
        assert!(parse(r#"["string","string"]"#).is_err());
        assert!(parse(r#"["null",["int"]]"#).is_err());
    }

    #[test]
    fn enum_symbols_are_validated() {
        assert!(parse(r#"{"type":"enum","name":"e","symbols":["A","B"]}"#).is_ok());
        assert!(parse(r#"{"type":"enum","name":"e","symbols":[]}"#).is_err());
        assert!(parse(r#"{"type":"enum","name":"e","symbols":["A","A"]}"#).is_err());
        assert!(parse(r#"{"type":"enum","name":"e","symbols":["9A"]}"#).is_err());
    }

    #[test]
    fn fixed_requires_integer_size() {
        assert!(parse(r#"{"type":"fixed","name":"x","size":16}"#).is_ok());
        assert!(parse(r#"{"type":"fixed","name":"x","size":-1}"#).is_err());
        assert!(parse(r#"{"type":"fixed","name":"x"}"#).is_err());
    }

    #[test]
    fn non_json_is_rejected() {
        assert!(parse("struct S { long x; };").is_err());
    }
}
