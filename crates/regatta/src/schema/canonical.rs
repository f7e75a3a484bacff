// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Canonical text emission.
//!
//! Emits the type tree as whitespace-free JSON with a pinned attribute
//! order: `{type, name, namespace, fields, symbols, items, values, size}`
//! for types (namespace already folded into the full name, so it never
//! appears) and `{name, type, default}` for fields. Documentation and
//! unknown attributes were dropped at parse time. A named type is printed
//! in full at its first occurrence and as its bare fully-qualified name
//! afterwards.

use std::collections::HashSet;

use super::SchemaType;

/// Emit the canonical text for a type tree. Pure and deterministic.
pub(super) fn emit(root: &SchemaType) -> String {
    let mut out = String::new();
    let mut emitted = HashSet::new();
    write_type(&mut out, root, &mut emitted);
    out
}

fn write_type(out: &mut String, ty: &SchemaType, emitted: &mut HashSet<String>) {
    match ty {
        SchemaType::Null
        | SchemaType::Boolean
        | SchemaType::Int
        | SchemaType::Long
        | SchemaType::Float
        | SchemaType::Double
        | SchemaType::String
        | SchemaType::Bytes => {
            write_name(out, ty.kind());
        }

        SchemaType::Record(record) => {
            if !emitted.insert(record.name.clone()) {
                write_name(out, &record.name);
                return;
            }
            out.push_str("{\"type\":\"record\",\"name\":");
            write_name(out, &record.name);
            out.push_str(",\"fields\":[");
            for (i, field) in record.fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str("{\"name\":");
                write_name(out, &field.name);
                out.push_str(",\"type\":");
                write_type(out, &field.ty, emitted);
                if let Some(default) = &field.default {
                    out.push_str(",\"default\":");
                    // Map keys in a JSON value are strings, so compact
                    // serialization cannot fail.
                    out.push_str(
                        &serde_json::to_string(default).expect("default value is valid JSON"),
                    );
                }
                out.push('}');
            }
            out.push_str("]}");
        }

        SchemaType::Enum(en) => {
            if !emitted.insert(en.name.clone()) {
                write_name(out, &en.name);
                return;
            }
            out.push_str("{\"type\":\"enum\",\"name\":");
            write_name(out, &en.name);
            out.push_str(",\"symbols\":[");
            for (i, symbol) in en.symbols.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_name(out, symbol);
            }
            out.push_str("]}");
        }

        SchemaType::Array(items) => {
            out.push_str("{\"type\":\"array\",\"items\":");
            write_type(out, items, emitted);
            out.push('}');
        }

        SchemaType::Map(values) => {
            out.push_str("{\"type\":\"map\",\"values\":");
            write_type(out, values, emitted);
            out.push('}');
        }

        SchemaType::Union(branches) => {
            out.push('[');
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_type(out, branch, emitted);
            }
            out.push(']');
        }

        SchemaType::Fixed(fixed) => {
            if !emitted.insert(fixed.name.clone()) {
                write_name(out, &fixed.name);
                return;
            }
            out.push_str("{\"type\":\"fixed\",\"name\":");
            write_name(out, &fixed.name);
            out.push_str(",\"size\":");
            out.push_str(&fixed.size.to_string());
            out.push('}');
        }
    }
}

/// Names, field names, and symbols are validated to `[A-Za-z0-9_.]` at
/// parse time, so they never need JSON escaping.
fn write_name(out: &mut String, name: &str) {
    out.push('"');
    out.push_str(name);
    out.push('"');
}

// ---------------------------------------------------------------------------
// Golden tests -- these pin the canonical form. Changing any expected
// string here changes every fingerprint in every deployed log.
// ---------------------------------------------------------------------------
