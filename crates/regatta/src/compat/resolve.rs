// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pairwise reader/writer resolution.
//!
//! `can_read(reader, writer)` answers: can data written with the writer
//! type be decoded by the reader type? Fields match by name; a reader-only
//! field is filled from its default; writer-only fields are skipped; a
//! shared field's writer type must be promotable to the reader type under
//! the fixed promotion table.

use crate::schema::SchemaType;

/// Returns `Ok(())` when the reader can decode writer data, or a
/// human-readable reason why not.
pub(super) fn can_read(reader: &SchemaType, writer: &SchemaType) -> Result<(), String> {
    // A writer union is readable only if every branch is.
    if let SchemaType::Union(writer_branches) = writer {
        for branch in writer_branches {
            can_read(reader, branch)
                .map_err(|reason| format!("union branch {}: {}", branch.kind(), reason))?;
        }
        return Ok(());
    }

    // A reader union reads a non-union writer if some branch does.
    if let SchemaType::Union(reader_branches) = reader {
        if reader_branches
            .iter()
            .any(|branch| can_read(branch, writer).is_ok())
        {
            return Ok(());
        }
        return Err(format!("no union branch can read {}", writer.kind()));
    }

    match (reader, writer) {
        (SchemaType::Record(r), SchemaType::Record(w)) => {
            if r.name != w.name {
                return Err(format!("record name mismatch: {} vs {}", r.name, w.name));
            }
            for reader_field in &r.fields {
                match w.fields.iter().find(|wf| wf.name == reader_field.name) {
                    Some(writer_field) => {
                        can_read(&reader_field.ty, &writer_field.ty).map_err(|reason| {
                            format!("field {}: {}", reader_field.name, reason)
                        })?;
                    }
                    None if reader_field.default.is_some() => {}
                    None => {
                        return Err(format!(
                            "field {} has no default and is absent from the writer",
                            reader_field.name
                        ));
                    }
                }
            }
            Ok(())
        }

        (SchemaType::Enum(r), SchemaType::Enum(w)) => {
            if r.name != w.name {
                return Err(format!("enum name mismatch: {} vs {}", r.name, w.name));
            }
            for symbol in &w.symbols {
                if !r.symbols.contains(symbol) {
                    return Err(format!("enum {} lacks writer symbol {}", r.name, symbol));
                }
            }
            Ok(())
        }

        (SchemaType::Array(r_items), SchemaType::Array(w_items)) => {
            can_read(r_items, w_items).map_err(|reason| format!("array items: {}", reason))
        }

        (SchemaType::Map(r_values), SchemaType::Map(w_values)) => {
            can_read(r_values, w_values).map_err(|reason| format!("map values: {}", reason))
        }

        (SchemaType::Fixed(r), SchemaType::Fixed(w)) => {
            if r.name != w.name {
                return Err(format!("fixed name mismatch: {} vs {}", r.name, w.name));
            }
            if r.size != w.size {
                return Err(format!(
                    "fixed {} size mismatch: {} vs {}",
                    r.name, r.size, w.size
                ));
            }
            Ok(())
        }

        (reader, writer) => {
            if promotable(writer, reader) {
                Ok(())
            } else {
                Err(format!(
                    "cannot read {} data as {}",
                    writer.kind(),
                    reader.kind()
                ))
            }
        }
    }
}

/// Fixed promotion table: identical primitives, numeric widening, and
/// string/bytes interchange.
fn promotable(writer: &SchemaType, reader: &SchemaType) -> bool {
    use SchemaType::{Bytes, Double, Float, Int, Long, String};

    if writer == reader {
        return matches!(
            writer,
            SchemaType::Null
                | SchemaType::Boolean
                | Int
                | Long
                | Float
                | Double
                | String
                | Bytes
        );
    }

    matches!(
        (writer, reader),
        (Int, Long)
            | (Int, Float)
            | (Int, Double)
            | (Long, Float)
            | (Long, Double)
            | (Float, Double)
            | (String, Bytes)
            | (Bytes, String)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn root(text: &str) -> SchemaType {
        Schema::parse(text).unwrap().root().clone()
    }

    #[test]
    fn identical_primitives_read() {
        assert!(can_read(&root("\"long\""), &root("\"long\"")).is_ok());
    }

    #[test]
    fn promotion_table() {
        assert!(can_read(&root("\"long\""), &root("\"int\"")).is_ok());
        assert!(can_read(&root("\"double\""), &root("\"float\"")).is_ok());
        assert!(can_read(&root("\"bytes\""), &root("\"string\"")).is_ok());
        assert!(can_read(&root("\"string\""), &root("\"bytes\"")).is_ok());
        // No narrowing.
        assert!(can_read(&root("\"int\""), &root("\"long\"")).is_err());
        assert!(can_read(&root("\"float\""), &root("\"double\"")).is_err());
        assert!(can_read(&root("\"boolean\""), &root("\"int\"")).is_err());
    }

    #[test]
    fn reader_union_accepts_member_writer() {
        let reader = root(r#"["null","string"]"#);
        assert!(can_read(&reader, &root("\"string\"")).is_ok());
        assert!(can_read(&reader, &root("\"int\"")).is_err());
    }

    #[test]
    fn writer_union_requires_all_branches_readable() {
        let reader = root("\"double\"");
        assert!(can_read(&reader, &root(r#"["int","float"]"#)).is_ok());
        assert!(can_read(&reader, &root(r#"["int","string"]"#)).is_err());
    }

    #[test]
    fn enum_writer_symbols_must_be_subset() {
        let reader = root(r#"{"type":"enum","name":"e","symbols":["A","B","C"]}"#);
        let subset = root(r#"{"type":"enum","name":"e","symbols":["A","C"]}"#);
        let superset = root(r#"{"type":"enum","name":"e","symbols":["A","B","C","D"]}"#);
        assert!(can_read(&reader, &subset).is_ok());
        assert!(can_read(&reader, &superset).is_err());
    }

    #[test]
    fn record_name_must_match() {
        let a = root(r#"{"type":"record","name":"a","fields":[]}"#);
        let b = root(r#"{"type":"record","name":"b","fields":[]}"#);
        assert!(can_read(&a, &b).is_err());
    }

    #[test]
    fn fixed_requires_same_size() {
        let r8 = root(r#"{"type":"fixed","name":"x","size":8}"#);
        let r16 = root(r#"{"type":"fixed","name":"x","size":16}"#);
        assert!(can_read(&r8, &r8.clone()).is_ok());
        assert!(can_read(&r8, &r16).is_err());
    }

    #[test]
    fn nested_field_mismatch_reports_path() {
        let reader = root(
            r#"{"type":"record","name":"r","fields":[
                {"name":"inner","type":{"type":"array","items":"int"}}
            ]}"#,
        );
        let writer = root(
            r#"{"type":"record","name":"r","fields":[
                {"name":"inner","type":{"type":"array","items":"string"}}
            ]}"#,
        );
        let reason = can_read(&reader, &writer).unwrap_err();
        assert!(reason.contains("inner"));
        assert!(reason.contains("array items"));
    }
}
