//! Helpers for reading loosely-typed BSON returned by the server
//!
//! Server replies (explain output, profile entries, aggregation results)
//! use whichever numeric width fits, so lookups here accept any of them.

use bson::{Bson, Document};

/// Interpret a BSON value as an integer, whatever its numeric type
pub fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(f) if f.is_finite() => Some(f.round() as i64),
        _ => None,
    }
}

/// Read an integer field from a document
pub fn get_i64(doc: &Document, key: &str) -> Option<i64> {
    doc.get(key).and_then(as_i64)
}

/// Follow a dotted path (`Location.City`) through nested documents
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = doc.get(first)?;

    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Render a value for display, without quotes around plain strings
pub fn display(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_numeric_widths() {
        assert_eq!(as_i64(&Bson::Int32(7)), Some(7));
        assert_eq!(as_i64(&Bson::Int64(1 << 40)), Some(1 << 40));
        assert_eq!(as_i64(&Bson::Double(12.0)), Some(12));
        assert_eq!(as_i64(&Bson::String("12".into())), None);
        assert_eq!(as_i64(&Bson::Double(f64::NAN)), None);
    }

    #[test]
    fn test_dotted_path_lookup() {
        let user = doc! { "UserId": 3, "Location": { "City": "moscow", "Country": "Russia" } };

        assert_eq!(get_path(&user, "Location.City"), Some(&Bson::String("moscow".into())));
        assert_eq!(get_path(&user, "UserId"), Some(&Bson::Int32(3)));
        assert_eq!(get_path(&user, "Location.Street"), None);
        assert_eq!(get_path(&user, "UserId.City"), None);
    }

    #[test]
    fn test_display_strips_string_quotes() {
        assert_eq!(display(&Bson::String("moscow".into())), "moscow");
        assert_eq!(display(&Bson::Int32(18)), "18");
    }
}
