//! Document key sanitization for MongoDB compatibility.
//!
//! MongoDB restricts field names (keys) from containing certain characters like
//! dots and dollar signs, which are used in MongoDB query syntax. Only keys are
//! rewritten; values are stored untouched so that filters on them keep working.

use bson::Bson;


/// Sanitizes and restores document keys to handle MongoDB field name restrictions.
///
/// MongoDB does not allow field names (document keys) to contain:
/// - Dots (`.`) - used for nested field access in queries
/// - Dollar signs (`$`) - used for operators in queries
/// - Null bytes (`\0`) - field name terminators
pub(crate) struct KeySanitizer;

impl KeySanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Recursively rewrites the keys of every nested document.
    pub(crate) fn sanitize_value(value: &Bson) -> Bson {
        Self::map_keys(value, &Self::sanitize)
    }

    /// Inverse of [`KeySanitizer::sanitize_value`], for documents read back from MongoDB.
    pub(crate) fn restore_value(value: &Bson) -> Bson {
        Self::map_keys(value, &Self::restore)
    }

    pub(crate) fn sanitize(input: &str) -> String {
        let mut sanitized = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter() {
            sanitized = sanitized.replace(*target, *replacement);
        }
        sanitized
    }

    pub(crate) fn restore(input: &str) -> String {
        let mut restored = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter().rev() {
            restored = restored.replace(*replacement, *target);
        }
        restored
    }

    fn map_keys(value: &Bson, rename: &dyn Fn(&str) -> String) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(|item| Self::map_keys(item, rename))
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(
                doc.iter()
                    .map(|(k, v)| (rename(k), Self::map_keys(v, rename)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn rewrites_keys_but_not_values() {
        let value = Bson::Document(doc! { "a.b": "x.y", "list": [{ "$k": 1 }] });
        let sanitized = KeySanitizer::sanitize_value(&value);

        assert_eq!(
            sanitized,
            Bson::Document(doc! { "a__dot__b": "x.y", "list": [{ "__dollar__k": 1 }] }),
        );
        assert_eq!(KeySanitizer::restore_value(&sanitized), value);
    }
}
