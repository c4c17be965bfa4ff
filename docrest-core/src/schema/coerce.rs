//! Conversion of parsed argument values into storage-ready values.
//!
//! Argument extraction already gives values their scalar shape. Coercion finishes the
//! job: it narrows numbers, parses serialized composite payloads that reached it as
//! text, recurses into lists and resolves references against the store.

use bson::{Bson, oid::ObjectId};
use std::{future::Future, pin::Pin};

use super::{Kind, NumberKind, StringKind};
use crate::{
    backend::StoreBackend,
    document::{DocumentId, IdKind, from_json},
    error::{ResourceError, ResourceResult},
    schema::DocumentRef,
    store::DocumentStore,
};

type CoerceFuture<'a> = Pin<Box<dyn Future<Output = ResourceResult<Bson>> + Send + 'a>>;

/// Coerces `value` for a field of `kind`.
///
/// Lists coerce element by element, in order, and fail on the first failing element.
/// A reference is looked up in its target collection: a missing target fails with
/// [`ResourceError::NotFound`] and a found one yields the stored identifier. The
/// reference lookup is the only store access.
///
/// # Errors
///
/// - [`ResourceError::Validation`] when the value has the wrong shape,
/// - [`ResourceError::MalformedInput`] when a serialized payload doesn't parse,
/// - [`ResourceError::NotFound`] when a reference target doesn't exist.
pub fn coerce<'a, B>(kind: &'a Kind, value: Bson, store: &'a DocumentStore<B>) -> CoerceFuture<'a>
where
    B: StoreBackend,
{
    Box::pin(async move {
        match kind {
            Kind::String(StringKind::Text) => match value {
                Bson::String(_) => Ok(value),
                Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Boolean(_) => {
                    Ok(Bson::String(display(&value)))
                }
                other => Err(mismatch("a string", &other)),
            },
            Kind::String(StringKind::ObjectId) => match value {
                Bson::ObjectId(_) => Ok(value),
                Bson::String(s) => ObjectId::parse_str(&s)
                    .map(Bson::ObjectId)
                    .map_err(|_| ResourceError::Validation(format!("'{s}' is not a valid object id"))),
                other => Err(mismatch("an object id", &other)),
            },
            Kind::Number(NumberKind::Integer) => match value {
                Bson::Int32(i) => Ok(Bson::Int64(i64::from(i))),
                Bson::Int64(_) => Ok(value),
                Bson::Double(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Bson::Int64(f as i64))
                }
                Bson::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Bson::Int64)
                    .map_err(|_| ResourceError::Validation(format!("'{s}' is not a valid integer"))),
                other => Err(mismatch("an integer", &other)),
            },
            Kind::Number(NumberKind::Float) => match value {
                Bson::Double(_) => Ok(value),
                Bson::Int32(i) => Ok(Bson::Double(f64::from(i))),
                Bson::Int64(i) => Ok(Bson::Double(i as f64)),
                Bson::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(Bson::Double)
                    .ok_or_else(|| ResourceError::Validation(format!("'{s}' is not a valid number"))),
                other => Err(mismatch("a number", &other)),
            },
            Kind::Boolean => match value {
                Bson::Boolean(_) => Ok(value),
                Bson::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => Ok(Bson::Boolean(true)),
                    "false" | "0" | "no" | "off" => Ok(Bson::Boolean(false)),
                    _ => Err(ResourceError::Validation(format!("'{s}' is not a valid boolean"))),
                },
                other => Err(mismatch("a boolean", &other)),
            },
            Kind::List(inner) => match value {
                Bson::Array(items) => {
                    let mut coerced = Vec::with_capacity(items.len());
                    for item in items {
                        coerced.push(coerce(inner, item, store).await?);
                    }
                    Ok(Bson::Array(coerced))
                }
                other => Err(mismatch("a list", &other)),
            },
            Kind::Reference(target) => resolve_reference(target, value, store).await,
            Kind::Composite => match parse_serialized(value)? {
                value @ Bson::Document(_) => Ok(value),
                other => Err(ResourceError::MalformedInput(format!(
                    "expected a JSON object, got {other}"
                ))),
            },
            Kind::Geometry => match parse_serialized(value)? {
                value @ (Bson::Document(_) | Bson::Array(_)) => Ok(value),
                other => Err(ResourceError::MalformedInput(format!(
                    "expected a GeoJSON object or coordinates, got {other}"
                ))),
            },
            Kind::Dynamic | Kind::Unsupported => Ok(value),
        }
    })
}

async fn resolve_reference<B>(
    target: &DocumentRef,
    value: Bson,
    store: &DocumentStore<B>,
) -> ResourceResult<Bson>
where
    B: StoreBackend,
{
    let id = match DocumentId::from_bson(&value) {
        Some(id) if id.kind() == target.id_kind => id,
        Some(DocumentId::String(raw)) => target
            .id_kind
            .parse(&raw)
            .map_err(ResourceError::Validation)?,
        Some(DocumentId::Integer(i)) if target.id_kind == IdKind::String => DocumentId::String(i.to_string()),
        _ => return Err(mismatch("an identifier", &value)),
    };

    let found = store
        .collection(&target.collection)
        .find_one(&id)
        .await?;

    match found {
        Some(_) => Ok(id.to_bson()),
        None => Err(ResourceError::NotFound(format!(
            "could not find {} with {}={}",
            target.collection, target.id_field, id
        ))),
    }
}

fn parse_serialized(value: Bson) -> ResourceResult<Bson> {
    match value {
        Bson::String(text) => {
            let parsed: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| ResourceError::MalformedInput(e.to_string()))?;
            from_json(&parsed).map_err(|e| ResourceError::MalformedInput(e.to_string()))
        }
        other => Ok(other),
    }
}

fn display(value: &Bson) -> String {
    match value {
        Bson::Int32(i) => i.to_string(),
        Bson::Int64(i) => i.to_string(),
        Bson::Double(f) => f.to_string(),
        Bson::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn mismatch(expected: &str, got: &Bson) -> ResourceError {
    ResourceError::Validation(format!("expected {expected}, got {got}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::DocumentStoreResult,
        query::{Expr, Query},
    };
    use async_trait::async_trait;
    use bson::doc;
    use std::{collections::HashMap, sync::Mutex};

    /// Minimal id-keyed backend; only `get_documents` is exercised by coercion.
    #[derive(Debug, Default)]
    struct Lookup {
        docs: Mutex<HashMap<(String, String), Bson>>,
    }

    impl Lookup {
        fn with(collection: &str, id: DocumentId) -> Self {
            let lookup = Self::default();
            lookup
                .docs
                .lock()
                .unwrap()
                .insert((collection.to_string(), id.to_string()), Bson::Document(doc! {}));
            lookup
        }
    }

    #[async_trait]
    impl StoreBackend for Lookup {
        async fn insert_documents(&self, _: Vec<(DocumentId, Bson)>, _: &str) -> DocumentStoreResult<()> {
            Ok(())
        }

        async fn update_documents(&self, _: Vec<(DocumentId, Bson)>, _: &str) -> DocumentStoreResult<()> {
            Ok(())
        }

        async fn delete_documents(&self, _: Vec<DocumentId>, _: &str) -> DocumentStoreResult<()> {
            Ok(())
        }

        async fn get_documents(&self, ids: Vec<DocumentId>, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
            let docs = self.docs.lock().unwrap();
            Ok(ids
                .iter()
                .filter_map(|id| docs.get(&(collection.to_string(), id.to_string())).cloned())
                .collect())
        }

        async fn query_documents(&self, _: Query, _: &str) -> DocumentStoreResult<Vec<Bson>> {
            Ok(Vec::new())
        }

        async fn count_documents(&self, _: Option<Expr>, _: &str) -> DocumentStoreResult<usize> {
            Ok(0)
        }
    }

    fn store(backend: Lookup) -> DocumentStore<Lookup> {
        DocumentStore::new(backend)
    }

    #[tokio::test]
    async fn lists_coerce_in_order() {
        let store = store(Lookup::default());
        let kind = Kind::List(Box::new(Kind::Number(NumberKind::Integer)));
        let raw = Bson::Array(vec!["1".into(), "2".into(), "3".into()]);

        let coerced = coerce(&kind, raw, &store).await.unwrap();

        assert_eq!(coerced, Bson::Array(vec![Bson::Int64(1), Bson::Int64(2), Bson::Int64(3)]));
    }

    #[tokio::test]
    async fn first_bad_element_fails_the_list() {
        let store = store(Lookup::default());
        let kind = Kind::List(Box::new(Kind::Number(NumberKind::Integer)));
        let raw = Bson::Array(vec!["1".into(), "x".into(), "3".into()]);

        assert!(matches!(
            coerce(&kind, raw, &store).await,
            Err(ResourceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn references_resolve_against_the_store() {
        let oid = ObjectId::new();
        let store = store(Lookup::with("users", DocumentId::ObjectId(oid)));
        let kind = Kind::Reference(DocumentRef::new("users", "id", IdKind::ObjectId));

        let resolved = coerce(&kind, Bson::String(oid.to_hex()), &store).await.unwrap();
        assert_eq!(resolved, Bson::ObjectId(oid));

        let missing = coerce(&kind, Bson::ObjectId(ObjectId::new()), &store).await;
        assert!(matches!(missing, Err(ResourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn reference_lists_resolve_every_element() {
        let store = store(Lookup::with("users", DocumentId::from("alice")));
        let kind = Kind::List(Box::new(Kind::Reference(DocumentRef::new("users", "username", IdKind::String))));

        let ok = coerce(&kind, Bson::Array(vec!["alice".into()]), &store).await;
        assert_eq!(ok.unwrap(), Bson::Array(vec!["alice".into()]));

        let missing = coerce(&kind, Bson::Array(vec!["alice".into(), "bob".into()]), &store).await;
        match missing {
            Err(ResourceError::NotFound(msg)) => assert_eq!(msg, "could not find users with username=bob"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn serialized_composites_are_parsed() {
        let store = store(Lookup::default());

        let parsed = coerce(&Kind::Composite, Bson::String(r#"{"k": "v"}"#.into()), &store).await;
        assert_eq!(parsed.unwrap(), Bson::Document(doc! { "k": "v" }));

        let broken = coerce(&Kind::Composite, Bson::String("{k".into()), &store).await;
        assert!(matches!(broken, Err(ResourceError::MalformedInput(_))));

        let coords = coerce(&Kind::Geometry, Bson::String("[1.0, 2.0]".into()), &store).await;
        assert!(matches!(coords, Ok(Bson::Array(_))));
    }

    #[tokio::test]
    async fn scalars_narrow() {
        let store = store(Lookup::default());
        let int = Kind::Number(NumberKind::Integer);

        assert_eq!(coerce(&int, Bson::Int32(7), &store).await.unwrap(), Bson::Int64(7));
        assert_eq!(coerce(&int, Bson::String("42".into()), &store).await.unwrap(), Bson::Int64(42));
        assert!(coerce(&int, Bson::Double(1.5), &store).await.is_err());
        assert_eq!(
            coerce(&Kind::Boolean, Bson::String("no".into()), &store).await.unwrap(),
            Bson::Boolean(false)
        );
    }

    #[tokio::test]
    async fn non_finite_numbers_are_rejected() {
        let store = store(Lookup::default());
        let float = Kind::Number(NumberKind::Float);

        assert_eq!(coerce(&float, Bson::String(" 2.5 ".into()), &store).await.unwrap(), Bson::Double(2.5));
        for text in ["NaN", "inf", "-infinity"] {
            let result = coerce(&float, Bson::String(text.into()), &store).await;
            assert!(matches!(result, Err(ResourceError::Validation(_))), "{text}");
        }
    }
}
