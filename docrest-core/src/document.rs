//! Document identifiers and format conversion helpers.
//!
//! Documents travel through the store as BSON values. Each document carries an
//! identifier whose shape is fixed per collection by its [`IdKind`]; the identifier
//! itself is represented by [`DocumentId`].

use bson::{Bson, Uuid, oid::ObjectId, ser::serialize_to_bson};
use serde_json::{Value, to_value};
use std::fmt;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// The identifier type a collection uses for its documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// 12 byte MongoDB object id, written as 24 hex characters.
    ObjectId,
    /// RFC 4122 UUID.
    Uuid,
    /// Signed 64 bit integer (numeric strings are accepted on input).
    Integer,
    /// Any string.
    String,
}

impl IdKind {
    /// Parses a raw textual identifier into the shape this kind requires.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when the text does not have the right shape.
    pub fn parse(&self, raw: &str) -> Result<DocumentId, String> {
        match self {
            IdKind::ObjectId => ObjectId::parse_str(raw)
                .map(DocumentId::ObjectId)
                .map_err(|_| format!("'{raw}' is not a valid object id")),
            IdKind::Uuid => Uuid::parse_str(raw)
                .map(DocumentId::Uuid)
                .map_err(|_| format!("'{raw}' is not a valid uuid")),
            IdKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(DocumentId::Integer)
                .map_err(|_| format!("'{raw}' is not a valid integer id")),
            IdKind::String => Ok(DocumentId::String(raw.to_string())),
        }
    }

    /// Parses a raw JSON value into an identifier of this kind.
    ///
    /// Strings go through [`IdKind::parse`]; integer ids also accept JSON integers and
    /// object ids also accept the extended JSON form `{"$oid": "..."}`.
    pub fn parse_value(&self, raw: &Value) -> Result<DocumentId, String> {
        match (self, raw) {
            (_, Value::String(s)) => self.parse(s),
            (IdKind::Integer, Value::Number(n)) => n
                .as_i64()
                .map(DocumentId::Integer)
                .ok_or_else(|| format!("{n} is not a valid integer id")),
            (IdKind::String, Value::Number(n)) => Ok(DocumentId::String(n.to_string())),
            (IdKind::ObjectId, Value::Object(map)) => match map.get("$oid") {
                Some(Value::String(s)) => self.parse(s),
                _ => Err(format!("{raw} is not a valid object id")),
            },
            _ => Err(format!("{raw} is not a valid identifier")),
        }
    }

    /// Generates a fresh identifier, for the kinds that can be generated locally.
    pub fn generate(&self) -> Option<DocumentId> {
        match self {
            IdKind::ObjectId => Some(DocumentId::ObjectId(ObjectId::new())),
            IdKind::Uuid => Some(DocumentId::Uuid(Uuid::new())),
            IdKind::Integer | IdKind::String => None,
        }
    }
}

/// A document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentId {
    ObjectId(ObjectId),
    Uuid(Uuid),
    Integer(i64),
    String(String),
}

impl DocumentId {
    /// Returns the kind of this identifier.
    pub fn kind(&self) -> IdKind {
        match self {
            DocumentId::ObjectId(_) => IdKind::ObjectId,
            DocumentId::Uuid(_) => IdKind::Uuid,
            DocumentId::Integer(_) => IdKind::Integer,
            DocumentId::String(_) => IdKind::String,
        }
    }

    /// Reads an identifier back from a stored BSON value.
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::ObjectId(oid) => Some(DocumentId::ObjectId(*oid)),
            Bson::Int32(i) => Some(DocumentId::Integer(i64::from(*i))),
            Bson::Int64(i) => Some(DocumentId::Integer(*i)),
            Bson::String(s) => Some(DocumentId::String(s.clone())),
            Bson::Binary(binary) => binary.to_uuid().ok().map(DocumentId::Uuid),
            _ => None,
        }
    }

    /// Converts this identifier into its stored BSON form.
    pub fn to_bson(&self) -> Bson {
        self.clone().into()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::ObjectId(oid) => write!(f, "{}", oid.to_hex()),
            DocumentId::Uuid(uuid) => write!(f, "{uuid}"),
            DocumentId::Integer(i) => write!(f, "{i}"),
            DocumentId::String(s) => f.write_str(s),
        }
    }
}

impl From<DocumentId> for Bson {
    fn from(id: DocumentId) -> Self {
        match id {
            DocumentId::ObjectId(oid) => Bson::ObjectId(oid),
            DocumentId::Uuid(uuid) => Bson::from(uuid),
            DocumentId::Integer(i) => Bson::Int64(i),
            DocumentId::String(s) => Bson::String(s),
        }
    }
}

impl From<ObjectId> for DocumentId {
    fn from(oid: ObjectId) -> Self {
        DocumentId::ObjectId(oid)
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        DocumentId::Uuid(uuid)
    }
}

impl From<i64> for DocumentId {
    fn from(i: i64) -> Self {
        DocumentId::Integer(i)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        DocumentId::String(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        DocumentId::String(s.to_string())
    }
}

/// Converts a stored BSON value to JSON for the response body.
///
/// Object ids and binary values use the extended JSON form (`{"$oid": "..."}`).
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(value: &Bson) -> DocumentStoreResult<Value> {
    Ok(to_value(value)?)
}

/// Converts a JSON value into BSON for storage.
///
/// # Errors
///
/// Returns an error if the value cannot be represented in BSON.
pub fn from_json(value: &Value) -> DocumentStoreResult<Bson> {
    serialize_to_bson(value).map_err(DocumentStoreError::from)
}
