//! Declarative document schemas and the machinery generated from them.
//!
//! A [`Schema`] lists the typed fields of one collection. From it this module derives:
//!
//! - the field [`Kind`] taxonomy ([`kind`]),
//! - request argument specifications ([`argument`]),
//! - suffixed filter specifications ([`filter`]),
//! - storage coercion, including reference resolution ([`coerce`]),
//! - the immutable per-resource parsers ([`parser`]).
//!
//! # Example
//!
//! ```ignore
//! use docrest::schema::{Schema, FieldDescriptor, DocumentRef};
//! use docrest::document::IdKind;
//!
//! let users = Schema::builder("users")
//!     .id("username", IdKind::String)
//!     .field(FieldDescriptor::string("username"))
//!     .field(FieldDescriptor::email("email"))
//!     .field(FieldDescriptor::int("age"))
//!     .build();
//!
//! let posts = Schema::builder("posts")
//!     .field(FieldDescriptor::reference("author", users.to_ref()).required())
//!     .field(FieldDescriptor::list("tags", FieldDescriptor::string("tag")))
//!     .build();
//! ```

pub mod argument;
pub mod coerce;
pub mod filter;
pub mod kind;
pub mod parser;

use bson::Bson;

use crate::document::IdKind;

pub use kind::{Kind, NumberKind, StringKind, classify};

/// The declared type of a schema field.
///
/// This is the schema vocabulary; [`classify`] maps it onto the smaller [`Kind`]
/// taxonomy the rest of the engine works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Email,
    Url,
    Int,
    Long,
    Float,
    Decimal,
    Boolean,
    ObjectId,
    Uuid,
    List,
    SortedList,
    Dict,
    Map,
    EmbeddedDocument,
    Reference,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeoJson,
    Dynamic,
    DateTime,
    Date,
    Binary,
    File,
    Image,
    Sequence,
}

/// Where a reference field points: the target collection and its identifier shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub collection: String,
    pub id_field: String,
    pub id_kind: IdKind,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id_field: impl Into<String>, id_kind: IdKind) -> Self {
        Self {
            collection: collection.into(),
            id_field: id_field.into(),
            id_kind,
        }
    }

    /// Reference to the collection described by `D`.
    pub fn to<D: DocumentType>() -> Self {
        D::schema().to_ref()
    }
}

/// Schema-level description of one record attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name, as stored and as used for request arguments.
    pub name: String,
    /// Declared type.
    pub field_type: FieldType,
    /// Element descriptor of list fields.
    pub nested: Option<Box<FieldDescriptor>>,
    /// Target of reference fields.
    pub target: Option<DocumentRef>,
    /// Whether a value must be supplied on create.
    pub required: bool,
    /// Value used on create when the request doesn't supply one.
    pub default: Option<Bson>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nested: None,
            target: None,
            required: false,
            default: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Email)
    }

    pub fn url(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Url)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    pub fn long(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Long)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn object_id(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::ObjectId)
    }

    pub fn dict(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Dict)
    }

    pub fn point(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Point)
    }

    pub fn dynamic(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Dynamic)
    }

    /// A list whose elements are described by `element` (the element's name is ignored).
    pub fn list(name: impl Into<String>, element: FieldDescriptor) -> Self {
        Self {
            nested: Some(Box::new(element)),
            ..Self::new(name, FieldType::List)
        }
    }

    /// A list of untyped values.
    pub fn untyped_list(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::List)
    }

    pub fn reference(name: impl Into<String>, target: DocumentRef) -> Self {
        Self {
            target: Some(target),
            ..Self::new(name, FieldType::Reference)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Bson>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Classifies this field, see [`classify`].
    pub fn kind(&self) -> Kind {
        classify(self)
    }
}

/// The typed description of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub collection: String,
    pub id_field: String,
    pub id_kind: IdKind,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Starts a schema for `collection`, identified by an `id` object id unless
    /// [`SchemaBuilder::id`] says otherwise.
    pub fn builder(collection: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(collection)
    }

    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|field| field.name == name)
    }

    /// Reference to this collection, for use as a reference field target.
    pub fn to_ref(&self) -> DocumentRef {
        DocumentRef::new(self.collection.clone(), self.id_field.clone(), self.id_kind)
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    collection: String,
    id_field: String,
    id_kind: IdKind,
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id_field: "id".to_string(),
            id_kind: IdKind::ObjectId,
            fields: Vec::new(),
        }
    }

    /// Sets the identifier field and its shape.
    pub fn id(mut self, field: impl Into<String>, kind: IdKind) -> Self {
        self.id_field = field.into();
        self.id_kind = kind;
        self
    }

    /// Appends a field. A later field with the same name replaces the earlier one.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            collection: self.collection,
            id_field: self.id_field,
            id_kind: self.id_kind,
            fields: self.fields,
        }
    }
}

/// Types that describe the schema of the documents they map to.
///
/// # Example
///
/// ```ignore
/// struct User;
///
/// impl DocumentType for User {
///     fn schema() -> Schema {
///         Schema::builder("users")
///             .id("username", IdKind::String)
///             .field(FieldDescriptor::string("username"))
///             .build()
///     }
/// }
/// ```
pub trait DocumentType {
    fn schema() -> Schema;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User;

    impl DocumentType for User {
        fn schema() -> Schema {
            Schema::builder("users")
                .id("username", IdKind::String)
                .field(FieldDescriptor::string("username"))
                .field(FieldDescriptor::int("age"))
                .build()
        }
    }

    #[test]
    fn defaults_to_object_id_identifier() {
        let schema = Schema::builder("things").build();

        assert_eq!(schema.id_field, "id");
        assert_eq!(schema.id_kind, IdKind::ObjectId);
    }

    #[test]
    fn redeclared_field_replaces_in_place() {
        let schema = Schema::builder("things")
            .field(FieldDescriptor::string("a"))
            .field(FieldDescriptor::string("b"))
            .field(FieldDescriptor::int("a"))
            .build();

        let names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(schema.field("a").map(|f| f.field_type), Some(FieldType::Int));
    }

    #[test]
    fn document_ref_comes_from_document_type() {
        assert_eq!(
            DocumentRef::to::<User>(),
            DocumentRef::new("users", "username", IdKind::String)
        );
    }
}
