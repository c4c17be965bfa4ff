//! The closed field kind taxonomy.

use super::{DocumentRef, FieldDescriptor, FieldType};

/// Shape of a string-kind field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    Text,
    ObjectId,
}

/// Shape of a number-kind field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Integer,
    Float,
}

/// Classification of a field, driving argument synthesis, filter expansion and
/// coercion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    String(StringKind),
    Number(NumberKind),
    Boolean,
    /// A list whose elements have the inner kind.
    List(Box<Kind>),
    /// A reference to a document of another collection.
    Reference(DocumentRef),
    /// Maps and embedded documents.
    Composite,
    /// GeoJSON shapes.
    Geometry,
    /// Untyped values, passed through as given.
    Dynamic,
    /// Fields no parser is generated for.
    Unsupported,
}

impl Kind {
    pub fn is_supported(&self) -> bool {
        !matches!(self, Kind::Unsupported)
    }
}

/// Classifies a field descriptor.
///
/// Geometry types are recognised first and anything outside the known vocabulary
/// ends up [`Kind::Unsupported`]. A list whose element is missing or unsupported is a
/// list of [`Kind::Dynamic`] values, and a reference without a target is unsupported.
pub fn classify(field: &FieldDescriptor) -> Kind {
    use FieldType::*;

    match field.field_type {
        Point | LineString | Polygon | MultiPoint | MultiLineString | MultiPolygon | GeoJson => {
            Kind::Geometry
        }
        String | Email | Url => Kind::String(StringKind::Text),
        ObjectId => Kind::String(StringKind::ObjectId),
        Int | Long => Kind::Number(NumberKind::Integer),
        Float | Decimal => Kind::Number(NumberKind::Float),
        Boolean => Kind::Boolean,
        List | SortedList => {
            let element = field
                .nested
                .as_deref()
                .map(classify)
                .filter(Kind::is_supported)
                .unwrap_or(Kind::Dynamic);
            Kind::List(Box::new(element))
        }
        Dict | Map | EmbeddedDocument => Kind::Composite,
        Reference => match &field.target {
            Some(target) => Kind::Reference(target.clone()),
            None => Kind::Unsupported,
        },
        Dynamic => Kind::Dynamic,
        DateTime | Date | Binary | File | Image | Sequence | Uuid => Kind::Unsupported,
    }
}
