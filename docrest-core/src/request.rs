//! The transport boundary: verbs, raw request arguments and responses.
//!
//! Routing and body decoding belong to the host. A host hands each request to a
//! resource as a [`Verb`] plus [`RequestArgs`] and writes the returned [`Response`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

/// Request verbs a resource behavior can answer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "DELETE" => Ok(Verb::Delete),
            _ => Err(format!("unknown verb '{s}'")),
        }
    }
}

/// Raw argument values of one request.
///
/// Values come from the decoded JSON body (an object) and from the query string,
/// where keys may repeat.
///
/// # Example
///
/// ```ignore
/// use docrest::request::RequestArgs;
/// use serde_json::json;
///
/// let args = RequestArgs::new()
///     .with_body(json!({ "username": "alice" }))
///     .with_query("tags", "a")
///     .with_query("tags", "b");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestArgs {
    pub body: Map<String, Value>,
    pub query: Vec<(String, String)>,
}

impl RequestArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body. Anything other than a JSON object is treated as an empty body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }

    /// Appends one query string pair.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Body member `name`, if present.
    pub fn body_value(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// All query string values for `name`, in request order.
    pub fn query_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.query
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether `name` was supplied with a non-null value in either location.
    pub fn contains(&self, name: &str) -> bool {
        self.body_value(name)
            .is_some_and(|value| !value.is_null())
            || self.query_values(name).next().is_some()
    }
}

/// A resource response: a status code and a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn verbs_parse_case_insensitively() {
        assert_eq!("patch".parse::<Verb>(), Ok(Verb::Patch));
        assert_eq!(Verb::Delete.to_string(), "DELETE");
        assert!("TRACE".parse::<Verb>().is_err());
    }

    #[test]
    fn repeated_query_keys_keep_order() {
        let args = RequestArgs::new()
            .with_query("tag", "b")
            .with_query("other", "x")
            .with_query("tag", "a");

        assert_eq!(args.query_values("tag").collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn null_body_members_are_absent() {
        let args = RequestArgs::new().with_body(json!({ "a": null, "b": 1 }));

        assert!(!args.contains("a"));
        assert!(args.contains("b"));
        assert!(!args.contains("c"));
    }
}
