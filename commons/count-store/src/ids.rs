use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a logical graph (keyspace).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GraphId(String);

/// Identifier of a schema type whose instances are counted.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TypeId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(GraphId);
string_id!(TypeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    Instances,
    Shards,
}

impl CounterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterKind::Instances => "instances",
            CounterKind::Shards => "shards",
        }
    }
}

/// Escapes a path segment so that `/` can be used as an unambiguous
/// separator in derived keys and lock names.
pub fn escape_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            _ => out.push(c),
        }
    }
    out
}

/// Fully rendered key of one counter in the shared store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    kind: CounterKind,
    rendered: String,
}

impl CounterKey {
    pub fn new(kind: CounterKind, graph: &GraphId, type_id: &TypeId) -> Self {
        let rendered = format!(
            "counts/{}/{}/{}",
            kind.as_str(),
            escape_segment(graph.as_str()),
            escape_segment(type_id.as_str())
        );
        Self { kind, rendered }
    }

    pub fn instances(graph: &GraphId, type_id: &TypeId) -> Self {
        Self::new(CounterKind::Instances, graph, type_id)
    }

    pub fn shards(graph: &GraphId, type_id: &TypeId) -> Self {
        Self::new(CounterKind::Shards, graph, type_id)
    }

    pub fn kind(&self) -> CounterKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout_is_stable() {
        let key = CounterKey::instances(&"kb".into(), &"person".into());
        assert_eq!(key.as_str(), "counts/instances/kb/person");
        let key = CounterKey::shards(&"kb".into(), &"person".into());
        assert_eq!(key.as_str(), "counts/shards/kb/person");
    }

    #[test]
    fn separators_inside_ids_do_not_collide() {
        let a = CounterKey::instances(&"a/b".into(), &"c".into());
        let b = CounterKey::instances(&"a".into(), &"b/c".into());
        assert_ne!(a, b);

        // an id that already looks escaped must stay distinct as well
        let c = CounterKey::instances(&"a%2Fb".into(), &"c".into());
        assert_ne!(a, c);
    }

    #[test]
    fn kinds_never_share_a_key() {
        let graph = GraphId::new("kb");
        let ty = TypeId::new("person");
        assert_ne!(
            CounterKey::instances(&graph, &ty),
            CounterKey::shards(&graph, &ty)
        );
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let ty: TypeId = serde_json::from_str("\"V123\"").unwrap();
        assert_eq!(ty.as_str(), "V123");
        assert_eq!(serde_json::to_string(&ty).unwrap(), "\"V123\"");
    }
}
