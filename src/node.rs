//! In-memory tree model of one encodable document
//!
//! [`Node`] is the shared vocabulary between the encoder, the decoder, and
//! the byte codec: a closed tagged union able to represent every encodable
//! shape. Leaves carry primitive payloads; [`Node::Pair`] represents exactly
//! one encoded field; the three container cases carry ordered children.
//!
//! Within a [`Node::Record`] or [`Node::Identified`], item order is encoding
//! order. Duplicate keys are legal; keyed lookup resolves them to the
//! most-recently-appended occurrence (see [`Decoder`](crate::decode::Decoder)).

use crate::uri::Uri;

/// Instant in time as double-precision seconds since the Unix epoch.
///
/// Sub-second precision is whatever `f64` affords at the magnitude in
/// question; the wire representation is the raw eight-byte float.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Timestamp(f64);

impl Timestamp {
    #[inline]
    pub const fn from_seconds(secs: f64) -> Self {
        Self(secs)
    }

    #[inline]
    pub const fn seconds(self) -> f64 {
        self.0
    }
}

impl From<f64> for Timestamp {
    fn from(secs: f64) -> Self {
        Self(secs)
    }
}

impl From<Timestamp> for f64 {
    fn from(ts: Timestamp) -> f64 {
        ts.0
    }
}

/// One node of an encodable document tree.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    /// UTF-8 string leaf.
    Str(String),
    /// 32-bit signed integer leaf.
    Int32(i32),
    /// 64-bit signed integer leaf.
    Int64(i64),
    /// Double-precision float leaf.
    Double(f64),
    /// Single-precision float leaf.
    Float(f32),
    /// Boolean leaf.
    Bool(bool),
    /// Timestamp leaf.
    Timestamp(Timestamp),
    /// Validated URI leaf.
    Uri(Uri),
    /// Exactly one encoded field; the key is a [`Node::Str`] leaf in
    /// practice, though the model does not restrict it.
    Pair(Box<Node>, Box<Node>),
    /// Ordered, possibly heterogeneous sequence. Also the serialized shape
    /// of dictionaries, as a sequence of [`Node::Pair`].
    Array(Vec<Node>),
    /// Ordered field set for a type known at decode time.
    Record(Vec<Node>),
    /// A record additionally tagged with a runtime type identifier, for
    /// reconstruction through the type registry.
    Identified(String, Vec<Node>),
}

impl Node {
    /// Builds a `Pair` with a string key.
    pub fn pair(key: impl Into<String>, value: Node) -> Node {
        Node::Pair(Box::new(Node::Str(key.into())), Box::new(value))
    }

    /// The string content of a `Str` leaf, if that is what this node is.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Discriminant of this node, for diagnostics.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Str(_) => NodeKind::Str,
            Node::Int32(_) => NodeKind::Int32,
            Node::Int64(_) => NodeKind::Int64,
            Node::Double(_) => NodeKind::Double,
            Node::Float(_) => NodeKind::Float,
            Node::Bool(_) => NodeKind::Bool,
            Node::Timestamp(_) => NodeKind::Timestamp,
            Node::Uri(_) => NodeKind::Uri,
            Node::Pair(_, _) => NodeKind::Pair,
            Node::Array(_) => NodeKind::Array,
            Node::Record(_) => NodeKind::Record,
            Node::Identified(_, _) => NodeKind::Identified,
        }
    }
}

macro_rules! node_from {
    ( $( $t:ty => $variant:ident ),+ $(,)? ) => {
        $( impl From<$t> for Node {
            #[inline]
            fn from(val: $t) -> Node {
                Node::$variant(val.into())
            }
        } )+
    };
}

node_from! {
    String => Str,
    &str => Str,
    i32 => Int32,
    i64 => Int64,
    f64 => Double,
    f32 => Float,
    bool => Bool,
    Timestamp => Timestamp,
    Uri => Uri,
}

/// Discriminant-only view of a [`Node`], used in error payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Str,
    Int32,
    Int64,
    Double,
    Float,
    Bool,
    Timestamp,
    Uri,
    Pair,
    Array,
    Record,
    Identified,
}

impl NodeKind {
    /// Stable lower-case name, as it appears in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            NodeKind::Str => "string",
            NodeKind::Int32 => "int32",
            NodeKind::Int64 => "int64",
            NodeKind::Double => "double",
            NodeKind::Float => "float",
            NodeKind::Bool => "bool",
            NodeKind::Timestamp => "timestamp",
            NodeKind::Uri => "uri",
            NodeKind::Pair => "pair",
            NodeKind::Array => "array",
            NodeKind::Record => "record",
            NodeKind::Identified => "identified record",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_builder_wraps_key_as_string_leaf() {
        let node = Node::pair("count", Node::Int32(3));
        match node {
            Node::Pair(key, value) => {
                assert_eq!(key.as_str(), Some("count"));
                assert_eq!(*value, Node::Int32(3));
            }
            other => panic!("expected pair, got {:?}", other.kind()),
        }
    }

    #[test]
    fn kind_names_are_distinct() {
        let kinds = [
            NodeKind::Str,
            NodeKind::Int32,
            NodeKind::Int64,
            NodeKind::Double,
            NodeKind::Float,
            NodeKind::Bool,
            NodeKind::Timestamp,
            NodeKind::Uri,
            NodeKind::Pair,
            NodeKind::Array,
            NodeKind::Record,
            NodeKind::Identified,
        ];
        let names: std::collections::HashSet<&str> =
            kinds.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), kinds.len());
    }
}
