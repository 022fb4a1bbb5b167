//! Capability traits bridging application types to the tree model
//!
//! These traits are the keystone of the typed API. Rather than inspecting
//! values at runtime to discover how they serialize, every encodable type
//! declares its capability at compile time by implementing exactly one of:
//!
//! * [`CerealRepresentable`]: primitive leaf values, converted to and from
//!   a single [`Node`] leaf.
//! * [`CerealType`]: fixed-schema record values, encoded field-by-field
//!   through a nested [`Encoder`] and reconstructed through a nested
//!   [`Decoder`]. The concrete type is known at the decode call site.
//! * [`IdentifiedCerealType`]: record values whose concrete type is *not*
//!   known at the decode site; the type contributes a string identifier that
//!   travels on the wire and is resolved through the
//!   [registry](crate::registry) at decode time.
//!
//! Every type implementing [`CerealType`] must encode the same ordered set
//! of keys on every instance. Keyed lookup relies on that fixed schema when
//! it switches to its indexed strategy (see
//! [`Decoder::lookup`](crate::decode::Decoder::lookup)).
//!
//! An additional submodule, [`target`], defines the write-side byte-sink
//! abstraction used by the codec.

pub mod target;

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::{CerealError, CerealResult};
use crate::node::{Node, Timestamp};
use crate::uri::Uri;

/// Leaf-primitive capability: a value representable as a single [`Node`]
/// leaf.
///
/// Decoding is strict: a leaf of any other kind, even a numerically
/// convertible one, is an
/// [`InvalidEncoding`](crate::error::CerealError::InvalidEncoding) error.
pub trait CerealRepresentable: Sized {
    /// Converts the value into its leaf node.
    fn into_node(self) -> Node;

    /// Reconstructs the value from a leaf node of the matching kind.
    fn from_node(node: &Node) -> CerealResult<Self>;
}

/// Builds the standard leaf-mismatch error.
pub(crate) fn mismatch(expected: &'static str, actual: &Node) -> CerealError {
    CerealError::InvalidEncoding {
        expected,
        actual: actual.kind().name(),
    }
}

impl CerealRepresentable for String {
    fn into_node(self) -> Node {
        Node::Str(self)
    }

    fn from_node(node: &Node) -> CerealResult<Self> {
        match node {
            Node::Str(s) => Ok(s.clone()),
            other => Err(mismatch("string", other)),
        }
    }
}

impl CerealRepresentable for Uri {
    fn into_node(self) -> Node {
        Node::Uri(self)
    }

    fn from_node(node: &Node) -> CerealResult<Self> {
        match node {
            Node::Uri(u) => Ok(u.clone()),
            other => Err(mismatch("uri", other)),
        }
    }
}

macro_rules! impl_representable {
    ( $( $t:ty => $variant:ident, $name:literal ),+ $(,)? ) => {
        $( impl CerealRepresentable for $t {
            #[inline]
            fn into_node(self) -> Node {
                Node::$variant(self)
            }

            fn from_node(node: &Node) -> CerealResult<Self> {
                match node {
                    Node::$variant(v) => Ok(*v),
                    other => Err(mismatch($name, other)),
                }
            }
        } )+
    };
}

impl_representable! {
    i32 => Int32, "int32",
    i64 => Int64, "int64",
    f64 => Double, "double",
    f32 => Float, "float",
    bool => Bool, "bool",
    Timestamp => Timestamp, "timestamp",
}

/// Fixed-schema record capability.
///
/// `encode` writes the value's fields into the supplied encoder; `decode`
/// rebuilds the value from a decoder positioned over a record's items. Both
/// directions must agree on the key set, and the key set must be identical
/// across all instances of the implementing type.
pub trait CerealType: Sized {
    /// Encodes the fields of `self` into `enc`.
    fn encode(&self, enc: &mut Encoder) -> CerealResult<()>;

    /// Reconstructs a value from the fields reachable through `dec`.
    fn decode(dec: &Decoder<'_>) -> CerealResult<Self>;
}

/// Polymorphic record capability.
///
/// The identifier travels on the wire with every encoded instance, and is
/// the registry key under which the type's reconstruction factory is found.
/// It is supplied by the type, never by a call site.
pub trait IdentifiedCerealType: CerealType {
    /// Globally unique identifier for this concrete type.
    const IDENTIFIER: &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_roundtrip() {
        assert_eq!(i32::from_node(&42i32.into_node()).unwrap(), 42);
        assert_eq!(
            String::from_node(&"krispies".to_owned().into_node()).unwrap(),
            "krispies"
        );
        assert_eq!(bool::from_node(&true.into_node()).unwrap(), true);
        let ts = Timestamp::from_seconds(12.5);
        assert_eq!(Timestamp::from_node(&ts.into_node()).unwrap(), ts);
    }

    #[test]
    fn cross_kind_decode_is_rejected() {
        let node = Node::Int64(1);
        assert_eq!(
            i32::from_node(&node),
            Err(CerealError::InvalidEncoding {
                expected: "int32",
                actual: "int64"
            })
        );
        assert_eq!(
            String::from_node(&Node::Bool(false)),
            Err(CerealError::InvalidEncoding {
                expected: "string",
                actual: "bool"
            })
        );
    }
}
