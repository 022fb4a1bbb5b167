//! Keyed reconstruction of typed values from parsed documents
//!
//! A [`Decoder`] wraps the item list of a parsed record and exposes keyed
//! lookup plus typed `decode_*` accessors. Absence of a key is not an error
//! anywhere in this module: every accessor returns `Ok(None)` for a missing
//! key, reserving errors for malformed bytes, shape mismatches, and
//! unregistered identifiers.
//!
//! # Lookup strategies
//!
//! Duplicate keys within a record resolve to the most-recently-encoded
//! occurrence. Two interchangeable strategies implement that contract:
//!
//! * **Linear**: scan the items from last to first, returning the first
//!   pair whose key matches. Used whenever the item count is at most
//!   [`LINEAR_SCAN_MAX`], and whenever no concrete type is associated with
//!   the decoder.
//! * **Indexed**: above the threshold, consult the process-wide
//!   [shape cache](crate::shape) keyed by the concrete type being decoded,
//!   which maps each key to the last index at which it occurs. The memo is
//!   verified against the actual item and the scan is the fallback on any
//!   disagreement, so a cache populated under a violated fixed-schema
//!   contract degrades to the linear result instead of a wrong one.

use std::any::{type_name, Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;

use crate::conv::{CerealRepresentable, CerealType};
use crate::error::{CerealError, CerealResult};
use crate::node::Node;
use crate::registry;
use crate::shape;
use crate::wire;

/// Largest item count for which keyed lookup always scans linearly.
pub const LINEAR_SCAN_MAX: usize = 100;

/// Read-side view over one record's items.
///
/// The decoder created by [`Decoder::from_bytes`] owns the parsed items;
/// decoders created for nested records borrow from their parent.
#[derive(Debug)]
pub struct Decoder<'a> {
    items: Cow<'a, [Node]>,
    shape: Option<TypeId>,
}

impl Decoder<'static> {
    /// Parses `bytes` and positions a decoder over the root record's items.
    ///
    /// The root node must be a record or identified record; any other shape
    /// fails with [`RootItemNotFound`](CerealError::RootItemNotFound).
    pub fn from_bytes(bytes: &[u8]) -> CerealResult<Self> {
        let root = wire::node_from_bytes(bytes)?;
        match root {
            Node::Record(items) | Node::Identified(_, items) => Ok(Decoder {
                items: Cow::Owned(items),
                shape: None,
            }),
            other => Err(CerealError::RootItemNotFound {
                expected: "record",
                actual: other.kind().name(),
            }),
        }
    }
}

impl<'a> Decoder<'a> {
    /// Positions a decoder over a borrowed item list, as when descending
    /// into a nested record.
    pub(crate) fn over(items: &'a [Node]) -> Decoder<'a> {
        Decoder {
            items: Cow::Borrowed(items),
            shape: None,
        }
    }

    /// Associates the decoder with the concrete type whose fields it is
    /// reading, enabling the indexed lookup strategy for that type.
    pub(crate) fn shaped<T: 'static>(mut self) -> Self {
        self.shape = Some(TypeId::of::<T>());
        self
    }

    /// Number of items in the working set.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the record has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finds the value most recently encoded under `key`, or `None`.
    pub fn lookup(&self, key: &str) -> Option<&Node> {
        if self.items.len() <= LINEAR_SCAN_MAX {
            return self.lookup_linear(key);
        }
        match self.shape {
            Some(shape) => self.lookup_indexed(shape, key),
            None => self.lookup_linear(key),
        }
    }

    fn lookup_linear(&self, key: &str) -> Option<&Node> {
        self.items.iter().rev().find_map(|item| match item {
            Node::Pair(k, v) if k.as_str() == Some(key) => Some(&**v),
            _ => None,
        })
    }

    fn lookup_indexed(&self, shape: TypeId, key: &str) -> Option<&Node> {
        let map = shape::index_map(shape, &self.items);
        if let Some(&ix) = map.get(key) {
            if let Some(Node::Pair(k, v)) = self.items.get(ix) {
                if k.as_str() == Some(key) {
                    return Some(&**v);
                }
            }
        }
        // The memo is a performance aid, never an authority: any miss or
        // disagreement defers to the scan.
        self.lookup_linear(key)
    }

    /// Decodes the primitive most recently encoded under `key`.
    pub fn decode<T: CerealRepresentable>(&self, key: &str) -> CerealResult<Option<T>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(node) => T::from_node(node).map(Some),
        }
    }

    /// Decodes a primitive that the caller's schema requires to be present.
    pub fn require<T: CerealRepresentable>(&self, key: &str) -> CerealResult<T> {
        match self.lookup(key) {
            None => Err(CerealError::InvalidEncoding {
                expected: type_name::<T>(),
                actual: "nothing",
            }),
            Some(node) => T::from_node(node),
        }
    }

    /// Decodes the fixed-type record most recently encoded under `key`.
    ///
    /// A plain record is handed to `T::decode` directly, bypassing the
    /// registry. An identified record resolves its wire identifier through
    /// the registry first, then requires the constructed value to be a `T`.
    pub fn decode_cereal<T: CerealType + 'static>(&self, key: &str) -> CerealResult<Option<T>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(node) => cereal_from_node(node).map(Some),
        }
    }

    /// Decodes the identified record most recently encoded under `key`,
    /// requiring the registry-constructed value to be a `T`.
    pub fn decode_identified<T: 'static>(&self, key: &str) -> CerealResult<Option<T>> {
        match self.decode_identified_dyn(key)? {
            None => Ok(None),
            Some(boxed) => match boxed.downcast::<T>() {
                Ok(value) => Ok(Some(*value)),
                Err(_) => Err(CerealError::InvalidEncoding {
                    expected: type_name::<T>(),
                    actual: "identified record",
                }),
            },
        }
    }

    /// Decodes the identified record most recently encoded under `key`
    /// without committing to a concrete type.
    pub fn decode_identified_dyn(
        &self,
        key: &str,
    ) -> CerealResult<Option<Box<dyn Any + Send + Sync>>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Node::Identified(identifier, items)) => {
                let factory = registry::resolve(identifier)?;
                factory(Decoder::over(items)).map(Some)
            }
            Some(other) => Err(CerealError::RootItemNotFound {
                expected: "identified record",
                actual: other.kind().name(),
            }),
        }
    }

    /// Decodes an array of primitives encoded under `key`.
    pub fn decode_array<T: CerealRepresentable>(&self, key: &str) -> CerealResult<Option<Vec<T>>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Node::Array(items)) => items
                .iter()
                .map(T::from_node)
                .collect::<CerealResult<Vec<T>>>()
                .map(Some),
            Some(other) => Err(CerealError::RootItemNotFound {
                expected: "array",
                actual: other.kind().name(),
            }),
        }
    }

    /// Decodes a dictionary of primitives encoded under `key` as an array
    /// of pairs. Duplicate dictionary keys resolve to the later entry.
    pub fn decode_dict<T: CerealRepresentable>(
        &self,
        key: &str,
    ) -> CerealResult<Option<HashMap<String, T>>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Node::Array(items)) => {
                let mut out = HashMap::with_capacity(items.len());
                for item in items {
                    match item {
                        Node::Pair(k, v) => match k.as_str() {
                            Some(k) => {
                                out.insert(k.to_owned(), T::from_node(v)?);
                            }
                            None => {
                                return Err(CerealError::RootItemNotFound {
                                    expected: "string key",
                                    actual: k.kind().name(),
                                })
                            }
                        },
                        other => {
                            return Err(CerealError::RootItemNotFound {
                                expected: "pair",
                                actual: other.kind().name(),
                            })
                        }
                    }
                }
                Ok(Some(out))
            }
            Some(other) => Err(CerealError::RootItemNotFound {
                expected: "array",
                actual: other.kind().name(),
            }),
        }
    }

    /// Decodes an array of fixed-type records encoded under `key`.
    pub fn decode_cereal_array<T: CerealType + 'static>(
        &self,
        key: &str,
    ) -> CerealResult<Option<Vec<T>>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Node::Array(items)) => items
                .iter()
                .map(cereal_from_node)
                .collect::<CerealResult<Vec<T>>>()
                .map(Some),
            Some(other) => Err(CerealError::RootItemNotFound {
                expected: "array",
                actual: other.kind().name(),
            }),
        }
    }
}

/// Reconstructs a fixed-type value from a record or identified-record node.
fn cereal_from_node<T: CerealType + 'static>(node: &Node) -> CerealResult<T> {
    match node {
        Node::Record(items) => {
            let value = T::decode(&Decoder::over(items).shaped::<T>())?;
            shape::note_capacity(TypeId::of::<T>(), items.len());
            Ok(value)
        }
        Node::Identified(identifier, items) => {
            let factory = registry::resolve(identifier)?;
            let boxed = factory(Decoder::over(items))?;
            match boxed.downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(_) => Err(CerealError::InvalidEncoding {
                    expected: type_name::<T>(),
                    actual: "identified record",
                }),
            }
        }
        other => Err(CerealError::RootItemNotFound {
            expected: "record",
            actual: other.kind().name(),
        }),
    }
}

/// Deserializes a whole document holding one primitive root value.
pub fn decode_root<T: CerealRepresentable>(bytes: &[u8]) -> CerealResult<Option<T>> {
    Decoder::from_bytes(bytes)?.decode(crate::encode::ROOT_KEY)
}

/// Deserializes a whole document holding one fixed-type root value.
pub fn decode_root_cereal<T: CerealType + 'static>(bytes: &[u8]) -> CerealResult<Option<T>> {
    Decoder::from_bytes(bytes)?.decode_cereal(crate::encode::ROOT_KEY)
}
