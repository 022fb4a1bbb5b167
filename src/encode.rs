//! Incremental construction of encodable documents
//!
//! An [`Encoder`] accumulates [`Node::Pair`] items in encoding order and
//! finally wraps them in an outer record for serialization. Nested
//! [`CerealType`] and [`IdentifiedCerealType`] values recurse through fresh
//! encoders, so arbitrarily deep object graphs serialize with the same
//! field-by-field machinery as the top level.
//!
//! Absence is encoded by omission: [`Encoder::encode_opt`] with `None`
//! appends nothing at all, rather than a null marker. Encoding the same key
//! twice is legal; keyed lookup on decode resolves to the later occurrence.

use std::any::TypeId;

use crate::conv::{CerealRepresentable, CerealType, IdentifiedCerealType};
use crate::error::{CerealError, CerealResult};
use crate::node::{Node, NodeKind};
use crate::shape;
use crate::wire;

/// Key under which single-value documents store their root value.
///
/// An internal convention shared by [`encode_root`] and
/// [`decode_root`](crate::decode::decode_root); not part of the public wire
/// contract.
pub(crate) const ROOT_KEY: &str = "root";

/// Builder of one record's worth of encoded fields.
#[derive(Debug, Default)]
pub struct Encoder {
    items: Vec<Node>,
}

impl Encoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Creates an empty encoder with room for `hint` items.
    pub fn with_capacity(hint: usize) -> Self {
        Self {
            items: Vec::with_capacity(hint),
        }
    }

    /// Creates an encoder pre-sized from the capacity-hint cache entry for
    /// `T`, if one has been recorded.
    pub(crate) fn for_type<T: 'static>() -> Self {
        match shape::capacity_hint(TypeId::of::<T>()) {
            Some(hint) => Self::with_capacity(hint),
            None => Self::new(),
        }
    }

    /// Appends one primitive field.
    pub fn encode<T: CerealRepresentable>(&mut self, value: T, key: &str) {
        self.items.push(Node::pair(key, value.into_node()));
    }

    /// Appends one primitive field, or nothing when `value` is `None`.
    pub fn encode_opt<T: CerealRepresentable>(&mut self, value: Option<T>, key: &str) {
        if let Some(value) = value {
            self.encode(value, key);
        }
    }

    /// Appends one nested fixed-type record field.
    pub fn encode_cereal<T: CerealType + 'static>(
        &mut self,
        value: &T,
        key: &str,
    ) -> CerealResult<()> {
        let node = cereal_node(value)?;
        self.items.push(Node::pair(key, node));
        Ok(())
    }

    /// Appends one nested identified record field.
    ///
    /// The identifier written to the wire is `T::IDENTIFIER`; call sites
    /// never supply it.
    pub fn encode_identified<T: IdentifiedCerealType + 'static>(
        &mut self,
        value: &T,
        key: &str,
    ) -> CerealResult<()> {
        let node = identified_node(value)?;
        self.items.push(Node::pair(key, node));
        Ok(())
    }

    /// Appends an already-built node, the escape hatch for re-encoding a
    /// parsed subtree.
    ///
    /// A bare [`Node::Pair`] matches no encodable capability (a pair *is* a
    /// field, not a field value) and is rejected with
    /// [`UnsupportedCerealRepresentable`](CerealError::UnsupportedCerealRepresentable).
    pub fn encode_node(&mut self, node: Node, key: &str) -> CerealResult<()> {
        match node.kind() {
            NodeKind::Pair => Err(CerealError::UnsupportedCerealRepresentable {
                kind: NodeKind::Pair,
            }),
            _ => {
                self.items.push(Node::pair(key, node));
                Ok(())
            }
        }
    }

    /// Appends one array field of primitive elements.
    pub fn encode_array<T, I>(&mut self, values: I, key: &str)
    where
        T: CerealRepresentable,
        I: IntoIterator<Item = T>,
    {
        let items: Vec<Node> = values.into_iter().map(T::into_node).collect();
        self.items.push(Node::pair(key, Node::Array(items)));
    }

    /// Appends one dictionary field of primitive values, serialized as an
    /// array of pairs.
    pub fn encode_dict<T, I>(&mut self, entries: I, key: &str)
    where
        T: CerealRepresentable,
        I: IntoIterator<Item = (String, T)>,
    {
        let items: Vec<Node> = entries
            .into_iter()
            .map(|(k, v)| Node::pair(k, v.into_node()))
            .collect();
        self.items.push(Node::pair(key, Node::Array(items)));
    }

    /// Appends one array field of nested fixed-type records.
    pub fn encode_cereal_array<T: CerealType + 'static>(
        &mut self,
        values: &[T],
        key: &str,
    ) -> CerealResult<()> {
        let mut items = Vec::with_capacity(values.len());
        for value in values {
            items.push(cereal_node(value)?);
        }
        self.items.push(Node::pair(key, Node::Array(items)));
        Ok(())
    }

    /// Number of items appended so far.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Consumes the encoder's item list as a node vector.
    pub(crate) fn into_items(self) -> Vec<Node> {
        self.items
    }

    /// Wraps the accumulated items in an outer record and serializes it.
    pub fn to_bytes(self) -> Vec<u8> {
        wire::node_to_bytes(&Node::Record(self.items))
    }
}

/// Encodes a fixed-type value into its record node, recording the observed
/// item count in the capacity-hint cache.
pub(crate) fn cereal_node<T: CerealType + 'static>(value: &T) -> CerealResult<Node> {
    let mut nested = Encoder::for_type::<T>();
    value.encode(&mut nested)?;
    shape::note_capacity(TypeId::of::<T>(), nested.item_count());
    Ok(Node::Record(nested.into_items()))
}

/// Encodes an identified value into its identified-record node.
pub(crate) fn identified_node<T: IdentifiedCerealType + 'static>(
    value: &T,
) -> CerealResult<Node> {
    let mut nested = Encoder::for_type::<T>();
    value.encode(&mut nested)?;
    shape::note_capacity(TypeId::of::<T>(), nested.item_count());
    Ok(Node::Identified(
        T::IDENTIFIER.to_owned(),
        nested.into_items(),
    ))
}

/// Serializes a whole document holding one primitive root value.
pub fn encode_root<T: CerealRepresentable>(value: T) -> Vec<u8> {
    let mut enc = Encoder::with_capacity(1);
    enc.encode(value, ROOT_KEY);
    enc.to_bytes()
}

/// Serializes a whole document holding one fixed-type root value.
pub fn encode_root_cereal<T: CerealType + 'static>(value: &T) -> CerealResult<Vec<u8>> {
    let mut enc = Encoder::with_capacity(1);
    enc.encode_cereal(value, ROOT_KEY)?;
    Ok(enc.to_bytes())
}
