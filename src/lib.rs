//! Self-describing binary serialization of typed object graphs
//!
//! # Overview
//!
//! This library turns typed application values (primitives, nested records,
//! and runtime-polymorphic values) into a compact, self-describing byte
//! stream and back. Every encoded document carries its own structure on the
//! wire, so a reader needs no out-of-band schema to walk it: fields are
//! looked up by name, unknown fields are skipped by omission, and values
//! whose concrete type is only known at runtime are reconstructed through a
//! process-wide registry of type identifiers.
//!
//! The pipeline has three layers, each usable on its own:
//!
//! * the *tree model* ([`node`]): a closed tagged union, [`Node`],
//!   representing one encodable document or subtree;
//! * the *byte codec* ([`wire`], [`parse`]): pure functions between `Node`
//!   trees and bytes, with a per-serialization string-interning table on the
//!   write side and a window-checked recursive-descent parser on the read
//!   side;
//! * the *typed bridge* ([`conv`], [`encode`], [`decode`], [`registry`]):
//!   capability traits that application types implement once, plus the
//!   [`Encoder`]/[`Decoder`] pair that moves typed values in and out of the
//!   tree model.
//!
//! # Decoding contract
//!
//! Absence and corruption are kept strictly apart. Looking up a key that was
//! never encoded yields `Ok(None)`; every structural or byte-level problem
//! is a [`CerealError`]. Duplicate keys within a record are legal and
//! resolve to the most-recently-encoded occurrence.
//!
//! Every type implementing [`CerealType`] must encode the same ordered key
//! set on every instance. That fixed schema is what lets the decoder switch
//! from its linear key scan to a cached index map for wide records without
//! any observable difference in results.
//!
//! # Polymorphic values
//!
//! A type implementing [`IdentifiedCerealType`] contributes a string
//! identifier that travels with every encoded instance. Registering the type
//! ([`registry::register`]) installs a factory that rebuilds it from its
//! serialized fields; decoding an identifier that was never registered fails
//! with [`CerealError::UnregisteredCustomType`]. Registration is
//! process-wide and safe to perform from multiple threads.
//!
//! # Derive macros
//!
//! The companion crate `cereal_derive` provides `#[derive(CerealType)]` and
//! `#[derive(IdentifiedCerealType)]` for structs whose fields are all
//! primitive leaves, eliminating the field-by-field boilerplate for the
//! common case. Both derives are re-exported here.

extern crate self as cereal;

pub mod conv;
pub mod decode;
pub mod encode;
pub mod error;
mod internal;
pub mod node;
pub mod parse;
pub mod prelude;
pub mod registry;
pub mod shape;
pub mod uri;
pub mod util;
pub mod wire;

pub use crate::conv::{CerealRepresentable, CerealType, IdentifiedCerealType};
pub use crate::conv::target::{ByteCounter, Target};
pub use crate::decode::{decode_root, decode_root_cereal, Decoder, LINEAR_SCAN_MAX};
pub use crate::encode::{encode_root, encode_root_cereal, Encoder};
pub use crate::error::{CerealError, CerealResult, HexError, UriError};
pub use crate::node::{Node, NodeKind, Timestamp};
pub use crate::parse::{
    byteparser::ByteParser, error::ParseError, traceparser::TraceParser, ParseResult, Parser,
};
pub use crate::registry::Factory;
pub use crate::uri::Uri;
pub use crate::wire::{node_from_bytes, node_to_bytes, Tag};

pub use ::cereal_derive::{CerealType, IdentifiedCerealType};
pub use ::lazy_static::lazy_static;
