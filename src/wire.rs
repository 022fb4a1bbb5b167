//! Binary codec between [`Node`] trees and the wire format
//!
//! # Wire grammar
//!
//! Every node is a one-byte tag followed by a type-specific payload. All
//! multi-byte integers are big-endian with explicit widths, so a buffer
//! produced on one architecture parses identically on any other.
//!
//! ```text
//! Node       := Tag(1) Payload
//! Str | Uri  := Tag, Length(8, u64), UTF8Bytes[Length]
//! Int32      := Tag, 4 bytes          Int64 | Double | Timestamp := Tag, 8 bytes
//! Float      := Tag, 4 bytes          Bool := Tag, 1 byte (0x00/0x01)
//! Pair       := Tag, Node(key), Node(value)
//! Array      := Tag, ByteLength(8), ItemCount(8), Node*
//! Record     := Tag, ByteLength(8), ItemCount(8), Pair*
//! Identified := Tag, Str-leaf(identifier), ByteLength(8), ItemCount(8), Pair*
//! ```
//!
//! `ByteLength` covers the concatenated child encodings and is what bounds
//! child parsing (it would also let a reader skip a subtree outright, which
//! no current caller does). `ItemCount` is a capacity hint only; the parser
//! never uses it to terminate a loop.
//!
//! # Interning
//!
//! Field names repeat heavily across sibling records and array entries. One
//! [`InternTable`] is threaded through each top-level serialization pass:
//! the first occurrence of a string renders its `Length + UTF8` payload and
//! caches it; every later occurrence copies the cached run instead of
//! re-rendering. The output bytes are identical either way, so interning is
//! invisible to the parser.

use std::collections::HashMap;

use cfg_if::cfg_if;

use crate::conv::target::Target;
use crate::node::{Node, Timestamp};
use crate::parse::byteparser::ByteParser;
use crate::parse::error::{ParseError, ParseResult, TokenError};
use crate::parse::Parser;
use crate::uri::Uri;

/// Tag bytes of the wire format, one per [`Node`] case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Str = 0x01,
    Int32 = 0x02,
    Int64 = 0x03,
    Double = 0x04,
    Float = 0x05,
    Bool = 0x06,
    Timestamp = 0x07,
    Uri = 0x08,
    Pair = 0x09,
    Array = 0x0a,
    Record = 0x0b,
    Identified = 0x0c,
}

impl Tag {
    /// Interprets a raw tag byte, or `None` for bytes outside the
    /// enumeration.
    pub const fn from_byte(byte: u8) -> Option<Tag> {
        match byte {
            0x01 => Some(Tag::Str),
            0x02 => Some(Tag::Int32),
            0x03 => Some(Tag::Int64),
            0x04 => Some(Tag::Double),
            0x05 => Some(Tag::Float),
            0x06 => Some(Tag::Bool),
            0x07 => Some(Tag::Timestamp),
            0x08 => Some(Tag::Uri),
            0x09 => Some(Tag::Pair),
            0x0a => Some(Tag::Array),
            0x0b => Some(Tag::Record),
            0x0c => Some(Tag::Identified),
            _ => None,
        }
    }
}

/// Per-serialization cache of rendered string payloads, keyed by content.
pub(crate) struct InternTable(HashMap<String, Vec<u8>>);

impl InternTable {
    pub(crate) fn new() -> Self {
        Self(HashMap::new())
    }

    /// The rendered `Length + UTF8` payload for `text`, rendering and
    /// caching it on first sight.
    fn payload(&mut self, text: &str) -> &[u8] {
        if !self.0.contains_key(text) {
            let mut rendered = Vec::with_capacity(8 + text.len());
            rendered.extend_from_slice(&(text.len() as u64).to_be_bytes());
            rendered.extend_from_slice(text.as_bytes());
            self.0.insert(text.to_owned(), rendered);
        }
        match self.0.get(text) {
            Some(rendered) => rendered,
            None => unreachable!(),
        }
    }
}

/// Serializes a node tree, depth-first and pre-order, into a fresh buffer.
pub fn node_to_bytes(node: &Node) -> Vec<u8> {
    let mut interns = InternTable::new();
    let mut buf: Vec<u8> = Vec::new();
    let _ = write_node(node, &mut buf, &mut interns);
    buf
}

/// Appends the encoding of `node` to `buf`, returning the number of bytes
/// written.
pub(crate) fn write_node<U: Target>(
    node: &Node,
    buf: &mut U,
    interns: &mut InternTable,
) -> usize {
    match node {
        Node::Str(s) => buf.push_one(Tag::Str as u8) + buf.push_all(interns.payload(s)),
        Node::Uri(u) => buf.push_one(Tag::Uri as u8) + buf.push_all(interns.payload(u.as_str())),
        Node::Int32(v) => buf.push_one(Tag::Int32 as u8) + buf.push_many(v.to_be_bytes()),
        Node::Int64(v) => buf.push_one(Tag::Int64 as u8) + buf.push_many(v.to_be_bytes()),
        Node::Double(v) => buf.push_one(Tag::Double as u8) + buf.push_many(v.to_be_bytes()),
        Node::Float(v) => buf.push_one(Tag::Float as u8) + buf.push_many(v.to_be_bytes()),
        Node::Bool(v) => {
            buf.push_one(Tag::Bool as u8) + buf.push_one(if *v { 0x01 } else { 0x00 })
        }
        Node::Timestamp(ts) => {
            buf.push_one(Tag::Timestamp as u8) + buf.push_many(ts.seconds().to_be_bytes())
        }
        Node::Pair(key, value) => {
            buf.push_one(Tag::Pair as u8)
                + write_node(key, buf, interns)
                + write_node(value, buf, interns)
        }
        Node::Array(items) => write_container(Tag::Array, None, items, buf, interns),
        Node::Record(items) => write_container(Tag::Record, None, items, buf, interns),
        Node::Identified(identifier, items) => {
            write_container(Tag::Identified, Some(identifier), items, buf, interns)
        }
    }
}

fn write_container<U: Target>(
    tag: Tag,
    identifier: Option<&str>,
    items: &[Node],
    buf: &mut U,
    interns: &mut InternTable,
) -> usize {
    // Children render into a scratch buffer first so that ByteLength and
    // ItemCount can precede them.
    let mut contents: Vec<u8> = Vec::new();
    for item in items {
        let _ = write_node(item, &mut contents, interns);
    }

    let mut written = buf.push_one(tag as u8);
    if let Some(identifier) = identifier {
        written += buf.push_one(Tag::Str as u8);
        written += buf.push_all(interns.payload(identifier));
    }
    buf.anticipate(16 + contents.len());
    written += buf.push_many((contents.len() as u64).to_be_bytes());
    written += buf.push_many((items.len() as u64).to_be_bytes());
    written + buf.push_all(&contents)
}

/// Parses one node tree out of `bytes`.
///
/// Fails, never panics, on malformed input: a truncated or unrecognized
/// tag, a truncated length or payload, a declared length exceeding the
/// remaining buffer, a non-UTF-8 string, an invalid URI, or container
/// contents that disagree with their declared byte-length.
pub fn node_from_bytes(bytes: &[u8]) -> ParseResult<Node> {
    let mut p = ByteParser::from_buffer(bytes.into());
    let node = parse_node(&mut p)?;
    check_leftover(&p)?;
    Ok(node)
}

cfg_if! {
    if #[cfg(feature = "check_complete_parse")] {
        fn check_leftover<P: Parser>(p: &P) -> ParseResult<()> {
            match p.remainder() {
                0 => Ok(()),
                residual => Err(ParseError::Incomplete { residual }),
            }
        }
    } else {
        fn check_leftover<P: Parser>(_p: &P) -> ParseResult<()> {
            Ok(())
        }
    }
}

/// Consumes one node from the parser, recursing into containers.
pub(crate) fn parse_node<P: Parser>(p: &mut P) -> ParseResult<Node> {
    let byte = p.take_u8()?;
    let tag = match Tag::from_byte(byte) {
        Some(tag) => tag,
        None => return Err(ParseError::Token(TokenError::UnknownTag(byte))),
    };
    match tag {
        Tag::Str => Ok(Node::Str(parse_string_payload(p)?)),
        Tag::Int32 => Ok(Node::Int32(p.take_i32()?)),
        Tag::Int64 => Ok(Node::Int64(p.take_i64()?)),
        Tag::Double => Ok(Node::Double(p.take_f64()?)),
        Tag::Float => Ok(Node::Float(p.take_f32()?)),
        Tag::Bool => Ok(Node::Bool(p.take_bool()?)),
        Tag::Timestamp => Ok(Node::Timestamp(Timestamp::from_seconds(p.take_f64()?))),
        Tag::Uri => {
            let text = parse_string_payload(p)?;
            Ok(Node::Uri(Uri::parse(text)?))
        }
        Tag::Pair => {
            let key = parse_node(p)?;
            let value = parse_node(p)?;
            Ok(Node::Pair(Box::new(key), Box::new(value)))
        }
        Tag::Array => Ok(Node::Array(parse_children(p)?)),
        Tag::Record => Ok(Node::Record(parse_children(p)?)),
        Tag::Identified => {
            let leaf_tag = p.take_u8()?;
            if leaf_tag != Tag::Str as u8 {
                return Err(ParseError::Token(TokenError::UnexpectedTag {
                    expected: Tag::Str as u8,
                    actual: leaf_tag,
                }));
            }
            let identifier = parse_string_payload(p)?;
            Ok(Node::Identified(identifier, parse_children(p)?))
        }
    }
}

fn parse_string_payload<P: Parser>(p: &mut P) -> ParseResult<String> {
    let len = p.take_length()?;
    let raw = p.take_dynamic(len)?;
    Ok(String::from_utf8(raw)?)
}

/// Reads a container body: ByteLength, ItemCount, then children until the
/// declared byte-length is consumed exactly.
fn parse_children<P: Parser>(p: &mut P) -> ParseResult<Vec<Node>> {
    let content_len = p.take_length()?;
    let count = p.take_u64()?;
    p.set_fit(content_len)?;
    // The count is a reservation hint, never a loop bound; clamp it so a
    // hostile buffer cannot force an oversized allocation.
    let mut items: Vec<Node> = Vec::with_capacity(count.min(content_len as u64) as usize);
    while !p.test_target()? {
        items.push(parse_node(p)?);
    }
    p.enforce_target()?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex;
    use crate::util::hex_of_bytes;

    fn roundtrip(node: Node) {
        let bytes = node_to_bytes(&node);
        assert_eq!(node_from_bytes(&bytes).unwrap(), node);
    }

    #[test]
    fn leaf_wire_layout() {
        const CASES: [(Node, &str); 6] = [
            (Node::Int32(3), "0200000003"),
            (Node::Int32(-2), "02fffffffe"),
            (Node::Int64(7), "030000000000000007"),
            (Node::Double(1.0), "043ff0000000000000"),
            (Node::Bool(true), "0601"),
            (Node::Bool(false), "0600"),
        ];
        for (node, expected) in CASES {
            assert_eq!(hex_of_bytes(node_to_bytes(&node)), expected);
            assert_eq!(node_from_bytes(&hex!(expected)).unwrap(), node);
        }
    }

    #[test]
    fn string_leaf_wire_layout() {
        let bytes = node_to_bytes(&Node::Str("a".to_owned()));
        assert_eq!(hex_of_bytes(&bytes), "01000000000000000161");
        assert_eq!(
            node_from_bytes(&bytes).unwrap(),
            Node::Str("a".to_owned())
        );
    }

    #[test]
    fn primitive_roundtrips() {
        roundtrip(Node::Str(String::new()));
        roundtrip(Node::Str("snap, crackle, pop".to_owned()));
        roundtrip(Node::Int32(i32::MIN));
        roundtrip(Node::Int64(i64::MAX));
        roundtrip(Node::Double(std::f64::consts::PI));
        roundtrip(Node::Float(-0.5));
        roundtrip(Node::Timestamp(Timestamp::from_seconds(1_500_000_000.25)));
        roundtrip(Node::Uri(Uri::parse("https://example.com/x?y=z").unwrap()));
    }

    #[test]
    fn container_roundtrips() {
        roundtrip(Node::Array(vec![]));
        roundtrip(Node::Array(vec![
            Node::Int32(1),
            Node::Str("two".to_owned()),
            Node::Bool(false),
        ]));
        roundtrip(Node::Record(vec![
            Node::pair("name", Node::Str("a".to_owned())),
            Node::pair("count", Node::Int32(3)),
        ]));
        roundtrip(Node::Identified(
            "point".to_owned(),
            vec![
                Node::pair("x", Node::Double(1.5)),
                Node::pair("y", Node::Double(-2.5)),
            ],
        ));
        roundtrip(Node::Record(vec![Node::pair(
            "inner",
            Node::Record(vec![Node::pair(
                "deep",
                Node::Array(vec![Node::Record(vec![])]),
            )]),
        )]));
    }

    #[test]
    fn record_wire_layout() {
        // 0b                  record tag
        // ...0018             content byte-length (24)
        // ...0001             item count
        // 09                  pair tag
        // 01 ...0004 6e616d65 key "name"
        // 01 ...0001 61       value "a"
        let bytes = node_to_bytes(&Node::Record(vec![Node::pair(
            "name",
            Node::Str("a".to_owned()),
        )]));
        assert_eq!(
            hex_of_bytes(&bytes),
            "0b0000000000000018000000000000000109\
             0100000000000000046e616d65\
             01000000000000000161"
        );
    }

    #[test]
    fn interning_is_invisible_to_the_parser() {
        let doc = Node::Record(vec![
            Node::pair("label", Node::Str("shared".to_owned())),
            Node::pair("alias", Node::Str("shared".to_owned())),
        ]);
        let bytes = node_to_bytes(&doc);
        // The interned payload appears verbatim at both sites.
        let payload = {
            let mut rendered = (6u64).to_be_bytes().to_vec();
            rendered.extend_from_slice(b"shared");
            rendered
        };
        let occurrences = bytes
            .windows(payload.len())
            .filter(|w| *w == payload.as_slice())
            .count();
        assert_eq!(occurrences, 2);
        assert_eq!(node_from_bytes(&bytes).unwrap(), doc);
    }

    #[test]
    fn unknown_tag_fails() {
        assert!(matches!(
            node_from_bytes(&[0xff]),
            Err(ParseError::Token(TokenError::UnknownTag(0xff)))
        ));
    }

    #[test]
    fn invalid_utf8_fails() {
        // Str leaf declaring one byte of payload, payload 0xff.
        let bytes = hex!("010000000000000001ff");
        assert!(matches!(
            node_from_bytes(&bytes),
            Err(ParseError::External(_))
        ));
    }

    #[test]
    fn invalid_uri_fails() {
        // Uri leaf with payload "abc": no scheme.
        let mut bytes = hex!("080000000000000003");
        bytes.extend_from_slice(b"abc");
        assert!(matches!(
            node_from_bytes(&bytes),
            Err(ParseError::External(_))
        ));
    }

    #[test]
    fn invalid_boolean_fails() {
        assert!(matches!(
            node_from_bytes(&hex!("0602")),
            Err(ParseError::Token(TokenError::InvalidBoolean(0x02)))
        ));
    }

    #[test]
    fn declared_length_beyond_buffer_fails() {
        // Array claiming 64 content bytes with nothing behind the header.
        let bytes = hex!("0a00000000000000400000000000000001");
        assert!(matches!(
            node_from_bytes(&bytes),
            Err(ParseError::Window(_))
        ));
    }

    #[test]
    fn child_overrunning_container_window_fails() {
        // Array declaring 2 content bytes whose only child is an Int32 tag,
        // which needs 4 payload bytes the window does not allow.
        let bytes = hex!("0a00000000000000020000000000000001" /* header */)
            .into_iter()
            .chain(hex!("0200"))
            .collect::<Vec<u8>>();
        assert!(node_from_bytes(&bytes).is_err());
    }

    #[test]
    fn identifier_must_be_a_string_leaf() {
        // Identified record whose identifier slot holds an Int32 tag.
        let bytes = hex!("0c02");
        assert!(matches!(
            node_from_bytes(&bytes),
            Err(ParseError::Token(TokenError::UnexpectedTag { .. }))
        ));
    }

    #[test]
    fn truncation_never_panics() {
        let doc = Node::Record(vec![
            Node::pair("name", Node::Str("a".to_owned())),
            Node::pair("count", Node::Int32(3)),
            Node::pair(
                "nested",
                Node::Identified(
                    "point".to_owned(),
                    vec![Node::pair("x", Node::Double(1.5))],
                ),
            ),
        ]);
        let bytes = node_to_bytes(&doc);
        for cut in 0..bytes.len() {
            assert!(
                node_from_bytes(&bytes[..cut]).is_err(),
                "parse of {cut}-byte prefix should fail"
            );
        }
        assert!(node_from_bytes(&bytes).is_ok());
    }

    #[cfg(feature = "check_complete_parse")]
    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = node_to_bytes(&Node::Bool(true));
        bytes.push(0x00);
        assert_eq!(
            node_from_bytes(&bytes),
            Err(ParseError::Incomplete { residual: 1 })
        );
    }

    #[test]
    fn trace_parser_parses_identically() {
        use crate::parse::traceparser::TraceParser;

        let doc = Node::Record(vec![
            Node::pair("k", Node::Int32(1)),
            Node::pair("s", Node::Str("v".to_owned())),
        ]);
        let bytes = node_to_bytes(&doc);
        let mut p = TraceParser::from_buffer(bytes.as_slice().into());
        assert_eq!(parse_node(&mut p).unwrap(), doc);
        assert_eq!(p.remainder(), 0);
    }

    #[test]
    fn byte_counter_measures_serialization() {
        use crate::conv::target::ByteCounter;

        let doc = Node::Identified(
            "point".to_owned(),
            vec![
                Node::pair("x", Node::Double(1.0)),
                Node::pair("y", Node::Double(2.0)),
            ],
        );
        let mut counter = ByteCounter::create();
        let measured = write_node(&doc, &mut counter, &mut InternTable::new());
        assert_eq!(measured, node_to_bytes(&doc).len());
    }

    #[test]
    fn item_count_is_not_a_loop_bound() {
        // Record with two pairs but a declared count of 9: the parser must
        // read to the declared byte-length and return both items.
        let inner = Node::Record(vec![
            Node::pair("a", Node::Int32(1)),
            Node::pair("b", Node::Int32(2)),
        ]);
        let mut bytes = node_to_bytes(&inner);
        // Patch the item-count field (bytes 9..17 of a record encoding).
        bytes[9..17].copy_from_slice(&9u64.to_be_bytes());
        let reparsed = node_from_bytes(&bytes).unwrap();
        match reparsed {
            Node::Record(items) => assert_eq!(items.len(), 2),
            other => panic!("expected record, got {:?}", other.kind()),
        }
    }
}
