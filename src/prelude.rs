//! Convenience re-export of the items most call sites need
//!
//! ```
//! use cereal::prelude::*;
//! ```

pub use crate::conv::{CerealRepresentable, CerealType, IdentifiedCerealType};
pub use crate::decode::{decode_root, decode_root_cereal, Decoder};
pub use crate::encode::{encode_root, encode_root_cereal, Encoder};
pub use crate::error::{CerealError, CerealResult};
pub use crate::node::{Node, NodeKind, Timestamp};
pub use crate::registry::{self, Factory};
pub use crate::uri::Uri;
pub use crate::wire::{node_from_bytes, node_to_bytes};
