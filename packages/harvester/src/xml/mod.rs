//! Schema-less normalization of XML documents.
//!
//! - [`node`]: the element capability the normalizer is written against
//! - [`normalize`]: element paths and conversion to [`NormalizedValue`]

pub mod node;
pub mod normalize;

pub use node::ElementNode;
pub use normalize::{decode_document, element_path, normalize, normalize_document};

pub use crate::types::NormalizedValue;
