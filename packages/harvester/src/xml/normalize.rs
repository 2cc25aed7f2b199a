//! Conversion of element trees into [`NormalizedValue`]s.
//!
//! No schema is involved. Sibling cardinality within one element decides
//! the shape: a tag name seen once maps straight to its value, a tag name
//! seen more than once maps to a sequence of values in document order.

use std::collections::HashMap;

use encoding_rs::{Encoding, UTF_8};
use indexmap::IndexMap;
use roxmltree::{Document, ParsingOptions};

use super::node::ElementNode;
use crate::config::{
    declared_encoding, ELEMENT_PATH_SEPARATOR, MAX_LEAF_TEXT_CHARS, TRUNCATED_TEXT,
};
use crate::error::{HarvesterError, Result};
use crate::types::NormalizedValue;

/// Dotted path of local names from the document root down to `element`.
///
/// Every name, the element's own included, is followed by a separator.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use zakupki_harvester::xml::element_path;
///
/// let doc = Document::parse("<root><section><field/></section></root>").unwrap();
/// let field = doc.descendants().find(|n| n.has_tag_name("field")).unwrap();
/// assert_eq!(element_path(field), "root.section.field.");
/// ```
pub fn element_path<N: ElementNode>(element: N) -> String {
    let mut names = Vec::new();
    let mut current = Some(element);
    while let Some(node) = current {
        names.push(node.local_name().to_string());
        current = node.parent_element();
    }

    let mut path = String::new();
    for name in names.iter().rev() {
        path.push_str(name);
        path.push(ELEMENT_PATH_SEPARATOR);
    }
    path
}

/// Normalize an element and everything below it.
///
/// A leaf yields its text, or an empty scalar when it has none. Text longer
/// than [`MAX_LEAF_TEXT_CHARS`] characters is replaced by [`TRUNCATED_TEXT`].
/// Mapping keys keep the order in which their names first appear.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use zakupki_harvester::xml::{normalize, NormalizedValue};
///
/// let doc = Document::parse("<r><item>A</item><item>B</item><name>X</name></r>").unwrap();
/// let value = normalize(doc.root_element());
/// assert_eq!(
///     serde_json::to_string(&value).unwrap(),
///     r#"{"item":["A","B"],"name":"X"}"#
/// );
/// ```
pub fn normalize<N: ElementNode>(element: N) -> NormalizedValue {
    let children: Vec<N> = element.child_elements().collect();
    if children.is_empty() {
        return leaf_value(element.text());
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for child in &children {
        *counts.entry(child.local_name().to_string()).or_default() += 1;
    }

    let mut mapping: IndexMap<String, NormalizedValue> = IndexMap::new();
    for child in children {
        let name = child.local_name().to_string();
        let repeated = counts.get(&name).is_some_and(|&count| count > 1);
        let value = normalize(child);
        if repeated {
            let entry = mapping
                .entry(name)
                .or_insert_with(|| NormalizedValue::Sequence(Vec::new()));
            if let NormalizedValue::Sequence(items) = entry {
                items.push(value);
            }
        } else {
            mapping.insert(name, value);
        }
    }

    NormalizedValue::Mapping(mapping)
}

fn leaf_value(text: Option<&str>) -> NormalizedValue {
    let text = text.unwrap_or_default();
    if text.chars().count() > MAX_LEAF_TEXT_CHARS {
        NormalizedValue::Scalar(TRUNCATED_TEXT.to_string())
    } else {
        NormalizedValue::Scalar(text.to_string())
    }
}

/// Parse an XML document and normalize its root element.
///
/// A `<!DOCTYPE>` declaration is accepted.
pub fn normalize_document(xml: &str, context: &str) -> Result<NormalizedValue> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc =
        Document::parse_with_options(xml, options).map_err(|source| HarvesterError::XmlParse {
            context: context.to_string(),
            source,
        })?;
    Ok(normalize(doc.root_element()))
}

/// Decode raw document bytes into text.
///
/// A byte order mark wins, then the encoding named in the XML declaration,
/// then UTF-8. Invalid sequences are replaced and a warning is logged
/// naming `context`.
pub fn decode_document(bytes: &[u8], context: &str) -> String {
    let declared = declared_encoding(bytes).and_then(|label| {
        let encoding = Encoding::for_label(label.as_bytes());
        if encoding.is_none() {
            tracing::warn!(%context, label, "Unknown document encoding, assuming UTF-8");
        }
        // A declaration readable as ASCII rules out UTF-16
        encoding.map(Encoding::output_encoding)
    });

    let (text, used, had_errors) = declared.unwrap_or(UTF_8).decode(bytes);
    if had_errors {
        tracing::warn!(
            %context,
            encoding = used.name(),
            "Document has invalid byte sequences, replacing them"
        );
    }
    text.into_owned()
}
