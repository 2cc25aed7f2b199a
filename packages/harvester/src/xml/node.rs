//! Element capability over parsed document trees.

use roxmltree::Node;

/// The minimal view of a document element the normalizer needs.
///
/// Any tree exposing names, ordered children, parents and text can be
/// normalized by implementing this trait.
pub trait ElementNode: Sized {
    /// Tag name without namespace prefix.
    fn local_name(&self) -> &str;

    /// Child elements in document order; text, comments and processing
    /// instructions are not included.
    fn child_elements(&self) -> impl Iterator<Item = Self> + '_;

    /// Parent element, `None` at the document root.
    fn parent_element(&self) -> Option<Self>;

    /// Text content directly inside the element, before any child element.
    fn text(&self) -> Option<&str>;
}

impl<'a, 'input> ElementNode for Node<'a, 'input> {
    fn local_name(&self) -> &str {
        self.tag_name().name()
    }

    fn child_elements(&self) -> impl Iterator<Item = Self> + '_ {
        self.children().filter(|child| child.is_element())
    }

    fn parent_element(&self) -> Option<Self> {
        self.parent_element()
    }

    fn text(&self) -> Option<&str> {
        Node::text(self)
    }
}
