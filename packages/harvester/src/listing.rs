//! The listing capability the catalog and fetcher are written against.
//!
//! Implementations are blocking and stateful; a session is driven by one
//! caller at a time.

use std::io::Write;

use crate::error::Result;

/// Remote catalog access: folder listings, sizes and binary retrieval.
pub trait Listing {
    /// List the immediate entries of a folder.
    ///
    /// An empty `path` lists the catalog root. Entries are returned as the
    /// service reports them, typically as paths relative to the root.
    fn list(&mut self, path: &str) -> Result<Vec<String>>;

    /// Authoritative size of a remote file in bytes.
    fn size(&mut self, path: &str) -> Result<u64>;

    /// Stream the full binary content of a remote file into `sink`.
    ///
    /// Returns the number of bytes written.
    fn retrieve(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64>;
}

impl<L: Listing + ?Sized> Listing for &mut L {
    fn list(&mut self, path: &str) -> Result<Vec<String>> {
        (**self).list(path)
    }

    fn size(&mut self, path: &str) -> Result<u64> {
        (**self).size(path)
    }

    fn retrieve(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64> {
        (**self).retrieve(path, sink)
    }
}
