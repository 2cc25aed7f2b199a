//! Catalog crawling and file selection.
//!
//! The catalog is an unbounded folder tree whose shape is not known up
//! front. [`Catalog::crawl`] walks it breadth-first and returns a
//! [`FileList`] snapshot; regions, document types and filters are derived
//! from that snapshot without touching the crawl again.

use std::collections::{BTreeSet, VecDeque};

use crate::config::{document_type_code, final_segment, is_file_like, is_region_name};
use crate::error::Result;
use crate::listing::Listing;

/// Where a crawl started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStart {
    /// The whole catalog, no region requested.
    Root,
    /// A known region.
    Region(String),
    /// A region was requested but the catalog has no such region, so the
    /// whole catalog was crawled instead.
    UnknownRegion(String),
}

impl CrawlStart {
    /// Folder the traversal is seeded with.
    pub fn folder(&self) -> &str {
        match self {
            Self::Region(region) => region,
            Self::Root | Self::UnknownRegion(_) => "",
        }
    }
}

/// Ordered file paths discovered by one crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileList {
    start: CrawlStart,
    paths: Vec<String>,
}

/// Document type codes found in a [`FileList`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTypes {
    /// Distinct type codes.
    pub codes: BTreeSet<String>,
    /// Paths whose file name carries no type code.
    pub unmatched: Vec<String>,
}

impl DocumentTypes {
    /// Whether `code` was seen in the file list.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }
}

impl FileList {
    /// Build a file list from already discovered paths.
    pub fn new(start: CrawlStart, paths: Vec<String>) -> Self {
        Self { start, paths }
    }

    /// Where the crawl that produced this list started.
    pub fn start(&self) -> &CrawlStart {
        &self.start
    }

    /// Paths in discovery order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Iterate over paths in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Number of files found.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the crawl found no files.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Extract document type codes from every path's file name.
    ///
    /// Paths that do not follow the `type_rest` naming are skipped and
    /// reported in [`DocumentTypes::unmatched`].
    pub fn document_types(&self) -> DocumentTypes {
        let mut types = DocumentTypes::default();
        for path in &self.paths {
            match document_type_code(path) {
                Some(code) => {
                    types.codes.insert(code.to_string());
                }
                None => {
                    tracing::warn!(path = %path, "File name carries no document type code");
                    types.unmatched.push(path.clone());
                }
            }
        }
        types
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Region and type restrictions resolved against a catalog.
///
/// A `None` field means the corresponding restriction is not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    region: Option<String>,
    document_type: Option<String>,
}

impl FileFilter {
    /// Keep only the requested values the catalog actually knows about.
    pub fn resolve(
        regions: &BTreeSet<String>,
        types: &DocumentTypes,
        region: Option<&str>,
        document_type: Option<&str>,
    ) -> Self {
        let region = region.filter(|r| !r.is_empty()).and_then(|r| {
            if regions.contains(r) {
                Some(r.to_string())
            } else {
                tracing::warn!(region = r, "Unknown region, not filtering by region");
                None
            }
        });
        let document_type = document_type.filter(|t| !t.is_empty()).and_then(|t| {
            if types.contains(t) {
                Some(t.to_string())
            } else {
                tracing::warn!(
                    document_type = t,
                    "Unknown document type, not filtering by type"
                );
                None
            }
        });
        Self {
            region,
            document_type,
        }
    }

    /// Region prefix paths must start with, if any.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Type code file names must contain, if any.
    pub fn document_type(&self) -> Option<&str> {
        self.document_type.as_deref()
    }

    /// Whether `path` passes both restrictions.
    pub fn matches(&self, path: &str) -> bool {
        let region_ok = self
            .region
            .as_deref()
            .map_or(true, |region| path.starts_with(region));
        let type_ok = self
            .document_type
            .as_deref()
            .map_or(true, |code| final_segment(path).contains(code));
        region_ok && type_ok
    }

    /// Lazily select matching paths from a file list, preserving order.
    pub fn apply<'a>(&'a self, files: &'a FileList) -> impl Iterator<Item = &'a str> + 'a {
        files.iter().filter(move |path| self.matches(path))
    }
}

/// Crawler over a remote catalog.
pub struct Catalog<L> {
    listing: L,
}

impl<L: Listing> Catalog<L> {
    pub fn new(listing: L) -> Self {
        Self { listing }
    }

    /// Access the underlying session, e.g. to fetch archives with it.
    pub fn listing_mut(&mut self) -> &mut L {
        &mut self.listing
    }

    pub fn into_inner(self) -> L {
        self.listing
    }

    /// Region names at the catalog root, queried fresh on every call.
    pub fn list_regions(&mut self) -> Result<BTreeSet<String>> {
        let entries = self.listing.list("")?;
        Ok(entries
            .into_iter()
            .filter(|name| is_region_name(name))
            .collect())
    }

    /// Crawl the catalog, starting at `region` when it is a known region.
    pub fn crawl(&mut self, region: Option<&str>) -> Result<FileList> {
        self.crawl_with_progress(region, |_, _| {})
    }

    /// Crawl the catalog, calling `progress(folder, files_found)` before
    /// every folder listing.
    ///
    /// Traversal pops folders from the front of a work queue and appends
    /// newly seen folders to the back; it ends when the queue is empty.
    /// An entry equal to the folder being listed is never enqueued, so a
    /// folder listing itself does not loop.
    pub fn crawl_with_progress<F>(&mut self, region: Option<&str>, mut progress: F) -> Result<FileList>
    where
        F: FnMut(&str, usize),
    {
        let start = match region.filter(|r| !r.is_empty()) {
            None => CrawlStart::Root,
            Some(region) => {
                if self.list_regions()?.contains(region) {
                    CrawlStart::Region(region.to_string())
                } else {
                    tracing::warn!(region, "Region not found, crawling all regions");
                    CrawlStart::UnknownRegion(region.to_string())
                }
            }
        };

        let mut queue = VecDeque::from([start.folder().to_string()]);
        let mut paths = Vec::new();

        while let Some(folder) = queue.pop_front() {
            progress(&folder, paths.len());
            let entries = self.listing.list(&folder)?;
            tracing::debug!(
                folder = %folder,
                entries = entries.len(),
                files = paths.len(),
                queued = queue.len(),
                "Listed folder"
            );

            for entry in entries {
                if is_file_like(&entry) {
                    paths.push(entry);
                } else if entry != folder {
                    queue.push_back(entry);
                }
            }
        }

        tracing::info!(start = ?start, files = paths.len(), "Crawl finished");
        Ok(FileList::new(start, paths))
    }

    /// Document type codes of a crawl result.
    pub fn list_document_types(&self, files: &FileList) -> DocumentTypes {
        files.document_types()
    }

    /// Resolve region and type restrictions for `files`.
    ///
    /// Regions are only queried when a region is requested.
    pub fn resolve_filter(
        &mut self,
        files: &FileList,
        region: Option<&str>,
        document_type: Option<&str>,
    ) -> Result<FileFilter> {
        let regions = match region.filter(|r| !r.is_empty()) {
            Some(_) => self.list_regions()?,
            None => BTreeSet::new(),
        };
        let types = match document_type.filter(|t| !t.is_empty()) {
            Some(_) => files.document_types(),
            None => DocumentTypes::default(),
        };
        Ok(FileFilter::resolve(&regions, &types, region, document_type))
    }

    /// Lazily select paths of `files` in the given region and of the given
    /// document type. Unrecognised values are ignored.
    pub fn filter<'a>(
        &mut self,
        files: &'a FileList,
        region: Option<&str>,
        document_type: Option<&str>,
    ) -> Result<impl Iterator<Item = &'a str> + 'a> {
        let filter = self.resolve_filter(files, region, document_type)?;
        Ok(files.iter().filter(move |path| filter.matches(path)))
    }
}
