//! Zakupki Harvester - crawl the public procurement FTP catalog and
//! normalize the XML documents inside its archives.
//!
//! # Example
//!
//! ```
//! use roxmltree::Document;
//! use zakupki_harvester::config::is_file_like;
//! use zakupki_harvester::xml::{element_path, normalize, NormalizedValue};
//!
//! assert!(is_file_like("Moskva/contracts/contract_Moskva_2019.xml.zip"));
//!
//! let doc = Document::parse("<export><contract><id>7</id></contract></export>").unwrap();
//! let id = doc.descendants().find(|n| n.has_tag_name("id")).unwrap();
//! assert_eq!(element_path(id), "export.contract.id.");
//! assert_eq!(
//!     normalize(doc.root_element()).get("contract").and_then(|c| c.get("id")),
//!     Some(&NormalizedValue::from("7"))
//! );
//! ```
//!
//! # Architecture
//!
//! The harvester is organized into several modules:
//!
//! - [`config`]: Configuration constants and path classification
//! - [`error`]: Error types and Result alias
//! - [`listing`]: The listing capability the core is written against
//! - [`ftp`]: FTP implementation of that capability
//! - [`catalog`]: Catalog crawl, regions, document types and filtering
//! - [`fetch`]: Integrity-checked download and lazy archive members
//! - [`types`]: The normalized value type
//! - [`xml`]: Document normalization and element paths
//! - [`output`]: JSON Lines / YAML record output
//! - [`harvester`]: Pipeline from file paths to written records
//! - [`cli`]: Command-line interface

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ftp;
pub mod harvester;
pub mod listing;
pub mod output;
pub mod types;
pub mod xml;

// Re-export main entry points
pub use catalog::{Catalog, CrawlStart, DocumentTypes, FileFilter, FileList};
pub use fetch::{ArchiveFetcher, ArchiveReader, Integrity, IntegrityPolicy, Member};
pub use harvester::{harvest, HarvestReport};

// Re-export commonly used items
pub use error::{HarvesterError, Result};
pub use listing::Listing;
pub use types::NormalizedValue;
