//! Integrity-checked archive download and lazy member extraction.
//!
//! A download is compared against the size the catalog reports and
//! repeated a bounded number of times. The downloaded bytes live in a
//! spooled temp file owned by [`ArchiveReader`]; members borrow the reader,
//! so they cannot outlive the buffer backing them.

use std::io::{Read, Seek, SeekFrom};

use tempfile::SpooledTempFile;
use zip::ZipArchive;

use crate::config::{DEFAULT_RETRIES, SPOOL_MEMORY_LIMIT};
use crate::error::{HarvesterError, Result};
use crate::listing::Listing;

/// Outcome of the size check on a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integrity {
    /// An attempt matched the catalog size.
    Verified { attempts: u32 },
    /// No attempt matched; the last attempt's bytes were kept.
    UnverifiedExhausted {
        attempts: u32,
        expected: u64,
        received: u64,
    },
}

impl Integrity {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    /// Number of download attempts made.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Verified { attempts } | Self::UnverifiedExhausted { attempts, .. } => *attempts,
        }
    }
}

/// What to do when every attempt disagrees with the catalog size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntegrityPolicy {
    /// Open the last download anyway and report it as unverified.
    #[default]
    Proceed,
    /// Fail with [`HarvesterError::IntegrityExhausted`].
    Fail,
}

/// A finished download and its integrity outcome.
pub struct Download {
    buffer: SpooledTempFile,
    integrity: Integrity,
}

impl Download {
    pub fn integrity(&self) -> Integrity {
        self.integrity
    }

    /// Read the downloaded bytes back from the start of the buffer.
    #[cfg(test)]
    fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.buffer.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        self.buffer.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Downloads archives with bounded retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveFetcher {
    retries: u32,
    policy: IntegrityPolicy,
}

impl Default for ArchiveFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES)
    }
}

impl ArchiveFetcher {
    /// Fetcher making at most `retries` download attempts per archive.
    ///
    /// Zero still makes one attempt, since there is nothing to open otherwise.
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            policy: IntegrityPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: IntegrityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn policy(&self) -> IntegrityPolicy {
        self.policy
    }

    /// Download `path`, retrying while the byte count differs from the
    /// catalog's size. Each attempt writes into a fresh buffer.
    pub fn download<L: Listing + ?Sized>(&self, listing: &mut L, path: &str) -> Result<Download> {
        let expected = listing.size(path)?;
        let max_attempts = self.retries.max(1);

        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut buffer = tempfile::spooled_tempfile(SPOOL_MEMORY_LIMIT);
            listing.retrieve(path, &mut buffer)?;
            let received = buffer.stream_position()?;

            if received == expected {
                tracing::debug!(path, attempts, bytes = received, "Download verified");
                return Ok(Download {
                    buffer,
                    integrity: Integrity::Verified { attempts },
                });
            }

            tracing::warn!(
                path,
                attempt = attempts,
                max_attempts,
                expected,
                received,
                "Download size mismatch"
            );

            if attempts >= max_attempts {
                return Ok(Download {
                    buffer,
                    integrity: Integrity::UnverifiedExhausted {
                        attempts,
                        expected,
                        received,
                    },
                });
            }
        }
    }

    /// Download `path` and open it as a zip archive.
    pub fn fetch<L: Listing + ?Sized>(&self, listing: &mut L, path: &str) -> Result<ArchiveReader> {
        let download = self.download(listing, path)?;

        if let Integrity::UnverifiedExhausted {
            attempts,
            expected,
            received,
        } = download.integrity
        {
            match self.policy {
                IntegrityPolicy::Fail => {
                    return Err(HarvesterError::IntegrityExhausted {
                        path: path.to_string(),
                        attempts,
                        expected,
                        received,
                    });
                }
                IntegrityPolicy::Proceed => {
                    tracing::warn!(
                        path,
                        attempts,
                        "Retries exhausted, opening unverified download"
                    );
                }
            }
        }

        ArchiveReader::open(path, download)
    }
}

/// One archive entry exposed as a read-once byte stream.
pub struct Member<'a> {
    name: String,
    size: u64,
    reader: Box<dyn Read + 'a>,
}

impl Member<'_> {
    /// Entry name inside the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uncompressed size recorded in the archive.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the whole member into memory.
    pub fn read_all(mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(usize::try_from(self.size).unwrap_or_default());
        self.reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Read for Member<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

/// An opened archive yielding its file members in order.
///
/// Dropping the reader releases the spooled buffer.
pub struct ArchiveReader {
    path: String,
    archive: ZipArchive<SpooledTempFile>,
    integrity: Integrity,
    index: usize,
}

impl ArchiveReader {
    fn open(path: &str, download: Download) -> Result<Self> {
        let Download {
            mut buffer,
            integrity,
        } = download;
        buffer.seek(SeekFrom::Start(0))?;

        let archive = ZipArchive::new(buffer).map_err(|source| HarvesterError::MalformedArchive {
            path: path.to_string(),
            source,
        })?;
        tracing::debug!(path, entries = archive.len(), "Opened archive");

        Ok(Self {
            path: path.to_string(),
            archive,
            integrity,
            index: 0,
        })
    }

    /// Remote path the archive was downloaded from.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn integrity(&self) -> Integrity {
        self.integrity
    }

    /// Number of entries in the archive, directories included.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Next file member, skipping directory entries.
    pub fn next_member(&mut self) -> Option<Result<Member<'_>>> {
        // Locate the next file entry before borrowing it for the caller
        let mut found = None;
        while self.index < self.archive.len() {
            let index = self.index;
            self.index += 1;
            match self.archive.by_index_raw(index) {
                Ok(entry) if entry.is_dir() => continue,
                Ok(_) => {
                    found = Some(index);
                    break;
                }
                Err(e) => return Some(Err(e.into())),
            }
        }

        let index = found?;
        Some(
            self.archive
                .by_index(index)
                .map(|entry| Member {
                    name: entry.name().to_string(),
                    size: entry.size(),
                    reader: Box::new(entry),
                })
                .map_err(HarvesterError::from),
        )
    }

    /// Call `f` with every file member in order, stopping at the first error.
    pub fn for_each_member<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(Member<'_>) -> Result<()>,
    {
        while let Some(member) = self.next_member() {
            f(member?)?;
        }
        Ok(())
    }
}
