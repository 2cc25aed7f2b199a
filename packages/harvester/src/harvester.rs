//! Harvest pipeline that ties all components together.

use std::io::Write;

use crate::error::{HarvesterError, Result};
use crate::fetch::{ArchiveFetcher, Integrity};
use crate::listing::Listing;
use crate::output::RecordWriter;
use crate::xml::{decode_document, normalize_document};

/// Summary of one harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    /// Archives downloaded and opened.
    pub archives: usize,
    /// File members read out of those archives.
    pub members: usize,
    /// Documents normalized and written.
    pub documents: usize,
    /// Archives whose download never matched the catalog size.
    pub unverified: Vec<String>,
    /// Non-fatal problems, such as members that are not well-formed XML.
    pub warnings: Vec<String>,
}

/// Progress notifications emitted while harvesting.
pub trait HarvestObserver {
    /// An archive is about to be fetched.
    fn archive_started(&mut self, _path: &str, _index: usize) {}

    /// A document was written.
    fn document_written(&mut self, _archive: &str, _member: &str) {}
}

/// Observer that ignores every notification.
pub struct NoProgress;

impl HarvestObserver for NoProgress {}

/// Fetch every archive in `paths` and write one record per XML member.
///
/// Transport and archive errors abort the run. Members that fail to parse
/// are skipped and recorded in [`HarvestReport::warnings`].
pub fn harvest<'p, L, W, I>(
    listing: &mut L,
    fetcher: &ArchiveFetcher,
    paths: I,
    writer: &mut RecordWriter<W>,
) -> Result<HarvestReport>
where
    L: Listing + ?Sized,
    W: Write,
    I: IntoIterator<Item = &'p str>,
{
    harvest_with_observer(listing, fetcher, paths, writer, &mut NoProgress)
}

/// [`harvest`] with progress notifications.
pub fn harvest_with_observer<'p, L, W, I, O>(
    listing: &mut L,
    fetcher: &ArchiveFetcher,
    paths: I,
    writer: &mut RecordWriter<W>,
    observer: &mut O,
) -> Result<HarvestReport>
where
    L: Listing + ?Sized,
    W: Write,
    I: IntoIterator<Item = &'p str>,
    O: HarvestObserver + ?Sized,
{
    let mut report = HarvestReport::default();

    for (index, path) in paths.into_iter().enumerate() {
        observer.archive_started(path, index);
        let mut archive = fetcher.fetch(listing, path)?;
        report.archives += 1;

        if let Integrity::UnverifiedExhausted { .. } = archive.integrity() {
            report.unverified.push(path.to_string());
        }

        archive.for_each_member(|member| {
            report.members += 1;
            let name = member.name().to_string();
            let context = format!("{path}!{name}");
            let bytes = member.read_all()?;
            let xml = decode_document(&bytes, &context);

            match normalize_document(&xml, &context) {
                Ok(value) => {
                    writer.write(&value)?;
                    report.documents += 1;
                    observer.document_written(path, &name);
                }
                Err(HarvesterError::XmlParse { context, source }) => {
                    tracing::warn!(%context, error = %source, "Skipping malformed document");
                    report.warnings.push(format!("{context}: {source}"));
                }
                Err(e) => return Err(e),
            }
            Ok(())
        })?;

        tracing::debug!(path, documents = report.documents, "Archive harvested");
    }

    tracing::info!(
        archives = report.archives,
        members = report.members,
        documents = report.documents,
        unverified = report.unverified.len(),
        "Harvest finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::*;
    use crate::output::OutputFormat;

    struct ArchiveServer {
        files: HashMap<String, Vec<u8>>,
    }

    impl Listing for ArchiveServer {
        fn list(&mut self, _path: &str) -> Result<Vec<String>> {
            Ok(self.files.keys().cloned().collect())
        }

        fn size(&mut self, path: &str) -> Result<u64> {
            self.files
                .get(path)
                .map(|b| b.len() as u64)
                .ok_or_else(|| HarvesterError::transport("size", path, "550 not found"))
        }

        fn retrieve(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64> {
            let bytes = self
                .files
                .get(path)
                .ok_or_else(|| HarvesterError::transport("retrieve", path, "550 not found"))?;
            sink.write_all(bytes)?;
            Ok(bytes.len() as u64)
        }
    }

    fn zip_bytes<C: AsRef<[u8]>>(entries: &[(&str, C)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_ref()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl HarvestObserver for Recorder {
        fn archive_started(&mut self, path: &str, index: usize) {
            self.events.push(format!("start {index} {path}"));
        }

        fn document_written(&mut self, archive: &str, member: &str) {
            self.events.push(format!("doc {archive} {member}"));
        }
    }

    #[test]
    fn test_harvest_writes_one_record_per_document() {
        let mut server = ArchiveServer {
            files: HashMap::from([
                (
                    "r/contract_1.zip".to_string(),
                    zip_bytes(&[
                        ("c1.xml", "<contract><id>1</id></contract>"),
                        ("c2.xml", "<contract><id>2</id></contract>"),
                    ]),
                ),
                (
                    "r/contract_2.zip".to_string(),
                    zip_bytes(&[("c3.xml", "<contract><id>3</id></contract>")]),
                ),
            ]),
        };
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Json);
        let mut recorder = Recorder::default();

        let report = harvest_with_observer(
            &mut server,
            &ArchiveFetcher::default(),
            ["r/contract_1.zip", "r/contract_2.zip"],
            &mut writer,
            &mut recorder,
        )
        .unwrap();

        assert_eq!(report.archives, 2);
        assert_eq!(report.members, 3);
        assert_eq!(report.documents, 3);
        assert!(report.unverified.is_empty());
        assert!(report.warnings.is_empty());

        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(out, "{\"id\":\"1\"}\n{\"id\":\"2\"}\n{\"id\":\"3\"}\n");
        assert_eq!(
            recorder.events,
            vec![
                "start 0 r/contract_1.zip",
                "doc r/contract_1.zip c1.xml",
                "doc r/contract_1.zip c2.xml",
                "start 1 r/contract_2.zip",
                "doc r/contract_2.zip c3.xml",
            ]
        );
    }

    #[test]
    fn test_harvest_skips_malformed_documents() {
        let mut server = ArchiveServer {
            files: HashMap::from([(
                "r/a_1.zip".to_string(),
                zip_bytes(&[("bad.xml", "<open>"), ("good.xml", "<ok>yes</ok>")]),
            )]),
        };
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Json);

        let report = harvest(
            &mut server,
            &ArchiveFetcher::default(),
            ["r/a_1.zip"],
            &mut writer,
        )
        .unwrap();

        assert_eq!(report.members, 2);
        assert_eq!(report.documents, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("r/a_1.zip!bad.xml: "));
        assert_eq!(String::from_utf8(writer.finish().unwrap()).unwrap(), "\"yes\"\n");
    }

    #[test]
    fn test_harvest_decodes_declared_encoding() {
        let (cp1251, _, _) = encoding_rs::WINDOWS_1251.encode(
            r#"<?xml version="1.0" encoding="windows-1251"?><contract><city>Тверь</city></contract>"#,
        );
        let mut server = ArchiveServer {
            files: HashMap::from([(
                "r/contract_1.zip".to_string(),
                zip_bytes(&[("c1.xml", &*cp1251)]),
            )]),
        };
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Json);

        let report = harvest(
            &mut server,
            &ArchiveFetcher::default(),
            ["r/contract_1.zip"],
            &mut writer,
        )
        .unwrap();

        assert_eq!(report.documents, 1);
        assert_eq!(
            String::from_utf8(writer.finish().unwrap()).unwrap(),
            "{\"city\":\"Тверь\"}\n"
        );
    }

    #[test]
    fn test_harvest_propagates_missing_archive() {
        let mut server = ArchiveServer {
            files: HashMap::new(),
        };
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Json);

        let err = harvest(
            &mut server,
            &ArchiveFetcher::default(),
            ["r/gone.zip"],
            &mut writer,
        )
        .err();
        assert!(matches!(err, Some(HarvesterError::Transport { .. })));
    }
}
