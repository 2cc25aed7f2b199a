//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Write};

use zakupki_harvester::{HarvesterError, Listing, Result};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// In-memory catalog: a folder tree plus file contents.
#[derive(Default)]
pub struct FakeCatalog {
    folders: BTreeMap<String, Vec<String>>,
    files: HashMap<String, Vec<u8>>,
    pub listed: Vec<String>,
    pub retrievals: Vec<String>,
}

impl FakeCatalog {
    /// Register a folder listing.
    pub fn folder(mut self, path: &str, entries: &[&str]) -> Self {
        self.folders.insert(
            path.to_string(),
            entries.iter().map(|e| e.to_string()).collect(),
        );
        self
    }

    /// Register a downloadable file.
    pub fn file(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), bytes);
        self
    }
}

impl Listing for FakeCatalog {
    fn list(&mut self, path: &str) -> Result<Vec<String>> {
        self.listed.push(path.to_string());
        self.folders
            .get(path)
            .cloned()
            .ok_or_else(|| HarvesterError::transport("list", path, "550 No such directory"))
    }

    fn size(&mut self, path: &str) -> Result<u64> {
        self.files
            .get(path)
            .map(|bytes| bytes.len() as u64)
            .ok_or_else(|| HarvesterError::transport("size", path, "550 No such file"))
    }

    fn retrieve(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64> {
        let bytes = self
            .files
            .get(path)
            .ok_or_else(|| HarvesterError::transport("retrieve", path, "550 No such file"))?;
        self.retrievals.push(path.to_string());
        sink.write_all(bytes)?;
        Ok(bytes.len() as u64)
    }
}

/// Build a zip archive from `(name, content)` pairs.
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer
            .write_all(content.as_bytes())
            .expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Load a fixture file from `tests/fixtures`.
pub fn load_fixture(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

pub const MOSKVA_CONTRACTS: &str =
    "Moskva/contracts/contract_Moskva_2019010100_2019020100_001.xml.zip";
pub const MOSKVA_CONTRACTS_CURRENT: &str =
    "Moskva/contracts/currMonth/contract_Moskva_2019020100_2019020200_001.xml.zip";
pub const MOSKVA_NOTIFICATIONS: &str =
    "Moskva/notifications/notification_Moskva_2019010100_2019020100_001.xml.zip";
pub const TVER_CONTRACTS: &str =
    "Tverskaja_obl/contracts/contract_Tverskaja_obl_2019010100_2019020100_001.xml.zip";

/// A two-region catalog with contracts and notifications.
///
/// The `Moskva` folder lists itself, like some servers do.
pub fn sample_catalog() -> FakeCatalog {
    let contract = load_fixture("contract.xml");

    FakeCatalog::default()
        .folder("", &["Moskva", "Tverskaja_obl", "_logs"])
        .folder(
            "Moskva",
            &["Moskva/contracts", "Moskva/notifications", "Moskva"],
        )
        .folder(
            "Moskva/contracts",
            &["Moskva/contracts/currMonth", MOSKVA_CONTRACTS],
        )
        .folder("Moskva/contracts/currMonth", &[MOSKVA_CONTRACTS_CURRENT])
        .folder("Moskva/notifications", &[MOSKVA_NOTIFICATIONS])
        .folder("Tverskaja_obl", &["Tverskaja_obl/contracts"])
        .folder("Tverskaja_obl/contracts", &[TVER_CONTRACTS])
        .folder("_logs", &["_logs/ftp.log"])
        .file(
            MOSKVA_CONTRACTS,
            zip_archive(&[
                ("contract_0173100000119000001_1.xml", &contract),
                (
                    "contract_0173100000119000002_1.xml",
                    "<export><contract><regNum>2</regNum></contract></export>",
                ),
            ]),
        )
        .file(
            MOSKVA_CONTRACTS_CURRENT,
            zip_archive(&[(
                "contract_0173100000119000003_1.xml",
                "<export><contract><regNum>3</regNum></contract></export>",
            )]),
        )
        .file(
            MOSKVA_NOTIFICATIONS,
            zip_archive(&[(
                "notification_1.xml",
                "<export><notification><purchaseNumber>9</purchaseNumber></notification></export>",
            )]),
        )
        .file(
            TVER_CONTRACTS,
            zip_archive(&[(
                "contract_0136200003619000001_1.xml",
                "<export><contract><regNum>4</regNum></contract></export>",
            )]),
        )
}
