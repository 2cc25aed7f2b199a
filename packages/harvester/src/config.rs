//! Configuration constants and path classification for the harvester.

use regex::{bytes, Regex};
use std::sync::LazyLock;

/// Host of the public procurement FTP catalog.
pub const DEFAULT_FTP_HOST: &str = "ftp.zakupki.gov.ru";

/// FTP control port.
pub const DEFAULT_FTP_PORT: u16 = 21;

/// Shared anonymous account published by the catalog operator.
pub const DEFAULT_FTP_USER: &str = "free";

/// Password of the shared account.
pub const DEFAULT_FTP_PASSWORD: &str = "free";

/// Directory the session changes into after login; regions live below it.
pub const DEFAULT_BASE_DIR: &str = "fcs_regions";

/// Default number of download attempts per archive.
pub const DEFAULT_RETRIES: u32 = 3;

/// Archives up to this size stay in memory; larger ones spill to a temp file.
pub const SPOOL_MEMORY_LIMIT: usize = 16 * 1024 * 1024;

/// Leaf text longer than this many characters is replaced by [`TRUNCATED_TEXT`].
pub const MAX_LEAF_TEXT_CHARS: usize = 512;

/// Placeholder stored instead of over-long leaf text.
pub const TRUNCATED_TEXT: &str = "...";

/// Separator used when building element paths.
pub const ELEMENT_PATH_SEPARATOR: char = '.';

/// Final segment shaped like `name.ext` with an extension of at most four
/// word characters. A bare trailing dot also counts.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FILE_LIKE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*\.\w{0,4}$").expect("valid regex"));

/// Document type code: leading word characters up to the first underscore.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DOCUMENT_TYPE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+?)_[^/]+$").expect("valid regex"));

/// Encoding label of a leading `<?xml ... encoding="..."?>` declaration.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static XML_ENCODING_PATTERN: LazyLock<bytes::Regex> = LazyLock::new(|| {
    bytes::Regex::new(r#"^\s*<\?xml\s[^>]*?\bencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
        .expect("valid regex")
});

/// Final slash-separated segment of a remote path.
///
/// # Examples
/// ```
/// use zakupki_harvester::config::final_segment;
///
/// assert_eq!(final_segment("moskva/contracts/a.zip"), "a.zip");
/// assert_eq!(final_segment("moskva"), "moskva");
/// ```
pub fn final_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Classify a listing entry as file-like by the shape of its final segment.
///
/// This is a heuristic, not an extension check: `"notice."` is file-like
/// and `"app.config"` (five characters after the dot) is folder-like.
///
/// # Examples
/// ```
/// use zakupki_harvester::config::is_file_like;
///
/// assert!(is_file_like("moskva/contracts/contract_1.xml.zip"));
/// assert!(!is_file_like("2019/region"));
/// assert!(!is_file_like("moskva/app.config"));
/// ```
pub fn is_file_like(path: &str) -> bool {
    FILE_LIKE_PATTERN.is_match(final_segment(path))
}

/// Extract the document type code from a file path.
///
/// Returns `None` when the final segment has no underscore preceded by
/// word characters.
///
/// # Examples
/// ```
/// use zakupki_harvester::config::document_type_code;
///
/// assert_eq!(
///     document_type_code("moskva/notifications/notification_Moskva_2019.xml.zip"),
///     Some("notification")
/// );
/// assert_eq!(document_type_code("moskva/readme.txt"), None);
/// ```
pub fn document_type_code(path: &str) -> Option<&str> {
    DOCUMENT_TYPE_PATTERN
        .captures(final_segment(path))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Encoding label declared in the XML prolog of raw document bytes.
///
/// Only a declaration readable as ASCII is recognised, which covers UTF-8
/// and the single-byte code pages the catalog uses.
///
/// # Examples
/// ```
/// use zakupki_harvester::config::declared_encoding;
///
/// assert_eq!(
///     declared_encoding(br#"<?xml version="1.0" encoding="windows-1251"?><r/>"#),
///     Some("windows-1251")
/// );
/// assert_eq!(declared_encoding(b"<r/>"), None);
/// ```
pub fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    XML_ENCODING_PATTERN
        .captures(bytes)
        .and_then(|caps| caps.get(1))
        .and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
}

/// Whether a root listing entry names a region (service folders start with `_`).
pub fn is_region_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('_')
}
