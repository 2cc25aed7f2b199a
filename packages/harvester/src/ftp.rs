//! FTP session implementing the listing capability.

use std::io::{self, Write};

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};

use crate::config::{
    DEFAULT_BASE_DIR, DEFAULT_FTP_HOST, DEFAULT_FTP_PASSWORD, DEFAULT_FTP_PORT, DEFAULT_FTP_USER,
};
use crate::error::{HarvesterError, Result};
use crate::listing::Listing;

/// Connection settings for the catalog server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Directory to change into after login. Empty keeps the login directory.
    pub base_dir: String,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FTP_HOST.to_string(),
            port: DEFAULT_FTP_PORT,
            user: DEFAULT_FTP_USER.to_string(),
            password: DEFAULT_FTP_PASSWORD.to_string(),
            base_dir: DEFAULT_BASE_DIR.to_string(),
        }
    }
}

impl FtpConfig {
    /// `host:port` address of the control connection.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A logged-in FTP session in binary transfer mode.
pub struct FtpListing {
    stream: FtpStream,
}

impl FtpListing {
    /// Connect, log in, switch to binary mode and enter the base directory.
    pub fn connect(config: &FtpConfig) -> Result<Self> {
        let address = config.address();
        tracing::debug!(%address, user = %config.user, "Connecting to catalog");

        let mut stream = FtpStream::connect(address.as_str())
            .map_err(|e| HarvesterError::transport("connect", &address, e))?;
        stream
            .login(config.user.as_str(), config.password.as_str())
            .map_err(|e| HarvesterError::transport("login", &address, e))?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| HarvesterError::transport("binary mode", &address, e))?;

        if !config.base_dir.is_empty() {
            stream
                .cwd(config.base_dir.as_str())
                .map_err(|e| HarvesterError::transport("cwd", &config.base_dir, e))?;
        }

        tracing::info!(%address, base_dir = %config.base_dir, "Connected to catalog");
        Ok(Self { stream })
    }
}

impl Listing for FtpListing {
    fn list(&mut self, path: &str) -> Result<Vec<String>> {
        let pathname = (!path.is_empty()).then_some(path);
        self.stream
            .nlst(pathname)
            .map_err(|e| HarvesterError::transport("list", path, e))
    }

    fn size(&mut self, path: &str) -> Result<u64> {
        self.stream
            .size(path)
            .map(|size| size as u64)
            .map_err(|e| HarvesterError::transport("size", path, e))
    }

    fn retrieve(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64> {
        self.stream
            .retr(path, |reader| {
                io::copy(reader, &mut *sink).map_err(FtpError::ConnectionError)
            })
            .map_err(|e| HarvesterError::transport("retrieve", path, e))
    }
}

impl Drop for FtpListing {
    fn drop(&mut self) {
        if let Err(e) = self.stream.quit() {
            tracing::debug!(error = %e, "Catalog session did not close cleanly");
        }
    }
}
