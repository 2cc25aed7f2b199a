//! Record output for normalized documents.

use std::io::Write;

use clap::ValueEnum;

use crate::error::Result;
use crate::types::NormalizedValue;

/// Serialization of the record stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One compact JSON object per line.
    #[default]
    Json,
    /// YAML documents separated by `---`.
    Yaml,
}

/// Writes one record per normalized document.
pub struct RecordWriter<W: Write> {
    inner: W,
    format: OutputFormat,
    records: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W, format: OutputFormat) -> Self {
        Self {
            inner,
            format,
            records: 0,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Records written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Append one record.
    pub fn write(&mut self, value: &NormalizedValue) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.inner, value)?;
                self.inner.write_all(b"\n")?;
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml_ng::to_string(value)?;
                self.inner.write_all(b"---\n")?;
                self.inner.write_all(yaml.as_bytes())?;
                if !yaml.ends_with('\n') {
                    self.inner.write_all(b"\n")?;
                }
            }
        }
        self.records += 1;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
