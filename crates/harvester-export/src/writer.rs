use anyhow::bail;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CsvWriterConfig {
    #[serde(default = "default_csv_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub escape: Option<char>,
    #[serde(default = "default_csv_terminator")]
    pub terminator: CsvTerminator,
}

impl Default for CsvWriterConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            escape: None,
            terminator: CsvTerminator::Any('\n'),
        }
    }
}

fn default_csv_delimiter() -> char {
    CsvWriterConfig::default().delimiter
}

fn default_csv_terminator() -> CsvTerminator {
    CsvWriterConfig::default().terminator
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CsvTerminator {
    CRLF,
    Any(char),
}

impl TryFrom<CsvTerminator> for csv::Terminator {
    type Error = anyhow::Error;

    fn try_from(source: CsvTerminator) -> Result<Self, Self::Error> {
        match source {
            CsvTerminator::CRLF => Ok(Self::CRLF),
            CsvTerminator::Any(c) => Ok(Self::Any(ascii_byte("terminator", c)?)),
        }
    }
}

impl TryFrom<&CsvWriterConfig> for csv::WriterBuilder {
    type Error = anyhow::Error;

    fn try_from(c: &CsvWriterConfig) -> Result<Self, Self::Error> {
        let mut builder = csv::WriterBuilder::new();
        builder.delimiter(ascii_byte("delimiter", c.delimiter)?);
        builder.terminator(c.terminator.try_into()?);
        if let Some(escape) = c.escape {
            builder.double_quote(false);
            builder.escape(ascii_byte("escape", escape)?);
        } else {
            builder.double_quote(true);
        }
        Ok(builder)
    }
}

/// The csv writer works on single bytes
fn ascii_byte(setting: &str, c: char) -> anyhow::Result<u8> {
    if !c.is_ascii() {
        bail!("CSV {setting} {c:?} is not an ASCII character");
    }
    Ok(c as u8)
}

/// How the export file is opened when one with the same name exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileMode {
    /// Replace the existing file
    #[default]
    Truncate,
    /// Fail instead of overwriting
    CreateNew,
    /// Add rows after the existing content
    Append,
}

impl From<FileMode> for fs_err::OpenOptions {
    fn from(mode: FileMode) -> Self {
        let mut opts = fs_err::OpenOptions::new();
        match mode {
            FileMode::Truncate => opts.write(true).create(true).truncate(true),
            FileMode::CreateNew => opts.write(true).create_new(true),
            FileMode::Append => opts.append(true).create(true),
        };
        opts
    }
}
