use log::{debug, warn};
use rust_htslib::bcf::{self, Read};
use std::io::BufRead;
use std::path::Path;

use crate::error::Result;
use crate::table::{open_input, read_line_lossy};
use crate::variant::VariantRecord;

/// Records from an htslib reader (VCF, bgzipped VCF or BCF).
pub struct BcfRecords {
    reader: bcf::Reader,
}

impl BcfRecords {
    /// Open `path`, or stdin for `-` / `stdin`.
    pub fn from_path(path: &str) -> Result<Self> {
        let mut reader = match path {
            "-" | "stdin" => bcf::Reader::from_stdin()?,
            _ => bcf::Reader::from_path(path)?,
        };
        _ = reader.set_threads(2);
        Ok(BcfRecords { reader })
    }
}

impl Iterator for BcfRecords {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = self.reader.empty_record();
        match self.reader.read(&mut record) {
            Some(Ok(_)) => Some(VariantRecord::from_bcf(&record)),
            Some(Err(e)) => Some(Err(e.into())),
            None => None,
        }
    }
}

/// Records from raw VCF text, without htslib. Header lines and data lines
/// with fewer than 8 columns are skipped. Bytes that are not UTF-8 are
/// replaced, not rejected.
pub struct TextRecords<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
    skipped: usize,
}

impl<R: BufRead> TextRecords<R> {
    pub fn new(reader: R) -> Self {
        TextRecords {
            reader,
            buf: vec![],
            line_number: 0,
            skipped: 0,
        }
    }

    /// Data lines dropped for having too few columns.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl TextRecords<Box<dyn BufRead>> {
    /// Open `path`, or stdin for `-`.
    pub fn from_path(path: &str) -> Result<Self> {
        Ok(TextRecords::new(open_input(Path::new(path))?))
    }
}

impl<R: BufRead> Iterator for TextRecords<R> {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match read_line_lossy(&mut self.reader, &mut self.buf) {
                Ok(Some(l)) => l,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            };
            self.line_number += 1;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match VariantRecord::from_text(&line) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {
                    self.skipped += 1;
                    debug!("skipping short line {}: {}", self.line_number, line);
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<R> Drop for TextRecords<R> {
    fn drop(&mut self) {
        if self.skipped > 0 {
            warn!(
                "skipped {} line(s) with fewer than 8 columns",
                self.skipped
            );
        }
    }
}

/// Either record source, chosen at runtime.
pub enum EitherRecords {
    Bcf(BcfRecords),
    Text(TextRecords<Box<dyn BufRead>>),
}

impl EitherRecords {
    pub fn open(path: &str, text: bool) -> Result<Self> {
        Ok(if text {
            EitherRecords::Text(TextRecords::from_path(path)?)
        } else {
            EitherRecords::Bcf(BcfRecords::from_path(path)?)
        })
    }
}

impl Iterator for EitherRecords {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            EitherRecords::Bcf(r) => r.next(),
            EitherRecords::Text(r) => r.next(),
        }
    }
}
