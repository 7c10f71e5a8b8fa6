//! Positional lookups against a tabix-indexed reference VCF.
//!
//! Every backend answers the same question: which raw lines of `file`
//! overlap the single base `chrom:pos-pos`? No answers are cached; two
//! identical queries hit the backend twice.
//!
//! * [`TabixCommand`] runs the `tabix` program as a subprocess.
//! * [`HtslibTabix`] reads the index in-process with rust-htslib.
//! * [`InMemoryIndex`] serves lines from memory, for tests and embedding.

use log::debug;
use rust_htslib::tbx::{self, Read};
use rustc_hash::FxHashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};
use crate::variant::MIN_VCF_FIELDS;

/// Region string for a single 1-based position.
pub fn region(chrom: &str, pos: u64) -> String {
    format!("{}:{}-{}", chrom, pos, pos)
}

fn has_vcf_fields(line: &str) -> bool {
    line.split('\t').count() >= MIN_VCF_FIELDS
}

pub trait RegionIndexQuery {
    /// Lines of `file` overlapping `chrom:pos-pos`. An empty result means
    /// nothing is there; an error means the backend itself is unusable.
    fn query(&mut self, file: &Path, chrom: &str, pos: u64) -> Result<Vec<String>>;
}

impl<Q: RegionIndexQuery + ?Sized> RegionIndexQuery for &mut Q {
    fn query(&mut self, file: &Path, chrom: &str, pos: u64) -> Result<Vec<String>> {
        (**self).query(file, chrom, pos)
    }
}

impl<Q: RegionIndexQuery + ?Sized> RegionIndexQuery for Box<Q> {
    fn query(&mut self, file: &Path, chrom: &str, pos: u64) -> Result<Vec<String>> {
        (**self).query(file, chrom, pos)
    }
}

/// Runs `<program> <file> <region>` and reads matching lines from stdout.
#[derive(Debug, Clone)]
pub struct TabixCommand {
    program: PathBuf,
}

impl Default for TabixCommand {
    fn default() -> Self {
        TabixCommand {
            program: PathBuf::from("tabix"),
        }
    }
}

impl TabixCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        TabixCommand {
            program: program.into(),
        }
    }
}

impl RegionIndexQuery for TabixCommand {
    fn query(&mut self, file: &Path, chrom: &str, pos: u64) -> Result<Vec<String>> {
        let region = region(chrom, pos);
        let output = Command::new(&self.program)
            .arg(file)
            .arg(&region)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::Configuration(format!(
                    "{} not found. Install htslib tools (tabix/bgzip).",
                    self.program.display()
                )),
                _ => Error::Io(e),
            })?;

        if !output.status.success() {
            debug!("{} exited with {} for {}", self.program.display(), output.status, region);
            return Ok(vec![]);
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|l| has_vcf_fields(l))
            .map(|l| l.to_string())
            .collect())
    }
}

/// Queries the `.tbi` index in-process. The reader for the most recently
/// queried file is kept open between calls.
#[derive(Default)]
pub struct HtslibTabix {
    reader: Option<(PathBuf, tbx::Reader)>,
}

impl HtslibTabix {
    pub fn new() -> Self {
        Self::default()
    }

    fn reader(&mut self, file: &Path) -> Result<&mut tbx::Reader> {
        let reader = match self.reader.take() {
            Some((p, reader)) if p == file => reader,
            _ => tbx::Reader::from_path(file).map_err(|e| {
                Error::Configuration(format!(
                    "cannot open tabix index for {}: {}",
                    file.display(),
                    e
                ))
            })?,
        };
        Ok(&mut self.reader.insert((file.to_path_buf(), reader)).1)
    }
}

impl RegionIndexQuery for HtslibTabix {
    fn query(&mut self, file: &Path, chrom: &str, pos: u64) -> Result<Vec<String>> {
        if pos == 0 {
            return Ok(vec![]);
        }
        let reader = self.reader(file)?;
        let tid = match reader.tid(chrom) {
            Ok(tid) => tid,
            Err(_) => {
                debug!("{} not in index of {}", chrom, file.display());
                return Ok(vec![]);
            }
        };
        // tbx coordinates are 0-based, half-open
        reader.fetch(tid, pos - 1, pos)?;
        let mut lines = vec![];
        for rec in reader.records() {
            let line = String::from_utf8_lossy(&rec?).to_string();
            if has_vcf_fields(&line) {
                lines.push(line);
            }
        }
        Ok(lines)
    }
}

/// Reference lines held in memory, keyed by chromosome. A line is returned
/// for a position inside `[POS, POS + len(REF) - 1]`, as tabix does for VCF.
#[derive(Debug, Default, Clone)]
pub struct InMemoryIndex {
    lines: FxHashMap<String, Vec<(u64, u64, String)>>,
    queries: usize,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one VCF data line. Header lines and lines without a numeric
    /// POS are ignored.
    pub fn push(&mut self, line: &str) {
        if line.starts_with('#') {
            return;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return;
        }
        let Ok(start) = fields[1].parse::<u64>() else {
            return;
        };
        let ref_len = fields.get(3).map(|r| r.len().max(1) as u64).unwrap_or(1);
        self.lines
            .entry(fields[0].to_string())
            .or_default()
            .push((start, start + ref_len - 1, line.to_string()));
    }

    /// Number of queries answered so far.
    pub fn queries(&self) -> usize {
        self.queries
    }
}

impl<S: AsRef<str>> FromIterator<S> for InMemoryIndex {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut index = InMemoryIndex::new();
        for line in iter {
            index.push(line.as_ref());
        }
        index
    }
}

impl RegionIndexQuery for InMemoryIndex {
    fn query(&mut self, _file: &Path, chrom: &str, pos: u64) -> Result<Vec<String>> {
        self.queries += 1;
        Ok(self
            .lines
            .get(chrom)
            .map(|lines| {
                lines
                    .iter()
                    .filter(|(start, end, line)| {
                        *start <= pos && pos <= *end && has_vcf_fields(line)
                    })
                    .map(|(_, _, line)| line.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}
