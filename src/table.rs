use std::io::{BufRead, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Columns the annotate stage needs from its input table.
pub const REQUIRED_COLUMNS: [&str; 4] = ["chrom", "pos", "ref", "alt"];

/// `File` and `Stdout` are the two places a table can go.
pub enum EitherWriter {
    File(std::io::BufWriter<std::fs::File>),
    Stdout(std::io::BufWriter<std::io::Stdout>),
}

impl EitherWriter {
    /// `-` is stdout. Otherwise missing parent directories are created.
    pub fn create(path: &Path) -> Result<Self> {
        if path.as_os_str() == "-" {
            return Ok(EitherWriter::Stdout(std::io::BufWriter::new(
                std::io::stdout(),
            )));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        Ok(EitherWriter::File(std::io::BufWriter::new(file)))
    }
}

impl Write for EitherWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            EitherWriter::File(ref mut f) => f.write(buf),
            EitherWriter::Stdout(ref mut f) => f.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            EitherWriter::File(ref mut f) => f.flush(),
            EitherWriter::Stdout(ref mut f) => f.flush(),
        }
    }
}

/// Write a header and rows as tab-separated lines. Returns the number of rows.
pub fn write_table<W, H, R, F>(out: &mut W, header: &[H], rows: R) -> Result<usize>
where
    W: Write,
    H: AsRef<str>,
    R: IntoIterator<Item = F>,
    F: IntoIterator,
    F::Item: AsRef<str>,
{
    write_line(out, header.iter())?;
    let mut n = 0;
    for row in rows {
        write_line(out, row.into_iter())?;
        n += 1;
    }
    out.flush()?;
    Ok(n)
}

fn write_line<W: Write, S: AsRef<str>>(out: &mut W, fields: impl Iterator<Item = S>) -> Result<()> {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.write_all(b"\t")?;
        }
        out.write_all(field.as_ref().as_bytes())?;
    }
    out.write_all(b"\n")?;
    Ok(())
}

/// Open `path` for reading; `-` is stdin.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(std::io::stdin().lock()));
    }
    let file = std::fs::File::open(path)?;
    Ok(Box::new(std::io::BufReader::new(file)))
}

/// Read one line without its `\n` / `\r\n`. Bytes that are not UTF-8 are
/// replaced with U+FFFD rather than failing. `None` at end of input.
pub fn read_line_lossy<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// A tab-separated table read fully into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Read a table with a header line. Rows shorter than the header are
    /// padded with empty fields; blank lines are ignored.
    pub fn read<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut buf = vec![];
        let header: Vec<String> = match read_line_lossy(&mut reader, &mut buf)? {
            Some(line) => line.split('\t').map(|s| s.to_string()).collect(),
            None => return Err(Error::Validation("table is empty: no header row".to_string())),
        };
        let mut rows = vec![];
        while let Some(line) = read_line_lossy(&mut reader, &mut buf)? {
            if line.is_empty() {
                continue;
            }
            let mut row: Vec<String> = line.split('\t').map(|s| s.to_string()).collect();
            if row.len() < header.len() {
                row.resize(header.len(), String::new());
            }
            rows.push(row);
        }
        Ok(Table { header, rows })
    }

    /// Read from `path`, or stdin for `-`.
    pub fn from_path(path: &Path) -> Result<Self> {
        Table::read(open_input(path)?)
    }

    /// Index of `name` in the header.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::Validation(format!("Missing required column in TSV: {}", name)))
    }
}
