use log::{debug, log_enabled, Level};
use rust_htslib::bcf::{self, header::TagLength, header::TagType, record::Numeric};
use std::fmt;

use crate::error::{Error, Result};
use crate::info::{Info, InfoField, InfoValue};

/// Filter value written when a record has no filter, an empty one, or `.`.
pub const PASS: &str = "PASS";

/// INFO keys carried from the structured reader into a [`VariantRecord`].
pub const SURFACED_INFO_KEYS: [&str; 2] = ["DP", "AF"];

/// Number of tab-delimited columns a VCF data line needs (CHROM..INFO).
pub const MIN_VCF_FIELDS: usize = 8;

/// QUAL column value. Raw text that is neither numeric nor `.` is kept
/// as-is rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Quality {
    Score(f32),
    Unparsed(String),
}

impl Quality {
    /// `.` is missing, anything numeric is a score. Words such as `nan`
    /// or `inf` are not numeric here and stay unparsed.
    pub fn parse(raw: &str) -> Option<Quality> {
        if raw == "." {
            return None;
        }
        match raw.parse::<f32>() {
            Ok(q) if raw.bytes().any(|b| b.is_ascii_digit()) => Some(Quality::Score(q)),
            _ => Some(Quality::Unparsed(raw.to_string())),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Score(q) => write!(f, "{}", q),
            Quality::Unparsed(s) => write!(f, "{}", s),
        }
    }
}

/// Trim and drop a leading `chr` in any case: `chrX` -> `X`, `CHR1` -> `1`.
pub fn normalize_chrom(chrom: &str) -> Result<String> {
    let c = chrom.trim();
    let c = match c.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &c[3..],
        _ => c,
    };
    if c.is_empty() {
        return Err(Error::Validation(format!(
            "invalid CHROM (empty after normalization): '{}'",
            chrom
        )));
    }
    Ok(c.to_string())
}

pub fn normalize_filter(filter: Option<&str>) -> String {
    match filter {
        None | Some("") | Some(".") => PASS.to_string(),
        Some(f) => f.to_string(),
    }
}

/// One VCF site as read from either the htslib reader or a raw text line.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub chrom: String,
    /// 1-based.
    pub pos: u64,
    pub ref_allele: String,
    pub alt_alleles: Vec<String>,
    pub qual: Option<Quality>,
    pub filter: Option<String>,
    pub info: Info,
}

impl VariantRecord {
    /// Build a record from a tab-delimited VCF data line. Returns `Ok(None)`
    /// for lines with fewer than 8 columns.
    pub fn from_text(line: &str) -> Result<Option<Self>> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_VCF_FIELDS {
            return Ok(None);
        }
        let pos = fields[1].trim().parse::<u64>().map_err(|_| {
            Error::Validation(format!("invalid POS '{}' in line: {}", fields[1], line))
        })?;
        let alt_alleles = match fields[4] {
            "." | "" => vec![],
            alts => alts.split(',').map(|a| a.trim().to_string()).collect(),
        };
        Ok(Some(VariantRecord {
            chrom: fields[0].to_string(),
            pos,
            ref_allele: fields[3].to_string(),
            alt_alleles,
            qual: Quality::parse(fields[5]),
            filter: Some(fields[6].to_string()),
            info: Info::parse(fields[7]),
        }))
    }

    /// Build a record from an htslib record. Only [`SURFACED_INFO_KEYS`] are
    /// pulled from INFO, each with the type declared in the header.
    pub fn from_bcf(record: &bcf::Record) -> Result<Self> {
        let header = record.header();
        let chrom = match record.rid() {
            Some(rid) => String::from_utf8_lossy(header.rid2name(rid)?).to_string(),
            None => String::new(),
        };
        let alleles = record.alleles();
        let ref_allele = alleles
            .first()
            .map(|a| String::from_utf8_lossy(a).to_string())
            .unwrap_or_default();
        let alt_alleles = alleles
            .iter()
            .skip(1)
            .map(|a| String::from_utf8_lossy(a).to_string())
            .collect();

        let q = record.qual();
        let qual = if q.is_missing() || q.is_nan() {
            None
        } else {
            Some(Quality::Score(q))
        };

        let filters: Vec<String> = record
            .filters()
            .map(|id| String::from_utf8_lossy(&header.id_to_name(id)).to_string())
            .collect();
        let filter = if filters.is_empty() {
            None
        } else {
            Some(filters.join(";"))
        };

        let mut info = Info::default();
        for key in SURFACED_INFO_KEYS {
            if let Some(value) = info_value(record, key)? {
                info.insert(key, value);
            }
        }

        Ok(VariantRecord {
            chrom,
            pos: (record.pos() + 1) as u64,
            ref_allele,
            alt_alleles,
            qual,
            filter,
            info,
        })
    }
}

/// Read one INFO tag with the type the header declares for it. Tags the
/// header does not define, or that the record lacks, are `None`. Floats
/// keep their f32 text so `0.1` is not written as `0.10000000149011612`.
fn info_value(record: &bcf::Record, key: &str) -> Result<Option<InfoField>> {
    let (typ, num) = match record.header().info_type(key.as_bytes()) {
        Ok(t) => t,
        Err(_) => {
            if log_enabled!(Level::Debug) {
                debug!("info tag {} not in header", key);
            }
            return Ok(None);
        }
    };
    let scalar = matches!(num, TagLength::Fixed(1));
    let mut info = record.info(key.as_bytes()); /* only need mut for .flag */
    let value = match typ {
        TagType::Integer => info.integer()?.and_then(|v| {
            let vals: Vec<i64> = v
                .iter()
                .filter(|x| !x.is_missing())
                .map(|&x| x as i64)
                .collect();
            match (scalar, vals.len()) {
                (_, 0) => None,
                (true, _) => Some(InfoField::new(InfoValue::Integer(vals[0]))),
                _ => Some(InfoField::new(InfoValue::IntegerArray(vals))),
            }
        }),
        TagType::Float => info.float()?.and_then(|v| {
            let vals: Vec<f32> = v.iter().filter(|x| !x.is_missing()).copied().collect();
            let raw = vals
                .iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(",");
            match (scalar, vals.len()) {
                (_, 0) => None,
                (true, _) => Some(InfoField::with_raw(
                    InfoValue::Float(vals[0] as f64),
                    vals[0].to_string(),
                )),
                _ => Some(InfoField::with_raw(
                    InfoValue::FloatArray(vals.iter().map(|&x| x as f64).collect()),
                    raw,
                )),
            }
        }),
        TagType::String => info.string()?.and_then(|v| {
            let vals: Vec<String> = v
                .iter()
                .map(|s| String::from_utf8_lossy(s).to_string())
                .collect();
            match (scalar, vals.len()) {
                (_, 0) => None,
                (true, _) => Some(InfoField::new(InfoValue::String(vals[0].clone()))),
                _ => Some(InfoField::new(InfoValue::StringArray(vals))),
            }
        }),
        TagType::Flag => {
            if info.flag()? {
                Some(InfoField::new(InfoValue::Flag))
            } else {
                None
            }
        }
    };
    Ok(value)
}
