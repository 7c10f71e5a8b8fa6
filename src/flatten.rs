use std::fmt;

use crate::error::Result;
use crate::info::InfoField;
use crate::variant::{normalize_chrom, normalize_filter, Quality, VariantRecord};

/// Output columns of the flatten stage, in order.
pub const ROW_COLUMNS: [&str; 8] = ["chrom", "pos", "ref", "alt", "qual", "filter", "dp", "af"];

/// One alternate allele of a [`VariantRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRow {
    pub chrom: String,
    pub pos: u64,
    pub ref_allele: String,
    pub alt: String,
    pub qual: Option<Quality>,
    pub filter: String,
    pub dp: Option<InfoField>,
    /// Carried as written; the typed value may be a scalar, a list, or text.
    pub af: Option<InfoField>,
}

fn opt<T: fmt::Display>(v: &Option<T>) -> String {
    v.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

impl VariantRow {
    /// Field values in [`ROW_COLUMNS`] order; nulls are empty strings.
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.chrom.clone(),
            self.pos.to_string(),
            self.ref_allele.clone(),
            self.alt.clone(),
            opt(&self.qual),
            self.filter.clone(),
            opt(&self.dp),
            opt(&self.af),
        ]
    }
}

/// Everything the rows of one record share; `alt` is filled in per allele.
struct PendingRecord {
    template: VariantRow,
    alts: std::vec::IntoIter<String>,
}

impl PendingRecord {
    fn new(record: VariantRecord) -> Result<Self> {
        let template = VariantRow {
            chrom: normalize_chrom(&record.chrom)?,
            pos: record.pos,
            ref_allele: record.ref_allele,
            alt: String::new(),
            qual: record.qual,
            filter: normalize_filter(record.filter.as_deref()),
            dp: record.info.field("DP").cloned(),
            af: record.info.field("AF").cloned(),
        };
        Ok(PendingRecord {
            template,
            alts: record.alt_alleles.into_iter(),
        })
    }
}

/// Lazily turns records into one row per alternate allele.
///
/// With a row cap the iterator stops as soon as the cap is reached, even
/// part way through a multi-allelic record. The first error ends iteration.
pub struct Flattener<I> {
    records: I,
    pending: Option<PendingRecord>,
    max_rows: Option<usize>,
    emitted: usize,
    failed: bool,
}

impl<I> Flattener<I>
where
    I: Iterator<Item = Result<VariantRecord>>,
{
    /// `max_rows` of `None` or `Some(0)` means no cap.
    pub fn new(records: I, max_rows: Option<usize>) -> Self {
        Flattener {
            records,
            pending: None,
            max_rows: max_rows.filter(|&n| n > 0),
            emitted: 0,
            failed: false,
        }
    }

    pub fn rows_emitted(&self) -> usize {
        self.emitted
    }
}

impl<I> Iterator for Flattener<I>
where
    I: Iterator<Item = Result<VariantRecord>>,
{
    type Item = Result<VariantRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.max_rows.is_some_and(|n| self.emitted >= n) {
            return None;
        }
        loop {
            if let Some(pending) = self.pending.as_mut() {
                if let Some(alt) = pending.alts.next() {
                    self.emitted += 1;
                    let mut row = pending.template.clone();
                    row.alt = alt;
                    return Some(Ok(row));
                }
                self.pending = None;
            }
            let record = match self.records.next()? {
                Ok(r) => r,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };
            match PendingRecord::new(record) {
                Ok(p) => self.pending = Some(p),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Flatten a record source into rows.
pub fn flatten<I>(records: I, max_rows: Option<usize>) -> Flattener<I::IntoIter>
where
    I: IntoIterator<Item = Result<VariantRecord>>,
{
    Flattener::new(records.into_iter(), max_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::info::{Info, InfoValue};

    fn record(chrom: &str, pos: u64, alts: &[&str], info: &str) -> VariantRecord {
        VariantRecord {
            chrom: chrom.to_string(),
            pos,
            ref_allele: "A".to_string(),
            alt_alleles: alts.iter().map(|a| a.to_string()).collect(),
            qual: Some(Quality::Score(50.0)),
            filter: None,
            info: Info::parse(info),
        }
    }

    #[test]
    fn test_multiallelic_record() {
        let recs = vec![Ok(record("chr1", 100, &["C", "G"], "DP=30;AF=0.5"))];
        let rows: Vec<_> = flatten(recs, None).collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].chrom, "1");
        assert_eq!(rows[0].alt, "C");
        assert_eq!(rows[1].alt, "G");
        for row in &rows {
            assert_eq!(row.pos, 100);
            assert_eq!(row.ref_allele, "A");
            assert_eq!(row.filter, "PASS");
            assert_eq!(row.dp.as_ref().map(|f| &f.value), Some(&InfoValue::Integer(30)));
            assert_eq!(row.af.as_ref().map(|f| &f.value), Some(&InfoValue::Float(0.5)));
        }
        assert_eq!(
            rows[1].fields(),
            vec!["1", "100", "A", "G", "50", "PASS", "30", "0.5"]
        );
    }

    #[test]
    fn test_row_count_is_sum_of_alts() {
        let recs = vec![
            Ok(record("1", 1, &["C"], "")),
            Ok(record("1", 2, &["C", "G", "T"], "")),
            Ok(record("2", 3, &[], "")),
            Ok(record("2", 4, &["AT", "<DEL>"], "")),
        ];
        assert_eq!(flatten(recs, None).count(), 6);
    }

    #[test]
    fn test_cap_stops_mid_record() {
        let recs = || {
            vec![
                Ok(record("1", 1, &["C"], "")),
                Ok(record("1", 2, &["C", "G", "T"], "")),
                Ok(record("1", 3, &["G"], "")),
            ]
        };
        let rows: Vec<_> = flatten(recs(), Some(2)).collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[1].pos, rows[1].alt.as_str()), (2, "C"));

        assert_eq!(flatten(recs(), Some(100)).count(), 5);
        assert_eq!(flatten(recs(), Some(0)).count(), 5);
    }

    #[test]
    fn test_af_and_dp_written_as_given() {
        let recs = vec![
            Ok(record("1", 1, &["C"], "DP=030;AF=0.50")),
            Ok(record("1", 2, &["C"], "AF=1e-7")),
            Ok(record("1", 3, &["C", "G"], "AF=0.25,0.75")),
        ];
        let rows: Vec<_> = flatten(recs, None).collect::<Result<_>>().unwrap();
        assert_eq!(&rows[0].fields()[6..], &["030", "0.50"]);
        assert_eq!(rows[1].fields()[7], "1e-7");
        assert_eq!(rows[2].fields()[7], "0.25,0.75");
        assert_eq!(rows[3].fields()[7], "0.25,0.75");
    }

    #[test]
    fn test_missing_info_is_null() {
        let recs = vec![Ok(record("1", 1, &["C"], "DB"))];
        let row = flatten(recs, None).next().unwrap().unwrap();
        assert_eq!(row.dp, None);
        assert_eq!(row.af, None);
        assert_eq!(row.fields()[6], "");
    }

    #[test]
    fn test_empty_chrom_stops_iteration() {
        let recs = vec![
            Ok(record("chr1", 1, &["C"], "")),
            Ok(record("chr", 2, &["C"], "")),
            Ok(record("chr1", 3, &["C"], "")),
        ];
        let mut rows = flatten(recs, None);
        assert!(rows.next().unwrap().is_ok());
        assert!(matches!(rows.next(), Some(Err(Error::Validation(_)))));
        assert!(rows.next().is_none());
    }
}
