use log::debug;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::info::Info;
use crate::region_query::RegionIndexQuery;

/// Columns appended by the annotate stage, in order.
pub const ANNOTATION_COLUMNS: [&str; 3] = ["clinvar_clnsig", "clinvar_clndn", "clinvar_alleleid"];

/// ClinVar fields for one row. All `None` when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClinVarAnnotation {
    pub clnsig: Option<String>,
    pub clndn: Option<String>,
    pub allele_id: Option<String>,
}

impl ClinVarAnnotation {
    pub fn is_empty(&self) -> bool {
        self.clnsig.is_none() && self.clndn.is_none() && self.allele_id.is_none()
    }

    /// Values in [`ANNOTATION_COLUMNS`] order; nulls are empty strings.
    pub fn fields(&self) -> [String; 3] {
        [
            self.clnsig.clone().unwrap_or_default(),
            self.clndn.clone().unwrap_or_default(),
            self.allele_id.clone().unwrap_or_default(),
        ]
    }
}

/// Borrowed view of one reference VCF line. INFO stays unparsed until asked.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub chrom: &'a str,
    pub pos: &'a str,
    pub id: &'a str,
    pub ref_allele: &'a str,
    pub alts: &'a str,
    pub qual: &'a str,
    pub filter: &'a str,
    pub info: &'a str,
}

impl<'a> Candidate<'a> {
    /// `None` for header lines and lines with fewer than 8 columns.
    pub fn parse(line: &'a str) -> Option<Self> {
        if line.starts_with('#') {
            return None;
        }
        let mut f = line.split('\t');
        let c = Candidate {
            chrom: f.next()?,
            pos: f.next()?,
            id: f.next()?,
            ref_allele: f.next()?,
            alts: f.next()?,
            qual: f.next()?,
            filter: f.next()?,
            info: f.next()?,
        };
        Some(c)
    }

    /// REF is equal and `alt` is one of the comma-separated ALTs.
    pub fn matches(&self, ref_allele: &str, alt: &str) -> bool {
        self.ref_allele == ref_allele && self.alts.split(',').any(|a| a == alt)
    }

    pub fn annotation(&self) -> ClinVarAnnotation {
        let info = Info::parse(self.info);
        ClinVarAnnotation {
            clnsig: info.text("CLNSIG"),
            clndn: info.text("CLNDN"),
            allele_id: info.text("ALLELEID"),
        }
    }
}

/// Annotation of the first candidate, in the given order, matching
/// `ref_allele`/`alt` exactly.
pub fn match_candidates<'a, I>(ref_allele: &str, alt: &str, lines: I) -> ClinVarAnnotation
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter_map(Candidate::parse)
        .find(|c| c.matches(ref_allele, alt))
        .map(|c| c.annotation())
        .unwrap_or_default()
}

/// Looks rows up in one reference file through a [`RegionIndexQuery`].
pub struct ClinVarMatcher<Q> {
    query: Q,
    database: PathBuf,
    matched: usize,
}

impl<Q: RegionIndexQuery> ClinVarMatcher<Q> {
    pub fn new(query: Q, database: impl Into<PathBuf>) -> Self {
        ClinVarMatcher {
            query,
            database: database.into(),
            matched: 0,
        }
    }

    pub fn database(&self) -> &Path {
        &self.database
    }

    /// Rows that found a matching candidate so far.
    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn into_inner(self) -> Q {
        self.query
    }

    pub fn annotate(
        &mut self,
        chrom: &str,
        pos: u64,
        ref_allele: &str,
        alt: &str,
    ) -> Result<ClinVarAnnotation> {
        let lines = self.query.query(&self.database, chrom, pos)?;
        let annotation = match_candidates(ref_allele, alt, lines.iter().map(|l| l.as_str()));
        if annotation.is_empty() {
            debug!(
                "no ClinVar match for {}:{} {}>{} among {} candidate(s)",
                chrom,
                pos,
                ref_allele,
                alt,
                lines.len()
            );
        } else {
            self.matched += 1;
        }
        Ok(annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region_query::InMemoryIndex;

    const A_CT: &str = "1\t100\t11\tA\tC,T\t.\t.\tALLELEID=15;CLNDN=Breast_cancer;CLNSIG=Pathogenic";

    #[test]
    fn test_alt_in_list_matches() {
        let ann = match_candidates("A", "T", [A_CT]);
        assert_eq!(ann.clnsig.as_deref(), Some("Pathogenic"));
        assert_eq!(ann.clndn.as_deref(), Some("Breast_cancer"));
        assert_eq!(ann.allele_id.as_deref(), Some("15"));
    }

    #[test]
    fn test_annotation_values_as_written() {
        let line = "1\t100\t11\tA\tT\t.\t.\tALLELEID=0015;CLNSIG=+1;CLNDN=1.50";
        let ann = match_candidates("A", "T", [line]);
        assert_eq!(ann.allele_id.as_deref(), Some("0015"));
        assert_eq!(ann.clnsig.as_deref(), Some("+1"));
        assert_eq!(ann.clndn.as_deref(), Some("1.50"));
    }

    #[test]
    fn test_alt_not_in_list() {
        assert!(match_candidates("A", "G", [A_CT]).is_empty());
    }

    #[test]
    fn test_ref_must_be_equal() {
        assert!(match_candidates("AT", "T", [A_CT]).is_empty());
        // a substring of an alt is not a match
        assert!(match_candidates("A", "C,T", [A_CT]).is_empty());
    }

    #[test]
    fn test_first_match_wins() {
        let second = "1\t100\t12\tA\tT\t.\t.\tALLELEID=99;CLNSIG=Benign";
        let ann = match_candidates("A", "T", [second, A_CT]);
        assert_eq!(ann.allele_id.as_deref(), Some("99"));
        let ann = match_candidates("A", "T", [A_CT, second]);
        assert_eq!(ann.allele_id.as_deref(), Some("15"));
    }

    #[test]
    fn test_skips_headers_and_short_lines() {
        let lines = [
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
            "1\t100\t11\tA\tT",
            "1\t100\t13\tA\tT\t.\t.\tCLNSIG=Likely_benign",
        ];
        let ann = match_candidates("A", "T", lines);
        assert_eq!(ann.clnsig.as_deref(), Some("Likely_benign"));
        assert_eq!(ann.clndn, None);
        assert_eq!(ann.allele_id, None);
    }

    #[test]
    fn test_matcher_with_in_memory_index() {
        let index: InMemoryIndex = [A_CT].into_iter().collect();
        let mut matcher = ClinVarMatcher::new(index, "clinvar.vcf.gz");
        let hit = matcher.annotate("1", 100, "A", "C").unwrap();
        assert_eq!(hit.clnsig.as_deref(), Some("Pathogenic"));
        assert!(matcher.annotate("1", 101, "A", "C").unwrap().is_empty());
        // identical query goes back to the index
        matcher.annotate("1", 100, "A", "C").unwrap();
        assert_eq!(matcher.matched(), 2);
        assert_eq!(matcher.into_inner().queries(), 3);
    }

    #[test]
    fn test_fields_order() {
        let ann = ClinVarAnnotation {
            clnsig: Some("Benign".into()),
            clndn: None,
            allele_id: Some("7".into()),
        };
        assert_eq!(ann.fields(), ["Benign".to_string(), String::new(), "7".to_string()]);
    }
}
