use log::info;
use std::path::Path;

use crate::error::{Error, Result};
use crate::flatten::{flatten, VariantRow, ROW_COLUMNS};
use crate::matcher::{ClinVarMatcher, ANNOTATION_COLUMNS};
use crate::records::EitherRecords;
use crate::region_query::RegionIndexQuery;
use crate::table::{write_table, EitherWriter, Table, REQUIRED_COLUMNS};

#[derive(Debug, Clone, Default)]
pub struct FlattenOptions {
    /// Stop after this many rows. `None` or `Some(0)` means no cap.
    pub max_rows: Option<usize>,
    /// Parse the input as raw text instead of through htslib.
    pub text: bool,
}

fn require_file(kind: &str, path: &Path) -> Result<()> {
    if path.as_os_str() != "-" && !path.exists() {
        return Err(Error::missing_file(kind, path));
    }
    Ok(())
}

/// Read and flatten a whole VCF into memory.
pub fn flatten_vcf(vcf: &Path, opts: &FlattenOptions) -> Result<Vec<VariantRow>> {
    require_file("VCF", vcf)?;
    let path = vcf.to_string_lossy();
    let records = EitherRecords::open(&path, opts.text)?;
    let rows = flatten(records, opts.max_rows).collect::<Result<Vec<_>>>()?;
    info!("flattened {} row(s) from {}", rows.len(), path);
    Ok(rows)
}

pub fn write_rows(out: &Path, rows: &[VariantRow]) -> Result<usize> {
    let mut wtr = EitherWriter::create(out)?;
    write_table(&mut wtr, &ROW_COLUMNS, rows.iter().map(|r| r.fields()))
}

/// Flatten `vcf` into the table at `out`. Nothing is written if reading fails.
pub fn run_flatten(vcf: &Path, out: &Path, opts: &FlattenOptions) -> Result<usize> {
    let rows = flatten_vcf(vcf, opts)?;
    write_rows(out, &rows)
}

/// Append the ClinVar columns to every row of `table`.
pub fn annotate_table<Q: RegionIndexQuery>(
    table: &Table,
    matcher: &mut ClinVarMatcher<Q>,
) -> Result<Table> {
    let cols: Vec<usize> = REQUIRED_COLUMNS
        .iter()
        .map(|c| table.column(c))
        .collect::<Result<_>>()?;
    let (chrom, pos, ref_allele, alt) = (cols[0], cols[1], cols[2], cols[3]);

    let mut header = table.header.clone();
    header.extend(ANNOTATION_COLUMNS.iter().map(|c| c.to_string()));

    let mut rows = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let p = row[pos].trim().parse::<u64>().map_err(|_| {
            Error::Validation(format!("invalid pos '{}' in table row {}", row[pos], i + 1))
        })?;
        let annotation = matcher.annotate(&row[chrom], p, &row[ref_allele], &row[alt])?;
        let mut out = row.clone();
        out.extend(annotation.fields());
        rows.push(out);
    }
    info!(
        "{} of {} row(s) matched a record in {}",
        matcher.matched(),
        rows.len(),
        matcher.database().display()
    );
    Ok(Table { header, rows })
}

/// Annotate the table at `tsv` from `clinvar` and write it to `out`.
pub fn run_annotate<Q: RegionIndexQuery>(
    tsv: &Path,
    clinvar: &Path,
    out: &Path,
    query: Q,
) -> Result<usize> {
    require_file("TSV", tsv)?;
    require_file("ClinVar VCF", clinvar)?;
    let table = Table::from_path(tsv)?;
    let mut matcher = ClinVarMatcher::new(query, clinvar);
    let annotated = annotate_table(&table, &mut matcher)?;
    let mut wtr = EitherWriter::create(out)?;
    write_table(&mut wtr, &annotated.header, annotated.rows)
}
