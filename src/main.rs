use clap::{Parser, Subcommand, ValueEnum};
use mimalloc::MiMalloc;
use std::path::PathBuf;

use vcfclinvar::pipeline::{run_annotate, run_flatten, FlattenOptions};
use vcfclinvar::{HtslibTabix, RegionIndexQuery, TabixCommand};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export a VCF to a table with one row per alternate allele.
    Flatten {
        /// Input VCF (.vcf, .vcf.gz or .bcf); "-" for stdin
        #[arg(long)]
        vcf: PathBuf,

        /// Output TSV path; "-" for stdout
        #[arg(long)]
        out: PathBuf,

        /// If >0, limit the number of exported rows
        #[arg(long, default_value_t = 0)]
        max_variants: usize,

        /// Parse the VCF as plain text instead of through htslib
        #[arg(long)]
        text: bool,
    },
    /// Add ClinVar CLNSIG, CLNDN and ALLELEID columns to a flattened table.
    Annotate {
        /// Input TSV from `flatten`
        #[arg(long)]
        tsv: PathBuf,

        /// ClinVar VCF.gz with a .tbi index
        #[arg(long)]
        clinvar: PathBuf,

        /// Output TSV path; "-" for stdout
        #[arg(long)]
        out: PathBuf,

        /// How to query the ClinVar index
        #[arg(long, value_enum, default_value_t = Backend::Tabix)]
        backend: Backend,

        /// tabix program used by the tabix backend
        #[arg(long, default_value = "tabix")]
        tabix: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    /// run the tabix program once per row
    Tabix,
    /// read the index in-process with htslib
    Htslib,
}

fn run(cli: Cli) -> vcfclinvar::Result<()> {
    match cli.command {
        Commands::Flatten {
            vcf,
            out,
            max_variants,
            text,
        } => {
            let opts = FlattenOptions {
                max_rows: Some(max_variants),
                text,
            };
            let n = run_flatten(&vcf, &out, &opts)?;
            eprintln!("Wrote {} variants to {}", n, out.display());
        }
        Commands::Annotate {
            tsv,
            clinvar,
            out,
            backend,
            tabix,
        } => {
            let query: Box<dyn RegionIndexQuery> = match backend {
                Backend::Tabix => Box::new(TabixCommand::new(tabix)),
                Backend::Htslib => Box::new(HtslibTabix::new()),
            };
            let n = run_annotate(&tsv, &clinvar, &out, query)?;
            eprintln!("Wrote {} ClinVar-annotated rows to {}", n, out.display());
        }
    }
    Ok(())
}

/// The one line printed on failure, whatever the log level.
fn error_line(e: &vcfclinvar::Error) -> String {
    format!("Error: {}", e)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::debug!("{:?}", e);
        eprintln!("{}", error_line(&e));
        std::process::exit(1);
    }
}
