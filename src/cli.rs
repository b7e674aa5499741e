use clap::CommandFactory;
use clap::{AppSettings, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    propagate_version = true,
    subcommand_required = true,
    infer_subcommands = true,
    arg_required_else_help = true,
    help_expected = true
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
pub struct Cli {
    /// Worker threads for parallel steps.
    #[clap(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Logging level [-v: Info, -vv: Debug, -vvv: Trace].
    #[clap(short, long, parse(from_occurrences), help_heading = "DEBUG")]
    pub verbose: usize,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Direction of a gene id conversion.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// RAP gene ids to MSU gene ids.
    Rap2msu,
    /// MSU gene ids to RAP gene ids.
    Msu2rap,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Direction::Rap2msu => write!(f, "rap2msu"),
            Direction::Msu2rap => write!(f, "msu2rap"),
        }
    }
}

/// What to do with a pair whose gene has no expression profile.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnMissing {
    /// Stop the whole run with an error.
    Abort,
    /// Leave the pair out and report it.
    Skip,
}

/// Accept a single character, or `\t`/`tab` for a tab.
pub fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "\\t" | "tab" | "\t" => Ok(b'\t'),
        _ if s.len() == 1 => Ok(s.as_bytes()[0]),
        _ => Err(format!("delimiter must be a single character, got {:?}", s)),
    }
}

///
/// This structure contains all the subcommands for grnkit and their help descriptions.
///
/// Because of naming conventions for rust enums the commands names have
/// different capitalization than on the command line.
/// For example, the `FilterStats` enum is invoked using `grnkit filter-stats`.
///
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add the Spearman correlation between each TF and its target to a network.
    ///
    /// Reads an expression matrix (genes as rows, samples as columns, with a header)
    /// and a network table (TF, TG, IM, optional header) and writes `TF TG IM Coor`.
    /// Pairs are correlated in parallel across `--threads` workers.
    #[clap(visible_aliases = &["coor", "sp"])]
    Spearman {
        /// Expression matrix, comma separated unless `--delimiter` says otherwise.
        expression: String,
        /// Network table from the inference step (TF, TG, IM).
        network: String,
        /// Output table.
        #[clap(default_value = "-")]
        output: String,
        /// Delimiter of the expression matrix.
        #[clap(short, long, default_value = ",", parse(try_from_str = parse_delimiter))]
        delimiter: u8,
        /// Only correlate edges with at least this importance.
        #[clap(short, long, default_value_t = 0.005)]
        min_importance: f64,
        /// What to do with a pair whose gene is not in the expression matrix.
        #[clap(short, long, value_enum, default_value = "abort")]
        on_missing: OnMissing,
        /// Write only `TF TG Coor` instead of the merged network.
        #[clap(short, long)]
        pairs_only: bool,
    },
    /// Write the targets of each TF that pass the thresholds to `<dest-dir>/<TF>.txt`.
    ///
    /// Edges are first filtered on importance, then the survivors on correlation.
    #[clap(visible_aliases = &["regulons"])]
    Group {
        /// Network table (TF, TG, IM[, Coor]).
        #[clap(default_value = "-")]
        network: String,
        /// Keep edges with importance greater than this.
        #[clap(short, long, default_value_t = 0.03)]
        threshold: f64,
        /// Also keep only edges with correlation greater than this.
        #[clap(short, long)]
        correlation: Option<f64>,
        /// Output directory.
        #[clap(short, long, default_value = "groups")]
        dest_dir: String,
    },
    /// Count the targets of each TF before and after each filter, with summary statistics.
    #[clap(visible_aliases = &["fstats", "fs"])]
    FilterStats {
        /// Network table with a correlation column (TF, TG, IM, Coor).
        #[clap(default_value = "-")]
        network: String,
        /// Importance threshold.
        #[clap(short, long, default_value_t = 0.03)]
        im: f64,
        /// Correlation threshold, applied after the importance filter.
        #[clap(short, long, default_value_t = 0.03)]
        coor: f64,
        /// Also write the filtered regulons into this directory.
        #[clap(short, long)]
        dest_dir: Option<String>,
    },
    /// Convert between rice RAP and MSU gene ids.
    #[clap(visible_aliases = &["cid"])]
    ConvertId {
        /// Conversion direction.
        #[clap(value_enum)]
        direction: Direction,
        /// Mapping file: RAP id, then comma separated MSU transcripts or `None`.
        #[clap(short, long, default_value = "RAP-MSU.txt")]
        map_file: String,
        /// Gene ids to convert, one per line.
        #[clap(short, long)]
        input_file: String,
        /// Output file [default: gid_<DIRECTION>.txt].
        #[clap(short, long)]
        output: Option<String>,
        /// Fix upper-cased rice ids (`OS01G0100100` -> `Os01g0100100`) before lookup.
        #[clap(short, long)]
        fix_case: bool,
    },
    /// Group the motif ids of rice TFs from a CisBP TF information table.
    Tf2motif {
        /// CisBP TF information table with DBID and Motif_ID columns.
        tf_info: String,
        /// Output table.
        #[clap(short, long, default_value = "TF2motif_cisbp.txt")]
        output: String,
    },
    /// Generate per-TF promoter sequences and motif files for Cluster-Buster.
    #[clap(visible_aliases = &["cbust"])]
    CbustPrep {
        /// Promoter sequences (fasta, optionally gzipped).
        #[clap(short, long)]
        promoter_file: String,
        /// TF to motif table from `tf2motif`.
        #[clap(short = 'm', long)]
        tf2motif_file: String,
        /// Directory with one `<TF>.txt` target list per TF.
        #[clap(short, long, default_value = "regulons")]
        regulon_dir: String,
        /// Directory with one `<motif>.txt` matrix per motif.
        #[clap(short = 'w', long, default_value = "cbpwms")]
        pwm_dir: String,
        /// Output directory for sequences.
        #[clap(short, long, default_value = "cbust_seqs")]
        seq_dir: String,
        /// Output directory for motifs.
        #[clap(short = 'o', long, default_value = "cbust_motifs")]
        motif_dir: String,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Spearman { .. } => "spearman",
            Commands::Group { .. } => "group",
            Commands::FilterStats { .. } => "filter-stats",
            Commands::ConvertId { .. } => "convert-id",
            Commands::Tf2motif { .. } => "tf2motif",
            Commands::CbustPrep { .. } => "cbust-prep",
        }
    }
}

pub fn make_cli_parse() -> Cli {
    Cli::parse()
}

pub fn make_cli_app() -> clap::Command<'static> {
    Cli::command()
}
