//! CLI argument definitions for `statviz`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use statviz_analysis::{GroupCount, MeasureScale, NonParametricTest, SampleDesign};
use statviz_core::{BackendMode, ConfigOverrides};
use statviz_model::AnalysisType;

#[derive(Parser)]
#[command(
    name = "statviz",
    version,
    about = "StatViz - statistics assistant for agricultural field trials",
    long_about = "Load a CSV or Excel file, assign columns to analysis roles, run a \
                  statistical test and get a plain-language interpretation.\n\n\
                  Analyses run on the configured statistics backend (or built-in \
                  example results with --mock); explanations come from a hosted \
                  language model."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow cell values to appear in logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Configuration file (default: ./statviz.toml when present).
    #[arg(long, value_name = "PATH", env = "STATVIZ_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Use built-in example results instead of the statistics backend.
    #[arg(long, global = true)]
    pub mock: bool,

    /// Statistics backend URL.
    #[arg(long = "backend-url", value_name = "URL", global = true)]
    pub backend_url: Option<String>,

    /// Language model used for explanations.
    #[arg(long, value_name = "MODEL", global = true)]
    pub model: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Accept spreadsheets larger than the configured limit.
    #[arg(long = "no-size-limit", global = true)]
    pub no_size_limit: bool,
}

impl Cli {
    /// Configuration overrides given on the command line.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backend_mode: self.mock.then_some(BackendMode::Mock),
            backend_url: self.backend_url.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout,
            enforce_size_limit: self.no_size_limit.then_some(false),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the first rows of a data file.
    Preview(PreviewArgs),

    /// List the sheets of a workbook.
    Sheets {
        /// Workbook path (.xlsx or .xls).
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Data-quality screen: descriptive statistics and normality checks.
    Describe(DescribeArgs),

    /// Run a statistical analysis.
    Analyze(AnalyzeArgs),

    /// Explain saved analysis results in plain language.
    Explain(ExplainArgs),

    /// Ask a statistics question answered from the guide.
    Ask {
        /// The question.
        #[arg(value_name = "QUESTION", required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Spatial autocorrelation (Moran's I) of plot values.
    Spatial(SpatialArgs),

    /// Randomized Block Design analysis.
    Rbd(RbdArgs),

    /// Factorial Randomized Block Design analysis.
    Frbd(FrbdArgs),

    /// Normality screen and data transformation.
    Transform(TransformArgs),

    /// Non-parametric test, chosen directly or from the study layout.
    Nonparametric(NonParametricArgs),

    /// Linear mixed model with a random grouping effect.
    Lmm(LmmArgs),

    /// Best linear unbiased predictors across environments and years.
    Blup(BlupArgs),

    /// Survival analysis with optional covariates.
    Survival(SurvivalArgs),

    /// Probit dose-response analysis.
    Probit(ProbitArgs),

    /// Print the effective configuration.
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    /// Data file (.csv, .xlsx or .xls).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Worksheet to read (default: first sheet).
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Number of rows to show.
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Args, Debug, Clone)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Columns to describe (default: every numeric column).
    #[arg(long = "column", value_name = "COLUMN")]
    pub columns: Vec<String>,

    /// Grouping column for Levene's test of equal variances.
    #[arg(long, value_name = "COLUMN")]
    pub group: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Analysis to run.
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_analysis_type)]
    pub analysis_type: AnalysisType,

    /// Dependent (response) column.
    #[arg(long, value_name = "COLUMN")]
    pub dependent: String,

    /// Independent column; repeat for several.
    #[arg(long = "independent", value_name = "COLUMN", required = true)]
    pub independent: Vec<String>,

    /// Values column.
    #[arg(long, value_name = "COLUMN")]
    pub values: Option<String>,

    /// Covariate column; repeat for several.
    #[arg(long = "covariate", value_name = "COLUMN")]
    pub covariates: Vec<String>,

    /// Also ask the language model to explain the results.
    #[arg(long)]
    pub explain: bool,

    /// Context passed along with --explain.
    #[arg(long, value_name = "TEXT", requires = "explain")]
    pub context: Option<String>,

    /// Print the result as JSON instead of tables.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExplainArgs {
    /// Result JSON written by `statviz analyze --json`.
    #[arg(value_name = "RESULT_JSON")]
    pub results: PathBuf,

    /// Analysis type to mention in the prompt.
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_analysis_type)]
    pub analysis_type: AnalysisType,

    /// Extra context about the experiment.
    #[arg(long, value_name = "TEXT")]
    pub context: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SpatialArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Plot / location column.
    #[arg(long, value_name = "COLUMN")]
    pub location: String,

    /// Measured value column.
    #[arg(long, value_name = "COLUMN")]
    pub value: String,

    #[arg(long, value_name = "COLUMN")]
    pub latitude: Option<String>,

    #[arg(long, value_name = "COLUMN")]
    pub longitude: Option<String>,

    /// Write the interactive map HTML to this path.
    #[arg(long = "map-output", value_name = "PATH")]
    pub map_output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RbdArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Block (replication) column.
    #[arg(long, value_name = "COLUMN")]
    pub block: String,

    /// Treatment column.
    #[arg(long, value_name = "COLUMN")]
    pub factor: String,

    /// Response column.
    #[arg(long, value_name = "COLUMN")]
    pub response: String,

    /// Ask the language model for an interpretation.
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FrbdArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Block (replication) column.
    #[arg(long, value_name = "COLUMN")]
    pub block: String,

    /// Factor column; give at least two.
    #[arg(long = "factor", value_name = "COLUMN", required = true)]
    pub factors: Vec<String>,

    /// Response column.
    #[arg(long, value_name = "COLUMN")]
    pub response: String,

    /// Ask the language model for an interpretation.
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TransformArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Response column to screen.
    #[arg(long, value_name = "COLUMN")]
    pub response: String,

    /// Apply this transformation (default: screen only).
    #[arg(long, value_name = "TRANSFORM")]
    pub apply: Option<String>,

    /// Apply the service's recommended transformation.
    #[arg(long, conflicts_with = "apply")]
    pub recommended: bool,

    /// Write original and transformed values as CSV.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct NonParametricArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Test to run, e.g. kruskal-wallis (default: recommend from the layout).
    #[arg(long, value_name = "TEST", value_parser = parse_nonparametric_test)]
    pub test: Option<NonParametricTest>,

    /// Number of groups compared.
    #[arg(long, value_enum, conflicts_with = "test", required_unless_present = "test")]
    pub groups: Option<GroupsArg>,

    /// Whether the groups are independent or paired.
    #[arg(long, value_enum, default_value = "independent", conflicts_with = "test")]
    pub design: DesignArg,

    /// Measurement scale of the dependent variable.
    #[arg(long, value_enum, conflicts_with = "test", required_unless_present = "test")]
    pub scale: Option<ScaleArg>,
}

#[derive(Args, Debug, Clone)]
pub struct LmmArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Response column.
    #[arg(long, value_name = "COLUMN")]
    pub response: String,

    /// Random-effect grouping column.
    #[arg(long, value_name = "COLUMN")]
    pub group: String,

    /// Fixed-effect column; repeat for several.
    #[arg(long = "fixed", value_name = "COLUMN", required = true)]
    pub fixed_effects: Vec<String>,

    /// Fixed effect compared with Tukey's HSD (default: the first --fixed).
    #[arg(long, value_name = "COLUMN")]
    pub tukey: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct BlupArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Dependent (trait) column.
    #[arg(long, value_name = "COLUMN")]
    pub dependent: String,

    #[arg(long, value_name = "COLUMN")]
    pub genotype: String,

    /// Replication column.
    #[arg(long, value_name = "COLUMN")]
    pub rep: String,

    #[arg(long, value_name = "COLUMN")]
    pub block: String,

    /// Environment (location) column.
    #[arg(long = "env", value_name = "COLUMN")]
    pub environment: String,

    #[arg(long, value_name = "COLUMN")]
    pub year: String,
}

#[derive(Args, Debug, Clone)]
pub struct SurvivalArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Covariate column; repeat for several.
    #[arg(long = "covariate", value_name = "COLUMN")]
    pub covariates: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ProbitArgs {
    #[command(flatten)]
    pub input: FileArgs,
}

fn parse_nonparametric_test(value: &str) -> Result<NonParametricTest, String> {
    value.parse().map_err(|_| {
        let keys: Vec<&str> = NonParametricTest::ALL
            .into_iter()
            .map(NonParametricTest::key)
            .collect();
        format!("unknown test '{value}' (expected one of {})", keys.join(", "))
    })
}

fn parse_analysis_type(value: &str) -> Result<AnalysisType, String> {
    value.parse().map_err(|_| {
        format!("unknown analysis type '{value}' (expected anova, ancova, tukey or regression)")
    })
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum GroupsArg {
    One,
    Two,
    /// More than two groups.
    More,
}

impl From<GroupsArg> for GroupCount {
    fn from(value: GroupsArg) -> Self {
        match value {
            GroupsArg::One => Self::One,
            GroupsArg::Two => Self::Two,
            GroupsArg::More => Self::MoreThanTwo,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DesignArg {
    Independent,
    Paired,
}

impl From<DesignArg> for SampleDesign {
    fn from(value: DesignArg) -> Self {
        match value {
            DesignArg::Independent => Self::Independent,
            DesignArg::Paired => Self::Paired,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ScaleArg {
    Continuous,
    Ordinal,
    Nominal,
    /// Nominal with two categories.
    Binary,
}

impl From<ScaleArg> for MeasureScale {
    fn from(value: ScaleArg) -> Self {
        match value {
            ScaleArg::Continuous => Self::Continuous,
            ScaleArg::Ordinal => Self::Ordinal,
            ScaleArg::Nominal => Self::Nominal,
            ScaleArg::Binary => Self::BinaryNominal,
        }
    }
}
