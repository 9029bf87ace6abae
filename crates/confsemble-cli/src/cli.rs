use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Confsemble Developers",
    version,
    about = "Confsemble CLI - superposition, principal component analysis and release-notes linting for conformational ensembles.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Superpose the models of a multi-model PDB file onto the first model.
    Superpose(SuperposeArgs),
    /// Superpose an ensemble and write RMSD, RMSF and principal component tables.
    Analyze(AnalyzeArgs),
    /// Work with reStructuredText release notes.
    Changelog(ChangelogArgs),
}

/// Arguments for the `superpose` subcommand.
#[derive(Args, Debug)]
pub struct SuperposeArgs {
    /// Path to the input multi-model PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the superposed multi-model PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Atoms to fit, e.g. 'calpha', 'backbone', 'chain A' or 'resnum A 10 40'.
    #[arg(long, value_name = "EXPR")]
    pub select: Option<String>,

    /// Superpose iteratively onto the mean structure until it converges.
    #[arg(long)]
    pub iterative: bool,

    /// Convergence threshold for iterative superposition, in Angstrom.
    #[arg(long, value_name = "FLOAT")]
    pub rmsd_threshold: Option<f64>,

    /// Maximum number of iterative superposition rounds.
    #[arg(long, value_name = "INT")]
    pub max_iterations: Option<usize>,

    /// Weight atoms by their atomic masses.
    #[arg(long)]
    pub mass_weighted: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S superposition.max-iterations=50
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the input multi-model PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Directory for the CSV tables and the superposed ensemble.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Atoms to analyze, e.g. 'calpha', 'backbone', 'chain A' or 'resnum A 10 40'.
    #[arg(long, value_name = "EXPR")]
    pub select: Option<String>,

    /// Number of principal components to keep (0 keeps all).
    #[arg(short = 'm', long, value_name = "INT")]
    pub modes: Option<usize>,

    /// Also compute the RMSD between every pair of conformations.
    #[arg(long)]
    pub pairwise: bool,

    /// Analyze the conformations as read, without superposition.
    #[arg(long)]
    pub no_superpose: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S analysis.num-modes=5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `changelog` subcommand.
#[derive(Args, Debug)]
pub struct ChangelogArgs {
    #[command(subcommand)]
    pub command: ChangelogCommands,
}

#[derive(Subcommand, Debug)]
pub enum ChangelogCommands {
    /// Check markup, release ordering and cross-references of a changelog.
    Check {
        /// The release-notes file to check.
        #[arg(required = true)]
        file: PathBuf,

        /// File listing known symbols, one dotted name per line.
        #[arg(long, value_name = "PATH")]
        symbols: Option<PathBuf>,

        /// Treat warnings as failures.
        #[arg(long)]
        strict: bool,

        /// Warn about releases without a date.
        #[arg(long)]
        require_dates: bool,

        /// How to print the issues found.
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Print the parsed release notes as TOML.
    Show {
        /// The release-notes file to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// One `file:line: severity: message` line per issue.
    #[default]
    Text,
    /// A TOML document with counts and the list of issues.
    Toml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_superpose_with_global_flags() {
        let cli = Cli::parse_from([
            "confsemble",
            "-vv",
            "-j",
            "4",
            "superpose",
            "-i",
            "in.pdb",
            "-o",
            "out.pdb",
            "--iterative",
            "--select",
            "calpha",
            "-S",
            "superposition.max-iterations=5",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, Some(4));
        let Commands::Superpose(args) = cli.command else {
            panic!("Expected 'superpose' subcommand");
        };
        assert!(args.iterative);
        assert_eq!(args.select.as_deref(), Some("calpha"));
        assert_eq!(args.set_values, vec!["superposition.max-iterations=5"]);
    }

    #[test]
    fn parses_changelog_check() {
        let cli = Cli::parse_from(["confsemble", "changelog", "check", "CHANGES.rst", "--strict"]);
        let Commands::Changelog(ChangelogArgs {
            command: ChangelogCommands::Check { file, strict, symbols, .. },
        }) = cli.command
        else {
            panic!("Expected 'changelog check' subcommand");
        };
        assert_eq!(file, PathBuf::from("CHANGES.rst"));
        assert!(strict);
        assert!(symbols.is_none());
    }

    #[test]
    fn parses_changelog_formats_and_show() {
        let cli = Cli::parse_from(["confsemble", "changelog", "check", "a.rst", "--format", "toml"]);
        let Commands::Changelog(ChangelogArgs {
            command: ChangelogCommands::Check { format, .. },
        }) = cli.command
        else {
            panic!("Expected 'changelog check' subcommand");
        };
        assert_eq!(format, ReportFormat::Toml);

        let cli = Cli::parse_from(["confsemble", "changelog", "check", "a.rst"]);
        assert!(matches!(
            cli.command,
            Commands::Changelog(ChangelogArgs {
                command: ChangelogCommands::Check {
                    format: ReportFormat::Text,
                    ..
                },
            })
        ));

        let cli = Cli::parse_from(["confsemble", "changelog", "show", "a.rst"]);
        assert!(matches!(
            cli.command,
            Commands::Changelog(ChangelogArgs {
                command: ChangelogCommands::Show { .. },
            })
        ));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["confsemble", "-q", "-v", "changelog", "check", "a.rst"]);
        assert!(result.is_err());
    }
}
