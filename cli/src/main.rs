use std::path::{Path, PathBuf};

use argtree_config::{BuiltGrammar, Grammar, ParseReport};
use argtree_core::ErrorMode;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Output format of the parse report.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "argtree")]
#[command(about = "Check argument lines against declarative grammar files")]
#[command(version)]
struct Cli {
    /// Log parser decisions to stderr.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse an argument line and print what matched.
    Check(CheckArgs),
    /// Print the usage text of a grammar.
    Usage(UsageArgs),
    /// Build one or more grammar files and report problems.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Grammar file (.json, .yaml or .yml).
    #[arg(long)]
    grammar: PathBuf,
    /// Report format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Tokens to parse, after `--`.
    #[arg(last = true)]
    tokens: Vec<String>,
}

#[derive(Debug, Args)]
struct UsageArgs {
    /// Grammar file (.json, .yaml or .yml).
    #[arg(long)]
    grammar: PathBuf,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Grammar files to build.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Usage(args) => run_usage(args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build(path: &Path) -> Result<BuiltGrammar, String> {
    let grammar = Grammar::load(path).map_err(|e| format!("{}: {e}", path.display()))?;
    grammar
        .build()
        .map_err(|e| format!("{}: {e}", path.display()))
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let mut built = build(&args.grammar)?.with_error_mode(ErrorMode::Exit);
    debug!(tokens = args.tokens.len(), "checking argument line");

    let program = match built.parser().program_name() {
        "" => args
            .grammar
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
        name => name.to_string(),
    };

    // Exits on a parse failure or a help request.
    let report = built
        .parse_args(std::iter::once(program).chain(args.tokens))
        .map_err(|e| e.to_string())?;
    println!("{}", format_report(&report, args.format)?);
    Ok(())
}

fn run_usage(args: UsageArgs) -> Result<(), String> {
    let built = build(&args.grammar)?;
    print!("{}", built.usage());
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    for path in &args.inputs {
        let built = build(path)?;
        debug!(path = %path.display(), flags = built.flag_paths().count(), "grammar ok");
    }
    println!("Validated {} grammar file(s).", args.inputs.len());
    Ok(())
}

fn format_report(report: &ParseReport, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(report).map_err(|e| e.to_string()),
        CliOutputFormat::Yaml => serde_yaml::to_string(report)
            .map(|text| text.trim_end().to_string())
            .map_err(|e| e.to_string()),
    }
}
