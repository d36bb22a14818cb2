mod debug_report;

use anyhow::{Context, Result};
use clap::Parser;
use lexmap::{
    DEFAULT_CONTROL, Error, Matcher, Options, OutputMode, RuleConfig, compile, normalize_verbose_with, normalize_with,
    parse_single_char, standard,
};
use std::fs;
use std::io::{self, BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Normalize text with lexical rules and report input/output positions
#[derive(Parser, Debug)]
#[command(name = "lexmap", version, about, long_about = None)]
struct Cli {
    /// Text to normalize. When omitted, stdin is normalized line by line.
    #[arg(value_name = "TEXT")]
    input: Vec<String>,

    /// Rule file: JSON config, or raw rule lines when it ends in .tsv or .rules.
    /// Applied on top of --load when both are given.
    #[arg(short, long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Start from a saved matcher snapshot.
    #[arg(long, value_name = "SNAPSHOT")]
    load: Option<PathBuf>,

    /// Save the compiled matcher to a snapshot.
    #[arg(long, value_name = "SNAPSHOT")]
    save: Option<PathBuf>,

    /// Output separator (one character).
    #[arg(short, long, default_value = " ")]
    separator: String,

    /// Output mode: normal, list, set or join.
    #[arg(short, long, default_value = "normal")]
    mode: OutputMode,

    /// Internal boundary marker (one character, default U+001F).
    #[arg(long, value_name = "CHAR")]
    control: Option<String>,

    /// Print maps and scan metrics for every input.
    #[arg(short, long)]
    verbose: bool,

    /// Force ANSI color output.
    #[arg(long, overrides_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long, overrides_with = "color")]
    no_color: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            if matches!(err.downcast_ref::<Error>(), Some(Error::InvalidArgument(_))) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LEXMAP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn run(cli: &Cli) -> Result<()> {
    let options = Options {
        separator: parse_single_char(&cli.separator, "--separator")?,
        mode: cli.mode,
        control: match &cli.control {
            Some(value) => parse_single_char(value, "--control")?,
            None => DEFAULT_CONTROL,
        },
    };
    if options.separator == options.control {
        return Err(Error::InvalidArgument("--separator and --control must differ".to_string()).into());
    }

    let matcher = build_matcher(cli)?;
    if let Some(path) = &cli.save {
        matcher.save(path).with_context(|| format!("failed to save snapshot {}", path.display()))?;
        info!(path = %path.display(), "snapshot saved");
    }

    let color = if cli.no_color {
        false
    } else {
        cli.color || io::stdout().is_terminal()
    };

    if !cli.input.is_empty() {
        return emit(&matcher, &cli.input.join(" "), &options, cli.verbose, color);
    }

    let stdin = io::stdin();
    if cli.save.is_some() && stdin.is_terminal() {
        return Ok(());
    }
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        emit(&matcher, &line, &options, cli.verbose, color)?;
    }
    Ok(())
}

fn emit(matcher: &Matcher, text: &str, options: &Options, verbose: bool, color: bool) -> Result<()> {
    if verbose {
        let res = normalize_verbose_with(matcher, text, options)?;
        debug_report::print_run(text, options.mode, &res, color);
    } else {
        println!("{}", normalize_with(matcher, text, options)?.transformed);
    }
    Ok(())
}

fn build_matcher(cli: &Cli) -> Result<Matcher> {
    let matcher = match (&cli.load, &cli.rules) {
        (Some(snapshot), rules) => {
            let mut matcher = Matcher::load(snapshot)
                .with_context(|| format!("failed to load snapshot {}", snapshot.display()))?;
            if let Some(path) = rules {
                matcher
                    .update(&read_rule_lines(path)?)
                    .with_context(|| format!("failed to apply rules from {}", path.display()))?;
            }
            matcher
        }
        (None, Some(path)) => {
            compile(&read_rule_lines(path)?).with_context(|| format!("failed to compile rules from {}", path.display()))?
        }
        (None, None) => standard()?.clone(),
    };

    info!(nodes = matcher.node_count(), patterns = matcher.pattern_count(), "matcher ready");
    Ok(matcher)
}

fn read_rule_lines(path: &Path) -> Result<String> {
    let raw = matches!(path.extension().and_then(|ext| ext.to_str()), Some("tsv" | "rules"));
    if raw {
        return fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()));
    }

    let loaded = RuleConfig::load(path).with_context(|| format!("failed to load rule config {}", path.display()))?;
    info!(name = %loaded.name, "loaded rule config");
    Ok(loaded.rule_lines)
}
