//! sqlshift — prepared statements in, query-builder chains out
//!
//! # Usage
//!
//! ```bash
//! # Rewrite units exported by a host-language driver
//! sqlshift translate units.json
//!
//! # Show how one statement would be rebuilt
//! sqlshift explain "SELECT * FROM users WHERE age > ? AND name = ?"
//!
//! # Show how a predicate is split
//! sqlshift split "a = 1 AND (b = 2 OR c = 3)"
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use serde::Deserialize;
use sqlshift::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlshift")]
#[command(version)]
#[command(about = "Rewrite prepared-statement call chains into query-builder chains", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlshift translate units.json --format json
    sqlshift explain 'DELETE FROM sessions WHERE expired = 1'
    sqlshift split \"name = 'A AND B' AND x = 1\"")]
struct Cli {
    /// Config file (defaults to <config dir>/sqlshift/config.toml)
    #[arg(short, long, global = true, env = "SQLSHIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate compilation units from a JSON file ("-" for stdin)
    Translate {
        /// Path to a unit or an array of units
        input: PathBuf,
    },
    /// Show normalization, clauses and the builder chain for one statement
    Explain {
        /// The SQL statement
        sql: String,
    },
    /// Split a WHERE/HAVING expression into predicates
    Split {
        /// The boolean expression
        expression: String,
    },
}

/// A driver may export one unit or many.
#[derive(Deserialize)]
#[serde(untagged)]
enum UnitsInput {
    Many(Vec<Unit>),
    One(Unit),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SQLSHIFT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => TranslatorConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TranslatorConfig::discover().context("Failed to load config")?,
    };

    match &cli.command {
        Commands::Translate { input } => translate(input, config, cli.format),
        Commands::Explain { sql } => explain(sql, &config, cli.format),
        Commands::Split { expression } => split_expression(expression, cli.format),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn translate(input: &Path, config: TranslatorConfig, format: OutputFormat) -> Result<()> {
    let text = read_input(input)?;
    let units = match serde_json::from_str::<UnitsInput>(&text).map_err(ShiftError::from)? {
        UnitsInput::Many(units) => units,
        UnitsInput::One(unit) => vec![unit],
    };

    let syntax = FluentSyntax::new(config.render.clone());
    let translator = Translator::new(config);
    let outcomes = translator.translate_units(&units);

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    let mut total_rewrites = 0;
    let mut total_diagnostics = 0;
    for outcome in &outcomes {
        println!("{} {}", "▸".cyan(), outcome.unit.name.white().bold());
        if outcome.is_unchanged() && outcome.diagnostics.is_empty() {
            println!("  {}", "(nothing to translate)".dimmed());
        }
        for rewrite in &outcome.rewrites {
            println!("  {} {}", "-".red(), syntax.emit_stmt(&rewrite.before).red());
            println!("  {} {}", "+".green(), syntax.emit_stmt(&rewrite.after).green());
        }
        for diagnostic in &outcome.diagnostics {
            println!(
                "  {} {} {}",
                "⚠".yellow(),
                diagnostic.subject.yellow(),
                diagnostic.reason.dimmed()
            );
        }
        total_rewrites += outcome.rewrites.len();
        total_diagnostics += outcome.diagnostics.len();
    }

    println!();
    println!(
        "{} unit(s), {} rewrite(s), {} left unchanged",
        outcomes.len().to_string().cyan(),
        total_rewrites.to_string().green(),
        total_diagnostics.to_string().yellow()
    );
    Ok(())
}

fn explain(sql: &str, config: &TranslatorConfig, format: OutputFormat) -> Result<()> {
    let stmt = match sqlshift::explain(sql) {
        Ok(stmt) => stmt,
        Err(e) => {
            println!("{} {}", "Left unchanged:".yellow().bold(), e);
            return Ok(());
        }
    };

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&stmt)?);
        return Ok(());
    }

    let syntax = FluentSyntax::new(config.render.clone());
    println!("{} {}", "Normalized:".dimmed(), stmt.sql.as_str().yellow());
    println!("{} {}", "Kind:".dimmed(), stmt.kind.to_string().cyan());
    let names = stmt.sql.placeholders().names();
    if !names.is_empty() {
        println!("{} {}", "Parameters:".dimmed(), names.join(", ").white());
    }
    println!(
        "{} {}",
        "Clauses:".dimmed(),
        serde_json::to_string(&stmt.clauses)?.dimmed()
    );
    println!();
    println!("{}", "Builder chain:".green().bold());
    for call in stmt.chain.calls() {
        let args: Vec<String> = call.args.iter().map(|a| syntax.emit_expr(a)).collect();
        println!("  .{}({})", call.method.cyan(), args.join(", "));
    }
    Ok(())
}

fn split_expression(expression: &str, format: OutputFormat) -> Result<()> {
    let predicates = split(expression);

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&predicates)?);
        return Ok(());
    }

    for (i, p) in predicates.iter().enumerate() {
        println!(
            "{:>3}  {:<4} {}",
            (i + 1).to_string().dimmed(),
            p.joiner.to_string().cyan(),
            p.text.white()
        );
    }
    Ok(())
}
