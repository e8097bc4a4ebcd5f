//! acpitree: print and query an ACPI namespace.
//!
//! The namespace is loaded from a snapshot file and served through the same
//! request/response channel a driver would expose, so every subcommand
//! exercises the full decode path.

mod cli;
mod fixture;

use std::io::{self, BufWriter, Write};

use acpi_namespace::channel::MemoryNamespace;
use acpi_namespace::walker::DEFAULT_MAX_DEPTH;
use acpi_namespace::{Client, NamespaceValue, Path, WalkOptions, Walker};
use anyhow::{Context, Result, bail};
use clap::Parser;
use env_logger::Env;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(&cli);

    let ns = fixture::load(&cli.fixture)?;
    let mut client = Client::new(ns);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.command {
        cli::Command::Tree(ref args) => cmd_tree(&mut client, &mut out, &cli, args),
        cli::Command::Eval(ref args) => cmd_eval(&mut client, &mut out, args),
        cli::Command::Type(ref args) => cmd_type(&mut client, &mut out, args),
        cli::Command::Find(ref args) => cmd_find(&mut client, &mut out, args),
    }?;
    out.flush()?;
    Ok(())
}

fn init_logging(cli: &cli::Cli) {
    let level = cli.log_level();
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(level.as_str()));
    builder.format_timestamp(None);
    builder.init();
}

fn parse_path(s: &str) -> Result<Path> {
    Path::parse(s).with_context(|| format!("invalid path {s:?}"))
}

/// Renders a path with the ACPI root prefix.
fn absolute(path: &Path) -> String {
    format!("\\\\{path}")
}

// ===========================================================================
// Subcommands
// ===========================================================================

/// Print the tree below the requested path, preceded by its root line.
fn cmd_tree(
    client: &mut Client<MemoryNamespace>,
    out: &mut impl Write,
    cli: &cli::Cli,
    args: &cli::TreeArgs,
) -> Result<()> {
    let start = args.path.as_deref().map(parse_path).transpose()?;
    let options = WalkOptions {
        max_depth: cli.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
    };

    let mut walker = Walker::new(client).with_options(options);
    let walk = walker.walk(start.as_ref())?;

    writeln!(out, "{}", absolute(&start.unwrap_or_default()))?;
    for line in walk {
        writeln!(out, "{}", line?)?;
    }
    Ok(())
}

/// Evaluate an object, optionally passing integer arguments.
fn cmd_eval(
    client: &mut Client<MemoryNamespace>,
    out: &mut impl Write,
    args: &cli::EvalArgs,
) -> Result<()> {
    let path = parse_path(&args.path)?;

    if args.raw {
        if !args.args.is_empty() {
            bail!("--raw cannot be combined with --arg");
        }
        let raw = client
            .evaluate(&path)
            .with_context(|| format!("evaluating {path}"))?;
        for (row, chunk) in raw.chunks(16).enumerate() {
            write!(out, "{:04x}:", row * 16)?;
            for byte in chunk {
                write!(out, " {byte:02x}")?;
            }
            writeln!(out)?;
        }
        return Ok(());
    }

    let value = if args.args.is_empty() {
        client.evaluate_value(&path)
    } else {
        let method_args: Vec<NamespaceValue> =
            args.args.iter().copied().map(NamespaceValue::Integer).collect();
        client.evaluate_with_args(&path, &method_args)
    }
    .with_context(|| format!("evaluating {path}"))?;

    match value {
        Some(value) => writeln!(out, "{value}")?,
        None => writeln!(out, "(no data)")?,
    }
    Ok(())
}

fn cmd_type(
    client: &mut Client<MemoryNamespace>,
    out: &mut impl Write,
    args: &cli::TypeArgs,
) -> Result<()> {
    let path = parse_path(&args.path)?;
    let kind = client
        .get_kind(&path)
        .with_context(|| format!("querying type of {path}"))?;
    writeln!(out, "{kind}")?;
    Ok(())
}

/// List every object with the given name, or the first one and its parent.
fn cmd_find(
    client: &mut Client<MemoryNamespace>,
    out: &mut impl Write,
    args: &cli::FindArgs,
) -> Result<()> {
    if args.parent {
        let Some((object, parent)) = client
            .locate(&args.name)
            .with_context(|| format!("locating {}", args.name))?
        else {
            bail!("no object named {}", args.name);
        };
        writeln!(out, "{}\t{}", absolute(&object), absolute(&parent))?;
        return Ok(());
    }

    let matches = client
        .find_objects(&args.name)
        .with_context(|| format!("searching for {}", args.name))?;
    if matches.is_empty() {
        bail!("no object named {}", args.name);
    }
    for object in matches {
        writeln!(out, "{}", absolute(&object))?;
    }
    Ok(())
}
