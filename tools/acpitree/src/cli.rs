//! Command-line interface definitions for acpitree.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

/// Inspect an ACPI namespace snapshot.
#[derive(Parser)]
#[command(name = "acpitree", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Namespace snapshot to load (TOML).
    #[arg(long, short = 'f', global = true, default_value = "namespace.toml")]
    pub fixture: PathBuf,

    /// Stop descending below this many levels.
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    /// Only report errors.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase diagnostic output (`-v` for requests, `-vv` for everything).
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log level selected by `-q` / `-v`.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the namespace as a tree.
    Tree(TreeArgs),
    /// Evaluate an object and print its value.
    Eval(EvalArgs),
    /// Print the type of an object.
    Type(TypeArgs),
    /// Find every object with a given name.
    Find(FindArgs),
}

/// Arguments for the `tree` subcommand.
#[derive(Parser)]
pub struct TreeArgs {
    /// Start below this path instead of the root.
    pub path: Option<String>,
}

/// Arguments for the `eval` subcommand.
#[derive(Parser)]
pub struct EvalArgs {
    /// Object to evaluate.
    pub path: String,

    /// Integer argument passed to the method (repeatable).
    #[arg(long = "arg", short = 'a', value_parser = parse_integer)]
    pub args: Vec<u64>,

    /// Print the raw response as a hex dump.
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for the `type` subcommand.
#[derive(Parser)]
pub struct TypeArgs {
    /// Object to query.
    pub path: String,
}

/// Arguments for the `find` subcommand.
#[derive(Parser)]
pub struct FindArgs {
    /// Object name, such as `_DCK` or `LID0`.
    pub name: String,

    /// Print only the first match, followed by its parent.
    #[arg(long, short = 'p')]
    pub parent: bool,
}

/// Parses a decimal or `0x`-prefixed hexadecimal integer.
fn parse_integer(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid integer {s:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers() {
        assert_eq!(parse_integer("15"), Ok(15));
        assert_eq!(parse_integer("0x1f"), Ok(0x1F));
        assert!(parse_integer("zz").is_err());
    }

    #[test]
    fn verbosity_levels() {
        let cli = Cli::parse_from(["acpitree", "-vv", "tree"]);
        assert_eq!(cli.log_level(), LevelFilter::Trace);
        let cli = Cli::parse_from(["acpitree", "tree", "-q"]);
        assert_eq!(cli.log_level(), LevelFilter::Error);
        let cli = Cli::parse_from(["acpitree", "eval", "_SB_.LID0._LID", "-a", "1", "-a", "0x2"]);
        match cli.command {
            Command::Eval(args) => assert_eq!(args.args, [1, 2]),
            _ => panic!("expected eval"),
        }
    }
}
