//! Top-level command-line frontend.
//!
//! `mine [-v|--version] [-c|--config <PATH>]... <subject> <command> [args...]`
//!
//! The frontend parses global flags, resolves the merged configuration,
//! validates the subject, and hands the remaining argv to the command
//! registry. There is never a default subject: a missing or unknown name
//! prints the configured subjects and exits with the `option` status.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser};
use colored::Colorize;

use crate::commands;
use crate::config::{self, ConfigSet};
use crate::errors::{ExitStatus, MineError};

#[derive(Debug, Parser)]
#[command(
    name = "mine",
    about = "Drive dependence-graph extraction and pattern mining against configured subjects",
    disable_version_flag = true
)]
pub struct Cli {
    /// Print the version and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Additional configuration file(s), merged over the defaults in order
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Vec<PathBuf>,

    /// Subject to operate on
    #[arg(value_name = "SUBJECT")]
    pub subject: Option<String>,

    /// Command to run against the subject
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,

    /// Arguments for the command
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

fn command_summaries() -> String {
    let mut text = String::from("Commands:\n");
    for spec in commands::registry().specs() {
        text.push_str(&format!("  {:<10} {}\n", spec.name, spec.summary));
    }
    text
}

fn frontend() -> clap::Command {
    Cli::command().after_help(command_summaries())
}

/// Parse `argv` and run to completion, returning the exit status `main`
/// should report.
pub fn run<I, T>(argv: I) -> ExitStatus
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match frontend().try_get_matches_from(argv) {
        Ok(matches) => matches,
        Err(e) => {
            // clap routes help to stdout and errors to stderr itself
            let _ = e.print();
            return ExitStatus::Usage;
        }
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitStatus::Usage;
        }
    };

    // --version bypasses config loading and subject resolution entirely
    if cli.version {
        println!("mine {}", env!("CARGO_PKG_VERSION"));
        return ExitStatus::Version;
    }

    match dispatch(&cli) {
        Ok(()) => ExitStatus::Success,
        Err(e) => {
            report(&e);
            e.exit_status()
        }
    }
}

fn dispatch(cli: &Cli) -> Result<(), MineError> {
    let conf = config::load(&cli.config)?;
    warn_config_errors(&conf);

    let subject_name = cli.subject.as_deref().ok_or_else(|| MineError::MissingSubject {
        known: conf.subject_names(),
    })?;
    let subject = conf
        .subjects
        .get(subject_name)
        .ok_or_else(|| MineError::UnknownSubject {
            name: subject_name.to_string(),
            known: conf.subject_names(),
        })?;
    let command = cli.command.as_deref().ok_or_else(|| MineError::MissingCommand {
        known: commands::registry().names(),
    })?;

    commands::registry().dispatch(command, &cli.args, &conf, subject_name, subject)
}

fn warn_config_errors(conf: &ConfigSet) {
    for err in &conf.errors {
        eprintln!("{} {err}", "warning:".yellow().bold());
    }
}

fn report(err: &MineError) {
    match err {
        MineError::ConfigLoad { errors } => {
            eprintln!("{} {err}", "error:".red().bold());
            for source_err in errors {
                eprintln!("  {source_err}");
            }
        }
        MineError::MissingSubject { known } | MineError::UnknownSubject { known, .. } => {
            eprintln!("{} {err}", "error:".red().bold());
            print_known("subjects", known);
        }
        MineError::MissingCommand { known } | MineError::UnknownCommand { known, .. } => {
            eprintln!("{} {err}", "error:".red().bold());
            print_known("commands", known);
        }
        MineError::Usage { text, is_help } => {
            if *is_help {
                print!("{text}");
            } else {
                eprint!("{text}");
            }
        }
        MineError::ToolFailed { output, .. } => {
            eprintln!("{} {err}", "error:".red().bold());
            if !output.is_empty() {
                eprintln!("{}", output.trim_end());
            }
        }
        other => {
            eprintln!("{} {other}", "error:".red().bold());
            let mut source = std::error::Error::source(other);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
        }
    }
}

fn print_known(what: &str, known: &[String]) {
    if known.is_empty() {
        eprintln!("no {what} are configured");
    } else {
        eprintln!("valid {what}:");
        for name in known {
            eprintln!("  {name}");
        }
    }
}
