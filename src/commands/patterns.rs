//! `patterns`: mine frequent dependence-graph patterns and render them.

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::commands::{CommandContext, CommandSpec};
use crate::errors::MineError;
use crate::pipeline::{self, PipelineRequest};

pub(super) fn spec() -> CommandSpec {
    CommandSpec {
        name: "patterns",
        summary: "Mine frequent dependence-graph patterns and render them",
        schema,
        handler,
    }
}

fn schema() -> Command {
    Command::new("patterns")
        .about("Mine frequent dependence-graph patterns and render them")
        .override_usage(
            "mine <subject> patterns -o <DIR> [-m <INT>] [-p <PERCENT>] \
             [--no-build] [--jpdg-logs] [-- <engine-args>...]",
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory to write pattern visualizations into"),
        )
        .arg(
            Arg::new("minimum")
                .short('m')
                .long("minimum")
                .value_name("INT")
                .default_value("1")
                .value_parser(value_parser!(u64).range(1..))
                .help("Discard patterns observed at fewer call sites than this"),
        )
        .arg(
            Arg::new("pattern-min")
                .short('p')
                .long("pattern-min")
                .value_name("PERCENT")
                .default_value("50%")
                .help("Minimum support handed to the mining engine"),
        )
        .arg(
            Arg::new("no-build")
                .long("no-build")
                .action(ArgAction::SetTrue)
                .help("Skip building the slicing toolchain"),
        )
        .arg(
            Arg::new("jpdg-logs")
                .long("jpdg-logs")
                .action(ArgAction::SetTrue)
                .help("Stream tool output instead of capturing it"),
        )
        .arg(
            Arg::new("engine-args")
                .value_name("ARGS")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .help("Extra arguments passed through to the mining stage"),
        )
}

pub(crate) fn request_from_matches(matches: &ArgMatches) -> PipelineRequest {
    PipelineRequest {
        output_dir: matches
            .get_one::<PathBuf>("output")
            .expect("`output` is required")
            .clone(),
        minimum_sites: *matches
            .get_one::<u64>("minimum")
            .expect("`minimum` has a default"),
        pattern_min_support: matches
            .get_one::<String>("pattern-min")
            .expect("`pattern-min` has a default")
            .clone(),
        no_build: matches.get_flag("no-build"),
        show_logs: matches.get_flag("jpdg-logs"),
        extra_args: matches
            .get_many::<String>("engine-args")
            .map(|args| args.cloned().collect())
            .unwrap_or_default(),
    }
}

fn handler(ctx: CommandContext) -> Result<(), MineError> {
    let request = request_from_matches(&ctx.matches);
    let patterns = pipeline::run(ctx.conf, ctx.subject_name, ctx.subject, &request)?;

    for pattern in &patterns {
        println!(
            "{}\t{} site(s)\tsupport {}",
            pattern.id, pattern.sites, pattern.support
        );
    }
    Ok(())
}
