//! `jpdg`: run the dependence-graph extraction tool for a subject.

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

use crate::commands::{CommandContext, CommandSpec};
use crate::errors::MineError;
use crate::invoke::{self, ToolInvoker};

pub(super) fn spec() -> CommandSpec {
    CommandSpec {
        name: "jpdg",
        summary: "Extract a program dependence graph for a subject",
        schema,
        handler,
    }
}

fn schema() -> Command {
    Command::new("jpdg")
        .about("Extract a program dependence graph for a subject")
        .override_usage("mine <subject> jpdg -o <PATH> [--no-build-jpdg] [--jpdg-logs]")
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Where to write the serialized dependence graph"),
        )
        .arg(
            Arg::new("no-build-jpdg")
                .long("no-build-jpdg")
                .action(ArgAction::SetTrue)
                .help("Skip building the extraction tool"),
        )
        .arg(
            Arg::new("jpdg-logs")
                .long("jpdg-logs")
                .action(ArgAction::SetTrue)
                .help("Stream tool output instead of capturing it"),
        )
}

fn handler(ctx: CommandContext) -> Result<(), MineError> {
    let output = ctx
        .matches
        .get_one::<PathBuf>("output")
        .expect("`output` is required");
    let show_logs = ctx.matches.get_flag("jpdg-logs");

    let home = invoke::jpdg_home();
    let invoker = ToolInvoker::new(show_logs);

    if ctx.matches.get_flag("no-build-jpdg") {
        log::info!("skipping jpdg build (--no-build-jpdg)");
    } else {
        invoker.build("jpdg", &mut invoke::build_toolchain_cmd(&home))?;
    }
    invoker.run(
        "jpdg extraction",
        &mut invoke::extract_cmd(&home, ctx.subject, output),
    )?;

    println!(
        "{}: wrote dependence graph to {}",
        ctx.subject_name,
        output.display()
    );
    Ok(())
}
