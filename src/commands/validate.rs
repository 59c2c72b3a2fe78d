//! `validate`: print the resolved subject's effective configuration.

use clap::Command;

use crate::commands::{CommandContext, CommandSpec};
use crate::errors::MineError;

pub(super) fn spec() -> CommandSpec {
    CommandSpec {
        name: "validate",
        summary: "Print the resolved configuration for a subject",
        schema,
        handler,
    }
}

fn schema() -> Command {
    Command::new("validate")
        .about("Print the resolved configuration for a subject")
        .override_usage("mine <subject> validate")
}

fn handler(ctx: CommandContext) -> Result<(), MineError> {
    let subject = ctx.subject;
    println!("subject {}", subject.name);
    println!("  base_dir:   {}", subject.base_dir.display());
    println!("  classpath:  {}", subject.classpath);
    for dir in &subject.lib_dirs {
        println!("  lib_dir:    {}", dir.display());
    }
    for dir in &subject.class_dirs {
        println!("  class_dir:  {}", dir.display());
    }
    println!("  target:     {}", subject.target.display());
    Ok(())
}
