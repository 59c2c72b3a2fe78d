//! Subcommand table and dispatch.
//!
//! Subcommands live in a static, enumerable table built once at startup:
//! each entry carries a name, a one-line summary, a clap schema (which owns
//! the usage text), and a handler. Dispatch looks the table up by name,
//! parses the remaining argv against the schema, and hands the handler an
//! already-resolved [`CommandContext`]. Handlers never re-validate global
//! flags.

use clap::ArgMatches;
use once_cell::sync::Lazy;

use crate::config::{ConfigSet, Subject};
use crate::errors::MineError;

pub mod jpdg;
pub mod patterns;
pub mod validate;

/// Everything a handler needs, parsed and resolved by the frontend.
pub struct CommandContext<'a> {
    pub matches: ArgMatches,
    pub conf: &'a ConfigSet,
    pub subject_name: &'a str,
    pub subject: &'a Subject,
}

type Handler = fn(CommandContext) -> Result<(), MineError>;

/// One registered subcommand.
pub struct CommandSpec {
    pub name: &'static str,
    pub summary: &'static str,
    schema: fn() -> clap::Command,
    handler: Handler,
}

/// The table of registered subcommands.
pub struct CommandRegistry {
    specs: Vec<CommandSpec>,
}

static REGISTRY: Lazy<CommandRegistry> = Lazy::new(CommandRegistry::builtin);

/// The process-wide registry, built on first use.
pub fn registry() -> &'static CommandRegistry {
    &REGISTRY
}

impl CommandRegistry {
    /// All built-in commands.
    pub fn builtin() -> Self {
        let mut registry = Self { specs: Vec::new() };
        registry.register(validate::spec());
        registry.register(jpdg::spec());
        registry.register(patterns::spec());
        registry
    }

    pub fn register(&mut self, spec: CommandSpec) {
        self.specs.push(spec);
    }

    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name.to_string()).collect()
    }

    pub fn specs(&self) -> impl Iterator<Item = &CommandSpec> {
        self.specs.iter()
    }

    pub fn find(&self, name: &str) -> Option<&CommandSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Parse `argv` against the named command's schema and invoke its
    /// handler. `-h`/`--help` and option errors surface the rendered clap
    /// output without running the handler.
    pub fn dispatch(
        &self,
        name: &str,
        argv: &[String],
        conf: &ConfigSet,
        subject_name: &str,
        subject: &Subject,
    ) -> Result<(), MineError> {
        let Some(spec) = self.find(name) else {
            return Err(MineError::UnknownCommand {
                name: name.to_string(),
                known: self.names(),
            });
        };

        let full_argv = std::iter::once(name.to_string()).chain(argv.iter().cloned());
        let matches = match (spec.schema)().try_get_matches_from(full_argv) {
            Ok(matches) => matches,
            Err(e) => {
                let is_help = matches!(
                    e.kind(),
                    clap::error::ErrorKind::DisplayHelp
                        | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                );
                return Err(MineError::Usage {
                    text: e.render().to_string(),
                    is_help,
                });
            }
        };

        (spec.handler)(CommandContext {
            matches,
            conf,
            subject_name,
            subject,
        })
    }
}
