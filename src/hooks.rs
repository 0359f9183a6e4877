/*!
Hook points a script can override.

Every hook is a default method on [`Hooks`]; the default body is the
built-in behaviour. Two hooks have no built-in behaviour at all and return
`None` when left alone, which switches the feature off:

  subcommands     no table -> the script has no subcommands
  complete_reply  no reply -> shell completion is not offered

The built-in behaviours are also available in [`defaults`] so an override
can do its own work and then fall back.
*/

use std::io::Write;

use crate::app::{App, ExitValue};
use crate::complete::CompletionRequest;
use crate::parser::{ParseState, ParserMode};
use crate::script::Script;
use crate::subcommand::{Runnable, Subcommand};

/// Optional override points, consulted by the run engine at each stage.
pub trait Hooks: Send + Sync {
    /// Parser modes for this script.
    fn configure(&self, _app: &App) -> Vec<ParserMode> {
        defaults::configure()
    }

    /// Inspect or rewrite the raw argument vector before anything else runs.
    fn pre_process_argv(&self, _app: &mut App, _argv: &mut Vec<String>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Validate what the parser left behind.
    fn post_process_argv(
        &self,
        _app: &mut App,
        argv: &mut Vec<String>,
        state: &ParseState,
    ) -> anyhow::Result<()> {
        defaults::post_process_argv(argv, state)
    }

    /// Rewrite the exit value before it is normalised.
    fn post_process_exit_value(&self, _app: &mut App, value: ExitValue) -> anyhow::Result<ExitValue> {
        Ok(value)
    }

    /// Subcommand table, scanned in order. `None` disables dispatch.
    fn subcommands(&self) -> Option<Vec<Subcommand>> {
        None
    }

    /// Turn a matched descriptor into something runnable.
    fn load_subcommand(&self, subcommand: &Subcommand, _argv: &[String]) -> anyhow::Result<Runnable> {
        defaults::load_subcommand(subcommand)
    }

    /// Called when the first positional token names no subcommand.
    ///
    /// A numeric `Some` becomes the exit value and skips parsing and the
    /// handler; anything else lets the original argv continue down the
    /// regular path.
    fn unknown_subcommand(&self, _app: &mut App, argv: &[String]) -> anyhow::Result<Option<ExitValue>> {
        defaults::unknown_subcommand(argv)
    }

    /// Answer a shell completion request. `None` means completion is not
    /// handled by this script.
    fn complete_reply(
        &self,
        _script: &Script,
        _request: &CompletionRequest,
        _out: &mut dyn Write,
    ) -> anyhow::Result<Option<i32>> {
        Ok(None)
    }
}

/// Hooks with every built-in behaviour and no subcommands.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl Hooks for DefaultHooks {}

/// Built-in hook behaviours.
pub mod defaults {
    use super::*;
    use crate::error::Error;
    use crate::subcommand::Target;

    pub fn configure() -> Vec<ParserMode> {
        crate::parser::default_modes()
    }

    /// Reject a flag that slipped through pass-through parsing into the
    /// first positional slot. Flags further down the tail are left alone.
    pub fn post_process_argv(argv: &[String], state: &ParseState) -> anyhow::Result<()> {
        if state.valid
            && let Some(first) = argv.first()
            && first.starts_with('-')
        {
            return Err(Error::InvalidArgument(first.clone()).into());
        }
        Ok(())
    }

    pub fn load_subcommand(subcommand: &Subcommand) -> anyhow::Result<Runnable> {
        match subcommand.target() {
            Target::Entry(loader) => Ok(Runnable::Script(loader()?)),
            Target::Program(path) => {
                if !path.is_file() {
                    anyhow::bail!("{}: no such file", path.display());
                }
                Ok(Runnable::Program(path.clone()))
            }
        }
    }

    pub fn unknown_subcommand(argv: &[String]) -> anyhow::Result<Option<ExitValue>> {
        let token = argv.first().cloned().unwrap_or_default();
        Err(Error::UnknownSubcommand(token).into())
    }
}

/* --------------------------------- Tests ---------------------------------- */
