/*!
Subcommand descriptors and the resolver.

A script declares its subcommands through the `subcommands` hook as an
ordered list of (name, target, description) descriptors. Before any flag
parsing the resolver looks at the first token of the argument vector:

  no table / empty table     -> regular parsing, argv untouched
  no token, or a flag        -> regular parsing, argv untouched
  token names a descriptor   -> token removed, target loaded and run
  token names nothing        -> `unknown_subcommand` hook decides

Names are matched by exact string equality in declaration order; the
first match wins.

Targets are either compiled-in entry functions that declare a fresh
[`Script`], or external programs run as a child process with the
remaining argv and inherited standard streams.
*/

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::app::{App, ExitValue, Frame};
use crate::complete::{CompletionRequest, Environment};
use crate::error::{Error, Result};
use crate::script::Script;

/// Entry function declaring a subcommand's script.
pub type Loader = Arc<dyn Fn() -> anyhow::Result<Script> + Send + Sync>;

/// What a descriptor points at.
#[derive(Clone)]
pub enum Target {
    Entry(Loader),
    Program(PathBuf),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Entry(_) => f.write_str("Entry(..)"),
            Target::Program(p) => f.debug_tuple("Program").field(p).finish(),
        }
    }
}

/// A declared subcommand.
#[derive(Debug, Clone)]
pub struct Subcommand {
    name: String,
    target: Target,
    description: String,
}

impl Subcommand {
    pub fn new(name: impl Into<String>, target: Target, description: impl Into<String>) -> Self {
        Subcommand {
            name: name.into(),
            target,
            description: description.into(),
        }
    }

    /// Subcommand backed by a compiled-in entry function.
    pub fn entry<F>(name: impl Into<String>, loader: F, description: impl Into<String>) -> Self
    where
        F: Fn() -> anyhow::Result<Script> + Send + Sync + 'static,
    {
        Self::new(name, Target::Entry(Arc::new(loader)), description)
    }

    /// Subcommand backed by an external executable.
    pub fn program(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(name, Target::Program(path.as_ref().to_path_buf()), description)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A loaded subcommand, ready to run or to answer completion.
#[derive(Debug, Clone)]
pub enum Runnable {
    Script(Script),
    Program(PathBuf),
}

impl Runnable {
    pub(crate) fn run(
        &self,
        name: &str,
        argv: Vec<String>,
        env: &Environment,
        frame: Frame,
    ) -> Result<i32> {
        match self {
            Runnable::Script(script) => script.invoke(argv, env, frame),
            Runnable::Program(path) => {
                let status = Command::new(path)
                    .args(&argv)
                    .status()
                    .map_err(|e| Error::load(name, e))?;
                Ok(status.code().unwrap_or(1))
            }
        }
    }

    pub(crate) fn complete(
        &self,
        name: &str,
        request: &CompletionRequest,
        out: &mut dyn Write,
    ) -> Result<i32> {
        match self {
            Runnable::Script(script) => script.complete(request, out),
            Runnable::Program(path) => {
                let output = Command::new(path)
                    .env("COMP_LINE", request.line())
                    .env("COMP_POINT", request.point().to_string())
                    .output()
                    .map_err(|e| Error::load(name, e))?;
                out.write_all(&output.stdout)
                    .map_err(|e| Error::Other(e.into()))?;
                Ok(0)
            }
        }
    }
}

/// Outcome of looking at the first token.
#[derive(Debug)]
pub(crate) enum Resolution {
    /// A subcommand ran; its exit code.
    Dispatched(i32),
    /// `unknown_subcommand` produced a numeric exit value.
    Handled(ExitValue),
    /// Carry on with flag parsing and the handler.
    Continue,
}

/// First descriptor named `token`, in declaration order.
pub fn find<'a>(table: &'a [Subcommand], token: &str) -> Option<&'a Subcommand> {
    table.iter().find(|s| s.name == token)
}

/// Whether a token may name a subcommand at all. Flags never do.
pub(crate) fn is_candidate(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Load `subcommand` through the script's hook. Any failure becomes a
/// load error naming the subcommand.
pub(crate) fn load(script: &Script, subcommand: &Subcommand, argv: &[String]) -> Result<Runnable> {
    script
        .hooks()
        .load_subcommand(subcommand, argv)
        .map_err(|e| match Error::from_anyhow(e) {
            err @ Error::LoadSubcommand { .. } => err,
            other => Error::load(subcommand.name(), other),
        })
}

pub(crate) fn resolve(
    script: &Script,
    app: &mut App,
    argv: &mut Vec<String>,
    env: &Environment,
) -> Result<Resolution> {
    let Some(table) = script.hooks().subcommands().filter(|t| !t.is_empty()) else {
        trace!(script = script.name(), "no subcommands declared");
        return Ok(Resolution::Continue);
    };
    let Some(first) = argv.first() else {
        return Ok(Resolution::Continue);
    };
    if first.starts_with('-') {
        return Ok(Resolution::Continue);
    }

    let matched = if is_candidate(first) {
        find(&table, first)
    } else {
        None
    };

    match matched {
        Some(subcommand) => {
            let name = argv.remove(0);
            let runnable = load(script, subcommand, argv)?;
            let frame = app.frame().enter(&name);
            debug!(subcommand = %name, depth = frame.depth(), ?argv, "dispatching subcommand");
            let code = runnable.run(&name, std::mem::take(argv), env, frame)?;
            Ok(Resolution::Dispatched(code))
        }
        None => {
            debug!(token = %first, "unknown subcommand");
            let value = script
                .hooks()
                .unknown_subcommand(app, argv)
                .map_err(Error::from_anyhow)?;
            match value {
                Some(v) if v.is_numeric() => Ok(Resolution::Handled(v)),
                _ => Ok(Resolution::Continue),
            }
        }
    }
}

/* --------------------------------- Tests ---------------------------------- */
#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<Subcommand> {
        vec![
            Subcommand::program("beans", "/bin/beans", "first"),
            Subcommand::program("coffee", "/bin/coffee", "second"),
            Subcommand::program("coffee", "/bin/decaf", "shadowed"),
        ]
    }

    #[test]
    fn first_match_wins() {
        let t = table();
        let hit = find(&t, "coffee").unwrap();
        assert_eq!(hit.description(), "second");
        assert!(find(&t, "cof").is_none(), "no prefix matching");
        assert!(find(&t, "tea").is_none());
    }

    #[test]
    fn flags_are_never_candidates() {
        assert!(is_candidate("coffee"));
        assert!(is_candidate("_private"));
        assert!(!is_candidate("-v"));
        assert!(!is_candidate("--coffee"));
        assert!(!is_candidate(""));
    }

    #[test]
    fn target_debug_hides_loader() {
        let sub = Subcommand::entry("x", || anyhow::bail!("never"), "desc");
        assert_eq!(format!("{:?}", sub.target()), "Entry(..)");
    }
}
