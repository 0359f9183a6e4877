/*!
Script declaration and the run engine.

A [`Script`] bundles a name, an ordered rule set, a handler and the hooks
that customise it. It is a reusable callable: every call to [`Script::run`]
starts from a fresh invocation context, so the same declaration can be
driven with any number of argument vectors.

One invocation:

  1. completion gate        complete_reply hook, only when COMP_POINT is set
  2. pre_process_argv       may rewrite argv
  3. subcommand resolution  may dispatch and skip 4-6
  4. configure + parse      flags into the context, argv keeps the tail
  5. post_process_argv      default rejects a leading leftover flag
  6. handler                skipped (exit 1) when the parse was invalid
  7. post_process_exit_value
  8. normalise              non-numeric -> 0, numbers truncated
*/

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::app::{App, ExitValue, Frame};
use crate::complete::{self, CompletionRequest, Environment};
use crate::error::{Error, Result};
use crate::hooks::{DefaultHooks, Hooks};
use crate::parser;
use crate::rules::{OptionRule, RuleSet};
use crate::subcommand::{self, Resolution};

/// Terminal handler: receives the context and the positional tail.
pub type Handler = Arc<dyn Fn(&mut App, Vec<String>) -> anyhow::Result<ExitValue> + Send + Sync>;

#[derive(Clone)]
pub struct Script {
    name: String,
    rules: RuleSet,
    handler: Handler,
    hooks: Arc<dyn Hooks>,
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl Script {
    /// Start declaring a script.
    pub fn builder(name: impl Into<String>) -> ScriptBuilder {
        ScriptBuilder {
            name: name.into(),
            rules: Vec::new(),
            hooks: Arc::new(DefaultHooks),
        }
    }

    /// Declare a script from rule strings and a handler in one go.
    pub fn declare<F, R>(name: impl Into<String>, rules: &[&str], handler: F) -> Result<Script>
    where
        F: Fn(&mut App, Vec<String>) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<ExitValue>,
    {
        rules
            .iter()
            .fold(Script::builder(name), |b, decl| b.option(decl))
            .handler(handler)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn hooks(&self) -> &dyn Hooks {
        self.hooks.as_ref()
    }

    /// Run against `argv` (program name excluded), reading completion
    /// inputs from the process environment.
    pub fn run<I, S>(&self, argv: I) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_with(argv, &Environment::from_process())
    }

    /// Run against `argv` with explicit environment inputs.
    pub fn run_with<I, S>(&self, argv: I, env: &Environment) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv = argv.into_iter().map(Into::into).collect();
        self.invoke(argv, env, Frame::default())
    }

    /// Run against the live process arguments and exit with the result.
    pub fn main(&self) -> ! {
        let argv: Vec<String> = std::env::args().skip(1).collect();
        let code = exit_code(self.run(argv));
        std::process::exit(code)
    }

    /// This script's completion path: its own `complete_reply` hook when it
    /// declares one, the built-in reply otherwise.
    pub fn complete(&self, request: &CompletionRequest, out: &mut dyn Write) -> Result<i32> {
        match self
            .hooks
            .complete_reply(self, request, out)
            .map_err(Error::from_anyhow)?
        {
            Some(code) => Ok(code),
            None => complete::complete_reply(self, request, out),
        }
    }

    pub(crate) fn invoke(&self, mut argv: Vec<String>, env: &Environment, frame: Frame) -> Result<i32> {
        let mut app = App::new(&self.name, frame);
        debug!(script = %self.name, depth = app.depth(), ?argv, "invocation started");

        if let Some(request) = env.completion_request() {
            let mut stdout = io::stdout().lock();
            if let Some(code) = self
                .hooks
                .complete_reply(self, &request, &mut stdout)
                .map_err(Error::from_anyhow)?
            {
                debug!(script = %self.name, code, "answered completion request");
                return Ok(code);
            }
        }

        self.hooks
            .pre_process_argv(&mut app, &mut argv)
            .map_err(Error::from_anyhow)?;

        let value = match subcommand::resolve(self, &mut app, &mut argv, env)? {
            Resolution::Dispatched(code) => ExitValue::Code(code as i64),
            Resolution::Handled(value) => value,
            Resolution::Continue => self.parse_and_handle(&mut app, argv)?,
        };

        let value = self
            .hooks
            .post_process_exit_value(&mut app, value)
            .map_err(Error::from_anyhow)?;
        let code = value.normalize();
        trace!(script = %self.name, ?value, code, "exit value normalised");
        Ok(code)
    }

    fn parse_and_handle(&self, app: &mut App, mut argv: Vec<String>) -> Result<ExitValue> {
        let modes = self.hooks.configure(app);
        let state = parser::parse(&self.rules, &modes, &mut argv, app);
        self.hooks
            .post_process_argv(app, &mut argv, &state)
            .map_err(Error::from_anyhow)?;

        if !state.valid {
            if let Some(message) = &state.message {
                eprintln!("{message}");
            }
            return Ok(ExitValue::Code(1));
        }

        debug!(script = %self.name, options = %app.to_json(), ?argv, "calling handler");
        (self.handler)(app, argv).map_err(Error::from_anyhow)
    }
}

/// Report a failed run on standard error and turn it into an exit code.
pub fn exit_code(result: Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.code()
        }
    }
}

/// Incremental declaration of a [`Script`].
pub struct ScriptBuilder {
    name: String,
    rules: Vec<Result<OptionRule>>,
    hooks: Arc<dyn Hooks>,
}

impl ScriptBuilder {
    /// Add a rule from its declaration string.
    pub fn option(mut self, decl: &str) -> Self {
        self.rules.push(OptionRule::parse(decl));
        self
    }

    /// Add a rule with a description.
    pub fn described(mut self, decl: &str, description: &str) -> Self {
        self.rules
            .push(OptionRule::parse(decl).map(|r| r.describe(description)));
        self
    }

    pub fn rule(mut self, rule: OptionRule) -> Self {
        self.rules.push(Ok(rule));
        self
    }

    pub fn hooks(mut self, hooks: impl Hooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Finish the declaration with its terminal handler.
    pub fn handler<F, R>(self, handler: F) -> Result<Script>
    where
        F: Fn(&mut App, Vec<String>) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<ExitValue>,
    {
        let mut rules = RuleSet::new();
        for rule in self.rules {
            rules.push(rule?)?;
        }
        Ok(Script {
            name: self.name,
            rules,
            handler: Arc::new(move |app: &mut App, argv: Vec<String>| {
                handler(app, argv).map(Into::<ExitValue>::into)
            }),
            hooks: self.hooks,
        })
    }
}

/* --------------------------------- Tests ---------------------------------- */
