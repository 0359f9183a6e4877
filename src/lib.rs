/*!
declopt - declarative command-line scripts on top of clap.

A script declares its flags as compact rule strings, optionally a table of
subcommands, and one handler. The same declaration can be run as a
program (`Script::main`) or driven from tests (`Script::run_with`), any
number of times.

  let script = Script::builder("brew")
      .described("verbose|v+", "Increase verbosity")
      .hooks(BrewHooks)                      // subcommands, completion, ...
      .handler(|app, args| Ok(app.count("verbose")))?;
  script.main();

Layout:
  rules.rs       OptionRule / RuleSet (declaration strings)
  parser.rs      clap adapter, parser modes
  app.rs         invocation context, exit values
  hooks.rs       Hooks trait + built-in defaults
  subcommand.rs  descriptors, loading, resolution
  script.rs      Script declaration + run engine
  complete.rs    shell completion and registration snippets
  help.rs        usage text
  error.rs       Error (message + exit code)
  utils/         logging
*/

pub mod app;
pub mod complete;
pub mod error;
pub mod help;
pub mod hooks;
pub mod parser;
pub mod rules;
pub mod script;
pub mod subcommand;
pub mod utils;

pub use app::{App, ExitValue, Frame, OptionValue};
pub use complete::{CompletionRequest, Environment, complete_reply, completion_script};
pub use error::{Error, Result};
pub use hooks::{DefaultHooks, Hooks};
pub use parser::{ParseState, ParserMode};
pub use rules::{OptionRule, RuleKind, RuleSet};
pub use script::{Script, ScriptBuilder, exit_code};
pub use subcommand::{Runnable, Subcommand, Target};
