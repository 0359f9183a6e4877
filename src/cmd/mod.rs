/*!
Scripts making up the `brew` demo binary.

  brew                      top-level script (usage, completion snippet)
  brew beans [--json] ...   list beans by roast / origin
  brew coffee ...           brew a drink; nested `order` subcommand
  brew invalid              declared, but its entry fails to load

Conventions:
  - Each module exposes one `script()` entry returning `anyhow::Result<Script>`
    so it can be used directly as a subcommand loader.
  - Every script answers shell completion with the built-in reply.
  - Scripts with `verbose|v+` / `quiet|q` raise the log level after parsing.
*/

pub mod beans;
pub mod brew;
pub mod coffee;

use declopt::hooks::defaults;
use declopt::utils::{derive_level, set_log_level};
use declopt::{App, CompletionRequest, ParseState, Script};

/// Built-in completion reply, shared by every demo script.
pub(crate) fn reply(
    script: &Script,
    request: &CompletionRequest,
    out: &mut dyn std::io::Write,
) -> anyhow::Result<Option<i32>> {
    Ok(Some(declopt::complete_reply(script, request, out)?))
}

/// Apply `-v` / `-q` once flags are parsed, then run the default check.
/// Without either flag the level from `BREW_LOG` stays in effect.
pub(crate) fn verbosity_then_default(
    app: &App,
    argv: &[String],
    state: &ParseState,
) -> anyhow::Result<()> {
    let (verbose, quiet) = (app.count("verbose"), app.flag("quiet"));
    if state.valid && (verbose > 0 || quiet) {
        set_log_level(derive_level(verbose, quiet));
    }
    defaults::post_process_argv(argv, state)
}
