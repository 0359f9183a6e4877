/*!
`brew` - top-level script.

Flags:
  -v / --verbose       raise log level (repeatable)
  -q / --quiet         errors only
  -h / --help          usage
  --completion-script  print the bash/zsh registration snippet

Subcommands are compiled-in entries; `invalid` is declared on purpose with
an entry that fails, to show the load error path (exit 2).
*/

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::{Arc, OnceLock};

use declopt::help::{StyleOptions, usage};
use declopt::{App, CompletionRequest, Environment, ParseState, Script, Subcommand, completion_script};

use super::{beans, coffee};

struct BrewHooks;

impl declopt::Hooks for BrewHooks {
    fn post_process_argv(
        &self,
        app: &mut App,
        argv: &mut Vec<String>,
        state: &ParseState,
    ) -> Result<()> {
        super::verbosity_then_default(app, argv, state)
    }

    fn subcommands(&self) -> Option<Vec<Subcommand>> {
        Some(vec![
            Subcommand::entry("beans", beans::script, "List beans by roast and origin"),
            Subcommand::entry("coffee", coffee::script, "Brew a drink"),
            Subcommand::entry("invalid", broken_recipe, "Always fails to load"),
        ])
    }

    fn complete_reply(
        &self,
        script: &Script,
        request: &CompletionRequest,
        out: &mut dyn Write,
    ) -> Result<Option<i32>> {
        super::reply(script, request, out)
    }
}

fn broken_recipe() -> Result<Script> {
    anyhow::bail!("recipe file is corrupt")
}

pub fn script() -> Result<Script> {
    // Usage is rendered from the finished declaration, once.
    let help = Arc::new(OnceLock::<String>::new());
    let text = Arc::clone(&help);
    let script = Script::builder("brew")
        .described("verbose|v+", "Increase log verbosity (-v, -vv)")
        .described("quiet|q", "Only log errors")
        .described("help|h", "Print this help")
        .described("completion-script", "Print the shell completion snippet")
        .hooks(BrewHooks)
        .handler(move |app, args| handle(app, args, text.get().map_or("", String::as_str)))?;
    let _ = help.set(usage(&script, &StyleOptions::detect()));
    Ok(script)
}

fn handle(app: &mut App, args: Vec<String>, usage: &str) -> Result<i32> {
    if app.flag("completion-script") {
        let exe = std::env::current_exe()
            .context("Failed to locate the brew executable")?;
        print!(
            "{}",
            completion_script(&Environment::from_process(), &exe.to_string_lossy())
        );
        return Ok(0);
    }

    print!("{usage}");
    if !app.flag("help") && !args.is_empty() {
        // Only reachable when the first argument was a flag, e.g. `brew -v beans`.
        eprintln!("Subcommands must come first: {}", args.join(" "));
        return Ok(1);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> declopt::Result<i32> {
        script().unwrap().run_with(args.iter().copied(), &Environment::default())
    }

    #[test]
    fn dispatches_to_beans() {
        assert_eq!(run(&["beans", "--roast", "dark"]).unwrap(), 0);
    }

    #[test]
    fn unknown_subcommand_fails() {
        let err = run(&["tea"]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown subcommand: tea");
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn broken_entry_exits_2() {
        let err = run(&["invalid"]).unwrap_err();
        assert_eq!(err.code(), 2);
        assert_eq!(
            err.to_string(),
            "Unable to load subcommand invalid: recipe file is corrupt"
        );
    }

    #[test]
    fn help_uses_the_usage_rendered_at_declaration() {
        let mut app = App::new("brew", declopt::Frame::default());
        assert_eq!(handle(&mut app, vec![], "Usage: brew").unwrap(), 0);
        assert_eq!(handle(&mut app, vec!["stray".into()], "Usage: brew").unwrap(), 1);
        app.set("help", declopt::OptionValue::Flag(true));
        assert_eq!(handle(&mut app, vec!["stray".into()], "Usage: brew").unwrap(), 0);
        assert_eq!(run(&["--help"]).unwrap(), 0);
    }

    #[test]
    fn completes_subcommand_names() {
        let mut out = Vec::new();
        let s = script().unwrap();
        s.complete(&CompletionRequest::at_end("brew co"), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "coffee\n");
    }
}
