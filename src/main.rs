use declopt::utils::{self, LogLevel};

mod cmd;

/// brew - demo CLI built with declopt.
///
/// Layout:
///   brew [-v|-q] [--help] [--completion-script]
///   brew beans  [--roast R] [--origin O ...] [--json]
///   brew coffee [--size S] [--sugar ...] [DRINK ...]
///   brew coffee order [--to NAME] [--count N]
///   brew invalid          (entry fails to load, exit 2)
///
/// Env:
///   BREW_LOG     error|info|debug|trace, before any -v/-q is parsed
///   COMP_LINE / COMP_POINT   set by the shell while completing
///   SHELL / COMP_SCRIPT      pick and fill the completion snippet
///
/// Completion:
///   eval "$(brew --completion-script)"
fn main() {
    utils::init_logging(utils::level_from_env("BREW_LOG").unwrap_or(LogLevel::Info));

    match cmd::brew::script() {
        Ok(script) => script.main(),
        Err(e) => {
            let err = declopt::Error::from_anyhow(e);
            eprintln!("{err}");
            std::process::exit(err.code());
        }
    }
}
