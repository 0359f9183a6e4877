/*!
Adapter between declared option rules and `clap`.

The rule set is turned into a runtime `clap::Command` that has no binary
name, no built-in help/version flags and one trailing positional that
collects everything the rules do not consume. Parser modes tune that
command:

  Bundling      -abc is three short flags (otherwise read as --abc)
  AutoAbbrev    unambiguous prefixes of long flags are accepted
  IgnoreCase    long flag names match regardless of case
  PassThrough   unknown flags are left in the positional tail
  RequireOrder  parsing stops at the first positional token

After a successful parse the argument vector holds exactly the unconsumed
tokens in their original relative order, and the parsed values are written
into the invocation context under each rule's canonical name.
*/

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, Command};
use tracing::{debug, trace};

use crate::app::{App, OptionValue};
use crate::rules::{RuleKind, RuleSet};

const REST_ID: &str = "__declopt_rest";

/// Parsing behaviours a script can switch on through the `configure` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserMode {
    Bundling,
    AutoAbbrev,
    IgnoreCase,
    PassThrough,
    RequireOrder,
}

/// Default configuration: bundling, pass-through, stop at the first
/// positional; no abbreviation, case-sensitive.
pub fn default_modes() -> Vec<ParserMode> {
    vec![
        ParserMode::Bundling,
        ParserMode::PassThrough,
        ParserMode::RequireOrder,
    ]
}

/// Outcome handed to the `post_process_argv` hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseState {
    pub valid: bool,
    /// Parser diagnostic when `valid` is false.
    pub message: Option<String>,
}

/// Parse `argv` against `rules`, consuming recognised flags.
///
/// On failure `argv` is left untouched and the context receives nothing.
pub fn parse(
    rules: &RuleSet,
    modes: &[ParserMode],
    argv: &mut Vec<String>,
    app: &mut App,
) -> ParseState {
    let input = normalize_tokens(rules, modes, argv);
    trace!(?input, ?modes, "parsing argument vector");

    let cmd = build_command(app.script(), rules, modes);
    let matches = match cmd.try_get_matches_from(input) {
        Ok(m) => m,
        Err(e) => {
            let message = e
                .to_string()
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ")
                .to_string();
            debug!(%message, "parser rejected arguments");
            return ParseState {
                valid: false,
                message: Some(message),
            };
        }
    };

    for rule in rules {
        let id = rule.name();
        if matches.value_source(id) != Some(ValueSource::CommandLine) {
            continue;
        }
        let value = match rule.kind() {
            RuleKind::Bool => OptionValue::Flag(matches.get_flag(id)),
            RuleKind::Counter => OptionValue::Count(matches.get_count(id)),
            RuleKind::Str => match matches.get_one::<String>(id) {
                Some(s) => OptionValue::Str(s.clone()),
                None => continue,
            },
            RuleKind::StrList => OptionValue::List(
                matches
                    .get_many::<String>(id)
                    .map(|vals| vals.cloned().collect())
                    .unwrap_or_default(),
            ),
        };
        app.set(id, value);
    }

    *argv = matches
        .get_many::<String>(REST_ID)
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();

    ParseState {
        valid: true,
        message: None,
    }
}

fn build_command(name: &str, rules: &RuleSet, modes: &[ParserMode]) -> Command {
    let mut cmd = Command::new(name.to_string())
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args_override_self(true)
        .dont_delimit_trailing_values(true)
        .infer_long_args(modes.contains(&ParserMode::AutoAbbrev));

    for rule in rules {
        let mut arg = Arg::new(rule.name().to_string()).required(false);

        let mut longs = rule.longs();
        if let Some(first) = longs.next() {
            arg = arg.long(first.to_string());
        }
        for alias in longs {
            arg = arg.alias(alias.to_string());
        }

        let mut shorts = rule.shorts();
        if let Some(first) = shorts.next() {
            arg = arg.short(first);
        }
        for alias in shorts {
            arg = arg.short_alias(alias);
        }

        arg = match rule.kind() {
            RuleKind::Bool => arg.action(ArgAction::SetTrue),
            RuleKind::Counter => arg.action(ArgAction::Count),
            RuleKind::Str => arg
                .action(ArgAction::Set)
                .num_args(1)
                .allow_hyphen_values(true)
                .value_parser(clap::value_parser!(String)),
            RuleKind::StrList => arg
                .action(ArgAction::Append)
                .num_args(1)
                .allow_hyphen_values(true)
                .value_parser(clap::value_parser!(String)),
        };
        if let Some(desc) = rule.description() {
            arg = arg.help(desc.to_string());
        }
        cmd = cmd.arg(arg);
    }

    let mut rest = Arg::new(REST_ID)
        .action(ArgAction::Append)
        .num_args(1..)
        .required(false)
        .value_parser(clap::value_parser!(String));
    if modes.contains(&ParserMode::PassThrough) {
        rest = rest.allow_hyphen_values(true);
    }
    if modes.contains(&ParserMode::RequireOrder) {
        rest = rest.trailing_var_arg(true);
    }
    cmd.arg(rest)
}

/// Rewrite tokens for modes clap has no switch for, and split short
/// bundles so an attached value (`-nabc`, `-vnabc`) never reaches clap as
/// one token. Only the flag region is touched: with `RequireOrder`
/// everything after the first positional is passed through verbatim.
fn normalize_tokens(rules: &RuleSet, modes: &[ParserMode], argv: &[String]) -> Vec<String> {
    let bundling = modes.contains(&ParserMode::Bundling);
    let ignore_case = modes.contains(&ParserMode::IgnoreCase);
    let require_order = modes.contains(&ParserMode::RequireOrder);

    let mut out = Vec::with_capacity(argv.len());
    let mut in_flags = true;
    let mut expect_value = false;
    for token in argv {
        if !in_flags || token == "--" {
            in_flags = false;
            out.push(token.clone());
            continue;
        }
        if expect_value {
            expect_value = false;
            out.push(token.clone());
            continue;
        }

        let mut tok = token.clone();
        if is_bundle(&tok) {
            if bundling {
                expect_value = split_bundle(rules, &tok, &mut out);
                continue;
            }
            // Without bundling "-abc" names a single long option.
            tok = format!("-{tok}");
        }
        if ignore_case && let Some(folded) = fold_case(rules, &tok) {
            tok = folded;
        }
        expect_value = tok
            .strip_prefix("--")
            .or_else(|| tok.strip_prefix('-'))
            .filter(|name| !name.contains('='))
            .and_then(|name| rules.find(name))
            .is_some_and(|r| r.kind().takes_value());

        if require_order && !tok.starts_with('-') {
            in_flags = false;
        }
        out.push(tok);
    }
    out
}

/// Expand `-vnabc` into `-v -n abc` using the declared short names. The
/// first undeclared character keeps the rest of the bundle as one token.
/// Returns true when the last flag emitted still waits for its value.
fn split_bundle(rules: &RuleSet, token: &str, out: &mut Vec<String>) -> bool {
    let body = &token[1..];
    for (i, c) in body.char_indices() {
        let Some(rule) = rules.iter().find(|r| r.shorts().any(|s| s == c)) else {
            out.push(format!("-{}", &body[i..]));
            return false;
        };
        out.push(format!("-{c}"));
        if rule.kind().takes_value() {
            let rest = &body[i + c.len_utf8()..];
            if rest.is_empty() {
                return true;
            }
            out.push(rest.to_string());
            return false;
        }
    }
    false
}

/// Map `--NAME[=value]` onto the declared spelling of a long flag.
fn fold_case(rules: &RuleSet, token: &str) -> Option<String> {
    let long = token.strip_prefix("--")?;
    let (name, value) = match long.split_once('=') {
        Some((n, v)) => (n, Some(v)),
        None => (long, None),
    };
    let declared = rules
        .iter()
        .flat_map(|r| r.longs())
        .find(|l| l.eq_ignore_ascii_case(name))?;
    Some(match value {
        Some(v) => format!("--{declared}={v}"),
        None => format!("--{declared}"),
    })
}

fn is_bundle(token: &str) -> bool {
    token.len() > 2 && token.starts_with('-') && !token.starts_with("--")
}

/* --------------------------------- Tests ---------------------------------- */
