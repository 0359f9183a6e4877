use std::sync::{Arc, Mutex};

use declopt::{App, Environment, ExitValue, Hooks, Script, Subcommand, exit_code};

type Seen = Arc<Mutex<Vec<(String, Vec<String>, usize)>>>;

fn recorder(name: &'static str, seen: &Seen) -> Script {
    let sink = Arc::clone(seen);
    Script::declare(name, &["verbose|v+"], move |app, args| {
        sink.lock().unwrap().push((name.to_string(), args.clone(), app.depth()));
        Ok(args.len() as i64)
    })
    .unwrap()
}

struct Cafe {
    seen: Seen,
}

impl Hooks for Cafe {
    fn subcommands(&self) -> Option<Vec<Subcommand>> {
        let beans = Arc::clone(&self.seen);
        let coffee = Arc::clone(&self.seen);
        Some(vec![
            Subcommand::entry("beans", move || Ok(recorder("beans", &beans)), "beans"),
            Subcommand::entry("coffee", move || Ok(recorder("coffee", &coffee)), "coffee"),
            Subcommand::entry("invalid", || anyhow::bail!("syntax error"), "broken"),
            Subcommand::program("ghost", "/nonexistent/declopt/ghost", "missing"),
        ])
    }
}

fn cafe() -> (Script, Seen) {
    let seen: Seen = Arc::default();
    let script = Script::builder("cmd")
        .option("verbose|v+")
        .hooks(Cafe {
            seen: Arc::clone(&seen),
        })
        .handler(|_, _| Ok(99))
        .unwrap();
    (script, seen)
}

fn run(script: &Script, argv: &[&str]) -> declopt::Result<i32> {
    script.run_with(argv.iter().copied(), &Environment::default())
}

#[test]
fn handler_receives_flags_and_tail_in_order() {
    let captured = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);
    let script = Script::declare("t", &["name|n=s", "tag|t=s@", "dry-run"], move |app, args| {
        *sink.lock().unwrap() = Some((app.to_json(), args));
        Ok(())
    })
    .unwrap();

    let code = run(&script, &["--dry-run", "-t", "a", "--name=x", "-t", "b", "one", "two"]).unwrap();
    assert_eq!(code, 0);

    let (opts, args) = captured.lock().unwrap().take().unwrap();
    assert_eq!(
        opts,
        serde_json::json!({"dry-run": true, "name": "x", "tag": ["a", "b"]})
    );
    assert_eq!(args, ["one", "two"]);
}

#[test]
fn leading_flag_without_subcommands_parses_normally() {
    let script = Script::declare("t", &["verbose|v+"], |app, args| {
        Ok(app.count("verbose") as i64 * 10 + args.len() as i64)
    })
    .unwrap();
    assert_eq!(run(&script, &["-v", "x"]).unwrap(), 11);
}

#[test]
fn leading_flag_with_subcommands_skips_resolution() {
    let (script, seen) = cafe();
    assert_eq!(run(&script, &["-v"]).unwrap(), 99);
    assert_eq!(run(&script, &[]).unwrap(), 99);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn matched_subcommand_gets_the_rest() {
    let (script, seen) = cafe();
    assert_eq!(run(&script, &["coffee", "b", "42"]).unwrap(), 2);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (name, args, depth) = &seen[0];
    assert_eq!(name, "coffee");
    assert_eq!(args, &["b", "42"]);
    assert_eq!(*depth, 1);
}

#[test]
fn parent_flags_are_not_parsed_on_dispatch() {
    let (script, seen) = cafe();
    assert_eq!(run(&script, &["beans", "-v", "x"]).unwrap(), 1);
    assert_eq!(seen.lock().unwrap()[0].1, ["x"]);
}

#[test]
fn unknown_subcommand_fails_with_code_1() {
    let (script, _) = cafe();
    let err = run(&script, &["nope"]).unwrap_err();
    assert_eq!(err.to_string(), "Unknown subcommand: nope");
    assert_eq!(exit_code(Err(err)), 1);
}

#[test]
fn subcommand_names_match_exactly() {
    let (script, _) = cafe();
    let err = run(&script, &["Coffee"]).unwrap_err();
    assert_eq!(err.to_string(), "Unknown subcommand: Coffee");
}

#[test]
fn load_failure_exits_2() {
    let (script, _) = cafe();
    let err = run(&script, &["invalid"]).unwrap_err();
    assert_eq!(err.code(), 2);
    assert!(err.to_string().starts_with("Unable to load subcommand invalid:"));
    assert!(err.to_string().contains("syntax error"));
}

#[test]
fn missing_program_exits_2() {
    let (script, _) = cafe();
    let err = run(&script, &["ghost", "a"]).unwrap_err();
    assert_eq!(err.code(), 2);
    assert!(err.to_string().starts_with("Unable to load subcommand ghost:"));
}

#[test]
fn load_failure_is_fatal_even_with_unknown_override() {
    struct Lenient;
    impl Hooks for Lenient {
        fn subcommands(&self) -> Option<Vec<Subcommand>> {
            Some(vec![Subcommand::entry("invalid", || anyhow::bail!("boom"), "")])
        }
        fn unknown_subcommand(&self, _app: &mut App, _argv: &[String]) -> anyhow::Result<Option<ExitValue>> {
            Ok(Some(ExitValue::Code(0)))
        }
    }
    let script = Script::builder("t").hooks(Lenient).handler(|_, _| Ok(5)).unwrap();
    assert_eq!(run(&script, &["invalid"]).unwrap_err().code(), 2);
    assert_eq!(run(&script, &["other"]).unwrap(), 0);
}

#[test]
fn unknown_override_falls_through_to_handler() {
    struct Open;
    impl Hooks for Open {
        fn subcommands(&self) -> Option<Vec<Subcommand>> {
            Some(vec![Subcommand::entry("real", || anyhow::bail!("unused"), "")])
        }
        fn unknown_subcommand(&self, _app: &mut App, _argv: &[String]) -> anyhow::Result<Option<ExitValue>> {
            Ok(Some(ExitValue::Text("no opinion".into())))
        }
    }
    let script = Script::builder("t")
        .hooks(Open)
        .handler(|_, args| Ok(args.join(",")))
        .unwrap();
    // Non-numeric override: the token stays and reaches the handler.
    assert_eq!(run(&script, &["7", "x"]).unwrap(), 0);

    let counted = Script::builder("t")
        .hooks(Open)
        .handler(|_, args| Ok(args.len() as i64))
        .unwrap();
    assert_eq!(run(&counted, &["other", "x", "y"]).unwrap(), 3);
}

#[test]
fn nested_load_errors_propagate_unchanged() {
    struct Outer;
    impl Hooks for Outer {
        fn subcommands(&self) -> Option<Vec<Subcommand>> {
            Some(vec![Subcommand::entry("mid", mid, "")])
        }
    }
    struct Mid;
    impl Hooks for Mid {
        fn subcommands(&self) -> Option<Vec<Subcommand>> {
            Some(vec![Subcommand::entry("leaf", || anyhow::bail!("leaf is broken"), "")])
        }
    }
    fn mid() -> anyhow::Result<Script> {
        Ok(Script::builder("mid").hooks(Mid).handler(|_, _| Ok(0))?)
    }

    let script = Script::builder("top").hooks(Outer).handler(|_, _| Ok(0)).unwrap();
    let err = run(&script, &["mid", "leaf"]).unwrap_err();
    assert_eq!(err.code(), 2);
    assert_eq!(err.to_string(), "Unable to load subcommand leaf: leaf is broken");
}

#[test]
fn reusable_calls_do_not_interfere() {
    let (script, seen) = cafe();
    assert_eq!(run(&script, &["beans", "a"]).unwrap(), 1);
    assert_eq!(run(&script, &["coffee", "b", "c"]).unwrap(), 2);
    assert_eq!(run(&script, &["-v"]).unwrap(), 99);

    let seen = seen.lock().unwrap();
    let names: Vec<&str> = seen.iter().map(|(n, _, _)| n.as_str()).collect();
    assert_eq!(names, ["beans", "coffee"]);
    assert_eq!(seen[1].1, ["b", "c"]);
}

#[test]
fn leftover_leading_flag_is_invalid() {
    let script = Script::declare("t", &["v"], |_, _| Ok(0)).unwrap();
    let err = run(&script, &["-v", "--invalid"]).unwrap_err();
    assert!(err.to_string().contains("Invalid argument or argument order: --invalid"));
    assert_eq!(err.code(), 1);
}

#[test]
fn trailing_flag_after_positional_is_allowed() {
    let script = Script::declare("t", &["v"], |_, args| Ok(args.len() as i64)).unwrap();
    assert_eq!(run(&script, &["file", "--late"]).unwrap(), 2);
}

#[test]
fn non_numeric_return_normalizes_to_zero() {
    for value in ["", "ok", "1e", "NaN"] {
        let script = Script::declare("t", &[], move |_, _| Ok(value)).unwrap();
        assert_eq!(run(&script, &[]).unwrap(), 0, "{value:?}");
    }
    let script = Script::declare("t", &[], |_, _| Ok(3.9)).unwrap();
    assert_eq!(run(&script, &[]).unwrap(), 3);
}

#[test]
fn attached_short_value_reaches_handler() {
    let captured = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);
    let script = Script::declare("t", &["name|n=s", "v"], move |app, args| {
        *sink.lock().unwrap() = Some((app.to_json(), args));
        Ok(())
    })
    .unwrap();

    assert_eq!(run(&script, &["-vnabc", "x"]).unwrap(), 0);
    let (opts, args) = captured.lock().unwrap().take().unwrap();
    assert_eq!(opts, serde_json::json!({"name": "abc", "v": true}));
    assert_eq!(args, ["x"]);
}

#[cfg(unix)]
struct Shell;

#[cfg(unix)]
impl Hooks for Shell {
    fn subcommands(&self) -> Option<Vec<Subcommand>> {
        Some(vec![Subcommand::program("sh", "/bin/sh", "system shell")])
    }
}

#[cfg(unix)]
#[test]
fn program_exit_code_is_forwarded() {
    let script = Script::builder("t").hooks(Shell).handler(|_, _| Ok(99)).unwrap();
    assert_eq!(run(&script, &["sh", "-c", "exit 7"]).unwrap(), 7);
    assert_eq!(run(&script, &["sh", "-c", "exit 0"]).unwrap(), 0);
}

#[cfg(unix)]
#[test]
fn program_killed_by_signal_exits_1() {
    let script = Script::builder("t").hooks(Shell).handler(|_, _| Ok(99)).unwrap();
    assert_eq!(run(&script, &["sh", "-c", "kill -9 $$"]).unwrap(), 1);
}

