/*!
`brew coffee` - brew a drink.

  brew coffee [--size S] [--sugar...] [DRINK...]
  brew coffee order [--to NAME] [--count N]

Unknown first words are not an error here: they are drink names and go to
the handler like any other positional argument. The exit value is the
number of drinks brewed.
*/

use anyhow::Result;
use std::io::Write;

use declopt::{App, CompletionRequest, ExitValue, ParseState, Script, Subcommand};

struct CoffeeHooks;

impl declopt::Hooks for CoffeeHooks {
    fn post_process_argv(
        &self,
        app: &mut App,
        argv: &mut Vec<String>,
        state: &ParseState,
    ) -> Result<()> {
        super::verbosity_then_default(app, argv, state)
    }

    fn subcommands(&self) -> Option<Vec<Subcommand>> {
        Some(vec![Subcommand::entry("order", order_script, "Place an order")])
    }

    fn unknown_subcommand(&self, _app: &mut App, _argv: &[String]) -> Result<Option<ExitValue>> {
        Ok(None)
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

pub fn script() -> Result<Script> {
    let script = Script::builder("coffee")
        .described("size|s=s", "Cup size (small, medium, large)")
        .described("sugar+", "One spoon of sugar per occurrence")
        .described("verbose|v+", "Increase log verbosity")
        .described("version", "Print the recipe version")
        .hooks(CoffeeHooks)
        .handler(handle)?;
    Ok(script)
}

fn handle(app: &mut App, drinks: Vec<String>) -> Result<usize> {
    if app.flag("version") {
        println!("coffee recipe {}", env!("CARGO_PKG_VERSION"));
        return Ok(0);
    }
    let size = app.str("size").unwrap_or("medium");
    let sugar = app.count("sugar");
    let drinks = if drinks.is_empty() {
        vec!["americano".to_string()]
    } else {
        drinks
    };
    for d in &drinks {
        println!("Brewing a {size} {d} with {sugar} sugar");
    }
    Ok(drinks.len())
}

struct OrderHooks;

impl declopt::Hooks for OrderHooks {
    fn complete_reply(
        &self,
        script: &Script,
        request: &CompletionRequest,
        out: &mut dyn Write,
    ) -> Result<Option<i32>> {
        super::reply(script, request, out)
    }
}

fn order_script() -> Result<Script> {
    let script = Script::builder("order")
        .described("to|t=s", "Who the order is for")
        .described("count|c=s", "Number of cups")
        .hooks(OrderHooks)
        .handler(handle_order)?;
    Ok(script)
}

fn handle_order(app: &mut App, _args: Vec<String>) -> Result<ExitValue> {
    let count = app.str("count").unwrap_or("1").to_string();
    let to = app.str("to").unwrap_or("the counter");
    println!(
        "Order of {count} for {to} (via {}, depth {})",
        app.frame().path.join(" > "),
        app.depth()
    );
    // A non-numeric count is not an error; it normalises to exit 0.
    Ok(ExitValue::Text(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use declopt::Environment;

    fn run(args: &[&str]) -> declopt::Result<i32> {
        script().unwrap().run_with(args.iter().copied(), &Environment::default())
    }

    #[test]
    fn unknown_words_are_drinks() {
        assert_eq!(run(&["latte", "mocha"]).unwrap(), 2);
        assert_eq!(run(&[]).unwrap(), 1);
    }

    #[test]
    fn nested_order_returns_count() {
        assert_eq!(run(&["order", "--count", "3"]).unwrap(), 3);
        assert_eq!(run(&["order", "-c", "many"]).unwrap(), 0);
    }
}
