/*!
`brew beans` - list beans matching a roast and origins.

JSON Output Shape (--json):
{
  "status": "ok",
  "depth": 1,
  "filters": { "roast": "dark", "origin": ["kenya"] },
  "count": 1,
  "beans": ["kenya-dark"]
}
*/

use anyhow::Result;
use std::io::Write;

use declopt::{App, CompletionRequest, Script};

const CATALOGUE: &[(&str, &str)] = &[
    ("brazil", "medium"),
    ("colombia", "medium"),
    ("ethiopia", "light"),
    ("kenya", "dark"),
    ("sumatra", "dark"),
];

struct BeansHooks;

impl declopt::Hooks for BeansHooks {
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
    let script = Script::builder("beans")
        .described("roast|r=s", "Only beans of this roast (light, medium, dark)")
        .described("origin|o=s@", "Only beans from these origins (repeatable)")
        .described("json", "Output JSON")
        .hooks(BeansHooks)
        .handler(handle)?;
    Ok(script)
}

fn handle(app: &mut App, args: Vec<String>) -> Result<i32> {
    let roast = app.str("roast");
    let origins = app.list("origin");
    let beans = matching(roast, origins);

    if app.flag("json") {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "depth": app.depth(),
                "filters": app.to_json(),
                "count": beans.len(),
                "beans": beans,
            })
        );
        return Ok(0);
    }

    if !args.is_empty() {
        eprintln!("beans: ignoring extra arguments: {}", args.join(" "));
    }
    if beans.is_empty() {
        println!("No beans match.");
        return Ok(1);
    }
    for b in &beans {
        println!("{b}");
    }
    Ok(0)
}

fn matching(roast: Option<&str>, origins: &[String]) -> Vec<String> {
    CATALOGUE
        .iter()
        .filter(|(_, r)| roast.is_none_or(|want| want.eq_ignore_ascii_case(r)))
        .filter(|(o, _)| origins.is_empty() || origins.iter().any(|want| want.eq_ignore_ascii_case(o)))
        .map(|(o, r)| format!("{o}-{r}"))
        .collect()
}
