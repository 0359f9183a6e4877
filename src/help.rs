/*!
Usage text generated from what a script declares.

  Usage: brew [OPTIONS] <SUBCOMMAND> [ARGS]...

  Options:
    --verbose, -v         Increase verbosity
    --name, -n <VALUE>    Name to greet

  Subcommands:
    beans                 Manage beans

Colour follows NO_COLOR, width follows COLUMNS (clamped 40..=220,
default 100). Descriptions wrap to the space left after the flag column.
*/

use std::borrow::Cow;

use crate::rules::{OptionRule, RuleKind};
use crate::script::Script;

/* -------------------------------------------------------------------------- */
/* Style                                                                      */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub term_width: usize,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self::detect()
    }
}

impl StyleOptions {
    pub fn detect() -> Self {
        let width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(100);
        StyleOptions {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            term_width: width,
        }
    }

    /// No colour, fixed width.
    pub fn plain(term_width: usize) -> Self {
        StyleOptions {
            use_color: false,
            term_width,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Heading,
    Flag,
    Dim,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Heading => "1;4",     // bold underline
        Role::Flag => "38;5;45",    // cyan-ish
        Role::Dim => "2",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

/* -------------------------------------------------------------------------- */
/* Usage                                                                      */
/* -------------------------------------------------------------------------- */

/// Usage block for `script`.
pub fn usage(script: &Script, style: &StyleOptions) -> String {
    let subcommands = script.hooks().subcommands().unwrap_or_default();

    let mut synopsis = format!("Usage: {}", script.name());
    if !script.rules().is_empty() {
        synopsis.push_str(" [OPTIONS]");
    }
    if !subcommands.is_empty() {
        synopsis.push_str(" <SUBCOMMAND>");
    }
    synopsis.push_str(" [ARGS]...");

    let options: Vec<(String, String)> = script
        .rules()
        .iter()
        .map(|r| (flag_column(r), r.description().unwrap_or_default().to_string()))
        .collect();
    let commands: Vec<(String, String)> = subcommands
        .iter()
        .map(|s| (s.name().to_string(), s.description().to_string()))
        .collect();

    let left = options
        .iter()
        .chain(commands.iter())
        .map(|(l, _)| display_width(l))
        .max()
        .unwrap_or(0);

    let mut out = synopsis;
    if !options.is_empty() {
        out.push_str("\n\n");
        out.push_str(&color(Role::Heading, "Options:", style));
        render_rows(&mut out, &options, left, Role::Flag, style);
    }
    if !commands.is_empty() {
        out.push_str("\n\n");
        out.push_str(&color(Role::Heading, "Subcommands:", style));
        render_rows(&mut out, &commands, left, Role::Flag, style);
    }
    out.push('\n');
    out
}

/// `--verbose, -v` plus a value placeholder for flags that take one.
fn flag_column(rule: &OptionRule) -> String {
    let mut col = rule.spellings().join(", ");
    match rule.kind() {
        RuleKind::Str => col.push_str(" <VALUE>"),
        RuleKind::StrList => col.push_str(" <VALUE>..."),
        RuleKind::Bool | RuleKind::Counter => {}
    }
    col
}

fn render_rows(out: &mut String, rows: &[(String, String)], left: usize, role: Role, style: &StyleOptions) {
    let indent = 2;
    let gap = 4;
    let desc_width = style.term_width.saturating_sub(indent + left + gap).max(20);

    for (label, desc) in rows {
        out.push('\n');
        out.push_str(&" ".repeat(indent));
        let pad = left.saturating_sub(display_width(label));
        out.push_str(&color(role, label, style));
        if desc.is_empty() {
            continue;
        }
        out.push_str(&" ".repeat(pad + gap));
        for (i, line) in wrap_text(desc, desc_width).iter().enumerate() {
            if i > 0 {
                out.push('\n');
                out.push_str(&" ".repeat(indent + left + gap));
            }
            out.push_str(line);
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Text Helpers                                                               */
/* -------------------------------------------------------------------------- */

pub fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in s.split_whitespace() {
        if display_width(&current) + word.chars().count() + 1 > max_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut buf = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // skip parameters up to and including the final letter
            for f in chars.by_ref() {
                if f.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        buf.push(c);
    }
    Cow::Owned(buf)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

/* -------------------------------------------------------------------------- */
/* Tests                                                                      */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Hooks;
    use crate::subcommand::Subcommand;

    struct Table;
    impl Hooks for Table {
        fn subcommands(&self) -> Option<Vec<Subcommand>> {
            Some(vec![Subcommand::program("beans", "/bin/beans", "Manage beans")])
        }
    }

    #[test]
    fn usage_lists_options_and_subcommands() {
        let script = Script::builder("brew")
            .described("verbose|v+", "Increase verbosity")
            .described("name|n=s", "Name to greet")
            .option("x")
            .hooks(Table)
            .handler(|_, _| Ok(0))
            .unwrap();
        let text = usage(&script, &StyleOptions::plain(80));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Usage: brew [OPTIONS] <SUBCOMMAND> [ARGS]...");
        assert!(text.contains("  --verbose, -v         Increase verbosity"));
        assert!(text.contains("  --name, -n <VALUE>    Name to greet"));
        assert!(lines.contains(&"  -x"));
        assert!(text.contains("Subcommands:\n  beans                 Manage beans"));
    }

    #[test]
    fn usage_without_rules() {
        let script = Script::declare("bare", &[], |_, _| Ok(0)).unwrap();
        assert_eq!(usage(&script, &StyleOptions::plain(80)), "Usage: bare [ARGS]...\n");
    }

    #[test]
    fn wrap_long_description() {
        let lines = wrap_text("hello world from formatting", 10);
        assert_eq!(lines, vec!["hello", "world from", "formatting"]);
    }

    #[test]
    fn strip_ansi_removes_codes() {
        assert_eq!(strip_ansi("\x1b[31mRED\x1b[0m"), "RED");
        assert_eq!(display_width(&color(Role::Flag, "abc", &StyleOptions { use_color: true, term_width: 80 })), 3);
    }
}
