/*!
Shell completion.

The shell hands us the whole command line (`COMP_LINE`) and the cursor
offset into it (`COMP_POINT`). Without `COMP_POINT` there is no request and
the script runs normally.

Replying walks the subcommand tree by rewriting the text: when the first
argument names a subcommand, that token and the whitespace around it are
collapsed to one space, the cursor is shifted left by the same amount, and
the subcommand's own completion path answers the rewritten request. At the
innermost level the reply is every subcommand name, then every flag
(longest alias), that starts with the word under the cursor, one per line.

`completion_script` prints the snippet that registers the script with
bash (`complete -C`) or zsh (`compctl -K`).
*/

use std::io::Write;
use std::path::Path;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::script::Script;
use crate::subcommand;

/// Environment inputs read by completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub comp_line: Option<String>,
    pub comp_point: Option<String>,
    pub shell: Option<String>,
    /// Overrides the script path written into generated completion snippets.
    pub comp_script: Option<String>,
}

impl Environment {
    pub fn from_process() -> Self {
        let var = |key: &str| std::env::var(key).ok();
        Environment {
            comp_line: var("COMP_LINE"),
            comp_point: var("COMP_POINT"),
            shell: var("SHELL"),
            comp_script: var("COMP_SCRIPT"),
        }
    }

    /// Environment carrying a completion request for `line` at `point`.
    pub fn completing(line: impl Into<String>, point: usize) -> Self {
        Environment {
            comp_line: Some(line.into()),
            comp_point: Some(point.to_string()),
            ..Default::default()
        }
    }

    /// The pending request, if the shell asked for one.
    pub fn completion_request(&self) -> Option<CompletionRequest> {
        let point = self.comp_point.as_deref()?.trim().parse::<usize>().ok()?;
        let line = self.comp_line.clone().unwrap_or_default();
        Some(CompletionRequest::new(line, point))
    }
}

/// One completion request: the full line and the cursor offset in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    line: String,
    point: usize,
}

impl CompletionRequest {
    /// The cursor is clamped into the line and onto a char boundary.
    pub fn new(line: impl Into<String>, point: usize) -> Self {
        let line = line.into();
        let mut point = point.min(line.len());
        while !line.is_char_boundary(point) {
            point -= 1;
        }
        CompletionRequest { line, point }
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    /// Cursor offset in bytes, always on a char boundary within `line`.
    pub fn point(&self) -> usize {
        self.point
    }

    /// Request with the cursor at the end of `line`.
    pub fn at_end(line: impl Into<String>) -> Self {
        let line = line.into();
        let point = line.len();
        CompletionRequest { line, point }
    }

    /// The non-whitespace run ending at the cursor.
    pub fn current_word(&self) -> &str {
        let head = &self.line[..self.point];
        head.rsplit(char::is_whitespace).next().unwrap_or("")
    }

    /// Whitespace-separated tokens with their byte offsets.
    fn tokens(&self) -> Vec<(usize, &str)> {
        let mut out = Vec::new();
        let mut start = None;
        for (i, c) in self.line.char_indices() {
            match (c.is_whitespace(), start) {
                (false, None) => start = Some(i),
                (true, Some(s)) => {
                    out.push((s, &self.line[s..i]));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            out.push((s, &self.line[s..]));
        }
        out
    }

    /// Drop the token at `start..start + len` and the whitespace around it,
    /// leaving a single space, and move the cursor to match.
    fn strip_token(&self, head_end: usize, start: usize, len: usize) -> CompletionRequest {
        let line = &self.line;
        let token_end = start + len;
        let tail_start = line[token_end..]
            .find(|c: char| !c.is_whitespace())
            .map(|off| token_end + off)
            .unwrap_or(line.len());

        let rewritten = format!("{} {}", &line[..head_end], &line[tail_start..]);
        let removed = tail_start - head_end - 1;

        let point = if tail_start == line.len() {
            rewritten.len()
        } else if self.point >= tail_start {
            self.point - removed
        } else if self.point <= head_end {
            self.point
        } else {
            head_end + 1
        };
        CompletionRequest::new(rewritten, point)
    }
}

/// Built-in completion reply for `script`. Always answers with 0.
pub fn complete_reply(script: &Script, request: &CompletionRequest, out: &mut dyn Write) -> Result<i32> {
    let table = script.hooks().subcommands().unwrap_or_default();
    let tokens = request.tokens();
    trace!(script = script.name(), line = %request.line, point = request.point, "completion request");

    if let (Some(&(head, script_token)), Some(&(start, first))) = (tokens.first(), tokens.get(1))
        && subcommand::is_candidate(first)
        && let Some(sub) = subcommand::find(&table, first)
    {
        let nested = request.strip_token(head + script_token.len(), start, first.len());
        debug!(
            subcommand = sub.name(),
            line = %nested.line,
            point = nested.point,
            "completing inside subcommand"
        );
        let runnable = subcommand::load(script, sub, &[])?;
        runnable.complete(sub.name(), &nested, out)?;
        return Ok(0);
    }

    let word = request.current_word();
    let names = table.iter().map(|sub| sub.name().to_string());
    let flags = script.rules().iter().map(|rule| rule.display_flag());
    for candidate in names.chain(flags).filter(|c| c.starts_with(word)) {
        writeln!(out, "{candidate}").map_err(|e| Error::Other(e.into()))?;
    }
    Ok(0)
}

/// Registration snippet for the user's shell: zsh when `SHELL` names zsh,
/// bash otherwise. `script_path` is used unless `COMP_SCRIPT` overrides it.
pub fn completion_script(env: &Environment, script_path: &str) -> String {
    let path = env.comp_script.as_deref().unwrap_or(script_path);
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let quoted_path = shell_words::quote(path);
    let quoted_name = shell_words::quote(&name);

    let is_zsh = env
        .shell
        .as_deref()
        .and_then(|s| Path::new(s).file_name())
        .is_some_and(|n| n.to_string_lossy().contains("zsh"));

    if is_zsh {
        let function: String = name
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!(
            "_{function}() {{\n  \
             read -l; local l=\"$REPLY\";\n  \
             read -ln; local p=\"$REPLY\";\n  \
             reply=(${{(f)\"$(COMP_LINE=\"$l\" COMP_POINT=\"$p\" {quoted_path})\"}});\n\
             }};\n\n\
             compctl -f -K _{function} {quoted_name};\n"
        )
    } else {
        format!("complete -o default -C {quoted_path} {quoted_name};\n")
    }
}

/* --------------------------------- Tests ---------------------------------- */
