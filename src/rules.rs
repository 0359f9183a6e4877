/*!
Option rules: the declarative flag list a script hands to the run engine.

A rule is written as a compact declaration string:

  "verbose|v+"     counter      (-v, -vv, --verbose)
  "quiet|q"        boolean
  "name|n=s"       string       (--name foo, -n foo, --name=foo)
  "tag|t=s@"       string list  (repeatable)

The first name is canonical: parsed values are stored under it in the
invocation context. A description can be attached for usage output and
completion listings.
*/

use crate::error::{Error, Result};

/// Value arity / type of a declared flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Bool,
    Counter,
    Str,
    StrList,
}

impl RuleKind {
    pub fn takes_value(&self) -> bool {
        matches!(self, RuleKind::Str | RuleKind::StrList)
    }
}

/// A single declared flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRule {
    names: Vec<String>,
    kind: RuleKind,
    description: Option<String>,
}

impl OptionRule {
    /// Parse a declaration such as `"verbose|v+"` or `"tag|t=s@"`.
    pub fn parse(decl: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidRule {
            decl: decl.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = decl.trim();
        let (head, kind) = if let Some(head) = trimmed.strip_suffix("=s@") {
            (head, RuleKind::StrList)
        } else if let Some(head) = trimmed.strip_suffix("=s") {
            (head, RuleKind::Str)
        } else if let Some(head) = trimmed.strip_suffix('+') {
            (head, RuleKind::Counter)
        } else if trimmed.contains('=') {
            return Err(invalid("unsupported value type (expected =s or =s@)"));
        } else {
            (trimmed, RuleKind::Bool)
        };

        let names: Vec<String> = head.split('|').map(str::to_string).collect();
        if names.iter().any(|n| n.is_empty()) {
            return Err(invalid("empty flag name"));
        }
        if let Some(bad) = names
            .iter()
            .find(|n| n.starts_with('-') || !n.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_'))
        {
            return Err(invalid(&format!("illegal flag name '{bad}'")));
        }

        Ok(OptionRule {
            names,
            kind,
            description: None,
        })
    }

    /// Attach a one-line description.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Canonical name (first declared).
    pub fn name(&self) -> &str {
        &self.names[0]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Longest alias, rendered with its dash prefix (`--version` rather than `-v`).
    pub fn display_flag(&self) -> String {
        let mut longest = self.name();
        for n in &self.names {
            if n.chars().count() > longest.chars().count() {
                longest = n;
            }
        }
        dashed(longest)
    }

    /// Every alias rendered with its dash prefix, in declaration order.
    pub fn spellings(&self) -> Vec<String> {
        self.names.iter().map(|n| dashed(n)).collect()
    }

    pub(crate) fn shorts(&self) -> impl Iterator<Item = char> + '_ {
        self.names.iter().filter_map(|n| {
            let mut chars = n.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        })
    }

    pub(crate) fn longs(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .filter(|n| n.chars().count() > 1)
            .map(String::as_str)
    }
}

fn dashed(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{name}")
    } else {
        format!("--{name}")
    }
}

/// Ordered list of rules belonging to one script.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<OptionRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; names already claimed by an earlier rule are rejected.
    pub fn push(&mut self, rule: OptionRule) -> Result<()> {
        for n in rule.names() {
            if self.find(n).is_some() {
                return Err(Error::InvalidRule {
                    decl: rule.names().join("|"),
                    reason: format!("flag name '{n}' already declared"),
                });
            }
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Find the rule that declares `name` as any of its aliases.
    pub fn find(&self, name: &str) -> Option<&OptionRule> {
        self.rules.iter().find(|r| r.names().iter().any(|n| n == name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a OptionRule;
    type IntoIter = std::slice::Iter<'a, OptionRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/* --------------------------------- Tests ---------------------------------- */
