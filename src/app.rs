//! Invocation context and exit values.
//!
//! An [`App`] is created fresh for every run of a script, filled in by the
//! parser, and handed to hooks and the handler. It never outlives the run.

use serde::Serialize;
use std::collections::BTreeMap;

/// Parsed value of one declared flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Count(u8),
    Str(String),
    List(Vec<String>),
}

/// Where an invocation sits in the subcommand tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// Names of the subcommands matched on the way here, outermost first.
    pub path: Vec<String>,
}

impl Frame {
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Frame for a nested call into `name`.
    pub fn enter(&self, name: &str) -> Frame {
        let mut path = self.path.clone();
        path.push(name.to_string());
        Frame { path }
    }
}

/// The invocation context.
#[derive(Debug, Clone, Default, Serialize)]
pub struct App {
    script: String,
    options: BTreeMap<String, OptionValue>,
    frame: Frame,
}

impl App {
    pub fn new(script: impl Into<String>, frame: Frame) -> Self {
        App {
            script: script.into(),
            options: BTreeMap::new(),
            frame,
        }
    }

    /// Name of the script this context belongs to.
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Nesting depth: 0 for the top-level script.
    pub fn depth(&self) -> usize {
        self.frame.depth()
    }

    /// Name of the subcommand that led here, if any.
    pub fn subcommand(&self) -> Option<&str> {
        self.frame.path.last().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: OptionValue) {
        self.options.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.options.remove(name)
    }

    /// True when a boolean flag was given, or a counter is non-zero.
    pub fn flag(&self, name: &str) -> bool {
        match self.options.get(name) {
            Some(OptionValue::Flag(b)) => *b,
            Some(OptionValue::Count(n)) => *n > 0,
            Some(OptionValue::Str(_)) | Some(OptionValue::List(_)) => true,
            None => false,
        }
    }

    pub fn count(&self, name: &str) -> u8 {
        match self.options.get(name) {
            Some(OptionValue::Count(n)) => *n,
            Some(OptionValue::Flag(true)) => 1,
            _ => 0,
        }
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(OptionValue::Str(s)) => Some(s),
            Some(OptionValue::List(l)) => l.last().map(String::as_str),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> &[String] {
        match self.options.get(name) {
            Some(OptionValue::List(l)) => l,
            Some(OptionValue::Str(s)) => std::slice::from_ref(s),
            _ => &[],
        }
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Parsed options as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.options).unwrap_or(serde_json::Value::Null)
    }
}

/// Value returned by a handler or hook, before normalisation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExitValue {
    Code(i64),
    Float(f64),
    Text(String),
    #[default]
    Nothing,
}

impl ExitValue {
    /// Numeric value, if this exit value has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ExitValue::Code(n) => Some(*n as f64),
            ExitValue::Float(f) if f.is_finite() => Some(*f),
            ExitValue::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }

    /// Truncate to an integer exit code; anything non-numeric becomes 0.
    pub fn normalize(&self) -> i32 {
        match self {
            ExitValue::Code(n) => (*n).clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            other => other
                .as_number()
                .map(|f| f.trunc().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
                .unwrap_or(0),
        }
    }
}

impl From<()> for ExitValue {
    fn from(_: ()) -> Self {
        ExitValue::Nothing
    }
}

impl From<i32> for ExitValue {
    fn from(n: i32) -> Self {
        ExitValue::Code(n as i64)
    }
}

impl From<i64> for ExitValue {
    fn from(n: i64) -> Self {
        ExitValue::Code(n)
    }
}

impl From<u8> for ExitValue {
    fn from(n: u8) -> Self {
        ExitValue::Code(n as i64)
    }
}

impl From<usize> for ExitValue {
    fn from(n: usize) -> Self {
        ExitValue::Code(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ExitValue {
    fn from(f: f64) -> Self {
        ExitValue::Float(f)
    }
}

impl From<String> for ExitValue {
    fn from(s: String) -> Self {
        ExitValue::Text(s)
    }
}

impl From<&str> for ExitValue {
    fn from(s: &str) -> Self {
        ExitValue::Text(s.to_string())
    }
}

impl<T: Into<ExitValue>> From<Option<T>> for ExitValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ExitValue::Nothing)
    }
}

/* --------------------------------- Tests ---------------------------------- */
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_numbers() {
        assert_eq!(ExitValue::Code(3).normalize(), 3);
        assert_eq!(ExitValue::Float(2.9).normalize(), 2);
        assert_eq!(ExitValue::Text(" 42 ".into()).normalize(), 42);
        assert_eq!(ExitValue::Text("4.7".into()).normalize(), 4);
    }

    #[test]
    fn non_numeric_normalizes_to_zero() {
        assert_eq!(ExitValue::Text("done".into()).normalize(), 0);
        assert_eq!(ExitValue::Nothing.normalize(), 0);
        assert_eq!(ExitValue::Float(f64::NAN).normalize(), 0);
        assert_eq!(ExitValue::from(()).normalize(), 0);
        assert!(!ExitValue::from("x").is_numeric());
    }

    #[test]
    fn accessors() {
        let mut app = App::new("brew", Frame::default());
        app.set("verbose", OptionValue::Count(2));
        app.set("name", OptionValue::Str("espresso".into()));
        app.set("tag", OptionValue::List(vec!["a".into(), "b".into()]));
        assert!(app.flag("verbose"));
        assert_eq!(app.count("verbose"), 2);
        assert_eq!(app.str("name"), Some("espresso"));
        assert_eq!(app.list("tag"), ["a", "b"]);
        assert!(!app.flag("quiet"));
        assert_eq!(
            app.to_json(),
            json!({"name": "espresso", "tag": ["a", "b"], "verbose": 2})
        );
    }

    #[test]
    fn frame_depth() {
        let top = Frame::default();
        let nested = top.enter("coffee").enter("order");
        assert_eq!(top.depth(), 0);
        assert_eq!(nested.depth(), 2);
        let app = App::new("order", nested);
        assert_eq!(app.subcommand(), Some("order"));
        assert_eq!(app.depth(), 2);
    }
}
