//! Conversion of token text into feature values.

use smol_str::SmolStr;

use crate::syntax::Value;

/// Turns the text of a terminal token or datatype rule into a [`Value`].
pub trait ValueConverter: Send + Sync {
    /// `terminal` is the terminal rule name, `returns` its declared type.
    fn convert_terminal(&self, text: &str, terminal: &str, returns: Option<&str>) -> Value;

    /// `data_type` is the rule's declared primitive type.
    fn convert_datatype(&self, text: &str, data_type: Option<&str>) -> Value;
}

/// Numbers and booleans by declared type, quotes stripped from `STRING`,
/// a leading `^` escape stripped from `ID`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueConverter;

impl ValueConverter for DefaultValueConverter {
    fn convert_terminal(&self, text: &str, terminal: &str, returns: Option<&str>) -> Value {
        match (terminal, returns) {
            (_, Some("number")) => number(text),
            (_, Some("boolean")) => Value::Bool(text.eq_ignore_ascii_case("true")),
            ("STRING", _) => Value::String(SmolStr::new(unquote(text))),
            ("ID", _) => Value::String(SmolStr::new(text.strip_prefix('^').unwrap_or(text))),
            _ => Value::String(SmolStr::new(text)),
        }
    }

    fn convert_datatype(&self, text: &str, data_type: Option<&str>) -> Value {
        match data_type {
            Some("number") => number(text),
            Some("boolean") => Value::Bool(text.eq_ignore_ascii_case("true")),
            _ => Value::String(SmolStr::new(text)),
        }
    }
}

fn number(text: &str) -> Value {
    text.parse::<i64>()
        .map(Value::Int)
        .unwrap_or_else(|_| Value::String(SmolStr::new(text)))
}

fn unquote(text: &str) -> &str {
    let quoted = text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')));
    if quoted { &text[1..text.len() - 1] } else { text }
}
