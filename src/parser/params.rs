//! Parameter binding
//!
//! Placeholders are substituted into the statement text before tokenization.
//! Positional statements use `?`, named statements use `:name`. Placeholders
//! inside quoted strings or quoted identifiers are left alone.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{Error, Result};
use crate::table::Value;

/// A value bound to a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    /// Rendered as a parenthesized list
    List(Vec<Param>),
}

impl Param {
    /// Renders the parameter as a SQL literal
    pub fn render(&self) -> Result<String> {
        match self {
            Param::Null => Ok("NULL".to_string()),
            Param::Int(i) => Ok(i.to_string()),
            Param::Float(f) => {
                if !f.is_finite() {
                    return Err(Error::Data(format!("Cannot bind non-finite number {}", f)));
                }
                let text = f.to_string();
                if text.contains('.') {
                    Ok(text)
                } else {
                    Ok(format!("{}.0", text))
                }
            }
            Param::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Param::Text(s) => Ok(quote(s)),
            Param::Date(d) => Ok(quote(&d.format("%Y-%m-%d").to_string())),
            Param::List(items) => {
                let rendered = items
                    .iter()
                    .map(Param::render)
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("({})", rendered.join(", ")))
            }
        }
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v as i64)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<NaiveDate> for Param {
    fn from(v: NaiveDate) -> Self {
        Param::Date(v)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Param::Null)
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(v: Vec<T>) -> Self {
        Param::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Param::Null,
            Value::Int(i) => Param::Int(i),
            Value::Float(f) => Param::Float(f),
            Value::Bool(b) => Param::Bool(b),
            Value::Date(d) => Param::Date(d),
            Value::Text(s) => Param::Text(s),
        }
    }
}

impl TryFrom<serde_json::Value> for Param {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;
        match value {
            Json::Null => Ok(Param::Null),
            Json::Bool(b) => Ok(Param::Bool(b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Ok(Param::Int(i)),
                None => n
                    .as_f64()
                    .map(Param::Float)
                    .ok_or_else(|| Error::Data(format!("unsupported parameter type: {}", n))),
            },
            Json::String(s) => Ok(Param::Text(s)),
            Json::Array(items) => items
                .into_iter()
                .map(Param::try_from)
                .collect::<Result<Vec<_>>>()
                .map(Param::List),
            Json::Object(_) => Err(Error::Data("unsupported parameter type".into())),
        }
    }
}

/// Parameters supplied to `execute`
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Param>),
    Named(BTreeMap<String, Param>),
}

impl Params {
    pub fn is_empty(&self) -> bool {
        match self {
            Params::None => true,
            Params::Positional(p) => p.is_empty(),
            Params::Named(p) => p.is_empty(),
        }
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Params::None
    }
}

impl From<Vec<Param>> for Params {
    fn from(v: Vec<Param>) -> Self {
        Params::Positional(v)
    }
}

impl From<BTreeMap<String, Param>> for Params {
    fn from(v: BTreeMap<String, Param>) -> Self {
        Params::Named(v)
    }
}

impl TryFrom<serde_json::Value> for Params {
    type Error = Error;

    /// Arrays bind positionally, objects by name
    fn try_from(value: serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;
        match value {
            Json::Null => Ok(Params::None),
            Json::Array(items) => items
                .into_iter()
                .map(Param::try_from)
                .collect::<Result<Vec<_>>>()
                .map(Params::Positional),
            Json::Object(map) => map
                .into_iter()
                .map(|(k, v)| Ok((k, Param::try_from(v)?)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Params::Named),
            other => Err(Error::Data(format!("unsupported parameter type: {}", other))),
        }
    }
}

/// Builds positional parameters: `params![1, "Bob", None::<i64>]`
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::None
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Params::Positional(vec![$($crate::Param::from($value)),+])
    };
}

/// Builds named parameters: `named_params! { "age" => 25 }`
#[macro_export]
macro_rules! named_params {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = ::std::collections::BTreeMap::new();
        $(map.insert(::std::string::String::from($key), $crate::Param::from($value));)*
        $crate::Params::Named(map)
    }};
}

fn named_placeholder() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)"))
        .as_ref()
        .map_err(|e| Error::Parameter(e.to_string()))
}

/// Substitutes parameters into the statement text
pub fn bind(sql: &str, params: &Params) -> Result<String> {
    match params {
        Params::None => Ok(sql.to_string()),
        Params::Positional(values) => bind_positional(sql, values),
        Params::Named(values) => bind_named(sql, values),
    }
}

fn bind_positional(sql: &str, values: &[Param]) -> Result<String> {
    let segments = split_quoted(sql);
    let expected: usize = segments
        .iter()
        .filter(|(quoted, _)| !quoted)
        .map(|(_, text)| text.matches('?').count())
        .sum();
    if expected != values.len() {
        return Err(Error::Parameter(format!(
            "Parameter count mismatch. Expected {}, got {}",
            expected,
            values.len()
        )));
    }

    let mut out = String::with_capacity(sql.len());
    let mut next = values.iter();
    for (quoted, text) in segments {
        if quoted {
            out.push_str(text);
            continue;
        }
        for ch in text.chars() {
            if ch != '?' {
                out.push(ch);
                continue;
            }
            let value = next
                .next()
                .ok_or_else(|| Error::Parameter("Parameter count mismatch".into()))?;
            out.push_str(&value.render()?);
        }
    }
    Ok(out)
}

fn bind_named(sql: &str, values: &BTreeMap<String, Param>) -> Result<String> {
    let placeholder = named_placeholder()?;
    let mut out = String::with_capacity(sql.len());
    for (quoted, text) in split_quoted(sql) {
        if quoted {
            out.push_str(text);
            continue;
        }
        let mut last = 0;
        for caps in placeholder.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = values.get(name.as_str()).ok_or_else(|| {
                Error::Parameter(format!("Parameter '{}' not provided", name.as_str()))
            })?;
            out.push_str(&text[last..whole.start()]);
            out.push_str(&value.render()?);
            last = whole.end();
        }
        out.push_str(&text[last..]);
    }
    Ok(out)
}

/// Splits text into (quoted, segment) pieces; quoted pieces keep their quotes
fn split_quoted(sql: &str) -> Vec<(bool, &str)> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut open: Option<char> = None;

    for (i, ch) in sql.char_indices() {
        match open {
            None if ch == '\'' || ch == '"' => {
                if start < i {
                    segments.push((false, &sql[start..i]));
                }
                start = i;
                open = Some(ch);
            }
            Some(q) if ch == q => {
                segments.push((true, &sql[start..i + ch.len_utf8()]));
                start = i + ch.len_utf8();
                open = None;
            }
            _ => {}
        }
    }
    if start < sql.len() {
        // an unterminated quote stays quoted; the tokenizer reports it
        segments.push((open.is_some(), &sql[start..]));
    }
    segments
}
