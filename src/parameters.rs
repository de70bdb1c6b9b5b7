use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parameters passed to a parameterised Jenkins job.
///
/// Insertion order is preserved so trigger URLs are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(IndexMap<String, String>);

impl Parameters {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, key: &str, value: String) -> Result<(), String> {
        if key.is_empty() {
            return Err("parameter name must not be empty".to_string());
        }
        if self.0.contains_key(key) {
            return Err(format!("duplicate parameter '{key}'"));
        }
        self.0.insert(key.to_string(), value);
        Ok(())
    }
}

/// Parses a whitespace separated list of `key=value` tokens.
///
/// The first `=` splits a token, so values may themselves contain `=`.
impl FromStr for Parameters {
    type Err = String;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let mut parameters = Self::default();
        for token in expression.split_whitespace() {
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| format!("expected key=value but found '{token}'"))?;
            parameters.insert(key, value.to_string())?;
        }
        Ok(parameters)
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Scalar value allowed in the mapping form of a job's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Parameters as written in the configuration file: either an expression
/// string (`env=ci region=eu`) or a mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawParameters {
    Expression(String),
    Map(IndexMap<String, ScalarValue>),
}

impl Default for RawParameters {
    fn default() -> Self {
        Self::Expression(String::new())
    }
}

impl TryFrom<&RawParameters> for Parameters {
    type Error = String;

    fn try_from(raw: &RawParameters) -> Result<Self, Self::Error> {
        match raw {
            RawParameters::Expression(expression) => expression.parse(),
            RawParameters::Map(map) => {
                let mut parameters = Self::default();
                for (key, value) in map {
                    parameters.insert(key.trim(), value.to_string())?;
                }
                Ok(parameters)
            }
        }
    }
}
