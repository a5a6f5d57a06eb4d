//! Converter settings and the values they produce.
//!
//! Grammar files name one of a fixed set of converters per positional
//! argument. Every converter yields an [`ArgValue`] so arguments of different
//! types can share one report.

use std::fmt;
use std::path::PathBuf;

use argtree_core::convert::{self, Range};
use argtree_core::Pipeline;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// A converted positional argument value.
///
/// Serialized untagged, so `{"-p/number_watts": 10}` rather than a nested
/// enum.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Integer(i64),
    Unsigned(u64),
    Number(f64),
    Text(String),
    Path(PathBuf),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Integer(v) => write!(f, "{v}"),
            ArgValue::Unsigned(v) => write!(f, "{v}"),
            ArgValue::Number(v) => write!(f, "{v}"),
            ArgValue::Text(v) => f.write_str(v),
            ArgValue::Path(v) => write!(f, "{}", v.display()),
        }
    }
}

fn yes() -> bool {
    true
}

/// Which conversion a positional argument runs.
///
/// # Examples
///
/// ```
/// use argtree_config::{ArgValue, ConverterSpec};
///
/// let converter: ConverterSpec = serde_yaml::from_str("{ type: integer, min: 0, max: 50 }").unwrap();
/// let pipeline = converter.pipeline("watts").unwrap();
/// assert_eq!(pipeline.run("10"), Ok(ArgValue::Integer(10)));
/// assert!(pipeline.run("51").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConverterSpec {
    /// Any token, kept as text (the default).
    #[default]
    Text,
    /// Signed integer with optional bounds.
    Integer {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
        #[serde(default = "yes")]
        min_inclusive: bool,
        #[serde(default = "yes")]
        max_inclusive: bool,
    },
    /// Non-negative integer with optional bounds.
    Unsigned {
        #[serde(default)]
        min: Option<u64>,
        #[serde(default)]
        max: Option<u64>,
        #[serde(default = "yes")]
        min_inclusive: bool,
        #[serde(default = "yes")]
        max_inclusive: bool,
    },
    /// Floating point number with optional bounds.
    Number {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default = "yes")]
        min_inclusive: bool,
        #[serde(default = "yes")]
        max_inclusive: bool,
    },
    /// One of a fixed list of strings.
    Choice { values: Vec<String> },
    /// Path to an existing file.
    ExistingFile,
    /// Path to an existing directory.
    ExistingDir,
}

impl ConverterSpec {
    /// Builds the pipeline for the argument called `argument`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConverter`] for empty choice lists and
    /// bounds that leave no acceptable value.
    pub fn pipeline(&self, argument: &str) -> Result<Pipeline<ArgValue>> {
        let invalid = |reason: &str| ConfigError::InvalidConverter {
            argument: argument.to_string(),
            reason: reason.to_string(),
        };

        let pipeline = match self {
            ConverterSpec::Text => convert::text().map(ArgValue::Text),
            ConverterSpec::Integer {
                min,
                max,
                min_inclusive,
                max_inclusive,
            } => {
                let bounds = Bounds::new(*min, *max, *min_inclusive, *max_inclusive)
                    .ok_or_else(|| invalid("min is greater than max"))?;
                convert::integer::<i64>()
                    .then(move |v| bounds.check(v))
                    .map(ArgValue::Integer)
            }
            ConverterSpec::Unsigned {
                min,
                max,
                min_inclusive,
                max_inclusive,
            } => {
                let bounds = Bounds::new(*min, *max, *min_inclusive, *max_inclusive)
                    .ok_or_else(|| invalid("min is greater than max"))?;
                convert::unsigned::<u64>()
                    .then(move |v| bounds.check(v))
                    .map(ArgValue::Unsigned)
            }
            ConverterSpec::Number {
                min,
                max,
                min_inclusive,
                max_inclusive,
            } => {
                let bounds = Bounds::new(*min, *max, *min_inclusive, *max_inclusive)
                    .ok_or_else(|| invalid("min is greater than max"))?;
                convert::number::<f64>()
                    .then(move |v| bounds.check(v))
                    .map(ArgValue::Number)
            }
            ConverterSpec::Choice { values } => {
                if values.is_empty() {
                    return Err(invalid("choice list is empty"));
                }
                convert::text()
                    .then(convert::one_of(values))
                    .map(ArgValue::Text)
            }
            ConverterSpec::ExistingFile => convert::existing_file().map(ArgValue::Path),
            ConverterSpec::ExistingDir => convert::existing_dir().map(ArgValue::Path),
        };
        Ok(pipeline)
    }
}

/// Optional lower and upper bound.
#[derive(Debug, Clone, Copy)]
struct Bounds<T> {
    min: Option<T>,
    max: Option<T>,
    min_inclusive: bool,
    max_inclusive: bool,
}

impl<T> Bounds<T>
where
    T: PartialOrd + fmt::Display + Copy + 'static,
{
    /// `None` when both ends are set and `min > max`.
    fn new(min: Option<T>, max: Option<T>, min_inclusive: bool, max_inclusive: bool) -> Option<Self> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return None;
            }
        }
        Some(Self {
            min,
            max,
            min_inclusive,
            max_inclusive,
        })
    }

    fn check(&self, value: T) -> std::result::Result<T, String> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => {
                Range::new(min, max, self.min_inclusive, self.max_inclusive).check(value)
            }
            (Some(min), None) => {
                let ok = if self.min_inclusive { value >= min } else { value > min };
                if ok {
                    Ok(value)
                } else if self.min_inclusive {
                    Err(format!("Expected value to be at least {min}."))
                } else {
                    Err(format!("Expected value to be greater than {min}."))
                }
            }
            (None, Some(max)) => {
                let ok = if self.max_inclusive { value <= max } else { value < max };
                if ok {
                    Ok(value)
                } else if self.max_inclusive {
                    Err(format!("Expected value to be at most {max}."))
                } else {
                    Err(format!("Expected value to be less than {max}."))
                }
            }
            (None, None) => Ok(value),
        }
    }
}
