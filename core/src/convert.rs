//! Built-in conversion and constraint steps.
//!
//! These are ordinary leaf functions plugged into a [`Pipeline`]. The messages
//! they produce end up in [`ParseError::ConversionFailure`] when a mandatory
//! argument rejects its token.
//!
//! [`ParseError::ConversionFailure`]: crate::ParseError::ConversionFailure
//!
//! # Examples
//!
//! ```
//! use argtree_core::convert::{self, Range};
//!
//! let watts = convert::integer::<i32>().then(Range::inclusive(0, 50).step());
//! assert_eq!(watts.run("10"), Ok(10));
//! assert_eq!(
//!     watts.run("51").unwrap_err(),
//!     "Expected value to be between 0(inclusive) and 50(inclusive)."
//! );
//! assert_eq!(
//!     watts.run("ten").unwrap_err(),
//!     "Could not interpret argument as integer."
//! );
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::Pipeline;

fn with_message<T>(message: &'static str) -> Pipeline<T>
where
    T: FromStr + 'static,
{
    Pipeline::new(move |token| token.parse::<T>().map_err(|_| message.to_string()))
}

/// Signed integer conversion.
pub fn integer<T>() -> Pipeline<T>
where
    T: FromStr + 'static,
{
    with_message("Could not interpret argument as integer.")
}

/// Unsigned integer conversion. Negative input is rejected by `T`'s parser.
pub fn unsigned<T>() -> Pipeline<T>
where
    T: FromStr + 'static,
{
    with_message("Could not interpret argument as integer greater or equal to 0.")
}

/// Floating point conversion.
pub fn number<T>() -> Pipeline<T>
where
    T: FromStr + 'static,
{
    with_message("Could not interpret argument as number.")
}

/// Identity conversion; never fails.
pub fn text() -> Pipeline<String> {
    Pipeline::new(|token| Ok(token.to_string()))
}

/// Path that must name an existing file.
pub fn existing_file() -> Pipeline<PathBuf> {
    Pipeline::new(|token| {
        let path = PathBuf::from(token);
        if path.is_file() {
            Ok(path)
        } else {
            Err(format!("No such file: {token}"))
        }
    })
}

/// Path that must name an existing directory.
pub fn existing_dir() -> Pipeline<PathBuf> {
    Pipeline::new(|token| {
        let path = PathBuf::from(token);
        if path.is_dir() {
            Ok(path)
        } else {
            Err(format!("No such directory: {token}"))
        }
    })
}

/// Refinement step accepting only the listed strings.
pub fn one_of<S>(choices: &[S]) -> impl Fn(String) -> Result<String, String> + 'static
where
    S: AsRef<str>,
{
    let choices: Vec<String> = choices.iter().map(|c| c.as_ref().to_string()).collect();
    move |value| {
        if choices.contains(&value) {
            Ok(value)
        } else {
            Err(format!("Expected one of: {}.", choices.join(", ")))
        }
    }
}

/// Bounds check for ordered values, each end inclusive or exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
    pub min_inclusive: bool,
    pub max_inclusive: bool,
}

impl<T> Range<T>
where
    T: PartialOrd + fmt::Display + Copy + 'static,
{
    pub fn new(min: T, max: T, min_inclusive: bool, max_inclusive: bool) -> Self {
        Self {
            min,
            max,
            min_inclusive,
            max_inclusive,
        }
    }

    /// Range including both ends.
    pub fn inclusive(min: T, max: T) -> Self {
        Self::new(min, max, true, true)
    }

    pub fn contains(&self, value: T) -> bool {
        let above = if self.min_inclusive {
            value >= self.min
        } else {
            value > self.min
        };
        let below = if self.max_inclusive {
            value <= self.max
        } else {
            value < self.max
        };
        above && below
    }

    pub fn check(&self, value: T) -> Result<T, String> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(format!(
                "Expected value to be between {}{} and {}{}.",
                self.min,
                bound_label(self.min_inclusive),
                self.max,
                bound_label(self.max_inclusive)
            ))
        }
    }

    /// The check as a pipeline step.
    pub fn step(self) -> impl Fn(T) -> Result<T, String> + 'static {
        move |value| self.check(value)
    }
}

fn bound_label(inclusive: bool) -> &'static str {
    if inclusive { "(inclusive)" } else { "(exclusive)" }
}
