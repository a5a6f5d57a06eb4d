//! Conversion pipelines for positional arguments.
//!
//! A [`Pipeline`] turns one command-line token into a typed value. It starts
//! with exactly one string conversion step and may be followed by any number of
//! refinement steps (range checks, choice lists, ...). Steps run left to right
//! and the first failure message aborts the chain.
//!
//! # Examples
//!
//! ```
//! use argtree_core::Pipeline;
//!
//! let even = Pipeline::<i64>::parsed().then(|v| {
//!     if v % 2 == 0 { Ok(v) } else { Err(format!("{v} is odd")) }
//! });
//! assert_eq!(even.run("42"), Ok(42));
//! assert_eq!(even.run("7"), Err("7 is odd".to_string()));
//! assert!(even.run("seven").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

type ConvertStep<T> = Box<dyn Fn(&str) -> Result<T, String>>;
type RefineStep<T> = Box<dyn Fn(T) -> Result<T, String>>;

/// Ordered string → `T` conversion followed by `T` → `T` refinements.
pub struct Pipeline<T> {
    convert: ConvertStep<T>,
    refine: Vec<RefineStep<T>>,
}

impl<T> Pipeline<T> {
    /// Creates a pipeline from its string conversion step.
    pub fn new<F>(convert: F) -> Self
    where
        F: Fn(&str) -> Result<T, String> + 'static,
    {
        Self {
            convert: Box::new(convert),
            refine: Vec::new(),
        }
    }

    /// Appends a refinement step.
    pub fn then<F>(mut self, step: F) -> Self
    where
        F: Fn(T) -> Result<T, String> + 'static,
    {
        self.refine.push(Box::new(step));
        self
    }

    /// Number of steps, conversion included.
    pub fn steps(&self) -> usize {
        1 + self.refine.len()
    }

    /// Runs every step on `token`, returning the value or the first failure.
    pub fn run(&self, token: &str) -> Result<T, String> {
        let value = (self.convert)(token)?;
        self.refine.iter().try_fold(value, |value, step| step(value))
    }

    /// Wraps the whole pipeline as the conversion step of a pipeline over `U`.
    pub fn map<U, F>(self, f: F) -> Pipeline<U>
    where
        T: 'static,
        F: Fn(T) -> U + 'static,
    {
        Pipeline::new(move |token| self.run(token).map(&f))
    }
}

impl<T> Pipeline<T>
where
    T: FromStr + 'static,
    T::Err: fmt::Display,
{
    /// Pipeline converting through [`FromStr`], reporting the parse error's
    /// `Display` text on failure.
    pub fn parsed() -> Self {
        Self::new(|token| token.parse::<T>().map_err(|err| err.to_string()))
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.steps())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_single_step() {
        let pipeline = Pipeline::new(|token: &str| Ok(token.to_uppercase()));
        assert_eq!(pipeline.steps(), 1);
        assert_eq!(pipeline.run("abc"), Ok("ABC".to_string()));
    }

    #[test]
    fn test_refinements_run_in_order() {
        let pipeline = Pipeline::<i32>::parsed()
            .then(|v| Ok(v * 10))
            .then(|v| if v > 100 { Err("too big".into()) } else { Ok(v) });

        assert_eq!(pipeline.steps(), 3);
        assert_eq!(pipeline.run("5"), Ok(50));
        assert_eq!(pipeline.run("11"), Err("too big".to_string()));
    }

    #[test]
    fn test_first_failure_stops_the_chain() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let pipeline = Pipeline::<u8>::parsed().then(move |v| {
            seen.set(seen.get() + 1);
            Ok(v)
        });

        assert!(pipeline.run("not a byte").is_err());
        assert_eq!(calls.get(), 0);
        assert_eq!(pipeline.run("7"), Ok(7));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_map_keeps_failures() {
        let doubled = Pipeline::<i32>::parsed()
            .then(|v| if v < 0 { Err("negative".into()) } else { Ok(v) })
            .map(|v| i64::from(v) * 2)
            .then(|v| Ok(v + 1));

        assert_eq!(doubled.run("4"), Ok(9));
        assert_eq!(doubled.run("-4"), Err("negative".to_string()));
    }

    #[test]
    fn test_parsed_reports_from_str_error() {
        let pipeline = Pipeline::<i32>::parsed();
        let err = pipeline.run("x1").unwrap_err();
        assert_eq!(err, "x1".parse::<i32>().unwrap_err().to_string());
    }
}
