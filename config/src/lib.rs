//! Declarative grammar files for `argtree`.
//!
//! A grammar is a YAML or JSON description of the flag tree: flags, nested
//! flags, exclusive groups and positional arguments with their converters.
//! [`Grammar::build`] turns it into a ready [`argtree_core::Parser`] wrapped
//! in a [`BuiltGrammar`], whose parse results are reported by node path.
//!
//! ```
//! use argtree_config::Grammar;
//!
//! let grammar = Grammar::from_yaml_str(r#"
//! program: power-tool
//! flags:
//!   - key: --speed
//!     flags:
//!       - exclusive: mandatory
//!         members: [{ key: slow }, { key: fast }]
//! "#).unwrap();
//!
//! let mut built = grammar.build().unwrap();
//! let report = built.parse(&["--speed", "fast"]).unwrap();
//! assert_eq!(report.choices["--speed/slow|fast"], "fast");
//! assert!(built.parse(&["--speed"]).is_err());
//! ```

mod compile;
mod error;
mod grammar;
mod value;

pub use compile::{BuiltGrammar, ParseReport};
pub use error::{ConfigError, Result};
pub use grammar::{ArgSpec, FlagEntry, FlagSpec, Grammar, GroupSpec, MemberSpec};
pub use value::{ArgValue, ConverterSpec};
