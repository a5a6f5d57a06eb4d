//! Declarative engine for hierarchical command-line grammars.
//!
//! Grammars are trees rather than flat `flag = value` lists:
//!
//! - a **flag** is matched by an exact key token; a *complex* flag owns a
//!   nested store of further flags and positional arguments;
//! - an **exclusive group** holds sibling flags of which at most one may be
//!   used, and counts as a single mandatory or optional unit;
//! - a **positional argument** consumes one token through a conversion
//!   [`Pipeline`] and keeps the typed value.
//!
//! A [`Parser`] owns the tree. Parsing is a single greedy left-to-right pass
//! with one token of lookahead and no backtracking: at each position a flag
//! key is tried first, then the unmatched positional arguments in declaration
//! order. Failures are reported as [`ParseError`]s; usage text is rendered
//! from the same tree.
//!
//! # Example
//!
//! ```
//! use argtree_core::convert::{self, Range};
//! use argtree_core::{ErrorMode, ParseErrorKind, Parser, Policy};
//!
//! let mut parser = Parser::new()
//!     .with_program_name("machine")
//!     .with_error_mode(ErrorMode::Return);
//! let root = parser.root();
//!
//! let power = parser
//!     .add_complex_flag(root, "-p", Policy::Optional, "Specify power output.")
//!     .unwrap();
//! let watts = parser
//!     .add_arg(
//!         power.store(),
//!         "watts",
//!         Policy::Mandatory,
//!         "Number of watts.",
//!         convert::integer::<i32>().then(Range::inclusive(0, 50).step()),
//!     )
//!     .unwrap();
//!
//! let speed = parser
//!     .add_complex_flag(root, "--speed", Policy::Mandatory, "Specify the speed.")
//!     .unwrap();
//! let pace = parser
//!     .add_exclusive_group(speed.store(), Policy::Mandatory)
//!     .unwrap();
//! for key in ["slow", "medium", "fast"] {
//!     parser.add_group_flag(pace, key, "").unwrap();
//! }
//!
//! parser.parse_tokens(&["-p", "10", "--speed", "fast"]).unwrap();
//! assert_eq!(parser.value(watts), Some(&10));
//! assert_eq!(parser.chosen(pace), Some("fast"));
//!
//! let err = parser.parse_tokens(&["--speed", "slow", "medium"]).unwrap_err();
//! assert_eq!(err.kind(), ParseErrorKind::ExclusiveConflict);
//!
//! assert_eq!(
//!     parser.usage_summary(),
//!     "Usage: machine [-p watts] --speed slow|medium|fast"
//! );
//! ```

pub mod convert;
mod error;
mod node;
mod parser;
mod pipeline;
mod store;
mod usage;

pub use error::{GrammarError, ParseError, ParseErrorKind};
pub use node::{ArgId, ComplexFlag, FlagId, GroupId, NodeId, Policy, PositionalId, StoreId};
pub use parser::{ErrorMode, HELP_KEY, Outcome, Parser, StoreCounts};
pub use pipeline::Pipeline;
