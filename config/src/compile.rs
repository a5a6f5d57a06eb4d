//! Turning a [`Grammar`] into a live [`Parser`].
//!
//! Every node gets a path so results can be reported without handles: flags
//! are `parent/key` (`--speed/fast`), arguments `parent/name`
//! (`-p/number_watts`) and groups are labelled by their owner's path followed
//! by the member keys (`--speed/slow|medium|fast`).

use std::collections::BTreeMap;

use argtree_core::{
    ArgId, ErrorMode, FlagId, GroupId, Outcome, ParseError, Parser, StoreId,
};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::grammar::{ArgSpec, FlagEntry, Grammar, GroupSpec};
use crate::value::ArgValue;

/// Result of a successful parse, keyed by node path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseReport {
    /// `--help` was given; parsing stopped there.
    pub help_requested: bool,
    /// Matched flags, in declaration order.
    pub flags: Vec<String>,
    /// Converted values of matched arguments.
    pub values: BTreeMap<String, ArgValue>,
    /// Chosen member key per group label.
    pub choices: BTreeMap<String, String>,
}

/// A parser built from a grammar, with the paths of all of its nodes.
#[derive(Debug)]
pub struct BuiltGrammar {
    parser: Parser,
    flags: Vec<(String, FlagId)>,
    args: Vec<(String, ArgId<ArgValue>)>,
    groups: Vec<(String, GroupId)>,
}

impl Grammar {
    /// Builds a parser in [`ErrorMode::Return`].
    ///
    /// # Errors
    ///
    /// Fails on the same problems as [`Grammar::check`].
    ///
    /// # Examples
    ///
    /// ```
    /// use argtree_config::{ArgValue, Grammar};
    ///
    /// let grammar = Grammar::from_yaml_str(r#"
    /// flags:
    ///   - key: -p
    ///     args: [{ name: watts, convert: { type: integer } }]
    /// "#).unwrap();
    /// let mut built = grammar.build().unwrap();
    ///
    /// let report = built.parse(&["-p", "10"]).unwrap();
    /// assert_eq!(report.flags, ["-p"]);
    /// assert_eq!(report.values["-p/watts"], ArgValue::Integer(10));
    /// ```
    pub fn build(&self) -> Result<BuiltGrammar> {
        let mut parser = Parser::new().with_error_mode(ErrorMode::Return);
        if let Some(program) = &self.program {
            parser = parser.with_program_name(program.clone());
        }

        let mut builder = Builder {
            parser,
            flags: Vec::new(),
            args: Vec::new(),
            groups: Vec::new(),
        };
        let root = builder.parser.root();
        builder.scope(root, None, &self.args, &self.flags)?;
        if self.help {
            builder.parser.enable_help()?;
        }

        debug!(
            flags = builder.flags.len(),
            args = builder.args.len(),
            groups = builder.groups.len(),
            "built grammar"
        );
        Ok(BuiltGrammar {
            parser: builder.parser,
            flags: builder.flags,
            args: builder.args,
            groups: builder.groups,
        })
    }
}

struct Builder {
    parser: Parser,
    flags: Vec<(String, FlagId)>,
    args: Vec<(String, ArgId<ArgValue>)>,
    groups: Vec<(String, GroupId)>,
}

fn join(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}/{name}"),
        None => name.to_string(),
    }
}

impl Builder {
    fn scope(
        &mut self,
        store: StoreId,
        parent: Option<&str>,
        args: &[ArgSpec],
        entries: &[FlagEntry],
    ) -> Result<()> {
        for arg in args {
            let pipeline = arg.convert.pipeline(&arg.name)?;
            let id = self
                .parser
                .add_arg(store, &arg.name, arg.policy, &arg.description, pipeline)?;
            self.args.push((join(parent, &arg.name), id));
        }

        for entry in entries {
            match entry {
                FlagEntry::Flag(flag) => {
                    let path = join(parent, &flag.key);
                    if flag.is_complex() {
                        let complex = self.parser.add_complex_flag(
                            store,
                            &flag.key,
                            flag.policy,
                            &flag.description,
                        )?;
                        self.flags.push((path.clone(), complex.id()));
                        self.scope(complex.store(), Some(&path), &flag.args, &flag.flags)?;
                    } else {
                        let id =
                            self.parser
                                .add_flag(store, &flag.key, flag.policy, &flag.description)?;
                        self.flags.push((path, id));
                    }
                }
                FlagEntry::Group(group) => self.group(store, parent, group)?,
            }
        }
        Ok(())
    }

    fn group(&mut self, store: StoreId, parent: Option<&str>, layout: &GroupSpec) -> Result<()> {
        let group = self.parser.add_exclusive_group(store, layout.exclusive)?;
        let keys: Vec<&str> = layout.members.iter().map(|m| m.key.as_str()).collect();
        self.groups.push((join(parent, &keys.join("|")), group));

        for member in &layout.members {
            let path = join(parent, &member.key);
            if member.is_complex() {
                let complex =
                    self.parser
                        .add_group_complex_flag(group, &member.key, &member.description)?;
                self.flags.push((path.clone(), complex.id()));
                self.scope(complex.store(), Some(&path), &member.args, &member.flags)?;
            } else {
                let id = self
                    .parser
                    .add_group_flag(group, &member.key, &member.description)?;
                self.flags.push((path, id));
            }
        }
        Ok(())
    }
}

impl BuiltGrammar {
    /// Parses `tokens` (program name excluded) and collects the results.
    pub fn parse<S: AsRef<str>>(
        &mut self,
        tokens: &[S],
    ) -> std::result::Result<ParseReport, ParseError> {
        let outcome = self.parser.parse_tokens(tokens)?;
        Ok(self.report(outcome == Outcome::HelpRequested))
    }

    /// Switches what [`parse_args`](Self::parse_args) does with a failure or
    /// a help request. Grammars build in [`ErrorMode::Return`].
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.parser.set_error_mode(mode);
        self
    }

    /// Parses a full `argv`, `argv[0]` naming the program.
    ///
    /// In [`ErrorMode::Exit`] a failure prints the failure report to stderr
    /// and exits with status 1, and a help request prints the usage and exits
    /// with status 0.
    pub fn parse_args<I, S>(&mut self, argv: I) -> std::result::Result<ParseReport, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let outcome = self.parser.validate_args(argv)?;
        Ok(self.report(outcome == Outcome::HelpRequested))
    }

    fn report(&self, help_requested: bool) -> ParseReport {
        let parser = &self.parser;
        ParseReport {
            help_requested,
            flags: self
                .flags
                .iter()
                .filter(|(_, id)| parser.is_matched(*id))
                .map(|(path, _)| path.clone())
                .collect(),
            values: self
                .args
                .iter()
                .filter_map(|(path, id)| Some((path.clone(), parser.value(*id)?.clone())))
                .collect(),
            choices: self
                .groups
                .iter()
                .filter_map(|(label, id)| Some((label.clone(), parser.chosen(*id)?.to_string())))
                .collect(),
        }
    }

    pub fn usage(&self) -> String {
        self.parser.usage()
    }

    /// Error text for a failed parse: error, parsed prefix and usage.
    pub fn failure_report(&self, err: &ParseError) -> String {
        self.parser.failure_report(err)
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut Parser {
        &mut self.parser
    }

    /// Paths of every flag, in declaration order.
    pub fn flag_paths(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(|(path, _)| path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use argtree_core::ParseErrorKind;

    use super::*;

    fn nested() -> Grammar {
        Grammar::from_yaml_str(
            r#"
args:
  - name: input
flags:
  - key: --speed
    flags:
      - exclusive: mandatory
        members:
          - key: slow
          - key: fast
            flags:
              - key: --limit
                policy: optional
                args:
                  - name: speed_limit
                    convert: { type: unsigned, max: 50 }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_paths() {
        let built = nested().build().unwrap();
        let paths: Vec<&str> = built.flag_paths().collect();
        assert_eq!(
            paths,
            ["--speed", "--speed/slow", "--speed/fast", "--speed/fast/--limit"]
        );
        assert_eq!(built.groups[0].0, "--speed/slow|fast");
        assert_eq!(built.args[0].0, "input");
        assert_eq!(built.args[1].0, "--speed/fast/--limit/speed_limit");
    }

    #[test]
    fn test_report() {
        let mut built = nested().build().unwrap();
        let report = built
            .parse(&["in.txt", "--speed", "fast", "--limit", "20"])
            .unwrap();

        assert!(!report.help_requested);
        assert_eq!(report.flags, ["--speed", "--speed/fast", "--speed/fast/--limit"]);
        assert_eq!(report.values["input"], ArgValue::Text("in.txt".into()));
        assert_eq!(
            report.values["--speed/fast/--limit/speed_limit"],
            ArgValue::Unsigned(20)
        );
        assert_eq!(report.choices["--speed/slow|fast"], "fast");
    }

    #[test]
    fn test_reparse_clears_previous_report() {
        let mut built = nested().build().unwrap();
        built
            .parse(&["a", "--speed", "fast", "--limit", "20"])
            .unwrap();
        let report = built.parse(&["b", "--speed", "slow"]).unwrap();

        assert_eq!(report.flags, ["--speed", "--speed/slow"]);
        assert_eq!(report.values.len(), 1);
        assert_eq!(report.choices["--speed/slow|fast"], "slow");
    }

    #[test]
    fn test_errors_pass_through() {
        let mut built = nested().build().unwrap();
        let err = built
            .parse(&["a", "--speed", "fast", "--limit", "51"])
            .unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::ConversionFailure);
        assert!(built.failure_report(&err).starts_with("Error: "));

        let err = built.parse(&["a", "--speed", "slow", "fast"]).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::ExclusiveConflict);
    }

    #[test]
    fn test_help_and_program_name() {
        let mut grammar = nested();
        grammar.program = Some("tool".into());
        grammar.help = true;
        let mut built = grammar.build().unwrap();

        assert!(built.usage().starts_with("Usage: tool input"));
        let report = built.parse(&["--help"]).unwrap();
        assert!(report.help_requested);
        assert!(report.flags.is_empty());

        let report = built.parse_args(["renamed", "x", "--speed", "slow"]).unwrap();
        assert_eq!(built.parser().program_name(), "renamed");
        assert!(!report.help_requested);
    }

    #[test]
    fn test_error_mode_switch() {
        let built = nested().build().unwrap();
        assert_eq!(built.parser().error_mode(), ErrorMode::Return);

        let mut built = built.with_error_mode(ErrorMode::Exit);
        assert_eq!(built.parser().error_mode(), ErrorMode::Exit);
        // parse() never exits, whatever the mode.
        assert!(built.parse(&["a", "--speed"]).is_err());
    }

    #[test]
    fn test_report_serializes_flat() {
        let mut built = nested().build().unwrap();
        let report = built.parse(&["a", "--speed", "slow"]).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["values"]["input"], "a");
        assert_eq!(json["choices"]["--speed/slow|fast"], "slow");
    }
}
