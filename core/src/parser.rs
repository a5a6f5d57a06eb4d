//! The parser: grammar registration, the parse pass and post-parse queries.
//!
//! A [`Parser`] owns the whole grammar tree. Configuration code registers
//! flags, exclusive groups and positional arguments into flag stores, then a
//! single call to [`Parser::parse_tokens`] (or [`Parser::validate_args`])
//! walks the tokens left to right, greedily and without backtracking.
//!
//! # Examples
//!
//! ```
//! use argtree_core::{convert, ErrorMode, Outcome, Parser, Policy};
//!
//! let mut parser = Parser::new().with_error_mode(ErrorMode::Return);
//! let root = parser.root();
//! let power = parser
//!     .add_complex_flag(root, "-p", Policy::Optional, "Specify power output.")
//!     .unwrap();
//! let watts = parser
//!     .add_arg(power.store(), "watts", Policy::Mandatory, "", convert::integer::<i32>())
//!     .unwrap();
//!
//! let outcome = parser.validate_args(["tool", "-p", "10"]).unwrap();
//! assert_eq!(outcome, Outcome::Parsed);
//! assert!(parser.is_matched(power));
//! assert_eq!(parser.value(watts), Some(&10));
//! ```

use std::fmt;

use tracing::{debug, trace};

use crate::error::{GrammarError, ParseError};
use crate::node::{
    ArgId, ComplexFlag, Entry, Flag, FlagId, Group, GroupId, NodeId, NodeState, Policy,
    Positional, PositionalId, StoreId, TypedSlot,
};
use crate::store::FlagStore;
use crate::Pipeline;

/// Key of the flag registered by [`Parser::enable_help`].
pub const HELP_KEY: &str = "--help";

const HELP_DESCRIPTION: &str = "Print this help message.";

pub(crate) const ROOT: StoreId = StoreId(0);

/// What [`Parser::validate_args`] does with a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Print the error, the parsed prefix and the usage text to stderr, then
    /// exit with status 1.
    #[default]
    Exit,
    /// Hand the error back to the caller.
    Return,
}

/// Result of a successful parse pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every token was consumed and every requirement met.
    Parsed,
    /// The help flag was given; parsing stopped there.
    HelpRequested,
}

/// Requirement tallies of one flag store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreCounts {
    pub mandatory_flags: usize,
    pub optional_flags: usize,
    pub mandatory_args: usize,
    pub optional_args: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Done,
    Help,
}

struct Cursor<'a> {
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

/// Grammar tree plus the state of the current parse pass.
pub struct Parser {
    pub(crate) stores: Vec<FlagStore>,
    pub(crate) flags: Vec<Flag>,
    pub(crate) groups: Vec<Group>,
    pub(crate) positionals: Vec<Positional>,
    pub(crate) help: Option<FlagId>,
    program: String,
    error_mode: ErrorMode,
    consumed: Vec<String>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("program", &self.program)
            .field("stores", &self.stores.len())
            .field("flags", &self.flags.len())
            .field("groups", &self.groups.len())
            .field("positionals", &self.positionals.len())
            .field("error_mode", &self.error_mode)
            .finish_non_exhaustive()
    }
}

impl Parser {
    /// Creates a parser with an empty root store.
    pub fn new() -> Self {
        Self {
            stores: vec![FlagStore::default()],
            flags: Vec::new(),
            groups: Vec::new(),
            positionals: Vec::new(),
            help: None,
            program: String::new(),
            error_mode: ErrorMode::default(),
            consumed: Vec::new(),
        }
    }

    /// Sets the program name shown in usage text.
    pub fn with_program_name(mut self, name: impl Into<String>) -> Self {
        self.program = name.into();
        self
    }

    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// In-place form of [`with_error_mode`](Self::with_error_mode).
    pub fn set_error_mode(&mut self, mode: ErrorMode) {
        self.error_mode = mode;
    }

    pub fn program_name(&self) -> &str {
        &self.program
    }

    /// What [`validate_args`](Self::validate_args) does with failures.
    ///
    /// ```
    /// use argtree_core::{ErrorMode, Parser};
    ///
    /// assert_eq!(Parser::new().error_mode(), ErrorMode::Exit);
    /// let parser = Parser::new().with_error_mode(ErrorMode::Return);
    /// assert_eq!(parser.error_mode(), ErrorMode::Return);
    /// ```
    pub fn error_mode(&self) -> ErrorMode {
        self.error_mode
    }

    /// The top-level store.
    pub fn root(&self) -> StoreId {
        ROOT
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Registers a flag without children.
    pub fn add_flag(
        &mut self,
        store: StoreId,
        key: &str,
        policy: Policy,
        description: &str,
    ) -> Result<FlagId, GrammarError> {
        let flag = self.insert_flag(store, key, policy, description, None)?;
        self.stores[store.0].entries.push(Entry::Flag(flag));
        self.stores[store.0].count_flag(policy);
        Ok(flag)
    }

    /// Registers a flag owning a nested store.
    pub fn add_complex_flag(
        &mut self,
        store: StoreId,
        key: &str,
        policy: Policy,
        description: &str,
    ) -> Result<ComplexFlag, GrammarError> {
        let flag = self.insert_flag(store, key, policy, description, None)?;
        self.stores[store.0].entries.push(Entry::Flag(flag));
        self.stores[store.0].count_flag(policy);
        Ok(ComplexFlag {
            flag,
            store: self.nest(flag),
        })
    }

    /// Registers a positional argument converted by `pipeline`.
    pub fn add_arg<T: 'static>(
        &mut self,
        store: StoreId,
        name: &str,
        policy: Policy,
        description: &str,
        pipeline: Pipeline<T>,
    ) -> Result<ArgId<T>, GrammarError> {
        self.check_store(store)?;
        if name.trim().is_empty() {
            return Err(GrammarError::EmptyArgumentName);
        }
        let id = PositionalId(self.positionals.len());
        self.positionals.push(Positional {
            state: NodeState::new(policy, description),
            name: name.to_string(),
            slot: Box::new(TypedSlot::new(pipeline)),
        });
        let store = &mut self.stores[store.0];
        store.args.push(id);
        store.count_arg(policy);
        Ok(ArgId::new(id))
    }

    /// Creates an exclusive group in `store`. Members are added with
    /// [`add_group_flag`](Self::add_group_flag) and inherit `policy`.
    pub fn add_exclusive_group(
        &mut self,
        store: StoreId,
        policy: Policy,
    ) -> Result<GroupId, GrammarError> {
        self.check_store(store)?;
        let id = GroupId(self.groups.len());
        self.groups.push(Group {
            state: NodeState::new(policy, ""),
            members: Vec::new(),
            chosen: None,
            store,
        });
        self.stores[store.0].entries.push(Entry::Group(id));
        Ok(id)
    }

    /// Adds a simple flag to an exclusive group.
    pub fn add_group_flag(
        &mut self,
        group: GroupId,
        key: &str,
        description: &str,
    ) -> Result<FlagId, GrammarError> {
        let (store, policy) = self.group_home(group)?;
        let flag = self.insert_flag(store, key, policy, description, Some(group))?;
        self.attach_member(group, flag);
        Ok(flag)
    }

    /// Adds a flag owning a nested store to an exclusive group.
    pub fn add_group_complex_flag(
        &mut self,
        group: GroupId,
        key: &str,
        description: &str,
    ) -> Result<ComplexFlag, GrammarError> {
        let (store, policy) = self.group_home(group)?;
        let flag = self.insert_flag(store, key, policy, description, Some(group))?;
        self.attach_member(group, flag);
        Ok(ComplexFlag {
            flag,
            store: self.nest(flag),
        })
    }

    /// Attaches a callback fired with the key each time `flag` matches.
    pub fn on_match<F>(&mut self, flag: impl Into<FlagId>, trigger: F) -> Result<(), GrammarError>
    where
        F: FnMut(&str) + 'static,
    {
        let flag = self
            .flags
            .get_mut(flag.into().0)
            .ok_or(GrammarError::UnknownFlag)?;
        flag.trigger = Some(Box::new(trigger));
        Ok(())
    }

    /// Registers an optional `--help` flag at the root, listed last in usage.
    /// Calling it again returns the existing flag.
    pub fn enable_help(&mut self) -> Result<FlagId, GrammarError> {
        if let Some(help) = self.help {
            return Ok(help);
        }
        let help = self.add_flag(ROOT, HELP_KEY, Policy::Optional, HELP_DESCRIPTION)?;
        self.help = Some(help);
        Ok(help)
    }

    fn check_store(&self, store: StoreId) -> Result<(), GrammarError> {
        if store.0 < self.stores.len() {
            Ok(())
        } else {
            Err(GrammarError::UnknownStore)
        }
    }

    fn group_home(&self, group: GroupId) -> Result<(StoreId, Policy), GrammarError> {
        let group = self.groups.get(group.0).ok_or(GrammarError::UnknownGroup)?;
        Ok((group.store, group.state.policy))
    }

    fn insert_flag(
        &mut self,
        store: StoreId,
        key: &str,
        policy: Policy,
        description: &str,
        group: Option<GroupId>,
    ) -> Result<FlagId, GrammarError> {
        self.check_store(store)?;
        if key.trim().is_empty() {
            return Err(GrammarError::EmptyKey);
        }
        if self.stores[store.0].keys.contains_key(key) {
            return Err(GrammarError::DuplicateKey(key.to_string()));
        }

        let id = FlagId(self.flags.len());
        self.flags.push(Flag {
            state: NodeState::new(policy, description),
            key: key.to_string(),
            children: None,
            group,
            trigger: None,
        });
        self.stores[store.0].keys.insert(key.to_string(), id);
        Ok(id)
    }

    /// Gives `flag` a fresh nested store.
    fn nest(&mut self, flag: FlagId) -> StoreId {
        let children = StoreId(self.stores.len());
        self.stores.push(FlagStore::default());
        self.flags[flag.0].children = Some(children);
        children
    }

    fn attach_member(&mut self, group: GroupId, flag: FlagId) {
        let group = &mut self.groups[group.0];
        group.members.push(flag);
        // One requirement unit per group, however many members it has.
        if group.members.len() == 1 {
            let policy = group.state.policy;
            self.stores[group.store.0].count_flag(policy);
        }
    }

    // ---------------------------------------------------------------------
    // Parsing
    // ---------------------------------------------------------------------

    /// Parses a full argument vector whose first element is the program name.
    ///
    /// The program name replaces the one used in usage text. In
    /// [`ErrorMode::Exit`] a failure prints [`failure_report`](Self::failure_report)
    /// to stderr and exits with status 1, and a help request prints the usage
    /// to stdout and exits with status 0.
    pub fn validate_args<I, S>(&mut self, argv: I) -> Result<Outcome, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        if let Some(program) = argv.next() {
            self.program = program;
        }
        let tokens: Vec<String> = argv.collect();

        let result = self.parse_tokens(&tokens);
        if self.error_mode == ErrorMode::Return {
            return result;
        }
        match result {
            Ok(Outcome::HelpRequested) => {
                print!("{}", self.usage());
                std::process::exit(0);
            }
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                eprint!("{}", self.failure_report(&err));
                std::process::exit(1);
            }
        }
    }

    /// [`validate_args`](Self::validate_args) over the process arguments.
    pub fn validate_env(&mut self) -> Result<Outcome, ParseError> {
        self.validate_args(std::env::args())
    }

    /// Parses `tokens` (program name excluded) against the tree.
    ///
    /// Per-pass state from a previous call is cleared first. Never exits the
    /// process, whatever the [`ErrorMode`].
    pub fn parse_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<Outcome, ParseError> {
        self.reset();
        let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
        let mut cursor = Cursor {
            tokens: &tokens,
            pos: 0,
        };

        let result = match self.parse_store(ROOT, &mut cursor) {
            Ok(Flow::Help) => Ok(Outcome::HelpRequested),
            Ok(Flow::Done) => match cursor.peek() {
                Some(token) => Err(self.unexpected(ROOT, token)),
                None => Ok(Outcome::Parsed),
            },
            Err(err) => Err(err),
        };

        self.consumed = tokens[..cursor.pos].iter().map(|t| t.to_string()).collect();
        match &result {
            Ok(outcome) => debug!(?outcome, consumed = cursor.pos, "Parse finished"),
            Err(err) => debug!(kind = ?err.kind(), consumed = cursor.pos, "Parse failed"),
        }
        result
    }

    /// Clears every matched flag, chosen group member and converted value.
    pub fn reset(&mut self) {
        for flag in &mut self.flags {
            flag.state.matched = false;
        }
        for group in &mut self.groups {
            group.state.matched = false;
            group.chosen = None;
        }
        for arg in &mut self.positionals {
            arg.state.matched = false;
            arg.slot.clear();
        }
        self.consumed.clear();
    }

    fn parse_store(&mut self, store: StoreId, cursor: &mut Cursor<'_>) -> Result<Flow, ParseError> {
        let mut mandatory_flags = 0;
        let mut mandatory_args = 0;

        while let Some(token) = cursor.peek() {
            if let Some(flag) = self.stores[store.0].keys.get(token).copied() {
                if self.match_flag(flag, cursor)? == Flow::Help {
                    return Ok(Flow::Help);
                }
                if self.flags[flag.0].state.policy == Policy::Mandatory {
                    mandatory_flags += 1;
                }
            } else if let Some(policy) = self.consume_positional(store, token)? {
                cursor.advance();
                if policy == Policy::Mandatory {
                    mandatory_args += 1;
                }
            } else {
                break;
            }
        }

        let required = &self.stores[store.0];
        if mandatory_flags < required.mandatory_flags {
            return Err(match cursor.peek() {
                None => ParseError::MissingMandatoryFlag {
                    options: self.available_flags(store),
                },
                Some(token) => self.unexpected(store, token),
            });
        }
        if mandatory_args < required.mandatory_args {
            return Err(match cursor.peek() {
                None => ParseError::MissingMandatoryArgument {
                    options: self.available_args(store),
                },
                Some(token) => self.unexpected(store, token),
            });
        }
        Ok(Flow::Done)
    }

    fn match_flag(&mut self, id: FlagId, cursor: &mut Cursor<'_>) -> Result<Flow, ParseError> {
        let flag = &self.flags[id.0];
        if flag.state.matched {
            return Err(ParseError::RepeatedFlag {
                flag: flag.key.clone(),
            });
        }
        trace!(key = %flag.key, "Matched flag key");
        let (children, group) = (flag.children, flag.group);
        if let Some(group) = group {
            self.choose(group, id)?;
        }
        cursor.advance();

        if self.help == Some(id) {
            self.flags[id.0].state.matched = true;
            return Ok(Flow::Help);
        }

        if let Some(children) = children {
            if self.parse_store(children, cursor)? == Flow::Help {
                return Ok(Flow::Help);
            }
        }

        let flag = &mut self.flags[id.0];
        flag.state.matched = true;
        if let Some(trigger) = flag.trigger.as_mut() {
            trigger(&flag.key);
        }
        Ok(Flow::Done)
    }

    fn choose(&mut self, group: GroupId, flag: FlagId) -> Result<(), ParseError> {
        if let Some(previous) = self.groups[group.0].chosen {
            return Err(ParseError::ExclusiveConflict {
                first: self.flags[previous.0].key.clone(),
                second: self.flags[flag.0].key.clone(),
                exclusive: self.groups[group.0]
                    .members
                    .iter()
                    .map(|member| self.flags[member.0].key.clone())
                    .collect(),
            });
        }
        let group = &mut self.groups[group.0];
        group.chosen = Some(flag);
        group.state.matched = true;
        Ok(())
    }

    /// Offers `token` to the unmatched positionals of `store` in declaration
    /// order. Returns the policy of the one that took it.
    fn consume_positional(
        &mut self,
        store: StoreId,
        token: &str,
    ) -> Result<Option<Policy>, ParseError> {
        for index in 0..self.stores[store.0].args.len() {
            let id = self.stores[store.0].args[index];
            let arg = &mut self.positionals[id.0];
            if arg.state.matched {
                continue;
            }
            match arg.slot.consume(token) {
                Ok(()) => {
                    arg.state.matched = true;
                    trace!(argument = %arg.name, token, "Consumed positional argument");
                    return Ok(Some(arg.state.policy));
                }
                Err(message) if arg.state.policy == Policy::Mandatory => {
                    return Err(ParseError::ConversionFailure {
                        argument: arg.name.clone(),
                        message,
                    });
                }
                Err(message) => {
                    trace!(argument = %arg.name, token, %message, "Optional argument declined token");
                }
            }
        }
        Ok(None)
    }

    fn unexpected(&self, store: StoreId, token: &str) -> ParseError {
        let mut options = self.available_flags(store);
        options.extend(self.available_args(store));
        ParseError::UnexpectedArgument {
            token: token.to_string(),
            options,
        }
    }

    /// Unmatched flags of `store`, expanding groups that have no member chosen.
    pub(crate) fn available_flags(&self, store: StoreId) -> Vec<String> {
        let mut options = Vec::new();
        for entry in self.ordered_entries(store) {
            match entry {
                Entry::Flag(id) => {
                    let flag = &self.flags[id.0];
                    if !flag.state.matched {
                        options.push(flag.state.policy.bracket(&flag.key));
                    }
                }
                Entry::Group(id) => {
                    let group = &self.groups[id.0];
                    if group.chosen.is_some() {
                        continue;
                    }
                    options.extend(group.members.iter().map(|member| {
                        let flag = &self.flags[member.0];
                        flag.state.policy.bracket(&flag.key)
                    }));
                }
            }
        }
        options
    }

    pub(crate) fn available_args(&self, store: StoreId) -> Vec<String> {
        self.stores[store.0]
            .args
            .iter()
            .map(|id| &self.positionals[id.0])
            .filter(|arg| !arg.state.matched)
            .map(|arg| arg.state.policy.bracket(&arg.name))
            .collect()
    }

    /// Entries of `store` in registration order, with the help flag moved last.
    pub(crate) fn ordered_entries(&self, store: StoreId) -> impl Iterator<Item = Entry> + '_ {
        let help = self.help.filter(|_| store == ROOT).map(Entry::Flag);
        self.stores[store.0]
            .entries
            .iter()
            .copied()
            .filter(move |entry| Some(*entry) != help)
            .chain(help)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Whether the node matched in the last pass.
    pub fn is_matched(&self, node: impl Into<NodeId>) -> bool {
        match node.into() {
            NodeId::Flag(id) => self.flags.get(id.0).is_some_and(|f| f.state.matched),
            NodeId::Group(id) => self.groups.get(id.0).is_some_and(|g| g.state.matched),
            NodeId::Positional(id) => self
                .positionals
                .get(id.0)
                .is_some_and(|a| a.state.matched),
        }
    }

    /// Converted value of a positional argument, if it matched.
    pub fn value<T: 'static>(&self, arg: ArgId<T>) -> Option<&T> {
        self.positionals
            .get(arg.id.0)?
            .slot
            .value()?
            .downcast_ref::<T>()
    }

    /// Key of the group member chosen in the last pass.
    pub fn chosen(&self, group: GroupId) -> Option<&str> {
        let chosen = self.chosen_flag(group)?;
        Some(self.flags[chosen.0].key.as_str())
    }

    pub fn chosen_flag(&self, group: GroupId) -> Option<FlagId> {
        self.groups.get(group.0)?.chosen
    }

    /// Key of a flag, or name of a positional through [`arg_name`](Self::arg_name).
    ///
    /// ```
    /// use argtree_core::{convert, Parser, Policy};
    ///
    /// let mut parser = Parser::new();
    /// let root = parser.root();
    /// let fast = parser.add_flag(root, "--fast", Policy::Optional, "").unwrap();
    /// let input = parser
    ///     .add_arg(root, "input", Policy::Mandatory, "", convert::text())
    ///     .unwrap();
    ///
    /// assert_eq!(parser.key(fast), Some("--fast"));
    /// assert_eq!(parser.arg_name(input.positional()), Some("input"));
    /// ```
    pub fn key(&self, flag: FlagId) -> Option<&str> {
        self.flags.get(flag.0).map(|f| f.key.as_str())
    }

    pub fn arg_name(&self, arg: PositionalId) -> Option<&str> {
        self.positionals.get(arg.0).map(|a| a.name.as_str())
    }

    /// Members of a group in registration order.
    pub fn members(&self, group: GroupId) -> &[FlagId] {
        self.groups
            .get(group.0)
            .map(|g| g.members.as_slice())
            .unwrap_or_default()
    }

    /// Requirement tallies of `store`.
    pub fn counts(&self, store: StoreId) -> Option<StoreCounts> {
        self.stores.get(store.0).map(|s| StoreCounts {
            mandatory_flags: s.mandatory_flags,
            optional_flags: s.optional_flags,
            mandatory_args: s.mandatory_args,
            optional_args: s.optional_args,
        })
    }

    /// Number of tokens consumed by the last pass, program name excluded.
    pub fn tokens_consumed(&self) -> usize {
        self.consumed.len()
    }

    /// The tokens consumed by the last pass.
    pub fn consumed_tokens(&self) -> &[String] {
        &self.consumed
    }

    /// Error text printed on failure: the error, the successfully parsed
    /// prefix, a blank line and the full usage.
    pub fn failure_report(&self, err: &ParseError) -> String {
        let mut parsed = self.program.clone();
        for token in &self.consumed {
            parsed.push(' ');
            parsed.push_str(token);
        }
        format!(
            "Error: {err}\nSuccessfully parsed: {parsed}\n\n{}",
            self.usage()
        )
    }
}
