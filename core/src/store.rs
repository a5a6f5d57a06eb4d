//! Flag stores: the container at one nesting level.

use std::collections::HashMap;

use crate::node::{Entry, FlagId, Policy, PositionalId};

/// Flags, groups and positional arguments of one level, with the tallies the
/// post-parse completeness check compares against.
///
/// Exclusive groups count as a single unit: their members are not counted
/// individually.
#[derive(Debug, Default)]
pub(crate) struct FlagStore {
    /// Flags and groups in registration order. Group members only appear
    /// through their group.
    pub entries: Vec<Entry>,
    /// Every matchable key at this level, group members included.
    pub keys: HashMap<String, FlagId>,
    pub args: Vec<PositionalId>,
    pub mandatory_flags: usize,
    pub optional_flags: usize,
    pub mandatory_args: usize,
    pub optional_args: usize,
}

impl FlagStore {
    pub fn count_flag(&mut self, policy: Policy) {
        match policy {
            Policy::Mandatory => self.mandatory_flags += 1,
            Policy::Optional => self.optional_flags += 1,
        }
    }

    pub fn count_arg(&mut self, policy: Policy) {
        match policy {
            Policy::Mandatory => self.mandatory_args += 1,
            Policy::Optional => self.optional_args += 1,
        }
    }
}
