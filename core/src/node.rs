//! Grammar tree nodes and the handles used to refer to them.
//!
//! Nodes live in per-kind arenas owned by [`Parser`](crate::Parser). Flag
//! stores own their flags and positional arguments by index; exclusive groups
//! refer to member flags by index without owning them.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::Pipeline;

/// Whether a node must appear for a parse to succeed.
///
/// # Examples
///
/// ```
/// use argtree_core::Policy;
///
/// assert_eq!(Policy::default(), Policy::Mandatory);
/// assert_eq!(Policy::Optional.bracket("-p"), "[-p]");
/// assert_eq!(Policy::Mandatory.bracket("-p"), "-p");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    #[default]
    Mandatory,
    Optional,
}

impl Policy {
    pub fn is_optional(self) -> bool {
        self == Policy::Optional
    }

    /// Wraps `text` in `[ ]` when optional.
    pub fn bracket(self, text: &str) -> String {
        match self {
            Policy::Mandatory => text.to_string(),
            Policy::Optional => format!("[{text}]"),
        }
    }
}

/// Handle to a flag store (one nesting level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(pub(crate) usize);

/// Handle to a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagId(pub(crate) usize);

/// Handle to an exclusive group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) usize);

/// Untyped handle to a positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionalId(pub(crate) usize);

/// Typed handle to a positional argument producing `T`.
pub struct ArgId<T> {
    pub(crate) id: PositionalId,
    marker: PhantomData<fn() -> T>,
}

impl<T> ArgId<T> {
    pub(crate) fn new(id: PositionalId) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }

    pub fn positional(self) -> PositionalId {
        self.id
    }
}

impl<T> Clone for ArgId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArgId<T> {}

impl<T> PartialEq for ArgId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ArgId<T> {}

impl<T> fmt::Debug for ArgId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArgId").field(&self.id.0).finish()
    }
}

/// A flag that owns a nested store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComplexFlag {
    pub(crate) flag: FlagId,
    pub(crate) store: StoreId,
}

impl ComplexFlag {
    pub fn id(self) -> FlagId {
        self.flag
    }

    /// The nested store to register children into.
    pub fn store(self) -> StoreId {
        self.store
    }
}

/// Any node in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Flag(FlagId),
    Group(GroupId),
    Positional(PositionalId),
}

impl From<FlagId> for NodeId {
    fn from(id: FlagId) -> Self {
        NodeId::Flag(id)
    }
}

impl From<ComplexFlag> for NodeId {
    fn from(flag: ComplexFlag) -> Self {
        NodeId::Flag(flag.flag)
    }
}

impl From<GroupId> for NodeId {
    fn from(id: GroupId) -> Self {
        NodeId::Group(id)
    }
}

impl From<PositionalId> for NodeId {
    fn from(id: PositionalId) -> Self {
        NodeId::Positional(id)
    }
}

impl<T> From<ArgId<T>> for NodeId {
    fn from(arg: ArgId<T>) -> Self {
        NodeId::Positional(arg.id)
    }
}

impl From<ComplexFlag> for FlagId {
    fn from(flag: ComplexFlag) -> Self {
        flag.flag
    }
}

/// Called with the matched key once a flag and its children matched.
pub(crate) type Trigger = Box<dyn FnMut(&str)>;

/// State shared by every node kind.
#[derive(Debug)]
pub(crate) struct NodeState {
    pub policy: Policy,
    pub description: String,
    pub matched: bool,
}

impl NodeState {
    pub fn new(policy: Policy, description: &str) -> Self {
        Self {
            policy,
            description: description.to_string(),
            matched: false,
        }
    }
}

pub(crate) struct Flag {
    pub state: NodeState,
    pub key: String,
    pub children: Option<StoreId>,
    pub group: Option<GroupId>,
    pub trigger: Option<Trigger>,
}

#[derive(Debug)]
pub(crate) struct Group {
    pub state: NodeState,
    pub members: Vec<FlagId>,
    pub chosen: Option<FlagId>,
    pub store: StoreId,
}

pub(crate) struct Positional {
    pub state: NodeState,
    pub name: String,
    pub slot: Box<dyn ArgSlot>,
}

/// One entry of a store's ordered flag listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Entry {
    Flag(FlagId),
    Group(GroupId),
}

/// Type-erased pipeline plus the value it produced.
pub(crate) trait ArgSlot {
    fn consume(&mut self, token: &str) -> Result<(), String>;
    fn value(&self) -> Option<&dyn Any>;
    fn clear(&mut self);
}

pub(crate) struct TypedSlot<T> {
    pipeline: Pipeline<T>,
    value: Option<T>,
}

impl<T> TypedSlot<T> {
    pub fn new(pipeline: Pipeline<T>) -> Self {
        Self {
            pipeline,
            value: None,
        }
    }
}

impl<T: 'static> ArgSlot for TypedSlot<T> {
    fn consume(&mut self, token: &str) -> Result<(), String> {
        self.value = Some(self.pipeline.run(token)?);
        Ok(())
    }

    fn value(&self) -> Option<&dyn Any> {
        self.value.as_ref().map(|v| v as &dyn Any)
    }

    fn clear(&mut self) {
        self.value = None;
    }
}
