//! Category-keyed binding store.

use crate::error::QueryError;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// Binding category. Declaration order is flattening order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Select,
    Join,
    Where,
    Having,
    Order,
    Union,
}

impl BindingKind {
    /// Every kind, in flattening order.
    pub const ALL: [BindingKind; 6] = [
        BindingKind::Select,
        BindingKind::Join,
        BindingKind::Where,
        BindingKind::Having,
        BindingKind::Order,
        BindingKind::Union,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::Select => "select",
            BindingKind::Join => "join",
            BindingKind::Where => "where",
            BindingKind::Having => "having",
            BindingKind::Order => "order",
            BindingKind::Union => "union",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BindingKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QueryError::UnknownBindingKind(s.to_string()))
    }
}

/// Ordered binding slots, one per [`BindingKind`].
///
/// Values are stored as given (lists included) and flattened depth-first on
/// [`flatten`](BindingStore::flatten), one entry per placeholder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindingStore {
    slots: [Vec<Value>; 6],
}

impl BindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, kind: BindingKind) -> &[Value] {
        &self.slots[kind.index()]
    }

    pub fn push(&mut self, kind: BindingKind, value: Value) {
        self.slots[kind.index()].push(value);
    }

    pub fn extend(&mut self, kind: BindingKind, values: impl IntoIterator<Item = Value>) {
        self.slots[kind.index()].extend(values);
    }

    /// Replace one slot.
    pub fn set(&mut self, kind: BindingKind, values: Vec<Value>) {
        self.slots[kind.index()] = values;
    }

    /// Empty one slot, returning what it held.
    pub fn take(&mut self, kind: BindingKind) -> Vec<Value> {
        std::mem::take(&mut self.slots[kind.index()])
    }

    /// Append every slot of `other` to the matching slot of `self`.
    pub fn merge(&mut self, other: &BindingStore) {
        for kind in BindingKind::ALL {
            self.slots[kind.index()].extend(other.slot(kind).iter().cloned());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }

    /// All slots in flattening order.
    pub fn flatten(&self) -> Vec<Value> {
        self.flatten_kinds(&BindingKind::ALL)
    }

    /// The listed slots in the given order, lists expanded.
    pub fn flatten_kinds(&self, kinds: &[BindingKind]) -> Vec<Value> {
        let mut out = Vec::new();
        for kind in kinds {
            for value in self.slot(*kind) {
                value.flatten_into(&mut out);
            }
        }
        out
    }
}
