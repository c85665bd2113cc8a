//! Symbol attributes
//!
//! Every symbol carries a small set of name/value pairs. Attribute sets are
//! immutable values: adding an attribute produces a new set, and the grammar
//! shares identical sets between symbols.

use compact_str::CompactString;
use smallvec::SmallVec;
use std::fmt;

/// Attribute consulted by the priority tree selector. Parsed as an integer.
pub const PRIORITY: &str = "priority";

/// Attribute controlling epsilon trimming. The value `"false"` keeps empty
/// nodes of the symbol in the forest.
pub const PRUNABLE: &str = "prunable";

/// An immutable, ordered set of attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Attributes {
    // sorted by name, names unique
    entries: SmallVec<[(CompactString, CompactString); 2]>,
}

/// Outcome of merging a single attribute into a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Merge {
    /// The value was already present.
    Unchanged,
    /// A new set containing the attribute.
    Added(Attributes),
    /// The name exists with a different value.
    Conflict(CompactString),
}

impl Attributes {
    /// The empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an attribute value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .ok()
            .map(|index| self.entries[index].1.as_str())
    }

    /// Whether the named attribute is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// The numeric `priority` attribute, if present and well formed.
    #[must_use]
    pub fn priority(&self) -> Option<i64> {
        self.get(PRIORITY).and_then(|value| value.trim().parse().ok())
    }

    /// Whether nodes of this symbol may be removed by epsilon trimming.
    #[must_use]
    pub fn is_prunable(&self) -> bool {
        self.get(PRUNABLE) != Some("false")
    }

    pub(crate) fn merge(&self, name: &str, value: &str) -> Merge {
        match self.position(name) {
            Ok(index) if self.entries[index].1 == value => Merge::Unchanged,
            Ok(index) => Merge::Conflict(self.entries[index].1.clone()),
            Err(index) => {
                let mut entries = self.entries.clone();
                entries.insert(index, (name.into(), value.into()));
                Merge::Added(Self { entries })
            }
        }
    }

    fn position(&self, name: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|(existing, _)| existing.as_str().cmp(name))
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (name, value)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}
