//! Dependency tags carried by types and capabilities.
//!
//! Tags replace runtime annotations. They change how a name is looked up:
//!
//! - [`Tag::NoDependency`] - the implementation is never constructed by the
//!   engine; instances are only ever provided explicitly.
//! - [`Tag::Special`] - resolved only through the active session, never from
//!   the general registry.
//! - [`Tag::MultiValued`] - any number of instances may be bound; single
//!   lookups are refused.

use std::collections::HashSet;
use std::fmt;

/// Kind of session-scoped marker a special name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKind {
    /// The module currently being resolved.
    Module,

    /// The locale lookup bound to the module currently being resolved.
    Locale,
}

impl SpecialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialKind::Module => "module",
            SpecialKind::Locale => "locale",
        }
    }
}

/// A dependency tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    NoDependency,
    Special(SpecialKind),
    MultiValued,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::NoDependency => f.write_str("no_dependency"),
            Tag::Special(kind) => write!(f, "special({})", kind.as_str()),
            Tag::MultiValued => f.write_str("multi_valued"),
        }
    }
}

/// A set of tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: HashSet<Tag>,
}

impl TagSet {
    /// Create an empty tag set.
    pub fn new() -> Self {
        Self {
            tags: HashSet::new(),
        }
    }

    /// Add a tag to the set.
    pub fn add(&mut self, tag: Tag) {
        self.tags.insert(tag);
    }

    /// Check if the set contains a tag.
    pub fn has(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_no_dependency(&self) -> bool {
        self.has(Tag::NoDependency)
    }

    pub fn is_multi_valued(&self) -> bool {
        self.has(Tag::MultiValued)
    }

    /// The special kind, if the set carries one.
    pub fn special(&self) -> Option<SpecialKind> {
        self.tags.iter().find_map(|t| match t {
            Tag::Special(kind) => Some(*kind),
            _ => None,
        })
    }

    /// Tags present in either set.
    pub fn union(&self, other: &TagSet) -> TagSet {
        self.tags.union(&other.tags).copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<T: IntoIterator<Item = Tag>>(iter: T) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}
