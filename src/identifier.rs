use std::fmt;
use std::hash::{Hash, Hasher};

/// A parameter or column reference: 1-based ordinal or name.
///
/// Names keep their sigil (`:a`, `@a` and `$a` are different parameters) and compare
/// case-insensitively. An ordinal never equals a name.
#[derive(Debug, Clone, Eq)]
pub enum IndexOrName {
    Index(usize),
    Name(String),
}

impl IndexOrName {
    #[must_use]
    pub fn is_index(&self) -> bool {
        matches!(self, IndexOrName::Index(_))
    }

    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            IndexOrName::Index(i) => Some(*i),
            IndexOrName::Name(_) => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            IndexOrName::Index(_) => None,
            IndexOrName::Name(n) => Some(n),
        }
    }
}

/// Fold used for every case-insensitive name comparison in the crate.
pub(crate) fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

impl PartialEq for IndexOrName {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (IndexOrName::Index(a), IndexOrName::Index(b)) => a == b,
            (IndexOrName::Name(a), IndexOrName::Name(b)) => {
                a.eq_ignore_ascii_case(b) || fold_name(a) == fold_name(b)
            }
            _ => false,
        }
    }
}

impl Hash for IndexOrName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            IndexOrName::Index(i) => {
                0u8.hash(state);
                i.hash(state);
            }
            IndexOrName::Name(n) => {
                1u8.hash(state);
                fold_name(n).hash(state);
            }
        }
    }
}

impl fmt::Display for IndexOrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexOrName::Index(i) => write!(f, "{i}"),
            IndexOrName::Name(n) => f.write_str(n),
        }
    }
}

impl From<usize> for IndexOrName {
    fn from(i: usize) -> Self {
        IndexOrName::Index(i)
    }
}

impl From<&str> for IndexOrName {
    fn from(n: &str) -> Self {
        IndexOrName::Name(n.to_string())
    }
}

impl From<String> for IndexOrName {
    fn from(n: String) -> Self {
        IndexOrName::Name(n)
    }
}

impl From<&IndexOrName> for IndexOrName {
    fn from(v: &IndexOrName) -> Self {
        v.clone()
    }
}
