use std::{
    borrow::Cow,
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

/// A single SQL name segment, either delimited (`"Foo"`) or undelimited (`foo`).
///
/// Two identifiers are equal when their canonical names are equal.
/// Undelimited names are case-insensitive and fold to upper case, delimited
/// names are compared exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    name: String,
    #[serde(default)]
    delimited: bool,
}

impl Identifier {
    pub fn new(name: impl Into<String>, delimited: bool) -> Self {
        Identifier {
            name: name.into(),
            delimited,
        }
    }

    pub fn undelimited(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    pub fn delimited(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// The name as written, without delimiters or escapes.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_delimited(&self) -> bool {
        self.delimited
    }

    pub fn canonical_name(&self) -> Cow<'_, str> {
        if self.delimited {
            Cow::Borrowed(&self.name)
        } else {
            Cow::Owned(self.name.to_uppercase())
        }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_name() == other.canonical_name()
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_name().hash(state);
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_name().cmp(&other.canonical_name())
    }
}

/// SQL-92 rendering. Vendors with other delimiters render through
/// [`crate::vendor::Vendor::quote_identifier`].
impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.delimited {
            write!(f, "\"{}\"", self.name.replace('"', "\"\""))
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Ordered identifiers, as used by key definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct IdentifierList(Vec<Identifier>);

impl IdentifierList {
    pub fn new(identifiers: Vec<Identifier>) -> Self {
        IdentifierList(identifiers)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Identifier> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.0.contains(identifier)
    }
}

impl FromIterator<Identifier> for IdentifierList {
    fn from_iter<I: IntoIterator<Item = Identifier>>(iter: I) -> Self {
        IdentifierList(iter.into_iter().collect())
    }
}

impl fmt::Display for IdentifierList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
