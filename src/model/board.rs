use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;

/// Opaque identifier of a board (sub-forum) on the source site
///
/// Configuration files may spell board ids either as integers (`boards = [1, 2]`)
/// or as strings (`boards = ["news"]`); both deserialize to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoardId(String);

impl BoardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BoardId {
    fn from(id: &str) -> Self {
        Self::new(id.trim())
    }
}

impl From<u32> for BoardId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for BoardId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => BoardId(n.to_string()),
            Raw::Text(s) => BoardId(s.trim().to_string()),
        })
    }
}

/// Read-only lookup from board id to a human-readable category name
#[derive(Debug, Clone, Default)]
pub struct BoardNames {
    names: HashMap<String, String>,
}

impl BoardNames {
    pub fn new(names: HashMap<String, String>) -> Self {
        let names = names
            .into_iter()
            .map(|(id, name)| (id.trim().to_string(), name))
            .collect();
        Self { names }
    }

    /// Returns the mapped name, or the raw id itself when the board is unmapped
    pub fn lookup<'a>(&'a self, id: &'a str) -> &'a str {
        self.names
            .get(id.trim())
            .map(String::as_str)
            .unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for BoardNames {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
