//! Quote record and corpus helpers.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize};

/// A single quote. Identity is `(author, text)`; tags do not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub author: String,
    #[serde(rename = "quote", alias = "text")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Quote {
    pub fn new(author: impl Into<String>, text: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            tags,
        }
    }

    pub fn identity(&self) -> (&str, &str) {
        (&self.author, &self.text)
    }

    /// Same `(author, text)` as `other`.
    pub fn same_as(&self, other: &Quote) -> bool {
        self.identity() == other.identity()
    }
}

impl PartialEq for Quote {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Quote {}

impl Hash for Quote {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// Remove the first quote matching `quote` by identity. Returns true if one was removed.
pub fn remove_quote(corpus: &mut Vec<Quote>, quote: &Quote) -> bool {
    match corpus.iter().position(|q| q.same_as(quote)) {
        Some(idx) => {
            corpus.remove(idx);
            true
        }
        None => false,
    }
}
