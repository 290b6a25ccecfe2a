use std::collections::HashMap;

use serde::Deserialize;

use crate::error::MappingError;

/// One named category and the raw survey codes that belong to it, as written
/// in a mapping override file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MappingEntry {
    pub name: String,
    pub codes: Vec<i64>,
}

/// A code-set mapping from raw integer survey codes to category labels.
///
/// Categories keep their declared order. Lookups go through a reverse index
/// built once at construction, so a code listed under two categories is a
/// construction error rather than something resolved by declaration order.
#[derive(Debug, Clone)]
pub struct CategoryMapping {
    name: String,
    categories: Vec<String>,
    index: HashMap<i64, usize>,
    fallback: String,
}

impl CategoryMapping {
    /// Builds the mapping `name` from ordered `(category, codes)` entries.
    ///
    /// Codes that match no entry classify as `fallback`.
    pub fn new<N, C>(
        name: &str,
        entries: impl IntoIterator<Item = (N, C)>,
        fallback: &str,
    ) -> Result<Self, MappingError>
    where
        N: Into<String>,
        C: IntoIterator<Item = i64>,
    {
        let mut categories: Vec<String> = Vec::new();
        let mut index: HashMap<i64, usize> = HashMap::new();

        for (category, codes) in entries {
            let category = category.into();
            let slot = match categories.iter().position(|c| *c == category) {
                Some(slot) => slot,
                None => {
                    categories.push(category);
                    categories.len() - 1
                }
            };

            for code in codes {
                if let Some(&existing) = index.get(&code) {
                    if existing == slot {
                        continue;
                    }
                    return Err(MappingError::DuplicateCode {
                        mapping: name.to_string(),
                        code,
                        first: categories[existing].clone(),
                        second: categories[slot].clone(),
                    });
                }
                index.insert(code, slot);
            }
        }

        Ok(Self {
            name: name.to_string(),
            categories,
            index,
            fallback: fallback.to_string(),
        })
    }

    /// Builds a mapping from entries deserialized out of an override file.
    pub fn from_entries(
        name: &str,
        entries: Vec<MappingEntry>,
        fallback: &str,
    ) -> Result<Self, MappingError> {
        Self::new(
            name,
            entries.into_iter().map(|e| (e.name, e.codes)),
            fallback,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared category labels, in declaration order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Declared labels followed by the fallback label when it is not itself
    /// a declared category. This is the full set `classify` can return.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.categories.iter().map(String::as_str).collect();
        if !labels.contains(&self.fallback.as_str()) {
            labels.push(&self.fallback);
        }
        labels
    }

    /// Strict lookup: the category whose code set contains `code`, if any.
    pub fn lookup(&self, code: i64) -> Option<&str> {
        self.index
            .get(&code)
            .map(|&slot| self.categories[slot].as_str())
    }

    /// Total lookup: missing or unmapped codes fall back to the fallback label.
    pub fn classify(&self, code: Option<i64>) -> &str {
        code.and_then(|c| self.lookup(c)).unwrap_or(&self.fallback)
    }

    /// Whether `code` belongs to any declared category.
    pub fn contains(&self, code: i64) -> bool {
        self.index.contains_key(&code)
    }

    /// All mapped codes, ascending.
    pub fn codes(&self) -> Vec<i64> {
        let mut codes: Vec<i64> = self.index.keys().copied().collect();
        codes.sort_unstable();
        codes
    }
}
