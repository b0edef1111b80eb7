//! Glossary catalog of lingo terms grouped by category
//!
//! The catalog is read once at startup and never changes afterwards. Categories
//! and terms keep the order they were defined in, which is the order the UI
//! presents them in.

pub mod lingo;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lingo::LINGO;

/// Errors that can occur when loading a glossary file
#[derive(Debug, Error)]
pub enum GlossaryError {
    /// The glossary file could not be read
    #[error("Failed to read glossary file: {0}")]
    Io(#[from] std::io::Error),

    /// The glossary file is not valid JSON of the expected shape
    #[error("Failed to parse glossary file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A category has an empty name
    #[error("Category #{0} has an empty name")]
    EmptyCategoryName(usize),
}

/// A named group of terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Display name of the category
    pub name: String,
    /// Terms in display order
    #[serde(default)]
    pub terms: Vec<String>,
}

impl Category {
    /// Creates a category from a name and a list of terms
    pub fn new<I, S>(name: impl Into<String>, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }
}

/// A term string listed under more than one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTerm {
    /// The shared term string
    pub term: String,
    /// Every category that lists it, in catalog order
    pub categories: Vec<String>,
}

/// Read-only catalog of categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    categories: Vec<Category>,
}

impl Glossary {
    /// Builds the glossary shipped with the binary
    pub fn builtin() -> Self {
        let categories = LINGO
            .iter()
            .map(|c| Category::new(c.name, c.terms.iter().copied()))
            .collect();
        Self { categories }
    }

    /// Builds a glossary from already-loaded categories
    pub fn from_categories(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Loads a glossary from a JSON file
    ///
    /// The file holds an array of `{ "name": ..., "terms": [...] }` objects.
    /// A category without a `terms` field is treated as empty.
    ///
    /// # Returns
    /// * `Ok(Glossary)` with categories in file order
    /// * `Err(GlossaryError)` if the file cannot be read or parsed
    pub fn from_json_file(path: &Path) -> Result<Self, GlossaryError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses a glossary from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, GlossaryError> {
        let categories: Vec<Category> = serde_json::from_str(json)?;
        if let Some(index) = categories.iter().position(|c| c.name.trim().is_empty()) {
            return Err(GlossaryError::EmptyCategoryName(index));
        }
        Ok(Self { categories })
    }

    /// Returns all categories in catalog order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Returns the category at the given index, if any
    pub fn category(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    /// Returns the number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns true if the glossary has no categories
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Returns the total number of terms across all categories
    pub fn term_count(&self) -> usize {
        self.categories.iter().map(|c| c.terms.len()).sum()
    }

    /// Finds term strings that appear in more than one category
    ///
    /// Terms are identified by their display string alone, so a duplicate
    /// shares one cache entry across categories.
    pub fn duplicate_terms(&self) -> Vec<DuplicateTerm> {
        let mut seen: HashMap<&str, Vec<String>> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for category in &self.categories {
            for term in &category.terms {
                let owners = seen.entry(term.as_str()).or_insert_with(|| {
                    order.push(term.as_str());
                    Vec::new()
                });
                if !owners.contains(&category.name) {
                    owners.push(category.name.clone());
                }
            }
        }

        order
            .into_iter()
            .filter_map(|term| {
                let categories = seen.remove(term)?;
                (categories.len() > 1).then(|| DuplicateTerm {
                    term: term.to_string(),
                    categories,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_keeps_catalog_order() {
        let glossary = Glossary::builtin();
        assert_eq!(glossary.len(), 6);
        assert_eq!(
            glossary.category(0).unwrap().name,
            "Everyday Conversation Emphasis & Fillers"
        );
        assert_eq!(glossary.category(5).unwrap().name, "Sabah Lingo");
        assert_eq!(glossary.category(0).unwrap().terms[0], "Lah");
    }

    #[test]
    fn test_builtin_term_count() {
        let glossary = Glossary::builtin();
        assert_eq!(glossary.term_count(), 9 + 16 + 13 + 15 + 6 + 12);
    }

    #[test]
    fn test_builtin_has_no_duplicate_terms() {
        assert!(Glossary::builtin().duplicate_terms().is_empty());
    }

    #[test]
    fn test_duplicate_terms_are_reported_with_all_categories() {
        let glossary = Glossary::from_categories(vec![
            Category::new("Fillers", ["Lah", "Meh"]),
            Category::new("Drinks", ["Kopi", "Lah"]),
            Category::new("Sabah", ["Bah", "Lah", "Kopi"]),
        ]);

        let duplicates = glossary.duplicate_terms();

        assert_eq!(duplicates.len(), 2);
        assert_eq!(duplicates[0].term, "Lah");
        assert_eq!(duplicates[0].categories, vec!["Fillers", "Drinks", "Sabah"]);
        assert_eq!(duplicates[1].term, "Kopi");
        assert_eq!(duplicates[1].categories, vec!["Drinks", "Sabah"]);
    }

    #[test]
    fn test_repeated_term_within_one_category_is_not_a_duplicate() {
        let glossary =
            Glossary::from_categories(vec![Category::new("Fillers", ["Lah", "Lah"])]);
        assert!(glossary.duplicate_terms().is_empty());
    }

    #[test]
    fn test_from_json_str_accepts_missing_terms() {
        let glossary =
            Glossary::from_json_str(r#"[{"name": "Fillers", "terms": ["Lah"]}, {"name": "Empty"}]"#)
                .expect("Should parse");

        assert_eq!(glossary.len(), 2);
        assert!(glossary.category(1).unwrap().terms.is_empty());
    }

    #[test]
    fn test_from_json_str_rejects_blank_category_name() {
        let result = Glossary::from_json_str(r#"[{"name": "  ", "terms": []}]"#);
        assert!(matches!(result, Err(GlossaryError::EmptyCategoryName(0))));
    }

    #[test]
    fn test_from_json_str_rejects_invalid_json() {
        let result = Glossary::from_json_str("{ not json");
        assert!(matches!(result, Err(GlossaryError::Parse(_))));
    }

    #[test]
    fn test_from_json_file_reads_categories() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        write!(file, r#"[{{"name": "Fillers", "terms": ["Lah", "Meh"]}}]"#).unwrap();

        let glossary = Glossary::from_json_file(file.path()).expect("Should load file");

        assert_eq!(glossary.categories(), &[Category::new("Fillers", ["Lah", "Meh"])]);
    }

    #[test]
    fn test_from_json_file_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Glossary::from_json_file(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(GlossaryError::Io(_))));
    }

    #[test]
    fn test_empty_glossary() {
        let glossary = Glossary::default();
        assert!(glossary.is_empty());
        assert_eq!(glossary.term_count(), 0);
        assert!(glossary.category(0).is_none());
    }
}
