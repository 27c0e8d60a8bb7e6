//! JSON result payload.
//!
//! The payload is what a presentation layer hands back to a client: the
//! five-row count table in fixed category order, a reference to the
//! annotated artifact and the optional free-text description.

use serde::{Deserialize, Serialize};
use shapetally_pipeline::{CategoryCounts, Locale, ShapeCategory};

/// One row of the count table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Machine-readable category.
    pub category: ShapeCategory,
    /// Localized plural name, e.g. "Squares".
    pub name: String,
    /// Number of shapes of this category.
    pub count: usize,
}

/// Serialized outcome of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPayload {
    /// Count table, always five rows in [`ShapeCategory::ALL`] order.
    pub shapes: Vec<CategoryEntry>,
    /// Where the annotated JPEG was written.
    pub processed_image: String,
    /// Free-text description of the image, when one was obtained.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

impl ResultPayload {
    /// Build a payload from a count table.
    #[must_use]
    pub fn new(
        counts: &CategoryCounts,
        locale: Locale,
        processed_image: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let shapes = counts
            .iter()
            .map(|(category, count)| CategoryEntry {
                category,
                name: category.plural(locale).to_owned(),
                count,
            })
            .collect();
        Self {
            shapes,
            processed_image: processed_image.into(),
            description,
        }
    }

    /// Count for `category`, zero if the row is missing.
    #[must_use]
    pub fn count(&self, category: ShapeCategory) -> usize {
        self.shapes
            .iter()
            .find(|entry| entry.category == category)
            .map_or(0, |entry| entry.count)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
