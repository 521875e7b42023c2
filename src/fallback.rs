//! Built-in breed list used when no scraped file is available.
//!
//! Kept as an immutable constant and passed to
//! [`Retriever::load`](crate::search::Retriever::load) explicitly, so
//! callers and tests can substitute their own set.

use crate::models::BreedDocument;

/// A breed entry with static storage.
#[derive(Debug, Clone, Copy)]
pub struct FallbackBreed {
    pub title: &'static str,
    pub content: &'static str,
}

pub const FALLBACK_SOURCE: &str = "Built-in";

pub const BUILTIN_BREEDS: &[FallbackBreed] = &[
    FallbackBreed {
        title: "Labrador Retriever",
        content: "Friendly, outgoing, and high-energy. Great for active families and training, \
                  needs daily exercise and enjoys retrieving games.",
    },
    FallbackBreed {
        title: "Golden Retriever",
        content: "Affectionate, patient, and eager to please. Excellent with kids, \
                  requires regular grooming and lots of activity.",
    },
    FallbackBreed {
        title: "French Bulldog",
        content: "Compact, calm, and good for apartment living. Moderate exercise needs, \
                  sensitive to heat and benefits from short walks.",
    },
    FallbackBreed {
        title: "Poodle (Standard)",
        content: "Highly intelligent and trainable. Low-shedding coat but needs regular grooming, \
                  enjoys mental and physical activity.",
    },
    FallbackBreed {
        title: "Beagle",
        content: "Curious, friendly, and social. Moderate exercise needs, \
                  can be vocal and enjoys scent games.",
    },
];

/// Materialize a static list into owned documents.
pub fn to_documents(breeds: &[FallbackBreed]) -> Vec<BreedDocument> {
    breeds
        .iter()
        .map(|b| BreedDocument {
            title: b.title.to_string(),
            content: b.content.to_string(),
            url: String::new(),
            source: FALLBACK_SOURCE.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_has_five_distinct_breeds() {
        let docs = to_documents(BUILTIN_BREEDS);
        assert_eq!(docs.len(), 5);
        let mut titles: Vec<&str> = docs.iter().map(|d| d.title.as_str()).collect();
        titles.dedup();
        assert_eq!(titles.len(), 5);
        assert!(docs.iter().all(|d| d.source == FALLBACK_SOURCE));
    }

    #[test]
    fn line_continuations_leave_single_spaces() {
        for doc in to_documents(BUILTIN_BREEDS) {
            assert!(!doc.content.contains("  "), "double space in {}", doc.title);
        }
    }
}
