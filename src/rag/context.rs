//! Context assembly from retrieved documents

use crate::models::DocumentMatch;

/// Assembler for creating a bounded context block from search results
pub struct ContextAssembler {
    max_context_length: usize,
}

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new(max_context_length: usize) -> Self {
        Self { max_context_length }
    }

    /// Assemble context from matches in the order supplied.
    ///
    /// Greedy truncation: assembly stops before the entry that would push the
    /// block past the character budget, and every later match is dropped. The
    /// search step orders matches by descending similarity, so the tail is
    /// always the least relevant.
    #[must_use]
    pub fn assemble(&self, matches: &[DocumentMatch]) -> String {
        let mut context = String::new();
        let mut total_length = 0;

        for (idx, doc) in matches.iter().enumerate() {
            let entry = Self::format_entry(idx, doc);

            if total_length + entry.len() > self.max_context_length {
                break;
            }

            context.push_str(&entry);
            total_length += entry.len();
        }

        context
    }

    /// Number of matches that fit the budget, counted the same way
    /// `assemble` includes them
    #[must_use]
    pub fn included_count(&self, matches: &[DocumentMatch]) -> usize {
        let mut total_length = 0;
        let mut count = 0;

        for (idx, doc) in matches.iter().enumerate() {
            let entry = Self::format_entry(idx, doc);

            if total_length + entry.len() > self.max_context_length {
                break;
            }

            total_length += entry.len();
            count += 1;
        }

        count
    }

    fn format_entry(idx: usize, doc: &DocumentMatch) -> String {
        format!(
            "\n[Document {}: {}]\nType: {}\nSource: {}\nRelevance: {:.1}%\n{}\n",
            idx + 1,
            doc.name,
            doc.document_type,
            doc.source,
            doc.similarity * 100.0,
            doc.content
        )
    }

    /// Get the character budget
    #[must_use]
    pub const fn budget(&self) -> usize {
        self.max_context_length
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(8000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn doc(name: &str, similarity: f32, content: &str) -> DocumentMatch {
        DocumentMatch {
            id: Uuid::new_v4(),
            name: name.to_string(),
            document_type: "faq".to_string(),
            source: "upload".to_string(),
            content: content.to_string(),
            similarity,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn test_empty_matches_produce_empty_context() {
        let assembler = ContextAssembler::default();
        assert_eq!(assembler.assemble(&[]), "");
    }

    #[test]
    fn test_context_never_exceeds_budget() {
        let assembler = ContextAssembler::new(300);
        let matches: Vec<_> = (0..20)
            .map(|i| doc(&format!("doc{i}"), 0.9, &"x".repeat(100)))
            .collect();

        let context = assembler.assemble(&matches);
        assert!(context.len() <= 300);
        assert!(!context.is_empty());
    }

    #[test]
    fn test_matches_kept_in_supplied_order_dropped_from_tail() {
        let assembler = ContextAssembler::new(400);
        let matches = vec![
            doc("first", 0.91, "refunds are processed in 5 days"),
            doc("second", 0.85, "returns require a receipt"),
            doc("third", 0.52, &"filler ".repeat(100)),
        ];

        let context = assembler.assemble(&matches);
        let first_pos = context.find("first").unwrap();
        let second_pos = context.find("second").unwrap();
        assert!(first_pos < second_pos);
        // oversized tail entry is silently dropped
        assert!(!context.contains("third"));
        assert_eq!(assembler.included_count(&matches), 2);
    }

    #[test]
    fn test_similarity_rendered_as_percentage() {
        let assembler = ContextAssembler::default();
        let context = assembler.assemble(&[doc("policy", 0.91, "body")]);
        assert!(context.contains("Relevance: 91.0%"));
        assert!(context.contains("[Document 1: policy]"));
    }
}
