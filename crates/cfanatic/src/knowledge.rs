use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const MAX_RESULTS: usize = 3;
const MIN_TERM_LEN: usize = 3;

/// Question words and fillers that say nothing about the topic
const STOPWORDS: &[&str] = &[
    "about", "and", "any", "are", "but", "can", "could", "does", "for", "from", "get", "has",
    "have", "how", "into", "its", "not", "should", "that", "the", "there", "this", "what",
    "when", "where", "which", "who", "why", "will", "with", "would", "you", "your",
];

/// Lowercase alphanumeric words of `text`
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

/// A searchable store of general competitive programming knowledge
#[cfg_attr(test, mockall::automock)]
pub trait KnowledgeBase: Send + Sync {
    /// Find material relevant to `text`, or `None` when nothing matches
    fn query(&self, text: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub body: String,
}

/// Scores documents by how many distinct query terms they contain
#[derive(Debug, Default)]
pub struct KeywordKnowledgeBase {
    documents: Vec<Document>,
}

impl KeywordKnowledgeBase {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load every `.md` and `.txt` file in `dir`, using the file stem as the title
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut documents = Vec::new();

        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read knowledge directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            let is_document = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "md" || ext == "txt");
            if !is_document {
                continue;
            }

            let body = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let title = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_string();
            documents.push(Document { title, body });
        }

        documents.sort_by(|a, b| a.title.cmp(&b.title));
        tracing::info!(count = documents.len(), "Loaded knowledge base documents");
        Ok(Self { documents })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl KnowledgeBase for KeywordKnowledgeBase {
    fn query(&self, text: &str) -> Result<Option<String>> {
        let terms: HashSet<String> = words(text)
            .filter(|term| term.chars().count() >= MIN_TERM_LEN)
            .filter(|term| !STOPWORDS.contains(&term.as_str()))
            .collect();

        let mut scored: Vec<(usize, &Document)> = self
            .documents
            .iter()
            .map(|doc| {
                let doc_words: HashSet<String> = words(&doc.title).chain(words(&doc.body)).collect();
                (terms.intersection(&doc_words).count(), doc)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        if scored.is_empty() {
            return Ok(None);
        }

        // Stable sort keeps the load order for equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        let result = scored
            .into_iter()
            .take(MAX_RESULTS)
            .map(|(_, doc)| format!("## {}\n{}", doc.title, doc.body.trim()))
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knowledge_base() -> KeywordKnowledgeBase {
        KeywordKnowledgeBase::new(vec![
            Document {
                title: "Segment tree".into(),
                body: "Range queries and point updates in logarithmic time.".into(),
            },
            Document {
                title: "Dynamic programming".into(),
                body: "Break the problem into overlapping subproblems and reuse answers.".into(),
            },
        ])
    }

    #[test]
    fn test_best_match_first() {
        let result = knowledge_base()
            .query("How do I answer range queries quickly?")
            .unwrap()
            .unwrap();
        assert!(result.starts_with("## Segment tree"));
        assert!(!result.contains("Dynamic programming"));
    }

    #[test]
    fn test_terms_match_whole_words() {
        let result = knowledge_base().query("overlapping answers").unwrap().unwrap();
        assert!(result.starts_with("## Dynamic programming"));

        assert_eq!(knowledge_base().query("answer").unwrap(), None);
        assert_eq!(knowledge_base().query("segments").unwrap(), None);
    }

    #[test]
    fn test_unrelated_question_finds_nothing() {
        let kb = KeywordKnowledgeBase::new(vec![Document {
            title: "Segment tree".into(),
            body: "Build the tree and answer range queries.".into(),
        }]);
        assert_eq!(kb.query("What is the weather in Paris?").unwrap(), None);
        assert_eq!(kb.query("How does this work and why?").unwrap(), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(knowledge_base().query("bitsets").unwrap(), None);
        assert_eq!(knowledge_base().query("a b").unwrap(), None);
    }

    #[test]
    fn test_from_dir_reads_markdown_and_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("greedy.md"), "Exchange arguments prove greedy choices.").unwrap();
        fs::write(dir.path().join("graphs.txt"), "Dijkstra finds shortest paths.").unwrap();
        fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();

        let kb = KeywordKnowledgeBase::from_dir(dir.path()).unwrap();
        assert_eq!(kb.len(), 2);

        let result = kb.query("shortest paths").unwrap().unwrap();
        assert!(result.starts_with("## graphs"));
    }

    #[test]
    fn test_from_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(KeywordKnowledgeBase::from_dir(dir.path().join("missing")).is_err());
    }
}
