use std::collections::HashMap;
use std::fmt;

/// Input formats the collection step understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// A plain text file, one document per file
    Text,
    /// A JSON conversation log, one document per message
    JsonConversation,
    /// A CSV table, one document per row
    CsvRow,
}

impl DocumentKind {
    /// Value stored under the `type` metadata key of every chunk.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Text => "txt",
            DocumentKind::JsonConversation => "json",
            DocumentKind::CsvRow => "csv",
        }
    }
}

/// A parsed source document, the unit handed to the chunker.
///
/// # Example
///
/// ```no_run
/// # use lodestar_core::rag::{Document, DocumentKind};
/// let doc = Document::new("Hello world", "notes/hello.txt", DocumentKind::Text)
///     .with_metadata("row", "3");
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    /// Where the text came from, a file path or link
    pub source: String,
    pub kind: DocumentKind,
    /// Positional extras such as a row or message index
    pub metadata: HashMap<String, String>,
}

impl Document {
    pub fn new(text: impl Into<String>, source: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            kind,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The metadata map stored with every chunk of this document. Always
    /// carries `source` and `type` on top of the positional extras.
    pub fn chunk_metadata(&self) -> HashMap<String, String> {
        let mut metadata = self.metadata.clone();
        metadata.insert("source".to_string(), self.source.clone());
        metadata.insert("type".to_string(), self.kind.as_str().to_string());
        metadata
    }
}

/// One retrieved chunk and its distance to the question.
///
/// Results arrive ordered by ascending distance (closest first) and are
/// passed through exactly as the store ranked them.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub text: String,
    pub metadata: HashMap<String, String>,
    pub distance: f32,
}

/// A grounded answer plus the source lines backing it.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The model's answer; may be empty when the model returned no text
    pub body: String,
    /// One line per retrieved chunk with source metadata, retrieval order
    pub sources: Vec<String>,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\nSources:\n{}", self.body, self.sources.join("\n"))
    }
}
