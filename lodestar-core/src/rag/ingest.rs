//! Document collection for ingestion.
//!
//! This module walks a directory tree and turns the file formats the
//! pipeline understands into documents:
//! - `.txt` files, one document per file
//! - `.json` conversation logs, one document per message
//! - `.csv` tables, one document per row
//!
//! Everything else is skipped. Parsing stays thin here; chunking and
//! embedding happen downstream.

use super::types::{Document, DocumentKind};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

/// Errors that can occur while collecting documents.
#[derive(Debug, Error)]
pub enum IngestError {
    /// An I/O error occurred while reading files or directories.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A conversation log was not valid JSON of the expected shape.
    #[error("Invalid conversation log: {0}")]
    Json(#[from] serde_json::Error),

    /// A CSV file could not be parsed.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for collection operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// One message of a JSON conversation log.
#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    from: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    content: String,
}

/// Recursively collects every supported file under `dir` into documents.
///
/// Unreadable `.txt` files are skipped with a warning. Malformed `.json`
/// and `.csv` files fail the run.
pub async fn collect_documents(dir: impl AsRef<Path>) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    collect_recursive(dir.as_ref(), &mut documents).await?;
    Ok(documents)
}

fn collect_recursive<'a>(
    dir: &'a Path,
    documents: &'a mut Vec<Document>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            if path.is_dir() {
                collect_recursive(&path, documents).await?;
                continue;
            }

            match path.extension().and_then(|ext| ext.to_str()) {
                Some("txt") => match fs::read_to_string(&path).await {
                    Ok(text) => documents.push(Document::new(
                        text,
                        path.display().to_string(),
                        DocumentKind::Text,
                    )),
                    Err(err) => {
                        warn!(path = %path.display(), %err, "skipping unreadable text file")
                    }
                },
                Some("json") => parse_conversation(&path, documents).await?,
                Some("csv") => parse_csv(&path, documents).await?,
                _ => {}
            }
        }

        Ok(())
    })
}

/// One document per message, rendered the way the log reads.
async fn parse_conversation(path: &Path, documents: &mut Vec<Document>) -> Result<()> {
    let data = fs::read_to_string(path).await?;
    let messages: Vec<Message> = serde_json::from_str(&data)?;

    for (i, message) in messages.iter().enumerate() {
        let text = format!(
            "Message from {}, date {}: {}",
            message.from, message.date, message.content
        );
        documents.push(
            Document::new(text, path.display().to_string(), DocumentKind::JsonConversation)
                .with_metadata("idx", i.to_string()),
        );
    }

    debug!(path = %path.display(), messages = messages.len(), "parsed conversation log");
    Ok(())
}

/// One document per row, joining up to the first three columns.
async fn parse_csv(path: &Path, documents: &mut Vec<Document>) -> Result<()> {
    let data = fs::read_to_string(path).await?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        let text = record.iter().take(3).collect::<Vec<_>>().join(" ");
        documents.push(
            Document::new(text, path.display().to_string(), DocumentKind::CsvRow)
                .with_metadata("row", rows.to_string()),
        );
        rows += 1;
    }

    debug!(path = %path.display(), rows, "parsed CSV table");
    Ok(())
}
