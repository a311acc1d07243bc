//! Document loading from a source directory.
//!
//! The format of each file is chosen from its extension through a small
//! registry. Files with unknown extensions are skipped without error.

use crate::types::{Document, Metadata};
use askdocs_core::{AppError, AppResult};
use serde_json::Value;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Whole file is one document
    PlainText,
    /// One document per page
    Pdf,
}

type LoaderFn = fn(&Path) -> AppResult<Vec<Document>>;

/// Extension registry. Lookups are case-insensitive.
const REGISTRY: &[(&str, DocumentFormat)] = &[
    ("txt", DocumentFormat::PlainText),
    ("text", DocumentFormat::PlainText),
    ("pdf", DocumentFormat::Pdf),
];

impl DocumentFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        REGISTRY
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, format)| *format)
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Pdf => "pdf",
        }
    }

    fn loader(&self) -> LoaderFn {
        match self {
            Self::PlainText => load_plain_text,
            Self::Pdf => load_pdf,
        }
    }

    /// Read `path` into one or more documents.
    pub fn load(&self, path: &Path) -> AppResult<Vec<Document>> {
        (self.loader())(path)
    }
}

/// Lazily yields the documents of a source directory.
///
/// Files are listed up front but only read when the iterator reaches them.
pub struct DocumentIter {
    files: std::vec::IntoIter<(PathBuf, DocumentFormat)>,
    pending: VecDeque<Document>,
}

impl DocumentIter {
    /// Number of recognized files that have not been read yet.
    pub fn remaining_files(&self) -> usize {
        self.files.len()
    }
}

impl Iterator for DocumentIter {
    type Item = AppResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(doc) = self.pending.pop_front() {
                return Some(Ok(doc));
            }

            let (path, format) = self.files.next()?;
            tracing::debug!("Loading {:?} as {}", path, format.as_str());

            match format.load(&path) {
                Ok(docs) => self.pending.extend(docs),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Open `dir` for loading.
///
/// Only the top level of the directory is scanned, in file-name order.
///
/// # Errors
/// Returns `AppError::Load` if the directory does not exist or cannot be
/// listed. An empty directory yields no documents.
pub fn load_documents(dir: &Path) -> AppResult<DocumentIter> {
    if !dir.is_dir() {
        return Err(AppError::Load(format!(
            "Source directory not found: {:?}",
            dir
        )));
    }

    let mut files = Vec::new();
    let mut skipped = 0usize;

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry
            .map_err(|e| AppError::Load(format!("Failed to list {:?}: {}", dir, e)))?;
        if !entry.file_type().is_file() {
            continue;
        }

        match DocumentFormat::from_path(entry.path()) {
            Some(format) => files.push((entry.into_path(), format)),
            None => skipped += 1,
        }
    }

    tracing::info!(
        "Found {} loadable files in {:?} ({} skipped)",
        files.len(),
        dir,
        skipped
    );

    Ok(DocumentIter {
        files: files.into_iter(),
        pending: VecDeque::new(),
    })
}

fn base_metadata(path: &Path, format: DocumentFormat) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(
        "source".to_string(),
        Value::String(path.to_string_lossy().to_string()),
    );
    if let Some(name) = path.file_name() {
        metadata.insert(
            "file_name".to_string(),
            Value::String(name.to_string_lossy().to_string()),
        );
    }
    metadata.insert("format".to_string(), Value::String(format.as_str().to_string()));
    metadata
}

fn load_plain_text(path: &Path) -> AppResult<Vec<Document>> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::Load(format!("Failed to read {:?}: {}", path, e)))?;

    Ok(vec![Document::new(
        text,
        base_metadata(path, DocumentFormat::PlainText),
    )])
}

fn load_pdf(path: &Path) -> AppResult<Vec<Document>> {
    let pdf = lopdf::Document::load(path)
        .map_err(|e| AppError::Load(format!("Failed to open PDF {:?}: {}", path, e)))?;

    let pages = pdf.get_pages();
    let total_pages = pages.len();
    let mut documents = Vec::with_capacity(total_pages);

    for (index, page_number) in pages.keys().enumerate() {
        let text = match pdf.extract_text(&[*page_number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("No extractable text on page {} of {:?}: {}", page_number, path, e);
                String::new()
            }
        };

        let mut metadata = base_metadata(path, DocumentFormat::Pdf);
        metadata.insert("page".to_string(), Value::from(index));
        metadata.insert("total_pages".to_string(), Value::from(total_pages));
        documents.push(Document::new(text, metadata));
    }

    tracing::debug!("Extracted {} pages from {:?}", total_pages, path);
    Ok(documents)
}
