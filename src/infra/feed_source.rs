//! File-backed feed: the first worksheet of an `.xlsx` workbook, or a `.json` tree.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{Data, Range, Reader, Xlsx};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::application::sync::{FeedDocument, FeedError, FeedSource};
use crate::domain::feed::{FeedCell, FeedSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedFormat {
    Workbook,
    Json,
}

impl FeedFormat {
    fn for_path(path: &Path) -> Result<Self, FeedError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "xlsx" => Ok(Self::Workbook),
            "json" => Ok(Self::Json),
            _ => Err(FeedError::UnsupportedExtension(extension)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileFeedSource {
    path: PathBuf,
}

impl FileFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FeedSource for FileFeedSource {
    async fn load(&self) -> Result<FeedDocument, FeedError> {
        let format = FeedFormat::for_path(&self.path)?;
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| FeedError::Io {
                path: self.path.clone(),
                source,
            })?;
        let fingerprint = fingerprint(&bytes);

        let snapshot = match format {
            FeedFormat::Workbook => parse_workbook(bytes)?,
            FeedFormat::Json => serde_json::from_slice(&bytes)?,
        };

        debug!(
            target = "menuboard::sync::feed",
            path = %self.path.display(),
            menus = snapshot.menus.len(),
            fingerprint = %fingerprint,
            "Loaded feed"
        );
        Ok(FeedDocument {
            snapshot,
            fingerprint,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes).as_slice())
}

fn parse_workbook(bytes: Vec<u8>) -> Result<FeedSnapshot, FeedError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|err| FeedError::Workbook(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FeedError::Workbook("workbook has no worksheets".to_string()))?
        .map_err(|err| FeedError::Workbook(err.to_string()))?;

    FeedSnapshot::from_rows(sheet_rows(&range)).map_err(FeedError::Format)
}

/// Rows as laid out on the sheet, so row and column numbers match what a user sees.
fn sheet_rows(range: &Range<Data>) -> Vec<Vec<FeedCell>> {
    // The range starts at the first used cell; pad back to A1.
    let (top, leading) = range
        .start()
        .map(|(row, column)| (row as usize, column as usize))
        .unwrap_or((0, 0));

    std::iter::repeat_with(Vec::new)
        .take(top)
        .chain(range.rows().map(|row| {
            let mut cells = vec![FeedCell::Empty; leading];
            cells.extend(row.iter().map(feed_cell));
            cells
        }))
        .collect()
}

fn feed_cell(cell: &Data) -> FeedCell {
    match cell {
        Data::Empty | Data::Error(_) => FeedCell::Empty,
        Data::Int(value) => FeedCell::Number(*value as f64),
        Data::Float(value) => FeedCell::Number(*value),
        Data::String(text) => FeedCell::Text(text.clone()),
        Data::Bool(value) => FeedCell::Text(value.to_string()),
        Data::DateTime(value) => FeedCell::Text(value.to_string()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => FeedCell::Text(text.clone()),
    }
}
