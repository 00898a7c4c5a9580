//! Session log loading
//!
//! Reads raw session records from the store's export formats: JSON arrays,
//! JSONL, CSV and SQLite. Directories are walked and every supported file is
//! parsed in parallel.

use crate::error::LoadError;
use crate::session::RawSession;
use rayon::prelude::*;
use rusqlite::types::Value;
use rusqlite::Connection;
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFormat {
    Json,
    JsonLines,
    Csv,
    Sqlite,
}

impl SessionFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "ndjson" => Some(Self::JsonLines),
            "csv" => Some(Self::Csv),
            "db" | "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Object form of a JSON export: `{ "sessions": [...] }`.
#[derive(Deserialize)]
struct WrappedDocument {
    sessions: Vec<RawSession>,
}

/// Load raw sessions from a file or a directory of session files.
pub fn load_sessions(path: &Path) -> Result<Vec<RawSession>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    if path.is_dir() {
        let files = scan_directory(path);
        tracing::debug!(dir = %path.display(), files = files.len(), "scanned session directory");

        let per_file: Vec<Vec<RawSession>> = files
            .par_iter()
            .map(|file| load_file(file))
            .collect::<Result<_, _>>()?;

        return Ok(per_file.into_iter().flatten().collect());
    }

    load_file(path)
}

/// Supported session files under `root`, sorted by path.
pub fn scan_directory(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            let supported = SessionFormat::from_path(p).is_some();
            if !supported {
                tracing::debug!(path = %p.display(), "skipping unsupported file");
            }
            supported
        })
        .collect();

    files.sort();
    files
}

pub fn load_file(path: &Path) -> Result<Vec<RawSession>, LoadError> {
    let format = SessionFormat::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;

    let sessions = match format {
        SessionFormat::Json => parse_json_file(path)?,
        SessionFormat::JsonLines => parse_jsonl_file(path)?,
        SessionFormat::Csv => parse_csv_file(path)?,
        SessionFormat::Sqlite => parse_sqlite_file(path)?,
    };

    tracing::debug!(path = %path.display(), ?format, count = sessions.len(), "loaded sessions");
    Ok(sessions)
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn parse_json_file(path: &Path) -> Result<Vec<RawSession>, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;

    let parse_error = |e: serde_json::Error| LoadError::Parse {
        path: path.to_path_buf(),
        line: Some(e.line()),
        message: e.to_string(),
    };

    // Exports are either a bare array or the wrapped object form
    let is_object = bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{');

    if is_object {
        let document: WrappedDocument = serde_json::from_slice(&bytes).map_err(parse_error)?;
        Ok(document.sessions)
    } else {
        serde_json::from_slice(&bytes).map_err(parse_error)
    }
}

fn parse_jsonl_file(path: &Path) -> Result<Vec<RawSession>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| io_error(path, e))?;
    let reader = BufReader::new(file);
    let mut sessions = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_error(path, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut bytes = trimmed.as_bytes().to_vec();
        let session = simd_json::from_slice::<RawSession>(&mut bytes).map_err(|e| {
            LoadError::Parse {
                path: path.to_path_buf(),
                line: Some(index + 1),
                message: e.to_string(),
            }
        })?;
        sessions.push(session);
    }

    Ok(sessions)
}

fn parse_csv_file(path: &Path) -> Result<Vec<RawSession>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    reader
        .deserialize::<RawSession>()
        .map(|row| row.map_err(|e| csv_error(path, e)))
        .collect()
}

fn csv_error(path: &Path, err: csv::Error) -> LoadError {
    let line = err.position().map(|p| p.line() as usize);
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => io_error(path, source),
        _ => LoadError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        },
    }
}

/// Reads `reading_sessions(date, duration_minutes, pages_read)`. `date` may
/// be text or epoch milliseconds; NULL counts read as zero.
fn parse_sqlite_file(path: &Path) -> Result<Vec<RawSession>, LoadError> {
    let sqlite_error = |source: rusqlite::Error| LoadError::Sqlite {
        path: path.to_path_buf(),
        source,
    };

    let conn = Connection::open_with_flags(
        path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(sqlite_error)?;

    let query = r#"
        SELECT date, duration_minutes, pages_read
        FROM reading_sessions
        ORDER BY rowid
    "#;

    let mut stmt = conn.prepare(query).map_err(sqlite_error)?;
    let rows = stmt
        .query_map([], |row| {
            let date: Value = row.get(0)?;
            let duration_minutes: Option<i64> = row.get(1)?;
            let pages_read: Option<i64> = row.get(2)?;
            Ok(RawSession {
                date: sqlite_date(date),
                duration_minutes: duration_minutes.unwrap_or(0),
                pages_read: pages_read.unwrap_or(0),
            })
        })
        .map_err(sqlite_error)?;

    let sessions = rows.collect::<Result<Vec<_>, _>>().map_err(sqlite_error)?;
    Ok(sessions)
}

fn sqlite_date(value: Value) -> Option<String> {
    match value {
        Value::Text(text) => Some(text),
        Value::Integer(ms) => Some(ms.to_string()),
        Value::Real(ms) if ms.is_finite() => Some((ms.round() as i64).to_string()),
        Value::Real(_) => None,
        Value::Null | Value::Blob(_) => None,
    }
}
