//! Parser for the TMDB metadata tables.
//!
//! This module handles reading the two CSV files:
//! - movies: one row per movie with `id`, `title`, `overview`, `genres`, `keywords`, ...
//! - credits: `movie_id`, `title`, `cast`, `crew`
//!
//! The structured columns hold JSON documents inside quoted CSV fields, so
//! the `csv` crate does the splitting and quoting; decoding the JSON is left
//! to the feature extractor.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use csv::StringRecord;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Column used to join the two tables
pub const JOIN_KEY: &str = "title";

const MOVIE_COLUMNS: &[&str] = &["id", JOIN_KEY, "overview", "genres", "keywords"];
const CREDIT_COLUMNS: &[&str] = &["movie_id", JOIN_KEY, "cast", "crew"];

#[derive(Debug, Deserialize)]
struct MovieCsvRow {
    id: Option<String>,
    title: Option<String>,
    overview: Option<String>,
    genres: Option<String>,
    keywords: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreditCsvRow {
    movie_id: Option<String>,
    title: Option<String>,
    cast: Option<String>,
    crew: Option<String>,
}

/// Open a CSV file and return the reader plus its header row.
///
/// A missing file is reported as `FileNotFound` so the caller can tell
/// "wrong path" from "unreadable contents". Header names are trimmed, and
/// rows are deserialized against the trimmed names.
fn open_csv(path: &Path) -> Result<(csv::Reader<File>, StringRecord)> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: display.clone(),
        },
        _ => DataLoadError::IoError {
            path: display.clone(),
            source: e,
        },
    })?;

    let mut reader = csv::Reader::from_reader(file);
    let mut headers = reader
        .headers()
        .map_err(|e| DataLoadError::CsvError {
            path: display.clone(),
            source: e,
        })?
        .clone();
    headers.trim();

    Ok((reader, headers))
}

/// Check that every required column is present in the header row
fn require_columns(headers: &StringRecord, file: &str, required: &[&str]) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(DataLoadError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Treat whitespace-only cells the same as empty ones
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse an optional numeric id cell
fn parse_id(value: Option<String>, column: &str, file: &str, line: u64) -> Result<Option<MovieId>> {
    match non_blank(value) {
        Some(raw) => raw
            .trim()
            .parse::<MovieId>()
            .map(Some)
            .map_err(|e| DataLoadError::ParseError {
                file: file.to_string(),
                line,
                reason: format!("Invalid {} '{}': {}", column, raw, e),
            }),
        None => Ok(None),
    }
}

/// Parse the movie attributes table
pub fn parse_movies(path: &Path) -> Result<Vec<MovieAttributes>> {
    let file = path.display().to_string();
    let (mut reader, headers) = open_csv(path)?;
    require_columns(&headers, &file, MOVIE_COLUMNS)?;

    let mut movies = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| DataLoadError::CsvError {
            path: file.clone(),
            source: e,
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let row: MovieCsvRow =
            record
                .deserialize(Some(&headers))
                .map_err(|e| DataLoadError::ParseError {
                    file: file.clone(),
                    line,
                    reason: e.to_string(),
                })?;

        movies.push(MovieAttributes {
            id: parse_id(row.id, "id", &file, line)?,
            title: non_blank(row.title),
            overview: non_blank(row.overview),
            genres: non_blank(row.genres),
            keywords: non_blank(row.keywords),
        });
    }

    Ok(movies)
}

/// Parse the credits table
///
/// `movie_id` must be numeric when present; an empty id is allowed here
/// and the row is dropped later by the join's completeness check.
pub fn parse_credits(path: &Path) -> Result<Vec<MovieCredits>> {
    let file = path.display().to_string();
    let (mut reader, headers) = open_csv(path)?;
    require_columns(&headers, &file, CREDIT_COLUMNS)?;

    let mut credits = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| DataLoadError::CsvError {
            path: file.clone(),
            source: e,
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let row: CreditCsvRow =
            record
                .deserialize(Some(&headers))
                .map_err(|e| DataLoadError::ParseError {
                    file: file.clone(),
                    line,
                    reason: e.to_string(),
                })?;

        credits.push(MovieCredits {
            movie_id: parse_id(row.movie_id, "movie_id", &file, line)?,
            title: non_blank(row.title),
            cast: non_blank(row.cast),
            crew: non_blank(row.crew),
        });
    }

    Ok(credits)
}
