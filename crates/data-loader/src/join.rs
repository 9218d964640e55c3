//! Joining the two metadata tables.
//!
//! This module builds the table the feature extractor consumes:
//! - Parse both files (in parallel, they are independent)
//! - Inner-join them on title, falling back to the id for repeated titles
//! - Drop rows with any missing required field
//!
//! Rust concepts you'll see here:
//! - Borrowing into a HashMap (`HashMap<&str, Vec<&MovieCredits>>`) to avoid clones
//! - `rayon::join` for two-way parallelism
//! - `Option` combinators to express "all fields present"

use crate::error::Result;
use crate::parser;
use crate::types::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Load both tables and join them on title
///
/// This is the main entry point of the crate.
pub fn load_movies(movies_path: &Path, credits_path: &Path) -> Result<JoinedMetadata> {
    info!(
        "Loading metadata from {} and {}",
        movies_path.display(),
        credits_path.display()
    );

    let (movies, credits) = rayon::join(
        || parser::parse_movies(movies_path),
        || parser::parse_credits(credits_path),
    );

    // Handle errors from parallel parsing
    let movies = movies?;
    let credits = credits?;

    info!(
        "Parsed {} movie rows and {} credit rows",
        movies.len(),
        credits.len()
    );

    let joined = join_on_title(&movies, &credits);
    info!(
        "Joined on title: {} rows, {} dropped for missing fields, {} kept",
        joined.report.joined_rows,
        joined.report.dropped_incomplete,
        joined.report.kept()
    );

    Ok(joined)
}

/// Inner join on title.
///
/// Output order follows the movies table. Rows with a missing title never
/// match anything. When a title appears more than once in either table it
/// no longer identifies one movie, so those rows pair only where the movies
/// `id` equals the credits `movie_id`. Each movie id is therefore emitted at
/// most once as long as the ids are unique within each table.
pub fn join_on_title(movies: &[MovieAttributes], credits: &[MovieCredits]) -> JoinedMetadata {
    let mut by_title: HashMap<&str, Vec<&MovieCredits>> = HashMap::new();
    for credit in credits {
        if let Some(title) = credit.title.as_deref() {
            by_title.entry(title).or_default().push(credit);
        }
    }

    let mut movie_title_counts: HashMap<&str, usize> = HashMap::new();
    for title in movies.iter().filter_map(|m| m.title.as_deref()) {
        *movie_title_counts.entry(title).or_default() += 1;
    }

    let mut report = LoadReport {
        movie_rows: movies.len(),
        credit_rows: credits.len(),
        ..LoadReport::default()
    };
    let mut joined = Vec::new();

    for movie in movies {
        let Some(title) = movie.title.as_deref() else {
            continue;
        };
        let Some(matches) = by_title.get(title) else {
            continue;
        };

        let ambiguous =
            matches.len() > 1 || movie_title_counts.get(title).is_some_and(|&n| n > 1);
        for credit in matches {
            if ambiguous && (movie.id.is_none() || movie.id != credit.movie_id) {
                continue;
            }

            report.joined_rows += 1;
            match complete_row(title, movie, credit) {
                Some(row) => joined.push(row),
                None => {
                    debug!("Dropping '{}': missing required field", title);
                    report.dropped_incomplete += 1;
                }
            }
        }
    }

    JoinedMetadata {
        movies: joined,
        report,
    }
}

/// Build a joined row only if every required field is present
fn complete_row(title: &str, movie: &MovieAttributes, credit: &MovieCredits) -> Option<RawMovie> {
    Some(RawMovie {
        movie_id: credit.movie_id?,
        title: title.to_string(),
        overview: movie.overview.clone()?,
        genres: movie.genres.clone()?,
        keywords: movie.keywords.clone()?,
        cast: credit.cast.clone()?,
        crew: credit.crew.clone()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(title: &str, overview: Option<&str>) -> MovieAttributes {
        MovieAttributes {
            id: None,
            title: Some(title.to_string()),
            overview: overview.map(str::to_string),
            genres: Some("[]".to_string()),
            keywords: Some("[]".to_string()),
        }
    }

    fn credit(id: MovieId, title: &str) -> MovieCredits {
        MovieCredits {
            movie_id: Some(id),
            title: Some(title.to_string()),
            cast: Some("[]".to_string()),
            crew: Some("[]".to_string()),
        }
    }

    #[test]
    fn test_join_keeps_movies_order() {
        let movies = vec![attrs("B", Some("b")), attrs("A", Some("a"))];
        let credits = vec![credit(1, "A"), credit(2, "B")];

        let joined = join_on_title(&movies, &credits);

        let titles: Vec<_> = joined.movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
        assert_eq!(joined.movies[0].movie_id, 2);
        assert_eq!(joined.report.kept(), 2);
    }

    #[test]
    fn test_unmatched_titles_are_skipped() {
        let movies = vec![attrs("A", Some("a")), attrs("Only In Movies", Some("x"))];
        let credits = vec![credit(1, "A"), credit(9, "Only In Credits")];

        let joined = join_on_title(&movies, &credits);
        assert_eq!(joined.movies.len(), 1);
        assert_eq!(joined.report.joined_rows, 1);
    }

    #[test]
    fn test_incomplete_rows_are_dropped() {
        let movies = vec![attrs("A", None), attrs("B", Some("b"))];
        let mut no_cast = credit(2, "B");
        no_cast.cast = None;
        let credits = vec![credit(1, "A"), no_cast];

        let joined = join_on_title(&movies, &credits);
        assert!(joined.movies.is_empty());
        assert_eq!(joined.report.joined_rows, 2);
        assert_eq!(joined.report.dropped_incomplete, 2);
    }

    fn attrs_with_id(id: MovieId, title: &str, overview: &str) -> MovieAttributes {
        MovieAttributes {
            id: Some(id),
            ..attrs(title, Some(overview))
        }
    }

    #[test]
    fn test_duplicate_titles_pair_by_id() {
        let movies = vec![
            attrs_with_id(1255, "The Host", "korean monster"),
            attrs_with_id(72710, "The Host", "alien souls"),
            attrs_with_id(5, "Other", "other"),
        ];
        let credits = vec![
            credit(72710, "The Host"),
            credit(1255, "The Host"),
            credit(5, "Other"),
        ];

        let joined = join_on_title(&movies, &credits);
        let pairs: Vec<_> = joined
            .movies
            .iter()
            .map(|m| (m.overview.as_str(), m.movie_id))
            .collect();
        assert_eq!(
            pairs,
            vec![("korean monster", 1255), ("alien souls", 72710), ("other", 5)]
        );
        assert_eq!(joined.report.joined_rows, 3);
    }

    #[test]
    fn test_title_repeated_only_in_movies_needs_matching_id() {
        let movies = vec![
            attrs_with_id(1, "Batman", "1966"),
            attrs_with_id(2, "Batman", "1989"),
        ];
        let credits = vec![credit(2, "Batman")];

        let joined = join_on_title(&movies, &credits);
        assert_eq!(joined.movies.len(), 1);
        assert_eq!(joined.movies[0].overview, "1989");
        assert_eq!(joined.movies[0].movie_id, 2);
    }

    #[test]
    fn test_unique_title_ignores_id_mismatch() {
        let movies = vec![attrs_with_id(1, "A", "a")];
        let credits = vec![credit(101, "A")];

        let joined = join_on_title(&movies, &credits);
        assert_eq!(joined.movies.len(), 1);
        assert_eq!(joined.movies[0].movie_id, 101);
    }
}
