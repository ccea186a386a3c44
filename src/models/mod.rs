use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod rating;
pub mod trending;

pub use rating::{Rating, RecommendationRequest, RecommendationResponse};
pub use trending::{Delta, Snapshot, TimeWindow, TrendingPayload};

/// Identifier assigned to a movie by the metadata API
pub type MovieId = u64;

/// A movie as delivered to clients and viewers
///
/// Only `id` and `title` are required; everything else is carried through
/// when the upstream supplied it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendingEntry {
    pub id: MovieId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genre_ids: Vec<u32>,
}

impl TrendingEntry {
    /// Creates an entry with only the required fields set
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: None,
            vote_count: None,
            popularity: None,
            genre_ids: Vec::new(),
        }
    }
}

/// A page of movies returned by trending and search lookups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendingFeed {
    pub results: Vec<TrendingEntry>,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    /// True when the built-in demo catalog answered instead of TMDB
    #[serde(default)]
    pub demo: bool,
}

impl TrendingFeed {
    /// Wraps a locally produced list as a single demo page
    pub fn demo(results: Vec<TrendingEntry>) -> Self {
        let total = results.len() as u32;
        Self {
            results,
            page: 1,
            total_pages: 1,
            total_results: total,
            demo: true,
        }
    }
}

/// Full details for one movie, including cast and trailers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: TrendingEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<u64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub credits: Credits,
    #[serde(default)]
    pub videos: Videos,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Videos {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: String,
    pub key: String,
    #[serde(rename = "type")]
    pub video_type: String,
    pub site: String,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw movie object from TMDB list endpoints
///
/// Every field is optional here; [`TrendingEntry::try_from`] decides what
/// is acceptable.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: Option<MovieId>,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub popularity: Option<f64>,
    pub genre_ids: Option<Vec<u32>>,
}

/// Raw paginated list from TMDB
///
/// Results stay untyped so one malformed entry does not sink the page.
#[derive(Debug, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvalidEntry {
    #[error("entry has no id")]
    MissingId,
    #[error("entry {0} has no title")]
    MissingTitle(MovieId),
}

impl TryFrom<TmdbMovie> for TrendingEntry {
    type Error = InvalidEntry;

    fn try_from(raw: TmdbMovie) -> Result<Self, Self::Error> {
        let id = raw.id.ok_or(InvalidEntry::MissingId)?;
        let title = raw
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or(InvalidEntry::MissingTitle(id))?;

        Ok(TrendingEntry {
            id,
            title,
            overview: raw.overview,
            poster_path: raw.poster_path,
            backdrop_path: raw.backdrop_path,
            release_date: raw.release_date,
            vote_average: raw.vote_average,
            vote_count: raw.vote_count,
            popularity: raw.popularity,
            genre_ids: raw.genre_ids.unwrap_or_default(),
        })
    }
}

impl TmdbPage {
    /// Validates every raw result, dropping the ones that fail
    pub fn into_feed(self) -> TrendingFeed {
        let raw_count = self.results.len();
        let results: Vec<TrendingEntry> = self
            .results
            .into_iter()
            .filter_map(|value| {
                let raw = serde_json::from_value::<TmdbMovie>(value).ok()?;
                match TrendingEntry::try_from(raw) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::debug!(reason = %e, "Dropping malformed TMDB entry");
                        None
                    }
                }
            })
            .collect();

        if results.len() < raw_count {
            tracing::warn!(
                dropped = raw_count - results.len(),
                kept = results.len(),
                "TMDB page contained malformed entries"
            );
        }

        TrendingFeed {
            results,
            page: self.page,
            total_pages: self.total_pages,
            total_results: self.total_results,
            demo: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tmdb_movie_with_nulls_becomes_entry() {
        let raw: TmdbMovie = serde_json::from_value(json!({
            "id": 550,
            "title": "Fight Club",
            "poster_path": null,
            "genre_ids": null,
            "popularity": 75.5
        }))
        .unwrap();

        let entry = TrendingEntry::try_from(raw).unwrap();
        assert_eq!(entry.id, 550);
        assert_eq!(entry.title, "Fight Club");
        assert_eq!(entry.poster_path, None);
        assert!(entry.genre_ids.is_empty());
        assert_eq!(entry.popularity, Some(75.5));
    }

    #[test]
    fn test_tmdb_movie_without_id_rejected() {
        let raw: TmdbMovie = serde_json::from_value(json!({ "title": "Nameless" })).unwrap();
        assert_eq!(TrendingEntry::try_from(raw), Err(InvalidEntry::MissingId));
    }

    #[test]
    fn test_tmdb_movie_with_blank_title_rejected() {
        let raw: TmdbMovie = serde_json::from_value(json!({ "id": 7, "title": "  " })).unwrap();
        assert_eq!(
            TrendingEntry::try_from(raw),
            Err(InvalidEntry::MissingTitle(7))
        );
    }

    #[test]
    fn test_page_drops_malformed_entries_and_keeps_order() {
        let page: TmdbPage = serde_json::from_value(json!({
            "page": 1,
            "results": [
                { "id": 1, "title": "A" },
                { "id": "not-a-number", "title": "Broken" },
                { "title": "No id" },
                { "id": 2, "title": "B" }
            ],
            "total_pages": 3,
            "total_results": 60
        }))
        .unwrap();

        let feed = page.into_feed();
        let ids: Vec<MovieId> = feed.results.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(feed.total_pages, 3);
        assert!(!feed.demo);
    }

    #[test]
    fn test_entry_serialization_skips_absent_fields() {
        let entry = TrendingEntry::new(2, "B");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, json!({ "id": 2, "title": "B" }));
    }

    #[test]
    fn test_movie_details_deserialization() {
        let details: MovieDetails = serde_json::from_value(json!({
            "id": 550,
            "title": "Fight Club",
            "budget": 63000000,
            "runtime": 139,
            "genres": [{ "id": 18, "name": "Drama" }],
            "credits": {
                "cast": [{ "id": 819, "name": "Edward Norton", "character": "The Narrator", "profile_path": null }]
            },
            "videos": {
                "results": [{ "id": "abc", "key": "BHE0Z7G5_54", "type": "Trailer", "site": "YouTube" }]
            }
        }))
        .unwrap();

        assert_eq!(details.movie.id, 550);
        assert_eq!(details.budget, Some(63_000_000));
        assert_eq!(details.credits.cast[0].name, "Edward Norton");
        assert_eq!(details.videos.results[0].video_type, "Trailer");
    }
}
