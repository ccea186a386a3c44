/// Built-in demo catalog
///
/// Answers every lookup from a fixed list of six classic films. Used when no
/// TMDB token is configured, and as the fallback when TMDB is unreachable.
use crate::{
    error::AppResult,
    models::{
        CastMember, Credits, MovieDetails, MovieId, TimeWindow, TrendingEntry, TrendingFeed,
        Video, Videos,
    },
    services::providers::MetadataProvider,
};

const DEMO_POSTER: &str = "/movie-poster.jpg";
const DEMO_BACKDROP: &str = "/movie-backdrop.jpg";

#[derive(Clone)]
pub struct DemoProvider {
    movies: Vec<TrendingEntry>,
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoProvider {
    pub fn new() -> Self {
        Self {
            movies: vec![
                demo_movie(
                    550,
                    "Fight Club",
                    "An insomniac office worker and a devil-may-care soap maker form an underground fight club that evolves into much more.",
                    "1999-10-15",
                    8.8,
                    26000,
                    &[18, 53],
                    75.5,
                ),
                demo_movie(
                    278,
                    "The Shawshank Redemption",
                    "Two imprisoned men bond over a number of years, finding solace and eventual redemption through acts of common decency.",
                    "1994-10-14",
                    9.3,
                    25000,
                    &[18, 80],
                    85.0,
                ),
                demo_movie(
                    238,
                    "The Godfather",
                    "The aging patriarch of an organized crime dynasty transfers control of his clandestine empire to his reluctant youngest son.",
                    "1972-03-24",
                    9.2,
                    19000,
                    &[18, 80],
                    95.2,
                ),
                demo_movie(
                    240,
                    "The Godfather Part II",
                    "The early life and career of Vito Corleone in 1920s New York is portrayed while his youngest son Michael expands and tightens his grip on the family crime syndicate.",
                    "1974-12-20",
                    9.0,
                    17000,
                    &[18, 80],
                    88.5,
                ),
                demo_movie(
                    424,
                    "Schindler's List",
                    "In German-occupied Poland during World War II, industrialist Oskar Schindler gradually becomes concerned for his Jewish workforce.",
                    "1993-12-15",
                    9.0,
                    20000,
                    &[18, 36, 10752],
                    82.3,
                ),
                demo_movie(
                    389,
                    "12 Angry Men",
                    "A jury holdout attempts to prevent a miscarriage of justice by forcing his colleagues to reconsider the evidence.",
                    "1957-04-10",
                    9.0,
                    16000,
                    &[18, 80],
                    79.1,
                ),
            ],
        }
    }

    pub fn trending_feed(&self) -> TrendingFeed {
        TrendingFeed::demo(self.movies.clone())
    }

    /// Case-insensitive substring match on title or overview
    pub fn search_feed(&self, query: &str) -> TrendingFeed {
        let needle = query.trim().to_lowercase();
        let matches = self
            .movies
            .iter()
            .filter(|movie| {
                movie.title.to_lowercase().contains(&needle)
                    || movie
                        .overview
                        .as_deref()
                        .map(|o| o.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        TrendingFeed::demo(matches)
    }

    /// Details with sample figures, cast and trailer
    pub fn movie_details(&self, id: MovieId) -> Option<MovieDetails> {
        let movie = self.movies.iter().find(|m| m.id == id)?.clone();
        Some(MovieDetails {
            movie,
            tagline: None,
            runtime: None,
            budget: Some(63_000_000),
            revenue: Some(100_853_753),
            genres: Vec::new(),
            credits: Credits {
                cast: vec![
                    CastMember {
                        id: 1,
                        name: "Brad Pitt".to_string(),
                        character: Some("Tyler Durden".to_string()),
                        profile_path: None,
                    },
                    CastMember {
                        id: 2,
                        name: "Edward Norton".to_string(),
                        character: Some("The Narrator".to_string()),
                        profile_path: None,
                    },
                ],
            },
            videos: Videos {
                results: vec![Video {
                    id: "123".to_string(),
                    key: "BHE0Z7G5_54".to_string(),
                    video_type: "Trailer".to_string(),
                    site: "YouTube".to_string(),
                }],
            },
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn demo_movie(
    id: MovieId,
    title: &str,
    overview: &str,
    release_date: &str,
    vote_average: f64,
    vote_count: u64,
    genre_ids: &[u32],
    popularity: f64,
) -> TrendingEntry {
    TrendingEntry {
        id,
        title: title.to_string(),
        overview: Some(overview.to_string()),
        poster_path: Some(DEMO_POSTER.to_string()),
        backdrop_path: Some(DEMO_BACKDROP.to_string()),
        release_date: Some(release_date.to_string()),
        vote_average: Some(vote_average),
        vote_count: Some(vote_count),
        popularity: Some(popularity),
        genre_ids: genre_ids.to_vec(),
    }
}

#[async_trait::async_trait]
impl MetadataProvider for DemoProvider {
    async fn trending(&self, _window: TimeWindow) -> AppResult<TrendingFeed> {
        Ok(self.trending_feed())
    }

    async fn search(&self, query: &str) -> AppResult<TrendingFeed> {
        Ok(self.search_feed(query))
    }

    async fn details(&self, id: MovieId) -> AppResult<Option<MovieDetails>> {
        Ok(self.movie_details(id))
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}
