use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod filters;
pub mod library;
pub mod mood;

pub use filters::{
    FilterParams, FilterPatch, RuntimeBucket, SortOrder, UserKeyword, YearFilter,
};
pub use library::{LibraryList, Preferences, UserLibrary};
pub use mood::{Mood, MoodRule};

/// What the user is browsing
///
/// Anime is not a catalog endpoint of its own: it fans out to both the
/// movie and tv endpoints, constrained to animation from Japan.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Film,
    Series,
    Anime,
}

impl MediaKind {
    /// Catalog endpoints backing this kind, film results first
    pub fn endpoints(&self) -> &'static [Endpoint] {
        match self {
            MediaKind::Film => &[Endpoint::Movie],
            MediaKind::Series => &[Endpoint::Tv],
            MediaKind::Anime => &[Endpoint::Movie, Endpoint::Tv],
        }
    }
}

/// A concrete catalog endpoint family
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Movie,
    Tv,
}

impl Endpoint {
    /// Path segment used by the catalog API
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Movie => "movie",
            Endpoint::Tv => "tv",
        }
    }

    /// Name of the release date field for sorting and date ranges
    pub fn date_field(&self) -> &'static str {
        match self {
            Endpoint::Movie => "primary_release_date",
            Endpoint::Tv => "first_air_date",
        }
    }

    /// Name of the single-year filter parameter
    pub fn year_param(&self) -> &'static str {
        match self {
            Endpoint::Movie => "primary_release_year",
            Endpoint::Tv => "first_air_date_year",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A movie or TV show as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: u64,
    pub title: String,
    pub media_type: Endpoint,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    /// Release date for movies, first air date for shows
    pub release_date: Option<String>,
    pub vote_average: f32,
    pub genre_ids: Vec<u32>,
    pub adult: bool,
    pub original_language: String,
}

/// One page of catalog results
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogPage {
    pub items: Vec<MediaItem>,
    pub total_results: u64,
}

impl CatalogPage {
    /// The degraded result used whenever a catalog call fails
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends another page, summing the totals
    pub fn merge(&mut self, other: CatalogPage) {
        self.items.extend(other.items);
        self.total_results += other.total_results;
    }

    /// Removes every item whose id is in `ids`
    pub fn exclude(&mut self, ids: &[u64]) {
        self.items.retain(|item| !ids.contains(&item.id));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// The slice of a title's details used for interest scoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaDetails {
    pub id: u64,
    pub title: String,
    pub media_type: Endpoint,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub runtime: Option<u32>,
}

/// A catalog keyword
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Keyword {
    pub id: u64,
    pub name: String,
}

/// Result of a multi-type search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiSearchResult {
    pub id: u64,
    pub media_type: MultiMediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MultiMediaType {
    Movie,
    Tv,
    Person,
}

impl MultiMediaType {
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            MultiMediaType::Movie => Some(Endpoint::Movie),
            MultiMediaType::Tv => Some(Endpoint::Tv),
            MultiMediaType::Person => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrendingWindow {
    Day,
    #[default]
    Week,
}

impl TrendingWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
        }
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Paged list envelope shared by discover, search, trending and recommendations
///
/// Results are kept as raw JSON so one malformed entry can be skipped
/// without losing the page.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPagedResponse {
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_results: u64,
}

/// Raw movie or tv list entry
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMediaResult {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
}

impl TmdbMediaResult {
    /// Normalizes movie and tv shapes into a [`MediaItem`]
    ///
    /// Entries without any title are treated as malformed.
    pub fn into_item(self, endpoint: Endpoint) -> Option<MediaItem> {
        let title = self.title.or(self.name).filter(|t| !t.is_empty())?;
        Some(MediaItem {
            id: self.id,
            title,
            media_type: endpoint,
            overview: self.overview.unwrap_or_default(),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            release_date: self
                .release_date
                .or(self.first_air_date)
                .filter(|d| !d.is_empty()),
            vote_average: self.vote_average.unwrap_or_default(),
            genre_ids: self.genre_ids,
            adult: self.adult,
            original_language: self.original_language.unwrap_or_default(),
        })
    }

    /// Endpoint named by the entry itself (trending and multi search)
    pub fn declared_endpoint(&self) -> Option<Endpoint> {
        match self.media_type.as_deref() {
            Some("movie") => Some(Endpoint::Movie),
            Some("tv") => Some(Endpoint::Tv),
            _ => None,
        }
    }
}

/// Parses raw list entries, skipping the ones that do not fit
///
/// `fallback` is used when an entry does not declare its own media type.
/// Entries declaring a non-title type (people) are dropped.
pub fn parse_media_results(values: Vec<serde_json::Value>, fallback: Endpoint) -> Vec<MediaItem> {
    let mut items = Vec::with_capacity(values.len());
    for value in values {
        let raw: TmdbMediaResult = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed catalog entry");
                continue;
            }
        };
        let endpoint = match raw.media_type.as_deref() {
            None => fallback,
            Some(_) => match raw.declared_endpoint() {
                Some(endpoint) => endpoint,
                None => continue,
            },
        };
        match raw.into_item(endpoint) {
            Some(item) => items.push(item),
            None => tracing::warn!("Skipping catalog entry without a title"),
        }
    }
    items
}

/// Raw details response for movie or tv
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbDetails {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
}

impl TmdbDetails {
    pub fn into_details(self, endpoint: Endpoint) -> MediaDetails {
        MediaDetails {
            id: self.id,
            title: self.title.or(self.name).unwrap_or_default(),
            media_type: endpoint,
            genres: self.genres,
            original_language: self.original_language.unwrap_or_default(),
            overview: self.overview.unwrap_or_default(),
            runtime: self.runtime.or_else(|| self.episode_run_time.first().copied()),
        }
    }
}

/// Keyword search envelope
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbKeywordResponse {
    #[serde(default)]
    pub results: Vec<Keyword>,
}

/// Raw multi-search entry
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMultiResult {
    pub id: u64,
    pub media_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl TmdbMultiResult {
    /// Keeps movies, shows and people; anything else is dropped
    pub fn into_result(self) -> Option<MultiSearchResult> {
        let media_type = match self.media_type.as_str() {
            "movie" => MultiMediaType::Movie,
            "tv" => MultiMediaType::Tv,
            "person" => MultiMediaType::Person,
            _ => return None,
        };
        Some(MultiSearchResult {
            id: self.id,
            media_type,
            title: self.title.or(self.name).unwrap_or_default(),
            poster_path: self.poster_path.or(self.profile_path),
            release_date: self.release_date.or(self.first_air_date),
            vote_average: self.vote_average,
            genre_ids: self.genre_ids,
        })
    }
}
