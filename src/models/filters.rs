use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use super::{Endpoint, MediaKind, Mood, Preferences};

/// Highest accepted rating floor
pub const MAX_MIN_RATING: f32 = 9.0;

/// Release window filter
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum YearFilter {
    /// Everything released up to today
    #[default]
    All,
    /// Only titles releasing after today
    Upcoming,
    /// Titles from one calendar year, released or not
    Year(i32),
}

impl FromStr for YearFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("upcoming") {
            return Ok(YearFilter::Upcoming);
        }
        s.parse::<i32>()
            .ok()
            .filter(|y| *y > 0)
            .map(YearFilter::Year)
            .ok_or_else(|| format!("invalid year: {}", s))
    }
}

/// Runtime ranges in minutes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeBucket {
    #[default]
    Any,
    /// Under 90 minutes
    Short,
    /// 90 to 120 minutes
    Medium,
    /// Over 120 minutes
    Long,
}

impl RuntimeBucket {
    /// Inclusive (min, max) bounds in minutes
    pub fn bounds(&self) -> (Option<u32>, Option<u32>) {
        match self {
            RuntimeBucket::Any => (None, None),
            RuntimeBucket::Short => (None, Some(90)),
            RuntimeBucket::Medium => (Some(90), Some(120)),
            RuntimeBucket::Long => (Some(120), None),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeBucket::Any => "all",
            RuntimeBucket::Short => "short",
            RuntimeBucket::Medium => "medium",
            RuntimeBucket::Long => "long",
        }
    }
}

impl FromStr for RuntimeBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" | "any" => Ok(RuntimeBucket::Any),
            "short" => Ok(RuntimeBucket::Short),
            "medium" => Ok(RuntimeBucket::Medium),
            "long" => Ok(RuntimeBucket::Long),
            other => Err(format!("unknown runtime bucket: {}", other)),
        }
    }
}

/// Sort expressions, independent of the endpoint's date field
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Popularity,
    Rating,
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    /// The `sort_by` value for a concrete endpoint
    pub fn to_param(&self, endpoint: Endpoint) -> String {
        match self {
            SortOrder::Popularity => "popularity.desc".to_string(),
            SortOrder::Rating => "vote_average.desc".to_string(),
            SortOrder::Newest => format!("{}.desc", endpoint.date_field()),
            SortOrder::Oldest => format!("{}.asc", endpoint.date_field()),
        }
    }

    /// Canonical token, spelled with the movie date field
    pub fn as_token(&self) -> String {
        self.to_param(Endpoint::Movie)
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popularity.desc" => Ok(SortOrder::Popularity),
            "vote_average.desc" => Ok(SortOrder::Rating),
            "primary_release_date.desc" | "first_air_date.desc" => Ok(SortOrder::Newest),
            "primary_release_date.asc" | "first_air_date.asc" => Ok(SortOrder::Oldest),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// A keyword the user picked
///
/// Identity is the id; the name is display-only and may still be the
/// placeholder `id.to_string()` while its lookup is pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserKeyword {
    pub id: u64,
    pub name: String,
}

impl UserKeyword {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn placeholder(id: u64) -> Self {
        Self {
            id,
            name: id.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == self.id.to_string()
    }
}

impl PartialEq for UserKeyword {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UserKeyword {}

/// What the user wants to see
///
/// Every mutator except [`FilterParams::set_page`] sends the cursor back to
/// the first page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterParams {
    pub moods: BTreeSet<Mood>,
    pub languages: BTreeSet<String>,
    pub user_keywords: Vec<UserKeyword>,
    /// Explicit genre ids, unioned with mood genres
    pub genres: BTreeSet<u32>,
    pub year: YearFilter,
    pub query: String,
    pub include_adult: bool,
    pub runtime: RuntimeBucket,
    pub min_rating: f32,
    pub watch_providers: BTreeSet<String>,
    pub sort_by: SortOrder,
    pub media_kind: MediaKind,
    pub page: u32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            moods: BTreeSet::new(),
            languages: BTreeSet::new(),
            user_keywords: Vec::new(),
            genres: BTreeSet::new(),
            year: YearFilter::All,
            query: String::new(),
            include_adult: false,
            runtime: RuntimeBucket::Any,
            min_rating: 0.0,
            watch_providers: BTreeSet::new(),
            sort_by: SortOrder::Newest,
            media_kind: MediaKind::Film,
            page: 1,
        }
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if set.contains(&value) {
        set.remove(&value);
    } else {
        set.insert(value);
    }
}

/// Normalizes a language or provider code the way the URL codec reads it back
///
/// Codes are trimmed; blank codes and codes containing the list separator
/// are rejected.
fn list_token(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains(',') {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    fn touched(&mut self) {
        self.page = 1;
    }

    pub fn toggle_mood(&mut self, mood: Mood) {
        toggle(&mut self.moods, mood);
        self.touched();
    }

    pub fn toggle_language(&mut self, language: impl Into<String>) {
        if let Some(language) = list_token(language) {
            toggle(&mut self.languages, language);
        }
        self.touched();
    }

    pub fn set_languages<I, S>(&mut self, languages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().filter_map(list_token).collect();
        self.touched();
    }

    /// Adds a keyword, replacing any entry with the same id
    pub fn add_keyword(&mut self, keyword: UserKeyword) {
        self.user_keywords.retain(|k| k.id != keyword.id);
        self.user_keywords.push(keyword);
        self.touched();
    }

    pub fn remove_keyword(&mut self, id: u64) {
        self.user_keywords.retain(|k| k.id != id);
        self.touched();
    }

    pub fn toggle_genre(&mut self, genre_id: u32) {
        toggle(&mut self.genres, genre_id);
        self.touched();
    }

    pub fn set_year(&mut self, year: YearFilter) {
        self.year = year;
        self.touched();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.touched();
    }

    pub fn set_include_adult(&mut self, include_adult: bool) {
        self.include_adult = include_adult;
        self.touched();
    }

    pub fn set_runtime(&mut self, runtime: RuntimeBucket) {
        self.runtime = runtime;
        self.touched();
    }

    /// Sets the rating floor, clamped to `0..=9`
    pub fn set_min_rating(&mut self, rating: f32) {
        self.min_rating = if rating.is_finite() {
            rating.clamp(0.0, MAX_MIN_RATING)
        } else {
            0.0
        };
        self.touched();
    }

    pub fn toggle_watch_provider(&mut self, provider_id: impl Into<String>) {
        if let Some(provider_id) = list_token(provider_id) {
            toggle(&mut self.watch_providers, provider_id);
        }
        self.touched();
    }

    pub fn set_sort_by(&mut self, sort_by: SortOrder) {
        self.sort_by = sort_by;
        self.touched();
    }

    pub fn set_media_kind(&mut self, media_kind: MediaKind) {
        self.media_kind = media_kind;
        self.touched();
    }

    /// Moves the pagination cursor; the only mutator that keeps other state
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn apply_patch(&mut self, patch: &FilterPatch) {
        if let Some(moods) = &patch.moods {
            self.moods = moods.clone();
        }
        if let Some(genres) = &patch.genres {
            self.genres = genres.clone();
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(query) = &patch.query {
            self.query = query.clone();
        }
        if let Some(media_kind) = patch.media_kind {
            self.media_kind = media_kind;
        }
        self.touched();
    }

    /// Clears every filter back to the user's defaults
    ///
    /// The media kind is kept. Anime never carries languages since its
    /// origin language is fixed.
    pub fn reset(&mut self, preferences: &Preferences) {
        let media_kind = self.media_kind;
        *self = Self {
            sort_by: preferences.default_sort,
            media_kind,
            ..Self::default()
        };
        if media_kind != MediaKind::Anime {
            self.languages = preferences
                .default_languages
                .iter()
                .filter_map(|l| list_token(l.as_str()))
                .collect();
        }
    }

    /// True when the mature mood forces adult content for this query
    pub fn forces_adult(&self) -> bool {
        self.moods.iter().any(|m| m.rule().mature)
    }

    /// Adult gate as sent to the catalog; the stored preference is untouched
    pub fn effective_include_adult(&self) -> bool {
        self.include_adult || self.forces_adult()
    }

    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

/// Partial update produced by search intents
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moods: Option<BTreeSet<Mood>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<BTreeSet<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<YearFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_kind: Option<MediaKind>,
}

impl FilterPatch {
    pub fn is_empty(&self) -> bool {
        self.moods.is_none()
            && self.genres.is_none()
            && self.year.is_none()
            && self.query.is_none()
            && self.media_kind.is_none()
    }
}
