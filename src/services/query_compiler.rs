//! Translates a [`FilterParams`] snapshot into catalog request descriptors.
//!
//! Compilation is a pure function of the filters, the page and the
//! [`CompileContext`]; the current date is injected so the date policy can be
//! tested against a frozen clock.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::models::{mood::union_rules, Endpoint, FilterParams, MediaKind, SortOrder, YearFilter};

/// Companion vote floor applied with any rating floor
pub const MIN_VOTE_COUNT: u32 = 100;
pub const ANIMATION_GENRE_ID: u32 = 16;
pub const ANIME_ORIGIN_LANGUAGE: &str = "ja";
/// Seed term of the forced mature text search
pub const MATURE_SEED_TERM: &str = "hentai";

/// Ambient inputs of compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileContext {
    pub today: NaiveDate,
    pub watch_region: String,
}

impl CompileContext {
    pub fn new(today: NaiveDate, watch_region: impl Into<String>) -> Self {
        Self {
            today,
            watch_region: watch_region.into(),
        }
    }

    /// Context for the current UTC date
    pub fn now(watch_region: impl Into<String>) -> Self {
        Self::new(Utc::now().date_naive(), watch_region)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    Discover,
    Search,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Discover => "discover",
            RequestMode::Search => "search",
        }
    }
}

/// One provider call: endpoint family, mode and query parameters
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CatalogRequest {
    pub endpoint: Endpoint,
    pub mode: RequestMode,
    pub params: BTreeMap<String, String>,
}

impl CatalogRequest {
    pub fn discover(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            mode: RequestMode::Discover,
            params: BTreeMap::new(),
        }
    }

    /// Path relative to the API root, e.g. `discover/movie`
    pub fn path(&self) -> String {
        format!("{}/{}", self.mode.as_str(), self.endpoint.as_str())
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Display) {
        self.params.insert(key.to_string(), value.to_string());
    }

    pub fn remove(&mut self, key: &str) {
        self.params.remove(key);
    }

    /// Switches to the text search endpoint, which ignores sorting and
    /// genre/keyword filters
    fn into_search(&mut self, text: &str, year: YearFilter) {
        self.mode = RequestMode::Search;
        self.remove("sort_by");
        self.remove("with_genres");
        self.remove("with_keywords");
        self.set("query", text);
        if let YearFilter::Year(year) = year {
            let year_param = self.endpoint.year_param();
            self.set(year_param, year);
        }
    }

    /// Stable textual form, used for cache keys and logging
    pub fn canonical(&self) -> String {
        let pairs: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let query = serde_urlencoded::to_string(pairs).unwrap_or_default();
        format!("{}?{}", self.path(), query)
    }
}

/// The requests needed to serve one filter snapshot
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompiledQuery {
    pub media_kind: MediaKind,
    pub requests: Vec<CatalogRequest>,
}

impl CompiledQuery {
    pub fn request(&self, endpoint: Endpoint) -> Option<&CatalogRequest> {
        self.requests.iter().find(|r| r.endpoint == endpoint)
    }
}

fn join<T: Display>(values: impl IntoIterator<Item = T>, sep: &str) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Compiles filters into one request per backing endpoint
///
/// Anime fans out to movie and tv; the caller merges the pages.
pub fn compile(filters: &FilterParams, page: u32, ctx: &CompileContext) -> CompiledQuery {
    let requests = filters
        .media_kind
        .endpoints()
        .iter()
        .map(|endpoint| compile_for(filters, page, *endpoint, ctx))
        .collect();

    CompiledQuery {
        media_kind: filters.media_kind,
        requests,
    }
}

fn compile_for(
    filters: &FilterParams,
    page: u32,
    endpoint: Endpoint,
    ctx: &CompileContext,
) -> CatalogRequest {
    let mut request = CatalogRequest::discover(endpoint);
    request.set("page", page.max(1));
    request.set("sort_by", filters.sort_by.to_param(endpoint));

    if filters.min_rating > 0.0 {
        request.set("vote_average.gte", filters.min_rating);
        request.set("vote_count.gte", MIN_VOTE_COUNT);
    }

    let (min_runtime, max_runtime) = filters.runtime.bounds();
    if let Some(min) = min_runtime {
        request.set("with_runtime.gte", min);
    }
    if let Some(max) = max_runtime {
        request.set("with_runtime.lte", max);
    }

    if !filters.watch_providers.is_empty() {
        request.set("with_watch_providers", join(&filters.watch_providers, "|"));
        request.set("watch_region", &ctx.watch_region);
    }

    let moods = union_rules(&filters.moods, endpoint);
    let mut genres: BTreeSet<u32> = moods.genres;
    genres.extend(filters.genres.iter().copied());
    let mut keywords: BTreeSet<u64> = moods.keywords;
    keywords.extend(filters.user_keywords.iter().map(|k| k.id));

    if filters.media_kind == MediaKind::Anime {
        genres.insert(ANIMATION_GENRE_ID);
        request.set("with_original_language", ANIME_ORIGIN_LANGUAGE);
    } else if !filters.languages.is_empty() {
        request.set("with_original_language", join(&filters.languages, "|"));
    }

    if !genres.is_empty() {
        request.set("with_genres", join(&genres, "|"));
    }
    if !keywords.is_empty() {
        request.set("with_keywords", join(&keywords, "|"));
    }

    request.set("include_adult", filters.include_adult || moods.mature);

    if moods.mature {
        let text = if filters.has_query() {
            format!("{} {}", MATURE_SEED_TERM, filters.query.trim())
        } else {
            MATURE_SEED_TERM.to_string()
        };
        request.into_search(&text, filters.year);
    } else if filters.has_query() {
        request.into_search(filters.query.trim(), filters.year);
    } else {
        apply_date_policy(&mut request, filters, ctx.today);
    }

    request
}

fn apply_date_policy(request: &mut CatalogRequest, filters: &FilterParams, today: NaiveDate) {
    let endpoint = request.endpoint;
    let date_field = endpoint.date_field();

    match filters.year {
        YearFilter::Upcoming => {
            let tomorrow = today.succ_opt().unwrap_or(today);
            request.set(&format!("{}.gte", date_field), tomorrow);
            if endpoint == Endpoint::Movie {
                request.set("release_date.gte", tomorrow);
            }
            if filters.sort_by == SortOrder::default() {
                request.set("sort_by", SortOrder::Oldest.to_param(endpoint));
            }
        }
        YearFilter::Year(year) => {
            request.set(endpoint.year_param(), year);
        }
        YearFilter::All => {
            request.set(&format!("{}.lte", date_field), today);
            if endpoint == Endpoint::Movie {
                request.set("release_date.lte", today);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mood, RuntimeBucket, UserKeyword};

    fn ctx() -> CompileContext {
        CompileContext::new(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(), "IN")
    }

    fn single(filters: &FilterParams) -> CatalogRequest {
        let compiled = compile(filters, filters.page, &ctx());
        assert_eq!(compiled.requests.len(), 1);
        compiled.requests.into_iter().next().unwrap()
    }

    #[test]
    fn test_default_filters_compile_to_released_discovery() {
        let request = single(&FilterParams::default());
        assert_eq!(request.path(), "discover/movie");
        assert_eq!(request.param("page"), Some("1"));
        assert_eq!(request.param("include_adult"), Some("false"));
        assert_eq!(request.param("sort_by"), Some("primary_release_date.desc"));
        assert_eq!(request.param("primary_release_date.lte"), Some("2025-06-15"));
        assert_eq!(request.param("release_date.lte"), Some("2025-06-15"));
        assert_eq!(request.param("with_genres"), None);
    }

    #[test]
    fn test_upcoming_constrains_after_today_and_sorts_ascending() {
        let mut filters = FilterParams::default();
        filters.set_year(YearFilter::Upcoming);

        let request = single(&filters);
        assert_eq!(request.param("primary_release_date.gte"), Some("2025-06-16"));
        assert_eq!(request.param("primary_release_date.lte"), None);
        assert_eq!(request.param("sort_by"), Some("primary_release_date.asc"));
    }

    #[test]
    fn test_upcoming_keeps_explicit_sort() {
        let mut filters = FilterParams::default();
        filters.set_year(YearFilter::Upcoming);
        filters.set_sort_by(SortOrder::Rating);

        let request = single(&filters);
        assert_eq!(request.param("sort_by"), Some("vote_average.desc"));
    }

    #[test]
    fn test_upcoming_series_uses_first_air_date() {
        let mut filters = FilterParams::default();
        filters.set_media_kind(MediaKind::Series);
        filters.set_year(YearFilter::Upcoming);

        let request = single(&filters);
        assert_eq!(request.path(), "discover/tv");
        assert_eq!(request.param("first_air_date.gte"), Some("2025-06-16"));
        assert_eq!(request.param("release_date.gte"), None);
        assert_eq!(request.param("sort_by"), Some("first_air_date.asc"));
    }

    #[test]
    fn test_specific_year_has_no_upper_bound() {
        let mut filters = FilterParams::default();
        filters.set_year(YearFilter::Year(2025));

        let request = single(&filters);
        assert_eq!(request.param("primary_release_year"), Some("2025"));
        assert_eq!(request.param("primary_release_date.lte"), None);
        assert_eq!(request.param("primary_release_date.gte"), None);
    }

    #[test]
    fn test_series_sort_is_rewritten() {
        let mut filters = FilterParams::default();
        filters.set_media_kind(MediaKind::Series);
        filters.set_sort_by(SortOrder::Oldest);

        let request = single(&filters);
        assert_eq!(request.param("sort_by"), Some("first_air_date.asc"));
        assert_eq!(request.param("first_air_date.lte"), Some("2025-06-15"));
    }

    #[test]
    fn test_rating_floor_adds_vote_count() {
        let mut filters = FilterParams::default();
        filters.set_min_rating(7.5);

        let request = single(&filters);
        assert_eq!(request.param("vote_average.gte"), Some("7.5"));
        assert_eq!(request.param("vote_count.gte"), Some("100"));
    }

    #[test]
    fn test_runtime_buckets() {
        let mut filters = FilterParams::default();
        filters.set_runtime(RuntimeBucket::Short);
        let request = single(&filters);
        assert_eq!(request.param("with_runtime.lte"), Some("90"));
        assert_eq!(request.param("with_runtime.gte"), None);

        filters.set_runtime(RuntimeBucket::Medium);
        let request = single(&filters);
        assert_eq!(request.param("with_runtime.gte"), Some("90"));
        assert_eq!(request.param("with_runtime.lte"), Some("120"));

        filters.set_runtime(RuntimeBucket::Long);
        let request = single(&filters);
        assert_eq!(request.param("with_runtime.gte"), Some("120"));
        assert_eq!(request.param("with_runtime.lte"), None);
    }

    #[test]
    fn test_watch_providers_are_or_combined_with_region() {
        let mut filters = FilterParams::default();
        filters.toggle_watch_provider("8");
        filters.toggle_watch_provider("119");

        let request = single(&filters);
        assert_eq!(request.param("with_watch_providers"), Some("119|8"));
        assert_eq!(request.param("watch_region"), Some("IN"));
    }

    #[test]
    fn test_mood_genres_are_unioned() {
        // Chilled {35, 10751} and Cheerful {35, 10402}
        let mut filters = FilterParams::default();
        filters.toggle_mood(Mood::Chilled);
        filters.toggle_mood(Mood::Cheerful);

        let request = single(&filters);
        assert_eq!(request.param("with_genres"), Some("35|10402|10751"));
    }

    #[test]
    fn test_keywords_union_moods_and_user_keywords() {
        let mut filters = FilterParams::default();
        filters.toggle_mood(Mood::Chilled);
        filters.add_keyword(UserKeyword::new(161184, "slice of life"));
        filters.add_keyword(UserKeyword::new(818, "based on novel"));

        let request = single(&filters);
        assert_eq!(request.param("with_keywords"), Some("818|161184|209379"));
    }

    #[test]
    fn test_explicit_genres_join_mood_genres() {
        let mut filters = FilterParams::default();
        filters.toggle_mood(Mood::Romantic);
        filters.toggle_genre(27);

        let request = single(&filters);
        assert_eq!(request.param("with_genres"), Some("27|10749"));
    }

    #[test]
    fn test_languages_or_combined() {
        let mut filters = FilterParams::default();
        filters.set_languages(["hi", "en"]);

        let request = single(&filters);
        assert_eq!(request.param("with_original_language"), Some("en|hi"));
    }

    #[test]
    fn test_anime_fans_out_and_forces_animation_from_japan() {
        let mut filters = FilterParams::default();
        filters.set_media_kind(MediaKind::Anime);
        filters.set_languages(["en"]);
        filters.toggle_mood(Mood::Adrenaline);

        let compiled = compile(&filters, 1, &ctx());
        assert_eq!(compiled.requests.len(), 2);

        let movie = compiled.request(Endpoint::Movie).unwrap();
        assert_eq!(movie.path(), "discover/movie");
        assert_eq!(movie.param("with_original_language"), Some("ja"));
        assert_eq!(movie.param("with_genres"), Some("12|16|28"));

        let tv = compiled.request(Endpoint::Tv).unwrap();
        assert_eq!(tv.path(), "discover/tv");
        assert_eq!(tv.param("with_original_language"), Some("ja"));
        assert_eq!(tv.param("with_genres"), Some("16|10759|10768"));
    }

    #[test]
    fn test_mature_mood_forces_adult_search() {
        let mut filters = FilterParams::default();
        filters.toggle_mood(Mood::Mature);
        filters.set_query("school");

        let request = single(&filters);
        assert_eq!(request.path(), "search/movie");
        assert_eq!(request.param("include_adult"), Some("true"));
        assert_eq!(request.param("query"), Some("hentai school"));
        assert_eq!(request.param("sort_by"), None);
        assert_eq!(request.param("with_keywords"), None);
        assert!(!filters.include_adult);
    }

    #[test]
    fn test_mature_mood_without_query_uses_seed_only() {
        let mut filters = FilterParams::default();
        filters.toggle_mood(Mood::Mature);

        let request = single(&filters);
        assert_eq!(request.param("query"), Some("hentai"));
    }

    #[test]
    fn test_query_switches_to_text_search() {
        let mut filters = FilterParams::default();
        filters.set_media_kind(MediaKind::Series);
        filters.toggle_mood(Mood::Dark);
        filters.set_year(YearFilter::Year(2008));
        filters.set_query("  breaking bad ");

        let request = single(&filters);
        assert_eq!(request.path(), "search/tv");
        assert_eq!(request.param("query"), Some("breaking bad"));
        assert_eq!(request.param("sort_by"), None);
        assert_eq!(request.param("with_genres"), None);
        assert_eq!(request.param("first_air_date_year"), Some("2008"));
        assert_eq!(request.param("first_air_date.lte"), None);
    }

    #[test]
    fn test_blank_query_stays_in_discovery() {
        let mut filters = FilterParams::default();
        filters.set_query("   ");
        assert_eq!(single(&filters).mode, RequestMode::Discover);
    }

    #[test]
    fn test_page_is_passed_through() {
        let compiled = compile(&FilterParams::default(), 3, &ctx());
        assert_eq!(compiled.requests[0].param("page"), Some("3"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let mut filters = FilterParams::default();
        filters.toggle_mood(Mood::Intense);
        filters.toggle_mood(Mood::Wanderlust);
        filters.set_languages(["ko", "ja", "en"]);

        let a = compile(&filters, 2, &ctx());
        let b = compile(&filters.clone(), 2, &ctx());
        assert_eq!(a, b);
        assert_eq!(a.requests[0].canonical(), b.requests[0].canonical());
    }

    #[test]
    fn test_canonical_form() {
        let request = single(&FilterParams::default());
        assert_eq!(
            request.canonical(),
            "discover/movie?include_adult=false&page=1&primary_release_date.lte=2025-06-15&release_date.lte=2025-06-15&sort_by=primary_release_date.desc"
        );
    }
}
