//! Query-string form of [`FilterParams`].
//!
//! Every field maps to one parameter and default values are omitted, so the
//! default filters encode to the empty string. Decoding starts from the
//! defaults and overlays what it can parse; anything malformed is ignored
//! field by field.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use crate::models::{
    filters::MAX_MIN_RATING, FilterParams, FilterPatch, MediaKind, Mood, RuntimeBucket,
    SortOrder, UserKeyword, YearFilter,
};

pub const MOODS: &str = "moods";
pub const LANGUAGES: &str = "languages";
pub const KEYWORDS: &str = "keywords";
pub const GENRES: &str = "genres";
pub const PROVIDERS: &str = "providers";
pub const INCLUDE_ADULT: &str = "include_adult";
pub const YEAR: &str = "year";
pub const MIN_RATING: &str = "min_rating";
pub const RUNTIME: &str = "runtime";
pub const SORT_BY: &str = "sort_by";
pub const MEDIA: &str = "media";
pub const QUERY: &str = "q";
pub const PAGE: &str = "page";

fn join_list<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn year_token(year: YearFilter) -> Option<String> {
    match year {
        YearFilter::All => None,
        YearFilter::Upcoming => Some("upcoming".to_string()),
        YearFilter::Year(y) => Some(y.to_string()),
    }
}

fn media_token(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Film => "movie",
        MediaKind::Series => "tv",
        MediaKind::Anime => "anime",
    }
}

fn parse_media(value: &str) -> Option<MediaKind> {
    match value {
        "movie" | "film" => Some(MediaKind::Film),
        "tv" | "series" => Some(MediaKind::Series),
        "anime" => Some(MediaKind::Anime),
        _ => None,
    }
}

fn to_query_string(pairs: Vec<(&'static str, String)>) -> String {
    serde_urlencoded::to_string(pairs).unwrap_or_default()
}

/// Encodes filters into a canonical query string (without the leading `?`)
pub fn encode(filters: &FilterParams) -> String {
    let defaults = FilterParams::default();
    let mut pairs: Vec<(&'static str, String)> = Vec::new();

    if !filters.moods.is_empty() {
        pairs.push((MOODS, join_list(filters.moods.iter().map(Mood::as_str))));
    }
    if !filters.languages.is_empty() {
        pairs.push((LANGUAGES, join_list(&filters.languages)));
    }
    if !filters.user_keywords.is_empty() {
        pairs.push((KEYWORDS, join_list(filters.user_keywords.iter().map(|k| k.id))));
    }
    if !filters.genres.is_empty() {
        pairs.push((GENRES, join_list(&filters.genres)));
    }
    if !filters.watch_providers.is_empty() {
        pairs.push((PROVIDERS, join_list(&filters.watch_providers)));
    }
    if filters.include_adult {
        pairs.push((INCLUDE_ADULT, "true".to_string()));
    }
    if let Some(year) = year_token(filters.year) {
        pairs.push((YEAR, year));
    }
    if filters.min_rating > 0.0 {
        pairs.push((MIN_RATING, filters.min_rating.to_string()));
    }
    if filters.runtime != defaults.runtime {
        pairs.push((RUNTIME, filters.runtime.as_str().to_string()));
    }
    if filters.sort_by != defaults.sort_by {
        pairs.push((SORT_BY, filters.sort_by.as_token()));
    }
    if filters.media_kind != defaults.media_kind {
        pairs.push((MEDIA, media_token(filters.media_kind).to_string()));
    }
    if !filters.query.is_empty() {
        pairs.push((QUERY, filters.query.clone()));
    }
    if filters.page > 1 {
        pairs.push((PAGE, filters.page.to_string()));
    }

    to_query_string(pairs)
}

/// Encodes only the fields a patch sets
pub fn encode_patch(patch: &FilterPatch) -> String {
    let mut pairs: Vec<(&'static str, String)> = Vec::new();

    if let Some(moods) = patch.moods.as_ref().filter(|m| !m.is_empty()) {
        pairs.push((MOODS, join_list(moods.iter().map(Mood::as_str))));
    }
    if let Some(genres) = patch.genres.as_ref().filter(|g| !g.is_empty()) {
        pairs.push((GENRES, join_list(genres)));
    }
    if let Some(year) = patch.year.and_then(year_token) {
        pairs.push((YEAR, year));
    }
    if let Some(kind) = patch.media_kind {
        pairs.push((MEDIA, media_token(kind).to_string()));
    }
    if let Some(query) = patch.query.as_ref().filter(|q| !q.is_empty()) {
        pairs.push((QUERY, query.clone()));
    }

    to_query_string(pairs)
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_set<T: FromStr + Ord>(value: &str) -> BTreeSet<T> {
    split_list(value).filter_map(|s| s.parse().ok()).collect()
}

/// Decodes a parameter bag into a full filter model
pub fn decode(params: &HashMap<String, String>) -> FilterParams {
    let mut filters = FilterParams::default();
    let get = |key: &str| params.get(key).map(String::as_str);

    if let Some(value) = get(MOODS) {
        filters.moods = parse_set::<Mood>(value);
    }
    if let Some(value) = get(LANGUAGES) {
        filters.languages = split_list(value).map(str::to_string).collect();
    }
    if let Some(value) = get(KEYWORDS) {
        let mut keywords: Vec<UserKeyword> = Vec::new();
        for id in split_list(value).filter_map(|s| s.parse::<u64>().ok()) {
            if !keywords.iter().any(|k| k.id == id) {
                keywords.push(UserKeyword::placeholder(id));
            }
        }
        filters.user_keywords = keywords;
    }
    if let Some(value) = get(GENRES) {
        filters.genres = parse_set::<u32>(value);
    }
    if let Some(value) = get(PROVIDERS) {
        filters.watch_providers = split_list(value).map(str::to_string).collect();
    }
    match get(INCLUDE_ADULT) {
        Some("true") => filters.include_adult = true,
        Some("false") => filters.include_adult = false,
        _ => {}
    }
    if let Some(year) = get(YEAR).and_then(|v| v.parse::<YearFilter>().ok()) {
        filters.year = year;
    }
    if let Some(rating) = get(MIN_RATING)
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|r| r.is_finite() && (0.0..=MAX_MIN_RATING).contains(r))
    {
        filters.min_rating = rating;
    }
    if let Some(runtime) = get(RUNTIME).and_then(|v| v.parse::<RuntimeBucket>().ok()) {
        filters.runtime = runtime;
    }
    if let Some(sort_by) = get(SORT_BY).and_then(|v| v.parse::<SortOrder>().ok()) {
        filters.sort_by = sort_by;
    }
    if let Some(kind) = get(MEDIA).and_then(parse_media) {
        filters.media_kind = kind;
    }
    if let Some(query) = get(QUERY) {
        filters.query = query.to_string();
    }
    if let Some(page) = get(PAGE)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|p| *p >= 1)
    {
        filters.page = page;
    }

    filters
}

/// Decodes a raw query string; the first occurrence of a key wins
pub fn decode_query(query: &str) -> FilterParams {
    let query = query.strip_prefix('?').unwrap_or(query);
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();

    let mut params = HashMap::new();
    for (key, value) in pairs {
        params.entry(key).or_insert(value);
    }
    decode(&params)
}
