//! Classifies free-text search input.
//!
//! The parser never performs lookups; resolving a similar-intent's target
//! name to a catalog id happens in [`crate::services::search`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{FilterPatch, MediaKind, YearFilter};

pub const SIMILAR_CONFIDENCE: f32 = 0.9;
pub const FILTER_CONFIDENCE: f32 = 0.8;
pub const TEXT_CONFIDENCE: f32 = 0.1;

/// Prefixes meaning "find things like X", with the media kind they imply
const SIMILAR_PREFIXES: &[(&str, Option<MediaKind>)] = &[
    ("movies like ", Some(MediaKind::Film)),
    ("films like ", Some(MediaKind::Film)),
    ("shows like ", Some(MediaKind::Series)),
    ("series like ", Some(MediaKind::Series)),
    ("similar to ", None),
];

/// Genre words, plurals and a few colloquial synonyms
const GENRE_WORDS: &[(&str, u32)] = &[
    ("action", 28),
    ("adventure", 12),
    ("animation", 16),
    ("animated", 16),
    ("comedy", 35),
    ("comedies", 35),
    ("funny", 35),
    ("crime", 80),
    ("documentary", 99),
    ("documentaries", 99),
    ("drama", 18),
    ("family", 10751),
    ("kids", 10751),
    ("fantasy", 14),
    ("history", 36),
    ("historical", 36),
    ("horror", 27),
    ("scary", 27),
    ("music", 10402),
    ("musical", 10402),
    ("mystery", 9648),
    ("mysteries", 9648),
    ("romance", 10749),
    ("romantic", 10749),
    ("love", 10749),
    ("scifi", 878),
    ("sci-fi", 878),
    ("alien", 878),
    ("robot", 878),
    ("thriller", 53),
    ("war", 10752),
    ("western", 37),
];

const GENRE_PHRASES: &[(&str, u32)] = &[("science fiction", 878), ("sci fi", 878)];

static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})(s?)\b").expect("valid year pattern"));

static SHORT_DECADE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d)0s\b").expect("valid decade pattern"));

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    /// Plain text search
    Text,
    /// "Movies like X"
    Similar,
    /// Year plus genre, applied as filters
    Filter,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchIntent {
    #[serde(rename = "type")]
    pub kind: IntentKind,
    /// Lowercased, trimmed text; for similar intents only the target name
    pub query: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<FilterPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_kind: Option<MediaKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_id: Option<u32>,
    /// The year came from a decade token; it is still applied as the single
    /// starting year, not a range
    pub decade: bool,
}

impl SearchIntent {
    fn text(query: String) -> Self {
        Self {
            kind: IntentKind::Text,
            query,
            confidence: TEXT_CONFIDENCE,
            patch: None,
            media_kind: None,
            year: None,
            genre_id: None,
            decade: false,
        }
    }
}

struct YearToken {
    year: i32,
    decade: bool,
    start: usize,
    end: usize,
}

fn find_year(text: &str) -> Option<YearToken> {
    if let Some(caps) = YEAR_PATTERN.captures(text) {
        let whole = caps.get(0)?;
        let year = caps.get(1)?.as_str().parse().ok()?;
        let decade = caps.get(2).is_some_and(|s| !s.as_str().is_empty());
        return Some(YearToken {
            year,
            decade,
            start: whole.start(),
            end: whole.end(),
        });
    }

    let caps = SHORT_DECADE_PATTERN.captures(text)?;
    let whole = caps.get(0)?;
    let digit: i32 = caps.get(1)?.as_str().parse().ok()?;
    // 00s through 20s are this century
    let century = if digit <= 2 { 2000 } else { 1900 };
    Some(YearToken {
        year: century + digit * 10,
        decade: true,
        start: whole.start(),
        end: whole.end(),
    })
}

fn lookup_word(word: &str) -> Option<u32> {
    let find = |w: &str| GENRE_WORDS.iter().find(|(name, _)| *name == w).map(|(_, id)| *id);
    find(word)
        .or_else(|| word.strip_suffix('s').and_then(find))
        .or_else(|| find(format!("{}s", word).as_str()))
}

fn find_genre(text: &str) -> Option<u32> {
    if let Some((_, id)) = GENRE_PHRASES.iter().find(|(phrase, _)| text.contains(*phrase)) {
        return Some(*id);
    }
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .find_map(lookup_word)
}

/// Classifies `input` into a text, similar or filter intent
pub fn parse_intent(input: &str) -> SearchIntent {
    let lower = input.trim().to_lowercase();

    for (prefix, media_kind) in SIMILAR_PREFIXES {
        if let Some(target) = lower.strip_prefix(*prefix) {
            let target = target.trim();
            if !target.is_empty() {
                return SearchIntent {
                    kind: IntentKind::Similar,
                    query: target.to_string(),
                    confidence: SIMILAR_CONFIDENCE,
                    media_kind: *media_kind,
                    ..SearchIntent::text(String::new())
                };
            }
        }
    }

    if let Some(token) = find_year(&lower) {
        let remainder = format!("{} {}", &lower[..token.start], &lower[token.end..]);
        if let Some(genre_id) = find_genre(&remainder) {
            let patch = FilterPatch {
                moods: Some(BTreeSet::new()),
                genres: Some(BTreeSet::from([genre_id])),
                year: Some(YearFilter::Year(token.year)),
                ..FilterPatch::default()
            };
            return SearchIntent {
                kind: IntentKind::Filter,
                query: lower,
                confidence: FILTER_CONFIDENCE,
                patch: Some(patch),
                media_kind: None,
                year: Some(token.year),
                genre_id: Some(genre_id),
                decade: token.decade,
            };
        }
    }

    SearchIntent::text(lower)
}
