use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use super::Endpoint;

/// User-facing vibe labels
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "kebab-case")]
pub enum Mood {
    Chilled,
    Adrenaline,
    MindBending,
    Romantic,
    Cheerful,
    Dark,
    Inspiring,
    Intense,
    /// Explicit content. Switches discovery to a forced adult text search.
    Mature,
    /// Travel, road trips, getting away
    Wanderlust,
}

/// Genre and keyword contributions of a single mood
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodRule {
    pub film_genres: &'static [u32],
    pub series_genres: &'static [u32],
    pub keywords: &'static [u64],
    /// Forces adult content and the text-search variant
    pub mature: bool,
}

impl MoodRule {
    pub fn genres_for(&self, endpoint: Endpoint) -> &'static [u32] {
        match endpoint {
            Endpoint::Movie => self.film_genres,
            Endpoint::Tv => self.series_genres,
        }
    }
}

// Series genre ids differ from film ones: 10759 Action & Adventure,
// 10765 Sci-Fi & Fantasy, 10768 War & Politics, 10762 Kids.
impl Mood {
    pub const ALL: [Mood; 10] = [
        Mood::Chilled,
        Mood::Adrenaline,
        Mood::MindBending,
        Mood::Romantic,
        Mood::Cheerful,
        Mood::Dark,
        Mood::Inspiring,
        Mood::Intense,
        Mood::Mature,
        Mood::Wanderlust,
    ];

    pub fn rule(&self) -> MoodRule {
        match self {
            Mood::Chilled => MoodRule {
                film_genres: &[35, 10751],
                series_genres: &[35, 10751, 10762],
                keywords: &[209379, 161184],
                mature: false,
            },
            Mood::Adrenaline => MoodRule {
                film_genres: &[28, 12],
                series_genres: &[10759, 10768],
                keywords: &[9748, 3096, 220792],
                mature: false,
            },
            Mood::MindBending => MoodRule {
                film_genres: &[878, 9648],
                series_genres: &[10765, 9648],
                keywords: &[14667, 236729, 170966],
                mature: false,
            },
            Mood::Romantic => MoodRule {
                film_genres: &[10749],
                series_genres: &[18, 10766],
                keywords: &[9840, 9963, 160472],
                mature: false,
            },
            Mood::Cheerful => MoodRule {
                film_genres: &[35, 10402],
                series_genres: &[35, 10764],
                keywords: &[9714, 166304],
                mature: false,
            },
            Mood::Dark => MoodRule {
                film_genres: &[27, 80],
                series_genres: &[80, 9648],
                keywords: &[12339, 9718, 17822],
                mature: false,
            },
            Mood::Inspiring => MoodRule {
                film_genres: &[18, 99],
                series_genres: &[18, 99],
                keywords: &[209379, 1586, 15555],
                mature: false,
            },
            Mood::Intense => MoodRule {
                film_genres: &[53, 10752],
                series_genres: &[10768, 10759],
                keywords: &[156096, 9677, 9663],
                mature: false,
            },
            Mood::Mature => MoodRule {
                film_genres: &[],
                series_genres: &[],
                keywords: &[155453, 207317],
                mature: true,
            },
            Mood::Wanderlust => MoodRule {
                film_genres: &[12, 14, 10751],
                series_genres: &[10759, 10765],
                keywords: &[4344, 9921, 173255],
                mature: false,
            },
        }
    }

    /// Slug used in URLs and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Chilled => "chilled",
            Mood::Adrenaline => "adrenaline",
            Mood::MindBending => "mind-bending",
            Mood::Romantic => "romantic",
            Mood::Cheerful => "cheerful",
            Mood::Dark => "dark",
            Mood::Inspiring => "inspiring",
            Mood::Intense => "intense",
            Mood::Mature => "mature",
            Mood::Wanderlust => "wanderlust",
        }
    }
}

impl Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .iter()
            .copied()
            .find(|mood| mood.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown mood: {}", s))
    }
}

/// Union of everything a set of moods contributes to one endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoodUnion {
    pub genres: BTreeSet<u32>,
    pub keywords: BTreeSet<u64>,
    pub mature: bool,
}

/// Combines mood rules with union semantics
///
/// Broader recall wins over precision: every genre and keyword of every
/// selected mood is kept.
pub fn union_rules<'a, I>(moods: I, endpoint: Endpoint) -> MoodUnion
where
    I: IntoIterator<Item = &'a Mood>,
{
    moods.into_iter().fold(MoodUnion::default(), |mut acc, mood| {
        let rule = mood.rule();
        acc.genres.extend(rule.genres_for(endpoint).iter().copied());
        acc.keywords.extend(rule.keywords.iter().copied());
        acc.mature |= rule.mature;
        acc
    })
}
