use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{MediaKind, SortOrder};

/// The four personal lists a user maintains
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LibraryList {
    Liked,
    Disliked,
    Watched,
    Watchlist,
}

impl FromStr for LibraryList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "liked" => Ok(LibraryList::Liked),
            "disliked" => Ok(LibraryList::Disliked),
            "watched" => Ok(LibraryList::Watched),
            "watchlist" => Ok(LibraryList::Watchlist),
            other => Err(format!("unknown library list: {}", other)),
        }
    }
}

/// Scalar preferences stored next to the lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub include_adult: bool,
    /// Drop watched titles from discovery results
    pub hide_watched: bool,
    pub default_media_kind: MediaKind,
    pub default_sort: SortOrder,
    pub default_languages: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            include_adult: false,
            hide_watched: false,
            default_media_kind: MediaKind::Film,
            default_sort: SortOrder::Newest,
            default_languages: vec!["en".to_string(), "bn".to_string(), "hi".to_string()],
        }
    }
}

/// A user's library document
///
/// Lists are append-ordered, most recent last. Liked and disliked exclude
/// each other; watched and watchlist are independent of both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserLibrary {
    pub liked: Vec<u64>,
    pub disliked: Vec<u64>,
    pub watched: Vec<u64>,
    pub watchlist: Vec<u64>,
    pub preferences: Preferences,
}

fn toggle_id(list: &mut Vec<u64>, id: u64) -> bool {
    if let Some(pos) = list.iter().position(|x| *x == id) {
        list.remove(pos);
        false
    } else {
        list.push(id);
        true
    }
}

impl UserLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, list: LibraryList) -> &[u64] {
        match list {
            LibraryList::Liked => &self.liked,
            LibraryList::Disliked => &self.disliked,
            LibraryList::Watched => &self.watched,
            LibraryList::Watchlist => &self.watchlist,
        }
    }

    pub fn contains(&self, list: LibraryList, id: u64) -> bool {
        self.list(list).contains(&id)
    }

    /// Toggles `id` in `list`, returning whether it is now present
    pub fn toggle(&mut self, list: LibraryList, id: u64) -> bool {
        match list {
            LibraryList::Liked => {
                let added = toggle_id(&mut self.liked, id);
                if added {
                    self.disliked.retain(|x| *x != id);
                }
                added
            }
            LibraryList::Disliked => {
                let added = toggle_id(&mut self.disliked, id);
                if added {
                    self.liked.retain(|x| *x != id);
                }
                added
            }
            LibraryList::Watched => toggle_id(&mut self.watched, id),
            LibraryList::Watchlist => toggle_id(&mut self.watchlist, id),
        }
    }

    /// Ids that must never be recommended back
    pub fn excluded_ids(&self) -> Vec<u64> {
        self.watched
            .iter()
            .chain(self.disliked.iter())
            .copied()
            .collect()
    }
}
