mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{item, FakeProvider};
use mood_cinema::models::{Endpoint, LibraryList, UserLibrary};
use mood_cinema::services::interest_profile::build_profile;
use mood_cinema::services::personalized_feed::{generate_feed, FEED_DISPLAY_LIMIT};

fn library() -> UserLibrary {
    let mut library = UserLibrary::default();
    library.toggle(LibraryList::Liked, 1);
    library.toggle(LibraryList::Watchlist, 2);
    library.toggle(LibraryList::Watched, 3);
    library.toggle(LibraryList::Disliked, 4);
    library
}

fn provider_with_delays(delays: [u64; 4]) -> FakeProvider {
    FakeProvider::new()
        .with_delayed_details(1, &[28, 878], "en", Duration::from_millis(delays[0]))
        .with_delayed_details(2, &[878], "ja", Duration::from_millis(delays[1]))
        .with_delayed_details(3, &[18], "en", Duration::from_millis(delays[2]))
        .with_delayed_details(4, &[27, 28], "ko", Duration::from_millis(delays[3]))
}

#[tokio::test]
async fn test_profile_is_independent_of_completion_order() {
    let library = library();

    let forward = build_profile(Arc::new(provider_with_delays([5, 25, 45, 65])), &library).await;
    let reverse = build_profile(Arc::new(provider_with_delays([65, 45, 25, 5])), &library).await;
    let shuffled = build_profile(Arc::new(provider_with_delays([25, 65, 5, 45])), &library).await;

    assert_eq!(forward, reverse);
    assert_eq!(forward, shuffled);

    // liked +3, watchlist +2, watched +1, disliked -5
    assert_eq!(forward.genre_scores[&878], 5);
    assert_eq!(forward.genre_scores[&28], -2);
    assert_eq!(forward.genre_scores[&18], 1);
    assert_eq!(forward.genre_scores[&27], -5);
    assert_eq!(forward.language_scores["en"], 4);
    assert_eq!(forward.top_genres(3), vec![878, 18, 28]);
}

#[tokio::test]
async fn test_feed_never_contains_watched_or_disliked() {
    let provider = Arc::new(provider_with_delays([0, 0, 0, 0]));
    let mut library = library();
    // Ids the fake catalog returns for page 1
    library.toggle(LibraryList::Watched, 101);
    library.toggle(LibraryList::Disliked, 102);

    let feed = generate_feed(provider.clone(), &library).await;

    assert!(feed.personalized);
    let excluded = library.excluded_ids();
    assert!(feed.items.iter().all(|i| !excluded.contains(&i.id)));
    assert!(feed.items.is_empty());
    assert_eq!(provider.recorded().len(), 1);
}

#[tokio::test]
async fn test_cold_start_feed_is_trending_unmodified() {
    let mut provider = FakeProvider::new();
    provider.trending = (1..=15).map(|id| item(id, Endpoint::Movie)).collect();
    let provider = Arc::new(provider);

    // Details unknown to the catalog: no genre signal
    let mut library = UserLibrary::default();
    library.toggle(LibraryList::Watched, 3);

    let feed = generate_feed(provider.clone(), &library).await;
    assert!(!feed.personalized);
    assert_eq!(feed.items.len(), 15);
    assert!(feed.items.iter().any(|i| i.id == 3));
    assert!(provider.recorded().is_empty());

    assert_eq!(feed.for_display().items.len(), FEED_DISPLAY_LIMIT);
}

#[tokio::test]
async fn test_feed_discovery_failure_is_empty() {
    let mut provider = provider_with_delays([0, 0, 0, 0]);
    provider.fail_catalog = true;

    let feed = generate_feed(Arc::new(provider), &library()).await;
    assert!(feed.personalized);
    assert!(feed.items.is_empty());
}
