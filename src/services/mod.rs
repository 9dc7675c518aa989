pub mod discovery;
pub mod interest_profile;
pub mod keywords;
pub mod library;
pub mod personalized_feed;
pub mod providers;
pub mod query_compiler;
pub mod search;
pub mod search_intent;
pub mod surface;
pub mod url_codec;
