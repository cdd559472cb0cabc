pub mod journal_feed;
