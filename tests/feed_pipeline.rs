// tests/feed_pipeline.rs
// Fixture feeds through ingest, curation, logging, and a second run.

use chrono::NaiveDate;
use limnopapers::history::{CsvLogStore, LogEntry, LogStore, MemoryLogStore, Posted};
use limnopapers::ingest::config::load_keywords_from;
use limnopapers::ingest::providers::journal_feed::JournalFeed;
use limnopapers::ingest::types::{FeedProvider, Post};
use limnopapers::scheduler::{Decider, Decision, Mode, PostingScheduler};
use limnopapers::{Pipeline, WindowSelector};
use rand::{rngs::StdRng, SeedableRng};
use std::fs;
use std::path::Path;

struct NeverAsked;

impl Decider for NeverAsked {
    fn decide(&mut self, _status: &str) -> anyhow::Result<Decision> {
        panic!("ignore-all mode must not prompt");
    }
}

async fn fixture_posts() -> Vec<Post> {
    let lo = fs::read_to_string("tests/fixtures/limnology_oceanography_rdf.xml")
        .expect("missing L&O fixture");
    let fws = fs::read_to_string("tests/fixtures/freshwater_science_rss.xml")
        .expect("missing Freshwater Science fixture");
    let providers: Vec<Box<dyn FeedProvider + Send + Sync>> = vec![
        Box::new(JournalFeed::from_fixture_str("Limnology and Oceanography", &lo)),
        Box::new(JournalFeed::from_fixture_str("Freshwater Science", &fws)),
    ];
    limnopapers::ingest::collect(&providers).await
}

// the morning after the fixtures were published
fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
}

#[tokio::test]
async fn fixtures_collect_sorted_without_repeats() {
    let posts = fixture_posts().await;
    let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(
        titles,
        [
            "Stream invertebrate drift below reservoirs",
            "Glacial Lake Outburst Floods in the Himalaya",
            "Ocean acidification and lake-effect snow",
            "Do reservoirs emit more methane than natural lakes?",
            "Coral reef calcification under warming",
        ]
    );
    // the repeated title keeps the earlier journal's entry
    assert_eq!(posts[1].source, "Limnology and Oceanography");
    assert_eq!(posts[0].summary, "Drift density increased & varied with discharge.");
}

#[tokio::test]
async fn logged_titles_are_not_offered_again() {
    let rules = load_keywords_from(Path::new("config/keywords.csv")).expect("keywords");
    let window = WindowSelector::default();
    let log = MemoryLogStore::from_entries(vec![LogEntry {
        title: "Glacial Lake Outburst Floods in the Himalaya.".into(),
        source: "Limnology and Oceanography".into(),
        url: "https://doi.org/10.1002/lno.12001".into(),
        posted: Posted::Yes,
        date: NaiveDate::from_ymd_opt(2024, 3, 9),
    }]);

    let out = Pipeline::new(&rules, window).run(fixture_posts().await, &log, anchor());
    assert_eq!(out.classification.relevant.len(), 3);
    assert_eq!(out.classification.excluded.len(), 1);
    assert_eq!(out.classification.excluded[0].keyword, "ocean");
    let titles: Vec<_> = out.candidates.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(
        titles,
        [
            "Stream invertebrate drift below reservoirs",
            "Do reservoirs emit more methane than natural lakes?",
        ]
    );
    // window is 2024-03-10 09:00 .. 2024-03-11 09:00 UTC; the 07:30 post falls before it
    let excluded: Vec<_> = out.todays_excluded.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(
        excluded,
        [
            "Glacial Lake Outburst Floods in the Himalaya",
            "Ocean acidification and lake-effect snow",
            "Coral reef calcification under warming",
        ]
    );
}

#[tokio::test]
async fn ignored_candidates_round_trip_through_the_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");
    let rules = load_keywords_from(Path::new("config/keywords.csv")).expect("keywords");
    let window = WindowSelector::default();

    let mut log = CsvLogStore::open(&path).unwrap();
    let first = Pipeline::new(&rules, window).run(fixture_posts().await, &log, anchor());
    assert_eq!(first.candidates.len(), 3);

    let scheduler = PostingScheduler::new(Mode::IgnoreAll, None);
    let mut rng = StdRng::seed_from_u64(7);
    let report = scheduler
        .run(first.candidates, &mut log, &mut NeverAsked, &mut rng, anchor())
        .await
        .unwrap();
    assert_eq!(report.ignored.len(), 3);
    assert!(!report.disabled);

    let reread = CsvLogStore::open(&path).unwrap();
    assert_eq!(reread.entries().len(), 3);
    assert!(reread.entries().iter().all(|e| e.posted == Posted::Ignored));
    assert!(reread.entries().iter().all(|e| e.date == Some(anchor())));

    let second = Pipeline::new(&rules, window).run(fixture_posts().await, &reread, anchor());
    assert!(second.candidates.is_empty());
}
