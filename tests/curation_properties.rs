// tests/curation_properties.rs
// Seeded randomized checks of the classifier, deduplicator and window.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use limnopapers::dedup::{dedupe, log_title, normalize_title};
use limnopapers::history::{LogEntry, MemoryLogStore, Posted};
use limnopapers::relevance::{classify, KeywordRuleSet};
use limnopapers::{Post, WindowSelector};
use rand::{rngs::StdRng, Rng, SeedableRng};

const WORDS: &[&str] = &[
    "lake", "Reservoir", "ocean", "OCEAN", "marine", "stream", "sediment", "nitrogen",
    "phosphorus", "ice", "wetland", "estuary", "carbon", "Lakes", "pond", "river",
];

fn phrase(rng: &mut StdRng, n: usize) -> String {
    (0..n)
        .map(|_| WORDS[rng.random_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

fn post(title: String, summary: String) -> Post {
    Post {
        url: format!("https://doi.org/{}", title.len()),
        title,
        summary,
        source: "Hydrological Processes".into(),
        published: Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap(),
    }
}

fn random_posts(seed: u64, n: usize) -> Vec<Post> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let t = rng.random_range(1..6);
            let s = rng.random_range(0..10);
            post(phrase(&mut rng, t), phrase(&mut rng, s))
        })
        .collect()
}

fn rules() -> KeywordRuleSet {
    KeywordRuleSet::new(
        vec!["lake".into(), "reservoir".into(), "pond".into()],
        vec!["ocean".into(), "marine".into()],
    )
}

#[test]
fn classification_is_idempotent() {
    let r = rules();
    for seed in 0..20 {
        let once = classify(random_posts(seed, 60), &r).relevant;
        let twice = classify(once.clone(), &r).relevant;
        assert_eq!(once, twice, "seed {seed}");
    }
}

#[test]
fn relevant_iff_include_and_no_corroborated_exclude() {
    let r = rules();
    for p in random_posts(99, 200) {
        let t = p.title.to_lowercase();
        let s = p.summary.to_lowercase();
        let inc = ["lake", "reservoir", "pond"]
            .iter()
            .any(|k| t.contains(k) || s.contains(k));
        let exc = ["ocean", "marine"]
            .iter()
            .any(|k| t.contains(k) && s.contains(k));
        let got = classify(vec![p.clone()], &r).relevant.len() == 1;
        assert_eq!(got, inc && !exc, "{p:?}");
    }
}

#[test]
fn exclude_needs_corroboration_in_both_fields() {
    let r = KeywordRuleSet::new(vec!["lake".into()], vec!["ocean".into()]);
    let a = post(
        "Ocean and Lake study".into(),
        "ocean dynamics in lake systems".into(),
    );
    let b = post(
        "Lake Erie nutrient loading".into(),
        "freshwater dynamics".into(),
    );
    let c = post(
        "Lake Erie nutrient loading".into(),
        "ocean currents affect nearby lakes".into(),
    );
    let out = classify(vec![a, b.clone(), c.clone()], &r);
    assert_eq!(out.excluded.len(), 1);
    assert_eq!(out.excluded[0].keyword, "ocean");
    assert_eq!(out.relevant, vec![b, c]);
}

#[test]
fn dedupe_never_returns_a_logged_title_variant() {
    let mut rng = StdRng::seed_from_u64(2024);
    let posts = random_posts(7, 120);

    // log a random third of the titles, shortened and with random case/suffix
    let mut entries = Vec::new();
    for p in &posts {
        if rng.random_range(0..3) != 0 {
            continue;
        }
        let mut t = log_title(&p.title);
        if rng.random_bool(0.5) {
            t = t.to_uppercase();
        }
        match rng.random_range(0..3) {
            0 => {}
            1 => t.push('.'),
            _ => t.push('?'),
        }
        entries.push(LogEntry {
            title: t,
            source: p.source.clone(),
            url: p.url.clone(),
            posted: Posted::Yes,
            date: None,
        });
    }
    let log = MemoryLogStore::from_entries(entries.clone());
    let kept = dedupe(posts.clone(), &log);

    for e in &entries {
        let logged = e.title.to_lowercase();
        for p in &kept {
            let n = normalize_title(&p.title);
            assert_ne!(n, logged);
            assert_ne!(format!("{n}."), logged);
            assert_ne!(format!("{n}?"), logged);
        }
    }
    assert!(kept.len() < posts.len());
}

#[test]
fn long_title_matches_its_shortened_log_entry() {
    let title = format!("Lake {}", "sediment ".repeat(30));
    let log = MemoryLogStore::from_entries(vec![LogEntry {
        title: log_title(&title),
        source: String::new(),
        url: String::new(),
        posted: Posted::Ignored,
        date: None,
    }]);
    assert!(log_title(&title).ends_with("..."));
    assert!(dedupe(vec![post(title, String::new())], &log).is_empty());
}

#[test]
fn default_window_bounds_are_strict() {
    let w = WindowSelector::default();
    let d = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    let at = |day, h, min, s| {
        let mut p = post("Lake".into(), String::new());
        p.published = Utc.with_ymd_and_hms(2024, 3, day, h, min, s).unwrap();
        p
    };
    let on_start = at(9, 9, 0, 0);
    let after_start = at(9, 9, 0, 1);
    let inside = at(10, 0, 0, 1);
    let on_end = at(10, 9, 0, 0);
    assert_eq!(w.bounds(d).0, on_start.published);
    assert_eq!(w.bounds(d).1 - Duration::hours(24), on_start.published);

    let picked = w.select_window(&[on_start, after_start.clone(), inside.clone(), on_end], d);
    assert_eq!(picked, vec![after_start, inside]);
}
