// tests/dedup_props.rs
//
// Randomized checks of the dedup filter: idempotent, order-preserving,
// first-seen-wins on the url|title|source key.

use std::collections::HashSet;

use chrono::Utc;
use point_counterpoint::article::{dedupe, ArticleDraft, Category, NormalizedArticle};
use rand::Rng;

fn random_batch(rng: &mut impl Rng, n: usize) -> Vec<NormalizedArticle> {
    let now = Utc::now();
    (0..n)
        .map(|i| {
            // small pools so collisions are common; random casing exercises the
            // case-insensitive key
            let story = rng.random_range(0..6);
            let source = rng.random_range(0..2);
            let mut url = format!("https://d.test/story-{story}");
            if rng.random_bool(0.5) {
                url = url.to_uppercase();
            }
            let mut a = ArticleDraft {
                provider: "prop",
                index: i,
                title: Some(format!("Story {story}")),
                url: Some(url),
                source_name: Some(format!("Source {source}")),
                ..Default::default()
            }
            .build(Category::General, now);
            a.id = format!("id-{i}");
            a
        })
        .collect()
}

#[test]
fn dedupe_is_idempotent_and_keeps_first_seen() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let n = rng.random_range(0..40);
        let batch = random_batch(&mut rng, n);
        let once = dedupe(batch.clone());
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);

        // keys unique
        let keys: HashSet<_> = once.iter().map(|a| a.dedup_key()).collect();
        assert_eq!(keys.len(), once.len());

        // every survivor is the first occurrence of its key, in input order
        let mut seen = HashSet::new();
        let expected: Vec<_> = batch
            .iter()
            .filter(|a| seen.insert(a.dedup_key()))
            .map(|a| a.id.clone())
            .collect();
        let got: Vec<_> = once.iter().map(|a| a.id.clone()).collect();
        assert_eq!(got, expected);
    }
}

#[test]
fn key_ignores_case_but_not_source() {
    let now = Utc::now();
    let mk = |url: &str, title: &str, src: &str| {
        ArticleDraft {
            provider: "k",
            title: Some(title.into()),
            url: Some(url.into()),
            source_name: Some(src.into()),
            ..Default::default()
        }
        .build(Category::General, now)
    };
    let a = mk("https://X.test/a", "Hello World", "Wire");
    let b = mk("https://x.test/a", "hello world", "WIRE");
    let c = mk("https://x.test/a", "hello world", "Other Wire");
    assert_eq!(a.dedup_key(), b.dedup_key());
    assert_ne!(a.dedup_key(), c.dedup_key());
    assert_eq!(dedupe(vec![a, b, c]).len(), 2);
}
