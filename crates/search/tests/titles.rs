use lede_core::{DocId, Document};
use lede_search::title_index;

fn post(id: i64, title: &str, date: Option<&str>) -> Document {
    Document {
        id: DocId::Num(id),
        database_id: Some(id),
        title: title.to_string(),
        slug: title.to_lowercase().replace(' ', "-"),
        date: date.map(|s| s.to_string()),
        excerpt: None,
        categories: smallvec::SmallVec::new(),
    }
}

fn corpus() -> Vec<Document> {
    vec![
        post(1, "Apple pie", Some("2024-02-01T09:00:00")),
        post(2, "Apricot jam", Some("2024-05-01T09:00:00")),
        post(3, "Banana split", Some("2024-06-01T09:00:00")),
    ]
}

#[test]
fn ap_prefix_is_newest_first_and_excludes_banana() {
    let idx = title_index(corpus());
    let hits: Vec<i64> = idx.suggest("Ap", 10).iter().map(|d| d.database_id.unwrap_or_default()).collect();
    assert_eq!(hits, vec![2, 1]);
}

#[test]
fn alphabetical_variant_keeps_key_order() {
    let idx = title_index(corpus());
    let hits: Vec<&str> = idx.prefix_range("ap", 10).iter().map(|d| d.title.as_str()).collect();
    assert_eq!(hits, vec!["Apple pie", "Apricot jam"]);
}

#[test]
fn empty_query_returns_nothing_regardless_of_corpus() {
    let idx = title_index((0..500).map(|i| post(i, &format!("Post {}", i), None)));
    assert_eq!(idx.len(), 500);
    assert!(idx.suggest("", 10).is_empty());
    assert!(idx.prefix_range("", 10).is_empty());
}

#[test]
fn swedish_titles_fold_accents() {
    let idx = title_index(vec![
        post(1, "Öresundsbron stängd", Some("2024-01-01")),
        post(2, "Ore prices rise", Some("2024-03-01")),
        post(3, "Åland val", None),
    ]);
    let hits: Vec<i64> = idx.suggest("ore", 10).iter().map(|d| d.database_id.unwrap_or_default()).collect();
    assert_eq!(hits, vec![2, 1]);
    assert_eq!(idx.suggest("ala", 10).len(), 1);
}
