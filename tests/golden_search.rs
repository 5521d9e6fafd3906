use tempfile::TempDir;

use gramdex::{CompressionMode, EngineConfig, Gramdex, IndexSettings, SearchResult};

fn setup_engine(settings: IndexSettings) -> (TempDir, Gramdex) {
    let tmp = TempDir::new().unwrap();
    let config = EngineConfig::new(tmp.path().to_path_buf()).with_settings(settings);
    let engine = Gramdex::open(&config).unwrap();
    (tmp, engine)
}

/// Three documents sharing 日本 with differing frequencies, plus one unique bigram each
fn index_fixture(engine: &Gramdex) -> Vec<u64> {
    let docs = [
        ("T1", "日本 日本 日本 東京"),
        ("T2", "日本 日本 大阪"),
        ("T3", "日本 京都"),
    ];

    let mut session = engine.session().unwrap();
    let ids = docs
        .iter()
        .map(|(title, body)| session.add_document(title, body).unwrap().unwrap())
        .collect();
    session.end_batch().unwrap();
    ids
}

fn ids(results: &[SearchResult]) -> Vec<u64> {
    results.iter().map(|r| r.document_id).collect()
}

#[test]
fn golden_common_bigram_ranks_by_frequency() {
    let (_tmp, engine) = setup_engine(IndexSettings::default());
    let docs = index_fixture(&engine);

    let results = engine.search("日本").unwrap();
    assert_eq!(ids(&results), docs);

    let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![3.0, 2.0, 1.0]);
}

#[test]
fn golden_unique_bigram_returns_one_document() {
    let (_tmp, engine) = setup_engine(IndexSettings::default());
    let docs = index_fixture(&engine);

    let results = engine.search("大阪").unwrap();
    assert_eq!(ids(&results), vec![docs[1]]);
    assert_eq!(results[0].score, 3.0);
}

#[test]
fn golden_multi_token_query_is_conjunctive() {
    let (_tmp, engine) = setup_engine(IndexSettings::default());
    let docs = index_fixture(&engine);

    // 日本: 3 * 3/3, 東京: 1 * 3/1
    let results = engine.search("日本 東京").unwrap();
    assert_eq!(ids(&results), vec![docs[0]]);
    assert_eq!(results[0].score, 6.0);

    assert!(engine.search("大阪 京都").unwrap().is_empty());
}

#[test]
fn golden_unknown_and_short_queries_are_empty() {
    let (_tmp, engine) = setup_engine(IndexSettings::default());
    index_fixture(&engine);

    assert!(engine.search("名古").unwrap().is_empty());
    assert!(engine.search("日本 名古").unwrap().is_empty());
    assert!(engine.search("日").unwrap().is_empty());
    assert!(engine.search("").unwrap().is_empty());
    // only ignored characters
    assert!(engine.search("ab, cd").unwrap().is_empty());
}

#[test]
fn golden_hits_carry_titles() {
    let (_tmp, engine) = setup_engine(IndexSettings::default());
    index_fixture(&engine);

    let hits = engine.search_hits("日本").unwrap();
    let titles: Vec<&str> = hits.iter().map(|h| h.display_title()).collect();
    assert_eq!(titles, vec!["T1", "T2", "T3"]);
    assert!(hits.iter().all(|h| h.lookup_error.is_none()));
}

#[test]
fn golden_ascii_bigrams() {
    let settings = IndexSettings::default().with_ascii_indexing(true);
    let engine = Gramdex::in_memory(settings).unwrap();

    let mut session = engine.session().unwrap();
    let a = session.add_document("A", "ab cd").unwrap().unwrap();
    let b = session.add_document("B", "ab xy").unwrap().unwrap();
    session.end_batch().unwrap();

    let mut both = ids(&engine.search("ab").unwrap());
    both.sort_unstable();
    assert_eq!(both, vec![a, b]);

    assert_eq!(ids(&engine.search("cd").unwrap()), vec![a]);
    assert!(engine.search("zz").unwrap().is_empty());
}

#[test]
fn golden_results_are_deterministic() {
    let (_tmp, engine) = setup_engine(IndexSettings::default());
    let mut session = engine.session().unwrap();
    for title in ["甲", "乙", "丙", "丁"] {
        session.add_document(title, "東京都").unwrap();
    }
    session.end_batch().unwrap();

    let first = engine.search("東京都").unwrap();
    let second = engine.search("東京都").unwrap();
    assert_eq!(first, second);

    // equal scores fall back to ascending document id
    let order = ids(&first);
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(order, sorted);
    assert_eq!(order.len(), 4);
}

#[test]
fn golden_delta_compression_gives_identical_results() {
    let (_plain_tmp, plain) = setup_engine(IndexSettings::default());
    let (_delta_tmp, delta) =
        setup_engine(IndexSettings::default().with_compression(CompressionMode::Delta));
    index_fixture(&plain);
    index_fixture(&delta);

    for query in ["日本", "東京", "日本 大阪"] {
        assert_eq!(plain.search(query).unwrap(), delta.search(query).unwrap());
    }
}
