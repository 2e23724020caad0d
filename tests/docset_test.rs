mod common;

use assert2::{check, let_assert};
use common::{VlbiDocset, vlbi_docset};
use doxysearch_mcp::cache::{INDEX_CACHE_FILE, digest_search_dir, load_index};
use doxysearch_mcp::docset::{Docset, DocsetOptions};
use doxysearch_mcp::manifest::ALL_SECTION;
use doxysearch_mcp::table::Strictness;
use doxysearch_mcp::{Config, LoadError};
use rstest::rstest;
use std::sync::Arc;

async fn labels(docset: &Docset, section: &str, query: &str) -> Vec<String> {
    let_assert!(Ok(hits) = docset.prefix_search(section, query, 100).await);
    hits.into_iter().map(|h| h.entry.label).collect()
}

async fn open(fixture: &VlbiDocset) -> Arc<Docset> {
    let_assert!(Some(docset) = fixture.state.docset().await);
    docset
}

// --- Prefix search ---

#[rstest]
#[case::underscore("vlbi_in", &["vlbi_init"])]
#[case::case_and_leading_space("  VLBI_IN", &["vlbi_init"])]
#[case::inner_space("vlbi i", &["VLBI internal functions"])]
#[case::trailing_space("vlbi_init  ", &["vlbi_init"])]
#[case::both_ends("  VLBI_INIT ", &["vlbi_init"])]
#[case::dot("vlbi.", &["vlbi.h"])]
#[case::full_title("very long", &["Very Long Baseline Interferometry"])]
#[case::estimate_snr("vlbi_estimate_snr", &["vlbi_estimate_snr", "vlbi_estimate_snr_zero"])]
#[case::empty("", &[])]
#[case::only_spaces("   ", &[])]
#[case::missing_bucket("xyz", &[])]
#[tokio::test(flavor = "multi_thread")]
async fn prefix_search_follows_search_box_rules(
    vlbi_docset: VlbiDocset,
    #[case] query: &str,
    #[case] expected: &[&str],
) {
    let docset = open(&vlbi_docset).await;
    check!(labels(&docset, ALL_SECTION, query).await == expected);
}

/// Test: Every entry starting with "vlbi_" is found, in table order.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prefix_search_returns_table_order(vlbi_docset: VlbiDocset) {
    let docset = open(&vlbi_docset).await;
    let found = labels(&docset, ALL_SECTION, "vlbi_").await;

    check!(found.len() == 42);
    check!(found.first().map(String::as_str) == Some("vlbi_add_stream"));
    check!(found.last().map(String::as_str) == Some("VLBI_VERSION_STRING"));
}

/// Test: Trailing spaces are ignored, so "vlbi " lists every entry starting
/// with "vlbi" rather than only the space-separated group titles.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prefix_search_ignores_trailing_spaces(vlbi_docset: VlbiDocset) {
    let docset = open(&vlbi_docset).await;
    let trimmed = labels(&docset, ALL_SECTION, "vlbi").await;
    let padded = labels(&docset, ALL_SECTION, "vlbi ").await;

    check!(padded == trimmed);
    check!(padded.len() == 46);
    check!(padded.iter().any(|l| l == "VLBI defines"));
    check!(padded.iter().any(|l| l == "vlbi_init"));
    check!(!padded.iter().any(|l| l == "Very Long Baseline Interferometry"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prefix_search_in_kind_sections(vlbi_docset: VlbiDocset) {
    let docset = open(&vlbi_docset).await;

    check!(labels(&docset, "groups", "vlbi").await.len() == 3);
    check!(labels(&docset, "typedefs", "vlbi_").await == ["vlbi_context", "vlbi_func2_t"]);
    check!(labels(&docset, "defines", "vlbi_").await == ["vlbi_max_threads", "VLBI_VERSION_STRING"]);

    let result = docset.prefix_search("classes", "vlbi", 10).await;
    let_assert!(Err(LoadError::UnknownSection(section)) = result);
    check!(section == "classes");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prefix_search_respects_limit(vlbi_docset: VlbiDocset) {
    let docset = open(&vlbi_docset).await;
    let_assert!(Ok(hits) = docset.prefix_search(ALL_SECTION, "vlbi_astro", 3).await);

    check!(hits.len() == 3);
    check!(hits[0].entry.label == "vlbi_astro_calc_delta_magnitude");
    check!(hits.iter().all(|h| h.file == "all_0.js"));
}

// --- Table loading ---

#[rstest]
#[case("../searchdata.js")]
#[case(".doxysearch.index")]
#[case("")]
#[case("sub\\all_0.js")]
#[tokio::test(flavor = "multi_thread")]
async fn table_rejects_paths_outside_search_dir(vlbi_docset: VlbiDocset, #[case] file: &str) {
    let docset = open(&vlbi_docset).await;
    let_assert!(Err(LoadError::InvalidFileName(name)) = docset.table(file).await);
    check!(name == file);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tables_are_cached(vlbi_docset: VlbiDocset) {
    let docset = open(&vlbi_docset).await;
    check!(docset.cached_tables().await == 0);

    let_assert!(Ok(first) = docset.table("all_0.js").await);
    let_assert!(Ok(second) = docset.table("all_0.js").await);
    check!(Arc::ptr_eq(&first, &second));
    check!(docset.cached_tables().await == 1);

    docset.clear_cache().await;
    check!(docset.cached_tables().await == 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn open_accepts_search_dir(vlbi_docset: VlbiDocset) {
    let_assert!(Ok(docset) = Docset::open(vlbi_docset.search_dir(), DocsetOptions::default()).await);
    check!(docset.root() == vlbi_docset.html());
    check!(docset.manifest().sections().len() == 6);
}

#[tokio::test(flavor = "multi_thread")]
async fn open_reports_missing_manifest() {
    let workspace = common::TempWorkspace::new();
    let result = Docset::open(workspace.path(), DocsetOptions::default()).await;

    let_assert!(Err(error) = result);
    let_assert!(Some(LoadError::NotFound { path }) = error.downcast_ref::<LoadError>());
    check!(path.ends_with("search/searchdata.js"));
}

// --- Keyword search ---

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn keyword_search_finds_snr_functions(vlbi_docset: VlbiDocset) {
    let docset = open(&vlbi_docset).await;
    let_assert!(Ok(hits) = docset.find("snr", 10).await);

    let found: Vec<&str> = hits.iter().map(|h| h.entry.label.as_str()).collect();
    check!(found.len() == 2);
    check!(found.contains(&"vlbi_estimate_snr"));
    check!(found.contains(&"vlbi_estimate_snr_zero"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn keyword_search_splits_words(vlbi_docset: VlbiDocset) {
    let docset = open(&vlbi_docset).await;
    let_assert!(Ok(hits) = docset.find("baseline projection", 5).await);

    let_assert!(Some(best) = hits.first());
    check!(best.entry.label == "vlbi_calc_baseline_projection");
    check!(best.location.file == "all_0.js");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn keyword_search_suggests_on_typos(vlbi_docset: VlbiDocset) {
    let docset = open(&vlbi_docset).await;
    let_assert!(Ok(hits) = docset.find("vlbiexti", 5).await);
    check!(hits.is_empty());

    let_assert!(Ok(suggestions) = docset.suggest("vlbiexti", 5).await);
    let_assert!(Some(best) = suggestions.first());
    check!(best.label == "vlbi_exit");
}

/// Test: The keyword index is written next to the tables and read back while
/// the tables are unchanged.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn keyword_index_is_cached_on_disk(vlbi_docset: VlbiDocset) {
    let cache_path = vlbi_docset.search_dir().join(INDEX_CACHE_FILE);
    check!(!cache_path.exists());

    let docset = open(&vlbi_docset).await;
    let_assert!(Ok(index) = docset.keyword_index().await);
    check!(index.document_count() == 47);
    check!(cache_path.exists());

    let_assert!(Ok(digest) = digest_search_dir(&vlbi_docset.search_dir()).await);
    let_assert!(Some(cached) = load_index(&cache_path, digest).await);
    check!(cached.document_count() == 47);
    check!(cached.term_count() == index.term_count());

    std::fs::write(vlbi_docset.search_dir().join("all_0.js"), "var searchData=\n[\n];\n").unwrap();
    let_assert!(Ok(changed) = digest_search_dir(&vlbi_docset.search_dir()).await);
    check!(changed != digest);
    check!(load_index(&cache_path, changed).await.is_none());
}

/// Test: After the tables are regenerated, clearing the cache makes `find`
/// rank and resolve against the new tables instead of the old index.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clear_cache_rebuilds_keyword_index(vlbi_docset: VlbiDocset) {
    let docset = open(&vlbi_docset).await;
    let_assert!(Ok(hits) = docset.find("snr", 10).await);
    check!(hits.len() == 2);
    check!(docset.has_keyword_index().await);

    std::fs::write(
        vlbi_docset.search_dir().join("all_0.js"),
        "var searchData=\n[\n  ['vlbi_5festimate_5fsnr_5fzero',['vlbi_estimate_snr_zero',['../group___v_l_b_i___internal.html#ga70524cd0a72b7cad9b9299887bdbef06',1,'vlbi.h']]],\n  ['vlbi_5finit',['vlbi_init',['../group___v_l_b_i___functions.html#ga7af54a4c1922c260e74c8a5f2fcb89d9',1,'vlbi.h']]]\n];\n",
    )
    .unwrap();
    docset.clear_cache().await;
    check!(!docset.has_keyword_index().await);

    let_assert!(Ok(hits) = docset.find("snr", 10).await);
    let_assert!([hit] = hits.as_slice());
    check!(hit.entry.label == "vlbi_estimate_snr_zero");
    check!(hit.location.position == 0);

    let_assert!(Ok(index) = docset.keyword_index().await);
    check!(index.document_count() == 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn keyword_index_cache_can_be_disabled() {
    let config = Config {
        keyword_index: false,
        ..Config::default()
    };
    let fixture = VlbiDocset::with_config(config);
    let docset = open(&fixture).await;

    let_assert!(Ok(_) = docset.find("snr", 10).await);
    check!(!fixture.search_dir().join(INDEX_CACHE_FILE).exists());
}

// --- Validation ---

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn generated_docset_validates_cleanly(vlbi_docset: VlbiDocset) {
    let docset = open(&vlbi_docset).await;
    let_assert!(Ok(report) = docset.validate(Strictness::Lenient).await);

    check!(report.files.len() == 6);
    check!(report.entry_count() == 94);
    check!(report.error_count() == 0);
    check!(report.warning_count() == 0);
    check!(report.is_ok());
}

/// Test: Strict mode flags the five page-level entries in "all" plus their
/// copies in "files" and "groups".
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strict_validation_counts_page_targets(vlbi_docset: VlbiDocset) {
    let docset = open(&vlbi_docset).await;
    let_assert!(Ok(report) = docset.validate(Strictness::Strict).await);

    check!(report.error_count() == 10);
    check!(!report.is_ok());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn validation_reports_orphans_and_broken_tables(vlbi_docset: VlbiDocset) {
    let search = vlbi_docset.search_dir();
    std::fs::write(search.join("all_1.js"), "var searchData=\n[\n];\n").unwrap();
    std::fs::write(search.join("groups_0.js"), "var searchData=\n[\n  ['vlbi',\n];\n").unwrap();

    let docset = open(&vlbi_docset).await;
    let_assert!(Ok(report) = docset.validate(Strictness::Lenient).await);

    check!(report.orphans == ["all_1.js"]);
    check!(report.warning_count() == 1);
    check!(report.error_count() == 1);

    let_assert!(Some(broken) = report.files.iter().find(|f| f.file == "groups_0.js"));
    let_assert!(Err(LoadError::Parse { .. }) = &broken.outcome);
}
