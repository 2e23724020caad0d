mod common;

use assert2::{check, let_assert};
use common::{TempWorkspace, vlbi_symbols, vlbi_table_source};
use doxysearch_mcp::manifest::{ALL_SECTION, IndexManifest};
use doxysearch_mcp::table::{parse_table, write_table};
use doxysearch_mcp::tools::{rebuild, roundtrip};
use doxysearch_mcp::{SymbolKind, TableBuilder};

/// Test: Regenerating from the unordered symbol list reproduces the original table.
#[test]
fn rebuilt_bucket_matches_generated_table() {
    let built = vlbi_symbols().into_iter().collect::<TableBuilder>().build();

    let_assert!(Some(bucket) = built.bucket(ALL_SECTION, 'v'));
    check!(write_table(&bucket.table) == vlbi_table_source());
}

/// Test: The "all" section comes first, then one section per kind present.
#[test]
fn rebuilt_sections_follow_kind_order() {
    let built = vlbi_symbols().into_iter().collect::<TableBuilder>().build();

    let names: Vec<&str> = built
        .manifest
        .sections()
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    check!(names == ["all", "files", "functions", "typedefs", "defines", "groups"]);

    let_assert!(Some(groups) = built.bucket(SymbolKind::Group.section(), 'v'));
    let labels: Vec<&str> = groups.table.iter().map(|e| e.label.as_str()).collect();
    check!(
        labels
            == [
                "Very Long Baseline Interferometry",
                "VLBI defines",
                "VLBI internal functions",
                "VLBI types",
            ]
    );
}

/// Test: Writing to disk produces a manifest that reads back, and tables that
/// pass the round-trip check.
#[tokio::test(flavor = "multi_thread")]
async fn rebuild_writes_consistent_directory() {
    let workspace = TempWorkspace::new();
    let symbols = common::fixture_path("vlbi_symbols.json");
    let output = workspace.path().join("search");

    let_assert!(Ok(summary) = rebuild(&symbols, &output).await);
    check!(summary.contains("for 47 symbols"));

    let manifest_source = std::fs::read_to_string(output.join("searchdata.js")).unwrap();
    let_assert!(Ok(manifest) = IndexManifest::parse(&manifest_source));
    check!(manifest.bucket_count() == 6);

    let_assert!(Some(all) = manifest.section(ALL_SECTION));
    let_assert!(Some(file) = all.bucket_file('v'));
    let all_v = std::fs::read_to_string(output.join(&file)).unwrap();
    check!(all_v == vlbi_table_source());
    let_assert!(Ok(table) = parse_table(&all_v));
    check!(table.len() == 47);

    let_assert!(Ok(results) = roundtrip(&output).await);
    check!(results.len() == 6);
    check!(results.iter().all(|r| r.is_identical()));
}

/// Test: A second rebuild replaces tables from the first.
#[tokio::test(flavor = "multi_thread")]
async fn rebuild_removes_stale_tables() {
    let workspace = TempWorkspace::new();
    workspace.create_file("search/pages_0.js", "var searchData=\n[\n];\n");
    workspace.create_file("search/search.css", "");
    let symbols = common::fixture_path("vlbi_symbols.json");
    let output = workspace.path().join("search");

    let_assert!(Ok(_) = rebuild(&symbols, &output).await);

    check!(!output.join("pages_0.js").exists());
    check!(output.join("search.css").exists());
    check!(output.join("all_0.js").exists());
}
