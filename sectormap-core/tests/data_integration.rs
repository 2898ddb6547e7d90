//! Integration tests for the curated loader using the frozen fixture files.

use sectormap_core::data::{decode_text, CuratedColumns, CuratedLoader, DataError, SourceEncoding};
use sectormap_core::domain::{Segment, TickerCode};
use sectormap_core::Outcome;
use std::path::PathBuf;

fn fixture(segment: Segment) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(segment.curated_file_name())
}

fn code(s: &str) -> TickerCode {
    TickerCode::normalize(s).unwrap()
}

#[test]
fn cp949_fixture_decodes_as_cp949() {
    let bytes = std::fs::read(fixture(Segment::Kospi200)).unwrap();
    assert!(std::str::from_utf8(&bytes).is_err());
    let (text, encoding) = decode_text(&bytes).unwrap();
    assert_eq!(encoding, SourceEncoding::Cp949);
    assert!(text.starts_with("종목코드,종목명,내분류"));
}

#[test]
fn cp949_fixture_loads_padded_and_deduplicated() {
    let loader = CuratedLoader::default();
    let set = match loader.load(&fixture(Segment::Kospi200)) {
        Outcome::Complete(set) => set,
        other => panic!("expected a complete load, got {other:?}"),
    };

    assert_eq!(set.len(), 3);
    let codes: Vec<&str> = set.iter().map(|e| e.ticker_code.as_str()).collect();
    assert_eq!(codes, vec!["005930", "000660", "005380"]);

    // First occurrence wins.
    let samsung = set.get(&code("005930")).unwrap();
    assert_eq!(samsung.sector_label.as_deref(), Some("반도체"));
    assert_eq!(
        set.get(&code("005380")).unwrap().sector_label.as_deref(),
        Some("자동차")
    );
}

#[test]
fn utf8_bom_fixture_uses_english_aliases() {
    let loader = CuratedLoader::new(CuratedColumns::default());
    let set = loader.load(&fixture(Segment::Kosdaq150)).into_result().unwrap().0;

    // The malformed code row is skipped, the blank sector is kept as unset.
    assert_eq!(set.len(), 2);
    assert_eq!(
        set.get(&code("247540")).unwrap().sector_label.as_deref(),
        Some("2차전지")
    );
    assert_eq!(set.get(&code("091990")).unwrap().sector_label, None);
}

#[test]
fn restricted_aliases_reject_fixture_header() {
    let loader = CuratedLoader::new(CuratedColumns {
        ticker: vec!["symbol".into()],
        sector: vec!["내분류".into()],
    });
    match loader.load(&fixture(Segment::Kospi200)) {
        Outcome::Fatal(DataError::MissingColumn { tried, .. }) => {
            assert_eq!(tried, vec!["symbol".to_string()]);
        }
        other => panic!("expected missing column, got {other:?}"),
    }
}

#[test]
fn missing_fixture_degrades_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(Segment::Kosdaq150.curated_file_name());
    let outcome = CuratedLoader::default().load(&path);
    assert!(outcome.is_degraded());
    assert!(matches!(
        outcome.cause(),
        Some(DataError::MissingCuratedFile { .. })
    ));
    assert!(outcome.value().unwrap().is_empty());
}
