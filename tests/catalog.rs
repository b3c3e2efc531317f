use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use smart_city_toolkit::indicators::IndicatorCatalog;
use smart_city_toolkit::ToolkitError;

#[test]
fn test_bundled_catalog_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/indicator_catalog.json");
    let catalog = IndicatorCatalog::load(&path).unwrap();

    assert!(!catalog.is_empty());
    let categories = catalog.categories();
    assert_eq!(categories[0], "Digital Government");
    assert!(categories.contains(&"Connectivity"));

    let connectivity = catalog.indicators_in("connectivity");
    assert!(!connectivity.is_empty());
    assert!(connectivity.iter().all(|i| !i.maturity_scale.is_empty()));
}

#[test]
fn test_catalog_file_missing_sheet_fails() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"Data": [{{"Category": "Data Use", "Indicator": "Open APIs", "Maturity Assessment (1-5)": "1: <10"}}]}}"#
    )
    .unwrap();

    let err = IndicatorCatalog::load(file.path()).unwrap_err();
    assert!(matches!(err, ToolkitError::Catalog(_)));
    assert!(err.to_string().contains("missing sheet"));
}

#[test]
fn test_catalog_unreadable_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = IndicatorCatalog::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ToolkitError::Catalog(_)));
}
