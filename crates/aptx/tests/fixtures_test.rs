use std::fs;
use std::path::Path;

use aptx::convert::{convert_file, to_json};
use aptx::{from_xml_bytes, ConvertOptions, Converter};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

#[test]
fn test_fixture_matches_expected_json() -> Result<(), Box<dyn std::error::Error>> {
    for entry in fs::read_dir(FIXTURES)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("xml") {
            continue;
        }

        let doc = from_xml_bytes(&fs::read(&path)?)?;
        let json = to_json(&aptx::convert(&doc.root))?;
        let actual: serde_json::Value = serde_json::from_str(&json)?;
        let expected: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path.with_extension("json"))?)?;

        if actual != expected {
            return Err(std::io::Error::other(format!(
                "conversion of {path:?} differs from expected json:\n{actual:#}"
            ))
            .into());
        }
    }
    Ok(())
}

#[test]
fn test_convert_file_writes_indented_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("1435.json");
    let xml = Path::new(FIXTURES).join("1435.xml");

    let node = convert_file(&xml, &out, ConvertOptions::default())?;
    let written = fs::read_to_string(&out)?;

    assert!(written.starts_with("{\n    \"ProposalInformation\": {\n        \"Title\""));
    let reparsed: serde_json::Value = serde_json::from_str(&written)?;
    let direct: serde_json::Value = serde_json::from_str(&to_json(&node)?)?;
    assert_eq!(reparsed, direct);
    Ok(())
}

#[test]
fn test_fixture_is_unambiguous() -> Result<(), Box<dyn std::error::Error>> {
    let doc = from_xml_bytes(&fs::read(Path::new(FIXTURES).join("1435.xml"))?)?;
    let strict = Converter::with_options(ConvertOptions::strict()).convert(&doc.root)?;
    assert_eq!(strict, aptx::convert(&doc.root));
    Ok(())
}
