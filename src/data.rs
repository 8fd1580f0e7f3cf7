//! Loading color tokens and writing grouping reports

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::report::ClusterReport;

/// JSON input layouts: a bare token array or a color summary object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenFile {
    List(Vec<String>),
    Summary { unique_colors: Vec<String> },
}

/// Load color tokens from a file
///
/// # Arguments
/// * `path` - A JSON file (array of strings or `{"unique_colors": [...]}`)
///   or a text file with one token per line
///
/// # Returns
/// * Tokens in file order, duplicates kept. Blank lines and `//` comments are
///   skipped in text files.
pub fn load_color_tokens(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read color file {}", path.display()))?;
    parse_color_tokens(&content)
        .with_context(|| format!("invalid color file {}", path.display()))
}

/// Parse the contents of a color file, see [`load_color_tokens`]
pub fn parse_color_tokens(content: &str) -> anyhow::Result<Vec<String>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        let tokens = match serde_json::from_str::<TokenFile>(trimmed)
            .context("expected a JSON array of color strings or an object with \"unique_colors\"")?
        {
            TokenFile::List(tokens) | TokenFile::Summary { unique_colors: tokens } => tokens,
        };
        return Ok(tokens);
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .map(str::to_string)
        .collect())
}

/// Serialize `report` as pretty JSON
pub fn report_to_json(report: &ClusterReport) -> anyhow::Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report")
}

/// Write `report` as pretty JSON to `path`
pub fn write_report(report: &ClusterReport, path: &Path) -> anyhow::Result<()> {
    let json = report_to_json(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Algorithm, GroupingConfig};
    use crate::engine::group_colors;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_text_tokens() {
        let file = create_test_file("// palette\n#ff0000\n\n  rgb(0, 0, 255) \nnavy\n");
        let tokens = load_color_tokens(file.path()).unwrap();
        assert_eq!(tokens, vec!["#ff0000", "rgb(0, 0, 255)", "navy"]);
    }

    #[test]
    fn test_load_json_layouts() {
        let file = create_test_file(r##"["#fff", "black"]"##);
        assert_eq!(load_color_tokens(file.path()).unwrap(), vec!["#fff", "black"]);

        let file = create_test_file(r##"{"unique_colors": ["#123456"], "total": 1}"##);
        assert_eq!(load_color_tokens(file.path()).unwrap(), vec!["#123456"]);

        let file = create_test_file(r#"{"colors": 3}"#);
        assert!(load_color_tokens(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_color_tokens(Path::new("/nonexistent/colors.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/colors.txt"));
    }

    #[test]
    fn test_write_report() {
        let config = GroupingConfig::new(Algorithm::ReadabilityProximity).with_proximity(1.5);
        let report = group_colors(&["black", "white"], &config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grouped.json");
        write_report(&report, &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["groups"], 1);
        assert_eq!(written["list"][0]["representative"], "#000000");
        assert_eq!(written["list"][0]["members"][1], "white");
    }
}
