// src/labels.rs - Language label list handling

use anyhow::{anyhow, Result};
use std::collections::HashSet;

/// Extract the ordered label list from a `languages.json`-style object
/// (`{"Python": "py", "JSON": "json", ...}`).
///
/// Key order in the document fixes each language's class index, which is
/// why `serde_json` is built with `preserve_order` here.
pub fn parse_languages_json(json: &str) -> Result<Vec<String>> {
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
    if map.is_empty() {
        return Err(anyhow!("language list is empty"));
    }
    Ok(map.keys().cloned().collect())
}

/// Duplicate labels would make two class indices indistinguishable.
pub fn check_unique(labels: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(anyhow!("duplicate label: {}", label));
        }
    }
    Ok(())
}
