use amortization_core::frequency::{Frequency, FrequencyCatalog};
use log::info;
use std::path::Path;

use crate::input::file;

/// The frequency catalog for this run: the standard seven unless a YAML or
/// JSON file of frequencies is supplied.
pub fn load_catalog(path: Option<&str>) -> Result<FrequencyCatalog, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(FrequencyCatalog::standard());
    };

    let (canonical, contents) = file::read_text(path)?;
    let frequencies = parse_frequencies(&canonical, &contents)?;
    let catalog = FrequencyCatalog::from_frequencies(frequencies)?;
    info!("loaded {} frequencies from {}", catalog.len(), canonical.display());
    Ok(catalog)
}

/// Write the catalog back to `path` in the format its extension implies.
pub fn save_catalog(
    path: &str,
    catalog: &FrequencyCatalog,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = Path::new(path);
    let frequencies: Vec<&Frequency> = catalog.iter().collect();
    let contents = if is_yaml(target) {
        serde_yaml::to_string(&frequencies)?
    } else {
        serde_json::to_string_pretty(&frequencies)?
    };
    std::fs::write(target, contents)
        .map_err(|e| format!("Failed to write '{}': {}", target.display(), e))?;
    info!("saved {} frequencies to {}", catalog.len(), target.display());
    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn parse_frequencies(
    path: &Path,
    contents: &str,
) -> Result<Vec<Frequency>, Box<dyn std::error::Error>> {
    let frequencies: Vec<Frequency> = if is_yaml(path) {
        serde_yaml::from_str(contents)
            .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?
    } else {
        serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?
    };
    Ok(frequencies)
}
