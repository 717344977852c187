//! JSON artifacts, one file per visualization style

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use cryptoviz_core::{VisualizationPayload, VisualizationStyle};

pub fn artifact_path(out_dir: &Path, style: VisualizationStyle) -> PathBuf {
    out_dir.join(format!("{}-visualization.json", style))
}

/// Write `payload` to its style's artifact, replacing any previous file.
pub fn write_payload(out_dir: &Path, payload: &VisualizationPayload) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let path = artifact_path(out_dir, payload.style);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, payload)?;
    writer.flush()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptoviz_core::{build_payload, FilterCriteria, LayoutOptions, MarketDataRecord, Timeframe};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cryptoviz-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn payload(style: VisualizationStyle, records: &[MarketDataRecord]) -> VisualizationPayload {
        build_payload(records, style, Timeframe::Day, &FilterCriteria::default(), &LayoutOptions::for_style(style))
    }

    #[test]
    fn test_artifact_names() {
        let dir = Path::new("out");
        assert_eq!(artifact_path(dir, VisualizationStyle::Bubble), dir.join("bubble-visualization.json"));
        assert_eq!(artifact_path(dir, VisualizationStyle::Radial), dir.join("radial-visualization.json"));
    }

    #[test]
    fn test_write_creates_dir_and_overwrites() {
        let dir = scratch_dir("export");
        let records = vec![
            MarketDataRecord::new("bitcoin", "btc", "Bitcoin", 1.2e12, 1.0),
            MarketDataRecord::new("ethereum", "eth", "Ethereum", 4.0e11, -1.0),
        ];

        let path = write_payload(&dir, &payload(VisualizationStyle::Network, &records)).unwrap();
        assert_eq!(path, dir.join("network-visualization.json"));

        let path = write_payload(&dir, &payload(VisualizationStyle::Network, &records[..1])).unwrap();
        let written: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["style"], "network");
        assert_eq!(written["nodes"].as_array().map(Vec::len), Some(1));

        fs::remove_dir_all(&dir).unwrap();
    }
}
