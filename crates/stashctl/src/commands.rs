//! CLI command implementations

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use stash::TieredStorage;

/// Read the whole of stdin as the value to store.
pub fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read value from stdin")?;
    Ok(input)
}

/// Store `input` under `segments`.
///
/// Unless `raw`, the input must be JSON; it is re-encoded compact or
/// pretty so the stored text is normalized.
pub fn save(
    storage: &TieredStorage,
    segments: &[String],
    input: &str,
    pretty: bool,
    raw: bool,
) -> Result<PathBuf> {
    if raw {
        return Ok(storage.save_text(segments, input)?);
    }

    let value: serde_json::Value =
        serde_json::from_str(input).context("Value is not valid JSON (use --raw to store text as-is)")?;
    Ok(storage.save(segments, &value, pretty)?)
}

pub fn get(storage: &TieredStorage, segments: &[String]) -> Result<Option<String>> {
    Ok(storage.get(segments)?)
}
