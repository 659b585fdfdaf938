use serde::de::DeserializeOwned;
use std::fs;
use std::path::PathBuf;

/// Load a contract document (draft, slots or payload input) from disk.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let path = existing_file(path)?;
    let contents = fs::read_to_string(&path)
        .map_err(|e| format!("Cannot read contract document '{}': {e}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("'{}' is not a valid contract document: {e}", path.display()).into())
}

fn existing_file(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = PathBuf::from(path);
    let path = if path.is_relative() {
        std::env::current_dir()?.join(path)
    } else {
        path
    };
    if !path.is_file() {
        return Err(format!("No such file: {}", path.display()).into());
    }
    Ok(path)
}
