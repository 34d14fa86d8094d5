use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Deserialize a JSON file into type `T`.
pub(crate) async fn deserialize<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = read(path).await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        name: String,
    }

    #[tokio::test]
    async fn test_read_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.txt");
        let err = read(&path).await.unwrap_err();
        assert!(format!("{err}").contains("nope.txt"));
    }

    #[tokio::test]
    async fn test_deserialize() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("thing.json");
        std::fs::write(&path, r#"{"name": "x"}"#).unwrap();
        let thing: Thing = deserialize(&path).await.unwrap();
        assert_eq!(thing.name, "x");
    }

    #[tokio::test]
    async fn test_deserialize_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("thing.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = deserialize::<Thing>(&path).await.unwrap_err();
        assert!(format!("{err}").contains("Failed to parse JSON file"));
    }
}
