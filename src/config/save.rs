//! Writing the configuration back to disk.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use toml_edit::{Array, DocumentMut, Item, table, value};
use tracing::debug;

use super::Config;
use crate::error::ConfigError;

fn set_opt(doc: &mut DocumentMut, table: &str, key: &str, val: Option<&str>) {
    match val {
        Some(v) => doc[table][key] = value(v),
        None => {
            if let Some(t) = doc.get_mut(table).and_then(Item::as_table_like_mut) {
                t.remove(key);
            }
        }
    }
}

fn as_int<T: TryInto<i64>>(n: T) -> i64 {
    n.try_into().unwrap_or(i64::MAX)
}

const SECTIONS: [&str; 3] = ["ai", "commit", "diff"];

impl Config {
    /// Write the configuration to `path`.
    ///
    /// Comments and keys this tool does not know about are preserved when
    /// the file already exists. The file is replaced atomically.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let mut doc = if path.is_file() {
            let content = std::fs::read_to_string(path).map_err(|source| {
                ConfigError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            content
                .parse::<DocumentMut>()
                .map_err(|source| ConfigError::EditFailed {
                    path: path.to_path_buf(),
                    source,
                })?
        } else {
            DocumentMut::new()
        };

        // Missing sections become `[name]` tables rather than inline tables.
        for name in SECTIONS {
            doc.entry(name).or_insert(table());
        }

        doc["ai"]["model"] = value(self.ai.model.as_str());
        set_opt(&mut doc, "ai", "base_url", self.ai.base_url.as_deref());
        set_opt(&mut doc, "ai", "api_key", self.ai.api_key.as_deref());
        set_opt(
            &mut doc,
            "ai",
            "custom_instructions",
            self.ai.custom_instructions.as_deref(),
        );
        doc["ai"]["timeout_secs"] = value(as_int(self.ai.timeout_secs));

        doc["commit"]["conventional"] = value(self.commit.conventional);
        let types: Array = self.commit.types.iter().map(String::as_str).collect();
        doc["commit"]["types"] = value(types);

        doc["diff"]["show_lines"] = value(as_int(self.diff.show_lines));
        doc["diff"]["skip_lines"] = value(as_int(self.diff.skip_lines));
        doc["diff"]["max_diff_size"] = value(as_int(self.diff.max_diff_size));

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(doc.to_string().as_bytes()).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        debug!(path = %path.display(), "Saved config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_parse_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.ai.api_key = Some("sk-test".to_string());
        config.ai.base_url = Some("http://localhost:11434/v1".to_string());
        config.diff.show_lines = 60;
        config.save(&path).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.trim_start().starts_with("[ai]\n"));
        assert!(saved.contains("\n[commit]\n"));
        assert!(saved.contains("\n[diff]\n"));
        assert!(!saved.contains("ai = {"));
        assert!(saved.contains("api_key = \"sk-test\""));
        assert!(saved.contains("show_lines = 60"));

        let parsed = Config::parse(&path, &saved).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_preserves_comments_and_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "# my settings\n[ai]\nmodel = \"old\" # pinned\napi_key = \"sk-old\"\n\n[ui]\ntheme = \"nord\"\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.ai.model = "new".to_string();
        config.save(&path).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("# my settings\n[ai]\n"));
        assert!(saved.contains("model = \"new\""));
        assert!(saved.contains("theme = \"nord\""));
        // New sections are appended as standard tables after existing ones.
        let ui = saved.find("[ui]").unwrap();
        let commit = saved.find("\n[commit]\n").unwrap();
        let diff = saved.find("\n[diff]\n").unwrap();
        assert!(ui < commit && commit < diff);
        assert!(!saved.contains("commit = {"));
        // Unset values are removed rather than written empty.
        assert!(!saved.contains("api_key"));
    }

    #[test]
    fn test_save_rejects_corrupt_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ai\n").unwrap();

        let err = Config::default().save(&path).unwrap_err();
        assert!(matches!(err, ConfigError::EditFailed { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[ai\n");
    }
}
