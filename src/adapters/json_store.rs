use crate::domain::ids::{next_hex_id, CategoryId, PlanogramId, UserId};
use crate::domain::model::{Category, Planogram};
use crate::domain::ports::{CategoryDirectory, PlanogramStore};
use crate::utils::error::{EntityKind, PlanogramError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const PLANOGRAM_DIR: &str = "planograms";
const CATEGORY_DIR: &str = "categories";

/// One JSON document per entity under `base_path`:
/// `planograms/<id>.json` and `categories/<id>.json`.
///
/// Saves go through a temp file and a rename, so a reader sees either the
/// old or the new document, never a partial one.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base_path: PathBuf,
}

fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl JsonFileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn document_path(&self, dir: &str, id: &str) -> Option<PathBuf> {
        // id 直接當檔名用，拒絕任何可能跳出目錄的字元
        if !is_safe_id(id) {
            return None;
        }
        Some(self.base_path.join(dir).join(format!("{}.json", id)))
    }

    async fn read_document<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| PlanogramError::CorruptDocument {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }

    async fn write_document<T: Serialize>(&self, path: &Path, document: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(document)?;
        // 每次寫入各用一個暫存檔，同一文件的並行寫入互不干擾，最後 rename 者勝出
        let tmp_path = path.with_extension(format!("json.{}.tmp", next_hex_id()));
        tokio::fs::write(&tmp_path, &data).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove_document(&self, path: &Path) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl PlanogramStore for JsonFileStore {
    async fn load(&self, id: &PlanogramId) -> Result<Option<Planogram>> {
        let Some(path) = self.document_path(PLANOGRAM_DIR, id.as_str()) else {
            return Ok(None);
        };

        let planogram: Option<Planogram> = self.read_document(&path).await?;
        if let Some(planogram) = &planogram {
            planogram
                .check_invariants()
                .map_err(|message| PlanogramError::CorruptDocument {
                    path: path.display().to_string(),
                    message,
                })?;
        }
        Ok(planogram)
    }

    async fn save(&self, planogram: &Planogram) -> Result<()> {
        let path = self
            .document_path(PLANOGRAM_DIR, planogram.id.as_str())
            .ok_or_else(|| PlanogramError::validation("id", &planogram.id, "unsafe document id"))?;
        planogram
            .check_invariants()
            .map_err(|reason| PlanogramError::validation("planogram", &planogram.id, reason))?;
        self.write_document(&path, planogram).await?;
        tracing::debug!(
            "Saved planogram {} v{} to {}",
            planogram.id,
            planogram.version,
            path.display()
        );
        Ok(())
    }

    async fn delete(&self, id: &PlanogramId) -> Result<bool> {
        match self.document_path(PLANOGRAM_DIR, id.as_str()) {
            Some(path) => self.remove_document(&path).await,
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CategoryDirectory for JsonFileStore {
    async fn get(&self, id: &CategoryId) -> Result<Option<Category>> {
        match self.document_path(CATEGORY_DIR, id.as_str()) {
            Some(path) => self.read_document(&path).await,
            None => Ok(None),
        }
    }

    async fn insert(&self, category: Category) -> Result<()> {
        let path = self
            .document_path(CATEGORY_DIR, category.id.as_str())
            .ok_or_else(|| PlanogramError::validation("id", &category.id, "unsafe document id"))?;
        self.write_document(&path, &category).await
    }

    async fn link_planogram(&self, id: &CategoryId, planogram_id: &PlanogramId) -> Result<()> {
        let mut category = self
            .get(id)
            .await?
            .ok_or_else(|| PlanogramError::not_found(EntityKind::Category, id))?;
        category.planogram_id = Some(planogram_id.clone());
        category.last_modified = Utc::now();
        self.insert(category).await
    }

    async fn remove(&self, id: &CategoryId) -> Result<Option<Category>> {
        let existing = self.get(id).await?;
        if existing.is_some() {
            if let Some(path) = self.document_path(CATEGORY_DIR, id.as_str()) {
                self.remove_document(&path).await?;
            }
        }
        Ok(existing)
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Category>> {
        let dir = self.base_path.join(CATEGORY_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut owned = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(category) = self.read_document::<Category>(&path).await? {
                if category.is_owned_by(owner) {
                    owned.push(category);
                }
            }
        }
        owned.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_path_rejects_traversal() {
        let store = JsonFileStore::new("/tmp/planograms");
        assert!(store.document_path(PLANOGRAM_DIR, "../etc/passwd").is_none());
        assert!(store.document_path(PLANOGRAM_DIR, "").is_none());
        assert!(store.document_path(PLANOGRAM_DIR, "a/b").is_none());
        assert_eq!(
            store.document_path(PLANOGRAM_DIR, "65a1f0c2").unwrap(),
            PathBuf::from("/tmp/planograms/planograms/65a1f0c2.json")
        );
    }
}
