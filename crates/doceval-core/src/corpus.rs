//! Prompt and document corpora loaded from directories.
//!
//! Identifiers are file stems. Iteration order is file-name order, which is what
//! "first encountered" means for role correlation.

use crate::errors::CorpusError;
use crate::model::{DocumentUnit, PromptRole, PromptUnit};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];

#[derive(Debug, Clone, Default)]
pub struct PromptCorpus {
    units: Vec<PromptUnit>,
}

impl PromptCorpus {
    pub fn new(units: Vec<PromptUnit>) -> Self {
        Self { units }
    }

    pub fn load_dir(dir: &Path) -> Result<Self, CorpusError> {
        let mut units = Vec::new();
        let mut seen = HashSet::new();
        for (id, path) in text_files(dir)? {
            if !seen.insert(id.clone()) {
                return Err(CorpusError::DuplicateId {
                    kind: "prompt",
                    id,
                    path,
                });
            }
            let content = read_text(&path)?;
            units.push(PromptUnit::from_id(id, content));
        }
        tracing::debug!(dir = %dir.display(), count = units.len(), "loaded prompts");
        Ok(Self { units })
    }

    /// Keeps active prompts whose base name contains `needle`; correlatable
    /// fragments (system/assistant) are always kept.
    pub fn filtered(mut self, needle: Option<&str>) -> Self {
        if let Some(needle) = needle {
            self.units
                .retain(|u| !u.role.is_active() || u.base_name.contains(needle));
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromptUnit> {
        self.units.iter()
    }

    pub fn get(&self, id: &str) -> Option<&PromptUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Prompts that start a test case (user and legacy), in corpus order.
    pub fn active(&self) -> impl Iterator<Item = &PromptUnit> {
        self.units.iter().filter(|u| u.role.is_active())
    }

    pub fn count_role(&self, role: PromptRole) -> usize {
        self.units.iter().filter(|u| u.role == role).count()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentCorpus {
    docs: Vec<DocumentUnit>,
}

impl DocumentCorpus {
    pub fn new(docs: Vec<DocumentUnit>) -> Self {
        Self { docs }
    }

    pub fn load_dir(dir: &Path) -> Result<Self, CorpusError> {
        let mut docs = Vec::new();
        let mut seen = HashSet::new();
        for (id, path) in text_files(dir)? {
            if !seen.insert(id.clone()) {
                return Err(CorpusError::DuplicateId {
                    kind: "document",
                    id,
                    path,
                });
            }
            let content = read_text(&path)?;
            docs.push(DocumentUnit { id, content });
        }
        tracing::debug!(dir = %dir.display(), count = docs.len(), "loaded documents");
        Ok(Self { docs })
    }

    pub fn filtered(mut self, needle: Option<&str>) -> Self {
        if let Some(needle) = needle {
            self.docs.retain(|d| d.id.contains(needle));
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentUnit> {
        self.docs.iter()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

fn text_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, CorpusError> {
    if !dir.is_dir() {
        return Err(CorpusError::MissingDir(dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(dir).map_err(|source| CorpusError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CorpusError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| TEXT_EXTENSIONS.contains(&e));
        if !is_text {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push((stem.to_string(), path.clone()));
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn read_text(path: &Path) -> Result<String, CorpusError> {
    std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })
}
