//! Ordered set of learning objects loaded for one session.

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::domain::LearningObject;
use crate::error::{Result, XueError};

use super::container;

/// File extension of learning-object containers
pub const CONTAINER_EXTENSION: &str = "xue";

/// The learning objects available to a session, in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    items: Vec<LearningObject>,
}

impl Collection {
    pub fn new(items: Vec<LearningObject>) -> Self {
        Self { items }
    }

    /// Load every `.xue` container in `dir`, sorted by file name.
    ///
    /// Containers that fail to load are skipped with a warning.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(XueError::NotFound(dir.to_path_buf()));
        }

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == CONTAINER_EXTENSION))
            .collect();
        paths.sort();

        let mut items = Vec::with_capacity(paths.len());
        for path in paths {
            match container::load(&path) {
                Ok(object) => items.push(object),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        info!("Loaded {} learning object(s) from {}", items.len(), dir.display());
        Ok(Self { items })
    }

    /// Keep only user-flagged items
    pub fn flagged_only(self) -> Self {
        Self {
            items: self.items.into_iter().filter(|o| o.flagged).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[LearningObject] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&LearningObject> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut LearningObject> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LearningObject> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<LearningObject> {
        self.items
    }
}

impl From<Vec<LearningObject>> for Collection {
    fn from(items: Vec<LearningObject>) -> Self {
        Self::new(items)
    }
}
