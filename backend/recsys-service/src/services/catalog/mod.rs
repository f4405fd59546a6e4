use crate::error::Result;
use crate::models::{ItemId, ItemInfo};
use crate::services::offline::read_rows;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Item display metadata, for human-readable diagnostics only
#[derive(Debug, Default)]
pub struct ItemCatalog {
    items: HashMap<ItemId, ItemInfo>,
}

impl ItemCatalog {
    pub fn new(items: Vec<ItemInfo>) -> Self {
        Self {
            items: items.into_iter().map(|info| (info.item_id, info)).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let catalog = Self::new(read_rows::<ItemInfo>(path)?);
        info!(path = %path.display(), items = catalog.len(), "Items loaded");
        Ok(catalog)
    }

    pub fn describe(&self, item_id: ItemId) -> Option<&ItemInfo> {
        self.items.get(&item_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
