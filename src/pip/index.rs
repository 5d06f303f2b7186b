//! Ordered level1 table with a read-through cache of level2 detail.

use hashbrown::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

use super::source::{FileSource, RegionSource};
use crate::config::{DetailErrorPolicy, IndexConfig, LoadMode};
use crate::error::{LookupError, Result};
use crate::models::{BoundingBox, Level1Region};

struct Level1Entry {
    id: String,
    bbox: Option<BoundingBox>,
    detail: OnceLock<Arc<Level1Region>>,
}

/// Level1 regions in lookup order.
///
/// The table is fixed at build time. Detail records are memoized per entry;
/// once populated, reads take no lock, so the index can be shared freely
/// between threads.
pub struct RegionIndex {
    source: Box<dyn RegionSource>,
    entries: Vec<Level1Entry>,
    slots: HashMap<String, usize>,
    on_detail_error: DetailErrorPolicy,
}

impl RegionIndex {
    /// Build from the data directory named in `config`.
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        let source =
            FileSource::new(config.data_dir.clone()).with_bbox_file(config.bbox_file.clone());
        Self::build(source, config)
    }

    /// Build from any source.
    ///
    /// With [`LoadMode::Eager`] the detail record of every entry that has a
    /// bounding box is read up front. A failed read aborts the build under
    /// [`DetailErrorPolicy::Propagate`] and is logged under
    /// [`DetailErrorPolicy::Skip`], leaving the entry to be retried lazily.
    pub fn build(source: impl RegionSource + 'static, config: &IndexConfig) -> Result<Self> {
        let table = source.bounding_boxes()?;
        info!("Building region index for {} level1 regions...", table.len());

        let mut entries = Vec::with_capacity(table.len());
        let mut slots = HashMap::with_capacity(table.len());

        for (id, bbox) in table {
            if slots.contains_key(&id) {
                warn!("Duplicate level1 id '{}' in bbox table, keeping first", id);
                continue;
            }
            if bbox.is_none() {
                debug!("Level1 '{}' has no bounding box and will never match", id);
            }
            slots.insert(id.clone(), entries.len());
            entries.push(Level1Entry {
                id,
                bbox,
                detail: OnceLock::new(),
            });
        }

        let index = Self {
            source: Box::new(source),
            entries,
            slots,
            on_detail_error: config.on_detail_error,
        };

        if config.load_mode == LoadMode::Eager {
            // Entries without a box never match, so their detail is never needed.
            for entry in index.entries.iter().filter(|entry| entry.bbox.is_some()) {
                match index.load_entry(entry) {
                    Ok(_) => {}
                    Err(e)
                        if e.is_data_error()
                            && index.on_detail_error == DetailErrorPolicy::Skip =>
                    {
                        warn!("Could not preload level1 '{}': {}", entry.id, e);
                    }
                    Err(e) => return Err(e),
                }
            }
            info!("Preloaded {} level1 detail records", index.cached_len());
        }

        Ok(index)
    }

    /// Level1 ids and boxes in lookup order.
    pub fn list_level1_regions(&self) -> impl Iterator<Item = (&str, Option<&BoundingBox>)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.id.as_str(), entry.bbox.as_ref()))
    }

    /// Full detail for a level1 region, loading it on first use.
    pub fn get_level2_detail(&self, level1_id: &str) -> Result<Arc<Level1Region>> {
        let slot = *self
            .slots
            .get(level1_id)
            .ok_or_else(|| LookupError::not_found(level1_id))?;
        self.load_entry(&self.entries[slot])
    }

    fn load_entry(&self, entry: &Level1Entry) -> Result<Arc<Level1Region>> {
        if let Some(detail) = entry.detail.get() {
            return Ok(Arc::clone(detail));
        }

        let mut region = self.source.load_detail(&entry.id)?;
        if region.bbox.is_none() {
            region.bbox = entry.bbox;
        }
        debug!(
            "Loaded level1 '{}' ({}) with {} level2 regions",
            entry.id,
            region.name,
            region.level2s.len()
        );

        // A concurrent loader may have won; both read the same record.
        let loaded = Arc::new(region);
        Ok(Arc::clone(entry.detail.get_or_init(|| loaded)))
    }

    /// What resolvers built on this index do with unreadable detail records.
    pub fn detail_error_policy(&self) -> DetailErrorPolicy {
        self.on_detail_error
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of detail records currently memoized.
    pub fn cached_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.detail.get().is_some())
            .count()
    }
}
