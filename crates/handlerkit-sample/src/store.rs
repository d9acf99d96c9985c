//! Cache-backed widget store.
//!
//! The whole inventory lives under a single cache key so the cache's
//! single-key atomicity covers every store operation.

use std::collections::BTreeMap;

use anyhow::Context as _;
use handlerkit::Cache;
use tracing::info;

use crate::models::Widget;

const WIDGETS_KEY: &str = "widgets";

/// Widget inventory backed by the process cache.
#[derive(Debug, Clone)]
pub struct WidgetStore {
    cache: Cache,
}

impl WidgetStore {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Populate the inventory with starter widgets if it is empty.
    pub fn seed(&self) -> handlerkit::Result<()> {
        let mut widgets = self.load()?;
        if !widgets.is_empty() {
            return Ok(());
        }
        for widget in [
            Widget::new("w-1", "sprocket", 4),
            Widget::new("w-2", "flange", 9),
        ] {
            widgets.insert(widget.id.clone(), widget);
        }
        let count = widgets.len();
        self.save(widgets)?;
        info!(count, "seeded widget inventory");
        Ok(())
    }

    pub fn list(&self) -> handlerkit::Result<Vec<Widget>> {
        Ok(self.load()?.into_values().collect())
    }

    pub fn get(&self, id: &str) -> handlerkit::Result<Option<Widget>> {
        Ok(self.load()?.remove(id))
    }

    pub fn insert(&self, widget: Widget) -> handlerkit::Result<()> {
        let mut widgets = self.load()?;
        widgets.insert(widget.id.clone(), widget);
        self.save(widgets)
    }

    pub fn remove(&self, id: &str) -> handlerkit::Result<Option<Widget>> {
        let mut widgets = self.load()?;
        let removed = widgets.remove(id);
        if removed.is_some() {
            self.save(widgets)?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> handlerkit::Result<usize> {
        Ok(self.load()?.len())
    }

    fn load(&self) -> handlerkit::Result<BTreeMap<String, Widget>> {
        match self.cache.get_item(WIDGETS_KEY)? {
            Some(value) => {
                Ok(serde_json::from_value(value).context("widget inventory is corrupt")?)
            }
            None => Ok(BTreeMap::new()),
        }
    }

    fn save(&self, widgets: BTreeMap<String, Widget>) -> handlerkit::Result<()> {
        let value = serde_json::to_value(widgets).context("failed to serialize inventory")?;
        self.cache.set_item(WIDGETS_KEY, value, None)?;
        Ok(())
    }
}
