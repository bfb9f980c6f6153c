use super::ids::ItemId;
use serde::{Deserialize, Serialize};

/// A stack of one item type lying in a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: ItemId,
    pub def_name: String,
    pub count: u32,
    /// Forbidden stacks are never hauled by agents.
    #[serde(default)]
    pub forbidden: bool,
}

impl ItemStack {
    pub fn new(def_name: impl Into<String>, count: u32) -> Self {
        Self {
            id: ItemId::new_v4(),
            def_name: def_name.into(),
            count,
            forbidden: false,
        }
    }

    pub fn matches_any(&self, defs: &[String]) -> bool {
        defs.iter().any(|d| *d == self.def_name)
    }
}
