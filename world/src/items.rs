//! Registry of items lying on the ground.

use std::collections::BTreeMap;

use warden_core::{ItemId, ItemKind, Point};
use warden_navigation::SpatialIndex;

/// Immutable representation of an item lying on the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundItem {
    /// Identifier allocated to the item by the world.
    pub id: ItemId,
    /// Type of the item.
    pub kind: ItemKind,
    /// Ground position of the item.
    pub position: Point,
}

/// Spatial index over every ground item of a single kind.
#[derive(Clone, Debug, Default)]
pub struct KindIndex {
    index: SpatialIndex,
    items: Vec<GroundItem>,
}

impl KindIndex {
    fn build(items: Vec<GroundItem>) -> Self {
        let positions: Vec<Point> = items.iter().map(|item| item.position).collect();
        Self {
            index: SpatialIndex::build(&positions),
            items,
        }
    }

    /// Item of this kind closest to `from`.
    #[must_use]
    pub fn nearest(&self, from: Point) -> Option<GroundItem> {
        self.index
            .nearest(from)
            .and_then(|nearest| self.items.get(nearest.slot).copied())
    }

    /// Number of indexed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Reports whether no item of this kind lies on the ground.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Ground items with a per-kind spatial index refreshed on every change.
#[derive(Clone, Debug, Default)]
pub(crate) struct ItemRegistry {
    items: Vec<GroundItem>,
    indices: BTreeMap<ItemKind, KindIndex>,
    next_id: u32,
}

impl ItemRegistry {
    pub(crate) fn spawn(&mut self, kind: ItemKind, position: Point) -> ItemId {
        let id = ItemId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.items.push(GroundItem { id, kind, position });
        self.rebuild(kind);
        id
    }

    pub(crate) fn remove(&mut self, id: ItemId) -> Option<GroundItem> {
        let position = self.items.iter().position(|item| item.id == id)?;
        let removed = self.items.remove(position);
        self.rebuild(removed.kind);
        Some(removed)
    }

    pub(crate) fn get(&self, id: ItemId) -> Option<GroundItem> {
        self.items.iter().find(|item| item.id == id).copied()
    }

    pub(crate) fn items(&self) -> &[GroundItem] {
        &self.items
    }

    pub(crate) fn kind_index(&self, kind: ItemKind) -> Option<&KindIndex> {
        self.indices.get(&kind).filter(|index| !index.is_empty())
    }

    fn rebuild(&mut self, kind: ItemKind) {
        let of_kind: Vec<GroundItem> = self
            .items
            .iter()
            .filter(|item| item.kind == kind)
            .copied()
            .collect();
        if of_kind.is_empty() {
            let _ = self.indices.remove(&kind);
        } else {
            let _ = self.indices.insert(kind, KindIndex::build(of_kind));
        }
    }
}
