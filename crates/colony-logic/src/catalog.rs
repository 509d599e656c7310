//! Building and furniture catalogs.
//!
//! Each entry maps a stable identifier to a resource cost and the tile the
//! finished structure writes into the grid.

use crate::tiles::{ResourceType, TileKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource amounts keyed by type. Ordered so payment is deterministic.
pub type Cost = BTreeMap<ResourceType, u32>;

/// Build a [`Cost`] from `(resource, amount)` pairs. Zero amounts are dropped.
pub fn cost(items: &[(ResourceType, u32)]) -> Cost {
    let mut map = Cost::new();
    for &(resource, amount) in items {
        if amount > 0 {
            *map.entry(resource).or_insert(0) += amount;
        }
    }
    map
}

/// Structural buildings placed on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    Wall,
    Floor,
    Door,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 3] = [BuildingKind::Wall, BuildingKind::Floor, BuildingKind::Door];

    pub fn name(&self) -> &'static str {
        match self {
            BuildingKind::Wall => "wall",
            BuildingKind::Floor => "floor",
            BuildingKind::Door => "door",
        }
    }

    pub fn from_name(name: &str) -> Option<BuildingKind> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }

    pub fn cost(&self) -> Cost {
        match self {
            BuildingKind::Wall => cost(&[(ResourceType::Wood, 1)]),
            BuildingKind::Floor => cost(&[(ResourceType::Stone, 1)]),
            BuildingKind::Door => cost(&[(ResourceType::Wood, 2)]),
        }
    }

    pub fn tile(&self) -> TileKind {
        match self {
            BuildingKind::Wall => TileKind::Wall,
            BuildingKind::Floor => TileKind::Floor,
            BuildingKind::Door => TileKind::Door,
        }
    }
}

/// Furniture pieces. Some double as storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FurnitureKind {
    Bed,
    Table,
    Chest,
}

impl FurnitureKind {
    pub const ALL: [FurnitureKind; 3] = [FurnitureKind::Bed, FurnitureKind::Table, FurnitureKind::Chest];

    pub fn name(&self) -> &'static str {
        match self {
            FurnitureKind::Bed => "bed",
            FurnitureKind::Table => "table",
            FurnitureKind::Chest => "chest",
        }
    }

    pub fn from_name(name: &str) -> Option<FurnitureKind> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    pub fn cost(&self) -> Cost {
        match self {
            FurnitureKind::Bed => cost(&[(ResourceType::Wood, 3)]),
            FurnitureKind::Table => cost(&[(ResourceType::Wood, 2)]),
            FurnitureKind::Chest => cost(&[(ResourceType::Wood, 2), (ResourceType::Stone, 1)]),
        }
    }

    pub fn tile(&self) -> TileKind {
        match self {
            FurnitureKind::Bed => TileKind::Bed,
            FurnitureKind::Table => TileKind::Table,
            FurnitureKind::Chest => TileKind::Chest,
        }
    }

    pub fn is_storage(&self) -> bool {
        self.tile().is_storage()
    }
}
