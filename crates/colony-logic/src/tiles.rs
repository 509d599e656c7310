//! Tile kinds and their static metadata.
//!
//! Every cell of the grid carries exactly one [`TileKind`]. Behavior that
//! depends on the kind (can colonists walk here, can it be gathered, does it
//! enclose a room) is answered by [`TileKind::info`], an exhaustive match, so
//! the lookup is total by construction.

use serde::{Deserialize, Serialize};

/// Resource types that can be gathered, carried and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Wood,
    Stone,
}

impl ResourceType {
    pub const ALL: [ResourceType; 2] = [ResourceType::Wood, ResourceType::Stone];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Wood => "wood",
            ResourceType::Stone => "stone",
        }
    }
}

/// What a gatherable tile yields when its gather task completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherYield {
    pub resource: ResourceType,
    pub amount: u32,
    /// Tile written in place of the gathered one.
    pub depleted: TileKind,
}

/// Static metadata for a tile kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileInfo {
    pub walkable: bool,
    pub buildable: bool,
    pub demolishable: bool,
    /// Holds item stacks (stockpile zones and storage furniture).
    pub storage: bool,
    /// Acts as a room boundary during region detection.
    pub encloses: bool,
    pub gather: Option<GatherYield>,
}

impl TileInfo {
    const fn open() -> Self {
        Self {
            walkable: true,
            buildable: true,
            demolishable: false,
            storage: false,
            encloses: false,
            gather: None,
        }
    }

    const fn solid() -> Self {
        Self {
            walkable: false,
            buildable: false,
            demolishable: false,
            storage: false,
            encloses: false,
            gather: None,
        }
    }
}

/// Terrain and structure kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Grass,
    Tree,
    Rock,
    Wall,
    Floor,
    Stockpile,
    Stump,
    Rubble,
    Door,
    Construction,
    Bed,
    Table,
    Chest,
}

impl TileKind {
    pub const ALL: [TileKind; 13] = [
        TileKind::Grass,
        TileKind::Tree,
        TileKind::Rock,
        TileKind::Wall,
        TileKind::Floor,
        TileKind::Stockpile,
        TileKind::Stump,
        TileKind::Rubble,
        TileKind::Door,
        TileKind::Construction,
        TileKind::Bed,
        TileKind::Table,
        TileKind::Chest,
    ];

    pub fn info(&self) -> TileInfo {
        match self {
            TileKind::Grass | TileKind::Stump | TileKind::Rubble => TileInfo::open(),
            TileKind::Tree => TileInfo {
                gather: Some(GatherYield {
                    resource: ResourceType::Wood,
                    amount: 1,
                    depleted: TileKind::Stump,
                }),
                ..TileInfo::solid()
            },
            TileKind::Rock => TileInfo {
                gather: Some(GatherYield {
                    resource: ResourceType::Stone,
                    amount: 1,
                    depleted: TileKind::Rubble,
                }),
                ..TileInfo::solid()
            },
            TileKind::Wall => TileInfo {
                demolishable: true,
                encloses: true,
                ..TileInfo::solid()
            },
            TileKind::Floor => TileInfo {
                demolishable: true,
                ..TileInfo::open()
            },
            TileKind::Stockpile => TileInfo {
                buildable: false,
                storage: true,
                ..TileInfo::open()
            },
            TileKind::Door => TileInfo {
                buildable: false,
                demolishable: true,
                encloses: true,
                ..TileInfo::open()
            },
            TileKind::Construction => TileInfo::solid(),
            TileKind::Bed | TileKind::Table => TileInfo {
                demolishable: true,
                ..TileInfo::solid()
            },
            TileKind::Chest => TileInfo {
                demolishable: true,
                storage: true,
                ..TileInfo::solid()
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TileKind::Grass => "grass",
            TileKind::Tree => "tree",
            TileKind::Rock => "rock",
            TileKind::Wall => "wall",
            TileKind::Floor => "floor",
            TileKind::Stockpile => "stockpile",
            TileKind::Stump => "stump",
            TileKind::Rubble => "rubble",
            TileKind::Door => "door",
            TileKind::Construction => "construction",
            TileKind::Bed => "bed",
            TileKind::Table => "table",
            TileKind::Chest => "chest",
        }
    }

    /// Resolve a stable identifier. Unknown names fall back to [`TileKind::Grass`].
    pub fn from_name(name: &str) -> TileKind {
        TileKind::ALL
            .iter()
            .copied()
            .find(|t| t.name() == name)
            .unwrap_or_default()
    }

    /// Single-character glyph used by [`crate::Grid::parse`] and debug dumps.
    pub fn glyph(&self) -> char {
        match self {
            TileKind::Grass => '.',
            TileKind::Tree => 'T',
            TileKind::Rock => 'R',
            TileKind::Wall => '#',
            TileKind::Floor => '_',
            TileKind::Stockpile => 'S',
            TileKind::Stump => ',',
            TileKind::Rubble => ':',
            TileKind::Door => 'D',
            TileKind::Construction => '+',
            TileKind::Bed => 'B',
            TileKind::Table => 'A',
            TileKind::Chest => 'C',
        }
    }

    pub fn from_glyph(glyph: char) -> TileKind {
        TileKind::ALL
            .iter()
            .copied()
            .find(|t| t.glyph() == glyph)
            .unwrap_or_default()
    }

    pub fn is_walkable(&self) -> bool {
        self.info().walkable
    }

    pub fn is_storage(&self) -> bool {
        self.info().storage
    }

    pub fn encloses(&self) -> bool {
        self.info().encloses
    }
}
