//! Resource ledger - item stacks on the ground and in storage.
//!
//! Storage cells hold at most one stack each and never mix resource types.
//! Empty stacks are pruned as soon as they reach zero. Payment is all or
//! nothing: affordability is checked for the whole cost before any stack is
//! touched.

use colony_logic::catalog::Cost;
use colony_logic::pathfinding::manhattan;
use colony_logic::{Cell, Grid, ResourceType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StackId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackLocation {
    Ground,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: StackId,
    pub resource: ResourceType,
    pub amount: u32,
    pub location: StackLocation,
    pub cell: Cell,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("need {required} {}, only {available} stored", .resource.name())]
    Insufficient {
        resource: ResourceType,
        required: u32,
        available: u32,
    },
    #[error("storage at {cell:?} already holds {}", .held.name())]
    Incompatible { cell: Cell, held: ResourceType },
    #[error("nothing to deposit at {cell:?}")]
    Empty { cell: Cell },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceLedger {
    stacks: Vec<ItemStack>,
    next_id: u64,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> StackId {
        let id = StackId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }

    pub fn stack(&self, id: StackId) -> Option<&ItemStack> {
        self.stacks.iter().find(|s| s.id == id)
    }

    pub fn ground_stacks(&self) -> impl Iterator<Item = &ItemStack> {
        self.stacks.iter().filter(|s| s.location == StackLocation::Ground)
    }

    pub fn storage_stacks(&self) -> impl Iterator<Item = &ItemStack> {
        self.stacks.iter().filter(|s| s.location == StackLocation::Storage)
    }

    pub fn storage_stack_at(&self, cell: Cell) -> Option<&ItemStack> {
        self.storage_stacks().find(|s| s.cell == cell)
    }

    /// First ground stack lying on `cell`.
    pub fn ground_stack_at(&self, cell: Cell) -> Option<&ItemStack> {
        self.ground_stacks().find(|s| s.cell == cell)
    }

    /// Put a new stack on the ground. Zero amounts are ignored.
    pub fn drop_on_ground(&mut self, cell: Cell, resource: ResourceType, amount: u32) -> Option<StackId> {
        if amount == 0 {
            return None;
        }
        let id = self.alloc_id();
        self.stacks.push(ItemStack {
            id,
            resource,
            amount,
            location: StackLocation::Ground,
            cell,
        });
        Some(id)
    }

    /// Merge `amount` into the storage stack at `cell`, creating it if absent.
    /// The caller is responsible for `cell` being a storage tile. A zero
    /// amount is rejected so no empty stack can claim the cell.
    pub fn deposit(&mut self, cell: Cell, resource: ResourceType, amount: u32) -> Result<StackId, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::Empty { cell });
        }
        if let Some(stack) = self
            .stacks
            .iter_mut()
            .find(|s| s.location == StackLocation::Storage && s.cell == cell)
        {
            if stack.resource != resource {
                return Err(LedgerError::Incompatible {
                    cell,
                    held: stack.resource,
                });
            }
            stack.amount += amount;
            return Ok(stack.id);
        }
        let id = self.alloc_id();
        self.stacks.push(ItemStack {
            id,
            resource,
            amount,
            location: StackLocation::Storage,
            cell,
        });
        Ok(id)
    }

    /// Remove a ground stack and hand back its contents.
    pub fn take_ground(&mut self, id: StackId) -> Option<(ResourceType, u32)> {
        let idx = self
            .stacks
            .iter()
            .position(|s| s.id == id && s.location == StackLocation::Ground)?;
        let stack = self.stacks.remove(idx);
        Some((stack.resource, stack.amount))
    }

    /// Turn the storage stack at `cell` into a ground stack, e.g. when its
    /// container is demolished.
    pub fn demote_storage(&mut self, cell: Cell) -> Option<StackId> {
        let stack = self
            .stacks
            .iter_mut()
            .find(|s| s.location == StackLocation::Storage && s.cell == cell)?;
        stack.location = StackLocation::Ground;
        Some(stack.id)
    }

    pub fn stored_total(&self, resource: ResourceType) -> u32 {
        self.storage_stacks()
            .filter(|s| s.resource == resource)
            .map(|s| s.amount)
            .sum()
    }

    pub fn ground_total(&self, resource: ResourceType) -> u32 {
        self.ground_stacks()
            .filter(|s| s.resource == resource)
            .map(|s| s.amount)
            .sum()
    }

    /// Each resource type in `cost` is checked against storage independently.
    pub fn can_afford(&self, cost: &Cost) -> bool {
        self.first_shortfall(cost).is_none()
    }

    fn first_shortfall(&self, cost: &Cost) -> Option<LedgerError> {
        cost.iter().find_map(|(&resource, &required)| {
            let available = self.stored_total(resource);
            (available < required).then_some(LedgerError::Insufficient {
                resource,
                required,
                available,
            })
        })
    }

    /// Deduct `cost` from storage stacks, oldest stacks first.
    pub fn pay(&mut self, cost: &Cost) -> Result<(), LedgerError> {
        if let Some(err) = self.first_shortfall(cost) {
            return Err(err);
        }
        for (&resource, &required) in cost {
            let mut remaining = required;
            for stack in self
                .stacks
                .iter_mut()
                .filter(|s| s.location == StackLocation::Storage && s.resource == resource)
            {
                if remaining == 0 {
                    break;
                }
                let taken = stack.amount.min(remaining);
                stack.amount -= taken;
                remaining -= taken;
            }
        }
        self.prune();
        Ok(())
    }

    /// Nearest storage cell that can take `resource`.
    ///
    /// Cells already holding the same resource win over empty cells; cells
    /// holding another resource are never returned.
    pub fn find_available_storage(&self, grid: &Grid, resource: ResourceType, near: Cell) -> Option<Cell> {
        let mut same: Option<Cell> = None;
        let mut empty: Option<Cell> = None;
        for cell in grid.storage_cells() {
            let slot = match self.storage_stack_at(cell) {
                Some(stack) if stack.resource == resource => &mut same,
                Some(_) => continue,
                None => &mut empty,
            };
            if slot.map_or(true, |best| manhattan(cell, near) < manhattan(best, near)) {
                *slot = Some(cell);
            }
        }
        same.or(empty)
    }

    fn prune(&mut self) {
        self.stacks.retain(|s| s.amount > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_logic::catalog::cost;

    fn stocked() -> ResourceLedger {
        let mut ledger = ResourceLedger::new();
        ledger.deposit((0, 0), ResourceType::Wood, 3).unwrap();
        ledger.deposit((1, 0), ResourceType::Wood, 2).unwrap();
        ledger.deposit((2, 0), ResourceType::Stone, 1).unwrap();
        ledger
    }

    #[test]
    fn test_deposit_merges_same_type() {
        let mut ledger = ResourceLedger::new();
        let a = ledger.deposit((0, 0), ResourceType::Wood, 1).unwrap();
        let b = ledger.deposit((0, 0), ResourceType::Wood, 4).unwrap();
        assert_eq!(a, b);
        assert_eq!(ledger.storage_stack_at((0, 0)).unwrap().amount, 5);
        assert_eq!(
            ledger.deposit((0, 0), ResourceType::Stone, 1),
            Err(LedgerError::Incompatible {
                cell: (0, 0),
                held: ResourceType::Wood
            })
        );
    }

    #[test]
    fn test_zero_deposit_leaves_cell_free() {
        let grid = Grid::parse(&["S...."]).unwrap();
        let mut ledger = ResourceLedger::new();
        assert_eq!(
            ledger.deposit((0, 0), ResourceType::Wood, 0),
            Err(LedgerError::Empty { cell: (0, 0) })
        );
        assert!(ledger.stacks().is_empty());
        assert_eq!(ledger.find_available_storage(&grid, ResourceType::Stone, (4, 0)), Some((0, 0)));

        ledger.deposit((0, 0), ResourceType::Wood, 2).unwrap();
        assert!(ledger.deposit((0, 0), ResourceType::Wood, 0).is_err());
        assert_eq!(ledger.storage_stack_at((0, 0)).unwrap().amount, 2);
    }

    #[test]
    fn test_can_afford_per_type() {
        let ledger = stocked();
        assert!(ledger.can_afford(&cost(&[(ResourceType::Wood, 5), (ResourceType::Stone, 1)])));
        assert!(!ledger.can_afford(&cost(&[(ResourceType::Wood, 5), (ResourceType::Stone, 2)])));
        assert!(ledger.can_afford(&Cost::new()));
    }

    #[test]
    fn test_pay_drains_whole_then_partial() {
        let mut ledger = stocked();
        ledger.pay(&cost(&[(ResourceType::Wood, 4)])).unwrap();
        assert_eq!(ledger.stored_total(ResourceType::Wood), 1);
        // The first stack was emptied and pruned.
        assert!(ledger.storage_stack_at((0, 0)).is_none());
        assert_eq!(ledger.storage_stack_at((1, 0)).unwrap().amount, 1);
    }

    #[test]
    fn test_rejected_pay_changes_nothing() {
        let mut ledger = stocked();
        let before = ledger.stacks().to_vec();
        let err = ledger
            .pay(&cost(&[(ResourceType::Wood, 2), (ResourceType::Stone, 9)]))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::Insufficient {
                resource: ResourceType::Stone,
                required: 9,
                available: 1
            }
        );
        assert_eq!(ledger.stacks(), before.as_slice());
    }

    #[test]
    fn test_ground_stacks_are_not_spendable() {
        let mut ledger = ResourceLedger::new();
        ledger.drop_on_ground((4, 4), ResourceType::Wood, 10);
        assert_eq!(ledger.ground_total(ResourceType::Wood), 10);
        assert!(!ledger.can_afford(&cost(&[(ResourceType::Wood, 1)])));
    }

    #[test]
    fn test_take_ground() {
        let mut ledger = ResourceLedger::new();
        let id = ledger.drop_on_ground((4, 4), ResourceType::Stone, 2).unwrap();
        assert_eq!(ledger.take_ground(id), Some((ResourceType::Stone, 2)));
        assert_eq!(ledger.take_ground(id), None);
        assert_eq!(ledger.drop_on_ground((4, 4), ResourceType::Stone, 0), None);
    }

    #[test]
    fn test_find_storage_prefers_same_type_then_empty() {
        let grid = Grid::parse(&["S.S...S"]).unwrap();
        let mut ledger = ResourceLedger::new();
        ledger.deposit((6, 0), ResourceType::Wood, 1).unwrap();
        ledger.deposit((2, 0), ResourceType::Stone, 1).unwrap();

        // Same-type stack wins even though an empty cell is closer.
        assert_eq!(
            ledger.find_available_storage(&grid, ResourceType::Wood, (1, 0)),
            Some((6, 0))
        );
        // Stone goes onto its own stack.
        assert_eq!(
            ledger.find_available_storage(&grid, ResourceType::Stone, (6, 0)),
            Some((2, 0))
        );
        ledger.deposit((0, 0), ResourceType::Stone, 1).unwrap();
        ledger.pay(&cost(&[(ResourceType::Wood, 1)])).unwrap();
        // (6,0) is empty again and (0,0)/(2,0) hold stone.
        assert_eq!(
            ledger.find_available_storage(&grid, ResourceType::Wood, (0, 0)),
            Some((6, 0))
        );
    }

    #[test]
    fn test_no_storage_for_mismatched_type() {
        let grid = Grid::parse(&["S.."]).unwrap();
        let mut ledger = ResourceLedger::new();
        ledger.deposit((0, 0), ResourceType::Stone, 1).unwrap();
        assert_eq!(ledger.find_available_storage(&grid, ResourceType::Wood, (1, 0)), None);
    }

    #[test]
    fn test_demote_storage() {
        let mut ledger = ResourceLedger::new();
        let id = ledger.deposit((3, 3), ResourceType::Wood, 2).unwrap();
        assert_eq!(ledger.demote_storage((3, 3)), Some(id));
        assert_eq!(ledger.stored_total(ResourceType::Wood), 0);
        assert_eq!(ledger.ground_stack_at((3, 3)).unwrap().amount, 2);
    }
}
