//! Hauling - keeps loose ground stacks flowing toward storage.

use crate::ledger::{ResourceLedger, StackId};
use crate::tasks::TaskQueue;
use colony_logic::Grid;

/// Queue a pickup for every ground stack that has none yet and has somewhere
/// to go. Stacks with no compatible storage are left for a later tick.
pub fn synthesize_pickup_tasks(grid: &Grid, ledger: &ResourceLedger, tasks: &mut TaskQueue) -> usize {
    let orphans: Vec<StackId> = ledger
        .ground_stacks()
        .filter(|s| !tasks.has_pickup_for(s.id))
        .filter(|s| ledger.find_available_storage(grid, s.resource, s.cell).is_some())
        .map(|s| s.id)
        .collect();

    let mut created = 0;
    for stack in orphans {
        match tasks.create_pickup(ledger, stack) {
            Ok(id) => {
                log::info!("{} created: pick up stack {:?}", id, stack);
                created += 1;
            }
            Err(err) => log::trace!("no pickup for {:?}: {}", stack, err),
        }
    }
    created
}
