//! Material accounting scoped to a structure's footprint.
//!
//! Only stacks lying inside the occupied rectangle count, so deliveries must
//! be hauled into the structure rather than dropped nearby. The ledger knows
//! nothing about process stages.

use crate::config::MaterialRequirement;
use crate::host::{ItemGrid, MapGrid};
use synthesis_data::{AgentId, Cell, CellRect, MapId};

/// In-bounds cells of the footprint. Lazy and restartable via `Clone`.
pub fn footprint_cells<'a, G: MapGrid + ?Sized>(
    grid: &'a G,
    map: MapId,
    rect: CellRect,
) -> impl Iterator<Item = Cell> + Clone + 'a {
    rect.cells().filter(move |&c| grid.in_bounds(map, c))
}

/// Total count of stacks of `def` inside the footprint.
pub fn count_in_footprint<H: MapGrid + ItemGrid + ?Sized>(
    host: &H,
    map: MapId,
    rect: CellRect,
    def: &str,
) -> u32 {
    footprint_cells(host, map, rect)
        .flat_map(|cell| host.stacks_at(map, cell))
        .filter(|stack| stack.def_name == def)
        .map(|stack| stack.count)
        .sum()
}

/// Total count of stacks matching any of `defs` inside the footprint.
pub fn count_in_footprint_flexible<H: MapGrid + ItemGrid + ?Sized>(
    host: &H,
    map: MapId,
    rect: CellRect,
    defs: &[String],
) -> u32 {
    footprint_cells(host, map, rect)
        .flat_map(|cell| host.stacks_at(map, cell))
        .filter(|stack| stack.matches_any(defs))
        .map(|stack| stack.count)
        .sum()
}

/// Requirements not yet covered by what lies in the footprint, as
/// `(label, missing)` pairs.
pub fn missing_assembly_materials<H: MapGrid + ItemGrid + ?Sized>(
    host: &H,
    map: MapId,
    rect: CellRect,
    requirements: &[MaterialRequirement],
) -> Vec<(String, u32)> {
    requirements
        .iter()
        .filter_map(|req| {
            let have = count_in_footprint_flexible(host, map, rect, &req.defs);
            (have < req.count).then(|| (req.label.clone(), req.count - have))
        })
        .collect()
}

pub fn has_all_assembly_materials_in_footprint<H: MapGrid + ItemGrid + ?Sized>(
    host: &H,
    map: MapId,
    rect: CellRect,
    requirements: &[MaterialRequirement],
) -> bool {
    missing_assembly_materials(host, map, rect, requirements).is_empty()
}

/// Whether `agent` could complete assembly: material already in the
/// footprint plus unforbidden, reachable stacks elsewhere on the map.
pub fn has_all_reachable_assembly_materials<H: MapGrid + ItemGrid + ?Sized>(
    host: &H,
    map: MapId,
    rect: CellRect,
    requirements: &[MaterialRequirement],
    agent: AgentId,
) -> bool {
    let elsewhere: Vec<_> = host
        .stacks_on_map(map)
        .into_iter()
        .filter(|(cell, stack)| {
            !rect.contains(*cell) && !stack.forbidden && host.can_reach(agent, *cell)
        })
        .collect();

    requirements.iter().all(|req| {
        let inside = count_in_footprint_flexible(host, map, rect, &req.defs);
        if inside >= req.count {
            return true;
        }
        let outside: u32 = elsewhere
            .iter()
            .filter(|(_, stack)| stack.matches_any(&req.defs))
            .map(|(_, stack)| stack.count)
            .sum();
        inside.saturating_add(outside) >= req.count
    })
}

/// Removes the required materials from the footprint.
///
/// Returns `true` iff every requirement was met. Stacks removed during a
/// failed attempt stay removed; callers re-check sufficiency first.
pub fn try_consume_assembly_materials<H: MapGrid + ItemGrid + ?Sized>(
    host: &mut H,
    map: MapId,
    rect: CellRect,
    requirements: &[MaterialRequirement],
) -> bool {
    let mut remaining: Vec<u32> = requirements.iter().map(|r| r.count).collect();
    let cells: Vec<Cell> = footprint_cells(&*host, map, rect).collect();

    for cell in cells {
        if remaining.iter().all(|&n| n == 0) {
            break;
        }
        for stack in host.stacks_at(map, cell) {
            let mut left = stack.count;
            for (req, need) in requirements.iter().zip(remaining.iter_mut()) {
                if left == 0 {
                    break;
                }
                if *need == 0 || !stack.matches_any(&req.defs) {
                    continue;
                }
                let taken = host.take_from_stack(stack.id, (*need).min(left));
                *need -= taken.min(*need);
                left = left.saturating_sub(taken);
            }
        }
    }

    let satisfied = remaining.iter().all(|&n| n == 0);
    if !satisfied {
        tracing::warn!(
            ?remaining,
            "Assembly consumption fell short; removed stacks are not restored"
        );
    }
    satisfied
}
