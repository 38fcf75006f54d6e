use opentrack_game::{Count, ItemId, Mode, PrizeId, Requirement, SequenceBreakId};
use serde::{Deserialize, Serialize};
use strum::EnumCount;

/// Reachability confidence for a node or requirement. Totally ordered;
/// combining alternative paths takes the join (maximum), combining
/// conjunctive conditions takes the minimum.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AccessibilityLevel {
    None,
    Inspect,
    SequenceBreak,
    Normal,
}

impl AccessibilityLevel {
    pub fn join(self, other: AccessibilityLevel) -> AccessibilityLevel {
        self.max(other)
    }
}

impl Default for AccessibilityLevel {
    fn default() -> Self {
        AccessibilityLevel::None
    }
}

/// All external state a requirement can read: item and prize counts,
/// sequence-break toggles, the session mode, and the tower crystal
/// requirement. One instance per play session; mutation goes through the
/// tracker so dependent nodes are always recomputed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerState {
    pub items: Vec<Count>,
    pub prizes: Vec<Count>,
    pub sequence_breaks: Vec<bool>,
    pub mode: Mode,
    pub tower_crystal_requirement: Count,
    pub crystal_requirement_known: bool,
}

impl Default for TrackerState {
    fn default() -> Self {
        TrackerState {
            items: vec![0; ItemId::COUNT],
            prizes: vec![0; PrizeId::COUNT],
            // Toggles start disabled: an unconfigured session reports trick
            // paths as SequenceBreak, never Normal.
            sequence_breaks: vec![false; SequenceBreakId::COUNT],
            mode: Mode::default(),
            tower_crystal_requirement: 7,
            crystal_requirement_known: false,
        }
    }
}

impl TrackerState {
    pub fn item_count(&self, item: ItemId) -> Count {
        self.items[item as usize]
    }

    pub fn prize_count(&self, prize: PrizeId) -> Count {
        self.prizes[prize as usize]
    }

    pub fn sequence_break_enabled(&self, break_id: SequenceBreakId) -> bool {
        self.sequence_breaks[break_id as usize]
    }

    pub fn collect_item(&mut self, item: ItemId) {
        self.items[item as usize] += 1;
    }
}

/// Evaluates a requirement against external state. Pure and total: never
/// fails, and increasing any count or enabling any toggle never decreases
/// the result.
pub fn evaluate_requirement(req: &Requirement, state: &TrackerState) -> AccessibilityLevel {
    match req {
        Requirement::Free => AccessibilityLevel::Normal,
        Requirement::Never => AccessibilityLevel::None,
        Requirement::Inspect => AccessibilityLevel::Inspect,
        Requirement::Item { item, count } => {
            if state.item_count(*item) >= *count {
                AccessibilityLevel::Normal
            } else {
                AccessibilityLevel::None
            }
        }
        Requirement::Prize { prize, count } => {
            if state.prize_count(*prize) >= *count {
                AccessibilityLevel::Normal
            } else {
                AccessibilityLevel::None
            }
        }
        Requirement::TowerCrystals => {
            let collected =
                state.prize_count(PrizeId::Crystal) + state.prize_count(PrizeId::RedCrystal);
            if collected < state.tower_crystal_requirement {
                AccessibilityLevel::None
            } else if state.crystal_requirement_known {
                AccessibilityLevel::Normal
            } else {
                // Enough crystals for the assumed requirement, but the
                // exact count has not been confirmed in-game.
                AccessibilityLevel::SequenceBreak
            }
        }
        Requirement::WorldState(world_state) => {
            mode_level(state.mode.world_state == *world_state)
        }
        Requirement::EntranceShuffle(shuffle) => {
            mode_level(state.mode.entrance_shuffle == *shuffle)
        }
        Requirement::ItemPlacement(placement) => {
            mode_level(state.mode.item_placement == *placement)
        }
        Requirement::SequenceBreakGated {
            break_id,
            condition,
        } => {
            let inner = evaluate_requirement(condition, state);
            if inner == AccessibilityLevel::None {
                AccessibilityLevel::None
            } else if state.sequence_break_enabled(*break_id) {
                inner
            } else {
                inner.min(AccessibilityLevel::SequenceBreak)
            }
        }
        Requirement::All(sub_reqs) => {
            let mut level = AccessibilityLevel::Normal;
            for sub_req in sub_reqs {
                level = level.min(evaluate_requirement(sub_req, state));
                if level == AccessibilityLevel::None {
                    break;
                }
            }
            level
        }
        Requirement::Any(sub_reqs) => {
            let mut level = AccessibilityLevel::None;
            for sub_req in sub_reqs {
                level = level.join(evaluate_requirement(sub_req, state));
                if level == AccessibilityLevel::Normal {
                    break;
                }
            }
            level
        }
    }
}

fn mode_level(matches: bool) -> AccessibilityLevel {
    if matches {
        AccessibilityLevel::Normal
    } else {
        AccessibilityLevel::None
    }
}
