//! Accessibility evaluation over the (possibly cyclic) node graph. Each
//! top-level query threads a call-scoped visited set through the recursion:
//! re-entering a node already on the evaluation stack contributes None for
//! that call only, which bounds the recursion depth by the node count.

use opentrack_game::{Connection, Count, EntranceCategory, GameData, NodeId};
use opentrack_logic::{evaluate_requirement, AccessibilityLevel, TrackerState};

/// Per-node bookkeeping set by external entrance-randomization logic: how
/// many shuffled exits of each category currently land in this node. A
/// nonzero counter contributes Normal while its category is active.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExitCounters {
    pub exits_accessible: Count,
    pub dungeon_exits_accessible: Count,
    pub insanity_exits_accessible: Count,
}

/// Nodes currently on the evaluation stack. Scoped to one top-level query,
/// never persisted across queries.
pub struct VisitedSet {
    in_progress: Vec<bool>,
}

impl VisitedSet {
    pub fn new(num_nodes: usize) -> Self {
        VisitedSet {
            in_progress: vec![false; num_nodes],
        }
    }

    /// Returns false if the node is already being evaluated (a cycle has
    /// been re-entered).
    fn enter(&mut self, node: NodeId) -> bool {
        if self.in_progress[node] {
            false
        } else {
            self.in_progress[node] = true;
            true
        }
    }

    fn leave(&mut self, node: NodeId) {
        self.in_progress[node] = false;
    }
}

/// A single inbound edge's contribution to its target: None if the edge's
/// entrance category is inactive this session, otherwise the weaker of the
/// source node's accessibility and the edge's own requirement.
fn connection_contribution(
    conn: &Connection,
    game_data: &GameData,
    state: &TrackerState,
    exit_counters: &[ExitCounters],
    visited: &mut VisitedSet,
) -> AccessibilityLevel {
    if !conn.category.is_active(state.mode.entrance_shuffle) {
        return AccessibilityLevel::None;
    }
    let source_level = node_accessibility(conn.source, game_data, state, exit_counters, visited);
    let requirement_level = evaluate_requirement(&conn.requirement, state);
    source_level.min(requirement_level)
}

/// A node's accessibility: the join over all inbound connection
/// contributions, plus Normal per nonzero exit counter whose category is
/// active, plus Normal for the session origin node.
pub fn node_accessibility(
    node: NodeId,
    game_data: &GameData,
    state: &TrackerState,
    exit_counters: &[ExitCounters],
    visited: &mut VisitedSet,
) -> AccessibilityLevel {
    if !visited.enter(node) {
        return AccessibilityLevel::None;
    }

    let mut level = if game_data.start[node] {
        AccessibilityLevel::Normal
    } else {
        AccessibilityLevel::None
    };

    let shuffle = state.mode.entrance_shuffle;
    let counters = &exit_counters[node];
    let counter_active = (counters.exits_accessible > 0
        && EntranceCategory::All.is_active(shuffle))
        || (counters.dungeon_exits_accessible > 0
            && EntranceCategory::Dungeon.is_active(shuffle))
        || (counters.insanity_exits_accessible > 0
            && EntranceCategory::Insanity.is_active(shuffle));
    if counter_active {
        level = AccessibilityLevel::Normal;
    }

    for conn in &game_data.connections_by_node[node] {
        if level == AccessibilityLevel::Normal {
            break;
        }
        level = level.join(connection_contribution(
            conn,
            game_data,
            state,
            exit_counters,
            visited,
        ));
    }

    visited.leave(node);
    level
}

/// One externally-triggered top-level query, with a fresh visited set.
pub fn evaluate_node(
    node: NodeId,
    game_data: &GameData,
    state: &TrackerState,
    exit_counters: &[ExitCounters],
) -> AccessibilityLevel {
    let mut visited = VisitedSet::new(game_data.num_nodes());
    node_accessibility(node, game_data, state, exit_counters, &mut visited)
}
