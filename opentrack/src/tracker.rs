//! The reactive layer: cached per-node accessibility kept consistent with
//! external state through synchronous invalidation cascades. Every mutation
//! seeds the nodes whose requirements read the changed key, then runs a
//! worklist to a fixpoint, recomputing each dirty node and enqueueing the
//! successors of any node whose cached value changed.

use hashbrown::{HashMap, HashSet};
use log::info;
use opentrack_game::{
    Count, EntranceShuffle, GameData, ItemId, ItemPlacement, NodeId, PrizeId, SequenceBreakId,
    StateKey, WorldState,
};
use opentrack_logic::{AccessibilityLevel, TrackerState};
use serde::{Deserialize, Serialize};

use crate::graph::{evaluate_node, ExitCounters};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityChange {
    pub node: NodeId,
    pub old: AccessibilityLevel,
    pub new: AccessibilityLevel,
}

pub type ChangeListener = Box<dyn FnMut(&AccessibilityChange)>;

pub struct Tracker {
    game_data: GameData,
    state: TrackerState,
    exit_counters: Vec<ExitCounters>,
    accessibility: Vec<AccessibilityLevel>,
    // Static subscription wiring, built once from the immutable topology:
    // which nodes to recompute when a state key changes, and which nodes
    // are fed by a given node.
    nodes_by_state_key: HashMap<StateKey, Vec<NodeId>>,
    successors: Vec<Vec<NodeId>>,
    listeners: Vec<ChangeListener>,
}

impl Tracker {
    pub fn new(game_data: GameData) -> Self {
        let num_nodes = game_data.num_nodes();
        let mut nodes_by_state_key: HashMap<StateKey, Vec<NodeId>> = HashMap::new();
        let mut successors: Vec<Vec<NodeId>> = vec![vec![]; num_nodes];
        let mut keys: Vec<StateKey> = vec![];
        for node in 0..num_nodes {
            for conn in &game_data.connections_by_node[node] {
                successors[conn.source].push(node);
                keys.clear();
                conn.requirement.dependencies(&mut keys);
                for &key in &keys {
                    nodes_by_state_key.entry(key).or_default().push(node);
                }
            }
        }
        for nodes in nodes_by_state_key.values_mut() {
            nodes.sort_unstable();
            nodes.dedup();
        }
        for nodes in successors.iter_mut() {
            nodes.sort_unstable();
            nodes.dedup();
        }

        let state = TrackerState::default();
        let exit_counters = vec![ExitCounters::default(); num_nodes];
        let accessibility = (0..num_nodes)
            .map(|node| evaluate_node(node, &game_data, &state, &exit_counters))
            .collect();
        Tracker {
            game_data,
            state,
            exit_counters,
            accessibility,
            nodes_by_state_key,
            successors,
            listeners: vec![],
        }
    }

    pub fn game_data(&self) -> &GameData {
        &self.game_data
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn accessibility(&self, node: NodeId) -> AccessibilityLevel {
        self.accessibility[node]
    }

    pub fn exit_counters(&self, node: NodeId) -> ExitCounters {
        self.exit_counters[node]
    }

    pub fn node_id(&self, name: &str) -> anyhow::Result<NodeId> {
        self.game_data.node_id(name)
    }

    /// Registers a listener invoked synchronously, in a deterministic
    /// order, for every accessibility change produced by a mutation.
    pub fn subscribe(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    pub fn set_item_count(&mut self, item: ItemId, count: Count) -> Vec<AccessibilityChange> {
        if self.state.items[item as usize] == count {
            return vec![];
        }
        self.state.items[item as usize] = count;
        self.invalidate_key(StateKey::Item(item))
    }

    pub fn collect_item(&mut self, item: ItemId) -> Vec<AccessibilityChange> {
        self.set_item_count(item, self.state.item_count(item) + 1)
    }

    pub fn set_prize_count(&mut self, prize: PrizeId, count: Count) -> Vec<AccessibilityChange> {
        if self.state.prizes[prize as usize] == count {
            return vec![];
        }
        self.state.prizes[prize as usize] = count;
        self.invalidate_key(StateKey::Prize(prize))
    }

    pub fn set_sequence_break(
        &mut self,
        break_id: SequenceBreakId,
        enabled: bool,
    ) -> Vec<AccessibilityChange> {
        if self.state.sequence_breaks[break_id as usize] == enabled {
            return vec![];
        }
        self.state.sequence_breaks[break_id as usize] = enabled;
        self.invalidate_key(StateKey::SequenceBreak(break_id))
    }

    pub fn set_world_state(&mut self, world_state: WorldState) -> Vec<AccessibilityChange> {
        if self.state.mode.world_state == world_state {
            return vec![];
        }
        self.state.mode.world_state = world_state;
        self.invalidate_key(StateKey::WorldState)
    }

    /// The entrance shuffle setting gates connection categories and exit
    /// counters everywhere, so it dirties every node rather than consulting
    /// the static key index.
    pub fn set_entrance_shuffle(&mut self, shuffle: EntranceShuffle) -> Vec<AccessibilityChange> {
        if self.state.mode.entrance_shuffle == shuffle {
            return vec![];
        }
        self.state.mode.entrance_shuffle = shuffle;
        self.invalidate(0..self.game_data.num_nodes())
    }

    pub fn set_item_placement(&mut self, placement: ItemPlacement) -> Vec<AccessibilityChange> {
        if self.state.mode.item_placement == placement {
            return vec![];
        }
        self.state.mode.item_placement = placement;
        self.invalidate_key(StateKey::ItemPlacement)
    }

    pub fn set_tower_crystal_requirement(&mut self, count: Count) -> Vec<AccessibilityChange> {
        if self.state.tower_crystal_requirement == count {
            return vec![];
        }
        self.state.tower_crystal_requirement = count;
        self.invalidate_key(StateKey::TowerCrystalRequirement)
    }

    pub fn set_crystal_requirement_known(&mut self, known: bool) -> Vec<AccessibilityChange> {
        if self.state.crystal_requirement_known == known {
            return vec![];
        }
        self.state.crystal_requirement_known = known;
        self.invalidate_key(StateKey::TowerCrystalRequirement)
    }

    pub fn set_exits_accessible(&mut self, node: NodeId, count: Count) -> Vec<AccessibilityChange> {
        if self.exit_counters[node].exits_accessible == count {
            return vec![];
        }
        self.exit_counters[node].exits_accessible = count;
        self.invalidate([node])
    }

    pub fn set_dungeon_exits_accessible(
        &mut self,
        node: NodeId,
        count: Count,
    ) -> Vec<AccessibilityChange> {
        if self.exit_counters[node].dungeon_exits_accessible == count {
            return vec![];
        }
        self.exit_counters[node].dungeon_exits_accessible = count;
        self.invalidate([node])
    }

    pub fn set_insanity_exits_accessible(
        &mut self,
        node: NodeId,
        count: Count,
    ) -> Vec<AccessibilityChange> {
        if self.exit_counters[node].insanity_exits_accessible == count {
            return vec![];
        }
        self.exit_counters[node].insanity_exits_accessible = count;
        self.invalidate([node])
    }

    /// Restores default state and zeroed exit counters for a new session,
    /// recomputing everything as one cascade. Mode reverts to its default;
    /// the loader reapplies the session's mode afterwards.
    pub fn reset(&mut self) -> Vec<AccessibilityChange> {
        info!("Resetting tracker session");
        self.state = TrackerState::default();
        self.exit_counters = vec![ExitCounters::default(); self.game_data.num_nodes()];
        self.invalidate(0..self.game_data.num_nodes())
    }

    fn invalidate_key(&mut self, key: StateKey) -> Vec<AccessibilityChange> {
        let seeds = self
            .nodes_by_state_key
            .get(&key)
            .cloned()
            .unwrap_or_default();
        self.invalidate(seeds)
    }

    /// Worklist recomputation to a fixpoint. A node's value is an exact
    /// function of external state, so each node changes at most once per
    /// mutation and the cascade is bounded by the node count. Dirty nodes
    /// are processed in sorted order to make notification order
    /// deterministic.
    fn invalidate(
        &mut self,
        seeds: impl IntoIterator<Item = NodeId>,
    ) -> Vec<AccessibilityChange> {
        let mut dirty: HashSet<NodeId> = seeds.into_iter().collect();
        let mut changes: Vec<AccessibilityChange> = vec![];
        while !dirty.is_empty() {
            let mut batch: Vec<NodeId> = dirty.drain().collect();
            batch.sort_unstable();
            for node in batch {
                let new =
                    evaluate_node(node, &self.game_data, &self.state, &self.exit_counters);
                let old = self.accessibility[node];
                if new != old {
                    self.accessibility[node] = new;
                    changes.push(AccessibilityChange { node, old, new });
                    dirty.extend(self.successors[node].iter().copied());
                }
            }
        }
        for change in &changes {
            for listener in self.listeners.iter_mut() {
                listener(change);
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentrack_game::{
        topology::standard_topology, ConnectionSpec, EntranceCategory, NodeSpec, Requirement,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    fn spec(id: &str, start: bool, connections: Vec<(&str, Requirement)>) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            start,
            connections: connections
                .into_iter()
                .map(|(source, requirement)| ConnectionSpec {
                    source: source.to_string(),
                    requirement,
                    category: EntranceCategory::NonEntrance,
                })
                .collect(),
        }
    }

    fn cyclic_tracker() -> Tracker {
        let game_data = GameData::build(&[
            spec("Start", true, vec![]),
            spec(
                "A",
                false,
                vec![
                    ("B", Requirement::Free),
                    ("Start", Requirement::item(ItemId::Hammer)),
                ],
            ),
            spec("B", false, vec![("A", Requirement::Free)]),
        ])
        .unwrap();
        Tracker::new(game_data)
    }

    #[test]
    fn mutation_cascades_through_cycle() {
        let mut tracker = cyclic_tracker();
        let a = tracker.node_id("A").unwrap();
        let b = tracker.node_id("B").unwrap();
        assert_eq!(tracker.accessibility(a), AccessibilityLevel::None);

        let changes = tracker.set_item_count(ItemId::Hammer, 1);
        assert_eq!(changes.len(), 2);
        assert_eq!(tracker.accessibility(a), AccessibilityLevel::Normal);
        assert_eq!(tracker.accessibility(b), AccessibilityLevel::Normal);

        // The cycle must not keep itself alive once the external path is
        // gone.
        let changes = tracker.set_item_count(ItemId::Hammer, 0);
        assert_eq!(changes.len(), 2);
        assert_eq!(tracker.accessibility(a), AccessibilityLevel::None);
        assert_eq!(tracker.accessibility(b), AccessibilityLevel::None);
    }

    #[test]
    fn noop_mutation_produces_no_changes() {
        let mut tracker = cyclic_tracker();
        assert!(tracker.set_item_count(ItemId::Hammer, 0).is_empty());
        tracker.set_item_count(ItemId::Hammer, 1);
        assert!(tracker.set_item_count(ItemId::Hammer, 1).is_empty());
    }

    #[test]
    fn listeners_see_every_change() {
        let mut tracker = cyclic_tracker();
        let seen: Rc<RefCell<Vec<AccessibilityChange>>> = Rc::new(RefCell::new(vec![]));
        let sink = seen.clone();
        tracker.subscribe(Box::new(move |change| sink.borrow_mut().push(*change)));

        let changes = tracker.set_item_count(ItemId::Hammer, 1);
        assert_eq!(*seen.borrow(), changes);
        for change in seen.borrow().iter() {
            assert_eq!(change.new, AccessibilityLevel::Normal);
            assert_eq!(change.old, AccessibilityLevel::None);
        }
    }

    #[test]
    fn monotonicity_over_standard_topology() {
        let mut tracker = Tracker::new(GameData::build(&standard_topology()).unwrap());
        let num_nodes = tracker.game_data().num_nodes();
        let mut floor = vec![AccessibilityLevel::None; num_nodes];
        // Collect one of everything, one item at a time; no node may ever
        // drop below a previously reached level.
        for item in [
            ItemId::Flute,
            ItemId::Gloves,
            ItemId::Lamp,
            ItemId::Hookshot,
            ItemId::Hammer,
            ItemId::MoonPearl,
            ItemId::Flippers,
            ItemId::Mirror,
            ItemId::Cape,
            ItemId::CaneOfByrna,
            ItemId::Bottle,
            ItemId::Boots,
        ] {
            tracker.collect_item(item);
            for node in 0..num_nodes {
                let level = tracker.accessibility(node);
                assert!(level >= floor[node], "node {node} regressed");
                floor[node] = level;
            }
        }
        tracker.set_item_count(ItemId::Gloves, 2);
        for node in 0..num_nodes {
            assert!(tracker.accessibility(node) >= floor[node]);
        }
        for break_id in [
            SequenceBreakId::WaterWalk,
            SequenceBreakId::SpikeCave,
            SequenceBreakId::MirrorlessScreenWrap,
        ] {
            tracker.set_sequence_break(break_id, true);
            for node in 0..num_nodes {
                let level = tracker.accessibility(node);
                assert!(level >= floor[node]);
                floor[node] = level;
            }
        }
    }

    #[test]
    fn cache_matches_fresh_evaluation_after_mutations() {
        let mut tracker = Tracker::new(GameData::build(&standard_topology()).unwrap());
        tracker.set_world_state(WorldState::Inverted);
        tracker.collect_item(ItemId::MoonPearl);
        tracker.collect_item(ItemId::Mirror);
        tracker.set_prize_count(PrizeId::Crystal, 5);
        tracker.set_entrance_shuffle(EntranceShuffle::Dungeon);
        for node in 0..tracker.game_data().num_nodes() {
            let fresh = evaluate_node(
                node,
                &tracker.game_data,
                &tracker.state,
                &tracker.exit_counters,
            );
            assert_eq!(tracker.accessibility(node), fresh, "node {node} is stale");
        }
    }

    #[test]
    fn reset_restores_a_fresh_session() {
        let mut tracker = cyclic_tracker();
        let a = tracker.node_id("A").unwrap();
        tracker.set_item_count(ItemId::Hammer, 1);
        tracker.set_exits_accessible(a, 3);
        tracker.reset();
        assert_eq!(tracker.state().item_count(ItemId::Hammer), 0);
        assert_eq!(tracker.exit_counters(a), ExitCounters::default());
        assert_eq!(tracker.accessibility(a), AccessibilityLevel::None);
    }
}
