pub mod requirements;
pub mod topology;

use anyhow::{bail, Context, Result};
use hashbrown::HashMap;
use log::info;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use strum_macros::{EnumCount, EnumString, VariantNames};

pub type NodeId = usize; // Index into GameData.node_isv.keys
pub type Count = u32; // Data type used to represent item/prize quantities

#[derive(Default, Clone)]
pub struct IndexedVec<T: Hash + Eq> {
    pub keys: Vec<T>,
    pub index_by_key: HashMap<T, usize>,
}

impl<T: Hash + Eq + Clone> IndexedVec<T> {
    pub fn add(&mut self, key: &T) -> usize {
        if let Some(&idx) = self.index_by_key.get(key) {
            idx
        } else {
            let idx = self.keys.len();
            self.index_by_key.insert(key.clone(), idx);
            self.keys.push(key.clone());
            idx
        }
    }
}

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    VariantNames,
    EnumCount,
    TryFromPrimitive,
    Serialize,
    Deserialize,
    PartialOrd,
    Ord,
)]
#[repr(usize)]
pub enum ItemId {
    Sword,
    Shield,
    Bow,
    Boomerang,
    Hookshot,
    Bomb,
    Powder,
    FireRod,
    IceRod,
    Bombos,
    Ether,
    Quake,
    Lamp,
    Hammer,
    Flute,
    Shovel,
    Net,
    Book,
    Bottle,
    CaneOfSomaria,
    CaneOfByrna,
    Cape,
    Mirror,
    Boots,
    Gloves,
    Flippers,
    MoonPearl,
    HalfMagic,
    Mushroom,
}

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    VariantNames,
    EnumCount,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(usize)]
pub enum PrizeId {
    Crystal,
    RedCrystal,
    Pendant,
    GreenPendant,
}

// Player-toggleable out-of-logic techniques. Each one independently gates
// requirement branches; disabled toggles demote those branches to
// SequenceBreak rather than removing them.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    VariantNames,
    EnumCount,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(usize)]
pub enum SequenceBreakId {
    FakeFlippersFairyRevival,
    FakeFlippersScreenTransition,
    FakeFlippersSplashDeletion,
    WaterWalk,
    BombDuplicationMirror,
    BombJumpFence,
    SpikeCave,
    TowerCrystalsUnknown,
    MirrorlessScreenWrap,
    SuperBunnyMirror,
    DungeonRevive,
    FakePowder,
    Hover,
    BumperCaveHookshot,
    DarkRoomNavigation,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldState {
    StandardOpen,
    Inverted,
}

// Ordered: a larger shuffle setting activates every category a smaller one
// does.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EntranceShuffle {
    None,
    Dungeon,
    All,
    Insanity,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemPlacement {
    Basic,
    Advanced,
}

/// The active ruleset for the current play session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    pub world_state: WorldState,
    pub entrance_shuffle: EntranceShuffle,
    pub item_placement: ItemPlacement,
}

impl Default for Mode {
    fn default() -> Self {
        Mode {
            world_state: WorldState::StandardOpen,
            entrance_shuffle: EntranceShuffle::None,
            item_placement: ItemPlacement::Basic,
        }
    }
}

/// Classification of a connection under entrance randomization. Gates
/// whether the edge exists at all in the current session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntranceCategory {
    NonEntrance,
    Dungeon,
    All,
    Insanity,
}

impl EntranceCategory {
    pub fn is_active(self, shuffle: EntranceShuffle) -> bool {
        match self {
            EntranceCategory::NonEntrance => true,
            EntranceCategory::Dungeon => shuffle >= EntranceShuffle::Dungeon,
            EntranceCategory::All => shuffle >= EntranceShuffle::All,
            EntranceCategory::Insanity => shuffle >= EntranceShuffle::Insanity,
        }
    }
}

/// An external state input that a requirement can read. Used to wire
/// change notifications back to the nodes that depend on them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKey {
    Item(ItemId),
    Prize(PrizeId),
    SequenceBreak(SequenceBreakId),
    WorldState,
    EntranceShuffle,
    ItemPlacement,
    TowerCrystalRequirement,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Requirement {
    Free,
    Never,
    Inspect,
    Item {
        item: ItemId,
        count: Count,
    },
    Prize {
        prize: PrizeId,
        count: Count,
    },
    // Collected Crystal + RedCrystal prizes vs. the session's required
    // tower crystal count. An unconfirmed requirement demotes a sufficient
    // count to SequenceBreak.
    TowerCrystals,
    WorldState(WorldState),
    EntranceShuffle(EntranceShuffle),
    ItemPlacement(ItemPlacement),
    SequenceBreakGated {
        break_id: SequenceBreakId,
        condition: Box<Requirement>,
    },
    All(Vec<Requirement>),
    Any(Vec<Requirement>),
}

impl Requirement {
    pub fn make_all(reqs: Vec<Requirement>) -> Requirement {
        let mut out_reqs: Vec<Requirement> = vec![];
        for req in reqs {
            if let Requirement::Never = req {
                return Requirement::Never;
            } else if let Requirement::Free = req {
                continue;
            } else if let Requirement::All(sub_reqs) = req {
                out_reqs.extend(sub_reqs);
            } else {
                out_reqs.push(req);
            }
        }
        if out_reqs.is_empty() {
            Requirement::Free
        } else if out_reqs.len() == 1 {
            out_reqs.into_iter().next().unwrap()
        } else {
            Requirement::All(out_reqs)
        }
    }

    pub fn make_any(reqs: Vec<Requirement>) -> Requirement {
        let mut out_reqs: Vec<Requirement> = vec![];
        for req in reqs {
            if let Requirement::Free = req {
                return Requirement::Free;
            } else if let Requirement::Never = req {
                continue;
            } else if let Requirement::Any(sub_reqs) = req {
                out_reqs.extend(sub_reqs);
            } else {
                out_reqs.push(req);
            }
        }
        if out_reqs.is_empty() {
            Requirement::Never
        } else if out_reqs.len() == 1 {
            out_reqs.into_iter().next().unwrap()
        } else {
            Requirement::Any(out_reqs)
        }
    }

    pub fn item(item: ItemId) -> Requirement {
        Requirement::Item { item, count: 1 }
    }

    pub fn sequence_break(break_id: SequenceBreakId, condition: Requirement) -> Requirement {
        Requirement::SequenceBreakGated {
            break_id,
            condition: Box::new(condition),
        }
    }

    /// Collects every external state key this requirement reads.
    pub fn dependencies(&self, out: &mut Vec<StateKey>) {
        match self {
            Requirement::Free | Requirement::Never | Requirement::Inspect => {}
            Requirement::Item { item, .. } => out.push(StateKey::Item(*item)),
            Requirement::Prize { prize, .. } => out.push(StateKey::Prize(*prize)),
            Requirement::TowerCrystals => {
                out.push(StateKey::Prize(PrizeId::Crystal));
                out.push(StateKey::Prize(PrizeId::RedCrystal));
                out.push(StateKey::TowerCrystalRequirement);
            }
            Requirement::WorldState(_) => out.push(StateKey::WorldState),
            Requirement::EntranceShuffle(_) => out.push(StateKey::EntranceShuffle),
            Requirement::ItemPlacement(_) => out.push(StateKey::ItemPlacement),
            Requirement::SequenceBreakGated {
                break_id,
                condition,
            } => {
                out.push(StateKey::SequenceBreak(*break_id));
                condition.dependencies(out);
            }
            Requirement::All(sub_reqs) | Requirement::Any(sub_reqs) => {
                for req in sub_reqs {
                    req.dependencies(out);
                }
            }
        }
    }
}

/// One inbound edge as declared by topology data: the source node is named
/// by id string and resolved during the second construction phase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub source: String,
    pub requirement: Requirement,
    pub category: EntranceCategory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    /// The session origin: accessible at Normal with no inbound edges.
    #[serde(default)]
    pub start: bool,
    pub connections: Vec<ConnectionSpec>,
}

/// A resolved inbound edge: `source` indexes into `GameData.node_isv`.
#[derive(Clone, Debug)]
pub struct Connection {
    pub source: NodeId,
    pub requirement: Requirement,
    pub category: EntranceCategory,
}

/// The resolved, immutable node topology for a session. Built once from
/// declared specs; only external state and per-node counters mutate after
/// this.
pub struct GameData {
    pub node_isv: IndexedVec<String>,
    pub start: Vec<bool>,
    pub connections_by_node: Vec<Vec<Connection>>,
}

impl GameData {
    /// Two-phase construction: allocate every declared node id first, then
    /// wire connections by id lookup, so topology order never matters and
    /// cycles are fine. Duplicate or unknown ids abort construction.
    pub fn build(specs: &[NodeSpec]) -> Result<GameData> {
        let mut node_isv: IndexedVec<String> = IndexedVec::default();
        let mut start: Vec<bool> = vec![];
        for spec in specs {
            if node_isv.index_by_key.contains_key(&spec.id) {
                bail!("Duplicate node id: {}", spec.id);
            }
            node_isv.add(&spec.id);
            start.push(spec.start);
        }

        let mut connections_by_node: Vec<Vec<Connection>> = vec![vec![]; node_isv.keys.len()];
        let mut num_connections = 0;
        for spec in specs {
            let node_id = node_isv.index_by_key[&spec.id];
            for conn in &spec.connections {
                let source = *node_isv
                    .index_by_key
                    .get(&conn.source)
                    .with_context(|| {
                        format!(
                            "Connection into '{}' references unregistered node '{}'",
                            spec.id, conn.source
                        )
                    })?;
                connections_by_node[node_id].push(Connection {
                    source,
                    requirement: conn.requirement.clone(),
                    category: conn.category,
                });
                num_connections += 1;
            }
        }
        info!(
            "Built topology: {} nodes, {} connections",
            node_isv.keys.len(),
            num_connections
        );
        Ok(GameData {
            node_isv,
            start,
            connections_by_node,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.node_isv.keys.len()
    }

    pub fn node_id(&self, name: &str) -> Result<NodeId> {
        self.node_isv
            .index_by_key
            .get(name)
            .copied()
            .with_context(|| format!("Unknown node id: {name}"))
    }
}
