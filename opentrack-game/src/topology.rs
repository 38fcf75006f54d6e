//! Built-in topology excerpt covering the overworld regions around Death
//! Mountain, the witch areas, Ganon's Tower, Spike Cave, and a handful of
//! dungeon entrances. Topology data is ordinarily supplied by
//! configuration; this module is one supplier of resolved `NodeSpec`s,
//! used by the integration tests and the default UI layout.

use crate::requirements::{
    can_cross_water, can_lift_heavy_rocks, can_lift_rocks, can_pass_dark_rooms,
    can_survive_spikes, can_use_medallion,
};
use crate::{
    ConnectionSpec, EntranceCategory, ItemId::*, NodeSpec, PrizeId, Requirement, WorldState,
};

fn node(id: &str, connections: Vec<ConnectionSpec>) -> NodeSpec {
    NodeSpec {
        id: id.to_string(),
        start: false,
        connections,
    }
}

fn start_node(id: &str) -> NodeSpec {
    NodeSpec {
        id: id.to_string(),
        start: true,
        connections: vec![],
    }
}

fn conn(source: &str, requirement: Requirement) -> ConnectionSpec {
    ConnectionSpec {
        source: source.to_string(),
        requirement,
        category: EntranceCategory::NonEntrance,
    }
}

fn entrance(source: &str, requirement: Requirement, category: EntranceCategory) -> ConnectionSpec {
    ConnectionSpec {
        source: source.to_string(),
        requirement,
        category,
    }
}

fn item(item: crate::ItemId) -> Requirement {
    Requirement::item(item)
}

fn world(world_state: WorldState) -> Requirement {
    Requirement::WorldState(world_state)
}

fn all(reqs: Vec<Requirement>) -> Requirement {
    Requirement::make_all(reqs)
}

fn any(reqs: Vec<Requirement>) -> Requirement {
    Requirement::make_any(reqs)
}

fn sb(break_id: crate::SequenceBreakId, condition: Requirement) -> Requirement {
    Requirement::sequence_break(break_id, condition)
}

pub fn standard_topology() -> Vec<NodeSpec> {
    use WorldState::*;
    vec![
        start_node("Start"),
        node(
            "LightWorld",
            vec![
                conn("Start", world(StandardOpen)),
                conn("DarkWorldSouth", all(vec![world(Inverted), item(Mirror)])),
                // The inverted south portal: lift the heavy rock to cross
                // back into the light world without a mirror.
                conn(
                    "DarkWorldSouth",
                    all(vec![world(Inverted), can_lift_heavy_rocks()]),
                ),
                conn("DeathMountainWestBottom", Requirement::Free),
            ],
        ),
        // In the inverted world the light world turns the player into a
        // bunny without the Moon Pearl.
        node(
            "LightWorldNotBunny",
            vec![conn(
                "LightWorld",
                any(vec![world(StandardOpen), item(MoonPearl)]),
            )],
        ),
        node("Flute", vec![conn("LightWorldNotBunny", item(Flute))]),
        node(
            "DeathMountainWestBottom",
            vec![
                conn("Flute", Requirement::Free),
                conn(
                    "LightWorldNotBunny",
                    all(vec![can_lift_rocks(), can_pass_dark_rooms()]),
                ),
                conn("DeathMountainWestTop", Requirement::Free),
            ],
        ),
        node(
            "DeathMountainWestTop",
            vec![conn(
                "DeathMountainWestBottom",
                any(vec![item(Hookshot), item(Mirror)]),
            )],
        ),
        node(
            "DeathMountainEastBottom",
            vec![
                conn("DeathMountainWestBottom", item(Hookshot)),
                conn("DeathMountainWestTop", Requirement::Free),
            ],
        ),
        node(
            "LWWitchArea",
            vec![conn(
                "LightWorldNotBunny",
                any(vec![can_lift_rocks(), item(Flippers)]),
            )],
        ),
        node(
            "ZoraArea",
            vec![conn(
                "LWWitchArea",
                any(vec![can_lift_rocks(), can_cross_water()]),
            )],
        ),
        node(
            "WaterfallFairy",
            vec![conn("LWWitchArea", can_cross_water())],
        ),
        node(
            "DWWitchArea",
            vec![
                conn(
                    "LWWitchArea",
                    any(vec![
                        all(vec![world(Inverted), item(Mirror)]),
                        sb(crate::SequenceBreakId::MirrorlessScreenWrap, world(Inverted)),
                    ]),
                ),
                conn(
                    "DarkWorldEast",
                    all(vec![
                        item(MoonPearl),
                        any(vec![can_lift_rocks(), item(Hammer), item(Flippers)]),
                    ]),
                ),
            ],
        ),
        // Swimming back down the river closes a cycle with DWWitchArea.
        node(
            "DarkWorldEast",
            vec![
                conn(
                    "LightWorldNotBunny",
                    all(vec![
                        world(StandardOpen),
                        item(MoonPearl),
                        any(vec![
                            all(vec![item(Hammer), can_lift_rocks()]),
                            can_lift_heavy_rocks(),
                        ]),
                    ]),
                ),
                conn("DWWitchArea", item(Flippers)),
            ],
        ),
        node(
            "DarkWorldSouth",
            vec![
                conn("Start", world(Inverted)),
                conn(
                    "LightWorldNotBunny",
                    all(vec![
                        world(StandardOpen),
                        item(MoonPearl),
                        can_lift_heavy_rocks(),
                    ]),
                ),
                conn("DarkWorldEast", item(Hammer)),
            ],
        ),
        node(
            "DarkWorldWest",
            vec![
                conn(
                    "LightWorldNotBunny",
                    all(vec![
                        world(StandardOpen),
                        item(MoonPearl),
                        any(vec![
                            can_lift_heavy_rocks(),
                            all(vec![can_lift_rocks(), item(Hammer)]),
                        ]),
                    ]),
                ),
                conn("DarkWorldSouth", can_lift_rocks()),
            ],
        ),
        node(
            "BumperCaveTop",
            vec![conn(
                "DarkWorldWest",
                any(vec![
                    all(vec![item(Cape), can_lift_rocks()]),
                    sb(
                        crate::SequenceBreakId::BumperCaveHookshot,
                        all(vec![item(Hookshot), can_lift_rocks()]),
                    ),
                ]),
            )],
        ),
        node(
            "MireArea",
            vec![
                conn(
                    "LightWorldNotBunny",
                    all(vec![
                        world(StandardOpen),
                        item(Flute),
                        item(MoonPearl),
                        can_lift_heavy_rocks(),
                    ]),
                ),
                conn("DarkWorldSouth", world(Inverted)),
            ],
        ),
        node(
            "MiseryMireEntrance",
            vec![
                conn("MireArea", can_use_medallion(Ether)),
                entrance("MireArea", Requirement::Free, EntranceCategory::Dungeon),
            ],
        ),
        node(
            "DarkDeathMountainTop",
            vec![
                conn(
                    "DeathMountainWestTop",
                    all(vec![world(StandardOpen), can_lift_heavy_rocks()]),
                ),
                conn("DeathMountainEastBottom", world(Inverted)),
            ],
        ),
        node(
            "DarkDeathMountainEastBottom",
            vec![
                conn("DarkDeathMountainTop", Requirement::Free),
                conn(
                    "DeathMountainEastBottom",
                    all(vec![world(StandardOpen), can_lift_heavy_rocks()]),
                ),
            ],
        ),
        node(
            "TurtleRockEntrance",
            vec![
                conn(
                    "DarkDeathMountainTop",
                    all(vec![
                        world(StandardOpen),
                        item(Hammer),
                        item(MoonPearl),
                        can_lift_heavy_rocks(),
                        can_use_medallion(Quake),
                    ]),
                ),
                entrance(
                    "DarkDeathMountainTop",
                    Requirement::Free,
                    EntranceCategory::Dungeon,
                ),
            ],
        ),
        node(
            "GanonsTowerEntrance",
            vec![
                conn(
                    "DarkDeathMountainTop",
                    all(vec![world(StandardOpen), Requirement::TowerCrystals]),
                ),
                conn(
                    "LightWorldNotBunny",
                    all(vec![world(Inverted), Requirement::TowerCrystals]),
                ),
                entrance(
                    "LightWorldNotBunny",
                    Requirement::Free,
                    EntranceCategory::Dungeon,
                ),
            ],
        ),
        node(
            "SpikeCave",
            vec![conn(
                "DarkDeathMountainTop",
                all(vec![can_lift_rocks(), item(Hammer), item(MoonPearl)]),
            )],
        ),
        node(
            "SpikeCavePastSpikes",
            vec![conn("SpikeCave", can_survive_spikes())],
        ),
        node(
            "LakeHyliaIsland",
            vec![
                // Visible from the shore; standing on it takes a trip
                // through the dark world and a mirror.
                conn("LightWorld", Requirement::Inspect),
                conn(
                    "DarkWorldSouth",
                    all(vec![
                        world(StandardOpen),
                        item(MoonPearl),
                        item(Mirror),
                        item(Flippers),
                    ]),
                ),
            ],
        ),
        node(
            "MasterSwordPedestal",
            vec![conn(
                "LightWorld",
                any(vec![
                    all(vec![
                        Requirement::Prize {
                            prize: PrizeId::GreenPendant,
                            count: 1,
                        },
                        Requirement::Prize {
                            prize: PrizeId::Pendant,
                            count: 2,
                        },
                    ]),
                    all(vec![item(Book), Requirement::Inspect]),
                ]),
            )],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameData;

    #[test]
    fn standard_topology_builds() {
        let game_data = GameData::build(&standard_topology()).unwrap();
        assert!(game_data.num_nodes() >= 20);
        // Every scenario node from the historical fixture set is present.
        for name in [
            "Start",
            "Flute",
            "LWWitchArea",
            "DWWitchArea",
            "GanonsTowerEntrance",
            "SpikeCavePastSpikes",
            "MiseryMireEntrance",
            "LakeHyliaIsland",
        ] {
            game_data.node_id(name).unwrap();
        }
    }
}
