//! Composite requirement builders shared across the topology tables.
//! Each returns a plain `Requirement` tree; nothing here reads state.

use crate::{ItemId, Requirement, SequenceBreakId};

pub fn can_lift_rocks() -> Requirement {
    Requirement::item(ItemId::Gloves)
}

pub fn can_lift_heavy_rocks() -> Requirement {
    Requirement::Item {
        item: ItemId::Gloves,
        count: 2,
    }
}

pub fn has_sword() -> Requirement {
    Requirement::item(ItemId::Sword)
}

pub fn can_light_torches() -> Requirement {
    Requirement::make_any(vec![
        Requirement::item(ItemId::Lamp),
        Requirement::item(ItemId::FireRod),
    ])
}

/// Dark rooms are in logic with the lamp; navigating them blind is a
/// toggleable trick.
pub fn can_pass_dark_rooms() -> Requirement {
    Requirement::make_any(vec![
        Requirement::item(ItemId::Lamp),
        Requirement::sequence_break(SequenceBreakId::DarkRoomNavigation, Requirement::Free),
    ])
}

/// A medallion only works with a sword to swing it.
pub fn can_use_medallion(medallion: ItemId) -> Requirement {
    Requirement::make_all(vec![Requirement::item(medallion), has_sword()])
}

/// Deep water crossings: flippers are in logic; the fake-flippers family
/// and water walking are independently toggleable tricks, each with its
/// own item table.
pub fn can_cross_water() -> Requirement {
    Requirement::make_any(vec![
        Requirement::item(ItemId::Flippers),
        Requirement::sequence_break(
            SequenceBreakId::FakeFlippersFairyRevival,
            Requirement::item(ItemId::Bottle),
        ),
        Requirement::sequence_break(
            SequenceBreakId::FakeFlippersSplashDeletion,
            Requirement::make_any(vec![
                Requirement::item(ItemId::Boomerang),
                Requirement::item(ItemId::CaneOfSomaria),
                Requirement::item(ItemId::IceRod),
                Requirement::item(ItemId::Bomb),
            ]),
        ),
        Requirement::sequence_break(SequenceBreakId::WaterWalk, Requirement::item(ItemId::Boots)),
    ])
}

/// The spike-floor survival table: Byrna is in logic on its own, the cape
/// needs a magic reserve, and cape alone is a toggleable trick.
pub fn can_survive_spikes() -> Requirement {
    Requirement::make_any(vec![
        Requirement::item(ItemId::CaneOfByrna),
        Requirement::make_all(vec![
            Requirement::item(ItemId::Cape),
            Requirement::make_any(vec![
                Requirement::item(ItemId::Bottle),
                Requirement::item(ItemId::HalfMagic),
            ]),
        ]),
        Requirement::sequence_break(SequenceBreakId::SpikeCave, Requirement::item(ItemId::Cape)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StateKey;

    #[test]
    fn medallion_needs_a_sword() {
        let req = can_use_medallion(ItemId::Bombos);
        let mut keys = vec![];
        req.dependencies(&mut keys);
        assert!(keys.contains(&StateKey::Item(ItemId::Bombos)));
        assert!(keys.contains(&StateKey::Item(ItemId::Sword)));
    }

    #[test]
    fn water_crossing_lists_every_trick_toggle() {
        let mut keys = vec![];
        can_cross_water().dependencies(&mut keys);
        for break_id in [
            SequenceBreakId::FakeFlippersFairyRevival,
            SequenceBreakId::FakeFlippersSplashDeletion,
            SequenceBreakId::WaterWalk,
        ] {
            assert!(keys.contains(&StateKey::SequenceBreak(break_id)));
        }
    }
}
