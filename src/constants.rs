//! Reference unit table. The live host reports its own numbers through
//! `Host::stats`; these are what the standard game ships with.

use crate::host::{UnitStats, UnitType};

pub const KARBONITE_PER_MINE: u32 = 2;
pub const FUEL_PER_MINE: u32 = 10;
pub const MINE_FUEL_COST: u32 = 1;

/// Tiles adjacent for giving and building (r² <= 2).
pub const ADJACENT_RADIUS_SQ: u32 = 2;

pub const MAX_MAP_SIZE: u32 = 64;

pub fn standard_stats(unit: UnitType) -> UnitStats {
    match unit {
        UnitType::Castle => UnitStats {
            max_health: 200,
            vision_radius_sq: 100,
            move_radius_sq: 0,
            fuel_per_move: 0,
            attack_damage: 10,
            attack_radius_sq: Some((1, 64)),
            attack_fuel_cost: 10,
            construction_karbonite: 0,
            construction_fuel: 0,
            karbonite_capacity: 0,
            fuel_capacity: 0,
        },
        UnitType::Church => UnitStats {
            max_health: 100,
            vision_radius_sq: 100,
            move_radius_sq: 0,
            fuel_per_move: 0,
            attack_damage: 0,
            attack_radius_sq: None,
            attack_fuel_cost: 0,
            construction_karbonite: 50,
            construction_fuel: 200,
            karbonite_capacity: 0,
            fuel_capacity: 0,
        },
        UnitType::Pilgrim => UnitStats {
            max_health: 10,
            vision_radius_sq: 100,
            move_radius_sq: 4,
            fuel_per_move: 1,
            attack_damage: 0,
            attack_radius_sq: None,
            attack_fuel_cost: 0,
            construction_karbonite: 10,
            construction_fuel: 50,
            karbonite_capacity: 20,
            fuel_capacity: 100,
        },
        UnitType::Crusader => UnitStats {
            max_health: 40,
            vision_radius_sq: 49,
            move_radius_sq: 9,
            fuel_per_move: 1,
            attack_damage: 10,
            attack_radius_sq: Some((1, 16)),
            attack_fuel_cost: 10,
            construction_karbonite: 15,
            construction_fuel: 50,
            karbonite_capacity: 20,
            fuel_capacity: 100,
        },
        UnitType::Prophet => UnitStats {
            max_health: 20,
            vision_radius_sq: 64,
            move_radius_sq: 4,
            fuel_per_move: 2,
            attack_damage: 10,
            attack_radius_sq: Some((16, 64)),
            attack_fuel_cost: 25,
            construction_karbonite: 25,
            construction_fuel: 50,
            karbonite_capacity: 20,
            fuel_capacity: 100,
        },
        UnitType::Preacher => UnitStats {
            max_health: 60,
            vision_radius_sq: 16,
            move_radius_sq: 4,
            fuel_per_move: 3,
            attack_damage: 20,
            attack_radius_sq: Some((1, 16)),
            attack_fuel_cost: 15,
            construction_karbonite: 30,
            construction_fuel: 50,
            karbonite_capacity: 20,
            fuel_capacity: 100,
        },
    }
}
