//! Tunable behaviour, loaded once per unit from JSON supplied by the host.
//! Missing sections and fields fall back to the builtin defaults.

use crate::pathing::NavigationMode;
use log::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub pathing: PathingFeatures,
    pub strategy: StrategyFeatures,
    pub economy: EconomyFeatures,
    pub military: MilitaryFeatures,
}

impl Features {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parses host supplied config, keeping the defaults if it is missing or
    /// malformed.
    pub fn load(json: Option<&str>) -> Features {
        match json.map(Features::from_json_str) {
            Some(Ok(features)) => features,
            Some(Err(err)) => {
                warn!("Ignoring malformed feature config: {}", err);
                Features::default()
            }
            None => Features::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathingFeatures {
    /// Below this much remaining time no search is started at all.
    pub min_time_ms: u32,
    pub expansions_per_ms: u32,
    pub max_expansions: u32,
    pub default_mode: NavigationMode,
}

impl Default for PathingFeatures {
    fn default() -> Self {
        PathingFeatures {
            min_time_ms: 20,
            expansions_per_ms: 40,
            max_expansions: 4096,
            default_mode: NavigationMode::Balanced,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyFeatures {
    pub presence_decay: f64,
    /// Danger around home above which castles stop expanding.
    pub danger_threshold: f64,
    /// Enemy castles closer than this many travel turns trigger a rush.
    pub rush_distance_turns: u32,
    /// Military units a rushing castle sends before returning to economy.
    pub rush_units: u32,
    pub leadership_turns: u32,
    pub lattice_spacing: i32,
    pub lattice_max_radius_sq: u32,
}

impl Default for StrategyFeatures {
    fn default() -> Self {
        StrategyFeatures {
            presence_decay: 0.9,
            danger_threshold: 30.0,
            rush_distance_turns: 10,
            rush_units: 4,
            leadership_turns: 3,
            lattice_spacing: 2,
            lattice_max_radius_sq: 64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyFeatures {
    pub max_pilgrims: u32,
    /// Every n-th pilgrim a castle builds is sent scouting instead of mining.
    pub scout_every: u32,
    pub scout_report_interval: u32,
    /// Pilgrims farther than this from any dropoff consider building a church.
    pub church_distance_sq: u32,
    pub church_site_radius_sq: u32,
    pub resource_search_radius_sq: u32,
    /// Church founders each castle sends out once its own tiles are staffed.
    pub max_churches: u32,
}

impl Default for EconomyFeatures {
    fn default() -> Self {
        EconomyFeatures {
            max_pilgrims: 12,
            scout_every: 6,
            scout_report_interval: 10,
            church_distance_sq: 100,
            church_site_radius_sq: 8,
            resource_search_radius_sq: 64,
            max_churches: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilitaryFeatures {
    pub home_radius_sq: u32,
    pub threat_radius_sq: u32,
    /// Prophets a castle keeps around before investing in pilgrims again.
    pub defenders_per_castle: u32,
    /// Turn after which the leader castle orders an all-out charge.
    pub charge_turn: u32,
    pub signal_radius_sq: u32,
}

impl Default for MilitaryFeatures {
    fn default() -> Self {
        MilitaryFeatures {
            home_radius_sq: 100,
            threat_radius_sq: 100,
            defenders_per_castle: 3,
            charge_turn: 900,
            signal_radius_sq: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let features = Features::from_json_str(r#"{ "strategy": { "rush_distance_turns": 4 } }"#).unwrap();

        assert_eq!(features.strategy.rush_distance_turns, 4);
        assert_eq!(features.strategy.presence_decay, 0.9);
        assert_eq!(features.pathing, PathingFeatures::default());
    }

    #[test]
    fn malformed_config_falls_back() {
        assert_eq!(Features::load(Some("{ not json")), Features::default());
        assert_eq!(Features::load(None), Features::default());
    }
}
