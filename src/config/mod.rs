//! Casino configuration: VIP schedule, house edges, session policy
//!
//! Configuration is validated wholesale at load time. Anything that could
//! surface later as a division by zero or a NaN in the outcome math (a
//! single-tier VIP level, an edge outside the sane band) is rejected here,
//! never at the call site.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ledger::vip::{VipLevel, VipSchedule};

/// Per-game house-edge constants, before the rigging modifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameEdges {
    pub threshold: f64,
    pub target: f64,
    pub table: f64,
    pub path: f64,
    /// Rig-roll probability base for the hazard-board game
    pub hazard: f64,
}

impl Default for GameEdges {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            target: 0.04,
            table: 0.0,
            path: 0.02,
            hazard: 0.05,
        }
    }
}

/// Hazard-board session policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HazardPolicy {
    /// Sessions idle longer than this are forfeited by the reaper
    pub idle_timeout_secs: u64,
    /// Reaper wake-up period
    pub reap_interval_secs: u64,
    /// Board size limits
    pub max_width: u8,
    pub max_height: u8,
}

impl Default for HazardPolicy {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
            reap_interval_secs: 60,
            max_width: 8,
            max_height: 8,
        }
    }
}

/// Rigging primitive constants
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiggingPolicy {
    pub toggle_value: f64,
    pub nudge_step: f64,
}

impl Default for RiggingPolicy {
    fn default() -> Self {
        Self {
            toggle_value: 0.05,
            nudge_step: 0.01,
        }
    }
}

/// Raw TOML shape before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default)]
    edges: GameEdges,
    #[serde(default)]
    hazard: HazardPolicy,
    #[serde(default)]
    rigging: RiggingPolicy,
    #[serde(default)]
    vip_levels: Vec<VipLevel>,
}

/// Validated casino configuration
#[derive(Debug, Clone)]
pub struct CasinoConfig {
    pub edges: GameEdges,
    pub hazard: HazardPolicy,
    pub rigging: RiggingPolicy,
    pub vip: VipSchedule,
}

impl Default for CasinoConfig {
    fn default() -> Self {
        Self {
            edges: GameEdges::default(),
            hazard: HazardPolicy::default(),
            rigging: RiggingPolicy::default(),
            vip: VipSchedule::default_schedule(),
        }
    }
}

impl CasinoConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(input)?;
        let vip = if raw.vip_levels.is_empty() {
            VipSchedule::default_schedule()
        } else {
            VipSchedule::new(raw.vip_levels)?
        };
        let config = Self {
            edges: raw.edges,
            hazard: raw.hazard,
            rigging: raw.rigging,
            vip,
        };
        config.validate()?;
        Ok(config)
    }

    /// Structural checks beyond what the schedule already enforces.
    pub fn validate(&self) -> Result<()> {
        for (name, edge) in [
            ("threshold", self.edges.threshold),
            ("target", self.edges.target),
            ("table", self.edges.table),
            ("path", self.edges.path),
            ("hazard", self.edges.hazard),
        ] {
            if !(0.0..0.5).contains(&edge) {
                return Err(Error::Config(format!(
                    "edge '{}' must be in [0, 0.5), got {}",
                    name, edge
                )));
            }
        }
        if self.hazard.idle_timeout_secs == 0 || self.hazard.reap_interval_secs == 0 {
            return Err(Error::Config(
                "hazard timeouts must be non-zero".to_string(),
            ));
        }
        if self.hazard.max_width < 2 || self.hazard.max_height < 2 {
            return Err(Error::Config("hazard board limits too small".to_string()));
        }
        if self.rigging.nudge_step <= 0.0 || self.rigging.toggle_value == 0.0 {
            return Err(Error::Config("rigging constants must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Chips;

    #[test]
    fn test_default_config_validates() {
        assert!(CasinoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CasinoConfig::from_toml_str(
            r#"
            [edges]
            threshold = 0.06
            target = 0.04
            table = 0.0
            path = 0.02
            hazard = 0.03

            [hazard]
            idle_timeout_secs = 600
            reap_interval_secs = 30
            max_width = 6
            max_height = 6

            [rigging]
            toggle_value = 0.08
            nudge_step = 0.005

            [[vip_levels]]
            name = "Bronze"
            base_requirement = { amount = 1000000000 }
            tier_count = 4
            bonus_payout = { amount = 50000000 }

            [[vip_levels]]
            name = "Silver"
            base_requirement = { amount = 5000000000 }
            tier_count = 4
            bonus_payout = { amount = 200000000 }
            "#,
        )
        .unwrap();
        assert_eq!(config.edges.threshold, 0.06);
        assert_eq!(config.hazard.idle_timeout_secs, 600);
        assert_eq!(config.vip.levels().len(), 2);
        assert_eq!(
            config.vip.levels()[0].base_requirement,
            Chips::from_chips(1_000)
        );
    }

    #[test]
    fn test_single_tier_level_rejected_at_load() {
        let result = CasinoConfig::from_toml_str(
            r#"
            [[vip_levels]]
            name = "Broken"
            base_requirement = { amount = 1000000 }
            tier_count = 1
            bonus_payout = { amount = 1000000 }
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_out_of_band_edge_rejected() {
        let result = CasinoConfig::from_toml_str(
            r#"
            [edges]
            threshold = 0.6
            target = 0.04
            table = 0.0
            path = 0.02
            hazard = 0.03
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
