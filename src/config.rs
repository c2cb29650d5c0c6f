//! Skater tuning parsed from TOML: the physics parameter table and stat profiles.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::game::math::{clamp01, lerp};

/// A curve sampled by a skater stat in the `0..=10` range.
///
/// Written in TOML as a two element array `[value_at_stat_0, value_at_stat_10]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct StatRange {
    pub at_min: f32,
    pub at_max: f32,
}

impl StatRange {
    pub const fn new(at_min: f32, at_max: f32) -> Self {
        Self { at_min, at_max }
    }

    /// Interpolates the range for a stat value, clamping the stat to `0..=10`.
    pub fn at(&self, stat: f32) -> f32 {
        lerp(self.at_min, self.at_max, clamp01(stat / 10.0))
    }
}

impl From<[f32; 2]> for StatRange {
    fn from([at_min, at_max]: [f32; 2]) -> Self {
        Self { at_min, at_max }
    }
}

impl From<StatRange> for [f32; 2] {
    fn from(range: StatRange) -> Self {
        [range.at_min, range.at_max]
    }
}

/// Rail traversal tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrindParams {
    /// Multiplier applied to the projected entry speed
    pub speed_boost: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Speed gained per second while pushing along the grind direction
    pub acceleration: f32,
    /// Speed lost per second without a push along the grind direction
    pub deceleration: f32,
    /// Position smoothing rate toward the rail point
    pub snap_strength: f32,
    /// Distance from an open rail end at which the grind ends
    pub end_distance: f32,
    pub min_speed_to_bail: f32,
    /// Multiplier on tangential speed when leaving the rail
    pub jump_boost: f32,
    pub directional_push_force: f32,
}

impl Default for GrindParams {
    fn default() -> Self {
        Self {
            speed_boost: 1.2,
            min_speed: 5.0,
            max_speed: 20.0,
            acceleration: 15.0,
            deceleration: 5.0,
            snap_strength: 15.0,
            end_distance: 0.05,
            min_speed_to_bail: 2.0,
            jump_boost: 1.2,
            directional_push_force: 18.0,
        }
    }
}

/// Balance oscillator curves for one balance session type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceCurve {
    /// Pull back toward center per second
    pub lean_gravity: StatRange,
    /// Response to lean input per second
    pub lean_acceleration: StatRange,
    pub wobble_base: StatRange,
    /// Wobble magnitude growth per second of session time
    pub wobble_growth: StatRange,
    pub wobble_max: f32,
    pub bail_threshold: f32,
}

impl BalanceCurve {
    fn grind() -> Self {
        Self {
            lean_gravity: StatRange::new(0.5, 0.2),
            lean_acceleration: StatRange::new(2.0, 1.0),
            wobble_base: StatRange::new(0.1, 0.05),
            wobble_growth: StatRange::new(0.05, 0.02),
            wobble_max: 1.5,
            bail_threshold: 1.0,
        }
    }

    fn manual() -> Self {
        Self {
            lean_gravity: StatRange::new(0.6, 0.25),
            lean_acceleration: StatRange::new(2.5, 1.2),
            wobble_base: StatRange::new(0.12, 0.06),
            wobble_growth: StatRange::new(0.06, 0.025),
            wobble_max: 1.5,
            bail_threshold: 1.0,
        }
    }
}

impl Default for BalanceCurve {
    fn default() -> Self {
        Self::grind()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceParams {
    pub grind: BalanceCurve,
    pub manual: BalanceCurve,
}

impl Default for BalanceParams {
    fn default() -> Self {
        Self {
            grind: BalanceCurve::grind(),
            manual: BalanceCurve::manual(),
        }
    }
}

/// Stat-indexed physics tuning shared read-only by every skater state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParameterTable {
    pub ollie_vertical_force: StatRange,
    pub ollie_forward_boost: StatRange,
    pub vert_jump_force: StatRange,
    pub grind_exit_jump_force: StatRange,
    pub jump_charge_boost: StatRange,
    pub max_push_speed: StatRange,
    pub acceleration: StatRange,
    pub max_jump_charge_speed: StatRange,
    /// Minimum speed for a rail probe to start a grind
    pub min_grind_speed: f32,
    pub grind_entry_speed_boost: f32,
    pub brake_force: f32,
    pub coast_deceleration: f32,
    /// Scale applied to switch-sensitive lookups while riding switch
    pub standard_switch_multiplier: f32,
    /// Vertex colour (RGB) marking vert ramp triangles
    pub vert_color: [f32; 3],
    /// Vertex colour (RGB) painted on grindable edges of authored rail meshes.
    /// Extraction itself keys on the alpha weight.
    pub grind_color: [f32; 3],
    pub color_tolerance: f32,
    pub grind: GrindParams,
    pub balance: BalanceParams,
}

impl Default for PhysicsParameterTable {
    fn default() -> Self {
        Self {
            ollie_vertical_force: StatRange::new(7.0, 12.0),
            ollie_forward_boost: StatRange::new(1.0, 3.0),
            vert_jump_force: StatRange::new(10.0, 16.0),
            grind_exit_jump_force: StatRange::new(6.0, 10.0),
            jump_charge_boost: StatRange::new(15.0, 25.0),
            max_push_speed: StatRange::new(12.0, 18.0),
            acceleration: StatRange::new(8.0, 16.0),
            max_jump_charge_speed: StatRange::new(15.0, 20.0),
            min_grind_speed: 2.0,
            grind_entry_speed_boost: 1.2,
            brake_force: 30.0,
            coast_deceleration: 0.5,
            standard_switch_multiplier: 0.8,
            vert_color: [0.0, 1.0, 0.0],
            grind_color: [1.0, 1.0, 1.0],
            color_tolerance: 0.01,
            grind: GrindParams::default(),
            balance: BalanceParams::default(),
        }
    }
}

impl PhysicsParameterTable {
    /// Load a parameter table from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: Self = toml::from_str(content)?;
        table.validate()?;
        Ok(table)
    }

    /// Stat lookup without stance scaling.
    pub fn stat_value(&self, range: StatRange, stat: f32) -> f32 {
        range.at(stat)
    }

    /// Stat lookup scaled by the switch multiplier when riding switch.
    pub fn switched_value(&self, range: StatRange, stat: f32, is_switch: bool) -> f32 {
        let value = range.at(stat);
        if is_switch {
            value * self.standard_switch_multiplier
        } else {
            value
        }
    }

    /// Rejects tables that would poison the integrator with NaNs or inverted ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("ollie_vertical_force", self.ollie_vertical_force),
            ("ollie_forward_boost", self.ollie_forward_boost),
            ("vert_jump_force", self.vert_jump_force),
            ("grind_exit_jump_force", self.grind_exit_jump_force),
            ("jump_charge_boost", self.jump_charge_boost),
            ("max_push_speed", self.max_push_speed),
            ("acceleration", self.acceleration),
            ("max_jump_charge_speed", self.max_jump_charge_speed),
            ("balance.grind.lean_gravity", self.balance.grind.lean_gravity),
            ("balance.grind.lean_acceleration", self.balance.grind.lean_acceleration),
            ("balance.grind.wobble_base", self.balance.grind.wobble_base),
            ("balance.grind.wobble_growth", self.balance.grind.wobble_growth),
            ("balance.manual.lean_gravity", self.balance.manual.lean_gravity),
            ("balance.manual.lean_acceleration", self.balance.manual.lean_acceleration),
            ("balance.manual.wobble_base", self.balance.manual.wobble_base),
            ("balance.manual.wobble_growth", self.balance.manual.wobble_growth),
        ];
        for (field, range) in ranges {
            if !range.at_min.is_finite() || !range.at_max.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "range endpoints must be finite".to_string(),
                });
            }
        }

        let non_negative = [
            ("min_grind_speed", self.min_grind_speed),
            ("grind_entry_speed_boost", self.grind_entry_speed_boost),
            ("brake_force", self.brake_force),
            ("coast_deceleration", self.coast_deceleration),
            ("standard_switch_multiplier", self.standard_switch_multiplier),
            ("color_tolerance", self.color_tolerance),
            ("grind.speed_boost", self.grind.speed_boost),
            ("grind.min_speed", self.grind.min_speed),
            ("grind.max_speed", self.grind.max_speed),
            ("grind.acceleration", self.grind.acceleration),
            ("grind.deceleration", self.grind.deceleration),
            ("grind.snap_strength", self.grind.snap_strength),
            ("grind.end_distance", self.grind.end_distance),
            ("grind.min_speed_to_bail", self.grind.min_speed_to_bail),
            ("grind.jump_boost", self.grind.jump_boost),
            ("grind.directional_push_force", self.grind.directional_push_force),
            ("balance.grind.wobble_max", self.balance.grind.wobble_max),
            ("balance.manual.wobble_max", self.balance.manual.wobble_max),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected a finite non-negative number, got {value}"),
                });
            }
        }

        for (field, threshold) in [
            ("balance.grind.bail_threshold", self.balance.grind.bail_threshold),
            ("balance.manual.bail_threshold", self.balance.manual.bail_threshold),
        ] {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("bail threshold must be positive, got {threshold}"),
                });
            }
        }

        if self.grind.min_speed > self.grind.max_speed {
            return Err(ConfigError::Invalid {
                field: "grind.min_speed",
                reason: format!(
                    "min speed {} exceeds max speed {}",
                    self.grind.min_speed, self.grind.max_speed
                ),
            });
        }
        Ok(())
    }
}

/// Per-skater stats in the `0..=10` range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkaterStats {
    pub ollie: f32,
    pub speed: f32,
    pub spin: f32,
    pub flip_speed: f32,
    pub rail_balance: f32,
    pub manual: f32,
    pub accel: f32,
}

impl Default for SkaterStats {
    fn default() -> Self {
        Self {
            ollie: 5.0,
            speed: 5.0,
            spin: 5.0,
            flip_speed: 5.0,
            rail_balance: 5.0,
            manual: 5.0,
            accel: 5.0,
        }
    }
}

impl SkaterStats {
    /// Load a stand-alone stat profile from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stats: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        stats.validate()?;
        Ok(stats)
    }

    /// Stats may sit outside `0..=10` (lookups clamp) but must be finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let stats = [
            ("stats.ollie", self.ollie),
            ("stats.speed", self.speed),
            ("stats.spin", self.spin),
            ("stats.flip_speed", self.flip_speed),
            ("stats.rail_balance", self.rail_balance),
            ("stats.manual", self.manual),
            ("stats.accel", self.accel),
        ];
        for (field, value) in stats {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected a finite stat, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Combined skater configuration file (`skater.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkaterConfig {
    #[serde(default)]
    pub physics: PhysicsParameterTable,
    #[serde(default)]
    pub stats: SkaterStats,
}

impl SkaterConfig {
    /// Load skater configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.physics.validate()?;
        config.stats.validate()?;
        Ok(config)
    }
}

/// Errors that can occur when loading skater configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to parse inline config: {0}")]
    ParseInline(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
