//! `GenerationConfig`: the recognized option set for a pipeline run, and
//! its validation pass. Validation never panics - it always returns a
//! [`ValidationReport`]; `generate()` refuses to run while the report has
//! any `Error`-severity violation, unless the caller sets `skip_validation`.

use serde::{Deserialize, Serialize};

use crate::error::{Severity, ValidationReport, Violation};
use crate::seed::SeedBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    Bsp,
    Cellular,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BspConfig {
    pub min_room_size: u32,
    pub max_room_size: u32,
    pub split_ratio_min: f32,
    pub split_ratio_max: f32,
    pub room_padding: u32,
    pub corridor_width: u32,
    pub max_depth: Option<u32>,
    pub room_placement_chance: f32,
}

impl Default for BspConfig {
    fn default() -> Self {
        Self {
            min_room_size: 4,
            max_room_size: 10,
            split_ratio_min: 0.35,
            split_ratio_max: 0.65,
            room_padding: 1,
            corridor_width: 1,
            max_depth: Some(8),
            room_placement_chance: 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellularConfig {
    pub initial_fill_ratio: f32,
    pub birth_limit: u32,
    pub death_limit: u32,
    pub iterations: u32,
    pub min_region_size: u32,
    pub connect_all_regions: bool,
}

impl Default for CellularConfig {
    fn default() -> Self {
        Self {
            initial_fill_ratio: 0.45,
            birth_limit: 5,
            death_limit: 4,
            iterations: 4,
            min_region_size: 16,
            connect_all_regions: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    pub enemy_density: f32,
    pub treasure_ratio: f32,
    pub decoration_density: f32,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            enemy_density: 0.5,
            treasure_ratio: 0.2,
            decoration_density: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub width: u32,
    pub height: u32,
    pub seed: SeedBundle,
    pub algorithm: Algorithm,
    pub bsp: BspConfig,
    pub cellular: CellularConfig,
    pub content: ContentConfig,
    pub trace: bool,
    pub snapshots: bool,
    pub depth: f32,
    pub difficulty: f32,
    /// When set, `generate()` runs even if validation produced `Error`
    /// violations. Warnings never block generation.
    pub skip_validation: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 60,
            height: 40,
            seed: SeedBundle::default(),
            algorithm: Algorithm::Bsp,
            bsp: BspConfig::default(),
            cellular: CellularConfig::default(),
            content: ContentConfig::default(),
            trace: false,
            snapshots: false,
            depth: 1.0,
            difficulty: 1.0,
            skip_validation: false,
        }
    }
}

const MIN_DIMENSION: u32 = 20;

impl GenerationConfig {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if self.width < MIN_DIMENSION {
            report.push(Violation::error("width", format!("must be >= {MIN_DIMENSION}, got {}", self.width)));
        }
        if self.height < MIN_DIMENSION {
            report.push(Violation::error("height", format!("must be >= {MIN_DIMENSION}, got {}", self.height)));
        }

        match self.algorithm {
            Algorithm::Bsp | Algorithm::Hybrid => self.validate_bsp(&mut report),
            Algorithm::Cellular => {}
        }
        match self.algorithm {
            Algorithm::Cellular | Algorithm::Hybrid => self.validate_cellular(&mut report),
            Algorithm::Bsp => {}
        }

        if self.content.enemy_density < 0.0 || self.content.treasure_ratio < 0.0 || self.content.decoration_density < 0.0 {
            report.push(Violation::warning("content", "negative density/ratio values will be clamped to 0"));
        }

        report
    }

    fn validate_bsp(&self, report: &mut ValidationReport) {
        let b = &self.bsp;
        if b.min_room_size < 3 {
            report.push(Violation::error("bsp.min_room_size", "must be >= 3"));
        }
        if b.max_room_size < b.min_room_size {
            report.push(Violation::error("bsp.max_room_size", "must be >= min_room_size"));
        }
        if !(0.2..=0.8).contains(&b.split_ratio_min) {
            report.push(Violation::error("bsp.split_ratio_min", "must be within [0.2, 0.8]"));
        }
        if b.split_ratio_max < b.split_ratio_min {
            report.push(Violation::error("bsp.split_ratio_max", "must be >= split_ratio_min"));
        }
        if !(0.0..=1.0).contains(&b.room_placement_chance) {
            report.push(Violation::error("bsp.room_placement_chance", "must be within [0, 1]"));
        }
    }

    fn validate_cellular(&self, report: &mut ValidationReport) {
        let c = &self.cellular;
        if !(0.0..1.0).contains(&c.initial_fill_ratio) || c.initial_fill_ratio <= 0.0 {
            report.push(Violation::error("cellular.initial_fill_ratio", "must be within (0, 1)"));
        }
        if c.iterations == 0 {
            report.push(Violation::warning("cellular.iterations", "zero iterations leaves the raw noise fill unrefined"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = GenerationConfig::default();
        let report = cfg.validate();
        assert!(!report.has_errors(), "{:?}", report.violations);
    }

    #[test]
    fn undersized_dimensions_are_rejected() {
        let mut cfg = GenerationConfig::default();
        cfg.width = 5;
        let report = cfg.validate();
        assert!(report.has_errors());
        assert!(report.violations.iter().any(|v| v.field == "width" && v.severity == Severity::Error));
    }

    #[test]
    fn bsp_ratio_bounds_are_enforced() {
        let mut cfg = GenerationConfig::default();
        cfg.bsp.split_ratio_min = 0.1;
        assert!(cfg.validate().has_errors());
    }
}
