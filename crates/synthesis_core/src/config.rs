//! Configuration management for fusion parameters.
//!
//! Strongly-typed configuration that maps to a `config.toml` file. Every
//! section has a `Default` so a partial file only overrides what it names.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! seed = 42
//!
//! [fusion]
//! enabled = true
//! work_required = 1200.0
//! gestation_ticks = 60000
//!
//! [inheritance]
//! inherit_xeno = false
//! excluded_trait_tags = ["Archite"]
//!
//! [[assembly.materials]]
//! label = "biomass"
//! defs = ["Biomass", "RawMeat"]
//! count = 62
//! ```

use serde::{Deserialize, Serialize};

/// Fusion stage timing and gating.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FusionConfig {
    pub enabled: bool,
    /// Work units both donors must accumulate before gestation starts.
    pub work_required: f32,
    /// Powered station ticks gestation lasts.
    pub gestation_ticks: u64,
    /// Station ticks between re-issues of slot jobs to drifting donors.
    pub slot_reissue_interval: u64,
    /// Radius of the fallback search for slot cells.
    pub slot_search_radius: i32,
    /// Only accept work while both donors are awake and not downed.
    pub require_eligible_state: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            work_required: 1200.0,
            gestation_ticks: 60_000,
            slot_reissue_interval: 90,
            slot_search_radius: 6,
            require_eligible_state: true,
        }
    }
}

/// Which traits pass to the offspring and how conflicts are weighted.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct InheritanceConfig {
    pub inherit_germline: bool,
    pub inherit_xeno: bool,
    pub excluded_trait_names: Vec<String>,
    pub excluded_trait_tags: Vec<String>,
    /// Randomly trim each layer down to its cap. Off by default.
    pub trim_to_caps: bool,
    pub max_germline: usize,
    pub max_xeno: usize,
    /// Never removed by cap trimming.
    pub essential_traits: Vec<String>,
    /// Numerator of the ownership weight `scale / (1 + complexity)`.
    pub ownership_weight_scale: f64,
}

impl Default for InheritanceConfig {
    fn default() -> Self {
        Self {
            inherit_germline: true,
            inherit_xeno: true,
            excluded_trait_names: Vec::new(),
            excluded_trait_tags: Vec::new(),
            trim_to_caps: false,
            max_germline: 24,
            max_xeno: 12,
            essential_traits: Vec::new(),
            ownership_weight_scale: 100.0,
        }
    }
}

/// One material category the assembly stage consumes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MaterialRequirement {
    pub label: String,
    /// Item defs that count towards this category.
    pub defs: Vec<String>,
    pub count: u32,
}

impl MaterialRequirement {
    pub fn new(label: &str, defs: &[&str], count: u32) -> Self {
        Self {
            label: label.to_string(),
            defs: defs.iter().map(|d| d.to_string()).collect(),
            count,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AssemblyConfig {
    pub materials: Vec<MaterialRequirement>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            materials: vec![
                MaterialRequirement::new("biomass", &["Biomass", "RawMeat"], 62),
                MaterialRequirement::new("polymer", &["Polymer"], 15),
                MaterialRequirement::new("catalyst", &["Catalyst"], 3),
            ],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub fusion: FusionConfig,
    pub inheritance: InheritanceConfig,
    pub assembly: AssemblyConfig,
    /// Seed for the runtime rng; `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a
    /// description of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.fusion.work_required.is_finite() && self.fusion.work_required > 0.0,
            "Fusion work required must be positive"
        );
        anyhow::ensure!(
            self.fusion.gestation_ticks > 0,
            "Gestation ticks must be positive"
        );
        anyhow::ensure!(
            self.fusion.slot_reissue_interval > 0,
            "Slot reissue interval must be positive"
        );
        anyhow::ensure!(
            (1..=6).contains(&self.fusion.slot_search_radius),
            "Slot search radius must be in [1, 6]"
        );

        anyhow::ensure!(
            self.inheritance.ownership_weight_scale.is_finite()
                && self.inheritance.ownership_weight_scale > 0.0,
            "Ownership weight scale must be positive"
        );
        if self.inheritance.trim_to_caps {
            anyhow::ensure!(
                self.inheritance.max_germline > 0 || !self.inheritance.inherit_germline,
                "Germline cap must be positive when trimming"
            );
        }

        anyhow::ensure!(
            !self.assembly.materials.is_empty(),
            "Assembly needs at least one material requirement"
        );
        for req in &self.assembly.materials {
            anyhow::ensure!(
                !req.defs.is_empty(),
                "Material '{}' lists no item defs",
                req.label
            );
            anyhow::ensure!(req.count > 0, "Material '{}' count must be positive", req.label);
        }

        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stable hash of the rules that affect outcomes, stamped on reports.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.fusion).as_bytes());
        hasher.update(format!("{:?}", self.inheritance).as_bytes());
        hasher.update(format!("{:?}", self.assembly).as_bytes());
        hex::encode(hasher.finalize())
    }
}
