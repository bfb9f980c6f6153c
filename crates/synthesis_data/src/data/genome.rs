use serde::{Deserialize, Serialize};

/// The two independently inheritable trait categories an agent carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraitLayer {
    /// Traits the agent was born with.
    Germline,
    /// Traits implanted later in life.
    Xeno,
}

/// Definition of a single heritable trait.
///
/// Identity is the `name`: two defs with the same name are the same trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitDef {
    pub name: String,
    /// Per-trait cost used when computing a donor's ownership weight.
    pub complexity: i32,
    /// Traits sharing any exclusion tag cannot be held together.
    #[serde(default)]
    pub exclusion_tags: Vec<String>,
    /// Free-form tags; exclusion lists in the config may match on them.
    #[serde(default)]
    pub tags: Vec<String>,
    /// `false` marks the trait as never passed on.
    #[serde(default = "default_true")]
    pub inheritable: bool,
    /// Cosmetic traits (skin tone family) follow the chosen parent exactly.
    #[serde(default)]
    pub cosmetic: bool,
}

fn default_true() -> bool {
    true
}

impl TraitDef {
    pub fn new(name: impl Into<String>, complexity: i32) -> Self {
        Self {
            name: name.into(),
            complexity,
            exclusion_tags: Vec::new(),
            tags: Vec::new(),
            inheritable: true,
            cosmetic: false,
        }
    }

    pub fn with_exclusion(mut self, tag: impl Into<String>) -> Self {
        self.exclusion_tags.push(tag.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn cosmetic(mut self) -> Self {
        self.cosmetic = true;
        self
    }

    pub fn non_inheritable(mut self) -> Self {
        self.inheritable = false;
        self
    }

    /// Two distinct traits conflict when they share an exclusion tag.
    pub fn conflicts_with(&self, other: &TraitDef) -> bool {
        self.name != other.name
            && self
                .exclusion_tags
                .iter()
                .any(|tag| other.exclusion_tags.contains(tag))
    }
}

/// Base coloration copied from the chosen parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub skin: [u8; 3],
    pub hair: [u8; 3],
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            skin: [224, 186, 160],
            hair: [60, 40, 30],
        }
    }
}

/// The full trait set an agent carries, split by layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub germline: Vec<TraitDef>,
    pub xeno: Vec<TraitDef>,
}

impl Genome {
    pub fn layer(&self, layer: TraitLayer) -> &[TraitDef] {
        match layer {
            TraitLayer::Germline => &self.germline,
            TraitLayer::Xeno => &self.xeno,
        }
    }

    pub fn layer_mut(&mut self, layer: TraitLayer) -> &mut Vec<TraitDef> {
        match layer {
            TraitLayer::Germline => &mut self.germline,
            TraitLayer::Xeno => &mut self.xeno,
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &TraitDef> {
        self.germline.iter().chain(self.xeno.iter())
    }

    pub fn has(&self, name: &str) -> bool {
        self.all().any(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.germline.len() + self.xeno.len()
    }

    pub fn is_empty(&self) -> bool {
        self.germline.is_empty() && self.xeno.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_requires_shared_tag() {
        let a = TraitDef::new("Tall", 1).with_exclusion("height");
        let b = TraitDef::new("Short", 1).with_exclusion("height");
        let c = TraitDef::new("Fast", 1).with_exclusion("speed");
        assert!(a.conflicts_with(&b));
        assert!(!a.conflicts_with(&c));
        assert!(!a.conflicts_with(&a.clone()));
    }

    #[test]
    fn test_trait_def_defaults_from_json() {
        let def: TraitDef = serde_json::from_str(r#"{"name":"Tough","complexity":2}"#).unwrap();
        assert!(def.inheritable);
        assert!(!def.cosmetic);
        assert!(def.exclusion_tags.is_empty());
    }
}
