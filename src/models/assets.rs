use std::collections::BTreeSet;
use std::fmt;

/// Output subdirectory an asset path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Meshes,
    Textures,
}

impl AssetCategory {
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetCategory::Meshes => "Meshes",
            AssetCategory::Textures => "Textures",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Mesh and texture paths required by one NPC.
///
/// Paths are stored exactly as they appear in the records (no case or separator
/// normalization). Ordered sets keep copy order and warnings deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPathSet {
    pub meshes: BTreeSet<String>,
    pub textures: BTreeSet<String>,
}

impl AssetPathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty paths are dropped.
    pub fn add_mesh(&mut self, path: &str) {
        if !path.is_empty() {
            self.meshes.insert(path.to_string());
        }
    }

    /// Empty paths are dropped.
    pub fn add_texture(&mut self, path: &str) {
        if !path.is_empty() {
            self.textures.insert(path.to_string());
        }
    }

    pub fn get(&self, category: AssetCategory) -> &BTreeSet<String> {
        match category {
            AssetCategory::Meshes => &self.meshes,
            AssetCategory::Textures => &self.textures,
        }
    }

    pub fn len(&self) -> usize {
        self.meshes.len() + self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty() && self.textures.is_empty()
    }

    /// True if every path in `self` is also in `other`.
    pub fn is_subset(&self, other: &AssetPathSet) -> bool {
        self.meshes.is_subset(&other.meshes) && self.textures.is_subset(&other.textures)
    }
}
