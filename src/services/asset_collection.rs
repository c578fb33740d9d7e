//! Discovery of every mesh and texture an NPC's appearance depends on.
//!
//! Starting from an NPC record, the collector walks its head parts (including nested extra
//! parts) and its worn armor's addons, resolving texture sets along the way. Every edge into
//! a record owned by an excluded plugin is skipped, and references that don't resolve
//! contribute nothing.

use crate::models::{Armor, ArmorAddon, AssetPathSet, FormKey, HeadPart, ModKey, Npc, TextureSet};
use crate::services::load_order::LinkCache;
use crate::services::texture_sets::add_texture_set_paths;
use std::collections::HashSet;

const FACEGEN_GEOMETRY_DIR: &str = "actors\\character\\facegendata\\facegeom";
const FACEGEN_TINT_DIR: &str = "actors\\character\\facegendata\\facetint";

/// FaceGen head mesh for an NPC, relative to `Meshes/`.
pub fn facegen_mesh_path(npc: &FormKey) -> String {
    format!(
        "{}\\{}\\00{}.nif",
        FACEGEN_GEOMETRY_DIR,
        npc.mod_key(),
        npc.id_string()
    )
}

/// FaceGen tint texture for an NPC, relative to `Textures/`.
pub fn facegen_tint_path(npc: &FormKey) -> String {
    format!(
        "{}\\{}\\00{}.dds",
        FACEGEN_TINT_DIR,
        npc.mod_key(),
        npc.id_string()
    )
}

/// Collects the asset paths of NPCs against one load order.
pub struct AssetCollector<'a, L: LinkCache> {
    link_cache: &'a L,
    excluded_plugins: HashSet<ModKey>,
    copy_extra_assets: bool,
}

impl<'a, L: LinkCache> AssetCollector<'a, L> {
    pub fn new(
        link_cache: &'a L,
        excluded_plugins: impl IntoIterator<Item = ModKey>,
        copy_extra_assets: bool,
    ) -> Self {
        Self {
            link_cache,
            excluded_plugins: excluded_plugins.into_iter().collect(),
            copy_extra_assets,
        }
    }

    fn is_excluded(&self, form_key: &FormKey) -> bool {
        self.excluded_plugins.contains(form_key.mod_key())
    }

    /// Every mesh and texture path `npc` needs.
    ///
    /// The FaceGen mesh and tint are always included; head part and armor assets only
    /// when extra assets are enabled.
    pub fn collect(&self, npc: &Npc) -> AssetPathSet {
        let mut assets = AssetPathSet::new();

        assets.add_mesh(&facegen_mesh_path(&npc.form_key));
        assets.add_texture(&facegen_tint_path(&npc.form_key));

        if !self.copy_extra_assets {
            return assets;
        }

        let mut visited = HashSet::new();
        for head_part in &npc.head_parts {
            if !self.is_excluded(head_part) {
                self.collect_head_part(head_part, &mut visited, &mut assets);
            }
        }

        if let Some(armor) = npc
            .worn_armor
            .as_ref()
            .and_then(|key| self.link_cache.try_resolve::<Armor>(key))
        {
            for addon in &armor.armature {
                if !self.is_excluded(addon) {
                    self.collect_armor_addon(addon, &mut assets);
                }
            }
        }

        tracing::debug!(
            "Collected {} meshes and {} textures for {}",
            assets.meshes.len(),
            assets.textures.len(),
            npc.form_key
        );

        assets
    }

    /// Depth-first walk over a head part and its extra parts.
    ///
    /// Extra parts may reference each other in a cycle, so each head part is visited once.
    fn collect_head_part(
        &self,
        root: &FormKey,
        visited: &mut HashSet<FormKey>,
        assets: &mut AssetPathSet,
    ) {
        let mut stack = vec![root.clone()];

        while let Some(key) = stack.pop() {
            if !visited.insert(key.clone()) {
                continue;
            }

            let Some(head_part) = self.link_cache.try_resolve::<HeadPart>(&key) else {
                continue;
            };

            if let Some(model) = &head_part.model {
                assets.add_mesh(model);
            }

            for part in &head_part.parts {
                assets.add_mesh(part);
            }

            if let Some(texture_set) = &head_part.texture_set {
                self.collect_texture_set(texture_set, assets);
            }

            // Reverse so extra parts are walked in record order.
            for extra in head_part.extra_parts.iter().rev() {
                if !self.is_excluded(extra) && !visited.contains(extra) {
                    stack.push(extra.clone());
                }
            }
        }
    }

    fn collect_armor_addon(&self, key: &FormKey, assets: &mut AssetPathSet) {
        let Some(addon) = self.link_cache.try_resolve::<ArmorAddon>(key) else {
            return;
        };

        for model in addon.world_model.iter() {
            assets.add_mesh(model);
        }

        for skin in addon.skin_texture.iter() {
            self.collect_texture_set(skin, assets);
        }
    }

    fn collect_texture_set(&self, key: &FormKey, assets: &mut AssetPathSet) {
        if self.is_excluded(key) {
            return;
        }

        if let Some(texture_set) = self.link_cache.try_resolve::<TextureSet>(key) {
            add_texture_set_paths(texture_set, &mut assets.textures);
        }
    }
}
