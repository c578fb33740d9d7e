use crate::models::TextureSet;
use std::collections::BTreeSet;

/// Collect the non-empty texture slot paths of a texture set.
pub fn texture_set_paths(texture_set: &TextureSet) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    add_texture_set_paths(texture_set, &mut paths);
    paths
}

/// Add the non-empty texture slot paths of `texture_set` to `paths`.
pub fn add_texture_set_paths(texture_set: &TextureSet, paths: &mut BTreeSet<String>) {
    for slot in texture_set.slots().into_iter().flatten() {
        if !slot.is_empty() {
            paths.insert(slot.to_string());
        }
    }
}
