//! The output plugin ("patch") that forwarded NPC overrides are written into.

use crate::models::{FormKey, ModKey, Npc, Record, RemapTable};
use crate::services::load_order::LinkCache;
use anyhow::{Context, Result};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;

/// First local id handed out for records created in the patch.
pub const FIRST_NEW_FORM_ID: u32 = 0x800;

/// Output plugin holding NPC overrides and records duplicated from forwarded plugins.
///
/// NPC overrides keep the FormKey of the NPC they override; duplicated records get new
/// FormKeys owned by the patch. Both are kept in insertion order so the written file is
/// stable across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchPlugin {
    mod_key: ModKey,
    next_form_id: u32,
    #[serde(default, with = "keyed_list")]
    npcs: IndexMap<FormKey, Npc>,
    #[serde(default, with = "keyed_list")]
    records: IndexMap<FormKey, Record>,
}

impl PatchPlugin {
    pub fn new(mod_key: impl Into<ModKey>) -> Self {
        Self {
            mod_key: mod_key.into(),
            next_form_id: FIRST_NEW_FORM_ID,
            npcs: IndexMap::new(),
            records: IndexMap::new(),
        }
    }

    pub fn mod_key(&self) -> &ModKey {
        &self.mod_key
    }

    /// NPC overrides plus duplicated records.
    pub fn len(&self) -> usize {
        self.npcs.len() + self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty() && self.records.is_empty()
    }

    pub fn contains(&self, form_key: &FormKey) -> bool {
        self.npcs.contains_key(form_key) || self.records.contains_key(form_key)
    }

    pub fn npc(&self, form_key: &FormKey) -> Option<&Npc> {
        self.npcs.get(form_key)
    }

    pub fn npcs(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.values()
    }

    /// A record duplicated into the patch, by its new FormKey.
    pub fn get(&self, form_key: &FormKey) -> Option<&Record> {
        self.records.get(form_key)
    }

    /// Records duplicated into the patch.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Copy `npc` into the patch as an override, or return the override already there.
    pub fn get_or_add_npc_override(&mut self, npc: &Npc) -> &mut Npc {
        self.npcs
            .entry(npc.form_key.clone())
            .or_insert_with(|| npc.clone())
    }

    fn next_form_key(&mut self) -> FormKey {
        let form_key = FormKey::new(self.next_form_id, self.mod_key.clone());
        self.next_form_id += 1;
        form_key
    }

    /// Duplicate into the patch every record referenced from it that originates in `only_from`.
    ///
    /// Each such record gets a new FormKey owned by the patch. Links of the duplicated
    /// records are followed as well, then every reference held by a patch record is
    /// rewritten to the new copies. Records already in the patch are never duplicated and
    /// links that don't resolve are left as they are.
    pub fn duplicate_from_only_referenced<L: LinkCache>(
        &mut self,
        link_cache: &L,
        only_from: &ModKey,
    ) -> RemapTable {
        let mut remap = RemapTable::new();
        let mut pending: VecDeque<FormKey> = self
            .npcs
            .values()
            .flat_map(Npc::form_links)
            .chain(self.records.values().flat_map(Record::form_links))
            .collect();

        while let Some(link) = pending.pop_front() {
            if link.mod_key() != only_from || remap.contains_key(&link) || self.contains(&link) {
                continue;
            }

            let Some(source) = link_cache.resolve(&link) else {
                tracing::debug!("Skipping unresolved link {} while remapping", link);
                continue;
            };

            let mut duplicate = source.clone();
            let new_key = self.next_form_key();
            duplicate.set_form_key(new_key.clone());
            pending.extend(duplicate.form_links());

            tracing::debug!(
                "Duplicated {} {} as {}",
                duplicate.kind_name(),
                link,
                new_key
            );
            remap.insert(link, new_key.clone());
            self.records.insert(new_key, duplicate);
        }

        if !remap.is_empty() {
            let changed: usize = self
                .npcs
                .values_mut()
                .map(|npc| npc.remap_links(&remap))
                .chain(
                    self.records
                        .values_mut()
                        .map(|record| record.remap_links(&remap)),
                )
                .sum();
            tracing::debug!(
                "Remapped {} links to {} duplicated records",
                changed,
                remap.len()
            );
        }

        remap
    }

    /// Write the patch as YAML.
    pub fn write_yaml(&self, path: &Utf8Path) -> Result<()> {
        let yaml = serde_yaml_ng::to_string(self).context("Failed to serialize patch to YAML")?;

        fs::write(path, yaml).with_context(|| format!("Failed to write patch: {}", path))?;

        tracing::info!("Wrote {} records to {}", self.len(), path);
        Ok(())
    }

    pub fn from_yaml_file(path: &Utf8Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read patch: {}", path))?;

        serde_yaml_ng::from_str(&contents).with_context(|| format!("Failed to parse patch: {}", path))
    }
}

/// Stores a FormKey-indexed map as a plain list; the key is read back from each entry.
mod keyed_list {
    use crate::models::{FormKey, Npc, Record};
    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub trait Keyed {
        fn key(&self) -> &FormKey;
    }

    impl Keyed for Npc {
        fn key(&self) -> &FormKey {
            &self.form_key
        }
    }

    impl Keyed for Record {
        fn key(&self) -> &FormKey {
            self.form_key()
        }
    }

    pub fn serialize<T: Serialize, S: Serializer>(
        entries: &IndexMap<FormKey, T>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(entries.values())
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<IndexMap<FormKey, T>, D::Error>
    where
        T: Keyed + Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let entries = Vec::<T>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.key().clone(), entry))
            .collect())
    }
}
