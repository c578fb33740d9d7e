//! Record resolution across a load order.
//!
//! Parsing the binary plugin format is out of scope for this crate. A load order is read
//! from a YAML snapshot listing each plugin (lowest priority first) with the records it
//! defines or overrides:
//!
//! ```yaml
//! plugins:
//!   - mod_key: Skyrim.esm
//!     records:
//!       - type: Npc
//!         form_key: 013BBD:Skyrim.esm
//!         head_parts: ["000D62:Skyrim.esm"]
//!   - mod_key: Pretty Faces.esp
//!     records: [...]
//! ```

use crate::models::{FormKey, ModKey, Npc, Record, RecordKind};
use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

/// One plugin's version of a record.
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    pub mod_key: &'a ModKey,
    pub record: &'a Record,
}

/// Record lookup over the active load order.
pub trait LinkCache {
    /// The winning override of `form_key`, if any plugin defines it.
    fn resolve(&self, form_key: &FormKey) -> Option<&Record>;

    /// Every plugin's version of `form_key`, winning override first.
    fn resolve_all_contexts(&self, form_key: &FormKey) -> Vec<RecordContext<'_>>;

    /// The winning override of every NPC in the load order.
    fn winning_npcs(&self) -> Vec<&Npc>;

    /// Resolve `form_key` as a specific record kind. A record of another kind counts as a miss.
    fn try_resolve<T: RecordKind>(&self, form_key: &FormKey) -> Option<&T> {
        self.resolve(form_key).and_then(T::from_record)
    }
}

/// Records contributed by one plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecords {
    pub mod_key: ModKey,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl PluginRecords {
    pub fn new(mod_key: impl Into<ModKey>) -> Self {
        Self {
            mod_key: mod_key.into(),
            records: Vec::new(),
        }
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoadOrderSnapshot {
    #[serde(default)]
    plugins: Vec<PluginRecords>,
}

/// In-memory load order; later plugins win.
#[derive(Debug, Clone, Default)]
pub struct LoadOrder {
    plugins: Vec<PluginRecords>,
    /// FormKey -> (plugin index, record index), in load order.
    index: HashMap<FormKey, Vec<(usize, usize)>>,
}

impl LoadOrder {
    pub fn new(plugins: Vec<PluginRecords>) -> Self {
        let mut index: HashMap<FormKey, Vec<(usize, usize)>> = HashMap::new();

        for (plugin_idx, plugin) in plugins.iter().enumerate() {
            for (record_idx, record) in plugin.records.iter().enumerate() {
                let entries = index.entry(record.form_key().clone()).or_default();
                // A plugin listing the same record twice keeps its last copy.
                if let Some(last) = entries.last_mut() {
                    if last.0 == plugin_idx {
                        *last = (plugin_idx, record_idx);
                        continue;
                    }
                }
                entries.push((plugin_idx, record_idx));
            }
        }

        Self { plugins, index }
    }

    /// Load a load order snapshot from YAML.
    pub fn from_yaml_file(path: &Utf8Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read load order snapshot: {}", path))?;

        let snapshot: LoadOrderSnapshot = serde_yaml_ng::from_str(&contents)
            .with_context(|| format!("Failed to parse load order snapshot: {}", path))?;

        let load_order = Self::new(snapshot.plugins);
        tracing::info!(
            "Loaded load order from {} ({} plugins, {} records)",
            path,
            load_order.plugins.len(),
            load_order.index.len()
        );

        Ok(load_order)
    }

    pub fn plugins(&self) -> &[PluginRecords] {
        &self.plugins
    }

    pub fn contains_plugin(&self, mod_key: &ModKey) -> bool {
        self.plugins.iter().any(|p| &p.mod_key == mod_key)
    }

    fn record_at(&self, (plugin_idx, record_idx): (usize, usize)) -> RecordContext<'_> {
        let plugin = &self.plugins[plugin_idx];
        RecordContext {
            mod_key: &plugin.mod_key,
            record: &plugin.records[record_idx],
        }
    }
}

impl LinkCache for LoadOrder {
    fn resolve(&self, form_key: &FormKey) -> Option<&Record> {
        let location = *self.index.get(form_key)?.last()?;
        Some(self.record_at(location).record)
    }

    fn resolve_all_contexts(&self, form_key: &FormKey) -> Vec<RecordContext<'_>> {
        self.index
            .get(form_key)
            .map(|locations| {
                locations
                    .iter()
                    .rev()
                    .map(|&location| self.record_at(location))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn winning_npcs(&self) -> Vec<&Npc> {
        // Walk plugins in load order so NPCs come out in a stable order.
        let mut npcs = Vec::new();
        for (plugin_idx, plugin) in self.plugins.iter().enumerate() {
            for (record_idx, record) in plugin.records.iter().enumerate() {
                let form_key = record.form_key();
                let first_definition = self
                    .index
                    .get(form_key)
                    .and_then(|locations| locations.first())
                    .copied();
                if first_definition != Some((plugin_idx, record_idx)) {
                    continue;
                }
                if let Some(npc) = self.try_resolve::<Npc>(form_key) {
                    npcs.push(npc);
                }
            }
        }
        npcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HeadPart, TextureSet};

    fn fk(s: &str) -> FormKey {
        s.parse().unwrap()
    }

    fn npc(form_key: &str, name: &str) -> Record {
        Record::Npc(Npc {
            form_key: fk(form_key),
            editor_id: Some(name.to_string()),
            name: Some(name.to_string()),
            head_parts: Vec::new(),
            worn_armor: None,
        })
    }

    fn sample_load_order() -> LoadOrder {
        LoadOrder::new(vec![
            PluginRecords::new("Skyrim.esm")
                .with_record(npc("013BBD:Skyrim.esm", "Lydia"))
                .with_record(npc("013BBE:Skyrim.esm", "Faendal")),
            PluginRecords::new("Faces.esp").with_record(npc("013BBD:Skyrim.esm", "Lydia Faces")),
            PluginRecords::new("Later.esp").with_record(npc("013BBD:Skyrim.esm", "Lydia Later")),
        ])
    }

    #[test]
    fn test_resolve_returns_winning_override() {
        let lo = sample_load_order();
        let npc = lo.try_resolve::<Npc>(&fk("013BBD:Skyrim.esm")).unwrap();
        assert_eq!(npc.name.as_deref(), Some("Lydia Later"));
    }

    #[test]
    fn test_resolve_all_contexts_winning_first() {
        let lo = sample_load_order();
        let contexts = lo.resolve_all_contexts(&fk("013BBD:Skyrim.esm"));
        let plugins: Vec<_> = contexts.iter().map(|c| c.mod_key.file_name()).collect();
        assert_eq!(plugins, vec!["Later.esp", "Faces.esp", "Skyrim.esm"]);
    }

    #[test]
    fn test_resolve_missing_and_wrong_kind() {
        let lo = sample_load_order();
        assert!(lo.resolve(&fk("000001:Nope.esp")).is_none());
        assert!(lo.try_resolve::<HeadPart>(&fk("013BBD:Skyrim.esm")).is_none());
        assert!(lo.try_resolve::<TextureSet>(&fk("013BBD:Skyrim.esm")).is_none());
    }

    #[test]
    fn test_winning_npcs_listed_once() {
        let lo = sample_load_order();
        let npcs = lo.winning_npcs();
        assert_eq!(npcs.len(), 2);
        assert_eq!(npcs[0].name.as_deref(), Some("Lydia Later"));
        assert_eq!(npcs[1].name.as_deref(), Some("Faendal"));
    }

    #[test]
    fn test_load_from_yaml_snapshot() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = camino::Utf8PathBuf::try_from(temp_dir.path().join("lo.yaml")).unwrap();
        fs::write(
            &path,
            r#"
plugins:
  - mod_key: Skyrim.esm
    records:
      - type: Npc
        form_key: 013BBD:Skyrim.esm
        head_parts: ["000D62:Skyrim.esm"]
      - type: HeadPart
        form_key: 000D62:Skyrim.esm
        model: actors\character\head.nif
"#,
        )
        .unwrap();

        let lo = LoadOrder::from_yaml_file(&path).unwrap();
        assert!(lo.contains_plugin(&ModKey::from("skyrim.esm")));
        let hp = lo.try_resolve::<HeadPart>(&fk("000D62:Skyrim.esm")).unwrap();
        assert_eq!(hp.model.as_deref(), Some("actors\\character\\head.nif"));
    }
}
