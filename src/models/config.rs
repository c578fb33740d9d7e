use crate::models::records::{FormKey, ModKey};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// How the source directory of each forwarded plugin is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Every forwarded plugin reads its assets from the active data folder.
    Simple,
    /// Each forwarded plugin reads its assets from the mod folder that contains the plugin file.
    #[default]
    Deep,
}

/// One entry of the forwarding list: which plugin, and which of its NPCs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginForwardSelection {
    #[serde(rename = "Plugin")]
    pub plugin: ModKey,

    #[serde(rename = "NPCs", default)]
    pub npcs: Vec<FormKey>,

    #[serde(rename = "InvertSelection", default)]
    pub invert_selection: bool,
}

impl PluginForwardSelection {
    pub fn new(plugin: impl Into<ModKey>) -> Self {
        Self {
            plugin: plugin.into(),
            npcs: Vec::new(),
            invert_selection: false,
        }
    }

    /// Listed NPCs are forwarded; with `invert_selection`, every unlisted NPC is instead.
    pub fn is_selected(&self, npc: &FormKey) -> bool {
        self.npcs.contains(npc) != self.invert_selection
    }
}

/// Forwarder settings from `Forwarder Settings.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwarderSettings {
    #[serde(rename = "PluginsToForward", default)]
    pub plugins_to_forward: Vec<PluginForwardSelection>,

    #[serde(rename = "CopyExtraAssets", default = "default_true")]
    pub copy_extra_assets: bool,

    #[serde(rename = "PluginsExcludedFromMerge", default)]
    pub plugins_excluded_from_merge: Vec<ModKey>,

    #[serde(rename = "PathsToIgnore", default)]
    pub paths_to_ignore: Vec<String>,

    #[serde(rename = "SuppressKnownMissingFileWarnings", default)]
    pub suppress_known_missing_file_warnings: bool,

    #[serde(rename = "AssetOutputDirectory", default)]
    pub asset_output_directory: Utf8PathBuf,

    /// Folder holding one subfolder per installed mod (e.g. the MO2 `mods` folder).
    /// Empty means not configured.
    #[serde(rename = "ModsFolderPath", default)]
    pub mods_folder_path: Utf8PathBuf,

    #[serde(rename = "Mode", default)]
    pub mode: Mode,

    #[serde(rename = "DataFolderPath", default)]
    pub data_folder_path: Utf8PathBuf,

    #[serde(rename = "OutputPluginName", default = "default_output_plugin_name")]
    pub output_plugin_name: String,
}

impl Default for ForwarderSettings {
    fn default() -> Self {
        Self {
            plugins_to_forward: Vec::new(),
            copy_extra_assets: true,
            plugins_excluded_from_merge: Vec::new(),
            paths_to_ignore: Vec::new(),
            suppress_known_missing_file_warnings: false,
            asset_output_directory: Utf8PathBuf::new(),
            mods_folder_path: Utf8PathBuf::new(),
            mode: Mode::default(),
            data_folder_path: Utf8PathBuf::new(),
            output_plugin_name: default_output_plugin_name(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_output_plugin_name() -> String {
    "NAPF Output.esp".to_string()
}

impl ForwarderSettings {
    pub fn has_mods_folder(&self) -> bool {
        !self.mods_folder_path.as_str().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = ForwarderSettings::default();
        assert!(settings.copy_extra_assets);
        assert!(!settings.suppress_known_missing_file_warnings);
        assert_eq!(settings.mode, Mode::Deep);
        assert_eq!(settings.output_plugin_name, "NAPF Output.esp");
        assert!(!settings.has_mods_folder());
    }

    #[test]
    fn test_selection_predicate() {
        let x: FormKey = "000801:Mod.esp".parse().unwrap();
        let y: FormKey = "000802:Mod.esp".parse().unwrap();
        let z: FormKey = "000803:Mod.esp".parse().unwrap();

        let mut selection = PluginForwardSelection::new("Mod.esp");
        selection.npcs = vec![x.clone(), y.clone()];

        assert!(selection.is_selected(&x));
        assert!(selection.is_selected(&y));
        assert!(!selection.is_selected(&z));

        selection.invert_selection = true;
        assert!(!selection.is_selected(&x));
        assert!(!selection.is_selected(&y));
        assert!(selection.is_selected(&z));
    }

    #[test]
    fn test_parse_settings_yaml() {
        let yaml = r#"
PluginsToForward:
  - Plugin: "Pretty Faces.esp"
    NPCs: ["013BBD:Skyrim.esm"]
  - Plugin: "Other.esp"
    InvertSelection: true
CopyExtraAssets: false
PluginsExcludedFromMerge: ["Skyrim.esm"]
PathsToIgnore: ["actors\\character\\female\\femalehead.nif"]
AssetOutputDirectory: "/tmp/out"
Mode: Simple
"#;
        let settings: ForwarderSettings = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(settings.plugins_to_forward.len(), 2);
        assert_eq!(settings.plugins_to_forward[0].npcs.len(), 1);
        assert!(settings.plugins_to_forward[1].invert_selection);
        assert!(!settings.copy_extra_assets);
        assert!(
            settings
                .plugins_excluded_from_merge
                .contains(&ModKey::from("skyrim.esm"))
        );
        assert_eq!(
            settings.paths_to_ignore[0],
            "actors\\character\\female\\femalehead.nif"
        );
        assert_eq!(settings.mode, Mode::Simple);
        assert_eq!(settings.asset_output_directory, Utf8PathBuf::from("/tmp/out"));
    }
}
