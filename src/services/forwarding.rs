use crate::metrics::Metrics;
use crate::models::{FormKey, ForwarderSettings, ModKey, Npc, PluginForwardSelection, RecordKind};
use crate::services::asset_collection::AssetCollector;
use crate::services::asset_copy::{AssetCopyError, CopyReport, PathFilter, materialize_all};
use crate::services::load_order::LinkCache;
use crate::services::patch::PatchPlugin;
use crate::services::plugin_directories::PluginDirectoryMap;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Errors that abort a forwarding run
#[derive(Error, Debug)]
pub enum ForwardingError {
    #[error("Plugin -> folder map does not contain an entry for plugin {0}")]
    MissingDirectoryMapping(ModKey),

    #[error(transparent)]
    AssetCopy(#[from] AssetCopyError),
}

/// Outcome of forwarding one plugin
#[derive(Debug, Clone)]
pub struct PluginForwardReport {
    pub plugin: ModKey,
    pub source_dir: Utf8PathBuf,
    pub npcs_forwarded: Vec<FormKey>,
    pub records_duplicated: usize,
    pub copy: CopyReport,
}

/// Outcome of a whole forwarding run, one entry per forwarding list entry
#[derive(Debug, Clone, Default)]
pub struct ForwardingReport {
    pub plugins: Vec<PluginForwardReport>,
}

impl ForwardingReport {
    pub fn npcs_forwarded(&self) -> usize {
        self.plugins.iter().map(|p| p.npcs_forwarded.len()).sum()
    }
}

/// Forwards selected NPC appearance overrides into a patch and copies their assets.
///
/// Plugins are handled one at a time in forwarding list order. For each plugin every
/// winning NPC is checked for an override from that plugin; selected overrides are copied
/// into the patch, their assets copied from the plugin's source directory, and finally
/// records only referenced from that plugin are duplicated into the patch. An NPC already
/// forwarded by an earlier entry is left alone.
pub struct ForwardingService<'a> {
    settings: &'a ForwarderSettings,
    filter: PathFilter,
    metrics: Metrics,
}

impl<'a> ForwardingService<'a> {
    /// `warnings_to_suppress` is the list of known missing files; it only takes effect when
    /// suppression is enabled in `settings`.
    pub fn new(settings: &'a ForwarderSettings, warnings_to_suppress: &[String]) -> Self {
        Self {
            filter: PathFilter::new(
                &settings.paths_to_ignore,
                warnings_to_suppress,
                settings.suppress_known_missing_file_warnings,
            ),
            settings,
            metrics: Metrics::new(),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Directory the assets of `plugin` are read from.
    ///
    /// Without a mods folder the plugin directories are never resolved and assets come from
    /// the active data folder.
    fn source_directory<'d>(
        &'d self,
        plugin: &ModKey,
        directories: &'d PluginDirectoryMap,
    ) -> Result<&'d Utf8Path, ForwardingError> {
        if let Some(dir) = directories.get(plugin) {
            return Ok(dir);
        }

        if !self.settings.has_mods_folder() {
            return Ok(&self.settings.data_folder_path);
        }

        Err(ForwardingError::MissingDirectoryMapping(plugin.clone()))
    }

    /// Run every entry of the forwarding list.
    pub fn run<L: LinkCache>(
        &self,
        link_cache: &L,
        patch: &mut PatchPlugin,
        directories: &PluginDirectoryMap,
    ) -> Result<ForwardingReport, ForwardingError> {
        let collector = AssetCollector::new(
            link_cache,
            self.settings.plugins_excluded_from_merge.iter().cloned(),
            self.settings.copy_extra_assets,
        );

        let mut report = ForwardingReport::default();
        for selection in &self.settings.plugins_to_forward {
            report.plugins.push(self.forward_plugin(
                selection,
                link_cache,
                &collector,
                patch,
                directories,
            )?);
        }

        Ok(report)
    }

    fn forward_plugin<L: LinkCache>(
        &self,
        selection: &PluginForwardSelection,
        link_cache: &L,
        collector: &AssetCollector<'_, L>,
        patch: &mut PatchPlugin,
        directories: &PluginDirectoryMap,
    ) -> Result<PluginForwardReport, ForwardingError> {
        let plugin = &selection.plugin;
        tracing::info!("Processing {}", plugin);

        let source_dir = self.source_directory(plugin, directories)?;
        let output_dir = &self.settings.asset_output_directory;

        let mut npcs_forwarded = Vec::new();
        let mut copy = CopyReport::default();

        for winner in link_cache.winning_npcs() {
            for context in link_cache.resolve_all_contexts(&winner.form_key) {
                if context.mod_key != plugin {
                    continue;
                }

                let Some(npc) = Npc::from_record(context.record) else {
                    continue;
                };

                if !selection.is_selected(&npc.form_key) {
                    continue;
                }

                // The first plugin in the forwarding list to forward an NPC owns both its
                // record and its FaceGen files.
                if patch.npc(&npc.form_key).is_some() {
                    tracing::warn!(
                        "{} was already forwarded from an earlier plugin, skipping the version from {}",
                        winner.display_string(),
                        plugin
                    );
                    continue;
                }

                tracing::info!("Forwarding appearance of {}", winner.display_string());
                patch.get_or_add_npc_override(npc);
                let assets = collector.collect(npc);

                let copied = materialize_all(&assets, source_dir, output_dir, &self.filter)?;
                self.metrics.record_npc_forwarded();
                self.metrics.record_copy(
                    copied.copied.len(),
                    copied.missing.len(),
                    copied.suppressed,
                    copied.ignored,
                );

                npcs_forwarded.push(npc.form_key.clone());
                copy.merge(copied);
            }
        }

        tracing::info!("Remapping Dependencies from {}.", plugin);
        let remap = patch.duplicate_from_only_referenced(link_cache, plugin);
        self.metrics.record_duplicated(remap.len());
        self.metrics.record_plugin_processed();

        Ok(PluginForwardReport {
            plugin: plugin.clone(),
            source_dir: source_dir.to_path_buf(),
            npcs_forwarded,
            records_duplicated: remap.len(),
            copy,
        })
    }
}
