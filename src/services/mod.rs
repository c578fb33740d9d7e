//! Services module - Pure business logic for forwarding NPC appearances.
//!
//! The services take every input as an explicit parameter (settings, link cache, directory
//! map, ignore and suppression lists) and have no dependency on the command-line layer.
//!
//! # Components
//!
//! - [`LinkCache`] / [`LoadOrder`]: record resolution across the active load order
//! - [`PatchPlugin`]: the output plugin receiving NPC overrides and duplicated dependencies
//! - [`texture_set_paths`]: texture slot paths of a texture set
//! - [`AssetCollector`]: walks an NPC's head parts and worn armor to find every mesh and
//!   texture it needs
//! - [`resolve_plugin_directories`]: finds the folder each forwarded plugin's assets live in
//! - [`materialize`]: copies asset files into the output directory, warning about missing ones
//! - [`ForwardingService`]: drives the whole run
//!
//! # Flow
//!
//! 1. Resolve the plugin -> folder map once (Simple or Deep mode)
//! 2. For each plugin in the forwarding list, in order:
//!    - forward every selected NPC override from that plugin into the patch
//!    - collect and copy that NPC's assets from the plugin's folder
//!    - duplicate records referenced only from that plugin into the patch

pub mod asset_collection;
pub mod asset_copy;
pub mod forwarding;
pub mod load_order;
pub mod patch;
pub mod plugin_directories;
pub mod texture_sets;

pub use asset_collection::{AssetCollector, facegen_mesh_path, facegen_tint_path};
pub use asset_copy::{AssetCopyError, CopyReport, PathFilter, materialize, materialize_all};
pub use forwarding::{ForwardingError, ForwardingReport, ForwardingService, PluginForwardReport};
pub use load_order::{LinkCache, LoadOrder, PluginRecords, RecordContext};
pub use patch::PatchPlugin;
pub use plugin_directories::{
    DirectoryResolutionError, PluginDirectoryMap, find_plugin_folder, resolve_plugin_directories,
};
pub use texture_sets::{add_texture_set_paths, texture_set_paths};
