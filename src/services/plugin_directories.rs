//! Locating the directory each forwarded plugin's assets are read from.

use crate::models::{Mode, ModKey};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;
use thiserror::Error;

/// Plugin -> directory holding that plugin's loose assets. Built once before copying.
pub type PluginDirectoryMap = IndexMap<ModKey, Utf8PathBuf>;

#[derive(Error, Debug)]
pub enum DirectoryResolutionError {
    #[error("Cannot find any folder within {root} that contains plugin {plugin}")]
    NoFolderContainsPlugin { root: Utf8PathBuf, plugin: ModKey },

    #[error("Failed to list mod folders in {root}: {source}")]
    ReadModsFolder {
        root: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Map every plugin in `plugins` to its source directory.
///
/// With no `mods_folder` configured the map is empty. In [`Mode::Simple`] every plugin maps
/// to `data_folder`; in [`Mode::Deep`] each plugin maps to the first subfolder of
/// `mods_folder` containing a file named after the plugin.
pub fn resolve_plugin_directories<'a>(
    plugins: impl IntoIterator<Item = &'a ModKey>,
    mode: Mode,
    mods_folder: &Utf8Path,
    data_folder: &Utf8Path,
) -> Result<PluginDirectoryMap, DirectoryResolutionError> {
    let mut directories = PluginDirectoryMap::new();

    if mods_folder.as_str().is_empty() {
        tracing::debug!("No mods folder configured, plugin directories left unresolved");
        return Ok(directories);
    }

    for plugin in plugins {
        // The same plugin may be listed more than once; the first resolution stands.
        if directories.contains_key(plugin) {
            continue;
        }

        let directory = match mode {
            Mode::Simple => data_folder.to_path_buf(),
            Mode::Deep => find_plugin_folder(plugin, mods_folder)?,
        };

        tracing::info!("Assets for {} will be read from {}", plugin, directory);
        directories.insert(plugin.clone(), directory);
    }

    Ok(directories)
}

/// First immediate subfolder of `mods_folder` that contains `plugin`.
///
/// Folders are checked in directory listing order, which the OS does not guarantee to be
/// sorted. If two mod folders both contain the plugin, which one wins may differ between
/// platforms.
pub fn find_plugin_folder(
    plugin: &ModKey,
    mods_folder: &Utf8Path,
) -> Result<Utf8PathBuf, DirectoryResolutionError> {
    let read_error = |source: std::io::Error| DirectoryResolutionError::ReadModsFolder {
        root: mods_folder.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(mods_folder).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;

        let Ok(dir) = Utf8PathBuf::from_path_buf(entry.path()) else {
            tracing::warn!("Skipping non UTF-8 mod folder: {}", entry.path().display());
            continue;
        };

        // `is_dir` follows symlinks and junctions.
        if !dir.is_dir() {
            continue;
        }

        if dir.join(plugin.file_name()).is_file() {
            return Ok(dir);
        }
    }

    Err(DirectoryResolutionError::NoFolderContainsPlugin {
        root: mods_folder.to_path_buf(),
        plugin: plugin.clone(),
    })
}
