//! Copying collected asset files into the output directory.
//!
//! Missing source files are expected (records often point at assets shipped in archives or
//! by other mods) and only produce a warning, which can be silenced with the list of known
//! missing files. Filesystem errors while writing the output abort the run.

use crate::models::{AssetCategory, AssetPathSet};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetCopyError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} to {to}: {source}")]
    CopyFile {
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Case-insensitive ignore and suppression lists applied to asset paths.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    ignored: HashSet<String>,
    suppressed: HashSet<String>,
    suppression_enabled: bool,
}

impl PathFilter {
    pub fn new<I, S>(paths_to_ignore: I, warnings_to_suppress: S, suppression_enabled: bool) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        Self {
            ignored: paths_to_ignore
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
            suppressed: warnings_to_suppress
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
            suppression_enabled,
        }
    }

    /// Ignored paths are never copied and never warned about.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored.contains(&path.to_lowercase())
    }

    /// A missing-file warning is suppressed only while suppression is enabled.
    pub fn is_suppressed(&self, path: &str) -> bool {
        self.suppression_enabled && self.suppressed.contains(&path.to_lowercase())
    }
}

/// What happened to each path handed to [`materialize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Destination files written.
    pub copied: Vec<Utf8PathBuf>,
    /// Source files that were missing and warned about.
    pub missing: Vec<Utf8PathBuf>,
    /// Source files that were missing but on the suppression list.
    pub suppressed: usize,
    /// Paths skipped because they are on the ignore list.
    pub ignored: usize,
    /// Paths skipped because they point outside the category folder.
    pub rejected: usize,
}

impl CopyReport {
    pub fn merge(&mut self, other: CopyReport) {
        self.copied.extend(other.copied);
        self.missing.extend(other.missing);
        self.suppressed += other.suppressed;
        self.ignored += other.ignored;
        self.rejected += other.rejected;
    }
}

/// Copy every path of one category from `source_dir` to `output_dir`.
///
/// `<source_dir>/<category>/<path>` is copied to `<output_dir>/<category>/<path>`, creating
/// missing directories and overwriting existing files. Paths are joined as stored apart from
/// leading separators; a path that would leave the category folder is skipped.
pub fn materialize(
    paths: &BTreeSet<String>,
    source_dir: &Utf8Path,
    output_dir: &Utf8Path,
    category: AssetCategory,
    filter: &PathFilter,
) -> Result<CopyReport, AssetCopyError> {
    let mut report = CopyReport::default();

    let destination_root = output_dir.join(category.dir_name());
    create_dir_all(&destination_root)?;

    let source_root = source_dir.join(category.dir_name());

    for path in paths {
        if filter.is_ignored(path) {
            tracing::debug!("Ignoring {}", path);
            report.ignored += 1;
            continue;
        }

        let Some(relative) = relative_asset_path(path) else {
            tracing::warn!(
                "Skipping asset path {} that points outside the {} folder",
                path,
                category
            );
            report.rejected += 1;
            continue;
        };

        let current_path = source_root.join(relative);
        if !current_path.is_file() {
            if filter.is_suppressed(path) {
                report.suppressed += 1;
            } else {
                tracing::warn!("File {} was not found", current_path);
                report.missing.push(current_path);
            }
            continue;
        }

        let dest_path = destination_root.join(relative);
        if let Some(parent) = dest_path.parent() {
            create_dir_all(parent)?;
        }

        fs::copy(&current_path, &dest_path).map_err(|source| AssetCopyError::CopyFile {
            from: current_path.clone(),
            to: dest_path.clone(),
            source,
        })?;

        tracing::debug!("Copied {} -> {}", current_path, dest_path);
        report.copied.push(dest_path);
    }

    Ok(report)
}

/// Copy both the meshes and the textures of `assets`.
pub fn materialize_all(
    assets: &AssetPathSet,
    source_dir: &Utf8Path,
    output_dir: &Utf8Path,
    filter: &PathFilter,
) -> Result<CopyReport, AssetCopyError> {
    let mut report = CopyReport::default();
    for category in [AssetCategory::Meshes, AssetCategory::Textures] {
        report.merge(materialize(
            assets.get(category),
            source_dir,
            output_dir,
            category,
            filter,
        )?);
    }
    Ok(report)
}

/// `path` relative to its category folder, or `None` if it cannot stay inside it.
///
/// Leading separators are dropped, since joining a rooted path would replace the
/// category folder instead of extending it.
fn relative_asset_path(path: &str) -> Option<&Utf8Path> {
    let relative = Utf8Path::new(path.trim_start_matches(['\\', '/']));
    let escapes = relative.components().any(|component| {
        matches!(
            component,
            Utf8Component::Prefix(_) | Utf8Component::RootDir | Utf8Component::ParentDir
        )
    });

    (!relative.as_str().is_empty() && !escapes).then_some(relative)
}

fn create_dir_all(path: &Utf8Path) -> Result<(), AssetCopyError> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|source| AssetCopyError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        source: Utf8PathBuf,
        output: Utf8PathBuf,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let source = root.join("source");
        let output = root.join("output");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&output).unwrap();
        Fixture {
            _temp_dir: temp_dir,
            source,
            output,
        }
    }

    fn write_source(fixture: &Fixture, category: AssetCategory, path: &str, contents: &str) {
        let full = fixture.source.join(category.dir_name()).join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, contents).unwrap();
    }

    fn paths(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_copies_into_category_directory() {
        let fx = fixture();
        write_source(&fx, AssetCategory::Meshes, "hair/hair.nif", "mesh");

        let report = materialize(
            &paths(&["hair/hair.nif"]),
            &fx.source,
            &fx.output,
            AssetCategory::Meshes,
            &PathFilter::default(),
        )
        .unwrap();

        let dest = fx.output.join("Meshes").join("hair/hair.nif");
        assert_eq!(report.copied, vec![dest.clone()]);
        assert_eq!(fs::read_to_string(dest).unwrap(), "mesh");
    }

    #[test]
    fn test_overwrites_existing_output() {
        let fx = fixture();
        write_source(&fx, AssetCategory::Textures, "skin.dds", "new");
        fs::create_dir_all(fx.output.join("Textures")).unwrap();
        fs::write(fx.output.join("Textures").join("skin.dds"), "old").unwrap();

        materialize(
            &paths(&["skin.dds"]),
            &fx.source,
            &fx.output,
            AssetCategory::Textures,
            &PathFilter::default(),
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(fx.output.join("Textures").join("skin.dds")).unwrap(),
            "new"
        );
    }

    #[test]
    fn test_ignore_is_case_insensitive() {
        let fx = fixture();
        write_source(&fx, AssetCategory::Meshes, "Foo.nif", "mesh");

        let filter = PathFilter::new(["foo.nif"], Vec::<String>::new(), false);
        let report = materialize(
            &paths(&["Foo.nif"]),
            &fx.source,
            &fx.output,
            AssetCategory::Meshes,
            &filter,
        )
        .unwrap();

        assert_eq!(report.ignored, 1);
        assert!(report.copied.is_empty());
        assert!(!fx.output.join("Meshes").join("Foo.nif").exists());
    }

    #[test]
    fn test_missing_file_suppression_policy() {
        let fx = fixture();

        let enabled = PathFilter::new(Vec::<String>::new(), ["X.dds"], true);
        let report = materialize(
            &paths(&["x.dds"]),
            &fx.source,
            &fx.output,
            AssetCategory::Textures,
            &enabled,
        )
        .unwrap();
        assert!(report.missing.is_empty());
        assert_eq!(report.suppressed, 1);

        let disabled = PathFilter::new(Vec::<String>::new(), ["x.dds"], false);
        let report = materialize(
            &paths(&["x.dds"]),
            &fx.source,
            &fx.output,
            AssetCategory::Textures,
            &disabled,
        )
        .unwrap();
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.suppressed, 0);
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let fx = fixture();
        write_source(&fx, AssetCategory::Meshes, "a.nif", "a");

        let assets = paths(&["a.nif", "missing.nif"]);
        let filter = PathFilter::default();

        let first = materialize(&assets, &fx.source, &fx.output, AssetCategory::Meshes, &filter)
            .unwrap();
        let second = materialize(&assets, &fx.source, &fx.output, AssetCategory::Meshes, &filter)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            fs::read_to_string(fx.output.join("Meshes").join("a.nif")).unwrap(),
            "a"
        );
    }

    #[test]
    fn test_rooted_path_does_not_touch_file_outside_source() {
        let fx = fixture();
        let victim = fx.source.parent().unwrap().join("victim.nif");
        fs::write(&victim, "precious mesh data").unwrap();

        let report = materialize(
            &paths(&[victim.as_str()]),
            &fx.source,
            &fx.output,
            AssetCategory::Meshes,
            &PathFilter::default(),
        )
        .unwrap();

        assert!(report.copied.is_empty());
        assert!(report.missing.iter().all(|p| p.starts_with(fx.source.join("Meshes"))));
        assert_eq!(fs::read_to_string(&victim).unwrap(), "precious mesh data");
    }

    #[test]
    fn test_leading_separator_joins_under_category() {
        let fx = fixture();
        write_source(&fx, AssetCategory::Meshes, "hair/hair.nif", "mesh");

        let report = materialize(
            &paths(&["/hair/hair.nif"]),
            &fx.source,
            &fx.output,
            AssetCategory::Meshes,
            &PathFilter::default(),
        )
        .unwrap();

        let dest = fx.output.join("Meshes").join("hair/hair.nif");
        assert_eq!(report.copied, vec![dest.clone()]);
        assert_eq!(fs::read_to_string(dest).unwrap(), "mesh");
    }

    #[test]
    fn test_parent_dir_path_rejected() {
        let fx = fixture();
        fs::write(fx.source.join("escape.nif"), "outside").unwrap();

        let report = materialize(
            &paths(&["../escape.nif", "/"]),
            &fx.source,
            &fx.output,
            AssetCategory::Meshes,
            &PathFilter::default(),
        )
        .unwrap();

        assert_eq!(report.rejected, 2);
        assert!(report.copied.is_empty());
        assert!(report.missing.is_empty());
        assert!(!fx.output.join("escape.nif").exists());
    }

    #[test]
    fn test_materialize_all_both_categories() {
        let fx = fixture();
        write_source(&fx, AssetCategory::Meshes, "a.nif", "a");
        write_source(&fx, AssetCategory::Textures, "a.dds", "a");

        let mut assets = AssetPathSet::new();
        assets.add_mesh("a.nif");
        assets.add_texture("a.dds");

        let report = materialize_all(&assets, &fx.source, &fx.output, &PathFilter::default())
            .unwrap();

        assert_eq!(report.copied.len(), 2);
        assert!(fx.output.join("Meshes").join("a.nif").is_file());
        assert!(fx.output.join("Textures").join("a.dds").is_file());
    }
}
