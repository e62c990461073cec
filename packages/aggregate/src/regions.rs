//! Boundary file discovery.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use police_map_aggregate_models::{Region, RegionLayout};

/// Finds the regions under `dir` for the given layout.
///
/// Only files with a `.kml` extension (any case) count. Files are sorted
/// by name within each directory, and force directories are sorted by
/// name, so the order is the same on every run.
///
/// # Errors
///
/// Returns an I/O error if `dir` or a force directory cannot be read.
pub fn discover_regions(dir: &Path, layout: RegionLayout) -> std::io::Result<Vec<Region>> {
    let mut regions = Vec::new();

    if matches!(layout, RegionLayout::Flat | RegionLayout::Auto) {
        regions.extend(regions_in(dir, None)?);
    }

    if matches!(layout, RegionLayout::ByForce | RegionLayout::Auto) {
        for force_dir in sorted_entries(dir)?.into_iter().filter(|p| p.is_dir()) {
            let force = force_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            regions.extend(regions_in(&force_dir, force)?);
        }
    }

    for (name, paths) in shared_names(&regions) {
        let paths: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        log::warn!(
            "Region name {name} is used by {} files and they will share cache entries: {}",
            paths.len(),
            paths.join(", ")
        );
    }

    Ok(regions)
}

/// Region names that more than one boundary file maps to, with those
/// files in discovery order.
///
/// Cache keys are built from the region name alone, so such files read
/// and write the same entries.
#[must_use]
pub fn shared_names(regions: &[Region]) -> Vec<(&str, Vec<&Path>)> {
    let mut by_name: BTreeMap<&str, Vec<&Path>> = BTreeMap::new();
    for region in regions {
        by_name
            .entry(region.name.as_str())
            .or_default()
            .push(region.path.as_path());
    }
    by_name
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .collect()
}

/// Region name for a boundary file: its stem.
#[must_use]
pub fn region_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn regions_in(dir: &Path, force: Option<String>) -> std::io::Result<Vec<Region>> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|path| is_kml(path))
        .map(|path| Region {
            name: region_name(&path),
            force: force.clone(),
            path,
        })
        .collect())
}

fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

fn is_kml(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("kml"))
}
