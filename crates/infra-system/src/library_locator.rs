// Filesystem library locator
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use ci_actions_core::port::LibraryLocator;

/// Library directory names, in preference order (lib64 before lib)
pub const LIB_DIR_NAMES: &[&str] = &["lib64", "lib"];

/// Installation prefixes, in preference order
pub const BASE_DIRS: &[&str] = &["/usr/local", "/usr", "/"];

/// Walks a fixed list of directories looking for a library file
///
/// Each directory is walked top-down: a directory's own files are checked
/// (in name order) before any of its subdirectories. Symlinked directories
/// are not followed and unreadable directories are skipped.
pub struct FsLibraryLocator {
    search_dirs: Vec<PathBuf>,
}

impl FsLibraryLocator {
    /// Locator over `<base>/<lib>` for every lib dir name, then every base
    pub fn new() -> Self {
        Self::with_search_dirs(standard_search_dirs(BASE_DIRS, LIB_DIR_NAMES))
    }

    pub fn with_search_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }
}

impl Default for FsLibraryLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryLocator for FsLibraryLocator {
    fn locate(&self, name_fragment: &str) -> Option<PathBuf> {
        for dir in &self.search_dirs {
            debug!(dir = %dir.display(), name = %name_fragment, "Searching for library");
            if let Some(found) = walk_for_file(dir, name_fragment) {
                return Some(found);
            }
        }
        None
    }
}

/// Search order: every base under `lib64`, then every base under `lib`
pub fn standard_search_dirs<B: AsRef<Path>>(bases: &[B], lib_dir_names: &[&str]) -> Vec<PathBuf> {
    lib_dir_names
        .iter()
        .flat_map(|lib| bases.iter().map(move |base| base.as_ref().join(lib)))
        .collect()
}

fn walk_for_file(dir: &Path, name_fragment: &str) -> Option<PathBuf> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return None;
    };

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in read_dir.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            subdirs.push(path);
        } else if !(file_type.is_symlink() && path.is_dir()) {
            // symlinked directories are neither files nor walked
            files.push(path);
        }
    }
    files.sort();
    subdirs.sort();

    let matched = files.into_iter().find(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().contains(name_fragment))
            .unwrap_or(false)
    });
    if matched.is_some() {
        return matched;
    }

    subdirs
        .iter()
        .find_map(|subdir| walk_for_file(subdir, name_fragment))
}
