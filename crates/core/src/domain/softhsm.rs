// SoftHSM2 on-disk layout under the build directory

use std::path::{Path, PathBuf};

/// Name of the directory created under the build dir
pub const SOFTHSM_DIR_NAME: &str = "softhsm2";

/// Config file and token directory used by the test token
///
/// ```text
/// <build_dir>/softhsm2/
///     softhsm2.conf
///     tokens/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftHsmLayout {
    pub root: PathBuf,
    pub conf_path: PathBuf,
    pub token_dir: PathBuf,
}

impl SoftHsmLayout {
    pub fn under(build_dir: &Path) -> Self {
        let root = build_dir.join(SOFTHSM_DIR_NAME);
        Self {
            conf_path: root.join("softhsm2.conf"),
            token_dir: root.join("tokens"),
            root,
        }
    }

    /// Contents of `softhsm2.conf`. The token directory is the only key we set.
    pub fn conf_contents(&self) -> String {
        format!("directories.tokendir = {}\n", self.token_dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = SoftHsmLayout::under(Path::new("/tmp/build"));
        assert_eq!(layout.root, PathBuf::from("/tmp/build/softhsm2"));
        assert_eq!(layout.conf_path, PathBuf::from("/tmp/build/softhsm2/softhsm2.conf"));
        assert_eq!(layout.token_dir, PathBuf::from("/tmp/build/softhsm2/tokens"));
    }

    #[test]
    fn test_conf_contents() {
        let layout = SoftHsmLayout::under(Path::new("/b"));
        assert_eq!(layout.conf_contents(), "directories.tokendir = /b/softhsm2/tokens\n");
    }
}
