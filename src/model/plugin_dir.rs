use anyhow::{Result, bail};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// The plugins folder and the plugin files currently inside it.
#[derive(Debug, Clone)]
pub struct PluginDir {
    root: PathBuf,
    extension: String,
    pub files: Vec<String>,
}

impl PluginDir {
    pub fn open(root: PathBuf, extension: &str) -> Result<Self> {
        if !root.is_dir() {
            bail!("{} is not a directory", root.display());
        }

        let mut dir = Self {
            root,
            extension: extension.trim_start_matches('.').to_string(),
            files: Vec::new(),
        };
        dir.refresh();
        Ok(dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Re-list plugin files. Only direct children with the plugin extension count.
    pub fn refresh(&mut self) {
        let mut files: Vec<String> = WalkBuilder::new(&self.root)
            .max_depth(Some(1))
            .standard_filters(false)
            .follow_links(true)
            .build()
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path == self.root {
                    return None;
                }

                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }

                if !has_extension(path, &self.extension) {
                    return None;
                }

                entry.file_name().to_str().map(str::to_string)
            })
            .collect();

        files.sort_by_key(|name| name.to_lowercase());
        self.files = files;
    }

    pub fn contains(&self, path: &Path) -> bool {
        path.parent().is_some_and(|parent| parent == self.root)
    }
}

/// Case-insensitive check of a file's extension (given without the dot).
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if !raw.starts_with('~') {
        return PathBuf::from(raw);
    }

    if let Some(base_dirs) = directories::BaseDirs::new() {
        let home = base_dirs.home_dir().to_string_lossy();
        return PathBuf::from(raw.replacen('~', &home, 1));
    }

    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_only_direct_plugin_files_sorted() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::write(root.join("b.plugin.js"), "").unwrap();
        std::fs::write(root.join("A.plugin.js"), "").unwrap();
        std::fs::write(root.join("notes.txt"), "").unwrap();
        std::fs::write(root.join("c.plugin.js.plugsync-tmp"), "").unwrap();
        std::fs::create_dir(root.join("nested")).unwrap();
        std::fs::write(root.join("nested").join("deep.js"), "").unwrap();

        let dir = PluginDir::open(root.to_path_buf(), "js").unwrap();
        assert_eq!(dir.files, vec!["A.plugin.js", "b.plugin.js"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_plugins_are_listed() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::write(root.join("plain.plugin.js"), "").unwrap();
        std::fs::write(shared.path().join("real.plugin.js"), "").unwrap();
        std::fs::create_dir(shared.path().join("folder.js")).unwrap();

        symlink(shared.path().join("real.plugin.js"), root.join("linked.plugin.js")).unwrap();
        symlink(shared.path().join("folder.js"), root.join("dir.js")).unwrap();
        symlink(shared.path().join("missing.js"), root.join("dangling.js")).unwrap();

        let dir = PluginDir::open(root.to_path_buf(), "js").unwrap();
        assert_eq!(dir.files, vec!["linked.plugin.js", "plain.plugin.js"]);
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(has_extension(Path::new("/p/a.plugin.JS"), "js"));
        assert!(!has_extension(Path::new("/p/a.plugin.js.plugsync-tmp"), "js"));
        assert!(!has_extension(Path::new("/p/js"), "js"));
    }

    #[test]
    fn refresh_picks_up_new_files() {
        let temp = TempDir::new().unwrap();
        let mut dir = PluginDir::open(temp.path().to_path_buf(), ".js").unwrap();
        assert!(dir.files.is_empty());

        std::fs::write(temp.path().join("new.js"), "").unwrap();
        dir.refresh();
        assert_eq!(dir.files, vec!["new.js"]);
        assert!(dir.contains(&dir.root().join("new.js")));
        assert!(!dir.contains(&dir.root().join("sub").join("new.js")));
    }

    #[test]
    fn tilde_expands_to_home() {
        assert_eq!(expand_tilde(" /abs/plugins "), PathBuf::from("/abs/plugins"));

        let expanded = expand_tilde("~/plugins");
        if let Some(base_dirs) = directories::BaseDirs::new() {
            assert_eq!(expanded, base_dirs.home_dir().join("plugins"));
        }
    }

    #[test]
    fn missing_folder_is_rejected() {
        let temp = TempDir::new().unwrap();
        assert!(PluginDir::open(temp.path().join("nope"), "js").is_err());
    }
}
