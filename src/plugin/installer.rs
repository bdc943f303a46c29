use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::plugin::error::UpdateError;

/// Replace `path` with `content`, byte for byte.
///
/// The body lands in a sibling temp file first and is renamed over the
/// target, so a failed write leaves the old plugin untouched.
pub fn install(path: &Path, content: &[u8]) -> Result<(), UpdateError> {
    let tmp = temp_path(path);

    let result = (|| -> std::io::Result<()> {
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content)?;
        writer.flush()?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    })();

    result.map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        UpdateError::Io {
            path: path.display().to_string(),
            source,
        }
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".plugsync-tmp");
    path.with_file_name(name)
}
