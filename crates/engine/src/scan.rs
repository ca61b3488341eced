// SPDX-License-Identifier: MIT

//! One-shot recursive scan used to populate a freshly watched root.

use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use vigil_core::FileMeta;

pub(crate) fn meta_from(md: &std::fs::Metadata) -> FileMeta {
    FileMeta {
        size: md.size(),
        mode: md.mode(),
        uid: md.uid(),
        gid: md.gid(),
        mtime: md.mtime(),
        ctime: md.ctime(),
        ino: md.ino(),
        dev: md.dev(),
        nlink: md.nlink(),
    }
}

/// Walk `root` and collect (relative name, metadata) for every regular
/// file. Symlinks are not followed.
pub(crate) fn scan_root(root: &Path) -> io::Result<Vec<(String, FileMeta)>> {
    let mut out = Vec::new();
    walk(root, root, &mut out)?;
    Ok(out)
}

fn walk(base: &Path, dir: &Path, out: &mut Vec<(String, FileMeta)>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            continue;
        }

        let path = entry.path();
        if file_type.is_dir() {
            // An unreadable subdirectory should not fail the whole watch.
            if let Err(e) = walk(base, &path, out) {
                tracing::warn!(dir = %path.display(), error = %e, "skipping unreadable directory");
            }
            continue;
        }

        let name = path
            .strip_prefix(base)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();
        out.push((name, meta_from(&entry.metadata()?)));
    }
    Ok(())
}
