//! All-or-nothing partition output.
//!
//! Every partition is first written to a sibling `*.ttl.tmp` file. Only when
//! all temp files exist are they moved into place. An existing output file is
//! set aside as `*.ttl.bak` before its replacement lands, so a failure while
//! moving files into place restores every file already replaced. Backups are
//! removed once the whole set is in place.

use crate::Conversion;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct Staged {
    tmp: PathBuf,
    path: PathBuf,
}

/// A file moved into place, with the previous output it replaced.
#[derive(Debug)]
struct Committed<'a> {
    path: &'a Path,
    backup: Option<PathBuf>,
}

/// Write every rendered partition under `out_dir`, returning the final paths.
pub fn write_partitions(out_dir: &Path, conversion: &Conversion) -> Result<Vec<PathBuf>> {
    let staged = stage_all(out_dir, conversion)?;
    commit(&staged, &mut |from, to| fs::rename(from, to))?;

    tracing::info!(
        partitions = staged.len(),
        out_dir = %out_dir.display(),
        "wrote partitions"
    );
    Ok(staged.into_iter().map(|s| s.path).collect())
}

fn stage_all(out_dir: &Path, conversion: &Conversion) -> Result<Vec<Staged>> {
    let mut staged: Vec<Staged> = Vec::with_capacity(conversion.partitions.len());
    for partition in &conversion.partitions {
        let path = out_dir.join(&partition.path);
        let tmp = path.with_extension("ttl.tmp");
        if let Err(e) = stage(&path, &tmp, partition.text.as_bytes()) {
            discard(&staged);
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        staged.push(Staged { tmp, path });
    }
    Ok(staged)
}

fn stage(path: &Path, tmp: &Path, bytes: &[u8]) -> Result<()> {
    if path.is_dir() {
        return Err(anyhow!(
            "cannot write {}: a directory is in the way",
            path.display()
        ));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(tmp, bytes).with_context(|| format!("failed to write {}", tmp.display()))
}

/// Move every staged file into place, or none of them.
fn commit(
    staged: &[Staged],
    rename: &mut dyn FnMut(&Path, &Path) -> io::Result<()>,
) -> Result<()> {
    let mut done: Vec<Committed<'_>> = Vec::with_capacity(staged.len());

    for (i, file) in staged.iter().enumerate() {
        let backup = if file.path.exists() {
            let backup = file.path.with_extension("ttl.bak");
            if let Err(e) = rename(&file.path, &backup) {
                roll_back(&done, rename);
                discard(&staged[i..]);
                return Err(e)
                    .with_context(|| format!("failed to set aside {}", file.path.display()));
            }
            Some(backup)
        } else {
            None
        };

        if let Err(e) = rename(&file.tmp, &file.path) {
            if let Some(backup) = backup {
                done.push(Committed {
                    path: &file.path,
                    backup: Some(backup),
                });
            }
            roll_back(&done, rename);
            discard(&staged[i..]);
            return Err(e)
                .with_context(|| format!("failed to move {} into place", file.path.display()));
        }
        done.push(Committed {
            path: &file.path,
            backup,
        });
    }

    for backup in done.iter().filter_map(|c| c.backup.as_ref()) {
        if let Err(e) = fs::remove_file(backup) {
            tracing::warn!(path = %backup.display(), error = %e, "failed to remove backup");
        }
    }
    Ok(())
}

/// Undo committed moves, newest first.
fn roll_back(done: &[Committed<'_>], rename: &mut dyn FnMut(&Path, &Path) -> io::Result<()>) {
    for committed in done.iter().rev() {
        let restored = match &committed.backup {
            Some(backup) => rename(backup, committed.path),
            None => match fs::remove_file(committed.path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(e) = restored {
            tracing::warn!(path = %committed.path.display(), error = %e, "failed to restore");
        }
    }
}

fn discard(staged: &[Staged]) {
    for file in staged {
        if let Err(e) = fs::remove_file(&file.tmp) {
            tracing::warn!(path = %file.tmp.display(), error = %e, "failed to remove temp file");
        }
    }
}
