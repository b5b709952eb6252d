use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn ensure_dir<P: AsRef<Path>>(p: P) -> io::Result<()> {
    if !p.as_ref().exists() {
        fs::create_dir_all(&p)?;
    }
    Ok(())
}

/// Move each `(from, to)` tree into place as one unit.
///
/// Existing targets are parked under `backup_dir` first. When any move
/// fails, the targets installed so far are taken out again and the parked
/// trees restored. `backup_dir` must share a filesystem with the targets;
/// the caller owns its cleanup.
pub fn install_dirs(moves: &[(PathBuf, PathBuf)], backup_dir: &Path) -> io::Result<()> {
    let mut done: Vec<(&Path, Option<PathBuf>)> = Vec::new();

    for (idx, (from, to)) in moves.iter().enumerate() {
        match install_one(from, to, &backup_dir.join(format!("previous-{}", idx))) {
            Ok(parked) => done.push((to.as_path(), parked)),
            Err(e) => {
                for (to, parked) in done.into_iter().rev() {
                    if let Err(undo) = restore(to, parked.as_deref()) {
                        warn!(path = %to.display(), error = %undo, "failed to roll back install");
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(())
}

fn install_one(from: &Path, to: &Path, backup: &Path) -> io::Result<Option<PathBuf>> {
    let parked = if to.exists() {
        fs::rename(to, backup)?;
        Some(backup.to_path_buf())
    } else {
        None
    };

    if let Err(e) = fs::rename(from, to) {
        if let Some(parked) = &parked {
            fs::rename(parked, to)?;
        }
        return Err(e);
    }
    Ok(parked)
}

fn restore(to: &Path, parked: Option<&Path>) -> io::Result<()> {
    if to.is_dir() {
        fs::remove_dir_all(to)?;
    } else if to.exists() {
        fs::remove_file(to)?;
    }
    match parked {
        Some(parked) => fs::rename(parked, to),
        None => Ok(()),
    }
}
