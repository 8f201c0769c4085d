use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::config::default_target_subdir;
use crate::error::VocError;

pub fn current_dir() -> Result<PathBuf, VocError> {
    std::env::current_dir().map_err(|err| VocError::Filesystem(err.to_string()))
}

/// Walks from `start` (default: working directory) towards the file-system
/// root and returns the first directory holding `data/processed`. Falls back
/// to the working directory when no ancestor qualifies.
pub fn locate_repo_root(start: Option<&Path>) -> Result<PathBuf, VocError> {
    locate_repo_root_with(start, &default_target_subdir())
}

pub fn locate_repo_root_with(start: Option<&Path>, marker: &Path) -> Result<PathBuf, VocError> {
    let cwd = current_dir()?;
    let start = resolve(start.unwrap_or(&cwd), &cwd);

    if let Some(root) = start
        .ancestors()
        .find(|candidate| candidate.join(marker).exists())
    {
        return Ok(root.to_path_buf());
    }
    Ok(resolve(&cwd, &cwd))
}

pub fn target_dir(repo_root: &Path, subdir: &Path) -> PathBuf {
    repo_root.join(subdir)
}

/// `<base>/../data/raw/archive`, absolute and lexically normalized. `base` is
/// the directory of the calling script; the working directory stands in when
/// it is not given. The path is not required to exist.
pub fn resolve_data_dir(base: Option<&Path>) -> Result<PathBuf, VocError> {
    let base = match base {
        Some(base) if base.is_absolute() => base.to_path_buf(),
        Some(base) => current_dir()?.join(base),
        None => current_dir()?,
    };
    let data_dir = normalize_lexical(&base.join("..").join("data").join("raw").join("archive"));
    info!(path = %data_dir.display(), "data directory path");
    Ok(data_dir)
}

/// Directory of the running executable, if the platform can tell.
pub fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Resolves `.` and `..` without consulting the file system.
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

// Symlink-resolved when the path exists, lexically absolute otherwise.
fn resolve(path: &Path, cwd: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            normalize_lexical(path)
        } else {
            normalize_lexical(&cwd.join(path))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_dot_segments() {
        let path = normalize_lexical(Path::new("/x/y/main_code/./../data/raw/archive"));
        assert_eq!(path, PathBuf::from("/x/y/data/raw/archive"));
    }

    #[test]
    fn normalize_stops_at_root() {
        let path = normalize_lexical(Path::new("/../../data"));
        assert_eq!(path, PathBuf::from("/data"));
    }
}
