use std::ffi::OsStr;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use serde::Serialize;
use tar::Archive;
use tracing::debug;
use zip::ZipArchive;

use crate::domain::ArchiveFormat;
use crate::error::VocError;

/// Outcome of [`extract_if_archive`]. `base` is always the directory that
/// holds the input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extraction {
    Extracted { base: PathBuf, format: ArchiveFormat },
    NotAnArchive { base: PathBuf },
}

impl Extraction {
    pub fn base(&self) -> &Path {
        match self {
            Extraction::Extracted { base, .. } | Extraction::NotAnArchive { base } => base,
        }
    }

    pub fn format(&self) -> Option<ArchiveFormat> {
        match self {
            Extraction::Extracted { format, .. } => Some(*format),
            Extraction::NotAnArchive { .. } => None,
        }
    }
}

/// Extracts `path` next to itself when it is a zip or tar-family archive.
///
/// A `.zip` extension (any case) commits to zip: a malformed zip is an error.
/// Anything else is read as tar (plain, gzip or bzip2). The whole stream is
/// validated before anything is written: a missing first header, a corrupt
/// later header or truncated entry data yields `NotAnArchive` and leaves the
/// directory untouched. Write failures while unpacking a valid stream are
/// errors.
pub fn extract_if_archive(path: &Path) -> Result<Extraction, VocError> {
    let base = parent_dir(path);

    if has_zip_extension(path) {
        extract_zip(path, &base)?;
        return Ok(Extraction::Extracted {
            base,
            format: ArchiveFormat::Zip,
        });
    }

    let format = sniff_tar_format(path)?;
    if !validate_tar(path, format)? {
        debug!(path = %path.display(), "not a tar archive");
        return Ok(Extraction::NotAnArchive { base });
    }
    extract_tar(path, format, &base)?;
    Ok(Extraction::Extracted { base, format })
}

pub fn has_zip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub fn extract_zip(zip_path: &Path, target_dir: &Path) -> Result<(), VocError> {
    let file = fs::File::open(zip_path)
        .map_err(|err| VocError::Filesystem(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|err| VocError::Archive(format!("{}: {err}", zip_path.display())))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| VocError::Archive(err.to_string()))?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                return Err(VocError::Archive(
                    "zip entry path traversal detected".to_string(),
                ));
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&entry_path)
                .map_err(|err| VocError::Filesystem(err.to_string()))?;
            continue;
        }

        if let Some(parent) = entry_path.parent() {
            fs::create_dir_all(parent).map_err(|err| VocError::Filesystem(err.to_string()))?;
        }
        let mut outfile =
            fs::File::create(&entry_path).map_err(|err| VocError::Filesystem(err.to_string()))?;
        io::copy(&mut entry, &mut outfile).map_err(|err| VocError::Archive(err.to_string()))?;
    }
    Ok(())
}

pub fn extract_tar(
    tar_path: &Path,
    format: ArchiveFormat,
    target_dir: &Path,
) -> Result<(), VocError> {
    let mut archive = open_tar(tar_path, format)?;
    archive
        .unpack(target_dir)
        .map_err(|err| VocError::Filesystem(format!("unpack {}: {err}", tar_path.display())))
}

/// Picks the tar decoder from the leading magic bytes.
pub fn sniff_tar_format(path: &Path) -> Result<ArchiveFormat, VocError> {
    let mut file = fs::File::open(path)
        .map_err(|err| VocError::Filesystem(format!("open {}: {err}", path.display())))?;
    let mut magic = Vec::with_capacity(3);
    Read::by_ref(&mut file)
        .take(3)
        .read_to_end(&mut magic)
        .map_err(|err| VocError::Filesystem(err.to_string()))?;

    let format = if magic.starts_with(&[0x1f, 0x8b]) {
        ArchiveFormat::TarGz
    } else if magic.starts_with(b"BZh") {
        ArchiveFormat::TarBz2
    } else {
        ArchiveFormat::Tar
    };
    Ok(format)
}

/// Reads every entry of the decoded stream to the end. False when the stream
/// is empty or any header or entry body is malformed or cut short.
pub fn validate_tar(path: &Path, format: ArchiveFormat) -> Result<bool, VocError> {
    let mut archive = open_tar(path, format)?;
    let entries = match archive.entries() {
        Ok(entries) => entries,
        Err(_) => return Ok(false),
    };

    let mut count = 0usize;
    for entry in entries {
        let mut entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(path = %path.display(), %err, "tar header rejected");
                return Ok(false);
            }
        };
        let expected = entry.size();
        match io::copy(&mut entry, &mut io::sink()) {
            Ok(read) if read == expected => count += 1,
            Ok(read) => {
                debug!(path = %path.display(), expected, read, "tar entry truncated");
                return Ok(false);
            }
            Err(err) => {
                debug!(path = %path.display(), %err, "tar entry unreadable");
                return Ok(false);
            }
        }
    }
    Ok(count > 0)
}

fn open_tar(path: &Path, format: ArchiveFormat) -> Result<Archive<Box<dyn Read>>, VocError> {
    let file = fs::File::open(path)
        .map_err(|err| VocError::Filesystem(format!("open {}: {err}", path.display())))?;
    let reader: Box<dyn Read> = match format {
        ArchiveFormat::TarGz => Box::new(GzDecoder::new(file)),
        ArchiveFormat::TarBz2 => Box::new(BzDecoder::new(file)),
        ArchiveFormat::Tar | ArchiveFormat::Zip => Box::new(file),
    };
    Ok(Archive::new(reader))
}
