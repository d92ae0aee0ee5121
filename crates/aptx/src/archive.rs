//! Zip extraction for downloaded proposal archives

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use zip::ZipArchive;

use crate::error::{Error, ErrorKind, Result};

/// File name of `path` with every extension removed.
///
/// `1435.aptx` gives `1435` and `data.tar.gz` gives `data`. Leading dots are
/// part of the name, and a name ending in a dot is returned unchanged.
pub fn archive_stem(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with('.') {
        return Some(name);
    }
    let lead = name.len() - name.trim_start_matches('.').len();
    let stem = match name.get(lead..).and_then(|rest| rest.find('.')) {
        Some(dot) => name.get(..lead + dot)?,
        None => name,
    };
    Some(stem)
}

/// Extract `archive` into `out_dir/<stem>` and return that directory
#[instrument]
pub fn extract(archive: &Path, out_dir: &Path) -> Result<PathBuf> {
    let stem = archive_stem(archive).ok_or_else(|| {
        Error::detached(
            ErrorKind::Archive,
            format!("{} has no usable file name", archive.display()),
        )
    })?;
    let target = out_dir.join(stem);
    extract_into(archive, &target)?;
    Ok(target)
}

/// Extract every member of `archive` into `dir`, returning the member count
pub fn extract_into(archive: &Path, dir: &Path) -> Result<usize> {
    let file = File::open(archive)?;
    let mut zip =
        ZipArchive::new(BufReader::new(file)).map_err(|err| archive_error(archive, err))?;
    let members = zip.len();

    std::fs::create_dir_all(dir)?;
    zip.extract(dir).map_err(|err| archive_error(archive, err))?;

    debug!("extracted {members} members into {}", dir.display());
    Ok(members)
}

fn archive_error(archive: &Path, err: zip::result::ZipError) -> Error {
    let err = Error::from(err);
    match err.kind() {
        ErrorKind::Archive => Error::detached(
            ErrorKind::Archive,
            format!("{}: {}", archive.display(), err.message()),
        ),
        _ => err,
    }
}
