use crate::utils::git::{Describer, GitDescriber};
use crate::version::{RemovePattern, VersionRecord, VersionResolver};
use log::{info, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default name of the persisted version artifact.
pub const INFO_FILE: &str = "RELIC-INFO";

/// Tag prefix purged when the caller does not pick a pattern.
pub const DEFAULT_REMOVE: &str = "release_";

#[derive(Error, Debug)]
pub enum InfoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed version info: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InfoError>;

/// Reads a record previously stored with [`write_info`].
pub fn read_info<P: AsRef<Path>>(path: P) -> Result<VersionRecord> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn write_info<P: AsRef<Path>>(record: &VersionRecord, path: P) -> Result<()> {
    let mut file = File::create(path)?;
    serde_json::to_writer_pretty(&mut file, record)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Version lookup for build scripts.
///
/// Asks git first and keeps a copy of the answer on disk, so that an exported
/// tree (a source tarball, say) still reports the version it was cut from.
pub struct ReleaseInfo<D> {
    resolver: VersionResolver<D>,
    remove: Option<RemovePattern>,
    info_file: PathBuf,
}

impl ReleaseInfo<GitDescriber> {
    /// Looks at the repository containing `dir`; the artifact lives in `dir` too.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        ReleaseInfo::new(GitDescriber::new().in_dir(dir)).info_file(dir.join(INFO_FILE))
    }
}

impl<D: Describer> ReleaseInfo<D> {
    pub fn new(describer: D) -> Self {
        ReleaseInfo {
            resolver: VersionResolver::new(describer),
            remove: Some(RemovePattern::from(DEFAULT_REMOVE)),
            info_file: PathBuf::from(INFO_FILE),
        }
    }

    /// Replaces the default `release_` pattern.
    pub fn remove<R: Into<RemovePattern>>(mut self, pattern: R) -> Self {
        self.remove = Some(pattern.into());
        self
    }

    /// Parses tags exactly as git reports them.
    pub fn keep_prefixes(mut self) -> Self {
        self.remove = None;
        self
    }

    pub fn abbrev(mut self, abbrev: usize) -> Self {
        self.resolver = self.resolver.abbrev(abbrev);
        self
    }

    pub fn info_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.info_file = path.as_ref().to_path_buf();
        self
    }

    pub fn info_path(&self) -> &Path {
        &self.info_file
    }

    /// Resolves through git only, without touching the artifact.
    pub fn resolve(&self) -> Option<VersionRecord> {
        self.resolver.resolve(self.remove.as_ref())
    }

    /// Never fails: git, then the artifact, then `0.0.0`.
    pub fn get_info(&self) -> VersionRecord {
        if let Some(record) = self.resolve() {
            if let Err(e) = write_info(&record, &self.info_file) {
                warn!("could not write {}: {}", self.info_file.display(), e);
            }
            return record;
        }

        if self.info_file.exists() {
            match read_info(&self.info_file) {
                Ok(record) => {
                    info!("no repository, using {}", self.info_file.display());
                    return record;
                }
                Err(e) => warn!("could not read {}: {}", self.info_file.display(), e),
            }
        }

        info!("no version information available, using fallback");
        VersionRecord::fallback()
    }
}

/// [`ReleaseInfo::get_info`] for the current directory.
pub fn get_info(remove: Option<RemovePattern>) -> VersionRecord {
    let release = ReleaseInfo::new(GitDescriber::new());
    match remove {
        Some(pattern) => release.remove(pattern).get_info(),
        None => release.get_info(),
    }
}
