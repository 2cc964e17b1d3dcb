//! Profile Persistence
//!
//! Reads and writes the single learner profile as a JSON document. Saves are
//! atomic: the new content is written to a temporary sibling file and renamed
//! over the previous one.

use crate::profile::UserProfile;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("could not access profile file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("profile file {} is malformed: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode profile for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed storage for the learner profile.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored profile.
    ///
    /// A missing file is the normal first-run state and yields an empty profile.
    pub fn load(&self) -> Result<UserProfile, ProfileError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No saved profile, starting fresh");
                return Ok(UserProfile::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        let profile = serde_json::from_str(&raw).map_err(|source| ProfileError::Parse {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "Profile loaded");
        Ok(profile)
    }

    /// Overwrites the stored profile with `profile`.
    pub fn save(&self, profile: &UserProfile) -> Result<(), ProfileError> {
        let json = serde_json::to_vec_pretty(profile).map_err(|source| ProfileError::Serialize {
            path: self.path.clone(),
            source,
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&json).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), bytes = json.len(), "Profile saved");
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> ProfileError {
        ProfileError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
