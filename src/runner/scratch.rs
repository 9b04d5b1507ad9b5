//! Scratch files
//!
//! Uniquely named files under the system temp directory, removed on drop.

use crate::config::types::Result;
use log::{debug, warn};
use std::fs::File;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// An empty file in the temp directory that cleans itself up.
///
/// The name carries a tag, the harness pid and a random id, so concurrent
/// harness invocations never collide and a leftover is attributable.
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn create(tag: &str) -> Result<Self> {
        let name = format!(
            "evalbox-{}-{}-{}.eval",
            tag,
            std::process::id(),
            Uuid::new_v4()
        );
        let path = std::env::temp_dir().join(name);
        File::create(&path)?;
        debug!("created scratch file {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "failed to remove scratch file {}: {}",
                    self.path.display(),
                    err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_an_empty_file_and_removes_it_on_drop() {
        let scratch = ScratchFile::create("test").expect("create scratch");
        let path = scratch.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn two_scratch_files_never_share_a_path() {
        let a = ScratchFile::create("pair").expect("create first");
        let b = ScratchFile::create("pair").expect("create second");
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn drop_tolerates_a_file_already_gone() {
        let scratch = ScratchFile::create("gone").expect("create scratch");
        std::fs::remove_file(scratch.path()).unwrap();
        drop(scratch);
    }
}
