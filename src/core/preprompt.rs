//! Plain-text preprompt injected as the leading system message.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct PrepromptStore {
    path: PathBuf,
}

impl PrepromptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the preprompt, returning `None` when the file does not exist or
    /// holds only whitespace.
    pub fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Replaces the file contents atomically.
    pub fn save(&self, text: &str) -> io::Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        let mut temp_file = match parent {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                NamedTempFile::new_in(dir)?
            }
            None => NamedTempFile::new_in(".")?,
        };

        temp_file.write_all(text.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}
