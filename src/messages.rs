use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::ConfigDocument;
use crate::error::Result;

const SECTION: &str = "Messages";

/// A player-facing message an admin may override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub default: &'static str,
}

const CATALOGUE: &[MessageSpec] = &[
    MessageSpec {
        key: "shutdown_5min",
        title: "Shutdown Warning 5 Minutes",
        default: "Server is shutting down in 5 minutes",
    },
    MessageSpec {
        key: "shutdown_4min",
        title: "Shutdown Warning 4 Minutes",
        default: "Server is shutting down in 4 minutes",
    },
    MessageSpec {
        key: "shutdown_3min",
        title: "Shutdown Warning 3 Minutes",
        default: "Server is shutting down in 3 minutes",
    },
    MessageSpec {
        key: "shutdown_2min",
        title: "Shutdown Warning 2 Minutes",
        default: "Server is shutting down in 2 minutes",
    },
    MessageSpec {
        key: "shutdown_1min",
        title: "Shutdown Warning 1 Minute",
        default: "Server is shutting down in 1 minute",
    },
    MessageSpec {
        key: "shutdown_30sec",
        title: "Shutdown Warning 30 Seconds",
        default: "Server is shutting down in 30 seconds!",
    },
    MessageSpec {
        key: "shutdown_now",
        title: "Shutdown Warning NOW",
        default: "Server is shutting down NOW!",
    },
];

/// Admin overrides for the message catalogue, kept in the `[Messages]` section of a settings
/// file. The file is read once by [`AdminMessages::load`]; the value is then passed to whoever
/// needs it.
#[derive(Debug, Clone)]
pub struct AdminMessages {
    path: PathBuf,
    document: ConfigDocument,
}

impl AdminMessages {
    /// Read the settings file at `path`. A missing file behaves like an empty one.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Read`] when the file exists but cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut document = ConfigDocument::new();

        if path.exists() {
            document.read_file(&path)?;
        } else {
            debug!(path = %path.display(), "no settings file, using default messages");
        }

        Ok(Self { path, document })
    }

    #[must_use]
    pub fn catalogue() -> &'static [MessageSpec] {
        CATALOGUE
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Text for `key`. Keys outside the catalogue are returned as they are.
    #[must_use]
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        match lookup(key) {
            Some(spec) => self.document.get_key(SECTION, spec.key, spec.default),
            None => key,
        }
    }

    /// Override the text for `key` and persist it if that changed anything. Returns `false` for
    /// keys outside the catalogue.
    ///
    /// # Errors
    ///
    /// [`crate::Error::CreateDir`] or [`crate::Error::Write`] when persisting fails.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool> {
        let Some(spec) = lookup(key) else {
            return Ok(false);
        };

        self.document.set_key(SECTION, spec.key, value);

        if self.document.is_changed() {
            self.document.write_file(&self.path)?;
        }

        Ok(true)
    }
}

fn lookup(key: &str) -> Option<&'static MessageSpec> {
    CATALOGUE.iter().find(|spec| spec.key == key)
}
