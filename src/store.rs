use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::document::ConfigDocument;
use crate::error::{Error, Result};

/// Storage type of a registered option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Str,
    Int,
    Bool,
}

/// A typed option value. `Unset` is what an empty string in the file reads back as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Unset,
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => Ok(()),
            Self::Str(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Where a logical option lives in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub section: String,
    pub key: String,
    pub default: String,
    pub kind: OptionKind,
    pub help: String,
}

/// Named, typed options backed by a single config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    document: ConfigDocument,
    options: Vec<(String, OptionSpec)>,
}

impl ConfigStore {
    /// A store for `path` with no options and an empty document. Call [`ConfigStore::load`] to
    /// read the file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: ConfigDocument::new(),
            options: Vec::new(),
        }
    }

    /// Register (or re-register) an option.
    pub fn add_option(
        &mut self,
        name: &str,
        section: &str,
        key: &str,
        default: &str,
        kind: OptionKind,
        help: &str,
    ) {
        let spec = OptionSpec {
            section: section.to_owned(),
            key: key.to_owned(),
            default: default.to_owned(),
            kind,
            help: help.to_owned(),
        };

        match self.options.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, existing)) => *existing = spec,
            None => self.options.push((name.to_owned(), spec)),
        }
    }

    /// Registered options in registration order.
    pub fn options(&self) -> impl Iterator<Item = (&str, &OptionSpec)> + '_ {
        self.options.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Read an option, falling back to its default when the file does not set it.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownOption`] for unregistered names, [`Error::InvalidInt`] when an `int` option
    /// holds something else.
    pub fn get_value(&self, name: &str) -> Result<OptionValue> {
        let spec = self.spec(name)?;
        let raw = self.document.get_key(&spec.section, &spec.key, &spec.default);

        coerce(name, raw, spec.kind)
    }

    /// Store an option through [`ConfigDocument::set_key`]. Nothing is written to disk until
    /// [`ConfigStore::save`].
    ///
    /// # Errors
    ///
    /// [`Error::UnknownOption`] for unregistered names.
    pub fn set_value(&mut self, name: &str, value: impl Into<OptionValue>) -> Result<()> {
        let spec = self.spec(name)?;
        let (section, key) = (spec.section.clone(), spec.key.clone());
        let value = value.into().to_string();

        self.document.set_key(&section, &key, &value);

        Ok(())
    }

    /// The default of an option, coerced to its type.
    ///
    /// # Errors
    ///
    /// As [`ConfigStore::get_value`].
    pub fn get_default(&self, name: &str) -> Result<OptionValue> {
        let spec = self.spec(name)?;

        coerce(name, &spec.default, spec.kind)
    }

    /// # Errors
    ///
    /// [`Error::UnknownOption`] for unregistered names.
    pub fn get_kind(&self, name: &str) -> Result<OptionKind> {
        self.spec(name).map(|spec| spec.kind)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    #[must_use]
    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// Read the file if it exists. A missing file leaves the current document in place.
    ///
    /// # Errors
    ///
    /// [`Error::Read`] when the file exists but cannot be read.
    pub fn load(&mut self) -> Result<()> {
        if !self.exists() {
            debug!(path = %self.path.display(), "config file missing, using defaults");
            return Ok(());
        }

        self.document.read_file(&self.path)
    }

    /// Write the file back when anything changed. Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// [`Error::CreateDir`] or [`Error::Write`] from the underlying write.
    pub fn save(&mut self) -> Result<bool> {
        if !self.document.is_changed() {
            return Ok(false);
        }

        self.document.write_file(&self.path)?;

        Ok(true)
    }

    fn spec(&self, name: &str) -> Result<&OptionSpec> {
        self.options
            .iter()
            .find_map(|(existing, spec)| (existing == name).then_some(spec))
            .ok_or_else(|| {
                warn!(option = name, path = %self.path.display(), "unknown option");
                Error::UnknownOption {
                    name: name.to_owned(),
                }
            })
    }
}

fn coerce(name: &str, raw: &str, kind: OptionKind) -> Result<OptionValue> {
    if raw.is_empty() {
        return Ok(OptionValue::Unset);
    }

    Ok(match kind {
        OptionKind::Str => OptionValue::Str(raw.to_owned()),
        OptionKind::Int => OptionValue::Int(raw.parse().map_err(|source| Error::InvalidInt {
            name: name.to_owned(),
            value: raw.to_owned(),
            source,
        })?),
        OptionKind::Bool => OptionValue::Bool(matches!(
            raw.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )),
    })
}
