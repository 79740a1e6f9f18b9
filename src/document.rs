use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::parser::{self, LineKind};
use crate::section::{self, SectionLines};
use crate::util::{self, NewlinePolicy};

/// An INI file held as its physical lines, edited in place.
///
/// Lines are kept verbatim (terminators included), so anything an operation does not touch is
/// written back byte-for-byte. Section membership is re-derived from the headers on every call.
///
/// Every search operation stops at the *first* matching line in file order; a second matching
/// line is only reached by calling the operation again. Operations that find nothing return
/// `false` and leave the document untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    lines: Vec<String>,
    bom: bool,
    dirty: bool,
}

impl ConfigDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from in-memory text. The result is not dirty.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let (text, bom) = util::strip_bom(text);

        Self {
            lines: util::split_lines(text),
            bom,
            dirty: false,
        }
    }

    /// Replace the whole document with the contents of `path`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when `path` does not exist, [`Error::Read`] when it cannot be read as
    /// UTF-8 text.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }

        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        *self = Self::parse(&text);
        debug!(path = %path.display(), lines = self.lines.len(), "loaded config");

        Ok(())
    }

    /// Write the document to `path` with every line terminator as it is.
    ///
    /// # Errors
    ///
    /// See [`ConfigDocument::write_file_with`].
    pub fn write_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.write_file_with(path, NewlinePolicy::Preserve)
    }

    /// Write the document to `path`, creating missing parent directories. Clears the dirty flag
    /// on success.
    ///
    /// # Errors
    ///
    /// [`Error::CreateDir`] or [`Error::Write`] when the filesystem refuses.
    pub fn write_file_with(&mut self, path: impl AsRef<Path>, newline: NewlinePolicy) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| {
                    warn!(path = %parent.display(), error = %source, "failed to create directory");
                    Error::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        fs::write(path, self.render(newline)).map_err(|source| {
            warn!(path = %path.display(), error = %source, "failed to write config");
            Error::Write {
                path: path.to_path_buf(),
                source,
            }
        })?;

        self.dirty = false;
        debug!(path = %path.display(), lines = self.lines.len(), "wrote config");

        Ok(())
    }

    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Raw physical lines, terminators included.
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(String::as_str)
    }

    /// Value of the first `key` entry in `section`, commented or not, or `default`.
    #[must_use]
    pub fn get_key<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        SectionLines::new(&self.lines, section)
            .find_map(|(_, line)| match parser::classify(line) {
                LineKind::Entry(entry) if entry.key == key => Some(entry.value),
                _ => None,
            })
            .unwrap_or(default)
    }

    /// Insert `key=value` at the end of the first `[section]` block, or append a new block when
    /// the section does not exist. Existing entries for `key` are not looked at, so this may
    /// leave the section with duplicate keys.
    pub fn add_key(&mut self, section: &str, key: &str, value: &str) -> bool {
        let line = format!("{key}={value}");

        match section::first_block_end(&self.lines, section) {
            Some(index) => self.insert(index, &line),
            None => self.append_section(section, &line),
        }

        true
    }

    /// Insert `new_line` right after the first line of `section` containing `substring`. When the
    /// section does not exist a new block holding only `new_line` is appended.
    pub fn add_key_after_match(&mut self, section: &str, substring: &str, new_line: &str) -> bool {
        if section::first_block_end(&self.lines, section).is_none() {
            self.append_section(section, new_line);
            return true;
        }

        let Some(index) = self.find(section, |line| line.trim().contains(substring)) else {
            return false;
        };

        self.insert(index + 1, new_line);
        true
    }

    /// Rewrite the first active `key` entry as `key=new_value` (`key = new_value` with
    /// `spacing`).
    pub fn replace_value_with_same_key(
        &mut self,
        section: &str,
        key: &str,
        new_value: &str,
        spacing: bool,
    ) -> bool {
        let Some(index) = self.find(section, |line| parser::active_key(line) == Some(key)) else {
            return false;
        };

        let body = if spacing {
            format!("{key} = {new_value}")
        } else {
            format!("{key}={new_value}")
        };

        self.rewrite(index, &body);
        true
    }

    /// Upsert: rewrite the first `key` entry of `section` (the same line [`get_key`] reads,
    /// keeping its `;` if it has one), or [`add_key`] when there is none. Setting the value the
    /// entry already holds leaves the document clean.
    ///
    /// [`get_key`]: ConfigDocument::get_key
    /// [`add_key`]: ConfigDocument::add_key
    pub fn set_key(&mut self, section: &str, key: &str, value: &str) {
        let found = SectionLines::new(&self.lines, section).find_map(|(index, line)| {
            match parser::classify(line) {
                LineKind::Entry(entry) if entry.key == key => {
                    Some((index, entry.commented, entry.value == value))
                }
                _ => None,
            }
        });

        match found {
            Some((_, _, true)) => {}
            Some((index, commented, false)) => {
                let marker = if commented { ";" } else { "" };
                self.rewrite(index, &format!("{marker}{key}={value}"));
            }
            None => {
                self.add_key(section, key, value);
            }
        }
    }

    /// Delete the first active `key` entry of `section`.
    pub fn remove_key(&mut self, section: &str, key: &str) -> bool {
        let Some(index) = self.find(section, |line| parser::active_key(line) == Some(key)) else {
            return false;
        };

        self.remove(index);
        true
    }

    /// Delete the first `key=value` line of `section` whose text contains `substring`. Comment
    /// lines (`;` or `#`) are skipped unless `search_in_comment` is set.
    pub fn remove_key_by_substring_search(
        &mut self,
        section: &str,
        substring: &str,
        search_in_comment: bool,
    ) -> bool {
        let Some(index) = self.find(section, |line| {
            searchable(line, search_in_comment).is_some_and(|text| text.contains(substring))
        }) else {
            return false;
        };

        self.remove(index);
        true
    }

    /// Rewrite the first `key=value` line of `section` whose text contains `substring` as
    /// `key=new_value`, keeping the line's own key. Comment lines are skipped unless
    /// `search_in_comment` is set; a matched comment line keeps its marker as part of the key.
    pub fn set_value_by_substring_search(
        &mut self,
        section: &str,
        substring: &str,
        new_value: &str,
        search_in_comment: bool,
    ) -> bool {
        let Some(index) = self.find(section, |line| {
            searchable(line, search_in_comment).is_some_and(|text| text.contains(substring))
        }) else {
            return false;
        };

        let body = match parser::split_pair(self.lines[index].trim()) {
            Some((key, _)) => format!("{key}={new_value}"),
            None => return false,
        };

        self.rewrite(index, &body);
        true
    }

    /// Replace every occurrence of `substring` in the first `key=value` line of `section` that
    /// contains it. The rewritten line loses its indentation. Comment lines are skipped unless
    /// `search_in_comment` is set.
    pub fn replace_value_by_substring_search(
        &mut self,
        section: &str,
        substring: &str,
        new_substring: &str,
        search_in_comment: bool,
    ) -> bool {
        let Some(index) = self.find(section, |line| {
            searchable(line, search_in_comment).is_some_and(|text| text.contains(substring))
        }) else {
            return false;
        };

        let body = self.lines[index].trim().replace(substring, new_substring);
        self.rewrite(index, &body);
        true
    }

    /// Put `;` in front of the first active `key` entry of `section`.
    pub fn comment_key(&mut self, section: &str, key: &str) -> bool {
        let Some(index) = self.find(section, |line| parser::active_key(line) == Some(key)) else {
            return false;
        };

        let line = parser::comment_out(&self.lines[index]);
        self.replace(index, line);
        true
    }

    /// Remove the `;` from the first commented `key` entry of `section`.
    pub fn uncomment_key(&mut self, section: &str, key: &str) -> bool {
        let Some(index) = self.find(section, |line| parser::commented_key(line) == Some(key)) else {
            return false;
        };

        self.uncomment_at(index)
    }

    /// Put `;` in front of the first `key=value` line of `section` whose *value* contains
    /// `substring`. Comment lines are skipped unless `search_in_comment` is set.
    pub fn comment_by_substring_search(
        &mut self,
        section: &str,
        substring: &str,
        search_in_comment: bool,
    ) -> bool {
        let Some(index) = self.find(section, |line| {
            searchable(line, search_in_comment)
                .and_then(parser::split_pair)
                .is_some_and(|(_, value)| value.contains(substring))
        }) else {
            return false;
        };

        let line = parser::comment_out(&self.lines[index]);
        self.replace(index, line);
        true
    }

    /// Remove the `;` from the first `;` line of `section` whose *full text* contains
    /// `substring`. Unlike the other searches the line does not need an `=`.
    pub fn uncomment_by_substring_search(&mut self, section: &str, substring: &str) -> bool {
        let Some(index) = self.find(section, |line| {
            let trimmed = line.trim();
            trimmed.starts_with(';') && trimmed.contains(substring)
        }) else {
            return false;
        };

        self.uncomment_at(index)
    }

    fn render(&self, newline: NewlinePolicy) -> String {
        let mut text = String::with_capacity(self.lines.iter().map(String::len).sum::<usize>() + 3);

        if self.bom {
            text.push(util::BOM);
        }

        for line in &self.lines {
            text.push_str(&newline.apply(line));
        }

        text
    }

    /// Terminator for lines created by an edit: whatever the first terminated line uses.
    fn newline(&self) -> &'static str {
        self.lines
            .iter()
            .find_map(|line| match util::split_terminator(line).1 {
                "" => None,
                "\r\n" => Some("\r\n"),
                _ => Some("\n"),
            })
            .unwrap_or("\n")
    }

    fn find(&self, section: &str, mut predicate: impl FnMut(&str) -> bool) -> Option<usize> {
        SectionLines::new(&self.lines, section)
            .find(|&(_, line)| predicate(line))
            .map(|(index, _)| index)
    }

    /// Replace the content of line `index`, keeping its terminator.
    fn rewrite(&mut self, index: usize, body: &str) {
        let (_, terminator) = util::split_terminator(&self.lines[index]);
        let line = format!("{body}{terminator}");
        self.replace(index, line);
    }

    fn replace(&mut self, index: usize, line: String) {
        if self.lines[index] != line {
            trace!(index, from = %self.lines[index].trim_end(), to = %line.trim_end(), "rewrote line");
            self.lines[index] = line;
            self.dirty = true;
        }
    }

    fn uncomment_at(&mut self, index: usize) -> bool {
        match parser::uncomment(&self.lines[index]) {
            Some(line) => {
                self.replace(index, line);
                true
            }
            None => false,
        }
    }

    fn insert(&mut self, index: usize, body: &str) {
        let newline = self.newline();

        if index == self.lines.len() {
            self.terminate_last_line(newline);
        }

        trace!(index, line = body, "inserted line");
        self.lines.insert(index, format!("{body}{newline}"));
        self.dirty = true;
    }

    fn remove(&mut self, index: usize) {
        let line = self.lines.remove(index);
        trace!(index, line = %line.trim_end(), "removed line");
        self.dirty = true;
    }

    fn append_section(&mut self, section: &str, body: &str) {
        let newline = self.newline();

        self.terminate_last_line(newline);
        trace!(section, line = body, "appended section");
        self.lines.push(newline.to_owned());
        self.lines.push(format!("[{section}]{newline}"));
        self.lines.push(format!("{body}{newline}"));
        self.dirty = true;
    }

    fn terminate_last_line(&mut self, newline: &str) {
        if let Some(last) = self.lines.last_mut() {
            if util::split_terminator(last).1.is_empty() {
                last.push_str(newline);
            }
        }
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(NewlinePolicy::Preserve))
    }
}

/// Trimmed text of a `key=value` line the substring searches may match against.
fn searchable(line: &str, search_in_comment: bool) -> Option<&str> {
    let trimmed = line.trim();

    (trimmed.contains('=') && (search_in_comment || !parser::is_comment(trimmed))).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> ConfigDocument {
        ConfigDocument::parse(text)
    }

    #[test]
    fn set_existing_key() {
        let mut config = doc("[Game]\nPort=7777\n");
        config.set_key("Game", "Port", "8000");

        assert_eq!(config.to_string(), "[Game]\nPort=8000\n");
        assert_eq!(config.get_key("Game", "Port", ""), "8000");
        assert!(config.is_changed());
    }

    #[test]
    fn set_same_value_stays_clean() {
        let mut config = doc("[Game]\nPort = 7777\n");
        config.set_key("Game", "Port", "7777");

        assert_eq!(config.to_string(), "[Game]\nPort = 7777\n");
        assert!(!config.is_changed());
    }

    #[test]
    fn set_keeps_comment_marker() {
        let mut config = doc("[Game]\n;Port=7777\nPort=1\n");
        config.set_key("Game", "Port", "8000");

        assert_eq!(config.to_string(), "[Game]\n;Port=8000\nPort=1\n");
        assert_eq!(config.get_key("Game", "Port", ""), "8000");
    }

    #[test]
    fn set_missing_key_adds_it() {
        let mut config = doc("[Game]\nPort=7777\n[Net]\n");
        config.set_key("Game", "Name", "Test");

        assert_eq!(config.to_string(), "[Game]\nPort=7777\nName=Test\n[Net]\n");
    }

    #[test]
    fn add_to_empty_document() {
        let mut config = ConfigDocument::new();

        assert!(config.add_key("Net", "Timeout", "30"));
        assert_eq!(config.to_string(), "\n[Net]\nTimeout=30\n");
        assert!(config.is_changed());
    }

    #[test]
    fn add_goes_to_end_of_first_block() {
        let mut config = doc("[A]\na=1\n\n[B]\nb=1\n[A]\na=2\n");
        config.add_key("A", "c", "3");

        assert_eq!(config.to_string(), "[A]\na=1\n\nc=3\n[B]\nb=1\n[A]\na=2\n");
    }

    #[test]
    fn add_does_not_deduplicate() {
        let mut config = doc("[A]\nkey=1\n");
        config.add_key("A", "key", "2");

        assert_eq!(config.to_string(), "[A]\nkey=1\nkey=2\n");
        assert_eq!(config.get_key("A", "key", ""), "1");
    }

    #[test]
    fn add_after_unterminated_last_line() {
        let mut config = doc("[A]\r\na=1");
        config.add_key("A", "b", "2");

        assert_eq!(config.to_string(), "[A]\r\na=1\r\nb=2\r\n");
    }

    #[test]
    fn get_key_defaults() {
        let config = doc("top=0\n[A]\na=1\n");

        assert_eq!(config.get_key("A", "missing", "fallback"), "fallback");
        assert_eq!(config.get_key("B", "a", "fallback"), "fallback");
        assert_eq!(config.get_key("A", "top", "fallback"), "fallback");
    }

    #[test]
    fn get_key_reads_commented_entries() {
        let config = doc("[A]\n; a = 1\na=2\n");

        assert_eq!(config.get_key("A", "a", ""), "1");
    }

    #[test]
    fn get_key_reenters_section() {
        let config = doc("[A]\n[B]\nx=1\n[A]\nx=2\n");

        assert_eq!(config.get_key("A", "x", ""), "2");
    }

    #[test]
    fn replace_only_first_match() {
        let mut config = doc("[A]\nx=1\nx=2\n");

        assert!(config.replace_value_with_same_key("A", "x", "9", false));
        assert_eq!(config.to_string(), "[A]\nx=9\nx=2\n");

        assert!(config.replace_value_with_same_key("A", "x", "8", true));
        assert_eq!(config.to_string(), "[A]\nx = 8\nx=2\n");
    }

    #[test]
    fn replace_skips_comments_and_other_sections() {
        let mut config = doc("[B]\nx=0\n[A]\n;x=1\n#x=2\n");

        assert!(!config.replace_value_with_same_key("A", "x", "9", false));
        assert!(!config.is_changed());
        assert_eq!(config.to_string(), "[B]\nx=0\n[A]\n;x=1\n#x=2\n");
    }

    #[test]
    fn remove_first_active_key() {
        let mut config = doc("[A]\n;x=0\nx=1\nx=2\n");

        assert!(config.remove_key("A", "x"));
        assert_eq!(config.to_string(), "[A]\n;x=0\nx=2\n");
        assert!(config.remove_key("A", "x"));
        assert_eq!(config.to_string(), "[A]\n;x=0\n");
        assert!(!config.remove_key("A", "x"));
    }

    #[test]
    fn uncomment_then_again() {
        let mut config = doc("[A]\n;Foo=1\n");

        assert!(config.uncomment_key("A", "Foo"));
        assert_eq!(config.to_string(), "[A]\nFoo=1\n");

        let before = config.clone();
        assert!(!config.uncomment_key("A", "Foo"));
        assert_eq!(config, before);
    }

    #[test]
    fn comment_round_trip() {
        let text = "[A]\n  Foo = 1 \r\nBar=2\n";
        let mut config = doc(text);

        assert!(config.comment_key("A", "Foo"));
        assert_eq!(config.to_string(), "[A]\n;  Foo = 1 \r\nBar=2\n");
        assert!(!config.comment_key("A", "Foo"));

        assert!(config.uncomment_key("A", "Foo"));
        assert_eq!(config.to_string(), text);
    }

    #[test]
    fn first_match_is_not_all_matches() {
        let mut config = doc("[A]\nx=1\nx=1\n");

        assert!(config.comment_key("A", "x"));
        assert_eq!(config.to_string(), "[A]\n;x=1\nx=1\n");

        assert!(config.comment_key("A", "x"));
        assert_eq!(config.to_string(), "[A]\n;x=1\n;x=1\n");
    }

    #[test]
    fn add_after_match() {
        let mut config = doc("[A]\nServerName=x\nPort=1\n");

        assert!(config.add_key_after_match("A", "Name", "Extra=1"));
        assert_eq!(config.to_string(), "[A]\nServerName=x\nExtra=1\nPort=1\n");

        assert!(!config.add_key_after_match("A", "Missing", "Other=1"));
        assert!(config.add_key_after_match("B", "anything", "New=1"));
        assert_eq!(
            config.to_string(),
            "[A]\nServerName=x\nExtra=1\nPort=1\n\n[B]\nNew=1\n"
        );
    }

    #[test]
    fn remove_by_substring() {
        let mut config = doc("[A]\n;Vendor.Key=1\nVendor.Key=2\nVendor.Key=3\n");

        assert!(config.remove_key_by_substring_search("A", "Vendor", false));
        assert_eq!(config.to_string(), "[A]\n;Vendor.Key=1\nVendor.Key=3\n");

        assert!(config.remove_key_by_substring_search("A", "Vendor", true));
        assert_eq!(config.to_string(), "[A]\nVendor.Key=3\n");

        assert!(!config.remove_key_by_substring_search("A", "Missing", true));
    }

    #[test]
    fn set_value_by_substring() {
        let mut config = doc("[A]\n# note=Port\n  Env.Port = 1\n");

        assert!(config.set_value_by_substring_search("A", "Port", "2", false));
        assert_eq!(config.to_string(), "[A]\n# note=Port\nEnv.Port=2\n");

        assert!(config.set_value_by_substring_search("A", "note", "x", true));
        assert_eq!(config.to_string(), "[A]\n# note=x\nEnv.Port=2\n");
    }

    #[test]
    fn replace_by_substring() {
        let mut config = doc("[A]\n;Map=/Game/Old\nMap=/Game/Old/Old\n");

        assert!(config.replace_value_by_substring_search("A", "Old", "New", false));
        assert_eq!(config.to_string(), "[A]\n;Map=/Game/Old\nMap=/Game/New/New\n");

        assert!(config.replace_value_by_substring_search("A", "Old", "New", true));
        assert_eq!(config.to_string(), "[A]\n;Map=/Game/New\nMap=/Game/New/New\n");
    }

    // The comment search matches on the value while the uncomment search matches anywhere in
    // the line; both behaviours are kept as they are.
    #[test]
    fn comment_search_matches_value_only() {
        let mut config = doc("[A]\nMatchKey=1\nOther=MatchKey\n");

        assert!(config.comment_by_substring_search("A", "MatchKey", false));
        assert_eq!(config.to_string(), "[A]\nMatchKey=1\n;Other=MatchKey\n");
    }

    #[test]
    fn uncomment_search_matches_full_line() {
        let mut config = doc("[A]\n;MatchKey=1\n;Other=MatchKey\n");

        assert!(config.uncomment_by_substring_search("A", "MatchKey"));
        assert_eq!(config.to_string(), "[A]\nMatchKey=1\n;Other=MatchKey\n");
    }

    #[test]
    fn uncomment_search_accepts_lines_without_equal() {
        let mut config = doc("[A]\n;bEnabled\n");

        assert!(config.uncomment_by_substring_search("A", "Enabled"));
        assert_eq!(config.to_string(), "[A]\nbEnabled\n");
    }

    #[test]
    fn comment_search_skips_comments_by_default() {
        let mut config = doc("[A]\n;x=needle\n");

        assert!(!config.comment_by_substring_search("A", "needle", false));
        assert!(!config.is_changed());

        assert!(config.comment_by_substring_search("A", "needle", true));
        assert_eq!(config.to_string(), "[A]\n;;x=needle\n");
    }

    #[test]
    fn no_match_leaves_document_clean() {
        let text = "[A]\nx=1\n";
        let mut config = doc(text);

        assert!(!config.remove_key("A", "y"));
        assert!(!config.comment_key("B", "x"));
        assert!(!config.uncomment_key("A", "x"));
        assert!(!config.set_value_by_substring_search("A", "zzz", "1", true));
        assert!(!config.uncomment_by_substring_search("A", "x"));

        assert!(!config.is_changed());
        assert_eq!(config.to_string(), text);
    }

    #[test]
    fn new_lines_follow_document_newline() {
        let mut config = doc("[A]\r\nx=1\r\n");
        config.add_key("B", "y", "2");

        assert_eq!(config.to_string(), "[A]\r\nx=1\r\n\r\n[B]\r\ny=2\r\n");
    }

    #[test]
    fn bom_is_preserved() {
        let mut config = doc("\u{feff}[A]\nx=1\n");

        assert_eq!(config.get_key("A", "x", ""), "1");
        config.set_key("A", "x", "2");
        assert_eq!(config.to_string(), "\u{feff}[A]\nx=2\n");
    }

    #[test]
    fn empty_document() {
        let config = ConfigDocument::new();

        assert!(config.is_empty());
        assert!(!config.is_changed());
        assert_eq!(config.len(), 0);
        assert_eq!(config.to_string(), "");
    }
}
