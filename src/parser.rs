/// How a single physical line reads. Derived on demand from the raw text and never stored, so a
/// rewritten line is reclassified the next time anything looks at it.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `[Name]`, with the name trimmed.
    SectionHeader(&'a str),
    /// `key=value`, optionally disabled with a leading `;`.
    Entry(Entry<'a>),
    /// Blank lines, free text, `#` notes without `=`, and anything else.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub commented: bool,
}

/// Classify one physical line (its terminator may still be attached).
///
/// Only `;` marks a commented entry. A `#` prefix is kept as part of the key, which means
/// `#Key=1` never matches a lookup for `Key`.
#[must_use]
pub fn classify(line: &str) -> LineKind<'_> {
    if let Some(name) = section_name(line) {
        return LineKind::SectionHeader(name);
    }

    let trimmed = line.trim();
    let (body, commented) = match trimmed.strip_prefix(';') {
        Some(rest) => (rest.trim(), true),
        None => (trimmed, false),
    };

    match split_pair(body) {
        Some((key, value)) => LineKind::Entry(Entry {
            key,
            value,
            commented,
        }),
        None => LineKind::Other,
    }
}

/// Name of the section opened by `line`, if it is a header.
pub(crate) fn section_name(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix('[')?
        .strip_suffix(']')
        .map(str::trim)
}

/// Split on the first `=` only; both halves are trimmed.
pub(crate) fn split_pair(text: &str) -> Option<(&str, &str)> {
    text.split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
}

/// Whether a trimmed line is a comment, as far as the search operations are concerned.
pub(crate) fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with([';', '#'])
}

/// Key of an active (neither `;` nor `#` prefixed) `key=value` line.
pub(crate) fn active_key(line: &str) -> Option<&str> {
    let trimmed = line.trim();

    if is_comment(trimmed) || section_name(trimmed).is_some() {
        return None;
    }

    split_pair(trimmed).map(|(key, _)| key)
}

/// Key of a `;` commented `key=value` line.
pub(crate) fn commented_key(line: &str) -> Option<&str> {
    match classify(line) {
        LineKind::Entry(Entry {
            key,
            commented: true,
            ..
        }) => Some(key),
        _ => None,
    }
}

/// Disable a line by putting `;` in front of it.
pub(crate) fn comment_out(line: &str) -> String {
    format!(";{line}")
}

/// Remove the `;` marker in front of the first non-blank character, keeping everything else
/// (indentation, spacing after the marker, terminator) as it was.
pub(crate) fn uncomment(line: &str) -> Option<String> {
    let indent = line.len() - line.trim_start().len();

    line[indent..]
        .strip_prefix(';')
        .map(|rest| format!("{}{rest}", &line[..indent]))
}
