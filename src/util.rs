use std::borrow::Cow;

/// Byte Order Mark (BOM) as it appears once UTF-8 text has been decoded. Windows editors commonly
/// prepend it to configuration files, and it would otherwise stick to the first section header.
///
/// <https://en.wikipedia.org/wiki/Byte_order_mark>
pub(crate) const BOM: char = '\u{feff}';

/// Detach a leading BOM, reporting whether one was present.
pub(crate) fn strip_bom(text: &str) -> (&str, bool) {
    match text.strip_prefix(BOM) {
        Some(rest) => (rest, true),
        None => (text, false),
    }
}

/// Split text into physical lines. Every line keeps its own terminator, so concatenating the
/// result reproduces the input exactly.
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_owned).collect()
}

/// Split a physical line into its content and its terminator (`""`, `"\n"` or `"\r\n"`).
pub(crate) fn split_terminator(line: &str) -> (&str, &str) {
    let body = line
        .strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line);

    (body, &line[body.len()..])
}

/// Line terminator handling applied when a document is written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NewlinePolicy {
    /// Write every line with the terminator it already has.
    #[default]
    Preserve,
    /// Rewrite every terminator as `\n`.
    Lf,
    /// Rewrite every terminator as `\r\n`.
    CrLf,
}

impl NewlinePolicy {
    pub(crate) fn apply(self, line: &str) -> Cow<'_, str> {
        let newline = match self {
            Self::Preserve => return Cow::Borrowed(line),
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        };

        // An unterminated last line stays unterminated.
        match split_terminator(line) {
            (_, "") => Cow::Borrowed(line),
            (_, terminator) if terminator == newline => Cow::Borrowed(line),
            (body, _) => Cow::Owned(format!("{body}{newline}")),
        }
    }
}
