use std::iter::Enumerate;
use std::slice::Iter;

use crate::parser::section_name;

/// Forward scan over the body lines of every block headed `[section]`, in file order.
///
/// Header lines themselves are never yielded. Membership is recomputed from the headers on every
/// scan; nothing is cached between calls.
#[derive(Debug, Clone)]
pub(crate) struct SectionLines<'a, 's> {
    lines: Enumerate<Iter<'a, String>>,
    section: &'s str,
    inside: bool,
}

impl<'a, 's> SectionLines<'a, 's> {
    pub(crate) fn new(lines: &'a [String], section: &'s str) -> Self {
        Self {
            lines: lines.iter().enumerate(),
            section,
            inside: false,
        }
    }
}

impl<'a> Iterator for SectionLines<'a, '_> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        for (index, line) in self.lines.by_ref() {
            if let Some(name) = section_name(line) {
                self.inside = name == self.section;
                continue;
            }

            if self.inside {
                return Some((index, line.as_str()));
            }
        }

        None
    }
}

/// Index one past the last line of the first `[section]` block: the next header, or the end of
/// the document. `None` when the section does not exist.
pub(crate) fn first_block_end(lines: &[String], section: &str) -> Option<usize> {
    let mut entered = false;

    for (index, line) in lines.iter().enumerate() {
        match section_name(line) {
            Some(_) if entered => return Some(index),
            Some(name) if name == section => entered = true,
            _ => {}
        }
    }

    entered.then_some(lines.len())
}
