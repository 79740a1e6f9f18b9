//! Property tests for the section-scoped edits.

use proptest::prelude::*;
use uecfg::ConfigDocument;

/// Names that read back unchanged as a section, key or value.
fn token() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_.]{0,11}"
}

fn value() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[A-Za-z0-9/:.]([A-Za-z0-9 /:.]{0,14}[A-Za-z0-9/:.])?"]
}

/// A small document built from arbitrary sections and entries.
fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (
            token(),
            prop::collection::vec((token(), value(), any::<bool>()), 0..5),
        ),
        0..4,
    )
    .prop_map(|sections| {
        let mut text = String::from("; generated\n");

        for (section, entries) in sections {
            text.push_str(&format!("[{section}]\n"));

            for (key, value, commented) in entries {
                let marker = if commented { ";" } else { "" };
                text.push_str(&format!("{marker}{key}={value}\n"));
            }

            text.push('\n');
        }

        text
    })
}

#[test]
fn prop_set_then_get_returns_value() {
    proptest!(|(text in document(), section in token(), key in token(), value in value(), default in value())| {
        let mut config = ConfigDocument::parse(&text);

        config.set_key(&section, &key, &value);

        prop_assert_eq!(config.get_key(&section, &key, &default), value.as_str());
    });
}

#[test]
fn prop_add_into_new_section() {
    proptest!(|(text in document(), key in token(), value in value())| {
        let section = "Fresh.Section";
        let mut config = ConfigDocument::parse(&text);

        prop_assert!(config.add_key(section, &key, &value));

        let rendered = config.to_string();
        prop_assert!(rendered.starts_with(&text));
        prop_assert_eq!(&rendered[text.len()..], format!("\n[{section}]\n{key}={value}\n"));
        prop_assert_eq!(config.get_key(section, &key, "default"), value.as_str());
    });
}

#[test]
fn prop_parse_render_round_trip() {
    proptest!(|(text in "(\u{feff})?[\\[\\]=;# a-z\r\n]{0,80}")| {
        prop_assert_eq!(ConfigDocument::parse(&text).to_string(), text);
    });
}

#[test]
fn prop_comment_uncomment_restores_line() {
    proptest!(|(text in document(), key in token(), value in value())| {
        let section = "Fresh.Section";
        let mut config = ConfigDocument::parse(&text);
        config.add_key(section, &key, &value);
        let before = config.to_string();

        prop_assert!(config.comment_key(section, &key));
        prop_assert!(config.uncomment_key(section, &key));
        prop_assert_eq!(config.to_string(), before);
    });
}
