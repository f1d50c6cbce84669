//! Property text appended to each record.
//!
//! The block is a sequence of `Key: Value` lines. On every archive render the
//! provenance lines (`Software`, `YYYYMMDD`, optional `Image Name`) are
//! regenerated after the user entries, so repeated round trips never
//! accumulate duplicates.

use chrono::NaiveDate;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::catalog::field::encode_utf16_be;
use crate::error::Result;

/// Key of the software-identifier line.
pub const SOFTWARE_KEY: &str = "Software";
/// Key of the render-date line.
pub const DATE_KEY: &str = "YYYYMMDD";
/// Key of the optional image-name line.
pub const IMAGE_NAME_KEY: &str = "Image Name";
/// Key under which a shape's calibration is recorded.
pub const PIXEL_SIZE_KEY: &str = "pixelsize";

/// Value of the software-identifier line.
pub const SOFTWARE: &str = concat!("ijroi ", env!("CARGO_PKG_VERSION"));

const PAIR_SEPARATOR: &str = ": ";
const PROVENANCE_KEYS: [&str; 3] = [SOFTWARE_KEY, DATE_KEY, IMAGE_NAME_KEY];

/// Ordered key/value property block.
#[derive(Debug, Clone, Default)]
pub struct PropertyText {
    entries: Vec<(String, String)>,
}

impl PropertyText {
    /// Create an empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a newline-separated `Key: Value` block.
    ///
    /// Lines that do not split into exactly one key and one value on `": "`
    /// are dropped, including the empty segment after a terminal newline.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut props = Self::new();
        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let mut parts = line.split(PAIR_SEPARATOR);
            if let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
                props.insert(key, value);
            }
        }
        props
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace a value. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Entries in insertion order, excluding regenerated provenance lines.
    pub fn user_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(k, _)| !PROVENANCE_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of user entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.user_entries().count()
    }

    /// Whether there are no user entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Image name carried by a decoded block.
    #[must_use]
    pub fn image_name(&self) -> Option<&str> {
        self.get(IMAGE_NAME_KEY)
    }

    /// Render the block as text, dated `date`.
    ///
    /// `image_name` overrides any image name already carried by the block.
    #[must_use]
    pub fn render_text_on(&self, image_name: Option<&str>, date: NaiveDate) -> String {
        let mut text = String::new();
        for (key, value) in self.user_entries() {
            text.push_str(key);
            text.push_str(PAIR_SEPARATOR);
            text.push_str(value);
            text.push('\n');
        }
        text.push_str(&format!("{SOFTWARE_KEY}{PAIR_SEPARATOR}{SOFTWARE}\n"));
        text.push_str(&format!(
            "{DATE_KEY}{PAIR_SEPARATOR}{}\n",
            date.format("%Y%m%d")
        ));
        if let Some(name) = image_name.or_else(|| self.image_name()) {
            text.push_str(&format!("{IMAGE_NAME_KEY}{PAIR_SEPARATOR}{name}\n"));
        }
        text
    }

    /// Render for a record, as big-endian UTF-16, dated `date`.
    #[must_use]
    pub fn render_for_archive_on(&self, image_name: Option<&str>, date: NaiveDate) -> Vec<u8> {
        encode_utf16_be(&self.render_text_on(image_name, date))
    }

    /// Render for a record, dated today.
    #[must_use]
    pub fn render_for_archive(&self, image_name: Option<&str>) -> Vec<u8> {
        self.render_for_archive_on(image_name, chrono::Local::now().date_naive())
    }

    /// Render the user entries as a JSON object, in order.
    pub fn render_json(&self, image_name: Option<&str>) -> Result<String> {
        let view = JsonView {
            props: self,
            image_name: image_name.or_else(|| self.image_name()),
        };
        Ok(serde_json::to_string(&view)?)
    }
}

impl PartialEq for PropertyText {
    fn eq(&self, other: &Self) -> bool {
        self.user_entries().eq(other.user_entries())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyText {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (key, value) in iter {
            props.insert(key, value);
        }
        props
    }
}

impl Serialize for PropertyText {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        JsonView {
            props: self,
            image_name: self.image_name(),
        }
        .serialize(serializer)
    }
}

/// Ordered JSON rendering of a block.
struct JsonView<'a> {
    props: &'a PropertyText,
    image_name: Option<&'a str>,
}

impl Serialize for JsonView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in self.props.user_entries() {
            map.serialize_entry(key, value)?;
        }
        if let Some(name) = self.image_name {
            map.serialize_entry("image_name", name)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::field::decode_utf16_be;

    fn fixed_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_parse_tolerates_terminal_newline() {
        let props = PropertyText::parse("a: 1\nb: 2\n");
        let pairs: Vec<_> = props.user_entries().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_parse_drops_malformed_lines() {
        let props = PropertyText::parse("no separator\nx: 1: 2\nok: yes\n: empty key");
        let pairs: Vec<_> = props.user_entries().collect();
        assert_eq!(pairs, vec![("ok", "yes"), ("", "empty key")]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut props: PropertyText = [("a", "1"), ("b", "2")].into_iter().collect();
        props.insert("a", "3");
        let pairs: Vec<_> = props.user_entries().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
        assert_eq!(props.remove("b").as_deref(), Some("2"));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_render_text_lines() {
        let props: PropertyText = [("cell", "3")].into_iter().collect();
        let text = props.render_text_on(Some("stack.tif"), fixed_date());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "cell: 3");
        assert!(lines[1].starts_with("Software: ijroi"));
        assert_eq!(lines[2], "YYYYMMDD: 20240309");
        assert_eq!(lines[3], "Image Name: stack.tif");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_render_does_not_duplicate_provenance() {
        let props: PropertyText = [("k", "v")].into_iter().collect();
        let once = PropertyText::parse(&props.render_text_on(Some("img"), fixed_date()));
        let twice = once.render_text_on(None, fixed_date());
        assert_eq!(twice.matches("Software").count(), 1);
        assert_eq!(twice.matches("Image Name: img").count(), 1);
        assert_eq!(once, props);
    }

    #[test]
    fn test_render_for_archive_is_utf16() {
        let props = PropertyText::new();
        let bytes = props.render_for_archive_on(None, fixed_date());
        let text = props.render_text_on(None, fixed_date());
        assert_eq!(bytes.len(), text.encode_utf16().count() * 2);
        assert_eq!(
            decode_utf16_be(&bytes, 0, bytes.len() / 2).as_deref(),
            Some(text.as_str())
        );
    }

    #[test]
    fn test_render_json_keeps_order() {
        let props: PropertyText = [("z", "1"), ("a", "2")].into_iter().collect();
        let json = props.render_json(Some("img.tif")).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2","image_name":"img.tif"}"#);
    }
}
