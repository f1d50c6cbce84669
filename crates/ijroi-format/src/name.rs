//! Grouped record names.

use serde::Serialize;

/// A record name split into a group and an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NameToken {
    pub group: String,
    pub index: String,
}

impl NameToken {
    /// Split `name` on the first occurrence of `separator`.
    ///
    /// Without a separator, or when it does not occur, the whole name is the
    /// group and the index is empty.
    #[must_use]
    pub fn parse(name: &str, separator: Option<&str>) -> Self {
        match separator
            .filter(|sep| !sep.is_empty())
            .and_then(|sep| name.split_once(sep))
        {
            Some((group, index)) => Self {
                group: group.to_string(),
                index: index.to_string(),
            },
            None => Self {
                group: name.to_string(),
                index: String::new(),
            },
        }
    }

    /// Whether the name carried an index.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        !self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_separator() {
        let token = NameToken::parse("cell-3", Some("-"));
        assert_eq!(token.group, "cell");
        assert_eq!(token.index, "3");
        assert!(token.is_indexed());
    }

    #[test]
    fn test_missing_separator() {
        let token = NameToken::parse("cell", Some("-"));
        assert_eq!(token.group, "cell");
        assert_eq!(token.index, "");
        assert!(!token.is_indexed());
    }

    #[test]
    fn test_no_separator_configured() {
        assert_eq!(NameToken::parse("cell-3", None).group, "cell-3");
        assert_eq!(NameToken::parse("cell-3", Some("")).group, "cell-3");
    }

    #[test]
    fn test_splits_on_first_occurrence() {
        let token = NameToken::parse("a_b_c", Some("_"));
        assert_eq!((token.group.as_str(), token.index.as_str()), ("a", "b_c"));
    }
}
