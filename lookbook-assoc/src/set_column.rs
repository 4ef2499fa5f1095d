//! SetColumn codec.
//!
//! A SetColumn is an ordered list of identifiers persisted as one scalar,
//! joined by [`DELIMITER`]. The empty list is the empty string, never a bare
//! delimiter, and no empty token survives a decode.

use std::fmt;
use std::str::FromStr;

use thiserror::Error as ThisError;

pub const DELIMITER: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SetColumnError {
    #[error("identifier is empty")]
    EmptyIdentifier,

    #[error("identifier {0:?} contains the list delimiter")]
    DelimiterInIdentifier(String),

    #[error("token {0:?} is not a valid row id")]
    UnparsableToken(String),
}

/// Splits a raw column into its tokens. `None` (SQL NULL) and `""` both yield
/// an empty list; empty and whitespace-only tokens are dropped.
pub fn decode(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split(DELIMITER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Joins trimmed, non-empty items with [`DELIMITER`].
pub fn encode<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::new();
    for item in items
        .iter()
        .map(|item| item.as_ref().trim())
        .filter(|item| !item.is_empty())
    {
        if !out.is_empty() {
            out.push(DELIMITER);
        }
        out.push_str(item);
    }
    out
}

/// Brings a candidate identifier to the string form stored in a SetColumn.
///
/// Row ids arrive as integers from some callers and as strings from others;
/// membership is always decided on the trimmed string.
pub fn normalize_identifier(id: impl fmt::Display) -> Result<String, SetColumnError> {
    let raw = id.to_string();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SetColumnError::EmptyIdentifier);
    }
    if trimmed.contains(DELIMITER) {
        return Err(SetColumnError::DelimiterInIdentifier(trimmed.to_owned()));
    }
    Ok(trimmed.to_owned())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetColumn {
    items: Vec<String>,
}

impl SetColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(raw: Option<&str>) -> Self {
        Self { items: decode(raw) }
    }

    pub fn encode(&self) -> String {
        encode(&self.items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }

    /// Exact membership after normalization. An identifier that cannot be
    /// stored is never a member.
    pub fn contains(&self, id: impl fmt::Display) -> bool {
        normalize_identifier(id).is_ok_and(|id| self.position(&id).is_some())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item == id)
    }

    /// Appends `id` unconditionally. Used where the caller just minted the id
    /// (a new post, a new comment) and membership cannot already hold.
    pub fn push(&mut self, id: impl fmt::Display) -> Result<(), SetColumnError> {
        let id = normalize_identifier(id)?;
        self.items.push(id);
        Ok(())
    }

    /// Appends `id` only when absent. Returns whether the list changed.
    pub fn insert(&mut self, id: impl fmt::Display) -> Result<bool, SetColumnError> {
        let id = normalize_identifier(id)?;
        if self.position(&id).is_some() {
            return Ok(false);
        }
        self.items.push(id);
        Ok(true)
    }

    /// Removes the first occurrence of `id`. Later duplicates stay in place.
    pub fn remove(&mut self, id: impl fmt::Display) -> bool {
        let Ok(id) = normalize_identifier(id) else {
            return false;
        };
        match self.position(&id) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes every occurrence of `id` and returns how many were dropped.
    pub fn strip(&mut self, id: impl fmt::Display) -> usize {
        let Ok(id) = normalize_identifier(id) else {
            return 0;
        };
        let before = self.items.len();
        self.items.retain(|item| *item != id);
        before - self.items.len()
    }

    /// Parses every token, typically into row ids.
    pub fn parse_each<T: FromStr>(&self) -> Result<Vec<T>, SetColumnError> {
        self.items
            .iter()
            .map(|token| {
                token
                    .parse::<T>()
                    .map_err(|_| SetColumnError::UnparsableToken(token.clone()))
            })
            .collect()
    }
}

impl fmt::Display for SetColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for SetColumn {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::decode(Some(s)))
    }
}

impl<'a> IntoIterator for &'a SetColumn {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_and_null_decode_to_empty_list() {
        assert!(decode(None).is_empty());
        assert!(decode(Some("")).is_empty());
        assert!(SetColumn::decode(Some("")).is_empty());
    }

    #[test]
    fn empty_list_encodes_to_empty_string() {
        let empty: [&str; 0] = [];
        assert_eq!(encode(&empty), "");
        assert_eq!(SetColumn::new().encode(), "");
    }

    #[test]
    fn stray_delimiters_do_not_produce_tokens() {
        assert_eq!(decode(Some(",1,,2,")), tokens(&["1", "2"]));
        assert_eq!(decode(Some(",")), Vec::<String>::new());
        assert_eq!(decode(Some(" 3 , 4")), tokens(&["3", "4"]));
    }

    #[test]
    fn encode_skips_blank_items_and_trims() {
        assert_eq!(encode(&["7", "", " 8 ", "  "]), "7,8");
    }

    #[test]
    fn round_trip_preserves_order() {
        let items = tokens(&["42", "7", "abc", "7x"]);
        assert_eq!(decode(Some(&encode(&items))), items);
    }

    #[test]
    fn normalize_accepts_integers_and_rejects_delimiters() {
        assert_eq!(normalize_identifier(42_i64).unwrap(), "42");
        assert_eq!(normalize_identifier(" 9 ").unwrap(), "9");
        assert_eq!(
            normalize_identifier(""),
            Err(SetColumnError::EmptyIdentifier)
        );
        assert_eq!(
            normalize_identifier("1,2"),
            Err(SetColumnError::DelimiterInIdentifier("1,2".to_string()))
        );
    }

    #[test]
    fn insert_is_a_no_op_when_present() {
        let mut set = SetColumn::decode(Some("1,2"));
        assert!(!set.insert(2).unwrap());
        assert!(set.insert(3).unwrap());
        assert_eq!(set.encode(), "1,2,3");
    }

    #[test]
    fn remove_drops_only_the_first_duplicate() {
        let mut set = SetColumn::decode(Some("5,6,5"));
        assert!(set.remove(5));
        assert_eq!(set.encode(), "6,5");
        assert!(!set.remove(9));
    }

    #[test]
    fn strip_drops_every_occurrence() {
        let mut set = SetColumn::decode(Some("5,6,5,7"));
        assert_eq!(set.strip("5"), 2);
        assert_eq!(set.encode(), "6,7");
        assert_eq!(set.strip("a,b"), 0);
    }

    #[test]
    fn contains_compares_normalized_strings() {
        let set = SetColumn::decode(Some("10,11"));
        assert!(set.contains(10));
        assert!(set.contains(" 11"));
        assert!(!set.contains(1));
        assert!(!set.contains(""));
    }

    #[test]
    fn parse_each_reports_the_bad_token() {
        let set = SetColumn::decode(Some("1,two,3"));
        assert_eq!(
            set.parse_each::<i64>(),
            Err(SetColumnError::UnparsableToken("two".to_string()))
        );
        let ok = SetColumn::decode(Some("1,3"));
        assert_eq!(ok.parse_each::<i64>().unwrap(), vec![1, 3]);
    }
}
