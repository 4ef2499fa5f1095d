use std::fmt;

use serde::{Deserialize, Serialize};

use crate::set_column::{SetColumn, SetColumnError, normalize_identifier};

/// Which way a toggle went. Callers persist the list and report this value
/// together; one without the other is a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleAction {
    Added,
    Removed,
}

impl ToggleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ToggleAction::Added => "added",
            ToggleAction::Removed => "removed",
        }
    }
}

impl fmt::Display for ToggleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SetColumn {
    /// Removes the first occurrence of `id` if present, otherwise appends it.
    pub fn toggle(&mut self, id: impl fmt::Display) -> Result<ToggleAction, SetColumnError> {
        let id = normalize_identifier(id)?;
        if self.remove(&id) {
            Ok(ToggleAction::Removed)
        } else {
            self.push(id)?;
            Ok(ToggleAction::Added)
        }
    }
}

/// By-value form of [`SetColumn::toggle`].
pub fn toggle(
    mut current: SetColumn,
    id: impl fmt::Display,
) -> Result<(SetColumn, ToggleAction), SetColumnError> {
    let action = current.toggle(id)?;
    Ok((current, action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_id_is_appended() {
        let (set, action) = toggle(SetColumn::decode(Some("1,2")), 3).unwrap();
        assert_eq!(action, ToggleAction::Added);
        assert_eq!(set.encode(), "1,2,3");
    }

    #[test]
    fn present_id_is_removed_in_place() {
        let (set, action) = toggle(SetColumn::decode(Some("1,2,3")), "2").unwrap();
        assert_eq!(action, ToggleAction::Removed);
        assert_eq!(set.encode(), "1,3");
    }

    #[test]
    fn toggling_an_absent_id_twice_restores_the_encoded_value() {
        for raw in ["", "4", "4,5,6", "9,4"] {
            let original = SetColumn::decode(Some(raw));
            let (once, first) = toggle(original.clone(), 7).unwrap();
            let (twice, second) = toggle(once, 7).unwrap();
            assert_eq!(first, ToggleAction::Added);
            assert_eq!(second, ToggleAction::Removed);
            assert_eq!(twice.encode(), original.encode(), "raw={raw:?}");
        }
    }

    #[test]
    fn toggling_a_present_id_twice_restores_membership() {
        let original = SetColumn::decode(Some("4,5,6"));
        let (once, _) = toggle(original.clone(), 4).unwrap();
        let (twice, _) = toggle(once, 4).unwrap();

        // The re-added id moves to the end.
        assert_eq!(twice.encode(), "5,6,4");
        let mut restored: Vec<_> = twice.iter().collect();
        let mut expected: Vec<_> = original.iter().collect();
        restored.sort_unstable();
        expected.sort_unstable();
        assert_eq!(restored, expected);
    }

    #[test]
    fn duplicate_entries_lose_only_one_copy() {
        let (set, action) = toggle(SetColumn::decode(Some("8,1,8")), 8).unwrap();
        assert_eq!(action, ToggleAction::Removed);
        assert_eq!(set.encode(), "1,8");
    }

    #[test]
    fn delimiter_in_identifier_is_rejected() {
        let err = toggle(SetColumn::new(), "1,2").unwrap_err();
        assert_eq!(err, SetColumnError::DelimiterInIdentifier("1,2".into()));
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&ToggleAction::Removed).unwrap();
        assert_eq!(json, "\"removed\"");
    }
}
