//! Per-node dirty state, stored in the `ll-dirty` attribute

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirtyState {
    /// Machine translated, not yet reviewed
    Mt,
    /// Edited directly by a human
    Edited,
    /// Confirmed correct by a human
    Approved,
}

impl DirtyState {
    pub fn as_str(self) -> &'static str {
        match self {
            DirtyState::Mt => "mt",
            DirtyState::Edited => "edited",
            DirtyState::Approved => "approved",
        }
    }

    /// Read an attribute value; anything unknown counts as unset
    pub fn from_value(value: Option<&Value>) -> Option<Self> {
        match value?.as_str()? {
            "mt" => Some(DirtyState::Mt),
            "edited" => Some(DirtyState::Edited),
            "approved" => Some(DirtyState::Approved),
            _ => None,
        }
    }

    pub fn to_value(self) -> Value {
        Value::String(self.as_str().to_string())
    }

    /// States that wait for a human rather than the translator
    pub fn needs_review(state: Option<Self>) -> bool {
        matches!(state, Some(DirtyState::Mt | DirtyState::Edited))
    }
}

impl std::fmt::Display for DirtyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_round_trip() {
        for state in [DirtyState::Mt, DirtyState::Edited, DirtyState::Approved] {
            assert_eq!(DirtyState::from_value(Some(&state.to_value())), Some(state));
        }
    }

    #[test]
    fn test_unknown_values_are_unset() {
        assert_eq!(DirtyState::from_value(None), None);
        assert_eq!(DirtyState::from_value(Some(&json!("stale"))), None);
        assert_eq!(DirtyState::from_value(Some(&json!(3))), None);
    }

    #[test]
    fn test_needs_review() {
        assert!(DirtyState::needs_review(Some(DirtyState::Mt)));
        assert!(DirtyState::needs_review(Some(DirtyState::Edited)));
        assert!(!DirtyState::needs_review(Some(DirtyState::Approved)));
        assert!(!DirtyState::needs_review(None));
    }
}
