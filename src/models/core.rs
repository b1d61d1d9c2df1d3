// src/models/core.rs
use serde::{Deserialize, Serialize};

/// A canonical restaurant record from the reference list, carrying its owning group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntity {
    pub id: String,
    pub display_name: String,
    pub location_label: Option<String>,
    pub group_id: String,
    pub group_name: String,
}

impl ReferenceEntity {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        location_label: Option<&str>,
        group_id: impl Into<String>,
        group_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            location_label: location_label
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            group_id: group_id.into(),
            group_name: group_name.into(),
        }
    }

    pub fn location(&self) -> Option<&str> {
        self.location_label.as_deref()
    }

    /// Entities without a usable name never take part in ranking.
    pub fn has_name(&self) -> bool {
        !self.display_name.trim().is_empty()
    }
}

/// One FLY deal waiting to be attributed to a restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub label: String,
    /// Passed through untouched to the output.
    pub allocation_amount: String,
}

impl Query {
    pub fn new(label: impl Into<String>, allocation_amount: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            allocation_amount: allocation_amount.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_location_becomes_none() {
        let entity = ReferenceEntity::new("r1", "Joe's Pizza", Some("   "), "g1", "Joe's Group");
        assert_eq!(entity.location(), None);

        let entity = ReferenceEntity::new("r1", "Joe's Pizza", Some(" Soho "), "g1", "Joe's Group");
        assert_eq!(entity.location(), Some("Soho"));
    }

    #[test]
    fn test_has_name() {
        assert!(ReferenceEntity::new("r1", "Carbone", None, "g1", "Major Food").has_name());
        assert!(!ReferenceEntity::new("r2", "  ", None, "g1", "Major Food").has_name());
    }
}
