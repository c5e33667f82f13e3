use serde::{Deserialize, Serialize};

use crate::task::{Priority, Status};

/// Sort key for a saved view. `Unsorted` absorbs wire values this
/// build does not recognize; comparing under it is always-equal, so a
/// stable sort leaves the input order untouched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Priority,
    Status,
    CreatedAt,
    #[default]
    UpdatedAt,
    CompletedAt,
    #[serde(other)]
    Unsorted,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// A saved view: a named filter-plus-sort over the task collection.
/// Built-in tabs ship with the system and are never mutated or
/// removed; custom tabs are user-owned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub name: String,
    pub status_filter: Vec<Status>,
    pub priority_filter: Vec<Priority>,
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone)]
pub struct NewTab {
    pub name: String,
    pub status_filter: Vec<Status>,
    pub priority_filter: Vec<Priority>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Default)]
pub struct TabPatch {
    pub name: Option<String>,
    pub status_filter: Option<Vec<Status>>,
    pub priority_filter: Option<Vec<Priority>>,
    pub sort_by: Option<Option<SortBy>>,
    pub sort_order: Option<Option<SortOrder>>,
}

impl Tab {
    pub fn apply(&mut self, patch: TabPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(statuses) = patch.status_filter {
            self.status_filter = statuses;
        }
        if let Some(priorities) = patch.priority_filter {
            self.priority_filter = priorities;
        }
        if let Some(sort_by) = patch.sort_by {
            self.sort_by = sort_by;
        }
        if let Some(sort_order) = patch.sort_order {
            self.sort_order = sort_order;
        }
    }
}

/// The tabs every installation starts with. The first entry is the
/// universal fallback whenever an active-tab id goes stale.
pub fn built_in_tabs() -> Vec<Tab> {
    vec![
        Tab {
            id: "all-issues".to_string(),
            name: "All issues".to_string(),
            status_filter: Status::ALL.to_vec(),
            priority_filter: Priority::ALL.to_vec(),
            is_custom: false,
            sort_by: Some(SortBy::UpdatedAt),
            sort_order: Some(SortOrder::Desc),
        },
        Tab {
            id: "active".to_string(),
            name: "Active".to_string(),
            status_filter: vec![Status::Pending, Status::InProgress],
            priority_filter: Priority::ALL.to_vec(),
            is_custom: false,
            sort_by: Some(SortBy::UpdatedAt),
            sort_order: Some(SortOrder::Desc),
        },
        Tab {
            id: "backlog".to_string(),
            name: "Backlog".to_string(),
            status_filter: vec![Status::Backlog],
            priority_filter: Priority::ALL.to_vec(),
            is_custom: false,
            sort_by: Some(SortBy::Priority),
            sort_order: Some(SortOrder::Desc),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::{SortBy, built_in_tabs};

    #[test]
    fn first_built_in_is_the_fallback_view() {
        let tabs = built_in_tabs();
        assert!(!tabs.is_empty());
        assert_eq!(tabs[0].id, "all-issues");
        assert!(tabs.iter().all(|tab| !tab.is_custom));
    }

    #[test]
    fn unknown_sort_key_deserializes_to_unsorted() {
        let parsed: SortBy = serde_json::from_str("\"dueDate\"").expect("parse sort key");
        assert_eq!(parsed, SortBy::Unsorted);
    }

    #[test]
    fn known_sort_keys_round_trip() {
        let json = serde_json::to_string(&SortBy::CreatedAt).expect("serialize sort key");
        assert_eq!(json, "\"createdAt\"");
        let back: SortBy = serde_json::from_str(&json).expect("parse sort key");
        assert_eq!(back, SortBy::CreatedAt);
    }
}
