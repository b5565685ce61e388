use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Task identifier as written by whoever authored the list.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TaskId {
    Number(i64),
    Text(String),
}

/// One entry of the task list.
///
/// Only `passes` is ever rewritten (by the agent, between iterations). Fields
/// this program does not know about are tolerated and ignored.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    #[serde(default)]
    pub id: Option<TaskId>,
    #[serde(default)]
    pub description: Option<String>,
    /// Lower value is more urgent.
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    /// `true` when done; `false` or `null` when still open.
    pub passes: Option<bool>,
}

impl Task {
    pub fn is_complete(&self) -> bool {
        self.passes == Some(true)
    }

    /// Order by urgency: explicit priorities ascending, then tasks without one.
    pub fn urgency_cmp(&self, other: &Self) -> Ordering {
        match (self.priority, other.priority) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Short human label: id and description when present.
    pub fn label(&self) -> String {
        let id = match &self.id {
            Some(TaskId::Number(n)) => Some(n.to_string()),
            Some(TaskId::Text(s)) => Some(s.clone()),
            None => None,
        };
        match (id, self.description.as_deref()) {
            (Some(id), Some(desc)) => format!("#{id} {desc}"),
            (Some(id), None) => format!("#{id}"),
            (None, Some(desc)) => desc.to_string(),
            (None, None) => "(unnamed task)".to_string(),
        }
    }
}
