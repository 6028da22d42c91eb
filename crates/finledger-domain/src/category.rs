//! Grouping references for ledger entries: expense categories and income branches.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// Expense grouping, e.g. "Groceries".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub owner: OwnerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Category {
    pub fn new(owner: OwnerId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name: name.into(),
            color: None,
        }
    }
}

/// Income grouping, e.g. "Salary" or "Freelance".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncomeBranch {
    pub id: Uuid,
    pub owner: OwnerId,
    pub name: String,
}

impl IncomeBranch {
    pub fn new(owner: OwnerId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name: name.into(),
        }
    }
}

impl Identifiable for Category {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Identifiable for IncomeBranch {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for IncomeBranch {
    fn name(&self) -> &str {
        &self.name
    }
}
