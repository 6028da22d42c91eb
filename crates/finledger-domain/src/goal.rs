//! Saving goals and the append-only contributions made towards them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// A savings target. `current_amount` is the running total of its contributions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavingGoal {
    pub id: Uuid,
    pub owner: OwnerId,
    pub name: String,
    pub goal_amount: Decimal,
    #[serde(default)]
    pub current_amount: Decimal,
}

impl SavingGoal {
    pub fn new(owner: OwnerId, name: impl Into<String>, goal_amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name: name.into(),
            goal_amount,
            current_amount: Decimal::ZERO,
        }
    }

    pub fn with_current_amount(mut self, current_amount: Decimal) -> Self {
        self.current_amount = current_amount;
        self
    }

    /// `true` once the running total reaches the target.
    pub fn is_reached(&self) -> bool {
        self.current_amount >= self.goal_amount
    }

    /// Amount still missing; zero for reached goals.
    pub fn remaining(&self) -> Decimal {
        (self.goal_amount - self.current_amount).max(Decimal::ZERO)
    }

    /// Case-insensitive substring match of the goal name against any keyword.
    pub fn name_matches<S: AsRef<str>>(&self, keywords: &[S]) -> bool {
        let name = self.name.to_lowercase();
        keywords
            .iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .any(|keyword| !keyword.is_empty() && name.contains(&keyword))
    }
}

/// A contribution to a goal. Ownership is transitive through `goal_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavingGoalTransaction {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SavingGoalTransaction {
    pub fn new(goal_id: Uuid, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal_id,
            amount,
            date,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Identifiable for SavingGoal {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for SavingGoal {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Owned for SavingGoal {
    fn owner(&self) -> OwnerId {
        self.owner
    }
}

impl Identifiable for SavingGoalTransaction {
    fn id(&self) -> Uuid {
        self.id
    }
}
