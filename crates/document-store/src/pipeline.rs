//! Aggregation pipelines over the `users` collection.
//!
//! A pipeline is an ordered list of stages: an optional `Match` on a user id,
//! an optional `Unwind` of one embedded array, and a final `Group` that folds
//! the remaining rows per user id with one accumulator. Like the document
//! database this models, unwinding an empty array yields no rows, so a user
//! with an empty cart is absent from a cart-total result rather than present
//! with zero.

use common::{User, UserId};

use crate::{Result, StoreError};

/// An array embedded in a user document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserArray {
    Cart,
    Addresses,
}

impl UserArray {
    /// Field name of the array inside the stored document.
    pub fn field(&self) -> &'static str {
        match self {
            UserArray::Cart => "cart",
            UserArray::Addresses => "addresses",
        }
    }
}

/// How rows are folded by the `Group` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accumulator {
    /// Sum of the `price` field (in cents) of unwound cart entries.
    SumPrice,
    /// Number of rows.
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Match(UserId),
    Unwind(UserArray),
    Group(Accumulator),
}

/// One output row of a pipeline: the user id and the accumulated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRow {
    pub id: UserId,
    pub value: i64,
}

/// Builder for an aggregation pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the pipeline to one user.
    pub fn match_user(mut self, id: UserId) -> Self {
        self.stages.push(Stage::Match(id));
        self
    }

    /// Emits one row per element of the given array.
    pub fn unwind(mut self, array: UserArray) -> Self {
        self.stages.push(Stage::Unwind(array));
        self
    }

    /// Folds rows per user id.
    pub fn group(mut self, accumulator: Accumulator) -> Self {
        self.stages.push(Stage::Group(accumulator));
        self
    }

    /// The user id of the `Match` stage, if any.
    pub fn matched_user(&self) -> Option<UserId> {
        self.stages.iter().find_map(|s| match s {
            Stage::Match(id) => Some(*id),
            _ => None,
        })
    }

    /// The unwound array, if any.
    pub fn unwound(&self) -> Option<UserArray> {
        self.stages.iter().find_map(|s| match s {
            Stage::Unwind(array) => Some(*array),
            _ => None,
        })
    }

    /// Checks the pipeline has a shape every backend can run, returning the
    /// accumulator of its final `Group` stage.
    pub fn validate(&self) -> Result<Accumulator> {
        let accumulator = match self.stages.last() {
            Some(Stage::Group(acc)) => *acc,
            _ => {
                return Err(StoreError::InvalidPipeline(
                    "pipeline must end with a group stage".to_string(),
                ));
            }
        };

        let count = |pred: fn(&Stage) -> bool| self.stages.iter().filter(|s| pred(s)).count();
        if count(|s| matches!(s, Stage::Group(_))) > 1 {
            return Err(StoreError::InvalidPipeline(
                "only one group stage is supported".to_string(),
            ));
        }
        if count(|s| matches!(s, Stage::Match(_))) > 1 {
            return Err(StoreError::InvalidPipeline(
                "only one match stage is supported".to_string(),
            ));
        }
        if count(|s| matches!(s, Stage::Unwind(_))) > 1 {
            return Err(StoreError::InvalidPipeline(
                "only one unwind stage is supported".to_string(),
            ));
        }
        if accumulator == Accumulator::SumPrice && self.unwound() != Some(UserArray::Cart) {
            return Err(StoreError::InvalidPipeline(
                "price can only be summed over unwound cart entries".to_string(),
            ));
        }

        Ok(accumulator)
    }

    /// Runs the pipeline over already-decoded user documents.
    ///
    /// Output rows keep the order in which their user was first seen.
    pub fn evaluate<'a>(&self, users: impl IntoIterator<Item = &'a User>) -> Result<Vec<GroupRow>> {
        let accumulator = self.validate()?;
        let matched = self.matched_user();
        let unwound = self.unwound();

        let mut rows: Vec<GroupRow> = Vec::new();
        for user in users {
            if matched.is_some_and(|id| id != user.id) {
                continue;
            }

            let values: Vec<i64> = match (unwound, accumulator) {
                (Some(UserArray::Cart), Accumulator::SumPrice) => {
                    user.cart.iter().map(|e| e.price.cents()).collect()
                }
                (Some(UserArray::Cart), Accumulator::Count) => vec![1; user.cart.len()],
                (Some(UserArray::Addresses), _) => vec![1; user.addresses.len()],
                (None, _) => vec![1],
            };
            if values.is_empty() {
                continue;
            }

            let sum = values
                .into_iter()
                .try_fold(0i64, i64::checked_add)
                .ok_or(StoreError::AggregateOverflow)?;
            match rows.iter_mut().find(|r| r.id == user.id) {
                Some(row) => {
                    row.value = row
                        .value
                        .checked_add(sum)
                        .ok_or(StoreError::AggregateOverflow)?;
                }
                None => rows.push(GroupRow {
                    id: user.id,
                    value: sum,
                }),
            }
        }

        Ok(rows)
    }
}
