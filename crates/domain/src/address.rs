//! Two-slot address book: slot 0 is home, slot 1 is work.

use std::sync::Arc;

use common::{Address, AddressFields, UserId};
use document_store::{
    Accumulator, DocumentStore, DocumentStoreExt, GroupRow, Pipeline, UserArray, UserUpdate,
};
use serde::Serialize;

use crate::deadline::{Deadlines, with_deadline};
use crate::error::CommerceError;
use crate::locks::UserLocks;

/// Most addresses a user may hold.
pub const MAX_ADDRESSES: usize = 2;

/// Semantic role of an address, encoded by its position in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressSlot {
    Home,
    Work,
}

impl AddressSlot {
    pub fn index(&self) -> usize {
        match self {
            AddressSlot::Home => 0,
            AddressSlot::Work => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddressSlot::Home => "home",
            AddressSlot::Work => "work",
        }
    }
}

impl std::fmt::Display for AddressSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Number of addresses a user holds, read from a count aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressCount {
    pub user_id: UserId,
    pub count: usize,
}

impl AddressCount {
    /// Reads the count out of the rows of a per-user count pipeline.
    ///
    /// No rows means either no addresses or no user; the caller decides.
    pub fn from_rows(user_id: UserId, rows: &[GroupRow]) -> Result<Option<Self>, CommerceError> {
        match rows {
            [] => Ok(None),
            [row] if row.id == user_id => {
                let count = usize::try_from(row.value).map_err(|_| {
                    CommerceError::UnexpectedAggregate(format!(
                        "negative address count {} for user {user_id}",
                        row.value
                    ))
                })?;
                Ok(Some(Self { user_id, count }))
            }
            _ => Err(CommerceError::UnexpectedAggregate(format!(
                "address count produced {} unexpected rows for user {user_id}",
                rows.len()
            ))),
        }
    }

    pub fn has_free_slot(&self) -> bool {
        self.count < MAX_ADDRESSES
    }
}

/// Service enforcing the home/work address policy.
pub struct AddressService<S: DocumentStore> {
    store: Arc<S>,
    locks: UserLocks,
    deadlines: Deadlines,
}

impl<S: DocumentStore> AddressService<S> {
    pub fn new(store: Arc<S>, locks: UserLocks, deadlines: Deadlines) -> Self {
        Self {
            store,
            locks,
            deadlines,
        }
    }

    /// Counts the user's addresses. A user with none counts zero.
    #[tracing::instrument(skip(self))]
    pub async fn count_addresses(&self, user_id: UserId) -> Result<AddressCount, CommerceError> {
        with_deadline("count_addresses", self.deadlines.address, self.count(user_id)).await
    }

    /// Appends an address into the next free slot.
    #[tracing::instrument(skip(self, fields))]
    pub async fn add_address(
        &self,
        user_id: UserId,
        fields: AddressFields,
    ) -> Result<Address, CommerceError> {
        with_deadline("add_address", self.deadlines.address, async {
            let _guard = self.locks.lock(user_id).await;

            let count = self.count(user_id).await?;
            if !count.has_free_slot() {
                metrics::counter!("address_limit_rejections_total").increment(1);
                return Err(CommerceError::AddressLimitExceeded {
                    user_id,
                    limit: MAX_ADDRESSES,
                });
            }

            let address = Address::new(fields);
            let result = self
                .store
                .update_user(user_id, UserUpdate::PushAddress(address.clone()))
                .await
                .map_err(CommerceError::AddressUpdateFailed)?;
            if result.matched_nothing() {
                return Err(CommerceError::UserNotFound(user_id));
            }

            tracing::debug!(address_id = %address.id, slot = count.count, "address added");
            Ok(address)
        })
        .await
    }

    /// Overwrites all four fields of the address in `slot`.
    ///
    /// The slot must already be filled.
    #[tracing::instrument(skip(self, fields))]
    pub async fn edit_address(
        &self,
        user_id: UserId,
        slot: AddressSlot,
        fields: AddressFields,
    ) -> Result<(), CommerceError> {
        with_deadline("edit_address", self.deadlines.address, async {
            let _guard = self.locks.lock(user_id).await;

            let update = UserUpdate::SetAddressSlot {
                slot: slot.index(),
                fields,
            };
            let result = self
                .store
                .update_user(user_id, update)
                .await
                .map_err(CommerceError::AddressUpdateFailed)?;
            if !result.matched_nothing() {
                return Ok(());
            }

            let exists = self
                .store
                .user_exists(user_id)
                .await
                .map_err(CommerceError::user_lookup)?;
            if exists {
                Err(CommerceError::AddressSlotNotFound { user_id, slot })
            } else {
                Err(CommerceError::UserNotFound(user_id))
            }
        })
        .await
    }

    pub async fn edit_home_address(
        &self,
        user_id: UserId,
        fields: AddressFields,
    ) -> Result<(), CommerceError> {
        self.edit_address(user_id, AddressSlot::Home, fields).await
    }

    pub async fn edit_work_address(
        &self,
        user_id: UserId,
        fields: AddressFields,
    ) -> Result<(), CommerceError> {
        self.edit_address(user_id, AddressSlot::Work, fields).await
    }

    /// Clears both slots at once.
    #[tracing::instrument(skip(self))]
    pub async fn delete_addresses(&self, user_id: UserId) -> Result<(), CommerceError> {
        with_deadline("delete_addresses", self.deadlines.address, async {
            let _guard = self.locks.lock(user_id).await;

            let result = self
                .store
                .update_user(user_id, UserUpdate::ReplaceAddresses(Vec::new()))
                .await
                .map_err(CommerceError::AddressUpdateFailed)?;
            if result.matched_nothing() {
                return Err(CommerceError::UserNotFound(user_id));
            }
            Ok(())
        })
        .await
    }

    async fn count(&self, user_id: UserId) -> Result<AddressCount, CommerceError> {
        let pipeline = Pipeline::new()
            .match_user(user_id)
            .unwind(UserArray::Addresses)
            .group(Accumulator::Count);
        let rows = self
            .store
            .aggregate_users(pipeline)
            .await
            .map_err(CommerceError::aggregation)?;

        if let Some(count) = AddressCount::from_rows(user_id, &rows)? {
            return Ok(count);
        }

        let exists = self
            .store
            .user_exists(user_id)
            .await
            .map_err(CommerceError::user_lookup)?;
        if exists {
            Ok(AddressCount { user_id, count: 0 })
        } else {
            Err(CommerceError::UserNotFound(user_id))
        }
    }
}
