//! Identity record store.
//!
//! Each record is held behind an `Arc` and replaced wholesale on update, so
//! a reader always sees a complete record. Evaluations that already hold a
//! snapshot keep using it while a writer swaps in the next version.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::error::InputFault;
use crate::record::IdentityRecord;

/// Read access to identity records.
pub trait RecordSource {
    /// Snapshot of the record for `user_id`, if registered.
    fn lookup(&self, user_id: &str) -> Option<Arc<IdentityRecord>>;
}

impl<T: RecordSource + ?Sized> RecordSource for Arc<T> {
    fn lookup(&self, user_id: &str) -> Option<Arc<IdentityRecord>> {
        (**self).lookup(user_id)
    }
}

impl<T: RecordSource + ?Sized> RecordSource for &T {
    fn lookup(&self, user_id: &str) -> Option<Arc<IdentityRecord>> {
        (**self).lookup(user_id)
    }
}

/// In-memory record store: single writer at a time, many readers.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: RwLock<HashMap<String, Arc<IdentityRecord>>>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        RecordStore::default()
    }

    /// Create a store seeded with records. Fails on the first invalid or
    /// duplicate record.
    pub fn from_records<I>(records: I) -> Result<Self, InputFault>
    where
        I: IntoIterator<Item = IdentityRecord>,
    {
        let store = RecordStore::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    /// Register a new record.
    pub fn insert(&self, record: IdentityRecord) -> Result<(), InputFault> {
        record.validate().inspect_err(|e| warn!(error = %e, "rejected record"))?;

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(&record.id) {
            warn!(user_id = %record.id, "duplicate user id");
            return Err(InputFault::DuplicateUser(record.id));
        }
        debug!(user_id = %record.id, "record inserted");
        records.insert(record.id.clone(), Arc::new(record));
        Ok(())
    }

    /// Replace an existing record in full. Returns the previous version.
    pub fn replace(&self, record: IdentityRecord) -> Result<Arc<IdentityRecord>, InputFault> {
        record.validate().inspect_err(|e| warn!(error = %e, "rejected record"))?;

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match records.get_mut(&record.id) {
            Some(slot) => {
                debug!(user_id = %record.id, "record replaced");
                Ok(std::mem::replace(slot, Arc::new(record)))
            }
            None => Err(InputFault::UnknownUser(record.id)),
        }
    }

    /// Apply field updates to a copy of a record and swap it in.
    ///
    /// The updated record is validated and must keep its id. On error the
    /// stored record is left untouched. Returns the new version.
    pub fn update<F>(&self, user_id: &str, apply: F) -> Result<Arc<IdentityRecord>, InputFault>
    where
        F: FnOnce(&mut IdentityRecord),
    {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let slot = records
            .get_mut(user_id)
            .ok_or_else(|| InputFault::UnknownUser(user_id.to_string()))?;

        let mut next = (**slot).clone();
        apply(&mut next);

        if next.id != user_id {
            warn!(user_id, attempted = %next.id, "update tried to change record id");
            return Err(InputFault::IdentityChanged {
                original: user_id.to_string(),
                attempted: next.id,
            });
        }
        next.validate()?;

        let next = Arc::new(next);
        *slot = Arc::clone(&next);
        debug!(user_id, "record updated");
        Ok(next)
    }

    /// Remove a record. Returns it if it was registered.
    pub fn remove(&self, user_id: &str) -> Option<Arc<IdentityRecord>> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id)
    }

    /// Snapshot of a single record.
    pub fn get(&self, user_id: &str) -> Option<Arc<IdentityRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    /// Snapshot of every record, ordered by id.
    pub fn snapshot(&self) -> Vec<Arc<IdentityRecord>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Number of registered records.
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no records are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSource for RecordStore {
    fn lookup(&self, user_id: &str) -> Option<Arc<IdentityRecord>> {
        self.get(user_id)
    }
}
