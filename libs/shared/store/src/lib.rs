// libs/shared/store/src/lib.rs
//
// Transactional row store backing every lifecycle operation. One lock
// serializes writers, so a re-check-then-insert performed inside a single
// `transaction` closure cannot race another booking attempt.
use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use shared_models::records::{
    Appointment, AvailabilitySlot, CaseOrder, Doctor, Earning, Patient, Payment, SpecialtyService,
    VideoSession,
};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("row not found: {0}")]
    RowNotFound(&'static str),

    #[error("storage failure: {0}")]
    Failure(String),
}

/// All tables, cloneable so a transaction can stage its writes.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub doctors: HashMap<Uuid, Doctor>,
    pub patients: HashMap<Uuid, Patient>,
    pub orders: HashMap<Uuid, CaseOrder>,
    pub services: HashMap<Uuid, SpecialtyService>,
    pub availability: Vec<AvailabilitySlot>,
    pub appointments: HashMap<Uuid, Appointment>,
    pub payments: HashMap<Uuid, Payment>,
    pub video_sessions: HashMap<Uuid, VideoSession>,
    pub earnings: HashMap<Uuid, Earning>,
}

impl Tables {
    pub fn payment_for_appointment(&self, appointment_id: Uuid) -> Option<&Payment> {
        self.payments
            .values()
            .find(|p| p.appointment_id == appointment_id)
    }

    pub fn earning_for_appointment(&self, appointment_id: Uuid) -> Option<&Earning> {
        self.earnings
            .values()
            .find(|e| e.appointment_id == appointment_id)
    }

    pub fn availability_for_doctor(&self, doctor_id: Uuid) -> Vec<&AvailabilitySlot> {
        self.availability
            .iter()
            .filter(|s| s.doctor_id == doctor_id)
            .collect()
    }
}

/// In-process stand-in for the portal's relational store, with the same
/// contract the lifecycle engine expects from it: every transaction commits
/// entirely or not at all.
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Tables::default()),
        }
    }

    /// Consistent snapshot read.
    pub async fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&Tables) -> T,
    {
        let guard = self.inner.lock().await;
        f(&guard)
    }

    /// Run `f` against a staged copy of the tables. On `Ok` the staged state
    /// replaces the live state; on `Err` it is discarded and nothing was
    /// persisted.
    pub async fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Tables) -> Result<T, E>,
    {
        let mut guard = self.inner.lock().await;
        let mut staged = guard.clone();
        match f(&mut staged) {
            Ok(value) => {
                *guard = staged;
                Ok(value)
            }
            Err(e) => {
                debug!("transaction rolled back");
                Err(e)
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commit_persists_all_writes() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        store
            .transaction::<_, StorageError, _>(|tx| {
                tx.doctors.insert(
                    id,
                    Doctor {
                        id,
                        display_name: "Dr. Test".to_string(),
                        commission_pct: 70.0,
                        is_active: true,
                    },
                );
                Ok(())
            })
            .await
            .unwrap();

        let present = store.read(|t| t.doctors.contains_key(&id)).await;
        assert!(present);
    }

    #[tokio::test]
    async fn rollback_discards_partial_writes() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        let result: Result<(), StorageError> = store
            .transaction(|tx| {
                tx.doctors.insert(
                    id,
                    Doctor {
                        id,
                        display_name: "Dr. Ghost".to_string(),
                        commission_pct: 70.0,
                        is_active: true,
                    },
                );
                Err(StorageError::Failure("simulated".to_string()))
            })
            .await;

        assert!(result.is_err());
        let present = store.read(|t| t.doctors.contains_key(&id)).await;
        assert!(!present);
    }
}
