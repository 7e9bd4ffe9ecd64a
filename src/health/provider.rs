use async_trait::async_trait;

use super::{AvailabilityState, HealthRecord, HealthRecordType, Permission, SyncError};

/// The capability-gated external ledger, wholly outside this process's
/// control. Real implementations wrap the platform health API; this crate
/// only consumes the interface.
///
/// `write_records` must honor client-record-id upsert semantics: a record
/// written with an already-seen client id and a higher version replaces
/// the prior record instead of creating a duplicate. `delete_records`
/// targets records by client id only — the local side never learns any
/// identifier the ledger assigns.
#[async_trait]
pub trait HealthProvider: Send + Sync {
    async fn check_availability(&self) -> AvailabilityState;

    /// Connects to the provider; returns false when setup failed.
    async fn initialize(&self) -> bool;

    /// Asks the platform for the given capability set and returns the
    /// granted subset.
    async fn request_permissions(
        &self,
        requested: &[Permission],
    ) -> Result<Vec<Permission>, SyncError>;

    async fn write_records(&self, records: Vec<HealthRecord>) -> Result<(), SyncError>;

    async fn delete_records(
        &self,
        record_type: HealthRecordType,
        client_ids: Vec<String>,
    ) -> Result<(), SyncError>;
}

/// Provider for platforms without a health ledger. Always reports
/// `Unavailable`, so the synchronizer skips every write.
pub struct UnsupportedProvider;

#[async_trait]
impl HealthProvider for UnsupportedProvider {
    async fn check_availability(&self) -> AvailabilityState {
        AvailabilityState::Unavailable
    }

    async fn initialize(&self) -> bool {
        false
    }

    async fn request_permissions(
        &self,
        _requested: &[Permission],
    ) -> Result<Vec<Permission>, SyncError> {
        Ok(Vec::new())
    }

    async fn write_records(&self, _records: Vec<HealthRecord>) -> Result<(), SyncError> {
        Err(SyncError::NotReady(AvailabilityState::Unavailable))
    }

    async fn delete_records(
        &self,
        _record_type: HealthRecordType,
        _client_ids: Vec<String>,
    ) -> Result<(), SyncError> {
        Err(SyncError::NotReady(AvailabilityState::Unavailable))
    }
}
