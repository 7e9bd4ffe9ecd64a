//! Best-effort mirror of local meal/water state into an external,
//! platform-owned health ledger.
//!
//! Local state is authoritative. The mirror may lag or be absent; nothing
//! here ever blocks or fails the local write path.

mod provider;
mod sync;

pub use provider::{HealthProvider, UnsupportedProvider};
pub use sync::HealthSync;

use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Readiness of the external ledger, queried before any write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityState {
    /// The platform/OS does not support the ledger at all.
    Unavailable,
    /// The provider app is missing.
    Uninstalled,
    /// The provider app must be updated before use.
    UpdateRequired,
    Ready,
}

impl fmt::Display for AvailabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityState::Unavailable => write!(f, "unavailable"),
            AvailabilityState::Uninstalled => write!(f, "provider not installed"),
            AvailabilityState::UpdateRequired => write!(f, "provider update required"),
            AvailabilityState::Ready => write!(f, "ready"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthRecordType {
    Nutrition,
    Hydration,
    TotalCaloriesBurned,
}

/// One capability in the versioned set requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub access: AccessType,
    pub record_type: HealthRecordType,
}

/// The fixed capability set this crate requests. The synchronizer never
/// prompts on its own; it reports the granted subset back to the caller.
pub const REQUESTED_PERMISSIONS: [Permission; 5] = [
    Permission {
        access: AccessType::Read,
        record_type: HealthRecordType::Nutrition,
    },
    Permission {
        access: AccessType::Write,
        record_type: HealthRecordType::Nutrition,
    },
    Permission {
        access: AccessType::Read,
        record_type: HealthRecordType::Hydration,
    },
    Permission {
        access: AccessType::Write,
        record_type: HealthRecordType::Hydration,
    },
    // Calorie-expenditure context only; never written.
    Permission {
        access: AccessType::Read,
        record_type: HealthRecordType::TotalCaloriesBurned,
    },
];

/// A nutrition entry as the external ledger expects it. Instants carry the
/// device's local UTC offset so the ledger attributes the record to the
/// right calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionRecord {
    pub client_record_id: String,
    pub client_record_version: i64,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    pub name: String,
}

/// A hydration entry for the external ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct HydrationRecord {
    pub client_record_id: String,
    pub client_record_version: i64,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub volume_ml: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealthRecord {
    Nutrition(NutritionRecord),
    Hydration(HydrationRecord),
}

impl HealthRecord {
    pub fn client_record_id(&self) -> &str {
        match self {
            HealthRecord::Nutrition(r) => &r.client_record_id,
            HealthRecord::Hydration(r) => &r.client_record_id,
        }
    }

    pub fn client_record_version(&self) -> i64 {
        match self {
            HealthRecord::Nutrition(r) => r.client_record_version,
            HealthRecord::Hydration(r) => r.client_record_version,
        }
    }

    pub fn record_type(&self) -> HealthRecordType {
        match self {
            HealthRecord::Nutrition(_) => HealthRecordType::Nutrition,
            HealthRecord::Hydration(_) => HealthRecordType::Hydration,
        }
    }
}

/// Deterministic client identifier for a meal. Stable across the record's
/// lifetime so upsert and delete always target the same external entity.
pub fn meal_client_id(id: i64) -> String {
    format!("meal_{}", id)
}

/// Deterministic client identifier for a water log.
pub fn water_client_id(id: i64) -> String {
    format!("water_{}", id)
}

/// Failures inside the synchronizer. Absorbed at the sync boundary; they
/// never cross back into the local write path.
#[derive(Debug, Clone)]
pub enum SyncError {
    /// The ledger is not in the Ready state.
    NotReady(AvailabilityState),
    /// The provider rejected or failed the call.
    Provider(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NotReady(state) => write!(f, "health ledger not ready: {}", state),
            SyncError::Provider(e) => write!(f, "health provider error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ids_are_deterministic() {
        assert_eq!(meal_client_id(42), "meal_42");
        assert_eq!(meal_client_id(42), meal_client_id(42));
        assert_eq!(water_client_id(7), "water_7");
    }

    #[test]
    fn test_requested_permissions_cover_both_directions() {
        let has = |access, record_type| {
            REQUESTED_PERMISSIONS
                .iter()
                .any(|p| p.access == access && p.record_type == record_type)
        };
        assert!(has(AccessType::Read, HealthRecordType::Nutrition));
        assert!(has(AccessType::Write, HealthRecordType::Nutrition));
        assert!(has(AccessType::Read, HealthRecordType::Hydration));
        assert!(has(AccessType::Write, HealthRecordType::Hydration));
        assert!(has(AccessType::Read, HealthRecordType::TotalCaloriesBurned));
        // Expenditure is context only.
        assert!(!has(AccessType::Write, HealthRecordType::TotalCaloriesBurned));
    }

    #[test]
    fn test_availability_display() {
        assert_eq!(AvailabilityState::Uninstalled.to_string(), "provider not installed");
        assert_eq!(AvailabilityState::Ready.to_string(), "ready");
    }
}
