use chrono::{DateTime, Duration, Local, Utc};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use super::{
    meal_client_id, water_client_id, AvailabilityState, HealthProvider, HealthRecord,
    HealthRecordType, HydrationRecord, NutritionRecord, Permission, SyncError,
    REQUESTED_PERMISSIONS,
};
use crate::models::MealRecord;

/// Meals are reported with a synthetic one-minute interval; the ledger
/// schema requires a non-zero duration.
const MEAL_INTERVAL: i64 = 60;
/// Hydration is a point-in-time event, stretched to one second.
const WATER_INTERVAL: i64 = 1;

/// One-way mirror of local records into the external health ledger.
///
/// Invoked only after the corresponding local write has committed. Every
/// failure is logged and swallowed: the mirror is best-effort and never
/// blocks the user's workflow. A later re-sync of the same local id
/// naturally retries via the same deterministic client identifier.
pub struct HealthSync {
    provider: Arc<dyn HealthProvider>,
    last_version: Mutex<i64>,
}

impl HealthSync {
    pub fn new(provider: Arc<dyn HealthProvider>) -> Self {
        Self {
            provider,
            last_version: Mutex::new(0),
        }
    }

    /// Version counters are the current epoch milliseconds, bumped past the
    /// last issued value. Strictly increasing even for two syncs inside the
    /// same millisecond or across a clock step backwards, so a re-sync
    /// always overwrites the ledger's copy.
    fn next_version(&self) -> i64 {
        let mut last = self.last_version.lock().expect("version lock poisoned");
        let version = Utc::now().timestamp_millis().max(*last + 1);
        *last = version;
        version
    }

    /// Initializes the provider and requests the fixed capability set.
    ///
    /// This is the one surface that reports errors: the caller decides
    /// whether the granted subset is enough to proceed.
    pub async fn setup(&self) -> Result<Vec<Permission>, SyncError> {
        self.ensure_ready().await?;
        if !self.provider.initialize().await {
            return Err(SyncError::Provider("initialization failed".to_string()));
        }
        self.provider.request_permissions(&REQUESTED_PERMISSIONS).await
    }

    pub async fn availability(&self) -> AvailabilityState {
        self.provider.check_availability().await
    }

    /// Mirrors a meal into the ledger. Failures are logged, never surfaced.
    pub async fn sync_meal(&self, meal: &MealRecord) {
        if let Err(e) = self.try_sync_meal(meal).await {
            warn!(meal_id = meal.id, error = %e, "meal sync to health ledger failed");
        } else {
            debug!(meal_id = meal.id, "meal synced to health ledger");
        }
    }

    /// Mirrors a water log into the ledger. Failures are logged, never
    /// surfaced.
    pub async fn sync_water(&self, id: i64, amount_ml: i64, timestamp: DateTime<Utc>) {
        if let Err(e) = self.try_sync_water(id, amount_ml, timestamp).await {
            warn!(water_id = id, error = %e, "water sync to health ledger failed");
        } else {
            debug!(water_id = id, "water log synced to health ledger");
        }
    }

    /// Best-effort removal of the mirrored meal record.
    pub async fn delete_meal(&self, id: i64) {
        if let Err(e) = self
            .try_delete(HealthRecordType::Nutrition, meal_client_id(id))
            .await
        {
            warn!(meal_id = id, error = %e, "meal delete in health ledger failed");
        }
    }

    /// Best-effort removal of the mirrored water record.
    pub async fn delete_water(&self, id: i64) {
        if let Err(e) = self
            .try_delete(HealthRecordType::Hydration, water_client_id(id))
            .await
        {
            warn!(water_id = id, error = %e, "water delete in health ledger failed");
        }
    }

    async fn ensure_ready(&self) -> Result<(), SyncError> {
        match self.provider.check_availability().await {
            AvailabilityState::Ready => Ok(()),
            state => Err(SyncError::NotReady(state)),
        }
    }

    async fn try_sync_meal(&self, meal: &MealRecord) -> Result<(), SyncError> {
        self.ensure_ready().await?;

        // Local wall-clock time with explicit offset: the ledger attributes
        // records to the calendar day of the device's locale.
        let start = meal.timestamp.with_timezone(&Local).fixed_offset();
        let total = &meal.analysis.total;

        let record = NutritionRecord {
            client_record_id: meal_client_id(meal.id),
            client_record_version: self.next_version(),
            start_time: start,
            end_time: start + Duration::seconds(MEAL_INTERVAL),
            energy_kcal: total.calories,
            protein_g: total.protein,
            carbs_g: total.carbs,
            fats_g: total.fats,
            name: meal.meal_type.to_string(),
        };

        self.provider
            .write_records(vec![HealthRecord::Nutrition(record)])
            .await
    }

    async fn try_sync_water(
        &self,
        id: i64,
        amount_ml: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        self.ensure_ready().await?;

        let start = timestamp.with_timezone(&Local).fixed_offset();
        let record = HydrationRecord {
            client_record_id: water_client_id(id),
            client_record_version: self.next_version(),
            start_time: start,
            end_time: start + Duration::seconds(WATER_INTERVAL),
            volume_ml: amount_ml as f64,
        };

        self.provider
            .write_records(vec![HealthRecord::Hydration(record)])
            .await
    }

    async fn try_delete(
        &self,
        record_type: HealthRecordType,
        client_id: String,
    ) -> Result<(), SyncError> {
        self.ensure_ready().await?;
        self.provider.delete_records(record_type, vec![client_id]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealType, NutritionPayload};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory ledger honoring client-record-id upsert semantics.
    struct MockLedger {
        availability: Mutex<AvailabilityState>,
        records: Mutex<HashMap<String, HealthRecord>>,
        write_calls: AtomicUsize,
    }

    impl MockLedger {
        fn ready() -> Arc<Self> {
            Self::with_state(AvailabilityState::Ready)
        }

        fn with_state(state: AvailabilityState) -> Arc<Self> {
            Arc::new(Self {
                availability: Mutex::new(state),
                records: Mutex::new(HashMap::new()),
                write_calls: AtomicUsize::new(0),
            })
        }

        fn record(&self, client_id: &str) -> Option<HealthRecord> {
            self.records.lock().unwrap().get(client_id).cloned()
        }

        fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HealthProvider for MockLedger {
        async fn check_availability(&self) -> AvailabilityState {
            *self.availability.lock().unwrap()
        }

        async fn initialize(&self) -> bool {
            true
        }

        async fn request_permissions(
            &self,
            requested: &[Permission],
        ) -> Result<Vec<Permission>, SyncError> {
            Ok(requested.to_vec())
        }

        async fn write_records(&self, records: Vec<HealthRecord>) -> Result<(), SyncError> {
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            let mut stored = self.records.lock().unwrap();
            for record in records {
                let id = record.client_record_id().to_string();
                match stored.get(&id) {
                    Some(existing)
                        if existing.client_record_version() > record.client_record_version() =>
                    {
                        // Stale version; the ledger keeps the newer record.
                    }
                    _ => {
                        stored.insert(id, record);
                    }
                }
            }
            Ok(())
        }

        async fn delete_records(
            &self,
            _record_type: HealthRecordType,
            client_ids: Vec<String>,
        ) -> Result<(), SyncError> {
            let mut stored = self.records.lock().unwrap();
            for id in client_ids {
                stored.remove(&id);
            }
            Ok(())
        }
    }

    /// Provider whose writes always fail, for the swallow path.
    struct BrokenProvider;

    #[async_trait]
    impl HealthProvider for BrokenProvider {
        async fn check_availability(&self) -> AvailabilityState {
            AvailabilityState::Ready
        }

        async fn initialize(&self) -> bool {
            true
        }

        async fn request_permissions(
            &self,
            _requested: &[Permission],
        ) -> Result<Vec<Permission>, SyncError> {
            Err(SyncError::Provider("permission service down".to_string()))
        }

        async fn write_records(&self, _records: Vec<HealthRecord>) -> Result<(), SyncError> {
            Err(SyncError::Provider("transport error".to_string()))
        }

        async fn delete_records(
            &self,
            _record_type: HealthRecordType,
            _client_ids: Vec<String>,
        ) -> Result<(), SyncError> {
            Err(SyncError::Provider("transport error".to_string()))
        }
    }

    fn meal(id: i64, calories: f64) -> MealRecord {
        MealRecord {
            id,
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            meal_type: MealType::Lunch,
            analysis: NutritionPayload::from_totals(calories, 30.0, 60.0, 20.0),
            image_base64: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sync_meal_writes_nutrition_record() {
        let ledger = MockLedger::ready();
        let sync = HealthSync::new(ledger.clone());

        sync.sync_meal(&meal(42, 500.0)).await;

        let record = ledger.record("meal_42").expect("record written");
        match record {
            HealthRecord::Nutrition(r) => {
                assert_eq!(r.energy_kcal, 500.0);
                assert_eq!(r.name, "lunch");
                assert_eq!(r.end_time - r.start_time, Duration::seconds(60));
            }
            _ => panic!("expected a nutrition record"),
        }
    }

    #[tokio::test]
    async fn test_resync_upserts_instead_of_duplicating() {
        let ledger = MockLedger::ready();
        let sync = HealthSync::new(ledger.clone());

        sync.sync_meal(&meal(42, 500.0)).await;
        let first_version = ledger.record("meal_42").unwrap().client_record_version();

        // Refined totals, same local id: must overwrite, not duplicate.
        sync.sync_meal(&meal(42, 650.0)).await;

        assert_eq!(ledger.len(), 1);
        let record = ledger.record("meal_42").unwrap();
        assert!(record.client_record_version() > first_version);
        match record {
            HealthRecord::Nutrition(r) => assert_eq!(r.energy_kcal, 650.0),
            _ => panic!("expected a nutrition record"),
        }
    }

    #[tokio::test]
    async fn test_versions_strictly_increase_back_to_back() {
        let ledger = MockLedger::ready();
        let sync = HealthSync::new(ledger.clone());

        // Both syncs land within the same millisecond; versions must still
        // strictly increase or the ledger keeps the stale copy.
        let mut versions = Vec::new();
        for calories in [500.0, 550.0, 600.0] {
            sync.sync_meal(&meal(42, calories)).await;
            versions.push(ledger.record("meal_42").unwrap().client_record_version());
        }
        assert!(versions[1] > versions[0]);
        assert!(versions[2] > versions[1]);

        match ledger.record("meal_42").unwrap() {
            HealthRecord::Nutrition(r) => assert_eq!(r.energy_kcal, 600.0),
            _ => panic!("expected a nutrition record"),
        }
    }

    #[tokio::test]
    async fn test_delete_targets_client_id() {
        let ledger = MockLedger::ready();
        let sync = HealthSync::new(ledger.clone());

        sync.sync_meal(&meal(42, 500.0)).await;
        assert_eq!(ledger.len(), 1);

        sync.delete_meal(42).await;
        assert!(ledger.record("meal_42").is_none());

        // Deleting an id never mirrored is still silent.
        sync.delete_meal(999).await;
    }

    #[tokio::test]
    async fn test_water_sync_uses_one_second_interval() {
        let ledger = MockLedger::ready();
        let sync = HealthSync::new(ledger.clone());

        sync.sync_water(7, 250, Utc::now()).await;

        match ledger.record("water_7").expect("record written") {
            HealthRecord::Hydration(r) => {
                assert_eq!(r.volume_ml, 250.0);
                assert_eq!(r.end_time - r.start_time, Duration::seconds(1));
            }
            _ => panic!("expected a hydration record"),
        }
    }

    #[tokio::test]
    async fn test_not_ready_states_skip_writes() {
        for state in [
            AvailabilityState::Unavailable,
            AvailabilityState::Uninstalled,
            AvailabilityState::UpdateRequired,
        ] {
            let ledger = MockLedger::with_state(state);
            let sync = HealthSync::new(ledger.clone());

            sync.sync_meal(&meal(1, 100.0)).await;
            sync.delete_meal(1).await;

            assert_eq!(ledger.write_calls.load(Ordering::SeqCst), 0);
            assert_eq!(ledger.len(), 0);
        }
    }

    #[tokio::test]
    async fn test_failures_are_swallowed_and_local_state_unaffected() {
        use crate::db::KvStore;
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = KvStore::open(temp_dir.path()).unwrap();
        let sync = HealthSync::new(Arc::new(BrokenProvider));

        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let payload = NutritionPayload::from_totals(500.0, 30.0, 60.0, 20.0);
        let id = store
            .add_meal(date, MealType::Lunch, &payload, None)
            .await
            .unwrap();

        // The write path: local commit first, then fire-and-forget sync.
        let record = store.meals_by_date(date).await.unwrap().remove(0);
        sync.sync_meal(&record).await;
        sync.sync_water(1, 250, Utc::now()).await;
        sync.delete_meal(id).await;

        // The sync failure never hides the local record.
        let meals = store.meals_by_date(date).await.unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].id, id);
    }

    #[tokio::test]
    async fn test_setup_reports_granted_subset() {
        let sync = HealthSync::new(MockLedger::ready());
        let granted = sync.setup().await.unwrap();
        assert_eq!(granted.len(), REQUESTED_PERMISSIONS.len());
    }

    #[tokio::test]
    async fn test_setup_surfaces_not_ready() {
        let sync = HealthSync::new(MockLedger::with_state(AvailabilityState::Uninstalled));
        assert!(matches!(
            sync.setup().await,
            Err(SyncError::NotReady(AvailabilityState::Uninstalled))
        ));
    }
}
