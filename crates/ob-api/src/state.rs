//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! Every record type lives in its own in-memory [`Store`]. Lifecycle rules
//! are not enforced here; handlers call the ob-state machines inside
//! [`Store::try_update`] so that check and set happen under one write lock.
//!
//! Publication environments and their state snapshots are written through
//! to Postgres when a pool is configured and hydrated back on startup.
//! Everything else is in-memory only.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use ob_core::{ActFrbr, DocumentType, EnvironmentId, Frbr, ProcedureType, StateId, WorkKind};
use ob_publication::input::{Area, AreaOfJurisdiction, InputAsset, PublicationObject, StoredFile};
use ob_publication::providers::ActIdentity;
use ob_publication::state::v1;
use ob_publication::upgrade::{
    LegacyPublicationData, PublicationDataRepository, SourceWerkingsgebied,
};
use ob_publication::{
    AssetProvider, EnvironmentStateRepository, PublicationError, StateLoader, StateV5,
    StateVersionFactory, StoredState,
};
use ob_state::{
    Environment, Module, ModuleObjectAction, PackageType, PublicationVersionStatus, ReportStatus,
};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot`, never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Records matching `pred`, cloned out under one read lock.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| pred(v))
            .cloned()
            .collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if not found.
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(id) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under the store's write lock. Returns `None` if the
    /// record doesn't exist, or `Some(result)` with the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    #[allow(dead_code)]
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Configuration ------------------------------------------------------------

/// Runtime configuration, read from the environment by the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Accept LVBB reports whose `idLevering` does not match the package.
    pub debug_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            debug_mode: false,
        }
    }
}

impl AppConfig {
    /// `PORT` (default 8080) and `OB_DEBUG_MODE` (`true`/`1`).
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let debug_mode = std::env::var("OB_DEBUG_MODE")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);
        Self { port, debug_mode }
    }
}

// -- Policy Objects -----------------------------------------------------------

/// Editable content of a policy object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ObjectContent {
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub werkingsgebied_code: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub assets: Vec<Uuid>,
    /// Geometry, for werkingsgebied objects.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub area: Option<Area>,
    /// Stored file, for document objects.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub file: Option<StoredFile>,
}

impl ObjectContent {
    fn to_publication_object(
        &self,
        uuid: Uuid,
        code: &str,
        object_type: &str,
        object_id: i64,
    ) -> PublicationObject {
        PublicationObject {
            uuid,
            code: code.to_string(),
            object_type: object_type.to_string(),
            object_id,
            title: self.title.clone(),
            text: self.text.clone(),
            werkingsgebied_code: self.werkingsgebied_code.clone(),
            documents: self.documents.clone(),
            assets: self.assets.clone(),
            area: self.area.clone(),
            file: self.file.clone(),
        }
    }
}

/// Registry entry allocating an object code. Codes are never reused.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ObjectStaticRecord {
    pub uuid: Uuid,
    pub code: String,
    pub object_type: String,
    pub object_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A draft version of an object inside a module.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModuleObjectRecord {
    pub uuid: Uuid,
    pub module_id: Uuid,
    pub code: String,
    pub object_type: String,
    pub object_id: i64,
    #[schema(value_type = String)]
    pub action: ModuleObjectAction,
    #[serde(flatten)]
    pub content: ObjectContent,
    pub modified_at: DateTime<Utc>,
}

impl ModuleObjectRecord {
    pub fn to_publication_object(&self) -> PublicationObject {
        self.content
            .to_publication_object(self.uuid, &self.code, &self.object_type, self.object_id)
    }
}

/// A durable object version, created when a module completes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ObjectRecord {
    pub uuid: Uuid,
    pub code: String,
    pub object_type: String,
    pub object_id: i64,
    pub module_id: Uuid,
    /// The module object this version was completed from.
    pub adjust_on: Uuid,
    #[serde(flatten)]
    pub content: ObjectContent,
    pub start_validity: DateTime<Utc>,
    pub end_validity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ObjectRecord {
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.start_validity <= at && self.end_validity.map_or(true, |end| end > at)
    }

    pub fn to_publication_object(&self) -> PublicationObject {
        self.content
            .to_publication_object(self.uuid, &self.code, &self.object_type, self.object_id)
    }
}

/// Stored image referenced from object text.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssetRecord {
    pub uuid: Uuid,
    pub extension: String,
    pub checksum: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

/// Administrative borders the province publishes under.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AreaOfJurisdictionRecord {
    pub uuid: Uuid,
    pub title: String,
    pub administrative_borders_id: String,
    pub administrative_borders_domain: String,
    pub administrative_borders_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl AreaOfJurisdictionRecord {
    pub fn to_input(&self) -> AreaOfJurisdiction {
        AreaOfJurisdiction {
            uuid: self.uuid,
            title: self.title.clone(),
            administrative_borders_id: self.administrative_borders_id.clone(),
            administrative_borders_domain: self.administrative_borders_domain.clone(),
            administrative_borders_date: ob_core::format_date(self.administrative_borders_date),
        }
    }
}

// -- Environment States -------------------------------------------------------

/// A consolidated state snapshot. `adjust_on` is the state it was built on.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnvironmentStateRecord {
    pub uuid: Uuid,
    pub environment_id: Uuid,
    pub adjust_on: Option<Uuid>,
    pub schema_version: u32,
    #[schema(value_type = Object)]
    pub state: serde_json::Value,
    pub is_activated: bool,
    pub activated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl EnvironmentStateRecord {
    pub fn new(environment: EnvironmentId, adjust_on: Option<StateId>, stored: StoredState) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            environment_id: environment.0,
            adjust_on: adjust_on.map(|s| s.0),
            schema_version: stored.schema_version,
            state: stored.data,
            is_activated: false,
            activated_at: None,
            created_at: Utc::now(),
        }
    }
}

// -- Acts & Publications ------------------------------------------------------

/// One expression of an act delivered through a publication package.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActVersionRecord {
    pub expression_language: String,
    pub expression_date: String,
    pub expression_version: u32,
    pub act_package_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActRecord {
    pub uuid: Uuid,
    pub environment_id: Uuid,
    #[schema(value_type = String)]
    pub document_type: DocumentType,
    #[schema(value_type = String)]
    pub procedure_type: ProcedureType,
    pub act_id: i64,
    pub title: String,
    pub work_province_id: String,
    pub work_country: String,
    pub work_date: String,
    pub work_other: String,
    pub is_active: bool,
    pub versions: Vec<ActVersionRecord>,
    pub created_at: DateTime<Utc>,
}

impl ActRecord {
    pub fn identity(&self, environment: &Environment) -> ActIdentity {
        ActIdentity {
            act_id: self.act_id,
            province_id: self.work_province_id.clone(),
            country: self.work_country.clone(),
            language: environment.frbr_language.clone(),
            work_date: self.work_date.clone(),
            work_other: self.work_other.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicationRecord {
    pub uuid: Uuid,
    pub environment_id: Uuid,
    pub act_id: Uuid,
    #[schema(value_type = String)]
    pub document_type: DocumentType,
    #[schema(value_type = String)]
    pub procedure_type: ProcedureType,
    pub title: String,
    /// Text template placing objects with `<object code="..."/>`.
    pub template: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicationVersionRecord {
    pub uuid: Uuid,
    pub publication_id: Uuid,
    /// Module whose objects overlay the valid objects.
    pub module_id: Option<Uuid>,
    pub effective_date: Option<NaiveDate>,
    pub announcement_date: Option<NaiveDate>,
    #[schema(value_type = String)]
    pub status: PublicationVersionStatus,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

// -- Packages -----------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PackageZipRecord {
    pub filename: String,
    pub checksum: String,
    pub size: usize,
}

/// One uploaded LVBB report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportRecord {
    pub uuid: Uuid,
    pub filename: String,
    #[schema(value_type = String)]
    pub status: ReportStatus,
    pub main_outcome: String,
    pub sub_delivery_id: String,
    pub sub_progress: String,
    pub sub_outcome: String,
    pub source_checksum: String,
    pub created_at: DateTime<Utc>,
}

/// Werkingsgebied as delivered with a package, kept for state upgrades.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PackageWerkingsgebied {
    pub uuid: String,
    pub object_id: i64,
    pub code: String,
    pub title: String,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActPackageRecord {
    pub uuid: Uuid,
    pub version_id: Uuid,
    pub environment_id: Uuid,
    #[schema(value_type = String)]
    pub package_type: PackageType,
    #[schema(value_type = String)]
    pub report_status: ReportStatus,
    pub delivery_id: String,
    pub zip: PackageZipRecord,
    #[schema(value_type = Object)]
    pub act_frbr: ActFrbr,
    #[schema(value_type = Object)]
    pub bill_frbr: Frbr,
    pub used_state: Option<Uuid>,
    pub created_state: Option<Uuid>,
    pub werkingsgebieden: Vec<PackageWerkingsgebied>,
    #[schema(value_type = Option<Object>)]
    pub area_of_jurisdiction: Option<AreaOfJurisdiction>,
    pub reports: Vec<ReportRecord>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnnouncementRecord {
    pub uuid: Uuid,
    pub act_package_id: Uuid,
    pub version_id: Uuid,
    pub environment_id: Uuid,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnnouncementPackageRecord {
    pub uuid: Uuid,
    pub announcement_id: Uuid,
    pub environment_id: Uuid,
    #[schema(value_type = String)]
    pub package_type: PackageType,
    #[schema(value_type = String)]
    pub report_status: ReportStatus,
    pub delivery_id: String,
    pub zip: PackageZipRecord,
    #[schema(value_type = Object)]
    pub doc_frbr: Frbr,
    pub used_state: Option<Uuid>,
    pub created_state: Option<Uuid>,
    pub reports: Vec<ReportRecord>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

// -- Application State --------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub modules: Store<Module>,
    pub module_objects: Store<ModuleObjectRecord>,
    pub object_statics: Store<ObjectStaticRecord>,
    pub objects: Store<ObjectRecord>,
    pub assets: Store<AssetRecord>,
    pub areas_of_jurisdiction: Store<AreaOfJurisdictionRecord>,
    pub environments: Store<Environment>,
    pub states: Store<EnvironmentStateRecord>,
    pub acts: Store<ActRecord>,
    pub publications: Store<PublicationRecord>,
    pub versions: Store<PublicationVersionRecord>,
    pub act_packages: Store<ActPackageRecord>,
    pub announcements: Store<AnnouncementRecord>,
    pub announcement_packages: Store<AnnouncementPackageRecord>,
    /// Monotonic id sequences: object ids per type, act ids, bill and
    /// announcement numbers per environment.
    counters: Arc<Mutex<HashMap<String, i64>>>,
    pub config: AppConfig,
    pub db_pool: Option<PgPool>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            modules: Store::new(),
            module_objects: Store::new(),
            object_statics: Store::new(),
            objects: Store::new(),
            assets: Store::new(),
            areas_of_jurisdiction: Store::new(),
            environments: Store::new(),
            states: Store::new(),
            acts: Store::new(),
            publications: Store::new(),
            versions: Store::new(),
            act_packages: Store::new(),
            announcements: Store::new(),
            announcement_packages: Store::new(),
            counters: Arc::new(Mutex::new(HashMap::new())),
            config,
            db_pool,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Next value of the sequence `key`, starting at 1.
    pub fn next_id(&self, key: &str) -> i64 {
        let mut counters = self.counters.lock();
        let next = counters.entry(key.to_string()).or_insert(0);
        *next += 1;
        *next
    }

    /// The value [`next_id`](Self::next_id) would hand out, without taking it.
    pub fn peek_id(&self, key: &str) -> i64 {
        self.counters.lock().get(key).copied().unwrap_or(0) + 1
    }

    /// Durable objects valid at `at`, the newest version per code.
    pub fn valid_objects(&self, at: DateTime<Utc>) -> Vec<ObjectRecord> {
        let mut latest: BTreeMap<String, ObjectRecord> = BTreeMap::new();
        for object in self.objects.filter(|o| o.start_validity <= at) {
            match latest.get(&object.code) {
                Some(current)
                    if (current.start_validity, current.created_at)
                        >= (object.start_validity, object.created_at) => {}
                _ => {
                    latest.insert(object.code.clone(), object);
                }
            }
        }
        latest.into_values().filter(|o| o.is_valid_at(at)).collect()
    }

    /// Objects a publication version is built from: the valid objects with
    /// the version's module applied on top.
    pub fn version_objects(&self, version: &PublicationVersionRecord) -> Vec<PublicationObject> {
        let mut objects: BTreeMap<String, PublicationObject> = self
            .valid_objects(Utc::now())
            .iter()
            .map(|o| (o.code.clone(), o.to_publication_object()))
            .collect();

        if let Some(module_id) = version.module_id {
            for module_object in self.module_objects.filter(|o| o.module_id == module_id) {
                match module_object.action {
                    ModuleObjectAction::Terminate => {
                        objects.remove(&module_object.code);
                    }
                    ModuleObjectAction::Create | ModuleObjectAction::Edit => {
                        objects.insert(
                            module_object.code.clone(),
                            module_object.to_publication_object(),
                        );
                    }
                }
            }
        }

        objects.into_values().collect()
    }

    /// The most recent administrative borders, by borders date.
    pub fn latest_area_of_jurisdiction(&self) -> Option<AreaOfJurisdictionRecord> {
        self.areas_of_jurisdiction
            .list()
            .into_iter()
            .max_by_key(|a| (a.administrative_borders_date, a.created_at))
    }

    /// Loader with the full upgrade chain; v1 states are upgraded with
    /// the publication data kept on act packages.
    pub fn state_loader(&self) -> StateLoader {
        StateLoader::new(StateVersionFactory::new(Arc::new(self.clone())))
    }

    /// The active state of `environment` in the current schema.
    pub fn load_active_state(
        &self,
        environment: &Environment,
    ) -> Result<Option<StateV5>, PublicationError> {
        self.state_loader().load_environment_state(self, environment)
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let environments = crate::db::environments::load_all(pool)
            .await
            .map_err(|e| format!("failed to load environments: {e}"))?;
        let environment_count = environments.len();
        for environment in environments {
            self.environments.insert(environment.id.0, environment);
        }

        let states = crate::db::states::load_all(pool)
            .await
            .map_err(|e| format!("failed to load environment states: {e}"))?;
        let state_count = states.len();
        for record in states {
            self.states.insert(record.uuid, record);
        }

        tracing::info!(
            environments = environment_count,
            states = state_count,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// -- Domain Repositories ------------------------------------------------------

impl EnvironmentStateRepository for AppState {
    fn get_state(&self, id: StateId) -> Option<StoredState> {
        self.states.get(id.as_uuid()).map(|record| StoredState {
            schema_version: record.schema_version,
            data: record.state,
        })
    }
}

impl AssetProvider for Store<AssetRecord> {
    fn get_assets_by_uuids(&self, uuids: &[Uuid]) -> Result<Vec<InputAsset>, PublicationError> {
        Ok(uuids
            .iter()
            .filter_map(|uuid| self.get(uuid))
            .map(|asset| InputAsset {
                uuid: asset.uuid.to_string(),
                extension: asset.extension,
            })
            .collect())
    }
}

impl PublicationDataRepository for AppState {
    fn publication_data(
        &self,
        environment: EnvironmentId,
        act: &v1::ActiveAct,
    ) -> Result<Option<LegacyPublicationData>, PublicationError> {
        let expression = act.act_frbr.expression(WorkKind::Act);
        let package = self
            .act_packages
            .filter(|p| {
                p.environment_id == environment.0
                    && p.package_type == PackageType::Publication
                    && p.act_frbr.expression() == expression
            })
            .into_iter()
            .max_by_key(|p| p.created_at);

        Ok(package.map(|p| LegacyPublicationData {
            publication_version_uuid: p.version_id.to_string(),
            werkingsgebieden: p
                .werkingsgebieden
                .into_iter()
                .map(|w| SourceWerkingsgebied {
                    uuid: w.uuid,
                    object_id: w.object_id,
                    code: w.code,
                    title: w.title,
                    hash: w.hash,
                })
                .collect(),
            area_of_jurisdiction: p.area_of_jurisdiction,
        }))
    }
}
