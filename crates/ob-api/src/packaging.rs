//! # Package Orchestration
//!
//! Ties the stores to the ob-publication builders and the ob-state
//! machines. Route handlers call into this module and only take care of
//! request parsing and Postgres write-through.
//!
//! ## Act package lifecycle
//!
//! 1. **Create.** The publication version's objects are resolved, FRBRs
//!    are minted and the package is built against the environment's
//!    active state. A publication package on a stateful environment
//!    stores the next state and locks the environment.
//!
//! 2. **Report.** Uploaded LVBB reports are folded into the package's
//!    report status. A settled `failed` releases the environment; a
//!    settled `valid` activates the created state.
//!
//! 3. **Abort.** A valid publication package that is still the head of
//!    the state chain can be rolled back to the state it was built on.
//!
//! Announcement packages follow the same lifecycle without the abort.
//! [`validate_act_package`] runs the act builder for a version and throws
//! the result away.
//!
//! ## Locking
//!
//! Building runs inside [`Store::try_update`](crate::state::Store::try_update)
//! on the environment, so the lock check, the read of the active state and
//! the lock itself are one step. No other store is written while that
//! lock is held.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use ob_core::{ActFrbr, DocumentType, PurposeType, StateId};
use ob_publication::input::{used_object_codes, PublicationData, PublicationObject};
use ob_publication::{
    parse_report, providers, ActInputData, ActPackageBuilder, AnnouncementInputData,
    AnnouncementPackageBuilder, PackageZip, StateV5,
};
use ob_state::{
    resolve_report_status, AbortGuard, AbortRequest, Environment, PackageType,
    PublicationVersionStatus, ReportOutcome, ReportStatus,
};

use crate::error::AppError;
use crate::state::{
    ActPackageRecord, ActRecord, ActVersionRecord, AnnouncementPackageRecord, AnnouncementRecord,
    AppState, EnvironmentStateRecord, PackageWerkingsgebied, PackageZipRecord, PublicationRecord,
    PublicationVersionRecord, ReportRecord,
};

// -- Request / Response Types -------------------------------------------------

/// One uploaded LVBB report file.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UploadedReport {
    pub filename: String,
    /// Raw XML content.
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PackageCreatedResponse {
    pub package_uuid: Uuid,
    pub zip_filename: String,
    pub zip_checksum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportUploadResponse {
    #[schema(value_type = String)]
    pub status: ReportStatus,
    pub duplicate_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AbortResponse {
    pub new_state_uuid: Uuid,
}

/// Records touched by an operation, handed back for write-through.
#[derive(Debug, Default)]
pub struct Changes {
    pub environment: Option<Environment>,
    pub new_state: Option<EnvironmentStateRecord>,
    pub activated_state: Option<EnvironmentStateRecord>,
}

// -- Guards -------------------------------------------------------------------

fn guard_package_type(environment: &Environment, package_type: PackageType) -> Result<(), AppError> {
    let allowed = match package_type {
        PackageType::Validation => environment.can_validate,
        PackageType::Publication => environment.can_publicate,
    };
    if !allowed {
        return Err(AppError::Conflict(format!(
            "Can not create {package_type} for this environment"
        )));
    }
    Ok(())
}

fn guard_version(version: &PublicationVersionRecord) -> Result<(), AppError> {
    if version.is_locked {
        return Err(AppError::Conflict(
            "This publication version is locked".to_string(),
        ));
    }
    Ok(())
}

fn guard_act(act: &ActRecord) -> Result<(), AppError> {
    if !act.is_active {
        return Err(AppError::Conflict(
            "This act can no longer be used".to_string(),
        ));
    }
    Ok(())
}

// -- Lookups ------------------------------------------------------------------

struct VersionContext {
    version: PublicationVersionRecord,
    publication: PublicationRecord,
    act: ActRecord,
    environment: Environment,
}

fn version_context(state: &AppState, version_id: Uuid) -> Result<VersionContext, AppError> {
    let version = state
        .versions
        .get(&version_id)
        .ok_or_else(|| AppError::NotFound(format!("publication version {version_id} not found")))?;
    let publication = state.publications.get(&version.publication_id).ok_or_else(|| {
        AppError::NotFound(format!("publication {} not found", version.publication_id))
    })?;
    let act = state
        .acts
        .get(&publication.act_id)
        .ok_or_else(|| AppError::NotFound(format!("act {} not found", publication.act_id)))?;
    let environment = state
        .environments
        .get(&publication.environment_id)
        .ok_or_else(|| {
            AppError::NotFound(format!("environment {} not found", publication.environment_id))
        })?;
    Ok(VersionContext {
        version,
        publication,
        act,
        environment,
    })
}

/// The active state for building, an empty one if the chain has not
/// started. `None` for stateless environments.
fn source_state(state: &AppState, environment: &Environment) -> Result<Option<StateV5>, AppError> {
    if !environment.has_state {
        return Ok(None);
    }
    Ok(Some(state.load_active_state(environment)?.unwrap_or_default()))
}

// -- Act Input ----------------------------------------------------------------

/// Objects the package is built from: everything of an object type the
/// template uses, plus the werkingsgebieden and documents they point at.
fn package_objects(
    all_objects: &[PublicationObject],
    used_codes: &BTreeSet<String>,
) -> Vec<PublicationObject> {
    let used_types: BTreeSet<&str> = used_codes
        .iter()
        .filter_map(|code| code.rsplit_once('-').map(|(object_type, _)| object_type))
        .collect();
    all_objects
        .iter()
        .filter(|o| {
            used_types.contains(o.object_type.as_str())
                || matches!(o.object_type.as_str(), "werkingsgebied" | "document")
        })
        .cloned()
        .collect()
}

fn act_input(
    state: &AppState,
    ctx: &VersionContext,
    act_frbr: ActFrbr,
    package_type: PackageType,
    bill_number: i64,
) -> Result<ActInputData, AppError> {
    let VersionContext {
        version,
        publication,
        act,
        environment,
    } = ctx;

    let bill_frbr = providers::new_work_frbr(
        &act_frbr,
        format!("{}-{bill_number}", act.document_type.as_str()),
    );
    let consolidation_purpose = providers::consolidation_purpose(
        &act_frbr,
        PurposeType::Consolidation,
        version.effective_date,
    );

    let all_objects = state.version_objects(version);
    let used_codes = used_object_codes(&publication.template);
    let used_objects: Vec<PublicationObject> = all_objects
        .iter()
        .filter(|o| used_codes.contains(&o.code))
        .cloned()
        .collect();

    let werkingsgebieden = providers::werkingsgebieden(&act_frbr, &all_objects, &used_objects)?;
    let documents = providers::documents(&act_frbr, &all_objects, &used_objects)?;
    let assets = providers::assets(&used_objects, &state.assets)?;
    let area_of_jurisdiction = state.latest_area_of_jurisdiction().map(|a| a.to_input());

    Ok(ActInputData {
        bill_frbr,
        act_frbr,
        consolidation_purpose,
        publication_data: PublicationData {
            objects: package_objects(&all_objects, &used_codes),
            used_object_codes: used_codes,
            werkingsgebieden,
            documents,
            assets,
            area_of_jurisdiction,
        },
        package_type,
        document_type: publication.document_type,
        procedure_type: publication.procedure_type,
        publication_version_uuid: version.uuid,
        province_id: environment.province_id.clone(),
        act_mutation: None,
        ow_state: None,
    })
}

fn bill_key(environment: &Environment) -> String {
    format!("bill:{}", environment.id)
}

fn zip_record(zip: &PackageZip) -> PackageZipRecord {
    PackageZipRecord {
        filename: zip.filename.clone(),
        checksum: zip.checksum.clone(),
        size: zip.content.len(),
    }
}

fn initial_report_status(environment: &Environment) -> ReportStatus {
    if environment.has_state {
        ReportStatus::Pending
    } else {
        ReportStatus::NotApplicable
    }
}

/// Store the next state and lock the environment for a publication.
fn stage_new_state(
    environment: &mut Environment,
    package_type: PackageType,
    build: impl FnOnce() -> Result<StateV5, ob_publication::PublicationError>,
) -> Result<Option<EnvironmentStateRecord>, AppError> {
    if !environment.has_state || package_type != PackageType::Publication {
        return Ok(None);
    }
    let new_state = build()?;
    let record = EnvironmentStateRecord::new(
        environment.id,
        environment.active_state,
        new_state.to_stored()?,
    );
    environment.lock()?;
    Ok(Some(record))
}

// -- Act Packages -------------------------------------------------------------

/// Build an act package for a publication version.
pub fn create_act_package(
    state: &AppState,
    version_id: Uuid,
    package_type: PackageType,
) -> Result<(ActPackageRecord, Changes), AppError> {
    let ctx = version_context(state, version_id)?;
    guard_package_type(&ctx.environment, package_type)?;
    guard_version(&ctx.version)?;
    guard_act(&ctx.act)?;

    let act_frbr = providers::act_frbr(
        &ctx.act.identity(&ctx.environment),
        ctx.act.versions.len() as u32,
    );
    let environment_id = ctx.environment.id.0;

    let built = state
        .environments
        .try_update(&environment_id, |environment| {
            environment.guard_unlocked()?;
            let source = source_state(state, environment)?;
            let bill_number = state.next_id(&bill_key(environment));
            let input = act_input(state, &ctx, act_frbr, package_type, bill_number)?;
            let builder = ActPackageBuilder::new(input, source, &state.assets)?;
            let zip = builder.build_zip()?;
            let used_state = environment.active_state;
            let new_state =
                stage_new_state(environment, package_type, || builder.create_new_state())?;
            Ok::<_, AppError>((builder, zip, used_state, new_state, environment.clone()))
        })
        .ok_or_else(|| AppError::NotFound(format!("environment {environment_id} not found")))??;
    let (builder, zip, used_state, new_state, environment) = built;

    let input = builder.input();
    let now = Utc::now();
    let package = ActPackageRecord {
        uuid: Uuid::new_v4(),
        version_id,
        environment_id,
        package_type,
        report_status: initial_report_status(&environment),
        delivery_id: builder.delivery_id().to_string(),
        zip: zip_record(&zip),
        act_frbr: input.act_frbr.clone(),
        bill_frbr: input.bill_frbr.clone(),
        used_state: used_state.map(|s| s.0),
        created_state: new_state.as_ref().map(|s| s.uuid),
        werkingsgebieden: input
            .publication_data
            .werkingsgebieden
            .iter()
            .map(|w| PackageWerkingsgebied {
                uuid: w.uuid.clone(),
                object_id: w.object_id,
                code: w.code.clone(),
                title: w.title.clone(),
                hash: w.hash.clone(),
            })
            .collect(),
        area_of_jurisdiction: input.publication_data.area_of_jurisdiction.clone(),
        reports: Vec::new(),
        created_at: now,
        modified_at: now,
    };

    if let Some(record) = &new_state {
        state.states.insert(record.uuid, record.clone());
    }
    state.act_packages.insert(package.uuid, package.clone());

    if package_type == PackageType::Publication && environment.has_state {
        let frbr = &package.act_frbr.frbr;
        state.acts.update(&ctx.act.uuid, |act| {
            act.versions.push(ActVersionRecord {
                expression_language: frbr.expression_language.clone(),
                expression_date: frbr.expression_date.clone(),
                expression_version: frbr.expression_version,
                act_package_id: package.uuid,
            });
        });
    }
    if package.report_status != ReportStatus::NotApplicable {
        state.versions.update(&version_id, |v| {
            v.status = PublicationVersionStatus::for_package(package_type);
            v.modified_at = now;
        });
    }

    metrics::counter!(
        "ob_packages_created_total",
        "kind" => "act",
        "package_type" => package_type.as_str()
    )
    .increment(1);
    tracing::info!(
        package = %package.uuid,
        version = %version_id,
        package_type = %package_type,
        act = %package.act_frbr.expression(),
        "act package created"
    );

    Ok((
        package,
        Changes {
            environment: Some(environment),
            new_state,
            activated_state: None,
        },
    ))
}

/// Run the act package builder for a version without storing a package,
/// staging a state or taking the environment lock.
///
/// Rule violations answer 444 here rather than the 441 package creation
/// gives them.
pub fn validate_act_package(state: &AppState, version_id: Uuid) -> Result<(), AppError> {
    let ctx = version_context(state, version_id)?;
    guard_act(&ctx.act)?;

    let act_frbr = providers::act_frbr(
        &ctx.act.identity(&ctx.environment),
        ctx.act.versions.len() as u32,
    );
    let source = source_state(state, &ctx.environment)?;
    let bill_number = state.peek_id(&bill_key(&ctx.environment));
    let input = act_input(state, &ctx, act_frbr, PackageType::Validation, bill_number)?;

    ActPackageBuilder::new(input, source, &state.assets).map_err(|e| match e {
        ob_publication::PublicationError::Validation(errors) => AppError::PublicationRules {
            message: "Error(s) found while validating publication".to_string(),
            details: serde_json::to_value(&errors).ok(),
        },
        other => AppError::from(other),
    })?;

    tracing::debug!(version = %version_id, "publication version validated");
    Ok(())
}

// -- Reports ------------------------------------------------------------------

/// Parse uploads, skipping filenames already seen. Returns the new report
/// records and the number of duplicates skipped.
fn parse_uploads(
    existing: &[ReportRecord],
    files: &[UploadedReport],
    delivery_id: &str,
    debug_mode: bool,
) -> Result<(Vec<ReportRecord>, usize), AppError> {
    if files.is_empty() {
        return Err(AppError::BadRequest("Missing uploaded files".to_string()));
    }

    let mut seen: BTreeSet<&str> = existing.iter().map(|r| r.filename.as_str()).collect();
    let mut reports = Vec::new();
    let mut duplicate_count = 0;

    for file in files {
        if !seen.insert(file.filename.as_str()) {
            duplicate_count += 1;
            continue;
        }
        let outcome = parse_report(&file.content).map_err(|e| {
            tracing::warn!(filename = %file.filename, error = %e, "unreadable report upload");
            AppError::BadRequest(format!(
                "Invalid file uploaded for filename: {}",
                file.filename
            ))
        })?;
        if !debug_mode && outcome.sub_delivery_id != delivery_id {
            return Err(AppError::BadRequest(
                "Report idLevering does not match publication package UUID".to_string(),
            ));
        }
        reports.push(ReportRecord {
            uuid: Uuid::new_v4(),
            filename: file.filename.clone(),
            status: outcome.status,
            main_outcome: outcome.main_outcome,
            sub_delivery_id: outcome.sub_delivery_id,
            sub_progress: outcome.sub_progress,
            sub_outcome: outcome.sub_outcome,
            source_checksum: ob_core::sha256_hex(file.content.as_bytes()),
            created_at: Utc::now(),
        });
    }

    Ok((reports, duplicate_count))
}

fn outcomes(reports: &[ReportRecord]) -> Vec<ReportOutcome> {
    reports
        .iter()
        .map(|r| ReportOutcome {
            status: r.status,
            main_outcome: r.main_outcome.clone(),
            sub_delivery_id: r.sub_delivery_id.clone(),
            sub_progress: r.sub_progress.clone(),
            sub_outcome: r.sub_outcome.clone(),
        })
        .collect()
}

/// Fold new reports into `current`. Returns the settled status change.
fn fold_reports(current: ReportStatus, reports: &[ReportRecord]) -> Option<ReportStatus> {
    resolve_report_status(current, &outcomes(reports)).settled_change(current)
}

/// Move the environment along after a package settled.
///
/// Failed releases the lock; valid activates the created state.
fn settle_environment(
    state: &AppState,
    environment_id: Uuid,
    used_state: Option<Uuid>,
    created_state: Option<Uuid>,
    settled: ReportStatus,
) -> Result<Changes, AppError> {
    let Some(created) = created_state else {
        return Ok(Changes::default());
    };

    match settled {
        ReportStatus::Failed => {
            let environment = state
                .environments
                .update(&environment_id, |env| env.unlock());
            Ok(Changes {
                environment,
                ..Changes::default()
            })
        }
        ReportStatus::Valid => {
            let environment = state
                .environments
                .try_update(&environment_id, |env| {
                    env.activate_state(StateId(created), used_state.map(StateId))?;
                    Ok::<_, AppError>(env.clone())
                })
                .transpose()?;
            let activated_state = state.states.update(&created, |record| {
                record.is_activated = true;
                record.activated_at = Some(Utc::now());
            });
            tracing::info!(
                environment = %environment_id,
                state = %created,
                "environment state activated"
            );
            Ok(Changes {
                environment,
                new_state: None,
                activated_state,
            })
        }
        _ => Ok(Changes::default()),
    }
}

fn require_stateful(state: &AppState, environment_id: Uuid) -> Result<(), AppError> {
    let environment = state
        .environments
        .get(&environment_id)
        .ok_or_else(|| AppError::NotFound(format!("environment {environment_id} not found")))?;
    if !environment.has_state {
        return Err(AppError::BadRequest(
            "Can not upload packages for stateless environment".to_string(),
        ));
    }
    Ok(())
}

/// Upload LVBB reports for an act package.
pub fn upload_act_reports(
    state: &AppState,
    package_id: Uuid,
    files: &[UploadedReport],
) -> Result<(ReportUploadResponse, Changes), AppError> {
    let package = state
        .act_packages
        .get(&package_id)
        .ok_or_else(|| AppError::NotFound(format!("act package {package_id} not found")))?;
    require_stateful(state, package.environment_id)?;

    let (reports, duplicate_count) = parse_uploads(
        &package.reports,
        files,
        &package.delivery_id,
        state.config.debug_mode,
    )?;

    // The environment moves first so a refused activation leaves the
    // package untouched.
    let settled = fold_reports(package.report_status, &reports);
    let mut changes = Changes::default();
    if let Some(status) = settled {
        changes = settle_environment(
            state,
            package.environment_id,
            package.used_state,
            package.created_state,
            status,
        )?;
    }

    let package = state
        .act_packages
        .update(&package_id, |p| {
            p.reports.extend(reports);
            if let Some(status) = settled {
                p.report_status = status;
            }
            p.modified_at = Utc::now();
        })
        .ok_or_else(|| AppError::NotFound(format!("act package {package_id} not found")))?;

    if let Some(status) = settled {
        settle_version(state, &package, status);
        tracing::info!(package = %package_id, status = %status, "act package settled");
    }

    Ok((
        ReportUploadResponse {
            status: package.report_status,
            duplicate_count,
        },
        changes,
    ))
}

/// Packages that staged no state leave the version status alone.
fn settle_version(state: &AppState, package: &ActPackageRecord, settled: ReportStatus) {
    if package.created_state.is_none() {
        return;
    }
    let procedure_type = state
        .versions
        .get(&package.version_id)
        .and_then(|v| state.publications.get(&v.publication_id))
        .map(|p| p.procedure_type);

    state.versions.update(&package.version_id, |version| {
        match settled {
            ReportStatus::Failed => {
                version.status = PublicationVersionStatus::failed_for(package.package_type);
            }
            ReportStatus::Valid if package.package_type == PackageType::Publication => {
                version.is_locked = true;
                if let Some(next) = procedure_type.and_then(|procedure| {
                    PublicationVersionStatus::after_valid(package.package_type, procedure)
                }) {
                    version.status = next;
                }
            }
            _ => {}
        }
        version.modified_at = Utc::now();
    });
}

// -- Abort --------------------------------------------------------------------

/// Roll an accepted publication back to the state it was built on.
pub fn abort_act_package(
    state: &AppState,
    package_id: Uuid,
    confirm: bool,
) -> Result<(AbortResponse, Changes), AppError> {
    let package = state
        .act_packages
        .get(&package_id)
        .ok_or_else(|| AppError::NotFound(format!("act package {package_id} not found")))?;

    let (restored, environment) = state
        .environments
        .try_update(&package.environment_id, |env| {
            let request = AbortRequest {
                confirm,
                report_status: package.report_status,
                package_type: package.package_type,
                used_state: package.used_state.map(StateId),
                created_state: package.created_state.map(StateId),
                created_at: package.created_at,
                environment_active_state: env.active_state,
            };
            let restored = AbortGuard::check(&request, Utc::now())?;
            if let Some(created) = request.created_state {
                env.rollback_to(created, Some(restored))?;
            }
            Ok::<_, AppError>((restored, env.clone()))
        })
        .ok_or_else(|| {
            AppError::NotFound(format!("environment {} not found", package.environment_id))
        })??;

    let now = Utc::now();
    state.act_packages.update(&package_id, |p| {
        p.report_status = ReportStatus::Aborted;
        p.modified_at = now;
    });
    state.versions.update(&package.version_id, |v| {
        v.status = PublicationVersionStatus::PublicationAborted;
        v.modified_at = now;
    });

    tracing::warn!(
        package = %package_id,
        restored_state = %restored,
        "publication package aborted"
    );

    Ok((
        AbortResponse {
            new_state_uuid: restored.0,
        },
        Changes {
            environment: Some(environment),
            new_state: None,
            activated_state: None,
        },
    ))
}

// -- Announcements ------------------------------------------------------------

/// Start an announcement for a delivered act package.
pub fn create_announcement(
    state: &AppState,
    act_package_id: Uuid,
) -> Result<AnnouncementRecord, AppError> {
    let package = state
        .act_packages
        .get(&act_package_id)
        .ok_or_else(|| AppError::NotFound(format!("act package {act_package_id} not found")))?;
    let ctx = version_context(state, package.version_id)?;

    if package.package_type != PackageType::Publication {
        return Err(AppError::Conflict(
            "Can only announce publication packages".to_string(),
        ));
    }
    if ctx.environment.has_state && package.report_status != ReportStatus::Valid {
        return Err(AppError::Conflict(
            "Can not create an announcement for act package that is not successful".to_string(),
        ));
    }
    guard_act(&ctx.act)?;

    let now = Utc::now();
    let announcement = AnnouncementRecord {
        uuid: Uuid::new_v4(),
        act_package_id,
        version_id: package.version_id,
        environment_id: package.environment_id,
        is_locked: false,
        created_at: now,
        modified_at: now,
    };
    state
        .announcements
        .insert(announcement.uuid, announcement.clone());
    Ok(announcement)
}

/// Build an announcement (kennisgeving) package.
pub fn create_announcement_package(
    state: &AppState,
    announcement_id: Uuid,
    package_type: PackageType,
) -> Result<(AnnouncementPackageRecord, Changes), AppError> {
    let announcement = state.announcements.get(&announcement_id).ok_or_else(|| {
        AppError::NotFound(format!("announcement {announcement_id} not found"))
    })?;
    if announcement.is_locked {
        return Err(AppError::Conflict(
            "This publication announcement is locked".to_string(),
        ));
    }
    let act_package = state
        .act_packages
        .get(&announcement.act_package_id)
        .ok_or_else(|| {
            AppError::NotFound(format!("act package {} not found", announcement.act_package_id))
        })?;
    let ctx = version_context(state, announcement.version_id)?;
    guard_package_type(&ctx.environment, package_type)?;
    guard_act(&ctx.act)?;

    let doc_number = state.next_id(&format!("doc:{}", ctx.environment.id));
    let input = AnnouncementInputData {
        doc_frbr: providers::new_work_frbr(
            &act_package.act_frbr,
            format!("kennisgeving-{doc_number}"),
        ),
        about_act_frbr: act_package.act_frbr.frbr.clone(),
        about_bill_frbr: act_package.bill_frbr.clone(),
        document_type: ctx.publication.document_type,
        procedure_type: ctx.publication.procedure_type,
    };
    let doc_frbr = input.doc_frbr.clone();
    let environment_id = ctx.environment.id.0;

    let built = state
        .environments
        .try_update(&environment_id, |environment| {
            environment.guard_unlocked()?;
            let source = source_state(state, environment)?;
            let builder = AnnouncementPackageBuilder::new(input, package_type, source);
            let zip = builder.build_zip()?;
            let used_state = environment.active_state;
            let new_state =
                stage_new_state(environment, package_type, || builder.create_new_state())?;
            Ok::<_, AppError>((builder.delivery_id(), zip, used_state, new_state, environment.clone()))
        })
        .ok_or_else(|| AppError::NotFound(format!("environment {environment_id} not found")))??;
    let (delivery_id, zip, used_state, new_state, environment) = built;

    let now = Utc::now();
    let package = AnnouncementPackageRecord {
        uuid: Uuid::new_v4(),
        announcement_id,
        environment_id,
        package_type,
        report_status: initial_report_status(&environment),
        delivery_id: delivery_id.to_string(),
        zip: zip_record(&zip),
        doc_frbr,
        used_state: used_state.map(|s| s.0),
        created_state: new_state.as_ref().map(|s| s.uuid),
        reports: Vec::new(),
        created_at: now,
        modified_at: now,
    };

    if let Some(record) = &new_state {
        state.states.insert(record.uuid, record.clone());
    }
    state
        .announcement_packages
        .insert(package.uuid, package.clone());
    if package_type == PackageType::Publication {
        state.versions.update(&announcement.version_id, |v| {
            v.status = PublicationVersionStatus::Announcement;
            v.modified_at = now;
        });
    }

    metrics::counter!(
        "ob_packages_created_total",
        "kind" => "announcement",
        "package_type" => package_type.as_str()
    )
    .increment(1);
    tracing::info!(
        package = %package.uuid,
        announcement = %announcement_id,
        package_type = %package_type,
        "announcement package created"
    );

    Ok((
        package,
        Changes {
            environment: Some(environment),
            new_state,
            activated_state: None,
        },
    ))
}

/// Upload LVBB reports for an announcement package.
pub fn upload_announcement_reports(
    state: &AppState,
    package_id: Uuid,
    files: &[UploadedReport],
) -> Result<(ReportUploadResponse, Changes), AppError> {
    let package = state.announcement_packages.get(&package_id).ok_or_else(|| {
        AppError::NotFound(format!("announcement package {package_id} not found"))
    })?;
    require_stateful(state, package.environment_id)?;

    let (reports, duplicate_count) = parse_uploads(
        &package.reports,
        files,
        &package.delivery_id,
        state.config.debug_mode,
    )?;

    let settled = fold_reports(package.report_status, &reports);
    let mut changes = Changes::default();
    if let Some(status) = settled {
        changes = settle_environment(
            state,
            package.environment_id,
            package.used_state,
            package.created_state,
            status,
        )?;
    }

    let package = state
        .announcement_packages
        .update(&package_id, |p| {
            p.reports.extend(reports);
            if let Some(status) = settled {
                p.report_status = status;
            }
            p.modified_at = Utc::now();
        })
        .ok_or_else(|| {
            AppError::NotFound(format!("announcement package {package_id} not found"))
        })?;

    if let Some(status) = settled {
        if status == ReportStatus::Valid && package.package_type == PackageType::Publication {
            state.announcements.update(&package.announcement_id, |a| {
                a.is_locked = true;
                a.modified_at = Utc::now();
            });
        }
        tracing::info!(package = %package_id, status = %status, "announcement package settled");
    }

    Ok((
        ReportUploadResponse {
            status: package.report_status,
            duplicate_count,
        },
        changes,
    ))
}

// -- Listing ------------------------------------------------------------------

/// Which kind of publication a package delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PublicationKind {
    Act,
    Announcement,
}

/// Act and announcement packages in one shape.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnifiedPackage {
    pub publication_type: PublicationKind,
    pub uuid: Uuid,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub package_type: PackageType,
    #[schema(value_type = String)]
    pub report_status: ReportStatus,
    pub delivery_id: String,
    pub module_id: Option<Uuid>,
    pub module_title: Option<String>,
    #[schema(value_type = String)]
    pub document_type: DocumentType,
    pub environment_uuid: Uuid,
}

/// Filters for [`unified_packages`]. Without `report_status` and
/// `package_type` only valid publication packages are listed.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PackageFilter {
    pub environment_uuid: Option<Uuid>,
    pub module_id: Option<Uuid>,
    #[param(value_type = Option<String>)]
    pub report_status: Option<ReportStatus>,
    #[param(value_type = Option<String>)]
    pub package_type: Option<PackageType>,
    #[param(value_type = Option<String>)]
    pub document_type: Option<DocumentType>,
    #[param(value_type = Option<String>)]
    pub publication_type: Option<PublicationKind>,
}

impl PackageFilter {
    fn matches(&self, package: &UnifiedPackage) -> bool {
        self.publication_type.map_or(true, |t| t == package.publication_type)
            && self.environment_uuid.map_or(true, |e| e == package.environment_uuid)
            && self.module_id.map_or(true, |m| Some(m) == package.module_id)
            && self.report_status.unwrap_or(ReportStatus::Valid) == package.report_status
            && self.package_type.unwrap_or(PackageType::Publication) == package.package_type
            && self.document_type.map_or(true, |d| d == package.document_type)
    }
}

/// Module and document type of the version a package was built for.
fn version_origin(
    state: &AppState,
    version_id: Uuid,
) -> Option<(Option<Uuid>, Option<String>, DocumentType)> {
    let version = state.versions.get(&version_id)?;
    let publication = state.publications.get(&version.publication_id)?;
    let module_title = version
        .module_id
        .and_then(|id| state.modules.get(&id))
        .map(|m| m.title);
    Some((version.module_id, module_title, publication.document_type))
}

/// Act and announcement packages matching `filter`, newest first.
pub fn unified_packages(state: &AppState, filter: &PackageFilter) -> Vec<UnifiedPackage> {
    let acts = state.act_packages.list().into_iter().filter_map(|p| {
        let (module_id, module_title, document_type) = version_origin(state, p.version_id)?;
        Some(UnifiedPackage {
            publication_type: PublicationKind::Act,
            uuid: p.uuid,
            created_at: p.created_at,
            modified_at: p.modified_at,
            package_type: p.package_type,
            report_status: p.report_status,
            delivery_id: p.delivery_id,
            module_id,
            module_title,
            document_type,
            environment_uuid: p.environment_id,
        })
    });
    let announcements = state.announcement_packages.list().into_iter().filter_map(|p| {
        let announcement = state.announcements.get(&p.announcement_id)?;
        let (module_id, module_title, document_type) =
            version_origin(state, announcement.version_id)?;
        Some(UnifiedPackage {
            publication_type: PublicationKind::Announcement,
            uuid: p.uuid,
            created_at: p.created_at,
            modified_at: p.modified_at,
            package_type: p.package_type,
            report_status: p.report_status,
            delivery_id: p.delivery_id,
            module_id,
            module_title,
            document_type,
            environment_uuid: p.environment_id,
        })
    });

    let mut packages: Vec<UnifiedPackage> = acts
        .chain(announcements)
        .filter(|p| filter.matches(p))
        .collect();
    packages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    packages
}
