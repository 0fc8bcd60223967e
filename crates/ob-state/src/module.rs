//! # Module Lifecycle
//!
//! A module is a draft change set of policy objects. It is activated once,
//! moves through the public approval statuses while temporarily locked, and
//! ends either completed (its objects become durable) or closed.
//!
//! ```text
//! Niet-Actief ──activate──▶ Ontwerp GS Concept ──patch_status*──▶ Vastgesteld
//!                                   │                                 │
//!                                 close                     complete (locked)
//!                                   ▼                                 ▼
//!                               Gesloten                       Module afgerond
//! ```
//!
//! The status history is append-only and doubles as the transition log.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use ob_core::ModuleId;

// ─── Module Status ──────────────────────────────────────────────────

/// Status a module can carry in its history.
///
/// The first eight are public statuses a user may set while the module is
/// locked. The rest are set by the system only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleStatusCode {
    #[serde(rename = "Ontwerp GS Concept")]
    OntwerpGsConcept,
    #[serde(rename = "Ontwerp GS")]
    OntwerpGs,
    #[serde(rename = "Ontwerp PS")]
    OntwerpPs,
    #[serde(rename = "Definitief ontwerp GS Concept")]
    DefinitiefOntwerpGsConcept,
    #[serde(rename = "Definitief ontwerp GS")]
    DefinitiefOntwerpGs,
    #[serde(rename = "Definitief ontwerp PS")]
    DefinitiefOntwerpPs,
    #[serde(rename = "Vastgesteld")]
    Vastgesteld,
    #[serde(rename = "Vigerend")]
    Vigerend,
    #[serde(rename = "Niet-Actief")]
    NietActief,
    #[serde(rename = "Gesloten")]
    Gesloten,
    #[serde(rename = "Module afgerond")]
    ModuleAfgerond,
    #[serde(rename = "Vigerend gearchiveerd")]
    VigerendGearchiveerd,
}

impl ModuleStatusCode {
    pub const PUBLIC: [ModuleStatusCode; 8] = [
        Self::OntwerpGsConcept,
        Self::OntwerpGs,
        Self::OntwerpPs,
        Self::DefinitiefOntwerpGsConcept,
        Self::DefinitiefOntwerpGs,
        Self::DefinitiefOntwerpPs,
        Self::Vastgesteld,
        Self::Vigerend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OntwerpGsConcept => "Ontwerp GS Concept",
            Self::OntwerpGs => "Ontwerp GS",
            Self::OntwerpPs => "Ontwerp PS",
            Self::DefinitiefOntwerpGsConcept => "Definitief ontwerp GS Concept",
            Self::DefinitiefOntwerpGs => "Definitief ontwerp GS",
            Self::DefinitiefOntwerpPs => "Definitief ontwerp PS",
            Self::Vastgesteld => "Vastgesteld",
            Self::Vigerend => "Vigerend",
            Self::NietActief => "Niet-Actief",
            Self::Gesloten => "Gesloten",
            Self::ModuleAfgerond => "Module afgerond",
            Self::VigerendGearchiveerd => "Vigerend gearchiveerd",
        }
    }

    /// Whether a user may set this status through `patch_status`.
    pub fn is_public(&self) -> bool {
        Self::PUBLIC.contains(self)
    }
}

impl std::fmt::Display for ModuleStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleStatusCode {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::PUBLIC
            .iter()
            .chain(
                [
                    Self::NietActief,
                    Self::Gesloten,
                    Self::ModuleAfgerond,
                    Self::VigerendGearchiveerd,
                ]
                .iter(),
            )
            .find(|code| code.as_str() == s)
            .copied()
            .ok_or_else(|| ModuleError::UnknownStatus(s.to_string()))
    }
}

/// One entry of the module status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleStatus {
    pub status: ModuleStatusCode,
    pub created_date: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

// ─── Object Actions ─────────────────────────────────────────────────

/// What a module does to an object it contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleObjectAction {
    Create,
    Edit,
    Terminate,
}

/// Validity window of an object copied out of a completed module.
///
/// Terminated objects end the moment they start.
pub fn object_validity(
    action: ModuleObjectAction,
    start: DateTime<Utc>,
) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
    match action {
        ModuleObjectAction::Terminate => (start, Some(start)),
        ModuleObjectAction::Create | ModuleObjectAction::Edit => (start, None),
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Error, Debug, PartialEq)]
pub enum ModuleError {
    #[error("invalid module transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("De module is gesloten")]
    Closed,

    #[error("The module is not active")]
    NotActive,

    #[error("The module is locked")]
    Locked,

    #[error("The module must be locked first")]
    NotLocked,

    #[error("Deze module heeft geen status")]
    NoStatus,

    #[error("Alleen modules met status Vastgesteld kunnen worden afgesloten")]
    NotVastgesteld,

    #[error("status '{0}' can not be set manually")]
    InternalStatus(String),

    #[error("unknown module status '{0}'")]
    UnknownStatus(String),
}

// ─── Module ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub title: String,
    pub description: String,
    pub activated: bool,
    pub closed: bool,
    pub successful: bool,
    pub temporary_locked: bool,
    pub status_history: Vec<ModuleStatus>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Module {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ModuleId::new(),
            title: title.into(),
            description: description.into(),
            activated: false,
            closed: false,
            successful: false,
            temporary_locked: false,
            status_history: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Latest status, or `Niet-Actief` before activation.
    pub fn status(&self) -> ModuleStatusCode {
        self.status_history
            .last()
            .map(|s| s.status)
            .unwrap_or(ModuleStatusCode::NietActief)
    }

    /// Activate the module (Niet-Actief → Ontwerp GS Concept).
    pub fn activate(&mut self, by: Option<Uuid>) -> Result<(), ModuleError> {
        self.require_open()?;
        if self.activated {
            return Err(ModuleError::InvalidTransition {
                from: self.status().to_string(),
                to: ModuleStatusCode::OntwerpGsConcept.to_string(),
            });
        }
        self.activated = true;
        self.do_transition(ModuleStatusCode::OntwerpGsConcept, by);
        Ok(())
    }

    pub fn lock(&mut self) -> Result<(), ModuleError> {
        self.require_open()?;
        self.temporary_locked = true;
        self.touch();
        Ok(())
    }

    pub fn unlock(&mut self) -> Result<(), ModuleError> {
        self.require_open()?;
        self.temporary_locked = false;
        self.touch();
        Ok(())
    }

    /// Append a public status. The module must be locked.
    pub fn patch_status(
        &mut self,
        status: ModuleStatusCode,
        by: Option<Uuid>,
    ) -> Result<(), ModuleError> {
        self.require_open()?;
        if !self.activated {
            return Err(ModuleError::NotActive);
        }
        if !self.temporary_locked {
            return Err(ModuleError::NotLocked);
        }
        if !status.is_public() {
            return Err(ModuleError::InternalStatus(status.to_string()));
        }
        self.do_transition(status, by);
        Ok(())
    }

    /// Contents may only change on an active, open, unlocked module.
    pub fn ensure_editable(&self) -> Result<(), ModuleError> {
        self.require_open()?;
        if !self.activated {
            return Err(ModuleError::NotActive);
        }
        if self.temporary_locked {
            return Err(ModuleError::Locked);
        }
        Ok(())
    }

    /// Complete a locked, `Vastgesteld` module.
    ///
    /// Returns the start validity the module objects take on: the requested
    /// one or now.
    pub fn complete(
        &mut self,
        start_validity: Option<DateTime<Utc>>,
        by: Option<Uuid>,
    ) -> Result<DateTime<Utc>, ModuleError> {
        self.require_open()?;
        if !self.temporary_locked {
            return Err(ModuleError::NotLocked);
        }
        match self.status_history.last() {
            None => return Err(ModuleError::NoStatus),
            Some(s) if s.status != ModuleStatusCode::Vastgesteld => {
                return Err(ModuleError::NotVastgesteld)
            }
            Some(_) => {}
        }

        self.do_transition(ModuleStatusCode::ModuleAfgerond, by);
        self.closed = true;
        self.successful = true;
        self.temporary_locked = false;
        Ok(start_validity.unwrap_or_else(Utc::now))
    }

    /// Close the module without completing it.
    pub fn close(&mut self, by: Option<Uuid>) -> Result<(), ModuleError> {
        if self.closed {
            return Err(ModuleError::InvalidTransition {
                from: self.status().to_string(),
                to: ModuleStatusCode::Gesloten.to_string(),
            });
        }
        self.do_transition(ModuleStatusCode::Gesloten, by);
        self.closed = true;
        self.successful = false;
        self.temporary_locked = false;
        Ok(())
    }

    fn require_open(&self) -> Result<(), ModuleError> {
        if self.closed {
            return Err(ModuleError::Closed);
        }
        Ok(())
    }

    fn do_transition(&mut self, to: ModuleStatusCode, by: Option<Uuid>) {
        let now = Utc::now();
        self.status_history.push(ModuleStatus {
            status: to,
            created_date: now,
            created_by: by,
        });
        self.modified_at = now;
    }

    fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn active_module() -> Module {
        let mut m = Module::new("Herziening", "");
        m.activate(None).unwrap();
        m
    }

    fn vastgesteld_module() -> Module {
        let mut m = active_module();
        m.lock().unwrap();
        m.patch_status(ModuleStatusCode::Vastgesteld, None).unwrap();
        m
    }

    #[test]
    fn new_module_is_not_active() {
        let m = Module::new("x", "");
        assert_eq!(m.status(), ModuleStatusCode::NietActief);
        assert!(m.ensure_editable().is_err());
    }

    #[test]
    fn activate_starts_history() {
        let m = active_module();
        assert!(m.activated);
        assert_eq!(m.status(), ModuleStatusCode::OntwerpGsConcept);
        assert_eq!(m.status_history.len(), 1);
    }

    #[test]
    fn cannot_activate_twice() {
        let mut m = active_module();
        assert!(matches!(
            m.activate(None),
            Err(ModuleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn patch_status_requires_lock() {
        let mut m = active_module();
        assert_eq!(
            m.patch_status(ModuleStatusCode::OntwerpGs, None),
            Err(ModuleError::NotLocked)
        );
        m.lock().unwrap();
        m.patch_status(ModuleStatusCode::OntwerpGs, None).unwrap();
        assert_eq!(m.status(), ModuleStatusCode::OntwerpGs);
    }

    #[test]
    fn patch_status_rejects_internal_status() {
        let mut m = active_module();
        m.lock().unwrap();
        assert!(matches!(
            m.patch_status(ModuleStatusCode::ModuleAfgerond, None),
            Err(ModuleError::InternalStatus(_))
        ));
    }

    #[test]
    fn locked_module_is_not_editable() {
        let mut m = active_module();
        m.ensure_editable().unwrap();
        m.lock().unwrap();
        assert_eq!(m.ensure_editable(), Err(ModuleError::Locked));
        m.unlock().unwrap();
        m.ensure_editable().unwrap();
    }

    #[test]
    fn complete_requires_vastgesteld() {
        let mut m = active_module();
        m.lock().unwrap();
        m.patch_status(ModuleStatusCode::OntwerpPs, None).unwrap();
        assert_eq!(m.complete(None, None), Err(ModuleError::NotVastgesteld));
    }

    #[test]
    fn complete_requires_lock() {
        let mut m = vastgesteld_module();
        m.unlock().unwrap();
        assert_eq!(m.complete(None, None), Err(ModuleError::NotLocked));
    }

    #[test]
    fn complete_without_history_has_no_status() {
        let mut m = Module::new("x", "");
        m.temporary_locked = true;
        assert_eq!(m.complete(None, None), Err(ModuleError::NoStatus));
    }

    #[test]
    fn complete_closes_successfully() {
        let mut m = vastgesteld_module();
        let start = Utc::now() - chrono::Duration::days(2);
        let effective = m.complete(Some(start), None).unwrap();
        assert_eq!(effective, start);
        assert_eq!(m.status(), ModuleStatusCode::ModuleAfgerond);
        assert!(m.closed && m.successful);
        assert_eq!(m.ensure_editable(), Err(ModuleError::Closed));
    }

    #[test]
    fn close_twice_is_rejected() {
        let mut m = active_module();
        m.close(None).unwrap();
        assert_eq!(m.status(), ModuleStatusCode::Gesloten);
        assert!(!m.successful);
        assert!(m.close(None).is_err());
    }

    #[test]
    fn terminate_validity_ends_at_start() {
        let now = Utc::now();
        assert_eq!(
            object_validity(ModuleObjectAction::Terminate, now),
            (now, Some(now))
        );
        assert_eq!(object_validity(ModuleObjectAction::Edit, now), (now, None));
    }

    #[test]
    fn status_serializes_as_dutch_label() {
        let json = serde_json::to_string(&ModuleStatusCode::DefinitiefOntwerpGsConcept).unwrap();
        assert_eq!(json, "\"Definitief ontwerp GS Concept\"");
        assert_eq!(
            "Vastgesteld".parse::<ModuleStatusCode>().unwrap(),
            ModuleStatusCode::Vastgesteld
        );
        assert!("Onbekend".parse::<ModuleStatusCode>().is_err());
    }
}
