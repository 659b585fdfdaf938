use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::contract::derived::{derive_amounts, DerivedAmounts};
use crate::contract::draft::{ContractDraft, ContractParties};
use crate::contract::summary::{summarize_contract, ContractSummary, SummaryInput};
use crate::error::ContractError;
use crate::payload::commit::{build_commit_request, first_field_error, CommitReceipt};
use crate::payload::preview::build_preview_request;
use crate::schedule::manual::{self, rebuild_slots, ManualSlot};
use crate::schedule::projected::ProjectedSchedule;
use crate::schedule::{Installment, Schedule};
use crate::session::config::SessionConfig;
use crate::session::service::{ContractStore, ProjectionService, ServiceError};
use crate::types::*;
use crate::ContractResult;

/// Where an authoring session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Editing,
    Previewing,
    Reviewing,
    Committing,
    /// A commit ended without a verdict; someone must check the service
    Unresolved,
    Done,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Editing => "editing",
            SessionState::Previewing => "previewing",
            SessionState::Reviewing => "reviewing",
            SessionState::Committing => "committing",
            SessionState::Unresolved => "unresolved",
            SessionState::Done => "done",
        };
        f.write_str(s)
    }
}

/// What a human found after checking an unresolved commit with the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifiedOutcome {
    NotPersisted,
    Persisted { contract_id: EntityId },
}

struct Inner {
    draft: ContractDraft,
    schedule: Option<Schedule>,
    state: SessionState,
    field_errors: BTreeMap<String, String>,
}

/// Releases an in-flight flag when dropped, including on cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, operation: &str) -> ContractResult<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return Err(ContractError::AlreadyInFlight {
                operation: operation.into(),
            });
        }
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Moves the session out of `pending` if the call awaiting the service is
/// dropped before it records an outcome itself.
struct Settle<'a> {
    inner: &'a Mutex<Inner>,
    pending: SessionState,
    on_cancel: SessionState,
    armed: bool,
}

impl<'a> Settle<'a> {
    fn new(inner: &'a Mutex<Inner>, pending: SessionState, on_cancel: SessionState) -> Self {
        Self {
            inner,
            pending,
            on_cancel,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.state == self.pending {
            warn!(from = %self.pending, to = %self.on_cancel, "request cancelled before completion");
            inner.state = self.on_cancel;
        }
    }
}

/// One enrollment contract being authored, from the first edit to commit.
///
/// Derived amounts and validation are recomputed from the current draft on
/// every call. Preview and commit each allow a single outstanding request;
/// neither is retried automatically.
pub struct ContractSession<P, S> {
    parties: ContractParties,
    config: SessionConfig,
    projection: P,
    store: S,
    inner: Mutex<Inner>,
    preview_in_flight: AtomicBool,
    commit_in_flight: AtomicBool,
}

impl<P: ProjectionService, S: ContractStore> ContractSession<P, S> {
    pub fn new(parties: ContractParties, projection: P, store: S, config: SessionConfig) -> Self {
        debug!(student_id = parties.student_id, "contract session opened");
        Self {
            parties,
            config,
            projection,
            store,
            inner: Mutex::new(Inner {
                draft: ContractDraft::default(),
                schedule: None,
                state: SessionState::Editing,
                field_errors: BTreeMap::new(),
            }),
            preview_in_flight: AtomicBool::new(false),
            commit_in_flight: AtomicBool::new(false),
        }
    }

    pub fn parties(&self) -> ContractParties {
        self.parties
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn draft(&self) -> ContractDraft {
        self.inner.lock().draft.clone()
    }

    pub fn schedule(&self) -> Option<Schedule> {
        self.inner.lock().schedule.clone()
    }

    /// Messages the service attached to fields on the last rejected commit.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        self.inner.lock().field_errors.clone()
    }

    pub fn derived(&self) -> ContractResult<DerivedAmounts> {
        derive_amounts(&self.inner.lock().draft)
    }

    pub fn summary(&self) -> ContractResult<ComputationOutput<ContractSummary>> {
        let input = {
            let inner = self.inner.lock();
            SummaryInput {
                draft: inner.draft.clone(),
                schedule: inner.schedule.clone(),
            }
        };
        summarize_contract(&input)
    }

    /// Apply a user edit to the draft.
    ///
    /// Switching mode discards any schedule. A projected schedule whose terms
    /// no longer match the draft is discarded and the session returns to
    /// editing. In manual mode a changed count or start date rebuilds the
    /// slots, keeping those already entered.
    pub fn edit(&self, apply: impl FnOnce(&mut ContractDraft)) -> ContractResult<()> {
        let mut inner = self.inner.lock();
        ensure_editable(inner.state, "edit the contract")?;

        // nothing on the session changes unless the whole edit succeeds
        let mut draft = inner.draft.clone();
        apply(&mut draft);
        if draft == inner.draft {
            return Ok(());
        }

        let before = &inner.draft;
        let mut schedule = inner.schedule.clone();
        let mut discarded = false;

        if draft.mode != before.mode {
            debug!(mode = ?draft.mode, "schedule mode switched; schedule discarded");
            schedule = None;
            discarded = true;
        }

        match draft.mode {
            ScheduleMode::Automatic => {
                let stale = match &schedule {
                    Some(Schedule::Projected(projected)) => {
                        match build_preview_request(&self.parties, &draft) {
                            Ok(current) => !projected.matches(&current),
                            Err(_) => true,
                        }
                    }
                    _ => false,
                };
                if stale {
                    debug!("contract terms changed; projected schedule discarded");
                    schedule = None;
                    discarded = true;
                }
            }
            ScheduleMode::Manual => {
                let count_changed = draft.installments_count != before.installments_count;
                let start_changed =
                    draft.installments_start_date != before.installments_start_date;
                let has_slots = matches!(schedule, Some(Schedule::Manual(_)));
                if count_changed || start_changed || !has_slots {
                    schedule = rebuild_manual(&draft, schedule)?;
                }
            }
        }

        inner.draft = draft;
        inner.schedule = schedule;
        inner.field_errors.clear();
        if discarded && inner.state == SessionState::Reviewing {
            inner.state = SessionState::Editing;
        }
        Ok(())
    }

    /// Overwrite the due date and amount of one manual slot.
    pub fn update_slot(
        &self,
        installment_number: u32,
        due_date: Option<NaiveDate>,
        planned_amount_usd: Option<Money>,
    ) -> ContractResult<()> {
        let mut inner = self.inner.lock();
        ensure_editable(inner.state, "edit installments")?;
        let slot = match &mut inner.schedule {
            Some(Schedule::Manual(slots)) => slots
                .iter_mut()
                .find(|s| s.installment_number == installment_number),
            _ => None,
        }
        .ok_or_else(|| ContractError::InvalidInput {
            field: "installments".into(),
            reason: format!("No manual installment number {installment_number}"),
        })?;
        slot.due_date = due_date;
        slot.planned_amount_usd = planned_amount_usd;
        Ok(())
    }

    /// Spread the unallocated part of the final amount over empty slots.
    pub fn fill_even_amounts(&self) -> ContractResult<()> {
        let mut inner = self.inner.lock();
        ensure_editable(inner.state, "edit installments")?;
        let final_usd = derive_amounts(&inner.draft)?.final_amount_usd;
        if let Some(Schedule::Manual(slots)) = &inner.schedule {
            let filled = manual::fill_even_amounts(slots, final_usd);
            inner.schedule = Some(Schedule::Manual(filled));
        }
        Ok(())
    }

    /// Ask the projection service for an automatic schedule.
    ///
    /// Refused while another preview is outstanding. A response that comes
    /// back after the draft changed is dropped as stale. Failures leave the
    /// session in editing so the user can retry or switch to manual mode.
    pub async fn preview(&self) -> ContractResult<Vec<Installment>> {
        let _guard = InFlight::acquire(&self.preview_in_flight, "preview")?;

        let request = {
            let mut inner = self.inner.lock();
            if !matches!(inner.state, SessionState::Editing | SessionState::Reviewing) {
                return Err(ContractError::InvalidState {
                    action: "preview the schedule".into(),
                    state: inner.state.to_string(),
                });
            }
            let request = build_preview_request(&self.parties, &inner.draft)?;
            inner.state = SessionState::Previewing;
            request
        };

        info!(
            student_id = self.parties.student_id,
            final_amount_usd = %request.final_amount_usd,
            "requesting installment projection"
        );
        let settle = Settle::new(&self.inner, SessionState::Previewing, SessionState::Editing);
        let outcome = timeout(self.config.preview_timeout(), self.projection.project(&request)).await;
        settle.disarm();

        let mut inner = self.inner.lock();
        inner.state = SessionState::Editing;
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(error = %e, "installment projection failed");
                return Err(ContractError::ProjectionFailed(projection_reason(&e)));
            }
            Err(_) => {
                warn!("installment projection timed out");
                return Err(ContractError::ProjectionFailed(ServiceError::Timeout.to_string()));
            }
        };

        let still_current = build_preview_request(&self.parties, &inner.draft)
            .map(|current| current == request)
            .unwrap_or(false);
        if !still_current {
            warn!("draft changed while the projection was in flight; response dropped");
            return Err(ContractError::StaleProjection);
        }

        let projected = ProjectedSchedule::new(request, response);
        let installments = projected.installments.clone();
        debug!(count = installments.len(), "projection received");
        inner.schedule = Some(Schedule::Projected(projected));
        inner.state = SessionState::Reviewing;
        Ok(installments)
    }

    /// Validate, assemble and submit the contract.
    ///
    /// The draft is re-validated here regardless of earlier checks. On
    /// rejection the service's field messages are kept on the session and the
    /// first one is returned verbatim. A timeout leaves the session
    /// [`SessionState::Unresolved`] until [`Self::resolve`] is called.
    pub async fn commit(&self) -> ContractResult<CommitReceipt> {
        let _guard = InFlight::acquire(&self.commit_in_flight, "commit")?;

        let request = {
            let mut inner = self.inner.lock();
            if !matches!(inner.state, SessionState::Editing | SessionState::Reviewing) {
                return Err(ContractError::InvalidState {
                    action: "commit".into(),
                    state: inner.state.to_string(),
                });
            }
            let request =
                build_commit_request(&self.parties, &inner.draft, inner.schedule.as_ref())?;
            inner.state = SessionState::Committing;
            request
        };

        info!(
            student_id = self.parties.student_id,
            installments = request.installments.len(),
            "committing enrollment contract"
        );
        // a dropped commit may already have reached the store
        let settle = Settle::new(&self.inner, SessionState::Committing, SessionState::Unresolved);
        let outcome = timeout(self.config.commit_timeout(), self.store.commit(&request)).await;
        settle.disarm();

        let mut inner = self.inner.lock();
        match outcome {
            Ok(Ok(receipt)) => {
                info!(contract_id = receipt.contract_id, "enrollment contract committed");
                inner.state = SessionState::Done;
                inner.draft = ContractDraft::default();
                inner.schedule = None;
                inner.field_errors.clear();
                Ok(receipt)
            }
            Ok(Err(ServiceError::Rejected(errors))) => {
                inner.state = SessionState::Editing;
                for (field, messages) in &errors {
                    if let Some(first) = messages.first() {
                        inner.field_errors.insert(field.clone(), first.clone());
                    }
                }
                let (field, message) = first_field_error(&errors).unwrap_or_else(|| {
                    ("contract".to_string(), "The contract was rejected".to_string())
                });
                warn!(%field, %message, "enrollment contract rejected");
                Err(ContractError::CommitRejected {
                    field,
                    message,
                    errors,
                })
            }
            Ok(Err(e)) if !e.is_ambiguous() => {
                warn!(error = %e, "enrollment contract not submitted");
                inner.state = SessionState::Editing;
                Err(ContractError::CommitFailed(e.to_string()))
            }
            Ok(Err(e)) => {
                error!(error = %e, "commit outcome unknown");
                inner.state = SessionState::Unresolved;
                Err(ContractError::CommitOutcomeUnknown(e.to_string()))
            }
            Err(_) => {
                error!("commit timed out; outcome unknown");
                inner.state = SessionState::Unresolved;
                Err(ContractError::CommitOutcomeUnknown(
                    ServiceError::Timeout.to_string(),
                ))
            }
        }
    }

    /// Record what the user found after verifying an unresolved commit.
    pub fn resolve(&self, outcome: VerifiedOutcome) -> ContractResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != SessionState::Unresolved {
            return Err(ContractError::InvalidState {
                action: "resolve a commit".into(),
                state: inner.state.to_string(),
            });
        }
        match outcome {
            VerifiedOutcome::NotPersisted => {
                info!("unresolved commit verified as not persisted");
                inner.state = SessionState::Editing;
            }
            VerifiedOutcome::Persisted { contract_id } => {
                info!(contract_id, "unresolved commit verified as persisted");
                inner.state = SessionState::Done;
                inner.draft = ContractDraft::default();
                inner.schedule = None;
            }
        }
        Ok(())
    }

    /// Leave the wizard. Nothing is sent anywhere.
    pub fn abandon(self) {
        let state = self.inner.lock().state;
        info!(student_id = self.parties.student_id, %state, "contract session abandoned");
    }
}

fn rebuild_manual(
    draft: &ContractDraft,
    schedule: Option<Schedule>,
) -> ContractResult<Option<Schedule>> {
    let (Some(count), Some(start)) = (draft.installments_count, draft.installments_start_date)
    else {
        return Ok(schedule);
    };
    let existing: &[ManualSlot] = match &schedule {
        Some(Schedule::Manual(slots)) => slots,
        _ => &[],
    };
    let slots = rebuild_slots(existing, count, start)?;
    Ok(Some(Schedule::Manual(slots)))
}

fn ensure_editable(state: SessionState, action: &str) -> ContractResult<()> {
    match state {
        SessionState::Committing | SessionState::Unresolved | SessionState::Done => Err(ContractError::InvalidState {
            action: action.into(),
            state: state.to_string(),
        }),
        _ => Ok(()),
    }
}

fn projection_reason(e: &ServiceError) -> String {
    match e {
        ServiceError::Rejected(errors) => first_field_error(errors)
            .map(|(_, message)| message)
            .unwrap_or_else(|| e.to_string()),
        other => other.to_string(),
    }
}
