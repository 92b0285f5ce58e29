//! The phase-transition engine.
//!
//! `PhaseTransitionEngine` owns every expenditure record and drives it
//! through the execution cycle against a shared [`BudgetLedger`]. Each attempt
//! runs under the record's own lock: status edge, role, phase rules, ledger
//! movement, audit append and record write happen as one unit, and exactly one
//! audit entry is written per attempt whatever its outcome.

mod clock;
mod request;

pub use clock::{Clock, ManualClock, SystemClock};
pub use request::TransitionRequest;

use crate::audit::{AuditDraft, AuditEntry, AuditError, AuditStore, MemoryAuditStore, Outcome};
use crate::builder::EngineBuilder;
use crate::config::WorkflowPolicy;
use crate::core::{Actor, Amount, BudgetLineId, ExpenseId, Phase, State};
use crate::enforcement::{PhaseRules, TransitionContext};
use crate::error::WorkflowError;
use crate::expense::{AmountSnapshot, ExpenseDraft, ExpenseEvent, ExpenseRecord, PhaseStamp};
use crate::ledger::{BudgetLedger, CreditMove};
use crate::telemetry;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info, warn};

type ExpenseSlot = Arc<Mutex<ExpenseRecord>>;

/// Who attempted what, for the audit entry of an attempt.
struct Attempt<'a> {
    expense_id: ExpenseId,
    phase: Phase,
    actor: &'a Actor,
    at: DateTime<Utc>,
    metadata: &'a BTreeMap<String, String>,
}

fn credit_move(event: &ExpenseEvent) -> Option<CreditMove> {
    match event {
        ExpenseEvent::Engaged { amount, .. } => Some(CreditMove::Reserve(*amount)),
        ExpenseEvent::Cancelled {
            released: Some(amount),
            ..
        } => Some(CreditMove::Release(*amount)),
        _ => None,
    }
}

/// Workflow engine for the Engagement → Liquidation → Ordonnancement →
/// Paiement cycle.
pub struct PhaseTransitionEngine {
    ledger: Arc<BudgetLedger>,
    expenses: RwLock<HashMap<ExpenseId, ExpenseSlot>>,
    audit: Arc<dyn AuditStore>,
    clock: Arc<dyn Clock>,
    policy: WorkflowPolicy,
    /// Held shared by every operation and exclusively by `snapshot`.
    gate: RwLock<()>,
}

impl PhaseTransitionEngine {
    /// Engine over `ledger` with an in-memory audit trail, the system clock
    /// and the default policy.
    pub fn new(ledger: Arc<BudgetLedger>) -> Self {
        Self::from_parts(
            ledger,
            Arc::new(MemoryAuditStore::new()),
            Arc::new(SystemClock),
            WorkflowPolicy::default(),
            Vec::new(),
        )
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn from_parts(
        ledger: Arc<BudgetLedger>,
        audit: Arc<dyn AuditStore>,
        clock: Arc<dyn Clock>,
        policy: WorkflowPolicy,
        records: Vec<ExpenseRecord>,
    ) -> Self {
        let expenses = records
            .into_iter()
            .map(|record| (record.id, Arc::new(Mutex::new(record))))
            .collect();
        Self {
            ledger,
            expenses: RwLock::new(expenses),
            audit,
            clock,
            policy,
            gate: RwLock::new(()),
        }
    }

    pub fn ledger(&self) -> &Arc<BudgetLedger> {
        &self.ledger
    }

    pub fn policy(&self) -> &WorkflowPolicy {
        &self.policy
    }

    pub fn audit_trail(&self) -> &dyn AuditStore {
        self.audit.as_ref()
    }

    /// Audit entries of one expense, in application order.
    pub fn history(&self, expense_id: &ExpenseId) -> Vec<AuditEntry> {
        self.audit.entries_for(expense_id)
    }

    fn slot(&self, expense_id: &ExpenseId) -> Option<ExpenseSlot> {
        self.expenses.read().get(expense_id).cloned()
    }

    /// Read projection of one record.
    pub fn expense(&self, expense_id: &ExpenseId) -> Option<ExpenseRecord> {
        self.slot(expense_id).map(|slot| slot.lock().clone())
    }

    /// Read projections of every record, oldest first.
    pub fn expenses(&self) -> Vec<ExpenseRecord> {
        let slots: Vec<ExpenseSlot> = self.expenses.read().values().cloned().collect();
        let mut records: Vec<ExpenseRecord> =
            slots.iter().map(|slot| slot.lock().clone()).collect();
        records.sort_by(|a, b| a.creation.at.cmp(&b.creation.at).then(a.id.cmp(&b.id)));
        records
    }

    pub fn expenses_on_line(&self, line: &BudgetLineId) -> Vec<ExpenseRecord> {
        self.expenses()
            .into_iter()
            .filter(|record| &record.budget_line == line)
            .collect()
    }

    /// Open a new expenditure in `Brouillon`.
    pub fn create_expense(
        &self,
        draft: ExpenseDraft,
        actor: Actor,
    ) -> Result<ExpenseRecord, WorkflowError> {
        let _gate = self.gate.read();
        let expense_id = ExpenseId::new();
        let span = telemetry::transition_span(&expense_id, Phase::Creation, &actor);
        let _enter = span.enter();

        let metadata = draft.metadata.clone();
        let attempt = Attempt {
            expense_id,
            phase: Phase::Creation,
            actor: &actor,
            at: self.clock.now(),
            metadata: &metadata,
        };

        if let Err(err) = self.check_creation(&draft, &actor) {
            return Err(self.record_rejection(&attempt, None, vec![err]));
        }

        let event = ExpenseEvent::Created {
            id: expense_id,
            draft,
            stamp: PhaseStamp {
                actor: actor.clone(),
                at: attempt.at,
                evidence: Vec::new(),
            },
        };
        let record = match event.open() {
            Ok(record) => record,
            Err(err) => {
                let err = WorkflowError::InvariantViolation(err.to_string());
                return Err(self.record_rejection(&attempt, None, vec![err]));
            }
        };

        self.append(AuditDraft {
            expense_id,
            phase: Phase::Creation,
            actor: actor.clone(),
            timestamp: attempt.at,
            outcome: Outcome::Applied,
            before: None,
            after: Some(record.amounts()),
            event: Some(event),
            metadata: metadata.clone(),
        })?;

        self.expenses
            .write()
            .insert(expense_id, Arc::new(Mutex::new(record.clone())));
        info!(
            line = %record.budget_line,
            montant_demande = %record.montant_demande,
            "expense created"
        );
        Ok(record)
    }

    /// Open an expenditure and engage it straight away.
    ///
    /// Two audit entries are written. If the engagement is refused the record
    /// stays in `Brouillon` and the engagement error is returned.
    pub fn create_and_engage(
        &self,
        draft: ExpenseDraft,
        actor: Actor,
        amount: Option<Amount>,
        evidence: Vec<String>,
    ) -> Result<ExpenseRecord, WorkflowError> {
        let record = self.create_expense(draft, actor.clone())?;
        self.apply_transition(TransitionRequest {
            expense_id: record.id,
            phase: Phase::Engagement,
            actor,
            amount,
            service_fait: false,
            evidence,
            justification: None,
            reference: None,
            payment: None,
            metadata: BTreeMap::new(),
        })
    }

    /// Move one expense to `request.phase`.
    ///
    /// Returns the updated record, or the first violation found. Either way
    /// one audit entry is appended.
    pub fn apply_transition(
        &self,
        request: TransitionRequest,
    ) -> Result<ExpenseRecord, WorkflowError> {
        let _gate = self.gate.read();
        let span = telemetry::transition_span(&request.expense_id, request.phase, &request.actor);
        let _enter = span.enter();

        let slot = self.slot(&request.expense_id);
        // The clock is read under the record lock so stamps follow application order.
        let mut guard = slot.as_ref().map(|slot| slot.lock());
        let attempt = Attempt {
            expense_id: request.expense_id,
            phase: request.phase,
            actor: &request.actor,
            at: self.clock.now(),
            metadata: &request.metadata,
        };

        let Some(record) = guard.as_deref_mut() else {
            let err = WorkflowError::UnknownExpense(request.expense_id);
            return Err(self.record_rejection(&attempt, None, vec![err]));
        };

        let event = match self.evaluate(record, &request, attempt.at) {
            Ok(event) => event,
            Err(violations) => {
                return Err(self.record_rejection(&attempt, Some(record.amounts()), violations));
            }
        };

        self.commit(record, &attempt, event)
    }

    fn check_creation(&self, draft: &ExpenseDraft, actor: &Actor) -> Result<(), WorkflowError> {
        if !Phase::Creation.permits(actor.role) {
            return Err(WorkflowError::RoleMismatch {
                phase: Phase::Creation,
                role: actor.role,
                reason: "may not open an expenditure".to_string(),
            });
        }
        if draft.montant_demande.is_zero() {
            return Err(WorkflowError::InvalidAmount {
                phase: Phase::Creation,
                reason: "requested amount must be greater than zero".to_string(),
            });
        }

        let line = self.ledger.line(&draft.budget_line)?;
        if line.currency != draft.currency {
            return Err(WorkflowError::LineMismatch {
                line: line.id,
                reason: format!(
                    "currency {} differs from line currency {}",
                    draft.currency, line.currency
                ),
            });
        }
        if line.fiscal_year != draft.fiscal_year {
            return Err(WorkflowError::LineMismatch {
                line: line.id,
                reason: format!(
                    "fiscal year {} differs from line fiscal year {}",
                    draft.fiscal_year, line.fiscal_year
                ),
            });
        }
        Ok(())
    }

    /// Decide whether `request` may be applied to `record` and, if so, which
    /// event records it. Pure with respect to engine state.
    fn evaluate(
        &self,
        record: &ExpenseRecord,
        request: &TransitionRequest,
        at: DateTime<Utc>,
    ) -> Result<ExpenseEvent, Vec<WorkflowError>> {
        let phase = request.phase;
        let illegal = || {
            vec![WorkflowError::IllegalTransition {
                from: record.status,
                phase,
            }]
        };

        if !record.status.can_transition_to(&phase.target_status()) {
            return Err(illegal());
        }
        if !phase.permits(request.actor.role) {
            return Err(vec![WorkflowError::RoleMismatch {
                phase,
                role: request.actor.role,
                reason: format!("may not perform {phase}"),
            }]);
        }

        let context = TransitionContext::new(record, request, &self.policy);
        let violations = PhaseRules::for_phase(phase, &self.policy).violations(&context);
        if !violations.is_empty() {
            return Err(violations);
        }

        let stamp = PhaseStamp {
            actor: request.actor.clone(),
            at,
            evidence: request.evidence.clone(),
        };
        let amount = || {
            context.amount.ok_or_else(|| {
                vec![WorkflowError::InvariantViolation(format!(
                    "{phase} passed its rules without an amount"
                ))]
            })
        };

        let event = match phase {
            Phase::Creation => return Err(illegal()),
            Phase::Engagement => ExpenseEvent::Engaged {
                amount: amount()?,
                stamp,
            },
            Phase::Liquidation => ExpenseEvent::Liquidated {
                amount: amount()?,
                stamp,
            },
            Phase::Ordonnancement => ExpenseEvent::Ordonnanced {
                amount: amount()?,
                reference: request.reference.clone(),
                stamp,
            },
            Phase::Paiement => ExpenseEvent::Paid {
                amount: amount()?,
                payment: request.payment.clone(),
                stamp,
            },
            Phase::Annulation => ExpenseEvent::Cancelled {
                justification: request.justification.clone().unwrap_or_default(),
                released: record
                    .status
                    .holds_commitment()
                    .then_some(record.montant_engage)
                    .flatten(),
                stamp,
            },
        };
        Ok(event)
    }

    fn commit(
        &self,
        record: &mut ExpenseRecord,
        attempt: &Attempt<'_>,
        event: ExpenseEvent,
    ) -> Result<ExpenseRecord, WorkflowError> {
        let before = record.amounts();
        let mut next = record.clone();
        if let Err(err) = next.apply(&event) {
            let err = WorkflowError::InvariantViolation(err.to_string());
            return Err(self.record_rejection(attempt, Some(before), vec![err]));
        }

        let movement = credit_move(&event);
        let draft = AuditDraft {
            expense_id: attempt.expense_id,
            phase: attempt.phase,
            actor: attempt.actor.clone(),
            timestamp: attempt.at,
            outcome: Outcome::Applied,
            before: Some(before),
            after: Some(next.amounts()),
            event: Some(event),
            metadata: attempt.metadata.clone(),
        };
        // The line stays locked until the entry is stored, and is reverted if it is not.
        let appended = match movement {
            Some(movement) => self
                .ledger
                .settle(&record.budget_line, movement, || self.append(draft)),
            None => self.append(draft),
        };
        match appended {
            Ok(_) => {}
            Err(err @ WorkflowError::Storage(_)) => return Err(err),
            Err(err) => return Err(self.record_rejection(attempt, Some(before), vec![err])),
        }

        *record = next;
        info!(status = %record.status, "transition applied");
        Ok(record.clone())
    }

    fn append(&self, draft: AuditDraft) -> Result<AuditEntry, WorkflowError> {
        self.audit.append(draft).map_err(|err| {
            error!(error = %err, "audit append failed");
            match err {
                AuditError::Storage(reason) => WorkflowError::Storage(reason),
                other => WorkflowError::Storage(other.to_string()),
            }
        })
    }

    /// Write the rejected attempt to the audit trail and return the error the
    /// caller should see: the first violation, or `Storage` if even the
    /// rejection could not be recorded.
    fn record_rejection(
        &self,
        attempt: &Attempt<'_>,
        before: Option<AmountSnapshot>,
        violations: Vec<WorkflowError>,
    ) -> WorkflowError {
        let primary = violations.first().cloned().unwrap_or_else(|| {
            WorkflowError::InvariantViolation("rejection without a reason".to_string())
        });
        if primary.is_fatal() {
            error!(error = %primary, "transition failed");
        } else {
            warn!(reason = %primary.kind(), error = %primary, "transition rejected");
        }

        let appended = self.append(AuditDraft {
            expense_id: attempt.expense_id,
            phase: attempt.phase,
            actor: attempt.actor.clone(),
            timestamp: attempt.at,
            outcome: Outcome::rejected(&violations),
            before,
            after: before,
            event: None,
            metadata: attempt.metadata.clone(),
        });
        match appended {
            Ok(_) => primary,
            Err(storage) => storage,
        }
    }

    /// Freeze the whole engine state. Transitions wait while it is taken.
    pub fn snapshot(&self) -> crate::checkpoint::EngineSnapshot {
        let _gate = self.gate.write();
        crate::checkpoint::EngineSnapshot::new(
            self.clock.now(),
            self.ledger.lines(),
            self.expenses(),
            self.audit.entries(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{cancel, engage, liquidate, ordonnance, pay};
    use crate::core::{Category, ExpenseStatus};
    use crate::error::ErrorKind;
    use crate::ledger::BudgetLine;
    use chrono::TimeZone;

    const LINE: &str = "61-2-311";

    fn ledger(allocated: u64) -> Arc<BudgetLedger> {
        let ledger = Arc::new(BudgetLedger::new());
        ledger
            .publish(BudgetLine::new(LINE, "Entretien des bâtiments", 2026, "XOF", Amount::new(allocated)))
            .unwrap();
        ledger
    }

    fn draft(amount: u64) -> ExpenseDraft {
        ExpenseDraft::builder(LINE)
            .vendor("Sotrapal")
            .object("Réfection de toiture")
            .fiscal_year(2026)
            .category(Category::Investissement)
            .montant_demande(amount)
            .build()
            .unwrap()
    }

    fn engine(allocated: u64) -> PhaseTransitionEngine {
        PhaseTransitionEngine::new(ledger(allocated))
    }

    fn available(engine: &PhaseTransitionEngine) -> Amount {
        engine.ledger().available_credit(&LINE.into()).unwrap()
    }

    #[test]
    fn engagement_reserves_credit() {
        let engine = engine(1_000_000);
        let ord = Actor::ordonnateur("A");
        let record = engine.create_expense(draft(600_000), ord.clone()).unwrap();

        let engaged = engine
            .apply_transition(engage(record.id, ord, Amount::new(600_000)))
            .unwrap();

        assert_eq!(engaged.status, ExpenseStatus::Engage);
        assert_eq!(engaged.montant_engage, Some(Amount::new(600_000)));
        assert_eq!(available(&engine), Amount::new(400_000));
    }

    #[test]
    fn insufficient_credit_leaves_record_and_line_untouched() {
        let engine = engine(400_000);
        let ord = Actor::ordonnateur("A");
        let record = engine.create_expense(draft(500_000), ord.clone()).unwrap();

        let err = engine
            .apply_transition(engage(record.id, ord, Amount::new(500_000)))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientCredit);
        assert_eq!(engine.expense(&record.id).unwrap().status, ExpenseStatus::Brouillon);
        assert_eq!(available(&engine), Amount::new(400_000));

        let history = engine.history(&record.id);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].outcome.reason(), Some(ErrorKind::InsufficientCredit));
    }

    #[test]
    fn terminal_record_rejects_everything() {
        let engine = engine(1_000_000);
        let ord = Actor::ordonnateur("A");
        let record = engine.create_expense(draft(100_000), ord.clone()).unwrap();
        engine
            .apply_transition(cancel(record.id, Actor::administrateur("ADM"), "doublon"))
            .unwrap();

        for phase in Phase::ALL {
            let mut request = engage(record.id, ord.clone(), Amount::new(100_000));
            request.phase = phase;
            let err = engine.apply_transition(request).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::IllegalTransition, "{phase}");
        }
        assert_eq!(engine.expense(&record.id).unwrap().status, ExpenseStatus::Annule);
    }

    #[test]
    fn wrong_role_is_refused() {
        let engine = engine(1_000_000);
        let record = engine
            .create_expense(draft(100_000), Actor::ordonnateur("A"))
            .unwrap();

        let err = engine
            .apply_transition(engage(record.id, Actor::comptable("C"), Amount::new(100_000)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoleMismatch);

        let err = engine
            .create_expense(draft(100_000), Actor::new("I", crate::core::Role::Igf))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoleMismatch);
    }

    #[test]
    fn cancelling_engaged_expense_restores_credit() {
        let engine = engine(1_000_000);
        let ord = Actor::ordonnateur("A");
        let record = engine.create_expense(draft(300_000), ord.clone()).unwrap();
        engine
            .apply_transition(engage(record.id, ord.clone(), Amount::new(300_000)))
            .unwrap();
        engine
            .apply_transition(liquidate(record.id, ord, Amount::new(250_000), "PV-3"))
            .unwrap();
        assert_eq!(available(&engine), Amount::new(700_000));

        let cancelled = engine
            .apply_transition(cancel(record.id, Actor::administrateur("ADM"), "marché résilié"))
            .unwrap();

        assert_eq!(cancelled.status, ExpenseStatus::Annule);
        assert_eq!(cancelled.cancellation_justification.as_deref(), Some("marché résilié"));
        assert_eq!(available(&engine), Amount::new(1_000_000));
    }

    #[test]
    fn creation_checks_line_currency_and_year() {
        let engine = engine(1_000_000);
        let ord = Actor::ordonnateur("A");

        let mut wrong_currency = draft(100_000);
        wrong_currency.currency = "EUR".to_string();
        assert_eq!(
            engine.create_expense(wrong_currency, ord.clone()).unwrap_err().kind(),
            ErrorKind::LineMismatch
        );

        let mut unknown = draft(100_000);
        unknown.budget_line = "99-9-999".into();
        assert_eq!(
            engine.create_expense(unknown, ord.clone()).unwrap_err().kind(),
            ErrorKind::UnknownBudgetLine
        );

        assert_eq!(
            engine.create_expense(draft(0), ord).unwrap_err().kind(),
            ErrorKind::InvalidAmount
        );
        assert!(engine.expenses().is_empty());
        assert_eq!(engine.audit_trail().len(), 3);
    }

    #[test]
    fn unknown_expense_is_audited() {
        let engine = engine(1_000_000);
        let missing = ExpenseId::new();
        let err = engine
            .apply_transition(engage(missing, Actor::ordonnateur("A"), Amount::new(1)))
            .unwrap_err();

        assert_eq!(err, WorkflowError::UnknownExpense(missing));
        assert_eq!(engine.history(&missing).len(), 1);
    }

    #[test]
    fn create_and_engage_keeps_draft_when_engagement_fails() {
        let engine = engine(100_000);
        let ord = Actor::ordonnateur("A");

        let err = engine
            .create_and_engage(draft(200_000), ord.clone(), None, Vec::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientCredit);

        let records = engine.expenses();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ExpenseStatus::Brouillon);

        let engaged = engine
            .create_and_engage(draft(80_000), ord, None, vec!["BC-12".to_string()])
            .unwrap();
        assert_eq!(engaged.montant_engage, Some(Amount::new(80_000)));
        assert_eq!(engine.expenses_on_line(&LINE.into()).len(), 2);
    }

    #[test]
    fn full_cycle_stamps_each_phase() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let engine = PhaseTransitionEngine::builder()
            .ledger(ledger(1_000_000))
            .clock(clock.clone())
            .build()
            .unwrap();
        let ord = Actor::ordonnateur("A");
        let id = engine.create_expense(draft(600_000), ord.clone()).unwrap().id;

        clock.advance(chrono::Duration::hours(1));
        engine.apply_transition(engage(id, ord.clone(), Amount::new(600_000))).unwrap();
        clock.advance(chrono::Duration::days(10));
        engine
            .apply_transition(liquidate(id, ord.clone(), Amount::new(600_000), "FACT-42"))
            .unwrap();
        engine
            .apply_transition(ordonnance(id, ord, Amount::new(600_000)))
            .unwrap();
        let paid = engine
            .apply_transition(pay(id, Actor::comptable("C"), Amount::new(550_000)))
            .unwrap();

        assert_eq!(paid.status, ExpenseStatus::Paye);
        assert!(paid.service_fait);
        assert_eq!(paid.creation.at, start);
        assert_eq!(
            paid.engagement.as_ref().map(|s| s.at),
            Some(start + chrono::Duration::hours(1))
        );
        assert_eq!(
            paid.liquidation.as_ref().map(|s| s.evidence.clone()),
            Some(vec!["FACT-42".to_string()])
        );
        assert_eq!(paid.montant_paye, Some(Amount::new(550_000)));
        // Paid credit stays consumed.
        assert_eq!(available(&engine), Amount::new(400_000));
    }

    /// Memory store that refuses applied entries of one phase. With a
    /// contender attached, the refused append also starts a competing
    /// reservation on the line.
    struct RefusingStore {
        inner: MemoryAuditStore,
        refuse: Phase,
        contender: Option<(Arc<BudgetLedger>, Amount)>,
        contention: Mutex<Option<std::thread::JoinHandle<Result<Amount, crate::ledger::LedgerError>>>>,
    }

    impl RefusingStore {
        fn new(refuse: Phase) -> Self {
            Self {
                inner: MemoryAuditStore::new(),
                refuse,
                contender: None,
                contention: Mutex::new(None),
            }
        }

        fn contended(refuse: Phase, ledger: Arc<BudgetLedger>, amount: Amount) -> Self {
            Self {
                contender: Some((ledger, amount)),
                ..Self::new(refuse)
            }
        }

        fn contention_result(&self) -> Option<Result<Amount, crate::ledger::LedgerError>> {
            self.contention.lock().take().map(|handle| handle.join().unwrap())
        }
    }

    impl AuditStore for RefusingStore {
        fn append(&self, draft: AuditDraft) -> Result<AuditEntry, AuditError> {
            if draft.phase != self.refuse || !draft.outcome.is_applied() {
                return self.inner.append(draft);
            }
            if let Some((ledger, amount)) = &self.contender {
                let (ledger, amount) = (ledger.clone(), *amount);
                let handle = std::thread::spawn(move || ledger.reserve(&LINE.into(), amount));
                std::thread::sleep(std::time::Duration::from_millis(50));
                *self.contention.lock() = Some(handle);
            }
            Err(AuditError::Storage("disk full".to_string()))
        }

        fn entries_for(&self, expense_id: &ExpenseId) -> Vec<AuditEntry> {
            self.inner.entries_for(expense_id)
        }

        fn entries(&self) -> Vec<AuditEntry> {
            self.inner.entries()
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    #[test]
    fn storage_failure_at_creation_moves_nothing() {
        let engine = PhaseTransitionEngine::builder()
            .ledger(ledger(1_000_000))
            .audit_store(Arc::new(RefusingStore::new(Phase::Creation)))
            .build()
            .unwrap();

        let err = engine
            .create_expense(draft(100_000), Actor::ordonnateur("A"))
            .unwrap_err();

        assert_eq!(err, WorkflowError::Storage("disk full".to_string()));
        assert_eq!(err.to_string(), "audit storage failure: disk full");
        assert!(err.is_fatal());
        assert!(engine.expenses().is_empty());
        assert_eq!(available(&engine), Amount::new(1_000_000));
    }

    #[test]
    fn storage_failure_at_engagement_rolls_back_reservation() {
        let engine = PhaseTransitionEngine::builder()
            .ledger(ledger(1_000_000))
            .audit_store(Arc::new(RefusingStore::new(Phase::Engagement)))
            .build()
            .unwrap();
        let ord = Actor::ordonnateur("A");
        let record = engine.create_expense(draft(600_000), ord.clone()).unwrap();

        let err = engine
            .apply_transition(engage(record.id, ord, Amount::new(600_000)))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(engine.expense(&record.id), Some(record.clone()));
        assert_eq!(available(&engine), Amount::new(1_000_000));
        assert_eq!(engine.history(&record.id).len(), 1);
    }

    #[test]
    fn storage_failure_at_cancellation_keeps_commitment_counted() {
        let ledger = ledger(1_000_000);
        let store = Arc::new(RefusingStore::contended(
            Phase::Annulation,
            ledger.clone(),
            Amount::new(600_000),
        ));
        let engine = PhaseTransitionEngine::builder()
            .ledger(ledger.clone())
            .audit_store(store.clone())
            .build()
            .unwrap();
        let ord = Actor::ordonnateur("A");
        let id = engine.create_expense(draft(600_000), ord.clone()).unwrap().id;
        let engaged = engine
            .apply_transition(engage(id, ord, Amount::new(600_000)))
            .unwrap();

        let err = engine
            .apply_transition(cancel(id, Actor::administrateur("ADM"), "doublon"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(matches!(
            store.contention_result(),
            Some(Err(crate::ledger::LedgerError::InsufficientCredit { .. }))
        ));
        assert_eq!(engine.expense(&id), Some(engaged));
        let line = ledger.line(&LINE.into()).unwrap();
        assert_eq!(line.committed, Amount::new(600_000));
        assert_eq!(engine.snapshot().validate().ok(), Some(()));
    }

    /// Hands out one minute per read and stalls on the read numbered `stall_on`.
    struct StallingClock {
        start: DateTime<Utc>,
        reads: Mutex<i64>,
        stall_on: i64,
    }

    impl Clock for StallingClock {
        fn now(&self) -> DateTime<Utc> {
            let read = {
                let mut reads = self.reads.lock();
                *reads += 1;
                *reads
            };
            if read == self.stall_on {
                std::thread::sleep(std::time::Duration::from_millis(300));
            }
            self.start + chrono::Duration::minutes(read)
        }
    }

    #[test]
    fn stamps_follow_application_order_under_contention() {
        let start = Utc.with_ymd_and_hms(2026, 4, 6, 9, 0, 0).unwrap();
        let engine = PhaseTransitionEngine::builder()
            .ledger(ledger(1_000_000))
            .clock(Arc::new(StallingClock {
                start,
                reads: Mutex::new(0),
                stall_on: 3,
            }))
            .build()
            .unwrap();
        let ord = Actor::ordonnateur("A");
        let id = engine.create_expense(draft(600_000), ord.clone()).unwrap().id;
        engine
            .apply_transition(engage(id, ord.clone(), Amount::new(600_000)))
            .unwrap();

        std::thread::scope(|scope| {
            let engine = &engine;
            let ord = ord.clone();
            scope.spawn(move || {
                engine.apply_transition(liquidate(id, ord, Amount::new(600_000), "PV-8"))
            });
            std::thread::sleep(std::time::Duration::from_millis(50));
            scope.spawn(move || {
                engine.apply_transition(cancel(id, Actor::administrateur("ADM"), "doublon"))
            });
        });

        let history = engine.history(&id);
        assert_eq!(history.len(), 4);
        assert!(history
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp));
        for (index, entry) in history.iter().enumerate() {
            let at = crate::audit::replay_until(&history, entry.timestamp).unwrap();
            assert_eq!(at, crate::audit::replay(&history[..=index]).unwrap());
        }
        assert_eq!(crate::audit::replay(&history).unwrap(), engine.expense(&id));
    }
}
