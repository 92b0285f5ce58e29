//! Budget-execution workflow engine for OHADA public finance.
//!
//! Every public expenditure moves through a fixed cycle:
//! Engagement (credit is reserved on a budget line), Liquidation (the
//! service is attested and the amount due fixed), Ordonnancement (payment is
//! ordered) and Paiement (the comptable pays). Each phase belongs to a role
//! class, amounts may only shrink along the cycle, and the ledger never
//! commits more than a line's allocation.
//!
//! The crate follows a "pure core, imperative shell" layout:
//!
//! - [`core`]: closed vocabulary (`ExpenseStatus`, `Phase`, `Role`, `Amount`)
//! - [`expense`]: the record and the events that change it, folded by
//!   `ExpenseRecord::apply`
//! - [`enforcement`]: phase rules accumulated with Stillwater's `Validation`
//! - [`ledger`]: per-line credit reservation under fine-grained locks
//! - [`engine`]: `PhaseTransitionEngine`, the only writer
//! - [`audit`]: append-only trail and replay
//! - [`checkpoint`]: validated snapshots of the whole engine
//!
//! # Example
//!
//! ```rust
//! use ohada_execution::builder::{engage, liquidate, ordonnance, pay};
//! use ohada_execution::core::{Actor, Amount, Category, ExpenseStatus};
//! use ohada_execution::{BudgetLedger, BudgetLine, ExpenseDraft, PhaseTransitionEngine};
//! use std::sync::Arc;
//!
//! let ledger = Arc::new(BudgetLedger::new());
//! ledger
//!     .publish(BudgetLine::new(
//!         "62-1-101",
//!         "Fournitures de bureau",
//!         2026,
//!         "XOF",
//!         Amount::new(1_000_000),
//!     ))
//!     .unwrap();
//! let engine = PhaseTransitionEngine::new(ledger.clone());
//!
//! let ordonnateur = Actor::ordonnateur("ORD-01");
//! let draft = ExpenseDraft::builder("62-1-101")
//!     .vendor("Papeterie du Plateau")
//!     .fiscal_year(2026)
//!     .category(Category::Fonctionnement)
//!     .montant_demande(600_000)
//!     .build()
//!     .unwrap();
//!
//! let record = engine.create_expense(draft, ordonnateur.clone()).unwrap();
//! let id = record.id;
//! let amount = Amount::new(600_000);
//!
//! engine.apply_transition(engage(id, ordonnateur.clone(), amount)).unwrap();
//! assert_eq!(ledger.available_credit(&"62-1-101".into()).unwrap(), Amount::new(400_000));
//!
//! engine
//!     .apply_transition(liquidate(id, ordonnateur.clone(), amount, "FACT-0042"))
//!     .unwrap();
//! engine.apply_transition(ordonnance(id, ordonnateur, amount)).unwrap();
//! let paid = engine
//!     .apply_transition(pay(id, Actor::comptable("CPT-01"), Amount::new(550_000)))
//!     .unwrap();
//!
//! assert_eq!(paid.status, ExpenseStatus::Paye);
//! assert_eq!(engine.history(&id).len(), 5);
//! ```

pub mod audit;
pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod enforcement;
pub mod engine;
pub mod error;
pub mod expense;
pub mod ledger;
pub mod telemetry;

pub use audit::{AuditEntry, AuditStore, MemoryAuditStore, Outcome};
pub use checkpoint::EngineSnapshot;
pub use config::WorkflowPolicy;
pub use engine::{PhaseTransitionEngine, TransitionRequest};
pub use error::{ErrorKind, WorkflowError};
pub use expense::{ExpenseDraft, ExpenseRecord};
pub use ledger::{BudgetLedger, BudgetLine};
