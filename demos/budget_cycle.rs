//! Budget Cycle
//!
//! This example walks two expenditures through one budget line.
//!
//! Key concepts:
//! - Publishing a budget line and reserving credit at engagement
//! - Liquidation with service-fait attestation
//! - Payment refused when the ordonnancement signer tries to pay
//! - Cancellation handing credit back
//! - Audit trail and checkpoint
//!
//! Run with: cargo run --example budget_cycle

use ohada_execution::builder::{cancel, engage, liquidate, ordonnance, pay};
use ohada_execution::core::{Actor, Amount, BudgetLineId, Category};
use ohada_execution::{
    BudgetLedger, BudgetLine, ExpenseDraft, PhaseTransitionEngine, WorkflowPolicy, WorkflowError,
};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn Error>> {
    ohada_execution::telemetry::init_tracing()?;

    println!("=== Budget Cycle Example ===\n");

    let policy = WorkflowPolicy::load(Some(Path::new("ohada.toml")))?;
    println!("Policy: {policy:?}\n");

    let line_id = BudgetLineId::from("62-1-101");
    let ledger = Arc::new(BudgetLedger::new());
    ledger.publish(BudgetLine::new(
        line_id.clone(),
        "Fournitures de bureau",
        2026,
        "XOF",
        Amount::new(1_000_000),
    ))?;

    let engine = PhaseTransitionEngine::builder()
        .ledger(ledger.clone())
        .policy(policy)
        .build()?;

    let ordonnateur = Actor::ordonnateur("ORD-KONE");
    let comptable = Actor::comptable("CPT-DIALLO");

    let draft = ExpenseDraft::builder(line_id.clone())
        .vendor("Papeterie du Plateau")
        .object("Ramettes et consommables")
        .fiscal_year(2026)
        .category(Category::Fonctionnement)
        .montant_demande(600_000)
        .build()?;
    let e1 = engine.create_expense(draft, ordonnateur.clone())?.id;

    let amount = Amount::new(600_000);
    engine.apply_transition(engage(e1, ordonnateur.clone(), amount))?;
    println!(
        "Engaged {amount}; available on {line_id}: {}",
        ledger.available_credit(&line_id)?
    );

    let second = ExpenseDraft::builder(line_id.clone())
        .vendor("Imprimerie Nationale")
        .fiscal_year(2026)
        .category(Category::Fonctionnement)
        .montant_demande(500_000)
        .build()?;
    let e2 = engine.create_expense(second, ordonnateur.clone())?.id;
    match engine.apply_transition(engage(e2, ordonnateur.clone(), Amount::new(500_000))) {
        Err(err @ WorkflowError::InsufficientCredit { .. }) => println!("Refused: {err}"),
        other => println!("Unexpected: {other:?}"),
    }

    engine.apply_transition(liquidate(e1, ordonnateur.clone(), amount, "PV-RECEPTION-17"))?;
    engine.apply_transition(ordonnance(e1, ordonnateur.clone(), amount))?;

    let same_person = Actor::comptable(ordonnateur.id.clone());
    if let Err(err) = engine.apply_transition(pay(e1, same_person, amount)) {
        println!("Refused: {err}");
    }

    let paid = engine.apply_transition(pay(e1, comptable, Amount::new(580_000)))?;
    println!("E1 is {} with {:?} paid", paid.status, paid.montant_paye);

    engine.apply_transition(cancel(e2, Actor::administrateur("ADM-01"), "hors programme"))?;

    println!("\nAudit trail of E1:");
    for entry in engine.history(&e1) {
        println!(
            "  #{} {} by {} -> {:?}",
            entry.expense_sequence,
            entry.phase,
            entry.actor,
            entry.outcome.reason()
        );
    }

    let snapshot = engine.snapshot();
    snapshot.validate()?;
    println!(
        "\nCheckpoint {}: {} lines, {} expenses, {} audit entries",
        snapshot.id,
        snapshot.budget_lines.len(),
        snapshot.expenses.len(),
        snapshot.audit.len()
    );

    Ok(())
}
