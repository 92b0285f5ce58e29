//! Core vocabulary of the budget-execution workflow.
//!
//! This module contains the closed domain types every other module speaks:
//! - `State` and the `state_enum!` macro for status graphs
//! - `ExpenseStatus`, `Phase`, `Role`, `Category`
//! - `Amount` and the identifier newtypes
//!
//! Everything here is pure data with no locking and no I/O.

mod actor;
mod amount;
mod category;
mod ids;
mod macros;
mod phase;
mod state;
mod status;

pub use actor::{Actor, Role};
pub use amount::Amount;
pub use category::Category;
pub use ids::{BudgetLineId, ExpenseId};
pub use phase::Phase;
pub use state::State;
pub use status::ExpenseStatus;
