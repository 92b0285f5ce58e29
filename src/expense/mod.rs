//! Expenditure records and the events that change them.

mod event;
mod record;

pub use event::{EventError, ExpenseEvent};
pub use record::{
    AmountSnapshot, ExpenseDraft, ExpenseRecord, PaymentDetails, PaymentMethod, PhaseStamp,
};
