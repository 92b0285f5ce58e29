//! Status of an expenditure record.

crate::state_enum! {
    /// Exactly one status holds for a record at any time.
    ///
    /// `Paye` and `Annule` are terminal. Cancellation is reachable from every
    /// non-terminal status; the four execution phases must be taken in order.
    pub enum ExpenseStatus {
        Brouillon => "Brouillon",
        Engage => "Engagé",
        Liquide => "Liquidé",
        Ordonnance => "Ordonnancé",
        Paye => "Payé",
        Annule => "Annulé",
    }
    final: [Paye, Annule]
    transitions: {
        Brouillon => [Engage, Annule],
        Engage => [Liquide, Annule],
        Liquide => [Ordonnance, Annule],
        Ordonnance => [Paye, Annule],
    }
}

impl ExpenseStatus {
    /// Whether credit is currently reserved on the budget line for a record in
    /// this status.
    pub fn holds_commitment(self) -> bool {
        matches!(
            self,
            ExpenseStatus::Engage
                | ExpenseStatus::Liquide
                | ExpenseStatus::Ordonnance
                | ExpenseStatus::Paye
        )
    }
}
