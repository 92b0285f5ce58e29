use serde::{Deserialize, Serialize};
use std::fmt;

/// Economic nature of an expenditure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Personnel,
    Fonctionnement,
    Investissement,
    Transfert,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Personnel => "Personnel",
            Category::Fonctionnement => "Fonctionnement",
            Category::Investissement => "Investissement",
            Category::Transfert => "Transfert",
        };
        f.write_str(label)
    }
}
