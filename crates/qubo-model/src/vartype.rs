//! Value domains for model variables.

use serde::{Deserialize, Serialize};

/// The value domain shared by every variable of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vartype {
    /// Values in {-1, +1}.
    Spin,
    /// Values in {0, 1}.
    Binary,
}

impl Vartype {
    /// Both admissible values, low value first.
    pub fn values(&self) -> [i8; 2] {
        match self {
            Vartype::Spin => [-1, 1],
            Vartype::Binary => [0, 1],
        }
    }

    /// Whether `value` belongs to this domain.
    pub fn contains(&self, value: i8) -> bool {
        match self {
            Vartype::Spin => value == -1 || value == 1,
            Vartype::Binary => value == 0 || value == 1,
        }
    }
}

impl std::fmt::Display for Vartype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vartype::Spin => write!(f, "SPIN"),
            Vartype::Binary => write!(f, "BINARY"),
        }
    }
}
