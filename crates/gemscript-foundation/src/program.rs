//! Program phases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The trigger a compiled program is bound to.
///
/// A blueprint carries at most one program per kind. `Define` and `Init`
/// run once when an agent is instantiated; the rest are driven by the
/// external phase scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProgramKind {
    /// Declarations: props and features. Runs first at instantiation.
    Define,
    /// One-time initialization after declarations.
    Init,
    /// Per-tick update.
    Update,
    /// Per-tick decision making.
    Think,
    /// Event handling.
    Event,
}

/// All program kinds in execution order.
pub const PROGRAM_KINDS: [ProgramKind; 5] = [
    ProgramKind::Define,
    ProgramKind::Init,
    ProgramKind::Update,
    ProgramKind::Think,
    ProgramKind::Event,
];

impl ProgramKind {
    pub fn name(self) -> &'static str {
        match self {
            ProgramKind::Define => "DEFINE",
            ProgramKind::Init => "INIT",
            ProgramKind::Update => "UPDATE",
            ProgramKind::Think => "THINK",
            ProgramKind::Event => "EVENT",
        }
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProgramKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PROGRAM_KINDS
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown program kind '{}'", s))
    }
}
