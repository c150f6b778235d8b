//! Property-based testing pattern catalog.
//!
//! Each pattern kind has a stable numeric id, a display name, a short
//! description, the baseline generator argument it corresponds to, and a
//! dispatch strategy telling the orchestrator how its skeleton is produced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A property-based testing pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    #[serde(rename = "DIFF_PATH_SAME_DEST")]
    DiffPathSameDest,
    Roundtrip,
    SomeThingsNeverChange,
    TheMoreThingsChange,
    SolveSmallerProblemFirst,
    HardToProve,
    TestOracle,
    ModelBased,
    WithinExpectedBounds,
    #[serde(rename = "METAMORPHIC_PROP")]
    MetamorphicProp,
    Unknown,
}

/// How the skeleton for a pattern is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Run the baseline generator in `mode`, then post-process its output.
    BaselinePostProcessed { mode: &'static str },
    /// Run the baseline generator and use its output verbatim.
    Baseline { mode: Option<&'static str> },
    /// Synthesize the skeleton locally.
    Bespoke,
}

impl PatternKind {
    /// Every kind, in id order.
    pub const ALL: [PatternKind; 11] = [
        PatternKind::DiffPathSameDest,
        PatternKind::Roundtrip,
        PatternKind::SomeThingsNeverChange,
        PatternKind::TheMoreThingsChange,
        PatternKind::SolveSmallerProblemFirst,
        PatternKind::HardToProve,
        PatternKind::TestOracle,
        PatternKind::ModelBased,
        PatternKind::WithinExpectedBounds,
        PatternKind::MetamorphicProp,
        PatternKind::Unknown,
    ];

    /// Stable numeric id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Kind for a numeric id.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    /// SCREAMING_SNAKE identifier, as used on the wire.
    pub fn ident(self) -> &'static str {
        match self {
            PatternKind::DiffPathSameDest => "DIFF_PATH_SAME_DEST",
            PatternKind::Roundtrip => "ROUNDTRIP",
            PatternKind::SomeThingsNeverChange => "SOME_THINGS_NEVER_CHANGE",
            PatternKind::TheMoreThingsChange => "THE_MORE_THINGS_CHANGE",
            PatternKind::SolveSmallerProblemFirst => "SOLVE_SMALLER_PROBLEM_FIRST",
            PatternKind::HardToProve => "HARD_TO_PROVE",
            PatternKind::TestOracle => "TEST_ORACLE",
            PatternKind::ModelBased => "MODEL_BASED",
            PatternKind::WithinExpectedBounds => "WITHIN_EXPECTED_BOUNDS",
            PatternKind::MetamorphicProp => "METAMORPHIC_PROP",
            PatternKind::Unknown => "UNKNOWN",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            PatternKind::DiffPathSameDest => "Different Paths, Same Destination",
            PatternKind::Roundtrip => "Roundtrip",
            PatternKind::SomeThingsNeverChange => "Some Things Never Change",
            PatternKind::TheMoreThingsChange => {
                "The More Things Change, the More They Stay the Same"
            }
            PatternKind::SolveSmallerProblemFirst => "Solve a Smaller Problem First",
            PatternKind::HardToProve => "Hard to Prove, Easy to Verify",
            PatternKind::TestOracle => "The Test Oracle",
            PatternKind::ModelBased => "Model Based",
            PatternKind::WithinExpectedBounds => "Outputs Within Expected Bounds",
            PatternKind::MetamorphicProp => "Metamorphic Property",
            PatternKind::Unknown => "Unknown",
        }
    }

    /// One-sentence description of the property.
    pub fn description(self) -> &'static str {
        match self {
            PatternKind::DiffPathSameDest => {
                "Combining operations in a different order gives the same result"
            }
            PatternKind::Roundtrip => "Applying a function and then its inverse gives back the input",
            PatternKind::SomeThingsNeverChange => "Some aspect of the input is preserved by the function",
            PatternKind::TheMoreThingsChange => "Applying the function twice gives the same result as once",
            PatternKind::SolveSmallerProblemFirst => {
                "The result is correct if each of its smaller parts is correct"
            }
            PatternKind::HardToProve => "The output is checked by an easier verifier function",
            PatternKind::TestOracle => "The function agrees with a trusted alternative implementation",
            PatternKind::ModelBased => "The function agrees with a simplified model of itself",
            PatternKind::WithinExpectedBounds => "The output lies between a lower and an upper bound",
            PatternKind::MetamorphicProp => {
                "Related inputs produce outputs related by a known property"
            }
            PatternKind::Unknown => "Let the type be automatically determined",
        }
    }

    /// The baseline generator argument this kind corresponds to.
    pub fn argument(self) -> Option<&'static str> {
        match self {
            PatternKind::DiffPathSameDest
            | PatternKind::HardToProve
            | PatternKind::TestOracle
            | PatternKind::MetamorphicProp => Some("--equivalent"),
            PatternKind::Roundtrip => Some("--roundtrip"),
            PatternKind::SomeThingsNeverChange | PatternKind::TheMoreThingsChange => {
                Some("--idempotent")
            }
            PatternKind::SolveSmallerProblemFirst
            | PatternKind::ModelBased
            | PatternKind::WithinExpectedBounds
            | PatternKind::Unknown => None,
        }
    }

    /// Whether the kind relates two functions (SUT plus partner).
    pub fn requires_two_functions(self) -> bool {
        matches!(
            self,
            PatternKind::Roundtrip
                | PatternKind::HardToProve
                | PatternKind::TestOracle
                | PatternKind::ModelBased
                | PatternKind::MetamorphicProp
        )
    }

    /// How this kind's skeleton is produced.
    pub fn dispatch(self) -> Dispatch {
        match self {
            PatternKind::DiffPathSameDest => Dispatch::BaselinePostProcessed {
                mode: "--binary-op",
            },
            PatternKind::SomeThingsNeverChange
            | PatternKind::SolveSmallerProblemFirst
            | PatternKind::HardToProve
            | PatternKind::WithinExpectedBounds
            | PatternKind::MetamorphicProp => Dispatch::Bespoke,
            PatternKind::Unknown => Dispatch::Baseline { mode: None },
            other => Dispatch::Baseline {
                mode: other.argument(),
            },
        }
    }

    /// Catalog entry for this kind.
    pub fn info(self) -> PatternInfo {
        PatternInfo {
            type_id: self.id(),
            kind: self,
            name: self.name().to_string(),
            description: self.description().to_string(),
            argument: self.argument().unwrap_or_default().to_string(),
            two_functions: self.requires_two_functions(),
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ident())
    }
}

/// Error for unrecognized pattern names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pattern '{0}'")]
pub struct UnknownPattern(pub String);

impl FromStr for PatternKind {
    type Err = UnknownPattern;

    /// Accepts the numeric id, the SCREAMING_SNAKE identifier or its
    /// kebab-case spelling, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(id) = trimmed.parse::<u8>() {
            return PatternKind::from_id(id).ok_or_else(|| UnknownPattern(s.to_string()));
        }
        let normalized = trimmed.replace('-', "_").to_ascii_uppercase();
        PatternKind::ALL
            .into_iter()
            .find(|kind| kind.ident() == normalized)
            .ok_or_else(|| UnknownPattern(s.to_string()))
    }
}

/// Serializable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternInfo {
    pub type_id: u8,
    pub kind: PatternKind,
    pub name: String,
    pub description: String,
    /// Baseline generator argument, empty when there is none.
    pub argument: String,
    pub two_functions: bool,
}

/// The full catalog, in id order.
pub fn pattern_catalog() -> Vec<PatternInfo> {
    PatternKind::ALL.into_iter().map(PatternKind::info).collect()
}
