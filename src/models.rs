// src/models.rs

use serde::{Deserialize, Serialize};

// These are the configuration-facing types: the (external) menu-config layer
// deserializes action lists into them, all string fields still unexpanded.

fn default_required() -> bool {
    true
}

/// One unit of work in a menu's action sequence.
///
/// `required` is the shared fail policy: a required action's failure aborts
/// the remaining sequence, a best-effort (`required = false`) action's
/// failure is logged and skipped.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Action {
    #[serde(default = "default_required")]
    pub required: bool,
    pub kind: ActionKind,
}

impl Action {
    pub fn required(kind: ActionKind) -> Self {
        Self {
            required: true,
            kind,
        }
    }

    pub fn best_effort(kind: ActionKind) -> Self {
        Self {
            required: false,
            kind,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ActionKind {
    SetProperty(SetPropertyAction),
    Execute(ExecuteAction),
}

/// Changes the value of a property, computed by one value source.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SetPropertyAction {
    pub name: String,
    pub source: ValueSource,
}

/// The alternative strategies that can compute a property's value.
/// Exactly one applies per action; every string parameter is passed through
/// template expansion before use.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ValueSource {
    /// The expanded text itself.
    Literal(String),
    /// A formula in the expression sub-language.
    Expression(String),
    /// Content of a file, truncated to `max_bytes` (default 8192, 0 for
    /// unlimited).
    File {
        path: String,
        #[serde(default)]
        max_bytes: Option<String>,
    },
    /// A system-registry lookup by key path.
    Registry(String),
    /// A bare file name resolved against the OS search path.
    SearchPath(String),
    /// A uniform integer in `[min, max]` inclusive.
    Random { min: String, max: String },
}

/// Launches a process against the selection.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExecuteAction {
    pub path: String,
    #[serde(default)]
    pub arguments: String,
    #[serde(default)]
    pub working_dir: Option<String>,
    /// When set, block until the child exits; otherwise detach.
    #[serde(default)]
    pub wait: bool,
    /// Wait timeout in milliseconds. Elapsing is a reported failure.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Kill the child when the timeout elapses instead of abandoning the
    /// wait.
    #[serde(default)]
    pub kill_on_timeout: bool,
    /// Property receiving the child's pid.
    #[serde(default)]
    pub pid_property: Option<String>,
}

/// Per-action execution state. Terminal once `Succeeded` or `Failed`;
/// actions after a sequence abort stay `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Pending,
    Executing,
    Succeeded,
    Failed,
}
