use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `toolweave`.
///
/// Per-step failures are not errors at this level: they are recorded in the
/// [`ResultBundle`](crate::engine::ResultBundle) and handed to fusion. Only
/// failures that abort a whole query surface here.
#[derive(Debug, Error)]
pub enum WeaveError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Plan validation ──────────────────────────────────────────────────
    #[error("plan: {0}")]
    Plan(#[from] PlanError),

    // ── Agent orchestration ──────────────────────────────────────────────
    #[error("agent: {0}")]
    Agent(#[from] AgentError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Plan errors ─────────────────────────────────────────────────────────────

/// Reasons a proposed plan is rejected before any tool runs.
///
/// Every variant except [`PlanError::CyclicDependency`] is a malformed plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("plan step id cannot be empty (step #{index})")]
    EmptyStepId { index: usize },

    #[error("duplicate plan step id: {0}")]
    DuplicateStepId(String),

    #[error("step {step} references unknown tool: {tool}")]
    UnknownTool { step: String, tool: String },

    #[error("step {step} references itself")]
    SelfReference { step: String },

    #[error("step {step} references unknown step: {reference}")]
    UnknownStep { step: String, reference: String },

    #[error("step {step} argument {arg} has an invalid placeholder: {reason}")]
    InvalidPlaceholder {
        step: String,
        arg: String,
        reason: String,
    },

    #[error("cycle detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },
}

impl PlanError {
    pub fn is_malformed(&self) -> bool {
        !self.is_cyclic()
    }

    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::CyclicDependency { .. })
    }
}

// ─── Agent errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("planner {planner} failed: {message}")]
    Planning { planner: String, message: String },

    #[error("plan rejected: {0}")]
    Plan(#[from] PlanError),

    #[error("every tool step failed ({failed} failed, {skipped} skipped)")]
    AllStepsFailed { failed: usize, skipped: usize },

    #[error("fusion failed: {0}")]
    Fusion(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, WeaveError>;
