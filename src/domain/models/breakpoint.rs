//! Breakpoint domain model.
//!
//! A breakpoint is an explicit, blocking human-review gate within a process:
//! the run suspends until an external decision is recorded or the configured
//! timeout elapses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::models::artifact::Artifact;

/// Lifecycle of one breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakpointState {
    /// Created, not yet published to a decision channel.
    Armed,
    /// Published; the run is blocked awaiting a decision.
    Suspended,
    /// A decision arrived and the run resumed.
    Resumed,
    /// Timed out or the run was cancelled while suspended.
    Aborted,
}

impl BreakpointState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resumed | Self::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Armed => "armed",
            Self::Suspended => "suspended",
            Self::Resumed => "resumed",
            Self::Aborted => "aborted",
        }
    }
}

/// A human-review request raised by a process phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointRequest {
    /// Stable identifier, used to correlate the recorded decision.
    pub id: Uuid,
    pub title: String,
    pub question: String,
    /// Freeform context for the reviewer. The runner injects the run id.
    #[serde(default)]
    pub context: Value,
    /// Candidate artifacts the reviewer should inspect.
    #[serde(default)]
    pub files: Vec<ArtifactCandidate>,
}

impl BreakpointRequest {
    pub fn new(title: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            question: question.into(),
            context: Value::Null,
            files: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn with_file(mut self, artifact: &Artifact) -> Self {
        self.files.push(ArtifactCandidate {
            path: artifact.path.clone(),
            format: format!("{:?}", artifact.format).to_lowercase(),
            label: artifact.label.clone(),
            missing: false,
        });
        self
    }
}

/// A file reference inside a breakpoint request. Existence is verified when
/// the breakpoint arms; missing files are flagged rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactCandidate {
    pub path: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub missing: bool,
}

/// The reviewer's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Proceed as-is.
    Approve,
    /// Stop the run.
    Reject,
    /// Proceed with reviewer-supplied adjustments in the payload.
    Amend,
}

impl Verdict {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "approve" | "approved" | "proceed" => Some(Self::Approve),
            "reject" | "rejected" => Some(Self::Reject),
            "amend" | "amended" => Some(Self::Amend),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Amend => "amend",
        }
    }
}

/// An external decision resolving a breakpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Reviewer-supplied data, exposed to subsequent phases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Hand-written decision files may omit this; it defaults to read time.
    #[serde(default = "chrono::Utc::now")]
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub fn approve() -> Self {
        Self {
            verdict: Verdict::Approve,
            note: None,
            payload: None,
            decided_at: Utc::now(),
        }
    }

    pub fn reject(note: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Reject,
            note: Some(note.into()),
            payload: None,
            decided_at: Utc::now(),
        }
    }

    pub fn amend(payload: Value) -> Self {
        Self {
            verdict: Verdict::Amend,
            note: None,
            payload: Some(payload),
            decided_at: Utc::now(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
