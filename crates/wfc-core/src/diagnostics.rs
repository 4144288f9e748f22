//! Errors and diagnostics for host-supplied canvas input.
//!
//! Every malformed input is recoverable: the offending update or element is
//! rejected, a `Diagnostic` is produced for the host, and the canvas stays
//! interactive.

use crate::id::{EdgeId, NodeId};
use thiserror::Error;

/// Errors returned by fallible scene operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("duplicate node id `{0}`")]
    DuplicateNodeId(NodeId),

    #[error("duplicate edge id `{0}`")]
    DuplicateEdgeId(EdgeId),

    #[error("unknown node `{0}`")]
    UnknownNode(NodeId),

    #[error("unknown edge `{0}`")]
    UnknownEdge(EdgeId),
}

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Input was rejected or dropped.
    Error,
    /// Input was accepted but something will not render as intended.
    Warning,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Node(NodeId),
    Edge(EdgeId),
    /// A node or edge `type` with no registered renderer.
    Type,
}

/// A single finding reported to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Short rule identifier (e.g. "dangling-edge", "duplicate-id").
    pub rule: &'static str,
    pub subject: Subject,
    pub message: String,
}

impl Diagnostic {
    pub fn dangling_edge(edge: EdgeId, missing: NodeId) -> Self {
        Self {
            severity: Severity::Error,
            rule: "dangling-edge",
            subject: Subject::Edge(edge),
            message: format!("edge `{edge}` references missing node `{missing}`; dropped"),
        }
    }

    pub fn missing_renderer(subject: Subject, kind: &str) -> Self {
        Self {
            severity: Severity::Warning,
            rule: "missing-renderer",
            subject,
            message: format!("no renderer registered for type `{kind}`"),
        }
    }

    pub fn from_error(err: &SceneError) -> Self {
        let (rule, subject) = match *err {
            SceneError::DuplicateNodeId(id) => ("duplicate-id", Subject::Node(id)),
            SceneError::DuplicateEdgeId(id) => ("duplicate-id", Subject::Edge(id)),
            SceneError::UnknownNode(id) => ("unknown-node", Subject::Node(id)),
            SceneError::UnknownEdge(id) => ("unknown-edge", Subject::Edge(id)),
        };
        Self {
            severity: Severity::Error,
            rule,
            subject,
            message: format!("{err}; update rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_id() {
        let err = SceneError::DuplicateNodeId(NodeId::intern("step_1"));
        assert_eq!(err.to_string(), "duplicate node id `step_1`");
        let diag = Diagnostic::from_error(&err);
        assert_eq!(diag.rule, "duplicate-id");
        assert_eq!(diag.subject, Subject::Node(NodeId::intern("step_1")));
    }

    #[test]
    fn dangling_edge_diagnostic() {
        let diag = Diagnostic::dangling_edge(EdgeId::intern("e9"), NodeId::intern("ghost"));
        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.message.contains("ghost"));
    }
}
