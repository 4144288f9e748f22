//! Host adapter for JavaScript: callbacks become queued JSON events.
//!
//! The engine calls back synchronously while JS is inside a `WorkflowCanvas`
//! method, so re-entering JS from there is avoided. Notifications are queued
//! instead and drained by `take_events()` after each input call.

use serde_json::{Value, json};
use wfc_core::changes::{EdgeChange, NodeChange};
use wfc_core::diagnostics::{Diagnostic, Severity, Subject};
use wfc_core::model::{Connection, Edge, Node};
use wfc_editor::CanvasHost;

/// Queues host notifications as JSON values.
#[derive(Default)]
pub struct EventQueue {
    events: Vec<Value>,
    /// Optional `(connection) => boolean` from JS.
    validator: Option<js_sys::Function>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_validator(&mut self, validator: Option<js_sys::Function>) {
        self.validator = validator;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drain the queue as a JSON array.
    pub fn take_json(&mut self) -> String {
        let events = std::mem::take(&mut self.events);
        Value::Array(events).to_string()
    }

    fn push(&mut self, event: Value) {
        self.events.push(event);
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        log::warn!("event payload not serializable: {err}");
        Value::Null
    })
}

/// Diagnostic as the JS host sees it.
pub fn diagnostic_json(d: &Diagnostic) -> Value {
    let severity = match d.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    let subject = match d.subject {
        Subject::Node(id) => json!({ "node": id }),
        Subject::Edge(id) => json!({ "edge": id }),
        Subject::Type => json!("type"),
    };
    json!({
        "type": "diagnostic",
        "severity": severity,
        "rule": d.rule,
        "subject": subject,
        "message": d.message,
    })
}

impl CanvasHost for EventQueue {
    fn on_nodes_change(&mut self, changes: &[NodeChange], nodes: &[Node]) {
        self.push(json!({
            "type": "nodesChange",
            "changes": to_value(&changes),
            "nodes": to_value(&nodes),
        }));
    }

    fn on_edges_change(&mut self, changes: &[EdgeChange], edges: &[Edge]) {
        self.push(json!({
            "type": "edgesChange",
            "changes": to_value(&changes),
            "edges": to_value(&edges),
        }));
    }

    fn on_connect(&mut self, connection: &Connection) {
        self.push(json!({
            "type": "connect",
            "connection": to_value(connection),
        }));
    }

    fn is_valid_connection(&mut self, connection: &Connection) -> bool {
        let Some(validator) = &self.validator else {
            return true;
        };
        let arg = to_value(connection).to_string();
        match validator.call1(&wasm_bindgen::JsValue::NULL, &arg.into()) {
            Ok(verdict) => verdict.is_truthy(),
            Err(err) => {
                log::warn!("connection validator threw: {err:?}");
                false
            }
        }
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic_json(diagnostic));
    }
}
