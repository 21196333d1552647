//! Workflow definition types.
//!
//! A workflow is a directed graph of typed action nodes:
//! - `nodes` maps author-assigned node ids (e.g. `"node1"`) to node
//!   definitions
//! - `connections` is an adjacency list from source node id to the ordered
//!   list of downstream node ids
//!
//! Definitions are created and mutated by the API layer; the engine treats
//! them as read-only per execution.

use crate::error::DefinitionError;
use indexmap::IndexMap;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use weft_core::{CredentialId, UserId, WorkflowId};

/// The kind of action a node performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Send a Telegram chat message.
    Telegram,
    /// Send a Slack channel message.
    Slack,
    /// Send an email through Resend.
    ResendEmail,
    /// Invoke the Gemini model.
    Gemini,
    /// Resolve a previously provisioned form resource.
    Form,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Telegram => "Telegram",
            Self::Slack => "Slack",
            Self::ResendEmail => "ResendEmail",
            Self::Gemini => "Gemini",
            Self::Form => "Form",
        };
        write!(f, "{name}")
    }
}

/// How a workflow gets started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerType {
    /// Started explicitly through the API.
    Manual,
    /// Started by an inbound HTTP webhook.
    Webhook,
    /// Reserved. Never scheduled by the engine.
    Cron,
}

/// Webhook metadata attached to webhook-triggered workflows.
///
/// The engine carries this opaquely; the API layer validates inbound calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub title: String,
    pub method: String,
    pub secret: Option<String>,
}

/// One configured step in a workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Author-assigned node id, unique within the workflow.
    pub id: String,
    /// The action this node performs.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Node configuration, keyed per node type. Values may contain
    /// template tokens resolved at execution time.
    pub config: IndexMap<String, JsonValue>,
    /// Reference to the credential record this node authenticates with.
    #[serde(rename = "credentialsId", skip_serializing_if = "Option::is_none")]
    pub credentials_id: Option<CredentialId>,
}

impl NodeDefinition {
    /// Creates a node definition with an empty config.
    #[must_use]
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            config: IndexMap::new(),
            credentials_id: None,
        }
    }

    /// Adds a config entry.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// Sets the credential reference.
    #[must_use]
    pub fn with_credentials(mut self, id: CredentialId) -> Self {
        self.credentials_id = Some(id);
        self
    }

    /// Returns a config value as a string slice, if present and a string.
    #[must_use]
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(JsonValue::as_str)
    }

    /// Returns a config value as a bool, if present and a bool.
    #[must_use]
    pub fn config_bool(&self, key: &str) -> Option<bool> {
        self.config.get(key).and_then(JsonValue::as_bool)
    }
}

/// A complete workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier for this workflow.
    pub id: WorkflowId,
    /// Human-readable title.
    pub title: String,
    /// The user who owns this workflow.
    pub user_id: UserId,
    /// How this workflow gets started.
    pub trigger_type: TriggerType,
    /// Node definitions keyed by node id. Iteration order is insertion
    /// order, which seeds the scheduler's deterministic ready queue.
    pub nodes: IndexMap<String, NodeDefinition>,
    /// Adjacency list: source node id to ordered downstream node ids.
    pub connections: IndexMap<String, Vec<String>>,
    /// Webhook metadata, when webhook-triggered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookConfig>,
    /// Disabled workflows are not enqueued by the API layer.
    pub enabled: bool,
}

impl Workflow {
    /// Creates an empty manual workflow.
    #[must_use]
    pub fn new(title: impl Into<String>, user_id: UserId) -> Self {
        Self {
            id: WorkflowId::new(),
            title: title.into(),
            user_id,
            trigger_type: TriggerType::Manual,
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            webhook: None,
            enabled: true,
        }
    }

    /// Adds a node, keyed by its id.
    pub fn add_node(&mut self, node: NodeDefinition) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Adds a connection from `source` to `target`.
    pub fn connect(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.connections
            .entry(source.into())
            .or_default()
            .push(target.into());
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Validates the definition: every connection endpoint must name a
    /// known node, and the connection graph must be acyclic.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violation found.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        for (source, targets) in &self.connections {
            if !self.nodes.contains_key(source) {
                return Err(DefinitionError::UnknownNode {
                    node_id: source.clone(),
                });
            }
            for target in targets {
                if !self.nodes.contains_key(target) {
                    return Err(DefinitionError::UnknownNode {
                        node_id: target.clone(),
                    });
                }
            }
        }

        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut indices = HashMap::new();
        for id in self.nodes.keys() {
            indices.insert(id.as_str(), graph.add_node(id.as_str()));
        }
        for (source, targets) in &self.connections {
            for target in targets {
                graph.add_edge(indices[source.as_str()], indices[target.as_str()], ());
            }
        }

        if petgraph::algo::is_cyclic_directed(&graph) {
            return Err(DefinitionError::CycleDetected);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_workflow() -> Workflow {
        let mut workflow = Workflow::new("Test", UserId::new());
        workflow.add_node(NodeDefinition::new("node1", NodeType::Telegram));
        workflow.add_node(NodeDefinition::new("node2", NodeType::ResendEmail));
        workflow.connect("node1", "node2");
        workflow
    }

    #[test]
    fn nodes_iterate_in_insertion_order() {
        let workflow = two_node_workflow();
        let ids: Vec<_> = workflow.nodes.keys().collect();
        assert_eq!(ids, vec!["node1", "node2"]);
    }

    #[test]
    fn validate_accepts_acyclic_graph() {
        let workflow = two_node_workflow();
        assert!(workflow.validate().is_ok());
    }

    #[test]
    fn validate_rejects_cycle() {
        let mut workflow = two_node_workflow();
        workflow.connect("node2", "node1");

        assert_eq!(workflow.validate(), Err(DefinitionError::CycleDetected));
    }

    #[test]
    fn validate_rejects_unknown_connection_target() {
        let mut workflow = two_node_workflow();
        workflow.connect("node2", "ghost");

        match workflow.validate() {
            Err(DefinitionError::UnknownNode { node_id }) => assert_eq!(node_id, "ghost"),
            other => panic!("expected UnknownNode, got {other:?}"),
        }
    }

    #[test]
    fn node_config_accessors() {
        let node = NodeDefinition::new("node1", NodeType::Gemini)
            .with_config("prompt", serde_json::json!("Say hi"))
            .with_config("memory", serde_json::json!(true));

        assert_eq!(node.config_str("prompt"), Some("Say hi"));
        assert_eq!(node.config_bool("memory"), Some(true));
        assert_eq!(node.config_str("missing"), None);
    }

    #[test]
    fn workflow_serde_roundtrip() {
        let workflow = two_node_workflow();
        let json = serde_json::to_string(&workflow).expect("serialize");
        let parsed: Workflow = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(parsed.id, workflow.id);
        assert_eq!(parsed.node_count(), 2);
        assert_eq!(parsed.connections["node1"], vec!["node2"]);
        assert_eq!(
            parsed.nodes["node1"].node_type,
            NodeType::Telegram
        );
    }
}
