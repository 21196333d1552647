//! Dependency-ordered node scheduling.
//!
//! The scheduler performs incremental topological ordering over a workflow's
//! connection graph:
//! - in-degree per node is computed from the adjacency list, counting one
//!   per incoming edge
//! - the ready queue is seeded with every zero-in-degree node, in the node
//!   map's insertion order (the only ordering the definition provides)
//! - completing a node decrements each direct successor, enqueueing those
//!   that reach zero
//!
//! Nodes that never reach in-degree zero (members of a cycle, or downstream
//! of a node that was never completed) are never handed out; callers can
//! inspect them via [`DependencyScheduler::unscheduled`].

use crate::definition::Workflow;
use std::collections::{HashSet, VecDeque};

/// Incremental topological scheduler over one workflow's graph.
#[derive(Debug)]
pub struct DependencyScheduler {
    /// Remaining in-degree per node id, in node-map insertion order.
    indegree: indexmap::IndexMap<String, usize>,
    /// Nodes ready to execute, in the order they became ready.
    ready: VecDeque<String>,
    /// Nodes already handed out via [`Self::next_ready`].
    dispatched: HashSet<String>,
}

impl DependencyScheduler {
    /// Builds a scheduler from a workflow's nodes and connections.
    ///
    /// Connection entries naming unknown node ids contribute nothing; the
    /// definition layer rejects them during validation.
    #[must_use]
    pub fn new(workflow: &Workflow) -> Self {
        let mut indegree: indexmap::IndexMap<String, usize> = workflow
            .nodes
            .keys()
            .map(|id| (id.clone(), 0))
            .collect();

        for (source, targets) in &workflow.connections {
            if !indegree.contains_key(source) {
                continue;
            }
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count += 1;
                }
            }
        }

        let ready = indegree
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(id, _)| id.clone())
            .collect();

        Self {
            indegree,
            ready,
            dispatched: HashSet::new(),
        }
    }

    /// Returns true if at least one node is ready to execute.
    #[must_use]
    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Pops the next ready node, marking it dispatched.
    pub fn next_ready(&mut self) -> Option<String> {
        let node_id = self.ready.pop_front()?;
        self.dispatched.insert(node_id.clone());
        Some(node_id)
    }

    /// Marks a dispatched node as successfully completed, unblocking its
    /// direct successors in `workflow`'s connection list.
    pub fn mark_completed(&mut self, workflow: &Workflow, node_id: &str) {
        let Some(successors) = workflow.connections.get(node_id) else {
            return;
        };

        for successor in successors {
            if let Some(count) = self.indegree.get_mut(successor) {
                if *count > 0 {
                    *count -= 1;
                    if *count == 0 && !self.dispatched.contains(successor) {
                        self.ready.push_back(successor.clone());
                    }
                }
            }
        }
    }

    /// Returns the number of nodes handed out so far.
    #[must_use]
    pub fn dispatched_count(&self) -> usize {
        self.dispatched.len()
    }

    /// Returns the node ids that were never dispatched, in node-map order.
    ///
    /// After the ready queue drains without failure these are exactly the
    /// nodes stuck in a cycle or behind one.
    #[must_use]
    pub fn unscheduled(&self) -> Vec<String> {
        self.indegree
            .keys()
            .filter(|id| !self.dispatched.contains(*id))
            .cloned()
            .collect()
    }
}
