//! Snowflow workflow model
//!
//! Typed, cross-referenced in-memory representation of a ServiceNow workflow
//! export:
//!
//! - entity types for the five record kinds (`WorkflowVersion`, `Stage`,
//!   `Activity`, `Condition`, `Transition`),
//! - a frozen [`WorkflowModel`] with id lookups and an outgoing-transition
//!   index grouped by source activity,
//! - a summary view ([`summary`]) and a depth-bounded walk of the activity
//!   graph ([`walk`]).
//!
//! Every cross-entity reference in the export is a foreign-key-like id
//! string, and nothing guarantees it resolves. All lookups therefore return
//! `Option`/empty-slice, and the summary/walk layers treat absence as
//! ordinary data, never a fault.

pub mod summary;
pub mod walk;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use summary::{build_summary, WorkflowSummary};
pub use walk::{walk_path, CycleGuard, PathWalk, WalkConfig, WalkEvent, DEFAULT_DEPTH_BOUND};

/// Opaque record identifier assigned by the upstream system (`sys_id`).
/// Snowflow never interprets its format; it is only a lookup key.
pub type Id = String;

// ============================================================================
// Entities
// ============================================================================

/// The `wf_workflow_version` record: one per export, carries the workflow's
/// display metadata and the id of its start activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowVersion {
    pub id: Id,
    pub name: String,
    pub table: String,
    pub active: bool,
    pub description: String,
    /// May reference an activity absent from the export.
    pub start_activity_id: Id,
}

/// A `wf_stage` record: a phase label attachable to activities.
///
/// `order` stays a string so the export's formatting survives (it is not
/// guaranteed to be numeric).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: Id,
    pub name: String,
    pub value: String,
    pub order: String,
}

/// A `wf_activity` record: one node of the workflow graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Id,
    pub name: String,
    pub activity_definition: String,
    /// Empty when the activity belongs to no stage.
    pub stage_id: Id,
    pub x: String,
    pub y: String,
}

/// A `wf_condition` record: a named guard expression attached to an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: Id,
    pub name: String,
    pub activity_id: Id,
    pub condition: String,
    pub order: String,
}

/// A `wf_transition` record: a directed edge between two activities, guarded
/// by a condition. Transitions are retrieved by source activity, not by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: Id,
    pub condition_id: Id,
    pub from_activity_id: Id,
    pub to_activity_id: Id,
}

// ============================================================================
// Model builder (write side)
// ============================================================================

/// Accumulates records during extraction, then freezes into a
/// [`WorkflowModel`].
///
/// Keyed inserts are last-wins: a later record with a duplicate id replaces
/// the earlier one, matching the upstream export semantics. The insert
/// methods report the replaced record so the caller can log the degradation.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    version: Option<WorkflowVersion>,
    stages: HashMap<Id, Stage>,
    activities: HashMap<Id, Activity>,
    conditions: HashMap<Id, Condition>,
    outgoing: HashMap<Id, Vec<Transition>>,
    activity_order: Vec<Id>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the workflow version unless one was already seen: the first
    /// `wf_workflow_version` record in the document wins.
    pub fn version(&mut self, version: WorkflowVersion) {
        if self.version.is_none() {
            self.version = Some(version);
        }
    }

    pub fn stage(&mut self, stage: Stage) -> Option<Stage> {
        self.stages.insert(stage.id.clone(), stage)
    }

    /// Inserts an activity. A replaced activity keeps its original
    /// document-order slot (ordering is first-occurrence).
    pub fn activity(&mut self, activity: Activity) -> Option<Activity> {
        let id = activity.id.clone();
        let replaced = self.activities.insert(id.clone(), activity);
        if replaced.is_none() {
            self.activity_order.push(id);
        }
        replaced
    }

    pub fn condition(&mut self, condition: Condition) -> Option<Condition> {
        self.conditions.insert(condition.id.clone(), condition)
    }

    /// Appends a transition to its source activity's group. Document order
    /// within each group is preserved.
    pub fn transition(&mut self, transition: Transition) {
        self.outgoing
            .entry(transition.from_activity_id.clone())
            .or_default()
            .push(transition);
    }

    /// Freezes the collections. The resulting model is read-only.
    pub fn finish(self) -> WorkflowModel {
        WorkflowModel {
            version: self.version,
            stages: self.stages,
            activities: self.activities,
            conditions: self.conditions,
            outgoing: self.outgoing,
            activity_order: self.activity_order,
        }
    }
}

// ============================================================================
// Workflow model (read side)
// ============================================================================

/// The reconstructed workflow: five record collections plus the derived
/// outgoing-transition index. Built once via [`ModelBuilder`], immutable
/// afterwards, so it can be shared across threads for read-only summarize
/// and walk operations without synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowModel {
    version: Option<WorkflowVersion>,
    stages: HashMap<Id, Stage>,
    activities: HashMap<Id, Activity>,
    conditions: HashMap<Id, Condition>,
    /// Transitions grouped by `from_activity_id`, document order within
    /// each group.
    outgoing: HashMap<Id, Vec<Transition>>,
    /// Activity ids in document order (first occurrence).
    activity_order: Vec<Id>,
}

impl WorkflowModel {
    /// The workflow version record, if the export carried one. An export
    /// without one is a valid-but-empty workflow, not an error.
    pub fn version(&self) -> Option<&WorkflowVersion> {
        self.version.as_ref()
    }

    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.get(id)
    }

    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activities.get(id)
    }

    pub fn condition(&self, id: &str) -> Option<&Condition> {
        self.conditions.get(id)
    }

    /// Outgoing transitions of an activity, in document order. Unknown ids
    /// and activities without outgoing transitions both yield an empty
    /// slice.
    pub fn transitions_from(&self, activity_id: &str) -> &[Transition] {
        self.outgoing
            .get(activity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn stages(&self) -> &HashMap<Id, Stage> {
        &self.stages
    }

    pub fn activities(&self) -> &HashMap<Id, Activity> {
        &self.activities
    }

    pub fn conditions(&self) -> &HashMap<Id, Condition> {
        &self.conditions
    }

    /// All transition groups, keyed by source activity id.
    pub fn transitions(&self) -> &HashMap<Id, Vec<Transition>> {
        &self.outgoing
    }

    /// Activity ids in document order. Replaced duplicates keep their first
    /// position.
    pub fn activity_ids(&self) -> &[Id] {
        &self.activity_order
    }

    /// Activities in document order.
    pub fn activities_in_order(&self) -> impl Iterator<Item = &Activity> {
        self.activity_order
            .iter()
            .filter_map(|id| self.activities.get(id))
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    pub fn transition_count(&self) -> usize {
        self.outgoing.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str, name: &str) -> Activity {
        Activity {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    fn transition(id: &str, from: &str, to: &str) -> Transition {
        Transition {
            id: id.into(),
            condition_id: String::new(),
            from_activity_id: from.into(),
            to_activity_id: to.into(),
        }
    }

    #[test]
    fn lookups_report_absence_instead_of_faulting() {
        let model = ModelBuilder::new().finish();
        assert!(model.version().is_none());
        assert!(model.activity("missing").is_none());
        assert!(model.stage("missing").is_none());
        assert!(model.condition("missing").is_none());
        assert!(model.transitions_from("missing").is_empty());
    }

    #[test]
    fn duplicate_activity_id_is_last_wins() {
        let mut builder = ModelBuilder::new();
        assert!(builder.activity(activity("a1", "First")).is_none());
        let replaced = builder.activity(activity("a1", "Second"));
        assert_eq!(replaced.unwrap().name, "First");

        let model = builder.finish();
        assert_eq!(model.activity("a1").unwrap().name, "Second");
        assert_eq!(model.activity_ids(), ["a1".to_string()]);
    }

    #[test]
    fn first_version_record_wins() {
        let mut builder = ModelBuilder::new();
        builder.version(WorkflowVersion {
            name: "first".into(),
            ..Default::default()
        });
        builder.version(WorkflowVersion {
            name: "second".into(),
            ..Default::default()
        });
        assert_eq!(builder.finish().version().unwrap().name, "first");
    }

    #[test]
    fn transitions_keep_insertion_order_per_source() {
        let mut builder = ModelBuilder::new();
        builder.transition(transition("t1", "a1", "a2"));
        builder.transition(transition("t2", "a2", "a3"));
        builder.transition(transition("t3", "a1", "a3"));

        let model = builder.finish();
        let from_a1: Vec<&str> = model
            .transitions_from("a1")
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(from_a1, ["t1", "t3"]);
        assert_eq!(model.transition_count(), 3);
    }

    #[test]
    fn activities_in_order_follows_document_order() {
        let mut builder = ModelBuilder::new();
        builder.activity(activity("z", "Z"));
        builder.activity(activity("a", "A"));
        builder.activity(activity("m", "M"));

        let model = builder.finish();
        let names: Vec<&str> = model
            .activities_in_order()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, ["Z", "A", "M"]);
    }
}
