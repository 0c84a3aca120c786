//! Read-only summary view of a [`WorkflowModel`].
//!
//! A pure function of the frozen model: display metadata, the resolved
//! start-activity name, collection counts, and activity names grouped by
//! stage. Degenerate inputs (no version record, zero activities) yield
//! empty aggregates rather than errors.

use crate::{Id, WorkflowModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate view of one workflow export.
///
/// `description` is passed through raw (possibly empty); "N/A" defaulting
/// belongs to presentation. `start_activity` is `None` when the version's
/// start-activity id does not resolve, or when there is no version record
/// at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub name: String,
    pub table: String,
    pub description: String,
    pub start_activity: Option<String>,
    pub stage_count: usize,
    pub activity_count: usize,
    pub condition_count: usize,
    /// Stage id → names of the activities in that stage, document order.
    /// Activities whose `stage_id` is empty or matches no stage record are
    /// excluded entirely.
    pub stage_activities: BTreeMap<Id, Vec<String>>,
}

/// Derive the summary aggregate from a model.
pub fn build_summary(model: &WorkflowModel) -> WorkflowSummary {
    let mut summary = WorkflowSummary {
        stage_count: model.stage_count(),
        activity_count: model.activity_count(),
        condition_count: model.condition_count(),
        ..Default::default()
    };

    if let Some(version) = model.version() {
        summary.name = version.name.clone();
        summary.table = version.table.clone();
        summary.description = version.description.clone();
        summary.start_activity = model
            .activity(&version.start_activity_id)
            .map(|a| a.name.clone());
    }

    for activity in model.activities_in_order() {
        if activity.stage_id.is_empty() || model.stage(&activity.stage_id).is_none() {
            continue;
        }
        summary
            .stage_activities
            .entry(activity.stage_id.clone())
            .or_default()
            .push(activity.name.clone());
    }

    summary
}
