//! Record extraction: tag-keyed export records → typed model.
//!
//! A workflow export carries five record kinds, matched document-wide by
//! element name. Simple fields come from child-element text; foreign-key
//! fields come from the `display_value` attribute of the referencing child
//! element (the export encodes each reference twice, and the resolved form
//! lives in the attribute).
//!
//! Extraction cannot fail: every missing element, attribute or text node
//! degrades to an empty string, and duplicate record ids replace the
//! earlier record (last-wins, as upstream does).

use crate::dom::Element;
use snowflow_model::{
    Activity, Condition, ModelBuilder, Stage, Transition, WorkflowModel, WorkflowVersion,
};
use tracing::{debug, warn};

pub const WORKFLOW_VERSION_TAG: &str = "wf_workflow_version";
pub const STAGE_TAG: &str = "wf_stage";
pub const ACTIVITY_TAG: &str = "wf_activity";
pub const CONDITION_TAG: &str = "wf_condition";
pub const TRANSITION_TAG: &str = "wf_transition";

/// Extract the five record collections from a decoded tree and freeze them
/// into a [`WorkflowModel`].
pub fn extract_model(root: &Element) -> WorkflowModel {
    let mut builder = ModelBuilder::new();

    extract_version(root, &mut builder);
    extract_stages(root, &mut builder);
    extract_activities(root, &mut builder);
    extract_conditions(root, &mut builder);
    extract_transitions(root, &mut builder);

    let model = builder.finish();
    debug!(
        stages = model.stage_count(),
        activities = model.activity_count(),
        conditions = model.condition_count(),
        transitions = model.transition_count(),
        has_version = model.version().is_some(),
        "extracted workflow model"
    );
    model
}

fn extract_version(root: &Element, builder: &mut ModelBuilder) {
    // The export carries at most one version record; if several appear the
    // first one wins, as upstream reads only the first.
    if let Some(el) = root.find_first(WORKFLOW_VERSION_TAG) {
        builder.version(WorkflowVersion {
            id: el.child_text("sys_id").to_string(),
            name: el.child_text("name").to_string(),
            table: el.child_text("table").to_string(),
            active: el.child_text("active") == "true",
            description: el.child_text("description").to_string(),
            start_activity_id: el.child_attr("start", "display_value").to_string(),
        });
    }
}

fn extract_stages(root: &Element, builder: &mut ModelBuilder) {
    for el in root.find_all(STAGE_TAG) {
        let stage = Stage {
            id: el.child_text("sys_id").to_string(),
            name: el.child_text("name").to_string(),
            value: el.child_text("value").to_string(),
            order: el.child_text("order").to_string(),
        };
        if let Some(replaced) = builder.stage(stage) {
            warn!(sys_id = %replaced.id, kind = STAGE_TAG, "duplicate record id, keeping the later record");
        }
    }
}

fn extract_activities(root: &Element, builder: &mut ModelBuilder) {
    for el in root.find_all(ACTIVITY_TAG) {
        let activity = Activity {
            id: el.child_text("sys_id").to_string(),
            name: el.child_text("name").to_string(),
            activity_definition: el.child_attr("activity_definition", "display_value").to_string(),
            stage_id: el.child_attr("stage", "display_value").to_string(),
            x: el.child_text("x").to_string(),
            y: el.child_text("y").to_string(),
        };
        if let Some(replaced) = builder.activity(activity) {
            warn!(sys_id = %replaced.id, kind = ACTIVITY_TAG, "duplicate record id, keeping the later record");
        }
    }
}

fn extract_conditions(root: &Element, builder: &mut ModelBuilder) {
    for el in root.find_all(CONDITION_TAG) {
        let condition = Condition {
            id: el.child_text("sys_id").to_string(),
            name: el.child_text("name").to_string(),
            activity_id: el.child_attr("activity", "display_value").to_string(),
            condition: el.child_text("condition").to_string(),
            order: el.child_text("order").to_string(),
        };
        if let Some(replaced) = builder.condition(condition) {
            warn!(sys_id = %replaced.id, kind = CONDITION_TAG, "duplicate record id, keeping the later record");
        }
    }
}

fn extract_transitions(root: &Element, builder: &mut ModelBuilder) {
    for el in root.find_all(TRANSITION_TAG) {
        builder.transition(Transition {
            id: el.child_text("sys_id").to_string(),
            condition_id: el.child_attr("condition", "display_value").to_string(),
            from_activity_id: el.child_attr("from", "display_value").to_string(),
            to_activity_id: el.child_attr("to", "display_value").to_string(),
        });
    }
}
