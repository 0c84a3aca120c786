//! Depth-bounded walk of the activity graph.
//!
//! [`walk_path`] traverses the directed graph induced by transitions,
//! starting from a given activity id, and yields a lazy stream of
//! [`WalkEvent`]s in depth-first document order. The walk is driven by an
//! explicit frame stack, so deep or cyclic graphs cannot exhaust the call
//! stack, and it never mutates the model.
//!
//! Cycle handling comes in two flavors ([`CycleGuard`]):
//!
//! - [`CycleGuard::DepthBound`] (default): a fixed depth bound truncates
//!   every branch. A cycle shorter than the bound is re-traversed up to the
//!   bound, re-emitting the same activities; that is the upstream-compatible
//!   behavior, not a defect.
//! - [`CycleGuard::VisitedSet`]: stricter opt-in mode that stops the second
//!   time an activity id is reached anywhere in the walk.

use crate::{Id, WorkflowModel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default depth bound: activities at depths 0..=5 are entered, the sixth
/// descent is replaced by [`WalkEvent::Truncated`].
pub const DEFAULT_DEPTH_BOUND: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleGuard {
    /// Bound traversal depth only; short cycles are re-traversed.
    #[default]
    DepthBound,
    /// Additionally stop at any activity id already entered during this
    /// walk, emitting [`WalkEvent::AlreadyVisited`].
    VisitedSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkConfig {
    pub depth_bound: usize,
    pub guard: CycleGuard,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            depth_bound: DEFAULT_DEPTH_BOUND,
            guard: CycleGuard::DepthBound,
        }
    }
}

impl WalkConfig {
    pub fn with_depth_bound(depth_bound: usize) -> Self {
        Self {
            depth_bound,
            ..Self::default()
        }
    }
}

/// One traversal event. `depth` is the recursion depth the event belongs
/// to; presentation layers typically render it as indentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WalkEvent {
    /// Entered a resolved activity.
    Enter {
        activity_id: Id,
        name: String,
        depth: usize,
    },
    /// A transition pointed at an id with no matching activity; this branch
    /// stops here.
    UnknownActivity { activity_id: Id, depth: usize },
    /// The entered activity has no outgoing transitions.
    EndOfPath { depth: usize },
    /// About to follow a transition. `condition` is `None` when the
    /// transition's condition id does not resolve.
    Follow {
        condition_id: Id,
        condition: Option<String>,
        depth: usize,
    },
    /// The depth bound was reached; the subtree behind the preceding
    /// `Follow` is not traversed.
    Truncated { depth: usize },
    /// Visited-set mode only: this activity was already entered during the
    /// walk.
    AlreadyVisited { activity_id: Id, depth: usize },
}

enum Frame {
    Visit { activity_id: Id, depth: usize },
    Emit(WalkEvent),
}

/// Lazy event stream over the activity graph. See [`walk_path`].
pub struct PathWalk<'a> {
    model: &'a WorkflowModel,
    config: WalkConfig,
    stack: Vec<Frame>,
    visited: HashSet<Id>,
}

/// Walk the activity graph from `start_activity_id`.
pub fn walk_path<'a>(
    model: &'a WorkflowModel,
    start_activity_id: &str,
    config: WalkConfig,
) -> PathWalk<'a> {
    PathWalk {
        model,
        config,
        stack: vec![Frame::Visit {
            activity_id: start_activity_id.to_string(),
            depth: 0,
        }],
        visited: HashSet::new(),
    }
}

impl PathWalk<'_> {
    fn visit(&mut self, activity_id: Id, depth: usize) -> WalkEvent {
        if self.config.guard == CycleGuard::VisitedSet
            && !self.visited.insert(activity_id.clone())
        {
            return WalkEvent::AlreadyVisited { activity_id, depth };
        }

        let Some(activity) = self.model.activity(&activity_id) else {
            return WalkEvent::UnknownActivity { activity_id, depth };
        };
        let name = activity.name.clone();

        let transitions = self.model.transitions_from(&activity_id);
        if transitions.is_empty() {
            self.stack.push(Frame::Emit(WalkEvent::EndOfPath { depth }));
        } else {
            // Reverse push so siblings pop in document order; each subtree
            // frame sits under its own Follow event.
            for transition in transitions.iter().rev() {
                if depth + 1 >= self.config.depth_bound {
                    self.stack
                        .push(Frame::Emit(WalkEvent::Truncated { depth: depth + 1 }));
                } else {
                    self.stack.push(Frame::Visit {
                        activity_id: transition.to_activity_id.clone(),
                        depth: depth + 1,
                    });
                }
                let condition = self
                    .model
                    .condition(&transition.condition_id)
                    .map(|c| c.name.clone());
                self.stack.push(Frame::Emit(WalkEvent::Follow {
                    condition_id: transition.condition_id.clone(),
                    condition,
                    depth,
                }));
            }
        }

        WalkEvent::Enter {
            activity_id,
            name,
            depth,
        }
    }
}

impl Iterator for PathWalk<'_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        match self.stack.pop()? {
            Frame::Emit(event) => Some(event),
            Frame::Visit { activity_id, depth } => Some(self.visit(activity_id, depth)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Activity, Condition, ModelBuilder, Transition, WorkflowModel};
    use proptest::prelude::*;

    fn model(activities: &[(&str, &str)], edges: &[(&str, &str, &str)]) -> WorkflowModel {
        let mut builder = ModelBuilder::new();
        for (id, name) in activities {
            builder.activity(Activity {
                id: (*id).into(),
                name: (*name).into(),
                ..Default::default()
            });
        }
        for (i, (from, to, condition_id)) in edges.iter().enumerate() {
            builder.transition(Transition {
                id: format!("t{i}"),
                condition_id: (*condition_id).into(),
                from_activity_id: (*from).into(),
                to_activity_id: (*to).into(),
            });
        }
        builder.finish()
    }

    #[test]
    fn single_activity_enters_then_ends() {
        let model = model(&[("a1", "Begin")], &[]);
        let events: Vec<WalkEvent> = walk_path(&model, "a1", WalkConfig::default()).collect();
        assert_eq!(
            events,
            vec![
                WalkEvent::Enter {
                    activity_id: "a1".into(),
                    name: "Begin".into(),
                    depth: 0,
                },
                WalkEvent::EndOfPath { depth: 0 },
            ]
        );
    }

    #[test]
    fn two_cycle_truncates_at_depth_bound() {
        let mut builder = ModelBuilder::new();
        for (id, name) in [("a1", "A1"), ("a2", "A2")] {
            builder.activity(Activity {
                id: id.into(),
                name: name.into(),
                ..Default::default()
            });
        }
        for (id, cid, cname, from, to) in [
            ("t1", "c1", "C1", "a1", "a2"),
            ("t2", "c2", "C2", "a2", "a1"),
        ] {
            builder.condition(Condition {
                id: cid.into(),
                name: cname.into(),
                ..Default::default()
            });
            builder.transition(Transition {
                id: id.into(),
                condition_id: cid.into(),
                from_activity_id: from.into(),
                to_activity_id: to.into(),
            });
        }
        let model = builder.finish();

        let events: Vec<WalkEvent> =
            walk_path(&model, "a1", WalkConfig::with_depth_bound(4)).collect();

        let entered: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                WalkEvent::Enter { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(entered, ["A1", "A2", "A1", "A2"]);

        let follows = events
            .iter()
            .filter(|e| matches!(e, WalkEvent::Follow { .. }))
            .count();
        assert_eq!(follows, 4);
        assert_eq!(events.last(), Some(&WalkEvent::Truncated { depth: 4 }));
    }

    #[test]
    fn unknown_target_stops_the_branch_without_fault() {
        let model = model(&[("a1", "Begin")], &[("a1", "ghost", "")]);
        let events: Vec<WalkEvent> = walk_path(&model, "a1", WalkConfig::default()).collect();
        assert_eq!(
            events.last(),
            Some(&WalkEvent::UnknownActivity {
                activity_id: "ghost".into(),
                depth: 1,
            })
        );
    }

    #[test]
    fn unknown_start_activity_is_a_single_terminal_event() {
        let model = model(&[], &[]);
        let events: Vec<WalkEvent> = walk_path(&model, "nowhere", WalkConfig::default()).collect();
        assert_eq!(
            events,
            vec![WalkEvent::UnknownActivity {
                activity_id: "nowhere".into(),
                depth: 0,
            }]
        );
    }

    #[test]
    fn unresolved_condition_follows_with_none() {
        let model = model(&[("a1", "A1"), ("a2", "A2")], &[("a1", "a2", "missing")]);
        let follow = walk_path(&model, "a1", WalkConfig::default())
            .find(|e| matches!(e, WalkEvent::Follow { .. }))
            .unwrap();
        assert_eq!(
            follow,
            WalkEvent::Follow {
                condition_id: "missing".into(),
                condition: None,
                depth: 0,
            }
        );
    }

    #[test]
    fn sibling_transitions_walk_in_document_order() {
        let model = model(
            &[("a1", "Root"), ("a2", "Left"), ("a3", "Right")],
            &[("a1", "a2", ""), ("a1", "a3", "")],
        );
        let entered: Vec<String> = walk_path(&model, "a1", WalkConfig::default())
            .filter_map(|e| match e {
                WalkEvent::Enter { name, .. } => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(entered, ["Root", "Left", "Right"]);
    }

    #[test]
    fn visited_set_mode_stops_cycles_early() {
        let model = model(
            &[("a1", "A1"), ("a2", "A2")],
            &[("a1", "a2", ""), ("a2", "a1", "")],
        );
        let config = WalkConfig {
            depth_bound: 10,
            guard: CycleGuard::VisitedSet,
        };
        let events: Vec<WalkEvent> = walk_path(&model, "a1", config).collect();
        assert_eq!(
            events.last(),
            Some(&WalkEvent::AlreadyVisited {
                activity_id: "a1".into(),
                depth: 2,
            })
        );
        let entered = events
            .iter()
            .filter(|e| matches!(e, WalkEvent::Enter { .. }))
            .count();
        assert_eq!(entered, 2);
    }

    proptest! {
        /// The walk terminates on every graph, cyclic or not, within the
        /// branching^depth budget.
        #[test]
        fn walk_always_terminates(
            edges in prop::collection::vec((0usize..6, 0usize..6), 0..12),
            depth_bound in 1usize..4,
        ) {
            let mut builder = ModelBuilder::new();
            for i in 0..6 {
                builder.activity(Activity {
                    id: format!("a{i}"),
                    name: format!("Activity {i}"),
                    ..Default::default()
                });
            }
            for (i, (from, to)) in edges.iter().enumerate() {
                builder.transition(Transition {
                    id: format!("t{i}"),
                    condition_id: String::new(),
                    from_activity_id: format!("a{from}"),
                    to_activity_id: format!("a{to}"),
                });
            }
            let model = builder.finish();

            // At most 12 edges, so branching factor at most 12. Each
            // visited node yields at most 1 + branching events.
            let budget = 13usize.pow(depth_bound as u32 + 1);
            let count = walk_path(&model, "a0", WalkConfig::with_depth_bound(depth_bound))
                .take(budget)
                .count();
            prop_assert!(count < budget);
        }
    }
}
