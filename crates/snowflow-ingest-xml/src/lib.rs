//! ServiceNow workflow XML ingestion for Snowflow (boundary adapter).
//!
//! This crate sits at the interop boundary:
//!
//! - It decodes workflow export XML (untrusted) into a generic labeled tree
//!   ([`dom`]).
//! - It extracts the five known record kinds from that tree into a typed
//!   [`WorkflowModel`] ([`extract`]).
//!
//! Only the tree decode itself can fail ([`DecodeError`], fatal to the whole
//! parse). Extraction never faults: missing elements, missing attributes and
//! unresolvable references all degrade to empty strings or absent lookups in
//! the model.

pub mod dom;
pub mod extract;

pub use dom::{read_tree, DecodeError, Element};
pub use extract::extract_model;

use snowflow_model::WorkflowModel;

/// Parse a workflow export into a frozen model.
///
/// The single entry point for callers that hold raw XML text: decode the
/// tree, then extract the record collections.
pub fn parse_workflow(xml: &str) -> Result<WorkflowModel, DecodeError> {
    let tree = read_tree(xml)?;
    Ok(extract_model(&tree))
}
