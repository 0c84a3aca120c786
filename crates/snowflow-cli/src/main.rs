//! Snowflow CLI
//!
//! Command-line interface over ServiceNow workflow exports:
//! - `summary`: name/table/description, start activity, counts, stage groups
//! - `details`: the full record listing, with cross-references resolved
//! - `path`: depth-bounded walk of the activity graph from the start activity
//!
//! Every command reads one export file; `--json` switches from the console
//! rendering to the JSON shape of the underlying view.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use snowflow_ingest_xml::parse_workflow;
use snowflow_model::{
    build_summary, walk_path, CycleGuard, WalkConfig, WalkEvent, WorkflowModel,
    DEFAULT_DEPTH_BOUND,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "snowflow")]
#[command(
    author,
    version,
    about = "Snowflow: ServiceNow workflow export inspector"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a workflow export (counts, start activity, stage groups).
    Summary {
        /// Workflow export XML file
        input: PathBuf,
        /// Emit JSON instead of the console rendering
        #[arg(long)]
        json: bool,
    },
    /// List every extracted record, with cross-references resolved.
    Details {
        /// Workflow export XML file
        input: PathBuf,
        /// Emit JSON instead of the console rendering
        #[arg(long)]
        json: bool,
    },
    /// Walk the activity graph from the start activity.
    Path {
        /// Workflow export XML file
        input: PathBuf,
        /// Start activity id (defaults to the version's start activity)
        #[arg(long)]
        start: Option<String>,
        /// Depth bound for the walk
        #[arg(long, default_value_t = DEFAULT_DEPTH_BOUND)]
        depth: usize,
        /// Stop at activities already visited instead of re-walking cycles
        #[arg(long)]
        detect_cycles: bool,
        /// Emit the event stream as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Summary { input, json } => {
            let model = load_model(&input)?;
            cmd_summary(&model, json)
        }
        Commands::Details { input, json } => {
            let model = load_model(&input)?;
            cmd_details(&model, json)
        }
        Commands::Path {
            input,
            start,
            depth,
            detect_cycles,
            json,
        } => {
            let model = load_model(&input)?;
            cmd_path(&model, start, depth, detect_cycles, json)
        }
    }
}

fn load_model(input: &Path) -> Result<WorkflowModel> {
    let xml = fs::read_to_string(input)
        .with_context(|| format!("reading workflow export {}", input.display()))?;
    parse_workflow(&xml).with_context(|| format!("decoding workflow export {}", input.display()))
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

// ============================================================================
// summary
// ============================================================================

fn cmd_summary(model: &WorkflowModel, json: bool) -> Result<()> {
    let summary = build_summary(model);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "===== Workflow Summary =====".bold());
    println!("Name: {}", or_na(&summary.name));
    println!("Table: {}", or_na(&summary.table));
    println!("Description: {}", or_na(&summary.description));
    println!(
        "Start Activity: {}",
        summary.start_activity.as_deref().unwrap_or("N/A")
    );
    println!("Stages: {}", summary.stage_count);
    println!("Activities: {}", summary.activity_count);
    println!("Conditions: {}", summary.condition_count);

    if !summary.stage_activities.is_empty() {
        println!();
        println!("{}", "===== Activities by Stage =====".bold());
        for (stage_id, names) in &summary.stage_activities {
            let label = model
                .stage(stage_id)
                .map(|s| s.name.as_str())
                .unwrap_or(stage_id.as_str());
            println!("{}:", label.cyan());
            for name in names {
                println!("  - {name}");
            }
        }
    }
    Ok(())
}

// ============================================================================
// details
// ============================================================================

fn cmd_details(model: &WorkflowModel, json: bool) -> Result<()> {
    if json {
        let details = serde_json::json!({
            "version": model.version(),
            "activities": model.activities(),
            "stages": model.stages(),
            "conditions": model.conditions(),
            "transitions": model.transitions(),
        });
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    println!("{}", "===== Workflow Version =====".bold());
    match model.version() {
        Some(v) => {
            println!(
                "{} [{}] table={} active={} start={}",
                v.name,
                v.id,
                or_na(&v.table),
                v.active,
                or_na(&v.start_activity_id)
            );
            if !v.description.is_empty() {
                println!("  {}", v.description);
            }
        }
        None => println!("(no workflow version record)"),
    }

    println!();
    println!("{}", "===== Stages =====".bold());
    let mut stages: Vec<_> = model.stages().values().collect();
    stages.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    for stage in stages {
        println!("{} [{}] value={} order={}", stage.name, stage.id, stage.value, stage.order);
    }

    println!();
    println!("{}", "===== Activities =====".bold());
    for activity in model.activities_in_order() {
        let stage = match model.stage(&activity.stage_id) {
            Some(s) => s.name.as_str(),
            None => or_na(&activity.stage_id),
        };
        println!(
            "{} [{}] definition={} stage={} at ({}, {})",
            activity.name,
            activity.id,
            or_na(&activity.activity_definition),
            stage,
            or_na(&activity.x),
            or_na(&activity.y)
        );
    }

    println!();
    println!("{}", "===== Conditions =====".bold());
    let mut conditions: Vec<_> = model.conditions().values().collect();
    conditions.sort_by(|a, b| a.id.cmp(&b.id));
    for condition in conditions {
        let activity = match model.activity(&condition.activity_id) {
            Some(a) => a.name.as_str(),
            None => or_na(&condition.activity_id),
        };
        println!(
            "{} [{}] on {} order={} expr={}",
            condition.name,
            condition.id,
            activity,
            condition.order,
            or_na(&condition.condition)
        );
    }

    println!();
    println!("{}", "===== Transitions =====".bold());
    for (from_id, from_name) in transition_sources(model) {
        println!("From: {from_name}");
        for transition in model.transitions_from(&from_id) {
            let to = match model.activity(&transition.to_activity_id) {
                Some(a) => a.name.clone(),
                None => transition.to_activity_id.clone(),
            };
            let condition = match model.condition(&transition.condition_id) {
                Some(c) => c.name.clone(),
                None => transition.condition_id.clone(),
            };
            println!("  To: {to} | Condition: {condition}");
        }
    }
    Ok(())
}

/// Transition group sources: resolved activities first in document order,
/// then unresolved source ids sorted for a stable listing.
fn transition_sources(model: &WorkflowModel) -> Vec<(String, String)> {
    let mut sources: Vec<(String, String)> = model
        .activity_ids()
        .iter()
        .filter(|id| !model.transitions_from(id.as_str()).is_empty())
        .map(|id| {
            let name = model
                .activity(id)
                .map(|a| a.name.clone())
                .unwrap_or_else(|| id.clone());
            (id.clone(), name)
        })
        .collect();

    let mut orphans: Vec<String> = model
        .transitions()
        .keys()
        .filter(|id| model.activity(id.as_str()).is_none())
        .cloned()
        .collect();
    orphans.sort();
    sources.extend(orphans.into_iter().map(|id| (id.clone(), id)));
    sources
}

// ============================================================================
// path
// ============================================================================

fn cmd_path(
    model: &WorkflowModel,
    start: Option<String>,
    depth: usize,
    detect_cycles: bool,
    json: bool,
) -> Result<()> {
    let start = match start.or_else(|| model.version().map(|v| v.start_activity_id.clone())) {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Err(anyhow!(
                "export has no workflow version with a start activity; pass --start <activity-id>"
            ))
        }
    };

    let config = WalkConfig {
        depth_bound: depth,
        guard: if detect_cycles {
            CycleGuard::VisitedSet
        } else {
            CycleGuard::DepthBound
        },
    };

    if json {
        let events: Vec<WalkEvent> = walk_path(model, &start, config).collect();
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    println!("{}", "===== Workflow Path =====".bold());
    for event in walk_path(model, &start, config) {
        print_event(&event);
    }
    Ok(())
}

fn print_event(event: &WalkEvent) {
    match event {
        WalkEvent::Enter { name, depth, .. } => {
            println!("{}Activity: {}", indent(*depth), name.green());
        }
        WalkEvent::UnknownActivity { activity_id, depth } => {
            println!("{}Unknown Activity: {}", indent(*depth), activity_id.red());
        }
        WalkEvent::EndOfPath { depth } => {
            println!("{}  (End of path)", indent(*depth));
        }
        WalkEvent::Follow {
            condition, depth, ..
        } => {
            let label = condition.as_deref().unwrap_or("Unknown");
            println!("{}  → [{}]", indent(*depth), label.yellow());
        }
        WalkEvent::Truncated { depth } => {
            println!("{}... (path continues)", indent(*depth));
        }
        WalkEvent::AlreadyVisited { activity_id, depth } => {
            println!("{}(already visited: {})", indent(*depth), activity_id);
        }
    }
}

fn indent(depth: usize) -> String {
    " ".repeat(depth * 4)
}
