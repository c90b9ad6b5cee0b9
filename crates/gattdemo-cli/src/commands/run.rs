//! Run command implementation.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use dialoguer::{Select, theme::ColorfulTheme};
use gattdemo_core::{StepId, Workflow};

use crate::screen;
use crate::style;
use crate::util::write_output;

/// How the run command drives the workflow.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Follow the workflow without prompting.
    pub auto: bool,
    /// Where to export the activity log as JSON lines.
    pub log_json: Option<PathBuf>,
    pub no_color: bool,
    pub quiet: bool,
    /// Whether prompts can be shown.
    pub interactive: bool,
}

pub async fn cmd_run(workflow: &Workflow, opts: &RunOptions) -> Result<()> {
    if !opts.auto && !opts.interactive {
        bail!("No terminal attached. Use --auto to run the workflow without prompts.");
    }

    let mut printed = 0;
    let mut attempted = HashSet::new();
    let mut failures = 0;

    loop {
        printed = print_progress(workflow, printed, opts.no_color);

        let actions = workflow.available_steps();
        let next = if opts.auto {
            next_auto_step(&actions, &attempted)
        } else {
            prompt_action(&actions)?
        };
        let Some(step) = next else { break };

        attempted.insert(step);
        let spinner = style::step_spinner(step.label(), shows_spinner(step, opts));
        let outcome = workflow.run(step).await;
        spinner.finish_and_clear();
        if !outcome.is_success() {
            failures += 1;
        }
    }

    // Leave the peripheral disconnected.
    if workflow.state().has_session() {
        workflow.run(StepId::CloseSession).await;
    }
    print_progress(workflow, printed, opts.no_color);

    if let Some(path) = &opts.log_json {
        let content = workflow
            .log()
            .to_json_lines()
            .context("Failed to serialize the activity log")?;
        write_output(path, &content)?;
    }

    if opts.auto && failures > 0 {
        bail!("{} step(s) failed", failures);
    }
    Ok(())
}

/// Print the visible panels and any log entries past `printed`.
fn print_progress(workflow: &Workflow, printed: usize, no_color: bool) -> usize {
    let entries = workflow.log().since(printed);
    for entry in &entries {
        println!("{}", screen::render_entry(entry, no_color));
    }
    if !entries.is_empty() {
        for line in screen::render_panels(&workflow.state(), no_color) {
            println!("{}", line);
        }
        println!();
    }
    printed + entries.len()
}

/// Discovery may open the device prompt on stderr, which a ticking spinner
/// would draw over.
fn shows_spinner(step: StepId, opts: &RunOptions) -> bool {
    !opts.quiet && !(opts.interactive && step == StepId::DiscoverPeripheral)
}

/// First offered action that has not been tried yet. Teardown is left to the caller.
pub fn next_auto_step(actions: &[StepId], attempted: &HashSet<StepId>) -> Option<StepId> {
    actions
        .iter()
        .copied()
        .find(|step| *step != StepId::CloseSession && !attempted.contains(step))
}

fn prompt_action(actions: &[StepId]) -> Result<Option<StepId>> {
    let mut items: Vec<&str> = actions.iter().map(|s| s.label()).collect();
    items.push("Quit");

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Next action")
        .items(&items)
        .default(0)
        .interact_opt()
        .context("Failed to get user selection")?;

    Ok(selection.and_then(|index| actions.get(index).copied()))
}
