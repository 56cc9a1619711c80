//! Line-oriented interactive loop.

use std::sync::Arc;

use anyhow::Result;
use orchestrator::{AttachOutcome, Orchestrator, SubmitOutcome};
use providers::TextAction;
use shared::capability::ActivationMode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::commands::{self, Command, HELP};
use crate::files;

fn report(outcome: SubmitOutcome) {
    match outcome {
        SubmitOutcome::Rejected(reason) => eprintln!("  ! {}", reason),
        SubmitOutcome::Completed { model_turn: false } => eprintln!("  (no response)"),
        SubmitOutcome::Discarded => debug!("result discarded after reset"),
        // Failure turns are printed from the log
        SubmitOutcome::Completed { .. } | SubmitOutcome::Failed { .. } => {}
    }
}

/// Run a request in the background so `/stop` stays responsive.
fn spawn_request<F>(orchestrator: &Arc<Orchestrator>, request: F)
where
    F: FnOnce(Arc<Orchestrator>) -> tokio::task::JoinHandle<SubmitOutcome>,
{
    let handle = request(Arc::clone(orchestrator));
    tokio::spawn(async move {
        match handle.await {
            Ok(outcome) => report(outcome),
            Err(e) => eprintln!("  ! request task failed: {}", e),
        }
    });
}

fn list_capabilities(orchestrator: &Orchestrator) {
    let active = orchestrator.snapshot().active_capability;
    for spec in orchestrator.registry().all() {
        let marker = if Some(spec.id) == active { "*" } else { " " };
        println!(" {} {:<22} {}", marker, spec.id.as_str(), spec.display_label);
    }
}

fn list_models(orchestrator: &Orchestrator) {
    let selected = orchestrator.snapshot().selected_model;
    for model in orchestrator.models() {
        let marker = if model.name == selected.name { "*" } else { " " };
        println!(" {} {} ({})", marker, model.name, model.id);
    }
}

/// Choice `n` of the newest story turn
fn story_choice(orchestrator: &Orchestrator, n: usize) -> Option<String> {
    orchestrator
        .snapshot()
        .turns
        .iter()
        .rev()
        .find_map(|t| t.story.as_ref())
        .and_then(|story| story.choices.get(n).cloned())
}

async fn attach(orchestrator: &Orchestrator, path: &std::path::Path) {
    let file = match files::load_attachment(path).await {
        Ok(file) => file,
        Err(e) => {
            eprintln!("  ! {:#}", e);
            return;
        }
    };
    let name = file.name.clone();
    match orchestrator.attach_file(file).await {
        Ok(AttachOutcome::ImageStaged) => println!("  (image {} attached)", name),
        Ok(AttachOutcome::DocumentStaged) => println!("  (document {} attached)", name),
        Ok(AttachOutcome::Submitted(outcome)) => report(outcome),
        Err(e) => eprintln!("  ! {}", e),
    }
}

/// Returns false when the session should end. Never waits on the backend.
fn handle(orchestrator: &Arc<Orchestrator>, command: Command) -> bool {
    match command {
        Command::Send(text) => {
            spawn_request(orchestrator, |o| {
                tokio::spawn(async move { o.submit(&text).await })
            });
        }
        Command::Capabilities => list_capabilities(orchestrator),
        Command::Activate(id) => match orchestrator.registry().find(&id) {
            Some(spec) => {
                if let Err(e) = orchestrator.activate(spec.id, ActivationMode::Announced) {
                    eprintln!("  ! {}", e);
                }
            }
            None => eprintln!("  ! unknown capability: {} (see /caps)", id),
        },
        Command::CancelCapability => orchestrator.cancel_capability(),
        Command::Stop => {
            if !orchestrator.cancel_in_flight() {
                eprintln!("  (nothing to stop)");
            }
        }
        Command::Attach(path) => {
            // In describe mode attaching is itself a request
            let orchestrator = Arc::clone(orchestrator);
            tokio::spawn(async move { attach(&orchestrator, &path).await });
        }
        Command::Detach => orchestrator.remove_attachments(),
        Command::Model(None) => list_models(orchestrator),
        Command::Model(Some(name)) => match orchestrator.change_model(&name) {
            Ok(true) => {}
            Ok(false) => println!("  ({} is already selected)", name),
            Err(e) => eprintln!("  ! {}", e),
        },
        Command::Shorten(index) => spawn_request(orchestrator, move |o| {
            tokio::spawn(async move { o.modify_turn_at(index, TextAction::Shorten).await })
        }),
        Command::Summarize(index) => spawn_request(orchestrator, move |o| {
            tokio::spawn(async move { o.modify_turn_at(index, TextAction::Summarize).await })
        }),
        Command::Edit(index) => match orchestrator.edit_request(index) {
            Some(text) => println!("  edit and send again: {}", text),
            None => eprintln!("  ! turn {} cannot be edited now", index + 1),
        },
        Command::Choose(n) => match story_choice(orchestrator, n) {
            Some(choice) => spawn_request(orchestrator, move |o| {
                tokio::spawn(async move { o.choose_story_option(&choice).await })
            }),
            None => eprintln!("  ! no story choice {}", n + 1),
        },
        Command::Surprise => spawn_request(orchestrator, |o| {
            tokio::spawn(async move { o.surprise_story().await })
        }),
        Command::New => orchestrator.reset(),
        Command::Help => println!("{}", HELP),
        Command::Quit => return false,
    }
    true
}

pub async fn run(orchestrator: Arc<Orchestrator>) -> Result<()> {
    println!("AIVAN ({})  /help for commands", orchestrator.snapshot().selected_model.name);
    println!("Try:");
    for prompt in orchestrator.starter_suggestions(4) {
        println!("  - {}", prompt);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match commands::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("  ! {}", message);
                continue;
            }
        };
        if !handle(&orchestrator, command) {
            break;
        }
    }
    Ok(())
}
