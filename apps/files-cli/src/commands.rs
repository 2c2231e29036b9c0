//! Command handlers.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use taskpilot_file_client::FileClient;
use taskpilot_file_manager::{Confirm, DeleteOutcome, FileManager, UploadEvent};
use taskpilot_protocol::types::StoredFile;
use taskpilot_transfer::{FileKind, FilePayload, format_file_size};
use tokio::sync::{mpsc, oneshot};

use crate::cli::Command;
use crate::config::{FilesConfig, config_path};

/// Runs one command against the configured API.
pub async fn run(command: Command, config: &FilesConfig) -> anyhow::Result<()> {
    match command {
        Command::List => list(&connect(config)?).await,
        Command::Upload { paths, retries } => upload(connect(config)?, paths, retries).await,
        Command::Delete { id, yes } => delete(&connect(config)?, &id, yes).await,
        Command::Download { id, out } => {
            let dir = out.unwrap_or_else(|| config.download_dir());
            download(&connect(config)?, &id, dir).await
        }
        Command::Config { save } => show_config(config, save),
    }
}

fn connect(config: &FilesConfig) -> anyhow::Result<FileManager> {
    let client = FileClient::new(config.client_config()).context("building HTTP client")?;
    tracing::debug!(url = %config.api_base_url, "client ready");
    Ok(FileManager::new(Arc::new(client), config.max_files))
}

async fn list(manager: &FileManager) -> anyhow::Result<()> {
    manager.refresh().await?;
    let snapshot = manager.snapshot();

    println!("{} / {} files", snapshot.file_count(), manager.registry().max_files());
    for file in snapshot.files() {
        println!("{}", file_line(file));
    }
    Ok(())
}

fn file_line(file: &StoredFile) -> String {
    format!(
        "{} {:<32} {:>10}  {}  {}",
        FileKind::from_mime(&file.mime_type).icon(),
        file.name,
        format_file_size(file.size),
        file.uploaded_at.format("%Y-%m-%d %H:%M"),
        file.id
    )
}

async fn upload(mut manager: FileManager, paths: Vec<PathBuf>, retries: u32) -> anyhow::Result<()> {
    let mut payloads = Vec::with_capacity(paths.len());
    for path in &paths {
        let payload = FilePayload::from_path(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        payloads.push(payload);
    }

    // The capacity check counts what is already stored.
    manager.refresh().await?;

    let (done_tx, done_rx) = oneshot::channel();
    let printer = manager
        .take_events()
        .map(|events| tokio::spawn(print_events(events, done_rx)));

    let outcomes = manager.upload(payloads).await;
    let mut failed = match &outcomes {
        Ok(outcomes) => outcomes.iter().filter(|o| !o.is_success()).count(),
        Err(_) => 0,
    };
    if outcomes.is_ok() {
        for round in 1..=retries {
            if failed == 0 {
                break;
            }
            println!("retrying {failed} failed upload(s) ({round}/{retries})");
            failed = manager
                .retry_failed()
                .await
                .iter()
                .filter(|o| !o.is_success())
                .count();
        }
    }

    let _ = done_tx.send(());
    if let Some(printer) = printer {
        let _ = printer.await;
    }
    outcomes?;

    let snapshot = manager.snapshot();
    println!(
        "{} / {} files stored",
        snapshot.file_count(),
        manager.registry().max_files()
    );
    if failed > 0 {
        anyhow::bail!("{failed} upload(s) failed");
    }
    Ok(())
}

async fn print_events(mut events: mpsc::Receiver<UploadEvent>, mut done: oneshot::Receiver<()>) {
    let mut renderer = EventRenderer::default();
    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if let Some(line) = renderer.render(&event) {
                    println!("{line}");
                }
            }
            _ = &mut done => {
                while let Ok(event) = events.try_recv() {
                    if let Some(line) = renderer.render(&event) {
                        println!("{line}");
                    }
                }
                break;
            }
        }
    }
}

/// Turns upload events into terminal lines, remembering which file each
/// attempt belongs to.
#[derive(Default)]
struct EventRenderer {
    names: HashMap<String, String>,
}

impl EventRenderer {
    fn render(&mut self, event: &UploadEvent) -> Option<String> {
        match event {
            UploadEvent::Started { id, file_name } => {
                self.names.insert(id.clone(), file_name.clone());
                Some(format!("{file_name}: queued"))
            }
            UploadEvent::Progress { id, percent } => {
                Some(format!("{}: {percent:>3}%", self.name(id)))
            }
            UploadEvent::Completed { id, file } => Some(format!(
                "{}: stored as {} ({})",
                self.name(id),
                file.id,
                format_file_size(file.size)
            )),
            UploadEvent::Failed { id, error } => {
                Some(format!("{}: failed: {error}", self.name(id)))
            }
            UploadEvent::Cleared { id } => {
                self.names.remove(id);
                None
            }
        }
    }

    fn name<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id)
    }
}

async fn delete(manager: &FileManager, id: &str, yes: bool) -> anyhow::Result<()> {
    let name = stored_file(manager, id).await?.name;
    let confirm: Box<dyn Confirm> = if yes {
        Box::new(|_: &str| true)
    } else {
        Box::new(StdinConfirm)
    };

    match manager.registry().delete(id, &name, confirm.as_ref()).await? {
        DeleteOutcome::Deleted => println!("deleted {name}"),
        DeleteOutcome::Declined => println!("kept {name}"),
    }
    Ok(())
}

async fn download(manager: &FileManager, id: &str, dir: PathBuf) -> anyhow::Result<()> {
    let file = stored_file(manager, id).await?;
    let path = manager.registry().download(&file.id, &file.name, &dir).await?;
    println!("saved {}", path.display());
    Ok(())
}

async fn stored_file(manager: &FileManager, id: &str) -> anyhow::Result<StoredFile> {
    manager.refresh().await?;
    manager
        .snapshot()
        .file(id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no stored file with id {id}"))
}

fn show_config(config: &FilesConfig, save: bool) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    if save {
        config.save()?;
        println!("saved to {}", config_path()?.display());
    }
    Ok(())
}

/// Asks on the terminal; anything but `y`/`yes` declines.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
