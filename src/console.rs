//! Line-oriented terminal view
//!
//! Renders published snapshots and forwards typed lines to the session
//! handle. Every decision about what a line means belongs to the controller;
//! the console only picks which action to offer for the current phase.

use crate::runtime::{SessionError, SessionHandle};
use crate::state_machine::{Origin, PhaseKind, SessionState};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

pub struct Console<R, W> {
    input: Lines<R>,
    output: W,
    /// Transcript entries already rendered
    rendered: usize,
    announced_generation: bool,
    announced_ready: bool,
    announced_save: Option<PathBuf>,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: input.lines(),
            output,
            rendered: 0,
            announced_generation: false,
            announced_ready: false,
            announced_save: None,
        }
    }

    /// Drive the view until the user quits, input ends, or the controller stops
    pub async fn run(&mut self, handle: &SessionHandle) -> std::io::Result<()> {
        let mut updates = handle.subscribe();
        self.write_line("Guided report. Describe your topic to begin.")
            .await?;

        loop {
            let state = updates.borrow_and_update().clone();
            self.render(&state).await?;

            if waiting(&state) {
                if updates.changed().await.is_err() {
                    return Ok(());
                }
                continue;
            }

            let outcome = match state.phase_kind() {
                PhaseKind::Idle => {
                    let Some(topic) = self.prompt("Topic: ").await? else {
                        return Ok(());
                    };
                    handle.start(topic).await
                }
                PhaseKind::Chatting => {
                    let Some(answer) = self.prompt("> ").await? else {
                        return Ok(());
                    };
                    handle.answer(answer).await
                }
                PhaseKind::ReportReady => {
                    let Some(choice) = self.prompt("[d]ownload or [q]uit: ").await? else {
                        return Ok(());
                    };
                    match choice.trim() {
                        "d" | "D" => handle.download().await,
                        "q" | "Q" => return Ok(()),
                        _ => Ok(()),
                    }
                }
                PhaseKind::Starting | PhaseKind::ReportPending => Ok(()),
            };

            match outcome {
                // Rejected actions leave the state as it was; just prompt again
                Ok(()) | Err(SessionError::Rejected(_)) => {}
                Err(SessionError::Stopped) => return Ok(()),
            }
        }
    }

    async fn render(&mut self, state: &SessionState) -> std::io::Result<()> {
        let entries = state.transcript.entries();
        for entry in entries.iter().skip(self.rendered) {
            // User lines are already on screen as typed
            if entry.origin == Origin::Agent {
                let text = format!("Agent: {}", entry.text);
                self.write_line(&text).await?;
            }
        }
        self.rendered = entries.len();

        match state.phase_kind() {
            PhaseKind::ReportPending if !self.announced_generation => {
                self.announced_generation = true;
                self.write_line("Generating your report...").await?;
            }
            PhaseKind::ReportReady if !self.announced_ready => {
                self.announced_ready = true;
                self.write_line("Your report is ready.").await?;
            }
            _ => {}
        }

        if let Some(path) = state.last_saved() {
            if self.announced_save.as_ref() != Some(path) {
                self.announced_save = Some(path.clone());
                let text = format!("Report saved to {}", path.display());
                self.write_line(&text).await?;
            }
        }
        Ok(())
    }

    async fn prompt(&mut self, text: &str) -> std::io::Result<Option<String>> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        self.input.next_line().await
    }

    async fn write_line(&mut self, text: &str) -> std::io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }
}

/// Nothing to offer the user until the controller moves on
fn waiting(state: &SessionState) -> bool {
    state.is_starting()
        || state.is_answering()
        || state.is_downloading()
        || state.phase_kind() == PhaseKind::ReportPending
}
