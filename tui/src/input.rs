//! Input handling for the Triad TUI.
//!
//! Terminal events are read on a blocking thread and queued. Each frame the
//! queue is drained: edits apply to [`App`] directly, and the first key that
//! needs the session controller is returned as a [`Command`].

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;

use triad_types::MethodIndex;

use crate::app::{App, Command, Field, Screen};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering
const SCROLL_PAGE: u16 = 10;

#[derive(Debug)]
enum InputMsg {
    Event(Event),
    Error(String),
}

pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
    /// A reader error found while discarding; surfaced by the next `handle_events`.
    pending_error: Option<String>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
            pending_error: None,
        }
    }

    #[cfg(test)]
    fn from_receiver(rx: mpsc::Receiver<InputMsg>) -> Self {
        Self {
            rx,
            stop: Arc::new(AtomicBool::new(false)),
            join: None,
            pending_error: None,
        }
    }

    /// Drop everything typed while a model call was in flight.
    ///
    /// Stops at a reader error and keeps it for the next [`handle_events`].
    pub fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        while self.pending_error.is_none() {
            match self.rx.try_recv() {
                Ok(InputMsg::Event(_)) => discarded += 1,
                Ok(InputMsg::Error(msg)) => self.pending_error = Some(msg),
                Err(_) => break,
            }
        }
        if discarded > 0 {
            tracing::debug!(discarded, "Discarded input received while busy");
        }
        discarded
    }

    pub async fn shutdown(&mut self) {
        // Close first so a backpressured input thread unblocks.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop; never block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain queued input. Stops at the first [`Command`] or when the app quits.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<Option<Command>> {
    if let Some(msg) = input.pending_error.take() {
        return Err(anyhow!("input error: {msg}"));
    }
    for _ in 0..MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        let command = apply_event(app, ev);
        if command.is_some() || app.should_quit() {
            return Ok(command);
        }
    }
    Ok(None)
}

pub fn apply_event(app: &mut App, event: Event) -> Option<Command> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Paste(text) => {
            if let Some(field) = app.focus() {
                let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
                app.draft_mut(field).enter_text(&normalized);
            }
            None
        }
        _ => None,
    }
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl {
        match (app.screen(), key.code) {
            (_, KeyCode::Char('c')) => {
                app.request_quit();
                return None;
            }
            (Screen::Brainstorm, KeyCode::Char('g')) => {
                return Some(Command::GenerateMethods {
                    problem: app.draft(Field::Problem).text().to_string(),
                });
            }
            (Screen::Brainstorm, KeyCode::Char('f')) => return Some(Command::RequestFollowup),
            (Screen::Practice, KeyCode::Char('r')) => {
                return Some(Command::GeneratePracticeProblem);
            }
            (Screen::Practice, KeyCode::Char('s')) => return Some(Command::CycleSample),
            _ => {}
        }
    }

    match key.code {
        KeyCode::Tab => {
            app.toggle_screen();
            return None;
        }
        KeyCode::BackTab => {
            app.focus_next();
            return None;
        }
        _ => {}
    }

    match app.focus() {
        None => handle_normal_key(app, key),
        Some(field) => handle_editor_key(app, field, key),
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    let screen = app.screen();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.request_quit(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(SCROLL_PAGE),
        KeyCode::PageDown => app.scroll_down(SCROLL_PAGE),
        KeyCode::Enter | KeyCode::Char('i') => app.set_focus(Some(screen.fields()[0])),
        KeyCode::Char(c) if screen == Screen::Brainstorm => match c {
            '1'..='3' => {
                let position = (c as usize) - ('1' as usize);
                return MethodIndex::try_from(position)
                    .ok()
                    .map(Command::SelectMethod);
            }
            'p' => app.set_focus(Some(Field::Problem)),
            'c' => app.set_focus(Some(Field::Chat)),
            _ => {}
        },
        KeyCode::Char(c) if screen == Screen::Practice => match c {
            'p' => app.set_focus(Some(Field::CustomProblem)),
            's' => app.set_focus(Some(Field::Steps)),
            'r' => app.set_focus(Some(Field::Reason)),
            _ => {}
        },
        _ => {}
    }
    None
}

fn handle_editor_key(app: &mut App, field: Field, key: KeyEvent) -> Option<Command> {
    // Newline: Ctrl+Enter, Shift+Enter, Ctrl+J
    let is_newline = matches!(
        (key.code, key.modifiers),
        (KeyCode::Enter, m) if m.contains(KeyModifiers::CONTROL) || m.contains(KeyModifiers::SHIFT)
    ) || (key.code == KeyCode::Char('j') && key.modifiers.contains(KeyModifiers::CONTROL));

    if is_newline {
        if field != Field::Chat {
            app.draft_mut(field).enter_newline();
        }
        return None;
    }

    match key.code {
        KeyCode::Esc => {
            app.set_focus(None);
            None
        }
        KeyCode::Enter => submit(app, field),
        _ => {
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
            let draft = app.draft_mut(field);
            match key.code {
                KeyCode::Backspace => draft.delete_char(),
                KeyCode::Delete => draft.delete_char_forward(),
                KeyCode::Left => draft.move_cursor_left(),
                KeyCode::Right => draft.move_cursor_right(),
                KeyCode::Home => draft.reset_cursor(),
                KeyCode::End => draft.move_cursor_end(),
                KeyCode::Char('u') if ctrl => draft.clear(),
                KeyCode::Char('w') if ctrl => draft.delete_word_backwards(),
                KeyCode::Char(c) if !ctrl && c != '\r' => draft.enter_char(c),
                _ => {}
            }
            None
        }
    }
}

fn submit(app: &mut App, field: Field) -> Option<Command> {
    match field {
        Field::Problem => Some(Command::GenerateMethods {
            problem: app.draft(Field::Problem).text().to_string(),
        }),
        Field::Chat => Some(Command::SendChat(app.draft(Field::Chat).text().to_string())),
        Field::CustomProblem => {
            app.set_focus(Some(Field::Steps));
            Some(Command::SetCustomProblem(
                app.draft(Field::CustomProblem).text().to_string(),
            ))
        }
        Field::Steps | Field::Reason => Some(Command::RequestFeedback {
            custom: app.draft(Field::CustomProblem).text().to_string(),
            steps: app.draft(Field::Steps).text().to_string(),
            reason: app.draft(Field::Reason).text().to_string(),
        }),
    }
}
