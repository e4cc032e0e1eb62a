//! TUI rendering for Triad using ratatui.

mod app;
mod draft;
mod input;
mod theme;

pub use app::{App, Command, Field, Screen};
pub use draft::DraftInput;
pub use input::{InputPump, apply_event, handle_events, handle_key};
pub use theme::{Palette, glyphs, palette, styles};

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use triad_core::{
    ConversationState, MethodText, Notice, PracticeSession, ProblemSource, PromptTemplates,
    SAMPLE_PROBLEMS, SessionController, SessionError, Severity, Speaker, UiEvent,
};
use triad_providers::ChatClient;
use triad_types::sanitize_terminal_text;

/// Everything the controller exposes for rendering.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub state: &'a ConversationState,
    pub practice: &'a PracticeSession,
    pub notice: Option<&'a Notice>,
}

impl<'a> View<'a> {
    #[must_use]
    pub fn of<C: ChatClient, P: PromptTemplates>(controller: &'a SessionController<C, P>) -> Self {
        Self {
            state: controller.state(),
            practice: controller.practice(),
            notice: controller.last_error(),
        }
    }
}

/// Carry out a [`Command`] against the controller and update the view model.
///
/// Model calls are awaited here; the caller shows [`Command::busy_label`]
/// before calling and discards input queued meanwhile.
pub async fn run_command<C: ChatClient, P: PromptTemplates>(
    controller: &mut SessionController<C, P>,
    app: &mut App,
    command: Command,
) -> Result<(), SessionError> {
    match command {
        Command::GenerateMethods { problem } => {
            controller.dispatch(UiEvent::SubmitProblem(problem)).await?;
            controller.dispatch(UiEvent::TriggerGenerateMethods).await?;
            app.scroll_to_top();
        }
        Command::SelectMethod(index) => {
            controller.dispatch(UiEvent::SelectMethod(index)).await?;
            app.scroll_to_bottom();
        }
        Command::RequestFollowup => {
            controller.dispatch(UiEvent::TriggerFollowup).await?;
            app.scroll_to_bottom();
        }
        Command::SendChat(text) => {
            controller.dispatch(UiEvent::SubmitChatMessage(text)).await?;
            app.draft_mut(Field::Chat).clear();
            app.scroll_to_bottom();
        }
        Command::GeneratePracticeProblem => controller.generate_practice_problem().await?,
        Command::CycleSample => controller.practice_mut().cycle_sample(),
        Command::SetCustomProblem(text) => controller.practice_mut().set_custom_problem(text),
        Command::RequestFeedback {
            custom,
            steps,
            reason,
        } => {
            controller.practice_mut().set_custom_problem(custom);
            controller.request_practice_feedback(&steps, &reason).await?;
            app.scroll_to_top();
        }
    }
    Ok(())
}

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App, view: &View<'_>) {
    let palette = palette(app.high_contrast());
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    match app.screen() {
        Screen::Brainstorm => draw_brainstorm(frame, app, view, &palette),
        Screen::Practice => draw_practice(frame, app, view, &palette),
    }
}

fn draw_brainstorm(frame: &mut Frame, app: &mut App, view: &View<'_>, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tabs
            Constraint::Length(5), // Problem
            Constraint::Length(5), // Methods
            Constraint::Min(3),    // Method detail + transcript
            Constraint::Length(3), // Chat input
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_tabs(frame, app, view, chunks[0], palette);
    draw_editor(frame, app, Field::Problem, chunks[1], palette);
    draw_methods(frame, view.state, chunks[2], palette);
    draw_conversation(frame, app, view.state, chunks[3], palette);
    draw_editor(frame, app, Field::Chat, chunks[4], palette);
    draw_status_bar(frame, app, view, chunks[5], palette);
}

fn draw_practice(frame: &mut Frame, app: &mut App, view: &View<'_>, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tabs
            Constraint::Length(4), // Problem source
            Constraint::Length(3), // Custom problem
            Constraint::Length(6), // Steps
            Constraint::Length(5), // Reason
            Constraint::Min(3),    // Feedback
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_tabs(frame, app, view, chunks[0], palette);
    draw_problem_source(frame, view.practice, chunks[1], palette);
    draw_editor(frame, app, Field::CustomProblem, chunks[2], palette);
    draw_editor(frame, app, Field::Steps, chunks[3], palette);
    draw_editor(frame, app, Field::Reason, chunks[4], palette);
    draw_feedback(frame, app, view.practice, chunks[5], palette);
    draw_status_bar(frame, app, view, chunks[6], palette);
}

fn panel<'a>(title: impl Into<Line<'a>>, focused: bool, palette: &Palette) -> Block<'a> {
    let border_style = if focused {
        styles::focused_border(palette)
    } else {
        styles::idle_border(palette)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style)
        .title(title)
        .padding(Padding::horizontal(1))
}

fn draw_tabs(frame: &mut Frame, app: &App, view: &View<'_>, area: Rect, palette: &Palette) {
    let mut spans = Vec::new();
    for screen in [Screen::Brainstorm, Screen::Practice] {
        let style = if screen == app.screen() {
            styles::tab_active(palette)
        } else {
            Style::default().fg(palette.text_secondary)
        };
        spans.push(Span::styled(format!(" {} ", screen.title()), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        format!(" {} ", sanitize_terminal_text(app.model_label())),
        Style::default().fg(palette.text_muted),
    ));
    if app.screen() == Screen::Brainstorm {
        spans.push(Span::styled(
            format!("· {:?}", view.state.phase()),
            Style::default().fg(palette.text_muted),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_editor(frame: &mut Frame, app: &App, field: Field, area: Rect, palette: &Palette) {
    let focused = app.focus() == Some(field);
    let draft = app.draft(field);
    let block = panel(format!(" {} ", field.title()), focused, palette);
    let inner = block.inner(area);

    let paragraph = if draft.text().is_empty() && !focused {
        Paragraph::new(Span::styled(field.placeholder(), styles::placeholder(palette)))
    } else {
        let text = sanitize_terminal_text(draft.text()).into_owned();
        let lines: Vec<Line> = text
            .split('\n')
            .map(|line| Line::styled(line.to_string(), Style::default().fg(palette.text_primary)))
            .collect();
        let cursor_row = draft.text_before_cursor().matches('\n').count() as u16;
        let scroll = cursor_row.saturating_sub(inner.height.saturating_sub(1));
        Paragraph::new(lines).scroll((scroll, 0))
    };
    frame.render_widget(paragraph.block(block), area);

    if focused {
        let before = draft.text_before_cursor();
        let row = before.matches('\n').count() as u16;
        let last_line = before.rsplit('\n').next().unwrap_or_default();
        let col = last_line.width() as u16;
        let visible_row = row.min(inner.height.saturating_sub(1));
        let x = inner.x + col.min(inner.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(x, inner.y + visible_row));
    }
}

fn draw_methods(frame: &mut Frame, state: &ConversationState, area: Rect, palette: &Palette) {
    let block = panel(" Methods ", false, palette);
    let Some(methods) = state.methods() else {
        let hint = Line::from(vec![
            Span::styled("Press ", styles::key_hint(palette)),
            Span::styled("Ctrl+G", styles::key_highlight(palette)),
            Span::styled(" to generate three methods.", styles::key_hint(palette)),
        ]);
        frame.render_widget(Paragraph::new(hint).block(block), area);
        return;
    };

    let lines: Vec<Line> = methods
        .iter()
        .map(|(index, method)| {
            let selected = state.selected() == Some(index);
            let marker = if selected { glyphs::SELECTED } else { " " };
            let label_style = if selected {
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.text_secondary)
            };
            let preview_style = match method {
                MethodText::Generated(_) => Style::default().fg(palette.text_primary),
                MethodText::NotGenerated => styles::placeholder(palette),
            };
            Line::from(vec![
                Span::styled(format!("{marker} {} ", index.position() + 1), label_style),
                Span::styled(format!("{index}  "), label_style),
                Span::styled(
                    sanitize_terminal_text(method.preview()).into_owned(),
                    preview_style,
                ),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn push_text(lines: &mut Vec<Line<'static>>, text: &str, style: Style) {
    let text = sanitize_terminal_text(text);
    for line in text.lines() {
        lines.push(Line::styled(format!("  {line}"), style));
    }
}

fn draw_conversation(
    frame: &mut Frame,
    app: &mut App,
    state: &ConversationState,
    area: Rect,
    palette: &Palette,
) {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let body = Style::default().fg(palette.text_secondary);

    let title = match (state.methods(), state.selected()) {
        (None, _) => {
            lines.push(Line::styled(
                "Describe your problem above, then generate three approaches.",
                styles::placeholder(palette),
            ));
            " Conversation ".to_string()
        }
        (Some(methods), None) => {
            for (index, method) in methods.iter() {
                if !lines.is_empty() {
                    lines.push(Line::from(""));
                }
                lines.push(Line::styled(
                    index.to_string(),
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                ));
                let style = if method.is_generated() {
                    body
                } else {
                    styles::placeholder(palette)
                };
                push_text(&mut lines, method.display_text(), style);
            }
            " Methods · press 1, 2 or 3 to select ".to_string()
        }
        (Some(methods), Some(index)) => {
            push_text(&mut lines, methods.get(index).display_text(), body);
            let transcript = state.transcript(index);
            for (position, turn) in transcript.turns().iter().enumerate() {
                lines.push(Line::from(""));
                let (icon, name, style) = match turn.speaker {
                    Speaker::User => (glyphs::USER, "You", styles::user_name(palette)),
                    Speaker::Assistant if transcript.is_followup(position) => {
                        (glyphs::ASSISTANT, "Follow-up", styles::assistant_name(palette))
                    }
                    Speaker::Assistant => {
                        (glyphs::ASSISTANT, "Assistant", styles::assistant_name(palette))
                    }
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{icon} "), style),
                    Span::styled(name, style),
                ]));
                let content_style = match turn.speaker {
                    Speaker::User => Style::default().fg(palette.text_primary),
                    Speaker::Assistant => body,
                };
                push_text(&mut lines, &turn.content, content_style);
            }
            if transcript.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    Span::styled("Ctrl+F", styles::key_highlight(palette)),
                    Span::styled(" detailed follow-up  ", styles::key_hint(palette)),
                    Span::styled("c", styles::key_highlight(palette)),
                    Span::styled(" ask a question", styles::key_hint(palette)),
                ]));
            }
            format!(" {index} ")
        }
    };

    draw_scrolling(frame, app, lines, panel(title, false, palette), area);
}

fn draw_problem_source(frame: &mut Frame, practice: &PracticeSession, area: Rect, palette: &Palette) {
    let block = panel(" Problem ", false, palette);
    let muted = Style::default().fg(palette.text_muted);

    let source_line = match practice.source() {
        ProblemSource::Sample => {
            let position = SAMPLE_PROBLEMS
                .iter()
                .position(|s| *s == practice.sample())
                .map_or(1, |i| i + 1);
            Line::from(vec![
                Span::styled(format!("Sample {position}/{}: ", SAMPLE_PROBLEMS.len()), muted),
                Span::styled(practice.sample(), Style::default().fg(palette.text_secondary)),
            ])
        }
        ProblemSource::Generated => Line::from(vec![
            Span::styled("Generated: ", muted),
            Span::styled(
                sanitize_terminal_text(practice.generated_problem().unwrap_or_default())
                    .into_owned(),
                Style::default().fg(palette.text_secondary),
            ),
        ]),
    };

    let active_line = match practice.active_problem() {
        Some(active) => Line::from(vec![
            Span::styled("Active: ", muted),
            Span::styled(
                sanitize_terminal_text(active.text).into_owned(),
                Style::default()
                    .fg(palette.text_primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(if active.user_authored { "  (yours)" } else { "" }, muted),
        ]),
        None => Line::styled("Active: (none yet)", styles::placeholder(palette)),
    };

    frame.render_widget(
        Paragraph::new(vec![source_line, active_line])
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_feedback(
    frame: &mut Frame,
    app: &mut App,
    practice: &PracticeSession,
    area: Rect,
    palette: &Palette,
) {
    let mut lines: Vec<Line<'static>> = Vec::new();
    match practice.feedback() {
        Some(feedback) => push_text(
            &mut lines,
            feedback,
            Style::default().fg(palette.text_secondary),
        ),
        None => lines.push(Line::styled("No feedback yet.", styles::placeholder(palette))),
    }
    draw_scrolling(frame, app, lines, panel(" Feedback ", false, palette), area);
}

fn draw_scrolling(
    frame: &mut Frame,
    app: &mut App,
    lines: Vec<Line<'static>>,
    block: Block<'_>,
    area: Rect,
) {
    let inner = block.inner(area);
    let total_lines = wrapped_line_count(&lines, inner.width);
    app.update_scroll_max(total_lines.saturating_sub(inner.height));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset(), 0));
    frame.render_widget(paragraph, area);
}

fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let mut total: u16 = 0;

    for line in lines {
        let line_width = line.width();
        let rows = if line_width == 0 {
            1
        } else {
            ((line_width - 1) / width) + 1
        };
        total = total.saturating_add(rows as u16);
    }

    total
}

fn draw_status_bar(frame: &mut Frame, app: &App, view: &View<'_>, area: Rect, palette: &Palette) {
    let line = if let Some(label) = app.busy() {
        Line::from(vec![
            Span::styled(format!(" {} ", glyphs::BUSY), Style::default().fg(palette.warning)),
            Span::styled(
                format!("{label}..."),
                Style::default()
                    .fg(palette.text_secondary)
                    .add_modifier(Modifier::ITALIC),
            ),
        ])
    } else if let Some(notice) = view.notice {
        let (icon, color) = match notice.severity {
            Severity::Warning => (glyphs::WARNING, palette.warning),
            Severity::Error => (glyphs::ERROR, palette.error),
        };
        let message = sanitize_terminal_text(&notice.message).replace('\n', " ");
        Line::from(vec![
            Span::styled(
                format!(" {icon} "),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(message, Style::default().fg(color)),
        ])
    } else {
        key_hints(app, palette)
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn key_hints(app: &App, palette: &Palette) -> Line<'static> {
    let hints: &[(&str, &str)] = match (app.screen(), app.focus()) {
        (_, Some(_)) => &[
            ("Enter", "submit"),
            ("Ctrl+J", "newline"),
            ("Esc", "done"),
            ("Tab", "switch screen"),
        ],
        (Screen::Brainstorm, None) => &[
            ("Ctrl+G", "generate"),
            ("1-3", "select"),
            ("Ctrl+F", "follow-up"),
            ("p/c", "edit"),
            ("Tab", "practice"),
            ("q", "quit"),
        ],
        (Screen::Practice, None) => &[
            ("Ctrl+S", "next sample"),
            ("Ctrl+R", "random problem"),
            ("p/s/r", "edit"),
            ("Tab", "brainstorm"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![Span::raw(" ")];
    for (key, action) in hints {
        spans.push(Span::styled(*key, styles::key_highlight(palette)));
        spans.push(Span::styled(format!(" {action}  "), styles::key_hint(palette)));
    }
    Line::from(spans)
}
