use crate::application::{App, AppMode, Form, LocationStatus, TaskFlow};
use crate::domain::{Coordinates, Suggestion, TaskId};
use crate::infrastructure::Thumbnail;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map, MapResolution},
        Block, Borders, Clear, Paragraph, Wrap,
    },
    Frame,
};

const PRIMARY: Color = Color::Rgb(0xD3, 0x2F, 0x2F);
const ACCENT: Color = Color::Rgb(0x0D, 0x47, 0xA1);

/// Headline position shown on the emergency screen regardless of lookup.
const HEADLINE_POSITION: Coordinates = Coordinates {
    latitude: 25.0478,
    longitude: 121.5319,
};

pub fn render_ui(f: &mut Frame, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(22), Constraint::Min(0)])
        .split(f.area());

    render_sidebar(f, app, columns[0]);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(columns[1]);

    render_header(f, app, chunks[0]);
    match app.mode {
        AppMode::Login => render_form(f, &app.login_form, chunks[1], "GreenTrace - Login"),
        AppMode::Signup => render_form(f, &app.signup_form, chunks[1], "GreenTrace - Signup"),
        AppMode::Emergency => render_emergency(f, app, chunks[1]),
        AppMode::Tasks => render_tasks(f, app, chunks[1]),
        AppMode::LegalRecord => render_legal_record(f, app, chunks[1]),
        AppMode::Profile => render_profile(f, app, chunks[1]),
        AppMode::Logout => render_logout(f, app, chunks[1]),
    }
    render_status_bar(f, app, chunks[2]);

    if app.show_help {
        render_help_popup(f, app.help_scroll);
    }
}

fn render_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let selected = app.menu_index();
    let lines: Vec<Line> = app
        .menu()
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            if i == selected {
                Line::from(Span::styled(
                    format!(" > {}", mode.title()),
                    Style::default().bg(PRIMARY).fg(Color::White).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(format!("   {}", mode.title()), Style::default().fg(PRIMARY)))
            }
        })
        .collect();

    let sidebar = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("GreenTrace")
            .title_style(Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)),
    );
    f.render_widget(sidebar, area);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let session = app.controller.session();
    let who = if session.authenticated {
        format!("{} | {}", session.username, session.profile.volunteer_level)
    } else {
        "not signed in".to_string()
    };
    let header = Paragraph::new(format!("GreenTrace - Disaster Relief Volunteers | {}", who))
        .style(Style::default().fg(PRIMARY));
    f.render_widget(header, area);
}

fn form_lines(form: &Form) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let label_style = if focused {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let value = if field.secret {
            "*".repeat(field.input.value().chars().count())
        } else {
            field.input.value().to_string()
        };
        lines.push(Line::from(Span::styled(field.label, label_style)));
        lines.push(Line::from(format!("  {}", value)));
        lines.push(Line::from(""));
    }
    lines
}

/// Puts the terminal cursor on the focused field of a form drawn at `area`
/// by [`form_lines`], starting `line_offset` lines below the top border.
fn place_form_cursor(f: &mut Frame, form: &Form, area: Rect, line_offset: u16) {
    if let Some(position) = form_cursor_position(form, area, line_offset) {
        f.set_cursor_position(position);
    }
}

/// Cursor cell for the focused field, or `None` when it falls outside the
/// block's inner area.
fn form_cursor_position(form: &Form, area: Rect, line_offset: u16) -> Option<(u16, u16)> {
    let cursor = u16::try_from(form.focused().input.cursor()).unwrap_or(u16::MAX);
    let row = u16::try_from(form.focus).unwrap_or(u16::MAX).saturating_mul(3);

    let x = area.x.saturating_add(3).saturating_add(cursor);
    let y = area
        .y
        .saturating_add(2)
        .saturating_add(line_offset)
        .saturating_add(row);

    let right = area.x.saturating_add(area.width.saturating_sub(1));
    let bottom = area.y.saturating_add(area.height.saturating_sub(1));
    (x < right && y < bottom).then_some((x, y))
}

fn render_form(f: &mut Frame, form: &Form, area: Rect, title: &str) {
    let widget = Paragraph::new(form_lines(form)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string()),
    );
    f.render_widget(widget, area);
    place_form_cursor(f, form, area, 0);
}

fn render_emergency(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let lookup = match &app.location {
        LocationStatus::Unknown => Line::from("Position not looked up yet (press r)"),
        LocationStatus::Locating => Line::from("Locating..."),
        LocationStatus::Found(coordinates) => Line::from(format!("Detected position: {}", coordinates)),
        LocationStatus::Failed(error) => Line::from(Span::styled(error.clone(), Style::default().fg(PRIMARY))),
    };

    let summary = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Current position: {}", HEADLINE_POSITION),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        lookup,
        Line::from("s: send SOS | r: refresh position"),
    ])
    .wrap(Wrap { trim: false })
    .block(Block::default().borders(Borders::ALL).title("Emergency"));
    f.render_widget(summary, chunks[0]);

    let marker = match app.location {
        LocationStatus::Found(coordinates) => Some(coordinates),
        _ => None,
    };
    let map = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title("Map"))
        .x_bounds([-180.0, 180.0])
        .y_bounds([-90.0, 90.0])
        .paint(move |ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            if let Some(position) = marker {
                ctx.layer();
                ctx.print(
                    position.longitude,
                    position.latitude,
                    Span::styled("X", Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)),
                );
            }
        });
    f.render_widget(map, chunks[1]);
}

fn render_tasks(f: &mut Frame, app: &App, area: Rect) {
    match app.task_flow() {
        TaskFlow::TaskList => render_task_list(f, app, area),
        TaskFlow::TaskDetail(task) | TaskFlow::AdviceRequested(task) | TaskFlow::AdviceReady(task) => {
            if task.supports_advice() {
                render_medical_report(f, app, task, area);
            } else {
                render_simple_task(f, task, area);
            }
        }
    }
}

fn render_task_list(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from("Pick a task to see its details (Ctrl+D: confirm the last task again)"),
        Line::from(""),
    ];
    for (i, task) in TaskId::ALL.iter().enumerate() {
        let style = if i == app.task_cursor {
            Style::default().bg(ACCENT).fg(Color::White)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!(" {} ", task.title()), style)));
    }

    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Task list"));
    f.render_widget(widget, area);
}

fn render_simple_task(f: &mut Frame, task: TaskId, area: Rect) {
    let widget = Paragraph::new(vec![
        Line::from(Span::styled(task.title(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(task.description()),
        Line::from(""),
        Line::from("Enter / Ctrl+D: confirm task completed | Esc: back to task list"),
    ])
    .wrap(Wrap { trim: false })
    .block(Block::default().borders(Borders::ALL).title(task.title()));
    f.render_widget(widget, area);
}

fn render_medical_report(f: &mut Frame, app: &App, task: TaskId, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(28)])
        .split(rows[0]);

    let mut lines = vec![Line::from(task.description()), Line::from("")];
    let offset = lines.len() as u16;
    lines.extend(form_lines(&app.advice_form));
    let form = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(task.title()));
    f.render_widget(form, top[0]);
    place_form_cursor(f, &app.advice_form, top[0], offset);

    render_photo_preview(f, app, top[1]);

    let body = match (app.task_flow(), &app.controller.session().current_suggestion) {
        (TaskFlow::AdviceRequested(_), _) => vec![Line::from("Requesting AI advice...")],
        (_, Some(Suggestion::Advice(text))) => text.lines().map(|l| Line::from(l.to_string())).collect(),
        (_, Some(Suggestion::Unavailable(text))) => {
            vec![Line::from(Span::styled(text.clone(), Style::default().fg(PRIMARY)))]
        }
        (_, None) => vec![Line::from(
            "Enter on description: get AI advice | Enter on photo path: upload photo",
        )],
    };
    let advice = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("AI advice (Ctrl+Y copy | Ctrl+D complete | Esc back)"));
    f.render_widget(advice, rows[1]);
}

fn thumbnail_lines(thumbnail: &Thumbnail) -> Vec<Line<'static>> {
    let rgb = |[r, g, b]: [u8; 3]| Color::Rgb(r, g, b);
    (0..thumbnail.height)
        .step_by(2)
        .map(|y| {
            let spans: Vec<Span> = (0..thumbnail.width)
                .map(|x| {
                    let top = rgb(thumbnail.pixel(x, y));
                    let bottom = if y + 1 < thumbnail.height {
                        rgb(thumbnail.pixel(x, y + 1))
                    } else {
                        Color::Reset
                    };
                    Span::styled("▀", Style::default().fg(top).bg(bottom))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn render_photo_preview(f: &mut Frame, app: &App, area: Rect) {
    let session = app.controller.session();
    let (title, lines) = match (&session.uploaded_image, &app.image_preview) {
        (Some(image), Some(thumbnail)) => (
            format!("{} {}x{}", image.file_name, image.width, image.height),
            thumbnail_lines(thumbnail),
        ),
        (Some(image), None) => (image.file_name.clone(), vec![Line::from("preview unavailable")]),
        (None, _) => ("Casualty photo".to_string(), vec![Line::from("no photo uploaded")]),
    };
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(widget, area);
}

fn render_legal_record(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = form_lines(&app.legal_form);
    lines.push(Line::from(format!(
        "Saved records this session: {}",
        app.controller.legal_records().len()
    )));
    lines.push(Line::from(format!(
        "Enter / Ctrl+S: save record | Ctrl+E: export to {}",
        app.export_file
    )));

    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Legal Record"));
    f.render_widget(widget, area);
    place_form_cursor(f, &app.legal_form, area, 0);
}

fn render_profile(f: &mut Frame, app: &App, area: Rect) {
    let session = app.controller.session();
    let mut lines = vec![
        Line::from(Span::styled(
            session.username.clone(),
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Volunteer level: {}", session.profile.volunteer_level)),
        Line::from(format!("Tasks completed: {}", session.profile.completed_tasks)),
        Line::from(format!("Skill: {}", session.profile.skill)),
        Line::from(""),
        Line::from(Span::styled("Update profile (Enter to save)", Style::default().add_modifier(Modifier::BOLD))),
    ];
    let offset = lines.len() as u16;
    lines.extend(form_lines(&app.profile_form));

    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Volunteer profile"));
    f.render_widget(widget, area);
    place_form_cursor(f, &app.profile_form, area, offset);
}

fn render_logout(f: &mut Frame, app: &App, area: Rect) {
    let lines = if app.controller.session().logout_pending {
        vec![
            Line::from(Span::styled(
                "Are you sure you want to log out?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("y / Enter: yes, log me out"),
            Line::from("n / Esc: no, go back"),
        ]
    } else {
        vec![
            Line::from(Span::styled("You are about to log out.", Style::default().fg(Color::Yellow))),
            Line::from(""),
            Line::from("Enter: continue to log out"),
        ]
    };
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Logout"));
    f.render_widget(widget, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let text = match &app.status_message {
        Some(status) => status.clone(),
        None => match app.mode {
            AppMode::Login => "Enter: log in | Tab: next field | Ctrl+T: sign up | F1: help | Ctrl+Q: quit".to_string(),
            AppMode::Signup => "Enter: sign up | Tab: next field | Esc: back to login | Ctrl+Q: quit".to_string(),
            _ => "Ctrl+N / Ctrl+P: switch screen | F1: help | Ctrl+Q: quit".to_string(),
        },
    };

    let style = match app.mode {
        AppMode::Login | AppMode::Signup => Style::default().fg(Color::Yellow),
        AppMode::Emergency => Style::default().fg(PRIMARY),
        _ => Style::default(),
    };
    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    f.render_widget(status, area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("GreenTrace Help (Line {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

const HELP_TEXT: &str = r#"GREENTRACE VOLUNTEER COORDINATION

=== GETTING STARTED ===
Sign up with name, email and password (Ctrl+T on the login screen),
then log in with the same email and password.
Accounts live only while the program runs.

=== SCREENS ===
Ctrl+N / Ctrl+P Next / previous screen in the sidebar
Emergency       Your position and a one-press SOS
Tasks           Pick a field task, report casualties, get AI advice
Legal Record    Note what you did on site and which files back it up
Profile         Level, completed tasks, name and skill
Logout          Two-step confirmation

=== FORMS ===
Tab / Down      Next field
Shift+Tab / Up  Previous field
Left / Right    Move cursor
Home / End      Start / end of field
Backspace/Del   Delete characters
Enter           Submit the form

=== EMERGENCY ===
s               Send SOS (includes the last detected position)
r               Look up the current position again

=== TASKS ===
Up/Down, j/k    Choose a task
Enter           Open the task
Ctrl+D          Confirm the task is completed; on the list it
                confirms the last completed task once more
Esc             Back to the task list (nothing is credited)

Casualty status report:
Enter on the description field asks the AI for first-aid advice.
Enter on the photo path field uploads a jpg/png photo.
Either a description or a photo is required.
Ctrl+Y copies the advice to the clipboard.
AI advice needs XAI_API_KEY to be set.

=== VOLUNTEER LEVELS ===
Beginner        fewer than 10 completed tasks
Silver          10 to 19 completed tasks
Gold            20 or more completed tasks

=== LEGAL RECORD ===
Enter / Ctrl+S  Save the statement and file list
Ctrl+E          Export saved records to CSV

=== HELP NAVIGATION ===
Up/Down or j/k  Scroll help text one line
Page Up/Down    Scroll help text 5 lines
Home            Jump to top of help text
Esc/F1/q        Close this help window

Ctrl+Q quits the application."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{logged_in_app, logged_in_app_offline, FakeAdvice};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(app: &App) -> String {
        let backend = TestBackend::new(100, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| render_ui(f, app)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_every_screen_renders() {
        let mut app = logged_in_app(FakeAdvice::answering("Raise the legs"));
        app.run_pending();

        for _ in 0..app.menu().len() {
            let text = screen_text(&app);
            assert!(text.contains(app.mode.title()));
            app.next_page();
        }
    }

    #[test]
    fn test_profile_shows_level() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.switch_to(AppMode::Profile);
        let text = screen_text(&app);
        assert!(text.contains("Volunteer level: Beginner volunteer"));
        assert!(text.contains("Tasks completed: 0"));
    }

    #[test]
    fn test_emergency_screen_shows_lookup_failure() {
        let mut app = logged_in_app_offline(FakeAdvice::answering("x"));
        assert!(screen_text(&app).contains("Locating..."));

        app.run_pending();
        let text = screen_text(&app);
        assert!(text.contains("Current position: 25.0478°N, 121.5319°E"));
        assert!(text.contains("Unable to determine the current location"));
    }

    #[test]
    fn test_emergency_screen_shows_found_position() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.run_pending();
        assert!(screen_text(&app).contains("Detected position: 25.0478°N, 121.5319°E"));
    }

    #[test]
    fn test_passwords_are_masked() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.request_logout();
        app.confirm_logout();
        app.login_form.set_value(1, "hunter2");

        let text = screen_text(&app);
        assert!(text.contains("*******"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_form_cursor_follows_focus() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.switch_to(AppMode::Profile);
        let area = Rect::new(0, 0, 40, 20);

        let form = &app.profile_form;
        assert_eq!(form_cursor_position(form, area, 0), Some((3 + 5, 2)));
        assert_eq!(form_cursor_position(form, area, 4), Some((3 + 5, 6)));
    }

    #[test]
    fn test_form_cursor_on_huge_input_is_hidden() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.advice_form
            .set_value(0, &"a".repeat(usize::from(u16::MAX) + 10));

        let area = Rect::new(10, 10, 80, 20);
        assert_eq!(form_cursor_position(&app.advice_form, area, 0), None);
        assert_eq!(form_cursor_position(&app.advice_form, Rect::new(u16::MAX - 5, 0, 5, 5), 0), None);
    }

    #[test]
    fn test_thumbnail_uses_half_blocks() {
        let thumbnail = Thumbnail {
            width: 2,
            height: 3,
            pixels: vec![[255, 0, 0]; 6],
        };
        let lines = thumbnail_lines(&thumbnail);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.len(), 2);
        assert_eq!(lines[1].spans[0].style.bg, Some(Color::Reset));
    }
}
