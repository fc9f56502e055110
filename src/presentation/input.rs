use crate::application::{
    App, AppMode, Form, TaskFlow, ADVICE_IMAGE_PATH,
};
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && matches!(key, KeyCode::Char('q') | KeyCode::Char('c')) {
            app.should_quit = true;
            return;
        }

        if app.show_help {
            Self::handle_help_mode(app, key);
            return;
        }

        if key == KeyCode::F(1) {
            app.show_help = true;
            app.help_scroll = 0;
            return;
        }

        if ctrl {
            match key {
                KeyCode::Char('n') => {
                    app.next_page();
                    return;
                }
                KeyCode::Char('p') => {
                    app.previous_page();
                    return;
                }
                _ => {}
            }
        }

        match app.mode {
            AppMode::Login => Self::handle_login_mode(app, key, ctrl),
            AppMode::Signup => Self::handle_signup_mode(app, key, ctrl),
            AppMode::Emergency => Self::handle_emergency_mode(app, key),
            AppMode::Tasks => Self::handle_tasks_mode(app, key, ctrl),
            AppMode::LegalRecord => Self::handle_legal_record_mode(app, key, ctrl),
            AppMode::Profile => Self::handle_profile_mode(app, key, ctrl),
            AppMode::Logout => Self::handle_logout_mode(app, key),
        }
    }

    /// Field navigation and line editing shared by every form.
    fn edit_form(form: &mut Form, key: KeyCode, ctrl: bool) {
        match key {
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
            KeyCode::Backspace => form.focused_input().backspace(),
            KeyCode::Delete => form.focused_input().delete(),
            KeyCode::Left => form.focused_input().move_left(),
            KeyCode::Right => form.focused_input().move_right(),
            KeyCode::Home => form.focused_input().home(),
            KeyCode::End => form.focused_input().end(),
            KeyCode::Char(c) if !ctrl => form.focused_input().insert(c),
            _ => {}
        }
    }

    fn handle_login_mode(app: &mut App, key: KeyCode, ctrl: bool) {
        match key {
            KeyCode::Enter => app.submit_login(),
            KeyCode::Char('t') if ctrl => app.toggle_signup(),
            _ => Self::edit_form(&mut app.login_form, key, ctrl),
        }
    }

    fn handle_signup_mode(app: &mut App, key: KeyCode, ctrl: bool) {
        match key {
            KeyCode::Enter => app.submit_signup(),
            KeyCode::Esc => app.toggle_signup(),
            KeyCode::Char('t') if ctrl => app.toggle_signup(),
            _ => Self::edit_form(&mut app.signup_form, key, ctrl),
        }
    }

    fn handle_emergency_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('s') | KeyCode::Char('S') => app.send_sos(),
            KeyCode::Char('r') | KeyCode::Char('R') => app.refresh_location(),
            _ => {}
        }
    }

    fn handle_tasks_mode(app: &mut App, key: KeyCode, ctrl: bool) {
        match app.task_flow() {
            TaskFlow::TaskList => match key {
                KeyCode::Up | KeyCode::Char('k') => app.move_task_cursor(false),
                KeyCode::Down | KeyCode::Char('j') => app.move_task_cursor(true),
                KeyCode::Enter => app.open_selected_task(),
                KeyCode::Char('d') if ctrl => app.complete_current_task(),
                _ => {}
            },
            TaskFlow::AdviceRequested(_) => {
                if key == KeyCode::Esc {
                    app.leave_task();
                }
            }
            TaskFlow::TaskDetail(task) | TaskFlow::AdviceReady(task) => match key {
                KeyCode::Esc => app.leave_task(),
                KeyCode::Char('d') if ctrl => app.complete_current_task(),
                KeyCode::Char('y') if ctrl && task.supports_advice() => app.copy_suggestion(),
                KeyCode::Enter if task.supports_advice() => {
                    if app.advice_form.focus == ADVICE_IMAGE_PATH {
                        app.attach_image_from_form();
                    } else {
                        app.queue_advice_request();
                    }
                }
                KeyCode::Enter => app.complete_current_task(),
                _ if task.supports_advice() => Self::edit_form(&mut app.advice_form, key, ctrl),
                _ => {}
            },
        }
    }

    fn handle_legal_record_mode(app: &mut App, key: KeyCode, ctrl: bool) {
        match key {
            KeyCode::Enter => app.save_legal_record(),
            KeyCode::Char('s') if ctrl => app.save_legal_record(),
            KeyCode::Char('e') if ctrl => app.export_legal_records(),
            _ => Self::edit_form(&mut app.legal_form, key, ctrl),
        }
    }

    fn handle_profile_mode(app: &mut App, key: KeyCode, ctrl: bool) {
        match key {
            KeyCode::Enter => app.save_profile(),
            _ => Self::edit_form(&mut app.profile_form, key, ctrl),
        }
    }

    fn handle_logout_mode(app: &mut App, key: KeyCode) {
        let pending = app.controller.session().logout_pending;
        match key {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') if pending => app.confirm_logout(),
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') if pending => app.cancel_logout(),
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => app.request_logout(),
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') => {
                app.show_help = false;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }
}
