//! Application state management for the terminal front end.
//!
//! This module contains the screen/mode machine, the form buffers, and the
//! glue that turns user actions into [`SessionController`] commands and
//! status messages.

use super::session::{SessionController, TaskFlow};
use crate::config::DEFAULT_EXPORT_FILE;
use crate::domain::{Coordinates, TaskId};
use crate::infrastructure::{
    copy_to_clipboard, AdviceProvider, ImageCodec, LegalRecordExporter, LocationProvider, Thumbnail,
};

/// Longest edge of the photo preview, in pixels.
pub const PREVIEW_SIZE: u32 = 24;

pub const DEFAULT_STATEMENT: &str = "Volunteered in the rescue to protect the lives of the injured...";

/// Represents the current screen of the application.
///
/// Guests only reach `Login` and `Signup`; the other screens require a
/// signed-in volunteer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Sign-in form
    Login,
    /// Registration form
    Signup,
    /// Current position and SOS button
    Emergency,
    /// Task list, task detail and medical advice
    Tasks,
    /// Self-declared action statement
    LegalRecord,
    /// Level, counters and profile editing
    Profile,
    /// Two-step logout confirmation
    Logout,
}

impl AppMode {
    pub fn title(&self) -> &'static str {
        match self {
            AppMode::Login | AppMode::Signup => "Login/Signup",
            AppMode::Emergency => "Emergency",
            AppMode::Tasks => "Tasks",
            AppMode::LegalRecord => "Legal Record",
            AppMode::Profile => "Profile",
            AppMode::Logout => "Logout",
        }
    }
}

const GUEST_MENU: [AppMode; 1] = [AppMode::Login];
const MEMBER_MENU: [AppMode; 5] = [
    AppMode::Emergency,
    AppMode::Tasks,
    AppMode::LegalRecord,
    AppMode::Profile,
    AppMode::Logout,
];

/// Single-line text input with a character-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    value: String,
    cursor: usize,
}

impl TextField {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.len();
    }
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    /// Rendered masked
    pub secret: bool,
    pub input: TextField,
}

/// A vertical list of labelled fields with one focused field.
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub focus: usize,
}

impl Form {
    fn new(fields: &[(&'static str, bool)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|&(label, secret)| FormField {
                    label,
                    secret,
                    input: TextField::default(),
                })
                .collect(),
            focus: 0,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields[index].input.value()
    }

    pub fn set_value(&mut self, index: usize, value: &str) {
        self.fields[index].input.set(value);
    }

    pub fn focused(&self) -> &FormField {
        &self.fields[self.focus]
    }

    pub fn focused_input(&mut self) -> &mut TextField {
        &mut self.fields[self.focus].input
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn focus_previous(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.input.clear();
        }
        self.focus = 0;
    }
}

pub const LOGIN_EMAIL: usize = 0;
pub const LOGIN_PASSWORD: usize = 1;

pub const SIGNUP_NAME: usize = 0;
pub const SIGNUP_EMAIL: usize = 1;
pub const SIGNUP_PASSWORD: usize = 2;
pub const SIGNUP_CONFIRM: usize = 3;

pub const ADVICE_DESCRIPTION: usize = 0;
pub const ADVICE_IMAGE_PATH: usize = 1;

pub const PROFILE_NAME: usize = 0;
pub const PROFILE_SKILL: usize = 1;

pub const LEGAL_STATEMENT: usize = 0;
pub const LEGAL_ATTACHMENTS: usize = 1;

/// Result of the most recent location lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationStatus {
    Unknown,
    Locating,
    Found(Coordinates),
    Failed(String),
}

/// Blocking work deferred until after the next frame is drawn, so the
/// screen can show that it is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingWork {
    Advice,
    Locate,
}

/// Main application state: the session controller plus everything the
/// terminal UI needs to render and edit it.
///
/// # Examples
///
/// ```
/// use greentrace::application::{App, AppMode};
/// use greentrace::infrastructure::{FixedLocationProvider, XaiAdviceClient};
///
/// let advice = XaiAdviceClient::new(None, "https://api.x.ai/v1", "grok-3", None).unwrap();
/// let app = App::new(Box::new(advice), Box::new(FixedLocationProvider::default()));
/// assert_eq!(app.mode, AppMode::Login);
/// assert_eq!(app.menu(), &[AppMode::Login]);
/// ```
pub struct App {
    /// Current screen
    pub mode: AppMode,
    pub controller: SessionController,
    pub login_form: Form,
    pub signup_form: Form,
    pub advice_form: Form,
    pub profile_form: Form,
    pub legal_form: Form,
    /// Highlighted row in the task list
    pub task_cursor: usize,
    /// Temporary status message to display
    pub status_message: Option<String>,
    pub show_help: bool,
    /// Scroll position in help text
    pub help_scroll: usize,
    pub location: LocationStatus,
    pub image_preview: Option<Thumbnail>,
    /// Target file for legal record export
    pub export_file: String,
    pub should_quit: bool,
    pending: Option<PendingWork>,
    advice_provider: Box<dyn AdviceProvider>,
    location_provider: Box<dyn LocationProvider>,
}

impl App {
    /// Creates a signed-out app on the login screen.
    ///
    /// # Arguments
    ///
    /// * `advice_provider` - Answers casualty advice requests
    /// * `location_provider` - Looks up the volunteer's position
    pub fn new(advice_provider: Box<dyn AdviceProvider>, location_provider: Box<dyn LocationProvider>) -> Self {
        let mut legal_form = Form::new(&[("Action statement", false), ("Photos / recordings (comma separated)", false)]);
        legal_form.set_value(LEGAL_STATEMENT, DEFAULT_STATEMENT);

        Self {
            mode: AppMode::Login,
            controller: SessionController::new(),
            login_form: Form::new(&[("Email", false), ("Password", true)]),
            signup_form: Form::new(&[
                ("Name", false),
                ("Email", false),
                ("Password", true),
                ("Confirm password", true),
            ]),
            advice_form: Form::new(&[("Casualty description", false), ("Photo path (jpg/png)", false)]),
            profile_form: Form::new(&[("Name", false), ("Skill", false)]),
            legal_form,
            task_cursor: 0,
            status_message: None,
            show_help: false,
            help_scroll: 0,
            location: LocationStatus::Unknown,
            image_preview: None,
            export_file: DEFAULT_EXPORT_FILE.to_string(),
            should_quit: false,
            pending: None,
            advice_provider,
            location_provider,
        }
    }

    /// Sets the CSV file legal records are exported to.
    pub fn with_export_file(mut self, export_file: impl Into<String>) -> Self {
        self.export_file = export_file.into();
        self
    }

    /// Sidebar entries for the current authentication state.
    pub fn menu(&self) -> &'static [AppMode] {
        if self.controller.is_authenticated() {
            &MEMBER_MENU
        } else {
            &GUEST_MENU
        }
    }

    /// Position of the current screen in [`App::menu`]. The signup form
    /// shares the login entry.
    pub fn menu_index(&self) -> usize {
        let current = match self.mode {
            AppMode::Signup => AppMode::Login,
            mode => mode,
        };
        self.menu().iter().position(|mode| *mode == current).unwrap_or(0)
    }

    /// Moves to the next sidebar entry, wrapping around.
    pub fn next_page(&mut self) {
        let menu = self.menu();
        let next = menu[(self.menu_index() + 1) % menu.len()];
        self.switch_to(next);
    }

    /// Moves to the previous sidebar entry, wrapping around.
    pub fn previous_page(&mut self) {
        let menu = self.menu();
        let previous = menu[(self.menu_index() + menu.len() - 1) % menu.len()];
        self.switch_to(previous);
    }

    /// Moves to another screen. Member screens are refused to guests.
    ///
    /// Opening the profile fills its form from the session; opening the
    /// emergency screen queues a location lookup.
    ///
    /// # Arguments
    ///
    /// * `mode` - The screen to show
    pub fn switch_to(&mut self, mode: AppMode) {
        let guest_screen = matches!(mode, AppMode::Login | AppMode::Signup);
        if guest_screen == self.controller.is_authenticated() {
            return;
        }
        if mode == self.mode {
            return;
        }

        self.mode = mode;
        self.status_message = None;

        match mode {
            AppMode::Profile => {
                let session = self.controller.session();
                let (name, skill) = (session.username.clone(), session.profile.skill.clone());
                self.profile_form.set_value(PROFILE_NAME, &name);
                self.profile_form.set_value(PROFILE_SKILL, &skill);
                self.profile_form.focus = 0;
            }
            AppMode::Emergency => self.refresh_location(),
            _ => {}
        }
    }

    /// Flips between the login and signup forms.
    pub fn toggle_signup(&mut self) {
        self.mode = match self.mode {
            AppMode::Login => AppMode::Signup,
            AppMode::Signup => AppMode::Login,
            other => other,
        };
        self.status_message = None;
    }

    /// Logs in with the login form's email and password.
    ///
    /// On success the form is cleared and the emergency screen opens;
    /// otherwise the error becomes the status message.
    pub fn submit_login(&mut self) {
        let email = self.login_form.value(LOGIN_EMAIL).to_string();
        let password = self.login_form.value(LOGIN_PASSWORD).to_string();

        match self.controller.login(&email, &password) {
            Ok(session) => {
                let greeting = format!(
                    "Welcome back, {}! Use Ctrl+N / Ctrl+P to move between screens.",
                    session.username
                );
                self.login_form.clear();
                self.task_cursor = 0;
                self.switch_to(AppMode::Emergency);
                self.status_message = Some(greeting);
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// Registers a volunteer from the signup form.
    ///
    /// On success the login form opens with the new email filled in and
    /// the password field focused.
    pub fn submit_signup(&mut self) {
        let form = &self.signup_form;
        let result = self.controller.signup(
            form.value(SIGNUP_NAME),
            form.value(SIGNUP_EMAIL),
            form.value(SIGNUP_PASSWORD),
            form.value(SIGNUP_CONFIRM),
        );

        match result {
            Ok(user) => {
                let email = user.email.clone();
                self.signup_form.clear();
                self.login_form.clear();
                self.login_form.set_value(LOGIN_EMAIL, &email);
                self.login_form.focus = LOGIN_PASSWORD;
                self.mode = AppMode::Login;
                self.status_message = Some("Signup successful! Please log in.".to_string());
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// Task flow as seen by the user, including an advice request that is
    /// queued but not yet sent.
    pub fn task_flow(&self) -> TaskFlow {
        match (self.pending, self.controller.task_flow()) {
            (Some(PendingWork::Advice), TaskFlow::TaskDetail(task) | TaskFlow::AdviceReady(task)) => {
                TaskFlow::AdviceRequested(task)
            }
            (_, flow) => flow,
        }
    }

    /// Moves the task list highlight one row, wrapping around.
    ///
    /// # Arguments
    ///
    /// * `down` - `true` to move down, `false` to move up
    pub fn move_task_cursor(&mut self, down: bool) {
        let count = TaskId::ALL.len();
        self.task_cursor = if down {
            (self.task_cursor + 1) % count
        } else {
            (self.task_cursor + count - 1) % count
        };
    }

    /// Opens the highlighted task with an empty advice form.
    pub fn open_selected_task(&mut self) {
        let task = TaskId::ALL[self.task_cursor.min(TaskId::ALL.len() - 1)];
        match self.controller.select_task(task) {
            Ok(()) => {
                self.advice_form.clear();
                self.image_preview = None;
                self.status_message = None;
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// Returns to the task list without crediting the task.
    ///
    /// A queued advice request is dropped.
    pub fn leave_task(&mut self) {
        self.controller.return_to_task_list();
        self.advice_form.clear();
        self.image_preview = None;
        self.pending = None;
        self.status_message = None;
    }

    /// Uploads the photo named in the advice form's path field.
    ///
    /// The photo is encoded once; a thumbnail is kept for the preview.
    pub fn attach_image_from_form(&mut self) {
        let path = self.advice_form.value(ADVICE_IMAGE_PATH).trim().to_string();
        if path.is_empty() {
            self.status_message = Some("Enter the path of a jpg or png photo".to_string());
            return;
        }

        let encoded = match ImageCodec::encode_file(&path) {
            Ok(encoded) => encoded,
            Err(e) => {
                self.status_message = Some(e.to_string());
                return;
            }
        };
        let preview = ImageCodec::thumbnail(&encoded, PREVIEW_SIZE, PREVIEW_SIZE).ok();

        match self.controller.attach_image(encoded) {
            Ok(()) => {
                self.image_preview = preview;
                self.status_message = Some("Photo uploaded!".to_string());
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// Validates the advice form and queues the request for [`App::run_pending`].
    ///
    /// An invalid request is reported immediately and nothing is queued.
    pub fn queue_advice_request(&mut self) {
        match self
            .controller
            .validate_suggestion_request(self.advice_form.value(ADVICE_DESCRIPTION))
        {
            Ok(_) => {
                self.pending = Some(PendingWork::Advice);
                self.status_message = Some("Requesting AI advice...".to_string());
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// Queues a location lookup for [`App::run_pending`].
    pub fn refresh_location(&mut self) {
        self.location = LocationStatus::Locating;
        self.pending = Some(PendingWork::Locate);
    }

    pub fn has_pending_work(&self) -> bool {
        self.pending.is_some()
    }

    /// Runs queued blocking work, if any.
    pub fn run_pending(&mut self) {
        let Some(work) = self.pending.take() else {
            return;
        };

        match work {
            PendingWork::Advice => {
                let description = self.advice_form.value(ADVICE_DESCRIPTION).to_string();
                let message = match self
                    .controller
                    .request_suggestion(&description, self.advice_provider.as_ref())
                {
                    Ok(suggestion) if suggestion.is_advice() => "AI advice received".to_string(),
                    Ok(_) => "AI advice unavailable, see the message below".to_string(),
                    Err(e) => e.to_string(),
                };
                self.status_message = Some(message);
            }
            PendingWork::Locate => {
                self.location = match self.controller.locate(self.location_provider.as_ref()) {
                    Ok(coordinates) => LocationStatus::Found(coordinates),
                    Err(e) => LocationStatus::Failed(e.to_string()),
                };
            }
        }
    }

    /// Confirms the selected task and reports the new total and level.
    pub fn complete_current_task(&mut self) {
        match self.controller.complete_task() {
            Ok(summary) => {
                self.advice_form.clear();
                self.image_preview = None;
                self.pending = None;
                self.status_message = Some(format!(
                    "Completed {} task! Total {}. Your volunteer level: {}",
                    summary.increment, summary.completed_tasks, summary.level
                ));
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// Copies the current advice text to the system clipboard.
    pub fn copy_suggestion(&mut self) {
        let message = match &self.controller.session().current_suggestion {
            None => "No AI advice to copy yet".to_string(),
            Some(suggestion) => match copy_to_clipboard(suggestion.text()) {
                Ok(()) => "AI advice copied to clipboard".to_string(),
                Err(e) => format!("Clipboard unavailable: {}", e),
            },
        };
        self.status_message = Some(message);
    }

    /// Raises an SOS carrying the last detected position, if any.
    pub fn send_sos(&mut self) {
        let message = match self.controller.send_sos() {
            Ok(alert) => match alert.location {
                Some(location) => format!("Emergency message sent! Position {}", location),
                None => "Emergency message sent! Position unknown".to_string(),
            },
            Err(e) => e.to_string(),
        };
        self.status_message = Some(message);
    }

    /// Saves the legal record form.
    ///
    /// Attachments are the comma-separated names in the second field;
    /// blanks are skipped. The statement is kept for the next record.
    pub fn save_legal_record(&mut self) {
        let statement = self.legal_form.value(LEGAL_STATEMENT).to_string();
        let attachments: Vec<String> = self
            .legal_form
            .value(LEGAL_ATTACHMENTS)
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        match self.controller.save_legal_record(&statement, attachments) {
            Ok(record) => {
                self.status_message = Some(format!(
                    "Action record #{} and {} file(s) saved",
                    record.id,
                    record.attachments.len()
                ));
                self.legal_form.fields[LEGAL_ATTACHMENTS].input.clear();
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// Writes every saved legal record to [`App::export_file`] as CSV.
    pub fn export_legal_records(&mut self) {
        let message = match LegalRecordExporter::export_to_csv(self.controller.legal_records(), &self.export_file) {
            Ok(filename) => format!("Exported to {}", filename),
            Err(e) => format!("Export failed: {}", e),
        };
        self.status_message = Some(message);
    }

    /// Applies the profile form's name and skill.
    pub fn save_profile(&mut self) {
        let name = self.profile_form.value(PROFILE_NAME).to_string();
        let skill = self.profile_form.value(PROFILE_SKILL).to_string();

        self.status_message = Some(match self.controller.update_profile(&name, &skill) {
            Ok(_) => "Profile updated".to_string(),
            Err(e) => e.to_string(),
        });
    }

    /// First logout step: ask for confirmation.
    pub fn request_logout(&mut self) {
        if let Err(e) = self.controller.request_logout() {
            self.status_message = Some(e.to_string());
        }
    }

    pub fn cancel_logout(&mut self) {
        self.controller.cancel_logout();
        self.status_message = None;
    }

    /// Second logout step. Clears per-user screen state and returns to the
    /// login form; does nothing unless a logout was requested.
    pub fn confirm_logout(&mut self) {
        if self.controller.confirm_logout() {
            self.advice_form.clear();
            self.profile_form.clear();
            self.image_preview = None;
            self.location = LocationStatus::Unknown;
            self.pending = None;
            self.mode = AppMode::Login;
            self.status_message = Some("You have logged out.".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProviderError, Suggestion, VolunteerLevel};
    use crate::test_utils::{app_with_volunteer, logged_in_app, logged_in_app_offline, FakeAdvice, TAIPEI};
    use tempfile::tempdir;

    #[test]
    fn test_app_default() {
        let app = app_with_volunteer(FakeAdvice::answering("x"));
        assert_eq!(app.mode, AppMode::Login);
        assert!(!app.controller.is_authenticated());
        assert_eq!(app.menu(), &[AppMode::Login]);
        assert!(app.status_message.is_none());
        assert!(!app.has_pending_work());
        assert_eq!(app.legal_form.value(LEGAL_STATEMENT), DEFAULT_STATEMENT);
    }

    #[test]
    fn test_text_field_editing_is_char_aware() {
        let mut field = TextField::default();
        field.set("héllo");
        assert_eq!(field.cursor(), 5);

        field.move_left();
        field.move_left();
        field.insert('X');
        assert_eq!(field.value(), "hélXlo");

        field.home();
        field.delete();
        assert_eq!(field.value(), "élXlo");

        field.move_right();
        field.backspace();
        assert_eq!(field.value(), "lXlo");
        assert_eq!(field.cursor(), 0);

        field.backspace();
        assert_eq!(field.value(), "lXlo");

        field.end();
        field.move_right();
        assert_eq!(field.cursor(), 4);
    }

    #[test]
    fn test_form_focus_wraps() {
        let mut form = Form::new(&[("a", false), ("b", false), ("c", true)]);
        form.focus_previous();
        assert_eq!(form.focus, 2);
        assert!(form.focused().secret);
        form.focus_next();
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn test_guest_cannot_open_member_screens() {
        let mut app = app_with_volunteer(FakeAdvice::answering("x"));
        app.switch_to(AppMode::Tasks);
        assert_eq!(app.mode, AppMode::Login);
        app.next_page();
        assert_eq!(app.mode, AppMode::Login);
    }

    #[test]
    fn test_login_lands_on_emergency_and_locates() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        assert_eq!(app.mode, AppMode::Emergency);
        assert!(app.status_message.as_deref().unwrap().starts_with("Welcome back, Alice"));
        assert_eq!(app.location, LocationStatus::Locating);
        assert!(app.login_form.value(LOGIN_PASSWORD).is_empty());

        app.run_pending();
        assert_eq!(app.location, LocationStatus::Found(TAIPEI));
        assert_eq!(app.controller.last_location(), Some(TAIPEI));
    }

    #[test]
    fn test_failed_lookup_is_reported_and_retried() {
        let mut app = logged_in_app_offline(FakeAdvice::answering("x"));
        assert_eq!(app.location, LocationStatus::Locating);

        app.run_pending();
        match &app.location {
            LocationStatus::Failed(message) => {
                assert!(message.starts_with("Unable to determine the current location"));
            }
            other => panic!("expected a failed lookup, got {:?}", other),
        }
        assert_eq!(app.controller.last_location(), None);
        assert_eq!(app.mode, AppMode::Emergency);

        app.refresh_location();
        assert_eq!(app.location, LocationStatus::Locating);
        app.run_pending();
        assert!(matches!(app.location, LocationStatus::Failed(_)));
    }

    #[test]
    fn test_bad_login_keeps_guest_mode() {
        let mut app = app_with_volunteer(FakeAdvice::answering("x"));
        app.login_form.set_value(LOGIN_EMAIL, "a@x.com");
        app.login_form.set_value(LOGIN_PASSWORD, "nope");
        app.submit_login();
        assert_eq!(app.mode, AppMode::Login);
        assert_eq!(app.status_message.as_deref(), Some("Incorrect email or password"));
    }

    #[test]
    fn test_signup_flow_prefills_login() {
        let mut app = app_with_volunteer(FakeAdvice::answering("x"));
        app.toggle_signup();
        assert_eq!(app.mode, AppMode::Signup);

        app.signup_form.set_value(SIGNUP_NAME, "Bob");
        app.signup_form.set_value(SIGNUP_EMAIL, "b@x.com");
        app.signup_form.set_value(SIGNUP_PASSWORD, "pw");
        app.signup_form.set_value(SIGNUP_CONFIRM, "pw2");
        app.submit_signup();
        assert_eq!(app.mode, AppMode::Signup);
        assert_eq!(app.status_message.as_deref(), Some("Passwords do not match"));

        app.signup_form.set_value(SIGNUP_CONFIRM, "pw");
        app.submit_signup();
        assert_eq!(app.mode, AppMode::Login);
        assert_eq!(app.login_form.value(LOGIN_EMAIL), "b@x.com");
        assert_eq!(app.login_form.focus, LOGIN_PASSWORD);
        assert_eq!(app.controller.directory().len(), 2);
    }

    #[test]
    fn test_menu_navigation_cycles_member_screens() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.next_page();
        assert_eq!(app.mode, AppMode::Tasks);
        app.previous_page();
        app.previous_page();
        assert_eq!(app.mode, AppMode::Logout);
        app.next_page();
        assert_eq!(app.mode, AppMode::Emergency);
    }

    #[test]
    fn test_advice_request_is_deferred_until_run() {
        let advice = FakeAdvice::answering("Keep the patient warm");
        let calls = advice.calls.clone();
        let mut app = logged_in_app(advice);
        app.run_pending();

        app.switch_to(AppMode::Tasks);
        app.task_cursor = 2;
        app.open_selected_task();
        assert_eq!(app.task_flow(), TaskFlow::TaskDetail(TaskId::MedicalReport));

        app.advice_form.set_value(ADVICE_DESCRIPTION, "shivering, conscious");
        app.queue_advice_request();
        assert_eq!(app.task_flow(), TaskFlow::AdviceRequested(TaskId::MedicalReport));
        assert_eq!(calls.get(), 0);

        app.run_pending();
        assert_eq!(calls.get(), 1);
        assert_eq!(app.task_flow(), TaskFlow::AdviceReady(TaskId::MedicalReport));
        assert_eq!(
            app.controller.session().current_suggestion,
            Some(Suggestion::Advice("Keep the patient warm".to_string()))
        );
    }

    #[test]
    fn test_empty_advice_request_is_never_queued() {
        let advice = FakeAdvice::answering("x");
        let calls = advice.calls.clone();
        let mut app = logged_in_app(advice);
        app.run_pending();
        app.switch_to(AppMode::Tasks);
        app.task_cursor = 2;
        app.open_selected_task();

        app.queue_advice_request();
        assert!(!app.has_pending_work());
        app.run_pending();
        assert_eq!(calls.get(), 0);
        assert!(app.controller.session().current_suggestion.is_none());
        assert_eq!(
            app.status_message.as_deref(),
            Some("Describe the casualty or upload a photo to get advice")
        );
    }

    #[test]
    fn test_provider_failure_shows_message() {
        let mut app = logged_in_app(FakeAdvice::failing(ProviderError::MissingCredential));
        app.run_pending();
        app.switch_to(AppMode::Tasks);
        app.task_cursor = 2;
        app.open_selected_task();
        app.advice_form.set_value(ADVICE_DESCRIPTION, "cut");
        app.queue_advice_request();
        app.run_pending();

        assert_eq!(app.status_message.as_deref(), Some("AI advice unavailable, see the message below"));
        let suggestion = app.controller.session().current_suggestion.clone().unwrap();
        assert!(!suggestion.is_advice());
    }

    #[test]
    fn test_attach_image_from_form() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("leg.png");
        image::RgbImage::from_pixel(48, 24, image::Rgb([10, 200, 10])).save(&path).unwrap();

        let advice = FakeAdvice::answering("elevate the leg");
        let had_image = advice.last_had_image.clone();
        let mut app = logged_in_app(advice);
        app.run_pending();
        app.switch_to(AppMode::Tasks);
        app.task_cursor = 2;
        app.open_selected_task();

        app.advice_form.set_value(ADVICE_IMAGE_PATH, path.to_str().unwrap());
        app.attach_image_from_form();
        assert_eq!(app.status_message.as_deref(), Some("Photo uploaded!"));
        let preview = app.image_preview.as_ref().unwrap();
        assert_eq!((preview.width, preview.height), (PREVIEW_SIZE, PREVIEW_SIZE / 2));

        app.queue_advice_request();
        app.run_pending();
        assert!(had_image.get());
    }

    #[test]
    fn test_attach_image_rejects_bad_path() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.run_pending();
        app.switch_to(AppMode::Tasks);
        app.task_cursor = 2;
        app.open_selected_task();

        app.attach_image_from_form();
        assert_eq!(app.status_message.as_deref(), Some("Enter the path of a jpg or png photo"));

        app.advice_form.set_value(ADVICE_IMAGE_PATH, "notes.pdf");
        app.attach_image_from_form();
        assert!(app.status_message.as_deref().unwrap().starts_with("Unsupported image"));
        assert!(app.controller.session().uploaded_image.is_none());
    }

    #[test]
    fn test_complete_task_reports_level() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.run_pending();
        app.switch_to(AppMode::Tasks);

        app.open_selected_task();
        for _ in 0..10 {
            app.complete_current_task();
        }

        assert_eq!(app.task_flow(), TaskFlow::TaskList);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Completed 1 task! Total 10. Your volunteer level: Silver volunteer")
        );
        assert_eq!(app.controller.session().profile.volunteer_level, VolunteerLevel::Silver);
    }

    #[test]
    fn test_leave_task_discards_pending_advice() {
        let advice = FakeAdvice::answering("x");
        let calls = advice.calls.clone();
        let mut app = logged_in_app(advice);
        app.run_pending();
        app.switch_to(AppMode::Tasks);
        app.task_cursor = 2;
        app.open_selected_task();
        app.advice_form.set_value(ADVICE_DESCRIPTION, "cut");
        app.queue_advice_request();

        app.leave_task();
        app.run_pending();
        assert_eq!(calls.get(), 0);
        assert_eq!(app.task_flow(), TaskFlow::TaskList);
    }

    #[test]
    fn test_profile_screen_prefills_and_saves() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.run_pending();
        app.switch_to(AppMode::Profile);
        assert_eq!(app.profile_form.value(PROFILE_NAME), "Alice");
        assert_eq!(app.profile_form.value(PROFILE_SKILL), "");

        app.profile_form.set_value(PROFILE_NAME, "Alicia");
        app.profile_form.set_value(PROFILE_SKILL, "paramedic");
        app.save_profile();
        assert_eq!(app.status_message.as_deref(), Some("Profile updated"));
        assert_eq!(app.controller.session().username, "Alicia");
        assert_eq!(app.controller.directory().find_by_email("a@x.com").unwrap().skill, "paramedic");
    }

    #[test]
    fn test_legal_record_save_and_export() {
        let dir = tempdir().unwrap();
        let export = dir.path().join("records.csv");
        let mut app = logged_in_app(FakeAdvice::answering("x")).with_export_file(export.to_str().unwrap());
        app.run_pending();
        app.switch_to(AppMode::LegalRecord);

        app.export_legal_records();
        assert_eq!(app.status_message.as_deref(), Some("Export failed: Nothing to export"));

        app.legal_form.set_value(LEGAL_ATTACHMENTS, "a.jpg, ,b.m4a");
        app.save_legal_record();
        assert_eq!(app.status_message.as_deref(), Some("Action record #1 and 2 file(s) saved"));
        assert!(app.legal_form.value(LEGAL_ATTACHMENTS).is_empty());
        assert_eq!(app.controller.legal_records()[0].attachments, vec!["a.jpg", "b.m4a"]);

        app.export_legal_records();
        assert!(export.exists());
        assert!(app.status_message.as_deref().unwrap().starts_with("Exported to"));
    }

    #[test]
    fn test_sos_uses_last_location() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.send_sos();
        assert_eq!(app.status_message.as_deref(), Some("Emergency message sent! Position unknown"));

        app.run_pending();
        app.send_sos();
        assert_eq!(
            app.status_message.as_deref(),
            Some("Emergency message sent! Position 25.0478°N, 121.5319°E")
        );
    }

    #[test]
    fn test_copy_without_suggestion() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.copy_suggestion();
        assert_eq!(app.status_message.as_deref(), Some("No AI advice to copy yet"));
    }

    #[test]
    fn test_logout_requires_confirmation() {
        let mut app = logged_in_app(FakeAdvice::answering("x"));
        app.run_pending();
        app.switch_to(AppMode::Logout);

        app.confirm_logout();
        assert_eq!(app.mode, AppMode::Logout);

        app.request_logout();
        app.cancel_logout();
        app.confirm_logout();
        assert!(app.controller.is_authenticated());

        app.request_logout();
        app.confirm_logout();
        assert_eq!(app.mode, AppMode::Login);
        assert!(!app.controller.is_authenticated());
        assert_eq!(app.location, LocationStatus::Unknown);
        assert_eq!(app.status_message.as_deref(), Some("You have logged out."));
    }
}
