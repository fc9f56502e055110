//! Session state manager.
//!
//! [`SessionController`] owns the user directory and the active session and
//! applies every update rule. It knows nothing about rendering; the terminal
//! front end drives it with one command per user action.

use crate::domain::{
    AuthError, Coordinates, DomainResult, EncodedImage, InputError, LegalRecord, Profile, Session,
    Suggestion, TaskId, User, UserDirectory, VolunteerLevel,
};
use crate::infrastructure::{AdviceProvider, AdviceRequest, LocationProvider};
use tracing::{debug, info, warn};

/// Where the volunteer is in the task flow.
///
/// `TaskList → TaskDetail → [AdviceRequested → AdviceReady] → TaskList`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFlow {
    TaskList,
    TaskDetail(TaskId),
    AdviceRequested(TaskId),
    AdviceReady(TaskId),
}

/// Result of completing a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSummary {
    pub task: TaskId,
    pub increment: u32,
    pub completed_tasks: u32,
    pub level: VolunteerLevel,
}

/// An SOS raised from the emergency screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SosAlert {
    pub sender: String,
    pub location: Option<Coordinates>,
}

#[derive(Default)]
pub struct SessionController {
    directory: UserDirectory,
    session: Session,
    legal_records: Vec<LegalRecord>,
    last_location: Option<Coordinates>,
    sos_alerts: Vec<SosAlert>,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    pub fn legal_records(&self) -> &[LegalRecord] {
        &self.legal_records
    }

    pub fn last_location(&self) -> Option<Coordinates> {
        self.last_location
    }

    pub fn sos_alerts(&self) -> &[SosAlert] {
        &self.sos_alerts
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.authenticated
    }

    fn require_auth(&self) -> DomainResult<()> {
        if self.session.authenticated {
            Ok(())
        } else {
            Err(AuthError::NotAuthenticated.into())
        }
    }

    /// Registers a volunteer. The session is not logged in by this.
    pub fn signup(&mut self, name: &str, email: &str, password: &str, confirm_password: &str) -> DomainResult<&User> {
        match self.directory.signup(name, email, password, confirm_password) {
            Ok(user) => {
                info!(name = %user.name, email = %user.email, "volunteer signed up");
                Ok(user)
            }
            Err(e) => {
                debug!(error = %e, "signup rejected");
                Err(e.into())
            }
        }
    }

    /// Starts a session for the volunteer with this exact email and password.
    ///
    /// The session's counter and profile are seeded from the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when no record matches.
    pub fn login(&mut self, email: &str, password: &str) -> DomainResult<&Session> {
        debug!(email, volunteers = self.directory.len(), "login attempt");
        let user = self.directory.authenticate(email, password).ok_or_else(|| {
            warn!(email, "login failed");
            AuthError::InvalidCredentials
        })?;

        self.session = Session {
            authenticated: true,
            username: user.name.clone(),
            profile: Profile::from(user),
            completed_tasks_counter: user.completed_tasks,
            ..Session::default()
        };

        info!(name = %self.session.username, "volunteer logged in");
        Ok(&self.session)
    }

    /// First logout step: ask for confirmation.
    pub fn request_logout(&mut self) -> DomainResult<()> {
        self.require_auth()?;
        self.session.logout_pending = true;
        Ok(())
    }

    pub fn cancel_logout(&mut self) {
        self.session.logout_pending = false;
    }

    /// Second logout step. Only acts while a logout is pending.
    ///
    /// The session goes back to its initial state; stored user records are
    /// left as they are.
    pub fn confirm_logout(&mut self) -> bool {
        if !self.session.authenticated || !self.session.logout_pending {
            return false;
        }
        info!(name = %self.session.username, "volunteer logged out");
        self.session = Session::default();
        true
    }

    pub fn task_flow(&self) -> TaskFlow {
        match (self.session.current_task, &self.session.current_suggestion) {
            (None, _) => TaskFlow::TaskList,
            (Some(task), Some(_)) => TaskFlow::AdviceReady(task),
            (Some(task), None) => TaskFlow::TaskDetail(task),
        }
    }

    /// Opens `task` and clears any previous advice.
    pub fn select_task(&mut self, task: TaskId) -> DomainResult<()> {
        self.require_auth()?;
        self.session.current_task = Some(task);
        self.session.credited_task = Some(task);
        self.session.current_suggestion = None;
        debug!(%task, "task selected");
        Ok(())
    }

    /// Leaves the current task without crediting it.
    pub fn return_to_task_list(&mut self) {
        self.close_task_detail();
        self.session.credited_task = None;
    }

    fn close_task_detail(&mut self) {
        self.session.current_task = None;
        self.session.current_suggestion = None;
        self.session.uploaded_image = None;
    }

    fn advice_task(&self) -> DomainResult<TaskId> {
        self.require_auth()?;
        let task = self.session.current_task.ok_or(InputError::NoActiveTask)?;
        if !task.supports_advice() {
            return Err(InputError::AdviceNotSupported.into());
        }
        Ok(task)
    }

    pub fn attach_image(&mut self, image: EncodedImage) -> DomainResult<()> {
        self.advice_task()?;
        info!(file = %image.file_name, width = image.width, height = image.height, "casualty photo attached");
        self.session.uploaded_image = Some(image);
        Ok(())
    }

    /// Checks that an advice request may go out, without sending it.
    pub fn validate_suggestion_request(&self, description: &str) -> DomainResult<TaskId> {
        let task = self.advice_task()?;
        if description.is_empty() && self.session.uploaded_image.is_none() {
            return Err(InputError::EmptyRequest.into());
        }
        Ok(task)
    }

    /// Sends one request to `provider` and stores its answer.
    ///
    /// A provider failure is not an error here: its text becomes the
    /// current suggestion as [`Suggestion::Unavailable`].
    pub fn request_suggestion(&mut self, description: &str, provider: &dyn AdviceProvider) -> DomainResult<&Suggestion> {
        self.validate_suggestion_request(description)?;

        let request = AdviceRequest {
            description,
            image: self.session.uploaded_image.as_ref(),
        };

        let suggestion = match provider.suggest(&request) {
            Ok(advice) => Suggestion::Advice(advice),
            Err(e) => {
                warn!(error = %e, "advice request failed");
                Suggestion::Unavailable(e.to_string())
            }
        };

        Ok(&*self.session.current_suggestion.insert(suggestion))
    }

    /// Credits the selected task and closes its detail view.
    ///
    /// The task stays credited until another one is selected or the
    /// volunteer leaves it, so confirming again counts again.
    pub fn complete_task(&mut self) -> DomainResult<CompletionSummary> {
        self.require_auth()?;
        let task = self
            .session
            .current_task
            .or(self.session.credited_task)
            .ok_or(InputError::NoActiveTask)?;

        let increment = task.completion_increment();
        let completed_tasks = self.session.completed_tasks_counter.saturating_add(increment);
        let level = VolunteerLevel::for_completed_tasks(completed_tasks);

        self.session.completed_tasks_counter = completed_tasks;
        self.session.profile.completed_tasks = completed_tasks;
        self.session.profile.volunteer_level = level;

        let updated = self
            .directory
            .record_completion(&self.session.username, completed_tasks, level);
        if updated > 1 {
            warn!(name = %self.session.username, records = updated, "completion applied to several records sharing a name");
        }

        self.close_task_detail();

        info!(%task, completed_tasks, %level, "task completed");
        Ok(CompletionSummary {
            task,
            increment,
            completed_tasks,
            level,
        })
    }

    /// Renames the volunteer and sets their skill.
    ///
    /// Records are matched on the name held before this call.
    pub fn update_profile(&mut self, name: &str, skill: &str) -> DomainResult<usize> {
        self.require_auth()?;

        let old_name = std::mem::replace(&mut self.session.username, name.to_string());
        self.session.profile.skill = skill.to_string();

        let updated = self.directory.update_profile(&old_name, name, skill);
        if updated > 1 {
            warn!(old_name = %old_name, records = updated, "profile update applied to several records sharing a name");
        }
        info!(old_name = %old_name, new_name = name, "profile updated");
        Ok(updated)
    }

    /// Appends a legal record authored by the current volunteer.
    ///
    /// # Arguments
    ///
    /// * `statement` - Self-declared account of the action, must not be blank
    /// * `attachments` - File names of supporting photos or recordings
    pub fn save_legal_record(&mut self, statement: &str, attachments: Vec<String>) -> DomainResult<&LegalRecord> {
        self.require_auth()?;
        if statement.trim().is_empty() {
            return Err(InputError::EmptyStatement.into());
        }

        let id = self.legal_records.len() as u32 + 1;
        self.legal_records.push(LegalRecord {
            id,
            author: self.session.username.clone(),
            statement: statement.to_string(),
            attachments,
        });

        info!(id, "legal record saved");
        Ok(&self.legal_records[self.legal_records.len() - 1])
    }

    /// Asks `provider` for the current position and remembers it for SOS.
    pub fn locate(&mut self, provider: &dyn LocationProvider) -> DomainResult<Coordinates> {
        self.require_auth()?;
        let coordinates = provider.locate()?;
        self.last_location = Some(coordinates);
        Ok(coordinates)
    }

    pub fn send_sos(&mut self) -> DomainResult<&SosAlert> {
        self.require_auth()?;
        let alert = SosAlert {
            sender: self.session.username.clone(),
            location: self.last_location,
        };
        warn!(sender = %alert.sender, location = ?alert.location, "SOS raised");
        self.sos_alerts.push(alert);
        Ok(&self.sos_alerts[self.sos_alerts.len() - 1])
    }
}
