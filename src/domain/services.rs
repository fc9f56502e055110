//! In-memory volunteer directory.
//!
//! The directory is the process-wide user table. It is never written to
//! disk and keeps insertion order, which is also lookup order.

use super::errors::ValidationError;
use super::models::{User, VolunteerLevel};

/// Table of registered volunteers.
///
/// Email is the unique key. Names are display keys and may collide; the
/// name-based updates below touch every record carrying the name.
///
/// # Examples
///
/// ```
/// use greentrace::domain::UserDirectory;
///
/// let mut directory = UserDirectory::default();
/// directory.signup("Alice", "a@x.com", "pw1", "pw1").unwrap();
/// assert!(directory.authenticate("a@x.com", "pw1").is_some());
/// assert!(directory.authenticate("a@x.com", "wrong").is_none());
/// ```
#[derive(Debug, Default, Clone)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    /// Registers a new volunteer.
    ///
    /// Checks run in order: all required fields present, passwords match,
    /// email not yet registered.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name, not required to be unique
    /// * `email` - Login key, unique across the directory
    /// * `password` - Plain-text password
    /// * `confirm_password` - Must equal `password`
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] that applies.
    pub fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<&User, ValidationError> {
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if password != confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.find_by_email(email).is_some() {
            return Err(ValidationError::EmailTaken);
        }

        self.users.push(User::new(name, email, password));
        Ok(&self.users[self.users.len() - 1])
    }

    /// Exact match on both email and password.
    pub fn authenticate(&self, email: &str, password: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|user| user.email == email && user.password == password)
    }

    /// Looks up a volunteer by login email.
    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|user| user.email == email)
    }

    /// Writes a new completion total and level into every record named `name`.
    ///
    /// Returns how many records were updated.
    ///
    /// # Examples
    ///
    /// ```
    /// use greentrace::domain::{UserDirectory, VolunteerLevel};
    ///
    /// let mut directory = UserDirectory::default();
    /// directory.signup("Sam", "sam1@x.com", "a", "a").unwrap();
    /// directory.signup("Sam", "sam2@x.com", "b", "b").unwrap();
    ///
    /// assert_eq!(directory.record_completion("Sam", 10, VolunteerLevel::Silver), 2);
    /// ```
    pub fn record_completion(&mut self, name: &str, completed_tasks: u32, level: VolunteerLevel) -> usize {
        let mut updated = 0;
        for user in self.users.iter_mut().filter(|user| user.name == name) {
            user.completed_tasks = completed_tasks;
            user.volunteer_level = level;
            updated += 1;
        }
        updated
    }

    /// Renames every record named `old_name` and sets its skill.
    ///
    /// Returns how many records were updated.
    pub fn update_profile(&mut self, old_name: &str, new_name: &str, skill: &str) -> usize {
        let mut updated = 0;
        for user in self.users.iter_mut().filter(|user| user.name == old_name) {
            user.name = new_name.to_string();
            user.skill = skill.to_string();
            updated += 1;
        }
        updated
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
