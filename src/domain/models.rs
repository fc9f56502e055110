use std::fmt;

/// Tier derived from a volunteer's cumulative completed-task count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolunteerLevel {
    #[default]
    Beginner,
    Silver,
    Gold,
}

impl VolunteerLevel {
    pub const SILVER_THRESHOLD: u32 = 10;
    pub const GOLD_THRESHOLD: u32 = 20;

    /// Maps a completed-task count onto its level.
    ///
    /// ```
    /// use greentrace::domain::VolunteerLevel;
    ///
    /// assert_eq!(VolunteerLevel::for_completed_tasks(9), VolunteerLevel::Beginner);
    /// assert_eq!(VolunteerLevel::for_completed_tasks(10), VolunteerLevel::Silver);
    /// assert_eq!(VolunteerLevel::for_completed_tasks(20), VolunteerLevel::Gold);
    /// ```
    pub fn for_completed_tasks(completed: u32) -> Self {
        if completed >= Self::GOLD_THRESHOLD {
            VolunteerLevel::Gold
        } else if completed >= Self::SILVER_THRESHOLD {
            VolunteerLevel::Silver
        } else {
            VolunteerLevel::Beginner
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VolunteerLevel::Beginner => "Beginner volunteer",
            VolunteerLevel::Silver => "Silver volunteer",
            VolunteerLevel::Gold => "Gold volunteer",
        }
    }
}

impl fmt::Display for VolunteerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The closed set of field tasks a volunteer can pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    RescueRoute,
    TrafficControl,
    MedicalReport,
}

impl TaskId {
    pub const ALL: [TaskId; 3] = [TaskId::RescueRoute, TaskId::TrafficControl, TaskId::MedicalReport];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskId::RescueRoute => "rescue_route",
            TaskId::TrafficControl => "traffic_control",
            TaskId::MedicalReport => "medical_report",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TaskId::RescueRoute => "Safe-house route assistance",
            TaskId::TrafficControl => "Traffic control support",
            TaskId::MedicalReport => "Casualty status report",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TaskId::RescueRoute => "Guide affected residents to the nearest safe house.",
            TaskId::TrafficControl => "Support on-site traffic management and crowd dispersal.",
            TaskId::MedicalReport => "Record and report first-response medical conditions.",
        }
    }

    /// Amount credited to the volunteer when this task is completed.
    pub fn completion_increment(&self) -> u32 {
        match self {
            TaskId::RescueRoute | TaskId::TrafficControl | TaskId::MedicalReport => 1,
        }
    }

    /// Only the medical report task accepts photos and AI advice.
    pub fn supports_advice(&self) -> bool {
        matches!(self, TaskId::MedicalReport)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered volunteer.
///
/// Passwords are held and compared in plain text; accounts only live for
/// the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub email: String,
    pub password: String,
    pub skill: String,
    pub completed_tasks: u32,
    pub volunteer_level: VolunteerLevel,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            skill: String::new(),
            completed_tasks: 0,
            volunteer_level: VolunteerLevel::Beginner,
        }
    }
}

/// Session-side mirror of the signed-in user's profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub skill: String,
    pub completed_tasks: u32,
    pub volunteer_level: VolunteerLevel,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            skill: user.skill.clone(),
            completed_tasks: user.completed_tasks,
            volunteer_level: user.volunteer_level,
        }
    }
}

/// Last answer from the advice provider.
///
/// Both variants carry the provider's text verbatim so it can be shown
/// as-is; the variant tells callers whether it is advice or a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    Advice(String),
    Unavailable(String),
}

impl Suggestion {
    pub fn text(&self) -> &str {
        match self {
            Suggestion::Advice(text) | Suggestion::Unavailable(text) => text,
        }
    }

    pub fn is_advice(&self) -> bool {
        matches!(self, Suggestion::Advice(_))
    }
}

/// An uploaded photo, re-encoded as PNG and base64 for transmission.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub base64_png: String,
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("file_name", &self.file_name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("payload_len", &self.base64_png.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.4}°{}, {:.4}°{}",
            self.latitude.abs(),
            ns,
            self.longitude.abs(),
            ew
        )
    }
}

/// A self-declared statement about an on-site action, kept for legal cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalRecord {
    pub id: u32,
    pub author: String,
    pub statement: String,
    pub attachments: Vec<String>,
}

/// Mutable state of the one active user interaction.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub authenticated: bool,
    pub username: String,
    pub profile: Profile,
    pub current_task: Option<TaskId>,
    /// Task credited by completion. Outlives `current_task`, so a task
    /// picked once can be confirmed repeatedly.
    pub credited_task: Option<TaskId>,
    pub current_suggestion: Option<Suggestion>,
    pub uploaded_image: Option<EncodedImage>,
    pub completed_tasks_counter: u32,
    pub logout_pending: bool,
}
