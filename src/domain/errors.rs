use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in name, email and password")]
    MissingFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("This email is already registered")]
    EmailTaken,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Please log in first")]
    NotAuthenticated,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Describe the casualty or upload a photo to get advice")]
    EmptyRequest,

    #[error("No task selected")]
    NoActiveTask,

    #[error("The current task does not accept photos or advice requests")]
    AdviceNotSupported,

    #[error("The action statement is empty")]
    EmptyStatement,

    #[error("Unsupported image '{0}': expected jpg, jpeg or png")]
    UnsupportedImage(String),

    #[error("Could not read image: {0}")]
    Image(String),
}

/// Failures talking to the advice endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Error: no xAI API key configured. Set XAI_API_KEY to enable AI advice.")]
    MissingCredential,

    #[error("Error: could not reach the advice service. Details: {0}")]
    Transport(String),

    #[error("Error: advice service returned status {status}. Details: {body}")]
    Status { status: u16, body: String },

    #[error("Error: unexpected response from the advice service. Details: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Unable to determine the current location, check the network and retry: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export")]
    Empty,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Location(#[from] LocationError),
}

pub type DomainResult<T> = Result<T, DomainError>;
