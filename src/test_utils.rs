//! Shared fakes for unit tests.

use crate::application::App;
use crate::domain::{Coordinates, ProviderError};
use crate::infrastructure::{AdviceProvider, AdviceRequest, FixedLocationProvider};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const TAIPEI: Coordinates = Coordinates {
    latitude: 25.0478,
    longitude: 121.5319,
};

/// Advice provider with a canned reply that records how it was called.
///
/// Counters are shared through `Rc` so a test can keep observing them after
/// the fake has been boxed into an [`App`].
pub struct FakeAdvice {
    reply: Result<String, ProviderError>,
    pub calls: Rc<Cell<usize>>,
    pub last_description: Rc<RefCell<Option<String>>>,
    pub last_had_image: Rc<Cell<bool>>,
}

impl FakeAdvice {
    pub fn answering(text: &str) -> Self {
        Self::with_reply(Ok(text.to_string()))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::with_reply(Err(error))
    }

    fn with_reply(reply: Result<String, ProviderError>) -> Self {
        Self {
            reply,
            calls: Rc::new(Cell::new(0)),
            last_description: Rc::new(RefCell::new(None)),
            last_had_image: Rc::new(Cell::new(false)),
        }
    }
}

impl AdviceProvider for FakeAdvice {
    fn suggest(&self, request: &AdviceRequest<'_>) -> Result<String, ProviderError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_description.borrow_mut() = Some(request.description.to_string());
        self.last_had_image.set(request.image.is_some());
        self.reply.clone()
    }
}

/// App wired to fakes, with one registered but logged-out volunteer
/// (`Alice`, `a@x.com` / `pw1`).
pub fn app_with_volunteer(advice: FakeAdvice) -> App {
    app_with_volunteer_at(advice, Some(TAIPEI))
}

/// Like [`app_with_volunteer`], with location lookups answering `position`
/// (`None` makes every lookup fail).
pub fn app_with_volunteer_at(advice: FakeAdvice, position: Option<Coordinates>) -> App {
    let mut app = App::new(
        Box::new(advice),
        Box::new(FixedLocationProvider::new(position)),
    );
    app.controller
        .signup("Alice", "a@x.com", "pw1", "pw1")
        .expect("fixture signup");
    app
}

/// Same as [`app_with_volunteer`] but already logged in.
pub fn logged_in_app(advice: FakeAdvice) -> App {
    log_in(app_with_volunteer(advice))
}

/// Logged-in app whose location lookups always fail.
pub fn logged_in_app_offline(advice: FakeAdvice) -> App {
    log_in(app_with_volunteer_at(advice, None))
}

fn log_in(mut app: App) -> App {
    app.login_form.set_value(0, "a@x.com");
    app.login_form.set_value(1, "pw1");
    app.submit_login();
    app
}
