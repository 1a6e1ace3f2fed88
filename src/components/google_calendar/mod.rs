//! Google Calendar v3 client: an actor owning the HTTP client and the OAuth
//! token, fronted by a cloneable handle implementing `EventService`.

mod actor;
mod handle;
pub mod models;
pub mod time;
pub mod token;

pub use actor::{CalendarApi, API_BASE};
pub use handle::GoogleCalendarHandle;
pub use models::CalendarEvent;
pub use token::{StoredToken, TokenManager};
