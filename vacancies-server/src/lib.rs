//! HTTP front of the vacancies signature gate

pub mod config;
pub mod handlers;
pub mod logging;
pub mod messages;
pub mod server;

pub use config::{Cli, Command, ServeArgs, SignArgs};
pub use handlers::{handle_request, AppState};
pub use server::{Acceptor, VacanciesServer};
