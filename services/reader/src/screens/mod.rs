pub mod dashboard;
pub mod document;
pub mod login;
pub mod messages;
pub mod register;
pub mod scope;
pub mod typography;

pub use dashboard::{DashboardScreen, DocumentCard};
pub use document::{DocumentScreen, DocumentView};
pub use login::LoginScreen;
pub use register::RegisterScreen;
pub use scope::ScreenScope;
pub use typography::{FontFamily, Typography};
