//! Account administration
//!
//! The boundary used by the login and administration forms.

pub mod console;

pub use console::{AdminConsole, login};
