//! Session and presentation models.

pub mod session;
pub mod toast;

pub use session::{CurrentCustomer, keys as session_keys};
pub use toast::{Toast, ToastLevel, set_flash, take_flash};
