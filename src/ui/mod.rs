pub mod dialogs;
pub mod form_field;
pub mod review;
pub mod step_page;
pub mod terminal_guard;

pub use dialogs::{NoticeDialog, SaveDialog};
pub use review::ReviewScreen;
pub use step_page::StepPage;
pub use terminal_guard::{install_panic_hook, TerminalGuard};
