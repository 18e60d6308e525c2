//! Blocking user interaction

/// Blocking confirmation and alert dialogs shown by the table.
///
/// Both calls block the caller until the user answers or dismisses.
pub trait Prompt: Send + Sync {
    /// Asks a yes/no question. `false` means the user declined.
    fn confirm(&self, message: &str) -> bool;

    /// Shows a message the user must acknowledge.
    fn alert(&self, message: &str);
}

/// Confirms everything and logs alerts. Useful for scripted runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Prompt for AutoConfirm {
    fn confirm(&self, message: &str) -> bool {
        log::info!("Auto-confirming: {}", message);
        true
    }

    fn alert(&self, message: &str) {
        log::warn!("{}", message);
    }
}
