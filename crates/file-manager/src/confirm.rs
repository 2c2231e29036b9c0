/// Asks the user to approve a destructive action.
pub trait Confirm: Send + Sync {
    /// Shows `prompt` and returns `true` if the user agreed.
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}
