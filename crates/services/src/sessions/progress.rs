/// Aggregated view of session progress, useful for callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub answered: u32,
    pub limit: u32,
    pub remaining: u32,
    pub is_complete: bool,
}
