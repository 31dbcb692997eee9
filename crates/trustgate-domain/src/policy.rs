/// Engine knobs resolved from configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum height of an expression tree; deeper trees are malformed.
    pub max_depth: usize,
    /// Evaluate `draft` documents through the enforcing path as well.
    pub evaluate_drafts: bool,
}

pub const DEFAULT_MAX_DEPTH: usize = 64;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            evaluate_drafts: false,
        }
    }
}
