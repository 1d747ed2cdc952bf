//! Scene configuration.

/// Tunables for a [`Scene`](crate::Scene).
#[derive(Debug, Clone, Default)]
pub struct SceneConfig {
    /// Upper bound on the number of `_N` suffixes
    /// [`Scene::make_child_name`](crate::Scene::make_child_name) tries.
    /// `None` keeps probing until a free name turns up.
    pub name_suffix_limit: Option<u64>,
    /// Reject unknown component types in
    /// [`Scene::read_json`](crate::Scene::read_json) instead of logging and
    /// skipping them.
    pub strict_json: bool,
}

impl SceneConfig {
    /// Default configuration: unbounded name probing, lenient JSON.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of generated names tried per collision.
    #[must_use]
    pub fn with_name_suffix_limit(mut self, limit: u64) -> Self {
        self.name_suffix_limit = Some(limit);
        self
    }

    /// Fail on unknown component types while reading JSON.
    #[must_use]
    pub fn with_strict_json(mut self, strict: bool) -> Self {
        self.strict_json = strict;
        self
    }
}
