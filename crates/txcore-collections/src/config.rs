//! List configuration

/// What a mutation does after listeners panicked during its dispatch.
///
/// Applied to every mutation of a list; either way the remaining listeners
/// are still attempted and the store change stays committed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Return `ListError::ListenerPanicked` carrying every failure
    #[default]
    Collect,
    /// Log each failure at `warn` and return `Ok`
    LogAndContinue,
}

/// Observable list configuration
#[derive(Clone, Debug)]
pub struct ListConfig {
    /// Capacity reserved for the backing store up front
    pub initial_capacity: usize,
    /// Listener failure handling
    pub dispatch_policy: DispatchPolicy,
    /// Name used in log lines
    pub label: String,
}

impl Default for ListConfig {
    fn default() -> Self {
        ListConfig {
            initial_capacity: 0,
            dispatch_policy: DispatchPolicy::Collect,
            label: "observable-list".to_string(),
        }
    }
}

impl ListConfig {
    /// Listener panics are reported to the caller
    pub fn strict() -> Self {
        ListConfig::default()
    }

    /// Listener panics are logged and swallowed
    pub fn lenient() -> Self {
        ListConfig {
            dispatch_policy: DispatchPolicy::LogAndContinue,
            ..ListConfig::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}
