//! Driver configuration.

/// What to do when the engine raises while analyzing a method.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FaultPolicy {
    /// Log the failure and continue; the method gets no report.
    Tolerant,
    /// Propagate the failure to the caller.
    Strict,
}

/// Configuration of the exploration driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Fault policy for ordinary methods explored during a run.
    pub methods: FaultPolicy,
    /// Fault policy for the entry point interpreted at the end of a run.
    pub entry_point: FaultPolicy,
    /// Refuse to explore anything until a solver has been configured.
    pub require_solver: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            methods: FaultPolicy::Tolerant,
            entry_point: FaultPolicy::Strict,
            require_solver: false,
        }
    }
}
