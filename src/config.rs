use std::time::Duration;

/// How claiming affects module status.
///
/// The two deployments of the original system disagreed on this, so it is a
/// policy knob rather than a hard-coded rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaimPolicy {
    /// The module stays `Open` while claimed, so additional workers can keep
    /// claiming until the per-module cap is reached.
    #[default]
    StayOpen,
    /// The first claim flips the module to `InProgress`; no further claims
    /// are accepted after that.
    FlipInProgress,
}

/// Capacity and policy configuration for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum concurrent claims a single worker may hold
    pub cap_per_worker: u32,
    /// Maximum simultaneous assignees on a single module
    pub cap_per_module: u32,
    /// Module status behavior when a claim is created
    pub claim_policy: ClaimPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cap_per_worker: 3,
            cap_per_module: 5,
            claim_policy: ClaimPolicy::StayOpen,
        }
    }
}

impl EngineConfig {
    pub fn with_caps(mut self, per_worker: u32, per_module: u32) -> Self {
        self.cap_per_worker = per_worker;
        self.cap_per_module = per_module;
        self
    }

    pub fn with_claim_policy(mut self, policy: ClaimPolicy) -> Self {
        self.claim_policy = policy;
        self
    }
}

/// Timing configuration for the timeout sweeper.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Base interval between sweeps
    pub interval: Duration,
    /// Maximum random jitter added to each tick, so co-started processes do
    /// not sweep in lockstep. Zero disables jitter.
    pub max_jitter: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            max_jitter: Duration::from_secs(30),
        }
    }
}

impl SweepConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }
}
