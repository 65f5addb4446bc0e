use std::{
    fmt,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

use crate::{ExcType, exception_private::SimpleException};

/// Estimated result size in bytes above which an operation asks the tracker for permission
/// before allocating.
pub const LARGE_RESULT_THRESHOLD: usize = 100_000;

/// Error returned when a resource limit is exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// Maximum number of instance allocations exceeded.
    Allocation { limit: usize, count: usize },
    /// Maximum execution time exceeded.
    Time { limit: Duration, elapsed: Duration },
    /// A single result would be larger than the memory limit.
    Memory { limit: usize, used: usize },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { limit, count } => {
                write!(f, "allocation limit exceeded: {count} > {limit}")
            }
            Self::Time { limit, elapsed } => {
                write!(f, "time limit exceeded: {elapsed:?} > {limit:?}")
            }
            Self::Memory { limit, used } => {
                write!(f, "memory limit exceeded: {used} bytes > {limit} bytes")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

impl ResourceError {
    /// Maps the limit violation to an exception kind:
    /// - `Allocation` → `MemoryError`
    /// - `Time` → `RuntimeError`
    /// - `Memory` → `MemoryError`
    #[must_use]
    pub(crate) fn into_exception(self) -> SimpleException {
        let exc_type = match self {
            Self::Allocation { .. } | Self::Memory { .. } => ExcType::MemoryError,
            Self::Time { .. } => ExcType::RuntimeError,
        };
        SimpleException::new_msg(exc_type, self)
    }
}

/// Limits enforced by [`LimitedTracker`]. `None` means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of instances that may be allocated.
    #[serde(default)]
    pub max_allocations: Option<usize>,
    /// Maximum wall-clock time, checked on every function call.
    #[serde(default)]
    pub max_duration: Option<Duration>,
    /// Maximum size in bytes of a single large result, such as a repeated sequence.
    #[serde(default)]
    pub max_memory: Option<usize>,
}

impl ResourceLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_allocations(mut self, limit: usize) -> Self {
        self.max_allocations = Some(limit);
        self
    }

    #[must_use]
    pub fn max_duration(mut self, limit: Duration) -> Self {
        self.max_duration = Some(limit);
        self
    }

    #[must_use]
    pub fn max_memory(mut self, limit: usize) -> Self {
        self.max_memory = Some(limit);
        self
    }

    /// Whether any limit is configured.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.max_allocations.is_none() && self.max_duration.is_none() && self.max_memory.is_none()
    }
}

/// Trait for tracking resource usage.
///
/// The runtime calls [`on_allocate`](Self::on_allocate) before creating an instance and
/// [`check_time`](Self::check_time) before entering a function.
pub trait ResourceTracker: fmt::Debug {
    /// Called before each instance allocation.
    fn on_allocate(&mut self) -> Result<(), ResourceError>;

    /// Called on every function call to check time limits.
    fn check_time(&mut self) -> Result<(), ResourceError>;

    /// Called before building a result estimated above [`LARGE_RESULT_THRESHOLD`] bytes.
    fn check_large_result(&self, _estimated_bytes: usize) -> Result<(), ResourceError> {
        Ok(())
    }

    /// Returns the total number of allocations tracked, if this tracker records them.
    fn allocation_count(&self) -> Option<usize> {
        None
    }
}

/// Tracker that enforces nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLimitTracker;

impl ResourceTracker for NoLimitTracker {
    #[inline]
    fn on_allocate(&mut self) -> Result<(), ResourceError> {
        Ok(())
    }

    #[inline]
    fn check_time(&mut self) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// Tracker that enforces [`ResourceLimits`].
#[derive(Debug, Clone)]
pub struct LimitedTracker {
    limits: ResourceLimits,
    allocation_count: usize,
    start: Instant,
}

impl LimitedTracker {
    /// Creates a tracker; the time budget starts now.
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            allocation_count: 0,
            start: Instant::now(),
        }
    }

    #[must_use]
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }
}

impl ResourceTracker for LimitedTracker {
    fn on_allocate(&mut self) -> Result<(), ResourceError> {
        if let Some(max) = self.limits.max_allocations
            && self.allocation_count >= max
        {
            return Err(ResourceError::Allocation {
                limit: max,
                count: self.allocation_count + 1,
            });
        }
        self.allocation_count += 1;
        Ok(())
    }

    fn check_time(&mut self) -> Result<(), ResourceError> {
        if let Some(limit) = self.limits.max_duration {
            let elapsed = self.start.elapsed();
            if elapsed > limit {
                return Err(ResourceError::Time { limit, elapsed });
            }
        }
        Ok(())
    }

    fn check_large_result(&self, estimated_bytes: usize) -> Result<(), ResourceError> {
        if let Some(max) = self.limits.max_memory
            && estimated_bytes > max
        {
            return Err(ResourceError::Memory {
                limit: max,
                used: estimated_bytes,
            });
        }
        Ok(())
    }

    fn allocation_count(&self) -> Option<usize> {
        Some(self.allocation_count)
    }
}
