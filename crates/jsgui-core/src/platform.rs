//! Platform abstraction traits for jsgui runtime services.
//!
//! The runtime never waits for a frame itself: it asks the host to schedule
//! one and expects the host to call [`Runtime::run_frame`](crate::Runtime::run_frame)
//! when it arrives.

/// Requests frames from the host.
///
/// Implementations must be safe to share across threads so a host loop can
/// hold the same scheduler it wakes from.
pub trait FrameScheduler: Send + Sync {
    /// Request that the host deliver a frame soon. Repeated requests before the
    /// frame arrives may be merged.
    fn schedule_frame(&self);
}

/// Provides timing information for frame timestamps.
pub trait Clock: Send + Sync {
    type Instant: Copy + Send + Sync;

    fn now(&self) -> Self::Instant;

    /// Nanoseconds elapsed since `since`, as passed to `run_frame`.
    fn elapsed_nanos(&self, since: Self::Instant) -> u64;
}

/// Scheduler for hosts that poll [`Runtime::has_pending_frame`](crate::Runtime::has_pending_frame).
#[derive(Debug, Default)]
pub struct DefaultScheduler;

impl FrameScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}
