//! State of the self-rescheduling animation loop.
//!
//! The loop itself is driven by the host (the browser's animation frame
//! callback, or a test calling `tick`). This module only tracks whether the
//! next frame should run, so a cancellation made from anywhere is seen by
//! the next callback before it draws.

use std::cell::Cell;
use std::rc::Rc;

/// Lifecycle of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Not started yet.
    #[default]
    Idle,
    /// Frames are being produced.
    Running,
    /// Stopped for good. A cancelled loop never restarts.
    Cancelled,
}

/// Shared view of the loop state. Clones observe the same loop.
#[derive(Debug, Clone, Default)]
pub struct FrameLoopHandle {
    state: Rc<Cell<LoopState>>,
}

impl FrameLoopHandle {
    /// A handle in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> LoopState {
        self.state.get()
    }

    /// Whether frames are being produced.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Whether the loop was cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.state() == LoopState::Cancelled
    }

    /// Move from idle to running. Returns `false` if already running or
    /// cancelled.
    pub fn start(&self) -> bool {
        if self.state() != LoopState::Idle {
            return false;
        }
        self.state.set(LoopState::Running);
        true
    }

    /// Stop the loop. Idempotent.
    pub fn cancel(&self) {
        self.state.set(LoopState::Cancelled);
    }
}

/// The loop owned by a viewer: state, frame count and the pending
/// animation frame request.
#[derive(Debug, Default)]
pub struct FrameLoop {
    handle: FrameLoopHandle,
    ticks: u64,
    request_id: Option<i32>,
}

impl FrameLoop {
    /// An idle loop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start producing frames. See [`FrameLoopHandle::start`].
    pub fn start(&self) -> bool {
        self.handle.start()
    }

    /// Cancel and forget the pending request. Returns the request id the
    /// host still has to cancel, if any.
    pub fn cancel(&mut self) -> Option<i32> {
        self.handle.cancel();
        self.request_id.take()
    }

    /// Shared handle to the state.
    pub fn handle(&self) -> FrameLoopHandle {
        self.handle.clone()
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> LoopState {
        self.handle.state()
    }

    /// Whether the next callback should draw.
    #[inline]
    pub fn should_tick(&self) -> bool {
        self.handle.is_running()
    }

    /// Count a produced frame.
    pub fn record_tick(&mut self) {
        self.ticks += 1;
    }

    /// Frames produced so far.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Remember the id of the scheduled animation frame.
    pub fn set_request(&mut self, id: i32) {
        self.request_id = Some(id);
    }

    /// Id of the scheduled animation frame, if any.
    #[inline]
    pub fn pending_request(&self) -> Option<i32> {
        self.request_id
    }

    /// Take the id of the scheduled animation frame.
    pub fn take_request(&mut self) -> Option<i32> {
        self.request_id.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let frame_loop = FrameLoop::new();
        assert_eq!(frame_loop.state(), LoopState::Idle);
        assert!(!frame_loop.should_tick());
    }

    #[test]
    fn test_start_once() {
        let frame_loop = FrameLoop::new();
        assert!(frame_loop.start());
        assert!(!frame_loop.start());
        assert!(frame_loop.should_tick());
    }

    #[test]
    fn test_cancel_is_final() {
        let mut frame_loop = FrameLoop::new();
        frame_loop.start();
        frame_loop.set_request(7);
        assert_eq!(frame_loop.pending_request(), Some(7));
        assert_eq!(frame_loop.cancel(), Some(7));
        assert_eq!(frame_loop.pending_request(), None);
        assert_eq!(frame_loop.cancel(), None);
        assert!(!frame_loop.start());
        assert!(!frame_loop.should_tick());
    }

    #[test]
    fn test_handles_share_state() {
        let frame_loop = FrameLoop::new();
        let handle = frame_loop.handle();
        frame_loop.start();
        assert!(handle.is_running());
        handle.cancel();
        assert!(!frame_loop.should_tick());
        assert_eq!(frame_loop.state(), LoopState::Cancelled);
    }

    #[test]
    fn test_ticks_count() {
        let mut frame_loop = FrameLoop::new();
        frame_loop.record_tick();
        frame_loop.record_tick();
        assert_eq!(frame_loop.ticks(), 2);
    }
}
