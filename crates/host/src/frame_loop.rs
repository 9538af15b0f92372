use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Handle for one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Platform frame scheduling: ask for a callback before the next repaint,
/// or withdraw a request that has not fired yet.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequest;
    fn cancel_frame(&mut self, request: FrameRequest);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Cancelled,
}

/// Self-rescheduling per-frame loop.
///
/// Exactly one request is outstanding while running. A tick is accepted
/// only for that request, and the next one is requested when the tick
/// finishes, so ticks never overlap.
pub struct AnimationLoop {
    scheduler: Box<dyn FrameScheduler>,
    state: LoopState,
    pending: Option<FrameRequest>,
    in_tick: bool,
    ticks: u64,
}

impl AnimationLoop {
    /// Schedule the first tick.
    pub fn start(mut scheduler: Box<dyn FrameScheduler>) -> Self {
        let first = scheduler.request_frame();
        tracing::debug!(request = first.0, "animation loop started");
        Self {
            scheduler,
            state: LoopState::Running,
            pending: Some(first),
            in_tick: false,
            ticks: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Accept a fired callback. False for stale or unknown requests, for
    /// re-entry while a tick is open, and after cancellation.
    pub fn begin_tick(&mut self, request: FrameRequest) -> bool {
        if self.state == LoopState::Cancelled {
            tracing::trace!(request = request.0, "tick after cancel ignored");
            return false;
        }
        if self.in_tick || self.pending != Some(request) {
            tracing::trace!(request = request.0, "stale frame request ignored");
            return false;
        }
        self.pending = None;
        self.in_tick = true;
        true
    }

    /// Close the open tick and schedule the next one.
    pub fn finish_tick(&mut self) {
        if !self.in_tick {
            return;
        }
        self.in_tick = false;
        self.ticks += 1;
        if self.state == LoopState::Running {
            self.pending = Some(self.scheduler.request_frame());
        }
    }

    /// Stop the loop and withdraw the pending request. Returns false if
    /// already cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.state == LoopState::Cancelled {
            return false;
        }
        if let Some(request) = self.pending.take() {
            self.scheduler.cancel_frame(request);
        }
        self.state = LoopState::Cancelled;
        tracing::debug!(ticks = self.ticks, "animation loop cancelled");
        true
    }
}

#[derive(Debug, Default)]
struct ManualQueue {
    next: u64,
    due: VecDeque<FrameRequest>,
    requested: u64,
    cancelled: u64,
}

/// Scheduler driven by the caller: requests queue up until taken.
///
/// Cloning shares the queue, so a driver can keep a handle after boxing
/// one into an `AnimationLoop`.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<ManualQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest due request.
    pub fn next_due(&self) -> Option<FrameRequest> {
        self.queue.borrow_mut().due.pop_front()
    }

    pub fn due_count(&self) -> usize {
        self.queue.borrow().due.len()
    }

    pub fn requested_count(&self) -> u64 {
        self.queue.borrow().requested
    }

    pub fn cancelled_count(&self) -> u64 {
        self.queue.borrow().cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        let mut queue = self.queue.borrow_mut();
        queue.next += 1;
        queue.requested += 1;
        let request = FrameRequest(queue.next);
        queue.due.push_back(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut queue = self.queue.borrow_mut();
        queue.due.retain(|r| *r != request);
        queue.cancelled += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> (AnimationLoop, ManualScheduler) {
        let scheduler = ManualScheduler::new();
        let animation = AnimationLoop::start(Box::new(scheduler.clone()));
        (animation, scheduler)
    }

    #[test]
    fn manual_scheduler_hands_out_oldest_first() {
        let mut scheduler = ManualScheduler::new();
        let first = scheduler.request_frame();
        let second = scheduler.request_frame();
        let third = scheduler.request_frame();
        scheduler.cancel_frame(second);

        assert_eq!(scheduler.next_due(), Some(first));
        assert_eq!(scheduler.next_due(), Some(third));
        assert_eq!(scheduler.next_due(), None);
        assert_eq!(scheduler.requested_count(), 3);
        assert_eq!(scheduler.cancelled_count(), 1);
    }

    #[test]
    fn start_requests_one_frame() {
        let (animation, scheduler) = started();
        assert!(animation.is_running());
        assert_eq!(scheduler.due_count(), 1);
        assert_eq!(animation.pending(), Some(FrameRequest(1)));
    }

    #[test]
    fn each_tick_schedules_the_next() {
        let (mut animation, scheduler) = started();
        for n in 1..=5 {
            let request = scheduler.next_due().unwrap();
            assert!(animation.begin_tick(request));
            assert_eq!(scheduler.due_count(), 0);
            animation.finish_tick();
            assert_eq!(animation.ticks(), n);
            assert_eq!(scheduler.due_count(), 1);
        }
    }

    #[test]
    fn stale_and_reentrant_requests_rejected() {
        let (mut animation, scheduler) = started();
        let request = scheduler.next_due().unwrap();
        assert!(animation.begin_tick(request));
        assert!(!animation.begin_tick(request));
        animation.finish_tick();

        assert!(!animation.begin_tick(request));
        assert!(!animation.begin_tick(FrameRequest(999)));
        assert_eq!(animation.ticks(), 1);
    }

    #[test]
    fn cancel_withdraws_pending_and_stops_ticks() {
        let (mut animation, scheduler) = started();
        let request = animation.pending().unwrap();
        assert!(animation.cancel());
        assert!(!animation.cancel());

        assert_eq!(scheduler.due_count(), 0);
        assert_eq!(scheduler.cancelled_count(), 1);
        assert!(!animation.begin_tick(request));
        assert_eq!(animation.state(), LoopState::Cancelled);
    }

    #[test]
    fn cancel_inside_tick_prevents_reschedule() {
        let (mut animation, scheduler) = started();
        let request = scheduler.next_due().unwrap();
        assert!(animation.begin_tick(request));
        animation.cancel();
        animation.finish_tick();

        assert_eq!(scheduler.due_count(), 0);
        assert_eq!(scheduler.requested_count(), 1);
        assert_eq!(animation.pending(), None);
    }
}
