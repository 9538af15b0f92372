use landing_common::SurfaceSize;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum ResizeError {
    #[error("resize observation unsupported: {0}")]
    Unsupported(String),
}

#[derive(Debug, Default)]
struct Mailbox {
    latest: Option<SurfaceSize>,
    connected: bool,
    delivered: u64,
}

/// Receiving end for size notifications. Only the most recent size is
/// kept; earlier undelivered sizes are overwritten.
#[derive(Debug, Clone, Default)]
pub struct ResizeSink {
    mailbox: Rc<RefCell<Mailbox>>,
}

impl ResizeSink {
    /// Record a new content size. False when the reactor has unsubscribed
    /// or the size is empty.
    pub fn deliver(&self, size: SurfaceSize) -> bool {
        let mut mailbox = self.mailbox.borrow_mut();
        if !mailbox.connected {
            return false;
        }
        if size.is_empty() {
            tracing::debug!(%size, "zero-sized resize ignored");
            return false;
        }
        mailbox.latest = Some(size);
        mailbox.delivered += 1;
        true
    }

    pub fn is_connected(&self) -> bool {
        self.mailbox.borrow().connected
    }
}

/// Platform hook that reports container size changes to a sink.
pub trait ResizeObserver {
    /// Begin reporting. Fails when the platform cannot observe sizes.
    fn observe(&mut self, sink: ResizeSink) -> Result<(), ResizeError>;
    /// Stop reporting. No deliveries happen after this returns.
    fn disconnect(&mut self);
}

/// Coalesces container size notifications for the frame loop.
#[derive(Default)]
pub struct ResizeReactor {
    sink: ResizeSink,
    observer: Option<Box<dyn ResizeObserver>>,
}

impl ResizeReactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, mut observer: Box<dyn ResizeObserver>) -> Result<(), ResizeError> {
        self.unsubscribe();
        self.sink.mailbox.borrow_mut().connected = true;
        match observer.observe(self.sink.clone()) {
            Ok(()) => {
                self.observer = Some(observer);
                Ok(())
            }
            Err(error) => {
                self.sink.mailbox.borrow_mut().connected = false;
                Err(error)
            }
        }
    }

    /// Take the latest undelivered size, if any.
    pub fn take_latest(&self) -> Option<SurfaceSize> {
        self.sink.mailbox.borrow_mut().latest.take()
    }

    /// Stop observing and drop any size not yet taken.
    pub fn unsubscribe(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.disconnect();
        }
        let mut mailbox = self.sink.mailbox.borrow_mut();
        mailbox.connected = false;
        mailbox.latest = None;
    }

    pub fn is_active(&self) -> bool {
        self.observer.is_some() && self.sink.is_connected()
    }

    /// Sizes accepted since creation.
    pub fn delivered(&self) -> u64 {
        self.sink.mailbox.borrow().delivered
    }
}

/// Observer for platforms without size notifications.
#[derive(Debug, Default)]
pub struct NoResizeObserver;

impl ResizeObserver for NoResizeObserver {
    fn observe(&mut self, _sink: ResizeSink) -> Result<(), ResizeError> {
        Err(ResizeError::Unsupported(
            "no size notifications on this platform".into(),
        ))
    }

    fn disconnect(&mut self) {}
}

/// Observer fed by the caller's event loop.
///
/// Clones share state: the driver keeps one handle and calls `emit` when
/// the window reports a new size.
#[derive(Debug, Clone, Default)]
pub struct ResizeFeed {
    sink: Rc<RefCell<Option<ResizeSink>>>,
}

impl ResizeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a size. False when nobody is subscribed.
    pub fn emit(&self, size: SurfaceSize) -> bool {
        match self.sink.borrow().as_ref() {
            Some(sink) => sink.deliver(size),
            None => false,
        }
    }
}

impl ResizeObserver for ResizeFeed {
    fn observe(&mut self, sink: ResizeSink) -> Result<(), ResizeError> {
        *self.sink.borrow_mut() = Some(sink);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.sink.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_size_wins() {
        let feed = ResizeFeed::new();
        let mut reactor = ResizeReactor::new();
        reactor.subscribe(Box::new(feed.clone())).unwrap();

        assert!(feed.emit(SurfaceSize::new(1024, 768)));
        assert!(feed.emit(SurfaceSize::new(640, 480)));
        assert_eq!(reactor.take_latest(), Some(SurfaceSize::new(640, 480)));
        assert_eq!(reactor.take_latest(), None);
        assert_eq!(reactor.delivered(), 2);
    }

    #[test]
    fn zero_sizes_are_ignored() {
        let feed = ResizeFeed::new();
        let mut reactor = ResizeReactor::new();
        reactor.subscribe(Box::new(feed.clone())).unwrap();
        assert!(!feed.emit(SurfaceSize::new(0, 480)));
        assert_eq!(reactor.take_latest(), None);
    }

    #[test]
    fn nothing_delivered_after_unsubscribe() {
        let feed = ResizeFeed::new();
        let mut reactor = ResizeReactor::new();
        reactor.subscribe(Box::new(feed.clone())).unwrap();
        feed.emit(SurfaceSize::new(300, 200));
        reactor.unsubscribe();

        assert!(!reactor.is_active());
        assert_eq!(reactor.take_latest(), None);
        assert!(!feed.emit(SurfaceSize::new(100, 100)));
        assert_eq!(reactor.take_latest(), None);
    }

    #[test]
    fn stale_sink_clone_cannot_deliver() {
        let mut reactor = ResizeReactor::new();
        let mut feed = ResizeFeed::new();
        reactor.subscribe(Box::new(feed.clone())).unwrap();
        let sink = feed.sink.borrow().clone().unwrap();
        reactor.unsubscribe();
        feed.disconnect();
        assert!(!sink.deliver(SurfaceSize::new(10, 10)));
    }

    #[test]
    fn unsupported_platform_reports_error() {
        let mut reactor = ResizeReactor::new();
        let result = reactor.subscribe(Box::new(NoResizeObserver));
        assert!(matches!(result, Err(ResizeError::Unsupported(_))));
        assert!(!reactor.is_active());
    }
}
