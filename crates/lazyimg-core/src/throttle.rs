//! Rate limiting for the shared scroll listener.

use web_time::{Duration, Instant};

/// Edges of a call burst on which a throttled function runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleEdges {
    pub leading: bool,
    pub trailing: bool,
}

impl ThrottleEdges {
    /// Only once the interval after the first call has elapsed.
    pub const TRAILING: Self = Self {
        leading: false,
        trailing: true,
    };
    /// Immediately, and again at the end of the interval if more calls came in.
    pub const LEADING_AND_TRAILING: Self = Self {
        leading: true,
        trailing: true,
    };
}

impl Default for ThrottleEdges {
    fn default() -> Self {
        Self::TRAILING
    }
}

/// What the caller should do with a throttled call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleAction {
    /// Run the throttled function now.
    Invoke,
    /// Arm a timer for the given delay and call [`Throttle::flush`] when it fires.
    Schedule(Duration),
    /// Nothing to do; a timer is already armed or the call is dropped.
    Skip,
}

/// Timer-less throttle state machine.
///
/// The owner supplies the clock and the timer: [`Throttle::call`] tells it
/// whether to run now or arm a timer, and [`Throttle::flush`] is called when
/// that timer fires. At most one invocation happens per `wait` interval and,
/// with a trailing edge, the last call of a burst is always delivered.
#[derive(Clone, Debug)]
pub struct Throttle {
    wait: Duration,
    edges: ThrottleEdges,
    last_invoke: Option<Instant>,
    trailing_pending: bool,
    timer_armed: bool,
}

impl Throttle {
    pub fn new(wait: Duration, edges: ThrottleEdges) -> Self {
        Self {
            wait,
            edges,
            last_invoke: None,
            trailing_pending: false,
            timer_armed: false,
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    pub fn is_timer_armed(&self) -> bool {
        self.timer_armed
    }

    pub fn call(&mut self, now: Instant) -> ThrottleAction {
        let since_last = self
            .last_invoke
            .map(|last| now.saturating_duration_since(last));

        if self.edges.leading && !self.timer_armed {
            match since_last {
                None => return self.invoke(now),
                Some(elapsed) if elapsed >= self.wait => return self.invoke(now),
                _ => {}
            }
        }

        if !self.edges.trailing {
            return ThrottleAction::Skip;
        }

        self.trailing_pending = true;
        if self.timer_armed {
            return ThrottleAction::Skip;
        }
        self.timer_armed = true;

        let delay = match since_last {
            Some(elapsed) if self.edges.leading => self.wait.saturating_sub(elapsed),
            _ => self.wait,
        };
        ThrottleAction::Schedule(delay)
    }

    /// Handles the armed timer firing. Returns `true` if the throttled
    /// function should run now.
    pub fn flush(&mut self, now: Instant) -> bool {
        self.timer_armed = false;
        if !self.trailing_pending {
            return false;
        }
        self.trailing_pending = false;
        self.last_invoke = Some(now);
        true
    }

    /// Forgets the pending trailing call. The owner clears its own timer.
    pub fn cancel(&mut self) {
        self.timer_armed = false;
        self.trailing_pending = false;
    }

    fn invoke(&mut self, now: Instant) -> ThrottleAction {
        self.last_invoke = Some(now);
        ThrottleAction::Invoke
    }
}
