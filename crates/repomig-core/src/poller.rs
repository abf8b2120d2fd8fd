use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    token: u64,
}

#[derive(Debug)]
pub struct ProgressPoller {
    interval: Duration,
    running: bool,
    next_due: Option<Instant>,
    in_flight: Option<u64>,
    next_token: u64,
}

impl ProgressPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: false,
            next_due: None,
            in_flight: None,
            next_token: 1,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        self.in_flight = None;
        self.next_due = Some(now);
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.next_due = None;
        self.in_flight = None;
    }

    pub fn begin_fetch(&mut self, now: Instant) -> Option<FetchTicket> {
        if !self.running || self.in_flight.is_some() {
            if self.in_flight.is_some() {
                log::debug!("skipping poll tick: previous status fetch still in flight");
            }
            return None;
        }

        let due = self.next_due?;
        if now < due {
            return None;
        }

        let token = self.next_token;
        self.next_token += 1;
        self.in_flight = Some(token);
        Some(FetchTicket { token })
    }

    pub fn complete_fetch(&mut self, ticket: FetchTicket, now: Instant) -> bool {
        if !self.running || self.in_flight != Some(ticket.token) {
            return false;
        }
        self.in_flight = None;
        self.next_due = Some(now + self.interval);
        true
    }
}
