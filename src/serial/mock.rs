//! Scripted in-memory port driver.
//!
//! Records every open/close/write so tests can check wire ordering and that
//! no two handles or writes are ever live at the same time.

use std::collections::{HashSet, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::driver::{PortDriver, PortHandle};
use super::PortDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Opened(String),
    Closed(String),
    Wrote(String, Vec<u8>),
}

#[derive(Debug, Default)]
struct MockState {
    available: Vec<PortDescriptor>,
    list_fails: bool,
    denied: HashSet<String>,
    hang_on_open: bool,
    live: HashSet<String>,
    max_live: usize,
    write_delay: Duration,
    failing_writes: usize,
    in_flight: usize,
    max_in_flight: usize,
    reports: VecDeque<Vec<u8>>,
    events: Vec<MockEvent>,
}

/// Cloneable handle on a shared mock "bus"
#[derive(Debug, Clone, Default)]
pub struct MockPortDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockPortDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ports(paths: &[&str]) -> Self {
        let driver = Self::new();
        driver.lock().available = paths.iter().map(|p| PortDescriptor::new(*p)).collect();
        driver
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded history
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn deny(&self, path: &str) {
        self.lock().denied.insert(path.to_string());
    }

    pub fn set_list_fails(&self, fails: bool) {
        self.lock().list_fails = fails;
    }

    pub fn set_hang_on_open(&self, hang: bool) {
        self.lock().hang_on_open = hang;
    }

    pub fn set_write_delay(&self, delay: Duration) {
        self.lock().write_delay = delay;
    }

    /// Make the next `count` writes fail with a transport error
    pub fn fail_next_writes(&self, count: usize) {
        self.lock().failing_writes = count;
    }

    /// Queue a raw report for the next `read_line`
    pub fn push_report(&self, report: impl Into<Vec<u8>>) {
        self.lock().reports.push_back(report.into());
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.lock().events.clone()
    }

    /// Payloads written to the wire, in order
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                MockEvent::Wrote(_, bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn live_handles(&self) -> usize {
        self.lock().live.len()
    }

    pub fn max_live_handles(&self) -> usize {
        self.lock().max_live
    }

    pub fn max_concurrent_writes(&self) -> usize {
        self.lock().max_in_flight
    }
}

#[async_trait::async_trait]
impl PortDriver for MockPortDriver {
    async fn open(&self, path: &str, _baud_rate: u32) -> io::Result<Box<dyn PortHandle>> {
        let hang = {
            let state = self.lock();
            if state.denied.contains(path) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "Access denied"));
            }
            state.hang_on_open
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let mut state = self.lock();
        state.live.insert(path.to_string());
        state.max_live = state.max_live.max(state.live.len());
        state.events.push(MockEvent::Opened(path.to_string()));
        Ok(Box::new(MockPortHandle {
            path: path.to_string(),
            driver: self.clone(),
        }))
    }

    fn list(&self) -> io::Result<Vec<PortDescriptor>> {
        let state = self.lock();
        if state.list_fails {
            return Err(io::Error::new(io::ErrorKind::Other, "enumeration failed"));
        }
        Ok(state.available.clone())
    }
}

struct MockPortHandle {
    path: String,
    driver: MockPortDriver,
}

#[async_trait::async_trait]
impl PortHandle for MockPortHandle {
    async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let (delay, fail) = {
            let mut state = self.driver.lock();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            let fail = state.failing_writes > 0;
            if fail {
                state.failing_writes -= 1;
            }
            (state.write_delay, fail)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.driver.lock();
        state.in_flight -= 1;
        if fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"));
        }
        state.events.push(MockEvent::Wrote(self.path.clone(), bytes.to_vec()));
        Ok(())
    }

    async fn read_line(&mut self, _timeout: Duration) -> io::Result<Vec<u8>> {
        self.driver
            .lock()
            .reports
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "no report queued"))
    }

    async fn close(self: Box<Self>) -> io::Result<()> {
        let mut state = self.driver.lock();
        state.live.remove(&self.path);
        state.events.push(MockEvent::Closed(self.path.clone()));
        Ok(())
    }
}
