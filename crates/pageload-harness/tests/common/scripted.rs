//! In-memory page driver with scripted loads

use pageload_harness::driver::PageDriver;
use pageload_harness::error::{PerfError, Result};
use pageload_harness::evaluate::ResourceSnapshot;
use pageload_harness::timing::{MetricRecord, RawNavigationTiming, TimingSource};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Outcome of one scripted navigation
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Load {
    /// Navigation succeeds and exposes this timing
    Timing(MetricRecord),
    /// Navigation succeeds but the page has no timing data
    NoTiming,
    /// Navigation fails
    Fail(String),
}

/// One driver call, in the order the driver saw it
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum Call {
    Clear,
    Navigate(String),
    Settle(Duration),
    Timing,
}

#[derive(Default)]
struct State {
    loads: HashMap<String, VecDeque<Load>>,
    current: Option<(String, Load)>,
    navigations: Vec<String>,
    cookie_clears: usize,
    resources: Option<ResourceSnapshot>,
    calls: Vec<Call>,
}

/// Replays queued loads per URL.
///
/// A URL with no queued load left fails to navigate, unless a resource
/// snapshot is scripted: then it loads without timing data, which is enough
/// for a budget snapshot.
#[derive(Default)]
pub struct ScriptedDriver {
    state: Mutex<State>,
}

#[allow(dead_code)]
impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loads(self, url: &str, loads: impl IntoIterator<Item = Load>) -> Self {
        self.state
            .lock()
            .unwrap()
            .loads
            .entry(url.to_string())
            .or_default()
            .extend(loads);
        self
    }

    /// Queue loads with the given `load_complete` values and fixed other metrics
    pub fn with_load_times(self, url: &str, load_times: &[f64]) -> Self {
        let loads: Vec<Load> = load_times.iter().map(|&v| Load::Timing(record(v))).collect();
        self.with_loads(url, loads)
    }

    pub fn with_resources(self, snapshot: ResourceSnapshot) -> Self {
        self.state.lock().unwrap().resources = Some(snapshot);
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn cookie_clears(&self) -> usize {
        self.state.lock().unwrap().cookie_clears
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    fn current_url(&self) -> String {
        self.state
            .lock()
            .unwrap()
            .current
            .as_ref()
            .map(|(url, _)| url.clone())
            .unwrap_or_default()
    }

    fn snapshot(&self) -> Result<ResourceSnapshot> {
        let url = self.current_url();
        self.state
            .lock()
            .unwrap()
            .resources
            .ok_or_else(|| PerfError::collection(url, "resource timing unavailable"))
    }
}

/// A record with fast fixed TTFB / DOM figures and the given load time
#[allow(dead_code)]
pub fn record(load_complete: f64) -> MetricRecord {
    MetricRecord::new(20.0, 100.0, 120.0, load_complete)
}

impl PageDriver for ScriptedDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        state.calls.push(Call::Navigate(url.to_string()));
        let load = match state.loads.get_mut(url).and_then(|q| q.pop_front()) {
            Some(load) => load,
            None if state.resources.is_some() => Load::NoTiming,
            None => return Err(PerfError::collection(url, "net::ERR_CONNECTION_REFUSED")),
        };
        if let Load::Fail(reason) = &load {
            return Err(PerfError::collection(url, reason));
        }
        state.current = Some((url.to_string(), load));
        Ok(())
    }

    async fn clear_cookies(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.cookie_clears += 1;
        state.calls.push(Call::Clear);
        Ok(())
    }

    async fn navigation_timing(&self) -> Result<Option<RawNavigationTiming>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Timing);
        Ok(match &state.current {
            Some((_, Load::Timing(r))) => Some(RawNavigationTiming {
                source: TimingSource::Navigation,
                origin: 1000.0,
                response_start: 1000.0 + r.time_to_first_byte,
                dom_interactive: 1000.0 + r.dom_interactive,
                dom_content_loaded_event_end: 1000.0 + r.dom_content_loaded,
                load_event_end: 1000.0 + r.load_complete,
            }),
            _ => None,
        })
    }

    async fn resource_count(&self) -> Result<u64> {
        Ok(self.snapshot()?.resource_count)
    }

    async fn transfer_bytes(&self) -> Result<u64> {
        Ok(self.snapshot()?.transfer_bytes)
    }

    async fn dom_node_count(&self) -> Result<u64> {
        Ok(self.snapshot()?.dom_nodes)
    }

    async fn settle(&self, delay: Duration) {
        self.state.lock().unwrap().calls.push(Call::Settle(delay));
    }
}
