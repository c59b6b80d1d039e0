//! Adaptive scanner: sweeps and the schedule that keeps re-running them
//!
//! A [`Session`] is created by [`Session::start`] and consumed by
//! [`Session::stop`]. It owns every timer it schedules (keyed by id, with
//! the task the timer drives) and the mutation subscription, so tearing it
//! down cancels everything it started.

use crate::config::ScanSchedule;
use crate::core::{classify, same_color, StyleProperty};
use crate::error::DomError;
use crate::host::{Dom, Host, Mutation, TimerId, Wakeup};
use crate::time;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, trace};

/// What caused a sweep, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Activation,
    Backoff,
    Periodic,
    Navigation,
    InsertedFollowup,
}

/// Counters for one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Elements inspected
    pub visited: usize,
    /// Elements whose style could not be read
    pub skipped: usize,
    /// Elements that received at least one new inline value
    pub fixed: usize,
}

impl SweepStats {
    fn record(&mut self, result: Result<usize, DomError>) {
        self.visited += 1;
        match result {
            Ok(0) => {}
            Ok(_) => self.fixed += 1,
            Err(_) => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: SweepStats) {
        self.visited += other.visited;
        self.skipped += other.skipped;
        self.fixed += other.fixed;
    }
}

/// Classify `node` and write the overrides that differ from its inline style.
///
/// Returns the number of properties written.
pub fn fix_element<D: Dom>(dom: &mut D, node: &D::Node) -> Result<usize, DomError> {
    let ctx = dom.inspect(node).map_err(|e| {
        trace!(?node, error = %e, "Skipping element");
        e
    })?;
    let classification = classify(&ctx);

    let mut written = 0;
    for o in &classification.overrides {
        if let Some(current) = dom.inline_style(node, o.property) {
            if same_color(&current, o.value) {
                continue;
            }
        }
        dom.set_inline_important(node, o.property, o.value);
        written += 1;
    }
    if written > 0 {
        trace!(
            tag = %ctx.tag,
            class = %ctx.class_name,
            rule = ?classification.background_rule,
            written,
            "Element recolored"
        );
    }
    Ok(written)
}

/// One synchronous pass over every element in the document
pub fn sweep_all<D: Dom>(dom: &mut D) -> SweepStats {
    let mut stats = SweepStats::default();
    for node in dom.all_elements() {
        stats.record(fix_element(dom, &node));
    }
    stats
}

/// One synchronous pass over `root` and its descendants
pub fn sweep_tree<D: Dom>(dom: &mut D, root: &D::Node) -> SweepStats {
    let mut stats = SweepStats::default();
    stats.record(fix_element(dom, root));
    for node in dom.descendants(root) {
        stats.record(fix_element(dom, &node));
    }
    stats
}

/// Remove the four scanner-owned properties from every inline-styled element.
///
/// Returns the number of elements visited.
pub fn clear_overrides<D: Dom>(dom: &mut D) -> usize {
    let styled = dom.styled_elements();
    for node in &styled {
        for &property in StyleProperty::ALL {
            dom.remove_inline(node, property);
        }
    }
    styled.len()
}

enum Task<N> {
    PageSweep(Trigger),
    Periodic,
    InsertedFollowup(N),
    NavigationPoll,
}

/// Live timers and subscription of one activation
pub struct Session<N> {
    schedule: ScanSchedule,
    tasks: HashMap<TimerId, Task<N>>,
    periodic_runs: u32,
    last_location: String,
    observing: bool,
}

impl<N: Clone + PartialEq + fmt::Debug> Session<N> {
    /// Sweep the page now and schedule every follow-up
    pub fn start<H: Host<Node = N>>(host: &mut H, schedule: ScanSchedule) -> Self {
        let last_location = host.location();
        info!(location = %last_location, "Scanner starting");

        let mut session = Self {
            schedule,
            tasks: HashMap::new(),
            periodic_runs: 0,
            last_location,
            observing: false,
        };

        timed(Trigger::Activation, || sweep_all(host));

        for delay in session.schedule.initial_delays_ms.clone() {
            session.once(host, delay, Task::PageSweep(Trigger::Backoff));
        }
        if session.schedule.periodic_ticks > 0 {
            let id = host.set_interval(session.schedule.periodic_interval_ms);
            session.tasks.insert(id, Task::Periodic);
        }

        host.observe_mutations();
        session.observing = true;

        let id = host.set_interval(session.schedule.navigation_poll_ms);
        session.tasks.insert(id, Task::NavigationPoll);

        session
    }

    /// Cancel every timer, drop the subscription and restore inline styles
    pub fn stop<H: Host<Node = N>>(self, host: &mut H) {
        let cancelled = self.tasks.len();
        for id in self.tasks.keys() {
            host.clear_timer(*id);
        }
        if self.observing {
            host.disconnect_mutations();
        }
        let restored = clear_overrides(host);
        info!(cancelled, restored, "Scanner stopped");
    }

    pub fn handle<H: Host<Node = N>>(&mut self, host: &mut H, wakeup: Wakeup<N>) {
        match wakeup {
            Wakeup::Timer(id) => self.on_timer(host, id),
            Wakeup::Mutations(records) => self.on_mutations(host, records),
            Wakeup::DomReady => {}
        }
    }

    /// Timers this session still owns
    pub fn pending_timers(&self) -> usize {
        self.tasks.len()
    }

    pub fn owns(&self, id: TimerId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn periodic_runs(&self) -> u32 {
        self.periodic_runs
    }

    fn once<H: Host<Node = N>>(&mut self, host: &mut H, delay_ms: u32, task: Task<N>) {
        let id = host.set_timeout(delay_ms);
        self.tasks.insert(id, task);
    }

    fn on_timer<H: Host<Node = N>>(&mut self, host: &mut H, id: TimerId) {
        let Some(task) = self.tasks.remove(&id) else {
            trace!(%id, "Ignoring timer not owned by this session");
            return;
        };

        match task {
            Task::PageSweep(trigger) => {
                timed(trigger, || sweep_all(host));
            }
            Task::Periodic => {
                timed(Trigger::Periodic, || sweep_all(host));
                self.periodic_runs += 1;
                if self.periodic_runs >= self.schedule.periodic_ticks {
                    debug!(runs = self.periodic_runs, "Periodic sweeps done");
                    host.clear_timer(id);
                } else {
                    self.tasks.insert(id, Task::Periodic);
                }
            }
            Task::InsertedFollowup(root) => {
                timed(Trigger::InsertedFollowup, || sweep_tree(host, &root));
            }
            Task::NavigationPoll => {
                self.tasks.insert(id, Task::NavigationPoll);
                let location = host.location();
                if location != self.last_location {
                    info!(from = %self.last_location, to = %location, "Client-side navigation");
                    self.last_location = location;
                    for delay in self.schedule.navigation_delays_ms.clone() {
                        self.once(host, delay, Task::PageSweep(Trigger::Navigation));
                    }
                }
            }
        }
    }

    fn on_mutations<H: Host<Node = N>>(&mut self, host: &mut H, records: Vec<Mutation<N>>) {
        let mut stats = SweepStats::default();
        let mut inserted = 0usize;
        for record in records {
            match record {
                Mutation::Attribute(node) => {
                    let children = host.child_element_count(&node);
                    if children > 0 && children < self.schedule.attribute_subtree_limit {
                        stats.merge(sweep_tree(host, &node));
                    } else {
                        stats.record(fix_element(host, &node));
                    }
                }
                Mutation::Added(node) => {
                    inserted += 1;
                    stats.merge(sweep_tree(host, &node));
                    let delay = self.schedule.inserted_followup_ms;
                    self.once(host, delay, Task::InsertedFollowup(node));
                }
            }
        }
        if stats.fixed > 0 {
            debug!(
                inserted,
                visited = stats.visited,
                fixed = stats.fixed,
                skipped = stats.skipped,
                "Mutation sweep"
            );
        }
    }
}

fn timed(trigger: Trigger, sweep: impl FnOnce() -> SweepStats) -> SweepStats {
    let started = time::now_millis();
    let stats = sweep();
    debug!(
        ?trigger,
        visited = stats.visited,
        fixed = stats.fixed,
        skipped = stats.skipped,
        elapsed_ms = format!("{:.1}", time::now_millis() - started),
        "Sweep"
    );
    stats
}
