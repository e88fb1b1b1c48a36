//! Version propagation over the coaching graph.
//!
//! The walk is a FIFO frontier seeded with the start user. Every dequeued
//! coach offers its class (itself plus its direct students) as one unit:
//! either the whole class is tagged or none of it is. Classes are taken
//! greedily in frontier order; a class that does not fit is skipped, never
//! revisited, and does not stop the walk. The frontier is extended with
//! `UserGraph::connected_coaches` whether or not the class was taken.
//!
//! How much budget a class consumes depends on `AccountingMode`, see
//! `infection_core::AccountingMode`.

use std::collections::VecDeque;

use infection_core::{
    AccountingMode, InfectionError, PropagationSettings, Result, SiteVersion, UserId,
};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::UserGraph;

/// Outcome of one propagation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    /// Users whose version was changed by this call, in tagging order.
    pub tagged: Vec<UserId>,
    /// Coaches whose class was taken.
    pub accepted_classes: Vec<UserId>,
    /// Coaches whose class did not fit.
    pub rejected_classes: Vec<UserId>,
    /// Distinct users dequeued and examined.
    pub visited: usize,
}

impl PropagationReport {
    pub fn count(&self) -> usize {
        self.tagged.len()
    }
}

/// A class priced against the current state of one walk.
struct ClassPlan {
    /// Users that would change version: untagged students, then the coach.
    to_tag: Vec<UserId>,
    /// Users not yet inside the accepted footprint.
    new_members: Vec<UserId>,
}

impl ClassPlan {
    fn cost(&self, mode: AccountingMode) -> usize {
        match mode {
            AccountingMode::Footprint => self.new_members.len(),
            AccountingMode::NewlyTagged => self.to_tag.len(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Propagator {
    settings: PropagationSettings,
}

impl Propagator {
    pub fn new(settings: PropagationSettings) -> Self {
        Self { settings }
    }

    pub fn with_accounting(mut self, accounting: AccountingMode) -> Self {
        self.settings.accounting = accounting;
        self
    }

    pub fn settings(&self) -> &PropagationSettings {
        &self.settings
    }

    /// Tag every user reachable from `start`.
    pub fn total(
        &self,
        graph: &mut UserGraph,
        start: UserId,
        tag: SiteVersion,
    ) -> Result<PropagationReport> {
        self.walk(graph, start, None, tag)
    }

    /// Tag as many classes reachable from `start` as fit in `capacity`.
    ///
    /// Fails with `InvalidArgument` when `capacity` is zero and with
    /// `UserNotFound` when `start` is not in `graph`; in both cases the graph
    /// is left untouched.
    pub fn limited(
        &self,
        graph: &mut UserGraph,
        start: UserId,
        capacity: usize,
        tag: SiteVersion,
    ) -> Result<PropagationReport> {
        if capacity < 1 {
            return Err(InfectionError::invalid_argument(format!(
                "capacity must be at least 1, got {}",
                capacity
            )));
        }
        self.walk(graph, start, Some(capacity), tag)
    }

    /// Propagate with the configured `default_capacity`, unbounded if unset.
    pub fn propagate(
        &self,
        graph: &mut UserGraph,
        start: UserId,
        tag: SiteVersion,
    ) -> Result<PropagationReport> {
        match self.settings.default_capacity {
            Some(capacity) => self.limited(graph, start, capacity, tag),
            None => self.total(graph, start, tag),
        }
    }

    fn walk(
        &self,
        graph: &mut UserGraph,
        start: UserId,
        capacity: Option<usize>,
        tag: SiteVersion,
    ) -> Result<PropagationReport> {
        graph.user(start)?;

        let mode = self.settings.accounting;
        let mut queue = VecDeque::from([start]);
        let mut visited: FxHashSet<UserId> = FxHashSet::default();
        let mut footprint: FxHashSet<UserId> = FxHashSet::default();
        let mut report = PropagationReport::default();

        while let Some(current) = queue.pop_front() {
            if visited.contains(&current) {
                continue;
            }

            if graph.is_coach(current)? {
                let plan = Self::price_class(graph, current, tag, &footprint)?;
                let cost = plan.cost(mode);
                let used = match mode {
                    AccountingMode::Footprint => footprint.len(),
                    AccountingMode::NewlyTagged => report.tagged.len(),
                };
                let fits = capacity.map_or(true, |cap| cost <= cap.saturating_sub(used));

                if fits {
                    debug!(coach = %current, cost, used, "class accepted");
                    for &user in &plan.to_tag {
                        graph.set_site_version(user, tag)?;
                    }
                    footprint.extend(plan.new_members);
                    report.tagged.extend(plan.to_tag);
                    report.accepted_classes.push(current);
                } else {
                    debug!(coach = %current, cost, used, ?capacity, "class does not fit");
                    report.rejected_classes.push(current);
                }
            } else {
                trace!(user = %current, "not a coach, expanding only");
            }

            visited.insert(current);
            report.visited += 1;
            queue.extend(graph.connected_coaches(current)?);
        }

        info!(
            start = %start,
            %tag,
            ?capacity,
            accounting = %mode,
            tagged = report.tagged.len(),
            accepted = report.accepted_classes.len(),
            rejected = report.rejected_classes.len(),
            "propagation finished"
        );
        Ok(report)
    }

    fn price_class(
        graph: &UserGraph,
        coach: UserId,
        tag: SiteVersion,
        footprint: &FxHashSet<UserId>,
    ) -> Result<ClassPlan> {
        let user = graph.user(coach)?;
        let mut seen: FxHashSet<UserId> = FxHashSet::default();
        let mut to_tag = Vec::new();
        let mut new_members = Vec::new();

        for &student in user.students() {
            if !seen.insert(student) {
                continue;
            }
            if graph.site_version(student)? != tag {
                to_tag.push(student);
            }
            if !footprint.contains(&student) {
                new_members.push(student);
            }
        }
        if seen.insert(coach) {
            if user.site_version() != tag {
                to_tag.push(coach);
            }
            if !footprint.contains(&coach) {
                new_members.push(coach);
            }
        }

        Ok(ClassPlan {
            to_tag,
            new_members,
        })
    }
}

/// Tag every user connected to `start` with `tag` and return how many
/// changed. Uses the default accounting mode.
pub fn total_propagate(graph: &mut UserGraph, start: UserId, tag: SiteVersion) -> Result<usize> {
    Ok(Propagator::default().total(graph, start, tag)?.count())
}

/// Tag whole classes reachable from `start`, greedily in frontier order,
/// while they fit in `capacity`. Returns how many users changed.
pub fn limited_propagate(
    graph: &mut UserGraph,
    start: UserId,
    capacity: usize,
    tag: SiteVersion,
) -> Result<usize> {
    Ok(Propagator::default()
        .limited(graph, start, capacity, tag)?
        .count())
}
