//! 执行引擎：选择、故事脚本与两阶段原子组发射。
use std::collections::VecDeque;

use log::debug;

use crate::exec::strategy::{Deterministic, SelectionStrategy};
use crate::net::structure::{ArcKind, Marking, NetState, NodeRef};
use crate::net::{Net, ReadyGroups, TransitionId};

/// The bus group fired by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredGroup {
    pub key: String,
    pub members: Vec<TransitionId>,
}

/// Drives one net instance step by step.
///
/// The topology is borrowed immutably; the engine owns the run state
/// (marking + fired counts), the remaining story and the selection
/// strategy. A fresh engine always starts from the template's initial
/// marking with every fired count at zero.
pub struct Execution<'n> {
    net: &'n Net,
    state: NetState,
    story: VecDeque<String>,
    strategy: Box<dyn SelectionStrategy>,
}

impl<'n> Execution<'n> {
    pub fn new(net: &'n Net) -> Self {
        Self::with_strategy(net, Box::new(Deterministic))
    }

    pub fn with_strategy(net: &'n Net, strategy: Box<dyn SelectionStrategy>) -> Self {
        Self {
            net,
            state: net.initial_state(),
            story: VecDeque::new(),
            strategy,
        }
    }

    /// Queue a story: an ordered list of labels consumed one at a time.
    /// While any label is pending, automatic selection is suspended.
    pub fn with_story<I, S>(mut self, story: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.story = story.into_iter().map(Into::into).collect();
        self
    }

    pub fn net(&self) -> &'n Net {
        self.net
    }

    pub fn state(&self) -> &NetState {
        &self.state
    }

    pub fn marking(&self) -> &Marking {
        self.state.marking()
    }

    /// Labels of the story not yet consumed.
    pub fn remaining_story(&self) -> impl Iterator<Item = &str> {
        self.story.iter().map(String::as_str)
    }

    /// Ready bus groups under the live state, in first-seen order.
    pub fn ready_groups(&self) -> ReadyGroups {
        self.net.ready_groups(&self.state)
    }

    /// Perform one selection + firing cycle.
    ///
    /// Returns the fired group, or `None` when nothing fired: pending
    /// story label unready or unknown, or no ready group chosen. "No
    /// firing" is not an error; the caller decides whether to stop.
    pub fn step(&mut self) -> Option<FiredGroup> {
        let group = self.select()?;
        self.fire_group(&group.members);
        debug!("fired group '{}' ({} member(s))", group.key, group.members.len());
        Some(group)
    }

    fn select(&mut self) -> Option<FiredGroup> {
        if let Some(label) = self.story.front() {
            let Some(members) = self.net.group(label) else {
                debug!("story label '{label}' matches no transitions; no firing");
                return None;
            };
            if !self.net.is_group_ready(members, &self.state) {
                debug!("story label '{label}' is not ready; no firing");
                return None;
            }
            let members = members.to_vec();
            let key = self.story.pop_front().unwrap_or_default();
            return Some(FiredGroup { key, members });
        }

        let ready = self.ready_groups();
        let key = self.strategy.select(&ready)?;
        let members = ready.get(&key)?.clone();
        Some(FiredGroup { key, members })
    }

    /// Repeat [`Execution::step`] until nothing fires or the iteration
    /// budget runs out; returns the number of completed steps. Cyclic
    /// firing is legal, so the budget is the only termination guard.
    pub fn run(&mut self, iterations: usize) -> usize {
        self.run_with(iterations, |_, _| {})
    }

    /// Like [`Execution::run`], reporting every firing to `on_fire` with
    /// its 1-based step index.
    pub fn run_with<F>(&mut self, iterations: usize, mut on_fire: F) -> usize
    where
        F: FnMut(usize, &FiredGroup),
    {
        let mut completed = 0;
        for i in 0..iterations {
            debug!("attempting execution step {i}");
            match self.step() {
                Some(group) => {
                    completed += 1;
                    on_fire(completed, &group);
                }
                None => {
                    debug!("no firing at step {i}; stopping");
                    break;
                }
            }
        }
        completed
    }

    /// Fire a bus group atomically.
    ///
    /// Phase 1 consumes: per member, every enabler-input source is
    /// cleared and the member's fired count incremented. Phase 2
    /// produces: per member, every enabler-output target is set and every
    /// reset-output target cleared. The split keeps catalyst places
    /// (enabler in and out of the same group) unchanged across the step.
    pub fn fire_group(&mut self, members: &[TransitionId]) {
        for &member in members {
            for &arc_id in self.net.transition(member).inputs() {
                let arc = self.net.arc(arc_id);
                if arc.kind == ArcKind::Enabler {
                    if let NodeRef::Place(place) = arc.source {
                        self.state.marking.set(place, false);
                    }
                }
            }
            self.state.fired[member] += 1;
        }

        for &member in members {
            for &arc_id in self.net.transition(member).outputs() {
                let arc = self.net.arc(arc_id);
                let NodeRef::Place(place) = arc.target else {
                    continue;
                };
                match arc.kind {
                    ArcKind::Enabler => self.state.marking.set(place, true),
                    ArcKind::Reset => self.state.marking.set(place, false),
                    ArcKind::Inhibitor => {}
                }
            }
        }
    }

    /// Restore every place's marking to the given snapshot by direct
    /// assignment, without re-simulation. Fired counts are run-scoped and
    /// stay untouched.
    pub fn rewind(&mut self, marking: &Marking) {
        self.state.marking = marking.clone();
    }
}
