//! 可达标识图的深度优先探索：状态去重、回溯与死锁检测。
use std::time::Instant;

use indexmap::IndexMap;
use log::{debug, info};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::exec::Execution;
use crate::net::structure::Marking;
use crate::report::{AnalysisReport, DeadlockState};

/// Outgoing edge of a state, keyed by group label.
///
/// The two cases keep "not yet explored" distinct from "explored, leads
/// to that state"; there is no nullable sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSlot {
    Unexplored,
    Visited(NodeIndex),
}

/// One deduplicated marking in the state space.
///
/// The edge map is fixed at the moment the state is created: it holds one
/// slot per bus group that was ready against this marking, in first-seen
/// order, and is never recomputed. A state created with an empty edge map
/// is a deadlock.
#[derive(Debug, Clone)]
pub struct StateNode {
    pub sid: String,
    pub marking: Marking,
    pub edges: IndexMap<String, EdgeSlot>,
}

impl StateNode {
    /// First edge still unexplored, if any.
    pub fn first_unexplored(&self) -> Option<&str> {
        self.edges
            .iter()
            .find(|(_, slot)| matches!(slot, EdgeSlot::Unexplored))
            .map(|(key, _)| key.as_str())
    }

    pub fn is_deadlock(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Label on a state-graph edge: the bus group that was fired.
#[derive(Debug, Clone)]
pub struct StateEdge {
    pub label: String,
}

/// One depth-first branch: the visited states and the labels fired
/// between consecutive states. Backtracking forks a new record by
/// truncating an existing one; old records stay registered.
#[derive(Debug, Clone)]
pub struct PathRecord {
    pub id: String,
    pub steps: Vec<NodeIndex>,
    pub labels: Vec<String>,
}

impl PathRecord {
    /// Clone this path truncated at `upto` (the step index kept last).
    fn fork(&self, id: String, upto: usize) -> Self {
        Self {
            id,
            steps: self.steps[..=upto].to_vec(),
            labels: self.labels[..upto].to_vec(),
        }
    }
}

/// Exploration bounds. `state_limit: None` means unbounded; hitting the
/// cap stops exploration with an explicit `truncated` flag, never a
/// spurious claim of completeness.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub state_limit: Option<usize>,
}

/// Depth-first explorer of the reachable marking graph.
///
/// Drives the injected engine exhaustively: fires groups physically,
/// deduplicates the resulting markings, and rewinds the engine's marking
/// when a branch is exhausted. Iterative, never recursive.
pub struct Analysis<'n> {
    exec: Execution<'n>,
    graph: StableGraph<StateNode, StateEdge>,
    markings: FxHashMap<Marking, NodeIndex>,
    deadlocks: FxHashSet<NodeIndex>,
    paths: Vec<PathRecord>,
    current: NodeIndex,
    current_path: usize,
    truncated: bool,
}

impl<'n> Analysis<'n> {
    /// Roots the state space at the engine's current marking.
    pub fn new(exec: Execution<'n>) -> Self {
        let mut analysis = Self {
            exec,
            graph: StableGraph::new(),
            markings: FxHashMap::default(),
            deadlocks: FxHashSet::default(),
            paths: Vec::new(),
            current: NodeIndex::end(),
            current_path: 0,
            truncated: false,
        };
        let root = analysis.create_state(analysis.exec.marking().clone());
        analysis.paths.push(PathRecord {
            id: "path0".to_string(),
            steps: vec![root],
            labels: Vec::new(),
        });
        analysis.current = root;
        analysis
    }

    /// Explore until no branch has an unexplored label left, or the state
    /// budget is exhausted.
    pub fn run(&mut self, config: &AnalysisConfig) -> AnalysisReport {
        let start = Instant::now();
        while self.step(config) {}
        let elapsed = start.elapsed();

        info!(
            "analysis finished: {} state(s), {} path(s), {} deadlock(s) in {:?}{}",
            self.graph.node_count(),
            self.paths.len(),
            self.deadlocks.len(),
            elapsed,
            if self.truncated { " (truncated)" } else { "" },
        );

        AnalysisReport {
            state_count: self.graph.node_count(),
            path_count: self.paths.len(),
            deadlock_states: self.deadlock_states(),
            analysis_time: elapsed,
            truncated: self.truncated,
        }
    }

    /// One exploration move: fire the first unexplored label of the
    /// current state, backtracking along the current path first if the
    /// current state is exhausted. Returns false when the branch
    /// terminates or the budget is hit.
    fn step(&mut self, config: &AnalysisConfig) -> bool {
        let (origin, label) = match self.graph[self.current].first_unexplored() {
            Some(label) => (self.current, label.to_string()),
            None => match self.backtrack() {
                Some(found) => found,
                None => return false,
            },
        };

        let Some(members) = self.exec.net().group(&label).map(|m| m.to_vec()) else {
            // edge labels come from the net's own group keys
            return false;
        };
        self.exec.fire_group(&members);
        let marking = self.exec.marking().clone();

        let target = match self.markings.get(&marking) {
            Some(&idx) => idx,
            None => {
                if let Some(limit) = config.state_limit {
                    if self.graph.node_count() >= limit {
                        debug!("state budget of {limit} exhausted; stopping exploration");
                        self.truncated = true;
                        return false;
                    }
                }
                self.create_state(marking)
            }
        };

        if let Some(slot) = self.graph[origin].edges.get_mut(&label) {
            *slot = EdgeSlot::Visited(target);
        }
        self.graph.add_edge(origin, target, StateEdge { label: label.clone() });

        let path = &mut self.paths[self.current_path];
        path.steps.push(target);
        path.labels.push(label);
        self.current = target;
        true
    }

    /// Scan the current path from its most recent step backward for the
    /// nearest state with an unexplored label; rewind the engine to that
    /// state's stored marking and fork the path there.
    fn backtrack(&mut self) -> Option<(NodeIndex, String)> {
        let path = &self.paths[self.current_path];
        let mut found = None;
        for i in (0..path.steps.len().saturating_sub(1)).rev() {
            let state = path.steps[i];
            if let Some(label) = self.graph[state].first_unexplored() {
                found = Some((i, state, label.to_string()));
                break;
            }
        }
        let (index, state, label) = found?;

        let marking = self.graph[state].marking.clone();
        self.exec.rewind(&marking);

        let fork = self.paths[self.current_path]
            .fork(format!("path{}", self.paths.len()), index);
        debug!("backtracked to {} as {}", self.graph[state].sid, fork.id);
        self.paths.push(fork);
        self.current_path = self.paths.len() - 1;
        self.current = state;
        Some((state, label))
    }

    /// Register a previously unseen marking. The ready-label set is
    /// evaluated here, against the engine's live state, and fixed for the
    /// lifetime of the state. Callers must only invoke this while the
    /// engine's marking equals `marking`.
    fn create_state(&mut self, marking: Marking) -> NodeIndex {
        let edges: IndexMap<String, EdgeSlot> = self
            .exec
            .ready_groups()
            .into_keys()
            .map(|key| (key, EdgeSlot::Unexplored))
            .collect();
        let sid = format!("s{}", self.graph.node_count());
        let deadlock = edges.is_empty();
        debug!("new state {sid} with {} outgoing label(s)", edges.len());

        let idx = self.graph.add_node(StateNode {
            sid,
            marking: marking.clone(),
            edges,
        });
        self.markings.insert(marking, idx);
        if deadlock {
            self.deadlocks.insert(idx);
        }
        idx
    }

    fn deadlock_states(&self) -> Vec<DeadlockState> {
        self.graph
            .node_indices()
            .filter(|idx| self.deadlocks.contains(idx))
            .map(|idx| {
                let node = &self.graph[idx];
                DeadlockState {
                    state_id: node.sid.clone(),
                    marking: self.exec.net().marking_pairs(&node.marking),
                }
            })
            .collect()
    }

    pub fn graph(&self) -> &StableGraph<StateNode, StateEdge> {
        &self.graph
    }

    pub fn state(&self, idx: NodeIndex) -> &StateNode {
        &self.graph[idx]
    }

    pub fn paths(&self) -> &[PathRecord] {
        &self.paths
    }

    pub fn contains_marking(&self, marking: &Marking) -> bool {
        self.markings.contains_key(marking)
    }

    /// Edges still unexplored across the whole graph. Non-zero after a
    /// completed run means some states' labels became unreachable to the
    /// path-local backtracking (or the budget cut exploration short).
    pub fn unexplored_edges(&self) -> usize {
        self.graph
            .node_weights()
            .map(|node| {
                node.edges
                    .values()
                    .filter(|slot| matches!(slot, EdgeSlot::Unexplored))
                    .count()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::structure::{ArcSpec, Endpoint, PlaceSpec, TransitionSpec};
    use crate::net::{generate, Net, PlaceId};

    fn analyze(net: &Net) -> (AnalysisReport, Analysis<'_>) {
        let mut analysis = Analysis::new(Execution::new(net));
        let report = analysis.run(&AnalysisConfig::default());
        (report, analysis)
    }

    /// `p1(true) -> t1 -> p2 -> t2 -> p3`
    fn chain() -> Net {
        Net::new(
            vec![
                PlaceSpec::new("p1", true),
                PlaceSpec::new("p2", false),
                PlaceSpec::new("p3", false),
            ],
            vec![TransitionSpec::new("t1"), TransitionSpec::new("t2")],
            vec![
                ArcSpec::enabler(Endpoint::place(0), Endpoint::transition(0)),
                ArcSpec::enabler(Endpoint::transition(0), Endpoint::place(1)),
                ArcSpec::enabler(Endpoint::place(1), Endpoint::transition(1)),
                ArcSpec::enabler(Endpoint::transition(1), Endpoint::place(2)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn linear_chain_has_three_states_and_one_deadlock() {
        let _ = env_logger::builder().is_test(true).try_init();
        let net = chain();
        let (report, analysis) = analyze(&net);

        assert_eq!(report.state_count, 3);
        assert_eq!(report.deadlock_states.len(), 1);
        assert!(!report.truncated);
        assert_eq!(analysis.unexplored_edges(), 0);

        // the deadlock is the state where p3 is the only marked place
        let deadlock = &report.deadlock_states[0];
        assert_eq!(
            deadlock.marking,
            vec![
                ("p1".to_string(), false),
                ("p2".to_string(), false),
                ("p3".to_string(), true),
            ]
        );
    }

    #[test]
    fn conflict_fork_explores_both_branches_via_backtracking() {
        // p1 feeds both t1 and t2; consuming p1 either way deadlocks
        let net = Net::new(
            vec![
                PlaceSpec::new("p1", true),
                PlaceSpec::new("out1", false),
                PlaceSpec::new("out2", false),
            ],
            vec![TransitionSpec::new("t1"), TransitionSpec::new("t2")],
            vec![
                ArcSpec::enabler(Endpoint::place(0), Endpoint::transition(0)),
                ArcSpec::enabler(Endpoint::transition(0), Endpoint::place(1)),
                ArcSpec::enabler(Endpoint::place(0), Endpoint::transition(1)),
                ArcSpec::enabler(Endpoint::transition(1), Endpoint::place(2)),
            ],
        )
        .unwrap();

        let (report, analysis) = analyze(&net);
        assert_eq!(report.state_count, 3);
        assert_eq!(report.path_count, 2);
        assert_eq!(report.deadlock_states.len(), 2);
        assert_eq!(analysis.unexplored_edges(), 0);

        // both branch targets were reached
        let initial = net.initial_state().marking().clone();
        assert!(analysis.contains_marking(&initial));

        let mut out1 = initial.clone();
        out1.set(PlaceId::new(0), false);
        out1.set(PlaceId::new(1), true);
        assert!(analysis.contains_marking(&out1));

        let mut out2 = initial.clone();
        out2.set(PlaceId::new(0), false);
        out2.set(PlaceId::new(2), true);
        assert!(analysis.contains_marking(&out2));
    }

    #[test]
    fn cyclic_net_terminates_without_deadlocks() {
        // p1 -> t1 -> p2 -> t2 -> p1, a two-state loop
        let net = Net::new(
            vec![PlaceSpec::new("p1", true), PlaceSpec::new("p2", false)],
            vec![TransitionSpec::new("t1"), TransitionSpec::new("t2")],
            vec![
                ArcSpec::enabler(Endpoint::place(0), Endpoint::transition(0)),
                ArcSpec::enabler(Endpoint::transition(0), Endpoint::place(1)),
                ArcSpec::enabler(Endpoint::place(1), Endpoint::transition(1)),
                ArcSpec::enabler(Endpoint::transition(1), Endpoint::place(0)),
            ],
        )
        .unwrap();

        let (report, analysis) = analyze(&net);
        assert_eq!(report.state_count, 2);
        assert!(report.deadlock_states.is_empty());
        assert!(!report.truncated);
        // the cycle edge points back onto the path; every slot is visited
        assert_eq!(analysis.unexplored_edges(), 0);
    }

    #[test]
    fn states_are_deduplicated_by_marking() {
        // two different firing orders converge on the same marking
        let net = Net::new(
            vec![
                PlaceSpec::new("a", true),
                PlaceSpec::new("b", true),
                PlaceSpec::new("a2", false),
                PlaceSpec::new("b2", false),
            ],
            vec![TransitionSpec::new("ta"), TransitionSpec::new("tb")],
            vec![
                ArcSpec::enabler(Endpoint::place(0), Endpoint::transition(0)),
                ArcSpec::enabler(Endpoint::transition(0), Endpoint::place(2)),
                ArcSpec::enabler(Endpoint::place(1), Endpoint::transition(1)),
                ArcSpec::enabler(Endpoint::transition(1), Endpoint::place(3)),
            ],
        )
        .unwrap();

        let (report, analysis) = analyze(&net);
        // diamond: {a,b}, {a2,b}, {a,b2}, {a2,b2} — the join is shared
        assert_eq!(report.state_count, 4);
        assert_eq!(analysis.unexplored_edges(), 0);

        // no two registered states share a marking by construction of the
        // dedup table; spot-check via the graph
        let mut seen = std::collections::HashSet::new();
        for node in analysis.graph().node_weights() {
            assert!(seen.insert(net.marking_to_string(&node.marking)));
        }
    }

    #[test]
    fn fire_once_sources_appear_only_at_the_root() {
        // a source transition seeds the net, then a normal step follows
        let net = Net::new(
            vec![PlaceSpec::new("p1", false), PlaceSpec::new("p2", false)],
            vec![TransitionSpec::new("seed"), TransitionSpec::new("move")],
            vec![
                ArcSpec::enabler(Endpoint::transition(0), Endpoint::place(0)),
                ArcSpec::enabler(Endpoint::place(0), Endpoint::transition(1)),
                ArcSpec::enabler(Endpoint::transition(1), Endpoint::place(1)),
            ],
        )
        .unwrap();

        let (report, analysis) = analyze(&net);
        assert_eq!(report.state_count, 3);
        assert_eq!(report.deadlock_states.len(), 1);
        // the root offers the source; no later state does
        let root = analysis.paths()[0].steps[0];
        assert!(analysis.state(root).edges.contains_key("seed"));
        assert_eq!(analysis.unexplored_edges(), 0);
    }

    #[test]
    fn deadlock_definition_is_empty_edge_set_at_creation() {
        let net = chain();
        let (_, analysis) = analyze(&net);
        for node in analysis.graph().node_weights() {
            assert_eq!(node.is_deadlock(), node.edges.is_empty());
        }
    }

    #[test]
    fn state_budget_truncates_and_flags() {
        let (places, transitions, arcs) = generate::serial(8);
        let net = Net::new(places, transitions, arcs).unwrap();

        let mut analysis = Analysis::new(Execution::new(&net));
        let report = analysis.run(&AnalysisConfig {
            state_limit: Some(3),
        });

        assert!(report.truncated);
        assert_eq!(report.state_count, 3);
    }

    #[test]
    fn generated_serial_topology_reaches_n_plus_one_states() {
        let (places, transitions, arcs) = generate::serial(6);
        let net = Net::new(places, transitions, arcs).unwrap();
        let (report, _) = analyze(&net);
        assert_eq!(report.state_count, 7);
        assert_eq!(report.path_count, 1);
        assert_eq!(report.deadlock_states.len(), 1);
    }

    #[test]
    fn generated_fork_topology_deadlocks_at_every_leaf() {
        let (places, transitions, arcs) = generate::fork(2);
        let net = Net::new(places, transitions, arcs).unwrap();
        let (report, analysis) = analyze(&net);
        // one state per tree node, one deadlock per leaf
        assert_eq!(report.state_count, 7);
        assert_eq!(report.deadlock_states.len(), 4);
        assert_eq!(analysis.unexplored_edges(), 0);
    }
}
