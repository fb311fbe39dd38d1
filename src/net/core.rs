//! 网容器：编号分配、注册表、总线分组与可激发性判定。
use indexmap::IndexMap;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::net::ids::{ArcId, Idx, IndexVec, PlaceId, TransitionId};
use crate::net::structure::{
    Arc, ArcKind, ArcSpec, Endpoint, EntityRef, Marking, NetState, NodeRef, Place, PlaceSpec,
    Transition, TransitionSpec,
};

/// Errors rejected at network-build time. The core never silently repairs
/// topology.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("arc #{arc} references place index {index}, but only {len} places were supplied")]
    UnknownPlace { arc: usize, index: usize, len: usize },
    #[error(
        "arc #{arc} references transition index {index}, but only {len} transitions were supplied"
    )]
    UnknownTransition { arc: usize, index: usize, len: usize },
    #[error("arc #{arc} connects {kind} to {kind}; arcs must join a place and a transition")]
    NotBipartite { arc: usize, kind: &'static str },
    #[error("arc #{arc}: inhibitor arcs are input-only (place -> transition)")]
    InhibitorDirection { arc: usize },
    #[error("arc #{arc}: reset arcs are output-only (transition -> place)")]
    ResetDirection { arc: usize },
}

/// Ready bus groups keyed by label (or nid for unlabeled singletons), in
/// first-seen declaration order.
pub type ReadyGroups = IndexMap<String, Vec<TransitionId>>;

/// An immutable 1-safe Petri net.
///
/// Entities are assigned sequential prefix-typed nids (`p1, p2, …`,
/// `t1, …`, `a1, …`) at construction and registered in a lookup table.
/// Arcs are recorded on both endpoints so enabling checks and firing stay
/// local. All run state (marking, fired counts) lives in [`NetState`].
#[derive(Debug)]
pub struct Net {
    places: IndexVec<PlaceId, Place>,
    transitions: IndexVec<TransitionId, Transition>,
    arcs: IndexVec<ArcId, Arc>,
    registry: FxHashMap<String, EntityRef>,
    groups: IndexMap<String, Vec<TransitionId>>,
}

impl Net {
    /// Build a net from id-free value records, validating every arc.
    pub fn new(
        places: Vec<PlaceSpec>,
        transitions: Vec<TransitionSpec>,
        arcs: Vec<ArcSpec>,
    ) -> Result<Self, BuildError> {
        let mut net = Net {
            places: IndexVec::new(),
            transitions: IndexVec::new(),
            arcs: IndexVec::new(),
            registry: FxHashMap::default(),
            groups: IndexMap::new(),
        };

        for (i, spec) in places.into_iter().enumerate() {
            let nid = format!("p{}", i + 1);
            let id = net.places.push(Place::new(nid.clone(), spec.label, spec.marking));
            net.registry.insert(nid, EntityRef::Place(id));
        }
        for (i, spec) in transitions.into_iter().enumerate() {
            let nid = format!("t{}", i + 1);
            let id = net.transitions.push(Transition::new(nid.clone(), spec.label));
            net.registry.insert(nid, EntityRef::Transition(id));
        }

        for (i, spec) in arcs.into_iter().enumerate() {
            let source = net.resolve_endpoint(i, spec.source)?;
            let target = net.resolve_endpoint(i, spec.target)?;

            match (source, target, spec.kind) {
                (NodeRef::Place(_), NodeRef::Place(_), _) => {
                    return Err(BuildError::NotBipartite { arc: i, kind: "place" });
                }
                (NodeRef::Transition(_), NodeRef::Transition(_), _) => {
                    return Err(BuildError::NotBipartite { arc: i, kind: "transition" });
                }
                (NodeRef::Transition(_), NodeRef::Place(_), ArcKind::Inhibitor) => {
                    return Err(BuildError::InhibitorDirection { arc: i });
                }
                (NodeRef::Place(_), NodeRef::Transition(_), ArcKind::Reset) => {
                    return Err(BuildError::ResetDirection { arc: i });
                }
                _ => {}
            }

            let nid = format!("a{}", i + 1);
            let id = net.arcs.push(Arc {
                nid: nid.clone(),
                kind: spec.kind,
                source,
                target,
            });
            net.registry.insert(nid, EntityRef::Arc(id));

            match source {
                NodeRef::Place(p) => net.places[p].outputs.push(id),
                NodeRef::Transition(t) => net.transitions[t].outputs.push(id),
            }
            match target {
                NodeRef::Place(p) => net.places[p].inputs.push(id),
                NodeRef::Transition(t) => {
                    net.transitions[t].inputs.push(id);
                    if spec.kind == ArcKind::Enabler {
                        net.transitions[t].is_source = false;
                    }
                }
            }
        }

        for (id, transition) in net.transitions.iter_enumerated() {
            let key = transition.group_key().to_string();
            net.groups.entry(key).or_default().push(id);
        }

        Ok(net)
    }

    fn resolve_endpoint(&self, arc: usize, endpoint: Endpoint) -> Result<NodeRef, BuildError> {
        match endpoint {
            Endpoint::Place(index) => {
                if index >= self.places.len() {
                    return Err(BuildError::UnknownPlace {
                        arc,
                        index,
                        len: self.places.len(),
                    });
                }
                Ok(NodeRef::Place(PlaceId::from_usize(index)))
            }
            Endpoint::Transition(index) => {
                if index >= self.transitions.len() {
                    return Err(BuildError::UnknownTransition {
                        arc,
                        index,
                        len: self.transitions.len(),
                    });
                }
                Ok(NodeRef::Transition(TransitionId::from_usize(index)))
            }
        }
    }

    pub fn places(&self) -> &IndexVec<PlaceId, Place> {
        &self.places
    }

    pub fn transitions(&self) -> &IndexVec<TransitionId, Transition> {
        &self.transitions
    }

    pub fn arcs(&self) -> &IndexVec<ArcId, Arc> {
        &self.arcs
    }

    pub fn place(&self, id: PlaceId) -> &Place {
        &self.places[id]
    }

    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id]
    }

    pub fn arc(&self, id: ArcId) -> &Arc {
        &self.arcs[id]
    }

    /// Look up any entity by its nid (`p3`, `t1`, `a7`, …).
    pub fn lookup(&self, nid: &str) -> Option<EntityRef> {
        self.registry.get(nid).copied()
    }

    /// All bus groups in first-seen declaration order.
    pub fn groups(&self) -> &IndexMap<String, Vec<TransitionId>> {
        &self.groups
    }

    /// The members of one bus group, if the key names any.
    pub fn group(&self, key: &str) -> Option<&[TransitionId]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Fresh run state from the template's initial marking, all fired
    /// counts at zero.
    pub fn initial_state(&self) -> NetState {
        let marking = Marking(IndexVec::from(
            self.places.iter().map(|p| p.marking).collect::<Vec<_>>(),
        ));
        NetState::new(marking, self.transitions.len())
    }

    /// Enabling test: every enabler-input source marked, no inhibitor-input
    /// source marked.
    ///
    /// A transition without enabler inputs is never enabled standalone;
    /// such spontaneous generation is governed by the fire-once rule of
    /// [`Net::is_ready`] instead, which keeps it bounded.
    pub fn is_enabled(&self, transition: TransitionId, state: &NetState) -> bool {
        let mut consumes = false;
        for &arc_id in self.transitions[transition].inputs() {
            let arc = &self.arcs[arc_id];
            let NodeRef::Place(place) = arc.source else {
                continue;
            };
            match arc.kind {
                ArcKind::Enabler => {
                    if !state.marking.marked(place) {
                        return false;
                    }
                    consumes = true;
                }
                ArcKind::Inhibitor => {
                    if state.marking.marked(place) {
                        return false;
                    }
                }
                ArcKind::Reset => {}
            }
        }
        consumes
    }

    /// Readiness test: enabled, or — independently — a source transition
    /// that has never fired in this run. A marked inhibitor does not hold
    /// back the first firing of a source.
    pub fn is_ready(&self, transition: TransitionId, state: &NetState) -> bool {
        if self.is_enabled(transition, state) {
            return true;
        }
        self.transitions[transition].is_source && state.fired(transition) == 0
    }

    /// A bus group is ready iff every member is individually ready; a
    /// single blocked member makes the whole group unready.
    pub fn is_group_ready(&self, members: &[TransitionId], state: &NetState) -> bool {
        members.iter().all(|&t| self.is_ready(t, state))
    }

    /// All ready bus groups under the given state, keyed by label in
    /// first-seen order.
    pub fn ready_groups(&self, state: &NetState) -> ReadyGroups {
        self.groups
            .iter()
            .filter(|(_, members)| self.is_group_ready(members.as_slice(), state))
            .map(|(key, members)| (key.clone(), members.clone()))
            .collect()
    }

    /// Render a marking as display-name/boolean pairs.
    pub fn marking_pairs(&self, marking: &Marking) -> Vec<(String, bool)> {
        self.places
            .iter_enumerated()
            .map(|(id, place)| (place.display_name().to_string(), marking.marked(id)))
            .collect()
    }

    /// Canonical nid-keyed marking string, stable across runs of the same
    /// topology; used as the tally key by the batch simulator.
    pub fn marking_to_string(&self, marking: &Marking) -> String {
        self.places
            .iter_enumerated()
            .map(|(id, place)| format!("{}: {}", place.nid, marking.marked(id)))
            .join(", ")
    }
}
