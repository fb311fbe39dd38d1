//! 网的静态结构元素：库所、迁移、弧，以及布尔标识状态向量。
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::net::ids::{ArcId, IndexVec, PlaceId, TransitionId};

/// Number of fired steps a transition has personally taken, run-scoped.
pub type FireCount = u32;

/// The three arc kinds of the net.
///
/// * `Enabler` — standard flow: firing requires the source place marked,
///   clears it on consume and sets the target place on produce.
/// * `Inhibitor` — input-only: blocks firing while its source place is
///   marked; never mutates any marking.
/// * `Reset` — output-only: unconditionally clears its target place on
///   firing, whatever its previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArcKind {
    Enabler,
    Inhibitor,
    Reset,
}

impl fmt::Display for ArcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArcKind::Enabler => write!(f, "enabler"),
            ArcKind::Inhibitor => write!(f, "inhibitor"),
            ArcKind::Reset => write!(f, "reset"),
        }
    }
}

/// Reference into the input collections of [`crate::net::Net::new`].
///
/// The compiler hands over id-free value records; arcs address their
/// endpoints by position in those collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Place(usize),
    Transition(usize),
}

impl Endpoint {
    pub const fn place(idx: usize) -> Self {
        Endpoint::Place(idx)
    }

    pub const fn transition(idx: usize) -> Self {
        Endpoint::Transition(idx)
    }
}

/// Id-free place record as produced by the compiler.
#[derive(Debug, Clone, Default)]
pub struct PlaceSpec {
    pub label: Option<String>,
    pub marking: bool,
}

impl PlaceSpec {
    pub fn new(label: impl Into<String>, marking: bool) -> Self {
        Self {
            label: Some(label.into()),
            marking,
        }
    }

    pub fn unlabeled(marking: bool) -> Self {
        Self {
            label: None,
            marking,
        }
    }
}

/// Id-free transition record as produced by the compiler.
#[derive(Debug, Clone, Default)]
pub struct TransitionSpec {
    pub label: Option<String>,
}

impl TransitionSpec {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }

    pub fn unlabeled() -> Self {
        Self { label: None }
    }
}

/// Id-free arc record as produced by the compiler.
#[derive(Debug, Clone)]
pub struct ArcSpec {
    pub source: Endpoint,
    pub target: Endpoint,
    pub kind: ArcKind,
}

impl ArcSpec {
    pub fn new(source: Endpoint, target: Endpoint, kind: ArcKind) -> Self {
        Self {
            source,
            target,
            kind,
        }
    }

    pub fn enabler(source: Endpoint, target: Endpoint) -> Self {
        Self::new(source, target, ArcKind::Enabler)
    }

    /// Inhibitor arcs are input-only: place → transition.
    pub fn inhibitor(place: usize, transition: usize) -> Self {
        Self::new(
            Endpoint::Place(place),
            Endpoint::Transition(transition),
            ArcKind::Inhibitor,
        )
    }

    /// Reset arcs are output-only: transition → place.
    pub fn reset(transition: usize, place: usize) -> Self {
        Self::new(
            Endpoint::Transition(transition),
            Endpoint::Place(place),
            ArcKind::Reset,
        )
    }
}

/// Typed handle to an arc endpoint inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Place(PlaceId),
    Transition(TransitionId),
}

/// Registry entry: any entity addressable by its nid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Place(PlaceId),
    Transition(TransitionId),
    Arc(ArcId),
}

type ArcList = SmallVec<[ArcId; 4]>;

/// A place of the net. The `marking` field records the initial marking of
/// the template; the live marking of a run lives in [`NetState`].
#[derive(Debug, Clone)]
pub struct Place {
    pub nid: String,
    pub label: Option<String>,
    pub marking: bool,
    pub(crate) inputs: ArcList,
    pub(crate) outputs: ArcList,
}

impl Place {
    pub(crate) fn new(nid: String, label: Option<String>, marking: bool) -> Self {
        Self {
            nid,
            label,
            marking,
            inputs: ArcList::new(),
            outputs: ArcList::new(),
        }
    }

    /// The label if present, otherwise the nid.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.nid)
    }

    pub fn inputs(&self) -> &[ArcId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ArcId] {
        &self.outputs
    }
}

/// A transition of the net. `is_source` is derived at construction time:
/// true iff the transition has no enabler-typed input arc (inhibitor
/// inputs do not count).
#[derive(Debug, Clone)]
pub struct Transition {
    pub nid: String,
    pub label: Option<String>,
    pub(crate) is_source: bool,
    pub(crate) inputs: ArcList,
    pub(crate) outputs: ArcList,
}

impl Transition {
    pub(crate) fn new(nid: String, label: Option<String>) -> Self {
        Self {
            nid,
            label,
            is_source: true,
            inputs: ArcList::new(),
            outputs: ArcList::new(),
        }
    }

    pub fn is_source(&self) -> bool {
        self.is_source
    }

    /// The label if present, otherwise the nid.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.nid)
    }

    /// The key of the bus group this transition belongs to.
    pub fn group_key(&self) -> &str {
        self.display_name()
    }

    pub fn inputs(&self) -> &[ArcId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ArcId] {
        &self.outputs
    }
}

/// A directed arc between a place and a transition.
#[derive(Debug, Clone)]
pub struct Arc {
    pub nid: String,
    pub kind: ArcKind,
    pub source: NodeRef,
    pub target: NodeRef,
}

/// Boolean marking vector: one token bit per place.
///
/// Equality and hashing are structural, which makes a `Marking` directly
/// usable as the state fingerprint for deduplication.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Marking(pub(crate) IndexVec<PlaceId, bool>);

impl Marking {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn marked(&self, place: PlaceId) -> bool {
        self.0[place]
    }

    pub fn set(&mut self, place: PlaceId, value: bool) {
        self.0[place] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, bool)> + '_ {
        self.0.iter_enumerated().map(|(id, &v)| (id, v))
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (place, marked) in self.iter() {
            map.entry(&place, &marked);
        }
        map.finish()
    }
}

/// The mutable run state of a net: live marking plus per-transition fired
/// counts. Cloning a `NetState` is how batch runs isolate themselves; the
/// topology itself is shared immutably.
#[derive(Debug, Clone)]
pub struct NetState {
    pub(crate) marking: Marking,
    pub(crate) fired: IndexVec<TransitionId, FireCount>,
}

impl NetState {
    pub(crate) fn new(marking: Marking, transitions: usize) -> Self {
        Self {
            marking,
            fired: IndexVec::from(vec![0; transitions]),
        }
    }

    pub fn marking(&self) -> &Marking {
        &self.marking
    }

    pub fn fired(&self, transition: TransitionId) -> FireCount {
        self.fired[transition]
    }
}
