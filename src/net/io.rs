//! 导出边界：只读快照与 JSON / RON 字符串序列化。
//!
//! The core owns no on-disk format; files are written by the external
//! exporter from the snapshots produced here.
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::net::core::Net;
use crate::net::structure::{ArcKind, NetState, NodeRef};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSnapshot {
    pub nid: String,
    pub label: Option<String>,
    pub marking: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSnapshot {
    pub nid: String,
    pub label: Option<String>,
    pub fired: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcSnapshot {
    pub nid: String,
    pub source: String,
    pub target: String,
    pub kind: ArcKind,
}

/// Read-only view of a net plus one run state, sufficient for a viewer or
/// exporter to render a diagram or serialize the whole network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetSnapshot {
    pub places: Vec<PlaceSnapshot>,
    pub transitions: Vec<TransitionSnapshot>,
    pub arcs: Vec<ArcSnapshot>,
}

impl NetSnapshot {
    pub fn capture(net: &Net, state: &NetState) -> Self {
        let node_nid = |node: NodeRef| -> String {
            match node {
                NodeRef::Place(p) => net.place(p).nid.clone(),
                NodeRef::Transition(t) => net.transition(t).nid.clone(),
            }
        };

        Self {
            places: net
                .places()
                .iter_enumerated()
                .map(|(id, place)| PlaceSnapshot {
                    nid: place.nid.clone(),
                    label: place.label.clone(),
                    marking: state.marking().marked(id),
                })
                .collect(),
            transitions: net
                .transitions()
                .iter_enumerated()
                .map(|(id, transition)| TransitionSnapshot {
                    nid: transition.nid.clone(),
                    label: transition.label.clone(),
                    fired: state.fired(id),
                })
                .collect(),
            arcs: net
                .arcs()
                .iter()
                .map(|arc| ArcSnapshot {
                    nid: arc.nid.clone(),
                    source: node_nid(arc.source),
                    target: node_nid(arc.target),
                    kind: arc.kind,
                })
                .collect(),
        }
    }
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    let mut pretty = PrettyConfig::default();
    pretty.new_line = "\n".into();
    Ok(ron::ser::to_string_pretty(value, pretty)?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}
