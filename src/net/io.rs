//! Snapshot I/O: JSON and RON serialization of a read-only copy of the
//! network. An export is a rendering/inspection artifact, not a durability
//! mechanism — markings do not survive a restart through this module.
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::net::core::Net;
use crate::net::ids::NodeId;
use crate::net::structure::{ArcKind, Role, Weight};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub path: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Weight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Weight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Weight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub source: String,
    pub sink: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Weight>,
}

/// A read-only copy of one network scope: vertices with role tags and
/// markings, plus every connected arc resolved to endpoint paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<SnapshotEdge>,
}

impl Snapshot {
    pub fn capture(net: &Net, scope: NodeId) -> Self {
        let mut snapshot = Snapshot {
            name: net.path(scope),
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        snapshot.descend(net, scope);
        snapshot
    }

    fn descend(&mut self, net: &Net, network: NodeId) {
        for place in net.places(network) {
            let data = net.place(place).expect("classified place");
            self.nodes.push(SnapshotNode {
                path: net.path(place),
                role: Role::Place,
                tokens: Some(data.tokens),
                minimum: data.minimum,
                maximum: data.maximum,
            });
        }
        for transition in net.transitions(network) {
            self.nodes.push(SnapshotNode {
                path: net.path(transition),
                role: Role::Transition,
                tokens: None,
                minimum: None,
                maximum: None,
            });
        }
        for arc in net.arcs(network) {
            let (Some(source), Some(sink)) = (net.source(arc), net.sink(arc)) else {
                continue;
            };
            let weight = match net.arc_kind(arc) {
                Some(ArcKind::Weighted(weight)) => Some(weight),
                _ => None,
            };
            self.edges.push(SnapshotEdge {
                source: net.path(source),
                sink: net.path(sink),
                weight,
            });
        }
        for sub in net.networks(network) {
            self.nodes.push(SnapshotNode {
                path: net.path(sub),
                role: Role::Network,
                tokens: None,
                minimum: None,
                maximum: None,
            });
            self.descend(net, sub);
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

pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    let mut file = File::create(path)?;
    let content = to_json_string(value)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn read_json<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, IoError> {
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    from_json_str(&content)
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(ron::ser::to_string_pretty(
        value,
        ron::ser::PrettyConfig::default(),
    )?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}

pub fn write_ron<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    let mut file = File::create(path)?;
    let content = to_ron_string(value)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn read_ron<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, IoError> {
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    from_ron_str(&content)
}
