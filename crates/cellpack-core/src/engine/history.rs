use crate::core::models::mesh::Epithelium;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marks a frame with no removed edges in serialized logs.
pub const NO_EVENT: i64 = -1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid removed-edge id {0}; only a lone -1 may mark an empty event list")]
pub struct InvalidEventId(pub i64);

/// Edges removed from a sheet while producing one frame, in removal order.
///
/// Serialized as a list of ids, with `[-1]` standing for "no event".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct RemovedEdges(Vec<usize>);

impl RemovedEdges {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for RemovedEdges {
    fn from(edges: Vec<usize>) -> Self {
        Self(edges)
    }
}

impl TryFrom<Vec<i64>> for RemovedEdges {
    type Error = InvalidEventId;

    fn try_from(raw: Vec<i64>) -> Result<Self, Self::Error> {
        if raw.first() == Some(&NO_EVENT) {
            return match raw.iter().skip(1).find(|&&id| id != NO_EVENT) {
                Some(&id) => Err(InvalidEventId(id)),
                None => Ok(Self::none()),
            };
        }
        raw.into_iter()
            .map(|id| usize::try_from(id).map_err(|_| InvalidEventId(id)))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl From<RemovedEdges> for Vec<i64> {
    fn from(edges: RemovedEdges) -> Self {
        if edges.0.is_empty() {
            vec![NO_EVENT]
        } else {
            edges.0.into_iter().map(|id| id as i64).collect()
        }
    }
}

/// Read access to a recorded sheet history: snapshots indexed by frame, each
/// with its time stamp and the edges removed to produce it.
pub trait SheetHistory {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn time(&self, frame: usize) -> Option<f64>;

    fn snapshot(&self, frame: usize) -> Option<&Epithelium>;

    /// Edge ids removed while producing `frame`, in the numbering of the
    /// previous frame. Empty when nothing happened or `frame` is out of range.
    fn removed_edges(&self, frame: usize) -> &[usize];

    fn time_stamps(&self) -> Vec<f64> {
        (0..self.len()).filter_map(|frame| self.time(frame)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub time: f64,
    pub mesh: Epithelium,
    #[serde(default)]
    pub removed_edges: RemovedEdges,
}

/// In-memory history recorder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryHistory {
    frames: Vec<Frame>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot of `mesh`.
    pub fn record(&mut self, time: f64, mesh: &Epithelium, removed_edges: RemovedEdges) {
        self.frames.push(Frame {
            time,
            mesh: mesh.clone(),
            removed_edges,
        });
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

impl SheetHistory for MemoryHistory {
    fn len(&self) -> usize {
        self.frames.len()
    }

    fn time(&self, frame: usize) -> Option<f64> {
        self.frames.get(frame).map(|f| f.time)
    }

    fn snapshot(&self, frame: usize) -> Option<&Epithelium> {
        self.frames.get(frame).map(|f| &f.mesh)
    }

    fn removed_edges(&self, frame: usize) -> &[usize] {
        self.frames
            .get(frame)
            .map(|f| f.removed_edges.as_slice())
            .unwrap_or(&[])
    }
}
