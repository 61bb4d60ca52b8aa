use crate::core::models::mesh::Epithelium;
use crate::core::models::segment::Segment;
use crate::core::topology::collapse_edge;
use crate::engine::config::ReplayConfig;
use crate::engine::error::{EngineError, ReplayError};
use crate::engine::history::{MemoryHistory, RemovedEdges, SheetHistory};
use crate::engine::monolayer::monolayer_from_sheets;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info, instrument, warn};

/// Rebuilds the 3D history of a monolayer from the recorded apical and basal
/// sheet histories.
///
/// The monolayer is assembled once from the first frames. For every later
/// frame, each apical edge removal recorded in the sheet history is replayed
/// as an edge collapse on the monolayer edge whose provenance matches.
/// Removed ids are in the numbering of the previous frame, so provenance is
/// left untouched while a frame's removals are replayed and apical ids are
/// renumbered to follow the sheet once the frame is complete. One snapshot is
/// recorded per frame, with the monolayer edge ids that were collapsed to
/// produce it.
#[instrument(skip_all, name = "replay_workflow")]
pub fn run<A, B>(
    apical: &A,
    basal: &B,
    config: &ReplayConfig,
    reporter: &ProgressReporter,
) -> Result<MemoryHistory, EngineError>
where
    A: SheetHistory + ?Sized,
    B: SheetHistory + ?Sized,
{
    let times = check_histories(apical, basal)?;

    let mut monolayer = reporter.phase("Assembly", || -> Result<Epithelium, EngineError> {
        let (first_apical, first_basal) = frame_pair(apical, basal, 0)?;
        Ok(monolayer_from_sheets(first_apical, first_basal, config.distance)?)
    })?;
    info!(
        frames = times.len(),
        cells = monolayer.n_cells(),
        "Assembled monolayer; replaying recorded events."
    );

    reporter.phase("Replay", || -> Result<MemoryHistory, EngineError> {
        reporter.report(Progress::TaskStart {
            total_steps: times.len() as u64,
        });
        let mut history = MemoryHistory::new();
        for (frame, &time) in times.iter().enumerate() {
            let removed = apical.removed_edges(frame);
            let mut collapsed = Vec::with_capacity(removed.len());
            if frame == 0 {
                if !removed.is_empty() {
                    warn!(
                        count = removed.len(),
                        "Ignoring edge removals recorded on the first frame; the monolayer is built from it."
                    );
                }
            } else {
                for &edge in removed {
                    collapsed.push(replay_removal(&mut monolayer, edge, time)?);
                }
                renumber_apical_provenance(&mut monolayer);
            }

            let (apical_sheet, basal_sheet) = frame_pair(apical, basal, frame)?;
            if config.sync_positions {
                sync_positions(&mut monolayer, apical_sheet, basal_sheet, time)?;
            }
            check_frame(&monolayer, apical_sheet, time)?;

            history.record(time, &monolayer, RemovedEdges::from(collapsed));
            reporter.report(Progress::Frame { index: frame, time });
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);
        info!(frames = history.len(), "Replay complete.");
        Ok(history)
    })
}

fn check_histories<A, B>(apical: &A, basal: &B) -> Result<Vec<f64>, ReplayError>
where
    A: SheetHistory + ?Sized,
    B: SheetHistory + ?Sized,
{
    if apical.is_empty() || basal.is_empty() {
        return Err(ReplayError::EmptyHistory);
    }
    if apical.len() != basal.len() {
        return Err(ReplayError::FrameCountMismatch {
            apical: apical.len(),
            basal: basal.len(),
        });
    }
    let (apical_times, basal_times) = (apical.time_stamps(), basal.time_stamps());
    if let Some((frame, (&a, &b))) = apical_times
        .iter()
        .zip(&basal_times)
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        return Err(ReplayError::TimestampMismatch {
            frame,
            apical: a,
            basal: b,
        });
    }
    Ok(apical_times)
}

fn frame_pair<'h, A, B>(
    apical: &'h A,
    basal: &'h B,
    frame: usize,
) -> Result<(&'h Epithelium, &'h Epithelium), ReplayError>
where
    A: SheetHistory + ?Sized,
    B: SheetHistory + ?Sized,
{
    apical
        .snapshot(frame)
        .zip(basal.snapshot(frame))
        .ok_or(ReplayError::EmptyHistory)
}

/// Collapses the apical monolayer edge traced back to sheet edge `edge` and
/// returns its monolayer id.
fn replay_removal(monolayer: &mut Epithelium, edge: usize, time: f64) -> Result<usize, EngineError> {
    let target = monolayer
        .edges()
        .iter()
        .position(|e| e.segment == Segment::Apical && e.id_sheet == Some(edge))
        .ok_or(ReplayError::MissingEdge { time, edge })?;
    collapse_edge(monolayer, target)?;
    debug!(time, sheet_edge = edge, monolayer_edge = target, "Replayed edge removal.");
    Ok(target)
}

/// Apical edges and vertices keep the relative order of the sheet they came
/// from, so their rank among apical elements is their sheet id.
fn renumber_apical_provenance(monolayer: &mut Epithelium) {
    for (rank, edge) in monolayer
        .edges_mut()
        .iter_mut()
        .filter(|e| e.segment == Segment::Apical)
        .enumerate()
    {
        edge.id_sheet = Some(rank);
    }
    for (rank, vertex) in monolayer
        .vertices_mut()
        .iter_mut()
        .filter(|v| v.segment == Segment::Apical)
        .enumerate()
    {
        vertex.id_sheet = Some(rank);
    }
}

/// Copies in-plane positions from the recorded frames; heights are kept.
fn sync_positions(
    monolayer: &mut Epithelium,
    apical: &Epithelium,
    basal: &Epithelium,
    time: f64,
) -> Result<(), ReplayError> {
    let mut updated = Vec::with_capacity(monolayer.n_verts());
    for vertex in monolayer.vertices() {
        let source = match vertex.segment {
            Segment::Apical => apical,
            Segment::Basal => basal,
            Segment::Lateral => {
                updated.push(vertex.position);
                continue;
            }
        };
        let sheet_vertex = vertex.id_sheet.unwrap_or(usize::MAX);
        let recorded = source
            .position(sheet_vertex)
            .ok_or(ReplayError::MissingVertex {
                time,
                segment: vertex.segment,
                vertex: sheet_vertex,
            })?;
        let mut position = vertex.position;
        position.x = recorded.x;
        position.y = recorded.y;
        updated.push(position);
    }
    for (vertex, position) in monolayer.vertices_mut().iter_mut().zip(updated) {
        vertex.position = position;
    }
    monolayer.invalidate_geometry();
    Ok(())
}

fn check_frame(monolayer: &Epithelium, apical: &Epithelium, time: f64) -> Result<(), ReplayError> {
    let apical_edges = monolayer
        .edges()
        .iter()
        .filter(|e| e.segment == Segment::Apical)
        .count();
    let apical_verts = monolayer
        .vertices()
        .iter()
        .filter(|v| v.segment == Segment::Apical)
        .count();
    for (what, expected, actual) in [
        ("apical edges", apical.n_edges(), apical_edges),
        ("apical vertices", apical.n_verts(), apical_verts),
    ] {
        if expected != actual {
            return Err(ReplayError::FrameMismatch {
                time,
                what,
                expected,
                actual,
            });
        }
    }
    Ok(())
}
