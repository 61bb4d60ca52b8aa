use super::TopologyError;
use crate::core::models::mesh::{Epithelium, HalfEdge, Vertex};
use crate::core::models::segment::Segment;
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Splits `vert` into two vertices joined by a new edge pair.
///
/// On a sheet the new edge is shared by `face` and by the face across the
/// fan of `vert`. Walking the fan from `face`, the first half of the
/// remaining faces keep `vert`; the second half move to the new vertex.
///
/// On a monolayer `face` is an apical or basal face and the split undoes a
/// collapse, see [`split_layer_vertex`].
///
/// Both vertices start at the original position, or with `recenter` at the
/// centroid of their retained neighbours in the same layer.
///
/// # Errors
///
/// Returns [`TopologyError`] for unknown ids, when `vert` is not on `face`,
/// when the fan is open (boundary vertex) or has fewer than three faces, and
/// on monolayers when no collapsed edge can be restored. The mesh is
/// unchanged in every error case.
pub fn split_vertex(
    mesh: &mut Epithelium,
    vert: usize,
    face: usize,
    recenter: bool,
) -> Result<usize, TopologyError> {
    if mesh.vertex(vert).is_none() {
        return Err(TopologyError::VertexNotFound(vert));
    }
    if mesh.face(face).is_none() {
        return Err(TopologyError::FaceNotFound(face));
    }
    if mesh.is_bulk() {
        return split_layer_vertex(mesh, vert, face, recenter);
    }

    let fan = face_fan(mesh, vert, face)?;
    let k = fan.len();
    if k < 3 {
        return Err(TopologyError::TooFewFaces {
            vertex: vert,
            faces: k,
        });
    }
    let across = fan[k / 2];
    let moved = &fan[k / 2 + 1..];

    let in_f = incoming(mesh, face, vert).ok_or(TopologyError::FaceNotIncident { vertex: vert, face })?;
    let out_g = outgoing(mesh, across, vert).ok_or(TopologyError::FaceNotIncident {
        vertex: vert,
        face: across,
    })?;
    let in_g = incoming(mesh, across, vert).ok_or(TopologyError::FaceNotIncident {
        vertex: vert,
        face: across,
    })?;

    let mut next = mesh.clone();
    let new_vert = push_twin_vertex(&mut next, vert);

    for (id, e) in next.edges_mut().iter_mut().enumerate() {
        if moved.contains(&e.face) || id == in_f || id == out_g {
            rename(e, vert, new_vert);
        }
    }

    let segment_f = mesh.edges()[in_f].segment;
    let segment_g = mesh.edges()[in_g].segment;
    next.push_edge(HalfEdge::new(new_vert, vert, face, segment_f), in_f);
    next.push_edge(HalfEdge::new(vert, new_vert, across, segment_g), in_g);

    next.reset_topology()?;
    if recenter {
        recenter_pair(&mut next, vert, new_vert);
    }
    next.invalidate_geometry();
    *mesh = next;

    debug!(
        vertex = vert,
        new_vertex = new_vert,
        face,
        across,
        fan = k,
        "Split vertex."
    );
    Ok(new_vert)
}

/// Splits a vertex of the apical or basal layer of a monolayer.
///
/// A collapse in a layer leaves a triangular lateral face in each cell that
/// held the collapsed edge, with the two ribs of the lost edge meeting at
/// the survivor. The triangle of the cell of `face` fixes the split: its
/// outgoing rib stays with `vert`, its incoming rib moves to the new vertex
/// and it regains its fourth side. The triangle across its basal side (if
/// any) is restored the same way and names the layer face across. The layer
/// half-edges between `face` and that face move to the new vertex together
/// with their lateral faces.
fn split_layer_vertex(
    mesh: &mut Epithelium,
    vert: usize,
    face: usize,
    recenter: bool,
) -> Result<usize, TopologyError> {
    let layer = mesh.faces()[face].segment;
    if layer == Segment::Lateral {
        return Err(TopologyError::LateralSplit(face));
    }
    let not_incident = |face| TopologyError::FaceNotIncident { vertex: vert, face };
    let in_f = incoming(mesh, face, vert).ok_or_else(|| not_incident(face))?;
    let out_f = outgoing(mesh, face, vert).ok_or_else(|| not_incident(face))?;
    let cell = mesh.edges()[out_f].cell;

    let gaps: Vec<usize> = lateral_triangles(mesh, vert)
        .filter(|&f| mesh.edges()[mesh.face_edges(f)[0]].cell == cell)
        .collect();
    let [gap] = gaps[..] else {
        return Err(TopologyError::NoLateralGap { vertex: vert, face });
    };
    let kept_rib = outgoing(mesh, gap, vert).ok_or_else(|| not_incident(gap))?;
    let moved_rib = incoming(mesh, gap, vert).ok_or_else(|| not_incident(gap))?;
    let (p, q) = (mesh.edges()[kept_rib].trgt, mesh.edges()[moved_rib].srce);

    // The partner triangle carries the reverse of the gap's far side.
    let partner = lateral_triangles(mesh, vert).find(|&f| {
        f != gap
            && mesh
                .face_edges(f)
                .iter()
                .any(|&e| mesh.edges()[e].srce == q && mesh.edges()[e].trgt == p)
    });
    let across = match partner {
        Some(partner) => {
            let partner_cell = mesh.edges()[mesh.face_edges(partner)[0]].cell;
            let found = (0..mesh.n_faces()).find(|&f| {
                mesh.faces()[f].segment == layer
                    && mesh.face_edges(f).iter().any(|&e| {
                        mesh.edges()[e].cell == partner_cell && mesh.edges()[e].srce == vert
                    })
            });
            Some(found.ok_or_else(|| not_incident(partner))?)
        }
        None => None,
    };

    let moved = layer_arc(mesh, vert, out_f, across, layer)?;
    let lateral: Vec<usize> = moved
        .iter()
        .filter_map(|&e| mesh.opposite(e))
        .map(|e| mesh.edges()[e].face)
        .collect();

    let mut next = mesh.clone();
    let new_vert = push_twin_vertex(&mut next, vert);
    for (id, e) in next.edges_mut().iter_mut().enumerate() {
        if moved.contains(&id) || lateral.contains(&e.face) || id == moved_rib {
            rename(e, vert, new_vert);
        }
    }

    let with_cell = |edge: HalfEdge, cell: Option<usize>| match cell {
        Some(cell) => edge.with_cell(cell),
        None => edge,
    };
    next.push_edge(with_cell(HalfEdge::new(vert, new_vert, face, layer), cell), in_f);
    next.push_edge(
        with_cell(HalfEdge::new(new_vert, vert, gap, Segment::Lateral), cell),
        moved_rib,
    );
    if let (Some(partner), Some(across)) = (partner, across) {
        let partner_out = outgoing(mesh, partner, vert).ok_or_else(|| not_incident(partner))?;
        let partner_cell = mesh.edges()[partner_out].cell;
        let in_across = incoming(mesh, across, vert).ok_or_else(|| not_incident(across))?;
        rename(&mut next.edges_mut()[partner_out], vert, new_vert);
        next.push_edge(
            with_cell(HalfEdge::new(new_vert, vert, across, layer), partner_cell),
            in_across,
        );
        next.push_edge(
            with_cell(HalfEdge::new(vert, new_vert, partner, Segment::Lateral), partner_cell),
            partner_out,
        );
    }

    next.reset_topology()?;
    if recenter {
        recenter_pair(&mut next, vert, new_vert);
    }
    next.invalidate_geometry();
    *mesh = next;

    debug!(
        vertex = vert,
        new_vertex = new_vert,
        face,
        across = ?across,
        moved = moved.len(),
        "Split layer vertex."
    );
    Ok(new_vert)
}

/// Faces around `vert`, starting at `face` and following the opposite of
/// each outgoing half-edge.
fn face_fan(mesh: &Epithelium, vert: usize, face: usize) -> Result<Vec<usize>, TopologyError> {
    let mut fan = vec![face];
    let mut current = face;
    loop {
        let out = outgoing(mesh, current, vert).ok_or(TopologyError::FaceNotIncident {
            vertex: vert,
            face: current,
        })?;
        let opposite = mesh
            .opposite(out)
            .ok_or(TopologyError::OpenFan { vertex: vert })?;
        current = mesh.edges()[opposite].face;
        if current == face {
            return Ok(fan);
        }
        if fan.contains(&current) || fan.len() > mesh.n_faces() {
            return Err(TopologyError::OpenFan { vertex: vert });
        }
        fan.push(current);
    }
}

fn outgoing(mesh: &Epithelium, face: usize, vert: usize) -> Option<usize> {
    mesh.face_edges(face)
        .iter()
        .copied()
        .find(|&e| mesh.edges()[e].srce == vert)
}

fn incoming(mesh: &Epithelium, face: usize, vert: usize) -> Option<usize> {
    mesh.face_edges(face)
        .iter()
        .copied()
        .find(|&e| mesh.edges()[e].trgt == vert)
}

/// Layer half-edges at `vert` from `start` (outgoing, in the first face) to
/// the incoming half-edge of `stop`, crossing between cells through reversed
/// half-edges of the same layer. Without `stop` the walk runs to the
/// boundary.
fn layer_arc(
    mesh: &Epithelium,
    vert: usize,
    start: usize,
    stop: Option<usize>,
    layer: Segment,
) -> Result<Vec<usize>, TopologyError> {
    let mut arc = Vec::new();
    let mut current = start;
    loop {
        arc.push(current);
        let (srce, trgt) = (mesh.edges()[current].srce, mesh.edges()[current].trgt);
        let twin = mesh
            .edges()
            .iter()
            .position(|e| e.segment == layer && e.srce == trgt && e.trgt == srce);
        let Some(twin) = twin else {
            return match stop {
                Some(_) => Err(TopologyError::OpenFan { vertex: vert }),
                None => Ok(arc),
            };
        };
        arc.push(twin);
        let face = mesh.edges()[twin].face;
        if Some(face) == stop {
            return Ok(arc);
        }
        current = outgoing(mesh, face, vert).ok_or(TopologyError::FaceNotIncident { vertex: vert, face })?;
        if current == start || arc.len() > mesh.n_edges() {
            return Err(TopologyError::OpenFan { vertex: vert });
        }
    }
}

fn lateral_triangles(mesh: &Epithelium, vert: usize) -> impl Iterator<Item = usize> + '_ {
    (0..mesh.n_faces()).filter(move |&f| {
        mesh.faces()[f].segment == Segment::Lateral
            && mesh.num_sides(f) == 3
            && mesh.face_edges(f).iter().any(|&e| mesh.edges()[e].srce == vert)
    })
}

fn push_twin_vertex(mesh: &mut Epithelium, vert: usize) -> usize {
    let template = mesh.vertices()[vert].clone();
    mesh.push_vertex(
        Vertex {
            id_sheet: None,
            ..template
        },
        vert,
    )
}

fn rename(edge: &mut HalfEdge, from: usize, to: usize) {
    if edge.srce == from {
        edge.srce = to;
    }
    if edge.trgt == from {
        edge.trgt = to;
    }
}

/// Moves both vertices to the centroid of their other neighbours in the same
/// layer.
fn recenter_pair(mesh: &mut Epithelium, vert: usize, new_vert: usize) {
    let layer = mesh.vertices()[vert].segment;
    let centroids: Vec<(usize, Point3<f64>)> = [(vert, new_vert), (new_vert, vert)]
        .into_iter()
        .filter_map(|(v, other)| {
            let neighbors: Vec<usize> = mesh
                .vertex_neighbors(v)
                .into_iter()
                .filter(|&n| n != other && mesh.vertices()[n].segment == layer)
                .collect();
            if neighbors.is_empty() {
                return None;
            }
            let sum = neighbors
                .iter()
                .map(|&n| mesh.vertices()[n].position.coords)
                .sum::<Vector3<f64>>();
            Some((v, Point3::from(sum / neighbors.len() as f64)))
        })
        .collect();
    for (v, position) in centroids {
        if let Some(vertex) = mesh.vertex_mut(v) {
            vertex.position = position;
        }
    }
}
