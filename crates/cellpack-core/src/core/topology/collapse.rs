use super::TopologyError;
use crate::core::effectors::params;
use crate::core::models::mesh::Epithelium;
use nalgebra::center;
use tracing::debug;

/// Collapses `edge` into its lower-id endpoint, placed at the edge midpoint.
///
/// Every half-edge joining the two endpoints is removed: the edge and its
/// opposite on a sheet, and in a monolayer also the lateral copies. The other
/// half-edges of the removed vertex are reconnected to the survivor, and ids
/// above the removed vertex shift down by one.
///
/// # Return
///
/// `(survivor, face)` where `face` is the face of the collapsed edge.
///
/// # Errors
///
/// Returns [`TopologyError`] if the edge does not exist or is inactive, if a
/// face would be left with fewer than three sides, or if a face holds both
/// endpoints without the edge. The mesh is unchanged in every error case.
pub fn collapse_edge(mesh: &mut Epithelium, edge: usize) -> Result<(usize, usize), TopologyError> {
    let half_edge = mesh.edge(edge).ok_or(TopologyError::EdgeNotFound(edge))?;
    if let Some(active) = mesh.edge_data().get(params::IS_ACTIVE) {
        if active[edge] == 0.0 {
            return Err(TopologyError::InactiveEdge(edge));
        }
    }

    let (a, b) = (half_edge.srce, half_edge.trgt);
    let face = half_edge.face;
    let (survivor, removed) = (a.min(b), a.max(b));

    let joining: Vec<usize> = mesh
        .edges()
        .iter()
        .enumerate()
        .filter(|(_, e)| e.joins(a, b))
        .map(|(id, _)| id)
        .collect();

    for f in 0..mesh.n_faces() {
        let lost = joining.iter().filter(|&&e| mesh.edges()[e].face == f).count();
        if lost > 0 {
            if mesh.num_sides(f) - lost < 3 {
                return Err(TopologyError::CollapseDegeneratesFace { face: f });
            }
        } else {
            let vertices = mesh.face_vertices(f);
            if vertices.contains(&a) && vertices.contains(&b) {
                return Err(TopologyError::PinchedFace { face: f });
            }
        }
    }

    let midpoint = center(
        &mesh.vertices()[a].position,
        &mesh.vertices()[b].position,
    );

    let mut next = mesh.clone();
    if let Some(vertex) = next.vertex_mut(survivor) {
        vertex.position = midpoint;
    }
    next.remove_edges(&joining);
    for e in next.edges_mut() {
        if e.srce == removed {
            e.srce = survivor;
        }
        if e.trgt == removed {
            e.trgt = survivor;
        }
    }
    next.remove_vertex(removed);
    next.reset_topology()?;
    next.invalidate_geometry();
    *mesh = next;

    debug!(
        edge,
        survivor,
        removed,
        face,
        removed_edges = joining.len(),
        "Collapsed edge."
    );
    Ok((survivor, face))
}
