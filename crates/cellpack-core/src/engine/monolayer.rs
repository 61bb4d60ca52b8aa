use super::layout::{LateralRole, MonolayerLayout};
use crate::core::effectors::params;
use crate::core::models::columns::{Columns, ConfigurationError};
use crate::core::models::mesh::{Cell, Epithelium, Face, HalfEdge, Vertex};
use crate::core::models::segment::{Element, Segment};
use crate::core::topology::TopologyError;
use tracing::debug;

/// Stitches an apical and a basal sheet into a 3D monolayer with one cell per
/// apical face.
///
/// Apical vertices are lifted to `z = distance / 2` and basal vertices lowered
/// to `z = -distance / 2`. Basal half-edges are reversed so every face of a
/// cell winds outward, and each apical half-edge gets a quadrilateral lateral
/// face joining it to the basal half-edge with the same id. Every element
/// records the id it had in its source sheet as `id_sheet`; lateral elements
/// record the id of their apical half-edge.
///
/// # Errors
///
/// Returns [`TopologyError`] if either input already has cells, if the sheets
/// differ in face or half-edge count, if a face has a different number of
/// sides on the two sheets, or if `distance` is not a positive finite number.
pub fn monolayer_from_sheets(
    apical: &Epithelium,
    basal: &Epithelium,
    distance: f64,
) -> Result<Epithelium, TopologyError> {
    if !(distance.is_finite() && distance > 0.0) {
        return Err(ConfigurationError::InvalidCoefficient {
            name: "distance".to_string(),
            value: distance,
        }
        .into());
    }
    check_sheets(apical, basal)?;

    let (nf, ne) = (apical.n_faces(), apical.n_edges());
    let layout = MonolayerLayout::new(apical.n_verts(), basal.n_verts(), nf, ne);
    let half = distance / 2.0;

    let vertices: Vec<Vertex> = layered(apical.vertices(), Segment::Apical, half)
        .chain(layered(basal.vertices(), Segment::Basal, -half))
        .collect();

    let mut faces = Vec::with_capacity(layout.total(Element::Face));
    for (segment, count) in [(Segment::Apical, nf), (Segment::Basal, nf), (Segment::Lateral, ne)] {
        faces.extend((0..count).map(|id| Face {
            segment,
            id_sheet: Some(id),
        }));
    }

    let mut edges = vec![HalfEdge::new(0, 0, 0, Segment::Lateral); layout.total(Element::Edge)];
    for (k, (a, b)) in apical.edges().iter().zip(basal.edges()).enumerate() {
        let (s, t) = (a.srce, a.trgt);
        let (s_b, t_b) = (layout.basal_vertex(b.srce), layout.basal_vertex(b.trgt));

        edges[k] = provenance(HalfEdge::new(s, t, a.face, Segment::Apical).with_cell(a.face), k);
        edges[layout.basal_edge(k)] = provenance(
            HalfEdge::new(t_b, s_b, layout.basal_face(b.face), Segment::Basal).with_cell(b.face),
            k,
        );

        let lateral = layout.lateral_face(k);
        for (role, (srce, trgt)) in LateralRole::ALL
            .into_iter()
            .zip([(t, s), (s, s_b), (s_b, t_b), (t_b, t)])
        {
            edges[layout.lateral_edge(k, role)] = provenance(
                HalfEdge::new(srce, trgt, lateral, Segment::Lateral).with_cell(a.face),
                k,
            );
        }
    }

    let cells = (0..nf).map(|id| Cell { id_sheet: Some(id) }).collect();

    let mut vert_data = Columns::stack(Element::Vert, &[apical.vert_data(), basal.vert_data()]);
    vert_data.fill(params::IS_ACTIVE, 1.0);
    let lateral_edges = apical.edge_data().empty_like(4 * ne);
    let mut edge_data = Columns::stack(
        Element::Edge,
        &[apical.edge_data(), basal.edge_data(), &lateral_edges],
    );
    edge_data.fill(params::IS_ACTIVE, 1.0);
    let lateral_faces = apical.face_data().empty_like(ne);
    let face_data = Columns::stack(
        Element::Face,
        &[apical.face_data(), basal.face_data(), &lateral_faces],
    );

    let mut settings = basal.settings().clone();
    settings.extend(apical.settings().iter().map(|(k, &v)| (k.clone(), v)));

    let mut monolayer = Epithelium::from_tables(
        format!("{}+{}", apical.identifier(), basal.identifier()),
        vertices,
        edges,
        faces,
        cells,
        vert_data,
        edge_data,
        face_data,
        Columns::new(Element::Cell, nf),
        settings,
    )?;
    monolayer.invalidate_geometry();

    debug!(
        verts = monolayer.n_verts(),
        edges = monolayer.n_edges(),
        faces = monolayer.n_faces(),
        cells = monolayer.n_cells(),
        distance,
        "Assembled monolayer."
    );
    Ok(monolayer)
}

fn check_sheets(apical: &Epithelium, basal: &Epithelium) -> Result<(), TopologyError> {
    if apical.is_bulk() {
        return Err(TopologyError::NotASheet("apical"));
    }
    if basal.is_bulk() {
        return Err(TopologyError::NotASheet("basal"));
    }
    let counts = [
        ("faces", apical.n_faces(), basal.n_faces()),
        ("edges", apical.n_edges(), basal.n_edges()),
    ];
    for (what, a, b) in counts {
        if a != b {
            return Err(TopologyError::SheetMismatch {
                what,
                apical: a,
                basal: b,
            });
        }
    }
    for face in 0..apical.n_faces() {
        let (a, b) = (apical.num_sides(face), basal.num_sides(face));
        if a != b {
            return Err(TopologyError::DegreeMismatch {
                face,
                apical: a,
                basal: b,
            });
        }
    }
    Ok(())
}

fn layered(vertices: &[Vertex], segment: Segment, z: f64) -> impl Iterator<Item = Vertex> + '_ {
    vertices.iter().enumerate().map(move |(id, vertex)| {
        let mut position = vertex.position;
        position.z = z;
        Vertex {
            position,
            segment,
            id_sheet: Some(id),
        }
    })
}

fn provenance(mut edge: HalfEdge, id: usize) -> HalfEdge {
    edge.id_sheet = Some(id);
    edge
}
