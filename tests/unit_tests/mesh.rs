use fetra::connectivity::{Connectivity, Quad4d2Connectivity, Tri3d2Connectivity};
use fetra::mesh::procedural::{
    create_interval_uniform_mesh, create_rectangular_uniform_quad_mesh_2d, create_unit_box_uniform_tet_mesh_3d,
    create_unit_square_uniform_quad_mesh_2d, create_unit_square_uniform_tri_mesh_2d,
};
use fetra::mesh::BoundaryIndicator;
use fetra::space::{BoundaryFunctionSpace, LagrangeSpace};
use nalgebra::Vector2;
use proptest::prelude::*;

#[test]
fn quad4_find_boundary_faces() {
    // Single quad
    {
        let mesh = create_unit_square_uniform_quad_mesh_2d::<f64>(1);
        let boundary_faces = mesh.find_boundary_faces();

        let cells: Vec<_> = boundary_faces
            .iter()
            .cloned()
            .map(|(_, cell, _)| cell)
            .collect();
        let mut local_indices: Vec<_> = boundary_faces
            .iter()
            .cloned()
            .map(|(_, _, idx)| idx)
            .collect();
        local_indices.sort();

        assert_eq!(cells, [0, 0, 0, 0]);
        assert_eq!(local_indices, [0, 1, 2, 3]);
    }

    // 2x2 quads
    {
        let mesh = create_unit_square_uniform_quad_mesh_2d::<f64>(2);
        assert_eq!(mesh.find_boundary_faces().len(), 8);
        assert_eq!(mesh.find_faces().len(), 12);
        assert_eq!(mesh.find_boundary_vertices(), [0, 1, 2, 3, 5, 6, 7, 8]);
    }
}

#[test]
fn split_quads_preserve_vertices_and_boundary() {
    let quads = create_unit_square_uniform_quad_mesh_2d::<f64>(3);
    let triangles = quads.clone().split_into_triangles();

    assert_eq!(triangles.vertices(), quads.vertices());
    assert_eq!(triangles.connectivity().len(), 2 * quads.connectivity().len());
    assert_eq!(triangles.find_boundary_vertices(), quads.find_boundary_vertices());
    assert_eq!(triangles.find_boundary_faces().len(), 12);
}

#[test]
fn unit_box_tet_mesh_is_conforming() {
    let mesh = create_unit_box_uniform_tet_mesh_3d::<f64>(1);
    assert_eq!(mesh.vertices().len(), 8);
    assert_eq!(mesh.connectivity().len(), 6);
    // Every face of the cube is split into two triangles
    assert_eq!(mesh.find_boundary_faces().len(), 12);
    assert_eq!(mesh.find_boundary_vertices().len(), 8);

    let mesh = create_unit_box_uniform_tet_mesh_3d::<f64>(2);
    assert_eq!(mesh.find_boundary_faces().len(), 6 * 4 * 2);
    assert_eq!(mesh.find_boundary_vertices().len(), 27 - 1);
}

#[test]
fn tet_mesh_elements_have_positive_volume() {
    use fetra::element::FiniteElement;
    let mesh = create_unit_box_uniform_tet_mesh_3d::<f64>(2);
    let xi = nalgebra::Point3::origin();
    for i in 0..mesh.connectivity().len() {
        let element = mesh.get_element(i).unwrap();
        assert!(element.reference_jacobian(&xi).determinant().abs() > 0.0);
    }
}

#[test]
fn interval_mesh_labels_end_points() {
    let mesh = create_interval_uniform_mesh(0.0, 2.0, 4);
    assert_eq!(mesh.vertices().len(), 5);
    assert_eq!(mesh.vertices()[4].x, 2.0);

    let faces: Vec<_> = mesh
        .find_faces()
        .into_iter()
        .filter(|face| face.boundary.is_some())
        .map(|face| (face.connectivity.vertex_indices()[0], face.boundary.unwrap().value()))
        .collect();
    assert_eq!(faces, [(0, 0), (4, 1)]);
    assert_eq!(
        mesh.boundary_indicators(),
        [BoundaryIndicator::new(0).unwrap(), BoundaryIndicator::new(1).unwrap()]
    );
}

#[test]
fn assigned_boundary_indicators_are_visible_in_space() {
    let mut mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2);
    let top = BoundaryIndicator::new(7).unwrap();
    mesh.assign_boundary_indicators(|centroid| {
        if centroid.y == 1.0 {
            top
        } else {
            BoundaryIndicator::default()
        }
    });
    assert_eq!(mesh.boundary_indicators(), [BoundaryIndicator::default(), top]);

    let space = LagrangeSpace::new(mesh, 1);
    let top_faces = (0..space.num_faces())
        .filter(|&face| space.face_boundary(face) == Some(top))
        .count();
    let interior_faces = (0..space.num_faces())
        .filter(|&face| space.face_boundary(face).is_none())
        .count();
    assert_eq!(top_faces, 2);
    // 16 edges in total, 8 on the boundary
    assert_eq!(interior_faces, 8);
}

#[test]
fn indicators_of_interior_faces_are_ignored() {
    let mut mesh = create_unit_square_uniform_quad_mesh_2d::<f64>(2);
    // Vertices 1 and 4 form the edge between the two top cells
    mesh.set_boundary_indicator(&[4, 1], BoundaryIndicator::new(3).unwrap());
    assert_eq!(mesh.boundary_indicators(), [BoundaryIndicator::default()]);
}

#[test]
fn tri3d2_connectivity_faces_wrap_around() {
    let conn = Tri3d2Connectivity([3, 5, 9]);
    let faces: Vec<_> = (0..conn.num_faces())
        .map(|i| conn.get_face_connectivity(i).unwrap().0)
        .collect();
    assert_eq!(faces, [[3, 5], [5, 9], [9, 3]]);
    assert!(conn.get_face_connectivity(3).is_none());
}

proptest! {
    #[test]
    fn rectangular_mesh_has_expected_size(units_x in 1..4usize, units_y in 1..4usize, cells_per_unit in 1..4usize) {
        let mesh = create_rectangular_uniform_quad_mesh_2d(
            1.0, units_x, units_y, cells_per_unit, &Vector2::new(0.0, 0.0));
        let nx = units_x * cells_per_unit;
        let ny = units_y * cells_per_unit;
        prop_assert_eq!(mesh.vertices().len(), (nx + 1) * (ny + 1));
        prop_assert_eq!(mesh.connectivity().len(), nx * ny);
        prop_assert_eq!(mesh.find_boundary_faces().len(), 2 * (nx + ny));
        prop_assert!(mesh.connectivity().iter().all(|&Quad4d2Connectivity(c)| c.iter().all(|&v| v < mesh.vertices().len())));
    }
}
