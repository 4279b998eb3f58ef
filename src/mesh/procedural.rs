//! Basic procedural mesh generation routines.
use crate::connectivity::{Quad4d2Connectivity, Segment2d1Connectivity, Tet4Connectivity};
use crate::mesh::{BoundaryIndicator, IntervalMesh, QuadMesh2d, Tet4Mesh, TriangleMesh2d};
use crate::Real;
use nalgebra::{Point1, Point2, Point3, Vector2, Vector3};

/// Creates a uniform mesh of the interval `[a, b]`.
///
/// The left end point has boundary indicator `0` and the right end point has indicator `1`.
pub fn create_interval_uniform_mesh<T>(a: T, b: T, num_cells: usize) -> IntervalMesh<T>
where
    T: Real,
{
    assert!(num_cells > 0, "Interval mesh must have at least one cell.");
    let n = T::from_usize(num_cells).expect("Must be able to fit usize in T");
    let h = (b - a) / n;

    let vertices = (0..=num_cells)
        .map(|i| T::from_usize(i).expect("Must be able to fit usize in T"))
        .map(|i| Point1::new(a + i * h))
        .collect();
    let cells = (0..num_cells)
        .map(|i| Segment2d1Connectivity([i, i + 1]))
        .collect();

    let mut mesh = IntervalMesh::from_vertices_and_connectivity(vertices, cells);
    mesh.set_boundary_indicator(&[num_cells], BoundaryIndicator(1));
    mesh
}

pub fn create_unit_square_uniform_quad_mesh_2d<T>(cells_per_dim: usize) -> QuadMesh2d<T>
where
    T: Real,
{
    create_rectangular_uniform_quad_mesh_2d(T::one(), 1, 1, cells_per_dim, &Vector2::new(T::zero(), T::one()))
}

pub fn create_unit_square_uniform_tri_mesh_2d<T>(cells_per_dim: usize) -> TriangleMesh2d<T>
where
    T: Real,
{
    create_rectangular_uniform_quad_mesh_2d(T::one(), 1, 1, cells_per_dim, &Vector2::new(T::zero(), T::one()))
        .split_into_triangles()
}

/// Generates an axis-aligned rectangular uniform mesh given a unit length,
/// dimensions as multipliers of the unit length and the number of cells per unit length.
pub fn create_rectangular_uniform_quad_mesh_2d<T>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    top_left: &Vector2<T>,
) -> QuadMesh2d<T>
where
    T: Real,
{
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 {
        QuadMesh2d::from_vertices_and_connectivity(Vec::new(), Vec::new())
    } else {
        let mut vertices = Vec::new();
        let mut cells = Vec::new();

        let cell_size = unit_length / T::from_usize(cells_per_unit).expect("Must be able to fit usize in T");
        let num_cells_x = units_x * cells_per_unit;
        let num_cells_y = units_y * cells_per_unit;
        let num_vertices_x = num_cells_x + 1;
        let num_vertices_y = num_cells_y + 1;

        let to_global_vertex_index = |i, j| (num_cells_x + 1) * j + i;

        for j in 0..num_vertices_y {
            for i in 0..num_vertices_x {
                let i_as_t = T::from_usize(i).expect("Must be able to fit usize in T");
                let j_as_t = T::from_usize(j).expect("Must be able to fit usize in T");
                let v = top_left + Vector2::new(i_as_t, -j_as_t) * cell_size;
                vertices.push(Point2::from(v));
            }
        }

        for j in 0..num_cells_y {
            for i in 0..num_cells_x {
                let quad = Quad4d2Connectivity([
                    to_global_vertex_index(i, j + 1),
                    to_global_vertex_index(i + 1, j + 1),
                    to_global_vertex_index(i + 1, j),
                    to_global_vertex_index(i, j),
                ]);
                cells.push(quad);
            }
        }

        QuadMesh2d::from_vertices_and_connectivity(vertices, cells)
    }
}

/// Creates a uniform tetrahedral mesh of the unit cube `[0, 1]^3`.
///
/// Each of the `cells_per_dim^3` sub-cubes is split into six tetrahedra sharing the diagonal
/// from its lowest to its highest corner, which makes the mesh conforming.
pub fn create_unit_box_uniform_tet_mesh_3d<T>(cells_per_dim: usize) -> Tet4Mesh<T>
where
    T: Real,
{
    if cells_per_dim == 0 {
        return Tet4Mesh::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }

    let n = cells_per_dim;
    let h = T::one() / T::from_usize(n).expect("Must be able to fit usize in T");
    let to_global_vertex_index = |i: usize, j: usize, k: usize| (n + 1) * (n + 1) * k + (n + 1) * j + i;

    let mut vertices = Vec::with_capacity((n + 1) * (n + 1) * (n + 1));
    for k in 0..=n {
        for j in 0..=n {
            for i in 0..=n {
                let [x, y, z] = [i, j, k].map(|idx| T::from_usize(idx).expect("Must be able to fit usize in T") * h);
                vertices.push(Point3::from(Vector3::new(x, y, z)));
            }
        }
    }

    // Paths from the lowest to the highest corner along the axes, one per permutation
    const AXIS_PERMUTATIONS: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

    let mut cells = Vec::with_capacity(6 * n * n * n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                for permutation in &AXIS_PERMUTATIONS {
                    let mut corner = [i, j, k];
                    let mut tet = [to_global_vertex_index(i, j, k); 4];
                    for (local, &axis) in permutation.iter().enumerate() {
                        corner[axis] += 1;
                        tet[local + 1] = to_global_vertex_index(corner[0], corner[1], corner[2]);
                    }
                    cells.push(Tet4Connectivity(tet));
                }
            }
        }
    }

    Tet4Mesh::from_vertices_and_connectivity(vertices, cells)
}
