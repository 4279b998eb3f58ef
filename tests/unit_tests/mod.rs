use fetra::connectivity::{Segment2d1Connectivity, Tri3d2Connectivity};
use fetra::mesh::procedural::{create_interval_uniform_mesh, create_unit_square_uniform_tri_mesh_2d};
use fetra::mesh::{IntervalMesh, TriangleMesh2d};
use fetra::space::LagrangeSpace;
use nalgebra::{U1, U2};

mod assembly;
mod constraints;
mod estimate;
mod interpolate;
mod mean_value;
mod mesh;
mod projection;

pub type IntervalSpace = LagrangeSpace<f64, U1, Segment2d1Connectivity>;
pub type TriangleSpace = LagrangeSpace<f64, U2, Tri3d2Connectivity>;

/// Linear Lagrange space on `[a, b]` with `num_cells` cells.
pub fn interval_space(a: f64, b: f64, num_cells: usize, num_components: usize) -> IntervalSpace {
    let mesh: IntervalMesh<f64> = create_interval_uniform_mesh(a, b, num_cells);
    LagrangeSpace::new(mesh, num_components)
}

/// Linear Lagrange space on a uniform triangulation of the unit square.
pub fn unit_square_triangle_space(cells_per_dim: usize, num_components: usize) -> TriangleSpace {
    let mesh: TriangleMesh2d<f64> = create_unit_square_uniform_tri_mesh_2d(cells_per_dim);
    LagrangeSpace::new(mesh, num_components)
}
