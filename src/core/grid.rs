//! Background grid for CPDI2 interpolation
//!
//! Uniform node lattice, any node count per axis, x-fastest flat indexing.

use crate::math::{Dimension, Real};

/// Flat index of a grid node (`x + nx * (y + ny * z)`).
pub type NodeIndex = usize;

/// Uniform background grid. Node `(i, j[, k])` sits at `origin + h * (i, j[, k])`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<D: Dimension> {
    origin: D::Vector,
    cell_width: Real,
    resolution: D::Coord,
}

impl<D: Dimension> Grid<D> {
    /// `resolution` is the number of nodes along each axis.
    pub fn new(origin: D::Vector, cell_width: Real, resolution: D::Coord) -> Self {
        debug_assert!(cell_width > 0.0, "grid cell width must be positive");
        debug_assert!(
            (0..D::DIM).all(|axis| D::coord_component(resolution, axis) > 0),
            "grid needs at least one node per axis"
        );
        Self {
            origin,
            cell_width,
            resolution,
        }
    }

    /// Grid anchored at the world origin.
    pub fn with_resolution(cell_width: Real, resolution: D::Coord) -> Self {
        Self::new(D::zero_vector(), cell_width, resolution)
    }

    pub fn origin(&self) -> D::Vector {
        self.origin
    }

    pub fn cell_width(&self) -> Real {
        self.cell_width
    }

    pub fn resolution(&self) -> D::Coord {
        self.resolution
    }

    #[inline]
    fn axis_nodes(&self, axis: usize) -> i32 {
        D::coord_component(self.resolution, axis)
    }

    pub fn node_count(&self) -> usize {
        (0..D::DIM)
            .map(|axis| self.axis_nodes(axis) as usize)
            .product()
    }

    #[inline]
    pub fn contains_coord(&self, coord: D::Coord) -> bool {
        (0..D::DIM).all(|axis| {
            let c = D::coord_component(coord, axis);
            c >= 0 && c < self.axis_nodes(axis)
        })
    }

    /// Flat index of a lattice coordinate, `None` outside the grid.
    #[inline]
    pub fn node_index(&self, coord: D::Coord) -> Option<NodeIndex> {
        if !self.contains_coord(coord) {
            return None;
        }
        let mut index = 0usize;
        for axis in (0..D::DIM).rev() {
            index = index * self.axis_nodes(axis) as usize + D::coord_component(coord, axis) as usize;
        }
        Some(index)
    }

    #[inline]
    pub fn node_coord(&self, index: NodeIndex) -> D::Coord {
        let mut rest = index;
        D::coord_from_fn(|axis| {
            let n = self.axis_nodes(axis) as usize;
            let c = rest % n;
            rest /= n;
            c as i32
        })
    }

    #[inline]
    pub fn coord_position(&self, coord: D::Coord) -> D::Vector {
        self.origin + D::vector_from_fn(|axis| D::coord_component(coord, axis) as Real) * self.cell_width
    }

    #[inline]
    pub fn node_position(&self, index: NodeIndex) -> D::Vector {
        self.coord_position(self.node_coord(index))
    }

    /// Visit every grid node whose lattice distance to `query` is within
    /// `radius` cells along every axis. The box is clipped to the grid, so an
    /// infinite radius visits the whole grid.
    pub fn for_each_node_in_support<F>(&self, query: D::Vector, radius: Real, mut f: F)
    where
        F: FnMut(NodeIndex, D::Vector),
    {
        let mut lo = [0i32; 3];
        let mut hi = [0i32; 3];
        for axis in 0..D::DIM {
            let local = (D::component(query, axis) - D::component(self.origin, axis)) / self.cell_width;
            let last = self.axis_nodes(axis) - 1;
            lo[axis] = ((local - radius).ceil() as i32).max(0);
            hi[axis] = ((local + radius).floor() as i32).min(last);
            if lo[axis] > hi[axis] {
                return;
            }
        }

        let mut cursor = lo;
        loop {
            let coord = D::coord_from_fn(|axis| cursor[axis]);
            if let Some(index) = self.node_index(coord) {
                f(index, self.coord_position(coord));
            }

            let mut axis = 0;
            loop {
                if axis == D::DIM {
                    return;
                }
                if cursor[axis] < hi[axis] {
                    cursor[axis] += 1;
                    break;
                }
                cursor[axis] = lo[axis];
                axis += 1;
            }
        }
    }

    /// Largest number of nodes a support box of `radius` cells around a
    /// region `extent` cells wide can hold, clipped to the grid.
    pub fn max_nodes_in_support(&self, radius: Real, extent: Real) -> usize {
        (0..D::DIM)
            .map(|axis| {
                let span = 2.0 * radius + extent;
                let per_axis = if span.is_finite() {
                    span.floor() as usize + 1
                } else {
                    usize::MAX
                };
                per_axis.min(self.axis_nodes(axis) as usize)
            })
            .product()
    }
}

/// Per-node grid velocity lookup, read-only during a pass.
pub trait GridVelocityField<D: Dimension>: Sync {
    fn node_count(&self) -> usize;
    fn velocity(&self, node: NodeIndex) -> D::Vector;
}

/// Dense nodal velocity storage.
#[derive(Clone, Debug, PartialEq)]
pub struct GridVelocities<D: Dimension> {
    values: Vec<D::Vector>,
}

impl<D: Dimension> GridVelocities<D> {
    pub fn zeros(node_count: usize) -> Self {
        Self::uniform(node_count, D::zero_vector())
    }

    pub fn uniform(node_count: usize, velocity: D::Vector) -> Self {
        Self {
            values: vec![velocity; node_count],
        }
    }

    /// Sample a velocity field at every node position of `grid`.
    pub fn from_fn(grid: &Grid<D>, mut f: impl FnMut(D::Vector) -> D::Vector) -> Self {
        Self {
            values: (0..grid.node_count())
                .map(|index| f(grid.node_position(index)))
                .collect(),
        }
    }

    pub fn set(&mut self, node: NodeIndex, velocity: D::Vector) {
        self.values[node] = velocity;
    }

    pub fn as_slice(&self) -> &[D::Vector] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [D::Vector] {
        &mut self.values
    }
}

impl<D: Dimension> GridVelocityField<D> for GridVelocities<D> {
    #[inline]
    fn node_count(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn velocity(&self, node: NodeIndex) -> D::Vector {
        self.values[node]
    }
}
