//! Volumetric mesh over the particle domains of one object.
//!
//! Elements are particles, vertices are domain corners shared between
//! neighboring particles. The enriched weight update walks the
//! vertex → (element, corner) adjacency to find the domains that meet at an
//! interface corner.

use indexmap::IndexMap;

use crate::config::constants::DEFAULT_WELD_TOLERANCE;
use crate::core::particle_set::ParticleSet;
use crate::error::{Cpdi2Error, Cpdi2Result};
use crate::math::{Dimension, Real};

/// A corner of one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementCorner {
    pub element: usize,
    pub corner: usize,
}

/// Element connectivity consumed by the enriched weight update.
pub trait VolumetricMesh: Sync {
    fn element_count(&self) -> usize;
    fn vertex_count(&self) -> usize;
    fn corners_per_element(&self) -> usize;
    /// Mesh vertex at `corner` of `element`.
    fn element_vertex(&self, element: usize, corner: usize) -> usize;
    /// Every (element, corner) pair located at `vertex`.
    fn vertex_corners(&self, vertex: usize) -> &[ElementCorner];
}

#[derive(Clone, Debug, PartialEq)]
pub struct DomainMesh {
    corners_per_element: usize,
    element_vertices: Vec<usize>,
    vertex_corners: Vec<Vec<ElementCorner>>,
}

impl DomainMesh {
    /// Build from flat connectivity: `element_vertices[e * corners_per_element + c]`
    /// is the vertex at corner `c` of element `e`, following the domain corner
    /// numbering.
    pub fn new(
        corners_per_element: usize,
        element_vertices: Vec<usize>,
        vertex_count: usize,
    ) -> Cpdi2Result<Self> {
        if corners_per_element == 0 || element_vertices.len() % corners_per_element != 0 {
            return Err(Cpdi2Error::InvalidMesh(format!(
                "{} vertex references do not split into elements of {} corners",
                element_vertices.len(),
                corners_per_element
            )));
        }

        let mut vertex_corners = vec![Vec::new(); vertex_count];
        for (slot, &vertex) in element_vertices.iter().enumerate() {
            let Some(incident) = vertex_corners.get_mut(vertex) else {
                return Err(Cpdi2Error::InvalidMesh(format!(
                    "element {} references vertex {} of {}",
                    slot / corners_per_element,
                    vertex,
                    vertex_count
                )));
            };
            incident.push(ElementCorner {
                element: slot / corners_per_element,
                corner: slot % corners_per_element,
            });
        }

        Ok(Self {
            corners_per_element,
            element_vertices,
            vertex_corners,
        })
    }

    /// Structured block of `counts` elements, x-fastest, with shared corners.
    pub fn lattice<D: Dimension>(counts: D::Coord) -> Self {
        let cells: Vec<usize> = (0..D::DIM)
            .map(|axis| D::coord_component(counts, axis).max(0) as usize)
            .collect();
        let verts: Vec<usize> = cells.iter().map(|n| n + 1).collect();
        let element_count: usize = cells.iter().product();
        let vertex_count: usize = verts.iter().product();

        let mut element_vertices = Vec::with_capacity(element_count * D::CORNER_COUNT);
        for element in 0..element_count {
            let mut rest = element;
            let cell: Vec<usize> = cells
                .iter()
                .map(|n| {
                    let c = rest % n;
                    rest /= n;
                    c
                })
                .collect();
            for corner in 0..D::CORNER_COUNT {
                let mut vertex = 0;
                for axis in (0..D::DIM).rev() {
                    let offset = (corner >> axis) & 1;
                    vertex = vertex * verts[axis] + cell[axis] + offset;
                }
                element_vertices.push(vertex);
            }
        }

        let mut vertex_corners = vec![Vec::new(); vertex_count];
        for (slot, &vertex) in element_vertices.iter().enumerate() {
            vertex_corners[vertex].push(ElementCorner {
                element: slot / D::CORNER_COUNT,
                corner: slot % D::CORNER_COUNT,
            });
        }

        Self {
            corners_per_element: D::CORNER_COUNT,
            element_vertices,
            vertex_corners,
        }
    }

    /// Merge corners whose positions coincide up to `tolerance` (per axis)
    /// into shared vertices. Vertex ids follow first appearance; a corner joins
    /// the earliest vertex within tolerance.
    pub fn weld<'a, D, I>(domains: I, tolerance: Real) -> Self
    where
        D: Dimension,
        I: IntoIterator<Item = &'a D::Corners>,
    {
        let tolerance = tolerance.max(Real::EPSILON);
        let inv = 1.0 / tolerance;
        // Bucket edge equals the tolerance, so a match lies in a neighboring bucket.
        let mut buckets: IndexMap<[i64; 3], Vec<usize>> = IndexMap::new();
        let mut vertices: Vec<D::Vector> = Vec::new();
        let mut element_vertices = Vec::new();

        for corners in domains {
            for &position in corners.as_ref() {
                let mut key = [0i64; 3];
                for (axis, slot) in key.iter_mut().enumerate().take(D::DIM) {
                    *slot = (D::component(position, axis) * inv).floor() as i64;
                }

                let mut found: Option<usize> = None;
                for offset in 0..3usize.pow(D::DIM as u32) {
                    let mut neighbor = key;
                    let mut rest = offset;
                    for slot in neighbor.iter_mut().take(D::DIM) {
                        *slot += (rest % 3) as i64 - 1;
                        rest /= 3;
                    }
                    let Some(candidates) = buckets.get(&neighbor) else {
                        continue;
                    };
                    for &vertex in candidates {
                        let close = (0..D::DIM).all(|axis| {
                            (D::component(vertices[vertex], axis) - D::component(position, axis)).abs()
                                <= tolerance
                        });
                        if close && found.is_none_or(|best| vertex < best) {
                            found = Some(vertex);
                        }
                    }
                }

                let vertex = match found {
                    Some(vertex) => vertex,
                    None => {
                        let vertex = vertices.len();
                        vertices.push(position);
                        buckets.entry(key).or_default().push(vertex);
                        vertex
                    }
                };
                element_vertices.push(vertex);
            }
        }

        let mut vertex_corners = vec![Vec::new(); vertices.len()];
        for (slot, &vertex) in element_vertices.iter().enumerate() {
            vertex_corners[vertex].push(ElementCorner {
                element: slot / D::CORNER_COUNT,
                corner: slot % D::CORNER_COUNT,
            });
        }

        Self {
            corners_per_element: D::CORNER_COUNT,
            element_vertices,
            vertex_corners,
        }
    }
}

impl DomainMesh {
    /// Weld the reference corners of an object's particles.
    pub fn from_particles<D: Dimension>(particles: &ParticleSet<D>) -> Self {
        Self::weld::<D, _>(
            particles.domains().iter().map(|domain| domain.reference()),
            DEFAULT_WELD_TOLERANCE,
        )
    }
}

impl VolumetricMesh for DomainMesh {
    fn element_count(&self) -> usize {
        self.element_vertices.len() / self.corners_per_element
    }

    fn vertex_count(&self) -> usize {
        self.vertex_corners.len()
    }

    fn corners_per_element(&self) -> usize {
        self.corners_per_element
    }

    #[inline]
    fn element_vertex(&self, element: usize, corner: usize) -> usize {
        self.element_vertices[element * self.corners_per_element + corner]
    }

    #[inline]
    fn vertex_corners(&self, vertex: usize) -> &[ElementCorner] {
        &self.vertex_corners[vertex]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particle::ParticleDomain;
    use crate::math::{Dim2, Dim3};
    use bevy::math::{IVec2, IVec3, Vec2};

    #[test]
    fn lattice_shares_interior_vertices() {
        let mesh = DomainMesh::lattice::<Dim2>(IVec2::new(2, 2));
        assert_eq!(mesh.element_count(), 4);
        assert_eq!(mesh.vertex_count(), 9);
        // center vertex (1, 1) touches all four elements
        assert_eq!(mesh.vertex_corners(4).len(), 4);
        assert_eq!(mesh.element_vertex(0, 3), 4);
        assert_eq!(mesh.element_vertex(3, 0), 4);
    }

    #[test]
    fn lattice_3d_counts() {
        let mesh = DomainMesh::lattice::<Dim3>(IVec3::new(2, 1, 3));
        assert_eq!(mesh.element_count(), 6);
        assert_eq!(mesh.vertex_count(), 3 * 2 * 4);
        assert_eq!(mesh.corners_per_element(), 8);
    }

    #[test]
    fn weld_matches_lattice_topology() {
        let domains: Vec<_> = [Vec2::new(0.5, 0.5), Vec2::new(1.5, 0.5)]
            .into_iter()
            .map(|center| *ParticleDomain::<Dim2>::axis_aligned(center, Vec2::splat(0.5)).current())
            .collect();
        let mesh = DomainMesh::weld::<Dim2, _>(domains.iter(), 1e-5);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.element_vertex(0, 1), mesh.element_vertex(1, 0));
        assert_eq!(mesh.element_vertex(0, 3), mesh.element_vertex(1, 2));
    }

    /// Two unit-high quads meeting at an edge placed at `left_x` and `right_x`.
    fn split_edge(left_x: f32, right_x: f32) -> [[Vec2; 4]; 2] {
        [
            [
                Vec2::new(-1.0, 0.0),
                Vec2::new(left_x, 0.0),
                Vec2::new(-1.0, 1.0),
                Vec2::new(left_x, 1.0),
            ],
            [
                Vec2::new(right_x, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(right_x, 1.0),
                Vec2::new(1.0, 1.0),
            ],
        ]
    }

    #[test]
    fn weld_merges_corners_across_bucket_edges() {
        for (left_x, right_x) in [(1.4999e-5, 1.5001e-5), (0.99999e-5, 1.00001e-5)] {
            let domains = split_edge(left_x, right_x);
            let mesh = DomainMesh::weld::<Dim2, _>(domains.iter(), 1e-5);
            assert_eq!(mesh.vertex_count(), 6);
            assert_eq!(mesh.element_vertex(0, 1), mesh.element_vertex(1, 0));
            assert_eq!(mesh.element_vertex(0, 3), mesh.element_vertex(1, 2));
            assert_eq!(mesh.vertex_corners(mesh.element_vertex(0, 1)).len(), 2);
        }
    }

    #[test]
    fn weld_keeps_corners_beyond_tolerance_apart() {
        let domains = [
            *ParticleDomain::<Dim2>::axis_aligned(Vec2::new(0.5, 0.5), Vec2::splat(0.5)).current(),
            *ParticleDomain::<Dim2>::axis_aligned(Vec2::new(1.5001, 0.5), Vec2::splat(0.5)).current(),
        ];
        let mesh = DomainMesh::weld::<Dim2, _>(domains.iter(), 1e-5);
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn particles_weld_into_shared_corners() {
        let set = ParticleSet::<Dim3>::lattice(bevy::math::Vec3::ZERO, 0.1, IVec3::new(2, 2, 1));
        let mesh = DomainMesh::from_particles(&set);
        assert_eq!(mesh.element_count(), 4);
        assert_eq!(mesh.vertex_count(), 3 * 3 * 2);
        // the central edge is shared by all four elements
        assert_eq!(mesh.vertex_corners(mesh.element_vertex(0, 3)).len(), 4);
    }

    #[test]
    fn new_rejects_dangling_vertex() {
        let result = DomainMesh::new(4, vec![0, 1, 2, 7], 4);
        assert!(matches!(result, Err(Cpdi2Error::InvalidMesh(_))));
    }
}
