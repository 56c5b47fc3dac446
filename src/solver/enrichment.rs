//! Interpolation weights with interface enrichment
//!
//! Particle weights are assembled from the corners of the current domain:
//!
//! ```text
//! w_ip  = Σ_c w_c S_i(c)        w_c = (1/V) ∫ N_c dΩ
//! ∇w_ip = Σ_c S_i(c) ḡ_c        ḡ_c = (1/V) ∫ ∇_x N_c dΩ
//! ```
//!
//! For a plain corner `S_i(c)` is the grid weight at the corner. For a corner
//! on an enriched mesh vertex it is replaced by the volume-weighted mean of the
//! grid weights at the centers of every domain meeting at that vertex, so the
//! corner follows the material on both sides of the interface instead of the
//! grid field at a single point.
//!
//! The work runs in two passes over the particles. The first computes the
//! per-domain integrals and supports, the second blends across neighbors and
//! assembles the particle-level sets. Nothing is written before both succeed.

use indexmap::IndexMap;

use crate::core::{
    CornerWeight, DomainQuadrature, ElementCorner, Grid, GridWeightFunction, NodeIndex, NodeWeightGradient,
    ParticleInterpolation, ParticleSet, SupportCapacity, SupportOverflow, SupportSet, VolumetricMesh,
};
use crate::error::{Cpdi2Error, Cpdi2Result};
use crate::math::{Dimension, Real};

use super::{capacity_exceeded, degenerate_domain, try_map_particles};

/// First-pass results of one domain.
struct DomainIntegrals<D: Dimension> {
    volume: Real,
    corner_weights: Vec<CornerWeight<D>>,
    /// Grid supports of the plain corners; enriched corners stay empty.
    corners: Vec<SupportSet<D>>,
    /// Grid support at the domain center, only for domains touching an
    /// enriched vertex.
    center: Option<SupportSet<D>>,
}

/// Reject meshes and flag arrays that do not describe `particles`.
pub fn validate_enrichment_inputs<D, M>(
    particles: &ParticleSet<D>,
    mesh: &M,
    enriched_vertices: &[bool],
) -> Cpdi2Result<()>
where
    D: Dimension,
    M: VolumetricMesh + ?Sized,
{
    if mesh.corners_per_element() != D::CORNER_COUNT {
        return Err(Cpdi2Error::mismatch(
            "mesh corners per element",
            D::CORNER_COUNT,
            mesh.corners_per_element(),
        ));
    }
    if mesh.element_count() != particles.len() {
        return Err(Cpdi2Error::mismatch(
            "mesh elements",
            particles.len(),
            mesh.element_count(),
        ));
    }
    if enriched_vertices.len() != mesh.vertex_count() {
        return Err(Cpdi2Error::mismatch(
            "enrichment flags",
            mesh.vertex_count(),
            enriched_vertices.len(),
        ));
    }
    validate_mesh_incidence(mesh)
}

/// Every element corner names an existing vertex that lists it back, and
/// every vertex lists only corners located at it.
fn validate_mesh_incidence<M: VolumetricMesh + ?Sized>(mesh: &M) -> Cpdi2Result<()> {
    let corners = mesh.corners_per_element();
    for vertex in 0..mesh.vertex_count() {
        for at in mesh.vertex_corners(vertex) {
            if at.element >= mesh.element_count() || at.corner >= corners {
                return Err(Cpdi2Error::InvalidMesh(format!(
                    "vertex {} lists corner {} of element {} outside {} elements of {} corners",
                    vertex,
                    at.corner,
                    at.element,
                    mesh.element_count(),
                    corners
                )));
            }
            if mesh.element_vertex(at.element, at.corner) != vertex {
                return Err(Cpdi2Error::InvalidMesh(format!(
                    "vertex {} lists corner {} of element {}, which sits at vertex {}",
                    vertex,
                    at.corner,
                    at.element,
                    mesh.element_vertex(at.element, at.corner)
                )));
            }
        }
    }
    for element in 0..mesh.element_count() {
        for corner in 0..corners {
            let vertex = mesh.element_vertex(element, corner);
            if vertex >= mesh.vertex_count() {
                return Err(Cpdi2Error::InvalidMesh(format!(
                    "element {} references vertex {} of {}",
                    element,
                    vertex,
                    mesh.vertex_count()
                )));
            }
            let listed = mesh
                .vertex_corners(vertex)
                .contains(&ElementCorner { element, corner });
            if !listed {
                return Err(Cpdi2Error::InvalidMesh(format!(
                    "vertex {} does not list corner {} of element {}",
                    vertex, corner, element
                )));
            }
        }
    }
    Ok(())
}

/// Per-domain quantities of the current and reference configuration.
///
/// Returns the current volume and the per-corner averaged weights and
/// gradients.
pub fn domain_corner_weights<D: Dimension>(
    current: &D::Corners,
    reference: &D::Corners,
    tolerance: Real,
    object: usize,
    particle: usize,
) -> Cpdi2Result<(Real, Vec<CornerWeight<D>>)> {
    let current_quadrature = DomainQuadrature::<D>::new(current, tolerance)
        .map_err(|err| degenerate_domain::<D>(object, particle, current, err))?;
    let reference_quadrature = DomainQuadrature::<D>::new(reference, tolerance)
        .map_err(|err| degenerate_domain::<D>(object, particle, reference, err))?;

    let volume = current_quadrature.volume();
    let inv_volume = 1.0 / volume;
    let inv_reference_volume = 1.0 / reference_quadrature.volume();

    let corner_weights = (0..D::CORNER_COUNT)
        .map(|corner| CornerWeight {
            weight: current_quadrature.integrate_shape_function(corner) * inv_volume,
            gradient_to_reference: reference_quadrature.integrate_shape_function_gradient(corner)
                * inv_reference_volume,
            gradient_to_current: current_quadrature.integrate_shape_function_gradient(corner)
                * inv_volume,
        })
        .collect();
    Ok((volume, corner_weights))
}

#[allow(clippy::too_many_arguments)]
fn integrate_domain<D, W, M>(
    grid: &Grid<D>,
    weight_function: &W,
    particles: &ParticleSet<D>,
    mesh: &M,
    enriched_vertices: &[bool],
    capacity: SupportCapacity,
    tolerance: Real,
    object: usize,
    particle: usize,
) -> Cpdi2Result<DomainIntegrals<D>>
where
    D: Dimension,
    W: GridWeightFunction<D> + ?Sized,
    M: VolumetricMesh + ?Sized,
{
    let domain = &particles.domains()[particle];
    let (volume, corner_weights) =
        domain_corner_weights::<D>(domain.current(), domain.reference(), tolerance, object, particle)?;

    let mut touches_interface = false;
    let mut corners = Vec::with_capacity(D::CORNER_COUNT);
    for corner in 0..D::CORNER_COUNT {
        let mut support = SupportSet::with_capacity(capacity.corner);
        if enriched_vertices[mesh.element_vertex(particle, corner)] {
            touches_interface = true;
        } else {
            support
                .evaluate(grid, weight_function, domain.current_corner(corner))
                .map_err(|overflow| capacity_exceeded(object, particle, Some(corner), overflow))?;
        }
        corners.push(support);
    }

    let center = if touches_interface {
        let mut support = SupportSet::with_capacity(capacity.corner);
        support
            .evaluate(grid, weight_function, domain.center())
            .map_err(|overflow| capacity_exceeded(object, particle, None, overflow))?;
        Some(support)
    } else {
        None
    };

    Ok(DomainIntegrals {
        volume,
        corner_weights,
        corners,
        center,
    })
}

/// Volume-weighted mean of the center supports of every domain at `vertex`.
fn blend_vertex_support<D, M>(
    integrals: &[DomainIntegrals<D>],
    mesh: &M,
    vertex: usize,
    capacity: usize,
) -> Result<SupportSet<D>, SupportOverflow>
where
    D: Dimension,
    M: VolumetricMesh + ?Sized,
{
    let incident = mesh.vertex_corners(vertex);
    let total_volume: Real = incident.iter().map(|at| integrals[at.element].volume).sum();

    let mut blended: IndexMap<NodeIndex, (Real, D::Vector)> = IndexMap::new();
    for at in incident {
        let domain = &integrals[at.element];
        let Some(center) = domain.center.as_ref() else {
            continue;
        };
        let share = domain.volume / total_volume;
        for entry in center {
            let slot = blended
                .entry(entry.node)
                .or_insert((0.0, D::zero_vector()));
            slot.0 += share * entry.weight;
            slot.1 += entry.gradient * share;
        }
    }

    let mut support = SupportSet::with_capacity(capacity);
    for (node, (weight, gradient)) in blended {
        support.try_push(NodeWeightGradient::new(node, weight, gradient))?;
    }
    Ok(support)
}

fn assemble_particle<D, M>(
    integrals: &[DomainIntegrals<D>],
    mesh: &M,
    enriched_vertices: &[bool],
    capacity: SupportCapacity,
    object: usize,
    particle: usize,
) -> Cpdi2Result<ParticleInterpolation<D>>
where
    D: Dimension,
    M: VolumetricMesh + ?Sized,
{
    let own = &integrals[particle];
    let mut corners = Vec::with_capacity(D::CORNER_COUNT);
    for corner in 0..D::CORNER_COUNT {
        let vertex = mesh.element_vertex(particle, corner);
        let support = if enriched_vertices[vertex] {
            blend_vertex_support(integrals, mesh, vertex, capacity.enriched)
                .map_err(|overflow| capacity_exceeded(object, particle, Some(corner), overflow))?
        } else {
            own.corners[corner].clone()
        };
        corners.push(support);
    }

    let zero = D::zero_vector();
    let mut assembled: IndexMap<NodeIndex, (Real, D::Vector)> = IndexMap::new();
    for (support, corner_weight) in corners.iter().zip(&own.corner_weights) {
        for entry in support {
            let slot = assembled.entry(entry.node).or_insert((0.0, zero));
            slot.0 += corner_weight.weight * entry.weight;
            slot.1 += corner_weight.gradient_to_current * entry.weight;
        }
    }

    let mut particle_support = SupportSet::with_capacity(capacity.enriched);
    for (node, (weight, gradient)) in assembled {
        if weight == 0.0 && gradient == zero {
            continue;
        }
        particle_support
            .try_push(NodeWeightGradient::new(node, weight, gradient))
            .map_err(|overflow| capacity_exceeded(object, particle, None, overflow))?;
    }

    Ok(ParticleInterpolation {
        particle: particle_support,
        corners,
        corner_weights: own.corner_weights.clone(),
    })
}

/// Enriched interpolation data of every particle of an object, in particle
/// order. `enriched_vertices` holds one flag per mesh vertex.
#[allow(clippy::too_many_arguments)]
pub fn compute_enriched_interpolation_weights<D, W, M>(
    grid: &Grid<D>,
    weight_function: &W,
    particles: &ParticleSet<D>,
    mesh: &M,
    enriched_vertices: &[bool],
    capacity: SupportCapacity,
    tolerance: Real,
    object: usize,
) -> Cpdi2Result<Vec<ParticleInterpolation<D>>>
where
    D: Dimension,
    W: GridWeightFunction<D> + ?Sized,
    M: VolumetricMesh + ?Sized,
{
    validate_enrichment_inputs(particles, mesh, enriched_vertices)?;

    let integrals = try_map_particles(particles.len(), |particle| {
        integrate_domain(
            grid,
            weight_function,
            particles,
            mesh,
            enriched_vertices,
            capacity,
            tolerance,
            object,
            particle,
        )
    })?;

    try_map_particles(particles.len(), |particle| {
        assemble_particle(&integrals, mesh, enriched_vertices, capacity, object, particle)
    })
}
