//! Grid support sets and per-step interpolation buffers.
//!
//! A particle or a domain corner is associated with a bounded, variable
//! number of grid nodes. [`SupportSet`] stores them in storage pre-sized to
//! its capacity and tracks the valid count explicitly; pushing past the
//! capacity is an error, never a silent truncation.

use crate::core::grid::{Grid, NodeIndex};
use crate::core::kernel::GridWeightFunction;
use crate::math::{Dimension, Real};

/// One grid node's weight and weight gradient for a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeWeightGradient<D: Dimension> {
    pub node: NodeIndex,
    pub weight: Real,
    pub gradient: D::Vector,
}

impl<D: Dimension> NodeWeightGradient<D> {
    pub fn new(node: NodeIndex, weight: Real, gradient: D::Vector) -> Self {
        Self {
            node,
            weight,
            gradient,
        }
    }
}

/// Returned by [`SupportSet::try_push`] when the set is full.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupportOverflow {
    pub capacity: usize,
}

/// Bounded collection of node/weight/gradient entries.
#[derive(Clone, Debug, PartialEq)]
pub struct SupportSet<D: Dimension> {
    entries: Vec<NodeWeightGradient<D>>,
    capacity: usize,
}

impl<D: Dimension> SupportSet<D> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of valid entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn try_push(&mut self, entry: NodeWeightGradient<D>) -> Result<(), SupportOverflow> {
        if self.entries.len() == self.capacity {
            return Err(SupportOverflow {
                capacity: self.capacity,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    #[inline]
    pub fn as_slice(&self) -> &[NodeWeightGradient<D>] {
        &self.entries
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, NodeWeightGradient<D>> {
        self.entries.iter()
    }

    pub fn weight_sum(&self) -> Real {
        self.entries.iter().map(|entry| entry.weight).sum()
    }

    pub fn max_node(&self) -> Option<NodeIndex> {
        self.entries.iter().map(|entry| entry.node).max()
    }

    /// Evaluate `weight_function` for every grid node around `query`,
    /// keeping nodes with a non-zero weight or gradient.
    pub fn evaluate<W>(
        &mut self,
        grid: &Grid<D>,
        weight_function: &W,
        query: D::Vector,
    ) -> Result<(), SupportOverflow>
    where
        W: GridWeightFunction<D> + ?Sized,
    {
        self.clear();
        let cell_width = grid.cell_width();
        let zero = D::zero_vector();
        let mut overflow = None;
        grid.for_each_node_in_support(query, weight_function.support_radius(), |node, position| {
            if overflow.is_some() {
                return;
            }
            let weight = weight_function.weight(position, query, cell_width);
            let gradient = weight_function.gradient(position, query, cell_width);
            if weight == 0.0 && gradient == zero {
                return;
            }
            if let Err(err) = self.try_push(NodeWeightGradient::new(node, weight, gradient)) {
                overflow = Some(err);
            }
        });
        match overflow {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<'a, D: Dimension> IntoIterator for &'a SupportSet<D> {
    type Item = &'a NodeWeightGradient<D>;
    type IntoIter = std::slice::Iter<'a, NodeWeightGradient<D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Capacities of particle-level and corner-level support sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupportCapacity {
    pub particle: usize,
    pub corner: usize,
    /// Bound for sets assembled across neighboring domains: particle sets and
    /// blended corners of the enriched path.
    pub enriched: usize,
}

impl SupportCapacity {
    /// Enriched sets get the particle capacity.
    pub const fn new(particle: usize, corner: usize) -> Self {
        Self {
            particle,
            corner,
            enriched: particle,
        }
    }

    pub const fn with_enriched(mut self, enriched: usize) -> Self {
        self.enriched = enriched;
        self
    }

    /// Bound derived from the weight function radius `r`, for domains whose
    /// bounding box is at most `max_domain_extent` cells wide.
    ///
    /// A corner (a point) or a domain center touches at most `floor(2r) + 1`
    /// nodes per axis, and a whole domain `floor(2r + extent) + 1`. A blended
    /// corner gathers the centers of the neighbors meeting at its vertex. A
    /// center is the mean of `n` corners, one of them the shared vertex, so it
    /// lies within `(1 - 1/n) extent` of that vertex. An enriched particle set
    /// therefore spans at most `extent + 2 (1 - 1/n) extent`.
    pub fn derive<D, W>(grid: &Grid<D>, weight_function: &W, max_domain_extent: Real) -> Self
    where
        D: Dimension,
        W: GridWeightFunction<D> + ?Sized,
    {
        let radius = weight_function.support_radius();
        let center_reach = (1.0 - 1.0 / D::CORNER_COUNT as Real) * max_domain_extent;
        Self {
            particle: grid.max_nodes_in_support(radius, max_domain_extent),
            corner: grid.max_nodes_in_support(radius, 0.0),
            enriched: grid.max_nodes_in_support(radius, max_domain_extent + 2.0 * center_reach),
        }
    }
}

/// Per-corner quantities of the enriched path, averaged over the domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerWeight<D: Dimension> {
    /// `(1/V) ∫ N_c dΩ` over the current domain.
    pub weight: Real,
    /// `(1/V₀) ∫ ∇_X N_c dΩ₀` over the reference domain.
    pub gradient_to_reference: D::Vector,
    /// `(1/V) ∫ ∇_x N_c dΩ` over the current domain.
    pub gradient_to_current: D::Vector,
}

/// Interpolation data of one particle for the current step.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleInterpolation<D: Dimension> {
    pub particle: SupportSet<D>,
    /// One support set per domain corner.
    pub corners: Vec<SupportSet<D>>,
    /// Filled by the enriched path only.
    pub corner_weights: Vec<CornerWeight<D>>,
}

impl<D: Dimension> ParticleInterpolation<D> {
    pub fn new(capacity: SupportCapacity) -> Self {
        Self {
            particle: SupportSet::with_capacity(capacity.particle),
            corners: (0..D::CORNER_COUNT)
                .map(|_| SupportSet::with_capacity(capacity.corner))
                .collect(),
            corner_weights: Vec::new(),
        }
    }
}

/// Interpolation buffers of one particle object.
///
/// Overwritten (not accumulated) by every weight update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterpolationBuffers<D: Dimension> {
    particles: Vec<ParticleInterpolation<D>>,
}

impl<D: Dimension> InterpolationBuffers<D> {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[ParticleInterpolation<D>] {
        &self.particles
    }

    pub fn get(&self, particle: usize) -> Option<&ParticleInterpolation<D>> {
        self.particles.get(particle)
    }

    pub(crate) fn replace(&mut self, particles: Vec<ParticleInterpolation<D>>) {
        self.particles = particles;
    }

    /// Largest node index referenced by any corner support set.
    pub fn max_corner_node(&self) -> Option<NodeIndex> {
        self.particles
            .iter()
            .flat_map(|p| p.corners.iter())
            .filter_map(SupportSet::max_node)
            .max()
    }
}
