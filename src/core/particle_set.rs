use crate::core::particle::ParticleDomain;
use crate::core::quadrature::signed_volume;
use crate::math::{Dimension, Real};

/// Particle data of one object.
///
/// Parallel arrays indexed by particle. Domains are the primary state; the
/// position, deformation gradient and volume are derived from them by the
/// update stages.
#[derive(Clone, Debug, Default)]
pub struct ParticleSet<D: Dimension> {
    domains: Vec<ParticleDomain<D>>,
    positions: Vec<D::Vector>,
    deformation_gradients: Vec<D::Matrix>,
    volumes: Vec<Real>,
    dirichlet: Vec<bool>,
}

impl<D: Dimension> ParticleSet<D> {
    pub fn new() -> Self {
        Self {
            domains: Vec::new(),
            positions: Vec::new(),
            deformation_gradients: Vec::new(),
            volumes: Vec::new(),
            dirichlet: Vec::new(),
        }
    }

    /// Regular block of `counts` box domains of edge `spacing`, starting at
    /// `origin`, x-fastest. Neighboring domains share corners exactly, so the
    /// block pairs with [`crate::core::DomainMesh::lattice`].
    pub fn lattice(origin: D::Vector, spacing: Real, counts: D::Coord) -> Self {
        let cells: Vec<usize> = (0..D::DIM)
            .map(|axis| D::coord_component(counts, axis).max(0) as usize)
            .collect();
        let total: usize = cells.iter().product();
        let half = D::repeat_vector(0.5 * spacing);

        let mut set = Self::new();
        for index in 0..total {
            let mut rest = index;
            let offset = D::vector_from_fn(|axis| {
                let c = rest % cells[axis];
                rest /= cells[axis];
                (c as Real + 0.5) * spacing
            });
            set.push(ParticleDomain::axis_aligned(origin + offset, half));
        }
        set
    }

    /// Add a particle. Position starts at the domain center, the deformation
    /// gradient at identity and the volume at the domain volume.
    pub fn push(&mut self, domain: ParticleDomain<D>) -> usize {
        let index = self.domains.len();
        self.positions.push(domain.center());
        self.deformation_gradients.push(D::identity_matrix());
        self.volumes.push(signed_volume::<D>(domain.current()));
        self.dirichlet.push(false);
        self.domains.push(domain);
        index
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn domains(&self) -> &[ParticleDomain<D>] {
        &self.domains
    }

    pub fn domain(&self, particle: usize) -> Option<&ParticleDomain<D>> {
        self.domains.get(particle)
    }

    pub fn positions(&self) -> &[D::Vector] {
        &self.positions
    }

    pub fn deformation_gradients(&self) -> &[D::Matrix] {
        &self.deformation_gradients
    }

    pub fn volumes(&self) -> &[Real] {
        &self.volumes
    }

    pub fn dirichlet(&self) -> &[bool] {
        &self.dirichlet
    }

    /// Pin a particle: the position update leaves it where it is.
    pub fn set_dirichlet(&mut self, particle: usize, fixed: bool) {
        self.dirichlet[particle] = fixed;
    }

    pub(crate) fn domains_mut(&mut self) -> &mut [ParticleDomain<D>] {
        &mut self.domains
    }

    pub(crate) fn deformation_gradients_mut(&mut self) -> &mut [D::Matrix] {
        &mut self.deformation_gradients
    }

    pub(crate) fn volumes_mut(&mut self) -> &mut [Real] {
        &mut self.volumes
    }

    /// Domains together with the Dirichlet flags, for the position update.
    pub(crate) fn domains_and_positions_mut(
        &mut self,
    ) -> (&[ParticleDomain<D>], &[bool], &mut [D::Vector]) {
        (&self.domains, &self.dirichlet, &mut self.positions)
    }
}
