use std::fmt::Debug;
use std::hash::Hash;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use bevy::math::{IVec2, IVec3, Mat2, Mat3, Vec2, Vec3};

pub type Real = f32;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Dim2 {}
    impl Sealed for super::Dim3 {}
}

/// Spatial dimensionality of a particle domain.
///
/// Only [`Dim2`] and [`Dim3`] implement this trait. The whole update method
/// is written once against it, so both dimensions share a single code path.
pub trait Dimension: sealed::Sealed + Copy + Debug + Default + Send + Sync + 'static {
    /// Number of spatial axes.
    const DIM: usize;
    /// Number of domain corners (4 quadrilateral corners or 8 hexahedral corners).
    const CORNER_COUNT: usize;
    const NAME: &'static str;

    type Vector: Copy
        + Debug
        + Default
        + PartialEq
        + Send
        + Sync
        + 'static
        + Add<Output = Self::Vector>
        + Sub<Output = Self::Vector>
        + Mul<Real, Output = Self::Vector>
        + Div<Real, Output = Self::Vector>
        + Neg<Output = Self::Vector>
        + AddAssign
        + SubAssign
        + Sum;

    type Matrix: Copy
        + Debug
        + PartialEq
        + Send
        + Sync
        + 'static
        + Add<Output = Self::Matrix>
        + Sub<Output = Self::Matrix>
        + Mul<Real, Output = Self::Matrix>
        + Mul<Self::Vector, Output = Self::Vector>
        + Mul<Output = Self::Matrix>
        + AddAssign;

    /// Integer lattice coordinate of a grid node.
    type Coord: Copy + Debug + Eq + Hash + Send + Sync + 'static;

    /// Fixed-size array holding one vector per domain corner.
    type Corners: Copy
        + Debug
        + PartialEq
        + Send
        + Sync
        + 'static
        + AsRef<[Self::Vector]>
        + AsMut<[Self::Vector]>;

    fn component(v: Self::Vector, axis: usize) -> Real;
    fn vector_from_fn(f: impl FnMut(usize) -> Real) -> Self::Vector;

    fn coord_component(c: Self::Coord, axis: usize) -> i32;
    fn coord_from_fn(f: impl FnMut(usize) -> i32) -> Self::Coord;

    fn corners_from_fn(f: impl FnMut(usize) -> Self::Vector) -> Self::Corners;

    /// Build a matrix whose row `i` is `row(i)`.
    fn matrix_from_rows(row: impl FnMut(usize) -> Self::Vector) -> Self::Matrix;
    fn matrix_row(m: &Self::Matrix, row: usize) -> Self::Vector;

    fn identity_matrix() -> Self::Matrix;
    fn zero_matrix() -> Self::Matrix;
    fn determinant(m: &Self::Matrix) -> Real;
    fn inverse(m: &Self::Matrix) -> Self::Matrix;
    fn transpose(m: &Self::Matrix) -> Self::Matrix;

    /// `a ⊗ b`, i.e. the matrix `a bᵀ`.
    fn outer_product(a: Self::Vector, b: Self::Vector) -> Self::Matrix;
    fn dot(a: Self::Vector, b: Self::Vector) -> Real;

    #[inline(always)]
    fn zero_vector() -> Self::Vector {
        Self::vector_from_fn(|_| 0.0)
    }

    #[inline(always)]
    fn repeat_vector(value: Real) -> Self::Vector {
        Self::vector_from_fn(|_| value)
    }

    #[inline(always)]
    fn length(v: Self::Vector) -> Real {
        Self::dot(v, v).sqrt()
    }

    #[inline]
    fn vector_is_finite(v: Self::Vector) -> bool {
        (0..Self::DIM).all(|axis| Self::component(v, axis).is_finite())
    }

    #[inline]
    fn matrix_is_finite(m: &Self::Matrix) -> bool {
        (0..Self::DIM).all(|row| Self::vector_is_finite(Self::matrix_row(m, row)))
    }
}

/// Planar particle domains: quadrilaterals with 4 corners.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dim2;

/// Volumetric particle domains: hexahedra with 8 corners.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dim3;

impl Dimension for Dim2 {
    const DIM: usize = 2;
    const CORNER_COUNT: usize = 4;
    const NAME: &'static str = "2D";

    type Vector = Vec2;
    type Matrix = Mat2;
    type Coord = IVec2;
    type Corners = [Vec2; 4];

    #[inline(always)]
    fn component(v: Vec2, axis: usize) -> Real {
        v[axis]
    }

    #[inline(always)]
    fn vector_from_fn(mut f: impl FnMut(usize) -> Real) -> Vec2 {
        Vec2::new(f(0), f(1))
    }

    #[inline(always)]
    fn coord_component(c: IVec2, axis: usize) -> i32 {
        c[axis]
    }

    #[inline(always)]
    fn coord_from_fn(mut f: impl FnMut(usize) -> i32) -> IVec2 {
        IVec2::new(f(0), f(1))
    }

    #[inline(always)]
    fn corners_from_fn(f: impl FnMut(usize) -> Vec2) -> [Vec2; 4] {
        std::array::from_fn(f)
    }

    #[inline(always)]
    fn matrix_from_rows(mut row: impl FnMut(usize) -> Vec2) -> Mat2 {
        Mat2::from_cols(row(0), row(1)).transpose()
    }

    #[inline(always)]
    fn matrix_row(m: &Mat2, row: usize) -> Vec2 {
        m.row(row)
    }

    #[inline(always)]
    fn identity_matrix() -> Mat2 {
        Mat2::IDENTITY
    }

    #[inline(always)]
    fn zero_matrix() -> Mat2 {
        Mat2::ZERO
    }

    #[inline(always)]
    fn determinant(m: &Mat2) -> Real {
        m.determinant()
    }

    #[inline(always)]
    fn inverse(m: &Mat2) -> Mat2 {
        m.inverse()
    }

    #[inline(always)]
    fn transpose(m: &Mat2) -> Mat2 {
        m.transpose()
    }

    #[inline(always)]
    fn outer_product(a: Vec2, b: Vec2) -> Mat2 {
        Mat2::from_cols(a * b.x, a * b.y)
    }

    #[inline(always)]
    fn dot(a: Vec2, b: Vec2) -> Real {
        a.dot(b)
    }
}

impl Dimension for Dim3 {
    const DIM: usize = 3;
    const CORNER_COUNT: usize = 8;
    const NAME: &'static str = "3D";

    type Vector = Vec3;
    type Matrix = Mat3;
    type Coord = IVec3;
    type Corners = [Vec3; 8];

    #[inline(always)]
    fn component(v: Vec3, axis: usize) -> Real {
        v[axis]
    }

    #[inline(always)]
    fn vector_from_fn(mut f: impl FnMut(usize) -> Real) -> Vec3 {
        Vec3::new(f(0), f(1), f(2))
    }

    #[inline(always)]
    fn coord_component(c: IVec3, axis: usize) -> i32 {
        c[axis]
    }

    #[inline(always)]
    fn coord_from_fn(mut f: impl FnMut(usize) -> i32) -> IVec3 {
        IVec3::new(f(0), f(1), f(2))
    }

    #[inline(always)]
    fn corners_from_fn(f: impl FnMut(usize) -> Vec3) -> [Vec3; 8] {
        std::array::from_fn(f)
    }

    #[inline(always)]
    fn matrix_from_rows(mut row: impl FnMut(usize) -> Vec3) -> Mat3 {
        Mat3::from_cols(row(0), row(1), row(2)).transpose()
    }

    #[inline(always)]
    fn matrix_row(m: &Mat3, row: usize) -> Vec3 {
        m.row(row)
    }

    #[inline(always)]
    fn identity_matrix() -> Mat3 {
        Mat3::IDENTITY
    }

    #[inline(always)]
    fn zero_matrix() -> Mat3 {
        Mat3::ZERO
    }

    #[inline(always)]
    fn determinant(m: &Mat3) -> Real {
        m.determinant()
    }

    #[inline(always)]
    fn inverse(m: &Mat3) -> Mat3 {
        m.inverse()
    }

    #[inline(always)]
    fn transpose(m: &Mat3) -> Mat3 {
        m.transpose()
    }

    #[inline(always)]
    fn outer_product(a: Vec3, b: Vec3) -> Mat3 {
        Mat3::from_cols(a * b.x, a * b.y, a * b.z)
    }

    #[inline(always)]
    fn dot(a: Vec3, b: Vec3) -> Real {
        a.dot(b)
    }
}

/// Arithmetic mean of a set of corner positions.
#[inline]
pub fn corner_average<D: Dimension>(corners: &D::Corners) -> D::Vector {
    let corners = corners.as_ref();
    corners.iter().copied().sum::<D::Vector>() / corners.len() as Real
}
