//! Field operators over scalar and vector grids

pub mod gradient;
pub mod poisson;
pub mod helmholtz;
pub mod swirl;
pub mod height;
pub mod fluid;

use crate::image::buffer::ScalarImage;

/// Cell validity for the masked operators.
///
/// Masked-out cells contribute nothing to derivatives and are skipped by
/// the relaxation solvers.
pub enum Mask<'a> {
    /// Cells whose field value equals `zero` are invalid.
    ZeroValue { field: &'a ScalarImage, zero: f32 },
    /// Explicit per-cell validity.
    Bools(&'a [bool]),
}

impl Mask<'_> {
    #[inline]
    pub(crate) fn is_valid(&self, idx: usize) -> bool {
        match self {
            Mask::ZeroValue { field, zero } => field.as_slice()[idx] != *zero,
            Mask::Bools(bools) => bools[idx],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Mask::ZeroValue { field, .. } => field.len(),
            Mask::Bools(bools) => bools.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[inline]
pub(crate) fn valid(mask: Option<&Mask>, idx: usize) -> bool {
    mask.is_none_or(|m| m.is_valid(idx))
}
