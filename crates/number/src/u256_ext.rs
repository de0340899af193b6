//! Extension trait for U256 arithmetic operations.

use alloy::primitives::{U256, U512};

/// Overflow safe arithmetic on U256.
pub trait U256Ext: Sized {
    /// Computes `self * numerator / denominator` rounding down, without
    /// overflowing in the intermediate product. Returns `None` on division
    /// by zero or if the result does not fit.
    fn checked_mul_div(&self, numerator: &Self, denominator: &Self) -> Option<Self>;
}

impl U256Ext for U256 {
    fn checked_mul_div(&self, numerator: &Self, denominator: &Self) -> Option<Self> {
        if denominator.is_zero() {
            return None;
        }
        narrow(widen(*self) * widen(*numerator) / widen(*denominator))
    }
}

/// Zero-extends a 256-bit value to 512 bits.
pub fn widen(value: U256) -> U512 {
    let mut limbs = [0u64; 8];
    limbs[..4].copy_from_slice(value.as_limbs());
    U512::from_limbs(limbs)
}

/// Truncating conversion back to 256 bits, `None` if the value does not fit.
pub fn narrow(value: U512) -> Option<U256> {
    let limbs = value.as_limbs();
    if limbs[4..].iter().any(|limb| *limb != 0) {
        return None;
    }
    let mut low = [0u64; 4];
    low.copy_from_slice(&limbs[..4]);
    Some(U256::from_limbs(low))
}
