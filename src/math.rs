//! Checked integer arithmetic matching the ledger program.
//!
//! Every primitive fails with [`HookAmmError::ArithmeticFault`] instead of
//! wrapping, and every division rounds toward zero like the on-chain integer
//! division does.

use crate::error::{HookAmmError, HookAmmResult};

/// `floor(a * b / c)` on u64 quantities, with a u128 intermediate.
///
/// Fails when `c == 0` or when the quotient does not fit back into a u64.
pub fn mul_div(a: u64, b: u64, c: u64) -> HookAmmResult<u64> {
    let result = mul_div_u128(u128::from(a), u128::from(b), u128::from(c))?;
    to_u64(result)
}

/// `floor(a * b / c)` on u128 quantities.
///
/// There is no wider intermediate here, so a product that overflows u128 is
/// reported as a fault rather than truncated.
pub fn mul_div_u128(a: u128, b: u128, c: u128) -> HookAmmResult<u128> {
    a.checked_mul(b)
        .ok_or(HookAmmError::ArithmeticFault("mul_div multiply"))?
        .checked_div(c)
        .ok_or(HookAmmError::ArithmeticFault("mul_div divide by zero"))
}

pub fn checked_add(a: u64, b: u64) -> HookAmmResult<u64> {
    a.checked_add(b).ok_or(HookAmmError::ArithmeticFault("add"))
}

pub fn checked_sub(a: u64, b: u64) -> HookAmmResult<u64> {
    a.checked_sub(b).ok_or(HookAmmError::ArithmeticFault("sub"))
}

pub fn checked_add_u128(a: u128, b: u128) -> HookAmmResult<u128> {
    a.checked_add(b).ok_or(HookAmmError::ArithmeticFault("add"))
}

pub fn checked_mul_u128(a: u128, b: u128) -> HookAmmResult<u128> {
    a.checked_mul(b).ok_or(HookAmmError::ArithmeticFault("mul"))
}

/// Narrows a u128 intermediate back to a u64 amount.
pub fn to_u64(value: u128) -> HookAmmResult<u64> {
    u64::try_from(value).map_err(|_| HookAmmError::ArithmeticFault("u64 conversion"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use num_bigint::BigUint;
    use num_traits::ToPrimitive;
    use proptest::prelude::*;

    fn big_floor(a: u64, b: u64, c: u64) -> Option<u64> {
        (BigUint::from(a) * BigUint::from(b) / BigUint::from(c)).to_u64()
    }

    proptest! {
        #[test]
        fn mul_div_matches_arbitrary_precision(
            a in any::<u64>(),
            b in any::<u64>(),
            c in 1..=u64::MAX,
        ) {
            match big_floor(a, b, c) {
                Some(expected) => prop_assert_eq!(mul_div(a, b, c), Ok(expected)),
                None => prop_assert!(mul_div(a, b, c).is_err()),
            }
        }

        #[test]
        fn mul_div_u128_never_wraps(
            a in any::<u128>(),
            b in any::<u128>(),
            c in 1..=u128::MAX,
        ) {
            match a.checked_mul(b) {
                Some(product) => prop_assert_eq!(mul_div_u128(a, b, c), Ok(product / c)),
                None => prop_assert!(mul_div_u128(a, b, c).is_err()),
            }
        }
    }

    #[test]
    fn mul_div_rounds_toward_zero() {
        assert_eq!(mul_div(999, 100, 10_000), Ok(9));
        assert_eq!(mul_div(1_000_000_000, 100, 10_000), Ok(10_000_000));
        assert_eq!(mul_div(7, 1, 2), Ok(3));
    }

    #[test]
    fn mul_div_full_width_product() {
        // u64::MAX * u64::MAX only fits in the u128 intermediate
        assert_eq!(mul_div(u64::MAX, u64::MAX, u64::MAX), Ok(u64::MAX));
    }

    #[test]
    fn mul_div_faults() {
        assert_matches!(mul_div(1, 1, 0), Err(HookAmmError::ArithmeticFault(_)));
        assert_matches!(mul_div(u64::MAX, 2, 1), Err(HookAmmError::ArithmeticFault(_)));
        assert_matches!(
            mul_div_u128(u128::MAX, 2, 1),
            Err(HookAmmError::ArithmeticFault(_))
        );
    }

    #[test]
    fn add_sub_faults() {
        assert_eq!(checked_add(1, 2), Ok(3));
        assert_matches!(checked_add(u64::MAX, 1), Err(HookAmmError::ArithmeticFault(_)));
        assert_eq!(checked_sub(3, 2), Ok(1));
        assert_matches!(checked_sub(0, 1), Err(HookAmmError::ArithmeticFault(_)));
        assert_matches!(to_u64(u128::from(u64::MAX) + 1), Err(HookAmmError::ArithmeticFault(_)));
    }
}
