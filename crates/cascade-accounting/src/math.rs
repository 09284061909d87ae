//! Full-precision multiply-then-divide.
//!
//! `a * b` is computed in 256 bits so share conversions never overflow in
//! the intermediate product.

use primitive_types::U256;

use cascade_contracts::{
    account::{Amount, Rounding},
    error::{CascadeError, CascadeResult},
};

/// `a * b / denominator`, rounded as requested.
///
/// Saturates at `Amount::MAX` when the quotient does not fit, so capacity
/// views over unbounded strategies stay well-defined.
pub fn mul_div(
    a: Amount,
    b: Amount,
    denominator: Amount,
    rounding: Rounding,
) -> CascadeResult<Amount> {
    if denominator == 0 {
        return Err(CascadeError::Arithmetic {
            reason: "division by zero".to_string(),
        });
    }

    let product = U256::from(a) * U256::from(b);
    let (mut quotient, remainder) = product.div_mod(U256::from(denominator));
    if rounding == Rounding::Up && !remainder.is_zero() {
        quotient += U256::one();
    }

    if quotient > U256::from(Amount::MAX) {
        Ok(Amount::MAX)
    } else {
        Ok(quotient.low_u128())
    }
}

#[cfg(test)]
mod tests {
    use cascade_contracts::account::{Amount, Rounding};

    use super::mul_div;

    #[test]
    fn rounds_in_requested_direction() {
        assert_eq!(mul_div(10, 1, 3, Rounding::Down).unwrap(), 3);
        assert_eq!(mul_div(10, 1, 3, Rounding::Up).unwrap(), 4);
        assert_eq!(mul_div(9, 1, 3, Rounding::Up).unwrap(), 3);
    }

    #[test]
    fn wide_intermediate_product() {
        let big = Amount::MAX / 2;
        assert_eq!(mul_div(big, 4, 4, Rounding::Down).unwrap(), big);
    }

    #[test]
    fn saturates_when_quotient_overflows() {
        assert_eq!(mul_div(Amount::MAX, 3, 2, Rounding::Down).unwrap(), Amount::MAX);
    }

    #[test]
    fn zero_denominator_is_an_error() {
        assert!(mul_div(1, 1, 0, Rounding::Down).is_err());
    }
}
