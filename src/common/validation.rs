// src/common/validation.rs
//
// Validações customizadas reaproveitadas pelos payloads.

use rust_decimal::Decimal;
use validator::ValidationError;

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_values_are_rejected() {
        assert!(validate_not_negative(&Decimal::new(-1, 2)).is_err());
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
        assert!(validate_positive(&Decimal::ZERO).is_err());
        assert!(validate_positive(&Decimal::new(5, 1)).is_ok());
    }
}
