use rust_decimal::Decimal;

use crate::error::{AppError, AppResult, FieldError};

/// Largest amount a money column holds.
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// Request bodies that carry their own field rules.
pub trait Validate {
    fn validate(&self) -> AppResult<()>;
}

/// Collects every failed field check before reporting, so one 400 lists them all.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(mut self, ok: bool, field: &str, message: &str) -> Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn required(self, field: &str, value: &str) -> Self {
        self.check(!value.trim().is_empty(), field, "is required")
    }

    /// Amounts must fit a `DECIMAL(14,2)` column: non-negative, whole cents,
    /// at most [`max_amount`].
    pub fn money(self, field: &str, value: Decimal) -> Self {
        if value.is_sign_negative() {
            self.check(false, field, "must not be negative")
        } else if value > max_amount() {
            self.check(false, field, "must not exceed 999999999999.99")
        } else {
            self.check(value.normalize().scale() <= 2, field, "must have at most 2 decimal places")
        }
    }

    pub fn email(self, field: &str, value: &str) -> Self {
        let value = value.trim();
        let ok = match value.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
            None => false,
        };
        self.check(ok, field, "must be a valid email address")
    }

    pub fn finish(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_all_failures() {
        let result = Checks::new()
            .required("name", "  ")
            .money("amount", Decimal::new(-1, 0))
            .email("email", "nobody")
            .finish();

        match result {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, ["name", "amount", "email"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn zero_is_not_negative() {
        assert!(Checks::new().money("amount", Decimal::ZERO).finish().is_ok());
    }

    #[test]
    fn money_is_bounded_to_the_column() {
        assert!(Checks::new().money("amount", max_amount()).finish().is_ok());
        assert!(Checks::new()
            .money("amount", max_amount() + Decimal::new(1, 2))
            .finish()
            .is_err());
        let huge: Decimal = "50000000000000000000000000000".parse().unwrap();
        assert!(Checks::new().money("amount", huge).finish().is_err());
    }

    #[test]
    fn money_keeps_whole_cents() {
        let cents: Decimal = "10.50".parse().unwrap();
        let trailing: Decimal = "10.500".parse().unwrap();
        let fraction: Decimal = "10.005".parse().unwrap();
        assert!(Checks::new().money("amount", cents).finish().is_ok());
        assert!(Checks::new().money("amount", trailing).finish().is_ok());
        match Checks::new().money("amount", fraction).finish() {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors[0].message, "must have at most 2 decimal places");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
