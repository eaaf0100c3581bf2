//! Optimum values with infinity and infinitesimals.
//!
//! A maximum over a set of strict and non-strict linear bounds is either
//! unbounded, attained exactly, or a supremum that is approached but never
//! reached. [`InfEps`] encodes all three as `∞` or `r + k·ε` where `ε` is a
//! positive quantity smaller than any positive rational.

use num_rational::BigRational;
use num_traits::Zero;
use std::fmt;

/// A rational extended with `+∞` and an infinitesimal offset.
///
/// A negative infinitesimal coefficient means the rational part is a strict
/// supremum: values arbitrarily close below it are achievable, the value
/// itself is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfEps {
    infinite: bool,
    value: BigRational,
    eps: BigRational,
}

impl InfEps {
    /// An exactly attained finite value.
    pub fn finite(value: BigRational) -> Self {
        Self {
            infinite: false,
            value,
            eps: BigRational::zero(),
        }
    }

    /// A finite value with an infinitesimal offset `value + eps·ε`.
    pub fn with_eps(value: BigRational, eps: BigRational) -> Self {
        Self {
            infinite: false,
            value,
            eps,
        }
    }

    /// The unbounded value `+∞`.
    pub fn infinite() -> Self {
        Self {
            infinite: true,
            value: BigRational::zero(),
            eps: BigRational::zero(),
        }
    }

    /// Whether the value is finite.
    pub fn is_finite(&self) -> bool {
        !self.infinite
    }

    /// The rational part. Meaningless when infinite.
    pub fn rational(&self) -> &BigRational {
        &self.value
    }

    /// The infinitesimal coefficient. Meaningless when infinite.
    pub fn infinitesimal(&self) -> &BigRational {
        &self.eps
    }
}

impl fmt::Display for InfEps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.infinite {
            return write!(f, "+oo");
        }
        if self.eps.is_zero() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} + {}*eps", self.value, self.eps)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_traits::Signed;

    fn rat(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    #[test]
    fn finite_value() {
        let v = InfEps::finite(rat(10));
        assert!(v.is_finite());
        assert_eq!(*v.rational(), rat(10));
        assert!(v.infinitesimal().is_zero());
    }

    #[test]
    fn strict_supremum() {
        let v = InfEps::with_eps(rat(3), rat(-1));
        assert!(v.is_finite());
        assert!(v.infinitesimal().is_negative());
        assert_eq!(v.to_string(), "3 + -1*eps");
    }

    #[test]
    fn unbounded() {
        let v = InfEps::infinite();
        assert!(!v.is_finite());
        assert_eq!(v.to_string(), "+oo");
    }
}
