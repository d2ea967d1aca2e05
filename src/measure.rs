//! Units of measure and typed scalar quantities (length, angle, scale).
//!
//! Every measured value carries its unit; the only conversion consumers
//! need is `si_value()`. Unit equality is by kind and conversion factor,
//! not by name, so "metre" and "meter" compare equal.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::f64::consts::PI;

use crate::error::{GeorefError, Result};

/// Absolute tolerance, in SI units, for EQUIVALENT numeric comparison
/// of values and unit conversion factors (angles compare in radians).
pub(crate) const SI_TOLERANCE: f64 = 1e-10;

pub(crate) fn tolerant_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= SI_TOLERANCE
}

/// The physical kind a unit measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Length,
    Angle,
    Scale,
    Time,
    Parametric,
    /// Unitless counts and codes.
    None,
}

/// A unit descriptor: a name, a conversion factor to the SI unit of the
/// same kind, and the kind itself.
#[derive(Clone, Debug)]
pub struct UnitOfMeasure {
    name: Cow<'static, str>,
    to_si: f64,
    kind: UnitKind,
}

impl UnitOfMeasure {
    pub const METRE: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("metre"),
        to_si: 1.0,
        kind: UnitKind::Length,
    };

    pub const KILOMETRE: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("kilometre"),
        to_si: 1000.0,
        kind: UnitKind::Length,
    };

    pub const FOOT: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("foot"),
        to_si: 0.3048,
        kind: UnitKind::Length,
    };

    pub const US_SURVEY_FOOT: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("US survey foot"),
        to_si: 12.0 / 39.37,
        kind: UnitKind::Length,
    };

    pub const RADIAN: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("radian"),
        to_si: 1.0,
        kind: UnitKind::Angle,
    };

    pub const DEGREE: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("degree"),
        to_si: PI / 180.0,
        kind: UnitKind::Angle,
    };

    pub const GRAD: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("grad"),
        to_si: PI / 200.0,
        kind: UnitKind::Angle,
    };

    pub const ARC_SECOND: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("arc-second"),
        to_si: PI / 648000.0,
        kind: UnitKind::Angle,
    };

    pub const MICRORADIAN: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("microradian"),
        to_si: 1e-6,
        kind: UnitKind::Angle,
    };

    pub const UNITY: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("unity"),
        to_si: 1.0,
        kind: UnitKind::Scale,
    };

    pub const PARTS_PER_MILLION: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("parts per million"),
        to_si: 1e-6,
        kind: UnitKind::Scale,
    };

    pub const SECOND: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("second"),
        to_si: 1.0,
        kind: UnitKind::Time,
    };

    pub const YEAR: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("year"),
        to_si: 31556925.445,
        kind: UnitKind::Time,
    };

    pub const NONE: UnitOfMeasure = UnitOfMeasure {
        name: Cow::Borrowed("none"),
        to_si: 1.0,
        kind: UnitKind::None,
    };

    /// Create a custom unit.
    pub fn new(name: impl Into<Cow<'static, str>>, to_si: f64, kind: UnitKind) -> Self {
        Self {
            name: name.into(),
            to_si,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Conversion factor to the SI unit of the same kind
    /// (metre, radian, unity, second).
    pub fn to_si(&self) -> f64 {
        self.to_si
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Short id understood by the `+proj=` surface (`+units=` / `xy_in=`),
    /// when the conversion factor matches a known unit within tolerance.
    pub fn proj_id(&self) -> Option<&'static str> {
        const LINEAR: &[(&str, f64)] = &[
            ("m", 1.0),
            ("km", 1000.0),
            ("ft", 0.3048),
            ("us-ft", 12.0 / 39.37),
        ];
        const ANGULAR: &[(&str, f64)] = &[
            ("rad", 1.0),
            ("deg", PI / 180.0),
            ("grad", PI / 200.0),
        ];
        let table = match self.kind {
            UnitKind::Length => LINEAR,
            UnitKind::Angle => ANGULAR,
            _ => return None,
        };
        table
            .iter()
            .find(|(_, factor)| tolerant_eq(*factor, self.to_si))
            .map(|(id, _)| *id)
    }
}

/// Units compare by kind and conversion factor; names are display-only.
impl PartialEq for UnitOfMeasure {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && tolerant_eq(self.to_si, other.to_si)
    }
}

/// A value tagged with its unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Measure {
    value: f64,
    unit: UnitOfMeasure,
}

impl Measure {
    pub fn new(value: f64, unit: UnitOfMeasure) -> Self {
        Self { value, unit }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &UnitOfMeasure {
        &self.unit
    }

    /// The value converted to the SI unit of the measure's kind.
    pub fn si_value(&self) -> f64 {
        self.value * self.unit.to_si
    }

    /// Re-express this measure in another unit of the same kind.
    pub fn convert_to_unit(&self, unit: UnitOfMeasure) -> Result<Measure> {
        if unit.kind() != self.unit.kind() {
            return Err(GeorefError::invalid_value(format!(
                "cannot convert {:?} measure to {:?} unit",
                self.unit.kind(),
                unit.kind()
            )));
        }
        Ok(Measure::new(self.si_value() / unit.to_si(), unit))
    }

    pub fn is_equivalent_to(&self, other: &Measure, strict: bool) -> bool {
        if strict {
            self == other
        } else {
            self.unit.kind == other.unit.kind && tolerant_eq(self.si_value(), other.si_value())
        }
    }
}

macro_rules! typed_measure {
    ($name:ident, $kind:expr, $default_unit:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name(Measure);

        impl $name {
            /// Value in the default unit for this quantity.
            pub fn new(value: f64) -> Self {
                Self(Measure::new(value, $default_unit))
            }

            pub fn with_unit(value: f64, unit: UnitOfMeasure) -> Result<Self> {
                if unit.kind() != $kind {
                    return Err(GeorefError::invalid_value(format!(
                        "{} requires a {:?} unit, got {:?}",
                        stringify!($name),
                        $kind,
                        unit.kind()
                    )));
                }
                Ok(Self(Measure::new(value, unit)))
            }

            pub fn value(&self) -> f64 {
                self.0.value()
            }

            pub fn unit(&self) -> &UnitOfMeasure {
                self.0.unit()
            }

            pub fn si_value(&self) -> f64 {
                self.0.si_value()
            }

            pub fn measure(&self) -> &Measure {
                &self.0
            }

            pub fn convert_to_unit(&self, unit: UnitOfMeasure) -> Result<Self> {
                Ok(Self(self.0.convert_to_unit(unit)?))
            }
        }

        impl std::ops::Neg for $name {
            type Output = $name;
            fn neg(self) -> $name {
                $name(Measure::new(-self.0.value, self.0.unit))
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                self.si_value().partial_cmp(&other.si_value())
            }
        }
    };
}

typed_measure!(
    Length,
    UnitKind::Length,
    UnitOfMeasure::METRE,
    "A length quantity; defaults to metres."
);
typed_measure!(
    Angle,
    UnitKind::Angle,
    UnitOfMeasure::DEGREE,
    "An angular quantity; defaults to degrees."
);
typed_measure!(
    Scale,
    UnitKind::Scale,
    UnitOfMeasure::UNITY,
    "A dimensionless scale quantity; defaults to unity."
);

impl Angle {
    pub fn radians(&self) -> f64 {
        self.si_value()
    }

    pub fn degrees(&self) -> f64 {
        self.si_value() * 180.0 / PI
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_equality_ignores_name() {
        let meter = UnitOfMeasure::new("meter", 1.0, UnitKind::Length);
        assert_eq!(meter, UnitOfMeasure::METRE);
        assert_ne!(UnitOfMeasure::METRE, UnitOfMeasure::FOOT);
        // Same factor, different kind
        assert_ne!(UnitOfMeasure::RADIAN, UnitOfMeasure::METRE);
    }

    #[test]
    fn test_degree_to_si() {
        let a = Angle::new(180.0);
        assert_relative_eq!(a.si_value(), PI, epsilon = 1e-15);
    }

    #[test]
    fn test_grad_conversion() {
        let a = Angle::with_unit(200.0, UnitOfMeasure::GRAD).unwrap();
        assert_relative_eq!(a.radians(), PI, epsilon = 1e-15);
        let in_deg = a.convert_to_unit(UnitOfMeasure::DEGREE).unwrap();
        assert_relative_eq!(in_deg.value(), 180.0, epsilon = 1e-12);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        assert!(Length::with_unit(1.0, UnitOfMeasure::DEGREE).is_err());
        let m = Measure::new(1.0, UnitOfMeasure::METRE);
        assert!(m.convert_to_unit(UnitOfMeasure::DEGREE).is_err());
    }

    #[test]
    fn test_proj_unit_ids() {
        assert_eq!(UnitOfMeasure::METRE.proj_id(), Some("m"));
        assert_eq!(UnitOfMeasure::DEGREE.proj_id(), Some("deg"));
        assert_eq!(UnitOfMeasure::GRAD.proj_id(), Some("grad"));
        assert_eq!(UnitOfMeasure::ARC_SECOND.proj_id(), None);
        assert_eq!(UnitOfMeasure::UNITY.proj_id(), None);
    }

    #[test]
    fn test_measure_equivalence_tolerant() {
        let a = Measure::new(1.0, UnitOfMeasure::METRE);
        let b = Measure::new(1.0 + 1e-14, UnitOfMeasure::METRE);
        assert!(a.is_equivalent_to(&b, false));
        let km = Measure::new(0.001, UnitOfMeasure::KILOMETRE);
        assert!(a.is_equivalent_to(&km, false));
        assert!(!a.is_equivalent_to(&km, true));
    }

    #[test]
    fn test_length_ordering() {
        let a = Length::new(1.0);
        let b = Length::with_unit(1.0, UnitOfMeasure::KILOMETRE).unwrap();
        assert!(a < b);
    }
}
