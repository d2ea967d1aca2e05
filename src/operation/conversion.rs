//! Conversions: coordinate operations without a datum change, fully
//! determined by their parameters. The deriving conversion of a
//! projected CRS is the canonical example.

use std::sync::Arc;

use super::methods::*;
use super::{
    find_parameter, parameter_sets_equivalent, OperationMethod, OperationParameterValue,
};
use crate::crs::Crs;
use crate::ident::{Criterion, IdentifiedObject};
use crate::measure::{tolerant_eq, Angle, Length, Scale, UnitOfMeasure};

#[derive(Clone, Debug)]
pub struct Conversion {
    ident: IdentifiedObject,
    method: OperationMethod,
    values: Vec<OperationParameterValue>,
    source: Option<Arc<Crs>>,
    target: Option<Arc<Crs>>,
    inverted: bool,
}

impl Conversion {
    pub fn new(
        ident: IdentifiedObject,
        method: OperationMethod,
        values: Vec<OperationParameterValue>,
    ) -> Self {
        Self {
            ident,
            method,
            values,
            source: None,
            target: None,
            inverted: false,
        }
    }

    /// Attach endpoint CRSs to a standalone conversion.
    pub fn with_crs(mut self, source: Arc<Crs>, target: Arc<Crs>) -> Self {
        self.source = Some(source);
        self.target = Some(target);
        self
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn name(&self) -> &str {
        self.ident.name()
    }

    pub fn method(&self) -> &OperationMethod {
        &self.method
    }

    pub fn values(&self) -> &[OperationParameterValue] {
        &self.values
    }

    pub fn source_crs(&self) -> Option<&Arc<Crs>> {
        self.source.as_ref()
    }

    pub fn target_crs(&self) -> Option<&Arc<Crs>> {
        self.target.as_ref()
    }

    /// Whether this conversion runs target-to-source.
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// The reverse conversion: same method and parameters, emitted as an
    /// inverted pipeline, endpoints swapped.
    pub fn inverse(&self) -> Conversion {
        Conversion {
            ident: IdentifiedObject::named(format!("Inverse of {}", self.ident.name())),
            method: self.method.clone(),
            values: self.values.clone(),
            source: self.target.clone(),
            target: self.source.clone(),
            inverted: !self.inverted,
        }
    }

    /// Numeric value of a parameter in the given unit.
    pub fn parameter_numeric(&self, param_code: u16, unit: &UnitOfMeasure) -> Option<f64> {
        find_parameter(&self.values, param_code)?.numeric_value_in(unit)
    }

    pub fn is_equivalent_to(&self, other: &Conversion, criterion: Criterion) -> bool {
        if criterion.is_strict() {
            return self.ident.matches_name(&other.ident, criterion)
                && self.method.is_equivalent_to(&other.method)
                && self.inverted == other.inverted
                && parameter_sets_equivalent(&self.values, &other.values, criterion);
        }
        if self.inverted != other.inverted {
            return false;
        }
        if self.method.is_equivalent_to(&other.method) {
            return parameter_sets_equivalent(&self.values, &other.values, criterion);
        }
        // A conversion expressed in an equivalent method (Mercator A vs B,
        // LCC 1SP vs 2SP) still compares equal after re-expression.
        if let Some(code) = other.method.epsg_code() {
            if let Some(converted) = self.convert_to_method(code, None) {
                return parameter_sets_equivalent(&converted.values, &other.values, criterion);
            }
        }
        false
    }

    /// Re-express this conversion in another method, when a closed-form
    /// equivalent exists. See [`super::method_convert`].
    pub fn convert_to_method(
        &self,
        target_method_code: u16,
        ellipsoid: Option<&crate::datum::Ellipsoid>,
    ) -> Option<Conversion> {
        super::method_convert::convert(self, target_method_code, ellipsoid)
    }

    // Named constructors for the common projections.

    pub fn transverse_mercator(
        ident: IdentifiedObject,
        latitude_origin: Angle,
        longitude_origin: Angle,
        scale: Scale,
        false_easting: Length,
        false_northing: Length,
    ) -> Conversion {
        Conversion::new(
            ident,
            OperationMethod::from_epsg(
                METHOD_TRANSVERSE_MERCATOR,
                &[
                    PARAM_LATITUDE_OF_NATURAL_ORIGIN,
                    PARAM_LONGITUDE_OF_NATURAL_ORIGIN,
                    PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN,
                    PARAM_FALSE_EASTING,
                    PARAM_FALSE_NORTHING,
                ],
            ),
            vec![
                OperationParameterValue::angle(PARAM_LATITUDE_OF_NATURAL_ORIGIN, latitude_origin),
                OperationParameterValue::angle(
                    PARAM_LONGITUDE_OF_NATURAL_ORIGIN,
                    longitude_origin,
                ),
                OperationParameterValue::scale(PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN, scale),
                OperationParameterValue::length(PARAM_FALSE_EASTING, false_easting),
                OperationParameterValue::length(PARAM_FALSE_NORTHING, false_northing),
            ],
        )
    }

    /// UTM zone: Transverse Mercator with the canonical parameter pattern.
    pub fn utm(zone: u8, north: bool) -> Conversion {
        let hemisphere = if north { "N" } else { "S" };
        Conversion::transverse_mercator(
            IdentifiedObject::named(format!("UTM zone {zone}{hemisphere}"))
                .with_epsg(if north { 16000 + zone as u32 } else { 17000 + zone as u32 }),
            Angle::new(0.0),
            Angle::new(zone as f64 * 6.0 - 183.0),
            Scale::new(0.9996),
            Length::new(500000.0),
            Length::new(if north { 0.0 } else { 10000000.0 }),
        )
    }

    /// Recognize the UTM parameter pattern on a Transverse Mercator
    /// conversion.
    pub fn utm_zone(&self) -> Option<(u8, bool)> {
        if self.method.epsg_code() != Some(METHOD_TRANSVERSE_MERCATOR) {
            return None;
        }
        let lat0 = self.parameter_numeric(PARAM_LATITUDE_OF_NATURAL_ORIGIN, &UnitOfMeasure::DEGREE)?;
        let lon0 =
            self.parameter_numeric(PARAM_LONGITUDE_OF_NATURAL_ORIGIN, &UnitOfMeasure::DEGREE)?;
        let k0 = self.parameter_numeric(PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN, &UnitOfMeasure::UNITY)?;
        let fe = self.parameter_numeric(PARAM_FALSE_EASTING, &UnitOfMeasure::METRE)?;
        let fn_ = self.parameter_numeric(PARAM_FALSE_NORTHING, &UnitOfMeasure::METRE)?;
        if lat0 != 0.0 || !tolerant_eq(k0, 0.9996) || !tolerant_eq(fe, 500000.0) {
            return None;
        }
        let zone = (lon0 + 183.0) / 6.0;
        if zone < 1.0 || zone > 60.0 || zone.fract() != 0.0 {
            return None;
        }
        if fn_ == 0.0 {
            Some((zone as u8, true))
        } else if tolerant_eq(fn_, 10000000.0) {
            Some((zone as u8, false))
        } else {
            None
        }
    }

    pub fn mercator_variant_a(
        ident: IdentifiedObject,
        latitude_origin: Angle,
        longitude_origin: Angle,
        scale: Scale,
        false_easting: Length,
        false_northing: Length,
    ) -> Conversion {
        Conversion::new(
            ident,
            OperationMethod::from_epsg(
                METHOD_MERCATOR_VARIANT_A,
                &[
                    PARAM_LATITUDE_OF_NATURAL_ORIGIN,
                    PARAM_LONGITUDE_OF_NATURAL_ORIGIN,
                    PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN,
                    PARAM_FALSE_EASTING,
                    PARAM_FALSE_NORTHING,
                ],
            ),
            vec![
                OperationParameterValue::angle(PARAM_LATITUDE_OF_NATURAL_ORIGIN, latitude_origin),
                OperationParameterValue::angle(
                    PARAM_LONGITUDE_OF_NATURAL_ORIGIN,
                    longitude_origin,
                ),
                OperationParameterValue::scale(PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN, scale),
                OperationParameterValue::length(PARAM_FALSE_EASTING, false_easting),
                OperationParameterValue::length(PARAM_FALSE_NORTHING, false_northing),
            ],
        )
    }

    pub fn mercator_variant_b(
        ident: IdentifiedObject,
        first_parallel: Angle,
        longitude_origin: Angle,
        false_easting: Length,
        false_northing: Length,
    ) -> Conversion {
        Conversion::new(
            ident,
            OperationMethod::from_epsg(
                METHOD_MERCATOR_VARIANT_B,
                &[
                    PARAM_LATITUDE_1ST_STD_PARALLEL,
                    PARAM_LONGITUDE_OF_NATURAL_ORIGIN,
                    PARAM_FALSE_EASTING,
                    PARAM_FALSE_NORTHING,
                ],
            ),
            vec![
                OperationParameterValue::angle(PARAM_LATITUDE_1ST_STD_PARALLEL, first_parallel),
                OperationParameterValue::angle(
                    PARAM_LONGITUDE_OF_NATURAL_ORIGIN,
                    longitude_origin,
                ),
                OperationParameterValue::length(PARAM_FALSE_EASTING, false_easting),
                OperationParameterValue::length(PARAM_FALSE_NORTHING, false_northing),
            ],
        )
    }

    pub fn lambert_conic_conformal_1sp(
        ident: IdentifiedObject,
        latitude_origin: Angle,
        longitude_origin: Angle,
        scale: Scale,
        false_easting: Length,
        false_northing: Length,
    ) -> Conversion {
        Conversion::new(
            ident,
            OperationMethod::from_epsg(
                METHOD_LAMBERT_CONIC_CONFORMAL_1SP,
                &[
                    PARAM_LATITUDE_OF_NATURAL_ORIGIN,
                    PARAM_LONGITUDE_OF_NATURAL_ORIGIN,
                    PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN,
                    PARAM_FALSE_EASTING,
                    PARAM_FALSE_NORTHING,
                ],
            ),
            vec![
                OperationParameterValue::angle(PARAM_LATITUDE_OF_NATURAL_ORIGIN, latitude_origin),
                OperationParameterValue::angle(
                    PARAM_LONGITUDE_OF_NATURAL_ORIGIN,
                    longitude_origin,
                ),
                OperationParameterValue::scale(PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN, scale),
                OperationParameterValue::length(PARAM_FALSE_EASTING, false_easting),
                OperationParameterValue::length(PARAM_FALSE_NORTHING, false_northing),
            ],
        )
    }

    pub fn lambert_conic_conformal_2sp(
        ident: IdentifiedObject,
        latitude_false_origin: Angle,
        longitude_false_origin: Angle,
        first_parallel: Angle,
        second_parallel: Angle,
        easting_false_origin: Length,
        northing_false_origin: Length,
    ) -> Conversion {
        Conversion::new(
            ident,
            OperationMethod::from_epsg(
                METHOD_LAMBERT_CONIC_CONFORMAL_2SP,
                &[
                    PARAM_LATITUDE_FALSE_ORIGIN,
                    PARAM_LONGITUDE_FALSE_ORIGIN,
                    PARAM_LATITUDE_1ST_STD_PARALLEL,
                    PARAM_LATITUDE_2ND_STD_PARALLEL,
                    PARAM_EASTING_FALSE_ORIGIN,
                    PARAM_NORTHING_FALSE_ORIGIN,
                ],
            ),
            vec![
                OperationParameterValue::angle(PARAM_LATITUDE_FALSE_ORIGIN, latitude_false_origin),
                OperationParameterValue::angle(
                    PARAM_LONGITUDE_FALSE_ORIGIN,
                    longitude_false_origin,
                ),
                OperationParameterValue::angle(PARAM_LATITUDE_1ST_STD_PARALLEL, first_parallel),
                OperationParameterValue::angle(PARAM_LATITUDE_2ND_STD_PARALLEL, second_parallel),
                OperationParameterValue::length(PARAM_EASTING_FALSE_ORIGIN, easting_false_origin),
                OperationParameterValue::length(
                    PARAM_NORTHING_FALSE_ORIGIN,
                    northing_false_origin,
                ),
            ],
        )
    }

    /// Geographic-to-geocentric conversion (EPSG:9602); parameter-less.
    pub fn geographic_geocentric(ident: IdentifiedObject) -> Conversion {
        Conversion::new(
            ident,
            OperationMethod::from_epsg(METHOD_GEOGRAPHIC_GEOCENTRIC, &[]),
            Vec::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_pattern_recognition() {
        let utm31 = Conversion::utm(31, true);
        assert_eq!(utm31.utm_zone(), Some((31, true)));
        assert_eq!(utm31.name(), "UTM zone 31N");
        assert_eq!(
            utm31.parameter_numeric(PARAM_LONGITUDE_OF_NATURAL_ORIGIN, &UnitOfMeasure::DEGREE),
            Some(3.0)
        );

        let south = Conversion::utm(33, false);
        assert_eq!(south.utm_zone(), Some((33, false)));

        let not_utm = Conversion::transverse_mercator(
            IdentifiedObject::named("custom"),
            Angle::new(0.0),
            Angle::new(3.0),
            Scale::new(1.0),
            Length::new(500000.0),
            Length::new(0.0),
        );
        assert_eq!(not_utm.utm_zone(), None);
    }

    #[test]
    fn test_inverse_toggles_direction() {
        let utm = Conversion::utm(31, true);
        let inv = utm.inverse();
        assert!(inv.is_inverted());
        assert_eq!(inv.name(), "Inverse of UTM zone 31N");
        let back = inv.inverse();
        assert!(!back.is_inverted());
    }

    #[test]
    fn test_equivalence_ignores_names() {
        let a = Conversion::utm(31, true);
        let mut b = Conversion::utm(31, true);
        b.ident = IdentifiedObject::named("my favourite projection");
        assert!(a.is_equivalent_to(&b, Criterion::Equivalent));
        assert!(!a.is_equivalent_to(&b, Criterion::Strict));
        let c = Conversion::utm(32, true);
        assert!(!a.is_equivalent_to(&c, Criterion::Equivalent));
    }
}
