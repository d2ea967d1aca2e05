//! Transformations: coordinate operations with a datum change, carrying
//! measured parameters and a positional accuracy.

use std::sync::Arc;

use super::methods::*;
use super::{
    find_parameter, parameter_sets_equivalent, OperationMethod, OperationParameterValue,
    ParameterValue,
};
use crate::crs::Crs;
use crate::error::{GeorefError, Result};
use crate::ident::{Criterion, IdentifiedObject, PositionalAccuracy};
use crate::measure::{Angle, Length, Measure, Scale, UnitOfMeasure};

/// Rotation convention of a seven-parameter Helmert transformation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelmertConvention {
    PositionVector,
    CoordinateFrame,
}

impl HelmertConvention {
    pub fn proj_keyword(self) -> &'static str {
        match self {
            HelmertConvention::PositionVector => "position_vector",
            HelmertConvention::CoordinateFrame => "coordinate_frame",
        }
    }
}

/// Extracted Helmert parameters in PROJ units: translations in metres,
/// rotations in arc-seconds, scale difference in ppm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HelmertParams {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
    pub s: f64,
    pub convention: Option<HelmertConvention>,
}

impl HelmertParams {
    pub fn translation_only(&self) -> bool {
        self.convention.is_none()
    }

    /// Whether the sum of two Helmert steps cancels to identity. Only
    /// meaningful when both use the same rotation convention.
    pub fn cancels_with(&self, other: &HelmertParams) -> bool {
        if self.convention != other.convention {
            return false;
        }
        let zero = |a: f64, b: f64| (a + b).abs() < 1e-12;
        zero(self.x, other.x)
            && zero(self.y, other.y)
            && zero(self.z, other.z)
            && zero(self.rx, other.rx)
            && zero(self.ry, other.ry)
            && zero(self.rz, other.rz)
            && zero(self.s, other.s)
    }
}

#[derive(Clone, Debug)]
pub struct Transformation {
    ident: IdentifiedObject,
    source: Arc<Crs>,
    target: Arc<Crs>,
    interpolation: Option<Arc<Crs>>,
    method: OperationMethod,
    values: Vec<OperationParameterValue>,
    accuracies: Vec<PositionalAccuracy>,
    approximate_inverse: bool,
}

impl Transformation {
    pub fn new(
        ident: IdentifiedObject,
        source: Arc<Crs>,
        target: Arc<Crs>,
        interpolation: Option<Arc<Crs>>,
        method: OperationMethod,
        values: Vec<OperationParameterValue>,
        accuracies: Vec<PositionalAccuracy>,
    ) -> Self {
        Self {
            ident,
            source,
            target,
            interpolation,
            method,
            values,
            accuracies,
            approximate_inverse: false,
        }
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn name(&self) -> &str {
        self.ident.name()
    }

    pub fn source_crs(&self) -> &Arc<Crs> {
        &self.source
    }

    pub fn target_crs(&self) -> &Arc<Crs> {
        &self.target
    }

    pub fn interpolation_crs(&self) -> Option<&Arc<Crs>> {
        self.interpolation.as_ref()
    }

    pub fn method(&self) -> &OperationMethod {
        &self.method
    }

    pub fn values(&self) -> &[OperationParameterValue] {
        &self.values
    }

    pub fn accuracies(&self) -> &[PositionalAccuracy] {
        &self.accuracies
    }

    /// Whether this operation was produced by first-order parameter
    /// negation of a method with no closed-form inverse.
    pub fn is_approximate_inverse(&self) -> bool {
        self.approximate_inverse
    }

    pub fn parameter_numeric(&self, param_code: u16, unit: &UnitOfMeasure) -> Option<f64> {
        find_parameter(&self.values, param_code)?.numeric_value_in(unit)
    }

    /// The grid file consumed by a grid-based method.
    pub fn grid_file(&self) -> Option<&str> {
        let code = self.method.epsg_code()?;
        let param = match code {
            METHOD_NTV2 => PARAM_GEOGRAPHIC_GRID_FILE,
            METHOD_VERTCON => PARAM_VERTICAL_GRID_FILE,
            _ => return None,
        };
        find_parameter(&self.values, param)?.value().filename()
    }

    /// Extract Helmert parameters when the method belongs to the
    /// Helmert family.
    pub fn helmert_params(&self) -> Option<HelmertParams> {
        let code = self.method.epsg_code()?;
        if !is_helmert_family(code) {
            return None;
        }
        let metre = &UnitOfMeasure::METRE;
        let x = self.parameter_numeric(PARAM_X_TRANSLATION, metre)?;
        let y = self.parameter_numeric(PARAM_Y_TRANSLATION, metre)?;
        let z = self.parameter_numeric(PARAM_Z_TRANSLATION, metre)?;
        if code == METHOD_GEOCENTRIC_TRANSLATIONS {
            return Some(HelmertParams {
                x,
                y,
                z,
                rx: 0.0,
                ry: 0.0,
                rz: 0.0,
                s: 0.0,
                convention: None,
            });
        }
        let arcsec = &UnitOfMeasure::ARC_SECOND;
        let ppm = &UnitOfMeasure::PARTS_PER_MILLION;
        Some(HelmertParams {
            x,
            y,
            z,
            rx: self.parameter_numeric(PARAM_X_ROTATION, arcsec)?,
            ry: self.parameter_numeric(PARAM_Y_ROTATION, arcsec)?,
            rz: self.parameter_numeric(PARAM_Z_ROTATION, arcsec)?,
            s: self.parameter_numeric(PARAM_SCALE_DIFFERENCE, ppm)?,
            convention: Some(if code == METHOD_POSITION_VECTOR {
                HelmertConvention::PositionVector
            } else {
                HelmertConvention::CoordinateFrame
            }),
        })
    }

    /// The reverse transformation.
    ///
    /// Helmert-family parameters (translations, rotations, scale and
    /// their rates) are negated analytically, the reference epoch kept;
    /// offsets are negated; grid-based methods keep their parameters and
    /// let the runtime run the grid in the opposite direction. A method
    /// with none of these shapes gets a first-order inverse, flagged and
    /// name-decorated as approximate.
    pub fn inverse(&self) -> Result<Transformation> {
        let code = self.method.epsg_code().ok_or_else(|| {
            GeorefError::invalid_operation(format!(
                "cannot invert transformation {:?} with unregistered method {:?}",
                self.ident.name(),
                self.method.name()
            ))
        })?;
        // The area of use survives inversion
        let inverse_ident = |approx: bool| {
            let name = if approx {
                format!("Inverse of {} (approx. inversion)", self.ident.name())
            } else {
                format!("Inverse of {}", self.ident.name())
            };
            let mut ident = IdentifiedObject::named(name);
            if let Some(extent) = self.ident.domain_of_validity() {
                ident = ident.with_extent(extent.clone());
            }
            ident
        };

        if has_analytic_negation_inverse(code) {
            let values = self
                .values
                .iter()
                .map(|v| match v.value() {
                    ParameterValue::Measure(m) => {
                        // The reference epoch of a time-dependent Helmert
                        // is a point in time, not a signed quantity.
                        if v.parameter().epsg_code() == Some(PARAM_REFERENCE_EPOCH as u32) {
                            v.clone()
                        } else {
                            OperationParameterValue::new(
                                v.parameter().clone(),
                                ParameterValue::Measure(Measure::new(
                                    -m.value(),
                                    m.unit().clone(),
                                )),
                            )
                        }
                    }
                    _ => v.clone(),
                })
                .collect();
            return Ok(Transformation {
                ident: inverse_ident(false),
                source: self.target.clone(),
                target: self.source.clone(),
                interpolation: self.interpolation.clone(),
                method: self.method.clone(),
                values,
                accuracies: self.accuracies.clone(),
                approximate_inverse: false,
            });
        }

        if is_grid_based(code) {
            return Ok(Transformation {
                ident: inverse_ident(false),
                source: self.target.clone(),
                target: self.source.clone(),
                interpolation: self.interpolation.clone(),
                method: self.method.clone(),
                values: self.values.clone(),
                accuracies: self.accuracies.clone(),
                approximate_inverse: false,
            });
        }

        Ok(Transformation {
            ident: inverse_ident(true),
            source: self.target.clone(),
            target: self.source.clone(),
            interpolation: self.interpolation.clone(),
            method: self.method.clone(),
            values: self.values.clone(),
            accuracies: self.accuracies.clone(),
            approximate_inverse: true,
        })
    }

    /// Re-anchor the endpoints on equivalent CRSs (e.g. the caller's
    /// axis-order variant of the catalogued CRS). The parameters are
    /// untouched; callers must ensure datum equivalence.
    pub fn with_endpoints(&self, source: Arc<Crs>, target: Arc<Crs>) -> Transformation {
        Transformation {
            source,
            target,
            ..self.clone()
        }
    }

    /// Widen the stated accuracy, e.g. by a datum-ensemble accuracy.
    pub fn with_extra_accuracy(&self, extra: f64) -> Transformation {
        let mut out = self.clone();
        out.accuracies = out
            .accuracies
            .iter()
            .map(|a| PositionalAccuracy::metres(a.value() + extra))
            .collect();
        out
    }

    pub fn is_equivalent_to(&self, other: &Transformation, criterion: Criterion) -> bool {
        if criterion.is_strict() && !self.ident.matches_name(&other.ident, criterion) {
            return false;
        }
        self.method.is_equivalent_to(&other.method)
            && parameter_sets_equivalent(&self.values, &other.values, criterion)
            && self.source.is_equivalent_to(&other.source, criterion)
            && self.target.is_equivalent_to(&other.target, criterion)
    }

    // Named constructors.

    pub fn geocentric_translations(
        ident: IdentifiedObject,
        source: Arc<Crs>,
        target: Arc<Crs>,
        x: f64,
        y: f64,
        z: f64,
        accuracies: Vec<PositionalAccuracy>,
    ) -> Transformation {
        Transformation::new(
            ident,
            source,
            target,
            None,
            OperationMethod::from_epsg(
                METHOD_GEOCENTRIC_TRANSLATIONS,
                &[PARAM_X_TRANSLATION, PARAM_Y_TRANSLATION, PARAM_Z_TRANSLATION],
            ),
            vec![
                OperationParameterValue::length(PARAM_X_TRANSLATION, Length::new(x)),
                OperationParameterValue::length(PARAM_Y_TRANSLATION, Length::new(y)),
                OperationParameterValue::length(PARAM_Z_TRANSLATION, Length::new(z)),
            ],
            accuracies,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn seven_param(
        method_code: u16,
        ident: IdentifiedObject,
        source: Arc<Crs>,
        target: Arc<Crs>,
        x: f64,
        y: f64,
        z: f64,
        rx: f64,
        ry: f64,
        rz: f64,
        s: f64,
        accuracies: Vec<PositionalAccuracy>,
    ) -> Transformation {
        let arcsec = UnitOfMeasure::ARC_SECOND;
        let ppm = UnitOfMeasure::PARTS_PER_MILLION;
        Transformation::new(
            ident,
            source,
            target,
            None,
            OperationMethod::from_epsg(
                method_code,
                &[
                    PARAM_X_TRANSLATION,
                    PARAM_Y_TRANSLATION,
                    PARAM_Z_TRANSLATION,
                    PARAM_X_ROTATION,
                    PARAM_Y_ROTATION,
                    PARAM_Z_ROTATION,
                    PARAM_SCALE_DIFFERENCE,
                ],
            ),
            vec![
                OperationParameterValue::length(PARAM_X_TRANSLATION, Length::new(x)),
                OperationParameterValue::length(PARAM_Y_TRANSLATION, Length::new(y)),
                OperationParameterValue::length(PARAM_Z_TRANSLATION, Length::new(z)),
                OperationParameterValue::angle(
                    PARAM_X_ROTATION,
                    Angle::with_unit(rx, arcsec.clone()).expect("arc-second is angular"),
                ),
                OperationParameterValue::angle(
                    PARAM_Y_ROTATION,
                    Angle::with_unit(ry, arcsec.clone()).expect("arc-second is angular"),
                ),
                OperationParameterValue::angle(
                    PARAM_Z_ROTATION,
                    Angle::with_unit(rz, arcsec).expect("arc-second is angular"),
                ),
                OperationParameterValue::scale(
                    PARAM_SCALE_DIFFERENCE,
                    Scale::with_unit(s, ppm).expect("ppm is a scale unit"),
                ),
            ],
            accuracies,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn position_vector(
        ident: IdentifiedObject,
        source: Arc<Crs>,
        target: Arc<Crs>,
        x: f64,
        y: f64,
        z: f64,
        rx: f64,
        ry: f64,
        rz: f64,
        s: f64,
        accuracies: Vec<PositionalAccuracy>,
    ) -> Transformation {
        Transformation::seven_param(
            METHOD_POSITION_VECTOR,
            ident,
            source,
            target,
            x,
            y,
            z,
            rx,
            ry,
            rz,
            s,
            accuracies,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn coordinate_frame(
        ident: IdentifiedObject,
        source: Arc<Crs>,
        target: Arc<Crs>,
        x: f64,
        y: f64,
        z: f64,
        rx: f64,
        ry: f64,
        rz: f64,
        s: f64,
        accuracies: Vec<PositionalAccuracy>,
    ) -> Transformation {
        Transformation::seven_param(
            METHOD_COORDINATE_FRAME,
            ident,
            source,
            target,
            x,
            y,
            z,
            rx,
            ry,
            rz,
            s,
            accuracies,
        )
    }

    /// Build the transformation a WKT1 `TOWGS84` node encodes: a
    /// position-vector Helmert with 3 or 7 values (the 3-value form pads
    /// zero rotations and scale).
    pub fn from_towgs84(source: Arc<Crs>, target: Arc<Crs>, params: &[f64]) -> Result<Transformation> {
        let padded: [f64; 7] = match params.len() {
            3 => [params[0], params[1], params[2], 0.0, 0.0, 0.0, 0.0],
            7 => [
                params[0], params[1], params[2], params[3], params[4], params[5], params[6],
            ],
            n => {
                return Err(GeorefError::invalid_value(format!(
                    "TOWGS84 requires 3 or 7 values, got {n}"
                )))
            }
        };
        let name = format!("Transformation from {} to WGS84", source.name());
        Ok(Transformation::position_vector(
            IdentifiedObject::named(name),
            source,
            target,
            padded[0],
            padded[1],
            padded[2],
            padded[3],
            padded[4],
            padded[5],
            padded[6],
            Vec::new(),
        ))
    }

    /// Longitude rotation between datums differing only in their prime
    /// meridian (EPSG:9601).
    pub fn longitude_rotation(
        ident: IdentifiedObject,
        source: Arc<Crs>,
        target: Arc<Crs>,
        offset: Angle,
    ) -> Transformation {
        Transformation::new(
            ident,
            source,
            target,
            None,
            OperationMethod::from_epsg(METHOD_LONGITUDE_ROTATION, &[PARAM_LONGITUDE_OFFSET]),
            vec![OperationParameterValue::angle(PARAM_LONGITUDE_OFFSET, offset)],
            Vec::new(),
        )
    }

    pub fn geographic2d_offsets(
        ident: IdentifiedObject,
        source: Arc<Crs>,
        target: Arc<Crs>,
        latitude_offset: Angle,
        longitude_offset: Angle,
        accuracies: Vec<PositionalAccuracy>,
    ) -> Transformation {
        Transformation::new(
            ident,
            source,
            target,
            None,
            OperationMethod::from_epsg(
                METHOD_GEOGRAPHIC2D_OFFSETS,
                &[PARAM_LATITUDE_OFFSET, PARAM_LONGITUDE_OFFSET],
            ),
            vec![
                OperationParameterValue::angle(PARAM_LATITUDE_OFFSET, latitude_offset),
                OperationParameterValue::angle(PARAM_LONGITUDE_OFFSET, longitude_offset),
            ],
            accuracies,
        )
    }

    pub fn vertical_offset(
        ident: IdentifiedObject,
        source: Arc<Crs>,
        target: Arc<Crs>,
        offset: Length,
        accuracies: Vec<PositionalAccuracy>,
    ) -> Transformation {
        Transformation::new(
            ident,
            source,
            target,
            None,
            OperationMethod::from_epsg(METHOD_VERTICAL_OFFSET, &[PARAM_VERTICAL_OFFSET]),
            vec![OperationParameterValue::length(PARAM_VERTICAL_OFFSET, offset)],
            accuracies,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn molodensky(
        ident: IdentifiedObject,
        source: Arc<Crs>,
        target: Arc<Crs>,
        x: f64,
        y: f64,
        z: f64,
        semi_major_difference: f64,
        flattening_difference: f64,
        abridged: bool,
        accuracies: Vec<PositionalAccuracy>,
    ) -> Transformation {
        let code = if abridged {
            METHOD_ABRIDGED_MOLODENSKY
        } else {
            METHOD_MOLODENSKY
        };
        Transformation::new(
            ident,
            source,
            target,
            None,
            OperationMethod::from_epsg(
                code,
                &[
                    PARAM_X_TRANSLATION,
                    PARAM_Y_TRANSLATION,
                    PARAM_Z_TRANSLATION,
                    PARAM_SEMI_MAJOR_DIFFERENCE,
                    PARAM_FLATTENING_DIFFERENCE,
                ],
            ),
            vec![
                OperationParameterValue::length(PARAM_X_TRANSLATION, Length::new(x)),
                OperationParameterValue::length(PARAM_Y_TRANSLATION, Length::new(y)),
                OperationParameterValue::length(PARAM_Z_TRANSLATION, Length::new(z)),
                OperationParameterValue::length(
                    PARAM_SEMI_MAJOR_DIFFERENCE,
                    Length::new(semi_major_difference),
                ),
                OperationParameterValue::new(
                    super::OperationParameter::from_epsg(PARAM_FLATTENING_DIFFERENCE),
                    ParameterValue::Measure(Measure::new(
                        flattening_difference,
                        UnitOfMeasure::UNITY,
                    )),
                ),
            ],
            accuracies,
        )
    }

    /// Grid-shift transformation through an NTv2 file (EPSG:9615).
    pub fn ntv2(
        ident: IdentifiedObject,
        source: Arc<Crs>,
        target: Arc<Crs>,
        grid_file: impl Into<String>,
        accuracies: Vec<PositionalAccuracy>,
    ) -> Transformation {
        Transformation::new(
            ident,
            source,
            target,
            None,
            OperationMethod::from_epsg(METHOD_NTV2, &[PARAM_GEOGRAPHIC_GRID_FILE]),
            vec![OperationParameterValue::file(
                PARAM_GEOGRAPHIC_GRID_FILE,
                grid_file,
            )],
            accuracies,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::GeographicCrs;
    use approx::assert_relative_eq;

    fn wgs84() -> Arc<Crs> {
        Arc::new(Crs::Geographic(GeographicCrs::epsg_4326()))
    }

    fn nad83() -> Arc<Crs> {
        Arc::new(Crs::Geographic(GeographicCrs::epsg_4269()))
    }

    #[test]
    fn test_helmert_extraction_position_vector() {
        let t = Transformation::position_vector(
            IdentifiedObject::named("test"),
            wgs84(),
            nad83(),
            1.0,
            2.0,
            3.0,
            4.0,
            5.0,
            6.0,
            7.0,
            Vec::new(),
        );
        let h = t.helmert_params().unwrap();
        assert_eq!(h.x, 1.0);
        assert_relative_eq!(h.rx, 4.0, epsilon = 1e-12);
        assert_relative_eq!(h.s, 7.0, epsilon = 1e-12);
        assert_eq!(h.convention, Some(HelmertConvention::PositionVector));
    }

    #[test]
    fn test_helmert_inverse_negates_and_double_inverse_restores() {
        let t = Transformation::position_vector(
            IdentifiedObject::named("fwd"),
            wgs84(),
            nad83(),
            1.0,
            2.0,
            3.0,
            4.0,
            5.0,
            6.0,
            7.0,
            vec![PositionalAccuracy::metres(0.5)],
        );
        let inv = t.inverse().unwrap();
        assert_eq!(inv.name(), "Inverse of fwd");
        let h = inv.helmert_params().unwrap();
        assert_eq!((h.x, h.y, h.z), (-1.0, -2.0, -3.0));
        assert_relative_eq!(h.rx, -4.0, epsilon = 1e-12);
        assert_relative_eq!(h.s, -7.0, epsilon = 1e-12);
        // endpoints swapped, accuracy preserved
        assert_eq!(inv.source_crs().name(), "NAD83");
        assert_eq!(inv.accuracies()[0].value(), 0.5);

        let back = inv.inverse().unwrap();
        let h2 = back.helmert_params().unwrap();
        assert_eq!((h2.x, h2.y, h2.z), (1.0, 2.0, 3.0));
        assert_relative_eq!(h2.rx, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_based_inverse_keeps_file() {
        let t = Transformation::ntv2(
            IdentifiedObject::named("NTF (Paris) to RGF93 (2)"),
            wgs84(),
            nad83(),
            "ntf_r93.gsb",
            Vec::new(),
        );
        assert_eq!(t.grid_file(), Some("ntf_r93.gsb"));
        let inv = t.inverse().unwrap();
        assert_eq!(inv.grid_file(), Some("ntf_r93.gsb"));
        assert!(!inv.is_approximate_inverse());
    }

    #[test]
    fn test_towgs84_three_parameter_padding() {
        let t =
            Transformation::from_towgs84(wgs84(), nad83(), &[-168.0, -60.0, 320.0]).unwrap();
        let h = t.helmert_params().unwrap();
        assert_eq!((h.x, h.y, h.z), (-168.0, -60.0, 320.0));
        assert_eq!((h.rx, h.ry, h.rz, h.s), (0.0, 0.0, 0.0, 0.0));
        assert!(Transformation::from_towgs84(wgs84(), nad83(), &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_helmert_cancellation() {
        let fwd = Transformation::position_vector(
            IdentifiedObject::named("fwd"),
            wgs84(),
            nad83(),
            1.0,
            2.0,
            3.0,
            4.0,
            5.0,
            6.0,
            7.0,
            Vec::new(),
        );
        let bwd = Transformation::position_vector(
            IdentifiedObject::named("bwd"),
            nad83(),
            wgs84(),
            -1.0,
            -2.0,
            -3.0,
            -4.0,
            -5.0,
            -6.0,
            -7.0,
            Vec::new(),
        );
        let a = fwd.helmert_params().unwrap();
        let b = bwd.helmert_params().unwrap();
        assert!(a.cancels_with(&b));

        // different convention never cancels
        let cf = Transformation::coordinate_frame(
            IdentifiedObject::named("cf"),
            nad83(),
            wgs84(),
            -1.0,
            -2.0,
            -3.0,
            -4.0,
            -5.0,
            -6.0,
            -7.0,
            Vec::new(),
        );
        assert!(!a.cancels_with(&cf.helmert_params().unwrap()));

        // sign mismatch on scale does not cancel
        let partial = Transformation::position_vector(
            IdentifiedObject::named("partial"),
            nad83(),
            wgs84(),
            -1.0,
            -2.0,
            -3.0,
            -4.0,
            -5.0,
            -6.0,
            7.0,
            Vec::new(),
        );
        assert!(!a.cancels_with(&partial.helmert_params().unwrap()));
    }

    #[test]
    fn test_longitude_rotation_inverse() {
        let t = Transformation::longitude_rotation(
            IdentifiedObject::named("NTF (Paris) to NTF (1)"),
            wgs84(),
            nad83(),
            Angle::with_unit(2.5969213, UnitOfMeasure::GRAD).unwrap(),
        );
        let inv = t.inverse().unwrap();
        let offset = inv
            .parameter_numeric(PARAM_LONGITUDE_OFFSET, &UnitOfMeasure::GRAD)
            .unwrap();
        assert_relative_eq!(offset, -2.5969213, epsilon = 1e-12);
    }
}
