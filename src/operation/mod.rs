//! Coordinate operations: conversions (no datum change), transformations
//! (datum change), concatenated chains, and opaque `+proj=` pipeline
//! operations.

pub mod conversion;
pub mod method_convert;
pub mod methods;
pub mod transformation;

pub use conversion::Conversion;
pub use transformation::{HelmertParams, Transformation};

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::crs::Crs;
use crate::error::{GeorefError, Result};
use crate::ident::{Criterion, IdentifiedObject, PositionalAccuracy};
use crate::measure::{Angle, Length, Measure, Scale, UnitOfMeasure};

/// Descriptor of an operation parameter (name plus authority code).
#[derive(Clone, Debug)]
pub struct OperationParameter {
    ident: IdentifiedObject,
}

impl OperationParameter {
    pub fn from_epsg(code: u16) -> OperationParameter {
        let name = methods::parameter_name(code).unwrap_or("unknown parameter");
        OperationParameter {
            ident: IdentifiedObject::named(name).with_epsg(code as u32),
        }
    }

    pub fn named(name: impl Into<String>) -> OperationParameter {
        OperationParameter {
            ident: IdentifiedObject::named(name),
        }
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn name(&self) -> &str {
        self.ident.name()
    }

    pub fn epsg_code(&self) -> Option<u32> {
        self.ident.epsg_code()
    }

    pub fn is_equivalent_to(&self, other: &OperationParameter) -> bool {
        if let (Some(a), Some(b)) = (self.epsg_code(), other.epsg_code()) {
            return a == b;
        }
        self.ident.matches_name(&other.ident, Criterion::Equivalent)
    }
}

/// An operation method and the parameters it expects.
#[derive(Clone, Debug)]
pub struct OperationMethod {
    ident: IdentifiedObject,
    parameters: Vec<OperationParameter>,
}

impl OperationMethod {
    pub fn from_epsg(code: u16, parameter_codes: &[u16]) -> OperationMethod {
        let name = methods::method_name(code).unwrap_or("unknown method");
        OperationMethod {
            ident: IdentifiedObject::named(name).with_epsg(code as u32),
            parameters: parameter_codes
                .iter()
                .map(|c| OperationParameter::from_epsg(*c))
                .collect(),
        }
    }

    pub fn named(name: impl Into<String>) -> OperationMethod {
        OperationMethod {
            ident: IdentifiedObject::named(name),
            parameters: Vec::new(),
        }
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn name(&self) -> &str {
        self.ident.name()
    }

    pub fn epsg_code(&self) -> Option<u16> {
        self.ident.epsg_code().map(|c| c as u16)
    }

    pub fn parameters(&self) -> &[OperationParameter] {
        &self.parameters
    }

    /// Methods are equivalent by canonical name or by EPSG code.
    pub fn is_equivalent_to(&self, other: &OperationMethod) -> bool {
        if let (Some(a), Some(b)) = (self.epsg_code(), other.epsg_code()) {
            if a == b {
                return true;
            }
        }
        self.ident.matches_name(&other.ident, Criterion::Equivalent)
    }
}

/// A parameter value of one of the admissible kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterValue {
    Measure(Measure),
    Integer(i64),
    Boolean(bool),
    String(String),
    Filename(String),
}

impl ParameterValue {
    pub fn measure(&self) -> Option<&Measure> {
        match self {
            ParameterValue::Measure(m) => Some(m),
            _ => None,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            ParameterValue::Filename(f) => Some(f),
            _ => None,
        }
    }

    fn is_equivalent_to(&self, other: &ParameterValue, strict: bool) -> bool {
        match (self, other) {
            (ParameterValue::Measure(a), ParameterValue::Measure(b)) => {
                a.is_equivalent_to(b, strict)
            }
            (a, b) => a == b,
        }
    }
}

/// A parameter bound to its value.
#[derive(Clone, Debug)]
pub struct OperationParameterValue {
    parameter: OperationParameter,
    value: ParameterValue,
}

impl OperationParameterValue {
    pub fn new(parameter: OperationParameter, value: ParameterValue) -> Self {
        Self { parameter, value }
    }

    pub fn angle(param_code: u16, value: Angle) -> Self {
        Self::new(
            OperationParameter::from_epsg(param_code),
            ParameterValue::Measure(value.measure().clone()),
        )
    }

    pub fn length(param_code: u16, value: Length) -> Self {
        Self::new(
            OperationParameter::from_epsg(param_code),
            ParameterValue::Measure(value.measure().clone()),
        )
    }

    pub fn scale(param_code: u16, value: Scale) -> Self {
        Self::new(
            OperationParameter::from_epsg(param_code),
            ParameterValue::Measure(value.measure().clone()),
        )
    }

    pub fn file(param_code: u16, name: impl Into<String>) -> Self {
        Self::new(
            OperationParameter::from_epsg(param_code),
            ParameterValue::Filename(name.into()),
        )
    }

    pub fn parameter(&self) -> &OperationParameter {
        &self.parameter
    }

    pub fn value(&self) -> &ParameterValue {
        &self.value
    }

    /// Numeric value in the given unit, when this is a measure.
    pub fn numeric_value_in(&self, unit: &UnitOfMeasure) -> Option<f64> {
        let m = self.value.measure()?;
        if m.unit().kind() != unit.kind() {
            return None;
        }
        Some(m.si_value() / unit.to_si())
    }

    pub fn is_equivalent_to(&self, other: &OperationParameterValue, criterion: Criterion) -> bool {
        self.parameter.is_equivalent_to(&other.parameter)
            && self.value.is_equivalent_to(&other.value, criterion.is_strict())
    }
}

/// Parameter lists compare as unordered sets matched by canonical
/// parameter identity.
pub(crate) fn parameter_sets_equivalent(
    a: &[OperationParameterValue],
    b: &[OperationParameterValue],
    criterion: Criterion,
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|pa| {
        b.iter()
            .any(|pb| pa.is_equivalent_to(pb, criterion))
    })
}

/// Look up a parameter value by EPSG code in a value list.
pub(crate) fn find_parameter(
    values: &[OperationParameterValue],
    param_code: u16,
) -> Option<&OperationParameterValue> {
    values
        .iter()
        .find(|v| v.parameter().epsg_code() == Some(param_code as u32))
}

/// Description of a grid file an operation depends on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GridDescriptor {
    pub short_name: String,
    pub full_name: String,
    pub package_name: String,
    pub url: String,
    pub direct_download: bool,
    pub open_license: bool,
    pub available: bool,
}

/// A chain of operations whose endpoints connect.
#[derive(Clone, Debug)]
pub struct ConcatenatedOperation {
    ident: IdentifiedObject,
    steps: Vec<CoordinateOperation>,
    accuracies: Vec<PositionalAccuracy>,
}

impl ConcatenatedOperation {
    /// Steps must chain: each step's target CRS is the next step's source
    /// CRS, up to axis order and unit.
    pub fn new(
        ident: IdentifiedObject,
        steps: Vec<CoordinateOperation>,
        accuracies: Vec<PositionalAccuracy>,
    ) -> Result<Self> {
        if steps.len() < 2 {
            return Err(GeorefError::invalid_operation(
                "concatenated operation requires at least two steps",
            ));
        }
        for window in steps.windows(2) {
            let (prev, next) = (&window[0], &window[1]);
            match (prev.target_crs(), next.source_crs()) {
                (Some(t), Some(s)) => {
                    if !t.is_equivalent_to(s, Criterion::EquivalentIgnoringAxisOrder) {
                        return Err(GeorefError::invalid_operation(format!(
                            "step {:?} targets {:?} but the next step starts from {:?}",
                            prev.name(),
                            t.name(),
                            s.name()
                        )));
                    }
                }
                // Coordinate-less conversions chain opaquely
                _ => {}
            }
        }
        Ok(Self {
            ident,
            steps,
            accuracies,
        })
    }

    /// Build with a generated "A + B + ..." name.
    pub fn from_steps(steps: Vec<CoordinateOperation>) -> Result<Self> {
        let name = steps
            .iter()
            .map(|s| s.name().to_string())
            .collect::<Vec<_>>()
            .join(" + ");
        // Step accuracies add up linearly
        let mut total = 0.0;
        let mut all_known = true;
        for step in &steps {
            match step.accuracy() {
                Some(a) => total += a,
                None => all_known = false,
            }
        }
        let accuracies = if all_known {
            vec![PositionalAccuracy::metres(total)]
        } else {
            Vec::new()
        };
        ConcatenatedOperation::new(IdentifiedObject::named(name), steps, accuracies)
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn steps(&self) -> &[CoordinateOperation] {
        &self.steps
    }

    pub fn accuracies(&self) -> &[PositionalAccuracy] {
        &self.accuracies
    }

    pub fn source_crs(&self) -> Option<&Arc<Crs>> {
        self.steps.first().and_then(|s| s.source_crs())
    }

    pub fn target_crs(&self) -> Option<&Arc<Crs>> {
        self.steps.last().and_then(|s| s.target_crs())
    }

    pub fn inverse(&self) -> Result<ConcatenatedOperation> {
        let steps: Result<Vec<_>> = self.steps.iter().rev().map(|s| s.inverse()).collect();
        ConcatenatedOperation::new(
            IdentifiedObject::named(format!("Inverse of {}", self.ident.name())),
            steps?,
            self.accuracies.clone(),
        )
    }
}

/// An operation whose method is opaque and whose single parameter is a
/// `+proj=` pipeline string.
#[derive(Clone, Debug)]
pub struct ProjBasedOperation {
    ident: IdentifiedObject,
    pipeline: String,
    source: Option<Arc<Crs>>,
    target: Option<Arc<Crs>>,
}

impl ProjBasedOperation {
    pub fn new(
        ident: IdentifiedObject,
        pipeline: impl Into<String>,
        source: Option<Arc<Crs>>,
        target: Option<Arc<Crs>>,
    ) -> Self {
        Self {
            ident,
            pipeline: pipeline.into(),
            source,
            target,
        }
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn source_crs(&self) -> Option<&Arc<Crs>> {
        self.source.as_ref()
    }

    pub fn target_crs(&self) -> Option<&Arc<Crs>> {
        self.target.as_ref()
    }

    pub fn inverse(&self) -> Result<ProjBasedOperation> {
        let inverted = crate::projstring::invert_pipeline(&self.pipeline)?;
        Ok(ProjBasedOperation {
            ident: IdentifiedObject::named(format!("Inverse of {}", self.ident.name())),
            pipeline: inverted,
            source: self.target.clone(),
            target: self.source.clone(),
        })
    }
}

/// Any coordinate operation.
#[derive(Clone, Debug)]
pub enum CoordinateOperation {
    Conversion(Conversion),
    Transformation(Transformation),
    Concatenated(ConcatenatedOperation),
    ProjBased(ProjBasedOperation),
}

impl CoordinateOperation {
    pub fn ident(&self) -> &IdentifiedObject {
        match self {
            CoordinateOperation::Conversion(c) => c.ident(),
            CoordinateOperation::Transformation(t) => t.ident(),
            CoordinateOperation::Concatenated(c) => c.ident(),
            CoordinateOperation::ProjBased(p) => p.ident(),
        }
    }

    pub fn name(&self) -> &str {
        self.ident().name()
    }

    pub fn source_crs(&self) -> Option<&Arc<Crs>> {
        match self {
            CoordinateOperation::Conversion(c) => c.source_crs(),
            CoordinateOperation::Transformation(t) => Some(t.source_crs()),
            CoordinateOperation::Concatenated(c) => c.source_crs(),
            CoordinateOperation::ProjBased(p) => p.source_crs(),
        }
    }

    pub fn target_crs(&self) -> Option<&Arc<Crs>> {
        match self {
            CoordinateOperation::Conversion(c) => c.target_crs(),
            CoordinateOperation::Transformation(t) => Some(t.target_crs()),
            CoordinateOperation::Concatenated(c) => c.target_crs(),
            CoordinateOperation::ProjBased(p) => p.target_crs(),
        }
    }

    /// Positional accuracy in metres; `None` when unknown. A conversion
    /// is exact by definition.
    pub fn accuracy(&self) -> Option<f64> {
        match self {
            CoordinateOperation::Conversion(_) => Some(0.0),
            CoordinateOperation::Transformation(t) => t
                .accuracies()
                .iter()
                .map(|a| a.value())
                .min_by(|a, b| a.total_cmp(b)),
            CoordinateOperation::Concatenated(c) => c
                .accuracies()
                .iter()
                .map(|a| a.value())
                .min_by(|a, b| a.total_cmp(b)),
            CoordinateOperation::ProjBased(_) => None,
        }
    }

    pub fn inverse(&self) -> Result<CoordinateOperation> {
        Ok(match self {
            CoordinateOperation::Conversion(c) => CoordinateOperation::Conversion(c.inverse()),
            CoordinateOperation::Transformation(t) => {
                CoordinateOperation::Transformation(t.inverse()?)
            }
            CoordinateOperation::Concatenated(c) => {
                CoordinateOperation::Concatenated(c.inverse()?)
            }
            CoordinateOperation::ProjBased(p) => CoordinateOperation::ProjBased(p.inverse()?),
        })
    }

    /// Grid files this operation needs, resolved against the catalog.
    pub fn grids_needed(&self, catalog: &crate::catalog::Catalog) -> BTreeSet<GridDescriptor> {
        let mut out = BTreeSet::new();
        self.collect_grids(catalog, &mut out);
        out
    }

    fn collect_grids(
        &self,
        catalog: &crate::catalog::Catalog,
        out: &mut BTreeSet<GridDescriptor>,
    ) {
        match self {
            CoordinateOperation::Conversion(_) => {}
            CoordinateOperation::Transformation(t) => {
                if let Some(file) = t.grid_file() {
                    out.insert(catalog.grid_descriptor(file));
                }
            }
            CoordinateOperation::Concatenated(c) => {
                for step in c.steps() {
                    step.collect_grids(catalog, out);
                }
            }
            CoordinateOperation::ProjBased(p) => {
                for token in p.pipeline().split_whitespace() {
                    if let Some(grids) = token.strip_prefix("+grids=") {
                        for name in grids.split(',') {
                            out.insert(catalog.grid_descriptor(name));
                        }
                    }
                }
            }
        }
    }

    pub fn is_equivalent_to(&self, other: &CoordinateOperation, criterion: Criterion) -> bool {
        match (self, other) {
            (CoordinateOperation::Conversion(a), CoordinateOperation::Conversion(b)) => {
                a.is_equivalent_to(b, criterion)
            }
            (CoordinateOperation::Transformation(a), CoordinateOperation::Transformation(b)) => {
                a.is_equivalent_to(b, criterion)
            }
            (CoordinateOperation::Concatenated(a), CoordinateOperation::Concatenated(b)) => {
                a.steps().len() == b.steps().len()
                    && a.steps()
                        .iter()
                        .zip(b.steps().iter())
                        .all(|(x, y)| x.is_equivalent_to(y, criterion))
            }
            (CoordinateOperation::ProjBased(a), CoordinateOperation::ProjBased(b)) => {
                a.pipeline() == b.pipeline()
            }
            _ => false,
        }
    }

    /// Export as WKT in the given convention.
    pub fn to_wkt(&self, convention: crate::wkt::WktConvention) -> Result<String> {
        crate::wkt::formatter::format_operation(self, convention)
    }

    /// Export as an executable `+proj=` pipeline.
    pub fn to_proj_string(
        &self,
        convention: crate::projstring::ProjStringConvention,
    ) -> Result<String> {
        crate::projstring::formatter::format_operation(self, convention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::GeographicCrs;

    fn wgs84() -> Arc<Crs> {
        Arc::new(Crs::Geographic(GeographicCrs::epsg_4326()))
    }

    fn nad83() -> Arc<Crs> {
        Arc::new(Crs::Geographic(GeographicCrs::epsg_4269()))
    }

    #[test]
    fn test_parameter_set_order_insensitive() {
        use methods::*;
        let a = vec![
            OperationParameterValue::angle(PARAM_LATITUDE_OF_NATURAL_ORIGIN, Angle::new(1.0)),
            OperationParameterValue::angle(PARAM_LONGITUDE_OF_NATURAL_ORIGIN, Angle::new(2.0)),
        ];
        let b = vec![
            OperationParameterValue::angle(PARAM_LONGITUDE_OF_NATURAL_ORIGIN, Angle::new(2.0)),
            OperationParameterValue::angle(PARAM_LATITUDE_OF_NATURAL_ORIGIN, Angle::new(1.0)),
        ];
        assert!(parameter_sets_equivalent(&a, &b, Criterion::Equivalent));
        let c = vec![
            OperationParameterValue::angle(PARAM_LATITUDE_OF_NATURAL_ORIGIN, Angle::new(1.5)),
            OperationParameterValue::angle(PARAM_LONGITUDE_OF_NATURAL_ORIGIN, Angle::new(2.0)),
        ];
        assert!(!parameter_sets_equivalent(&a, &c, Criterion::Equivalent));
    }

    #[test]
    fn test_method_equivalence_by_code_or_name() {
        let by_code = OperationMethod::from_epsg(methods::METHOD_TRANSVERSE_MERCATOR, &[]);
        let by_name = OperationMethod::named("Transverse  Mercator");
        assert!(by_code.is_equivalent_to(&by_name));
        let other = OperationMethod::named("Mercator (variant A)");
        assert!(!by_code.is_equivalent_to(&other));
    }

    #[test]
    fn test_concatenation_chain_validation() {
        let t1 = Transformation::geocentric_translations(
            IdentifiedObject::named("a to b"),
            wgs84(),
            nad83(),
            1.0,
            2.0,
            3.0,
            Vec::new(),
        );
        // Chain break: second step starts from WGS 84 again
        let t2 = Transformation::geocentric_translations(
            IdentifiedObject::named("a to b again"),
            wgs84(),
            nad83(),
            4.0,
            5.0,
            6.0,
            Vec::new(),
        );
        let err = ConcatenatedOperation::from_steps(vec![
            CoordinateOperation::Transformation(t1.clone()),
            CoordinateOperation::Transformation(t2),
        ]);
        assert!(err.is_err());

        let t2_ok = Transformation::geocentric_translations(
            IdentifiedObject::named("b to a"),
            nad83(),
            wgs84(),
            -1.0,
            -2.0,
            -3.0,
            Vec::new(),
        );
        let ok = ConcatenatedOperation::from_steps(vec![
            CoordinateOperation::Transformation(t1),
            CoordinateOperation::Transformation(t2_ok),
        ]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_concatenated_inverse_reverses_steps() {
        let t1 = Transformation::geocentric_translations(
            IdentifiedObject::named("a to b"),
            wgs84(),
            nad83(),
            1.0,
            2.0,
            3.0,
            vec![PositionalAccuracy::metres(1.0)],
        );
        let t2 = Transformation::geocentric_translations(
            IdentifiedObject::named("b to a"),
            nad83(),
            wgs84(),
            7.0,
            8.0,
            9.0,
            vec![PositionalAccuracy::metres(2.0)],
        );
        let concat = ConcatenatedOperation::from_steps(vec![
            CoordinateOperation::Transformation(t1),
            CoordinateOperation::Transformation(t2),
        ])
        .unwrap();
        // accuracy adds up
        assert_eq!(
            CoordinateOperation::Concatenated(concat.clone()).accuracy(),
            Some(3.0)
        );
        let inv = concat.inverse().unwrap();
        assert_eq!(inv.steps().len(), 2);
        assert_eq!(inv.steps()[0].name(), "Inverse of b to a");
        assert_eq!(inv.steps()[1].name(), "Inverse of a to b");
    }
}
