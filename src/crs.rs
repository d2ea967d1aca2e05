//! The CRS taxonomy: geodetic, geographic, projected, vertical, temporal,
//! engineering, parametric, compound, bound and derived reference systems.
//!
//! Deep subclassing in ISO 19111 is flattened into the [`Crs`] sum type;
//! the shared identified-object fields ride along as the first field of
//! every variant. The object graph is a DAG: a bound CRS references a
//! transformation whose endpoints can never be the bound CRS itself.

use std::sync::Arc;

use crate::cs::{AxisDirection, AxisOrder, CoordinateSystem, CsKind};
use crate::datum::{
    EngineeringDatum, GeodeticDatumOrEnsemble, GeodeticFrame, ParametricDatum, PrimeMeridian,
    TemporalDatum, VerticalDatumOrEnsemble,
};
use crate::datum::Ellipsoid;
use crate::error::{GeorefError, Result};
use crate::ident::{Criterion, IdentifiedObject};
use crate::operation::{Conversion, Transformation};

#[derive(Clone, Debug)]
pub struct GeodeticCrs {
    ident: IdentifiedObject,
    datum: GeodeticDatumOrEnsemble,
    cs: CoordinateSystem,
}

impl GeodeticCrs {
    /// A geodetic CRS is either geocentric (Cartesian CS) or spherical.
    pub fn new(
        ident: IdentifiedObject,
        datum: GeodeticDatumOrEnsemble,
        cs: CoordinateSystem,
    ) -> Result<Self> {
        match cs.kind() {
            CsKind::Cartesian => {
                if cs.axes().len() != 3
                    || !cs
                        .axes()
                        .iter()
                        .any(|a| a.direction() == AxisDirection::GeocentricX)
                {
                    return Err(GeorefError::invalid_value(
                        "geocentric CRS requires a 3-axis geocentric Cartesian CS",
                    ));
                }
            }
            CsKind::Spherical => {}
            other => {
                return Err(GeorefError::invalid_value(format!(
                    "geodetic CRS cannot use a {other:?} CS; \
                     use a geographic CRS for ellipsoidal coordinates"
                )))
            }
        }
        Ok(Self { ident, datum, cs })
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn datum(&self) -> &GeodeticDatumOrEnsemble {
        &self.datum
    }

    pub fn cs(&self) -> &CoordinateSystem {
        &self.cs
    }

    pub fn is_geocentric(&self) -> bool {
        self.cs.kind() == CsKind::Cartesian
    }
}

#[derive(Clone, Debug)]
pub struct GeographicCrs {
    ident: IdentifiedObject,
    datum: GeodeticDatumOrEnsemble,
    cs: CoordinateSystem,
}

impl GeographicCrs {
    pub fn new(
        ident: IdentifiedObject,
        datum: GeodeticDatumOrEnsemble,
        cs: CoordinateSystem,
    ) -> Result<Self> {
        if cs.kind() != CsKind::Ellipsoidal {
            return Err(GeorefError::invalid_value(
                "geographic CRS requires an ellipsoidal CS",
            ));
        }
        Ok(Self { ident, datum, cs })
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn datum(&self) -> &GeodeticDatumOrEnsemble {
        &self.datum
    }

    pub fn cs(&self) -> &CoordinateSystem {
        &self.cs
    }

    pub fn is_3d(&self) -> bool {
        self.cs.axes().len() == 3
    }

    pub fn frame(&self) -> &Arc<GeodeticFrame> {
        self.datum.representative()
    }

    pub fn ellipsoid(&self) -> &Arc<Ellipsoid> {
        self.frame().ellipsoid()
    }

    pub fn prime_meridian(&self) -> &Arc<PrimeMeridian> {
        self.frame().prime_meridian()
    }

    /// WGS 84, latitude-longitude degrees (EPSG:4326).
    pub fn epsg_4326() -> GeographicCrs {
        GeographicCrs::new(
            IdentifiedObject::named("WGS 84").with_epsg(4326),
            GeodeticDatumOrEnsemble::Datum(Arc::new(GeodeticFrame::new(
                IdentifiedObject::named("World Geodetic System 1984").with_epsg(6326),
                Ellipsoid::wgs84(),
                PrimeMeridian::greenwich(),
                None,
            ))),
            CoordinateSystem::ellipsoidal_lat_lon_degree(),
        )
        .expect("well-known CRS")
    }

    /// NAD83, latitude-longitude degrees (EPSG:4269).
    pub fn epsg_4269() -> GeographicCrs {
        GeographicCrs::new(
            IdentifiedObject::named("NAD83").with_epsg(4269),
            GeodeticDatumOrEnsemble::Datum(Arc::new(GeodeticFrame::new(
                IdentifiedObject::named("North American Datum 1983").with_epsg(6269),
                Ellipsoid::grs1980(),
                PrimeMeridian::greenwich(),
                None,
            ))),
            CoordinateSystem::ellipsoidal_lat_lon_degree(),
        )
        .expect("well-known CRS")
    }

    /// NTF (Paris), latitude-longitude in grads, Paris meridian
    /// (EPSG:4807).
    pub fn epsg_4807() -> GeographicCrs {
        use crate::cs::Axis;
        use crate::measure::UnitOfMeasure;
        let grad_axis = |name: &str, abbrev: &str, dir| {
            Axis::new(name.to_string(), abbrev.to_string(), dir, UnitOfMeasure::GRAD)
        };
        GeographicCrs::new(
            IdentifiedObject::named("NTF (Paris)").with_epsg(4807),
            GeodeticDatumOrEnsemble::Datum(Arc::new(GeodeticFrame::new(
                IdentifiedObject::named("Nouvelle Triangulation Francaise (Paris)")
                    .with_epsg(6807),
                Ellipsoid::clarke_1880_ign(),
                PrimeMeridian::paris(),
                None,
            ))),
            CoordinateSystem::new(
                CsKind::Ellipsoidal,
                vec![
                    grad_axis("Latitude", "lat", AxisDirection::North),
                    grad_axis("Longitude", "lon", AxisDirection::East),
                ],
            )
            .expect("well-known CS"),
        )
        .expect("well-known CRS")
    }
}

#[derive(Clone, Debug)]
pub struct ProjectedCrs {
    ident: IdentifiedObject,
    base: Arc<GeographicCrs>,
    conversion: Conversion,
    cs: CoordinateSystem,
}

impl ProjectedCrs {
    pub fn new(
        ident: IdentifiedObject,
        base: Arc<GeographicCrs>,
        conversion: Conversion,
        cs: CoordinateSystem,
    ) -> Result<Self> {
        if cs.kind() != CsKind::Cartesian {
            return Err(GeorefError::invalid_value(
                "projected CRS requires a Cartesian CS",
            ));
        }
        Ok(Self {
            ident,
            base,
            conversion,
            cs,
        })
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn base(&self) -> &Arc<GeographicCrs> {
        &self.base
    }

    pub fn deriving_conversion(&self) -> &Conversion {
        &self.conversion
    }

    pub fn cs(&self) -> &CoordinateSystem {
        &self.cs
    }
}

#[derive(Clone, Debug)]
pub struct VerticalCrs {
    ident: IdentifiedObject,
    datum: VerticalDatumOrEnsemble,
    cs: CoordinateSystem,
}

impl VerticalCrs {
    pub fn new(
        ident: IdentifiedObject,
        datum: VerticalDatumOrEnsemble,
        cs: CoordinateSystem,
    ) -> Result<Self> {
        if cs.kind() != CsKind::Vertical {
            return Err(GeorefError::invalid_value(
                "vertical CRS requires a vertical CS",
            ));
        }
        Ok(Self { ident, datum, cs })
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn datum(&self) -> &VerticalDatumOrEnsemble {
        &self.datum
    }

    pub fn cs(&self) -> &CoordinateSystem {
        &self.cs
    }
}

#[derive(Clone, Debug)]
pub struct TemporalCrs {
    ident: IdentifiedObject,
    datum: Arc<TemporalDatum>,
    cs: CoordinateSystem,
}

impl TemporalCrs {
    pub fn new(
        ident: IdentifiedObject,
        datum: Arc<TemporalDatum>,
        cs: CoordinateSystem,
    ) -> Result<Self> {
        if !matches!(
            cs.kind(),
            CsKind::TemporalDateTime | CsKind::TemporalCount | CsKind::TemporalMeasure
        ) {
            return Err(GeorefError::invalid_value(
                "temporal CRS requires a temporal CS",
            ));
        }
        Ok(Self { ident, datum, cs })
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn datum(&self) -> &Arc<TemporalDatum> {
        &self.datum
    }

    pub fn cs(&self) -> &CoordinateSystem {
        &self.cs
    }
}

#[derive(Clone, Debug)]
pub struct EngineeringCrs {
    ident: IdentifiedObject,
    datum: Arc<EngineeringDatum>,
    cs: CoordinateSystem,
}

impl EngineeringCrs {
    /// An engineering CRS pairs a local datum with an abstract CS;
    /// earth-bound CS kinds are rejected.
    pub fn new(
        ident: IdentifiedObject,
        datum: Arc<EngineeringDatum>,
        cs: CoordinateSystem,
    ) -> Result<Self> {
        if matches!(cs.kind(), CsKind::Ellipsoidal | CsKind::Vertical) {
            return Err(GeorefError::invalid_value(format!(
                "engineering CRS {:?} cannot use a {:?} CS",
                ident.name(),
                cs.kind()
            )));
        }
        Ok(Self { ident, datum, cs })
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn datum(&self) -> &Arc<EngineeringDatum> {
        &self.datum
    }

    pub fn cs(&self) -> &CoordinateSystem {
        &self.cs
    }
}

#[derive(Clone, Debug)]
pub struct ParametricCrs {
    ident: IdentifiedObject,
    datum: Arc<ParametricDatum>,
    cs: CoordinateSystem,
}

impl ParametricCrs {
    pub fn new(
        ident: IdentifiedObject,
        datum: Arc<ParametricDatum>,
        cs: CoordinateSystem,
    ) -> Result<Self> {
        if cs.kind() != CsKind::Parametric {
            return Err(GeorefError::invalid_value(
                "parametric CRS requires a parametric CS",
            ));
        }
        Ok(Self { ident, datum, cs })
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn datum(&self) -> &Arc<ParametricDatum> {
        &self.datum
    }

    pub fn cs(&self) -> &CoordinateSystem {
        &self.cs
    }
}

#[derive(Clone, Debug)]
pub struct CompoundCrs {
    ident: IdentifiedObject,
    components: Vec<Arc<Crs>>,
}

impl CompoundCrs {
    /// The first component must be horizontal (geographic-2D, projected,
    /// or engineering); later components vertical, parametric or
    /// temporal; no horizontal or vertical CRS twice.
    pub fn new(ident: IdentifiedObject, components: Vec<Arc<Crs>>) -> Result<Self> {
        if components.len() < 2 {
            return Err(GeorefError::invalid_value(
                "compound CRS requires at least two components",
            ));
        }
        let is_horizontal = |c: &Crs| {
            matches!(c, Crs::Projected(_))
                || matches!(c, Crs::Geographic(g) if !g.is_3d())
                || matches!(c, Crs::Engineering(e) if e.cs().axes().len() == 2)
        };
        if !is_horizontal(&components[0]) {
            return Err(GeorefError::invalid_value(format!(
                "compound CRS {:?}: first component must be a horizontal CRS",
                ident.name()
            )));
        }
        let mut verticals = 0;
        for extra in &components[1..] {
            match extra.as_ref() {
                Crs::Vertical(_) => {
                    verticals += 1;
                    if verticals > 1 {
                        return Err(GeorefError::invalid_value(
                            "compound CRS cannot contain two vertical components",
                        ));
                    }
                }
                Crs::Parametric(_) | Crs::Temporal(_) => {}
                other => {
                    return Err(GeorefError::invalid_value(format!(
                        "compound CRS component {:?} must be vertical, parametric or temporal",
                        other.name()
                    )))
                }
            }
        }
        Ok(Self { ident, components })
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn components(&self) -> &[Arc<Crs>] {
        &self.components
    }
}

/// A CRS decorated with a preferred transformation to a hub CRS
/// (typically WGS 84). Wrapping a bound CRS again keeps only the
/// outermost transformation.
#[derive(Clone, Debug)]
pub struct BoundCrs {
    ident: IdentifiedObject,
    base: Arc<Crs>,
    hub: Arc<Crs>,
    transformation: Arc<Transformation>,
}

impl BoundCrs {
    pub fn new(base: Arc<Crs>, hub: Arc<Crs>, transformation: Arc<Transformation>) -> Self {
        // Bound(Bound(X)) == Bound(X): flatten to the inner base
        let base = match base.as_ref() {
            Crs::Bound(inner) => inner.base.clone(),
            _ => base,
        };
        let ident = IdentifiedObject::named(base.name().to_string());
        Self {
            ident,
            base,
            hub,
            transformation,
        }
    }

    /// Attach a TOWGS84-style Helmert transformation (3 or 7 parameters,
    /// position-vector convention) from `base` to WGS 84.
    pub fn from_towgs84(base: Arc<Crs>, params: &[f64]) -> Result<BoundCrs> {
        let hub = Arc::new(Crs::Geographic(GeographicCrs::epsg_4326()));
        let transformation =
            Transformation::from_towgs84(base.clone(), hub.clone(), params)?;
        Ok(BoundCrs::new(base, hub, Arc::new(transformation)))
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn base(&self) -> &Arc<Crs> {
        &self.base
    }

    pub fn hub(&self) -> &Arc<Crs> {
        &self.hub
    }

    pub fn transformation(&self) -> &Arc<Transformation> {
        &self.transformation
    }
}

/// Generalization of Projected for non-geographic bases.
#[derive(Clone, Debug)]
pub struct DerivedCrs {
    ident: IdentifiedObject,
    base: Arc<Crs>,
    conversion: Conversion,
    cs: CoordinateSystem,
}

impl DerivedCrs {
    pub fn new(
        ident: IdentifiedObject,
        base: Arc<Crs>,
        conversion: Conversion,
        cs: CoordinateSystem,
    ) -> Result<Self> {
        if matches!(base.as_ref(), Crs::Bound(_) | Crs::Compound(_)) {
            return Err(GeorefError::invalid_value(
                "derived CRS base must be a single CRS",
            ));
        }
        Ok(Self {
            ident,
            base,
            conversion,
            cs,
        })
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn base(&self) -> &Arc<Crs> {
        &self.base
    }

    pub fn deriving_conversion(&self) -> &Conversion {
        &self.conversion
    }

    pub fn cs(&self) -> &CoordinateSystem {
        &self.cs
    }
}

/// A coordinate reference system of any kind.
#[derive(Clone, Debug)]
pub enum Crs {
    Geodetic(GeodeticCrs),
    Geographic(GeographicCrs),
    Projected(ProjectedCrs),
    Vertical(VerticalCrs),
    Temporal(TemporalCrs),
    Engineering(EngineeringCrs),
    Parametric(ParametricCrs),
    Compound(CompoundCrs),
    Bound(BoundCrs),
    Derived(DerivedCrs),
}

impl Crs {
    pub fn ident(&self) -> &IdentifiedObject {
        match self {
            Crs::Geodetic(c) => c.ident(),
            Crs::Geographic(c) => c.ident(),
            Crs::Projected(c) => c.ident(),
            Crs::Vertical(c) => c.ident(),
            Crs::Temporal(c) => c.ident(),
            Crs::Engineering(c) => c.ident(),
            Crs::Parametric(c) => c.ident(),
            Crs::Compound(c) => c.ident(),
            Crs::Bound(c) => c.ident(),
            Crs::Derived(c) => c.ident(),
        }
    }

    pub fn name(&self) -> &str {
        self.ident().name()
    }

    /// The base CRS of a derived, projected or bound CRS, materialized
    /// as a standalone value.
    pub fn base_crs(&self) -> Option<Crs> {
        match self {
            Crs::Projected(c) => Some(Crs::Geographic((**c.base()).clone())),
            Crs::Bound(c) => Some((**c.base()).clone()),
            Crs::Derived(c) => Some((**c.base()).clone()),
            _ => None,
        }
    }

    /// The coordinate system, when the CRS has a single one.
    pub fn cs(&self) -> Option<&CoordinateSystem> {
        match self {
            Crs::Geodetic(c) => Some(c.cs()),
            Crs::Geographic(c) => Some(c.cs()),
            Crs::Projected(c) => Some(c.cs()),
            Crs::Vertical(c) => Some(c.cs()),
            Crs::Temporal(c) => Some(c.cs()),
            Crs::Engineering(c) => Some(c.cs()),
            Crs::Parametric(c) => Some(c.cs()),
            Crs::Derived(c) => Some(c.cs()),
            Crs::Compound(_) | Crs::Bound(_) => None,
        }
    }

    /// The geodetic datum (or ensemble), walking through projected and
    /// bound wrappers.
    pub fn geodetic_datum(&self) -> Option<&GeodeticDatumOrEnsemble> {
        match self {
            Crs::Geodetic(c) => Some(c.datum()),
            Crs::Geographic(c) => Some(c.datum()),
            Crs::Projected(c) => Some(c.base().datum()),
            Crs::Bound(c) => c.base().geodetic_datum(),
            Crs::Derived(c) => c.base().geodetic_datum(),
            Crs::Compound(c) => c.components()[0].geodetic_datum(),
            _ => None,
        }
    }

    /// The geographic CRS reachable through the composition, if any.
    pub fn extract_geographic_crs(&self) -> Option<&GeographicCrs> {
        match self {
            Crs::Geographic(c) => Some(c),
            Crs::Projected(c) => Some(c.base()),
            Crs::Bound(c) => c.base().extract_geographic_crs(),
            Crs::Derived(c) => c.base().extract_geographic_crs(),
            Crs::Compound(c) => c
                .components()
                .iter()
                .find_map(|comp| comp.extract_geographic_crs()),
            _ => None,
        }
    }

    /// The vertical CRS of a compound (or the CRS itself when vertical).
    pub fn extract_vertical_crs(&self) -> Option<&VerticalCrs> {
        match self {
            Crs::Vertical(c) => Some(c),
            Crs::Bound(c) => c.base().extract_vertical_crs(),
            Crs::Compound(c) => c
                .components()
                .iter()
                .find_map(|comp| comp.extract_vertical_crs()),
            _ => None,
        }
    }

    /// Pin a transformation to WGS 84 onto a CRS if one is known.
    ///
    /// A CRS already carrying a bound wrapper is returned as-is. When
    /// the catalog knows a Helmert transformation (up to 7 parameters)
    /// from the CRS's datum to WGS 84, a bound CRS using it is
    /// synthesized; otherwise the original CRS is returned unchanged.
    pub fn to_wgs84_bound_if_possible(
        crs: &Arc<Crs>,
        catalog: &crate::catalog::Catalog,
    ) -> Arc<Crs> {
        if matches!(crs.as_ref(), Crs::Bound(_)) {
            return crs.clone();
        }
        let Some(datum) = crs.geodetic_datum() else {
            return crs.clone();
        };
        for code in datum.lookup_codes() {
            if let Some(params) = catalog.helmert_to_wgs84(code) {
                if let Ok(bound) = BoundCrs::from_towgs84(crs.clone(), &params) {
                    return Arc::new(Crs::Bound(bound));
                }
            }
        }
        crs.clone()
    }

    /// Semantic comparison per the criterion.
    pub fn is_equivalent_to(&self, other: &Crs, criterion: Criterion) -> bool {
        if criterion.is_strict() && !self.ident().matches_name(other.ident(), criterion) {
            return false;
        }
        let cs_matches = |a: &CoordinateSystem, b: &CoordinateSystem| {
            a.is_equivalent_to(b, criterion.base())
                || (criterion == Criterion::EquivalentIgnoringAxisOrder
                    && a.is_axis_swapped_variant_of(b))
        };
        match (self, other) {
            (Crs::Geographic(a), Crs::Geographic(b)) => {
                a.datum().is_equivalent_to(b.datum(), criterion.base())
                    && cs_matches(a.cs(), b.cs())
            }
            (Crs::Geodetic(a), Crs::Geodetic(b)) => {
                a.datum().is_equivalent_to(b.datum(), criterion.base())
                    && a.cs().is_equivalent_to(b.cs(), criterion.base())
            }
            (Crs::Projected(a), Crs::Projected(b)) => {
                Crs::Geographic((**a.base()).clone())
                    .is_equivalent_to(&Crs::Geographic((**b.base()).clone()), criterion)
                    && a.deriving_conversion()
                        .is_equivalent_to(b.deriving_conversion(), criterion.base())
                    && cs_matches(a.cs(), b.cs())
            }
            (Crs::Vertical(a), Crs::Vertical(b)) => {
                a.datum().is_equivalent_to(b.datum(), criterion.base())
                    && a.cs().is_equivalent_to(b.cs(), criterion.base())
            }
            (Crs::Compound(a), Crs::Compound(b)) => {
                a.components().len() == b.components().len()
                    && a.components()
                        .iter()
                        .zip(b.components().iter())
                        .all(|(x, y)| x.is_equivalent_to(y, criterion))
            }
            (Crs::Bound(a), Crs::Bound(b)) => {
                a.base().is_equivalent_to(b.base(), criterion)
                    && a.hub().is_equivalent_to(b.hub(), criterion)
                    && a.transformation()
                        .is_equivalent_to(b.transformation(), criterion.base())
            }
            (Crs::Temporal(a), Crs::Temporal(b)) => {
                a.datum().ident().matches_name(b.datum().ident(), criterion)
            }
            (Crs::Engineering(a), Crs::Engineering(b)) => {
                a.datum().ident().matches_name(b.datum().ident(), criterion)
                    && a.cs().is_equivalent_to(b.cs(), criterion.base())
            }
            (Crs::Parametric(a), Crs::Parametric(b)) => {
                a.datum().ident().matches_name(b.datum().ident(), criterion)
            }
            (Crs::Derived(a), Crs::Derived(b)) => {
                a.base().is_equivalent_to(b.base(), criterion)
                    && a.deriving_conversion()
                        .is_equivalent_to(b.deriving_conversion(), criterion.base())
                    && a.cs().is_equivalent_to(b.cs(), criterion.base())
            }
            _ => false,
        }
    }

    /// Export as WKT in the given convention, pretty-printed.
    pub fn to_wkt(&self, convention: crate::wkt::WktConvention) -> Result<String> {
        crate::wkt::formatter::format_crs(self, convention)
    }

    /// Export as a legacy `+proj=` description.
    pub fn to_proj_string(
        &self,
        convention: crate::projstring::ProjStringConvention,
    ) -> Result<String> {
        crate::projstring::formatter::format_crs(self, convention)
    }

    /// Axis order of the horizontal CS, for swap decisions.
    pub fn axis_order(&self) -> AxisOrder {
        match self.cs() {
            Some(cs) => cs.axis_order(),
            None => match self {
                Crs::Compound(c) => c.components()[0].axis_order(),
                Crs::Bound(c) => c.base().axis_order(),
                _ => AxisOrder::Other,
            },
        }
    }
}

impl From<GeographicCrs> for Crs {
    fn from(c: GeographicCrs) -> Crs {
        Crs::Geographic(c)
    }
}

impl From<ProjectedCrs> for Crs {
    fn from(c: ProjectedCrs) -> Crs {
        Crs::Projected(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::Axis;
    use crate::datum::VerticalFrame;
    use crate::measure::UnitOfMeasure;

    fn vertical_crs(name: &str) -> Arc<Crs> {
        Arc::new(Crs::Vertical(
            VerticalCrs::new(
                IdentifiedObject::named(name),
                VerticalDatumOrEnsemble::Datum(Arc::new(VerticalFrame::new(
                    IdentifiedObject::named(format!("{name} datum")),
                    None,
                ))),
                CoordinateSystem::vertical_up_metre(),
            )
            .unwrap(),
        ))
    }

    #[test]
    fn test_geographic_requires_ellipsoidal_cs() {
        let err = GeographicCrs::new(
            IdentifiedObject::named("bad"),
            GeographicCrs::epsg_4326().datum().clone(),
            CoordinateSystem::cartesian_easting_northing_metre(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_equivalence_ignoring_axis_order() {
        let lat_lon = GeographicCrs::epsg_4326();
        let lon_lat = GeographicCrs::new(
            IdentifiedObject::named("WGS 84 (longitude first)"),
            lat_lon.datum().clone(),
            CoordinateSystem::ellipsoidal_lon_lat_degree(),
        )
        .unwrap();
        let a = Crs::Geographic(lat_lon);
        let b = Crs::Geographic(lon_lat);
        assert!(!a.is_equivalent_to(&b, Criterion::Equivalent));
        assert!(a.is_equivalent_to(&b, Criterion::EquivalentIgnoringAxisOrder));
    }

    #[test]
    fn test_compound_ordering_invariant() {
        let horizontal = Arc::new(Crs::Geographic(GeographicCrs::epsg_4326()));
        let height = vertical_crs("EGM2008 height");
        let ok = CompoundCrs::new(
            IdentifiedObject::named("WGS 84 + EGM2008 height"),
            vec![horizontal.clone(), height.clone()],
        );
        assert!(ok.is_ok());

        // vertical first is rejected
        let err = CompoundCrs::new(
            IdentifiedObject::named("bad"),
            vec![height.clone(), horizontal.clone()],
        );
        assert!(err.is_err());

        // two verticals rejected
        let err = CompoundCrs::new(
            IdentifiedObject::named("bad"),
            vec![horizontal, height.clone(), vertical_crs("NAVD88 height")],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_compound_engineering_first_component_must_be_2d() {
        use crate::datum::EngineeringDatum;

        let datum = Arc::new(EngineeringDatum::new(
            IdentifiedObject::named("site datum"),
            None,
        ));
        let plan_2d = Arc::new(Crs::Engineering(
            EngineeringCrs::new(
                IdentifiedObject::named("site grid"),
                datum.clone(),
                CoordinateSystem::cartesian_easting_northing_metre(),
            )
            .unwrap(),
        ));
        let ok = CompoundCrs::new(
            IdentifiedObject::named("site grid + height"),
            vec![plan_2d, vertical_crs("site height")],
        );
        assert!(ok.is_ok());

        // A 3D engineering CRS is not a horizontal component
        let grid_3d = Arc::new(Crs::Engineering(
            EngineeringCrs::new(
                IdentifiedObject::named("site grid 3D"),
                datum.clone(),
                CoordinateSystem::new(
                    CsKind::Cartesian,
                    vec![
                        Axis::easting(),
                        Axis::northing(),
                        Axis::new("Height", "z", AxisDirection::Up, UnitOfMeasure::METRE),
                    ],
                )
                .unwrap(),
            )
            .unwrap(),
        ));
        let err = CompoundCrs::new(
            IdentifiedObject::named("bad"),
            vec![grid_3d, vertical_crs("site height")],
        );
        assert!(err.is_err());

        // ... and neither is a 1D one
        let linear = Arc::new(Crs::Engineering(
            EngineeringCrs::new(
                IdentifiedObject::named("chainage"),
                datum,
                CoordinateSystem::new(
                    CsKind::Ordinal,
                    vec![Axis::new(
                        "Distance",
                        "d",
                        AxisDirection::Forward,
                        UnitOfMeasure::METRE,
                    )],
                )
                .unwrap(),
            )
            .unwrap(),
        ));
        let err = CompoundCrs::new(
            IdentifiedObject::named("bad"),
            vec![linear, vertical_crs("site height")],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_engineering_crs_rejects_earthbound_cs() {
        use crate::datum::EngineeringDatum;

        let datum = Arc::new(EngineeringDatum::new(
            IdentifiedObject::named("site datum"),
            None,
        ));
        let err = EngineeringCrs::new(
            IdentifiedObject::named("bad"),
            datum.clone(),
            CoordinateSystem::ellipsoidal_lat_lon_degree(),
        );
        assert!(err.is_err());
        let err = EngineeringCrs::new(
            IdentifiedObject::named("bad"),
            datum,
            CoordinateSystem::vertical_up_metre(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_bound_crs_flattening() {
        let base = Arc::new(Crs::Geographic(GeographicCrs::epsg_4807()));
        let once = BoundCrs::from_towgs84(base.clone(), &[1.0, 2.0, 3.0]).unwrap();
        let once = Arc::new(Crs::Bound(once));
        let twice =
            BoundCrs::from_towgs84(once.clone(), &[4.0, 5.0, 6.0, 1.0, 2.0, 3.0, 7.0]).unwrap();
        // The outer wrapper wins and the base is the unwrapped CRS
        assert!(matches!(twice.base().as_ref(), Crs::Geographic(_)));
        assert_eq!(twice.base().name(), "NTF (Paris)");
    }

    #[test]
    fn test_extract_geographic_from_compound() {
        let horizontal = Arc::new(Crs::Geographic(GeographicCrs::epsg_4326()));
        let compound = Crs::Compound(
            CompoundCrs::new(
                IdentifiedObject::named("WGS 84 + height"),
                vec![horizontal, vertical_crs("height")],
            )
            .unwrap(),
        );
        let geog = compound.extract_geographic_crs().unwrap();
        assert_eq!(geog.ident().epsg_code(), Some(4326));
        let vert = compound.extract_vertical_crs().unwrap();
        assert_eq!(vert.ident().name(), "height");
    }

    #[test]
    fn test_geocentric_validation() {
        let datum = GeographicCrs::epsg_4326().datum().clone();
        let ok = GeodeticCrs::new(
            IdentifiedObject::named("WGS 84 (geocentric)").with_epsg(4978),
            datum.clone(),
            CoordinateSystem::cartesian_geocentric_metre(),
        );
        assert!(ok.is_ok());
        let err = GeodeticCrs::new(
            IdentifiedObject::named("bad"),
            datum,
            CoordinateSystem::new(
                CsKind::Cartesian,
                vec![Axis::easting(), Axis::northing()],
            )
            .unwrap(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_wgs84_bound_synthesis_from_catalog() {
        let catalog = crate::catalog::Catalog::new();
        // NTF (Paris) has a known Helmert shape to WGS 84
        let ntf = Arc::new(Crs::Geographic(GeographicCrs::epsg_4807()));
        let bound = Crs::to_wgs84_bound_if_possible(&ntf, &catalog);
        let Crs::Bound(b) = bound.as_ref() else {
            panic!("expected a bound CRS");
        };
        let h = b.transformation().helmert_params().unwrap();
        assert_eq!((h.x, h.y, h.z), (-168.0, -60.0, 320.0));

        // Already-bound CRSs pass through unchanged
        let again = Crs::to_wgs84_bound_if_possible(&bound, &catalog);
        assert!(Arc::ptr_eq(&bound, &again));

        // Unknown datum: returned unchanged
        let wgs84 = Arc::new(Crs::Geographic(GeographicCrs::epsg_4326()));
        let same = Crs::to_wgs84_bound_if_possible(&wgs84, &catalog);
        assert!(matches!(same.as_ref(), Crs::Geographic(_)));
    }

    #[test]
    fn test_axis_unit_on_4807() {
        let ntf = GeographicCrs::epsg_4807();
        assert_eq!(ntf.cs().axes()[0].unit(), &UnitOfMeasure::GRAD);
        assert_eq!(ntf.prime_meridian().proj_pm_id(), Some("paris"));
    }
}
