//! Geodetic primitives: ellipsoid, prime meridian, reference frames and
//! datum ensembles.
//!
//! An ellipsoid is normalized to `(semi_major, form)`; semi-minor axis and
//! inverse flattening are derived on demand and never stored together.

use std::sync::Arc;

use crate::error::{GeorefError, Result};
use crate::ident::{Criterion, IdentifiedObject, PositionalAccuracy};
use crate::measure::{tolerant_eq, Angle, Length, Scale, UnitOfMeasure};

/// Second defining parameter of an ellipsoid.
#[derive(Clone, Debug, PartialEq)]
pub enum EllipsoidForm {
    SemiMinor(Length),
    InverseFlattening(Scale),
    Sphere,
}

#[derive(Clone, Debug)]
pub struct Ellipsoid {
    ident: IdentifiedObject,
    semi_major: Length,
    form: EllipsoidForm,
}

impl Ellipsoid {
    pub fn new(ident: IdentifiedObject, semi_major: Length, form: EllipsoidForm) -> Result<Self> {
        if !(semi_major.si_value() > 0.0) {
            return Err(GeorefError::invalid_value(format!(
                "ellipsoid {:?}: semi-major axis must be > 0, got {}",
                ident.name(),
                semi_major.si_value()
            )));
        }
        match &form {
            EllipsoidForm::SemiMinor(b) => {
                if !(b.si_value() > 0.0) || b.si_value() > semi_major.si_value() {
                    return Err(GeorefError::invalid_value(format!(
                        "ellipsoid {:?}: semi-minor axis {} out of range",
                        ident.name(),
                        b.si_value()
                    )));
                }
            }
            EllipsoidForm::InverseFlattening(rf) => {
                let v = rf.si_value();
                // 0 means sphere; (0, 1] is numerically impossible
                if v != 0.0 && v <= 1.0 {
                    return Err(GeorefError::invalid_value(format!(
                        "ellipsoid {:?}: inverse flattening must be 0 or > 1, got {}",
                        ident.name(),
                        v
                    )));
                }
            }
            EllipsoidForm::Sphere => {}
        }
        Ok(Self {
            ident,
            semi_major,
            form,
        })
    }

    pub fn from_inverse_flattening(
        ident: IdentifiedObject,
        semi_major: Length,
        inverse_flattening: Scale,
    ) -> Result<Self> {
        Self::new(
            ident,
            semi_major,
            EllipsoidForm::InverseFlattening(inverse_flattening),
        )
    }

    pub fn from_semi_minor(
        ident: IdentifiedObject,
        semi_major: Length,
        semi_minor: Length,
    ) -> Result<Self> {
        Self::new(ident, semi_major, EllipsoidForm::SemiMinor(semi_minor))
    }

    pub fn sphere(ident: IdentifiedObject, radius: Length) -> Result<Self> {
        Self::new(ident, radius, EllipsoidForm::Sphere)
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn name(&self) -> &str {
        self.ident.name()
    }

    pub fn semi_major_axis(&self) -> &Length {
        &self.semi_major
    }

    pub fn form(&self) -> &EllipsoidForm {
        &self.form
    }

    pub fn is_sphere(&self) -> bool {
        match &self.form {
            EllipsoidForm::Sphere => true,
            EllipsoidForm::InverseFlattening(rf) => rf.si_value() == 0.0,
            EllipsoidForm::SemiMinor(b) => tolerant_eq(b.si_value(), self.semi_major.si_value()),
        }
    }

    /// Derived semi-minor axis, in the unit of the semi-major axis.
    pub fn semi_minor_axis(&self) -> Length {
        match &self.form {
            EllipsoidForm::SemiMinor(b) => b.clone(),
            EllipsoidForm::Sphere => self.semi_major.clone(),
            EllipsoidForm::InverseFlattening(rf) => {
                let rf = rf.si_value();
                if rf == 0.0 {
                    self.semi_major.clone()
                } else {
                    let b = self.semi_major.value() * (1.0 - 1.0 / rf);
                    Length::with_unit(b, self.semi_major.unit().clone())
                        .expect("unit kind preserved")
                }
            }
        }
    }

    /// Derived inverse flattening. The spherical case yields 0, which is
    /// the value WKT expects.
    pub fn inverse_flattening(&self) -> Scale {
        match &self.form {
            EllipsoidForm::InverseFlattening(rf) => rf.clone(),
            EllipsoidForm::Sphere => Scale::new(0.0),
            EllipsoidForm::SemiMinor(b) => {
                let a = self.semi_major.si_value();
                let b = b.si_value();
                if tolerant_eq(a, b) {
                    Scale::new(0.0)
                } else {
                    Scale::new(a / (a - b))
                }
            }
        }
    }

    /// First eccentricity squared.
    pub fn squared_eccentricity(&self) -> f64 {
        let rf = self.inverse_flattening().si_value();
        if rf == 0.0 {
            0.0
        } else {
            let f = 1.0 / rf;
            2.0 * f - f * f
        }
    }

    /// Short id understood by `+ellps=`, when the parameters match a
    /// well-known ellipsoid within tolerance.
    pub fn proj_ellps_id(&self) -> Option<&'static str> {
        const KNOWN: &[(&str, f64, f64)] = &[
            ("WGS84", 6378137.0, 298.257223563),
            ("GRS80", 6378137.0, 298.257222101),
            ("clrk80ign", 6378249.2, 293.4660212936269),
            ("krass", 6378245.0, 298.3),
            ("intl", 6378388.0, 297.0),
            ("WGS72", 6378135.0, 298.26),
            ("clrk66", 6378206.4, 294.9786982138982),
            ("bessel", 6377397.155, 299.1528128),
        ];
        let a = self.semi_major.si_value();
        let rf = self.inverse_flattening().si_value();
        KNOWN
            .iter()
            .find(|(_, ka, krf)| tolerant_eq(a, *ka) && tolerant_eq(rf, *krf))
            .map(|(id, _, _)| *id)
    }

    pub fn is_equivalent_to(&self, other: &Ellipsoid, criterion: Criterion) -> bool {
        if criterion.is_strict() && !self.ident.matches_name(&other.ident, criterion) {
            return false;
        }
        tolerant_eq(
            self.semi_major.si_value(),
            other.semi_major.si_value(),
        ) && tolerant_eq(
            self.semi_minor_axis().si_value(),
            other.semi_minor_axis().si_value(),
        )
    }

    // Well-known instances, named after their EPSG entries.

    pub fn wgs84() -> Arc<Ellipsoid> {
        Arc::new(
            Ellipsoid::from_inverse_flattening(
                IdentifiedObject::named("WGS 84").with_epsg(7030),
                Length::new(6378137.0),
                Scale::new(298.257223563),
            )
            .expect("well-known ellipsoid"),
        )
    }

    pub fn grs1980() -> Arc<Ellipsoid> {
        Arc::new(
            Ellipsoid::from_inverse_flattening(
                IdentifiedObject::named("GRS 1980").with_epsg(7019),
                Length::new(6378137.0),
                Scale::new(298.257222101),
            )
            .expect("well-known ellipsoid"),
        )
    }

    pub fn clarke_1880_ign() -> Arc<Ellipsoid> {
        Arc::new(
            Ellipsoid::from_semi_minor(
                IdentifiedObject::named("Clarke 1880 (IGN)").with_epsg(7011),
                Length::new(6378249.2),
                Length::new(6356515.0),
            )
            .expect("well-known ellipsoid"),
        )
    }

    pub fn krassowsky_1940() -> Arc<Ellipsoid> {
        Arc::new(
            Ellipsoid::from_inverse_flattening(
                IdentifiedObject::named("Krassowsky 1940").with_epsg(7024),
                Length::new(6378245.0),
                Scale::new(298.3),
            )
            .expect("well-known ellipsoid"),
        )
    }

    pub fn international_1924() -> Arc<Ellipsoid> {
        Arc::new(
            Ellipsoid::from_inverse_flattening(
                IdentifiedObject::named("International 1924").with_epsg(7022),
                Length::new(6378388.0),
                Scale::new(297.0),
            )
            .expect("well-known ellipsoid"),
        )
    }
}

impl PartialEq for Ellipsoid {
    fn eq(&self, other: &Self) -> bool {
        self.is_equivalent_to(other, Criterion::Equivalent)
    }
}

#[derive(Clone, Debug)]
pub struct PrimeMeridian {
    ident: IdentifiedObject,
    longitude: Angle,
}

impl PrimeMeridian {
    pub fn new(ident: IdentifiedObject, longitude: Angle) -> Self {
        Self { ident, longitude }
    }

    pub fn greenwich() -> Arc<PrimeMeridian> {
        Arc::new(PrimeMeridian::new(
            IdentifiedObject::named("Greenwich").with_epsg(8901),
            Angle::new(0.0),
        ))
    }

    /// Paris meridian, 2.5969213 grads east of Greenwich.
    pub fn paris() -> Arc<PrimeMeridian> {
        Arc::new(PrimeMeridian::new(
            IdentifiedObject::named("Paris").with_epsg(8903),
            Angle::with_unit(2.5969213, UnitOfMeasure::GRAD).expect("grad is angular"),
        ))
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn name(&self) -> &str {
        self.ident.name()
    }

    pub fn longitude(&self) -> &Angle {
        &self.longitude
    }

    pub fn is_greenwich(&self) -> bool {
        self.longitude.si_value() == 0.0
    }

    /// Id understood by `+pm=`, when the longitude matches a known meridian.
    pub fn proj_pm_id(&self) -> Option<&'static str> {
        if self.is_greenwich() {
            return None;
        }
        const KNOWN: &[(&str, f64)] = &[
            ("paris", 2.33722917),
            ("lisbon", -9.131906111111),
            ("bogota", -74.08091666666667),
            ("rome", 12.45233333333333),
        ];
        let deg = self.longitude.degrees();
        KNOWN
            .iter()
            .find(|(_, lon)| tolerant_eq(deg, *lon))
            .map(|(id, _)| *id)
    }

    pub fn is_equivalent_to(&self, other: &PrimeMeridian, criterion: Criterion) -> bool {
        if criterion.is_strict() && !self.ident.matches_name(&other.ident, criterion) {
            return false;
        }
        tolerant_eq(self.longitude.radians(), other.longitude.radians())
    }
}

impl PartialEq for PrimeMeridian {
    fn eq(&self, other: &Self) -> bool {
        self.is_equivalent_to(other, Criterion::Equivalent)
    }
}

/// A geodetic reference frame; dynamic frames carry a reference epoch in
/// decimal years.
#[derive(Clone, Debug)]
pub struct GeodeticFrame {
    ident: IdentifiedObject,
    ellipsoid: Arc<Ellipsoid>,
    prime_meridian: Arc<PrimeMeridian>,
    anchor: Option<String>,
    frame_reference_epoch: Option<f64>,
}

impl GeodeticFrame {
    pub fn new(
        ident: IdentifiedObject,
        ellipsoid: Arc<Ellipsoid>,
        prime_meridian: Arc<PrimeMeridian>,
        anchor: Option<String>,
    ) -> Self {
        Self {
            ident,
            ellipsoid,
            prime_meridian,
            anchor,
            frame_reference_epoch: None,
        }
    }

    pub fn dynamic(
        ident: IdentifiedObject,
        ellipsoid: Arc<Ellipsoid>,
        prime_meridian: Arc<PrimeMeridian>,
        anchor: Option<String>,
        frame_reference_epoch: f64,
    ) -> Self {
        Self {
            ident,
            ellipsoid,
            prime_meridian,
            anchor,
            frame_reference_epoch: Some(frame_reference_epoch),
        }
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn name(&self) -> &str {
        self.ident.name()
    }

    pub fn ellipsoid(&self) -> &Arc<Ellipsoid> {
        &self.ellipsoid
    }

    pub fn prime_meridian(&self) -> &Arc<PrimeMeridian> {
        &self.prime_meridian
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.frame_reference_epoch.is_some()
    }

    pub fn frame_reference_epoch(&self) -> Option<f64> {
        self.frame_reference_epoch
    }

    /// Two frames are equivalent iff their ellipsoids and prime meridians
    /// are equivalent.
    pub fn is_equivalent_to(&self, other: &GeodeticFrame, criterion: Criterion) -> bool {
        if criterion.is_strict() && !self.ident.matches_name(&other.ident, criterion) {
            return false;
        }
        self.ellipsoid.is_equivalent_to(&other.ellipsoid, criterion.base())
            && self
                .prime_meridian
                .is_equivalent_to(&other.prime_meridian, criterion.base())
    }
}

#[derive(Clone, Debug)]
pub struct VerticalFrame {
    ident: IdentifiedObject,
    anchor: Option<String>,
    frame_reference_epoch: Option<f64>,
}

impl VerticalFrame {
    pub fn new(ident: IdentifiedObject, anchor: Option<String>) -> Self {
        Self {
            ident,
            anchor,
            frame_reference_epoch: None,
        }
    }

    pub fn dynamic(ident: IdentifiedObject, anchor: Option<String>, epoch: f64) -> Self {
        Self {
            ident,
            anchor,
            frame_reference_epoch: Some(epoch),
        }
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn name(&self) -> &str {
        self.ident.name()
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.frame_reference_epoch.is_some()
    }

    pub fn frame_reference_epoch(&self) -> Option<f64> {
        self.frame_reference_epoch
    }

    pub fn is_equivalent_to(&self, other: &VerticalFrame, criterion: Criterion) -> bool {
        self.ident.matches_name(&other.ident, criterion)
    }
}

/// Datum of a temporal CRS: a calendar plus a temporal origin.
#[derive(Clone, Debug)]
pub struct TemporalDatum {
    ident: IdentifiedObject,
    calendar: String,
    origin: String,
}

impl TemporalDatum {
    pub fn new(
        ident: IdentifiedObject,
        calendar: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            ident,
            calendar: calendar.into(),
            origin: origin.into(),
        }
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn calendar(&self) -> &str {
        &self.calendar
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

#[derive(Clone, Debug)]
pub struct EngineeringDatum {
    ident: IdentifiedObject,
    anchor: Option<String>,
}

impl EngineeringDatum {
    pub fn new(ident: IdentifiedObject, anchor: Option<String>) -> Self {
        Self { ident, anchor }
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }
}

#[derive(Clone, Debug)]
pub struct ParametricDatum {
    ident: IdentifiedObject,
    anchor: Option<String>,
}

impl ParametricDatum {
    pub fn new(ident: IdentifiedObject, anchor: Option<String>) -> Self {
        Self { ident, anchor }
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }
}

/// A collection of realizations treated as interchangeable up to the
/// ensemble accuracy. For operation lookup any member datum is
/// acceptable; the ensemble accuracy is added to the operation accuracy.
#[derive(Clone, Debug)]
pub struct DatumEnsemble<D> {
    ident: IdentifiedObject,
    members: Vec<Arc<D>>,
    accuracy: PositionalAccuracy,
}

impl<D> DatumEnsemble<D> {
    pub fn new(
        ident: IdentifiedObject,
        members: Vec<Arc<D>>,
        accuracy: PositionalAccuracy,
    ) -> Result<Self> {
        if members.len() < 2 {
            return Err(GeorefError::invalid_value(format!(
                "datum ensemble {:?} requires at least two members",
                ident.name()
            )));
        }
        Ok(Self {
            ident,
            members,
            accuracy,
        })
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn name(&self) -> &str {
        self.ident.name()
    }

    pub fn members(&self) -> &[Arc<D>] {
        &self.members
    }

    pub fn accuracy(&self) -> PositionalAccuracy {
        self.accuracy
    }
}

/// Either a single geodetic frame or an ensemble of them.
#[derive(Clone, Debug)]
pub enum GeodeticDatumOrEnsemble {
    Datum(Arc<GeodeticFrame>),
    Ensemble(Arc<DatumEnsemble<GeodeticFrame>>),
}

impl GeodeticDatumOrEnsemble {
    /// The frame used for computations: the datum itself, or the first
    /// ensemble member.
    pub fn representative(&self) -> &Arc<GeodeticFrame> {
        match self {
            GeodeticDatumOrEnsemble::Datum(d) => d,
            GeodeticDatumOrEnsemble::Ensemble(e) => &e.members()[0],
        }
    }

    pub fn ident(&self) -> &IdentifiedObject {
        match self {
            GeodeticDatumOrEnsemble::Datum(d) => d.ident(),
            GeodeticDatumOrEnsemble::Ensemble(e) => e.ident(),
        }
    }

    pub fn ensemble_accuracy(&self) -> Option<PositionalAccuracy> {
        match self {
            GeodeticDatumOrEnsemble::Datum(_) => None,
            GeodeticDatumOrEnsemble::Ensemble(e) => Some(e.accuracy()),
        }
    }

    /// Candidate datum codes for operation lookup: the datum's own code,
    /// or every member's code for an ensemble.
    pub fn lookup_codes(&self) -> Vec<u32> {
        match self {
            GeodeticDatumOrEnsemble::Datum(d) => d.ident().epsg_code().into_iter().collect(),
            GeodeticDatumOrEnsemble::Ensemble(e) => e
                .members()
                .iter()
                .filter_map(|m| m.ident().epsg_code())
                .collect(),
        }
    }

    pub fn is_equivalent_to(&self, other: &GeodeticDatumOrEnsemble, criterion: Criterion) -> bool {
        self.representative()
            .is_equivalent_to(other.representative(), criterion)
    }
}

#[derive(Clone, Debug)]
pub enum VerticalDatumOrEnsemble {
    Datum(Arc<VerticalFrame>),
    Ensemble(Arc<DatumEnsemble<VerticalFrame>>),
}

impl VerticalDatumOrEnsemble {
    pub fn representative(&self) -> &Arc<VerticalFrame> {
        match self {
            VerticalDatumOrEnsemble::Datum(d) => d,
            VerticalDatumOrEnsemble::Ensemble(e) => &e.members()[0],
        }
    }

    pub fn ident(&self) -> &IdentifiedObject {
        match self {
            VerticalDatumOrEnsemble::Datum(d) => d.ident(),
            VerticalDatumOrEnsemble::Ensemble(e) => e.ident(),
        }
    }

    pub fn is_equivalent_to(&self, other: &VerticalDatumOrEnsemble, criterion: Criterion) -> bool {
        self.representative()
            .is_equivalent_to(other.representative(), criterion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wgs84_derived_values() {
        let e = Ellipsoid::wgs84();
        assert_relative_eq!(
            e.semi_minor_axis().si_value(),
            6356752.314245179,
            epsilon = 1e-6
        );
        assert_relative_eq!(e.inverse_flattening().si_value(), 298.257223563);
        assert!(!e.is_sphere());
        assert_eq!(e.proj_ellps_id(), Some("WGS84"));
    }

    #[test]
    fn test_clarke_ign_inverse_flattening_from_semi_minor() {
        let e = Ellipsoid::clarke_1880_ign();
        assert_relative_eq!(
            e.inverse_flattening().si_value(),
            293.4660212936269,
            epsilon = 1e-9
        );
        assert_eq!(e.proj_ellps_id(), Some("clrk80ign"));
    }

    #[test]
    fn test_sphere_flattening_is_zero() {
        let s = Ellipsoid::sphere(
            IdentifiedObject::named("GRS 1980 Authalic Sphere"),
            Length::new(6371007.0),
        )
        .unwrap();
        assert!(s.is_sphere());
        assert_eq!(s.inverse_flattening().si_value(), 0.0);
        assert_eq!(s.semi_minor_axis().si_value(), 6371007.0);
    }

    #[test]
    fn test_invalid_ellipsoids_rejected() {
        assert!(Ellipsoid::from_inverse_flattening(
            IdentifiedObject::named("bad"),
            Length::new(-1.0),
            Scale::new(298.0),
        )
        .is_err());
        // 1/f in (0, 1] is impossible
        assert!(Ellipsoid::from_inverse_flattening(
            IdentifiedObject::named("bad"),
            Length::new(6378137.0),
            Scale::new(0.5),
        )
        .is_err());
        // 1/f == 0 means sphere, accepted
        assert!(Ellipsoid::from_inverse_flattening(
            IdentifiedObject::named("sphere-ish"),
            Length::new(6378137.0),
            Scale::new(0.0),
        )
        .is_ok());
    }

    #[test]
    fn test_paris_prime_meridian() {
        let pm = PrimeMeridian::paris();
        assert!(!pm.is_greenwich());
        assert_relative_eq!(pm.longitude().degrees(), 2.33722917, epsilon = 1e-9);
        assert_eq!(pm.proj_pm_id(), Some("paris"));
        assert_eq!(PrimeMeridian::greenwich().proj_pm_id(), None);
    }

    #[test]
    fn test_frame_equivalence() {
        let ntf = GeodeticFrame::new(
            IdentifiedObject::named("Nouvelle Triangulation Francaise (Paris)").with_epsg(6807),
            Ellipsoid::clarke_1880_ign(),
            PrimeMeridian::paris(),
            None,
        );
        let same = GeodeticFrame::new(
            IdentifiedObject::named("NTF (Paris)"),
            Ellipsoid::clarke_1880_ign(),
            PrimeMeridian::paris(),
            None,
        );
        let wgs = GeodeticFrame::new(
            IdentifiedObject::named("World Geodetic System 1984").with_epsg(6326),
            Ellipsoid::wgs84(),
            PrimeMeridian::greenwich(),
            None,
        );
        assert!(ntf.is_equivalent_to(&same, Criterion::Equivalent));
        assert!(!ntf.is_equivalent_to(&same, Criterion::Strict));
        assert!(!ntf.is_equivalent_to(&wgs, Criterion::Equivalent));
    }

    #[test]
    fn test_ensemble_requires_two_members() {
        let w84 = Arc::new(GeodeticFrame::new(
            IdentifiedObject::named("World Geodetic System 1984 (G1762)"),
            Ellipsoid::wgs84(),
            PrimeMeridian::greenwich(),
            None,
        ));
        let err = DatumEnsemble::new(
            IdentifiedObject::named("WGS 84 ensemble"),
            vec![w84.clone()],
            PositionalAccuracy::metres(2.0),
        );
        assert!(err.is_err());
        let w84_g2139 = Arc::new(GeodeticFrame::new(
            IdentifiedObject::named("World Geodetic System 1984 (G2139)"),
            Ellipsoid::wgs84(),
            PrimeMeridian::greenwich(),
            None,
        ));
        let ens = DatumEnsemble::new(
            IdentifiedObject::named("WGS 84 ensemble"),
            vec![w84, w84_g2139],
            PositionalAccuracy::metres(2.0),
        )
        .unwrap();
        assert_eq!(ens.members().len(), 2);
    }
}
