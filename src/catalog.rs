//! Read-only authority catalog: named geodetic objects keyed by
//! `(authority, code)`, plus the graph of known transformations between
//! datums that powers the operation factory.
//!
//! The registry is a built-in table covering the EPSG objects this
//! library's operations exercise, along with a few OGC and IGNF
//! entries. Codes are strings; `(authority, code)` is case-sensitive.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::crs::{Crs, GeodeticCrs, GeographicCrs, ProjectedCrs};
use crate::cs::{Axis, AxisDirection, CoordinateSystem, CsKind};
use crate::datum::{
    Ellipsoid, GeodeticDatumOrEnsemble, GeodeticFrame, PrimeMeridian,
};
use crate::error::{GeorefError, Result};
use crate::ident::{Extent, GeographicBoundingBox, IdentifiedObject, PositionalAccuracy};
use crate::measure::{Angle, Length, Scale, UnitOfMeasure};
use crate::operation::{Conversion, GridDescriptor, Transformation};

/// Object families addressable through `get_codes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectType {
    Ellipsoid,
    PrimeMeridian,
    Datum,
    CoordinateSystem,
    Crs,
    CoordinateOperation,
}

/// How a catalogued transformation's parameters are shaped.
#[derive(Clone, Copy, Debug)]
enum TransformKind {
    GeocentricTranslations([f64; 3]),
    PositionVector([f64; 7]),
    CoordinateFrame([f64; 7]),
    LongitudeRotationGrads(f64),
    Ntv2(&'static str),
}

struct TransformRecord {
    code: u32,
    name: &'static str,
    source_datum: u32,
    target_datum: u32,
    kind: TransformKind,
    accuracy: Option<f64>,
    area_name: &'static str,
    bbox: (f64, f64, f64, f64),
    deprecated: bool,
}

/// (west, south, east, north)
const WORLD: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);
const FRANCE: (f64, f64, f64, f64) = (-4.87, 41.31, 10.38, 51.14);

const TRANSFORMATIONS: &[TransformRecord] = &[
    TransformRecord {
        code: 1763,
        name: "NTF (Paris) to NTF (1)",
        source_datum: 6807,
        target_datum: 6275,
        kind: TransformKind::LongitudeRotationGrads(2.5969213),
        accuracy: Some(0.0),
        area_name: "France - onshore and offshore, mainland and Corsica.",
        bbox: FRANCE,
        deprecated: false,
    },
    TransformRecord {
        code: 1193,
        name: "NTF to WGS 84 (1)",
        source_datum: 6275,
        target_datum: 6326,
        kind: TransformKind::GeocentricTranslations([-168.0, -60.0, 320.0]),
        accuracy: Some(2.0),
        area_name: "France - onshore - mainland and Corsica.",
        bbox: FRANCE,
        deprecated: false,
    },
    TransformRecord {
        code: 1054,
        name: "NTF (Paris) to RGF93 (2)",
        source_datum: 6807,
        target_datum: 6171,
        kind: TransformKind::Ntv2("ntf_r93.gsb"),
        accuracy: Some(0.05),
        area_name: "France - onshore - mainland and Corsica.",
        bbox: FRANCE,
        deprecated: false,
    },
    TransformRecord {
        code: 15994,
        name: "Pulkovo 1942(58) to ETRS89 (4)",
        source_datum: 6179,
        target_datum: 6258,
        kind: TransformKind::CoordinateFrame([
            2.3287,
            -147.0425,
            -92.0802,
            0.3092483,
            -0.32482185,
            -0.49729934,
            5.68906266,
        ]),
        accuracy: Some(3.0),
        area_name: "Romania - onshore and offshore.",
        bbox: (20.26, 43.44, 31.41, 48.27),
        deprecated: false,
    },
    TransformRecord {
        code: 1644,
        name: "Pulkovo 1942(58) to ETRS89 (1)",
        source_datum: 6179,
        target_datum: 6258,
        kind: TransformKind::PositionVector([
            33.4, -146.6, -76.3, -0.359, -0.053, 0.844, -0.84,
        ]),
        accuracy: Some(1.0),
        area_name: "Poland - onshore.",
        bbox: (14.14, 49.0, 24.15, 54.89),
        deprecated: false,
    },
    TransformRecord {
        code: 1173,
        name: "NAD27 to WGS 84 (4)",
        source_datum: 6267,
        target_datum: 6326,
        kind: TransformKind::GeocentricTranslations([-8.0, 160.0, 176.0]),
        accuracy: Some(10.0),
        area_name: "North America - USA - CONUS including EEZ.",
        bbox: (-129.17, 23.81, -65.69, 49.38),
        deprecated: false,
    },
    TransformRecord {
        code: 1313,
        name: "NAD27 to NAD83 (4)",
        source_datum: 6267,
        target_datum: 6269,
        kind: TransformKind::Ntv2("ntv2_0.gsb"),
        accuracy: Some(1.5),
        area_name: "Canada - onshore and offshore.",
        bbox: (-141.01, 40.04, -47.74, 86.46),
        deprecated: false,
    },
];

/// Datum code to its canonical geographic CRS code.
const DATUM_TO_CRS: &[(u32, u32)] = &[
    (6326, 4326),
    (6269, 4269),
    (6267, 4267),
    (6258, 4258),
    (6275, 4275),
    (6807, 4807),
    (6179, 4179),
    (6284, 4284),
    (6171, 4171),
];

/// Helmert shapes usable to synthesize a bound CRS to WGS 84.
const TOWGS84_BY_DATUM: &[(u32, [f64; 7])] = &[
    (6275, [-168.0, -60.0, 320.0, 0.0, 0.0, 0.0, 0.0]),
    (6807, [-168.0, -60.0, 320.0, 0.0, 0.0, 0.0, 0.0]),
    (6267, [-8.0, 160.0, 176.0, 0.0, 0.0, 0.0, 0.0]),
];

const EPSG_ELLIPSOIDS: &[u32] = &[7004, 7008, 7011, 7019, 7022, 7024, 7030, 7043];
const EPSG_PRIME_MERIDIANS: &[u32] = &[8901, 8903];
const EPSG_DATUMS: &[u32] = &[6171, 6179, 6258, 6267, 6269, 6275, 6284, 6326, 6807];
const EPSG_CS: &[u32] = &[4400, 6422, 6423, 6499, 6500];
const EPSG_CRS: &[u32] = &[
    2154, 4171, 4179, 4258, 4267, 4269, 4275, 4284, 4326, 4807, 4978, 4979, 32631, 32632,
];

/// A read-only catalog handle scoped to one authority. Handles are
/// cheap to clone; every clone sees the same registry epoch.
#[derive(Clone, Debug)]
pub struct Catalog {
    authority: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::for_authority("EPSG")
    }
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog::default()
    }

    pub fn for_authority(authority: impl Into<String>) -> Catalog {
        Catalog {
            authority: authority.into(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn get_authorities() -> BTreeSet<String> {
        ["EPSG", "IGNF", "ESRI", "OGC"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn miss(&self, code: &str) -> GeorefError {
        GeorefError::no_such_code(self.authority.clone(), code)
    }

    fn epsg_code(&self, code: &str) -> Result<u32> {
        if self.authority != "EPSG" {
            return Err(self.miss(code));
        }
        code.parse::<u32>().map_err(|_| self.miss(code))
    }

    /// Codes known for an object family. Deprecated entries appear only
    /// when requested.
    pub fn get_codes(&self, object_type: ObjectType, allow_deprecated: bool) -> BTreeSet<String> {
        let codes: Vec<String> = match (self.authority.as_str(), object_type) {
            ("EPSG", ObjectType::Ellipsoid) => {
                EPSG_ELLIPSOIDS.iter().map(|c| c.to_string()).collect()
            }
            ("EPSG", ObjectType::PrimeMeridian) => {
                EPSG_PRIME_MERIDIANS.iter().map(|c| c.to_string()).collect()
            }
            ("EPSG", ObjectType::Datum) => EPSG_DATUMS.iter().map(|c| c.to_string()).collect(),
            ("EPSG", ObjectType::CoordinateSystem) => {
                EPSG_CS.iter().map(|c| c.to_string()).collect()
            }
            ("EPSG", ObjectType::Crs) => EPSG_CRS.iter().map(|c| c.to_string()).collect(),
            ("EPSG", ObjectType::CoordinateOperation) => TRANSFORMATIONS
                .iter()
                .filter(|r| allow_deprecated || !r.deprecated)
                .map(|r| r.code.to_string())
                .collect(),
            ("OGC", ObjectType::Crs) => vec!["CRS84".to_string()],
            ("IGNF", ObjectType::Crs) => vec!["LAMB93".to_string()],
            ("ESRI", ObjectType::Crs) => vec!["102110".to_string()],
            _ => Vec::new(),
        };
        codes.into_iter().collect()
    }

    pub fn create_ellipsoid(&self, code: &str) -> Result<Arc<Ellipsoid>> {
        match self.epsg_code(code)? {
            7030 => Ok(Ellipsoid::wgs84()),
            7019 => Ok(Ellipsoid::grs1980()),
            7011 => Ok(Ellipsoid::clarke_1880_ign()),
            7024 => Ok(Ellipsoid::krassowsky_1940()),
            7022 => Ok(Ellipsoid::international_1924()),
            7043 => Ok(Arc::new(Ellipsoid::from_inverse_flattening(
                IdentifiedObject::named("WGS 72").with_epsg(7043),
                Length::new(6378135.0),
                Scale::new(298.26),
            )?)),
            7008 => Ok(Arc::new(Ellipsoid::from_semi_minor(
                IdentifiedObject::named("Clarke 1866").with_epsg(7008),
                Length::new(6378206.4),
                Length::new(6356583.8),
            )?)),
            7004 => Ok(Arc::new(Ellipsoid::from_inverse_flattening(
                IdentifiedObject::named("Bessel 1841").with_epsg(7004),
                Length::new(6377397.155),
                Scale::new(299.1528128),
            )?)),
            _ => Err(self.miss(code)),
        }
    }

    pub fn create_prime_meridian(&self, code: &str) -> Result<Arc<PrimeMeridian>> {
        match self.epsg_code(code)? {
            8901 => Ok(PrimeMeridian::greenwich()),
            8903 => Ok(PrimeMeridian::paris()),
            _ => Err(self.miss(code)),
        }
    }

    pub fn create_datum(&self, code: &str) -> Result<Arc<GeodeticFrame>> {
        let numeric = self.epsg_code(code)?;
        let frame = |name: &str, ellipsoid: Arc<Ellipsoid>, pm: Arc<PrimeMeridian>| {
            Arc::new(GeodeticFrame::new(
                IdentifiedObject::named(name.to_string()).with_epsg(numeric),
                ellipsoid,
                pm,
                None,
            ))
        };
        let greenwich = PrimeMeridian::greenwich();
        Ok(match numeric {
            6326 => frame(
                "World Geodetic System 1984",
                Ellipsoid::wgs84(),
                greenwich,
            ),
            6269 => frame("North American Datum 1983", Ellipsoid::grs1980(), greenwich),
            6267 => frame(
                "North American Datum 1927",
                self.create_ellipsoid("7008")?,
                greenwich,
            ),
            6258 => frame(
                "European Terrestrial Reference System 1989",
                Ellipsoid::grs1980(),
                greenwich,
            ),
            6275 => frame(
                "Nouvelle Triangulation Francaise",
                Ellipsoid::clarke_1880_ign(),
                greenwich,
            ),
            6807 => frame(
                "Nouvelle Triangulation Francaise (Paris)",
                Ellipsoid::clarke_1880_ign(),
                PrimeMeridian::paris(),
            ),
            6179 => frame("Pulkovo 1942(58)", Ellipsoid::krassowsky_1940(), greenwich),
            6284 => frame("Pulkovo 1942", Ellipsoid::krassowsky_1940(), greenwich),
            6171 => frame(
                "Reseau Geodesique Francais 1993",
                Ellipsoid::grs1980(),
                greenwich,
            ),
            _ => return Err(self.miss(code)),
        })
    }

    pub fn create_coordinate_system(&self, code: &str) -> Result<CoordinateSystem> {
        Ok(match self.epsg_code(code)? {
            6422 => CoordinateSystem::ellipsoidal_lat_lon_degree(),
            6423 => CoordinateSystem::ellipsoidal_lat_lon_height(),
            4400 => CoordinateSystem::cartesian_easting_northing_metre(),
            6500 => CoordinateSystem::cartesian_geocentric_metre(),
            6499 => CoordinateSystem::vertical_up_metre(),
            _ => return Err(self.miss(code)),
        })
    }

    /// Canonical geographic CRS of a datum, when one is catalogued.
    fn crs_code_for_datum(&self, datum_code: u32) -> Option<u32> {
        DATUM_TO_CRS
            .iter()
            .find(|(d, _)| *d == datum_code)
            .map(|(_, c)| *c)
    }

    pub fn create_crs(&self, code: &str) -> Result<Arc<Crs>> {
        match self.authority.as_str() {
            "OGC" if code == "CRS84" => {
                let wgs84 = GeographicCrs::epsg_4326();
                return Ok(Arc::new(Crs::Geographic(GeographicCrs::new(
                    IdentifiedObject::named("WGS 84 (CRS84)")
                        .with_identifier(crate::ident::Identifier::new("OGC", "CRS84")),
                    wgs84.datum().clone(),
                    CoordinateSystem::ellipsoidal_lon_lat_degree(),
                )?)));
            }
            "IGNF" if code == "LAMB93" => {
                let epsg = Catalog::for_authority("EPSG");
                return epsg.create_crs("2154");
            }
            "ESRI" if code == "102110" => {
                let epsg = Catalog::for_authority("EPSG");
                return epsg.create_crs("2154");
            }
            _ => {}
        }
        let numeric = self.epsg_code(code)?;
        let geographic = |name: &str, datum_code: u32, extent: Extent| -> Result<Arc<Crs>> {
            Ok(Arc::new(Crs::Geographic(GeographicCrs::new(
                IdentifiedObject::named(name.to_string())
                    .with_epsg(numeric)
                    .with_extent(extent),
                GeodeticDatumOrEnsemble::Datum(self.create_datum(&datum_code.to_string())?),
                CoordinateSystem::ellipsoidal_lat_lon_degree(),
            )?)))
        };
        match numeric {
            4326 => geographic("WGS 84", 6326, Extent::world().described("World.")),
            4269 => geographic(
                "NAD83",
                6269,
                Extent::from_bbox(-172.54, 23.81, -47.74, 86.46).described("North America."),
            ),
            4267 => geographic(
                "NAD27",
                6267,
                Extent::from_bbox(-172.54, 7.15, -47.74, 83.17).described("North America."),
            ),
            4258 => geographic(
                "ETRS89",
                6258,
                Extent::from_bbox(-16.1, 32.88, 40.18, 84.73).described("Europe - ETRS89."),
            ),
            4275 => geographic(
                "NTF",
                6275,
                Extent::from_bbox(FRANCE.0, FRANCE.1, FRANCE.2, FRANCE.3)
                    .described("France - onshore - mainland and Corsica."),
            ),
            4179 => geographic(
                "Pulkovo 1942(58)",
                6179,
                Extent::from_bbox(9.18, 39.63, 31.41, 54.89)
                    .described("Europe - onshore - eastern - S-42(58)."),
            ),
            4284 => geographic(
                "Pulkovo 1942",
                6284,
                Extent::from_bbox(19.57, 35.14, -168.97, 81.91)
                    .described("Europe - FSU onshore."),
            ),
            4171 => geographic(
                "RGF93",
                6171,
                Extent::from_bbox(FRANCE.0, FRANCE.1, FRANCE.2, FRANCE.3)
                    .described("France - onshore and offshore."),
            ),
            4807 => {
                let grad_axis = |name: &str, abbrev: &str, dir| {
                    Axis::new(name.to_string(), abbrev.to_string(), dir, UnitOfMeasure::GRAD)
                };
                Ok(Arc::new(Crs::Geographic(GeographicCrs::new(
                    IdentifiedObject::named("NTF (Paris)")
                        .with_epsg(4807)
                        .with_extent(
                            Extent::from_bbox(FRANCE.0, FRANCE.1, FRANCE.2, FRANCE.3)
                                .described("France - onshore - mainland and Corsica."),
                        ),
                    GeodeticDatumOrEnsemble::Datum(self.create_datum("6807")?),
                    CoordinateSystem::new(
                        CsKind::Ellipsoidal,
                        vec![
                            grad_axis("Latitude", "lat", AxisDirection::North),
                            grad_axis("Longitude", "lon", AxisDirection::East),
                        ],
                    )?,
                )?)))
            }
            4978 => Ok(Arc::new(Crs::Geodetic(GeodeticCrs::new(
                IdentifiedObject::named("WGS 84")
                    .with_epsg(4978)
                    .with_extent(Extent::world().described("World.")),
                GeodeticDatumOrEnsemble::Datum(self.create_datum("6326")?),
                CoordinateSystem::cartesian_geocentric_metre(),
            )?))),
            4979 => Ok(Arc::new(Crs::Geographic(GeographicCrs::new(
                IdentifiedObject::named("WGS 84")
                    .with_epsg(4979)
                    .with_extent(Extent::world().described("World.")),
                GeodeticDatumOrEnsemble::Datum(self.create_datum("6326")?),
                CoordinateSystem::ellipsoidal_lat_lon_height(),
            )?))),
            32631 | 32632 => {
                let zone = (numeric - 32600) as u8;
                let west = zone as f64 * 6.0 - 186.0;
                let base = match self.create_crs("4326")?.as_ref() {
                    Crs::Geographic(g) => Arc::new(g.clone()),
                    _ => unreachable!("4326 is geographic"),
                };
                Ok(Arc::new(Crs::Projected(ProjectedCrs::new(
                    IdentifiedObject::named(format!("WGS 84 / UTM zone {zone}N"))
                        .with_epsg(numeric)
                        .with_extent(
                            Extent::from_bbox(west, 0.0, west + 6.0, 84.0).described(
                                "Between the zone meridians, northern hemisphere.",
                            ),
                        ),
                    base,
                    Conversion::utm(zone, true),
                    CoordinateSystem::cartesian_easting_northing_metre(),
                )?)))
            }
            2154 => {
                let base = match self.create_crs("4171")?.as_ref() {
                    Crs::Geographic(g) => Arc::new(g.clone()),
                    _ => unreachable!("4171 is geographic"),
                };
                Ok(Arc::new(Crs::Projected(ProjectedCrs::new(
                    IdentifiedObject::named("RGF93 / Lambert-93")
                        .with_epsg(2154)
                        .with_extent(
                            Extent::from_bbox(FRANCE.0, FRANCE.1, FRANCE.2, FRANCE.3)
                                .described("France - onshore and offshore."),
                        ),
                    base,
                    Conversion::lambert_conic_conformal_2sp(
                        IdentifiedObject::named("Lambert-93").with_epsg(18085),
                        Angle::new(46.5),
                        Angle::new(3.0),
                        Angle::new(49.0),
                        Angle::new(44.0),
                        Length::new(700000.0),
                        Length::new(6600000.0),
                    ),
                    CoordinateSystem::cartesian_easting_northing_metre(),
                )?)))
            }
            _ => Err(self.miss(code)),
        }
    }

    fn materialize(&self, record: &TransformRecord) -> Result<Transformation> {
        let source_crs = self
            .crs_code_for_datum(record.source_datum)
            .ok_or_else(|| self.miss(&record.source_datum.to_string()))
            .and_then(|c| self.create_crs(&c.to_string()))?;
        let target_crs = self
            .crs_code_for_datum(record.target_datum)
            .ok_or_else(|| self.miss(&record.target_datum.to_string()))
            .and_then(|c| self.create_crs(&c.to_string()))?;
        let ident = IdentifiedObject::named(record.name)
            .with_epsg(record.code)
            .with_extent(
                Extent::from_bbox(
                    record.bbox.0,
                    record.bbox.1,
                    record.bbox.2,
                    record.bbox.3,
                )
                .described(record.area_name),
            );
        let accuracies = record
            .accuracy
            .map(|a| vec![PositionalAccuracy::metres(a)])
            .unwrap_or_default();
        Ok(match record.kind {
            TransformKind::GeocentricTranslations([x, y, z]) => {
                Transformation::geocentric_translations(
                    ident, source_crs, target_crs, x, y, z, accuracies,
                )
            }
            TransformKind::PositionVector(p) => Transformation::position_vector(
                ident, source_crs, target_crs, p[0], p[1], p[2], p[3], p[4], p[5], p[6],
                accuracies,
            ),
            TransformKind::CoordinateFrame(p) => Transformation::coordinate_frame(
                ident, source_crs, target_crs, p[0], p[1], p[2], p[3], p[4], p[5], p[6],
                accuracies,
            ),
            TransformKind::LongitudeRotationGrads(grads) => Transformation::longitude_rotation(
                ident,
                source_crs,
                target_crs,
                Angle::with_unit(grads, UnitOfMeasure::GRAD)?,
            ),
            TransformKind::Ntv2(file) => {
                Transformation::ntv2(ident, source_crs, target_crs, file, accuracies)
            }
        })
    }

    pub fn create_coordinate_operation(&self, code: &str) -> Result<Transformation> {
        let numeric = self.epsg_code(code)?;
        let record = TRANSFORMATIONS
            .iter()
            .find(|r| r.code == numeric)
            .ok_or_else(|| self.miss(code))?;
        self.materialize(record)
    }

    /// Enumerate catalogued transformations whose datum endpoints match,
    /// in the forward direction only. The factory probes both
    /// directions.
    pub fn create_operations_between_datums(
        &self,
        source_datum_code: u32,
        target_datum_code: u32,
        area: Option<&GeographicBoundingBox>,
        allow_unknown_accuracy: bool,
    ) -> Result<Vec<Transformation>> {
        let mut out = Vec::new();
        for record in TRANSFORMATIONS {
            if record.deprecated
                || record.source_datum != source_datum_code
                || record.target_datum != target_datum_code
            {
                continue;
            }
            if record.accuracy.is_none() && !allow_unknown_accuracy {
                continue;
            }
            if let Some(area) = area {
                let record_box = GeographicBoundingBox::new(
                    record.bbox.0,
                    record.bbox.1,
                    record.bbox.2,
                    record.bbox.3,
                );
                if !record_box.intersects(area) {
                    continue;
                }
            }
            out.push(self.materialize(record)?);
        }
        debug!(
            source = source_datum_code,
            target = target_datum_code,
            found = out.len(),
            "datum-pair transformation lookup"
        );
        Ok(out)
    }

    /// Helmert parameters usable to pin this datum to WGS 84, when the
    /// registry knows a compatible transformation.
    pub fn helmert_to_wgs84(&self, datum_code: u32) -> Option<Vec<f64>> {
        TOWGS84_BY_DATUM
            .iter()
            .find(|(d, _)| *d == datum_code)
            .map(|(_, p)| p.to_vec())
    }

    /// Metadata for a grid file referenced by an operation. Unknown
    /// grids come back marked unavailable.
    pub fn grid_descriptor(&self, short_name: &str) -> GridDescriptor {
        match short_name {
            "ntf_r93.gsb" => GridDescriptor {
                short_name: short_name.to_string(),
                full_name: "ntf_r93.gsb".to_string(),
                package_name: "proj-datumgrid".to_string(),
                url: "https://download.osgeo.org/proj/proj-datumgrid-1.8.zip".to_string(),
                direct_download: true,
                open_license: true,
                available: true,
            },
            "ntv2_0.gsb" => GridDescriptor {
                short_name: short_name.to_string(),
                full_name: "ntv2_0.gsb".to_string(),
                package_name: "proj-datumgrid-north-america".to_string(),
                url: "https://download.osgeo.org/proj/proj-datumgrid-north-america-1.1.zip"
                    .to_string(),
                direct_download: true,
                open_license: true,
                available: false,
            },
            other => GridDescriptor {
                short_name: other.to_string(),
                full_name: other.to_string(),
                package_name: String::new(),
                url: String::new(),
                direct_download: false,
                open_license: false,
                available: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Criterion;

    #[test]
    fn test_lookup_miss_is_dedicated_error() {
        let catalog = Catalog::new();
        let err = catalog.create_crs("99999").unwrap_err();
        assert!(matches!(
            err,
            GeorefError::NoSuchAuthorityCode { .. }
        ));
        let err = catalog.create_crs("not-a-code").unwrap_err();
        assert!(matches!(err, GeorefError::NoSuchAuthorityCode { .. }));
    }

    #[test]
    fn test_create_4326_matches_wellknown() {
        let catalog = Catalog::new();
        let crs = catalog.create_crs("4326").unwrap();
        assert!(crs.is_equivalent_to(
            &Crs::Geographic(GeographicCrs::epsg_4326()),
            Criterion::Equivalent
        ));
        assert!(crs.ident().domain_of_validity().is_some());
    }

    #[test]
    fn test_create_4807_units_and_meridian() {
        let catalog = Catalog::new();
        let crs = catalog.create_crs("4807").unwrap();
        let geog = crs.extract_geographic_crs().unwrap();
        assert_eq!(geog.cs().axes()[0].unit(), &UnitOfMeasure::GRAD);
        assert_eq!(geog.prime_meridian().proj_pm_id(), Some("paris"));
    }

    #[test]
    fn test_operations_between_datums_filters_by_area() {
        let catalog = Catalog::new();
        let all = catalog
            .create_operations_between_datums(6179, 6258, None, true)
            .unwrap();
        assert_eq!(all.len(), 2);

        let romania_box = GeographicBoundingBox::new(20.26, 43.44, 31.41, 48.27);
        let romania_only = catalog
            .create_operations_between_datums(6179, 6258, Some(&romania_box), true)
            .unwrap();
        assert_eq!(romania_only.len(), 1);
        assert_eq!(romania_only[0].ident().epsg_code(), Some(15994));

        // reverse direction finds nothing: records are directional
        let reverse = catalog
            .create_operations_between_datums(6258, 6179, None, true)
            .unwrap();
        assert!(reverse.is_empty());
    }

    #[test]
    fn test_get_codes_and_authorities() {
        let catalog = Catalog::new();
        let codes = catalog.get_codes(ObjectType::Crs, false);
        assert!(codes.contains("4326"));
        assert!(codes.contains("32631"));
        assert!(Catalog::get_authorities().contains("IGNF"));
        let ogc = Catalog::for_authority("OGC");
        assert!(ogc.get_codes(ObjectType::Crs, false).contains("CRS84"));
    }

    #[test]
    fn test_ogc_crs84_is_lon_lat() {
        let ogc = Catalog::for_authority("OGC");
        let crs = ogc.create_crs("CRS84").unwrap();
        let geog = crs.extract_geographic_crs().unwrap();
        assert_eq!(geog.cs().axes()[0].direction(), AxisDirection::East);
        // same datum as EPSG:4326, axes swapped
        assert!(crs.is_equivalent_to(
            &Crs::Geographic(GeographicCrs::epsg_4326()),
            Criterion::EquivalentIgnoringAxisOrder
        ));
    }

    #[test]
    fn test_case_sensitive_codes() {
        let ogc = Catalog::for_authority("OGC");
        assert!(ogc.create_crs("crs84").is_err());
    }

    #[test]
    fn test_grid_descriptors() {
        let catalog = Catalog::new();
        let known = catalog.grid_descriptor("ntf_r93.gsb");
        assert!(known.available);
        assert_eq!(known.package_name, "proj-datumgrid");
        let missing = catalog.grid_descriptor("ntv2_0.gsb");
        assert!(!missing.available);
        let unknown = catalog.grid_descriptor("nowhere.gsb");
        assert!(!unknown.available);
    }

    #[test]
    fn test_lambert93_conversion_parameters() {
        let catalog = Catalog::new();
        let crs = catalog.create_crs("2154").unwrap();
        let Crs::Projected(projected) = crs.as_ref() else {
            panic!("expected projected");
        };
        let conv = projected.deriving_conversion();
        assert_eq!(
            conv.parameter_numeric(
                crate::operation::methods::PARAM_LATITUDE_1ST_STD_PARALLEL,
                &UnitOfMeasure::DEGREE
            ),
            Some(49.0)
        );
    }
}
