//! `+proj=` formatter: the legacy single-line CRS description and the
//! executable pipeline form of a coordinate operation.
//!
//! Operations are emitted against a normalized interface: geographic
//! coordinates in Greenwich-relative radians, longitude first;
//! projected coordinates in metres, easting first. Axis, unit and
//! prime-meridian adapters bridge each endpoint CRS to that interface,
//! and identity adapters vanish in the pipeline builder.

use super::{format_double, PipelineBuilder, ProjStringConvention, Step};
use crate::crs::{Crs, GeographicCrs};
use crate::cs::CoordinateSystem;
use crate::datum::{Ellipsoid, PrimeMeridian};
use crate::error::{GeorefError, Result};
use crate::measure::UnitOfMeasure;
use crate::operation::methods::*;
use crate::operation::{
    Conversion, CoordinateOperation, Transformation,
};

/// Legacy description of a CRS as a single `+proj=` string.
pub fn format_crs(crs: &Crs, _convention: ProjStringConvention) -> Result<String> {
    let mut step = crs_step(crs)?;
    if let Crs::Bound(bound) = crs {
        if let Some(h) = bound.transformation().helmert_params() {
            let values = [h.x, h.y, h.z, h.rx, h.ry, h.rz, h.s];
            let rendered = values
                .iter()
                .map(|v| format_double(*v))
                .collect::<Vec<_>>()
                .join(",");
            step = step.with("towgs84", rendered);
        }
    }
    let mut out = String::new();
    step.write_single(&mut out);
    Ok(out)
}

impl Step {
    // The legacy CRS description is always a single bare step.
    fn write_single(&self, out: &mut String) {
        out.push_str("+proj=");
        out.push_str(&self.name);
        for (key, value) in &self.params {
            out.push(' ');
            out.push('+');
            out.push_str(key);
            if let Some(v) = value {
                out.push('=');
                out.push_str(v);
            }
        }
    }
}

fn crs_step(crs: &Crs) -> Result<Step> {
    match crs {
        Crs::Geographic(g) => {
            let mut step = Step::new("longlat");
            step = with_ellipsoid(step, g.ellipsoid());
            step = with_prime_meridian(step, g.prime_meridian());
            Ok(step)
        }
        Crs::Geodetic(g) => {
            let frame = g.datum().representative();
            let mut step = Step::new("geocent");
            step = with_ellipsoid(step, frame.ellipsoid());
            step = with_prime_meridian(step, frame.prime_meridian());
            Ok(step)
        }
        Crs::Projected(p) => {
            let mut step = conversion_step(p.deriving_conversion(), Some(p.base()))?;
            let unit = p.cs().axes()[0].unit();
            if let Some(id) = unit.proj_id() {
                if id != "m" {
                    step = step.with("units", id);
                }
            } else {
                step = step.with("to_meter", format_double(unit.to_si()));
            }
            Ok(step)
        }
        Crs::Bound(b) => crs_step(b.base()),
        Crs::Compound(c) => crs_step(&c.components()[0]),
        other => Err(GeorefError::formatting(format!(
            "{:?} has no proj string representation",
            other.name()
        ))),
    }
}

fn with_ellipsoid(step: Step, ellipsoid: &Ellipsoid) -> Step {
    if let Some(id) = ellipsoid.proj_ellps_id() {
        return step.with("ellps", id);
    }
    let a = ellipsoid.semi_major_axis().si_value();
    if ellipsoid.is_sphere() {
        step.with_double("a", a).with_double("b", a)
    } else {
        step.with_double("a", a)
            .with_double("rf", ellipsoid.inverse_flattening().si_value())
    }
}

fn with_prime_meridian(step: Step, pm: &PrimeMeridian) -> Step {
    if pm.is_greenwich() {
        return step;
    }
    match pm.proj_pm_id() {
        Some(id) => step.with("pm", id),
        None => step.with_double("pm", pm.longitude().degrees()),
    }
}

/// The unit token understood by `+proj=unitconvert`.
fn unit_token(unit: &UnitOfMeasure) -> String {
    unit.proj_id()
        .map(str::to_string)
        .unwrap_or_else(|| format_double(unit.to_si()))
}

/// Adapters taking coordinates from the CRS as declared to the
/// normalized interface.
fn source_adapters(crs: &Crs) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    match crs {
        Crs::Geographic(g) => {
            if g.cs().axis_order().latitude_first() {
                steps.push(Step::new("axisswap").with("order", "2,1"));
            }
            let unit = g.cs().axes()[0].unit();
            steps.push(
                Step::new("unitconvert")
                    .with("xy_in", unit_token(unit))
                    .with("xy_out", "rad"),
            );
            if !g.prime_meridian().is_greenwich() {
                let mut longlat = Step::new("longlat");
                longlat = with_ellipsoid(longlat, g.ellipsoid());
                longlat = with_prime_meridian(longlat, g.prime_meridian());
                steps.push(longlat.inv());
            }
        }
        Crs::Projected(p) => {
            let axes = p.cs().axes();
            if axes.len() >= 2
                && axes[0].direction().is_north_bearing()
                && axes[1].direction().is_east_bearing()
            {
                steps.push(Step::new("axisswap").with("order", "2,1"));
            }
            let unit = axes[0].unit();
            steps.push(
                Step::new("unitconvert")
                    .with("xy_in", unit_token(unit))
                    .with("xy_out", "m"),
            );
        }
        Crs::Geodetic(_) => {}
        Crs::Bound(b) => return source_adapters(b.base()),
        Crs::Compound(c) => return source_adapters(&c.components()[0]),
        _ => {}
    }
    Ok(steps)
}

fn target_adapters(crs: &Crs) -> Result<Vec<Step>> {
    let mut steps = source_adapters(crs)?;
    steps.reverse();
    Ok(steps.into_iter().map(Step::inv).collect())
}

/// Core step of a conversion: the projection body, with the base CRS's
/// figure and prime meridian attached when known.
fn conversion_step(conversion: &Conversion, base: Option<&GeographicCrs>) -> Result<Step> {
    let code = conversion.method().epsg_code().ok_or_else(|| {
        GeorefError::formatting(format!(
            "conversion method {:?} has no proj name",
            conversion.method().name()
        ))
    })?;
    let degree = |p: u16| conversion.parameter_numeric(p, &UnitOfMeasure::DEGREE);
    let metre = |p: u16| conversion.parameter_numeric(p, &UnitOfMeasure::METRE);
    let unity = |p: u16| conversion.parameter_numeric(p, &UnitOfMeasure::UNITY);

    let mut step = match code {
        METHOD_TRANSVERSE_MERCATOR => {
            if let Some((zone, north)) = conversion.utm_zone() {
                let mut s = Step::new("utm").with_double("zone", zone as f64);
                if !north {
                    s = s.with_flag("south");
                }
                s
            } else {
                Step::new("tmerc")
                    .with_double("lat_0", degree(PARAM_LATITUDE_OF_NATURAL_ORIGIN).unwrap_or(0.0))
                    .with_double("lon_0", degree(PARAM_LONGITUDE_OF_NATURAL_ORIGIN).unwrap_or(0.0))
                    .with_double(
                        "k_0",
                        unity(PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN).unwrap_or(1.0),
                    )
                    .with_double("x_0", metre(PARAM_FALSE_EASTING).unwrap_or(0.0))
                    .with_double("y_0", metre(PARAM_FALSE_NORTHING).unwrap_or(0.0))
            }
        }
        METHOD_MERCATOR_VARIANT_A => {
            let lat0 = degree(PARAM_LATITUDE_OF_NATURAL_ORIGIN).unwrap_or(0.0);
            if lat0 != 0.0 {
                return Err(GeorefError::formatting(
                    "Mercator (variant A) requires a zero latitude of natural origin",
                ));
            }
            Step::new("merc")
                .with_double("lon_0", degree(PARAM_LONGITUDE_OF_NATURAL_ORIGIN).unwrap_or(0.0))
                .with_double("k", unity(PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN).unwrap_or(1.0))
                .with_double("x_0", metre(PARAM_FALSE_EASTING).unwrap_or(0.0))
                .with_double("y_0", metre(PARAM_FALSE_NORTHING).unwrap_or(0.0))
        }
        METHOD_MERCATOR_VARIANT_B => Step::new("merc")
            .with_double("lat_ts", degree(PARAM_LATITUDE_1ST_STD_PARALLEL).unwrap_or(0.0))
            .with_double("lon_0", degree(PARAM_LONGITUDE_OF_NATURAL_ORIGIN).unwrap_or(0.0))
            .with_double("x_0", metre(PARAM_FALSE_EASTING).unwrap_or(0.0))
            .with_double("y_0", metre(PARAM_FALSE_NORTHING).unwrap_or(0.0)),
        METHOD_LAMBERT_CONIC_CONFORMAL_1SP => {
            let lat0 = degree(PARAM_LATITUDE_OF_NATURAL_ORIGIN).unwrap_or(0.0);
            Step::new("lcc")
                .with_double("lat_1", lat0)
                .with_double("lat_0", lat0)
                .with_double("lon_0", degree(PARAM_LONGITUDE_OF_NATURAL_ORIGIN).unwrap_or(0.0))
                .with_double(
                    "k_0",
                    unity(PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN).unwrap_or(1.0),
                )
                .with_double("x_0", metre(PARAM_FALSE_EASTING).unwrap_or(0.0))
                .with_double("y_0", metre(PARAM_FALSE_NORTHING).unwrap_or(0.0))
        }
        METHOD_LAMBERT_CONIC_CONFORMAL_2SP => Step::new("lcc")
            .with_double("lat_0", degree(PARAM_LATITUDE_FALSE_ORIGIN).unwrap_or(0.0))
            .with_double("lon_0", degree(PARAM_LONGITUDE_FALSE_ORIGIN).unwrap_or(0.0))
            .with_double("lat_1", degree(PARAM_LATITUDE_1ST_STD_PARALLEL).unwrap_or(0.0))
            .with_double("lat_2", degree(PARAM_LATITUDE_2ND_STD_PARALLEL).unwrap_or(0.0))
            .with_double("x_0", metre(PARAM_EASTING_FALSE_ORIGIN).unwrap_or(0.0))
            .with_double("y_0", metre(PARAM_NORTHING_FALSE_ORIGIN).unwrap_or(0.0)),
        METHOD_GEOGRAPHIC_GEOCENTRIC => Step::new("cart"),
        other => {
            let name = proj_name(other).ok_or_else(|| {
                GeorefError::formatting(format!(
                    "conversion method {:?} has no proj name",
                    conversion.method().name()
                ))
            })?;
            // Generic parameter mapping for the remaining projections
            let mut s = Step::new(name);
            const MAP: &[(u16, &str, bool)] = &[
                (PARAM_LATITUDE_OF_NATURAL_ORIGIN, "lat_0", true),
                (PARAM_LATITUDE_FALSE_ORIGIN, "lat_0", true),
                (PARAM_LONGITUDE_OF_NATURAL_ORIGIN, "lon_0", true),
                (PARAM_LONGITUDE_FALSE_ORIGIN, "lon_0", true),
                (PARAM_LATITUDE_1ST_STD_PARALLEL, "lat_1", true),
                (PARAM_LATITUDE_2ND_STD_PARALLEL, "lat_2", true),
                (PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN, "k_0", false),
                (PARAM_FALSE_EASTING, "x_0", false),
                (PARAM_EASTING_FALSE_ORIGIN, "x_0", false),
                (PARAM_FALSE_NORTHING, "y_0", false),
                (PARAM_NORTHING_FALSE_ORIGIN, "y_0", false),
            ];
            for (param, key, angular) in MAP {
                let value = if *angular {
                    degree(*param)
                } else {
                    metre(*param).or_else(|| unity(*param))
                };
                if let Some(v) = value {
                    s = s.with_double(*key, v);
                }
            }
            s
        }
    };

    if let Some(base) = base {
        step = with_ellipsoid(step, base.ellipsoid());
        step = with_prime_meridian(step, base.prime_meridian());
    }
    if conversion.is_inverted() {
        step = step.inv();
    }
    Ok(step)
}

/// Core steps of a transformation, datum to datum, on the normalized
/// interface.
fn transformation_steps(t: &Transformation) -> Result<Vec<Step>> {
    if t.is_approximate_inverse() {
        return Err(GeorefError::formatting(format!(
            "transformation {:?} has no closed-form pipeline",
            t.name()
        )));
    }
    let code = t.method().epsg_code().ok_or_else(|| {
        GeorefError::formatting(format!(
            "transformation method {:?} has no proj representation",
            t.method().name()
        ))
    })?;
    let arcsec = |p: u16| t.parameter_numeric(p, &UnitOfMeasure::ARC_SECOND);
    let metre = |p: u16| t.parameter_numeric(p, &UnitOfMeasure::METRE);

    match code {
        METHOD_GEOCENTRIC_TRANSLATIONS | METHOD_POSITION_VECTOR | METHOD_COORDINATE_FRAME => {
            let h = t.helmert_params().ok_or_else(|| {
                GeorefError::formatting(format!(
                    "transformation {:?} is missing Helmert parameters",
                    t.name()
                ))
            })?;
            let mut helmert = Step::new("helmert")
                .with_double("x", h.x)
                .with_double("y", h.y)
                .with_double("z", h.z);
            if let Some(convention) = h.convention {
                helmert = helmert
                    .with_double("rx", h.rx)
                    .with_double("ry", h.ry)
                    .with_double("rz", h.rz)
                    .with_double("s", h.s)
                    .with("convention", convention.proj_keyword());
            }
            let mut steps = Vec::new();
            let src_ellps = t.source_crs().extract_geographic_crs().map(|g| g.ellipsoid().clone());
            let dst_ellps = t.target_crs().extract_geographic_crs().map(|g| g.ellipsoid().clone());
            if let Some(e) = &src_ellps {
                steps.push(with_ellipsoid(Step::new("cart"), e));
            }
            steps.push(helmert);
            if let Some(e) = &dst_ellps {
                steps.push(with_ellipsoid(Step::new("cart"), e).inv());
            }
            Ok(steps)
        }
        METHOD_NTV2 => {
            let file = t.grid_file().ok_or_else(|| {
                GeorefError::formatting(format!("NTv2 transformation {:?} has no grid", t.name()))
            })?;
            Ok(vec![Step::new("hgridshift").with("grids", file)])
        }
        METHOD_VERTCON => {
            let file = t.grid_file().ok_or_else(|| {
                GeorefError::formatting(format!(
                    "VERTCON transformation {:?} has no grid",
                    t.name()
                ))
            })?;
            Ok(vec![Step::new("vgridshift").with("grids", file)])
        }
        METHOD_MOLODENSKY | METHOD_ABRIDGED_MOLODENSKY => {
            let src = t.source_crs().extract_geographic_crs().ok_or_else(|| {
                GeorefError::formatting("Molodensky requires a geographic source CRS")
            })?;
            let da = metre(PARAM_SEMI_MAJOR_DIFFERENCE).unwrap_or(0.0);
            let df = t
                .parameter_numeric(PARAM_FLATTENING_DIFFERENCE, &UnitOfMeasure::UNITY)
                .unwrap_or(0.0);
            let mut step = with_ellipsoid(Step::new("molodensky"), src.ellipsoid())
                .with_double("dx", metre(PARAM_X_TRANSLATION).unwrap_or(0.0))
                .with_double("dy", metre(PARAM_Y_TRANSLATION).unwrap_or(0.0))
                .with_double("dz", metre(PARAM_Z_TRANSLATION).unwrap_or(0.0))
                .with_double("da", da)
                .with_double("df", df);
            if code == METHOD_ABRIDGED_MOLODENSKY {
                step = step.with_flag("abridged");
            }
            Ok(vec![step])
        }
        METHOD_GEOGRAPHIC2D_OFFSETS => Ok(vec![Step::new("geogoffset")
            .with_double("dlat", arcsec(PARAM_LATITUDE_OFFSET).unwrap_or(0.0))
            .with_double("dlon", arcsec(PARAM_LONGITUDE_OFFSET).unwrap_or(0.0))]),
        METHOD_VERTICAL_OFFSET => Ok(vec![Step::new("geogoffset")
            .with_double("dh", metre(PARAM_VERTICAL_OFFSET).unwrap_or(0.0))]),
        // Longitude rotation is realized entirely by the prime-meridian
        // adapters of the surrounding pipeline.
        METHOD_LONGITUDE_ROTATION => Ok(Vec::new()),
        other => Err(GeorefError::formatting(format!(
            "transformation method {:?} (EPSG:{other}) has no proj representation",
            t.method().name()
        ))),
    }
}

/// Core steps of any operation, endpoints normalized.
fn core_steps(op: &CoordinateOperation) -> Result<Vec<Step>> {
    match op {
        CoordinateOperation::Conversion(c) => {
            let base = c
                .source_crs()
                .and_then(|crs| crs.extract_geographic_crs())
                .or_else(|| c.target_crs().and_then(|crs| crs.extract_geographic_crs()));
            Ok(vec![conversion_step(c, base)?])
        }
        CoordinateOperation::Transformation(t) => transformation_steps(t),
        CoordinateOperation::Concatenated(concat) => {
            let mut steps = Vec::new();
            for step in concat.steps() {
                steps.extend(core_steps(step)?);
            }
            Ok(steps)
        }
        CoordinateOperation::ProjBased(p) => {
            let split = super::parser::split_pipeline(p.pipeline())?;
            Ok(split.steps)
        }
    }
}

/// Format an operation as an executable pipeline.
pub fn format_operation(
    op: &CoordinateOperation,
    convention: ProjStringConvention,
) -> Result<String> {
    // A stored pipeline is reproduced verbatim in the PROJ 5 dialect.
    if let CoordinateOperation::ProjBased(p) = op {
        if convention == ProjStringConvention::Proj5 {
            return Ok(p.pipeline().to_string());
        }
    }
    let mut builder = PipelineBuilder::new();
    if let Some(source) = op.source_crs() {
        builder.extend(source_adapters(source)?);
    }
    builder.extend(core_steps(op)?);
    if let Some(target) = op.target_crs() {
        builder.extend(target_adapters(target)?);
    }
    builder.finish(convention)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::{BoundCrs, ProjectedCrs};
    use crate::ident::IdentifiedObject;
    use crate::measure::{Angle, Scale};
    use std::sync::Arc;

    fn wgs84() -> Arc<Crs> {
        Arc::new(Crs::Geographic(GeographicCrs::epsg_4326()))
    }

    fn ntf_paris() -> Arc<Crs> {
        Arc::new(Crs::Geographic(GeographicCrs::epsg_4807()))
    }

    #[test]
    fn test_crs_export_longlat() {
        let out = format_crs(&wgs84(), ProjStringConvention::Proj4).unwrap();
        assert_eq!(out, "+proj=longlat +ellps=WGS84");
        let ntf = format_crs(&ntf_paris(), ProjStringConvention::Proj4).unwrap();
        assert_eq!(ntf, "+proj=longlat +ellps=clrk80ign +pm=paris");
    }

    #[test]
    fn test_crs_export_utm() {
        let utm31 = Crs::Projected(
            ProjectedCrs::new(
                IdentifiedObject::named("WGS 84 / UTM zone 31N").with_epsg(32631),
                Arc::new(GeographicCrs::epsg_4326()),
                Conversion::utm(31, true),
                CoordinateSystem::cartesian_easting_northing_metre(),
            )
            .unwrap(),
        );
        let out = format_crs(&utm31, ProjStringConvention::Proj4).unwrap();
        assert_eq!(out, "+proj=utm +zone=31 +ellps=WGS84");
    }

    #[test]
    fn test_standalone_utm_conversion() {
        let conv = Conversion::utm(1, false);
        let out = CoordinateOperation::Conversion(conv)
            .to_proj_string(ProjStringConvention::Proj5)
            .unwrap();
        assert_eq!(out, "+proj=utm +zone=1 +south");
    }

    #[test]
    fn test_mercator_variant_a_nonzero_latitude_rejected() {
        let conv = Conversion::mercator_variant_a(
            IdentifiedObject::named("bad"),
            Angle::new(10.0),
            Angle::new(1.0),
            Scale::new(2.0),
            crate::measure::Length::new(3.0),
            crate::measure::Length::new(4.0),
        );
        let err = CoordinateOperation::Conversion(conv)
            .to_proj_string(ProjStringConvention::Proj5);
        assert!(err.is_err());
    }

    #[test]
    fn test_ballpark_ntf_paris_to_wgs84_pipeline() {
        // No datum-shift information: the pipeline is pure axis, unit
        // and prime-meridian adaptation.
        let t = Transformation::longitude_rotation(
            IdentifiedObject::named("NTF (Paris) to WGS 84"),
            ntf_paris(),
            wgs84(),
            Angle::with_unit(2.5969213, UnitOfMeasure::GRAD).unwrap(),
        );
        let out = CoordinateOperation::Transformation(t)
            .to_proj_string(ProjStringConvention::Proj5)
            .unwrap();
        assert_eq!(
            out,
            "+proj=pipeline +step +proj=axisswap +order=2,1 +step \
             +proj=unitconvert +xy_in=grad +xy_out=rad +step +inv +proj=longlat \
             +ellps=clrk80ign +pm=paris +step +proj=unitconvert +xy_in=rad \
             +xy_out=deg +step +proj=axisswap +order=2,1"
        );
    }

    #[test]
    fn test_helmert_pipeline_with_cart_wrapping() {
        let t = Transformation::position_vector(
            IdentifiedObject::named("sample"),
            wgs84(),
            Arc::new(Crs::Geographic(GeographicCrs::epsg_4269())),
            1.0,
            2.0,
            3.0,
            4.0,
            5.0,
            6.0,
            7.0,
            Vec::new(),
        );
        let out = CoordinateOperation::Transformation(t)
            .to_proj_string(ProjStringConvention::Proj5)
            .unwrap();
        assert_eq!(
            out,
            "+proj=pipeline +step +proj=axisswap +order=2,1 +step \
             +proj=unitconvert +xy_in=deg +xy_out=rad +step +proj=cart \
             +ellps=WGS84 +step +proj=helmert +x=1 +y=2 +z=3 +rx=4 +ry=5 +rz=6 \
             +s=7 +convention=position_vector +step +inv +proj=cart +ellps=GRS80 \
             +step +proj=unitconvert +xy_in=rad +xy_out=deg +step +proj=axisswap \
             +order=2,1"
        );
    }

    #[test]
    fn test_towgs84_bound_crs_emits_position_vector() {
        let bound = BoundCrs::from_towgs84(ntf_paris(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])
            .unwrap();
        let op =
            CoordinateOperation::Transformation((**bound.transformation()).clone());
        let out = op.to_proj_string(ProjStringConvention::Proj5).unwrap();
        assert!(out.contains(
            "+proj=helmert +x=1 +y=2 +z=3 +rx=4 +ry=5 +rz=6 +s=7 \
             +convention=position_vector"
        ));
        assert!(out.contains("+step +inv +proj=longlat +ellps=clrk80ign +pm=paris"));
    }

    #[test]
    fn test_inverse_helmert_negated_parameters() {
        let t = Transformation::position_vector(
            IdentifiedObject::named("fwd"),
            wgs84(),
            Arc::new(Crs::Geographic(GeographicCrs::epsg_4269())),
            1.0,
            2.0,
            3.0,
            4.0,
            5.0,
            6.0,
            7.0,
            Vec::new(),
        );
        let inv = t.inverse().unwrap();
        let out = CoordinateOperation::Transformation(inv)
            .to_proj_string(ProjStringConvention::Proj5)
            .unwrap();
        assert!(out.contains(
            "+proj=helmert +x=-1 +y=-2 +z=-3 +rx=-4 +ry=-5 +rz=-6 +s=-7 \
             +convention=position_vector"
        ));
    }

    #[test]
    fn test_proj_round_trip_of_catalog_crs() {
        // CRSs whose datum is expressible on the proj surface survive a
        // round trip, up to axis-order normalization
        use crate::ident::Criterion;
        use crate::projstring::{parse_proj_string, ProjObject};
        let catalog = crate::catalog::Catalog::new();
        for code in ["4326", "4269", "4179", "32631", "2154", "4978"] {
            let Ok(crs) = catalog.create_crs(code) else {
                continue;
            };
            let text = format_crs(&crs, ProjStringConvention::Proj5).unwrap();
            let ProjObject::Crs(reparsed) = parse_proj_string(&text).unwrap() else {
                panic!("{code} did not reparse as a CRS: {text}");
            };
            assert!(
                reparsed.is_equivalent_to(&crs, Criterion::EquivalentIgnoringAxisOrder),
                "round trip of {code} not equivalent: {text}"
            );
        }
    }

    #[test]
    fn test_successive_opposite_helmerts_collapse() {
        // A concatenation of two Helmert shifts with opposite parameters
        // formats as the identity pipeline
        let wgs84 = wgs84();
        let nad83 = Arc::new(Crs::Geographic(GeographicCrs::epsg_4269()));
        let fwd = Transformation::position_vector(
            IdentifiedObject::named("fwd"),
            wgs84.clone(),
            nad83.clone(),
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
            nad83,
            wgs84,
            -1.0,
            -2.0,
            -3.0,
            -4.0,
            -5.0,
            -6.0,
            -7.0,
            Vec::new(),
        );
        let concat = crate::operation::ConcatenatedOperation::from_steps(vec![
            CoordinateOperation::Transformation(fwd),
            CoordinateOperation::Transformation(bwd),
        ])
        .unwrap();
        let out = CoordinateOperation::Concatenated(concat)
            .to_proj_string(ProjStringConvention::Proj5)
            .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_proj4_rejects_multi_step() {
        let t = Transformation::position_vector(
            IdentifiedObject::named("sample"),
            wgs84(),
            Arc::new(Crs::Geographic(GeographicCrs::epsg_4269())),
            1.0,
            2.0,
            3.0,
            4.0,
            5.0,
            6.0,
            7.0,
            Vec::new(),
        );
        assert!(CoordinateOperation::Transformation(t)
            .to_proj_string(ProjStringConvention::Proj4)
            .is_err());
    }
}
