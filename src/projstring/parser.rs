//! `+proj=` string parser: `+key[=value]` tokens, `+step`-partitioned
//! pipelines, and the reconstruction of a canonical CRS from a single
//! projection description.

use std::sync::Arc;

use super::{PipelineBuilder, ProjStringConvention, Step};
use crate::crs::{BoundCrs, Crs, GeodeticCrs, GeographicCrs, ProjectedCrs};
use crate::cs::{Axis, AxisDirection, CoordinateSystem, CsKind};
use crate::datum::{Ellipsoid, GeodeticDatumOrEnsemble, GeodeticFrame, PrimeMeridian};
use crate::error::{GeorefError, Result};
use crate::ident::IdentifiedObject;
use crate::measure::{Angle, Length, Scale, UnitOfMeasure};
use crate::operation::{
    ConcatenatedOperation, Conversion, CoordinateOperation, ProjBasedOperation,
};

/// The outcome of parsing: either a CRS description or an executable
/// coordinate operation.
#[derive(Clone, Debug)]
pub enum ProjObject {
    Crs(Crs),
    Operation(CoordinateOperation),
}

/// One `+key[=value]` token with its source offset.
#[derive(Clone, Debug)]
struct Token {
    key: String,
    value: Option<String>,
    offset: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    for raw in input.split_whitespace() {
        let token_offset = input[offset..]
            .find(raw)
            .map(|p| p + offset)
            .unwrap_or(offset);
        offset = token_offset + raw.len();
        let body = raw.strip_prefix('+').ok_or_else(|| {
            GeorefError::parse(format!("expected '+key[=value]', got {raw:?}"), token_offset)
        })?;
        if body.is_empty() {
            return Err(GeorefError::parse("empty '+' token", token_offset));
        }
        let (key, value) = match body.split_once('=') {
            Some((k, v)) => (k.to_string(), Some(v.to_string())),
            None => (body.to_string(), None),
        };
        tokens.push(Token {
            key,
            value,
            offset: token_offset,
        });
    }
    Ok(tokens)
}

pub(crate) struct SplitPipeline {
    pub globals: Vec<(String, Option<String>)>,
    pub steps: Vec<Step>,
    pub was_pipeline: bool,
}

/// Split a `+proj=pipeline` string into its global parameters and
/// steps. Also accepts a bare single-step string.
pub(crate) fn split_pipeline(input: &str) -> Result<SplitPipeline> {
    let tokens = tokenize(input)?;
    let is_pipeline = tokens
        .first()
        .map(|t| t.key == "proj" && t.value.as_deref() == Some("pipeline"))
        .unwrap_or(false);
    if !is_pipeline {
        // single step form
        let mut steps = vec![Step::new("")];
        absorb_step_tokens(&tokens, &mut steps)?;
        return Ok(SplitPipeline {
            globals: Vec::new(),
            steps,
            was_pipeline: false,
        });
    }

    let mut globals = Vec::new();
    let mut steps: Vec<Step> = Vec::new();
    let mut pending_inv = false;
    let mut in_steps = false;
    for token in &tokens[1..] {
        match token.key.as_str() {
            "step" => {
                let mut step = Step::new("");
                step.inverted = pending_inv;
                pending_inv = false;
                steps.push(step);
                in_steps = true;
            }
            // `+inv` inside a step inverts it; before any `+step` it
            // applies to the step that must follow.
            "inv" if in_steps => {
                steps.last_mut().expect("in_steps implies a step").inverted = true;
            }
            "inv" => pending_inv = true,
            _ if !in_steps => globals.push((token.key.clone(), token.value.clone())),
            _ => {
                let current = steps.last_mut().expect("in_steps implies a step");
                if token.key == "proj" {
                    current.name = token.value.clone().ok_or_else(|| {
                        GeorefError::parse("'+proj' requires a value", token.offset)
                    })?;
                } else {
                    current.params.push((token.key.clone(), token.value.clone()));
                }
            }
        }
    }
    if pending_inv {
        return Err(GeorefError::parse(
            "dangling '+inv' not followed by '+step'",
            tokens.last().map(|t| t.offset).unwrap_or(0),
        ));
    }
    for step in &steps {
        if step.name.is_empty() {
            return Err(GeorefError::parse("'+step' without '+proj'", 0));
        }
    }
    Ok(SplitPipeline {
        globals,
        steps,
        was_pipeline: true,
    })
}

fn absorb_step_tokens(tokens: &[Token], steps: &mut [Step]) -> Result<()> {
    let step = steps.last_mut().expect("one step");
    for token in tokens {
        match token.key.as_str() {
            "proj" => {
                step.name = token
                    .value
                    .clone()
                    .ok_or_else(|| GeorefError::parse("'+proj' requires a value", token.offset))?;
            }
            "inv" => step.inverted = true,
            "step" => {
                return Err(GeorefError::parse(
                    "'+step' outside a '+proj=pipeline'",
                    token.offset,
                ))
            }
            _ => step.params.push((token.key.clone(), token.value.clone())),
        }
    }
    if step.name.is_empty() {
        return Err(GeorefError::parse("missing '+proj='", 0));
    }
    Ok(())
}

/// Parse a `+proj=` string into a CRS or an operation.
pub fn parse_proj_string(input: &str) -> Result<ProjObject> {
    let split = split_pipeline(input)?;
    if !split.was_pipeline {
        let step = &split.steps[0];
        return crs_from_step(step).map(ProjObject::Crs);
    }
    // Pipeline: an opaque PROJ-string-based operation, one per step
    let mut ops = Vec::new();
    for step in &split.steps {
        let mut builder = PipelineBuilder::new();
        for (k, v) in &split.globals {
            builder.push_global(k.clone(), v.clone());
        }
        builder.push(step.clone());
        let single = builder.finish(ProjStringConvention::Proj5)?;
        ops.push(CoordinateOperation::ProjBased(ProjBasedOperation::new(
            IdentifiedObject::named(format!("{} step", step.name)),
            single,
            None,
            None,
        )));
    }
    match ops.len() {
        0 => Err(GeorefError::parse("empty pipeline", 0)),
        1 => Ok(ProjObject::Operation(
            ops.into_iter().next().expect("one step"),
        )),
        _ => Ok(ProjObject::Operation(CoordinateOperation::Concatenated(
            ConcatenatedOperation::new(
                IdentifiedObject::named("pipeline"),
                ops,
                Vec::new(),
            )?,
        ))),
    }
}

fn parse_f64(step: &Step, key: &str) -> Result<Option<f64>> {
    match step.param(key) {
        None => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(Some)
            .map_err(|_| GeorefError::parse(format!("invalid number for +{key}: {text:?}"), 0)),
    }
}

/// Ellipsoids addressable through `+ellps=`/`+datum=`.
fn ellipsoid_from_id(id: &str) -> Option<Arc<Ellipsoid>> {
    match id {
        "WGS84" => Some(Ellipsoid::wgs84()),
        "GRS80" => Some(Ellipsoid::grs1980()),
        "clrk80ign" => Some(Ellipsoid::clarke_1880_ign()),
        "krass" => Some(Ellipsoid::krassowsky_1940()),
        "intl" => Some(Ellipsoid::international_1924()),
        "WGS72" => Some(
            Ellipsoid::from_inverse_flattening(
                IdentifiedObject::named("WGS 72").with_epsg(7043),
                Length::new(6378135.0),
                Scale::new(298.26),
            )
            .ok()
            .map(Arc::new)?,
        ),
        "clrk66" => Some(
            Ellipsoid::from_semi_minor(
                IdentifiedObject::named("Clarke 1866").with_epsg(7008),
                Length::new(6378206.4),
                Length::new(6356583.8),
            )
            .ok()
            .map(Arc::new)?,
        ),
        "bessel" => Some(
            Ellipsoid::from_inverse_flattening(
                IdentifiedObject::named("Bessel 1841").with_epsg(7004),
                Length::new(6377397.155),
                Scale::new(299.1528128),
            )
            .ok()
            .map(Arc::new)?,
        ),
        _ => None,
    }
}

fn ellipsoid_from_step(step: &Step) -> Result<Arc<Ellipsoid>> {
    if let Some(datum) = step.param("datum") {
        let id = match datum {
            "WGS84" => "WGS84",
            "NAD83" => "GRS80",
            "NAD27" => "clrk66",
            other => {
                return Err(GeorefError::parse(
                    format!("unknown +datum={other:?}"),
                    0,
                ))
            }
        };
        return Ok(ellipsoid_from_id(id).expect("datum table entries are known ellipsoids"));
    }
    if let Some(id) = step.param("ellps") {
        return ellipsoid_from_id(id)
            .ok_or_else(|| GeorefError::parse(format!("unknown +ellps={id:?}"), 0));
    }
    let a = parse_f64(step, "a")?;
    let b = parse_f64(step, "b")?;
    let rf = parse_f64(step, "rf")?;
    let r = parse_f64(step, "R")?;
    match (a, b, rf, r) {
        (Some(a), Some(b), _, _) => Ok(Arc::new(Ellipsoid::from_semi_minor(
            IdentifiedObject::named("unknown"),
            Length::new(a),
            Length::new(b),
        )?)),
        (Some(a), None, Some(rf), _) => Ok(Arc::new(Ellipsoid::from_inverse_flattening(
            IdentifiedObject::named("unknown"),
            Length::new(a),
            Scale::new(rf),
        )?)),
        (Some(a), None, None, _) => Ok(Arc::new(Ellipsoid::sphere(
            IdentifiedObject::named("unknown"),
            Length::new(a),
        )?)),
        (None, _, _, Some(r)) => Ok(Arc::new(Ellipsoid::sphere(
            IdentifiedObject::named("unknown"),
            Length::new(r),
        )?)),
        // WGS 84 is the assumed figure when nothing is said
        _ => Ok(Ellipsoid::wgs84()),
    }
}

fn prime_meridian_from_step(step: &Step) -> Result<Arc<PrimeMeridian>> {
    let Some(pm) = step.param("pm") else {
        return Ok(PrimeMeridian::greenwich());
    };
    match pm {
        "greenwich" => Ok(PrimeMeridian::greenwich()),
        "paris" => Ok(PrimeMeridian::paris()),
        other => match other.parse::<f64>() {
            Ok(deg) => Ok(Arc::new(PrimeMeridian::new(
                IdentifiedObject::named("unknown"),
                Angle::new(deg),
            ))),
            Err(_) => Err(GeorefError::parse(format!("unknown +pm={other:?}"), 0)),
        },
    }
}

fn geographic_base_from_step(step: &Step) -> Result<GeographicCrs> {
    let ellipsoid = ellipsoid_from_step(step)?;
    let pm = prime_meridian_from_step(step)?;
    let datum = GeodeticFrame::new(
        IdentifiedObject::named("unknown"),
        ellipsoid,
        pm,
        None,
    );
    // The proj surface speaks longitude-first degrees
    GeographicCrs::new(
        IdentifiedObject::named("unknown"),
        GeodeticDatumOrEnsemble::Datum(Arc::new(datum)),
        CoordinateSystem::ellipsoidal_lon_lat_degree(),
    )
}

fn linear_unit_from_step(step: &Step) -> Result<UnitOfMeasure> {
    if let Some(to_meter) = parse_f64(step, "to_meter")? {
        return Ok(UnitOfMeasure::new(
            "unknown",
            to_meter,
            crate::measure::UnitKind::Length,
        ));
    }
    Ok(match step.param("units") {
        None | Some("m") => UnitOfMeasure::METRE,
        Some("km") => UnitOfMeasure::KILOMETRE,
        Some("ft") => UnitOfMeasure::FOOT,
        Some("us-ft") => UnitOfMeasure::US_SURVEY_FOOT,
        Some(other) => {
            return Err(GeorefError::parse(format!("unknown +units={other:?}"), 0))
        }
    })
}

fn wrap_towgs84_if_any(crs: Crs, step: &Step) -> Result<Crs> {
    let Some(raw) = step.param("towgs84") else {
        return Ok(crs);
    };
    let params: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| GeorefError::parse(format!("invalid +towgs84={raw:?}"), 0))?;
    Ok(Crs::Bound(BoundCrs::from_towgs84(
        Arc::new(crs),
        &params,
    )?))
}

/// Build the canonical CRS for a single (non-pipeline) projection
/// description.
fn crs_from_step(step: &Step) -> Result<Crs> {
    match step.name.as_str() {
        "longlat" | "latlong" | "lonlat" | "latlon" => {
            let base = geographic_base_from_step(step)?;
            wrap_towgs84_if_any(Crs::Geographic(base), step)
        }
        "geocent" => {
            let ellipsoid = ellipsoid_from_step(step)?;
            let pm = prime_meridian_from_step(step)?;
            let datum = GeodeticFrame::new(
                IdentifiedObject::named("unknown"),
                ellipsoid,
                pm,
                None,
            );
            let crs = Crs::Geodetic(GeodeticCrs::new(
                IdentifiedObject::named("unknown"),
                GeodeticDatumOrEnsemble::Datum(Arc::new(datum)),
                CoordinateSystem::cartesian_geocentric_metre(),
            )?);
            wrap_towgs84_if_any(crs, step)
        }
        _ => {
            let conversion = conversion_from_step(step)?;
            let base = geographic_base_from_step(step)?;
            let unit = linear_unit_from_step(step)?;
            let cs = CoordinateSystem::new(
                CsKind::Cartesian,
                vec![
                    Axis::new("Easting", "E", AxisDirection::East, unit.clone()),
                    Axis::new("Northing", "N", AxisDirection::North, unit),
                ],
            )?;
            let crs = Crs::Projected(ProjectedCrs::new(
                IdentifiedObject::named("unknown"),
                Arc::new(base),
                conversion,
                cs,
            )?);
            wrap_towgs84_if_any(crs, step)
        }
    }
}

/// Reconstruct the deriving conversion for a projection step such that
/// a WKT2 round trip is stable up to EQUIVALENT comparison.
fn conversion_from_step(step: &Step) -> Result<Conversion> {
    let lat_0 = parse_f64(step, "lat_0")?.unwrap_or(0.0);
    let lon_0 = parse_f64(step, "lon_0")?.unwrap_or(0.0);
    let k_0 = parse_f64(step, "k_0")?
        .or(parse_f64(step, "k")?)
        .unwrap_or(1.0);
    let x_0 = parse_f64(step, "x_0")?.unwrap_or(0.0);
    let y_0 = parse_f64(step, "y_0")?.unwrap_or(0.0);
    let unnamed = || IdentifiedObject::named("unknown");

    match step.name.as_str() {
        "utm" => {
            let zone = parse_f64(step, "zone")?
                .ok_or_else(|| GeorefError::parse("+proj=utm requires +zone", 0))?;
            if !(1.0..=60.0).contains(&zone) || zone.fract() != 0.0 {
                return Err(GeorefError::parse(
                    format!("invalid UTM zone {zone}"),
                    0,
                ));
            }
            let south = step.param("south").is_some()
                || step.params.iter().any(|(k, v)| k == "south" && v.is_none());
            Ok(Conversion::utm(zone as u8, !south))
        }
        "tmerc" => Ok(Conversion::transverse_mercator(
            unnamed(),
            Angle::new(lat_0),
            Angle::new(lon_0),
            Scale::new(k_0),
            Length::new(x_0),
            Length::new(y_0),
        )),
        "merc" => {
            if let Some(lat_ts) = parse_f64(step, "lat_ts")? {
                Ok(Conversion::mercator_variant_b(
                    unnamed(),
                    Angle::new(lat_ts),
                    Angle::new(lon_0),
                    Length::new(x_0),
                    Length::new(y_0),
                ))
            } else {
                Ok(Conversion::mercator_variant_a(
                    unnamed(),
                    Angle::new(lat_0),
                    Angle::new(lon_0),
                    Scale::new(k_0),
                    Length::new(x_0),
                    Length::new(y_0),
                ))
            }
        }
        "lcc" => {
            let lat_1 = parse_f64(step, "lat_1")?
                .ok_or_else(|| GeorefError::parse("+proj=lcc requires +lat_1", 0))?;
            match parse_f64(step, "lat_2")? {
                Some(lat_2) => Ok(Conversion::lambert_conic_conformal_2sp(
                    unnamed(),
                    Angle::new(lat_0),
                    Angle::new(lon_0),
                    Angle::new(lat_1),
                    Angle::new(lat_2),
                    Length::new(x_0),
                    Length::new(y_0),
                )),
                None => Ok(Conversion::lambert_conic_conformal_1sp(
                    unnamed(),
                    Angle::new(lat_1),
                    Angle::new(lon_0),
                    Scale::new(k_0),
                    Length::new(x_0),
                    Length::new(y_0),
                )),
            }
        }
        other => Err(GeorefError::parse(
            format!("unsupported projection +proj={other:?}"),
            0,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Criterion;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_longlat_wgs84() {
        let obj = parse_proj_string("+proj=longlat +ellps=WGS84").unwrap();
        let ProjObject::Crs(crs) = obj else {
            panic!("expected a CRS");
        };
        let geog = crs.extract_geographic_crs().unwrap();
        assert_relative_eq!(
            geog.ellipsoid().semi_major_axis().si_value(),
            6378137.0
        );
        // proj strings are longitude-first
        assert_eq!(geog.cs().axes()[0].direction(), AxisDirection::East);
    }

    #[test]
    fn test_parse_datum_shorthand() {
        let obj = parse_proj_string("+proj=longlat +datum=WGS84").unwrap();
        let ProjObject::Crs(crs) = obj else {
            panic!("expected a CRS");
        };
        assert_eq!(
            crs.extract_geographic_crs().unwrap().ellipsoid().proj_ellps_id(),
            Some("WGS84")
        );
    }

    #[test]
    fn test_parse_utm_zone() {
        let obj = parse_proj_string("+proj=utm +zone=31 +ellps=WGS84").unwrap();
        let ProjObject::Crs(Crs::Projected(projected)) = obj else {
            panic!("expected a projected CRS");
        };
        assert_eq!(projected.deriving_conversion().utm_zone(), Some((31, true)));

        let south = parse_proj_string("+proj=utm +zone=1 +south").unwrap();
        let ProjObject::Crs(Crs::Projected(projected)) = south else {
            panic!("expected a projected CRS");
        };
        assert_eq!(projected.deriving_conversion().utm_zone(), Some((1, false)));
    }

    #[test]
    fn test_parse_geocent() {
        let obj = parse_proj_string("+proj=geocent +ellps=GRS80").unwrap();
        let ProjObject::Crs(Crs::Geodetic(geodetic)) = obj else {
            panic!("expected a geocentric CRS");
        };
        assert!(geodetic.is_geocentric());
    }

    #[test]
    fn test_parse_towgs84_makes_bound_crs() {
        let obj =
            parse_proj_string("+proj=longlat +ellps=clrk80ign +pm=paris +towgs84=-168,-60,320")
                .unwrap();
        let ProjObject::Crs(Crs::Bound(bound)) = obj else {
            panic!("expected a bound CRS");
        };
        let h = bound.transformation().helmert_params().unwrap();
        assert_eq!((h.x, h.y, h.z), (-168.0, -60.0, 320.0));
    }

    #[test]
    fn test_parse_pipeline_becomes_operation() {
        let obj = parse_proj_string(
            "+proj=pipeline +step +proj=axisswap +order=2,1 \
             +step +proj=unitconvert +xy_in=deg +xy_out=rad \
             +step +inv +proj=utm +zone=31",
        )
        .unwrap();
        let ProjObject::Operation(CoordinateOperation::Concatenated(concat)) = obj else {
            panic!("expected a concatenated operation");
        };
        assert_eq!(concat.steps().len(), 3);
        let CoordinateOperation::ProjBased(last) = &concat.steps()[2] else {
            panic!("expected proj-based steps");
        };
        assert_eq!(last.pipeline(), "+proj=pipeline +step +inv +proj=utm +zone=31");
    }

    #[test]
    fn test_pipeline_globals_preserved() {
        let obj = parse_proj_string("+proj=pipeline +ellps=WGS84 +step +proj=longlat").unwrap();
        let ProjObject::Operation(CoordinateOperation::ProjBased(op)) = obj else {
            panic!("expected a proj-based operation");
        };
        assert_eq!(op.pipeline(), "+proj=pipeline +ellps=WGS84 +step +proj=longlat");
    }

    #[test]
    fn test_dangling_inv_rejected() {
        // `+inv` outside a step must be followed by `+step`
        assert!(parse_proj_string("+proj=pipeline +inv").is_err());
        // `+inv` ahead of its step is accepted
        let ok = parse_proj_string("+proj=pipeline +inv +step +proj=utm +zone=31 +step +proj=longlat");
        assert!(ok.is_ok());
    }

    #[test]
    fn test_round_trip_through_wkt2() {
        let obj = parse_proj_string("+proj=utm +zone=31 +ellps=WGS84").unwrap();
        let ProjObject::Crs(crs) = obj else {
            panic!("expected a CRS");
        };
        let wkt = crs.to_wkt(crate::wkt::WktConvention::Wkt2_2018).unwrap();
        let reparsed = crate::wkt::parse_crs(&wkt).unwrap();
        assert!(reparsed.is_equivalent_to(&crs, Criterion::Equivalent));
    }

    #[test]
    fn test_bad_tokens_rejected() {
        assert!(parse_proj_string("proj=longlat").is_err());
        assert!(parse_proj_string("+proj=utm").is_err()); // missing zone
        assert!(parse_proj_string("+proj=nosuchproj").is_err());
    }
}
