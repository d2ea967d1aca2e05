//! Recursive-descent WKT parser. The dialect is inferred from the top
//! keyword: `GEOGCS`/`GEOCCS`/`PROJCS`/`VERT_CS`/`COMPD_CS` are WKT1,
//! the `...CRS` keywords are WKT2.

use std::sync::Arc;

use super::tokenizer::{tokenize, WktNode, WktValue};
use crate::crs::{
    BoundCrs, CompoundCrs, Crs, EngineeringCrs, GeodeticCrs, GeographicCrs, ProjectedCrs,
    TemporalCrs, VerticalCrs,
};
use crate::cs::{Axis, AxisDirection, CoordinateSystem, CsKind, Meridian};
use crate::datum::{
    DatumEnsemble, Ellipsoid, EngineeringDatum, GeodeticDatumOrEnsemble, GeodeticFrame,
    PrimeMeridian, TemporalDatum, VerticalDatumOrEnsemble, VerticalFrame,
};
use crate::error::{GeorefError, Result};
use crate::ident::{
    Extent, Identifier, IdentifiedObject, PositionalAccuracy,
};
use crate::measure::{Angle, Length, Scale, UnitKind, UnitOfMeasure};
use crate::operation::methods::{
    self, method_code_from_wkt1_projection, param_code_from_name, param_code_from_wkt1_name,
};
use crate::operation::{
    Conversion, OperationMethod, OperationParameter, OperationParameterValue, ParameterValue,
    Transformation,
};

/// Parse a WKT string of any supported dialect into a CRS.
pub fn parse_crs(input: &str) -> Result<Crs> {
    let node = tokenize(input)?;
    crs_from_node(&node)
}

fn err(node: &WktNode, message: impl Into<String>) -> GeorefError {
    GeorefError::parse(message.into(), node.offset)
}

fn crs_from_node(node: &WktNode) -> Result<Crs> {
    let kw = node.keyword.to_ascii_uppercase();
    match kw.as_str() {
        // WKT2
        "GEOGCRS" | "GEOGRAPHICCRS" | "GEODCRS" | "GEODETICCRS" => parse_geodetic_wkt2(node),
        "PROJCRS" | "PROJECTEDCRS" => parse_projected_wkt2(node),
        "VERTCRS" | "VERTICALCRS" => parse_vertical_wkt2(node),
        "TIMECRS" => parse_temporal_wkt2(node),
        "ENGCRS" | "ENGINEERINGCRS" => parse_engineering_wkt2(node),
        "COMPOUNDCRS" => parse_compound_wkt2(node),
        "BOUNDCRS" => parse_bound_wkt2(node),
        // WKT1
        "GEOGCS" => parse_geogcs_wkt1(node),
        "GEOCCS" => parse_geoccs_wkt1(node),
        "PROJCS" => parse_projcs_wkt1(node),
        "VERT_CS" => parse_vertcs_wkt1(node),
        "COMPD_CS" => parse_compdcs_wkt1(node),
        other => Err(err(
            node,
            format!("unexpected keyword {other:?}; expected a CRS node"),
        )),
    }
}

// ---------------------------------------------------------------------
// Shared pieces

fn name_of(node: &WktNode) -> Result<&str> {
    node.text_child(0)
        .ok_or_else(|| err(node, format!("{} requires a quoted name", node.keyword)))
}

/// Identified-object fields attached directly to this node: name, ids,
/// remarks, scope and area of use.
fn ident_of(node: &WktNode) -> Result<IdentifiedObject> {
    let mut ident = IdentifiedObject::named(name_of(node)?);
    for id in node.child_nodes(&["ID", "AUTHORITY"]) {
        let codespace = id
            .text_child(0)
            .ok_or_else(|| err(id, "identifier requires a codespace"))?;
        let code = id
            .children
            .get(1)
            .and_then(|c| c.as_code())
            .ok_or_else(|| err(id, "identifier requires a code"))?;
        ident = ident.with_identifier(Identifier::new(codespace, code));
    }
    if let Some(remark) = node.child_node(&["REMARK"]) {
        if let Some(text) = remark.text_child(0) {
            ident = ident.with_remarks(text);
        }
    }
    let mut scope = None;
    let mut extent = Extent::default();
    let mut has_extent = false;
    let mut absorb = |container: &WktNode,
                      scope: &mut Option<String>,
                      extent: &mut Extent,
                      has_extent: &mut bool| {
        if let Some(s) = container.child_node(&["SCOPE"]) {
            *scope = s.text_child(0).map(str::to_string);
        }
        if let Some(area) = container.child_node(&["AREA"]) {
            if let Some(text) = area.text_child(0) {
                extent.description = Some(text.to_string());
                *has_extent = true;
            }
        }
        if let Some(bbox) = container.child_node(&["BBOX"]) {
            if bbox.children.len() == 4 {
                // BBOX order is south, west, north, east
                let v: Vec<f64> = bbox.children.iter().filter_map(|c| c.as_number()).collect();
                if v.len() == 4 {
                    extent
                        .geographic_elements
                        .push(crate::ident::GeographicBoundingBox::new(v[1], v[0], v[3], v[2]));
                    *has_extent = true;
                }
            }
        }
    };
    for usage in node.child_nodes(&["USAGE"]) {
        absorb(usage, &mut scope, &mut extent, &mut has_extent);
    }
    absorb(node, &mut scope, &mut extent, &mut has_extent);
    if let Some(s) = scope {
        ident = ident.with_scope(s);
    }
    if has_extent {
        ident = ident.with_extent(extent);
    }
    for ext in node.child_nodes(&["EXTENSION"]) {
        if ext.text_child(0).map(|k| k.eq_ignore_ascii_case("PROJ4")) == Some(true) {
            if let Some(value) = ext.text_child(1) {
                ident = ident.with_extension_proj4(value);
            }
        }
    }
    Ok(ident)
}

fn unit_kind_for_keyword(keyword: &str, fallback: UnitKind) -> UnitKind {
    match keyword.to_ascii_uppercase().as_str() {
        "LENGTHUNIT" => UnitKind::Length,
        "ANGLEUNIT" => UnitKind::Angle,
        "SCALEUNIT" => UnitKind::Scale,
        "TIMEUNIT" => UnitKind::Time,
        "PARAMETRICUNIT" => UnitKind::Parametric,
        _ => fallback,
    }
}

fn parse_unit(node: &WktNode, expected: UnitKind) -> Result<UnitOfMeasure> {
    let name = name_of(node)?;
    let factor = node
        .number_child(1)
        .ok_or_else(|| err(node, format!("unit {name:?} requires a conversion factor")))?;
    if factor < 0.0 {
        return Err(err(node, format!("unit {name:?} has a negative factor")));
    }
    let kind = unit_kind_for_keyword(&node.keyword, expected);
    Ok(UnitOfMeasure::new(name.to_string(), factor, kind))
}

const UNIT_KEYWORDS: &[&str] = &[
    "UNIT",
    "LENGTHUNIT",
    "ANGLEUNIT",
    "SCALEUNIT",
    "TIMEUNIT",
    "PARAMETRICUNIT",
];

fn child_unit(node: &WktNode, expected: UnitKind) -> Result<Option<UnitOfMeasure>> {
    match node.child_node(UNIT_KEYWORDS) {
        Some(u) => Ok(Some(parse_unit(u, expected)?)),
        None => Ok(None),
    }
}

fn parse_ellipsoid(node: &WktNode) -> Result<Arc<Ellipsoid>> {
    let ident = ident_of(node)?;
    let a = node
        .number_child(1)
        .ok_or_else(|| err(node, "ellipsoid requires a semi-major axis"))?;
    let rf = node
        .number_child(2)
        .ok_or_else(|| err(node, "ellipsoid requires an inverse flattening"))?;
    let unit = child_unit(node, UnitKind::Length)?.unwrap_or(UnitOfMeasure::METRE);
    let semi_major = Length::with_unit(a, unit)?;
    let ellipsoid = if rf == 0.0 {
        Ellipsoid::sphere(ident, semi_major)?
    } else {
        Ellipsoid::from_inverse_flattening(ident, semi_major, Scale::new(rf))?
    };
    Ok(Arc::new(ellipsoid))
}

/// In a WKT1 `GEOGCS` the prime-meridian longitude is always expressed
/// in degrees, whatever the surrounding UNIT says.
fn parse_prime_meridian(
    node: &WktNode,
    wkt1: bool,
    angular_unit: &UnitOfMeasure,
) -> Result<Arc<PrimeMeridian>> {
    let ident = ident_of(node)?;
    let lon = node
        .number_child(1)
        .ok_or_else(|| err(node, "prime meridian requires a longitude"))?;
    let unit = if wkt1 {
        UnitOfMeasure::DEGREE
    } else {
        child_unit(node, UnitKind::Angle)?.unwrap_or_else(|| angular_unit.clone())
    };
    Ok(Arc::new(PrimeMeridian::new(
        ident,
        Angle::with_unit(lon, unit)?,
    )))
}

fn parse_geodetic_datum(
    node: &WktNode,
    pm: Arc<PrimeMeridian>,
    dynamic_epoch: Option<f64>,
) -> Result<Arc<GeodeticFrame>> {
    let ident = ident_of(node)?;
    let ellipsoid_node = node
        .child_node(&["ELLIPSOID", "SPHEROID"])
        .ok_or_else(|| err(node, "datum requires an ELLIPSOID"))?;
    let ellipsoid = parse_ellipsoid(ellipsoid_node)?;
    let anchor = node
        .child_node(&["ANCHOR"])
        .and_then(|a| a.text_child(0))
        .map(str::to_string);
    Ok(Arc::new(match dynamic_epoch {
        Some(epoch) => GeodeticFrame::dynamic(ident, ellipsoid, pm, anchor, epoch),
        None => GeodeticFrame::new(ident, ellipsoid, pm, anchor),
    }))
}

fn parse_datum_ensemble(node: &WktNode, pm: Arc<PrimeMeridian>) -> Result<GeodeticDatumOrEnsemble> {
    let ident = ident_of(node)?;
    let ellipsoid_node = node
        .child_node(&["ELLIPSOID", "SPHEROID"])
        .ok_or_else(|| err(node, "geodetic datum ensemble requires an ELLIPSOID"))?;
    let ellipsoid = parse_ellipsoid(ellipsoid_node)?;
    let mut members = Vec::new();
    for member in node.child_nodes(&["MEMBER"]) {
        members.push(Arc::new(GeodeticFrame::new(
            ident_of(member)?,
            ellipsoid.clone(),
            pm.clone(),
            None,
        )));
    }
    let accuracy = node
        .child_node(&["ENSEMBLEACCURACY"])
        .and_then(|a| a.number_child(0))
        .unwrap_or(0.0);
    Ok(GeodeticDatumOrEnsemble::Ensemble(Arc::new(
        DatumEnsemble::new(ident, members, PositionalAccuracy::metres(accuracy))
            .map_err(|e| err(node, e.to_string()))?,
    )))
}

fn dynamic_epoch_of(node: &WktNode) -> Option<f64> {
    node.child_node(&["DYNAMIC"])
        .and_then(|d| d.child_node(&["FRAMEEPOCH"]))
        .and_then(|f| f.number_child(0))
}

/// Split an axis name like "Latitude (lat)" into name and abbreviation.
fn split_axis_name(raw: &str) -> (String, String) {
    if let Some(open) = raw.find('(') {
        let name = raw[..open].trim().to_string();
        let abbrev = raw[open + 1..]
            .trim_end_matches(')')
            .trim()
            .to_string();
        (name, abbrev)
    } else {
        (raw.trim().to_string(), String::new())
    }
}

fn parse_axis(
    node: &WktNode,
    fallback_unit: Option<&UnitOfMeasure>,
    bare_unit_kind: UnitKind,
) -> Result<Axis> {
    let raw_name = name_of(node)?;
    let (name, abbrev) = split_axis_name(raw_name);
    let direction_word = node
        .children
        .iter()
        .find_map(|c| c.as_keyword())
        .ok_or_else(|| err(node, format!("axis {raw_name:?} requires a direction")))?;
    let direction = AxisDirection::from_name(direction_word)
        .ok_or_else(|| err(node, format!("unknown axis direction {direction_word:?}")))?;
    let unit = match node.child_node(UNIT_KEYWORDS) {
        Some(u) => parse_unit(u, bare_unit_kind)?,
        None => fallback_unit
            .cloned()
            .ok_or_else(|| err(node, format!("axis {raw_name:?} requires a unit")))?,
    };
    let mut axis = Axis::new(name, abbrev, direction, unit);
    if let Some(meridian) = node.child_node(&["MERIDIAN"]) {
        let lon = meridian
            .number_child(0)
            .ok_or_else(|| err(meridian, "MERIDIAN requires a longitude"))?;
        let m_unit = child_unit(meridian, UnitKind::Angle)?.unwrap_or(UnitOfMeasure::DEGREE);
        axis = axis.with_meridian(Meridian {
            longitude: Angle::with_unit(lon, m_unit)?,
        });
    }
    Ok(axis)
}

/// Parse a WKT2 `CS[kind,n]` node plus its sibling AXIS list (and the
/// simplified trailing UNIT).
fn parse_cs_wkt2(parent: &WktNode) -> Result<CoordinateSystem> {
    let cs_node = parent
        .child_node(&["CS"])
        .ok_or_else(|| err(parent, format!("{} requires a CS node", parent.keyword)))?;
    let kind_word = cs_node
        .children
        .first()
        .and_then(|c| c.as_keyword())
        .ok_or_else(|| err(cs_node, "CS requires a kind"))?;
    let kind = CsKind::from_name(kind_word)
        .ok_or_else(|| err(cs_node, format!("unknown CS kind {kind_word:?}")))?;
    let declared_count = cs_node.children.get(1).and_then(|c| c.as_number());

    // The simplified dialect hoists a shared unit after the axis list;
    // a bare UNIT keyword takes its kind from the CS kind.
    let fallback_kind = match kind {
        CsKind::Ellipsoidal | CsKind::Spherical => UnitKind::Angle,
        CsKind::TemporalDateTime | CsKind::TemporalCount | CsKind::TemporalMeasure => {
            UnitKind::Time
        }
        _ => UnitKind::Length,
    };
    let shared_unit = child_unit(parent, fallback_kind)?;
    let mut axes = Vec::new();
    for axis_node in parent.child_nodes(&["AXIS"]) {
        axes.push(parse_axis(axis_node, shared_unit.as_ref(), fallback_kind)?);
    }
    if let Some(n) = declared_count {
        if n as usize != axes.len() {
            return Err(err(
                cs_node,
                format!("CS declares {n} axes but {} are present", axes.len()),
            ));
        }
    }
    CoordinateSystem::new(kind, axes).map_err(|e| err(cs_node, e.to_string()))
}

// ---------------------------------------------------------------------
// WKT2 CRS productions

fn parse_geodetic_wkt2(node: &WktNode) -> Result<Crs> {
    let ident = ident_of(node)?;
    let cs = parse_cs_wkt2(node)?;

    let angular_unit = cs
        .axes()
        .iter()
        .find(|a| a.unit().kind() == UnitKind::Angle)
        .map(|a| a.unit().clone())
        .unwrap_or(UnitOfMeasure::DEGREE);
    let pm = match node.child_node(&["PRIMEM", "PRIMEMERIDIAN"]) {
        Some(p) => parse_prime_meridian(p, false, &angular_unit)?,
        None => PrimeMeridian::greenwich(),
    };
    let datum = parse_datum_or_ensemble(node, pm)?;

    match cs.kind() {
        CsKind::Ellipsoidal => Ok(Crs::Geographic(
            GeographicCrs::new(ident, datum, cs).map_err(|e| err(node, e.to_string()))?,
        )),
        _ => Ok(Crs::Geodetic(
            GeodeticCrs::new(ident, datum, cs).map_err(|e| err(node, e.to_string()))?,
        )),
    }
}

fn parse_datum_or_ensemble(
    node: &WktNode,
    pm: Arc<PrimeMeridian>,
) -> Result<GeodeticDatumOrEnsemble> {
    if let Some(ensemble) = node.child_node(&["ENSEMBLE"]) {
        return parse_datum_ensemble(ensemble, pm);
    }
    let datum_node = node
        .child_node(&["DATUM", "TRF", "GEODETICDATUM"])
        .ok_or_else(|| err(node, format!("{} requires a DATUM", node.keyword)))?;
    let datum = parse_geodetic_datum(datum_node, pm, dynamic_epoch_of(node))?;
    Ok(GeodeticDatumOrEnsemble::Datum(datum))
}

fn parse_method_wkt2(node: &WktNode) -> Result<OperationMethod> {
    let name = name_of(node)?;
    match methods::method_code_from_name(name) {
        Some(code) => Ok(OperationMethod::from_epsg(code, &[])),
        None => Ok(OperationMethod::named(name)),
    }
}

fn parse_parameter_wkt2(node: &WktNode) -> Result<OperationParameterValue> {
    let name = name_of(node)?;
    let parameter = match param_code_from_name(name) {
        Some(code) => OperationParameter::from_epsg(code),
        None => OperationParameter::named(name),
    };
    if node.keyword_is("PARAMETERFILE") {
        let file = node
            .text_child(1)
            .ok_or_else(|| err(node, format!("parameter file {name:?} requires a name")))?;
        return Ok(OperationParameterValue::new(
            parameter,
            ParameterValue::Filename(file.to_string()),
        ));
    }
    let value = node
        .number_child(1)
        .ok_or_else(|| err(node, format!("parameter {name:?} requires a value")))?;
    // Unit child decides the kind; a bare value defaults by parameter
    // family (angles for latitudes/longitudes, metres otherwise).
    let measure = match node.child_node(UNIT_KEYWORDS) {
        Some(u) => {
            let unit = parse_unit(u, UnitKind::Scale)?;
            crate::measure::Measure::new(value, unit)
        }
        None => {
            let lower = name.to_ascii_lowercase();
            let unit = if lower.contains("latitude")
                || lower.contains("longitude")
                || lower.contains("rotation")
            {
                UnitOfMeasure::DEGREE
            } else if lower.contains("scale") {
                UnitOfMeasure::UNITY
            } else {
                UnitOfMeasure::METRE
            };
            crate::measure::Measure::new(value, unit)
        }
    };
    Ok(OperationParameterValue::new(
        parameter,
        ParameterValue::Measure(measure),
    ))
}

fn parse_conversion_wkt2(node: &WktNode) -> Result<Conversion> {
    let ident = ident_of(node)?;
    let method_node = node
        .child_node(&["METHOD", "PROJECTION"])
        .ok_or_else(|| err(node, "CONVERSION requires a METHOD"))?;
    let method = parse_method_wkt2(method_node)?;
    let mut values = Vec::new();
    for p in node.child_nodes(&["PARAMETER", "PARAMETERFILE"]) {
        values.push(parse_parameter_wkt2(p)?);
    }
    Ok(Conversion::new(ident, method, values))
}

fn parse_projected_wkt2(node: &WktNode) -> Result<Crs> {
    let ident = ident_of(node)?;
    let base_node = node
        .child_node(&["BASEGEOGCRS", "BASEGEODCRS"])
        .ok_or_else(|| err(node, "PROJCRS requires a BASEGEOGCRS"))?;
    let base = parse_base_geographic(base_node)?;
    let conversion_node = node
        .child_node(&["CONVERSION"])
        .ok_or_else(|| err(node, "PROJCRS requires a CONVERSION"))?;
    let conversion = parse_conversion_wkt2(conversion_node)?;
    let cs = parse_cs_wkt2(node)?;
    Ok(Crs::Projected(
        ProjectedCrs::new(ident, Arc::new(base), conversion, cs)
            .map_err(|e| err(node, e.to_string()))?,
    ))
}

/// A BASEGEOGCRS has no CS of its own; the conventional latitude-first
/// degree CS is assumed, in the declared angular unit if any.
fn parse_base_geographic(node: &WktNode) -> Result<GeographicCrs> {
    let ident = ident_of(node)?;
    let angular_unit = child_unit(node, UnitKind::Angle)?.unwrap_or(UnitOfMeasure::DEGREE);
    let pm = match node.child_node(&["PRIMEM", "PRIMEMERIDIAN"]) {
        Some(p) => parse_prime_meridian(p, false, &angular_unit)?,
        None => PrimeMeridian::greenwich(),
    };
    let datum = parse_datum_or_ensemble(node, pm)?;
    let cs = CoordinateSystem::new(
        CsKind::Ellipsoidal,
        vec![
            Axis::new("Latitude", "lat", AxisDirection::North, angular_unit.clone()),
            Axis::new("Longitude", "lon", AxisDirection::East, angular_unit),
        ],
    )
    .map_err(|e| err(node, e.to_string()))?;
    GeographicCrs::new(ident, datum, cs).map_err(|e| err(node, e.to_string()))
}

fn parse_vertical_wkt2(node: &WktNode) -> Result<Crs> {
    let ident = ident_of(node)?;
    let datum_node = node
        .child_node(&["VDATUM", "VERTICALDATUM", "VRF", "VERT_DATUM"])
        .ok_or_else(|| err(node, "VERTCRS requires a VDATUM"))?;
    let anchor = datum_node
        .child_node(&["ANCHOR"])
        .and_then(|a| a.text_child(0))
        .map(str::to_string);
    let frame = match dynamic_epoch_of(node) {
        Some(epoch) => VerticalFrame::dynamic(ident_of(datum_node)?, anchor, epoch),
        None => VerticalFrame::new(ident_of(datum_node)?, anchor),
    };
    let cs = parse_cs_wkt2(node)?;
    Ok(Crs::Vertical(
        VerticalCrs::new(ident, VerticalDatumOrEnsemble::Datum(Arc::new(frame)), cs)
            .map_err(|e| err(node, e.to_string()))?,
    ))
}

fn parse_temporal_wkt2(node: &WktNode) -> Result<Crs> {
    let ident = ident_of(node)?;
    let datum_node = node
        .child_node(&["TDATUM", "TIMEDATUM"])
        .ok_or_else(|| err(node, "TIMECRS requires a TDATUM"))?;
    let calendar = datum_node
        .child_node(&["CALENDAR"])
        .and_then(|c| c.text_child(0))
        .unwrap_or("proleptic Gregorian")
        .to_string();
    let origin = datum_node
        .child_node(&["TIMEORIGIN"])
        .map(|o| match o.children.first() {
            Some(WktValue::Text(t)) => t.clone(),
            Some(WktValue::Number(n)) => format!("{n}"),
            Some(WktValue::Keyword(k)) => k.clone(),
            _ => String::new(),
        })
        .unwrap_or_default();
    let datum = TemporalDatum::new(ident_of(datum_node)?, calendar, origin);
    let cs = parse_cs_wkt2(node)?;
    Ok(Crs::Temporal(
        TemporalCrs::new(ident, Arc::new(datum), cs).map_err(|e| err(node, e.to_string()))?,
    ))
}

fn parse_engineering_wkt2(node: &WktNode) -> Result<Crs> {
    let ident = ident_of(node)?;
    let datum_node = node
        .child_node(&["EDATUM", "ENGINEERINGDATUM"])
        .ok_or_else(|| err(node, "ENGCRS requires an EDATUM"))?;
    let anchor = datum_node
        .child_node(&["ANCHOR"])
        .and_then(|a| a.text_child(0))
        .map(str::to_string);
    let datum = EngineeringDatum::new(ident_of(datum_node)?, anchor);
    let cs = parse_cs_wkt2(node)?;
    Ok(Crs::Engineering(
        EngineeringCrs::new(ident, Arc::new(datum), cs)
            .map_err(|e| err(node, e.to_string()))?,
    ))
}

fn parse_compound_wkt2(node: &WktNode) -> Result<Crs> {
    let ident = ident_of(node)?;
    let mut components = Vec::new();
    for child in &node.children {
        if let WktValue::Node(n) = child {
            if n.keyword.to_ascii_uppercase().ends_with("CRS") || n.keyword_is("GEOGCS") {
                components.push(Arc::new(crs_from_node(n)?));
            }
        }
    }
    Ok(Crs::Compound(
        CompoundCrs::new(ident, components).map_err(|e| err(node, e.to_string()))?,
    ))
}

fn parse_bound_wkt2(node: &WktNode) -> Result<Crs> {
    let source = node
        .child_node(&["SOURCECRS"])
        .and_then(|s| s.children.first())
        .and_then(|c| c.as_node())
        .ok_or_else(|| err(node, "BOUNDCRS requires a SOURCECRS"))?;
    let target = node
        .child_node(&["TARGETCRS"])
        .and_then(|s| s.children.first())
        .and_then(|c| c.as_node())
        .ok_or_else(|| err(node, "BOUNDCRS requires a TARGETCRS"))?;
    let transf_node = node
        .child_node(&["ABRIDGEDTRANSFORMATION"])
        .ok_or_else(|| err(node, "BOUNDCRS requires an ABRIDGEDTRANSFORMATION"))?;

    let base = Arc::new(crs_from_node(source)?);
    let hub = Arc::new(crs_from_node(target)?);

    let method_node = transf_node
        .child_node(&["METHOD"])
        .ok_or_else(|| err(transf_node, "transformation requires a METHOD"))?;
    let method = parse_method_wkt2(method_node)?;
    let mut values = Vec::new();
    for p in transf_node.child_nodes(&["PARAMETER", "PARAMETERFILE"]) {
        values.push(parse_parameter_wkt2(p)?);
    }
    let transformation = Transformation::new(
        ident_of(transf_node)?,
        base.clone(),
        hub.clone(),
        None,
        method,
        values,
        Vec::new(),
    );
    Ok(Crs::Bound(BoundCrs::new(
        base,
        hub,
        Arc::new(transformation),
    )))
}

// ---------------------------------------------------------------------
// WKT1 productions

/// Axis order in a WKT1 GEOGCS is authoritative only when AXIS nodes are
/// present; otherwise latitude-then-longitude is assumed.
fn parse_geogcs_wkt1(node: &WktNode) -> Result<Crs> {
    let ident = ident_of(node)?;
    let datum_node = node
        .child_node(&["DATUM"])
        .ok_or_else(|| err(node, "GEOGCS requires a DATUM"))?;
    let angular_unit = child_unit(node, UnitKind::Angle)?.unwrap_or(UnitOfMeasure::DEGREE);
    let pm = match node.child_node(&["PRIMEM"]) {
        Some(p) => parse_prime_meridian(p, true, &angular_unit)?,
        None => PrimeMeridian::greenwich(),
    };
    let datum = parse_geodetic_datum(datum_node, pm, None)?;

    let mut axes = Vec::new();
    for axis_node in node.child_nodes(&["AXIS"]) {
        axes.push(parse_axis(axis_node, Some(&angular_unit), UnitKind::Angle)?);
    }
    if axes.is_empty() {
        axes = vec![
            Axis::new("Latitude", "lat", AxisDirection::North, angular_unit.clone()),
            Axis::new("Longitude", "lon", AxisDirection::East, angular_unit.clone()),
        ];
    }
    let cs = CoordinateSystem::new(CsKind::Ellipsoidal, axes)
        .map_err(|e| err(node, e.to_string()))?;
    let crs = Crs::Geographic(
        GeographicCrs::new(ident, GeodeticDatumOrEnsemble::Datum(datum), cs)
            .map_err(|e| err(node, e.to_string()))?,
    );
    wrap_towgs84(crs, datum_node)
}

fn parse_geoccs_wkt1(node: &WktNode) -> Result<Crs> {
    let ident = ident_of(node)?;
    let datum_node = node
        .child_node(&["DATUM"])
        .ok_or_else(|| err(node, "GEOCCS requires a DATUM"))?;
    let pm = match node.child_node(&["PRIMEM"]) {
        Some(p) => parse_prime_meridian(p, true, &UnitOfMeasure::DEGREE)?,
        None => PrimeMeridian::greenwich(),
    };
    let datum = parse_geodetic_datum(datum_node, pm, None)?;
    let crs = Crs::Geodetic(
        GeodeticCrs::new(
            ident,
            GeodeticDatumOrEnsemble::Datum(datum),
            CoordinateSystem::cartesian_geocentric_metre(),
        )
        .map_err(|e| err(node, e.to_string()))?,
    );
    wrap_towgs84(crs, datum_node)
}

/// Materialize a `TOWGS84` node on the enclosing datum as a bound CRS.
fn wrap_towgs84(crs: Crs, datum_node: &WktNode) -> Result<Crs> {
    let Some(towgs84) = datum_node.child_node(&["TOWGS84"]) else {
        return Ok(crs);
    };
    let params: Vec<f64> = towgs84
        .children
        .iter()
        .filter_map(|c| c.as_number())
        .collect();
    if params.len() != 3 && params.len() != 7 {
        return Err(err(
            towgs84,
            format!("TOWGS84 requires 3 or 7 values, got {}", params.len()),
        ));
    }
    let bound = BoundCrs::from_towgs84(Arc::new(crs), &params)
        .map_err(|e| err(towgs84, e.to_string()))?;
    Ok(Crs::Bound(bound))
}

fn parse_projcs_wkt1(node: &WktNode) -> Result<Crs> {
    let ident = ident_of(node)?;
    let geogcs_node = node
        .child_node(&["GEOGCS"])
        .ok_or_else(|| err(node, "PROJCS requires a GEOGCS"))?;
    let base = parse_geogcs_wkt1(geogcs_node)?;
    let projection_node = node
        .child_node(&["PROJECTION"])
        .ok_or_else(|| err(node, "PROJCS requires a PROJECTION"))?;
    let projection_name = name_of(projection_node)?;

    // Raw WKT1 parameters, for the Mercator disambiguation rule
    let mut raw: Vec<(String, f64)> = Vec::new();
    for p in node.child_nodes(&["PARAMETER"]) {
        let name = name_of(p)?;
        let value = p
            .number_child(1)
            .ok_or_else(|| err(p, format!("parameter {name:?} requires a value")))?;
        raw.push((name.to_string(), value));
    }
    let find_raw = |wanted: &str| {
        raw.iter()
            .find(|(n, _)| crate::ident::is_equivalent_name(n, wanted))
            .map(|(_, v)| *v)
    };
    let method_code = method_code_from_wkt1_projection(
        projection_name,
        find_raw("latitude_of_origin"),
        find_raw("scale_factor"),
    )
    .ok_or_else(|| {
        err(
            projection_node,
            format!("unknown WKT1 projection {projection_name:?}"),
        )
    })?;

    let linear_unit = child_unit(node, UnitKind::Length)?.unwrap_or(UnitOfMeasure::METRE);
    let mut values = Vec::new();
    for (name, value) in &raw {
        // The normalized Mercator variant B drops the scale factor and
        // reads latitude_of_origin as its standard parallel.
        let is_variant_b_rewrite = method_code == methods::METHOD_MERCATOR_VARIANT_B
            && projection_name.to_ascii_lowercase().contains("1sp");
        let code = if is_variant_b_rewrite
            && crate::ident::is_equivalent_name(name, "scale_factor")
        {
            continue;
        } else if is_variant_b_rewrite
            && crate::ident::is_equivalent_name(name, "latitude_of_origin")
        {
            methods::PARAM_LATITUDE_1ST_STD_PARALLEL
        } else {
            match param_code_from_wkt1_name(method_code, name) {
                Some(c) => c,
                None => {
                    values.push(OperationParameterValue::new(
                        OperationParameter::named(name.clone()),
                        ParameterValue::Measure(crate::measure::Measure::new(
                            *value,
                            UnitOfMeasure::UNITY,
                        )),
                    ));
                    continue;
                }
            }
        };
        let value = match methods::parameter_name(code) {
            Some(canonical) if canonical.contains("Latitude") || canonical.contains("Longitude") => {
                ParameterValue::Measure(crate::measure::Measure::new(
                    *value,
                    UnitOfMeasure::DEGREE,
                ))
            }
            Some(canonical) if canonical.contains("Scale") => ParameterValue::Measure(
                crate::measure::Measure::new(*value, UnitOfMeasure::UNITY),
            ),
            _ => ParameterValue::Measure(crate::measure::Measure::new(
                *value,
                linear_unit.clone(),
            )),
        };
        values.push(OperationParameterValue::new(
            OperationParameter::from_epsg(code),
            value,
        ));
    }

    // Variant B needs its standard parallel even when the original
    // Mercator_1SP omitted latitude_of_origin (implicitly 0).
    if method_code == methods::METHOD_MERCATOR_VARIANT_B
        && methods::wkt1_projection_name(methods::METHOD_MERCATOR_VARIANT_A)
            .map(|n| crate::ident::is_equivalent_name(n, projection_name))
            .unwrap_or(false)
        && crate::operation::find_parameter(&values, methods::PARAM_LATITUDE_1ST_STD_PARALLEL)
            .is_none()
    {
        values.push(OperationParameterValue::angle(
            methods::PARAM_LATITUDE_1ST_STD_PARALLEL,
            Angle::new(0.0),
        ));
    }

    let conversion = Conversion::new(
        IdentifiedObject::named("unnamed"),
        OperationMethod::from_epsg(method_code, &[]),
        values,
    );

    let mut axes = Vec::new();
    for axis_node in node.child_nodes(&["AXIS"]) {
        axes.push(parse_axis(axis_node, Some(&linear_unit), UnitKind::Length)?);
    }
    if axes.is_empty() {
        axes = vec![
            Axis::new("Easting", "E", AxisDirection::East, linear_unit.clone()),
            Axis::new("Northing", "N", AxisDirection::North, linear_unit.clone()),
        ];
    }
    let cs = CoordinateSystem::new(CsKind::Cartesian, axes)
        .map_err(|e| err(node, e.to_string()))?;

    // TOWGS84 in the base GEOGCS binds the whole projected CRS
    let (base_geographic, towgs84_params) = match base {
        Crs::Bound(bound) => {
            let params = bound.transformation().helmert_params();
            match (*bound.base().clone()).clone() {
                Crs::Geographic(g) => (g, params),
                _ => return Err(err(geogcs_node, "PROJCS base must be geographic")),
            }
        }
        Crs::Geographic(g) => (g, None),
        _ => return Err(err(geogcs_node, "PROJCS base must be geographic")),
    };

    let projected = Crs::Projected(
        ProjectedCrs::new(ident, Arc::new(base_geographic), conversion, cs)
            .map_err(|e| err(node, e.to_string()))?,
    );
    match towgs84_params {
        Some(h) => {
            let bound = BoundCrs::from_towgs84(
                Arc::new(projected),
                &[h.x, h.y, h.z, h.rx, h.ry, h.rz, h.s],
            )
            .map_err(|e| err(node, e.to_string()))?;
            Ok(Crs::Bound(bound))
        }
        None => Ok(projected),
    }
}

fn parse_vertcs_wkt1(node: &WktNode) -> Result<Crs> {
    let ident = ident_of(node)?;
    let datum_node = node
        .child_node(&["VERT_DATUM"])
        .ok_or_else(|| err(node, "VERT_CS requires a VERT_DATUM"))?;
    let frame = VerticalFrame::new(ident_of(datum_node)?, None);
    let unit = child_unit(node, UnitKind::Length)?.unwrap_or(UnitOfMeasure::METRE);
    let mut axes = Vec::new();
    for axis_node in node.child_nodes(&["AXIS"]) {
        axes.push(parse_axis(axis_node, Some(&unit), UnitKind::Length)?);
    }
    if axes.is_empty() {
        axes = vec![Axis::new(
            "Gravity-related height",
            "H",
            AxisDirection::Up,
            unit,
        )];
    }
    let cs =
        CoordinateSystem::new(CsKind::Vertical, axes).map_err(|e| err(node, e.to_string()))?;
    Ok(Crs::Vertical(
        VerticalCrs::new(ident, VerticalDatumOrEnsemble::Datum(Arc::new(frame)), cs)
            .map_err(|e| err(node, e.to_string()))?,
    ))
}

fn parse_compdcs_wkt1(node: &WktNode) -> Result<Crs> {
    let ident = ident_of(node)?;
    let mut components = Vec::new();
    for child in &node.children {
        if let WktValue::Node(n) = child {
            if matches!(
                n.keyword.to_ascii_uppercase().as_str(),
                "GEOGCS" | "PROJCS" | "VERT_CS" | "GEOCCS"
            ) {
                components.push(Arc::new(crs_from_node(n)?));
            }
        }
    }
    Ok(Crs::Compound(
        CompoundCrs::new(ident, components).map_err(|e| err(node, e.to_string()))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Criterion;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_wkt1_geogcs_defaults_lat_lon() {
        let wkt = r#"GEOGCS["WGS 84",
            DATUM["WGS_1984",
                SPHEROID["WGS 84",6378137,298.257223563,
                    AUTHORITY["EPSG","7030"]],
                AUTHORITY["EPSG","6326"]],
            PRIMEM["Greenwich",0,
                AUTHORITY["EPSG","8901"]],
            UNIT["degree",0.0174532925199433],
            AUTHORITY["EPSG","4326"]]"#;
        let crs = parse_crs(wkt).unwrap();
        let reference = Crs::Geographic(GeographicCrs::epsg_4326());
        assert!(crs.is_equivalent_to(&reference, Criterion::Equivalent));
        assert_eq!(crs.ident().epsg_code(), Some(4326));
    }

    #[test]
    fn test_parse_wkt1_primem_always_degrees() {
        // Paris longitude is written in degrees even though the CRS unit
        // is grads.
        let wkt = r#"GEOGCS["NTF (Paris)",
            DATUM["Nouvelle_Triangulation_Francaise_Paris",
                SPHEROID["Clarke 1880 (IGN)",6378249.2,293.466021293627]],
            PRIMEM["Paris",2.33722917],
            UNIT["grad",0.015707963267949],
            AUTHORITY["EPSG","4807"]]"#;
        let crs = parse_crs(wkt).unwrap();
        let geog = crs.extract_geographic_crs().unwrap();
        assert_relative_eq!(
            geog.prime_meridian().longitude().degrees(),
            2.33722917,
            epsilon = 1e-9
        );
        assert_eq!(geog.cs().axes()[0].unit(), &UnitOfMeasure::GRAD);
    }

    #[test]
    fn test_parse_wkt1_towgs84_materializes_bound_crs() {
        let wkt = r#"GEOGCS["NTF (Paris)",
            DATUM["Nouvelle_Triangulation_Francaise_Paris",
                SPHEROID["Clarke 1880 (IGN)",6378249.2,293.466021293627],
                TOWGS84[-168,-60,320,0,0,0,0]],
            PRIMEM["Paris",2.33722917],
            UNIT["grad",0.015707963267949]]"#;
        let crs = parse_crs(wkt).unwrap();
        let Crs::Bound(bound) = &crs else {
            panic!("expected a bound CRS");
        };
        let h = bound.transformation().helmert_params().unwrap();
        assert_eq!((h.x, h.y, h.z), (-168.0, -60.0, 320.0));
        assert_eq!(bound.hub().ident().epsg_code(), Some(4326));
    }

    #[test]
    fn test_parse_wkt1_projcs_utm() {
        let wkt = r#"PROJCS["WGS 84 / UTM zone 31N",
            GEOGCS["WGS 84",
                DATUM["WGS_1984",
                    SPHEROID["WGS 84",6378137,298.257223563]],
                PRIMEM["Greenwich",0],
                UNIT["degree",0.0174532925199433]],
            PROJECTION["Transverse_Mercator"],
            PARAMETER["latitude_of_origin",0],
            PARAMETER["central_meridian",3],
            PARAMETER["scale_factor",0.9996],
            PARAMETER["false_easting",500000],
            PARAMETER["false_northing",0],
            UNIT["metre",1],
            AUTHORITY["EPSG","32631"]]"#;
        let crs = parse_crs(wkt).unwrap();
        let Crs::Projected(projected) = &crs else {
            panic!("expected a projected CRS");
        };
        assert_eq!(projected.deriving_conversion().utm_zone(), Some((31, true)));
    }

    #[test]
    fn test_parse_wkt1_mercator_1sp_that_is_variant_b() {
        let wkt = r#"PROJCS["test",
            GEOGCS["WGS 84",
                DATUM["WGS_1984",
                    SPHEROID["WGS 84",6378137,298.257223563]],
                PRIMEM["Greenwich",0],
                UNIT["degree",0.0174532925199433]],
            PROJECTION["Mercator_1SP"],
            PARAMETER["latitude_of_origin",-1],
            PARAMETER["central_meridian",2],
            PARAMETER["scale_factor",1],
            PARAMETER["false_easting",3],
            PARAMETER["false_northing",4],
            UNIT["metre",1]]"#;
        let crs = parse_crs(wkt).unwrap();
        let Crs::Projected(projected) = &crs else {
            panic!("expected a projected CRS");
        };
        let conv = projected.deriving_conversion();
        assert_eq!(
            conv.method().epsg_code(),
            Some(methods::METHOD_MERCATOR_VARIANT_B)
        );
        assert_eq!(
            conv.parameter_numeric(
                methods::PARAM_LATITUDE_1ST_STD_PARALLEL,
                &UnitOfMeasure::DEGREE
            ),
            Some(-1.0)
        );
        // scale_factor dropped in the variant B rendition
        assert!(conv
            .parameter_numeric(
                methods::PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN,
                &UnitOfMeasure::UNITY
            )
            .is_none());
    }

    #[test]
    fn test_parse_wkt2_geographic() {
        let wkt = r#"GEOGCRS["WGS 84",
            DATUM["World Geodetic System 1984",
                ELLIPSOID["WGS 84",6378137,298.257223563,
                    LENGTHUNIT["metre",1]]],
            PRIMEM["Greenwich",0,
                ANGLEUNIT["degree",0.0174532925199433]],
            CS[ellipsoidal,2],
                AXIS["latitude",north,
                    ORDER[1],
                    ANGLEUNIT["degree",0.0174532925199433]],
                AXIS["longitude",east,
                    ORDER[2],
                    ANGLEUNIT["degree",0.0174532925199433]],
            ID["EPSG",4326]]"#;
        let crs = parse_crs(wkt).unwrap();
        assert!(crs.is_equivalent_to(
            &Crs::Geographic(GeographicCrs::epsg_4326()),
            Criterion::Equivalent
        ));
    }

    #[test]
    fn test_parse_wkt2_projcrs() {
        let wkt = r#"PROJCRS["WGS 84 / UTM zone 31N",
            BASEGEOGCRS["WGS 84",
                DATUM["World Geodetic System 1984",
                    ELLIPSOID["WGS 84",6378137,298.257223563]]],
            CONVERSION["UTM zone 31N",
                METHOD["Transverse Mercator",ID["EPSG",9807]],
                PARAMETER["Latitude of natural origin",0],
                PARAMETER["Longitude of natural origin",3],
                PARAMETER["Scale factor at natural origin",0.9996,
                    SCALEUNIT["unity",1]],
                PARAMETER["False easting",500000],
                PARAMETER["False northing",0]],
            CS[Cartesian,2],
                AXIS["(E)",east],
                AXIS["(N)",north],
                UNIT["metre",1],
            ID["EPSG",32631]]"#;
        let crs = parse_crs(wkt).unwrap();
        let Crs::Projected(projected) = &crs else {
            panic!("expected a projected CRS");
        };
        assert_eq!(projected.deriving_conversion().utm_zone(), Some((31, true)));
        assert_eq!(crs.ident().epsg_code(), Some(32631));
    }

    #[test]
    fn test_parse_failures_are_located() {
        // structural violation: no DATUM
        let e = parse_crs("GEOGCS[\"broken\",UNIT[\"degree\",0.017]]").unwrap_err();
        assert!(matches!(e, GeorefError::Parse { .. }));

        // numerically impossible ellipsoid: 1/f in (0, 1]
        let wkt = r#"GEOGCS["bad",
            DATUM["d",SPHEROID["e",6378137,0.5]],
            PRIMEM["Greenwich",0],
            UNIT["degree",0.0174532925199433]]"#;
        assert!(parse_crs(wkt).is_err());
    }

    #[test]
    fn test_unknown_child_nodes_tolerated() {
        let wkt = r#"GEOGCS["WGS 84",
            DATUM["WGS_1984",
                SPHEROID["WGS 84",6378137,298.257223563]],
            PRIMEM["Greenwich",0],
            UNIT["degree",0.0174532925199433],
            METADATA["something","else"]]"#;
        assert!(parse_crs(wkt).is_ok());
    }

    #[test]
    fn test_parse_compound_wkt1() {
        let wkt = r#"COMPD_CS["WGS 84 + height",
            GEOGCS["WGS 84",
                DATUM["WGS_1984",
                    SPHEROID["WGS 84",6378137,298.257223563]],
                PRIMEM["Greenwich",0],
                UNIT["degree",0.0174532925199433]],
            VERT_CS["height",
                VERT_DATUM["mean sea level",2005],
                UNIT["metre",1],
                AXIS["Up",UP]]]"#;
        let crs = parse_crs(wkt).unwrap();
        let Crs::Compound(compound) = &crs else {
            panic!("expected a compound CRS");
        };
        assert_eq!(compound.components().len(), 2);
        assert!(crs.extract_vertical_crs().is_some());
    }
}
