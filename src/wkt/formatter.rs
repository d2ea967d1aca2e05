//! WKT formatter. Builds a node tree for the requested convention and
//! serializes it, pretty-printed by default with a four-space indent,
//! or on a single line.

use super::{format_double, WktConvention, WktNode, WktValue};
use crate::crs::{BoundCrs, CompoundCrs, Crs, GeographicCrs, ProjectedCrs, VerticalCrs};
use crate::cs::{Axis, CoordinateSystem, CsKind};
use crate::datum::{Ellipsoid, GeodeticDatumOrEnsemble, GeodeticFrame, PrimeMeridian};
use crate::error::{GeorefError, Result};
use crate::ident::IdentifiedObject;
use crate::measure::{tolerant_eq, UnitKind, UnitOfMeasure};
use crate::operation::{
    methods, ConcatenatedOperation, Conversion, CoordinateOperation, OperationParameterValue,
    ParameterValue, Transformation,
};

const DEFAULT_INDENT: usize = 4;

/// Format a CRS, multi-line with the default indent.
pub fn format_crs(crs: &Crs, convention: WktConvention) -> Result<String> {
    format_crs_opts(crs, convention, true, DEFAULT_INDENT)
}

pub fn format_crs_opts(
    crs: &Crs,
    convention: WktConvention,
    multiline: bool,
    indent: usize,
) -> Result<String> {
    let ctx = Ctx {
        convention,
        top_level: true,
    };
    let node = crs_node(crs, &ctx)?;
    Ok(serialize(&node, multiline, indent))
}

/// Format a coordinate operation.
pub fn format_operation(op: &CoordinateOperation, convention: WktConvention) -> Result<String> {
    match op {
        CoordinateOperation::Conversion(c) => format_conversion(c, convention),
        CoordinateOperation::Transformation(t) => format_transformation(t, convention),
        CoordinateOperation::Concatenated(c) => format_concatenated(c, convention),
        CoordinateOperation::ProjBased(p) => Err(GeorefError::formatting(format!(
            "PROJ-string-based operation {:?} has no WKT representation",
            p.ident().name()
        ))),
    }
}

#[derive(Clone, Copy)]
struct Ctx {
    convention: WktConvention,
    /// Identifiers are emitted on the outermost node only in the
    /// simplified dialects.
    top_level: bool,
}

impl Ctx {
    fn interior(self) -> Ctx {
        Ctx {
            top_level: false,
            ..self
        }
    }

    fn output_interior_ids(self) -> bool {
        !self.convention.is_simplified()
    }
}

// ---------------------------------------------------------------------
// Serialization

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn serialize(node: &WktNode, multiline: bool, indent: usize) -> String {
    let mut out = String::new();
    write_node(&mut out, node, multiline, indent, 0);
    out
}

fn write_node(out: &mut String, node: &WktNode, multiline: bool, indent: usize, level: usize) {
    out.push_str(&node.keyword);
    out.push('[');
    let mut first = true;
    // The axis list (and a hoisted unit) prints indented under the CS
    // node it follows, although grammatically they are siblings.
    let mut seen_cs = false;
    for child in &node.children {
        if !first {
            out.push(',');
        }
        first = false;
        match child {
            WktValue::Text(t) => out.push_str(&quote(t)),
            WktValue::Number(n) => out.push_str(&format_double(*n)),
            WktValue::Keyword(k) => out.push_str(k),
            WktValue::Node(n) => {
                let bump = seen_cs && (n.keyword_is("AXIS") || is_unit_keyword(&n.keyword));
                let child_level = level + 1 + usize::from(bump);
                if multiline {
                    out.push('\n');
                    out.push_str(&" ".repeat(indent * child_level));
                }
                write_node(out, n, multiline, indent, child_level);
                if n.keyword_is("CS") {
                    seen_cs = true;
                }
            }
        }
    }
    out.push(']');
}

fn is_unit_keyword(keyword: &str) -> bool {
    matches!(
        keyword.to_ascii_uppercase().as_str(),
        "UNIT" | "LENGTHUNIT" | "ANGLEUNIT" | "SCALEUNIT" | "TIMEUNIT" | "PARAMETRICUNIT"
    )
}

// ---------------------------------------------------------------------
// Shared nodes

fn unit_epsg_code(unit: &UnitOfMeasure) -> Option<u32> {
    const TABLE: &[(UnitKind, f64, u32)] = &[
        (UnitKind::Length, 1.0, 9001),
        (UnitKind::Length, 1000.0, 9036),
        (UnitKind::Length, 0.3048, 9002),
        (UnitKind::Length, 12.0 / 39.37, 9003),
        (UnitKind::Angle, 1.0, 9101),
        (UnitKind::Angle, std::f64::consts::PI / 180.0, 9122),
        (UnitKind::Angle, std::f64::consts::PI / 200.0, 9105),
        (UnitKind::Angle, std::f64::consts::PI / 648000.0, 9104),
        (UnitKind::Scale, 1.0, 9201),
        (UnitKind::Scale, 1e-6, 9202),
        (UnitKind::Time, 1.0, 1040),
        (UnitKind::Time, 31556925.445, 1029),
    ];
    TABLE
        .iter()
        .find(|(kind, factor, _)| *kind == unit.kind() && tolerant_eq(*factor, unit.to_si()))
        .map(|(_, _, code)| *code)
}

fn id_value(code: &str) -> WktValue {
    match code.parse::<i64>() {
        Ok(n) => WktValue::Number(n as f64),
        Err(_) => WktValue::Text(code.to_string()),
    }
}

/// `ID[codespace, code]` (WKT2) or `AUTHORITY["codespace", "code"]`
/// (WKT1), from the object's first identifier.
fn id_node(ident: &IdentifiedObject, ctx: &Ctx) -> Option<WktNode> {
    let id = ident.identifiers().first()?;
    let codespace = id.codespace()?;
    let mut node = if ctx.convention.is_wkt2() {
        let mut n = WktNode::new("ID");
        n.children.push(WktValue::Text(codespace.to_string()));
        n.children.push(id_value(id.code()));
        n
    } else {
        let mut n = WktNode::new("AUTHORITY");
        n.children.push(WktValue::Text(codespace.to_string()));
        n.children.push(WktValue::Text(id.code().to_string()));
        n
    };
    if let Some(version) = id.version() {
        node.children.push(WktValue::Text(version.to_string()));
    }
    Some(node)
}

fn unit_node(unit: &UnitOfMeasure, ctx: &Ctx, with_id: bool) -> WktNode {
    let keyword = if !ctx.convention.is_wkt2() || ctx.convention.is_simplified() {
        "UNIT"
    } else {
        match unit.kind() {
            UnitKind::Length => "LENGTHUNIT",
            UnitKind::Angle => "ANGLEUNIT",
            UnitKind::Scale => "SCALEUNIT",
            UnitKind::Time => "TIMEUNIT",
            UnitKind::Parametric => "PARAMETRICUNIT",
            UnitKind::None => "UNIT",
        }
    };
    let mut node = WktNode::new(keyword);
    node.children.push(WktValue::Text(unit.name().to_string()));
    node.children.push(WktValue::Number(unit.to_si()));
    if with_id && !ctx.convention.is_simplified() {
        if let Some(code) = unit_epsg_code(unit) {
            let ident = IdentifiedObject::named(unit.name().to_string()).with_epsg(code);
            if let Some(id) = id_node(&ident, ctx) {
                node.children.push(WktValue::Node(id));
            }
        }
    }
    node
}

/// GDAL-era datum names: a handful of datums have well-known WKT1
/// spellings; everything else gets non-alphanumerics folded to '_'.
fn morphed_datum_name(ident: &IdentifiedObject) -> String {
    match ident.epsg_code() {
        Some(6326) => return "WGS_1984".to_string(),
        Some(6322) => return "WGS_1972".to_string(),
        _ => {}
    }
    let mut out = String::with_capacity(ident.name().len());
    let mut last_was_sep = true;
    for ch in ident.name().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

fn ellipsoid_node(ellipsoid: &Ellipsoid, ctx: &Ctx) -> WktNode {
    let keyword = if ctx.convention.is_wkt2() {
        "ELLIPSOID"
    } else {
        "SPHEROID"
    };
    let mut node = WktNode::new(keyword);
    node.children
        .push(WktValue::Text(ellipsoid.name().to_string()));
    node.children
        .push(WktValue::Number(ellipsoid.semi_major_axis().value()));
    node.children
        .push(WktValue::Number(ellipsoid.inverse_flattening().si_value()));
    if ctx.convention.is_wkt2() && !ctx.convention.is_simplified() {
        node.children.push(WktValue::Node(unit_node(
            ellipsoid.semi_major_axis().unit(),
            ctx,
            true,
        )));
    }
    if ctx.output_interior_ids() {
        if let Some(id) = id_node(ellipsoid.ident(), ctx) {
            node.children.push(WktValue::Node(id));
        }
    }
    node
}

fn datum_node(
    datum: &GeodeticDatumOrEnsemble,
    ctx: &Ctx,
    towgs84: Option<&[f64; 7]>,
) -> WktNode {
    match datum {
        GeodeticDatumOrEnsemble::Ensemble(ensemble)
            if ctx.convention.use_2018_keywords() && ctx.convention.is_wkt2() =>
        {
            let mut node = WktNode::new("ENSEMBLE");
            node.children
                .push(WktValue::Text(ensemble.name().to_string()));
            for member in ensemble.members() {
                let mut m = WktNode::new("MEMBER");
                m.children.push(WktValue::Text(member.name().to_string()));
                if ctx.output_interior_ids() {
                    if let Some(id) = id_node(member.ident(), ctx) {
                        m.children.push(WktValue::Node(id));
                    }
                }
                node.children.push(WktValue::Node(m));
            }
            node.children.push(WktValue::Node(ellipsoid_node(
                ensemble.members()[0].ellipsoid(),
                ctx,
            )));
            let mut acc = WktNode::new("ENSEMBLEACCURACY");
            acc.children
                .push(WktValue::Number(ensemble.accuracy().value()));
            node.children.push(WktValue::Node(acc));
            if ctx.output_interior_ids() {
                if let Some(id) = id_node(ensemble.ident(), ctx) {
                    node.children.push(WktValue::Node(id));
                }
            }
            node
        }
        _ => {
            let frame = datum.representative();
            let mut node = WktNode::new("DATUM");
            node.children
                .push(WktValue::Text(morphed_datum_name(datum.ident())));
            node.children
                .push(WktValue::Node(ellipsoid_node(frame.ellipsoid(), ctx)));
            if let Some(params) = towgs84 {
                let mut t = WktNode::new("TOWGS84");
                for p in params {
                    t.children.push(WktValue::Number(*p));
                }
                node.children.push(WktValue::Node(t));
            }
            if let Some(anchor) = frame.anchor() {
                if ctx.convention.is_wkt2() {
                    let mut a = WktNode::new("ANCHOR");
                    a.children.push(WktValue::Text(anchor.to_string()));
                    node.children.push(WktValue::Node(a));
                }
            }
            if ctx.output_interior_ids() {
                if let Some(id) = id_node(datum.ident(), ctx) {
                    node.children.push(WktValue::Node(id));
                }
            }
            node
        }
    }
}

fn dynamic_node(frame: &GeodeticFrame) -> Option<WktNode> {
    let epoch = frame.frame_reference_epoch()?;
    let mut node = WktNode::new("DYNAMIC");
    let mut fe = WktNode::new("FRAMEEPOCH");
    fe.children.push(WktValue::Number(epoch));
    node.children.push(WktValue::Node(fe));
    Some(node)
}

/// A WKT1 PRIMEM is always written in degrees; WKT2 keeps the native
/// unit. The simplified dialect omits a Greenwich meridian entirely.
fn primem_node(pm: &PrimeMeridian, ctx: &Ctx) -> Option<WktNode> {
    if ctx.convention.is_simplified() && pm.is_greenwich() {
        return None;
    }
    let mut node = WktNode::new("PRIMEM");
    node.children.push(WktValue::Text(pm.name().to_string()));
    if ctx.convention.is_wkt2() {
        node.children.push(WktValue::Number(pm.longitude().value()));
        if !ctx.convention.is_simplified() {
            node.children
                .push(WktValue::Node(unit_node(pm.longitude().unit(), ctx, true)));
        }
    } else {
        node.children.push(WktValue::Number(pm.longitude().degrees()));
    }
    if ctx.output_interior_ids() {
        if let Some(id) = id_node(pm.ident(), ctx) {
            node.children.push(WktValue::Node(id));
        }
    }
    Some(node)
}

fn wkt2_axis_display_name(axis: &Axis) -> String {
    let canonical = [
        "Latitude",
        "Longitude",
        "Ellipsoidal height",
        "Gravity-related height",
        "Time",
    ];
    if canonical
        .iter()
        .any(|c| c.eq_ignore_ascii_case(axis.name()))
    {
        return axis.name().to_lowercase();
    }
    if !axis.abbreviation().is_empty() {
        return format!("({})", axis.abbreviation());
    }
    axis.name().to_string()
}

fn axis_nodes(cs: &CoordinateSystem, ctx: &Ctx) -> Vec<WktNode> {
    let axes = cs.axes();
    let shared_unit = ctx.convention.is_simplified()
        && axes.len() > 1
        && axes.windows(2).all(|w| w[0].unit() == w[1].unit());
    let mut nodes = Vec::new();
    for (i, axis) in axes.iter().enumerate() {
        let mut node = WktNode::new("AXIS");
        if ctx.convention.is_wkt2() {
            node.children
                .push(WktValue::Text(wkt2_axis_display_name(axis)));
            node.children
                .push(WktValue::Keyword(axis.direction().wkt_name().to_string()));
            if let Some(meridian) = axis.meridian() {
                let mut m = WktNode::new("MERIDIAN");
                m.children
                    .push(WktValue::Number(meridian.longitude.value()));
                m.children.push(WktValue::Node(unit_node(
                    meridian.longitude.unit(),
                    ctx,
                    false,
                )));
                node.children.push(WktValue::Node(m));
            }
            if axes.len() > 1 && !ctx.convention.is_simplified() {
                let mut order = WktNode::new("ORDER");
                order.children.push(WktValue::Number((i + 1) as f64));
                node.children.push(WktValue::Node(order));
            }
            if !shared_unit && !ctx.convention.is_simplified() {
                node.children
                    .push(WktValue::Node(unit_node(axis.unit(), ctx, true)));
            } else if !shared_unit && ctx.convention.is_simplified() {
                node.children
                    .push(WktValue::Node(unit_node(axis.unit(), ctx, false)));
            }
        } else {
            // WKT1: capitalized name, upper-case direction keyword
            node.children
                .push(WktValue::Text(axis.name().to_string()));
            node.children.push(WktValue::Keyword(
                axis.direction().wkt_name().to_uppercase(),
            ));
        }
        nodes.push(node);
    }
    if shared_unit && !axes.is_empty() {
        nodes.push(unit_node(axes[0].unit(), ctx, true));
    }
    nodes
}

fn cs_node(cs: &CoordinateSystem) -> WktNode {
    let mut node = WktNode::new("CS");
    node.children
        .push(WktValue::Keyword(cs.kind().wkt_name().to_string()));
    node.children.push(WktValue::Number(cs.axes().len() as f64));
    node
}

fn scope_area_nodes(ident: &IdentifiedObject, ctx: &Ctx) -> Vec<WktNode> {
    if !ctx.convention.is_wkt2() || ctx.convention.is_simplified() || !ctx.top_level {
        return Vec::new();
    }
    let mut inner = Vec::new();
    match ident.scope() {
        Some(scope) => {
            let mut s = WktNode::new("SCOPE");
            s.children.push(WktValue::Text(scope.to_string()));
            inner.push(s);
        }
        None if ctx.convention.use_2018_keywords() && ident.domain_of_validity().is_some() => {
            let mut s = WktNode::new("SCOPE");
            s.children.push(WktValue::Text("unknown".to_string()));
            inner.push(s);
        }
        None => {}
    }
    if let Some(extent) = ident.domain_of_validity() {
        if let Some(description) = &extent.description {
            let mut a = WktNode::new("AREA");
            a.children.push(WktValue::Text(description.clone()));
            inner.push(a);
        }
        if let Some(bbox) = extent.bbox() {
            let mut b = WktNode::new("BBOX");
            for v in [bbox.south, bbox.west, bbox.north, bbox.east] {
                b.children.push(WktValue::Number(v));
            }
            inner.push(b);
        }
        for vertical in &extent.vertical_elements {
            let mut v = WktNode::new("VERTICALEXTENT");
            v.children.push(WktValue::Number(vertical.minimum));
            v.children.push(WktValue::Number(vertical.maximum));
            v.children
                .push(WktValue::Node(unit_node(&vertical.unit, ctx, false)));
            inner.push(v);
        }
        for temporal in &extent.temporal_elements {
            let mut t = WktNode::new("TIMEEXTENT");
            t.children.push(WktValue::Text(temporal.start.clone()));
            t.children.push(WktValue::Text(temporal.stop.clone()));
            inner.push(t);
        }
    }
    if inner.is_empty() {
        return Vec::new();
    }
    if ctx.convention.use_2018_keywords() {
        let mut usage = WktNode::new("USAGE");
        usage.children.extend(inner.into_iter().map(WktValue::Node));
        vec![usage]
    } else {
        inner
    }
}

// ---------------------------------------------------------------------
// CRS nodes

fn crs_node(crs: &Crs, ctx: &Ctx) -> Result<WktNode> {
    match crs {
        Crs::Geographic(c) => Ok(geographic_node(c, ctx, None)),
        Crs::Geodetic(c) => Ok(geodetic_node(
            c.ident(),
            c.datum(),
            c.cs(),
            ctx,
            None,
            false,
        )),
        Crs::Projected(c) => projected_node(c, ctx, None),
        Crs::Vertical(c) => Ok(vertical_node(c, ctx)),
        Crs::Compound(c) => compound_node(c, ctx),
        Crs::Bound(c) => bound_node(c, ctx),
        Crs::Temporal(c) => {
            if !ctx.convention.is_wkt2() {
                return Err(GeorefError::formatting(format!(
                    "temporal CRS {:?} has no WKT1 representation",
                    c.ident().name()
                )));
            }
            Ok(temporal_node(c, ctx))
        }
        Crs::Engineering(c) => Ok(engineering_node(c, ctx)),
        Crs::Parametric(c) => {
            if !ctx.convention.is_wkt2() {
                return Err(GeorefError::formatting(format!(
                    "parametric CRS {:?} has no WKT1 representation",
                    c.ident().name()
                )));
            }
            let mut node = WktNode::new("PARAMETRICCRS");
            node.children
                .push(WktValue::Text(c.ident().name().to_string()));
            let mut datum = WktNode::new("PDATUM");
            datum
                .children
                .push(WktValue::Text(c.datum().ident().name().to_string()));
            node.children.push(WktValue::Node(datum));
            node.children.push(WktValue::Node(cs_node(c.cs())));
            for axis in axis_nodes(c.cs(), ctx) {
                node.children.push(WktValue::Node(axis));
            }
            if let Some(id) = id_node(c.ident(), ctx) {
                node.children.push(WktValue::Node(id));
            }
            Ok(node)
        }
        Crs::Derived(c) => {
            // Only the projected specialization has a WKT rendering here
            Err(GeorefError::formatting(format!(
                "derived CRS {:?} is not representable in WKT",
                c.ident().name()
            )))
        }
    }
}

fn geographic_node(crs: &GeographicCrs, ctx: &Ctx, towgs84: Option<&[f64; 7]>) -> WktNode {
    geodetic_node(crs.ident(), crs.datum(), crs.cs(), ctx, towgs84, true)
}

fn geodetic_node(
    ident: &IdentifiedObject,
    datum: &GeodeticDatumOrEnsemble,
    cs: &CoordinateSystem,
    ctx: &Ctx,
    towgs84: Option<&[f64; 7]>,
    geographic: bool,
) -> WktNode {
    let keyword = if !ctx.convention.is_wkt2() {
        if geographic {
            "GEOGCS"
        } else {
            "GEOCCS"
        }
    } else if geographic && ctx.convention.use_2018_keywords() {
        "GEOGCRS"
    } else {
        "GEODCRS"
    };
    let inner = ctx.interior();
    let mut node = WktNode::new(keyword);
    node.children.push(WktValue::Text(ident.name().to_string()));

    if ctx.convention.is_wkt2() && ctx.convention.use_2018_keywords() {
        if let Some(d) = dynamic_node(datum.representative()) {
            node.children.push(WktValue::Node(d));
        }
    }
    node.children
        .push(WktValue::Node(datum_node(datum, &inner, towgs84)));
    let pm = datum.representative().prime_meridian();
    if ctx.convention.is_wkt2() {
        if let Some(p) = primem_node(pm, &inner) {
            node.children.push(WktValue::Node(p));
        }
        node.children.push(WktValue::Node(cs_node(cs)));
        for axis in axis_nodes(cs, &inner) {
            node.children.push(WktValue::Node(axis));
        }
    } else {
        if let Some(p) = primem_node(pm, &inner) {
            node.children.push(WktValue::Node(p));
        }
        // WKT1 hoists the (shared) angular unit before the axis list
        if let Some(axis) = cs.axes().first() {
            node.children
                .push(WktValue::Node(unit_node(axis.unit(), &inner, true)));
        }
        for axis in axis_nodes(cs, &inner) {
            node.children.push(WktValue::Node(axis));
        }
    }
    for extra in scope_area_nodes(ident, ctx) {
        node.children.push(WktValue::Node(extra));
    }
    if let Some(id) = id_node(ident, ctx) {
        node.children.push(WktValue::Node(id));
    }
    node
}

fn parameter_nodes(
    values: &[OperationParameterValue],
    method_code: Option<u16>,
    ctx: &Ctx,
) -> Result<Vec<WktNode>> {
    let mut nodes = Vec::new();
    for value in values {
        let param = value.parameter();
        if ctx.convention.is_wkt2() {
            let keyword = match value.value() {
                ParameterValue::Filename(_) => "PARAMETERFILE",
                _ => "PARAMETER",
            };
            let mut node = WktNode::new(keyword);
            node.children
                .push(WktValue::Text(param.name().to_string()));
            match value.value() {
                ParameterValue::Measure(m) => {
                    node.children.push(WktValue::Number(m.value()));
                    if !ctx.convention.is_simplified() {
                        node.children
                            .push(WktValue::Node(unit_node(m.unit(), ctx, true)));
                    }
                }
                ParameterValue::Integer(i) => node.children.push(WktValue::Number(*i as f64)),
                ParameterValue::Boolean(b) => node
                    .children
                    .push(WktValue::Keyword(if *b { "TRUE" } else { "FALSE" }.to_string())),
                ParameterValue::String(s) => node.children.push(WktValue::Text(s.clone())),
                ParameterValue::Filename(f) => node.children.push(WktValue::Text(f.clone())),
            }
            if ctx.output_interior_ids() {
                if let Some(id) = id_node(param.ident(), ctx) {
                    node.children.push(WktValue::Node(id));
                }
            }
            nodes.push(node);
        } else {
            let code = param.epsg_code().map(|c| c as u16);
            let name = match (method_code, code) {
                (Some(m), Some(c)) => methods::wkt1_parameter_name(m, c)
                    .map(str::to_string)
                    .unwrap_or_else(|| param.name().to_string()),
                _ => param.name().to_string(),
            };
            let mut node = WktNode::new("PARAMETER");
            node.children.push(WktValue::Text(name));
            match value.value() {
                ParameterValue::Measure(m) => {
                    // WKT1 parameter values: angles in degrees, lengths in
                    // the value's own unit, scales in unity
                    let v = match m.unit().kind() {
                        UnitKind::Angle => m.si_value().to_degrees(),
                        _ => m.value(),
                    };
                    node.children.push(WktValue::Number(v));
                }
                ParameterValue::Integer(i) => node.children.push(WktValue::Number(*i as f64)),
                ParameterValue::Filename(f) | ParameterValue::String(f) => {
                    node.children.push(WktValue::Text(f.clone()))
                }
                ParameterValue::Boolean(b) => node
                    .children
                    .push(WktValue::Keyword(if *b { "TRUE" } else { "FALSE" }.to_string())),
            }
            nodes.push(node);
        }
    }
    Ok(nodes)
}

fn method_node(conversion: &Conversion, ctx: &Ctx) -> WktNode {
    let mut node = WktNode::new("METHOD");
    node.children
        .push(WktValue::Text(conversion.method().name().to_string()));
    if ctx.output_interior_ids() {
        if let Some(id) = id_node(conversion.method().ident(), ctx) {
            node.children.push(WktValue::Node(id));
        }
    }
    node
}

fn conversion_node(conversion: &Conversion, ctx: &Ctx) -> Result<WktNode> {
    let mut node = WktNode::new("CONVERSION");
    node.children
        .push(WktValue::Text(conversion.name().to_string()));
    node.children
        .push(WktValue::Node(method_node(conversion, ctx)));
    for p in parameter_nodes(conversion.values(), conversion.method().epsg_code(), ctx)? {
        node.children.push(WktValue::Node(p));
    }
    if ctx.output_interior_ids() {
        if let Some(id) = id_node(conversion.ident(), ctx) {
            node.children.push(WktValue::Node(id));
        }
    }
    Ok(node)
}

fn projected_node(crs: &ProjectedCrs, ctx: &Ctx, towgs84: Option<&[f64; 7]>) -> Result<WktNode> {
    let inner = ctx.interior();
    if ctx.convention.is_wkt2() {
        let mut node = WktNode::new("PROJCRS");
        node.children
            .push(WktValue::Text(crs.ident().name().to_string()));

        let base = crs.base();
        let base_keyword = if ctx.convention.use_2018_keywords() {
            "BASEGEOGCRS"
        } else {
            "BASEGEODCRS"
        };
        let mut base_node = WktNode::new(base_keyword);
        base_node
            .children
            .push(WktValue::Text(base.ident().name().to_string()));
        node_push_datum_and_pm(&mut base_node, base, &inner);
        // A base CRS in a non-degree angular unit must say so, or the
        // round trip loses the unit.
        let base_unit = base.cs().axes()[0].unit();
        if base_unit != &UnitOfMeasure::DEGREE {
            base_node
                .children
                .push(WktValue::Node(unit_node(base_unit, &inner, true)));
        }
        if ctx.output_interior_ids() {
            if let Some(id) = id_node(base.ident(), &inner) {
                base_node.children.push(WktValue::Node(id));
            }
        }
        node.children.push(WktValue::Node(base_node));

        node.children
            .push(WktValue::Node(conversion_node(crs.deriving_conversion(), &inner)?));
        node.children.push(WktValue::Node(cs_node(crs.cs())));
        for axis in axis_nodes(crs.cs(), &inner) {
            node.children.push(WktValue::Node(axis));
        }
        for extra in scope_area_nodes(crs.ident(), ctx) {
            node.children.push(WktValue::Node(extra));
        }
        if let Some(id) = id_node(crs.ident(), ctx) {
            node.children.push(WktValue::Node(id));
        }
        Ok(node)
    } else {
        let conversion = crs.deriving_conversion();
        let method_code = conversion.method().epsg_code();
        let projection_name = method_code.and_then(methods::wkt1_projection_name);
        let Some(projection_name) = projection_name else {
            return Err(GeorefError::formatting(format!(
                "projection method {:?} has no WKT1 name",
                conversion.method().name()
            )));
        };
        let mut node = WktNode::new("PROJCS");
        node.children
            .push(WktValue::Text(crs.ident().name().to_string()));
        node.children
            .push(WktValue::Node(geographic_node(crs.base(), &inner, towgs84)));
        let mut projection = WktNode::new("PROJECTION");
        projection
            .children
            .push(WktValue::Text(projection_name.to_string()));
        node.children.push(WktValue::Node(projection));
        for p in parameter_nodes(conversion.values(), method_code, &inner)? {
            node.children.push(WktValue::Node(p));
        }
        if let Some(axis) = crs.cs().axes().first() {
            node.children
                .push(WktValue::Node(unit_node(axis.unit(), &inner, true)));
        }
        for axis in axis_nodes(crs.cs(), &inner) {
            node.children.push(WktValue::Node(axis));
        }
        if let Some(ext) = crs.ident().extension_proj4() {
            let mut e = WktNode::new("EXTENSION");
            e.children.push(WktValue::Text("PROJ4".to_string()));
            e.children.push(WktValue::Text(ext.to_string()));
            node.children.push(WktValue::Node(e));
        }
        if let Some(id) = id_node(crs.ident(), ctx) {
            node.children.push(WktValue::Node(id));
        }
        Ok(node)
    }
}

fn node_push_datum_and_pm(node: &mut WktNode, base: &GeographicCrs, ctx: &Ctx) {
    node.children
        .push(WktValue::Node(datum_node(base.datum(), ctx, None)));
    if let Some(p) = primem_node(base.prime_meridian(), ctx) {
        if !base.prime_meridian().is_greenwich() || !ctx.convention.is_wkt2() {
            node.children.push(WktValue::Node(p));
        }
    }
}

fn vertical_node(crs: &VerticalCrs, ctx: &Ctx) -> WktNode {
    let inner = ctx.interior();
    if ctx.convention.is_wkt2() {
        let mut node = WktNode::new("VERTCRS");
        node.children
            .push(WktValue::Text(crs.ident().name().to_string()));
        let mut datum = WktNode::new("VDATUM");
        datum
            .children
            .push(WktValue::Text(crs.datum().ident().name().to_string()));
        if inner.output_interior_ids() {
            if let Some(id) = id_node(crs.datum().ident(), &inner) {
                datum.children.push(WktValue::Node(id));
            }
        }
        node.children.push(WktValue::Node(datum));
        node.children.push(WktValue::Node(cs_node(crs.cs())));
        for axis in axis_nodes(crs.cs(), &inner) {
            node.children.push(WktValue::Node(axis));
        }
        if let Some(id) = id_node(crs.ident(), ctx) {
            node.children.push(WktValue::Node(id));
        }
        node
    } else {
        let mut node = WktNode::new("VERT_CS");
        node.children
            .push(WktValue::Text(crs.ident().name().to_string()));
        let mut datum = WktNode::new("VERT_DATUM");
        datum
            .children
            .push(WktValue::Text(crs.datum().ident().name().to_string()));
        datum.children.push(WktValue::Number(2005.0));
        node.children.push(WktValue::Node(datum));
        if let Some(axis) = crs.cs().axes().first() {
            node.children
                .push(WktValue::Node(unit_node(axis.unit(), &inner, true)));
        }
        for axis in axis_nodes(crs.cs(), &inner) {
            node.children.push(WktValue::Node(axis));
        }
        if let Some(id) = id_node(crs.ident(), ctx) {
            node.children.push(WktValue::Node(id));
        }
        node
    }
}

fn temporal_node(crs: &crate::crs::TemporalCrs, ctx: &Ctx) -> WktNode {
    let inner = ctx.interior();
    let mut node = WktNode::new("TIMECRS");
    node.children
        .push(WktValue::Text(crs.ident().name().to_string()));
    let mut datum = WktNode::new("TDATUM");
    datum
        .children
        .push(WktValue::Text(crs.datum().ident().name().to_string()));
    if ctx.convention.use_2018_keywords() {
        let mut cal = WktNode::new("CALENDAR");
        cal.children
            .push(WktValue::Text(crs.datum().calendar().to_string()));
        datum.children.push(WktValue::Node(cal));
    }
    if !crs.datum().origin().is_empty() {
        let mut origin = WktNode::new("TIMEORIGIN");
        origin
            .children
            .push(WktValue::Text(crs.datum().origin().to_string()));
        datum.children.push(WktValue::Node(origin));
    }
    node.children.push(WktValue::Node(datum));
    node.children.push(WktValue::Node(cs_node(crs.cs())));
    for axis in axis_nodes(crs.cs(), &inner) {
        node.children.push(WktValue::Node(axis));
    }
    if let Some(id) = id_node(crs.ident(), ctx) {
        node.children.push(WktValue::Node(id));
    }
    node
}

fn engineering_node(crs: &crate::crs::EngineeringCrs, ctx: &Ctx) -> WktNode {
    let inner = ctx.interior();
    if ctx.convention.is_wkt2() {
        let mut node = WktNode::new("ENGCRS");
        node.children
            .push(WktValue::Text(crs.ident().name().to_string()));
        let mut datum = WktNode::new("EDATUM");
        datum
            .children
            .push(WktValue::Text(crs.datum().ident().name().to_string()));
        node.children.push(WktValue::Node(datum));
        node.children.push(WktValue::Node(cs_node(crs.cs())));
        for axis in axis_nodes(crs.cs(), &inner) {
            node.children.push(WktValue::Node(axis));
        }
        if let Some(id) = id_node(crs.ident(), ctx) {
            node.children.push(WktValue::Node(id));
        }
        node
    } else {
        let mut node = WktNode::new("LOCAL_CS");
        node.children
            .push(WktValue::Text(crs.ident().name().to_string()));
        let mut datum = WktNode::new("LOCAL_DATUM");
        datum
            .children
            .push(WktValue::Text(crs.datum().ident().name().to_string()));
        datum.children.push(WktValue::Number(0.0));
        node.children.push(WktValue::Node(datum));
        if let Some(axis) = crs.cs().axes().first() {
            node.children
                .push(WktValue::Node(unit_node(axis.unit(), &inner, true)));
        }
        for axis in axis_nodes(crs.cs(), &inner) {
            node.children.push(WktValue::Node(axis));
        }
        node
    }
}

fn compound_node(crs: &CompoundCrs, ctx: &Ctx) -> Result<WktNode> {
    let inner = ctx.interior();
    if ctx.convention.is_wkt2() {
        let mut node = WktNode::new("COMPOUNDCRS");
        node.children
            .push(WktValue::Text(crs.ident().name().to_string()));
        for component in crs.components() {
            node.children.push(WktValue::Node(crs_node(component, &inner)?));
        }
        if let Some(id) = id_node(crs.ident(), ctx) {
            node.children.push(WktValue::Node(id));
        }
        Ok(node)
    } else {
        // WKT1 COMPD_CS only carries horizontal + vertical
        if crs.components().len() != 2
            || !matches!(crs.components()[1].as_ref(), Crs::Vertical(_))
        {
            return Err(GeorefError::formatting(format!(
                "compound CRS {:?} is not representable in WKT1: \
                 only a horizontal + vertical pair is",
                crs.ident().name()
            )));
        }
        let mut node = WktNode::new("COMPD_CS");
        node.children
            .push(WktValue::Text(crs.ident().name().to_string()));
        for component in crs.components() {
            node.children.push(WktValue::Node(crs_node(component, &inner)?));
        }
        if let Some(id) = id_node(crs.ident(), ctx) {
            node.children.push(WktValue::Node(id));
        }
        Ok(node)
    }
}

fn bound_node(crs: &BoundCrs, ctx: &Ctx) -> Result<WktNode> {
    let inner = ctx.interior();
    if ctx.convention.is_wkt2() {
        let mut node = WktNode::new("BOUNDCRS");
        let mut source = WktNode::new("SOURCECRS");
        source
            .children
            .push(WktValue::Node(crs_node(crs.base(), &inner)?));
        node.children.push(WktValue::Node(source));
        let mut target = WktNode::new("TARGETCRS");
        target
            .children
            .push(WktValue::Node(crs_node(crs.hub(), &inner)?));
        node.children.push(WktValue::Node(target));

        let t = crs.transformation();
        let mut transf = WktNode::new("ABRIDGEDTRANSFORMATION");
        transf.children.push(WktValue::Text(t.name().to_string()));
        let mut method = WktNode::new("METHOD");
        method
            .children
            .push(WktValue::Text(t.method().name().to_string()));
        if inner.output_interior_ids() {
            if let Some(id) = id_node(t.method().ident(), &inner) {
                method.children.push(WktValue::Node(id));
            }
        }
        transf.children.push(WktValue::Node(method));
        for p in parameter_nodes(t.values(), t.method().epsg_code(), &inner)? {
            transf.children.push(WktValue::Node(p));
        }
        node.children.push(WktValue::Node(transf));
        Ok(node)
    } else {
        // WKT1 can only say TOWGS84: the transformation must be a
        // Helmert to WGS 84 with at most seven parameters.
        let hub_is_wgs84 = crs
            .hub()
            .extract_geographic_crs()
            .map(|g| g.ident().epsg_code() == Some(4326))
            .unwrap_or(false);
        let helmert = crs.transformation().helmert_params();
        let (Some(h), true) = (helmert, hub_is_wgs84) else {
            return Err(GeorefError::formatting(format!(
                "bound CRS {:?} cannot be expressed in WKT1: \
                 only a Helmert transformation to WGS 84 can",
                crs.ident().name()
            )));
        };
        let params = [h.x, h.y, h.z, h.rx, h.ry, h.rz, h.s];
        match crs.base().as_ref() {
            Crs::Geographic(g) => Ok(geographic_node(g, ctx, Some(&params))),
            Crs::Projected(p) => projected_node(p, ctx, Some(&params)),
            other => Err(GeorefError::formatting(format!(
                "bound CRS over {:?} is not representable in WKT1",
                other.name()
            ))),
        }
    }
}

// ---------------------------------------------------------------------
// Operations

fn format_conversion(conversion: &Conversion, convention: WktConvention) -> Result<String> {
    let ctx = Ctx {
        convention,
        top_level: true,
    };
    if convention.is_wkt2() {
        let node = conversion_node(conversion, &ctx)?;
        return Ok(serialize(&node, true, DEFAULT_INDENT));
    }
    // The WKT1 rendering of a standalone conversion is the PROJECTION /
    // PARAMETER fragment that would appear inside a PROJCS.
    let method_code = conversion.method().epsg_code();
    let name = method_code
        .and_then(methods::wkt1_projection_name)
        .ok_or_else(|| {
            GeorefError::formatting(format!(
                "conversion method {:?} has no WKT1 name",
                conversion.method().name()
            ))
        })?;
    let mut projection = WktNode::new("PROJECTION");
    projection
        .children
        .push(WktValue::Text(name.to_string()));
    let mut pieces = vec![serialize(&projection, true, DEFAULT_INDENT)];
    for p in parameter_nodes(conversion.values(), method_code, &ctx.interior())? {
        pieces.push(serialize(&p, true, DEFAULT_INDENT));
    }
    Ok(pieces.join(",\n"))
}

fn format_transformation(t: &Transformation, convention: WktConvention) -> Result<String> {
    if !convention.is_wkt2() {
        return Err(GeorefError::formatting(format!(
            "transformation {:?} has no WKT1 representation",
            t.name()
        )));
    }
    let ctx = Ctx {
        convention,
        top_level: true,
    };
    let inner = ctx.interior();
    let mut node = WktNode::new("COORDINATEOPERATION");
    node.children.push(WktValue::Text(t.name().to_string()));
    let mut source = WktNode::new("SOURCECRS");
    source
        .children
        .push(WktValue::Node(crs_node(t.source_crs(), &inner)?));
    node.children.push(WktValue::Node(source));
    let mut target = WktNode::new("TARGETCRS");
    target
        .children
        .push(WktValue::Node(crs_node(t.target_crs(), &inner)?));
    node.children.push(WktValue::Node(target));
    let mut method = WktNode::new("METHOD");
    method
        .children
        .push(WktValue::Text(t.method().name().to_string()));
    if inner.output_interior_ids() {
        if let Some(id) = id_node(t.method().ident(), &inner) {
            method.children.push(WktValue::Node(id));
        }
    }
    node.children.push(WktValue::Node(method));
    for p in parameter_nodes(t.values(), t.method().epsg_code(), &inner)? {
        node.children.push(WktValue::Node(p));
    }
    if let Some(interp) = t.interpolation_crs() {
        let mut i = WktNode::new("INTERPOLATIONCRS");
        i.children
            .push(WktValue::Node(crs_node(interp, &inner)?));
        node.children.push(WktValue::Node(i));
    }
    if let Some(acc) = t.accuracies().first() {
        let mut a = WktNode::new("OPERATIONACCURACY");
        a.children.push(WktValue::Number(acc.value()));
        node.children.push(WktValue::Node(a));
    }
    if let Some(id) = id_node(t.ident(), &ctx) {
        node.children.push(WktValue::Node(id));
    }
    Ok(serialize(&node, true, DEFAULT_INDENT))
}

fn format_concatenated(c: &ConcatenatedOperation, convention: WktConvention) -> Result<String> {
    if !convention.is_wkt2() || !convention.use_2018_keywords() {
        return Err(GeorefError::formatting(format!(
            "concatenated operation {:?} requires WKT2:2018",
            c.ident().name()
        )));
    }
    let ctx = Ctx {
        convention,
        top_level: true,
    };
    let inner = ctx.interior();
    let mut node = WktNode::new("CONCATENATEDOPERATION");
    node.children
        .push(WktValue::Text(c.ident().name().to_string()));
    if let Some(source) = c.source_crs() {
        let mut s = WktNode::new("SOURCECRS");
        s.children.push(WktValue::Node(crs_node(source, &inner)?));
        node.children.push(WktValue::Node(s));
    }
    if let Some(target) = c.target_crs() {
        let mut t = WktNode::new("TARGETCRS");
        t.children.push(WktValue::Node(crs_node(target, &inner)?));
        node.children.push(WktValue::Node(t));
    }
    for step in c.steps() {
        let mut s = WktNode::new("STEP");
        let rendered = format_operation(step, convention)?;
        let parsed = super::tokenizer::tokenize(&rendered)
            .map_err(|e| GeorefError::formatting(e.to_string()))?;
        s.children.push(WktValue::Node(parsed));
        node.children.push(WktValue::Node(s));
    }
    Ok(serialize(&node, true, DEFAULT_INDENT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::GeographicCrs;
    use crate::ident::Criterion;
    use crate::wkt::parse_crs;
    use std::sync::Arc;

    fn wgs84() -> Crs {
        Crs::Geographic(GeographicCrs::epsg_4326())
    }

    #[test]
    fn test_wkt1_gdal_4326_shape() {
        let wkt = format_crs(&wgs84(), WktConvention::Wkt1Gdal).unwrap();
        assert!(wkt.starts_with("GEOGCS[\"WGS 84\",\n    DATUM[\"WGS_1984\",\n"));
        assert!(wkt.contains("SPHEROID[\"WGS 84\",6378137,298.257223563,"));
        assert!(wkt.contains("PRIMEM[\"Greenwich\",0,"));
        assert!(wkt.contains("UNIT[\"degree\",0.0174532925199433,"));
        assert!(wkt.contains("AXIS[\"Latitude\",NORTH]"));
        assert!(wkt.contains("AXIS[\"Longitude\",EAST]"));
        assert!(wkt.ends_with("AUTHORITY[\"EPSG\",\"4326\"]]"));
    }

    #[test]
    fn test_wkt1_round_trip_4326() {
        let original = wgs84();
        let wkt = format_crs(&original, WktConvention::Wkt1Gdal).unwrap();
        let reparsed = parse_crs(&wkt).unwrap();
        assert!(reparsed.is_equivalent_to(&original, Criterion::Equivalent));
    }

    #[test]
    fn test_wkt2_2018_round_trip_4326() {
        let original = wgs84();
        let wkt = format_crs(&original, WktConvention::Wkt2_2018).unwrap();
        assert!(wkt.starts_with("GEOGCRS[\"WGS 84\""));
        assert!(wkt.contains("CS[ellipsoidal,2]"));
        assert!(wkt.contains("ORDER[1]"));
        let reparsed = parse_crs(&wkt).unwrap();
        assert!(reparsed.is_equivalent_to(&original, Criterion::Equivalent));
    }

    #[test]
    fn test_wkt2_2015_keyword_differs() {
        let wkt = format_crs(&wgs84(), WktConvention::Wkt2_2015).unwrap();
        assert!(wkt.starts_with("GEODCRS[\"WGS 84\""));
    }

    #[test]
    fn test_simplified_drops_units_and_greenwich() {
        let wkt = format_crs(&wgs84(), WktConvention::Wkt2_2015Simplified).unwrap();
        assert!(!wkt.contains("PRIMEM"));
        assert!(!wkt.contains("ORDER"));
        // Shared unit hoisted after the axes once
        assert_eq!(wkt.matches("UNIT[").count(), 1);
        // Interior ids dropped, top-level id kept
        assert_eq!(wkt.matches("ID[").count(), 1);
        let reparsed = parse_crs(&wkt).unwrap();
        assert!(reparsed.is_equivalent_to(&wgs84(), Criterion::Equivalent));
    }

    #[test]
    fn test_single_line_mode() {
        let wkt = format_crs_opts(&wgs84(), WktConvention::Wkt2_2015Simplified, false, 4).unwrap();
        assert!(!wkt.contains('\n'));
        assert!(parse_crs(&wkt).is_ok());
    }

    #[test]
    fn test_wkt1_4807_prime_meridian_in_degrees() {
        let crs = Crs::Geographic(GeographicCrs::epsg_4807());
        let wkt = format_crs(&crs, WktConvention::Wkt1Gdal).unwrap();
        assert!(wkt.contains("PRIMEM[\"Paris\",2.33722917,"));
        assert!(wkt.contains("UNIT[\"grad\",0.015707963267949,"));
        let reparsed = parse_crs(&wkt).unwrap();
        assert!(reparsed.is_equivalent_to(&crs, Criterion::Equivalent));
    }

    #[test]
    fn test_wkt2_4807_prime_meridian_native_unit() {
        let crs = Crs::Geographic(GeographicCrs::epsg_4807());
        let wkt = format_crs(&crs, WktConvention::Wkt2_2015).unwrap();
        assert!(wkt.contains("PRIMEM[\"Paris\",2.5969213,"));
        let reparsed = parse_crs(&wkt).unwrap();
        assert!(reparsed.is_equivalent_to(&crs, Criterion::Equivalent));
    }

    #[test]
    fn test_projected_round_trip_both_generations() {
        let utm31 = Crs::Projected(
            ProjectedCrs::new(
                IdentifiedObject::named("WGS 84 / UTM zone 31N").with_epsg(32631),
                Arc::new(GeographicCrs::epsg_4326()),
                crate::operation::Conversion::utm(31, true),
                CoordinateSystem::cartesian_easting_northing_metre(),
            )
            .unwrap(),
        );
        for convention in [
            WktConvention::Wkt1Gdal,
            WktConvention::Wkt2_2015,
            WktConvention::Wkt2_2018,
            WktConvention::Wkt2_2018Simplified,
        ] {
            let wkt = format_crs(&utm31, convention).unwrap();
            let reparsed = parse_crs(&wkt).unwrap();
            assert!(
                reparsed.is_equivalent_to(&utm31, Criterion::Equivalent),
                "round trip failed for {convention:?}: {wkt}"
            );
        }
    }

    #[test]
    fn test_bound_crs_as_towgs84_in_wkt1() {
        let base = Arc::new(Crs::Geographic(GeographicCrs::epsg_4807()));
        let bound = Crs::Bound(
            crate::crs::BoundCrs::from_towgs84(base, &[-168.0, -60.0, 320.0, 0.0, 0.0, 0.0, 0.0])
                .unwrap(),
        );
        let wkt = format_crs(&bound, WktConvention::Wkt1Gdal).unwrap();
        assert!(wkt.contains("TOWGS84[-168,-60,320,0,0,0,0]"));
        let reparsed = parse_crs(&wkt).unwrap();
        assert!(matches!(reparsed, Crs::Bound(_)));
    }

    #[test]
    fn test_temporal_crs_rejected_in_wkt1() {
        use crate::cs::{Axis, AxisDirection};
        use crate::datum::TemporalDatum;
        use crate::measure::UnitOfMeasure;
        let crs = Crs::Temporal(
            crate::crs::TemporalCrs::new(
                IdentifiedObject::named("Time"),
                Arc::new(TemporalDatum::new(
                    IdentifiedObject::named("Unix epoch"),
                    "proleptic Gregorian",
                    "1970-01-01T00:00:00Z",
                )),
                CoordinateSystem::new(
                    CsKind::TemporalDateTime,
                    vec![Axis::new("Time", "T", AxisDirection::Future, UnitOfMeasure::NONE)],
                )
                .unwrap(),
            )
            .unwrap(),
        );
        assert!(format_crs(&crs, WktConvention::Wkt1Gdal).is_err());
        assert!(format_crs(&crs, WktConvention::Wkt2_2018).is_ok());
    }

    #[test]
    fn test_wkt2_round_trip_whole_catalog() {
        // Every catalogued CRS survives a WKT2:2018 round trip
        let catalog = crate::catalog::Catalog::new();
        for code in catalog.get_codes(crate::catalog::ObjectType::Crs, false) {
            let crs = catalog.create_crs(&code).unwrap();
            let wkt = format_crs(&crs, WktConvention::Wkt2_2018).unwrap();
            let reparsed = parse_crs(&wkt)
                .unwrap_or_else(|e| panic!("reparse of {code} failed: {e}\n{wkt}"));
            assert!(
                reparsed.is_equivalent_to(&crs, Criterion::Equivalent),
                "round trip of {code} not equivalent:\n{wkt}"
            );
        }
    }

    #[test]
    fn test_transformation_wkt2_export() {
        let t = crate::operation::Transformation::position_vector(
            IdentifiedObject::named("sample transform").with_epsg(99999),
            Arc::new(Crs::Geographic(GeographicCrs::epsg_4807())),
            Arc::new(wgs84()),
            1.0,
            2.0,
            3.0,
            4.0,
            5.0,
            6.0,
            7.0,
            vec![crate::ident::PositionalAccuracy::metres(2.0)],
        );
        let op = CoordinateOperation::Transformation(t);
        let wkt = op.to_wkt(WktConvention::Wkt2_2018).unwrap();
        assert!(wkt.starts_with("COORDINATEOPERATION[\"sample transform\""));
        assert!(wkt.contains("SOURCECRS"));
        assert!(wkt.contains("OPERATIONACCURACY[2]"));
        assert!(op.to_wkt(WktConvention::Wkt1Gdal).is_err());
    }
}
