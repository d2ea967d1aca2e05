//! The coordinate-operation factory: given a source CRS, a target CRS
//! and an operation context, enumerate candidate operations (direct,
//! inverse, concatenated through a hub), rank them, and return the list.
//!
//! The factory never raises on "no suitable operation": candidates that
//! fail the filters simply leave the result shorter. It raises only on
//! invalid inputs.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::Catalog;
use crate::crs::Crs;
use crate::error::{GeorefError, Result};
use crate::ident::{Criterion, GeographicBoundingBox, IdentifiedObject};
use crate::operation::{
    ConcatenatedOperation, CoordinateOperation, Transformation,
};
use crate::measure::Angle;

/// How the area of interest constrains candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SpatialCriterion {
    /// The operation's area of use must contain the area of interest.
    StrictContainment,
    /// Intersection suffices; containing operations rank first.
    #[default]
    PartialIntersection,
}

/// How grid availability affects the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GridAvailabilityUse {
    /// Operations needing missing grids sort after the rest.
    #[default]
    UseForSorting,
    /// Availability is not consulted.
    Ignore,
    /// Operations needing missing grids are dropped.
    DiscardMissing,
}

/// Whether hub-mediated (concatenated) candidates are considered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IntermediateCrsUse {
    Always,
    #[default]
    IfNoDirectTransformation,
    Never,
}

/// Everything the factory needs beyond the two CRSs.
#[derive(Clone, Debug)]
pub struct OperationContext {
    pub catalog: Option<Arc<Catalog>>,
    pub area_of_interest: Option<GeographicBoundingBox>,
    /// Maximum acceptable accuracy in metres; `None` accepts anything.
    pub desired_accuracy: Option<f64>,
    pub spatial_criterion: SpatialCriterion,
    pub grid_availability_use: GridAvailabilityUse,
    pub use_proj_alternative_grid_names: bool,
    pub allow_use_intermediate_crs: IntermediateCrsUse,
    /// Hub datums tried for concatenated candidates (EPSG codes).
    pub intermediate_hub_datums: Vec<u32>,
}

impl Default for OperationContext {
    fn default() -> Self {
        OperationContext {
            catalog: Some(Arc::new(Catalog::new())),
            area_of_interest: None,
            desired_accuracy: None,
            spatial_criterion: SpatialCriterion::default(),
            grid_availability_use: GridAvailabilityUse::default(),
            use_proj_alternative_grid_names: true,
            allow_use_intermediate_crs: IntermediateCrsUse::default(),
            intermediate_hub_datums: vec![6326],
        }
    }
}

impl OperationContext {
    pub fn without_catalog() -> OperationContext {
        OperationContext {
            catalog: None,
            ..OperationContext::default()
        }
    }
}

/// A candidate with the metadata the ranking consults.
struct Candidate {
    steps: Vec<CoordinateOperation>,
    accuracy: Option<f64>,
    extent: Option<GeographicBoundingBox>,
}

/// Derive the ranked list of operations from `source` to `target`.
pub fn create_operations(
    source: &Arc<Crs>,
    target: &Arc<Crs>,
    ctx: &OperationContext,
) -> Result<Vec<CoordinateOperation>> {
    let source_datum_ident = source.geodetic_datum().map(|d| d.ident().clone());
    let target_datum_ident = target.geodetic_datum().map(|d| d.ident().clone());
    if source_datum_ident.is_none() && source.extract_vertical_crs().is_none() {
        return Err(GeorefError::invalid_operation(format!(
            "source CRS {:?} has no resolvable datum",
            source.name()
        )));
    }
    if target_datum_ident.is_none() && target.extract_vertical_crs().is_none() {
        return Err(GeorefError::invalid_operation(format!(
            "target CRS {:?} has no resolvable datum",
            target.name()
        )));
    }

    let (pre, s_core) = unwrap_source(source, target)?;
    let (post, t_core) = unwrap_target(target, source)?;

    let candidates = core_candidates(&s_core, &t_core, ctx)?;
    debug!(
        source = source.name(),
        target = target.name(),
        candidates = candidates.len(),
        "operation candidates before ranking"
    );

    let mut ranked: Vec<(Candidate, bool, bool)> = Vec::new();
    for candidate in candidates {
        // Area filtering
        let contains_aoi = match (&ctx.area_of_interest, &candidate.extent) {
            (Some(aoi), Some(extent)) => extent.contains(aoi),
            _ => false,
        };
        if let (Some(aoi), Some(extent)) = (&ctx.area_of_interest, &candidate.extent) {
            match ctx.spatial_criterion {
                SpatialCriterion::StrictContainment => {
                    if !extent.contains(aoi) {
                        continue;
                    }
                }
                SpatialCriterion::PartialIntersection => {
                    if !extent.intersects(aoi) {
                        continue;
                    }
                }
            }
        }
        // Accuracy bound
        if let Some(bound) = ctx.desired_accuracy {
            match candidate.accuracy {
                Some(a) if a <= bound => {}
                _ => continue,
            }
        }
        // Grid availability
        let grids_ok = match ctx.grid_availability_use {
            GridAvailabilityUse::Ignore => true,
            _ => {
                let catalog = ctx.catalog.clone().unwrap_or_default();
                candidate
                    .steps
                    .iter()
                    .flat_map(|s| s.grids_needed(&catalog))
                    .all(|g| g.available)
            }
        };
        if ctx.grid_availability_use == GridAvailabilityUse::DiscardMissing && !grids_ok {
            continue;
        }
        ranked.push((candidate, contains_aoi, grids_ok));
    }

    // Rank: available grids first, then candidates containing the area
    // of interest, then larger area of use, then better accuracy, then
    // deterministic id order.
    ranked.sort_by(|(a, a_contains, a_grids), (b, b_contains, b_grids)| {
        b_grids
            .cmp(a_grids)
            .then(b_contains.cmp(a_contains))
            .then_with(|| {
                let area_a = a.extent.map(|e| e.pseudo_area()).unwrap_or(0.0);
                let area_b = b.extent.map(|e| e.pseudo_area()).unwrap_or(0.0);
                area_b.total_cmp(&area_a)
            })
            .then_with(|| {
                let acc_a = a.accuracy.unwrap_or(f64::INFINITY);
                let acc_b = b.accuracy.unwrap_or(f64::INFINITY);
                acc_a.total_cmp(&acc_b)
            })
            .then_with(|| {
                let id = |c: &Candidate| {
                    c.steps
                        .iter()
                        .map(|s| s.name().to_string())
                        .collect::<Vec<_>>()
                        .join("|")
                };
                id(a).cmp(&id(b))
            })
    });

    let mut out = Vec::new();
    for (candidate, _, _) in ranked {
        out.push(assemble(source, target, &pre, candidate.steps, &post)?);
    }
    Ok(out)
}

/// Lift a source CRS to the core CRS the catalog reasons about,
/// collecting the operations that bridge the difference.
fn unwrap_source(
    crs: &Arc<Crs>,
    other: &Arc<Crs>,
) -> Result<(Vec<CoordinateOperation>, Arc<Crs>)> {
    match crs.as_ref() {
        Crs::Projected(p) => {
            let base = Arc::new(Crs::Geographic((**p.base()).clone()));
            let conversion = p
                .deriving_conversion()
                .clone()
                .with_crs(base.clone(), crs.clone())
                .inverse();
            Ok((
                vec![CoordinateOperation::Conversion(conversion)],
                base,
            ))
        }
        Crs::Bound(b) => {
            // When the other side lives on the same datum the wrapper is
            // irrelevant; otherwise ride the pinned transformation to
            // the hub.
            let same_datum = match (b.base().geodetic_datum(), other.geodetic_datum()) {
                (Some(a), Some(o)) => a.is_equivalent_to(o, Criterion::Equivalent),
                _ => false,
            };
            let (mut pre, core) = unwrap_source(b.base(), other)?;
            if same_datum {
                return Ok((pre, core));
            }
            let rebased = b
                .transformation()
                .with_endpoints(core.clone(), b.hub().clone());
            pre.push(CoordinateOperation::Transformation(rebased));
            Ok((pre, b.hub().clone()))
        }
        Crs::Compound(c) => unwrap_source(&c.components()[0], other),
        _ => Ok((Vec::new(), crs.clone())),
    }
}

fn unwrap_target(
    crs: &Arc<Crs>,
    other: &Arc<Crs>,
) -> Result<(Vec<CoordinateOperation>, Arc<Crs>)> {
    let (pre, core) = unwrap_source(crs, other)?;
    let post: Result<Vec<_>> = pre.iter().rev().map(|op| op.inverse()).collect();
    Ok((post?, core))
}

/// Candidate step lists between two core (geographic or geocentric)
/// CRSs. An empty step list denotes the identity.
fn core_candidates(
    source: &Arc<Crs>,
    target: &Arc<Crs>,
    ctx: &OperationContext,
) -> Result<Vec<Candidate>> {
    // Vertical against vertical: identity or nothing
    if let (Some(sv), Some(tv)) = (source.extract_vertical_crs(), target.extract_vertical_crs())
    {
        if matches!(source.as_ref(), Crs::Vertical(_))
            && matches!(target.as_ref(), Crs::Vertical(_))
        {
            if sv.datum().is_equivalent_to(tv.datum(), Criterion::Equivalent) {
                return Ok(vec![Candidate {
                    steps: Vec::new(),
                    accuracy: Some(0.0),
                    extent: None,
                }]);
            }
            return Ok(Vec::new());
        }
    }

    let (Some(s_datum), Some(t_datum)) = (source.geodetic_datum(), target.geodetic_datum())
    else {
        return Ok(Vec::new());
    };

    // Same datum: identity or a geographic/geocentric conversion
    if s_datum.is_equivalent_to(t_datum, Criterion::Equivalent) {
        let geocentric = |c: &Crs| matches!(c, Crs::Geodetic(_));
        let step = match (geocentric(source), geocentric(target)) {
            (false, true) => {
                let conv = crate::operation::Conversion::geographic_geocentric(
                    IdentifiedObject::named(format!(
                        "Conversion from {} to {}",
                        source.name(),
                        target.name()
                    )),
                )
                .with_crs(source.clone(), target.clone());
                vec![CoordinateOperation::Conversion(conv)]
            }
            (true, false) => {
                let conv = crate::operation::Conversion::geographic_geocentric(
                    IdentifiedObject::named(format!(
                        "Conversion from {} to {}",
                        source.name(),
                        target.name()
                    )),
                )
                .with_crs(target.clone(), source.clone())
                .inverse();
                vec![CoordinateOperation::Conversion(conv)]
            }
            _ => Vec::new(),
        };
        return Ok(vec![Candidate {
            steps: step,
            accuracy: Some(0.0),
            extent: None,
        }]);
    }

    let mut candidates = Vec::new();
    let ensemble_extra = s_datum.ensemble_accuracy().map(|a| a.value()).unwrap_or(0.0)
        + t_datum.ensemble_accuracy().map(|a| a.value()).unwrap_or(0.0);
    // Whether the catalog knows these datums at all, regardless of area
    // or accuracy: a ballpark fallback is only legitimate when it does
    // not.
    let mut any_record = false;

    if let Some(catalog) = &ctx.catalog {
        let allow_unknown_accuracy = ctx.desired_accuracy.is_none();
        let area = ctx.area_of_interest.as_ref();
        let mut direct_found = false;

        for s_code in s_datum.lookup_codes() {
            for t_code in t_datum.lookup_codes() {
                any_record |= !catalog
                    .create_operations_between_datums(s_code, t_code, None, true)?
                    .is_empty()
                    || !catalog
                        .create_operations_between_datums(t_code, s_code, None, true)?
                        .is_empty();
            }
        }

        let mut add_direct =
            |transformation: Transformation, candidates: &mut Vec<Candidate>| {
                let extent = transformation
                    .ident()
                    .domain_of_validity()
                    .and_then(|e| e.bbox())
                    .copied();
                let rebased = transformation
                    .with_endpoints(source.clone(), target.clone())
                    .with_extra_accuracy(ensemble_extra);
                let accuracy = rebased
                    .accuracies()
                    .first()
                    .map(|a| a.value());
                candidates.push(Candidate {
                    steps: vec![CoordinateOperation::Transformation(rebased)],
                    accuracy,
                    extent,
                });
            };

        for s_code in s_datum.lookup_codes() {
            for t_code in t_datum.lookup_codes() {
                for fwd in catalog.create_operations_between_datums(
                    s_code,
                    t_code,
                    area,
                    allow_unknown_accuracy,
                )? {
                    direct_found = true;
                    add_direct(fwd, &mut candidates);
                }
                for rev in catalog.create_operations_between_datums(
                    t_code,
                    s_code,
                    area,
                    allow_unknown_accuracy,
                )? {
                    direct_found = true;
                    add_direct(rev.inverse()?, &mut candidates);
                }
            }
        }

        let try_hubs = match ctx.allow_use_intermediate_crs {
            IntermediateCrsUse::Always => true,
            IntermediateCrsUse::IfNoDirectTransformation => !direct_found,
            IntermediateCrsUse::Never => false,
        };
        if try_hubs {
            for hub in &ctx.intermediate_hub_datums {
                if s_datum.lookup_codes().contains(hub) || t_datum.lookup_codes().contains(hub)
                {
                    continue;
                }
                let legs_to_hub = |from: u32| -> Result<Vec<Transformation>> {
                    let mut legs = catalog.create_operations_between_datums(
                        from,
                        *hub,
                        area,
                        allow_unknown_accuracy,
                    )?;
                    for rev in catalog.create_operations_between_datums(
                        *hub,
                        from,
                        area,
                        allow_unknown_accuracy,
                    )? {
                        legs.push(rev.inverse()?);
                    }
                    Ok(legs)
                };
                for s_code in s_datum.lookup_codes() {
                    for t_code in t_datum.lookup_codes() {
                        for first in legs_to_hub(s_code)? {
                            for second_inv in legs_to_hub(t_code)? {
                                let second = second_inv.inverse()?;
                                let first = first
                                    .with_endpoints(
                                        source.clone(),
                                        first.target_crs().clone(),
                                    )
                                    .with_extra_accuracy(ensemble_extra);
                                let second = second
                                    .with_endpoints(
                                        second.source_crs().clone(),
                                        target.clone(),
                                    );
                                let accuracy = match (
                                    first.accuracies().first(),
                                    second.accuracies().first(),
                                ) {
                                    (Some(a), Some(b)) => Some(a.value() + b.value()),
                                    _ => None,
                                };
                                let extent = intersect_extents(
                                    first.ident().domain_of_validity().and_then(|e| e.bbox()),
                                    second.ident().domain_of_validity().and_then(|e| e.bbox()),
                                );
                                candidates.push(Candidate {
                                    steps: vec![
                                        CoordinateOperation::Transformation(first),
                                        CoordinateOperation::Transformation(second),
                                    ],
                                    accuracy,
                                    extent,
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    // Nothing catalogued between these datums: fall back to a ballpark
    // operation that only adapts axes, units and prime meridians. When
    // records exist but every one failed a filter, the list stays
    // empty instead.
    if candidates.is_empty() && !any_record {
        let ballpark = Transformation::geographic2d_offsets(
            IdentifiedObject::named(format!(
                "Ballpark geographic offset transformation from {} to {}",
                source.name(),
                target.name()
            )),
            source.clone(),
            target.clone(),
            Angle::new(0.0),
            Angle::new(0.0),
            Vec::new(),
        );
        candidates.push(Candidate {
            steps: vec![CoordinateOperation::Transformation(ballpark)],
            accuracy: None,
            extent: None,
        });
    }

    Ok(candidates)
}

fn intersect_extents(
    a: Option<&GeographicBoundingBox>,
    b: Option<&GeographicBoundingBox>,
) -> Option<GeographicBoundingBox> {
    match (a, b) {
        (Some(a), Some(b)) => {
            if !a.intersects(b) {
                return None;
            }
            Some(GeographicBoundingBox::new(
                a.west.max(b.west),
                a.south.max(b.south),
                a.east.min(b.east),
                a.north.min(b.north),
            ))
        }
        (Some(a), None) => Some(*a),
        (None, Some(b)) => Some(*b),
        (None, None) => None,
    }
}

/// Stitch pre-steps, core candidate and post-steps into one operation.
fn assemble(
    source: &Arc<Crs>,
    target: &Arc<Crs>,
    pre: &[CoordinateOperation],
    core: Vec<CoordinateOperation>,
    post: &[CoordinateOperation],
) -> Result<CoordinateOperation> {
    let mut steps: Vec<CoordinateOperation> = Vec::new();
    steps.extend(pre.iter().cloned());
    steps.extend(core);
    steps.extend(post.iter().cloned());

    match steps.len() {
        0 => {
            // Same CRS up to axis order and units: a null operation
            let null = Transformation::geographic2d_offsets(
                IdentifiedObject::named(format!(
                    "Null geographic offset transformation from {} to {}",
                    source.name(),
                    target.name()
                )),
                source.clone(),
                target.clone(),
                Angle::new(0.0),
                Angle::new(0.0),
                Vec::new(),
            );
            Ok(CoordinateOperation::Transformation(null))
        }
        1 => Ok(steps.into_iter().next().expect("one step")),
        _ => Ok(CoordinateOperation::Concatenated(
            ConcatenatedOperation::from_steps(steps)?,
        )),
    }
}

/// Convenience wrapper mirroring the abstract entry point.
pub fn create_operation(
    source: &Arc<Crs>,
    target: &Arc<Crs>,
    ctx: &OperationContext,
) -> Result<Option<CoordinateOperation>> {
    Ok(create_operations(source, target, ctx)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::GeographicCrs;
    use crate::projstring::ProjStringConvention;

    fn catalog_crs(code: &str) -> Arc<Crs> {
        Catalog::new().create_crs(code).unwrap()
    }

    fn proj(op: &CoordinateOperation) -> String {
        op.to_proj_string(ProjStringConvention::Proj5).unwrap()
    }

    #[test]
    fn test_same_crs_yields_identity() {
        let wgs84 = catalog_crs("4326");
        let ops = create_operations(&wgs84, &wgs84, &OperationContext::default()).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(proj(&ops[0]), "");
        assert!(ops[0].name().starts_with("Null geographic offset"));
    }

    #[test]
    fn test_ntf_paris_to_wgs84_ballpark_pipeline() {
        let ntf_paris = catalog_crs("4807");
        let wgs84 = catalog_crs("4326");
        let ops =
            create_operations(&ntf_paris, &wgs84, &OperationContext::default()).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(
            proj(&ops[0]),
            "+proj=pipeline +step +proj=axisswap +order=2,1 +step \
             +proj=unitconvert +xy_in=grad +xy_out=rad +step +inv +proj=longlat \
             +ellps=clrk80ign +pm=paris +step +proj=unitconvert +xy_in=rad \
             +xy_out=deg +step +proj=axisswap +order=2,1"
        );
    }

    #[test]
    fn test_pulkovo_to_etrs89_ranking_and_area_restriction() {
        let pulkovo = catalog_crs("4179");
        let etrs89 = catalog_crs("4258");
        let ctx = OperationContext::default();
        let ops = create_operations(&pulkovo, &etrs89, &ctx).unwrap();
        assert!(ops.len() >= 2);
        // Romania's area of use outweighs Poland's better accuracy
        assert_eq!(ops[0].ident().epsg_code(), Some(15994));
        assert_eq!(ops[1].ident().epsg_code(), Some(1644));
        assert_eq!(
            proj(&ops[0]),
            "+proj=pipeline +step +proj=axisswap +order=2,1 +step \
             +proj=unitconvert +xy_in=deg +xy_out=rad +step +proj=cart \
             +ellps=krass +step +proj=helmert +x=2.3287 +y=-147.0425 \
             +z=-92.0802 +rx=0.3092483 +ry=-0.32482185 +rz=-0.49729934 \
             +s=5.68906266 +convention=coordinate_frame +step +inv +proj=cart \
             +ellps=GRS80 +step +proj=unitconvert +xy_in=rad +xy_out=deg +step \
             +proj=axisswap +order=2,1"
        );

        // Restricting to Romania's box removes the Polish entry
        let restricted = OperationContext {
            area_of_interest: Some(GeographicBoundingBox::new(20.26, 43.44, 31.41, 48.27)),
            ..OperationContext::default()
        };
        let ops = create_operations(&pulkovo, &etrs89, &restricted).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].ident().epsg_code(), Some(15994));
    }

    #[test]
    fn test_reverse_direction_inverts_catalogued_operation() {
        let pulkovo = catalog_crs("4179");
        let etrs89 = catalog_crs("4258");
        let ops =
            create_operations(&etrs89, &pulkovo, &OperationContext::default()).unwrap();
        assert!(!ops.is_empty());
        assert!(ops[0].name().starts_with("Inverse of"));
        // The Helmert inverse negates the parameters analytically
        let pipeline = proj(&ops[0]);
        assert!(
            pipeline.contains("+proj=helmert +x=-2.3287 +y=147.0425 +z=92.0802"),
            "pipeline: {pipeline}"
        );
        assert!(pipeline.contains("+step +proj=cart +ellps=GRS80"));
        assert!(pipeline.contains("+step +inv +proj=cart +ellps=krass"));
    }

    #[test]
    fn test_utm31_to_utm32_pipeline() {
        let utm31 = catalog_crs("32631");
        let utm32 = catalog_crs("32632");
        let ops = create_operations(&utm31, &utm32, &OperationContext::default()).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(
            proj(&ops[0]),
            "+proj=pipeline +step +inv +proj=utm +zone=31 +ellps=WGS84 +step \
             +proj=utm +zone=32 +ellps=WGS84"
        );
    }

    #[test]
    fn test_bound_projected_to_wgs84_pipeline() {
        // A UTM 31 projection over NTF (Paris), bound by TOWGS84
        let base = Arc::new(Crs::Projected(
            crate::crs::ProjectedCrs::new(
                IdentifiedObject::named("NTF (Paris) / UTM zone 31N"),
                Arc::new(GeographicCrs::epsg_4807()),
                crate::operation::Conversion::utm(31, true),
                crate::cs::CoordinateSystem::cartesian_easting_northing_metre(),
            )
            .unwrap(),
        ));
        let bound = Arc::new(Crs::Bound(
            crate::crs::BoundCrs::from_towgs84(base, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])
                .unwrap(),
        ));
        let wgs84 = catalog_crs("4326");
        let ops = create_operations(&bound, &wgs84, &OperationContext::default()).unwrap();
        assert!(!ops.is_empty());
        assert_eq!(
            proj(&ops[0]),
            "+proj=pipeline +step +inv +proj=utm +zone=31 +ellps=clrk80ign \
             +pm=paris +step +proj=cart +ellps=clrk80ign +step +proj=helmert \
             +x=1 +y=2 +z=3 +rx=4 +ry=5 +rz=6 +s=7 +convention=position_vector \
             +step +inv +proj=cart +ellps=WGS84 +step +proj=unitconvert \
             +xy_in=rad +xy_out=deg +step +proj=axisswap +order=2,1"
        );
    }

    #[test]
    fn test_hub_mediated_concatenation() {
        // NTF and NAD27 are only connected through WGS 84
        let ntf = catalog_crs("4275");
        let nad27 = catalog_crs("4267");
        let ops = create_operations(&ntf, &nad27, &OperationContext::default()).unwrap();
        assert!(!ops.is_empty());
        let CoordinateOperation::Concatenated(concat) = &ops[0] else {
            panic!("expected a concatenated operation, got {:?}", ops[0].name());
        };
        assert_eq!(concat.steps().len(), 2);
        assert_eq!(concat.steps()[0].ident().epsg_code(), Some(1193));
        assert!(concat.steps()[1].name().starts_with("Inverse of NAD27"));
        // step accuracies add up
        assert_eq!(ops[0].accuracy(), Some(12.0));
    }

    #[test]
    fn test_grid_availability_policies() {
        // NAD27 -> NAD83 needs ntv2_0.gsb, which is not available
        let nad27 = catalog_crs("4267");
        let nad83 = catalog_crs("4269");

        let default_ops =
            create_operations(&nad27, &nad83, &OperationContext::default()).unwrap();
        assert!(!default_ops.is_empty());

        let discard = OperationContext {
            grid_availability_use: GridAvailabilityUse::DiscardMissing,
            ..OperationContext::default()
        };
        let ops = create_operations(&nad27, &nad83, &discard).unwrap();
        assert!(
            ops.iter().all(|op| op.ident().epsg_code() != Some(1313)),
            "grid-missing operation must be discarded"
        );
    }

    #[test]
    fn test_accuracy_bound_filters() {
        let pulkovo = catalog_crs("4179");
        let etrs89 = catalog_crs("4258");
        let ctx = OperationContext {
            desired_accuracy: Some(2.0),
            ..OperationContext::default()
        };
        let ops = create_operations(&pulkovo, &etrs89, &ctx).unwrap();
        // Only Poland's 1 m entry passes the 2 m bound
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].ident().epsg_code(), Some(1644));
    }

    #[test]
    fn test_determinism() {
        let pulkovo = catalog_crs("4179");
        let etrs89 = catalog_crs("4258");
        let ctx = OperationContext::default();
        let a = create_operations(&pulkovo, &etrs89, &ctx).unwrap();
        let b = create_operations(&pulkovo, &etrs89, &ctx).unwrap();
        let names_a: Vec<_> = a.iter().map(|op| op.name().to_string()).collect();
        let names_b: Vec<_> = b.iter().map(|op| op.name().to_string()).collect();
        assert_eq!(names_a, names_b);
        let pipes_a: Vec<_> = a.iter().map(proj).collect();
        let pipes_b: Vec<_> = b.iter().map(proj).collect();
        assert_eq!(pipes_a, pipes_b);
    }

    #[test]
    fn test_inverse_contract_round_trip() {
        let pulkovo = catalog_crs("4179");
        let etrs89 = catalog_crs("4258");
        let ops =
            create_operations(&pulkovo, &etrs89, &OperationContext::default()).unwrap();
        let op = &ops[0];
        let inv = op.inverse().unwrap();
        assert_eq!(inv.source_crs().unwrap().name(), "ETRS89");
        assert_eq!(inv.target_crs().unwrap().name(), "Pulkovo 1942(58)");
        let back = inv.inverse().unwrap();
        assert!(back.is_equivalent_to(op, Criterion::Equivalent));
        assert_eq!(proj(&back), proj(op));
    }

    #[test]
    fn test_geographic_to_geocentric_conversion() {
        let wgs84 = catalog_crs("4326");
        let geocentric = catalog_crs("4978");
        let ops =
            create_operations(&wgs84, &geocentric, &OperationContext::default()).unwrap();
        assert_eq!(ops.len(), 1);
        let pipeline = proj(&ops[0]);
        assert!(pipeline.contains("+proj=cart"), "pipeline: {pipeline}");
    }

    #[test]
    fn test_empty_list_when_all_filtered() {
        let pulkovo = catalog_crs("4179");
        let etrs89 = catalog_crs("4258");
        // An area of interest that matches neither entry
        let ctx = OperationContext {
            area_of_interest: Some(GeographicBoundingBox::new(-120.0, 30.0, -100.0, 45.0)),
            ..OperationContext::default()
        };
        let ops = create_operations(&pulkovo, &etrs89, &ctx).unwrap();
        assert!(ops.is_empty());
    }
}
