//! Identified-object core: names, aliases, authority identifiers, remarks,
//! scope, and domain of validity. Every catalog entity embeds an
//! [`IdentifiedObject`] as its first field.

use crate::measure::UnitOfMeasure;

/// How two objects are compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Criterion {
    /// Byte-exact names, ids and parameter values.
    Strict,
    /// Semantic content only; names and ids are ignored, numeric values
    /// compare with an absolute tolerance of 1e-10 in SI units.
    Equivalent,
    /// `Equivalent`, plus geographic/projected CRSs whose first two axes
    /// are swapped compare equal.
    EquivalentIgnoringAxisOrder,
}

impl Criterion {
    pub fn is_strict(self) -> bool {
        self == Criterion::Strict
    }

    /// Downgrade axis-order laxness for nested comparisons that must not
    /// inherit it (datums, ellipsoids, parameter values).
    pub fn base(self) -> Criterion {
        match self {
            Criterion::Strict => Criterion::Strict,
            _ => Criterion::Equivalent,
        }
    }
}

/// A `(codespace, code)` reference into an authority's registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identifier {
    codespace: Option<String>,
    code: String,
    version: Option<String>,
    authority_citation: Option<String>,
    uri: Option<String>,
}

impl Identifier {
    pub fn new(codespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            codespace: Some(codespace.into()),
            code: code.into(),
            version: None,
            authority_citation: None,
            uri: None,
        }
    }

    pub fn epsg(code: u32) -> Self {
        Self::new("EPSG", code.to_string())
    }

    pub fn codespace(&self) -> Option<&str> {
        self.codespace.as_deref()
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }
}

/// Canonical form used for name-based matching: quotes stripped,
/// whitespace collapsed, case folded, `_` mapped to space.
pub fn canonicalize_name(name: &str) -> String {
    let trimmed = name.trim();
    let trimmed = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    let mut out = String::with_capacity(trimmed.len());
    let mut pending_space = false;
    for ch in trimmed.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        }
    }
    out
}

pub fn is_equivalent_name(a: &str, b: &str) -> bool {
    canonicalize_name(a) == canonicalize_name(b)
}

/// A geographic bounding box in degrees. `west > east` denotes a box
/// crossing the antimeridian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeographicBoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeographicBoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole world.
    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Longitude spans, unfolded so each span has west <= east.
    fn lon_spans(&self) -> [(f64, f64); 2] {
        if self.crosses_antimeridian() {
            [(self.west, 180.0), (-180.0, self.east)]
        } else {
            [(self.west, self.east), (self.west, self.east)]
        }
    }

    pub fn contains(&self, other: &GeographicBoundingBox) -> bool {
        if other.south < self.south || other.north > self.north {
            return false;
        }
        let mine = self.lon_spans();
        other
            .lon_spans()
            .iter()
            .all(|(w, e)| mine.iter().any(|(mw, me)| w >= mw && e <= me))
    }

    pub fn intersects(&self, other: &GeographicBoundingBox) -> bool {
        if other.south >= self.north || other.north <= self.south {
            return false;
        }
        let mine = self.lon_spans();
        other
            .lon_spans()
            .iter()
            .any(|(w, e)| mine.iter().any(|(mw, me)| w < me && e > mw))
    }

    /// Approximate area weight used by the factory's tie-breaker: the
    /// solid-angle-ish product of the longitude span and the sine-span of
    /// latitude. Not a true surface area.
    pub fn pseudo_area(&self) -> f64 {
        let lon_span = if self.crosses_antimeridian() {
            360.0 - (self.west - self.east)
        } else {
            self.east - self.west
        };
        let lat_factor = self.north.to_radians().sin() - self.south.to_radians().sin();
        lon_span.max(0.0) * lat_factor.max(0.0)
    }
}

/// Vertical range of validity, in the given linear unit.
#[derive(Clone, Debug, PartialEq)]
pub struct VerticalExtentElement {
    pub minimum: f64,
    pub maximum: f64,
    pub unit: UnitOfMeasure,
}

/// Temporal range of validity. Values are ISO-8601 strings or free text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemporalExtentElement {
    pub start: String,
    pub stop: String,
}

/// Domain of validity of an object: a description plus geographic,
/// vertical and temporal elements.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Extent {
    pub description: Option<String>,
    pub geographic_elements: Vec<GeographicBoundingBox>,
    pub vertical_elements: Vec<VerticalExtentElement>,
    pub temporal_elements: Vec<TemporalExtentElement>,
}

impl Extent {
    pub fn from_bbox(west: f64, south: f64, east: f64, north: f64) -> Self {
        Extent {
            description: None,
            geographic_elements: vec![GeographicBoundingBox::new(west, south, east, north)],
            vertical_elements: Vec::new(),
            temporal_elements: Vec::new(),
        }
    }

    pub fn world() -> Self {
        Extent {
            description: Some("World".to_string()),
            geographic_elements: vec![GeographicBoundingBox::world()],
            vertical_elements: Vec::new(),
            temporal_elements: Vec::new(),
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn bbox(&self) -> Option<&GeographicBoundingBox> {
        self.geographic_elements.first()
    }

    pub fn contains(&self, other: &Extent) -> bool {
        match (self.bbox(), other.bbox()) {
            (Some(a), Some(b)) => a.contains(b),
            _ => false,
        }
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        match (self.bbox(), other.bbox()) {
            (Some(a), Some(b)) => a.intersects(b),
            _ => false,
        }
    }

    pub fn pseudo_area(&self) -> f64 {
        self.bbox().map(|b| b.pseudo_area()).unwrap_or(0.0)
    }
}

/// Accuracy of a coordinate operation, in metres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionalAccuracy(f64);

impl PositionalAccuracy {
    pub fn metres(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Shared fields of every catalog entity.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct IdentifiedObject {
    name: String,
    aliases: Vec<String>,
    identifiers: Vec<Identifier>,
    remarks: Option<String>,
    scope: Option<String>,
    domain_of_validity: Option<Extent>,
    deprecated: bool,
    /// A legacy `EXTENSION["PROJ4", ...]` payload carried through from
    /// WKT1, used as a formatting fallback.
    extension_proj4: Option<String>,
}

impl IdentifiedObject {
    pub fn named(name: impl Into<String>) -> Self {
        IdentifiedObject {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_epsg(mut self, code: u32) -> Self {
        self.identifiers.push(Identifier::epsg(code));
        self
    }

    pub fn with_identifier(mut self, id: Identifier) -> Self {
        self.identifiers.push(id);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.domain_of_validity = Some(extent);
        self
    }

    pub fn mark_deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn with_extension_proj4(mut self, ext: impl Into<String>) -> Self {
        self.extension_proj4 = Some(ext.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn domain_of_validity(&self) -> Option<&Extent> {
        self.domain_of_validity.as_ref()
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn extension_proj4(&self) -> Option<&str> {
        self.extension_proj4.as_deref()
    }

    /// Numeric EPSG code, when an identifier in the EPSG codespace exists.
    pub fn epsg_code(&self) -> Option<u32> {
        self.identifiers
            .iter()
            .find(|id| {
                id.codespace()
                    .map(|cs| cs.eq_ignore_ascii_case("EPSG"))
                    .unwrap_or(false)
            })
            .and_then(|id| id.code().parse().ok())
    }

    /// Name-level equivalence: strict compares verbatim, otherwise the
    /// canonical forms are compared, with aliases participating.
    pub fn matches_name(&self, other: &IdentifiedObject, criterion: Criterion) -> bool {
        if criterion.is_strict() {
            return self.name == other.name;
        }
        if is_equivalent_name(&self.name, &other.name) {
            return true;
        }
        self.aliases
            .iter()
            .any(|a| is_equivalent_name(a, &other.name))
            || other
                .aliases
                .iter()
                .any(|a| is_equivalent_name(a, &self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_canonicalize_name() {
        assert_eq!(canonicalize_name("WGS 84"), "wgs 84");
        assert_eq!(canonicalize_name("WGS_84"), "wgs 84");
        assert_eq!(canonicalize_name("\"WGS  84\""), "wgs 84");
        assert!(is_equivalent_name("Latitude_of_origin", "Latitude of origin"));
        assert!(!is_equivalent_name("WGS 84", "WGS 72"));
    }

    #[test]
    fn test_epsg_code_lookup() {
        let obj = IdentifiedObject::named("WGS 84").with_epsg(4326);
        assert_eq!(obj.epsg_code(), Some(4326));
        let other = IdentifiedObject::named("anon");
        assert_eq!(other.epsg_code(), None);
    }

    #[test]
    fn test_alias_matching() {
        let a = IdentifiedObject::named("WGS 84").with_alias("WGS84");
        let b = IdentifiedObject::named("WGS_84");
        assert!(a.matches_name(&b, Criterion::Equivalent));
        assert!(!a.matches_name(&b, Criterion::Strict));
    }

    #[test]
    fn test_bbox_containment() {
        let europe = GeographicBoundingBox::new(-10.0, 35.0, 40.0, 70.0);
        let romania = GeographicBoundingBox::new(20.26, 43.44, 31.41, 48.27);
        assert!(europe.contains(&romania));
        assert!(!romania.contains(&europe));
        assert!(europe.intersects(&romania));
    }

    #[test]
    fn test_bbox_antimeridian() {
        let fiji = GeographicBoundingBox::new(176.0, -21.0, -178.0, -12.0);
        let east_part = GeographicBoundingBox::new(177.0, -20.0, 179.0, -15.0);
        let west_part = GeographicBoundingBox::new(-180.0, -20.0, -179.0, -15.0);
        assert!(fiji.intersects(&east_part));
        assert!(fiji.intersects(&west_part));
        let atlantic = GeographicBoundingBox::new(-40.0, -30.0, -20.0, 10.0);
        assert!(!fiji.intersects(&atlantic));
    }

    #[test]
    fn test_pseudo_area_ranking() {
        // Romania's box is larger than Poland's under the pseudo-area metric
        let romania = GeographicBoundingBox::new(20.26, 43.44, 31.41, 48.27);
        let poland = GeographicBoundingBox::new(14.14, 49.0, 24.15, 55.03);
        assert!(romania.pseudo_area() > poland.pseudo_area());
        assert_relative_eq!(
            GeographicBoundingBox::world().pseudo_area(),
            720.0,
            epsilon = 1e-9
        );
    }
}
