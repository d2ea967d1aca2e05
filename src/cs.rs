//! Coordinate systems: axes, directions, and the kind-tagged axis tuple.
//!
//! A coordinate system is purely geometric; it knows nothing about the
//! datum it will be paired with. Construction validates that the axis
//! count and unit kinds are consistent with the CS kind.

use crate::error::{GeorefError, Result};
use crate::ident::{Criterion, IdentifiedObject};
use crate::measure::{Angle, UnitKind, UnitOfMeasure};

/// ISO 19111 axis direction register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisDirection {
    North,
    NorthNorthEast,
    NorthEast,
    EastNorthEast,
    East,
    EastSouthEast,
    SouthEast,
    SouthSouthEast,
    South,
    SouthSouthWest,
    SouthWest,
    WestSouthWest,
    West,
    WestNorthWest,
    NorthWest,
    NorthNorthWest,
    Up,
    Down,
    GeocentricX,
    GeocentricY,
    GeocentricZ,
    ColumnPositive,
    ColumnNegative,
    RowPositive,
    RowNegative,
    DisplayRight,
    DisplayLeft,
    DisplayUp,
    DisplayDown,
    Forward,
    Aft,
    Port,
    Starboard,
    Clockwise,
    CounterClockwise,
    Towards,
    AwayFrom,
    Future,
    Past,
    Unspecified,
}

impl AxisDirection {
    /// The WKT spelling of the direction.
    pub fn wkt_name(self) -> &'static str {
        use AxisDirection::*;
        match self {
            North => "north",
            NorthNorthEast => "northNorthEast",
            NorthEast => "northEast",
            EastNorthEast => "eastNorthEast",
            East => "east",
            EastSouthEast => "eastSouthEast",
            SouthEast => "southEast",
            SouthSouthEast => "southSouthEast",
            South => "south",
            SouthSouthWest => "southSouthWest",
            SouthWest => "southWest",
            WestSouthWest => "westSouthWest",
            West => "west",
            WestNorthWest => "westNorthWest",
            NorthWest => "northWest",
            NorthNorthWest => "northNorthWest",
            Up => "up",
            Down => "down",
            GeocentricX => "geocentricX",
            GeocentricY => "geocentricY",
            GeocentricZ => "geocentricZ",
            ColumnPositive => "columnPositive",
            ColumnNegative => "columnNegative",
            RowPositive => "rowPositive",
            RowNegative => "rowNegative",
            DisplayRight => "displayRight",
            DisplayLeft => "displayLeft",
            DisplayUp => "displayUp",
            DisplayDown => "displayDown",
            Forward => "forward",
            Aft => "aft",
            Port => "port",
            Starboard => "starboard",
            Clockwise => "clockwise",
            CounterClockwise => "counterClockwise",
            Towards => "towards",
            AwayFrom => "awayFrom",
            Future => "future",
            Past => "past",
            Unspecified => "unspecified",
        }
    }

    /// Case- and separator-insensitive lookup, accepting both WKT2
    /// camelCase ("geocentricX") and WKT1 upper-case ("GEOCENTRIC_X").
    pub fn from_name(name: &str) -> Option<AxisDirection> {
        let folded: String = name
            .chars()
            .filter(|c| *c != '_' && *c != ' ' && *c != '-')
            .flat_map(|c| c.to_lowercase())
            .collect();
        const ALL: &[AxisDirection] = &[
            AxisDirection::North,
            AxisDirection::NorthNorthEast,
            AxisDirection::NorthEast,
            AxisDirection::EastNorthEast,
            AxisDirection::East,
            AxisDirection::EastSouthEast,
            AxisDirection::SouthEast,
            AxisDirection::SouthSouthEast,
            AxisDirection::South,
            AxisDirection::SouthSouthWest,
            AxisDirection::SouthWest,
            AxisDirection::WestSouthWest,
            AxisDirection::West,
            AxisDirection::WestNorthWest,
            AxisDirection::NorthWest,
            AxisDirection::NorthNorthWest,
            AxisDirection::Up,
            AxisDirection::Down,
            AxisDirection::GeocentricX,
            AxisDirection::GeocentricY,
            AxisDirection::GeocentricZ,
            AxisDirection::ColumnPositive,
            AxisDirection::ColumnNegative,
            AxisDirection::RowPositive,
            AxisDirection::RowNegative,
            AxisDirection::DisplayRight,
            AxisDirection::DisplayLeft,
            AxisDirection::DisplayUp,
            AxisDirection::DisplayDown,
            AxisDirection::Forward,
            AxisDirection::Aft,
            AxisDirection::Port,
            AxisDirection::Starboard,
            AxisDirection::Clockwise,
            AxisDirection::CounterClockwise,
            AxisDirection::Towards,
            AxisDirection::AwayFrom,
            AxisDirection::Future,
            AxisDirection::Past,
            AxisDirection::Unspecified,
        ];
        ALL.iter()
            .find(|d| {
                d.wkt_name()
                    .chars()
                    .flat_map(|c| c.to_lowercase())
                    .eq(folded.chars())
            })
            .copied()
    }

    pub fn is_north_bearing(self) -> bool {
        matches!(
            self,
            AxisDirection::North | AxisDirection::South
        )
    }

    pub fn is_east_bearing(self) -> bool {
        matches!(self, AxisDirection::East | AxisDirection::West)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, AxisDirection::Up | AxisDirection::Down)
    }
}

/// Meridian along which an axis with polar direction points.
#[derive(Clone, Debug, PartialEq)]
pub struct Meridian {
    pub longitude: Angle,
}

/// A single coordinate system axis.
#[derive(Clone, Debug)]
pub struct Axis {
    ident: IdentifiedObject,
    abbreviation: String,
    direction: AxisDirection,
    unit: UnitOfMeasure,
    minimum_value: Option<f64>,
    maximum_value: Option<f64>,
    meridian: Option<Meridian>,
}

impl Axis {
    pub fn new(
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        direction: AxisDirection,
        unit: UnitOfMeasure,
    ) -> Self {
        Self {
            ident: IdentifiedObject::named(name),
            abbreviation: abbreviation.into(),
            direction,
            unit,
            minimum_value: None,
            maximum_value: None,
            meridian: None,
        }
    }

    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum_value = Some(minimum);
        self.maximum_value = Some(maximum);
        self
    }

    pub fn with_meridian(mut self, meridian: Meridian) -> Self {
        self.meridian = Some(meridian);
        self
    }

    pub fn ident(&self) -> &IdentifiedObject {
        &self.ident
    }

    pub fn name(&self) -> &str {
        self.ident.name()
    }

    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    pub fn direction(&self) -> AxisDirection {
        self.direction
    }

    pub fn unit(&self) -> &UnitOfMeasure {
        &self.unit
    }

    pub fn minimum_value(&self) -> Option<f64> {
        self.minimum_value
    }

    pub fn maximum_value(&self) -> Option<f64> {
        self.maximum_value
    }

    pub fn meridian(&self) -> Option<&Meridian> {
        self.meridian.as_ref()
    }

    pub fn is_equivalent_to(&self, other: &Axis, criterion: Criterion) -> bool {
        if criterion.is_strict() && !self.ident.matches_name(&other.ident, criterion) {
            return false;
        }
        self.direction == other.direction && self.unit == other.unit
    }

    // Common axes.

    pub fn latitude() -> Axis {
        Axis::new("Latitude", "lat", AxisDirection::North, UnitOfMeasure::DEGREE)
    }

    pub fn longitude() -> Axis {
        Axis::new("Longitude", "lon", AxisDirection::East, UnitOfMeasure::DEGREE)
    }

    pub fn ellipsoidal_height() -> Axis {
        Axis::new(
            "Ellipsoidal height",
            "h",
            AxisDirection::Up,
            UnitOfMeasure::METRE,
        )
    }

    pub fn easting() -> Axis {
        Axis::new("Easting", "E", AxisDirection::East, UnitOfMeasure::METRE)
    }

    pub fn northing() -> Axis {
        Axis::new("Northing", "N", AxisDirection::North, UnitOfMeasure::METRE)
    }

    pub fn gravity_related_height() -> Axis {
        Axis::new(
            "Gravity-related height",
            "H",
            AxisDirection::Up,
            UnitOfMeasure::METRE,
        )
    }
}

/// Kind tag of a coordinate system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsKind {
    Cartesian,
    Ellipsoidal,
    Spherical,
    Vertical,
    TemporalDateTime,
    TemporalCount,
    TemporalMeasure,
    Ordinal,
    Parametric,
}

impl CsKind {
    /// The WKT2 CS node type name.
    pub fn wkt_name(self) -> &'static str {
        match self {
            CsKind::Cartesian => "Cartesian",
            CsKind::Ellipsoidal => "ellipsoidal",
            CsKind::Spherical => "spherical",
            CsKind::Vertical => "vertical",
            CsKind::TemporalDateTime => "TemporalDateTime",
            CsKind::TemporalCount => "TemporalCount",
            CsKind::TemporalMeasure => "TemporalMeasure",
            CsKind::Ordinal => "ordinal",
            CsKind::Parametric => "parametric",
        }
    }

    pub fn from_name(name: &str) -> Option<CsKind> {
        const ALL: &[CsKind] = &[
            CsKind::Cartesian,
            CsKind::Ellipsoidal,
            CsKind::Spherical,
            CsKind::Vertical,
            CsKind::TemporalDateTime,
            CsKind::TemporalCount,
            CsKind::TemporalMeasure,
            CsKind::Ordinal,
            CsKind::Parametric,
        ];
        ALL.iter()
            .find(|k| k.wkt_name().eq_ignore_ascii_case(name))
            .copied()
    }
}

/// Classification of the first axes of a geographic/projected CS, used
/// when deciding axis-swap steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisOrder {
    LatNorthLonEast,
    LatNorthLonEastHeightUp,
    LonEastLatNorth,
    LonEastLatNorthHeightUp,
    Other,
}

impl AxisOrder {
    pub fn latitude_first(self) -> bool {
        matches!(
            self,
            AxisOrder::LatNorthLonEast | AxisOrder::LatNorthLonEastHeightUp
        )
    }
}

/// An ordered sequence of 1-3 axes plus a kind tag.
#[derive(Clone, Debug)]
pub struct CoordinateSystem {
    kind: CsKind,
    axes: Vec<Axis>,
}

impl CoordinateSystem {
    pub fn new(kind: CsKind, axes: Vec<Axis>) -> Result<Self> {
        let n = axes.len();
        let fail = |msg: String| Err(GeorefError::invalid_value(msg));
        match kind {
            CsKind::Cartesian => {
                if n != 2 && n != 3 {
                    return fail(format!("Cartesian CS requires 2 or 3 axes, got {n}"));
                }
                if axes.iter().any(|a| a.unit().kind() != UnitKind::Length) {
                    return fail("Cartesian CS axes must all be in length units".into());
                }
            }
            CsKind::Ellipsoidal => {
                if n != 2 && n != 3 {
                    return fail(format!("ellipsoidal CS requires 2 or 3 axes, got {n}"));
                }
                let angular = axes
                    .iter()
                    .filter(|a| a.unit().kind() == UnitKind::Angle)
                    .count();
                if angular != 2 {
                    return fail("ellipsoidal CS requires exactly two angular axes".into());
                }
                if n == 3 {
                    let height = &axes[2];
                    if height.unit().kind() != UnitKind::Length
                        || !height.direction().is_vertical()
                    {
                        return fail(
                            "third ellipsoidal axis must be an up/down length axis".into(),
                        );
                    }
                }
                let has_north = axes.iter().any(|a| a.direction().is_north_bearing());
                let has_east = axes.iter().any(|a| a.direction().is_east_bearing());
                if !has_north || !has_east {
                    return fail(
                        "ellipsoidal CS requires one north-bearing and one east-bearing axis"
                            .into(),
                    );
                }
            }
            CsKind::Spherical => {
                if n != 3 {
                    return fail(format!("spherical CS requires 3 axes, got {n}"));
                }
                let angular = axes
                    .iter()
                    .filter(|a| a.unit().kind() == UnitKind::Angle)
                    .count();
                // two angular + radius, or three angular (direction cosines)
                if !(angular == 3
                    || (angular == 2
                        && axes
                            .iter()
                            .any(|a| a.unit().kind() == UnitKind::Length)))
                {
                    return fail(
                        "spherical CS requires two angular axes and a length axis, \
                         or three angular axes"
                            .into(),
                    );
                }
            }
            CsKind::Vertical => {
                if n != 1 {
                    return fail(format!("vertical CS requires 1 axis, got {n}"));
                }
                if axes[0].unit().kind() != UnitKind::Length {
                    return fail("vertical CS axis must be in a length unit".into());
                }
            }
            CsKind::TemporalDateTime | CsKind::TemporalCount | CsKind::TemporalMeasure => {
                if n != 1 {
                    return fail(format!("temporal CS requires 1 axis, got {n}"));
                }
            }
            CsKind::Ordinal | CsKind::Parametric => {
                if n == 0 {
                    return fail(format!("{kind:?} CS requires at least one axis"));
                }
            }
        }
        Ok(Self { kind, axes })
    }

    pub fn kind(&self) -> CsKind {
        self.kind
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Classify the leading axes for swap decisions.
    pub fn axis_order(&self) -> AxisOrder {
        let axes = &self.axes;
        if axes.len() < 2 {
            return AxisOrder::Other;
        }
        let first = axes[0].direction();
        let second = axes[1].direction();
        let height_up = axes.len() == 3 && axes[2].direction() == AxisDirection::Up;
        match (first, second) {
            (AxisDirection::North, AxisDirection::East) => {
                if axes.len() == 2 {
                    AxisOrder::LatNorthLonEast
                } else if height_up {
                    AxisOrder::LatNorthLonEastHeightUp
                } else {
                    AxisOrder::Other
                }
            }
            (AxisDirection::East, AxisDirection::North) => {
                if axes.len() == 2 {
                    AxisOrder::LonEastLatNorth
                } else if height_up {
                    AxisOrder::LonEastLatNorthHeightUp
                } else {
                    AxisOrder::Other
                }
            }
            _ => AxisOrder::Other,
        }
    }

    pub fn is_equivalent_to(&self, other: &CoordinateSystem, criterion: Criterion) -> bool {
        if self.kind != other.kind || self.axes.len() != other.axes.len() {
            return false;
        }
        self.axes
            .iter()
            .zip(other.axes.iter())
            .all(|(a, b)| a.is_equivalent_to(b, criterion))
    }

    /// Whether `other` is this CS with the first two axes swapped.
    pub fn is_axis_swapped_variant_of(&self, other: &CoordinateSystem) -> bool {
        if self.kind != other.kind || self.axes.len() != other.axes.len() || self.axes.len() < 2 {
            return false;
        }
        self.axes[0].is_equivalent_to(&other.axes[1], Criterion::Equivalent)
            && self.axes[1].is_equivalent_to(&other.axes[0], Criterion::Equivalent)
            && self.axes[2..]
                .iter()
                .zip(other.axes[2..].iter())
                .all(|(a, b)| a.is_equivalent_to(b, Criterion::Equivalent))
    }

    // Named constructors for the common combinations.

    /// Latitude, longitude in degrees (EPSG:6422).
    pub fn ellipsoidal_lat_lon_degree() -> CoordinateSystem {
        CoordinateSystem::new(
            CsKind::Ellipsoidal,
            vec![Axis::latitude(), Axis::longitude()],
        )
        .expect("valid by construction")
    }

    /// Latitude, longitude in degrees, ellipsoidal height in metres
    /// (EPSG:6423).
    pub fn ellipsoidal_lat_lon_height() -> CoordinateSystem {
        CoordinateSystem::new(
            CsKind::Ellipsoidal,
            vec![
                Axis::latitude(),
                Axis::longitude(),
                Axis::ellipsoidal_height(),
            ],
        )
        .expect("valid by construction")
    }

    /// Longitude, latitude in degrees; the normalized order used by the
    /// `+proj=` surface.
    pub fn ellipsoidal_lon_lat_degree() -> CoordinateSystem {
        CoordinateSystem::new(
            CsKind::Ellipsoidal,
            vec![Axis::longitude(), Axis::latitude()],
        )
        .expect("valid by construction")
    }

    /// Easting, northing in metres (EPSG:4400).
    pub fn cartesian_easting_northing_metre() -> CoordinateSystem {
        CoordinateSystem::new(CsKind::Cartesian, vec![Axis::easting(), Axis::northing()])
            .expect("valid by construction")
    }

    /// Geocentric X, Y, Z in metres (EPSG:6500).
    pub fn cartesian_geocentric_metre() -> CoordinateSystem {
        CoordinateSystem::new(
            CsKind::Cartesian,
            vec![
                Axis::new(
                    "Geocentric X",
                    "X",
                    AxisDirection::GeocentricX,
                    UnitOfMeasure::METRE,
                ),
                Axis::new(
                    "Geocentric Y",
                    "Y",
                    AxisDirection::GeocentricY,
                    UnitOfMeasure::METRE,
                ),
                Axis::new(
                    "Geocentric Z",
                    "Z",
                    AxisDirection::GeocentricZ,
                    UnitOfMeasure::METRE,
                ),
            ],
        )
        .expect("valid by construction")
    }

    /// Gravity-related height, up, metres (EPSG:6499).
    pub fn vertical_up_metre() -> CoordinateSystem {
        CoordinateSystem::new(CsKind::Vertical, vec![Axis::gravity_related_height()])
            .expect("valid by construction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_names_round_trip() {
        for d in [
            AxisDirection::North,
            AxisDirection::GeocentricX,
            AxisDirection::CounterClockwise,
            AxisDirection::AwayFrom,
        ] {
            assert_eq!(AxisDirection::from_name(d.wkt_name()), Some(d));
        }
        assert_eq!(
            AxisDirection::from_name("GEOCENTRIC_X"),
            Some(AxisDirection::GeocentricX)
        );
        assert_eq!(AxisDirection::from_name("NORTH"), Some(AxisDirection::North));
        assert_eq!(AxisDirection::from_name("sideways"), None);
    }

    #[test]
    fn test_lat_lon_classification() {
        assert_eq!(
            CoordinateSystem::ellipsoidal_lat_lon_degree().axis_order(),
            AxisOrder::LatNorthLonEast
        );
        assert_eq!(
            CoordinateSystem::ellipsoidal_lat_lon_height().axis_order(),
            AxisOrder::LatNorthLonEastHeightUp
        );
        assert_eq!(
            CoordinateSystem::ellipsoidal_lon_lat_degree().axis_order(),
            AxisOrder::LonEastLatNorth
        );
        assert_eq!(
            CoordinateSystem::cartesian_geocentric_metre().axis_order(),
            AxisOrder::Other
        );
    }

    #[test]
    fn test_cartesian_rejects_angular_axes() {
        let err = CoordinateSystem::new(
            CsKind::Cartesian,
            vec![Axis::latitude(), Axis::longitude()],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_ellipsoidal_axis_count() {
        let err = CoordinateSystem::new(CsKind::Ellipsoidal, vec![Axis::latitude()]);
        assert!(err.is_err());
        let err = CoordinateSystem::new(
            CsKind::Ellipsoidal,
            vec![
                Axis::latitude(),
                Axis::longitude(),
                Axis::ellipsoidal_height(),
                Axis::ellipsoidal_height(),
            ],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_vertical_cs() {
        assert_eq!(
            CoordinateSystem::vertical_up_metre().axes()[0].direction(),
            AxisDirection::Up
        );
        let err = CoordinateSystem::new(CsKind::Vertical, vec![Axis::latitude()]);
        assert!(err.is_err());
    }

    #[test]
    fn test_axis_swapped_variant() {
        let lat_lon = CoordinateSystem::ellipsoidal_lat_lon_degree();
        let lon_lat = CoordinateSystem::ellipsoidal_lon_lat_degree();
        assert!(lat_lon.is_axis_swapped_variant_of(&lon_lat));
        assert!(!lat_lon.is_axis_swapped_variant_of(&lat_lon));
    }
}
