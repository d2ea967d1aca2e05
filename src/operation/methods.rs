//! Registry of operation methods and parameters: EPSG codes, canonical
//! names, the WKT1 projection-name aliases, and the `+proj=` mapping.

use crate::ident::is_equivalent_name;

// Conversion (map projection) method codes.
pub const METHOD_TRANSVERSE_MERCATOR: u16 = 9807;
pub const METHOD_TRANSVERSE_MERCATOR_SOUTH_ORIENTATED: u16 = 9808;
pub const METHOD_MERCATOR_VARIANT_A: u16 = 9804;
pub const METHOD_MERCATOR_VARIANT_B: u16 = 9805;
pub const METHOD_POPULAR_VISUALISATION_PSEUDO_MERCATOR: u16 = 1024;
pub const METHOD_LAMBERT_CONIC_CONFORMAL_1SP: u16 = 9801;
pub const METHOD_LAMBERT_CONIC_CONFORMAL_2SP: u16 = 9802;
pub const METHOD_ALBERS_EQUAL_AREA: u16 = 9822;
pub const METHOD_POLAR_STEREOGRAPHIC_A: u16 = 9810;
pub const METHOD_OBLIQUE_STEREOGRAPHIC: u16 = 9809;
pub const METHOD_EQUIDISTANT_CYLINDRICAL: u16 = 1028;
pub const METHOD_LONGITUDE_ROTATION: u16 = 9601;
pub const METHOD_GEOGRAPHIC_GEOCENTRIC: u16 = 9602;

// Transformation method codes (geographic-2D domain).
pub const METHOD_GEOCENTRIC_TRANSLATIONS: u16 = 9603;
pub const METHOD_MOLODENSKY: u16 = 9604;
pub const METHOD_ABRIDGED_MOLODENSKY: u16 = 9605;
pub const METHOD_POSITION_VECTOR: u16 = 9606;
pub const METHOD_COORDINATE_FRAME: u16 = 9607;
pub const METHOD_NTV2: u16 = 9615;
pub const METHOD_VERTICAL_OFFSET: u16 = 9616;
pub const METHOD_GEOGRAPHIC2D_OFFSETS: u16 = 9619;
pub const METHOD_VERTCON: u16 = 9658;

// Parameter codes.
pub const PARAM_LATITUDE_OF_NATURAL_ORIGIN: u16 = 8801;
pub const PARAM_LONGITUDE_OF_NATURAL_ORIGIN: u16 = 8802;
pub const PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN: u16 = 8805;
pub const PARAM_FALSE_EASTING: u16 = 8806;
pub const PARAM_FALSE_NORTHING: u16 = 8807;
pub const PARAM_LATITUDE_FALSE_ORIGIN: u16 = 8821;
pub const PARAM_LONGITUDE_FALSE_ORIGIN: u16 = 8822;
pub const PARAM_LATITUDE_1ST_STD_PARALLEL: u16 = 8823;
pub const PARAM_LATITUDE_2ND_STD_PARALLEL: u16 = 8824;
pub const PARAM_EASTING_FALSE_ORIGIN: u16 = 8826;
pub const PARAM_NORTHING_FALSE_ORIGIN: u16 = 8827;
pub const PARAM_LATITUDE_OFFSET: u16 = 8601;
pub const PARAM_LONGITUDE_OFFSET: u16 = 8602;
pub const PARAM_VERTICAL_OFFSET: u16 = 8603;
pub const PARAM_X_TRANSLATION: u16 = 8605;
pub const PARAM_Y_TRANSLATION: u16 = 8606;
pub const PARAM_Z_TRANSLATION: u16 = 8607;
pub const PARAM_X_ROTATION: u16 = 8608;
pub const PARAM_Y_ROTATION: u16 = 8609;
pub const PARAM_Z_ROTATION: u16 = 8610;
pub const PARAM_SCALE_DIFFERENCE: u16 = 8611;
pub const PARAM_SEMI_MAJOR_DIFFERENCE: u16 = 8654;
pub const PARAM_FLATTENING_DIFFERENCE: u16 = 8655;
pub const PARAM_GEOGRAPHIC_GRID_FILE: u16 = 8656;
pub const PARAM_VERTICAL_GRID_FILE: u16 = 8732;
pub const PARAM_RATE_X_TRANSLATION: u16 = 1040;
pub const PARAM_RATE_Y_TRANSLATION: u16 = 1041;
pub const PARAM_RATE_Z_TRANSLATION: u16 = 1042;
pub const PARAM_RATE_X_ROTATION: u16 = 1043;
pub const PARAM_RATE_Y_ROTATION: u16 = 1044;
pub const PARAM_RATE_Z_ROTATION: u16 = 1045;
pub const PARAM_RATE_SCALE_DIFFERENCE: u16 = 1046;
pub const PARAM_REFERENCE_EPOCH: u16 = 1047;

pub const ALL_METHOD_CODES: &[u16] = &[
    METHOD_TRANSVERSE_MERCATOR,
    METHOD_TRANSVERSE_MERCATOR_SOUTH_ORIENTATED,
    METHOD_MERCATOR_VARIANT_A,
    METHOD_MERCATOR_VARIANT_B,
    METHOD_POPULAR_VISUALISATION_PSEUDO_MERCATOR,
    METHOD_LAMBERT_CONIC_CONFORMAL_1SP,
    METHOD_LAMBERT_CONIC_CONFORMAL_2SP,
    METHOD_ALBERS_EQUAL_AREA,
    METHOD_POLAR_STEREOGRAPHIC_A,
    METHOD_OBLIQUE_STEREOGRAPHIC,
    METHOD_EQUIDISTANT_CYLINDRICAL,
    METHOD_LONGITUDE_ROTATION,
    METHOD_GEOGRAPHIC_GEOCENTRIC,
    METHOD_GEOCENTRIC_TRANSLATIONS,
    METHOD_MOLODENSKY,
    METHOD_ABRIDGED_MOLODENSKY,
    METHOD_POSITION_VECTOR,
    METHOD_COORDINATE_FRAME,
    METHOD_NTV2,
    METHOD_VERTICAL_OFFSET,
    METHOD_GEOGRAPHIC2D_OFFSETS,
    METHOD_VERTCON,
];

pub const ALL_PARAM_CODES: &[u16] = &[
    PARAM_LATITUDE_OF_NATURAL_ORIGIN,
    PARAM_LONGITUDE_OF_NATURAL_ORIGIN,
    PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN,
    PARAM_FALSE_EASTING,
    PARAM_FALSE_NORTHING,
    PARAM_LATITUDE_FALSE_ORIGIN,
    PARAM_LONGITUDE_FALSE_ORIGIN,
    PARAM_LATITUDE_1ST_STD_PARALLEL,
    PARAM_LATITUDE_2ND_STD_PARALLEL,
    PARAM_EASTING_FALSE_ORIGIN,
    PARAM_NORTHING_FALSE_ORIGIN,
    PARAM_LATITUDE_OFFSET,
    PARAM_LONGITUDE_OFFSET,
    PARAM_VERTICAL_OFFSET,
    PARAM_X_TRANSLATION,
    PARAM_Y_TRANSLATION,
    PARAM_Z_TRANSLATION,
    PARAM_X_ROTATION,
    PARAM_Y_ROTATION,
    PARAM_Z_ROTATION,
    PARAM_SCALE_DIFFERENCE,
    PARAM_SEMI_MAJOR_DIFFERENCE,
    PARAM_FLATTENING_DIFFERENCE,
    PARAM_GEOGRAPHIC_GRID_FILE,
    PARAM_VERTICAL_GRID_FILE,
    PARAM_RATE_X_TRANSLATION,
    PARAM_RATE_Y_TRANSLATION,
    PARAM_RATE_Z_TRANSLATION,
    PARAM_RATE_X_ROTATION,
    PARAM_RATE_Y_ROTATION,
    PARAM_RATE_Z_ROTATION,
    PARAM_RATE_SCALE_DIFFERENCE,
    PARAM_REFERENCE_EPOCH,
];

/// Resolve a canonical (WKT2) method name back to its code.
pub fn method_code_from_name(name: &str) -> Option<u16> {
    ALL_METHOD_CODES
        .iter()
        .find(|c| {
            method_name(**c)
                .map(|n| is_equivalent_name(n, name))
                .unwrap_or(false)
        })
        .copied()
}

/// Resolve a canonical parameter name back to its code.
pub fn param_code_from_name(name: &str) -> Option<u16> {
    ALL_PARAM_CODES
        .iter()
        .find(|c| {
            parameter_name(**c)
                .map(|n| is_equivalent_name(n, name))
                .unwrap_or(false)
        })
        .copied()
}

/// Canonical (WKT2 / EPSG registry) method names.
pub fn method_name(code: u16) -> Option<&'static str> {
    Some(match code {
        METHOD_TRANSVERSE_MERCATOR => "Transverse Mercator",
        METHOD_TRANSVERSE_MERCATOR_SOUTH_ORIENTATED => "Transverse Mercator (South Orientated)",
        METHOD_MERCATOR_VARIANT_A => "Mercator (variant A)",
        METHOD_MERCATOR_VARIANT_B => "Mercator (variant B)",
        METHOD_POPULAR_VISUALISATION_PSEUDO_MERCATOR => {
            "Popular Visualisation Pseudo Mercator"
        }
        METHOD_LAMBERT_CONIC_CONFORMAL_1SP => "Lambert Conic Conformal (1SP)",
        METHOD_LAMBERT_CONIC_CONFORMAL_2SP => "Lambert Conic Conformal (2SP)",
        METHOD_ALBERS_EQUAL_AREA => "Albers Equal Area",
        METHOD_POLAR_STEREOGRAPHIC_A => "Polar Stereographic (variant A)",
        METHOD_OBLIQUE_STEREOGRAPHIC => "Oblique Stereographic",
        METHOD_EQUIDISTANT_CYLINDRICAL => "Equidistant Cylindrical",
        METHOD_LONGITUDE_ROTATION => "Longitude rotation",
        METHOD_GEOGRAPHIC_GEOCENTRIC => "Geographic/geocentric conversions",
        METHOD_GEOCENTRIC_TRANSLATIONS => "Geocentric translations (geog2D domain)",
        METHOD_MOLODENSKY => "Molodensky",
        METHOD_ABRIDGED_MOLODENSKY => "Abridged Molodensky",
        METHOD_POSITION_VECTOR => "Position Vector transformation (geog2D domain)",
        METHOD_COORDINATE_FRAME => "Coordinate Frame rotation (geog2D domain)",
        METHOD_NTV2 => "NTv2",
        METHOD_VERTICAL_OFFSET => "Vertical Offset",
        METHOD_GEOGRAPHIC2D_OFFSETS => "Geographic2D offsets",
        METHOD_VERTCON => "VERTCON",
        _ => return None,
    })
}

/// Canonical parameter names.
pub fn parameter_name(code: u16) -> Option<&'static str> {
    Some(match code {
        PARAM_LATITUDE_OF_NATURAL_ORIGIN => "Latitude of natural origin",
        PARAM_LONGITUDE_OF_NATURAL_ORIGIN => "Longitude of natural origin",
        PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN => "Scale factor at natural origin",
        PARAM_FALSE_EASTING => "False easting",
        PARAM_FALSE_NORTHING => "False northing",
        PARAM_LATITUDE_FALSE_ORIGIN => "Latitude of false origin",
        PARAM_LONGITUDE_FALSE_ORIGIN => "Longitude of false origin",
        PARAM_LATITUDE_1ST_STD_PARALLEL => "Latitude of 1st standard parallel",
        PARAM_LATITUDE_2ND_STD_PARALLEL => "Latitude of 2nd standard parallel",
        PARAM_EASTING_FALSE_ORIGIN => "Easting at false origin",
        PARAM_NORTHING_FALSE_ORIGIN => "Northing at false origin",
        PARAM_LATITUDE_OFFSET => "Latitude offset",
        PARAM_LONGITUDE_OFFSET => "Longitude offset",
        PARAM_VERTICAL_OFFSET => "Vertical Offset",
        PARAM_X_TRANSLATION => "X-axis translation",
        PARAM_Y_TRANSLATION => "Y-axis translation",
        PARAM_Z_TRANSLATION => "Z-axis translation",
        PARAM_X_ROTATION => "X-axis rotation",
        PARAM_Y_ROTATION => "Y-axis rotation",
        PARAM_Z_ROTATION => "Z-axis rotation",
        PARAM_SCALE_DIFFERENCE => "Scale difference",
        PARAM_SEMI_MAJOR_DIFFERENCE => "Semi-major axis length difference",
        PARAM_FLATTENING_DIFFERENCE => "Flattening difference",
        PARAM_GEOGRAPHIC_GRID_FILE => "Latitude and longitude difference file",
        PARAM_VERTICAL_GRID_FILE => "Vertical offset file",
        PARAM_RATE_X_TRANSLATION => "Rate of change of X-axis translation",
        PARAM_RATE_Y_TRANSLATION => "Rate of change of Y-axis translation",
        PARAM_RATE_Z_TRANSLATION => "Rate of change of Z-axis translation",
        PARAM_RATE_X_ROTATION => "Rate of change of X-axis rotation",
        PARAM_RATE_Y_ROTATION => "Rate of change of Y-axis rotation",
        PARAM_RATE_Z_ROTATION => "Rate of change of Z-axis rotation",
        PARAM_RATE_SCALE_DIFFERENCE => "Rate of change of Scale difference",
        PARAM_REFERENCE_EPOCH => "Parameter reference epoch",
        _ => return None,
    })
}

/// WKT1-GDAL projection name for a method, when one exists.
pub fn wkt1_projection_name(method_code: u16) -> Option<&'static str> {
    Some(match method_code {
        METHOD_TRANSVERSE_MERCATOR => "Transverse_Mercator",
        METHOD_TRANSVERSE_MERCATOR_SOUTH_ORIENTATED => "Transverse_Mercator_South_Orientated",
        // Both Mercator variants collapse onto Mercator_1SP / Mercator_2SP
        METHOD_MERCATOR_VARIANT_A => "Mercator_1SP",
        METHOD_MERCATOR_VARIANT_B => "Mercator_2SP",
        METHOD_POPULAR_VISUALISATION_PSEUDO_MERCATOR => "Mercator_1SP",
        METHOD_LAMBERT_CONIC_CONFORMAL_1SP => "Lambert_Conformal_Conic_1SP",
        METHOD_LAMBERT_CONIC_CONFORMAL_2SP => "Lambert_Conformal_Conic_2SP",
        METHOD_ALBERS_EQUAL_AREA => "Albers_Conic_Equal_Area",
        METHOD_POLAR_STEREOGRAPHIC_A => "Polar_Stereographic",
        METHOD_OBLIQUE_STEREOGRAPHIC => "Oblique_Stereographic",
        METHOD_EQUIDISTANT_CYLINDRICAL => "Equirectangular",
        _ => return None,
    })
}

/// Resolve a WKT1 projection name to a WKT2 method code.
///
/// `Mercator_1SP` is ambiguous: when a non-zero `latitude_of_origin` is
/// present together with `scale_factor` 1, GDAL-era files actually mean
/// variant B with that latitude as the standard parallel. This rule is
/// not written in any standard but reproduces long-observed behavior;
/// callers pass the raw WKT1 parameters so it can be applied.
pub fn method_code_from_wkt1_projection(
    name: &str,
    latitude_of_origin: Option<f64>,
    scale_factor: Option<f64>,
) -> Option<u16> {
    const TABLE: &[(&str, u16)] = &[
        ("Transverse_Mercator", METHOD_TRANSVERSE_MERCATOR),
        (
            "Transverse_Mercator_South_Orientated",
            METHOD_TRANSVERSE_MERCATOR_SOUTH_ORIENTATED,
        ),
        ("Mercator_1SP", METHOD_MERCATOR_VARIANT_A),
        ("Mercator_2SP", METHOD_MERCATOR_VARIANT_B),
        ("Lambert_Conformal_Conic_1SP", METHOD_LAMBERT_CONIC_CONFORMAL_1SP),
        ("Lambert_Conformal_Conic_2SP", METHOD_LAMBERT_CONIC_CONFORMAL_2SP),
        ("Albers_Conic_Equal_Area", METHOD_ALBERS_EQUAL_AREA),
        ("Polar_Stereographic", METHOD_POLAR_STEREOGRAPHIC_A),
        ("Oblique_Stereographic", METHOD_OBLIQUE_STEREOGRAPHIC),
        ("Equirectangular", METHOD_EQUIDISTANT_CYLINDRICAL),
    ];
    let code = TABLE
        .iter()
        .find(|(n, _)| is_equivalent_name(n, name))
        .map(|(_, c)| *c)?;
    if code == METHOD_MERCATOR_VARIANT_A {
        if let (Some(lat), Some(k)) = (latitude_of_origin, scale_factor) {
            if lat != 0.0 && k == 1.0 {
                return Some(METHOD_MERCATOR_VARIANT_B);
            }
        }
    }
    Some(code)
}

/// WKT1 parameter spelling for a WKT2 parameter, in the context of the
/// given method.
pub fn wkt1_parameter_name(_method_code: u16, param_code: u16) -> Option<&'static str> {
    // LCC 2SP and Albers use the false-origin family in WKT2 but keep the
    // natural-origin spellings in WKT1.
    Some(match param_code {
        PARAM_LATITUDE_OF_NATURAL_ORIGIN | PARAM_LATITUDE_FALSE_ORIGIN => "latitude_of_origin",
        PARAM_LONGITUDE_OF_NATURAL_ORIGIN | PARAM_LONGITUDE_FALSE_ORIGIN => "central_meridian",
        PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN => "scale_factor",
        PARAM_FALSE_EASTING | PARAM_EASTING_FALSE_ORIGIN => "false_easting",
        PARAM_FALSE_NORTHING | PARAM_NORTHING_FALSE_ORIGIN => "false_northing",
        PARAM_LATITUDE_1ST_STD_PARALLEL => "standard_parallel_1",
        PARAM_LATITUDE_2ND_STD_PARALLEL => "standard_parallel_2",
        _ => return None,
    })
}

/// WKT2 parameter code for a WKT1 parameter spelling, in the context of
/// the given method.
pub fn param_code_from_wkt1_name(method_code: u16, name: &str) -> Option<u16> {
    let false_origin_family = matches!(
        method_code,
        METHOD_LAMBERT_CONIC_CONFORMAL_2SP | METHOD_ALBERS_EQUAL_AREA
    );
    let code = if is_equivalent_name(name, "latitude_of_origin") {
        if false_origin_family {
            PARAM_LATITUDE_FALSE_ORIGIN
        } else {
            PARAM_LATITUDE_OF_NATURAL_ORIGIN
        }
    } else if is_equivalent_name(name, "central_meridian") {
        if false_origin_family {
            PARAM_LONGITUDE_FALSE_ORIGIN
        } else {
            PARAM_LONGITUDE_OF_NATURAL_ORIGIN
        }
    } else if is_equivalent_name(name, "scale_factor") {
        PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN
    } else if is_equivalent_name(name, "false_easting") {
        if false_origin_family {
            PARAM_EASTING_FALSE_ORIGIN
        } else {
            PARAM_FALSE_EASTING
        }
    } else if is_equivalent_name(name, "false_northing") {
        if false_origin_family {
            PARAM_NORTHING_FALSE_ORIGIN
        } else {
            PARAM_FALSE_NORTHING
        }
    } else if is_equivalent_name(name, "standard_parallel_1") {
        PARAM_LATITUDE_1ST_STD_PARALLEL
    } else if is_equivalent_name(name, "standard_parallel_2") {
        PARAM_LATITUDE_2ND_STD_PARALLEL
    } else {
        return None;
    };
    Some(code)
}

/// `+proj=` body name for a projection method.
pub fn proj_name(method_code: u16) -> Option<&'static str> {
    Some(match method_code {
        METHOD_TRANSVERSE_MERCATOR | METHOD_TRANSVERSE_MERCATOR_SOUTH_ORIENTATED => "tmerc",
        METHOD_MERCATOR_VARIANT_A
        | METHOD_MERCATOR_VARIANT_B
        | METHOD_POPULAR_VISUALISATION_PSEUDO_MERCATOR => "merc",
        METHOD_LAMBERT_CONIC_CONFORMAL_1SP | METHOD_LAMBERT_CONIC_CONFORMAL_2SP => "lcc",
        METHOD_ALBERS_EQUAL_AREA => "aea",
        METHOD_POLAR_STEREOGRAPHIC_A => "stere",
        METHOD_OBLIQUE_STEREOGRAPHIC => "sterea",
        METHOD_EQUIDISTANT_CYLINDRICAL => "eqc",
        _ => return None,
    })
}

/// Methods whose numeric parameters flip sign under inversion.
pub fn has_analytic_negation_inverse(method_code: u16) -> bool {
    matches!(
        method_code,
        METHOD_GEOCENTRIC_TRANSLATIONS
            | METHOD_POSITION_VECTOR
            | METHOD_COORDINATE_FRAME
            | METHOD_MOLODENSKY
            | METHOD_ABRIDGED_MOLODENSKY
            | METHOD_LONGITUDE_ROTATION
            | METHOD_GEOGRAPHIC2D_OFFSETS
            | METHOD_VERTICAL_OFFSET
    )
}

/// Helmert-family methods (translations, rotations, scale).
pub fn is_helmert_family(method_code: u16) -> bool {
    matches!(
        method_code,
        METHOD_GEOCENTRIC_TRANSLATIONS | METHOD_POSITION_VECTOR | METHOD_COORDINATE_FRAME
    )
}

/// Grid-based methods: inversion is a direction flag for the runtime.
pub fn is_grid_based(method_code: u16) -> bool {
    matches!(method_code, METHOD_NTV2 | METHOD_VERTCON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mercator_1sp_disambiguation() {
        // Plain Mercator_1SP is variant A
        assert_eq!(
            method_code_from_wkt1_projection("Mercator_1SP", None, Some(2.0)),
            Some(METHOD_MERCATOR_VARIANT_A)
        );
        // Non-zero latitude of origin with unit scale is variant B
        assert_eq!(
            method_code_from_wkt1_projection("Mercator_1SP", Some(-1.0), Some(1.0)),
            Some(METHOD_MERCATOR_VARIANT_B)
        );
        // Non-zero latitude with non-unit scale stays variant A
        assert_eq!(
            method_code_from_wkt1_projection("Mercator_1SP", Some(-1.0), Some(0.9)),
            Some(METHOD_MERCATOR_VARIANT_A)
        );
    }

    #[test]
    fn test_wkt1_name_lookup_is_case_insensitive() {
        assert_eq!(
            method_code_from_wkt1_projection("transverse_mercator", None, None),
            Some(METHOD_TRANSVERSE_MERCATOR)
        );
        assert_eq!(
            method_code_from_wkt1_projection("No_Such_Projection", None, None),
            None
        );
    }

    #[test]
    fn test_wkt1_param_context() {
        assert_eq!(
            param_code_from_wkt1_name(METHOD_LAMBERT_CONIC_CONFORMAL_2SP, "latitude_of_origin"),
            Some(PARAM_LATITUDE_FALSE_ORIGIN)
        );
        assert_eq!(
            param_code_from_wkt1_name(METHOD_TRANSVERSE_MERCATOR, "latitude_of_origin"),
            Some(PARAM_LATITUDE_OF_NATURAL_ORIGIN)
        );
    }

    #[test]
    fn test_proj_names() {
        assert_eq!(proj_name(METHOD_TRANSVERSE_MERCATOR), Some("tmerc"));
        assert_eq!(proj_name(METHOD_MERCATOR_VARIANT_B), Some("merc"));
        assert_eq!(proj_name(METHOD_NTV2), None);
    }
}
