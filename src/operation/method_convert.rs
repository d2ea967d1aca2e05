//! Closed-form re-expression of a conversion in an equivalent method:
//! Mercator variant A <-> variant B and Lambert Conic Conformal
//! 1SP <-> 2SP.
//!
//! Numerically impossible inputs (scale <= 0, eccentricity >= 1,
//! latitudes at or beyond the poles, opposite standard parallels) yield
//! `None` so callers can fall back cleanly.

use super::conversion::Conversion;
use super::methods::*;
use crate::datum::Ellipsoid;
use crate::ident::IdentifiedObject;
use crate::measure::{Angle, Length, Scale, UnitOfMeasure};

/// Scale factor along a parallel: m(phi) = cos(phi) / sqrt(1 - e2 sin2).
fn msfn(phi: f64, e2: f64) -> f64 {
    let s = phi.sin();
    phi.cos() / (1.0 - e2 * s * s).sqrt()
}

/// Isometric latitude function used by conformal conic projections.
fn tsfn(phi: f64, e: f64) -> f64 {
    let s = phi.sin();
    (std::f64::consts::FRAC_PI_4 - phi / 2.0).tan()
        / ((1.0 - e * s) / (1.0 + e * s)).powf(e / 2.0)
}

fn d_ln_msfn(phi: f64, e2: f64) -> f64 {
    let s = phi.sin();
    let c = phi.cos();
    -s / c + e2 * s * c / (1.0 - e2 * s * s)
}

fn d_ln_tsfn(phi: f64, e2: f64) -> f64 {
    let s = phi.sin();
    -(1.0 - e2) / ((1.0 - e2 * s * s) * phi.cos())
}

/// Re-express `conv` in the method identified by `target_method_code`.
/// The base ellipsoid drives the conformal math; WGS 84 is assumed when
/// none is supplied.
pub fn convert(
    conv: &Conversion,
    target_method_code: u16,
    ellipsoid: Option<&Ellipsoid>,
) -> Option<Conversion> {
    let current = conv.method().epsg_code()?;
    if current == target_method_code {
        return Some(conv.clone());
    }
    let wgs84;
    let ellipsoid: &Ellipsoid = match ellipsoid {
        Some(e) => e,
        None => {
            wgs84 = Ellipsoid::wgs84();
            &wgs84
        }
    };
    let a = ellipsoid.semi_major_axis().si_value();
    let e2 = ellipsoid.squared_eccentricity();
    if e2 >= 1.0 {
        return None;
    }

    match (current, target_method_code) {
        (METHOD_MERCATOR_VARIANT_A, METHOD_MERCATOR_VARIANT_B) => {
            mercator_a_to_b(conv, e2)
        }
        (METHOD_MERCATOR_VARIANT_B, METHOD_MERCATOR_VARIANT_A) => {
            mercator_b_to_a(conv, e2)
        }
        (METHOD_LAMBERT_CONIC_CONFORMAL_2SP, METHOD_LAMBERT_CONIC_CONFORMAL_1SP) => {
            lcc_2sp_to_1sp(conv, a, e2)
        }
        (METHOD_LAMBERT_CONIC_CONFORMAL_1SP, METHOD_LAMBERT_CONIC_CONFORMAL_2SP) => {
            lcc_1sp_to_2sp(conv, a, e2)
        }
        _ => None,
    }
}

fn degree(conv: &Conversion, code: u16) -> Option<f64> {
    conv.parameter_numeric(code, &UnitOfMeasure::DEGREE)
}

fn metre(conv: &Conversion, code: u16) -> Option<f64> {
    conv.parameter_numeric(code, &UnitOfMeasure::METRE)
}

fn mercator_a_to_b(conv: &Conversion, e2: f64) -> Option<Conversion> {
    let k0 = conv.parameter_numeric(PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN, &UnitOfMeasure::UNITY)?;
    if k0 <= 0.0 {
        return None;
    }
    let lon0 = degree(conv, PARAM_LONGITUDE_OF_NATURAL_ORIGIN)?;
    let fe = metre(conv, PARAM_FALSE_EASTING)?;
    let fn_ = metre(conv, PARAM_FALSE_NORTHING)?;
    // Solve msfn(phi1) = k0 for phi1:
    //   cos2 / (1 - e2 sin2) = k02  =>  sin2 = (1 - k02) / (1 - k02 e2)
    let sin2 = (1.0 - k0 * k0) / (1.0 - k0 * k0 * e2);
    if !(0.0..=1.0).contains(&sin2) {
        return None;
    }
    let phi1 = sin2.sqrt().asin();
    Some(Conversion::mercator_variant_b(
        IdentifiedObject::named(conv.name().to_string()),
        Angle::new(phi1.to_degrees()),
        Angle::new(lon0),
        Length::new(fe),
        Length::new(fn_),
    ))
}

fn mercator_b_to_a(conv: &Conversion, e2: f64) -> Option<Conversion> {
    let lat1 = degree(conv, PARAM_LATITUDE_1ST_STD_PARALLEL)?;
    if lat1.abs() >= 90.0 {
        return None;
    }
    let lon0 = degree(conv, PARAM_LONGITUDE_OF_NATURAL_ORIGIN)?;
    let fe = metre(conv, PARAM_FALSE_EASTING)?;
    let fn_ = metre(conv, PARAM_FALSE_NORTHING)?;
    let k0 = msfn(lat1.to_radians(), e2);
    if k0 <= 0.0 {
        return None;
    }
    Some(Conversion::mercator_variant_a(
        IdentifiedObject::named(conv.name().to_string()),
        Angle::new(0.0),
        Angle::new(lon0),
        Scale::new(k0),
        Length::new(fe),
        Length::new(fn_),
    ))
}

fn lcc_2sp_to_1sp(conv: &Conversion, a: f64, e2: f64) -> Option<Conversion> {
    let phi_f = degree(conv, PARAM_LATITUDE_FALSE_ORIGIN)?;
    let lambda_f = degree(conv, PARAM_LONGITUDE_FALSE_ORIGIN)?;
    let phi1 = degree(conv, PARAM_LATITUDE_1ST_STD_PARALLEL)?;
    let phi2 = degree(conv, PARAM_LATITUDE_2ND_STD_PARALLEL)?;
    let ef = metre(conv, PARAM_EASTING_FALSE_ORIGIN)?;
    let nf = metre(conv, PARAM_NORTHING_FALSE_ORIGIN)?;
    if phi1.abs() >= 90.0 || phi2.abs() >= 90.0 || phi_f.abs() >= 90.0 {
        return None;
    }

    let e = e2.sqrt();
    let p1 = phi1.to_radians();
    let p2 = phi2.to_radians();
    let pf = phi_f.to_radians();
    let m1 = msfn(p1, e2);
    let t1 = tsfn(p1, e);

    let n = if (phi1 - phi2).abs() < 1e-14 {
        p1.sin()
    } else {
        let m2 = msfn(p2, e2);
        let t2 = tsfn(p2, e);
        (m1.ln() - m2.ln()) / (t1.ln() - t2.ln())
    };
    // Opposite parallels degenerate to a cylinder (n == 0)
    if n.abs() < 1e-15 || n.abs() > 1.0 {
        return None;
    }
    let big_f = m1 / (n * t1.powf(n));
    let phi0 = n.asin();
    let m0 = msfn(phi0, e2);
    let t0 = tsfn(phi0, e);
    let k0 = m1 / m0 * (t0.powf(n) / t1.powf(n));
    // Shift the false northing from the false origin to the natural origin
    let rho = |t: f64| a * big_f * t.powf(n);
    let tf = tsfn(pf, e);
    let y0 = nf + rho(tf) - rho(t0);

    Some(Conversion::lambert_conic_conformal_1sp(
        IdentifiedObject::named(conv.name().to_string()),
        Angle::new(phi0.to_degrees()),
        Angle::new(lambda_f),
        Scale::new(k0),
        Length::new(ef),
        Length::new(y0),
    ))
}

fn lcc_1sp_to_2sp(conv: &Conversion, a: f64, e2: f64) -> Option<Conversion> {
    let phi0_deg = degree(conv, PARAM_LATITUDE_OF_NATURAL_ORIGIN)?;
    let lambda0 = degree(conv, PARAM_LONGITUDE_OF_NATURAL_ORIGIN)?;
    let k0 = conv.parameter_numeric(PARAM_SCALE_FACTOR_AT_NATURAL_ORIGIN, &UnitOfMeasure::UNITY)?;
    let x0 = metre(conv, PARAM_FALSE_EASTING)?;
    let y0 = metre(conv, PARAM_FALSE_NORTHING)?;
    if k0 <= 0.0 || phi0_deg.abs() >= 90.0 {
        return None;
    }
    let phi0 = phi0_deg.to_radians();

    if (k0 - 1.0).abs() < 1e-15 {
        // Tangent cone: both parallels collapse onto the natural origin
        return Some(Conversion::lambert_conic_conformal_2sp(
            IdentifiedObject::named(conv.name().to_string()),
            Angle::new(phi0_deg),
            Angle::new(lambda0),
            Angle::new(phi0_deg),
            Angle::new(phi0_deg),
            Length::new(x0),
            Length::new(y0),
        ));
    }
    if k0 > 1.0 {
        return None;
    }

    let e = e2.sqrt();
    let n = phi0.sin();
    if n.abs() < 1e-15 {
        return None;
    }
    let m0 = msfn(phi0, e2);
    let t0 = tsfn(phi0, e);
    // The secant cone crosses scale 1 at two latitudes around phi0:
    //   f(phi) = ln m(phi) - ln(k0 m0) - n (ln t(phi) - ln t0) = 0
    let f = |phi: f64| msfn(phi, e2).ln() - (k0 * m0).ln() - n * (tsfn(phi, e).ln() - t0.ln());
    let fp = |phi: f64| d_ln_msfn(phi, e2) - n * d_ln_tsfn(phi, e2);

    let phi1 = find_unit_scale_latitude(phi0, 1, f, fp)?;
    let phi2 = find_unit_scale_latitude(phi0, -1, f, fp)?;

    // Anchor the false origin at the mid-latitude of the parallels and
    // shift the false northing back from the natural origin. Both cones
    // share the radius function rho since k0 F0 equals the 2SP constant.
    let phi_f = (phi1 + phi2) / 2.0;
    let f0 = m0 / (n * t0.powf(n));
    let rho = |phi: f64| a * k0 * f0 * tsfn(phi, e).powf(n);
    let nf = y0 + rho(phi0) - rho(phi_f);

    Some(Conversion::lambert_conic_conformal_2sp(
        IdentifiedObject::named(conv.name().to_string()),
        Angle::new(phi_f.to_degrees()),
        Angle::new(lambda0),
        Angle::new(phi1.to_degrees()),
        Angle::new(phi2.to_degrees()),
        Length::new(x0),
        Length::new(nf),
    ))
}

/// Scan outward from `phi0` in the given direction for the latitude
/// where the cone scale returns to 1, then polish with Newton.
fn find_unit_scale_latitude(
    phi0: f64,
    direction: i32,
    f: impl Fn(f64) -> f64,
    fp: impl Fn(f64) -> f64,
) -> Option<f64> {
    let step = direction as f64 * 0.002;
    let mut prev = phi0;
    let mut prev_val = f(prev);
    let limit = 89.9_f64.to_radians();
    let mut cur = phi0 + step;
    while cur.abs() < limit {
        let val = f(cur);
        if !val.is_finite() {
            return None;
        }
        if prev_val > 0.0 && val <= 0.0 {
            // Bracketed; polish with Newton, guarded by the bracket
            let (mut lo, mut hi) = if prev < cur { (prev, cur) } else { (cur, prev) };
            let mut x = 0.5 * (lo + hi);
            for _ in 0..100 {
                let fx = f(x);
                if fx.abs() < 1e-17 {
                    break;
                }
                if fx > 0.0 {
                    if prev < cur {
                        lo = x;
                    } else {
                        hi = x;
                    }
                } else if prev < cur {
                    hi = x;
                } else {
                    lo = x;
                }
                let d = fp(x);
                let next = x - fx / d;
                x = if d != 0.0 && next > lo && next < hi {
                    next
                } else {
                    0.5 * (lo + hi)
                };
            }
            return Some(x);
        }
        prev = cur;
        prev_val = val;
        cur += step;
    }
    None
}
