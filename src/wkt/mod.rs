//! Well-Known Text I/O: tokenizer, recursive-descent parser, and
//! formatter for the WKT1-GDAL, WKT2:2015 and WKT2:2018 dialects.

pub mod formatter;
pub mod parser;
pub mod tokenizer;

pub use parser::parse_crs;
pub use tokenizer::{WktNode, WktValue};

/// Output dialect of the WKT formatter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WktConvention {
    Wkt2_2018,
    Wkt2_2018Simplified,
    Wkt2_2015,
    Wkt2_2015Simplified,
    Wkt1Gdal,
    Wkt1Esri,
}

impl WktConvention {
    pub fn is_wkt2(self) -> bool {
        !matches!(self, WktConvention::Wkt1Gdal | WktConvention::Wkt1Esri)
    }

    pub fn use_2018_keywords(self) -> bool {
        matches!(
            self,
            WktConvention::Wkt2_2018 | WktConvention::Wkt2_2018Simplified
        )
    }

    pub fn is_simplified(self) -> bool {
        matches!(
            self,
            WktConvention::Wkt2_2018Simplified | WktConvention::Wkt2_2015Simplified
        )
    }
}

/// Render a double the way the WKT surface expects: 15 significant
/// digits, trailing zeros trimmed, no exponent for ordinary magnitudes.
pub(crate) fn format_double(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let mag = v.abs().log10().floor() as i32;
    if !(-6..15).contains(&mag) {
        return format!("{:e}", v);
    }
    let decimals = (15 - 1 - mag).max(0) as usize;
    let s = format!("{v:.decimals$}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        trimmed.to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_double_wkt_shapes() {
        assert_eq!(format_double(0.0), "0");
        assert_eq!(format_double(6378137.0), "6378137");
        assert_eq!(format_double(298.257223563), "298.257223563");
        assert_eq!(
            format_double(std::f64::consts::PI / 180.0),
            "0.0174532925199433"
        );
        assert_eq!(
            format_double(std::f64::consts::PI / 200.0),
            "0.015707963267949"
        );
        assert_eq!(format_double(2.5969213), "2.5969213");
        assert_eq!(format_double(-60.0), "-60");
    }
}
