//! `+proj=` string I/O: the key/value parser, the pipeline formatter and
//! its peephole simplifications.

pub mod formatter;
pub mod parser;

pub use parser::{parse_proj_string, ProjObject};

use crate::error::{GeorefError, Result};
use crate::wkt::format_double as wkt_format_double;

/// Output dialect: `Proj5` emits `+proj=pipeline` with `+step` markers;
/// `Proj4` is the legacy flattened form and fails when the operation
/// cannot be expressed as a single equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ProjStringConvention {
    #[default]
    Proj5,
    Proj4,
}

pub(crate) fn format_double(v: f64) -> String {
    wkt_format_double(v)
}

/// One step of a pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub name: String,
    pub inverted: bool,
    pub params: Vec<(String, Option<String>)>,
}

impl Step {
    pub fn new(name: impl Into<String>) -> Step {
        Step {
            name: name.into(),
            inverted: false,
            params: Vec::new(),
        }
    }

    pub fn inv(mut self) -> Step {
        self.inverted = !self.inverted;
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Step {
        self.params.push((key.into(), Some(value.into())));
        self
    }

    pub fn with_flag(mut self, key: impl Into<String>) -> Step {
        self.params.push((key.into(), None));
        self
    }

    pub fn with_double(self, key: impl Into<String>, value: f64) -> Step {
        self.with(key, format_double(value))
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    fn write(&self, out: &mut String, with_step_marker: bool) {
        if with_step_marker {
            out.push_str("+step ");
        }
        if self.inverted {
            out.push_str("+inv ");
        }
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

    /// Self-inverse and direction-symmetric steps shed their `+inv`
    /// marker: an inverted axis swap is the same swap, an inverted unit
    /// conversion swaps its units.
    fn normalized(mut self) -> Step {
        if self.inverted {
            match self.name.as_str() {
                "axisswap" if self.param("order") == Some("2,1") => {
                    self.inverted = false;
                }
                "unitconvert" => {
                    let mut swap = |a: &str, b: &str| {
                        let ia = self.params.iter().position(|(k, _)| k == a);
                        let ib = self.params.iter().position(|(k, _)| k == b);
                        match (ia, ib) {
                            (Some(ia), Some(ib)) => {
                                let tmp = self.params[ia].1.clone();
                                self.params[ia].1 = self.params[ib].1.clone();
                                self.params[ib].1 = tmp;
                            }
                            (Some(only), None) => self.params[only].0 = b.to_string(),
                            (None, Some(only)) => self.params[only].0 = a.to_string(),
                            (None, None) => {}
                        }
                    };
                    swap("xy_in", "xy_out");
                    swap("z_in", "z_out");
                    self.inverted = false;
                }
                _ => {}
            }
        }
        self
    }

    /// A unit conversion whose inputs equal its outputs does nothing;
    /// nor does an all-zero geographic offset.
    fn is_identity(&self) -> bool {
        match self.name.as_str() {
            "unitconvert" => {
                self.param("xy_in") == self.param("xy_out")
                    && self.param("z_in") == self.param("z_out")
            }
            "axisswap" => self.param("order") == Some("1,2"),
            "geogoffset" => self
                .params
                .iter()
                .all(|(_, v)| matches!(v.as_deref().map(str::parse::<f64>), Some(Ok(x)) if x == 0.0)),
            _ => false,
        }
    }

    /// Whether `self` immediately followed by `next` collapses away.
    fn cancels_with(&self, next: &Step) -> bool {
        if self.name != next.name {
            return false;
        }
        match self.name.as_str() {
            // A unit conversion followed by its mirror image
            "unitconvert" => {
                self.inverted == next.inverted
                    && self.param("xy_in") == next.param("xy_out")
                    && self.param("xy_out") == next.param("xy_in")
                    && self.param("z_in") == next.param("z_out")
                    && self.param("z_out") == next.param("z_in")
            }
            // Swapping the first two axes twice is a no-op
            "axisswap" => {
                self.param("order") == Some("2,1") && next.param("order") == Some("2,1")
            }
            // Two Helmert steps whose parameters sum to zero, in the
            // same rotation convention
            "helmert" => {
                let sum_zero = |key: &str| {
                    let a: f64 = self.param(key).map(|v| v.parse().unwrap_or(f64::NAN)).unwrap_or(0.0);
                    let b: f64 = next.param(key).map(|v| v.parse().unwrap_or(f64::NAN)).unwrap_or(0.0);
                    (a + b).abs() < 1e-12
                };
                self.inverted == next.inverted
                    && self.param("convention") == next.param("convention")
                    && ["x", "y", "z", "rx", "ry", "rz", "s"].iter().all(|k| sum_zero(k))
            }
            // A step followed by its exact inverse
            _ => self.inverted != next.inverted && self.params == next.params,
        }
    }
}

/// Accumulates pipeline steps and emits the final string after
/// peephole simplification.
#[derive(Default, Debug)]
pub struct PipelineBuilder {
    steps: Vec<Step>,
    globals: Vec<(String, Option<String>)>,
}

impl PipelineBuilder {
    pub fn new() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn push(&mut self, step: Step) {
        let step = step.normalized();
        if !step.is_identity() {
            self.steps.push(step);
        }
    }

    pub fn push_global(&mut self, key: impl Into<String>, value: Option<String>) {
        self.globals.push((key.into(), value));
    }

    pub fn extend(&mut self, steps: impl IntoIterator<Item = Step>) {
        for step in steps {
            self.push(step);
        }
    }

    fn simplify(&mut self) {
        loop {
            let mut removed = false;
            let mut i = 0;
            while i + 1 < self.steps.len() {
                if self.steps[i].cancels_with(&self.steps[i + 1]) {
                    self.steps.drain(i..=i + 1);
                    removed = true;
                } else {
                    i += 1;
                }
            }
            self.steps.retain(|s| !s.is_identity());
            if !removed {
                break;
            }
        }
    }

    /// Emit the pipeline. An identity pipeline is the empty string; a
    /// single forward step without globals drops the pipeline wrapper.
    pub fn finish(mut self, convention: ProjStringConvention) -> Result<String> {
        self.simplify();
        if self.steps.is_empty() {
            return Ok(String::new());
        }
        if self.steps.len() == 1 && !self.steps[0].inverted && self.globals.is_empty() {
            let mut out = String::new();
            self.steps[0].write(&mut out, false);
            return Ok(out);
        }
        if convention == ProjStringConvention::Proj4 {
            return Err(GeorefError::formatting(
                "operation cannot be expressed as a single legacy proj string",
            ));
        }
        let mut out = String::from("+proj=pipeline");
        for (key, value) in &self.globals {
            out.push(' ');
            out.push('+');
            out.push_str(key);
            if let Some(v) = value {
                out.push('=');
                out.push_str(v);
            }
        }
        for step in &self.steps {
            out.push(' ');
            step.write(&mut out, true);
        }
        Ok(out)
    }
}

/// Invert a pipeline string: reverse the steps and toggle each step's
/// direction. Global parameters are preserved.
pub fn invert_pipeline(pipeline: &str) -> Result<String> {
    if pipeline.is_empty() {
        return Ok(String::new());
    }
    let parsed = parser::split_pipeline(pipeline)?;
    let mut builder = PipelineBuilder::new();
    for (key, value) in parsed.globals {
        builder.push_global(key, value);
    }
    for step in parsed.steps.into_iter().rev() {
        builder.push(step.inv());
    }
    builder.finish(ProjStringConvention::Proj5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_pipeline_is_empty() {
        let mut b = PipelineBuilder::new();
        b.push(Step::new("axisswap").with("order", "1,2"));
        b.push(
            Step::new("unitconvert")
                .with("xy_in", "deg")
                .with("xy_out", "deg"),
        );
        assert_eq!(b.finish(ProjStringConvention::Proj5).unwrap(), "");
    }

    #[test]
    fn test_single_step_without_wrapper() {
        let mut b = PipelineBuilder::new();
        b.push(
            Step::new("helmert")
                .with_double("x", -1.0)
                .with_double("y", 0.0)
                .with_double("z", 0.0),
        );
        assert_eq!(
            b.finish(ProjStringConvention::Proj5).unwrap(),
            "+proj=helmert +x=-1 +y=0 +z=0"
        );
    }

    #[test]
    fn test_adjacent_inverse_pair_cancels() {
        let mut b = PipelineBuilder::new();
        b.push(Step::new("cart").with("ellps", "WGS84"));
        b.push(Step::new("cart").with("ellps", "WGS84").inv());
        assert_eq!(b.finish(ProjStringConvention::Proj5).unwrap(), "");
    }

    #[test]
    fn test_helmert_opposite_sum_collapses() {
        let mut b = PipelineBuilder::new();
        b.push(Step::new("cart").with("ellps", "WGS84"));
        let fwd = Step::new("helmert")
            .with_double("x", 1.0)
            .with_double("y", 2.0)
            .with_double("z", 3.0)
            .with_double("rx", 4.0)
            .with_double("ry", 5.0)
            .with_double("rz", 6.0)
            .with_double("s", 7.0)
            .with("convention", "position_vector");
        let bwd = Step::new("helmert")
            .with_double("x", -1.0)
            .with_double("y", -2.0)
            .with_double("z", -3.0)
            .with_double("rx", -4.0)
            .with_double("ry", -5.0)
            .with_double("rz", -6.0)
            .with_double("s", -7.0)
            .with("convention", "position_vector");
        b.push(fwd);
        b.push(bwd);
        b.push(Step::new("cart").with("ellps", "WGS84").inv());
        assert_eq!(b.finish(ProjStringConvention::Proj5).unwrap(), "");
    }

    #[test]
    fn test_helmert_differing_convention_kept() {
        let mut b = PipelineBuilder::new();
        let fwd = Step::new("helmert")
            .with_double("x", 1.0)
            .with("convention", "position_vector");
        let bwd = Step::new("helmert")
            .with_double("x", -1.0)
            .with("convention", "coordinate_frame");
        b.push(fwd);
        b.push(bwd);
        let out = b.finish(ProjStringConvention::Proj5).unwrap();
        assert!(out.contains("+step +proj=helmert"));
    }

    #[test]
    fn test_unitconvert_mirror_cancels() {
        let mut b = PipelineBuilder::new();
        b.push(
            Step::new("unitconvert")
                .with("xy_in", "rad")
                .with("xy_out", "deg"),
        );
        b.push(
            Step::new("unitconvert")
                .with("xy_in", "deg")
                .with("xy_out", "rad"),
        );
        assert_eq!(b.finish(ProjStringConvention::Proj5).unwrap(), "");
    }

    #[test]
    fn test_proj4_rejects_pipelines() {
        let mut b = PipelineBuilder::new();
        b.push(Step::new("cart").with("ellps", "WGS84"));
        b.push(Step::new("helmert").with_double("x", 1.0));
        assert!(b.finish(ProjStringConvention::Proj4).is_err());
    }

    #[test]
    fn test_invert_pipeline_round_trip() {
        let pipeline = "+proj=pipeline +step +proj=axisswap +order=2,1 \
                        +step +proj=unitconvert +xy_in=grad +xy_out=rad \
                        +step +inv +proj=longlat +ellps=clrk80ign +pm=paris \
                        +step +proj=unitconvert +xy_in=rad +xy_out=deg \
                        +step +proj=axisswap +order=2,1";
        let inverted = invert_pipeline(pipeline).unwrap();
        assert!(inverted.starts_with("+proj=pipeline +step +proj=axisswap +order=2,1"));
        assert!(inverted.contains("+step +proj=longlat +ellps=clrk80ign +pm=paris"));
        let back = invert_pipeline(&inverted).unwrap();
        assert_eq!(back, pipeline.split_whitespace().collect::<Vec<_>>().join(" "));
    }
}
