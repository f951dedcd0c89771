//! Anneal schedule generation.
//!
//! A directive `(ta, tp, tq, direction)` describes a piecewise-linear
//! schedule of the anneal fraction `s` over time:
//!
//! ```text
//!   forward                              reverse
//!   s                                    s
//!   1 |               /                  1 |\
//!     |              /                     | \
//!  sp |     ________/                 1-sp |  \________
//!     |    /                               |           \
//!   0 |___/_____________ t               0 |____________\__ t
//!     0   tp      tq   ta                  0   tp      tq  ta
//! ```
//!
//! `ta` is the total anneal time, the pause holds `sp = tp / ta` from `tp`
//! until `tq`. The reverse schedule mirrors the fraction (`1 - s`).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::instruction::{AnnealDirection, AnnealDirective};
use crate::parameter::ParameterExpression;

/// One `(time, fraction)` checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulePoint {
    /// Time since the start of the anneal.
    pub time: f64,
    /// Anneal fraction `s` in `[0, 1]`.
    pub fraction: f64,
}

/// Ordered list of schedule checkpoints with strictly increasing times.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleTable {
    points: Vec<SchedulePoint>,
}

impl ScheduleTable {
    /// The checkpoints in time order.
    pub fn points(&self) -> &[SchedulePoint] {
        &self.points
    }

    /// Number of checkpoints.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the table has no checkpoints.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total duration of the schedule.
    pub fn duration(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.time)
    }

    /// Anneal fraction at time `t`, interpolated linearly between
    /// checkpoints and clamped outside the table.
    pub fn fraction_at(&self, t: f64) -> Option<f64> {
        let first = self.points.first()?;
        if t <= first.time {
            return Some(first.fraction);
        }
        for pair in self.points.windows(2) {
            let (p0, p1) = (pair[0], pair[1]);
            if t <= p1.time {
                let alpha = (t - p0.time) / (p1.time - p0.time);
                return Some(p0.fraction + alpha * (p1.fraction - p0.fraction));
            }
        }
        self.points.last().map(|p| p.fraction)
    }

    /// The table as `[time, fraction]` pairs.
    pub fn to_pairs(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| [p.time, p.fraction]).collect()
    }
}

impl fmt::Display for ScheduleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[{}, {}]", p.time, p.fraction)?;
        }
        write!(f, "]")
    }
}

/// Expands anneal directives into [`ScheduleTable`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnealScheduleGenerator;

impl AnnealScheduleGenerator {
    /// Create a generator.
    pub fn new() -> Self {
        Self
    }

    /// Generate the schedule for a directive, resolving symbolic times
    /// against `bindings`.
    pub fn generate(
        &self,
        directive: &AnnealDirective,
        bindings: &FxHashMap<String, f64>,
    ) -> IrResult<ScheduleTable> {
        let ta = resolve(&directive.ta, bindings)?;
        let tp = resolve(&directive.tp, bindings)?;
        let tq = resolve(&directive.tq, bindings)?;
        self.generate_from(ta, tp, tq, directive.direction)
    }

    /// Generate the schedule from concrete times.
    pub fn generate_from(
        &self,
        ta: f64,
        tp: f64,
        tq: f64,
        direction: AnnealDirection,
    ) -> IrResult<ScheduleTable> {
        if !ta.is_finite() || ta <= 0.0 {
            return Err(IrError::InvalidSchedule(format!(
                "anneal time ta must be positive, got {ta}"
            )));
        }
        if !(tp.is_finite() && tq.is_finite() && 0.0 <= tp && tp <= tq && tq <= ta) {
            return Err(IrError::InvalidSchedule(format!(
                "expected 0 <= tp <= tq <= ta, got ta={ta} tp={tp} tq={tq}"
            )));
        }
        if tq == ta && tp < ta {
            return Err(IrError::InvalidSchedule(format!(
                "pause ends at ta={ta} below full anneal fraction"
            )));
        }

        let sp = tp / ta;
        let forward = [(0.0, 0.0), (tp, sp), (tq, sp), (ta, 1.0)];

        let mut points: Vec<SchedulePoint> = Vec::with_capacity(forward.len());
        for (time, s) in forward {
            let fraction = match direction {
                AnnealDirection::Forward => s,
                AnnealDirection::Reverse => 1.0 - s,
            };
            if points.last().is_some_and(|p| p.time == time) {
                continue;
            }
            points.push(SchedulePoint { time, fraction });
        }

        Ok(ScheduleTable { points })
    }
}

fn resolve(param: &ParameterExpression, bindings: &FxHashMap<String, f64>) -> IrResult<f64> {
    match param {
        ParameterExpression::Constant(v) => Ok(*v),
        ParameterExpression::Symbol(name) => bindings
            .get(name)
            .copied()
            .ok_or_else(|| IrError::UnresolvedSymbol(name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_full_ramp() {
        let table = AnnealScheduleGenerator::new()
            .generate_from(10.0, 10.0, 10.0, AnnealDirection::Forward)
            .unwrap();
        assert_eq!(table.to_pairs(), vec![[0.0, 0.0], [10.0, 1.0]]);
        assert_eq!(table.to_string(), "[[0, 0], [10, 1]]");
    }

    #[test]
    fn test_forward_with_pause() {
        let table = AnnealScheduleGenerator::new()
            .generate_from(20.0, 5.0, 15.0, AnnealDirection::Forward)
            .unwrap();
        assert_eq!(
            table.to_pairs(),
            vec![[0.0, 0.0], [5.0, 0.25], [15.0, 0.25], [20.0, 1.0]]
        );
        assert_eq!(table.fraction_at(10.0), Some(0.25));
        assert_eq!(table.fraction_at(17.5), Some(0.625));
    }

    #[test]
    fn test_reverse_mirrors() {
        let table = AnnealScheduleGenerator::new()
            .generate_from(20.0, 5.0, 15.0, AnnealDirection::Reverse)
            .unwrap();
        assert_eq!(
            table.to_pairs(),
            vec![[0.0, 1.0], [5.0, 0.75], [15.0, 0.75], [20.0, 0.0]]
        );
    }

    #[test]
    fn test_rejects_non_positive_ta() {
        let generator = AnnealScheduleGenerator::new();
        assert!(matches!(
            generator.generate_from(0.0, 0.0, 0.0, AnnealDirection::Forward),
            Err(IrError::InvalidSchedule(_))
        ));
        assert!(generator
            .generate_from(-1.0, 0.0, 0.0, AnnealDirection::Forward)
            .is_err());
    }

    #[test]
    fn test_rejects_bad_ordering() {
        let generator = AnnealScheduleGenerator::new();
        assert!(generator
            .generate_from(10.0, 8.0, 4.0, AnnealDirection::Forward)
            .is_err());
        assert!(generator
            .generate_from(10.0, 2.0, 10.0, AnnealDirection::Forward)
            .is_err());
    }

    #[test]
    fn test_symbolic_times() {
        let directive = AnnealDirective::new("ta", 0.0, 0.0, AnnealDirection::Forward);
        let mut bindings = FxHashMap::default();
        let generator = AnnealScheduleGenerator::new();
        assert!(matches!(
            generator.generate(&directive, &bindings),
            Err(IrError::UnresolvedSymbol(ref s)) if s == "ta"
        ));

        bindings.insert("ta".to_string(), 4.0);
        let table = generator.generate(&directive, &bindings).unwrap();
        assert_eq!(table.duration(), 4.0);
        assert_eq!(table.to_pairs(), vec![[0.0, 0.0], [4.0, 1.0]]);
    }
}
