//! Product-limit (Kaplan-Meier) survival estimator.
//!
//! Standard errors use Greenwood's formula:
//! `SE(t) = S(t) * sqrt(sum(d_i / (n_i * (n_i - d_i))))` over event times
//! `t_i <= t`. The sum is undefined once survival reaches zero; the error is
//! reported as zero from that point.

use serde::Serialize;

use registry_core::CurveEstimator;

use crate::error::EstimatorError;

/// The survival step function at one distinct time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    pub time: f64,
    pub survival: f64,
    pub std_error: f64,
    /// Subjects at risk just before `time`.
    pub at_risk: usize,
    pub events: usize,
    pub censored: usize,
}

/// Non-increasing step function starting at `(0, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurvivalCurve {
    pub label: String,
    pub points: Vec<CurvePoint>,
}

impl SurvivalCurve {
    /// Survival probability at `time` (right-continuous).
    pub fn survival_at(&self, time: f64) -> f64 {
        self.points
            .iter()
            .take_while(|point| point.time <= time)
            .last()
            .map_or(1.0, |point| point.survival)
    }

    /// First time at which survival drops to 0.5 or below.
    pub fn median(&self) -> Option<f64> {
        self.points
            .iter()
            .find(|point| point.survival <= 0.5)
            .map(|point| point.time)
    }

    pub fn max_time(&self) -> f64 {
        self.points.last().map_or(0.0, |point| point.time)
    }
}

/// Product-limit estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct KaplanMeier;

impl KaplanMeier {
    pub fn fit(&self, label: &str, samples: &[(f64, bool)]) -> Result<SurvivalCurve, EstimatorError> {
        if samples.is_empty() {
            return Err(EstimatorError::NoSamples {
                label: label.to_string(),
            });
        }
        if let Some(&(duration, _)) = samples
            .iter()
            .find(|(duration, _)| !duration.is_finite() || *duration < 0.0)
        {
            return Err(EstimatorError::InvalidDuration {
                label: label.to_string(),
                duration,
            });
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut points = vec![CurvePoint {
            time: 0.0,
            survival: 1.0,
            std_error: 0.0,
            at_risk: sorted.len(),
            events: 0,
            censored: 0,
        }];
        let mut at_risk = sorted.len();
        let mut survival = 1.0_f64;
        let mut greenwood = 0.0_f64;

        let mut idx = 0;
        while idx < sorted.len() {
            let time = sorted[idx].0;
            let mut events = 0;
            let mut censored = 0;
            while idx < sorted.len() && sorted[idx].0 == time {
                if sorted[idx].1 {
                    events += 1;
                } else {
                    censored += 1;
                }
                idx += 1;
            }

            if events > 0 {
                let n = at_risk as f64;
                let d = events as f64;
                survival *= 1.0 - d / n;
                if at_risk > events {
                    greenwood += d / (n * (n - d));
                }
            }
            let std_error = if survival > 0.0 {
                survival * greenwood.sqrt()
            } else {
                0.0
            };

            let point = CurvePoint {
                time,
                survival,
                std_error,
                at_risk,
                events,
                censored,
            };
            if time == 0.0 {
                points[0] = CurvePoint {
                    at_risk: points[0].at_risk,
                    ..point
                };
            } else {
                points.push(point);
            }
            at_risk -= events + censored;
        }

        Ok(SurvivalCurve {
            label: label.to_string(),
            points,
        })
    }
}

impl CurveEstimator for KaplanMeier {
    type Curve = SurvivalCurve;
    type Error = EstimatorError;

    fn estimate(&self, label: &str, samples: &[(f64, bool)]) -> Result<SurvivalCurve, EstimatorError> {
        self.fit(label, samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn textbook_example() {
        // 6 subjects: events at 1, 3, 3; censored at 2, 4, 5.
        let samples = [
            (1.0, true),
            (2.0, false),
            (3.0, true),
            (3.0, true),
            (4.0, false),
            (5.0, false),
        ];
        let curve = KaplanMeier.fit("demo", &samples).unwrap();

        let times: Vec<f64> = curve.points.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(close(curve.survival_at(1.0), 5.0 / 6.0));
        assert!(close(curve.survival_at(2.5), 5.0 / 6.0));
        assert!(close(curve.survival_at(3.0), 5.0 / 6.0 * (1.0 - 2.0 / 4.0)));
        assert_eq!(curve.points[3].at_risk, 4);
        assert_eq!(curve.points[3].events, 2);
        assert_eq!(curve.median(), Some(3.0));

        let s3 = 5.0 / 12.0;
        let gw: f64 = 1.0 / (6.0 * 5.0) + 2.0 / (4.0 * 2.0);
        assert!(close(curve.points[3].std_error, s3 * gw.sqrt()));
    }

    #[test]
    fn survival_never_increases() {
        let samples: Vec<(f64, bool)> = (0..50)
            .map(|i| (f64::from(i % 7) * 0.5, i % 3 == 0))
            .collect();
        let curve = KaplanMeier.fit("mono", &samples).unwrap();
        for pair in curve.points.windows(2) {
            assert!(pair[1].survival <= pair[0].survival);
            assert!(pair[1].time > pair[0].time);
        }
    }

    #[test]
    fn all_dead_reaches_zero() {
        let curve = KaplanMeier.fit("dead", &[(1.0, true), (2.0, true)]).unwrap();
        assert_eq!(curve.survival_at(2.0), 0.0);
        assert_eq!(curve.points.last().unwrap().std_error, 0.0);
    }

    #[test]
    fn events_at_time_zero_replace_origin() {
        let curve = KaplanMeier.fit("zero", &[(0.0, true), (1.0, false)]).unwrap();
        assert_eq!(curve.points.len(), 2);
        assert_eq!(curve.points[0].time, 0.0);
        assert_eq!(curve.points[0].survival, 0.5);
        assert_eq!(curve.points[0].at_risk, 2);
    }

    #[test]
    fn rejects_empty_and_invalid() {
        assert!(matches!(
            KaplanMeier.fit("none", &[]),
            Err(EstimatorError::NoSamples { .. })
        ));
        assert!(matches!(
            KaplanMeier.fit("neg", &[(-1.0, true)]),
            Err(EstimatorError::InvalidDuration { .. })
        ));
    }
}
