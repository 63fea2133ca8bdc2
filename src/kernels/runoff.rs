use crate::error::EngineError;
use crate::project::{Gauge, Subcatchment};

/// Generates subcatchment runoff from rainfall. Stands in for the
/// rainfall ingest / infiltration / groundwater / snowmelt / LID
/// kernels `spec.md` §1 places out of scope.
pub trait RunoffKernel: Send {
    /// Advances runoff state up to `until_ms` (simulation milliseconds
    /// since `start_datetime`), updating each subcatchment's
    /// `runoff_cfs` in place.
    fn advance(
        &mut self,
        subcatchments: &mut [Subcatchment],
        gauges: &[Gauge],
        until_ms: i64,
    ) -> Result<(), EngineError>;
}

/// A deterministic rational-method runoff generator: no infiltration
/// losses, no routing lag, one multiply-accumulate per subcatchment.
/// `runoff_cfs = C * i * A / 1.0083`, the standard rational-method
/// constant converting acres * inches/hour to cubic feet per second.
#[derive(Debug, Default)]
pub struct SimpleRunoffKernel {
    last_runoff_time_ms: i64,
}

const RATIONAL_METHOD_CONSTANT: f64 = 1.0083;

impl RunoffKernel for SimpleRunoffKernel {
    fn advance(
        &mut self,
        subcatchments: &mut [Subcatchment],
        gauges: &[Gauge],
        until_ms: i64,
    ) -> Result<(), EngineError> {
        for sub in subcatchments.iter_mut() {
            let rainfall = sub.api_rainfall_override.unwrap_or_else(|| {
                sub.gauge
                    .and_then(|g| gauges.get(g))
                    .map(|g| g.rainfall)
                    .unwrap_or(0.0)
            });
            sub.runoff_cfs =
                sub.runoff_coeff * rainfall * sub.area_acres / RATIONAL_METHOD_CONSTANT;
        }
        self.last_runoff_time_ms = until_ms;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gauge_rainfall_drives_runoff() {
        let mut gauges = vec![Gauge::new("G1")];
        gauges[0].rainfall = 2.0;
        let mut subs = vec![Subcatchment::new("S1")];
        subs[0].gauge = Some(0);
        subs[0].area_acres = 10.0;
        subs[0].runoff_coeff = 0.5;

        let mut kernel = SimpleRunoffKernel::default();
        kernel.advance(&mut subs, &gauges, 1000).unwrap();

        let expected = 0.5 * 2.0 * 10.0 / RATIONAL_METHOD_CONSTANT;
        assert_relative_eq!(subs[0].runoff_cfs, expected, epsilon = 1e-9);
    }

    #[test]
    fn api_override_takes_precedence_over_gauge() {
        let gauges = vec![Gauge::new("G1")];
        let mut subs = vec![Subcatchment::new("S1")];
        subs[0].gauge = Some(0);
        subs[0].api_rainfall_override = Some(3.6);
        subs[0].area_acres = 1.0;
        subs[0].runoff_coeff = 1.0;

        let mut kernel = SimpleRunoffKernel::default();
        kernel.advance(&mut subs, &gauges, 1000).unwrap();

        assert_relative_eq!(subs[0].runoff_cfs, 3.6 / RATIONAL_METHOD_CONSTANT, epsilon = 1e-9);
    }
}
