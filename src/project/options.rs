use std::path::PathBuf;

use crate::types::{FlowUnits, RoutingModel, SurchargeMethod};

/// Configuration for hot-start mode (ii): periodic saves during the
/// simulation rather than (or in addition to) a single save called
/// manually through [`crate::Engine::save_hotstart`]. Each save writes
/// to its own path — `base_path` with the save count appended — so
/// repeated saves don't clobber one another.
#[derive(Debug, Clone)]
pub struct PeriodicHotstart {
    pub base_path: PathBuf,
    pub interval_s: f64,
}

/// The subset of simulation configuration that would ordinarily be
/// populated by parsing an input file's `[OPTIONS]` section. Parsing is
/// out of scope; this struct is what `open()` would hand back, and
/// what the property interface's "writable before start" class reads
/// and writes directly.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub start_datetime: f64,
    pub end_datetime: f64,
    pub report_start: f64,

    pub route_step_s: f64,
    pub report_step_s: f64,
    pub rule_step_s: f64,
    pub min_route_step_s: f64,
    pub lengthening_step_s: f64,

    pub allow_ponding: bool,
    pub inertia_damping: bool,
    pub surcharge_method: SurchargeMethod,
    pub ignore_rainfall: bool,
    pub ignore_routing: bool,

    pub flow_units: FlowUnits,
    pub routing_model: RoutingModel,
    pub num_threads: usize,

    /// `None` disables periodic hot-start saving; the engine still
    /// supports a manual one-off save through `save_hotstart`.
    pub periodic_hotstart: Option<PeriodicHotstart>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            start_datetime: 0.0,
            end_datetime: 1.0,
            report_start: 0.0,
            route_step_s: 15.0,
            report_step_s: 900.0,
            rule_step_s: 0.0,
            min_route_step_s: 0.5,
            lengthening_step_s: 0.0,
            allow_ponding: false,
            inertia_damping: true,
            surcharge_method: SurchargeMethod::Extran,
            ignore_rainfall: false,
            ignore_routing: false,
            flow_units: FlowUnits::Cfs,
            routing_model: RoutingModel::KinematicWave,
            num_threads: 1,
            periodic_hotstart: None,
        }
    }
}
