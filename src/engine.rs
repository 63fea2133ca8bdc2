//! The stepwise lifecycle controller: `open` → `start` → `step`/`stride`
//! → `end` → `report` → `close`. Every entry point validates the
//! current [`LifecycleState`] before doing anything else and records
//! the first error it sees in a sticky [`ErrorContext`] so a caller
//! driving the engine purely by return codes can still ask "what went
//! wrong" after the fact.
//!
//! Only one engine may be open at a time per process; this mirrors the
//! single global project the toolkit this API is modeled on keeps.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::callback::{LifecyclePhase, ProgressCallback, ProgressReporter};
use crate::clock::SimulationClock;
use crate::datetime::ms_to_days;
use crate::error::{EngineError, ErrorContext};
use crate::hotstart::{self, TopologyHash};
use crate::kernels::{
    MassBalanceKernel, MassBalanceReport, RoutingKernel, RunoffKernel, SimpleMassBalance,
    SimpleRoutingKernel, SimpleRunoffKernel,
};
use crate::output::{OutputHeader, OutputWriter};
use crate::project::Project;
use crate::property;
use crate::state::LifecycleState;
use crate::types::{LinkProperty, NodeProperty, ObjectType, SubcatchProperty};

static ENGINE_OPEN: AtomicBool = AtomicBool::new(false);

/// One complete run of the stepwise API, from `open()` through
/// `close()`.
pub struct Engine {
    project: Project,
    state: LifecycleState,
    clock: Option<SimulationClock>,
    errors: ErrorContext,

    runoff: Box<dyn RunoffKernel>,
    routing: Box<dyn RoutingKernel>,
    mass_balance: Box<dyn MassBalanceKernel>,
    pool: Option<ThreadPool>,

    progress: ProgressReporter,
    output: Option<OutputWriter>,

    /// Next routing time (ms) at which a periodic hot-start save is
    /// due, if [`crate::project::AnalysisOptions::periodic_hotstart`]
    /// is configured. `None` once disabled or not yet started.
    next_hotstart_save_ms: Option<i64>,
    hotstart_save_count: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            project: Project::new(),
            state: LifecycleState::Uninitialized,
            clock: None,
            errors: ErrorContext::new(),
            runoff: Box::new(SimpleRunoffKernel::default()),
            routing: Box::new(SimpleRoutingKernel::new()),
            mass_balance: Box::new(SimpleMassBalance::default()),
            pool: None,
            progress: ProgressReporter::new(None),
            output: None,
            next_hotstart_save_ms: None,
            hotstart_save_count: 0,
        }
    }

    pub fn set_progress_callback(&mut self, callback: Option<ProgressCallback>) {
        self.progress = ProgressReporter::new(callback);
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The sticky error code recorded since the last `open()`, 0 if
    /// nothing has failed yet.
    pub fn error_code(&self) -> i32 {
        self.errors.code()
    }

    pub fn error_message(&self) -> Option<String> {
        self.errors.message()
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn mass_balance_report(&self) -> MassBalanceReport {
        self.mass_balance.report()
    }

    fn record_and_propagate<T>(&self, result: Result<T, EngineError>) -> Result<T, EngineError> {
        if let Err(ref e) = result {
            self.errors.set_error(e.clone());
        }
        result
    }

    /// Takes ownership of `project`, builds the simulation clock and
    /// creates the binary results file at `out_path`. Fails if another
    /// engine in this process already holds a project open.
    pub fn open(&mut self, project: Project, out_path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.progress.fire(LifecyclePhase::BeforeOpen, 0.0);
        let result = self.open_inner(project, out_path.as_ref());
        self.record_and_propagate(result)?;
        self.progress.fire(LifecyclePhase::AfterOpen, 0.0);
        Ok(())
    }

    fn open_inner(&mut self, project: Project, out_path: &Path) -> Result<(), EngineError> {
        if !self.state.can_open() {
            return Err(EngineError::AlreadyOpen);
        }
        if ENGINE_OPEN.swap(true, Ordering::AcqRel) {
            return Err(EngineError::AlreadyOpen);
        }

        let clock = SimulationClock::new(
            project.options.start_datetime,
            project.options.end_datetime,
            project.options.report_start,
            project.options.report_step_s,
        );

        let header = build_output_header(&project);
        let writer = match OutputWriter::create(out_path, header) {
            Ok(w) => w,
            Err(e) => {
                ENGINE_OPEN.store(false, Ordering::Release);
                return Err(e);
            }
        };

        self.project = project;
        self.clock = Some(clock);
        self.output = Some(writer);
        self.errors.clear();
        self.state = LifecycleState::Open;
        info!("project opened, writing results to {}", out_path.display());
        Ok(())
    }

    /// Restores node and link routing state from a previously saved
    /// hot-start file. Must be called after `open()` and before
    /// `start()`.
    pub fn load_hotstart(&mut self, path: &Path) -> Result<(), EngineError> {
        let result = self.load_hotstart_inner(path);
        self.record_and_propagate(result)
    }

    fn load_hotstart_inner(&mut self, path: &Path) -> Result<(), EngineError> {
        self.state.require(LifecycleState::Open)?;
        let topo = TopologyHash::of(&self.project.nodes, &self.project.links, self.project.options.routing_model as i32);
        hotstart::load(path, &mut self.project.nodes, &mut self.project.links, topo)
    }

    /// Saves the current node and link routing state as a hot-start
    /// file, usable as an initial condition for a later run.
    pub fn save_hotstart(&self, path: &Path) -> Result<(), EngineError> {
        let topo = TopologyHash::of(&self.project.nodes, &self.project.links, self.project.options.routing_model as i32);
        hotstart::save(path, &self.project.nodes, &self.project.links, topo)
    }

    /// Builds the thread pool used for per-object fan-out during
    /// `step`/`stride` and transitions to `Started`.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.progress.fire(LifecyclePhase::BeforeStart, 0.0);
        let result = self.start_inner();
        self.record_and_propagate(result)?;
        self.progress.fire(LifecyclePhase::AfterStart, 0.0);
        Ok(())
    }

    fn start_inner(&mut self) -> Result<(), EngineError> {
        self.state.require(LifecycleState::Open)?;

        let available = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let threads = self.project.options.num_threads.max(1).min(available);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| EngineError::InvalidTopology(e.to_string()))?;
        self.pool = Some(pool);
        self.hotstart_save_count = 0;
        self.next_hotstart_save_ms = self
            .project
            .options
            .periodic_hotstart
            .as_ref()
            .map(|cfg| (cfg.interval_s * 1000.0).round().max(1.0) as i64);
        self.state = LifecycleState::Started;
        Ok(())
    }

    /// Advances the simulation by one adaptive routing step. Returns
    /// the new elapsed time in days, or `0.0` once the simulation
    /// horizon has been reached.
    pub fn step(&mut self) -> Result<f64, EngineError> {
        let fraction = self.progress_fraction();
        self.progress.fire(LifecyclePhase::BeforeStep, fraction);
        let result = self.step_inner();
        let elapsed = self.record_and_propagate(result)?;
        self.progress.fire(LifecyclePhase::AfterStep, self.progress_fraction());
        Ok(elapsed)
    }

    fn step_inner(&mut self) -> Result<f64, EngineError> {
        self.state.require(LifecycleState::Started)?;

        if self.clock.as_ref().ok_or(EngineError::NotStarted)?.at_horizon() {
            return Ok(self.clock.as_mut().unwrap().refresh_elapsed());
        }

        let route_step_s = self.project.options.route_step_s;
        let min_route_step_s = self.project.options.min_route_step_s;
        let nominal_step_ms = (route_step_s * 1000.0).round().max(1.0) as i64;

        let (new_routing_time_ms, routing_duration_ms) = {
            let clock = self.clock.as_ref().unwrap();
            (clock.new_routing_time_ms, clock.routing_duration_ms)
        };

        // Runoff must advance to or past the next routing instant
        // before routing is allowed to advance past it.
        let next_instant_ms = (new_routing_time_ms + nominal_step_ms).min(routing_duration_ms);
        if !self.project.options.ignore_rainfall {
            let pool = self.pool.as_ref();
            let runoff = &mut self.runoff;
            let subcatchments = &mut self.project.subcatchments;
            let gauges = &self.project.gauges;
            let result = if let Some(pool) = pool {
                pool.install(|| runoff.advance(subcatchments, gauges, next_instant_ms))
            } else {
                runoff.advance(subcatchments, gauges, next_instant_ms)
            };
            result?;
        }
        // Runoff has now been driven up to (or, with no subcatchments,
        // the climate state updated to) the next routing instant.
        self.clock.as_mut().unwrap().new_runoff_time_ms = next_instant_ms;

        let adaptive_s = self
            .routing
            .adaptive_step_s(route_step_s, &self.project.nodes, &self.project.links)
            .max(min_route_step_s.min(route_step_s).max(0.001));
        let mut dt_ms = (adaptive_s * 1000.0).round().max(1) as i64;
        if new_routing_time_ms + dt_ms > routing_duration_ms {
            dt_ms = routing_duration_ms - new_routing_time_ms;
        }
        let dt_s = dt_ms as f64 / 1000.0;

        if !self.project.options.ignore_routing {
            let pool = self.pool.as_ref();
            let routing = &mut self.routing;
            let nodes = &mut self.project.nodes;
            let links = &mut self.project.links;
            let stats = if let Some(pool) = pool {
                pool.install(|| routing.route(nodes, links, dt_s))?
            } else {
                routing.route(nodes, links, dt_s)?
            };
            if !stats.converged {
                warn!("routing step at {}ms did not converge", new_routing_time_ms);
                self.clock.as_mut().unwrap().non_converge_count += 1;
            }
        }

        self.mass_balance.accumulate(&self.project.nodes, &self.project.links, dt_s);

        let clock = self.clock.as_mut().unwrap();
        clock.new_routing_time_ms += dt_ms;
        clock.total_step_count += 1;
        let report_due = clock.report_due();

        if report_due {
            self.write_report_period()?;
        }

        self.save_periodic_hotstart_if_due()?;

        Ok(self.clock.as_mut().unwrap().refresh_elapsed())
    }

    /// Saves a hot-start file if periodic saving is configured and the
    /// routing clock has reached the next scheduled save instant. Runs
    /// after reporting, per the ordering guarantee that hot-start saves
    /// occur after a period is emitted.
    fn save_periodic_hotstart_if_due(&mut self) -> Result<(), EngineError> {
        let Some(due_ms) = self.next_hotstart_save_ms else {
            return Ok(());
        };
        let new_routing_time_ms = self.clock.as_ref().unwrap().new_routing_time_ms;
        if new_routing_time_ms < due_ms {
            return Ok(());
        }
        let cfg = self.project.options.periodic_hotstart.clone().unwrap();
        let path = cfg.base_path.with_extension(format!("{}.hsf", self.hotstart_save_count));
        self.save_hotstart(&path)?;
        self.hotstart_save_count += 1;
        self.next_hotstart_save_ms = Some(due_ms + (cfg.interval_s * 1000.0).round().max(1.0) as i64);
        Ok(())
    }

    /// Advances the simulation by approximately `target_elapsed_s`
    /// seconds by temporarily substituting it for the configured
    /// routing step, taking exactly one step, then restoring the
    /// original step. The substitution is visible to anything that
    /// reads [`crate::types::SystemProperty::RouteStep`] for the
    /// duration of the call, including a progress callback invoked
    /// from within it.
    pub fn stride(&mut self, target_elapsed_s: f64) -> Result<f64, EngineError> {
        self.state.require(LifecycleState::Started)?;
        let original_step = self.project.options.route_step_s;
        self.project.options.route_step_s = target_elapsed_s.max(0.001);
        let result = self.step();
        self.project.options.route_step_s = original_step;
        result
    }

    fn write_report_period(&mut self) -> Result<(), EngineError> {
        let routing_time_ms = self.clock.as_ref().unwrap().new_routing_time_ms;
        let date = self.project.options.start_datetime + ms_to_days(routing_time_ms);

        let subcatch_vals: Vec<f32> = self.project.subcatchments.iter().map(|s| s.runoff_cfs as f32).collect();

        let mut node_vals = Vec::with_capacity(self.project.nodes.len() * 3);
        for n in &self.project.nodes {
            node_vals.push(n.depth as f32);
        }
        for n in &self.project.nodes {
            node_vals.push(n.head() as f32);
        }
        for n in &self.project.nodes {
            node_vals.push(n.total_inflow as f32);
        }

        let mut link_vals = Vec::with_capacity(self.project.links.len() * 2);
        for l in &self.project.links {
            link_vals.push(l.flow as f32);
        }
        for l in &self.project.links {
            link_vals.push(l.depth as f32);
        }

        let writer = self.output.as_mut().ok_or(EngineError::NotOpen)?;
        writer.write_period(date, &subcatch_vals, &node_vals, &link_vals, &[])
    }

    fn progress_fraction(&self) -> f64 {
        self.clock
            .as_ref()
            .map(|c| {
                if c.routing_duration_ms <= 0 {
                    1.0
                } else {
                    (c.new_routing_time_ms as f64 / c.routing_duration_ms as f64).clamp(0.0, 1.0)
                }
            })
            .unwrap_or(0.0)
    }

    /// Releases the thread pool and transitions to `Ended`. No more
    /// `step`/`stride` calls are accepted afterward.
    pub fn end(&mut self) -> Result<(), EngineError> {
        self.progress.fire(LifecyclePhase::BeforeEnd, 1.0);
        let result = self.end_inner();
        self.record_and_propagate(result)?;
        self.progress.fire(LifecyclePhase::AfterEnd, 1.0);
        Ok(())
    }

    fn end_inner(&mut self) -> Result<(), EngineError> {
        self.state.require(LifecycleState::Started)?;
        self.pool = None;
        self.state = LifecycleState::Ended;
        Ok(())
    }

    /// Writes the results-file epilogue and a human-readable summary
    /// report. Must be called after `end()`.
    pub fn report(&mut self, report_path: &Path) -> Result<(), EngineError> {
        self.progress.fire(LifecyclePhase::BeforeReport, 1.0);
        let result = self.report_inner(report_path);
        self.record_and_propagate(result)?;
        self.progress.fire(LifecyclePhase::AfterReport, 1.0);
        Ok(())
    }

    fn report_inner(&mut self, report_path: &Path) -> Result<(), EngineError> {
        self.state.require(LifecycleState::Ended)?;

        let writer = self.output.take().ok_or(EngineError::NotOpen)?;
        let final_code = self.errors.code();
        writer.finalize(final_code)?;

        let mb = self.mass_balance.report();
        let clock = self.clock.as_ref().ok_or(EngineError::NotOpen)?;
        let text = format!(
            "Simulation Summary\n\
             ------------------\n\
             Routing steps taken:        {}\n\
             Reporting periods written:  {}\n\
             Non-convergence warnings:   {}\n\
             Continuity error:           {:.3}%\n\
             Maximum node depth:         {:.4}\n\
             Maximum link flow:          {:.4}\n",
            clock.total_step_count,
            clock.report_step_count,
            clock.non_converge_count,
            mb.continuity_error_pct,
            mb.max_node_depth,
            mb.max_link_flow,
        );
        std::fs::write(report_path, text).map_err(|e| EngineError::FileWrite {
            path: report_path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Releases the project and the process-wide open guard. The
    /// engine may be reused afterward with a fresh `open()` call.
    pub fn close(&mut self) -> Result<(), EngineError> {
        self.progress.fire(LifecyclePhase::BeforeClose, 1.0);
        let result = self.close_inner();
        self.record_and_propagate(result)?;
        self.progress.fire(LifecyclePhase::AfterClose, 1.0);
        Ok(())
    }

    fn close_inner(&mut self) -> Result<(), EngineError> {
        if matches!(self.state, LifecycleState::Uninitialized | LifecycleState::Closed) {
            return Err(EngineError::NotOpen);
        }
        self.pool = None;
        self.output = None;
        self.clock = None;
        self.project = Project::new();
        self.state = LifecycleState::Closed;
        ENGINE_OPEN.store(false, Ordering::Release);
        Ok(())
    }

    pub fn get_value(&self, object_type: ObjectType, property_code: i32, index: i32, sub_index: i32) -> Result<f64, EngineError> {
        let elapsed = self.clock.as_ref().map(|c| c.elapsed_time_days).unwrap_or(0.0);
        property::get_value(&self.project, self.state, elapsed, object_type, property_code, index, sub_index)
    }

    pub fn set_value(
        &mut self,
        object_type: ObjectType,
        property_code: i32,
        index: i32,
        sub_index: i32,
        value: f64,
    ) -> Result<(), EngineError> {
        let current_time_ms = self.clock.as_ref().map(|c| c.new_routing_time_ms).unwrap_or(0);
        property::set_value(&mut self.project, self.state, current_time_ms, object_type, property_code, index, sub_index, value)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if !matches!(self.state, LifecycleState::Uninitialized | LifecycleState::Closed) {
            ENGINE_OPEN.store(false, Ordering::Release);
        }
    }
}

/// The fixed set of variables reported each period: subcatchment
/// runoff; node depth, head and total inflow; link flow and depth; no
/// system-wide variables. Keeping this fixed (rather than configurable)
/// keeps the output file's layout fully determined by the object
/// counts alone.
fn build_output_header(project: &Project) -> OutputHeader {
    OutputHeader {
        flow_units: project.options.flow_units,
        subcatch_names: project.subcatchments.iter().map(|s| s.id.clone()).collect(),
        node_names: project.nodes.iter().map(|n| n.id.clone()).collect(),
        link_names: project.links.iter().map(|l| l.id.clone()).collect(),
        pollutant_names: project.pollutants.iter().map(|p| p.id.clone()).collect(),
        pollutant_units: project.pollutants.iter().map(|p| p.units).collect(),
        subcatch_vars: vec![SubcatchProperty::Runoff as i32],
        node_vars: vec![
            NodeProperty::Depth as i32,
            NodeProperty::Head as i32,
            NodeProperty::TotalInflow as i32,
        ],
        link_vars: vec![LinkProperty::Flow as i32, LinkProperty::Depth as i32],
        sys_vars: vec![],
        start_date: project.options.start_datetime,
        report_step_s: project.options.report_step_s.round() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Link, Node};
    use crate::types::{LinkType, NodeType};
    use std::sync::Mutex;

    /// The process-wide open guard means at most one test can hold an
    /// engine open at a time; serialize those tests explicitly instead
    /// of relying on cargo's default parallel test execution.
    static SINGLETON_GUARD: Mutex<()> = Mutex::new(());

    fn empty_project(start: f64, end: f64, report_step_s: f64) -> Project {
        let mut p = Project::new();
        p.options.start_datetime = start;
        p.options.end_datetime = end;
        p.options.report_start = start;
        p.options.report_step_s = report_step_s;
        p.options.route_step_s = 600.0;
        p
    }

    #[test]
    fn lifecycle_runs_start_to_close_on_an_empty_network() {
        let _guard = SINGLETON_GUARD.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.bin");
        let rpt_path = dir.path().join("report.txt");

        let project = empty_project(0.0, ms_to_days(3_600_000), 600.0);

        let mut engine = Engine::new();
        engine.open(project, &out_path).unwrap();
        engine.start().unwrap();

        loop {
            let elapsed = engine.step().unwrap();
            if elapsed == 0.0 {
                break;
            }
        }

        engine.end().unwrap();
        engine.report(&rpt_path).unwrap();
        engine.close().unwrap();

        assert!(rpt_path.exists());
        let mut reader = crate::output::OutputReader::open(&out_path).unwrap();
        assert_eq!(reader.n_periods(), 6);
    }

    #[test]
    fn cannot_open_two_engines_at_once() {
        let _guard = SINGLETON_GUARD.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut e1 = Engine::new();
        e1.open(empty_project(0.0, 1.0, 600.0), dir.path().join("a.bin")).unwrap();

        let mut e2 = Engine::new();
        let err = e2.open(empty_project(0.0, 1.0, 600.0), dir.path().join("b.bin")).unwrap_err();
        assert_eq!(err, EngineError::AlreadyOpen);

        e1.close().unwrap();
        e2.open(empty_project(0.0, 1.0, 600.0), dir.path().join("c.bin")).unwrap();
        e2.close().unwrap();
    }

    #[test]
    fn step_before_start_is_rejected() {
        let mut engine = Engine::new();
        let err = engine.step().unwrap_err();
        assert_eq!(err, EngineError::NotStarted);
        assert_eq!(engine.error_code(), EngineError::NotStarted.code());
    }

    #[test]
    fn routing_advances_flow_between_two_nodes_over_a_run() {
        let _guard = SINGLETON_GUARD.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.bin");

        let mut project = empty_project(0.0, ms_to_days(3_600_000), 600.0);
        let up = project.add_node(Node::new("Up", NodeType::Junction));
        let down = project.add_node(Node::new("Down", NodeType::Outfall));
        project.nodes[up].depth = 3.0;
        project.nodes[down].invert = -5.0;
        let link = project.add_link(Link::new("C1", LinkType::Conduit, up, down));
        // A small conveyance keeps the explicit-Euler update well clear
        // of the storage-capacity clamp over this run's six steps, so
        // flow decays monotonically instead of oscillating in sign.
        project.links[link].conveyance = 0.1;

        let mut engine = Engine::new();
        engine.open(project, &out_path).unwrap();
        engine.start().unwrap();
        loop {
            if engine.step().unwrap() == 0.0 {
                break;
            }
        }
        let flow = engine
            .get_value(ObjectType::Link, LinkProperty::Flow as i32, 0, 0)
            .unwrap();
        assert!(flow > 0.0);
        engine.end().unwrap();
        engine.report(&dir.path().join("report.txt")).unwrap();
        engine.close().unwrap();
    }

    #[test]
    fn periodic_hotstart_saves_a_file_per_interval() {
        let _guard = SINGLETON_GUARD.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.bin");

        let mut project = empty_project(0.0, ms_to_days(3_600_000), 600.0);
        project.options.periodic_hotstart = Some(crate::project::PeriodicHotstart {
            base_path: dir.path().join("snapshot.hsf"),
            interval_s: 1_200.0,
        });

        let mut engine = Engine::new();
        engine.open(project, &out_path).unwrap();
        engine.start().unwrap();
        loop {
            if engine.step().unwrap() == 0.0 {
                break;
            }
        }
        engine.end().unwrap();
        engine.report(&dir.path().join("report.txt")).unwrap();
        engine.close().unwrap();

        assert!(dir.path().join("snapshot.0.hsf").exists());
        assert!(dir.path().join("snapshot.1.hsf").exists());
        assert!(dir.path().join("snapshot.2.hsf").exists());
    }
}
