//! Convenience facades over [`Engine`] that drive the full
//! open → start → step-loop → end → report → close lifecycle in one
//! call, the way a one-shot command-line tool would.

use std::path::Path;

use crate::callback::ProgressCallback;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::kernels::MassBalanceReport;
use crate::project::Project;

/// Runs `project` to completion, writing the binary results file to
/// `out_path` and a human-readable summary to `report_path`.
pub fn run(project: Project, out_path: impl AsRef<Path>, report_path: impl AsRef<Path>) -> Result<MassBalanceReport, EngineError> {
    run_with_callback(project, out_path, report_path, None)
}

/// Same as [`run`], but reports progress through `callback` as the
/// simulation advances. The callback fires once more on the step that
/// discovers the horizon has been reached (an elapsed time of zero),
/// so a caller driving a progress bar always sees a final 100% tick
/// rather than the loop simply stopping.
pub fn run_with_callback(
    project: Project,
    out_path: impl AsRef<Path>,
    report_path: impl AsRef<Path>,
    callback: Option<ProgressCallback>,
) -> Result<MassBalanceReport, EngineError> {
    let mut engine = Engine::new();
    engine.set_progress_callback(callback);

    engine.open(project, out_path.as_ref())?;
    engine.start()?;

    loop {
        let elapsed = engine.step()?;
        if elapsed == 0.0 {
            break;
        }
    }

    engine.end()?;
    engine.report(report_path.as_ref())?;
    let report = engine.mass_balance_report();
    engine.close()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::ms_to_days;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::sync::Mutex;

    static SINGLETON_GUARD: Mutex<()> = Mutex::new(());

    fn empty_project() -> Project {
        let mut p = Project::new();
        p.options.start_datetime = 0.0;
        p.options.end_datetime = ms_to_days(3_600_000);
        p.options.report_start = 0.0;
        p.options.report_step_s = 600.0;
        p.options.route_step_s = 600.0;
        p
    }

    #[test]
    fn run_completes_and_writes_both_output_files() {
        let _guard = SINGLETON_GUARD.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.bin");
        let rpt_path = dir.path().join("report.txt");

        let report = run(empty_project(), &out_path, &rpt_path).unwrap();
        assert!(out_path.exists());
        assert!(rpt_path.exists());
        assert_eq!(report.final_storage_volume, 0.0);
    }

    #[test]
    fn run_with_callback_observes_a_final_tick() {
        let _guard = SINGLETON_GUARD.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.bin");
        let rpt_path = dir.path().join("report.txt");

        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        run_with_callback(
            empty_project(),
            &out_path,
            &rpt_path,
            Some(Box::new(move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();

        assert!(count.load(Ordering::SeqCst) > 0);
    }
}
