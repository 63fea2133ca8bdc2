use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

use super::{ENGINE_VERSION, MAGIC_NUMBER};
use crate::error::EngineError;
use crate::types::{FlowUnits, PollutantUnits};

/// Static description of the objects and reported variables a writer
/// was opened with. Variable counts are fixed for the file's lifetime;
/// the concrete property codes reported per object class are recorded
/// so the reader can translate `(object_type, property_code)` queries
/// into a position within each period's record.
#[derive(Debug, Clone)]
pub struct OutputHeader {
    pub flow_units: FlowUnits,
    pub subcatch_names: Vec<String>,
    pub node_names: Vec<String>,
    pub link_names: Vec<String>,
    pub pollutant_names: Vec<String>,
    pub pollutant_units: Vec<PollutantUnits>,

    pub subcatch_vars: Vec<i32>,
    pub node_vars: Vec<i32>,
    pub link_vars: Vec<i32>,
    pub sys_vars: Vec<i32>,

    pub start_date: f64,
    pub report_step_s: i32,
}

/// Append-only writer, used for the duration of one simulation.
pub struct OutputWriter {
    file: BufWriter<File>,
    path: PathBuf,
    header: OutputHeader,
    id_pos: i64,
    obj_prop_pos: i64,
    results_pos: i64,
    bytes_per_period: i64,
    n_periods: i64,
}

impl OutputWriter {
    pub fn create(path: &Path, header: OutputHeader) -> Result<Self, EngineError> {
        let file = File::create(path).map_err(|e| EngineError::FileOpen {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut w = BufWriter::new(file);

        Self::io(&mut w, path, |w| w.write_i32::<LittleEndian>(MAGIC_NUMBER))?;
        Self::io(&mut w, path, |w| w.write_i32::<LittleEndian>(ENGINE_VERSION))?;
        Self::io(&mut w, path, |w| {
            w.write_i32::<LittleEndian>(header.flow_units as i32)
        })?;
        Self::io(&mut w, path, |w| {
            w.write_i32::<LittleEndian>(header.subcatch_names.len() as i32)
        })?;
        Self::io(&mut w, path, |w| {
            w.write_i32::<LittleEndian>(header.node_names.len() as i32)
        })?;
        Self::io(&mut w, path, |w| {
            w.write_i32::<LittleEndian>(header.link_names.len() as i32)
        })?;
        Self::io(&mut w, path, |w| {
            w.write_i32::<LittleEndian>(header.pollutant_names.len() as i32)
        })?;
        for units in &header.pollutant_units {
            Self::io(&mut w, path, |w| w.write_i32::<LittleEndian>(*units as i32))?;
        }

        let id_pos = w.stream_position().map_err(|e| io_err(path, e))? as i64;
        for name in header
            .subcatch_names
            .iter()
            .chain(header.node_names.iter())
            .chain(header.link_names.iter())
            .chain(header.pollutant_names.iter())
        {
            Self::io(&mut w, path, |w| w.write_i32::<LittleEndian>(name.len() as i32))?;
            w.write_all(name.as_bytes()).map_err(|e| io_err(path, e))?;
        }

        let obj_prop_pos = w.stream_position().map_err(|e| io_err(path, e))? as i64;
        Self::io(&mut w, path, |w| {
            w.write_i32::<LittleEndian>(header.subcatch_vars.len() as i32)
        })?;
        Self::io(&mut w, path, |w| {
            w.write_i32::<LittleEndian>(header.node_vars.len() as i32)
        })?;
        Self::io(&mut w, path, |w| {
            w.write_i32::<LittleEndian>(header.link_vars.len() as i32)
        })?;
        Self::io(&mut w, path, |w| {
            w.write_i32::<LittleEndian>(header.sys_vars.len() as i32)
        })?;
        for code in header
            .subcatch_vars
            .iter()
            .chain(header.node_vars.iter())
            .chain(header.link_vars.iter())
            .chain(header.sys_vars.iter())
        {
            Self::io(&mut w, path, |w| w.write_i32::<LittleEndian>(*code))?;
        }

        Self::io(&mut w, path, |w| w.write_f64::<LittleEndian>(header.start_date))?;
        Self::io(&mut w, path, |w| w.write_i32::<LittleEndian>(header.report_step_s))?;
        Self::io(&mut w, path, |w| w.write_i32::<LittleEndian>(0))?; // reserved

        let results_pos = w.stream_position().map_err(|e| io_err(path, e))? as i64;

        let bytes_per_period = 8
            + 4 * (header.subcatch_names.len() as i64 * header.subcatch_vars.len() as i64
                + header.node_names.len() as i64 * header.node_vars.len() as i64
                + header.link_names.len() as i64 * header.link_vars.len() as i64
                + header.sys_vars.len() as i64);

        Ok(Self {
            file: w,
            path: path.to_path_buf(),
            header,
            id_pos,
            obj_prop_pos,
            results_pos,
            bytes_per_period,
            n_periods: 0,
        })
    }

    fn io<F>(w: &mut BufWriter<File>, path: &Path, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
    {
        f(w).map_err(|e| io_err(path, e))
    }

    /// Appends one reporting period: the current date, then the
    /// subcatchment/node/link/system variable blocks in that order.
    pub fn write_period(
        &mut self,
        date: f64,
        subcatch_vals: &[f32],
        node_vals: &[f32],
        link_vals: &[f32],
        sys_vals: &[f32],
    ) -> Result<(), EngineError> {
        self.file
            .write_f64::<LittleEndian>(date)
            .map_err(|e| io_err(&self.path, e))?;
        for v in subcatch_vals.iter().chain(node_vals).chain(link_vals).chain(sys_vals) {
            self.file
                .write_f32::<LittleEndian>(*v)
                .map_err(|e| io_err(&self.path, e))?;
        }
        self.n_periods += 1;
        Ok(())
    }

    pub fn bytes_per_period(&self) -> i64 {
        self.bytes_per_period
    }

    pub fn n_periods(&self) -> i64 {
        self.n_periods
    }

    /// Writes the epilogue and flushes the file. `final_error_code` is
    /// the sticky error code observed at the end of the run; 0 means a
    /// clean run, 10 means warnings were issued.
    pub fn finalize(mut self, final_error_code: i32) -> Result<(), EngineError> {
        self.file
            .write_i32::<LittleEndian>(self.id_pos as i32)
            .map_err(|e| io_err(&self.path, e))?;
        self.file
            .write_i32::<LittleEndian>(self.obj_prop_pos as i32)
            .map_err(|e| io_err(&self.path, e))?;
        self.file
            .write_i32::<LittleEndian>(self.results_pos as i32)
            .map_err(|e| io_err(&self.path, e))?;
        self.file
            .write_i32::<LittleEndian>(self.n_periods as i32)
            .map_err(|e| io_err(&self.path, e))?;
        self.file
            .write_i32::<LittleEndian>(final_error_code)
            .map_err(|e| io_err(&self.path, e))?;
        self.file
            .write_i32::<LittleEndian>(MAGIC_NUMBER)
            .map_err(|e| io_err(&self.path, e))?;
        self.file.flush().map_err(|e| io_err(&self.path, e))?;
        let _ = self.header;
        Ok(())
    }

    pub fn seek_to_results_start(&mut self) -> Result<(), EngineError> {
        self.file
            .seek(SeekFrom::Start(self.results_pos as u64))
            .map_err(|e| io_err(&self.path, e))?;
        Ok(())
    }
}

fn io_err(path: &Path, e: std::io::Error) -> EngineError {
    EngineError::FileWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> OutputHeader {
        OutputHeader {
            flow_units: FlowUnits::Cfs,
            subcatch_names: vec![],
            node_names: vec![],
            link_names: vec![],
            pollutant_names: vec![],
            pollutant_units: vec![],
            subcatch_vars: vec![],
            node_vars: vec![],
            link_vars: vec![],
            sys_vars: vec![],
            start_date: 0.0,
            report_step_s: 600,
        }
    }

    #[test]
    fn empty_network_bytes_per_period_is_just_the_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let w = OutputWriter::create(&path, header()).unwrap();
        assert_eq!(w.bytes_per_period(), 8);
    }

    #[test]
    fn write_period_increments_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut w = OutputWriter::create(&path, header()).unwrap();
        for i in 0..6 {
            w.write_period(i as f64, &[], &[], &[], &[]).unwrap();
        }
        assert_eq!(w.n_periods(), 6);
        w.finalize(0).unwrap();
    }
}
