use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{DATE_SIZE, MAGIC_NUMBER, RECORD_SIZE};
use crate::error::EngineError;

/// Random-access reader over a completed results file. Opening the file
/// runs the six-step procedure described for the binary results format:
/// read the epilogue from the end, validate the magic numbers, then
/// read the header and the object-property block to learn the variable
/// layout before any period is fetched.
pub struct OutputReader {
    file: BufReader<File>,
    path: PathBuf,

    pub flow_units: i32,
    pub n_subcatch: i32,
    pub n_nodes: i32,
    pub n_links: i32,
    pub n_pollutants: i32,

    pub subcatch_vars: Vec<i32>,
    pub node_vars: Vec<i32>,
    pub link_vars: Vec<i32>,
    pub sys_vars: Vec<i32>,

    pub start_date: f64,
    pub report_step_s: i32,

    id_pos: i64,
    results_pos: i64,
    n_periods: i64,
    bytes_per_period: i64,

    names: Option<Vec<String>>,
}

impl OutputReader {
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let file = File::open(path).map_err(|e| EngineError::FileOpen {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut r = BufReader::new(file);

        let file_len = r.seek(SeekFrom::End(0)).map_err(|e| read_err(path, e))?;

        // Step 1: the epilogue is the last 6 records.
        r.seek(SeekFrom::End(-6 * RECORD_SIZE)).map_err(|e| read_err(path, e))?;
        let id_pos = read_i32(&mut r, path)? as i64;
        let obj_prop_pos = read_i32(&mut r, path)? as i64;
        let results_pos = read_i32(&mut r, path)? as i64;
        let n_periods = read_i32(&mut r, path)? as i64;
        let final_error_code = read_i32(&mut r, path)?;
        let magic2 = read_i32(&mut r, path)?;

        // Step 2: magic1 must match magic2.
        r.seek(SeekFrom::Start(0)).map_err(|e| read_err(path, e))?;
        let magic1 = read_i32(&mut r, path)?;
        if magic1 != MAGIC_NUMBER || magic2 != MAGIC_NUMBER {
            return Err(EngineError::InvalidFile);
        }
        let _engine_version = read_i32(&mut r, path)?;

        // Step 3: object counts from the header.
        let flow_units = read_i32(&mut r, path)?;
        let n_subcatch = read_i32(&mut r, path)?;
        let n_nodes = read_i32(&mut r, path)?;
        let n_links = read_i32(&mut r, path)?;
        let n_pollutants = read_i32(&mut r, path)?;
        for _ in 0..n_pollutants {
            let _units = read_i32(&mut r, path)?;
        }

        if id_pos <= 0 || id_pos as u64 > file_len {
            return Err(EngineError::InvalidFile);
        }

        // Step 4: variable-count headers and attribute-code arrays.
        r.seek(SeekFrom::Start(obj_prop_pos as u64)).map_err(|e| read_err(path, e))?;
        let n_subcatch_vars = read_i32(&mut r, path)? as usize;
        let n_node_vars = read_i32(&mut r, path)? as usize;
        let n_link_vars = read_i32(&mut r, path)? as usize;
        let n_sys_vars = read_i32(&mut r, path)? as usize;
        let subcatch_vars = read_i32_vec(&mut r, path, n_subcatch_vars)?;
        let node_vars = read_i32_vec(&mut r, path, n_node_vars)?;
        let link_vars = read_i32_vec(&mut r, path, n_link_vars)?;
        let sys_vars = read_i32_vec(&mut r, path, n_sys_vars)?;

        // Step 5: start date and report step, stored 3 records back
        // from the start of the results stream.
        let start_date = read_f64(&mut r, path)?;
        let report_step_s = read_i32(&mut r, path)?;
        let _reserved = read_i32(&mut r, path)?;

        // Step 6: n_periods must be positive and the results stream
        // must fill an exact number of fixed-size period records.
        if n_periods <= 0 {
            return Err(EngineError::NoResults);
        }
        let bytes_per_period = DATE_SIZE
            + 4 * (n_subcatch as i64 * subcatch_vars.len() as i64
                + n_nodes as i64 * node_vars.len() as i64
                + n_links as i64 * link_vars.len() as i64
                + sys_vars.len() as i64);
        let expected_len = results_pos + bytes_per_period * n_periods + 6 * RECORD_SIZE;
        if expected_len as u64 != file_len {
            return Err(EngineError::InvalidFile);
        }

        let _ = final_error_code;

        Ok(Self {
            file: r,
            path: path.to_path_buf(),
            flow_units,
            n_subcatch,
            n_nodes,
            n_links,
            n_pollutants,
            subcatch_vars,
            node_vars,
            link_vars,
            sys_vars,
            start_date,
            report_step_s,
            id_pos,
            results_pos,
            n_periods,
            bytes_per_period,
            names: None,
        })
    }

    pub fn n_periods(&self) -> i64 {
        self.n_periods
    }

    pub fn bytes_per_period(&self) -> i64 {
        self.bytes_per_period
    }

    /// Lazily reads and caches the id table (subcatchments, nodes,
    /// links, pollutants, in that order).
    pub fn element_names(&mut self) -> Result<&[String], EngineError> {
        if self.names.is_none() {
            let total = (self.n_subcatch + self.n_nodes + self.n_links + self.n_pollutants) as usize;
            self.file
                .seek(SeekFrom::Start(self.id_pos as u64))
                .map_err(|e| read_err(&self.path, e))?;
            let mut names = Vec::with_capacity(total);
            for _ in 0..total {
                let len = read_i32(&mut self.file, &self.path)? as usize;
                let mut buf = vec![0u8; len];
                self.file.read_exact(&mut buf).map_err(|e| read_err(&self.path, e))?;
                names.push(String::from_utf8_lossy(&buf).into_owned());
            }
            self.names = Some(names);
        }
        Ok(self.names.as_deref().unwrap())
    }

    fn check_period(&self, period: i64) -> Result<(), EngineError> {
        if period < 0 || period >= self.n_periods {
            return Err(EngineError::PeriodRange(period as i32));
        }
        Ok(())
    }

    fn period_offset(&self, period: i64) -> i64 {
        self.results_pos + period * self.bytes_per_period
    }

    /// The date recorded for one reporting period.
    pub fn period_date(&mut self, period: i64) -> Result<f64, EngineError> {
        self.check_period(period)?;
        self.file
            .seek(SeekFrom::Start(self.period_offset(period) as u64))
            .map_err(|e| read_err(&self.path, e))?;
        read_f64(&mut self.file, &self.path)
    }

    /// One variable's value for one element at one period. `slot` is
    /// the position of the variable within its class's var list times
    /// the element count, i.e. `var_index * n_elements + element_index`.
    fn read_value(&mut self, period: i64, class_offset: i64, slot: i64) -> Result<f32, EngineError> {
        self.check_period(period)?;
        let offset = self.period_offset(period) + DATE_SIZE + 4 * (class_offset + slot);
        self.file
            .seek(SeekFrom::Start(offset as u64))
            .map_err(|e| read_err(&self.path, e))?;
        self.file.read_f32::<LittleEndian>().map_err(|e| read_err(&self.path, e))
    }

    fn subcatch_slot(&self, var_index: usize, element_index: i32) -> Result<(i64, i64), EngineError> {
        if var_index >= self.subcatch_vars.len() {
            return Err(EngineError::PropertyCode(var_index as i32));
        }
        if element_index < 0 || element_index >= self.n_subcatch {
            return Err(EngineError::ObjectIndex(element_index));
        }
        Ok((0, var_index as i64 * self.n_subcatch as i64 + element_index as i64))
    }

    fn node_slot(&self, var_index: usize, element_index: i32) -> Result<(i64, i64), EngineError> {
        if var_index >= self.node_vars.len() {
            return Err(EngineError::PropertyCode(var_index as i32));
        }
        if element_index < 0 || element_index >= self.n_nodes {
            return Err(EngineError::ObjectIndex(element_index));
        }
        let base = self.n_subcatch as i64 * self.subcatch_vars.len() as i64;
        Ok((base, var_index as i64 * self.n_nodes as i64 + element_index as i64))
    }

    fn link_slot(&self, var_index: usize, element_index: i32) -> Result<(i64, i64), EngineError> {
        if var_index >= self.link_vars.len() {
            return Err(EngineError::PropertyCode(var_index as i32));
        }
        if element_index < 0 || element_index >= self.n_links {
            return Err(EngineError::ObjectIndex(element_index));
        }
        let base = self.n_subcatch as i64 * self.subcatch_vars.len() as i64
            + self.n_nodes as i64 * self.node_vars.len() as i64;
        Ok((base, var_index as i64 * self.n_links as i64 + element_index as i64))
    }

    fn sys_base(&self) -> i64 {
        self.n_subcatch as i64 * self.subcatch_vars.len() as i64
            + self.n_nodes as i64 * self.node_vars.len() as i64
            + self.n_links as i64 * self.link_vars.len() as i64
    }

    pub fn subcatch_result(&mut self, period: i64, var_index: usize, element_index: i32) -> Result<f32, EngineError> {
        let (base, slot) = self.subcatch_slot(var_index, element_index)?;
        self.read_value(period, base, slot)
    }

    pub fn node_result(&mut self, period: i64, var_index: usize, element_index: i32) -> Result<f32, EngineError> {
        let (base, slot) = self.node_slot(var_index, element_index)?;
        self.read_value(period, base, slot)
    }

    pub fn link_result(&mut self, period: i64, var_index: usize, element_index: i32) -> Result<f32, EngineError> {
        let (base, slot) = self.link_slot(var_index, element_index)?;
        self.read_value(period, base, slot)
    }

    pub fn sys_result(&mut self, period: i64, var_index: usize) -> Result<f32, EngineError> {
        if var_index >= self.sys_vars.len() {
            return Err(EngineError::PropertyCode(var_index as i32));
        }
        self.read_value(period, self.sys_base(), var_index as i64)
    }

    /// The full time series for one node variable across
    /// `[start_period, end_period)`.
    pub fn node_series(
        &mut self,
        var_index: usize,
        element_index: i32,
        start_period: i64,
        end_period: i64,
    ) -> Result<Vec<f32>, EngineError> {
        if start_period < 0 || end_period > self.n_periods || start_period > end_period {
            return Err(EngineError::PeriodRange(start_period as i32));
        }
        (start_period..end_period)
            .map(|p| self.node_result(p, var_index, element_index))
            .collect()
    }

    /// One variable's value for every element of its class at a single
    /// period, e.g. every node's depth at period 3.
    pub fn node_attribute_at_period(&mut self, var_index: usize, period: i64) -> Result<Vec<f32>, EngineError> {
        if var_index >= self.node_vars.len() {
            return Err(EngineError::PropertyCode(var_index as i32));
        }
        (0..self.n_nodes)
            .map(|i| self.node_result(period, var_index, i))
            .collect()
    }
}

fn read_err(path: &Path, e: std::io::Error) -> EngineError {
    EngineError::FileRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn read_i32(r: &mut impl Read, path: &Path) -> Result<i32, EngineError> {
    r.read_i32::<LittleEndian>().map_err(|e| read_err(path, e))
}

fn read_f64(r: &mut impl Read, path: &Path) -> Result<f64, EngineError> {
    r.read_f64::<LittleEndian>().map_err(|e| read_err(path, e))
}

fn read_i32_vec(r: &mut impl Read, path: &Path, n: usize) -> Result<Vec<i32>, EngineError> {
    (0..n).map(|_| read_i32(r, path)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OutputHeader, OutputWriter};
    use crate::types::{FlowUnits, PollutantUnits};
    use approx::assert_relative_eq;

    fn round_trip_header() -> OutputHeader {
        OutputHeader {
            flow_units: FlowUnits::Cfs,
            subcatch_names: vec!["S1".to_string()],
            node_names: vec!["J1".to_string(), "Out1".to_string()],
            link_names: vec!["C1".to_string()],
            pollutant_names: vec![],
            pollutant_units: vec![],
            subcatch_vars: vec![207],
            node_vars: vec![308, 309, 306],
            link_vars: vec![412, 413],
            sys_vars: vec![],
            start_date: 36524.0,
            report_step_s: 600,
        }
    }

    #[test]
    fn round_trips_header_and_one_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut w = OutputWriter::create(&path, round_trip_header()).unwrap();
        w.write_period(36524.1, &[1.5], &[0.1, 10.1, 5.0, 0.2, 10.2, 6.0], &[3.3, 0.5], &[])
            .unwrap();
        w.finalize(0).unwrap();

        let mut r = OutputReader::open(&path).unwrap();
        assert_eq!(r.n_periods(), 1);
        assert_eq!(r.node_vars, vec![308, 309, 306]);
        let names = r.element_names().unwrap().to_vec();
        assert_eq!(names, vec!["S1", "J1", "Out1", "C1"]);

        assert_relative_eq!(r.subcatch_result(0, 0, 0).unwrap(), 1.5, epsilon = 1e-6);
        assert_relative_eq!(r.node_result(0, 0, 0).unwrap(), 0.1, epsilon = 1e-6);
        assert_relative_eq!(r.node_result(0, 0, 1).unwrap(), 0.2, epsilon = 1e-6);
        assert_relative_eq!(r.link_result(0, 1, 0).unwrap(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn out_of_range_period_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut w = OutputWriter::create(&path, round_trip_header()).unwrap();
        w.write_period(36524.1, &[1.5], &[0.1, 10.1, 5.0, 0.2, 10.2, 6.0], &[3.3, 0.5], &[])
            .unwrap();
        w.finalize(0).unwrap();

        let mut r = OutputReader::open(&path).unwrap();
        assert_eq!(r.node_result(5, 0, 0).unwrap_err(), EngineError::PeriodRange(5));
    }

    #[test]
    fn empty_results_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let w = OutputWriter::create(&path, round_trip_header()).unwrap();
        w.finalize(0).unwrap();

        let err = OutputReader::open(&path).unwrap_err();
        assert_eq!(err, EngineError::NoResults);
    }
}
