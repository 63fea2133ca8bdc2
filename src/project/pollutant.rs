use crate::types::PollutantUnits;

/// A water-quality constituent tracked through the network. Transport
/// itself is out of scope; this crate only carries enough of the
/// pollutant's identity for the binary output file header to describe
/// it correctly.
#[derive(Debug, Clone)]
pub struct Pollutant {
    pub id: String,
    pub units: PollutantUnits,
}

impl Pollutant {
    pub fn new(id: impl Into<String>, units: PollutantUnits) -> Self {
        Self { id: id.into(), units }
    }
}
