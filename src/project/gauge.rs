/// A rain gauge: a named rainfall intensity series assigned to zero or
/// more subcatchments.
#[derive(Debug, Clone)]
pub struct Gauge {
    pub id: String,
    /// Current rainfall intensity in inches/hour (or mm/hr under SI),
    /// either driven by a time series (out of scope) or overridden
    /// through the property interface.
    pub rainfall: f64,
    pub total_rainfall: f64,
}

impl Gauge {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rainfall: 0.0,
            total_rainfall: 0.0,
        }
    }
}
