/// A land-area runoff-producing unit.
#[derive(Debug, Clone)]
pub struct Subcatchment {
    pub id: String,
    /// Index of the assigned rain gauge, or `None` if ungauged.
    pub gauge: Option<usize>,
    /// Index of the node runoff is delivered to.
    pub outlet: Option<usize>,

    pub area_acres: f64,
    pub width_ft: f64,
    pub slope: f64,
    pub curb_length_ft: f64,
    pub runoff_coeff: f64,

    /// API-injected rainfall override (inches/hr), applied in place of
    /// the gauge's value for this subcatchment only, until cleared.
    pub api_rainfall_override: Option<f64>,
    pub api_snowfall_override: Option<f64>,
    pub external_buildup: f64,

    /// Current computed runoff, cubic feet per second (read-only).
    pub runoff_cfs: f64,
}

impl Subcatchment {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            gauge: None,
            outlet: None,
            area_acres: 1.0,
            width_ft: 100.0,
            slope: 0.01,
            curb_length_ft: 0.0,
            runoff_coeff: 0.5,
            api_rainfall_override: None,
            api_snowfall_override: None,
            external_buildup: 0.0,
            runoff_cfs: 0.0,
        }
    }
}
