use crate::types::{NodeType, OutfallType};

/// A point in the drainage network.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub node_type: NodeType,
    /// Outfall boundary-condition mode; only meaningful when
    /// `node_type == Outfall`.
    pub outfall_type: OutfallType,

    pub invert: f64,
    pub max_depth: f64,
    pub init_depth: f64,
    pub ponded_area: f64,
    pub surcharge_depth: f64,

    /// Externally injected lateral inflow, cubic feet per second,
    /// writable at any point in the lifecycle.
    pub lateral_inflow: f64,
    /// Fixed outfall stage set through the property interface, relative
    /// to invert (i.e. a depth, not an absolute elevation); only
    /// meaningful when `node_type == Outfall`.
    pub fixed_stage: Option<f64>,

    /// Current computed depth above invert (read-only once started).
    pub depth: f64,
    /// Current computed total inflow (read-only).
    pub total_inflow: f64,
    /// Current computed storage volume (read-only).
    pub volume: f64,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            outfall_type: OutfallType::Free,
            invert: 0.0,
            max_depth: 10.0,
            init_depth: 0.0,
            ponded_area: 0.0,
            surcharge_depth: 0.0,
            lateral_inflow: 0.0,
            fixed_stage: None,
            depth: 0.0,
            total_inflow: 0.0,
            volume: 0.0,
        }
    }

    /// Current hydraulic head: invert elevation plus depth (or the
    /// fixed outfall stage, already expressed relative to invert).
    pub fn head(&self) -> f64 {
        self.invert + self.depth
    }
}
