use crate::types::LinkType;

/// A conveyance between two nodes.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: String,
    pub link_type: LinkType,
    pub upstream_node: usize,
    pub downstream_node: usize,

    pub offset_upstream: f64,
    pub offset_downstream: f64,
    pub init_flow: f64,
    pub flow_limit: f64,
    pub inlet_loss: f64,
    pub outlet_loss: f64,
    pub average_loss: f64,
    pub seepage_rate: f64,
    pub flap_gate: bool,

    /// Conveyance coefficient for the simplified storage-routing
    /// kernel: `flow = conveyance * head_difference`, clamped to
    /// `flow_limit`.
    pub conveyance: f64,

    /// Current active setting in `[0, 1]` (unbounded for pumps).
    pub setting: f64,
    /// Setting requested through the property interface; applied by
    /// the routing kernel on the next step.
    pub target_setting: f64,
    /// Simulation time (ms) at which `target_setting` last caused a
    /// zero/nonzero transition.
    pub time_last_set: i64,

    /// Current computed flow, cubic feet per second (read-only).
    pub flow: f64,
    pub depth: f64,
    pub velocity: f64,
}

impl Link {
    pub fn new(id: impl Into<String>, link_type: LinkType, upstream: usize, downstream: usize) -> Self {
        Self {
            id: id.into(),
            link_type,
            upstream_node: upstream,
            downstream_node: downstream,
            offset_upstream: 0.0,
            offset_downstream: 0.0,
            init_flow: 0.0,
            flow_limit: f64::INFINITY,
            inlet_loss: 0.0,
            outlet_loss: 0.0,
            average_loss: 0.0,
            seepage_rate: 0.0,
            flap_gate: false,
            conveyance: 10.0,
            setting: 1.0,
            target_setting: 1.0,
            time_last_set: 0,
            flow: 0.0,
            depth: 0.0,
            velocity: 0.0,
        }
    }
}
