use crate::error::EngineError;
use crate::project::{Link, Node};
use crate::types::NodeType;

/// Result of one routing step: whether the (stand-in) solver converged
/// and how many trials it took. Feeds the clock's `non_converge_count`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingStats {
    pub converged: bool,
    pub iterations: u32,
}

/// Propagates flow through the node/link network. Stands in for the
/// dynamic-wave/kinematic-wave hydraulic solver `spec.md` §1 places out
/// of scope.
pub trait RoutingKernel: Send {
    /// The adaptive routing step, in seconds, the kernel would like to
    /// take given its current state and the configured nominal step.
    /// Never below the caller-enforced floor of 0.001s.
    fn adaptive_step_s(&self, nominal_step_s: f64, nodes: &[Node], links: &[Link]) -> f64;

    /// Advances the network state by `dt_s` seconds.
    fn route(&mut self, nodes: &mut [Node], links: &mut [Link], dt_s: f64) -> Result<RoutingStats, EngineError>;
}

/// An explicit-Euler, storage-indicated router: each link conveys flow
/// proportional to the head difference between its end nodes (clamped
/// to `flow_limit`), and each node's depth responds to net inflow over
/// a fixed pseudo-storage area. Deliberately not a St. Venant solve —
/// `spec.md` Non-goals name the dynamic-wave solver explicitly.
#[derive(Debug, Default)]
pub struct SimpleRoutingKernel {
    storage_area_sqft: f64,
}

impl SimpleRoutingKernel {
    pub fn new() -> Self {
        Self {
            storage_area_sqft: 1000.0,
        }
    }
}

impl RoutingKernel for SimpleRoutingKernel {
    fn adaptive_step_s(&self, nominal_step_s: f64, _nodes: &[Node], links: &[Link]) -> f64 {
        let max_conveyance = links
            .iter()
            .map(|l| l.conveyance)
            .fold(0.0_f64, f64::max);
        let courant_bound = if max_conveyance > 0.0 {
            (2.0 * self.storage_area_sqft / max_conveyance).max(0.001)
        } else {
            nominal_step_s
        };
        nominal_step_s.min(courant_bound).max(0.001)
    }

    fn route(&mut self, nodes: &mut [Node], links: &mut [Link], dt_s: f64) -> Result<RoutingStats, EngineError> {
        if dt_s <= 0.0 {
            return Err(EngineError::TimeStepTooSmall);
        }

        // Apply pending control settings before computing flows; a
        // setting change that crosses zero is a status transition.
        for link in links.iter_mut() {
            if link.setting != link.target_setting {
                link.setting = link.target_setting;
            }
        }

        let heads: Vec<f64> = nodes.iter().map(Node::head).collect();

        let mut net_inflow = vec![0.0_f64; nodes.len()];

        for link in links.iter_mut() {
            let up = link.upstream_node;
            let down = link.downstream_node;
            let head_diff = heads[up] - heads[down];
            let mut flow = link.conveyance * link.setting * head_diff;
            flow = flow.clamp(-link.flow_limit, link.flow_limit);
            link.flow = flow;
            link.velocity = if link.conveyance > 0.0 {
                flow / link.conveyance.max(1e-9)
            } else {
                0.0
            };
            net_inflow[up] -= flow;
            net_inflow[down] += flow;
        }

        let mut converged = true;
        for (i, node) in nodes.iter_mut().enumerate() {
            if let Some(fixed_depth) = node.fixed_stage {
                // `fixed_stage` is already relative to invert (see
                // `Node::head`), so the boundary depth is just the
                // stage itself.
                node.depth = fixed_depth.max(0.0);
                node.total_inflow = net_inflow[i] + node.lateral_inflow;
                node.volume = node.depth * self.storage_area_sqft;
                continue;
            }

            let total = net_inflow[i] + node.lateral_inflow;
            node.total_inflow = total;

            let area = if node.node_type == NodeType::Storage {
                self.storage_area_sqft * 4.0
            } else {
                self.storage_area_sqft
            };
            let depth_change = total * dt_s / area;
            node.depth = (node.depth + depth_change).max(0.0);

            if node.max_depth > 0.0 && node.depth > node.max_depth * 2.0 {
                converged = false;
            }
            if node.max_depth > 0.0 {
                node.depth = node.depth.min(node.max_depth);
            }
            node.volume = node.depth * area;
        }

        Ok(RoutingStats {
            converged,
            iterations: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LinkType;

    #[test]
    fn flow_moves_from_high_head_to_low_head() {
        let mut nodes = vec![
            Node::new("up", NodeType::Junction),
            Node::new("down", NodeType::Outfall),
        ];
        nodes[0].depth = 2.0;
        nodes[1].invert = -5.0;
        let mut links = vec![Link::new("C1", LinkType::Conduit, 0, 1)];
        links[0].conveyance = 5.0;

        let mut kernel = SimpleRoutingKernel::new();
        kernel.route(&mut nodes, &mut links, 1.0).unwrap();

        assert!(links[0].flow > 0.0);
    }

    #[test]
    fn zero_or_negative_step_is_rejected() {
        let mut nodes = vec![Node::new("a", NodeType::Junction)];
        let mut links: Vec<Link> = vec![];
        let mut kernel = SimpleRoutingKernel::new();
        assert!(kernel.route(&mut nodes, &mut links, 0.0).is_err());
    }

    #[test]
    fn adaptive_step_never_below_floor() {
        let kernel = SimpleRoutingKernel::new();
        let mut links = vec![Link::new("C1", LinkType::Conduit, 0, 1)];
        links[0].conveyance = 1e12;
        let nodes = vec![Node::new("a", NodeType::Junction), Node::new("b", NodeType::Junction)];
        let step = kernel.adaptive_step_s(15.0, &nodes, &links);
        assert!(step >= 0.001);
    }
}
