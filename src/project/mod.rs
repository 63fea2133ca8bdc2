//! The process-wide project object graph: gauges, subcatchments, nodes,
//! links, and pollutants, each with a stable integer index and a
//! string id. Building this graph from an input file is out of scope
//! (§1); callers of the stepwise API construct it directly with the
//! `add_*` methods below, the same information a real parser would
//! have produced.

mod gauge;
mod link;
mod node;
mod options;
mod pollutant;
mod subcatchment;

pub use gauge::Gauge;
pub use link::Link;
pub use node::Node;
pub use options::{AnalysisOptions, PeriodicHotstart};
pub use pollutant::Pollutant;
pub use subcatchment::Subcatchment;

use std::collections::HashMap;

/// Ownership root for all simulation objects. Indices are stable for
/// the project's lifetime and are the canonical reference used
/// throughout the property interface and output file.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub gauges: Vec<Gauge>,
    pub subcatchments: Vec<Subcatchment>,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub pollutants: Vec<Pollutant>,

    pub options: AnalysisOptions,

    gauge_index: HashMap<String, usize>,
    subcatch_index: HashMap<String, usize>,
    node_index: HashMap<String, usize>,
    link_index: HashMap<String, usize>,
    pollutant_index: HashMap<String, usize>,
}

impl Project {
    pub fn new() -> Self {
        Self {
            options: AnalysisOptions::default(),
            ..Default::default()
        }
    }

    pub fn add_gauge(&mut self, gauge: Gauge) -> usize {
        let idx = self.gauges.len();
        self.gauge_index.insert(gauge.id.clone(), idx);
        self.gauges.push(gauge);
        idx
    }

    pub fn add_subcatchment(&mut self, sub: Subcatchment) -> usize {
        let idx = self.subcatchments.len();
        self.subcatch_index.insert(sub.id.clone(), idx);
        self.subcatchments.push(sub);
        idx
    }

    pub fn add_node(&mut self, node: Node) -> usize {
        let idx = self.nodes.len();
        self.node_index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        idx
    }

    pub fn add_link(&mut self, link: Link) -> usize {
        let idx = self.links.len();
        self.link_index.insert(link.id.clone(), idx);
        self.links.push(link);
        idx
    }

    pub fn add_pollutant(&mut self, pollutant: Pollutant) -> usize {
        let idx = self.pollutants.len();
        self.pollutant_index.insert(pollutant.id.clone(), idx);
        self.pollutants.push(pollutant);
        idx
    }

    pub fn gauge_index_of(&self, id: &str) -> Option<usize> {
        self.gauge_index.get(id).copied()
    }

    pub fn subcatch_index_of(&self, id: &str) -> Option<usize> {
        self.subcatch_index.get(id).copied()
    }

    pub fn node_index_of(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn link_index_of(&self, id: &str) -> Option<usize> {
        self.link_index.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LinkType, NodeType};

    #[test]
    fn indices_are_stable_and_lookup_by_id_works() {
        let mut p = Project::new();
        let n0 = p.add_node(Node::new("J1", NodeType::Junction));
        let n1 = p.add_node(Node::new("Out1", NodeType::Outfall));
        let l0 = p.add_link(Link::new("C1", LinkType::Conduit, n0, n1));

        assert_eq!(p.node_index_of("J1"), Some(n0));
        assert_eq!(p.node_index_of("Out1"), Some(n1));
        assert_eq!(p.link_index_of("C1"), Some(l0));
        assert_eq!(p.node_index_of("nope"), None);
    }
}
