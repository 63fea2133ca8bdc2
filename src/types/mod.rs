//! Enumerations shared across the property interface, the project
//! object model, and the binary output file: object kinds, per-class
//! property codes, and the small vocabularies (flow units, node/link
//! types, routing models) that those properties take values from.

mod object;
mod node;
mod link;
mod subcatch;
mod system;
mod gauge;

pub use object::ObjectType;
pub use node::{NodeProperty, NodeType, OutfallType};
pub use link::{LinkProperty, LinkType};
pub use subcatch::SubcatchProperty;
pub use system::{
    to_internal_units, to_user_units, FlowUnits, PollutantUnits, QuantityClass, RoutingModel,
    SurchargeMethod, SystemProperty,
};
pub use gauge::GaugeProperty;
