use num_derive::{FromPrimitive, ToPrimitive};

/// The kind of node in the drainage network: a junction, a storage
/// unit, a flow divider, or an outfall.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum NodeType {
    Junction = 0,
    Outfall = 1,
    Storage = 2,
    Divider = 3,
}

/// How an outfall node's boundary stage is determined. Only meaningful
/// when `node_type == NodeType::Outfall`; other node types leave this
/// at its default.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum OutfallType {
    Free = 0,
    Normal = 1,
    Fixed = 2,
    Tidal = 3,
    TimeSeries = 4,
}

/// Node property codes, in the 300-399 range owned by [`ObjectType::Node`](super::ObjectType::Node).
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum NodeProperty {
    Invert = 300,
    MaxDepth = 301,
    InitDepth = 302,
    PondedArea = 303,
    SurchargeDepth = 304,
    LateralInflow = 305,
    TotalInflow = 306,
    OutfallFixedStage = 307,
    Depth = 308,
    Head = 309,
    Volume = 310,
}

impl NodeProperty {
    /// `true` for properties the simulation itself computes; writing
    /// them is never permitted regardless of lifecycle state.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            NodeProperty::TotalInflow | NodeProperty::Depth | NodeProperty::Head | NodeProperty::Volume
        )
    }

    /// `true` if the property may be written once the simulation has
    /// started (as opposed to only before `start`).
    pub fn writable_during_run(self) -> bool {
        matches!(self, NodeProperty::LateralInflow | NodeProperty::OutfallFixedStage)
    }
}
