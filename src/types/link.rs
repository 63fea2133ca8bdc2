use num_derive::{FromPrimitive, ToPrimitive};

/// The kind of conveyance a link represents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum LinkType {
    Conduit = 0,
    Pump = 1,
    Orifice = 2,
    Weir = 3,
    Outlet = 4,
}

/// Link property codes, in the 400-499 range owned by [`ObjectType::Link`](super::ObjectType::Link).
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum LinkProperty {
    OffsetUpstream = 400,
    OffsetDownstream = 401,
    InitFlow = 402,
    FlowLimit = 403,
    InletLoss = 404,
    OutletLoss = 405,
    AverageLoss = 406,
    SeepageRate = 407,
    FlapGate = 408,
    Setting = 409,
    TargetSetting = 410,
    TimeLastSet = 411,
    Flow = 412,
    Depth = 413,
    Velocity = 414,
}

impl LinkProperty {
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            LinkProperty::Flow | LinkProperty::Depth | LinkProperty::Velocity | LinkProperty::TimeLastSet
        )
    }

    pub fn writable_during_run(self) -> bool {
        matches!(self, LinkProperty::Setting | LinkProperty::TargetSetting)
    }
}
