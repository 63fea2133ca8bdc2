use num_derive::{FromPrimitive, ToPrimitive};

/// Subcatchment property codes, in the 200-299 range owned by
/// [`ObjectType::Subcatchment`](super::ObjectType::Subcatchment).
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum SubcatchProperty {
    Area = 200,
    Width = 201,
    Slope = 202,
    CurbLength = 203,
    GaugeIndex = 204,
    ApiRainfall = 205,
    ApiSnowfall = 206,
    Runoff = 207,
    RunoffCoeff = 208,
    ExternalBuildup = 209,
}

impl SubcatchProperty {
    pub fn is_read_only(self) -> bool {
        matches!(self, SubcatchProperty::Runoff)
    }

    pub fn writable_during_run(self) -> bool {
        matches!(
            self,
            SubcatchProperty::ApiRainfall | SubcatchProperty::ApiSnowfall | SubcatchProperty::ExternalBuildup
        )
    }
}
