use num_derive::{FromPrimitive, ToPrimitive};

/// Rain gauge property codes, in the 100-199 range owned by
/// [`ObjectType::Gauge`](super::ObjectType::Gauge).
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum GaugeProperty {
    RainfallOverride = 100,
    TotalRainfall = 101,
}

impl GaugeProperty {
    pub fn is_read_only(self) -> bool {
        matches!(self, GaugeProperty::TotalRainfall)
    }
}
