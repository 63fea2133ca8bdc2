use num_derive::{FromPrimitive, ToPrimitive};

/// The five observable object classes the property interface dispatches
/// over. Each class owns a disjoint range of property codes (system
/// &lt; 100, gauge 100-199, subcatchment 200-299, node 300-399, link
/// 400-499) so that a legacy single-argument call can still dispatch on
/// the code alone.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum ObjectType {
    System = 0,
    Gauge = 1,
    Subcatchment = 2,
    Node = 3,
    Link = 4,
}

impl ObjectType {
    /// The property-code range this object class owns, used to validate
    /// that a `(object_type, property_code)` pair agrees with each other
    /// even when called through the legacy code-only dispatch.
    pub fn code_range(self) -> std::ops::Range<i32> {
        match self {
            ObjectType::System => 0..100,
            ObjectType::Gauge => 100..200,
            ObjectType::Subcatchment => 200..300,
            ObjectType::Node => 300..400,
            ObjectType::Link => 400..500,
        }
    }

    /// Infers the object class purely from a property code, for the
    /// legacy single-argument call form.
    pub fn from_code(code: i32) -> Option<ObjectType> {
        match code {
            0..=99 => Some(ObjectType::System),
            100..=199 => Some(ObjectType::Gauge),
            200..=299 => Some(ObjectType::Subcatchment),
            300..=399 => Some(ObjectType::Node),
            400..=499 => Some(ObjectType::Link),
            _ => None,
        }
    }
}
