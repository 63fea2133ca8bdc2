use num_derive::{FromPrimitive, ToPrimitive};

/// System-level property codes, in the 0-99 range owned by
/// [`ObjectType::System`](super::ObjectType::System).
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum SystemProperty {
    StartDateTime = 0,
    EndDateTime = 1,
    ReportStart = 2,
    RouteStep = 3,
    ReportStep = 4,
    RuleStep = 5,
    MinRouteStep = 6,
    LengtheningStep = 7,
    AllowPonding = 8,
    InertiaDamping = 9,
    SurchargeMethod = 10,
    IgnoreRainfall = 11,
    IgnoreRouting = 12,
    NumThreads = 13,
    ElapsedTime = 14,
}

impl SystemProperty {
    pub fn is_read_only(self) -> bool {
        matches!(self, SystemProperty::ElapsedTime)
    }

    pub fn writable_during_run(self) -> bool {
        matches!(self, SystemProperty::RouteStep)
    }
}

/// Flow unit system. Used both by the property interface's unit
/// conversion table and by the binary output file's flow-units header
/// field (`flow_units_code`, 0..5 = CFS, GPM, MGD, CMS, LPS, MLD).
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum FlowUnits {
    Cfs = 0,
    Gpm = 1,
    Mgd = 2,
    Cms = 3,
    Lps = 4,
    Mld = 5,
}

impl FlowUnits {
    /// `true` for US customary units, `false` for SI.
    pub fn is_us(self) -> bool {
        matches!(self, FlowUnits::Cfs | FlowUnits::Gpm | FlowUnits::Mgd)
    }

    /// Conversion factor from internal SI flow (cubic meters per second)
    /// to this unit system.
    pub fn from_cms(self) -> f64 {
        match self {
            FlowUnits::Cfs => 35.314_667,
            FlowUnits::Gpm => 15_850.323,
            FlowUnits::Mgd => 22.824_466,
            FlowUnits::Cms => 1.0,
            FlowUnits::Lps => 1_000.0,
            FlowUnits::Mld => 86.4,
        }
    }
}

/// Feet per meter, used to convert the engine's internal US-customary
/// length/area/volume storage into SI when `flow_units` names an SI
/// system.
const FEET_PER_METER: f64 = 3.280_839_895;
const ACRES_PER_HECTARE: f64 = 2.471_05;
const CUBIC_FEET_PER_CUBIC_METER: f64 = 35.314_666_7;

/// Which physical dimension a property belongs to, for the purpose of
/// the read/write unit conversion the property interface applies.
/// `Flow` is converted through [`FlowUnits::from_cms`]; the others only
/// change between the US customary and SI unit families (the engine
/// always stores state internally in US customary units: feet, acres,
/// cubic feet).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QuantityClass {
    /// Also covers any length-per-time rate (velocity, rainfall
    /// intensity, seepage rate): the time unit (seconds) never changes,
    /// so the same length factor applies.
    Length,
    Area,
    Volume,
    Flow,
}

impl QuantityClass {
    /// Multiply an internally-stored value by this to get the value in
    /// `units`; divide (or multiply by the reciprocal) to go the other
    /// way.
    pub fn factor(self, units: FlowUnits) -> f64 {
        match self {
            QuantityClass::Flow => units.from_cms() / FlowUnits::Cfs.from_cms(),
            QuantityClass::Length => {
                if units.is_us() {
                    1.0
                } else {
                    1.0 / FEET_PER_METER
                }
            }
            QuantityClass::Area => {
                if units.is_us() {
                    1.0
                } else {
                    1.0 / ACRES_PER_HECTARE
                }
            }
            QuantityClass::Volume => {
                if units.is_us() {
                    1.0
                } else {
                    1.0 / CUBIC_FEET_PER_CUBIC_METER
                }
            }
        }
    }
}

/// Converts an internally-stored value to the caller's configured unit
/// system.
pub fn to_user_units(class: QuantityClass, units: FlowUnits, internal_value: f64) -> f64 {
    internal_value * class.factor(units)
}

/// Converts a value supplied through the property interface (already in
/// the caller's configured unit system) back to the engine's internal
/// storage units.
pub fn to_internal_units(class: QuantityClass, units: FlowUnits, user_value: f64) -> f64 {
    user_value / class.factor(units)
}

/// Pollutant concentration units, as stored in the output file header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum PollutantUnits {
    MgPerLiter = 0,
    UgPerLiter = 1,
    CountPerLiter = 2,
}

/// Which hydraulic state representation the routing kernel uses.
/// Exposed so the adaptive-step query can be model-aware even though
/// the real dynamic-wave/kinematic-wave solvers are out of scope.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum RoutingModel {
    None = 0,
    SteadyFlow = 1,
    KinematicWave = 2,
    DynamicWave = 3,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum SurchargeMethod {
    Extran = 0,
    Slot = 1,
}

#[cfg(test)]
mod unit_conversion_tests {
    use super::*;

    #[test]
    fn us_units_are_the_identity() {
        for class in [QuantityClass::Length, QuantityClass::Area, QuantityClass::Volume, QuantityClass::Flow] {
            assert_eq!(class.factor(FlowUnits::Cfs), 1.0);
        }
    }

    #[test]
    fn length_round_trips_through_si() {
        let internal = 10.0;
        let user = to_user_units(QuantityClass::Length, FlowUnits::Cms, internal);
        assert!((user - internal / FEET_PER_METER).abs() < 1e-9);
        let back = to_internal_units(QuantityClass::Length, FlowUnits::Cms, user);
        assert!((back - internal).abs() < 1e-9);
    }

    #[test]
    fn flow_factor_matches_cfs_to_gpm() {
        let factor = QuantityClass::Flow.factor(FlowUnits::Gpm);
        assert!((factor - 448.831_217).abs() < 1e-3);
    }
}
