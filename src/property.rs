//! The typed property interface: `get_value`/`set_value` keyed by
//! `(object_type, property_code, index, sub_index)`. Each object class
//! owns a disjoint range of property codes, so a caller that only has
//! the code can still resolve the object type with
//! [`ObjectType::from_code`]. `sub_index` is reserved for
//! pollutant-indexed per-element properties; nothing currently uses it
//! since water-quality transport is out of scope.

use num_traits::FromPrimitive;

use crate::error::EngineError;
use crate::project::Project;
use crate::state::LifecycleState;
use crate::types::{
    to_internal_units, to_user_units, GaugeProperty, LinkProperty, NodeProperty, NodeType,
    ObjectType, OutfallType, QuantityClass, SubcatchProperty, SurchargeMethod, SystemProperty,
};

fn require_readable(state: LifecycleState) -> Result<(), EngineError> {
    match state {
        LifecycleState::Open | LifecycleState::Started | LifecycleState::Ended => Ok(()),
        _ => Err(EngineError::NotOpen),
    }
}

/// Whether a property may be written in the engine's current lifecycle
/// state: never if it's computed by the simulation, only before
/// `start()` if it's a static configuration value, and in `Started`
/// too if it's one of the handful of properties meant to be driven
/// live through the API.
fn check_writable(state: LifecycleState, read_only: bool, writable_during_run: bool) -> Result<(), EngineError> {
    if read_only {
        return Err(EngineError::NotWritable);
    }
    match state {
        LifecycleState::Open => Ok(()),
        LifecycleState::Started if writable_during_run => Ok(()),
        _ => Err(EngineError::NotWritable),
    }
}

pub fn get_value(
    project: &Project,
    state: LifecycleState,
    elapsed_time_days: f64,
    object_type: ObjectType,
    property_code: i32,
    index: i32,
    sub_index: i32,
) -> Result<f64, EngineError> {
    let _ = sub_index;
    require_readable(state)?;
    if !object_type.code_range().contains(&property_code) {
        return Err(EngineError::PropertyCode(property_code));
    }

    match object_type {
        ObjectType::System => get_system(project, elapsed_time_days, property_code),
        ObjectType::Gauge => get_gauge(project, property_code, index),
        ObjectType::Subcatchment => get_subcatch(project, property_code, index),
        ObjectType::Node => get_node(project, property_code, index),
        ObjectType::Link => get_link(project, property_code, index),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn set_value(
    project: &mut Project,
    state: LifecycleState,
    current_time_ms: i64,
    object_type: ObjectType,
    property_code: i32,
    index: i32,
    sub_index: i32,
    value: f64,
) -> Result<(), EngineError> {
    let _ = sub_index;
    if !object_type.code_range().contains(&property_code) {
        return Err(EngineError::PropertyCode(property_code));
    }

    match object_type {
        ObjectType::System => set_system(project, state, property_code, value),
        ObjectType::Gauge => set_gauge(project, state, property_code, index, value),
        ObjectType::Subcatchment => set_subcatch(project, state, property_code, index, value),
        ObjectType::Node => set_node(project, state, property_code, index, value),
        ObjectType::Link => set_link(project, state, current_time_ms, property_code, index, value),
    }
}

// System properties are time steps, flags, and counters — none of them
// belong to a unit-system-dependent quantity class, so `get_system`/
// `set_system` pass values through unconverted.
fn get_system(project: &Project, elapsed_time_days: f64, code: i32) -> Result<f64, EngineError> {
    let prop = SystemProperty::from_i32(code).ok_or(EngineError::PropertyCode(code))?;
    let o = &project.options;
    Ok(match prop {
        SystemProperty::StartDateTime => o.start_datetime,
        SystemProperty::EndDateTime => o.end_datetime,
        SystemProperty::ReportStart => o.report_start,
        SystemProperty::RouteStep => o.route_step_s,
        SystemProperty::ReportStep => o.report_step_s,
        SystemProperty::RuleStep => o.rule_step_s,
        SystemProperty::MinRouteStep => o.min_route_step_s,
        SystemProperty::LengtheningStep => o.lengthening_step_s,
        SystemProperty::AllowPonding => bool_to_f64(o.allow_ponding),
        SystemProperty::InertiaDamping => bool_to_f64(o.inertia_damping),
        SystemProperty::SurchargeMethod => o.surcharge_method as i32 as f64,
        SystemProperty::IgnoreRainfall => bool_to_f64(o.ignore_rainfall),
        SystemProperty::IgnoreRouting => bool_to_f64(o.ignore_routing),
        SystemProperty::NumThreads => o.num_threads as f64,
        SystemProperty::ElapsedTime => elapsed_time_days,
    })
}

fn set_system(project: &mut Project, state: LifecycleState, code: i32, value: f64) -> Result<(), EngineError> {
    let prop = SystemProperty::from_i32(code).ok_or(EngineError::PropertyCode(code))?;
    check_writable(state, prop.is_read_only(), prop.writable_during_run())?;
    let o = &mut project.options;
    match prop {
        SystemProperty::StartDateTime => o.start_datetime = value,
        SystemProperty::EndDateTime => o.end_datetime = value,
        SystemProperty::ReportStart => o.report_start = value,
        SystemProperty::RouteStep => {
            if value <= 0.0 {
                return Err(EngineError::PropertyValue(value));
            }
            o.route_step_s = value;
        }
        SystemProperty::ReportStep => o.report_step_s = value,
        SystemProperty::RuleStep => o.rule_step_s = value,
        SystemProperty::MinRouteStep => o.min_route_step_s = value,
        SystemProperty::LengtheningStep => o.lengthening_step_s = value,
        SystemProperty::AllowPonding => o.allow_ponding = value != 0.0,
        SystemProperty::InertiaDamping => o.inertia_damping = value != 0.0,
        SystemProperty::SurchargeMethod => {
            o.surcharge_method =
                SurchargeMethod::from_f64(value).ok_or(EngineError::PropertyValue(value))?;
        }
        SystemProperty::IgnoreRainfall => o.ignore_rainfall = value != 0.0,
        SystemProperty::IgnoreRouting => o.ignore_routing = value != 0.0,
        SystemProperty::NumThreads => {
            if value < 1.0 {
                return Err(EngineError::PropertyValue(value));
            }
            o.num_threads = value as usize;
        }
        SystemProperty::ElapsedTime => unreachable!("read-only properties are rejected above"),
    }
    Ok(())
}

fn get_gauge(project: &Project, code: i32, index: i32) -> Result<f64, EngineError> {
    let prop = GaugeProperty::from_i32(code).ok_or(EngineError::PropertyCode(code))?;
    let units = project.options.flow_units;
    let gauge = project.gauges.get(index as usize).ok_or(EngineError::ObjectIndex(index))?;
    Ok(match prop {
        GaugeProperty::RainfallOverride => to_user_units(QuantityClass::Length, units, gauge.rainfall),
        GaugeProperty::TotalRainfall => to_user_units(QuantityClass::Length, units, gauge.total_rainfall),
    })
}

fn set_gauge(project: &mut Project, state: LifecycleState, code: i32, index: i32, value: f64) -> Result<(), EngineError> {
    let prop = GaugeProperty::from_i32(code).ok_or(EngineError::PropertyCode(code))?;
    check_writable(state, prop.is_read_only(), true)?;
    let units = project.options.flow_units;
    let gauge = project.gauges.get_mut(index as usize).ok_or(EngineError::ObjectIndex(index))?;
    match prop {
        GaugeProperty::RainfallOverride => {
            gauge.rainfall = to_internal_units(QuantityClass::Length, units, value)
        }
        GaugeProperty::TotalRainfall => unreachable!("read-only properties are rejected above"),
    }
    Ok(())
}

fn get_subcatch(project: &Project, code: i32, index: i32) -> Result<f64, EngineError> {
    let prop = SubcatchProperty::from_i32(code).ok_or(EngineError::PropertyCode(code))?;
    let units = project.options.flow_units;
    let sub = project
        .subcatchments
        .get(index as usize)
        .ok_or(EngineError::ObjectIndex(index))?;
    Ok(match prop {
        SubcatchProperty::Area => to_user_units(QuantityClass::Area, units, sub.area_acres),
        SubcatchProperty::Width => to_user_units(QuantityClass::Length, units, sub.width_ft),
        SubcatchProperty::Slope => sub.slope,
        SubcatchProperty::CurbLength => to_user_units(QuantityClass::Length, units, sub.curb_length_ft),
        SubcatchProperty::GaugeIndex => sub.gauge.map(|g| g as f64).unwrap_or(-1.0),
        SubcatchProperty::ApiRainfall => sub
            .api_rainfall_override
            .map(|v| to_user_units(QuantityClass::Length, units, v))
            .unwrap_or(-1.0),
        SubcatchProperty::ApiSnowfall => sub
            .api_snowfall_override
            .map(|v| to_user_units(QuantityClass::Length, units, v))
            .unwrap_or(-1.0),
        SubcatchProperty::Runoff => to_user_units(QuantityClass::Flow, units, sub.runoff_cfs),
        SubcatchProperty::RunoffCoeff => sub.runoff_coeff,
        SubcatchProperty::ExternalBuildup => sub.external_buildup,
    })
}

fn set_subcatch(project: &mut Project, state: LifecycleState, code: i32, index: i32, value: f64) -> Result<(), EngineError> {
    let prop = SubcatchProperty::from_i32(code).ok_or(EngineError::PropertyCode(code))?;
    check_writable(state, prop.is_read_only(), prop.writable_during_run())?;
    let units = project.options.flow_units;
    let sub = project
        .subcatchments
        .get_mut(index as usize)
        .ok_or(EngineError::ObjectIndex(index))?;
    match prop {
        SubcatchProperty::Area => sub.area_acres = to_internal_units(QuantityClass::Area, units, value),
        SubcatchProperty::Width => sub.width_ft = to_internal_units(QuantityClass::Length, units, value),
        SubcatchProperty::Slope => sub.slope = value,
        SubcatchProperty::CurbLength => {
            sub.curb_length_ft = to_internal_units(QuantityClass::Length, units, value)
        }
        SubcatchProperty::GaugeIndex => {
            sub.gauge = if value < 0.0 { None } else { Some(value as usize) };
        }
        // A negative value clears the override and falls back to the
        // assigned gauge, mirroring the "no override" sentinel the
        // legacy API uses for this class of property. The sentinel
        // check happens on the raw value, before unit conversion.
        SubcatchProperty::ApiRainfall => {
            sub.api_rainfall_override = if value < 0.0 {
                None
            } else {
                Some(to_internal_units(QuantityClass::Length, units, value))
            };
        }
        SubcatchProperty::ApiSnowfall => {
            sub.api_snowfall_override = if value < 0.0 {
                None
            } else {
                Some(to_internal_units(QuantityClass::Length, units, value))
            };
        }
        SubcatchProperty::Runoff => unreachable!("read-only properties are rejected above"),
        SubcatchProperty::RunoffCoeff => sub.runoff_coeff = value,
        SubcatchProperty::ExternalBuildup => sub.external_buildup = value,
    }
    Ok(())
}

fn get_node(project: &Project, code: i32, index: i32) -> Result<f64, EngineError> {
    let prop = NodeProperty::from_i32(code).ok_or(EngineError::PropertyCode(code))?;
    let units = project.options.flow_units;
    let node = project.nodes.get(index as usize).ok_or(EngineError::ObjectIndex(index))?;
    let length = |v: f64| to_user_units(QuantityClass::Length, units, v);
    Ok(match prop {
        NodeProperty::Invert => length(node.invert),
        NodeProperty::MaxDepth => length(node.max_depth),
        NodeProperty::InitDepth => length(node.init_depth),
        NodeProperty::PondedArea => to_user_units(QuantityClass::Area, units, node.ponded_area),
        NodeProperty::SurchargeDepth => length(node.surcharge_depth),
        NodeProperty::LateralInflow => to_user_units(QuantityClass::Flow, units, node.lateral_inflow),
        NodeProperty::TotalInflow => to_user_units(QuantityClass::Flow, units, node.total_inflow),
        NodeProperty::OutfallFixedStage => node.fixed_stage.map(length).unwrap_or(-1.0),
        NodeProperty::Depth => length(node.depth),
        NodeProperty::Head => length(node.head()),
        NodeProperty::Volume => to_user_units(QuantityClass::Volume, units, node.volume),
    })
}

fn set_node(project: &mut Project, state: LifecycleState, code: i32, index: i32, value: f64) -> Result<(), EngineError> {
    let prop = NodeProperty::from_i32(code).ok_or(EngineError::PropertyCode(code))?;
    check_writable(state, prop.is_read_only(), prop.writable_during_run())?;
    let units = project.options.flow_units;
    let node = project.nodes.get_mut(index as usize).ok_or(EngineError::ObjectIndex(index))?;
    match prop {
        NodeProperty::Invert => node.invert = to_internal_units(QuantityClass::Length, units, value),
        NodeProperty::MaxDepth => node.max_depth = to_internal_units(QuantityClass::Length, units, value),
        NodeProperty::InitDepth => node.init_depth = to_internal_units(QuantityClass::Length, units, value),
        NodeProperty::PondedArea => node.ponded_area = to_internal_units(QuantityClass::Area, units, value),
        NodeProperty::SurchargeDepth => {
            node.surcharge_depth = to_internal_units(QuantityClass::Length, units, value)
        }
        NodeProperty::LateralInflow => {
            node.lateral_inflow = to_internal_units(QuantityClass::Flow, units, value)
        }
        NodeProperty::OutfallFixedStage => {
            // Scenario: set_value on a non-outfall node is rejected
            // outright; a valid write also converts the node's
            // boundary-condition mode to FIXED.
            if node.node_type != NodeType::Outfall {
                return Err(EngineError::ObjectType);
            }
            if value < 0.0 {
                node.fixed_stage = None;
            } else {
                node.fixed_stage = Some(to_internal_units(QuantityClass::Length, units, value));
                node.outfall_type = OutfallType::Fixed;
            }
        }
        NodeProperty::TotalInflow | NodeProperty::Depth | NodeProperty::Head | NodeProperty::Volume => {
            unreachable!("read-only properties are rejected above")
        }
    }
    Ok(())
}

fn get_link(project: &Project, code: i32, index: i32) -> Result<f64, EngineError> {
    let prop = LinkProperty::from_i32(code).ok_or(EngineError::PropertyCode(code))?;
    let units = project.options.flow_units;
    let link = project.links.get(index as usize).ok_or(EngineError::ObjectIndex(index))?;
    let length = |v: f64| to_user_units(QuantityClass::Length, units, v);
    Ok(match prop {
        LinkProperty::OffsetUpstream => length(link.offset_upstream),
        LinkProperty::OffsetDownstream => length(link.offset_downstream),
        LinkProperty::InitFlow => to_user_units(QuantityClass::Flow, units, link.init_flow),
        LinkProperty::FlowLimit => to_user_units(QuantityClass::Flow, units, link.flow_limit),
        LinkProperty::InletLoss => link.inlet_loss,
        LinkProperty::OutletLoss => link.outlet_loss,
        LinkProperty::AverageLoss => link.average_loss,
        LinkProperty::SeepageRate => length(link.seepage_rate),
        LinkProperty::FlapGate => bool_to_f64(link.flap_gate),
        LinkProperty::Setting => link.setting,
        LinkProperty::TargetSetting => link.target_setting,
        LinkProperty::TimeLastSet => link.time_last_set as f64,
        LinkProperty::Flow => to_user_units(QuantityClass::Flow, units, link.flow),
        LinkProperty::Depth => length(link.depth),
        LinkProperty::Velocity => length(link.velocity),
    })
}

fn set_link(
    project: &mut Project,
    state: LifecycleState,
    current_time_ms: i64,
    code: i32,
    index: i32,
    value: f64,
) -> Result<(), EngineError> {
    let prop = LinkProperty::from_i32(code).ok_or(EngineError::PropertyCode(code))?;
    check_writable(state, prop.is_read_only(), prop.writable_during_run())?;
    let units = project.options.flow_units;
    let link = project.links.get_mut(index as usize).ok_or(EngineError::ObjectIndex(index))?;
    match prop {
        LinkProperty::OffsetUpstream => {
            link.offset_upstream = to_internal_units(QuantityClass::Length, units, value)
        }
        LinkProperty::OffsetDownstream => {
            link.offset_downstream = to_internal_units(QuantityClass::Length, units, value)
        }
        LinkProperty::InitFlow => link.init_flow = to_internal_units(QuantityClass::Flow, units, value),
        LinkProperty::FlowLimit => link.flow_limit = to_internal_units(QuantityClass::Flow, units, value),
        LinkProperty::InletLoss => link.inlet_loss = value,
        LinkProperty::OutletLoss => link.outlet_loss = value,
        LinkProperty::AverageLoss => link.average_loss = value,
        LinkProperty::SeepageRate => {
            link.seepage_rate = to_internal_units(QuantityClass::Length, units, value)
        }
        LinkProperty::FlapGate => link.flap_gate = value != 0.0,
        LinkProperty::Setting => link.setting = value,
        LinkProperty::TargetSetting => {
            // A zero/nonzero crossing is a status transition and gets
            // stamped with the current simulation time; the routing
            // kernel applies the new target on its next step.
            let crosses_zero = (link.target_setting == 0.0) != (value == 0.0);
            link.target_setting = value;
            if crosses_zero {
                link.time_last_set = current_time_ms;
            }
        }
        LinkProperty::Flow | LinkProperty::Depth | LinkProperty::Velocity | LinkProperty::TimeLastSet => {
            unreachable!("read-only properties are rejected above")
        }
    }
    Ok(())
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Link, Node};
    use crate::types::{LinkType, NodeType};

    fn project_with_one_node() -> Project {
        let mut p = Project::new();
        p.add_node(Node::new("J1", NodeType::Junction));
        p
    }

    #[test]
    fn read_only_property_rejects_writes_in_any_state() {
        let mut p = project_with_one_node();
        let err = set_value(
            &mut p,
            LifecycleState::Open,
            0,
            ObjectType::Node,
            NodeProperty::Depth as i32,
            0,
            0,
            1.0,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::NotWritable);
    }

    #[test]
    fn static_property_only_writable_before_start() {
        let mut p = project_with_one_node();
        assert!(set_value(
            &mut p,
            LifecycleState::Open,
            0,
            ObjectType::Node,
            NodeProperty::MaxDepth as i32,
            0,
            0,
            15.0,
        )
        .is_ok());
        let err = set_value(
            &mut p,
            LifecycleState::Started,
            0,
            ObjectType::Node,
            NodeProperty::MaxDepth as i32,
            0,
            0,
            15.0,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::NotWritable);
    }

    #[test]
    fn lateral_inflow_is_writable_while_running() {
        let mut p = project_with_one_node();
        assert!(set_value(
            &mut p,
            LifecycleState::Started,
            0,
            ObjectType::Node,
            NodeProperty::LateralInflow as i32,
            0,
            0,
            5.0,
        )
        .is_ok());
        let v = get_value(
            &p,
            LifecycleState::Started,
            0.0,
            ObjectType::Node,
            NodeProperty::LateralInflow as i32,
            0,
            0,
        )
        .unwrap();
        assert_eq!(v, 5.0);
    }

    #[test]
    fn target_setting_crossing_zero_stamps_time() {
        let mut p = Project::new();
        let n0 = p.add_node(Node::new("J1", NodeType::Junction));
        p.add_link(Link::new("C1", LinkType::Conduit, n0, n0));

        set_value(
            &mut p,
            LifecycleState::Started,
            42_000,
            ObjectType::Link,
            LinkProperty::TargetSetting as i32,
            0,
            0,
            0.0,
        )
        .unwrap();
        assert_eq!(p.links[0].time_last_set, 42_000);

        set_value(
            &mut p,
            LifecycleState::Started,
            99_000,
            ObjectType::Link,
            LinkProperty::TargetSetting as i32,
            0,
            0,
            0.0,
        )
        .unwrap();
        assert_eq!(p.links[0].time_last_set, 42_000);
    }

    #[test]
    fn object_index_out_of_range_is_rejected() {
        let p = project_with_one_node();
        let err = get_value(
            &p,
            LifecycleState::Open,
            0.0,
            ObjectType::Node,
            NodeProperty::Depth as i32,
            7,
            0,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::ObjectIndex(7));
    }

    #[test]
    fn mismatched_object_type_and_code_is_rejected() {
        let p = project_with_one_node();
        let err = get_value(
            &p,
            LifecycleState::Open,
            0.0,
            ObjectType::Node,
            SubcatchProperty::Area as i32,
            0,
            0,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::PropertyCode(SubcatchProperty::Area as i32));
    }
}
