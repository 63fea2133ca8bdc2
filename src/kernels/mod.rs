//! Trait boundaries for the physical subcomponent kernels that
//! `spec.md` places out of scope (rainfall ingest, infiltration,
//! groundwater, the dynamic-wave/kinematic-wave solvers, water-quality
//! transport, mass-balance accounting). Each trait is the interface
//! contract a real kernel would implement; the `Simple*` types are the
//! deterministic stand-ins this crate ships so the lifecycle controller
//! has something to drive.

mod mass_balance;
mod routing;
mod runoff;

pub use mass_balance::{MassBalanceKernel, MassBalanceReport, SimpleMassBalance};
pub use routing::{RoutingKernel, RoutingStats, SimpleRoutingKernel};
pub use runoff::{RunoffKernel, SimpleRunoffKernel};
