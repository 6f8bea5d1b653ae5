//! Charge and discharge permission
//!
//! Pure predicates over the error flags and the context. The OFF latch of a
//! direction is masked out before its fault test, since it records an
//! earlier decision rather than a new fault.

use super::flags::ErrorFlags;
use crate::context::BmsContext;

/// Any fault that prevents charging
pub fn charge_fault(flags: ErrorFlags) -> bool {
    flags.intersects(ErrorFlags::CHARGE_FAULTS)
}

/// Any fault that prevents discharging
pub fn discharge_fault(flags: ErrorFlags) -> bool {
    flags.intersects(ErrorFlags::DISCHARGE_FAULTS)
}

/// Charging may be enabled
pub fn charge_allowed(ctx: &BmsContext) -> bool {
    !charge_fault(ctx.data.error_flags.difference(ErrorFlags::CHG_OFF))
        && !ctx.full
        && ctx.chg_enable
}

/// Discharging may be enabled
pub fn discharge_allowed(ctx: &BmsContext) -> bool {
    !discharge_fault(ctx.data.error_flags.difference(ErrorFlags::DIS_OFF))
        && !ctx.empty
        && ctx.dis_enable
}
