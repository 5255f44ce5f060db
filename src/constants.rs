/// Maximum drift tolerated between a proposed split total and the expense
/// amount, in currency units. One minor unit: anything further off cannot be
/// reconciled by rounding.
pub const SPLIT_TOLERANCE: f64 = 0.01;
