/// Base value added by the helper
pub const BASE: i32 = 40;
