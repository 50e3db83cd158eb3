//! Packed ARGB display colors. These travel over the wire as plain
//! integers so peers can render each other's cars consistently.

pub const HOST_RED: i32 = 0xFFFF_0000_u32 as i32;
pub const CLIENT_BLUE: i32 = 0xFF00_00FF_u32 as i32;
pub const BOT_ORANGE: i32 = 0xFFFF_9800_u32 as i32;
pub const BOT_PURPLE: i32 = 0xFF9C_27B0_u32 as i32;
