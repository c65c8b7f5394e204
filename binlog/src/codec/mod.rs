pub mod crc;
pub mod fixed_int;
pub mod packed_int;
pub mod varlen_int;

pub use crc::crc32;
pub use packed_int::{calculate_packed_int_size, read_packed_int, write_packed_int};
pub use varlen_int::{
    calculate_varlen_int_size, calculate_varlen_int_size_signed, read_varlen_int, read_varlen_uint,
    write_varlen_int, write_varlen_uint,
};
