pub mod gtid;
pub mod gtid_log_flag;
pub mod gtid_set;
pub mod tag;
pub mod uuid;

pub use gtid::Gtid;
pub use gtid_log_flag::GtidLogFlag;
pub use gtid_set::GtidSet;
pub use tag::Tag;
pub use uuid::Uuid;
