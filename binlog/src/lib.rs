pub mod checksum_type;
pub mod codec;
pub mod event_type;
pub mod events;
pub mod gtid;
pub mod header;
pub mod header_flag;
pub mod reader_context;
