use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Binlog event header flags.
    /// https://dev.mysql.com/doc/dev/mysql-server/latest/group__group__cs__binglog__event__header__flags.html
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EventFlag: u16 {
        /// Set in the first event of a binlog still open for writing.
        const BINLOG_IN_USE_F = 0x001;

        /// If the query depends on the thread (for example: TEMPORARY TABLE).
        const THREAD_SPECIFIC_F = 0x004;

        /// Suppress the generation of `USE` statements before the actual statement.
        const SUPPRESS_USE_F = 0x008;

        /// Artificial events are created arbitrarily and not written to the
        /// source's binary log; they must not advance the reader's position.
        const ARTIFICIAL_F = 0x020;

        /// Events with this flag set are created by the replica IO thread
        /// and written to a relay log.
        const RELAY_LOG_F = 0x040;

        /// A replica that does not recognize this event's type code should
        /// skip it silently instead of reporting an unknown event.
        const IGNORABLE_F = 0x080;

        /// Events with this flag are always written to the binary log
        /// regardless of filters.
        const NO_FILTER_F = 0x100;

        /// Marks an event that must execute in isolation from other workers
        /// in a multi-threaded replica applier.
        const MTS_ISOLATE_F = 0x200;
    }
}
