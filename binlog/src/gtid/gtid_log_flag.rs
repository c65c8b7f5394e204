use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Flags carried by the `gtid_log`/`anonymous_gtid_log`/`gtid_tagged_log`
    /// post-header, each with a stable string label for logging.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct GtidLogFlag: u8 {
        /// The transaction may contain statement-based changes.
        const MAY_HAVE_SBR = 0x01;
    }
}

impl GtidLogFlag {
    /// String label for a single recognized bit, or `""` if none match --
    /// mirrors the reference's `to_string_view` lookup.
    pub fn label(self) -> &'static str {
        if self == GtidLogFlag::MAY_HAVE_SBR {
            "may_have_sbr"
        } else {
            ""
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn may_have_sbr_bit_matches_reference() {
        assert_eq!(GtidLogFlag::MAY_HAVE_SBR.bits(), 0x01);
        assert_eq!(GtidLogFlag::MAY_HAVE_SBR.label(), "may_have_sbr");
    }

    #[test]
    fn unrecognized_combination_has_empty_label() {
        assert_eq!(GtidLogFlag::empty().label(), "");
    }
}
