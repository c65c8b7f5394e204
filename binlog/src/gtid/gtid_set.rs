use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;

use common::err::{IngestError, IngestResult};

use crate::codec::fixed_int::{read_exact, read_i64, read_u64};
use crate::codec::{calculate_varlen_int_size, read_varlen_uint, write_varlen_uint};

use super::gtid::Gtid;
use super::tag::Tag;
use super::uuid::{self, Uuid};

/// Half-open `[lo, hi)` interval of GNOs; `hi` is exclusive.
type Interval = (i64, i64);

/// Sentinel value for `n_uuids` signalling the tagged-aware encoding
/// instead of the backward-compatible untagged-only form. Not part of any
/// upstream wire format -- this repo's own choice where the byte-exact
/// tagged layout is unspecified (see DESIGN.md).
const TAGGED_FORM_MARKER: u64 = u64::MAX;

/// Coalesced GTID set: `uuid -> (tag -> disjoint, sorted gno intervals)`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GtidSet {
    groups: BTreeMap<Uuid, BTreeMap<Tag, Vec<Interval>>>,
}

impl GtidSet {
    pub fn new() -> Self {
        GtidSet::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains_tags(&self) -> bool {
        self.groups.values().any(|tags| tags.keys().any(|t| !t.is_empty()))
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn contains(&self, gtid: &Gtid) -> bool {
        let Some(tags) = self.groups.get(&gtid.uuid) else { return false };
        let Some(intervals) = tags.get(&gtid.tag) else { return false };
        let gno = gtid.gno as i64;
        find_interval_index(intervals, gno).is_ok()
    }

    /// Adds a single GNO, extending or merging neighboring intervals.
    /// A no-op if the GNO is already contained.
    pub fn add(&mut self, uuid: Uuid, tag: Tag, gno: u64) {
        self.add_interval(uuid, tag, gno, gno);
    }

    /// Adds a closed interval `[lo, hi]`.
    pub fn add_interval(&mut self, uuid: Uuid, tag: Tag, lo: u64, hi: u64) {
        let intervals = self.groups.entry(uuid).or_default().entry(tag).or_default();
        insert_interval(intervals, (lo as i64, hi as i64 + 1));
    }

    /// Unions `other` into `self`, merging per `(uuid, tag)`. Commutative
    /// and associative in the resulting value.
    pub fn union(&mut self, other: &GtidSet) {
        for (uuid, tags) in &other.groups {
            for (tag, intervals) in tags {
                let dst = self.groups.entry(*uuid).or_default().entry(tag.clone()).or_default();
                for &(lo, hi) in intervals {
                    insert_interval(dst, (lo, hi));
                }
            }
        }
    }

    pub fn calculate_encoded_size(&self) -> usize {
        if self.contains_tags() {
            let mut size = 8 + 8; // marker + group_count
            for tags in self.groups.values() {
                for (tag, intervals) in tags {
                    size += uuid::ENCODED_LEN + tag.calculate_encoded_size() + 8 + intervals.len() * 16;
                }
            }
            size
        } else {
            let mut size = 8; // n_uuids
            for tags in self.groups.values() {
                let intervals = tags.get(&Tag::empty());
                let n = intervals.map(|v| v.len()).unwrap_or(0);
                size += uuid::ENCODED_LEN + 8 + n * 16;
            }
            size
        }
    }

    pub fn encode_to(&self, out: &mut Vec<u8>) {
        if self.contains_tags() {
            out.extend_from_slice(&TAGGED_FORM_MARKER.to_le_bytes());
            let group_count: u64 =
                self.groups.values().map(|tags| tags.len() as u64).sum();
            out.extend_from_slice(&group_count.to_le_bytes());
            for (uuid, tags) in &self.groups {
                for (tag, intervals) in tags {
                    out.extend_from_slice(uuid.as_bytes());
                    tag.encode_to(out);
                    out.extend_from_slice(&(intervals.len() as u64).to_le_bytes());
                    for &(lo, hi) in intervals {
                        out.extend_from_slice(&lo.to_le_bytes());
                        out.extend_from_slice(&hi.to_le_bytes());
                    }
                }
            }
        } else {
            out.extend_from_slice(&(self.groups.len() as u64).to_le_bytes());
            for (uuid, tags) in &self.groups {
                let intervals = tags.get(&Tag::empty()).cloned().unwrap_or_default();
                out.extend_from_slice(uuid.as_bytes());
                out.extend_from_slice(&(intervals.len() as u64).to_le_bytes());
                for (lo, hi) in intervals {
                    out.extend_from_slice(&lo.to_le_bytes());
                    out.extend_from_slice(&hi.to_le_bytes());
                }
            }
        }
    }

    pub fn decode_from(bytes: &[u8]) -> IngestResult<Self> {
        let mut cursor = Cursor::new(bytes);
        let first = read_u64(&mut cursor)?;
        let mut set = GtidSet::new();

        if first == TAGGED_FORM_MARKER {
            let group_count = read_u64(&mut cursor)?;
            for _ in 0..group_count {
                let uuid = Uuid::from_bytes(read_exact(&mut cursor, uuid::ENCODED_LEN)?.try_into().expect("16 bytes"));
                let tag = Tag::decode_from(&mut cursor)?;
                let n_intervals = read_u64(&mut cursor)?;
                let intervals = set.groups.entry(uuid).or_default().entry(tag).or_default();
                for _ in 0..n_intervals {
                    let lo = read_i64(&mut cursor)?;
                    let hi = read_i64(&mut cursor)?;
                    intervals.push((lo, hi));
                }
            }
        } else {
            let n_uuids = first;
            for _ in 0..n_uuids {
                let uuid = Uuid::from_bytes(read_exact(&mut cursor, uuid::ENCODED_LEN)?.try_into().expect("16 bytes"));
                let n_intervals = read_u64(&mut cursor)?;
                let intervals = set.groups.entry(uuid).or_default().entry(Tag::empty()).or_default();
                for _ in 0..n_intervals {
                    let lo = read_i64(&mut cursor)?;
                    let hi = read_i64(&mut cursor)?;
                    intervals.push((lo, hi));
                }
            }
        }

        if cursor.position() != bytes.len() as u64 {
            return Err(IngestError::malformed_frame("extra bytes after gtid-set encoding"));
        }
        Ok(set)
    }
}

/// Binary-search insertion with coalescing: finds where `interval` belongs,
/// merges with any overlapping/adjacent neighbors on either side.
fn insert_interval(intervals: &mut Vec<Interval>, interval: Interval) {
    let (mut lo, mut hi) = interval;
    if lo >= hi {
        return;
    }

    // First interval that overlaps or touches `[lo, hi)` from the left.
    let merge_from = intervals.partition_point(|&(_, ihi)| ihi < lo);
    let mut merge_to = merge_from;

    while merge_to < intervals.len() && intervals[merge_to].0 <= hi {
        let (ilo, ihi) = intervals[merge_to];
        lo = lo.min(ilo);
        hi = hi.max(ihi);
        merge_to += 1;
    }

    intervals.splice(merge_from..merge_to, std::iter::once((lo, hi)));
}

fn find_interval_index(intervals: &[Interval], gno: i64) -> Result<usize, usize> {
    intervals.binary_search_by(|&(lo, hi)| {
        if gno < lo {
            std::cmp::Ordering::Greater
        } else if gno >= hi {
            std::cmp::Ordering::Less
        } else {
            std::cmp::Ordering::Equal
        }
    })
}

impl fmt::Display for GtidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first_group = true;
        for (uuid, tags) in &self.groups {
            for (tag, intervals) in tags {
                if intervals.is_empty() {
                    continue;
                }
                if !first_group {
                    write!(f, ", ")?;
                }
                first_group = false;
                write!(f, "{uuid}")?;
                if !tag.is_empty() {
                    write!(f, ":{tag}")?;
                }
                for &(lo, hi) in intervals {
                    let upper = hi - 1;
                    if upper == lo {
                        write!(f, ":{lo}")?;
                    } else {
                        write!(f, ":{lo}-{upper}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn uuid(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    #[test]
    fn renders_untagged_set_per_spec_example() {
        let mut set = GtidSet::new();
        for g in [1, 2, 3, 5] {
            set.add(uuid(0x11), Tag::empty(), g);
        }
        for g in [11, 12, 13, 15] {
            set.add(uuid(0x22), Tag::empty(), g);
        }
        assert_eq!(
            set.to_string(),
            "11111111-1111-1111-1111-111111111111:1-3:5, \
             22222222-2222-2222-2222-222222222222:11-13:15"
        );
    }

    #[test]
    fn renders_mixed_tagged_set_after_untagged_group() {
        let mut set = GtidSet::new();
        for g in [1, 2, 3, 5] {
            set.add(uuid(0x11), Tag::empty(), g);
        }
        let alpha = Tag::new("alpha").unwrap();
        for g in [111, 112, 113, 115] {
            set.add(uuid(0x11), alpha.clone(), g);
        }
        assert_eq!(
            set.to_string(),
            "11111111-1111-1111-1111-111111111111:1-3:5:alpha:111-113:115"
        );
    }

    #[test]
    fn interval_insertion_coalesces_and_stays_sorted() {
        let mut set = GtidSet::new();
        let u = uuid(0x11);
        for g in [5, 1, 3, 2, 100, 50] {
            set.add(u, Tag::empty(), g);
        }
        let gtid = Gtid::untagged(u, 3).unwrap();
        assert!(set.contains(&gtid));
        // re-adding a contained gno is a no-op
        let before = set.clone();
        set.add(u, Tag::empty(), 2);
        assert_eq!(set, before);
    }

    #[test]
    fn union_is_commutative_and_extends_containment() {
        let mut a = GtidSet::new();
        a.add_interval(uuid(0x11), Tag::empty(), 1, 5);
        let mut b = GtidSet::new();
        b.add_interval(uuid(0x11), Tag::empty(), 4, 10);

        let mut a_union_b = a.clone();
        a_union_b.union(&b);
        let mut b_union_a = b.clone();
        b_union_a.union(&a);
        assert_eq!(a_union_b, b_union_a);

        for g in 1..=10u64 {
            assert!(a_union_b.contains(&Gtid::untagged(uuid(0x11), g).unwrap()));
        }
    }

    #[test]
    fn untagged_roundtrip() {
        let mut set = GtidSet::new();
        set.add_interval(uuid(0x11), Tag::empty(), 1, 3);
        set.add(uuid(0x22), Tag::empty(), 11);
        assert!(!set.contains_tags());

        let mut buf = Vec::new();
        set.encode_to(&mut buf);
        assert_eq!(buf.len(), set.calculate_encoded_size());
        let decoded = GtidSet::decode_from(&buf).unwrap();
        assert_eq!(decoded, set);
    }

    #[test]
    fn tagged_roundtrip() {
        let mut set = GtidSet::new();
        set.add_interval(uuid(0x11), Tag::empty(), 1, 3);
        set.add_interval(uuid(0x11), Tag::new("alpha").unwrap(), 111, 115);
        assert!(set.contains_tags());

        let mut buf = Vec::new();
        set.encode_to(&mut buf);
        assert_eq!(buf.len(), set.calculate_encoded_size());
        let decoded = GtidSet::decode_from(&buf).unwrap();
        assert_eq!(decoded, set);
    }

    #[test]
    fn empty_set_is_empty() {
        let set = GtidSet::new();
        assert!(set.is_empty());
        assert_eq!(set.to_string(), "");
    }
}
