use std::fmt;

use serde::{Deserialize, Serialize};

/// Which output of a split a child branch follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchPort {
    /// Transmitted / undiffracted output, selector bit 0.
    Through = 0,
    /// Reflected / diffracted output, selector bit 1.
    Deflected = 1,
}

/// Lineage of a beam branch encoded as a bit-prefix code.
///
/// The root is `0b1`; the leading set bit is a sentinel so that the
/// lineage below it survives leading zero selectors. A split of branch
/// `b` produces `(b << 1) | port`. `b1` is an ancestor of `b2` exactly
/// when the bits of `b1` are a prefix of the bits of `b2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchIndex(u64);

impl BranchIndex {
    pub const ROOT: BranchIndex = BranchIndex(0b1);

    /// Wrap raw bits such as `0b110`.
    ///
    /// Not validated here: a beam only accepts indices it produced itself,
    /// so zero or a foreign lineage is rejected at placement time.
    pub const fn from_bits(bits: u64) -> Self {
        BranchIndex(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Number of splits between the root and this branch.
    pub fn depth(self) -> Option<u32> {
        if self.0 == 0 {
            None
        } else {
            Some(63 - self.0.leading_zeros())
        }
    }

    /// The child index for `port`, or `None` when the sentinel bit would be
    /// shifted out.
    pub fn child(self, port: BranchPort) -> Option<BranchIndex> {
        if self.0 == 0 || self.0.leading_zeros() == 0 {
            return None;
        }
        Some(BranchIndex((self.0 << 1) | port as u64))
    }

    /// The branch this one was split from.
    pub fn parent(self) -> Option<BranchIndex> {
        if self.0 <= 1 {
            None
        } else {
            Some(BranchIndex(self.0 >> 1))
        }
    }

    /// The port this branch took at its last split.
    pub fn port(self) -> Option<BranchPort> {
        self.parent().map(|_| {
            if self.0 & 1 == 0 {
                BranchPort::Through
            } else {
                BranchPort::Deflected
            }
        })
    }

    /// True when `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(self, other: BranchIndex) -> bool {
        match (self.depth(), other.depth()) {
            (Some(a), Some(b)) if b >= a => (other.0 >> (b - a)) == self.0,
            _ => false,
        }
    }

    /// True when `self` is a strict descendant of `ancestor`.
    pub fn descends_from(self, ancestor: BranchIndex) -> bool {
        self != ancestor && ancestor.is_prefix_of(self)
    }

    /// Ports taken from the root down to this branch.
    pub fn lineage(self) -> Vec<BranchPort> {
        let mut ports = Vec::new();
        let mut cur = self;
        while let Some(port) = cur.port() {
            ports.push(port);
            cur = match cur.parent() {
                Some(p) => p,
                None => break,
            };
        }
        ports.reverse();
        ports
    }
}

impl Default for BranchIndex {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Display for BranchIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#b}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn idx(bits: u64) -> BranchIndex {
        BranchIndex::from_bits(bits)
    }

    #[test]
    fn root_has_depth_zero() {
        assert_eq!(BranchIndex::ROOT.depth(), Some(0));
        assert_eq!(BranchIndex::ROOT.parent(), None);
        assert_eq!(BranchIndex::ROOT.port(), None);
        assert_eq!(idx(0).depth(), None);
    }

    #[test]
    fn split_children() {
        let r = BranchIndex::ROOT;
        assert_eq!(r.child(BranchPort::Through), Some(idx(0b10)));
        assert_eq!(r.child(BranchPort::Deflected), Some(idx(0b11)));
        assert_eq!(idx(0b11).child(BranchPort::Through), Some(idx(0b110)));
        assert_eq!(idx(0b110).parent(), Some(idx(0b11)));
    }

    #[test]
    fn prefix_relationships() {
        assert!(idx(0b11).is_prefix_of(idx(0b110)));
        assert!(idx(0b11).is_prefix_of(idx(0b11110)));
        assert!(idx(0b1).is_prefix_of(idx(0b10)));
        assert!(!idx(0b10).is_prefix_of(idx(0b110)));
        assert!(!idx(0b110).is_prefix_of(idx(0b11)));
        assert!(idx(0b110).descends_from(idx(0b11)));
        assert!(!idx(0b11).descends_from(idx(0b11)));
        assert!(!idx(0).is_prefix_of(idx(0b1)));
    }

    #[test]
    fn lineage_lists_ports() {
        assert!(BranchIndex::ROOT.lineage().is_empty());
        assert_eq!(
            idx(0b110).lineage(),
            vec![BranchPort::Deflected, BranchPort::Through]
        );
    }

    #[test]
    fn child_refuses_to_drop_sentinel() {
        let deepest = idx(1 << 63);
        assert_eq!(deepest.depth(), Some(63));
        assert_eq!(deepest.child(BranchPort::Through), None);
    }

    #[test]
    fn display_as_binary() {
        assert_eq!(idx(0b11110).to_string(), "0b11110");
    }

    fn arb_ports() -> impl Strategy<Value = Vec<bool>> {
        prop::collection::vec(any::<bool>(), 0..30)
    }

    proptest! {
        #[test]
        fn descendants_share_prefix(a in arb_ports(), b in arb_ports()) {
            let build = |ports: &[bool]| {
                ports.iter().fold(BranchIndex::ROOT, |acc, &deflect| {
                    let port = if deflect { BranchPort::Deflected } else { BranchPort::Through };
                    acc.child(port).unwrap()
                })
            };
            let ia = build(&a);
            let mut joined = a.clone();
            joined.extend_from_slice(&b);
            let ib = build(&joined);
            prop_assert!(ia.is_prefix_of(ib));
            prop_assert_eq!(ib.lineage().len(), joined.len());
            if !b.is_empty() {
                prop_assert!(!ib.is_prefix_of(ia));
            }
        }
    }
}
