use std::fmt;
use std::marker::PhantomData;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Id<Tag, Repr> {
    raw: Repr,
    _marker: PhantomData<Tag>,
}

impl<Tag, Repr: Copy> Copy for Id<Tag, Repr> {}

impl<Tag, Repr: Copy> Clone for Id<Tag, Repr> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Tag, Repr> Id<Tag, Repr> {
    pub const fn new(raw: Repr) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    pub const fn raw(self) -> Repr
    where
        Repr: Copy,
    {
        self.raw
    }
}

impl<Tag, Repr: fmt::Display> fmt::Display for Id<Tag, Repr> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.raw)
    }
}

impl<Tag, Repr: serde::Serialize> serde::Serialize for Id<Tag, Repr> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// Slot in the device texture table.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PageTag {}
pub type PageId = Id<PageTag, u32>;

impl PageId {
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_ids_order_by_slot() {
        let first = PageId::new(3);
        let second = PageId::new(4);
        assert!(second > first);
        assert_eq!(first.index(), 3);
        assert_eq!(second.to_string(), "4");
    }

    #[test]
    fn page_id_serializes_as_raw_slot() {
        let json = serde_json::to_string(&PageId::new(17)).unwrap();
        assert_eq!(json, "17");
    }
}
