use slotmap::new_key_type;

new_key_type! {
    pub struct TetherTypeId;
}

/// An unordered pair of tether types, stored with the smaller id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TetherPair(TetherTypeId, TetherTypeId);

impl TetherPair {
    pub fn new(a: TetherTypeId, b: TetherTypeId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    pub fn first(&self) -> TetherTypeId {
        self.0
    }

    pub fn second(&self) -> TetherTypeId {
        self.1
    }

    pub fn is_homotypic(&self) -> bool {
        self.0 == self.1
    }

    pub fn contains(&self, id: TetherTypeId) -> bool {
        self.0 == id || self.1 == id
    }
}
