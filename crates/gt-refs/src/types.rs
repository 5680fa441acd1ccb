//! The head reference value.

use gt_types::ObjectId;

/// Where the head points.
///
/// Passed explicitly into and out of the commit and checkout paths, so the
/// repository state they act on is always visible at the call site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Head {
    /// No commit has been made yet.
    #[default]
    Unborn,
    /// Head points at this commit.
    At(ObjectId),
}

impl Head {
    /// The commit head points at, if any.
    pub fn commit(&self) -> Option<ObjectId> {
        match self {
            Self::Unborn => None,
            Self::At(id) => Some(*id),
        }
    }

    /// Returns `true` before the first commit.
    pub fn is_unborn(&self) -> bool {
        matches!(self, Self::Unborn)
    }
}

impl From<Option<ObjectId>> for Head {
    fn from(id: Option<ObjectId>) -> Self {
        id.map_or(Self::Unborn, Self::At)
    }
}

impl From<ObjectId> for Head {
    fn from(id: ObjectId) -> Self {
        Self::At(id)
    }
}
