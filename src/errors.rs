// /src/errors.rs
//! Error kinds surfaced by the collection view. Absent targets are no-ops, not errors.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionViewError {
    #[error("CollectionView: Invalid view")]
    InvalidView,

    #[error("CollectionView: Invalid position {index} (subview count is {len})")]
    InvalidPosition { index: isize, len: usize },

    #[error("CollectionView: No itemView found")]
    NoItemView,

    #[error("CollectionView: already bound to a collection")]
    AlreadyBound,

    #[error("CollectionView: used after dispose")]
    Disposed,
}

/// Coarse classification so callers can catch a whole family of errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Configuration,
    Disposed,
}

impl CollectionViewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectionViewError::InvalidView | CollectionViewError::InvalidPosition { .. } => {
                ErrorKind::InvalidArgument
            }
            CollectionViewError::NoItemView | CollectionViewError::AlreadyBound => {
                ErrorKind::Configuration
            }
            CollectionViewError::Disposed => ErrorKind::Disposed,
        }
    }

    pub(crate) fn position(index: usize, len: usize) -> Self {
        CollectionViewError::InvalidPosition {
            index: isize::try_from(index).unwrap_or(isize::MAX),
            len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_variants() {
        assert_eq!(CollectionViewError::InvalidView.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            CollectionViewError::InvalidPosition { index: -1, len: 3 }.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(CollectionViewError::NoItemView.kind(), ErrorKind::Configuration);
        assert_eq!(CollectionViewError::AlreadyBound.kind(), ErrorKind::Configuration);
        assert_eq!(CollectionViewError::Disposed.kind(), ErrorKind::Disposed);
    }

    #[test]
    fn position_message_names_bounds() {
        let err = CollectionViewError::position(7, 5);
        assert_eq!(err.to_string(), "CollectionView: Invalid position 7 (subview count is 5)");
    }
}
