/// A value that was either successfully recognized as a known variant `T`,
/// or is an unrecognized raw value `Raw`.
///
/// Shader parameter lookups use this to tell a legacy name that is listed in
/// a remapping table (possibly as obsolete) apart from one that is not listed
/// at all. The raw name is preserved so diagnostics can report it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Recognized<T, Raw = String> {
    Known(T),
    Unknown(Raw),
}

impl<T, Raw> Recognized<T, Raw> {
    pub fn into_known(self) -> Option<T> {
        match self {
            Recognized::Known(t) => Some(t),
            Recognized::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Recognized::Known(_))
    }
}

impl<T> Recognized<Option<T>> {
    /// Flatten a table lookup into the mapped destination, if any.
    ///
    /// Both obsolete entries (`Known(None)`) and unlisted names collapse to
    /// `None`.
    pub fn mapped(self) -> Option<T> {
        self.into_known().flatten()
    }
}
