//! Method selection.
//!
//! A type is admitted iff it is public and its qualified name contains none of the
//! ignore-list keywords. For each admitted type, every directly declared public,
//! non-abstract method is selected, except the image's entry point, which is always
//! interpreted separately.

use log::debug;

use crate::image::{MethodHandle, ProgramImage, TypeDescriptor};

/// Ordered list of substring keywords excluding types from exploration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    keywords: Vec<String>,
}

impl IgnoreList {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// An ignore list admitting every public type.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Return the first keyword contained in `qualified_name`, if any.
    pub fn matching(&self, qualified_name: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|kw| qualified_name.contains(kw.as_str()))
            .map(String::as_str)
    }

    /// Check whether `qualified_name` avoids every keyword.
    pub fn admits(&self, qualified_name: &str) -> bool {
        self.matching(qualified_name).is_none()
    }
}

/// An absent ignore list admits every public type, like an empty one.
impl<I, S> From<Option<I>> for IgnoreList
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from(keywords: Option<I>) -> Self {
        keywords.map_or_else(Self::empty, Self::new)
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoreList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Check whether a type takes part in exploration.
pub fn admits_type<T: TypeDescriptor>(ty: &T, ignore: &IgnoreList) -> bool {
    if !ty.is_public() {
        debug!("skipping non-public type {}", ty.qualified_name());
        return false;
    }
    if let Some(kw) = ignore.matching(ty.qualified_name()) {
        debug!("skipping type {} (ignored by '{}')", ty.qualified_name(), kw);
        return false;
    }
    true
}

/// Select the methods of a single type, in declaration order.
///
/// Returns nothing if the type itself is not admitted.
pub fn select_type_methods<T: TypeDescriptor>(ty: &T, ignore: &IgnoreList, entry_point: Option<&MethodHandle>) -> Vec<MethodHandle> {
    if !admits_type(ty, ignore) {
        return Vec::new();
    }
    ty.declared_methods()
        .into_iter()
        .filter(|m| m.is_public() && !m.is_abstract())
        .filter(|m| Some(m) != entry_point)
        .collect()
}

/// Select all methods of an image for ordinary exploration: type order, then
/// declaration order within each type.
///
/// The entry point is never part of the result.
pub fn select_methods<P: ProgramImage>(image: &P, ignore: &IgnoreList) -> Vec<MethodHandle> {
    let entry_point = image.entry_point();
    let mut selected = Vec::new();
    for ty in image.types() {
        let methods = select_type_methods(ty, ignore, entry_point.as_ref());
        debug!("selected {} method(s) of type {}", methods.len(), ty.qualified_name());
        selected.extend(methods);
    }
    selected
}
