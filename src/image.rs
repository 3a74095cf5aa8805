//! Loaded program images.
//!
//! The driver never inspects code directly. It discovers what to explore through two
//! small traits that any reflection facility can implement:
//!
//! - [`ProgramImage`] enumerates the declared types and names the entry point.
//! - [`TypeDescriptor`] exposes a type's qualified name, visibility and the methods
//!   declared directly on it.
//!
//! Methods are referred to by [`MethodHandle`]s. Two handles are equal iff they point
//! to the same declaration, so two distinct methods with identical names and
//! modifiers (e.g. overloads) stay distinct keys in the summary store.
//!
//! [`Image`] and [`TypeDecl`] are a simple in-memory implementation, handy for tests
//! and for engines that build their own metadata tables.

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::BitOr;
use std::sync::Arc;

/// Method modifiers relevant for method selection.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const PUBLIC: Self = Self(1 << 0);
    pub const STATIC: Self = Self(1 << 1);
    pub const ABSTRACT: Self = Self(1 << 2);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub const fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub const fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl Display for Modifiers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut words = Vec::new();
        words.push(if self.is_public() { "public" } else { "private" });
        if self.is_static() {
            words.push("static");
        }
        if self.is_abstract() {
            words.push("abstract");
        }
        write!(f, "{}", words.join(" "))
    }
}

#[derive(Debug)]
struct MethodDecl {
    declaring_type: String,
    name: String,
    modifiers: Modifiers,
}

/// Identity-based handle to a declared method.
///
/// Cloning a handle is cheap and yields an equal handle. Handles created by separate
/// calls to [`MethodHandle::new`] are never equal, even if all their fields match.
#[derive(Clone)]
pub struct MethodHandle(Arc<MethodDecl>);

impl MethodHandle {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>, modifiers: Modifiers) -> Self {
        Self(Arc::new(MethodDecl {
            declaring_type: declaring_type.into(),
            name: name.into(),
            modifiers,
        }))
    }

    /// Short name of the method, without the declaring type.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Fully qualified name of the declaring type.
    pub fn declaring_type(&self) -> &str {
        &self.0.declaring_type
    }

    pub fn modifiers(&self) -> Modifiers {
        self.0.modifiers
    }

    pub fn is_public(&self) -> bool {
        self.0.modifiers.is_public()
    }

    pub fn is_static(&self) -> bool {
        self.0.modifiers.is_static()
    }

    pub fn is_abstract(&self) -> bool {
        self.0.modifiers.is_abstract()
    }
}

impl PartialEq for MethodHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MethodHandle {}

impl Hash for MethodHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl std::fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MethodHandle({} {})", self.0.modifiers, self)
    }
}

impl Display for MethodHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.0.declaring_type, self.0.name)
    }
}

/// A type declared in a program image.
pub trait TypeDescriptor {
    /// Fully qualified name, used for ignore-list matching.
    fn qualified_name(&self) -> &str;

    fn is_public(&self) -> bool;

    /// Methods declared directly on this type (inherited ones excluded), in declaration order.
    fn declared_methods(&self) -> Vec<MethodHandle>;
}

/// A loaded program image: the unit of one exploration run.
pub trait ProgramImage {
    type Type: TypeDescriptor;

    /// All declared types, in a stable order.
    fn types(&self) -> &[Self::Type];

    /// The designated program entry method, if the image has one.
    ///
    /// The returned handle must be the very declaration yielded by the declaring
    /// type's [`TypeDescriptor::declared_methods`], not a freshly built handle with
    /// the same name. Handles compare by identity, so a fresh handle would not be
    /// excluded from ordinary selection and the entry point would be explored twice.
    fn entry_point(&self) -> Option<MethodHandle>;
}

/// In-memory type declaration.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    qualified_name: String,
    public: bool,
    methods: Vec<MethodHandle>,
}

impl TypeDecl {
    pub fn new(qualified_name: impl Into<String>, public: bool) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            public,
            methods: Vec::new(),
        }
    }

    /// Declare a new method on this type and return its handle.
    pub fn declare(&mut self, name: impl Into<String>, modifiers: Modifiers) -> MethodHandle {
        let method = MethodHandle::new(self.qualified_name.clone(), name, modifiers);
        self.methods.push(method.clone());
        method
    }

    /// Builder-style variant of [`declare`][TypeDecl::declare].
    pub fn with_method(mut self, name: impl Into<String>, modifiers: Modifiers) -> Self {
        self.declare(name, modifiers);
        self
    }

    pub fn methods(&self) -> &[MethodHandle] {
        &self.methods
    }

    /// Find the first declared method with the given name.
    pub fn method(&self, name: &str) -> Option<&MethodHandle> {
        self.methods.iter().find(|m| m.name() == name)
    }
}

impl TypeDescriptor for TypeDecl {
    fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    fn is_public(&self) -> bool {
        self.public
    }

    fn declared_methods(&self) -> Vec<MethodHandle> {
        self.methods.clone()
    }
}

/// In-memory program image.
#[derive(Debug, Clone, Default)]
pub struct Image {
    types: Vec<TypeDecl>,
    entry_point: Option<MethodHandle>,
}

impl Image {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, ty: TypeDecl) -> &mut TypeDecl {
        self.types.push(ty);
        let last = self.types.len() - 1;
        &mut self.types[last]
    }

    pub fn with_type(mut self, ty: TypeDecl) -> Self {
        self.types.push(ty);
        self
    }

    /// Designate the entry method.
    ///
    /// The handle should be declared on one of the image's types; it is then skipped
    /// during per-type enumeration and interpreted once as the entry point.
    pub fn set_entry_point(&mut self, method: MethodHandle) {
        self.entry_point = Some(method);
    }

    /// Find a type by its fully qualified name.
    pub fn find_type(&self, qualified_name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.qualified_name == qualified_name)
    }

    /// Find a method by declaring type and method name.
    pub fn find_method(&self, qualified_name: &str, name: &str) -> Option<&MethodHandle> {
        self.find_type(qualified_name)?.method(name)
    }
}

impl ProgramImage for Image {
    type Type = TypeDecl;

    fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    fn entry_point(&self) -> Option<MethodHandle> {
        self.entry_point.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use test_log::test;

    #[test]
    fn test_handle_identity() {
        let a = MethodHandle::new("Lists", "Construct", Modifiers::PUBLIC);
        let b = MethodHandle::new("Lists", "Construct", Modifiers::PUBLIC);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);

        let set: HashSet<_> = [a.clone(), b.clone(), a.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_modifiers() {
        let m = Modifiers::PUBLIC | Modifiers::STATIC;
        assert!(m.is_public());
        assert!(m.is_static());
        assert!(!m.is_abstract());
        assert_eq!(m.to_string(), "public static");
        assert_eq!(Modifiers::ABSTRACT.to_string(), "private abstract");
    }

    #[test]
    fn test_display() {
        let m = MethodHandle::new("Tests.Lists", "Construct", Modifiers::PUBLIC);
        assert_eq!(m.to_string(), "Tests.Lists::Construct");
        assert_eq!(format!("{:?}", m), "MethodHandle(public Tests.Lists::Construct)");
    }

    #[test]
    fn test_entry_point_is_declared_handle() {
        let mut image = Image::new();
        let main = image
            .add_type(TypeDecl::new("App.Program", true))
            .declare("Main", Modifiers::PUBLIC | Modifiers::STATIC);
        image.set_entry_point(main);

        let entry_point = image.entry_point().unwrap();
        let declared = image.types()[0].declared_methods();
        assert_eq!(declared.iter().filter(|m| **m == entry_point).count(), 1);

        let lookalike = MethodHandle::new("App.Program", "Main", Modifiers::PUBLIC | Modifiers::STATIC);
        assert!(!declared.contains(&lookalike));
    }

    #[test]
    fn test_image_lookup() {
        let mut image = Image::new();
        let program = image.add_type(TypeDecl::new("App.Program", true));
        let main = program.declare("Main", Modifiers::PUBLIC | Modifiers::STATIC);
        image.set_entry_point(main.clone());

        assert_eq!(image.types().len(), 1);
        assert_eq!(image.entry_point(), Some(main.clone()));
        assert_eq!(image.find_method("App.Program", "Main"), Some(&main));
        assert!(image.find_method("App.Program", "Other").is_none());
        assert!(image.find_type("App.Missing").is_none());
    }
}
