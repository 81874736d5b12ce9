//! Small value types shared by descriptors, the registry and diagnostics.

use std::fmt::{self, Display, Formatter};
use std::panic::Location;

/// Pattern recorded for hooks, which match every step.
pub const WILDCARD_PATTERN: &str = "/.*/";

/// Tag meaning "active in every scenario".
pub const WILDCARD_TAG: &str = "*";

/// What a binding declares: one of the step keywords or a lifecycle hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// `Given` step.
    Given,
    /// `When` step.
    When,
    /// `Then` step.
    Then,
    /// Runs before each scenario.
    Before,
    /// Runs after each scenario.
    After,
    /// Runs once before any scenario.
    BeforeAll,
    /// Runs once after every scenario.
    AfterAll,
}

impl BindingKind {
    /// Whether the kind is a step keyword.
    #[must_use]
    pub const fn is_step(self) -> bool {
        matches!(self, Self::Given | Self::When | Self::Then)
    }

    /// Whether the kind is a per-scenario or global hook.
    #[must_use]
    pub const fn is_hook(self) -> bool {
        !self.is_step()
    }

    /// Whether the hook runs outside any scenario and needs no instance.
    #[must_use]
    pub const fn is_global(self) -> bool {
        matches!(self, Self::BeforeAll | Self::AfterAll)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::Before => "Before",
            Self::After => "After",
            Self::BeforeAll => "BeforeAll",
            Self::AfterAll => "AfterAll",
        }
    }
}

impl Display for BindingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The matchable key identifying a step's text shape.
///
/// The crate never interprets the pattern; it is stored and compared by its
/// string form, which is what the host framework hands back on invocation.
///
/// # Examples
/// ```rust
/// use stepbind::binding::StepPattern;
/// assert_eq!(StepPattern::new("I am logged in").as_str(), "I am logged in");
/// assert!(StepPattern::wildcard().is_wildcard());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepPattern(String);

impl StepPattern {
    /// Wrap a pattern string.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// The pattern recorded for hooks.
    #[must_use]
    pub fn wildcard() -> Self {
        Self::new(WILDCARD_PATTERN)
    }

    /// Whether this is the hook pattern.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD_PATTERN
    }

    /// The pattern text.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for StepPattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StepPattern {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Display for StepPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A scenario label scoping which binding variant applies.
///
/// Tags are compared verbatim, so `@slow` and `slow` are different tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    /// Wrap a tag name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The tag that applies to every scenario.
    #[must_use]
    pub fn wildcard() -> Self {
        Self::new(WILDCARD_TAG)
    }

    /// Whether this is the wildcard tag.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD_TAG
    }

    /// The tag text.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self::wildcard()
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert a list of tag names into [`Tag`] values.
///
/// # Examples
/// ```rust
/// use stepbind::binding::{Tag, tags};
/// assert_eq!(tags(["@auth", "@slow"]), vec![Tag::new("@auth"), Tag::new("@slow")]);
/// ```
#[must_use]
pub fn tags<I, S>(names: I) -> Vec<Tag>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Tag::new).collect()
}

/// Where a binding was declared. Used for diagnostics and duplicate
/// detection, never for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    file: &'static str,
    line: u32,
    column: u32,
}

impl SourceLocation {
    /// Build a location from its parts.
    #[must_use]
    pub const fn new(file: &'static str, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }

    /// The location of the caller of the enclosing `#[track_caller]` function.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }

    /// Source file path.
    #[must_use]
    pub const fn file(&self) -> &'static str {
        self.file
    }

    /// One-based line number.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// One-based column number.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line(), location.column())
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Identity of the handler a binding invokes.
///
/// Derived from the handler's type name, so function items read as
/// `crate::Steps::logged_in` while closures read as `…::{{closure}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(&'static str);

impl MemberId {
    /// Wrap a member name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The member identity of a handler type.
    #[must_use]
    pub fn of<F: ?Sized>() -> Self {
        Self(std::any::type_name::<F>())
    }

    /// The member name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
