//! Dotted paths into a document.
//!
//! A path such as `input.group(tab).number2(Ef).current` names a node
//! relative to some starting node. Each dot-separated component names a tag,
//! an optional 0-based index among same-tag elements, and an optional
//! identifier matched against the `id` attribute:
//!
//! ```text
//! component  := TAG? INDEX? ( '(' IDENT ')' )?
//! TAG        := [A-Za-z_]+ '#'?
//! INDEX      := [0-9]+            (only directly after a TAG)
//! ```
//!
//! Dots inside the parentheses do not split, so `curve(a.b).xy` has two
//! components. A trailing `#` on a tag never matches an existing node; on a
//! write it creates "the next one" right after the last sibling of that tag.
//!
//! ```
//! use rplib::path::parse_path;
//!
//! let path = parse_path("output.curve(f1.v2).component.xy").unwrap();
//! assert_eq!(path.len(), 4);
//! assert_eq!(path.components()[1].identifier.as_deref(), Some("f1.v2"));
//! assert_eq!(path.to_string(), "output.curve(f1.v2).component.xy");
//! ```

mod parser;
mod resolve;

pub use parser::parse_path;
pub use resolve::{resolve, resolve_or_create};

use std::fmt;
use std::str::FromStr;

/// One segment of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathComponent {
    /// Element tag to match, without any trailing `#`. `None` matches any
    /// tag and only occurs together with an identifier.
    pub tag: Option<String>,
    /// 0-based ordinal among the same-tag elements below the current node.
    pub index: Option<u32>,
    /// Required value of the `id` attribute.
    pub identifier: Option<String>,
    /// The tag was written as `tag#`.
    pub auto_number: bool,
}

impl PathComponent {
    /// A component naming the first element with `tag`.
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            index: None,
            identifier: None,
            auto_number: false,
        }
    }

    /// Restricts this component to the element whose `id` is `identifier`.
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Sets the positional index.
    #[must_use]
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
            if self.auto_number {
                f.write_str("#")?;
            }
            if let Some(index) = self.index {
                write!(f, "{index}")?;
            }
        }
        if let Some(id) = &self.identifier {
            write!(f, "({id})")?;
        }
        Ok(())
    }
}

/// A parsed path: a sequence of components relative to a starting node.
///
/// The empty path names the starting node itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    components: Vec<PathComponent>,
}

impl Path {
    /// Builds a path from components.
    #[must_use]
    pub fn new(components: Vec<PathComponent>) -> Self {
        Self { components }
    }

    /// The components in order.
    #[must_use]
    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` for the empty path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Appends one component.
    pub fn push(&mut self, component: PathComponent) {
        self.components.push(component);
    }

    /// Returns a new path with `other`'s components after this one's.
    #[must_use]
    pub fn join(&self, other: &Path) -> Path {
        let mut components = self.components.clone();
        components.extend(other.components.iter().cloned());
        Path { components }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathComponent;
    type IntoIter = std::slice::Iter<'a, PathComponent>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

/// Errors raised while parsing a path or materializing it in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A `)` without a matching `(`, or a `(` never closed. `position` is
    /// the byte offset where the imbalance was detected.
    UnbalancedParens {
        /// The offending path text.
        path: String,
        /// Byte offset into `path`.
        position: usize,
    },
    /// A component that does not fit the component grammar. `position` is
    /// the 0-based index of the component within the path.
    MalformedComponent {
        /// The component text.
        component: String,
        /// Index of the component within the path.
        position: usize,
    },
    /// A component without a tag, like `(id)`, had to be created.
    CannotCreate {
        /// The component text.
        component: String,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedParens { path, position } => {
                write!(f, "unbalanced parentheses in path '{path}' at byte {position}")
            }
            Self::MalformedComponent {
                component,
                position,
            } => write!(
                f,
                "bad path component '{component}' at position {position}: \
                 should have the form 'type123(id)'"
            ),
            Self::CannotCreate { component } => {
                write!(f, "cannot create an element for '{component}': no tag given")
            }
        }
    }
}

impl std::error::Error for PathError {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_component_display() {
        let c = PathComponent::tag("number").with_index(2).with_identifier("Ef");
        assert_eq!(c.to_string(), "number2(Ef)");

        let anon = PathComponent {
            tag: None,
            index: None,
            identifier: Some("t".to_string()),
            auto_number: false,
        };
        assert_eq!(anon.to_string(), "(t)");

        let auto = PathComponent {
            auto_number: true,
            ..PathComponent::tag("bar")
        };
        assert_eq!(auto.to_string(), "bar#");
    }

    #[test]
    fn test_path_from_str_and_join() {
        let a: Path = "input".parse().unwrap();
        let b: Path = "string(t).current".parse().unwrap();
        let joined = a.join(&b);
        assert_eq!(joined.to_string(), "input.string(t).current");
        assert_eq!(joined.len(), 3);
        assert!(Path::default().is_empty());
    }

    #[test]
    fn test_path_error_display() {
        let err = PathError::MalformedComponent {
            component: "9x".to_string(),
            position: 1,
        };
        assert_eq!(
            err.to_string(),
            "bad path component '9x' at position 1: should have the form 'type123(id)'"
        );
        let err = PathError::CannotCreate {
            component: "(t)".to_string(),
        };
        assert!(err.to_string().contains("no tag given"));
    }
}
