//! Input entities: listing, valuing and comparing them across runs.
//!
//! An entity is an element describing one user-visible input, such as
//! `<number id="temperature">` with a `<current>` value. Entities are
//! found breadth-first below a starting element, looking through `group`
//! and `phase` containers and through the `current.parameters` of a
//! `structure`.

use std::collections::VecDeque;

use crate::path::PathError;
use crate::tree::NodeId;

use super::{naming, Library};

/// Tags that only group other entities.
const CONTAINERS: [&str; 2] = ["group", "phase"];

/// The value of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityValue {
    /// The stored value, or the entity path for a `structure`.
    pub raw: String,
    /// The value as shown to a user; compared by [`Library::diff`].
    pub display: String,
}

/// One difference reported by [`Library::diff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difference {
    /// The entity exists only in the first library.
    Removed {
        /// Entity path.
        path: String,
        /// Raw value in the first library.
        value: String,
    },
    /// The entity exists in both with different display values.
    Changed {
        /// Entity path.
        path: String,
        /// Raw value in the first library.
        old: String,
        /// Raw value in the second library.
        new: String,
    },
    /// The entity exists only in the second library.
    Added {
        /// Entity path.
        path: String,
        /// Raw value in the second library.
        value: String,
    },
}

impl Difference {
    /// The one-character marker for this kind of difference: `-`, `c` or `+`.
    #[must_use]
    pub fn marker(&self) -> char {
        match self {
            Self::Removed { .. } => '-',
            Self::Changed { .. } => 'c',
            Self::Added { .. } => '+',
        }
    }

    /// The entity path.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Removed { path, .. } | Self::Changed { path, .. } | Self::Added { path, .. } => {
                path
            }
        }
    }
}

fn is_container(tag: Option<&str>) -> bool {
    tag.is_some_and(|t| CONTAINERS.contains(&t))
}

fn join(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}.{rest}"),
    }
}

impl Library {
    /// Lists the entities below `path`, as paths relative to it.
    ///
    /// An unresolved `path` has no entities.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    pub fn entities(&self, path: &str) -> Result<Vec<String>, PathError> {
        let Some(start) = self.element(path)? else {
            return Ok(Vec::new());
        };
        let doc = self.document();
        let mut found = Vec::new();
        let mut queue = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            for child in doc.element_children(node) {
                let tag = doc.node_name(child);
                if is_container(tag) {
                    queue.push_back(child);
                    continue;
                }
                if let Some(name) = naming::relative_path(doc, start, child) {
                    found.push(name);
                }
                if tag == Some("structure") {
                    if let Some(params) = self.find_from(child, "current.parameters")? {
                        queue.push_back(params);
                    }
                } else {
                    queue.extend(
                        doc.element_children(child)
                            .filter(|&c| is_container(doc.node_name(c))),
                    );
                }
            }
        }
        Ok(found)
    }

    /// Returns the value of the entity at `path`, or `None` if unresolved.
    ///
    /// A `structure` reports its path as the raw value and a label as the
    /// display value. Other entities use the text of `current`, falling
    /// back to `default`, for both.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    pub fn value(&self, path: &str) -> Result<Option<EntityValue>, PathError> {
        let Some(node) = self.element(path)? else {
            return Ok(None);
        };
        if self.document().node_name(node) == Some("structure") {
            return Ok(Some(EntityValue {
                raw: path.to_string(),
                display: self.structure_label(node)?,
            }));
        }

        let raw = match self.text_from(node, "current")? {
            Some(text) => text,
            None => self.text_from(node, "default")?.unwrap_or_default(),
        };
        Ok(Some(EntityValue {
            display: raw.clone(),
            raw,
        }))
    }

    fn structure_label(&self, node: NodeId) -> Result<String, PathError> {
        for label in ["about.label", "current.about.label"] {
            if let Some(text) = self.text_from(node, label)?.filter(|t| !t.is_empty()) {
                return Ok(text);
            }
        }
        if self.find_from(node, "current")?.is_none() {
            return Ok(String::new());
        }
        let count = self
            .find_from(node, "current.components")?
            .map_or(0, |c| self.document().element_children(c).count());
        Ok(format!("<structure> with {count} components"))
    }

    /// Compares the entities below `path` in this library and `other`.
    ///
    /// Entities are matched by their relative path. Matched entities are
    /// reported as changed when their display values differ; unmatched ones
    /// are removed (only here) or added (only in `other`). Removals and
    /// changes come first, in this library's entity order, followed by the
    /// additions in `other`'s order.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is malformed.
    pub fn diff(&self, other: &Library, path: &str) -> Result<Vec<Difference>, PathError> {
        let mut theirs = other.entities(path)?;
        let mut differences = Vec::new();

        for entity in self.entities(path)? {
            let full = join(path, &entity);
            let mine = self.value(&full)?.unwrap_or_else(EntityValue::empty);
            match theirs.iter().position(|e| *e == entity) {
                None => differences.push(Difference::Removed {
                    path: full,
                    value: mine.raw,
                }),
                Some(at) => {
                    theirs.remove(at);
                    let their = other.value(&full)?.unwrap_or_else(EntityValue::empty);
                    if mine.display != their.display {
                        differences.push(Difference::Changed {
                            path: full,
                            old: mine.raw,
                            new: their.raw,
                        });
                    }
                }
            }
        }

        for entity in theirs {
            let full = join(path, &entity);
            let value = other.value(&full)?.map(|v| v.raw).unwrap_or_default();
            differences.push(Difference::Added { path: full, value });
        }
        Ok(differences)
    }
}

impl EntityValue {
    fn empty() -> Self {
        Self {
            raw: String::new(),
            display: String::new(),
        }
    }
}
