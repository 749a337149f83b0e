//! Declaring a tool's inputs and outputs.
//!
//! [`InterfaceBuilder`] collects field declarations and turns them into a
//! run document laid out the way tools read it back:
//!
//! ```text
//! <run>
//!   <tool><title>..</title><command>..</command></tool>
//!   <input><number id="temperature"><about><label>..</label></about>
//!     <units>K</units><default>300</default><current>300</current></number></input>
//!   <output><curve id="iv"><about><label>..</label></about></curve></output>
//! </run>
//! ```
//!
//! ```
//! use rplib::interface::{Field, InterfaceBuilder};
//!
//! let lib = InterfaceBuilder::new("Diode")
//!     .input(Field::new("number", "temperature").label("Temperature").units("K").default_value("300"))
//!     .output(Field::new("curve", "iv").label("I-V"))
//!     .finish()
//!     .unwrap();
//! assert_eq!(lib.get("input.number(temperature).current").unwrap().as_deref(), Some("300"));
//! ```

use std::collections::HashSet;

use crate::library::{Library, LibraryError};
use crate::path::{parse_path, PathComponent};

/// One declared input or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Element tag, such as `number` or `curve`.
    pub kind: String,
    /// The `id` attribute.
    pub id: String,
    /// Text of `about.label`.
    pub label: Option<String>,
    /// Text of `units`.
    pub units: Option<String>,
    /// Text of `default`, also used as the initial `current`.
    pub default: Option<String>,
}

impl Field {
    /// A field of the given kind and id, with nothing else set.
    #[must_use]
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            label: None,
            units: None,
            default: None,
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the units.
    #[must_use]
    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// The path of this field below its section, `kind(id)`.
    fn component(&self) -> Result<String, LibraryError> {
        let expected = PathComponent::tag(self.kind.as_str()).with_identifier(self.id.as_str());
        let text = expected.to_string();
        let parsed = parse_path(&text)?;
        if parsed.components() != [expected] {
            return Err(LibraryError::argument(format!("bad field declaration '{text}'")));
        }
        Ok(text)
    }
}

/// Collects declarations, then builds the run document with
/// [`finish`](Self::finish).
#[derive(Debug, Clone, Default)]
pub struct InterfaceBuilder {
    title: String,
    command: Option<String>,
    inputs: Vec<Field>,
    outputs: Vec<Field>,
}

impl InterfaceBuilder {
    /// Starts a tool declaration with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the command line that runs the tool.
    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Declares an input.
    #[must_use]
    pub fn input(mut self, field: Field) -> Self {
        self.inputs.push(field);
        self
    }

    /// Declares an output.
    #[must_use]
    pub fn output(mut self, field: Field) -> Self {
        self.outputs.push(field);
        self
    }

    /// Builds the run document.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Argument`] if a field's kind is not a valid
    /// tag, or if two fields of one section share kind and id.
    pub fn finish(self) -> Result<Library, LibraryError> {
        let mut lib = Library::new("run");
        lib.put_text("tool.title", &self.title, false)?;
        if let Some(command) = &self.command {
            lib.put_text("tool.command", command, false)?;
        }
        write_section(&mut lib, "input", &self.inputs, true)?;
        write_section(&mut lib, "output", &self.outputs, false)?;
        log::debug!(
            "built interface '{}' with {} inputs and {} outputs",
            self.title,
            self.inputs.len(),
            self.outputs.len()
        );
        Ok(lib)
    }
}

fn write_section(
    lib: &mut Library,
    section: &str,
    fields: &[Field],
    with_current: bool,
) -> Result<(), LibraryError> {
    let mut seen = HashSet::new();
    for field in fields {
        let base = format!("{section}.{}", field.component()?);
        if !seen.insert(base.clone()) {
            return Err(LibraryError::argument(format!("'{base}' is declared twice")));
        }
        lib.put_text(&base, "", false)?;
        if let Some(label) = &field.label {
            lib.put_text(&format!("{base}.about.label"), label, false)?;
        }
        if let Some(units) = &field.units {
            lib.put_text(&format!("{base}.units"), units, false)?;
        }
        if let Some(default) = &field.default {
            lib.put_text(&format!("{base}.default"), default, false)?;
            if with_current {
                lib.put_text(&format!("{base}.current"), default, false)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_layout() {
        let lib = InterfaceBuilder::new("Diode")
            .command("diode @driver")
            .input(Field::new("number", "temperature").label("Temperature").units("K").default_value("300"))
            .input(Field::new("boolean", "verbose"))
            .output(Field::new("curve", "iv").label("I-V").default_value("0 0"))
            .finish()
            .unwrap();

        assert_eq!(
            lib.subtree_text("", false).unwrap().unwrap(),
            "<run><tool><title>Diode</title><command>diode @driver</command></tool>\
             <input><number id=\"temperature\"><about><label>Temperature</label></about>\
             <units>K</units><default>300</default><current>300</current></number>\
             <boolean id=\"verbose\"/></input>\
             <output><curve id=\"iv\"><about><label>I-V</label></about>\
             <default>0 0</default></curve></output></run>"
        );
    }

    #[test]
    fn test_declared_inputs_are_entities() {
        let lib = InterfaceBuilder::new("t")
            .input(Field::new("number", "a").default_value("1"))
            .input(Field::new("string", "b").default_value("x"))
            .finish()
            .unwrap();
        assert_eq!(lib.entities("input").unwrap(), vec!["number(a)", "string(b)"]);
    }

    #[test]
    fn test_duplicate_field() {
        let err = InterfaceBuilder::new("t")
            .input(Field::new("number", "a"))
            .input(Field::new("number", "a"))
            .finish()
            .unwrap_err();
        assert!(matches!(err, LibraryError::Argument(msg) if msg.contains("input.number(a)")));
    }

    #[test]
    fn test_same_id_in_both_sections_is_allowed() {
        let lib = InterfaceBuilder::new("t")
            .input(Field::new("number", "a"))
            .output(Field::new("number", "a"))
            .finish()
            .unwrap();
        assert!(lib.element("output.number(a)").unwrap().is_some());
    }

    #[test]
    fn test_bad_kind() {
        assert!(InterfaceBuilder::new("t")
            .input(Field::new("no-dash", "a"))
            .finish()
            .is_err());
        assert!(InterfaceBuilder::new("t")
            .input(Field::new("number2", "a"))
            .finish()
            .is_err());
    }
}
