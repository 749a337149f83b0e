//! Command-line access to run documents.
//!
//! Reads a document, applies one path-addressed operation, and prints the
//! result. Operations that modify the document print the new document, or
//! write it back with `--in-place` or `--output`.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rplib::library::{Flavored, Library, LibraryError, ResultFlavor, RUN_MARKER};
use rplib::parser::{self, ParseOptions};

const EXIT_SUCCESS: u8 = 0;
const EXIT_NOT_FOUND: u8 = 1;
const EXIT_ERROR: u8 = 2;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// rplib -- query and edit run documents by path.
#[derive(Parser, Debug)]
#[command(name = "rplib", version, about, long_about = None)]
struct Cli {
    /// Document to operate on (use `-` for stdin).
    file: String,

    /// Log what the library does to stderr.
    #[arg(long, short)]
    verbose: bool,

    /// Remove whitespace-only text nodes while parsing.
    #[arg(long)]
    noblanks: bool,

    /// Write the modified document back to FILE.
    #[arg(long)]
    in_place: bool,

    /// Write the modified document to this file instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the text stored at a path.
    Get {
        path: String,
        /// Trim surrounding whitespace.
        #[arg(long)]
        trim: bool,
        /// Decode `@@RP-ENC:` payloads and print the bytes unchanged.
        #[arg(long)]
        decode: bool,
    },
    /// Store a value at a path, creating missing elements.
    Put {
        path: String,
        /// The text to store, or a file name with `--file`.
        value: String,
        /// Set the target's `id` attribute.
        #[arg(long)]
        id: Option<String>,
        /// Keep the existing content and add after it.
        #[arg(long)]
        append: bool,
        /// Treat VALUE as a file whose contents are stored.
        #[arg(long)]
        file: bool,
        /// Compress the stored file contents.
        #[arg(long, requires = "file")]
        compress: bool,
    },
    /// List the child elements of a path.
    Children {
        #[arg(default_value = "")]
        path: String,
        /// object, id, type, component or path.
        #[arg(long = "as", default_value = "component")]
        flavor: ResultFlavor,
        /// Only children with this tag.
        #[arg(long = "type")]
        tag: Option<String>,
    },
    /// Describe the element at a path.
    Element {
        #[arg(default_value = "")]
        path: String,
        /// object, id, type, component or path.
        #[arg(long = "as", default_value = "component")]
        flavor: ResultFlavor,
    },
    /// Remove the element at a path and print it.
    Remove { path: String },
    /// Replace the children of DST with copies of the children of SRC.
    Copy {
        dst: String,
        src: String,
        /// Read SRC from this document instead.
        #[arg(long, value_name = "FILE")]
        from: Option<String>,
    },
    /// Print the document, or the element at a path.
    Xml {
        #[arg(default_value = "")]
        path: String,
        /// Do not indent.
        #[arg(long)]
        compact: bool,
    },
    /// List the input entities below a path.
    Entities {
        #[arg(default_value = "input")]
        path: String,
    },
    /// Compare the entities of two documents.
    Diff {
        other: String,
        #[arg(default_value = "input")]
        path: String,
    },
    /// Write the document as a run file and report its name.
    Result {
        /// Directory for the run file.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

/// What a command produced.
enum Outcome {
    /// Text to print.
    Print(String),
    /// Bytes to copy to stdout unchanged.
    Raw(Vec<u8>),
    /// The document changed.
    Modified,
    /// The path did not resolve.
    NotFound(String),
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut lib = match load(&cli.file, cli.noblanks) {
        Ok(lib) => lib,
        Err(e) => {
            eprintln!("{}: {e}", cli.file);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let exit = match run(&cli, &mut lib) {
        Ok(Outcome::Print(text)) => {
            write_stdout(text.as_bytes());
            EXIT_SUCCESS
        }
        Ok(Outcome::Raw(bytes)) => {
            write_stdout(&bytes);
            EXIT_SUCCESS
        }
        Ok(Outcome::Modified) => match store(&cli, &lib) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                eprintln!("{e}");
                EXIT_ERROR
            }
        },
        Ok(Outcome::NotFound(path)) => {
            eprintln!("{}: nothing at '{path}'", cli.file);
            EXIT_NOT_FOUND
        }
        Err(e) => {
            eprintln!("{}: {e}", cli.file);
            EXIT_ERROR
        }
    };
    ExitCode::from(exit)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Reads the document from a file, from stdin, or from inline text.
fn load(source: &str, noblanks: bool) -> Result<Library, LibraryError> {
    let options = ParseOptions::default().no_blanks(noblanks);
    if source != "-" {
        return Library::open_with_options(source, &options);
    }
    let mut bytes = Vec::new();
    io::stdin()
        .read_to_end(&mut bytes)
        .map_err(|e| LibraryError::Io {
            path: PathBuf::from("<stdin>"),
            source: e,
        })?;
    let doc = parser::parse_bytes_with_options(&bytes, &options)?;
    Ok(Library::from_document(doc))
}

fn run(cli: &Cli, lib: &mut Library) -> Result<Outcome, LibraryError> {
    let outcome = match &cli.command {
        Command::Get { path, trim, decode } => {
            if *decode {
                return Ok(match lib.get_decoded(path)? {
                    Some(bytes) => Outcome::Raw(bytes),
                    None => Outcome::NotFound(path.clone()),
                });
            }
            let text = if *trim {
                lib.get_trimmed(path)?
            } else {
                lib.get(path)?
            };
            match text {
                Some(text) => Outcome::Print(with_newline(text)),
                None => Outcome::NotFound(path.clone()),
            }
        }
        Command::Put {
            path,
            value,
            id,
            append,
            file,
            compress,
        } => {
            if *file {
                let node = lib.put_file(path, value, *compress, *append)?;
                if let Some(id) = id {
                    lib.document_mut().set_attribute(node, "id", id);
                }
            } else {
                lib.put(path, value, id.as_deref(), *append)?;
            }
            Outcome::Modified
        }
        Command::Children { path, flavor, tag } => {
            match lib.children_as(path, *flavor, tag.as_deref())? {
                Some(children) => Outcome::Print(lines(lib, &children)),
                None => Outcome::NotFound(path.clone()),
            }
        }
        Command::Element { path, flavor } => match lib.element_as(path, *flavor)? {
            Some(found) => Outcome::Print(lines(lib, &[found])),
            None => Outcome::NotFound(path.clone()),
        },
        Command::Remove { path } => match lib.remove(path)? {
            Some(removed) => {
                if cli.in_place || cli.output.is_some() {
                    store(cli, lib)?;
                }
                Outcome::Print(with_newline(removed.subtree_text("", false)?.unwrap_or_default()))
            }
            None => Outcome::NotFound(path.clone()),
        },
        Command::Copy { dst, src, from } => {
            let other = from.as_deref().map(Library::open).transpose()?;
            lib.copy(dst, src, other.as_ref())?;
            Outcome::Modified
        }
        Command::Xml { path, compact } => {
            if path.is_empty() {
                Outcome::Print(if *compact { lib.to_text() } else { lib.to_pretty_text() })
            } else {
                match lib.subtree_text(path, !*compact)? {
                    Some(text) => Outcome::Print(with_newline(text)),
                    None => Outcome::NotFound(path.clone()),
                }
            }
        }
        Command::Entities { path } => {
            let mut out = String::new();
            for entity in lib.entities(path)? {
                out.push_str(&entity);
                out.push('\n');
            }
            Outcome::Print(out)
        }
        Command::Diff { other, path } => {
            let other = Library::open(other)?;
            let mut out = String::new();
            for difference in lib.diff(&other, path)? {
                out.push(difference.marker());
                out.push(' ');
                out.push_str(difference.path());
                out.push('\n');
            }
            Outcome::Print(out)
        }
        Command::Result { dir } => {
            let file = lib.write_run(dir)?;
            Outcome::Print(format!("{RUN_MARKER}{}\n", file.display()))
        }
    };
    Ok(outcome)
}

/// One line per result. Node handles print as their dotted path.
fn lines(lib: &Library, found: &[Flavored]) -> String {
    let mut out = String::new();
    for item in found {
        match item {
            Flavored::Text(text) => out.push_str(text),
            Flavored::Node(node) => out.push_str(&lib.node_path(*node).unwrap_or_default()),
        }
        out.push('\n');
    }
    out
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

// ---------------------------------------------------------------------------
// Output writing
// ---------------------------------------------------------------------------

/// Writes a modified document back to its file, to --output, or to stdout.
fn store(cli: &Cli, lib: &Library) -> Result<(), LibraryError> {
    if let Some(output) = &cli.output {
        return lib.save(output);
    }
    if cli.in_place && cli.file != "-" {
        return lib.save(&cli.file);
    }
    write_stdout(lib.to_pretty_text().as_bytes());
    Ok(())
}

fn write_stdout(content: &[u8]) {
    let mut stdout = io::stdout();
    let _ = stdout.write_all(content);
    // Flush stdout to ensure output is complete, especially when piped.
    let _ = stdout.flush();
}
