//! Go binding generation.
//!
//! Each WIT file becomes a Go source file declaring one host function per
//! function declaration:
//!
//! ```text
//! package timer
//!
//! //go:wasm-module lunatic::timer
//! //go:export SendReceiveSkipSearch
//! func SendReceiveSkipSearch(processId uint64, timeout uint32) uint32
//! ```

use codespan_reporting::diagnostic::{Diagnostic, Label};
use fxhash::FxHashMap;
use itertools::Itertools;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::source::{ByteRange, FileId};
use crate::surface::{Func, Item, Module, Type};

pub mod case;
pub mod prim;

use self::prim::{Prim, PrimEnv};

/// File extension of generated sources.
pub const EXTENSION: &str = "go";

/// The module qualifier, package and output location derived from a WIT file name.
///
/// `wit/lunatic_timer.wit` is bound to the `lunatic::timer` module, and is
/// generated into `lunatic/timer/timer.go`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePath {
    module: String,
    segments: Vec<String>,
}

impl ModulePath {
    pub fn from_file_name(file_name: &Path) -> Result<ModulePath, Error> {
        let stem = (file_name.file_stem())
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| Error::InvalidFileName {
                path: file_name.to_owned(),
            })?;

        Ok(ModulePath {
            module: stem.replace('_', "::"),
            segments: stem.split('_').map(str::to_owned).collect(),
        })
    }

    /// The qualified name of the host module, eg. `lunatic::timer`.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The Go package name, which is the last segment of the path.
    pub fn package(&self) -> &str {
        // `str::split` always yields at least one segment
        self.segments.last().map_or("", String::as_str)
    }

    /// The directory, relative to the destination root, that the package is generated in.
    pub fn dir(&self) -> PathBuf {
        self.segments.iter().collect()
    }

    pub fn file_name(&self) -> String {
        format!("{}.{EXTENSION}", self.package())
    }

    pub fn output_path(&self, dest: &Path) -> PathBuf {
        dest.join(self.dir()).join(self.file_name())
    }
}

/// Code generation context.
///
/// Holds no per-file state, so a single context can be shared between files.
pub struct Context {
    prim_env: PrimEnv,
}

impl Context {
    pub fn new() -> Context {
        Context {
            prim_env: PrimEnv::new(),
        }
    }

    /// Render the Go source for `module` in memory.
    pub fn render_module(
        &self,
        module_path: &ModulePath,
        module: &Module,
    ) -> Result<String, Message> {
        Ok(self.lower_module(module_path, module)?.to_string())
    }

    /// Render the Go source for `module` and write it under `dest`, returning
    /// the path of the generated file.
    ///
    /// Nothing is written if rendering fails.
    pub fn generate(
        &self,
        dest: &Path,
        file_name: &Path,
        module: &Module,
    ) -> Result<PathBuf, Error> {
        let module_path = ModulePath::from_file_name(file_name)?;
        let source = self.render_module(&module_path, module)?;

        let dir = dest.join(module_path.dir());
        fs::create_dir_all(&dir).map_err(|error| Error::CreateDir {
            path: dir.clone(),
            error,
        })?;

        let path = dir.join(module_path.file_name());
        fs::write(&path, source).map_err(|error| Error::CreateFile {
            path: path.clone(),
            error,
        })?;

        tracing::info!(path = %path.display(), module = module_path.module(), "generated bindings");

        Ok(path)
    }

    fn lower_module(&self, module_path: &ModulePath, module: &Module) -> Result<GoFile, Message> {
        let mut exports = FxHashMap::<String, ByteRange>::default();
        let mut bindings = Vec::with_capacity(module.items.len());

        for item in &module.items {
            let binding = match item {
                Item::Func(func) => self.lower_func(func)?,
            };
            if let Some(first_range) = exports.insert(binding.export.clone(), binding.range) {
                return Err(Message::DuplicateFunc {
                    name: binding.export,
                    first_range,
                    duplicate_range: binding.range,
                });
            }
            bindings.push(binding);
        }

        tracing::debug!(
            module = module_path.module(),
            bindings = bindings.len(),
            "lowered module"
        );

        Ok(GoFile {
            package: module_path.package().to_owned(),
            module: module_path.module().to_owned(),
            bindings,
        })
    }

    fn lower_func(&self, func: &Func) -> Result<Binding, Message> {
        let mut names = FxHashMap::<String, ByteRange>::default();
        let mut params = Vec::with_capacity(func.params.len());

        for param in &func.params {
            let prim = self.lower_type(func, &param.type_)?;
            let name = case::private(&param.name.name);
            if let Some(first_range) = names.insert(name.clone(), param.name.range) {
                return Err(Message::DuplicateParam {
                    func: func.name.name.clone(),
                    name,
                    first_range,
                    duplicate_range: param.name.range,
                });
            }
            params.push(GoParam {
                name,
                type_: prim.go_name(),
            });
        }

        let ret = match &func.ret {
            Some(ret) => Some(self.lower_type(func, &ret.type_)?.go_name()),
            None => None,
        };

        Ok(Binding {
            range: func.name.range,
            export: case::public(&func.name.name),
            params,
            ret,
        })
    }

    fn lower_type(&self, func: &Func, type_: &Type) -> Result<Prim, Message> {
        self.prim_env
            .get(&type_.name)
            .ok_or_else(|| Message::UnknownType {
                range: type_.range,
                name: type_.name.clone(),
                func: func.name.name.clone(),
                suggestion: self.prim_env.suggest(&type_.name),
            })
    }
}

impl Default for Context {
    fn default() -> Context {
        Context::new()
    }
}

struct GoFile {
    package: String,
    module: String,
    bindings: Vec<Binding>,
}

struct Binding {
    range: ByteRange,
    export: String,
    params: Vec<GoParam>,
    ret: Option<&'static str>,
}

struct GoParam {
    name: String,
    type_: &'static str,
}

impl fmt::Display for GoFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "package {}", self.package)?;
        writeln!(f)?;

        for binding in &self.bindings {
            writeln!(f, "//go:wasm-module {}", self.module)?;
            writeln!(f, "//go:export {}", binding.export)?;
            write!(f, "func {}({})", binding.export, binding.params.iter().format(", "))?;
            if let Some(ret) = binding.ret {
                write!(f, " {ret}")?;
            }
            writeln!(f)?;
            writeln!(f)?;
        }

        writeln!(f)
    }
}

impl fmt::Display for GoParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.type_)
    }
}

/// Code generation diagnostic messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A type that is not one of the supported primitives.
    UnknownType {
        range: ByteRange,
        name: String,
        func: String,
        suggestion: Option<Prim>,
    },
    /// Two parameters of a function that are rendered with the same name.
    DuplicateParam {
        func: String,
        name: String,
        first_range: ByteRange,
        duplicate_range: ByteRange,
    },
    /// Two functions in a module that are exported with the same name.
    DuplicateFunc {
        name: String,
        first_range: ByteRange,
        duplicate_range: ByteRange,
    },
}

impl Message {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        let primary_label = |range: &ByteRange| Label::primary(range.file_id(), *range);
        let secondary_label = |range: &ByteRange| Label::secondary(range.file_id(), *range);

        match self {
            Message::UnknownType {
                range,
                name,
                func,
                suggestion,
            } => {
                let mut notes = vec![format!(
                    "expected one of {}",
                    Prim::ALL.iter().map(|prim| prim.name()).format(", "),
                )];
                if let Some(prim) = suggestion {
                    notes.push(format!("help: did you mean `{}`?", prim.name()));
                }

                Diagnostic::error()
                    .with_message(format!("unknown type `{name}`"))
                    .with_labels(vec![
                        primary_label(range).with_message(format!("unknown type in `{func}`"))
                    ])
                    .with_notes(notes)
            }
            Message::DuplicateParam {
                func,
                name,
                first_range,
                duplicate_range,
            } => Diagnostic::error()
                .with_message(format!("duplicate parameter `{name}` in `{func}`"))
                .with_labels(vec![
                    primary_label(duplicate_range).with_message("parameter redefined here"),
                    secondary_label(first_range).with_message("first defined here"),
                ]),
            Message::DuplicateFunc {
                name,
                first_range,
                duplicate_range,
            } => Diagnostic::error()
                .with_message(format!("duplicate export `{name}`"))
                .with_labels(vec![
                    primary_label(duplicate_range).with_message("exported again here"),
                    secondary_label(first_range).with_message("first exported here"),
                ]),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::UnknownType { name, func, .. } => {
                write!(f, "unknown type `{name}` in `{func}`")
            }
            Message::DuplicateParam { func, name, .. } => {
                write!(f, "duplicate parameter `{name}` in `{func}`")
            }
            Message::DuplicateFunc { name, .. } => write!(f, "duplicate export `{name}`"),
        }
    }
}

impl std::error::Error for Message {}

/// Errors that can occur when generating a file.
#[derive(Debug)]
pub enum Error {
    Message(Message),
    InvalidFileName { path: PathBuf },
    CreateDir { path: PathBuf, error: io::Error },
    CreateFile { path: PathBuf, error: io::Error },
}

impl Error {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            Error::Message(message) => message.to_diagnostic(),
            Error::InvalidFileName { .. } | Error::CreateDir { .. } | Error::CreateFile { .. } => {
                Diagnostic::error().with_message(self.to_string())
            }
        }
    }
}

impl From<Message> for Error {
    fn from(message: Message) -> Error {
        Error::Message(message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Message(message) => fmt::Display::fmt(message, f),
            Error::InvalidFileName { path } => {
                write!(f, "cannot derive a module name from `{}`", path.display())
            }
            Error::CreateDir { path, error } => {
                write!(f, "failed to create directory `{}`: {error}", path.display())
            }
            Error::CreateFile { path, error } => {
                write!(f, "failed to create file `{}`: {error}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Message(message) => Some(message),
            Error::InvalidFileName { .. } => None,
            Error::CreateDir { error, .. } | Error::CreateFile { error, .. } => Some(error),
        }
    }
}
