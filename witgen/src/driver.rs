use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{BufferedStandardStream, ColorChoice, WriteColor};
use fxhash::FxHashMap;
use std::cell::RefCell;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::codegen::{self, ModulePath};
use crate::source::{FileId, MAX_SOURCE_LEN};
use crate::surface::Module;
use crate::BUG_REPORT_URL;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Error => 1,
        }
    }
}

/// What to do with each parsed file.
#[derive(Debug, Clone)]
pub enum Action {
    /// Print the parsed declarations.
    Dump,
    /// Generate bindings under the destination directory.
    Generate { dest: PathBuf },
}

pub struct Driver {
    files: SimpleFiles<String, String>,
    codegen_context: codegen::Context,
    /// Output paths generated so far, and the file that generated them.
    outputs: FxHashMap<PathBuf, FileId>,

    keep_going: bool,
    codespan_config: codespan_reporting::term::Config,
    diagnostic_writer: RefCell<Box<dyn WriteColor>>,
    emit_writer: RefCell<Box<dyn WriteColor>>,
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            files: SimpleFiles::new(),
            codegen_context: codegen::Context::new(),
            outputs: FxHashMap::default(),

            keep_going: false,
            codespan_config: codespan_reporting::term::Config::default(),
            diagnostic_writer: RefCell::new(Box::new(BufferedStandardStream::stderr(
                color_choice(ColorChoice::Auto, atty::Stream::Stderr),
            ))),
            emit_writer: RefCell::new(Box::new(BufferedStandardStream::stdout(
                color_choice(ColorChoice::Auto, atty::Stream::Stdout),
            ))),
        }
    }

    /// Setup a global panic hook
    pub fn install_panic_hook(&self) {
        // Use the currently set codespan configuration
        let term_config = self.codespan_config.clone();
        // Fetch the default hook (which prints the panic message and an optional backtrace)
        let default_hook = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            let location = info.location();
            let message = if let Some(message) = info.payload().downcast_ref::<String>() {
                message.as_str()
            } else if let Some(message) = info.payload().downcast_ref::<&str>() {
                message
            } else {
                "unknown panic type"
            };

            let diagnostic = Diagnostic::bug()
                .with_message(format!("witgen panicked at '{message}'"))
                .with_notes(vec![
                    match location {
                        Some(location) => format!("panicked at: {location}"),
                        None => "panicked at: unknown location".to_owned(),
                    },
                    format!("please file a bug report at: {BUG_REPORT_URL}"),
                ]);

            let mut writer = BufferedStandardStream::stderr(color_choice(
                ColorChoice::Auto,
                atty::Stream::Stderr,
            ));
            let dummy_files = SimpleFiles::<String, String>::new();

            default_hook(info);
            eprintln!();
            let _ = codespan_reporting::term::emit(
                &mut writer,
                &term_config,
                &dummy_files,
                &diagnostic,
            );
        }));
    }

    /// Set to true if we should continue with the remaining files after a file fails
    pub fn set_keep_going(&mut self, keep_going: bool) {
        self.keep_going = keep_going;
    }

    /// Set the colour choice of the standard output and error streams
    pub fn set_color_choice(&mut self, choice: ColorChoice) {
        self.set_diagnostic_writer(BufferedStandardStream::stderr(color_choice(
            choice,
            atty::Stream::Stderr,
        )));
        self.set_emit_writer(BufferedStandardStream::stdout(color_choice(
            choice,
            atty::Stream::Stdout,
        )));
    }

    /// Set the writer to use when rendering diagnostics
    pub fn set_diagnostic_writer(&mut self, stream: impl 'static + WriteColor) {
        self.diagnostic_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Set the writer to use when dumping declarations
    pub fn set_emit_writer(&mut self, stream: impl 'static + WriteColor) {
        self.emit_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Load a source string into the file database.
    pub fn load_source_string(&mut self, name: String, source: String) -> FileId {
        self.files.add(name, source)
    }

    /// Load a source file into the file database using a reader.
    pub fn load_source(&mut self, name: String, mut reader: impl Read) -> Option<FileId> {
        let mut source = String::new();
        match reader.read_to_string(&mut source) {
            Ok(len) if len > MAX_SOURCE_LEN => {
                self.emit_diagnostic(Diagnostic::error().with_message(format!(
                    "couldn't read `{name}`: file is larger than {MAX_SOURCE_LEN} bytes"
                )));
                None
            }
            Ok(_) => Some(self.load_source_string(name, source)),
            Err(error) => {
                self.emit_read_diagnostic(name, error);
                None
            }
        }
    }

    /// Load a source file into the file database from the given path.
    pub fn load_source_path(&mut self, path: &Path) -> Option<FileId> {
        match std::fs::File::open(path) {
            Ok(file) => self.load_source(path.display().to_string(), file),
            Err(error) => {
                self.emit_read_diagnostic(path.display(), error);
                None
            }
        }
    }

    /// Run `action` over each of `paths` in turn.
    ///
    /// Stops at the first file that fails, unless `keep_going` is set.
    pub fn run(&mut self, action: &Action, paths: &[PathBuf]) -> Status {
        let mut status = Status::Ok;

        for path in paths {
            let file_status = match self.load_source_path(path) {
                Some(file_id) => match action {
                    Action::Dump => self.parse_and_emit_module(file_id),
                    Action::Generate { dest } => self.generate_module(dest, file_id),
                },
                None => Status::Error,
            };

            if file_status == Status::Error {
                status = Status::Error;
                if !self.keep_going {
                    tracing::debug!(path = %path.display(), "stopping after failed file");
                    break;
                }
            }
        }

        status
    }

    /// Parse a file and print its declarations.
    pub fn parse_and_emit_module(&mut self, file_id: FileId) -> Status {
        let module = match self.parse_module(file_id) {
            Some(module) => module,
            None => return Status::Error,
        };

        let mut emit_writer = self.emit_writer.borrow_mut();
        let result = writeln!(emit_writer, "{module:#?}").and_then(|()| emit_writer.flush());
        drop(emit_writer);

        match result {
            Ok(()) => Status::Ok,
            Err(error) => {
                self.emit_diagnostic(
                    Diagnostic::error().with_message(format!("couldn't write to stdout: {error}")),
                );
                Status::Error
            }
        }
    }

    /// Parse a file and generate its bindings under `dest`.
    pub fn generate_module(&mut self, dest: &Path, file_id: FileId) -> Status {
        let module = match self.parse_module(file_id) {
            Some(module) => module,
            None => return Status::Error,
        };
        let file_name = PathBuf::from(self.file_name(file_id));

        if let Ok(module_path) = ModulePath::from_file_name(&file_name) {
            let output_path = module_path.output_path(dest);
            if let Some(previous_file_id) = self.outputs.insert(output_path.clone(), file_id) {
                self.emit_diagnostic(
                    Diagnostic::warning()
                        .with_message(format!(
                            "`{}` overwrites the bindings generated from `{}`",
                            self.file_name(file_id),
                            self.file_name(previous_file_id),
                        ))
                        .with_notes(vec![format!(
                            "both files are generated to `{}`",
                            output_path.display(),
                        )]),
                );
            }
        }

        match self.codegen_context.generate(dest, &file_name, &module) {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "wrote file");
                Status::Ok
            }
            Err(error) => {
                self.emit_diagnostic(error.to_diagnostic());
                Status::Error
            }
        }
    }

    fn parse_module(&self, file_id: FileId) -> Option<Module> {
        let source = self.files.get(file_id).ok()?.source();

        tracing::debug!(file = self.file_name(file_id), "parsing");
        match Module::parse(file_id, source) {
            Ok(module) => Some(module),
            Err(message) => {
                self.emit_diagnostic(message.to_diagnostic());
                None
            }
        }
    }

    fn file_name(&self, file_id: FileId) -> &str {
        (self.files.get(file_id)).map_or("<unknown>", |file| file.name().as_str())
    }

    fn emit_diagnostic(&self, diagnostic: Diagnostic<FileId>) {
        let mut writer = self.diagnostic_writer.borrow_mut();
        let config = &self.codespan_config;

        let result = codespan_reporting::term::emit(&mut *writer, config, &self.files, &diagnostic)
            .map_err(|error| error.to_string())
            .and_then(|()| writer.flush().map_err(|error| error.to_string()));

        if let Err(error) = result {
            tracing::error!(%error, "failed to emit diagnostic");
        }
    }

    fn emit_read_diagnostic(&self, name: impl std::fmt::Display, error: std::io::Error) {
        let diagnostic =
            Diagnostic::error().with_message(format!("couldn't read `{name}`: {error}"));
        self.emit_diagnostic(diagnostic);
    }
}

impl Default for Driver {
    fn default() -> Driver {
        Driver::new()
    }
}

/// Resolve [`ColorChoice::Auto`] to [`ColorChoice::Never`] when the stream is not a terminal.
fn color_choice(choice: ColorChoice, stream: atty::Stream) -> ColorChoice {
    match choice {
        ColorChoice::Auto if !atty::is(stream) => ColorChoice::Never,
        choice => choice,
    }
}

#[cfg(test)]
mod tests {
    use codespan_reporting::term::termcolor::NoColor;
    use std::fs;
    use std::io;

    use super::*;

    fn quiet_driver() -> Driver {
        let mut driver = Driver::new();
        driver.set_diagnostic_writer(NoColor::new(io::sink()));
        driver.set_emit_writer(NoColor::new(io::sink()));
        driver
    }

    fn write_input(dir: &Path, name: &str, source: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn generate_files() {
        let input = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let paths = vec![
            write_input(input.path(), "lunatic_timer.wit", "now : func() -> u64"),
            write_input(input.path(), "lunatic_process.wit", "id : func() -> u64"),
        ];

        let mut driver = quiet_driver();
        let action = Action::Generate {
            dest: dest.path().to_owned(),
        };

        assert_eq!(driver.run(&action, &paths), Status::Ok);
        assert!(dest.path().join("lunatic/timer/timer.go").is_file());
        assert!(dest.path().join("lunatic/process/process.go").is_file());
    }

    #[test]
    fn stop_at_first_failure() {
        let input = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let paths = vec![
            write_input(input.path(), "first.wit", "broken : func("),
            write_input(input.path(), "second.wit", "fine : func()"),
        ];

        let mut driver = quiet_driver();
        let action = Action::Generate {
            dest: dest.path().to_owned(),
        };

        assert_eq!(driver.run(&action, &paths), Status::Error);
        assert!(!dest.path().join("second").exists());
    }

    #[test]
    fn keep_going_after_failure() {
        let input = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let paths = vec![
            write_input(input.path(), "first.wit", "wide : func(x: u128)"),
            write_input(input.path(), "second.wit", "fine : func()"),
        ];

        let mut driver = quiet_driver();
        driver.set_keep_going(true);
        let action = Action::Generate {
            dest: dest.path().to_owned(),
        };

        assert_eq!(driver.run(&action, &paths), Status::Error);
        assert!(!dest.path().join("first").exists());
        assert!(dest.path().join("second/second.go").is_file());
    }

    #[test]
    fn missing_input() {
        let dest = tempfile::tempdir().unwrap();
        let mut driver = quiet_driver();
        let action = Action::Generate {
            dest: dest.path().to_owned(),
        };

        let paths = vec![dest.path().join("does_not_exist.wit")];
        assert_eq!(driver.run(&action, &paths), Status::Error);
    }

    #[test]
    fn dump_writes_nothing_to_disk() {
        let input = tempfile::tempdir().unwrap();
        let paths = vec![write_input(input.path(), "lunatic_timer.wit", "now : func()")];

        let mut driver = quiet_driver();
        assert_eq!(driver.run(&Action::Dump, &paths), Status::Ok);
        assert_eq!(fs::read_dir(input.path()).unwrap().count(), 1);
    }

    #[test]
    fn dump_reports_syntax_errors() {
        let mut driver = quiet_driver();
        let file_id = driver.load_source_string("bad.wit".to_owned(), "f : func(,)".to_owned());
        assert_eq!(driver.parse_and_emit_module(file_id), Status::Error);
    }

    #[test]
    fn same_output_twice_still_succeeds() {
        let input = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        fs::create_dir(input.path().join("other")).unwrap();
        let paths = vec![
            write_input(input.path(), "lunatic_timer.wit", "a : func()"),
            write_input(&input.path().join("other"), "lunatic_timer.wit", "b : func()"),
        ];

        let mut driver = quiet_driver();
        let action = Action::Generate {
            dest: dest.path().to_owned(),
        };

        assert_eq!(driver.run(&action, &paths), Status::Ok);
        let output = fs::read_to_string(dest.path().join("lunatic/timer/timer.go")).unwrap();
        assert!(output.contains("//go:export B\n"));
    }
}
