use clap::{ArgGroup, Parser};
use codespan_reporting::term::termcolor::ColorChoice;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use witgen::{Action, Driver};

/// Generate Go host bindings from WIT function declarations
#[derive(Parser)]
#[command(author, version, about)]
#[command(after_help = AFTER_HELP)]
#[command(group(ArgGroup::new("action").required(true).args(["dump", "dest"])))]
struct Cli {
    /// Print the parsed declarations instead of generating bindings
    #[arg(long, display_order = 0)]
    dump: bool,
    /// Directory to generate the bindings into
    #[arg(short = 'o', long, value_name = "DIR", display_order = 1)]
    dest: Option<PathBuf>,
    /// Continue with the remaining files after a file fails
    #[arg(long)]
    keep_going: bool,
    /// Configure coloring of output
    #[arg(
        long,
        value_name = "WHEN",
        default_value = "auto",
        value_parser = parse_color_choice
    )]
    color: ColorChoice,
    /// WIT files to generate from
    #[arg(required = true, value_name = "FILES", value_parser = parse_existing_file)]
    files: Vec<PathBuf>,
}

const AFTER_HELP: &str = "\
Examples:

  $ witgen --dest bindings wit/lunatic_timer.wit
  $ witgen --dump wit/lunatic_process.wit

The name of each file determines the module it is bound to, and where its
bindings are generated. `wit/lunatic_timer.wit` is bound to `lunatic::timer`
and generated to `bindings/lunatic/timer/timer.go`.

Log output is controlled by the `WITGEN_LOG` environment variable.
";

fn parse_color_choice(src: &str) -> Result<ColorChoice, &'static str> {
    match () {
        () if src.eq_ignore_ascii_case("auto") => Ok(ColorChoice::Auto),
        () if src.eq_ignore_ascii_case("always") => Ok(ColorChoice::Always),
        () if src.eq_ignore_ascii_case("ansi") => Ok(ColorChoice::AlwaysAnsi),
        () if src.eq_ignore_ascii_case("never") => Ok(ColorChoice::Never),
        () => Err("valid values: auto, always, ansi, never"),
    }
}

fn parse_existing_file(src: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(src);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("`{src}` is not an existing file"))
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_env("WITGEN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ! {
    let cli = Cli::parse();
    init_tracing();

    let mut driver = Driver::new();
    driver.install_panic_hook();
    driver.set_color_choice(cli.color);
    driver.set_keep_going(cli.keep_going);

    let action = match (cli.dump, cli.dest) {
        (true, None) => Action::Dump,
        (false, Some(dest)) => Action::Generate { dest },
        (true, Some(_)) | (false, None) => {
            unreachable!(r#"guarded by `ArgGroup::new("action").required(true)`"#)
        }
    };

    let status = driver.run(&action, &cli.files);
    std::process::exit(status.exit_code());
}
