use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static LOGGER: CliLogger = CliLogger;

/// A small logger that colors by level and writes straight to stdout/stderr, without
/// pulling in a timestamp or formatting dependency.
pub struct CliLogger;

impl CliLogger {
    pub fn setup() {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Info);
    }
}

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        let md = record.metadata();

        if !self.enabled(md) {
            return;
        }

        let module = record.module_path().unwrap_or_default();

        let mut out = match md.level() {
            Level::Error => {
                let mut stderr = StandardStream::stderr(ColorChoice::Auto);
                stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true)).unwrap();
                stderr
            }
            Level::Warn => {
                let mut stderr = StandardStream::stderr(ColorChoice::Auto);
                stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow))).unwrap();
                stderr
            }
            _ => {
                let mut stdout = StandardStream::stdout(ColorChoice::Auto);
                stdout.set_color(ColorSpec::new().set_dimmed(true)).unwrap();
                stdout
            }
        };

        writeln![out, "{}: {}", module, record.args()].unwrap();
        out.reset().unwrap();
    }

    fn flush(&self) {}
}
