//! Inspection and manipulation of `powerctld`'s environment.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Cmdline {
    /// Enable verbose console outputs
    pub verbose: bool,

    /// Disable console outputs
    pub quiet: bool,

    /// Disable colorful console outputs
    pub no_color: bool,

    /// Override the persistent state directory
    pub state_dir: PathBuf,

    /// Override the runtime directory
    pub runtime_dir: PathBuf,
}
impl Cmdline {
    /// Parses a new [`Cmdline`] instance from the command-line arguments.
    pub fn parse() -> Self {
        let mut object = Self::default();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match &arg[..] {
                "--verbose" => object.verbose = true,
                "-q" | "--quiet" => object.quiet = true,
                "--no-color" => object.no_color = true,
                "--state-dir" => {
                    if let Some(x) = args.next() {
                        object.state_dir = x.into();
                    }
                }
                "--runtime-dir" => {
                    if let Some(x) = args.next() {
                        object.runtime_dir = x.into();
                    }
                }
                "-h" | "--help" => Self::print_help(),
                "-V" | "--version" => Self::print_version(),
                _ => {}
            }
        }

        object
    }

    fn print_help() -> ! {
        println!("Usage: powerctld [OPTIONS]");
        println!();
        println!("Options:");
        println!("    -h, --help                        Print help");
        println!("    -V, --version                     Print version");
        println!("    -q, --quiet                       Disable console outputs");
        println!("        --verbose                     Enable verbose console outputs");
        println!("        --no-color                    Disable colorful console outputs");
        println!("        --state-dir <DIR>             Override the persistent state directory");
        println!("        --runtime-dir <DIR>           Override the runtime directory");
        std::process::exit(0);
    }

    fn print_version() -> ! {
        println!("powerctld v{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }
}
impl Default for Cmdline {
    fn default() -> Self {
        Self {
            verbose: false,
            quiet: false,
            no_color: false,
            state_dir: "/var/lib/power-control".into(),
            runtime_dir: "/run/powerctl".into(),
        }
    }
}
