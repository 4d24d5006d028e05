//! CLI argument definitions

use clap::Parser;
use nim_backtrace_common::{DEFAULT_SKIP, MAX_BACKTRACE_LINES};

#[derive(Parser, Debug)]
#[command(
    name = "nim-backtrace",
    about = "Print a filtered backtrace of this program's own stack",
    after_help = "\
EXAMPLES:
    nim-backtrace                          Default bounds (128 lines, skip 3)
    nim-backtrace --depth 5 --skip 0       Show five nested frames and the machinery
    NIM_LIBBACKTRACE_DEBUG=1 nim-backtrace Keep every frame"
)]
pub struct Args {
    /// Maximum number of lines to print
    #[arg(short, long, default_value_t = MAX_BACKTRACE_LINES)]
    pub max: usize,

    /// Frames to drop from the innermost end (ignored in debug mode)
    #[arg(short, long, default_value_t = DEFAULT_SKIP)]
    pub skip: usize,

    /// Nest this many calls before capturing
    #[arg(short, long, default_value = "0")]
    pub depth: usize,
}
