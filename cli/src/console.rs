//! Console presentation helpers
//!
//! VT escape styling, human-readable sizes, and the prompt plumbing for
//! the interactive flow. On Windows the init path switches the console to
//! UTF-8 output and turns on VT processing; when that is refused, styled
//! text falls back to plain.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Bright red foreground, for the destructive warnings
pub const RED: &str = "\x1b[91m";
/// Bright yellow foreground, marks the system disk row
pub const YELLOW: &str = "\x1b[93m";
/// White on bright red, the full warning banner
pub const BANNER: &str = "\x1b[97;101m";
const RESET: &str = "\x1b[0m";

static COLORS: AtomicBool = AtomicBool::new(false);

/// One-time console setup. Never fails; a console that rejects VT mode
/// just gets uncolored output.
pub fn init() {
    COLORS.store(platform::setup(), Ordering::Relaxed);
}

/// Wrap `text` in `style` when the console takes VT escapes
pub fn paint(style: &str, text: &str) -> String {
    if COLORS.load(Ordering::Relaxed) {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Human-readable size, 1024-based units up to TB, one decimal
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

/// Parsed answer to the device selection prompt
#[derive(Debug, PartialEq, Eq)]
pub enum Selection {
    Quit,
    Device(u32),
    Invalid,
}

/// `q`/`Q` quits; otherwise the input must be a whole device number.
/// Trailing garbage is rejected rather than silently truncated.
pub fn parse_selection(input: &str) -> Selection {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Selection::Quit;
    }
    match input.parse::<u32>() {
        Ok(id) => Selection::Device(id),
        Err(_) => Selection::Invalid,
    }
}

/// Only the exact word `yes` arms the trim
pub fn confirms_destruction(input: &str) -> bool {
    input.trim() == "yes"
}

/// Print `prompt` without a newline, flush, and read one input line
pub fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

/// Hold the window open; the tool is routinely launched by double-click
pub fn pause() {
    let _ = read_line("\nPress Enter to exit...");
}

#[cfg(windows)]
mod platform {
    type Handle = isize;

    const INVALID_HANDLE_VALUE: Handle = -1;
    const STD_OUTPUT_HANDLE: u32 = -11i32 as u32;
    const ENABLE_VIRTUAL_TERMINAL_PROCESSING: u32 = 0x0004;
    const CP_UTF8: u32 = 65001;

    #[link(name = "kernel32")]
    extern "system" {
        fn GetStdHandle(std_handle: u32) -> Handle;
        fn GetConsoleMode(handle: Handle, mode: *mut u32) -> i32;
        fn SetConsoleMode(handle: Handle, mode: u32) -> i32;
        fn SetConsoleOutputCP(code_page: u32) -> i32;
    }

    pub fn setup() -> bool {
        unsafe {
            SetConsoleOutputCP(CP_UTF8);
            let handle = GetStdHandle(STD_OUTPUT_HANDLE);
            if handle == INVALID_HANDLE_VALUE || handle == 0 {
                return false;
            }
            let mut mode = 0u32;
            if GetConsoleMode(handle, &mut mode) == 0 {
                // Redirected output; no escapes wanted there either
                return false;
            }
            SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING) != 0
        }
    }
}

#[cfg(not(windows))]
mod platform {
    pub fn setup() -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_byte_range() {
        assert_eq!(format_size(0), "0.0 B");
        assert_eq!(format_size(512), "512.0 B");
        assert_eq!(format_size(1023), "1023.0 B");
    }

    #[test]
    fn test_format_size_unit_steps() {
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
        assert_eq!(format_size(1024u64.pow(4)), "1.0 TB");
    }

    #[test]
    fn test_format_size_marketing_terabyte() {
        // Decimal-TB drives land below the binary unit boundary
        assert_eq!(format_size(1_000_000_000_000), "931.3 GB");
    }

    #[test]
    fn test_format_size_stops_at_tb() {
        assert_eq!(format_size(2048 * 1024u64.pow(4)), "2048.0 TB");
    }

    #[test]
    fn test_parse_selection_accepts_numbers_and_quit() {
        assert_eq!(parse_selection("3\n"), Selection::Device(3));
        assert_eq!(parse_selection(" 12 "), Selection::Device(12));
        assert_eq!(parse_selection("q\n"), Selection::Quit);
        assert_eq!(parse_selection("Q"), Selection::Quit);
    }

    #[test]
    fn test_parse_selection_rejects_garbage() {
        assert_eq!(parse_selection(""), Selection::Invalid);
        assert_eq!(parse_selection("3x"), Selection::Invalid);
        assert_eq!(parse_selection("-1"), Selection::Invalid);
        assert_eq!(parse_selection("quit"), Selection::Invalid);
    }

    #[test]
    fn test_confirmation_is_exact() {
        assert!(confirms_destruction("yes\n"));
        assert!(confirms_destruction("  yes  "));
        assert!(!confirms_destruction("YES\n"));
        assert!(!confirms_destruction("y\n"));
        assert!(!confirms_destruction("yes please"));
        assert!(!confirms_destruction(""));
    }
}
