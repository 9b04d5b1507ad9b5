//! Output checking
//!
//! Compares program output against an expected file, character by
//! character, after filtering both streams through the ignore rules.
//! Diagnostics carry the first mismatch with a 1-based line and column
//! counted over the actual output as filtered.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Verdict from comparing one output file against its expectation.
#[derive(Clone, Debug)]
pub struct Comparison {
    pub passed: bool,
    /// Explanation of a failure; `None` on a pass.
    pub detail: Option<String>,
}

impl Comparison {
    fn pass() -> Self {
        Self {
            passed: true,
            detail: None,
        }
    }

    fn fail(detail: String) -> Self {
        Self {
            passed: false,
            detail: Some(detail),
        }
    }
}

/// Position within the actual output stream, advanced per filtered
/// character. Columns restart at 0 after every newline.
struct Cursor {
    line: u32,
    col: u32,
}

impl Cursor {
    fn start() -> Self {
        Self { line: 1, col: 0 }
    }

    fn advance(&mut self, byte: u8) {
        self.col += 1;
        if byte == b'\n' {
            self.line += 1;
            self.col = 0;
        }
    }
}

/// Filtered character comparison with configurable tolerances.
#[derive(Clone, Debug, Default)]
pub struct OutputChecker {
    ignore_whitespace: bool,
    ignore_extras: bool,
    ignore_truncation: bool,
    ignored_chars: String,
}

impl OutputChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip every non-graphic character (spaces, tabs, newlines, controls)
    /// on both sides before comparing.
    pub fn ignore_whitespace(mut self) -> Self {
        self.ignore_whitespace = true;
        self
    }

    /// Skip this character on both sides; repeatable.
    pub fn ignore_char(mut self, c: char) -> Self {
        self.ignored_chars.push(c);
        self
    }

    /// Skip every character of `chars` on both sides.
    pub fn ignore_chars(mut self, chars: &str) -> Self {
        self.ignored_chars.push_str(chars);
        self
    }

    /// Tolerate actual output continuing past the end of the expected text.
    pub fn ignore_extra_output(mut self) -> Self {
        self.ignore_extras = true;
        self
    }

    /// Tolerate actual output stopping short of the expected text.
    pub fn ignore_truncated_output(mut self) -> Self {
        self.ignore_truncation = true;
        self
    }

    /// Compare the file at `actual_path` against `expected_path`.
    ///
    /// An empty `expected_path` means the program is expected to produce no
    /// output (after filtering). A non-empty path that cannot be opened is
    /// a failed comparison, not a harness error. An unreadable actual file
    /// counts as empty output.
    pub fn compare(&self, expected_path: &str, actual_path: &Path) -> Comparison {
        let expected: Box<dyn Read> = if expected_path.is_empty() {
            Box::new(io::empty())
        } else {
            match File::open(expected_path) {
                Ok(file) => Box::new(file),
                Err(err) => {
                    return Comparison::fail(format!(
                        "Could not open expected output file {expected_path} for reading: {err}"
                    ));
                }
            }
        };
        let actual: Box<dyn Read> = match File::open(actual_path) {
            Ok(file) => Box::new(file),
            Err(_) => Box::new(io::empty()),
        };
        self.compare_streams(expected, actual)
    }

    fn compare_streams(&self, expected: Box<dyn Read>, actual: Box<dyn Read>) -> Comparison {
        let mut expected = BufReader::new(expected).bytes();
        let mut actual = BufReader::new(actual).bytes();
        let mut cursor = Cursor::start();

        let mut exp = self.next_kept(&mut expected, None);
        let mut act = self.next_kept(&mut actual, Some(&mut cursor));

        // Either stream empty after filtering is its own diagnostic.
        match (exp, act) {
            (None, None) => return Comparison::pass(),
            (None, Some(a)) => {
                if self.ignore_extras {
                    return Comparison::pass();
                }
                return Comparison::fail(format!("Expected no output, got {}", visible(a)));
            }
            (Some(e), None) => {
                if self.ignore_truncation {
                    return Comparison::pass();
                }
                return Comparison::fail(format!("Expected {}, got no output", visible(e)));
            }
            (Some(_), Some(_)) => {}
        }

        while let (Some(e), Some(a)) = (exp, act) {
            cursor.col += 1;
            if e != a {
                return Comparison::fail(format!(
                    "Expected {}, got {} on line {} Col {}",
                    visible(e),
                    visible(a),
                    cursor.line,
                    cursor.col
                ));
            }
            if a == b'\n' {
                cursor.line += 1;
                cursor.col = 0;
            }
            exp = self.next_kept(&mut expected, None);
            act = self.next_kept(&mut actual, Some(&mut cursor));
        }

        match (exp, act) {
            (None, Some(_)) if !self.ignore_extras => {
                Comparison::fail("Got more output than expected".to_string())
            }
            (Some(_), None) if !self.ignore_truncation => {
                Comparison::fail("Got less output than expected".to_string())
            }
            _ => Comparison::pass(),
        }
    }

    /// Next byte that survives the ignore rules. Skipped bytes still move
    /// the cursor. A read error ends the stream.
    fn next_kept<R: Read>(
        &self,
        bytes: &mut io::Bytes<BufReader<R>>,
        mut cursor: Option<&mut Cursor>,
    ) -> Option<u8> {
        for byte in bytes {
            let b = match byte {
                Ok(b) => b,
                Err(_) => return None,
            };
            if !self.is_ignored(b) {
                return Some(b);
            }
            if let Some(cursor) = cursor.as_deref_mut() {
                cursor.advance(b);
            }
        }
        None
    }

    fn is_ignored(&self, byte: u8) -> bool {
        if self.ignore_whitespace && !byte.is_ascii_graphic() {
            return true;
        }
        self.ignored_chars.contains(byte as char)
    }
}

/// Printable rendering of a byte for diagnostics.
fn visible(byte: u8) -> String {
    let c = byte as char;
    if c.is_ascii_graphic() {
        c.to_string()
    } else {
        format!("'{}'", c.escape_default())
    }
}
