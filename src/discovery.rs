//! Test-case discovery
//!
//! Finds test files by filename suffix and pairs inputs with expected
//! outputs by their shared stem.

use crate::config::types::{EvalError, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// Regular files in `dir` whose names end with `suffix`, as (stem, path)
/// sorted by stem. The stem is the file name with the suffix removed. An
/// empty suffix matches every file.
pub fn files_by_suffix(dir: &Path, suffix: &str) -> Result<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        EvalError::Config(format!("could not read directory {}: {}", dir.display(), e))
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            EvalError::Config(format!("could not read directory {}: {}", dir.display(), e))
        })?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                debug!("skipping non-UTF-8 file name {raw:?}");
                continue;
            }
        };
        if let Some(stem) = name.strip_suffix(suffix) {
            found.push((stem.to_string(), entry.path()));
        }
    }
    found.sort();
    Ok(found)
}

/// Pair scanned inputs with scanned expected outputs by stem.
///
/// Both lists come from [`files_by_suffix`], so they are sorted by stem.
/// Returns two equal-length path lists. A stem present on only one side is
/// still a case; the other side gets the empty no-file sentinel. Order is
/// the merged stem order, so runs are deterministic whatever the directory
/// iteration order.
pub fn pair_stems(
    ins: Vec<(String, PathBuf)>,
    outs: Vec<(String, PathBuf)>,
) -> (Vec<String>, Vec<String>) {
    debug!(
        "pairing {} input file(s) with {} expected output file(s)",
        ins.len(),
        outs.len()
    );

    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let (mut i, mut j) = (0, 0);
    loop {
        match (ins.get(i), outs.get(j)) {
            (Some((in_stem, in_path)), Some((out_stem, out_path))) => {
                if in_stem == out_stem {
                    inputs.push(path_string(in_path));
                    outputs.push(path_string(out_path));
                    i += 1;
                    j += 1;
                } else if in_stem < out_stem {
                    inputs.push(path_string(in_path));
                    outputs.push(String::new());
                    i += 1;
                } else {
                    inputs.push(String::new());
                    outputs.push(path_string(out_path));
                    j += 1;
                }
            }
            (Some((_, in_path)), None) => {
                inputs.push(path_string(in_path));
                outputs.push(String::new());
                i += 1;
            }
            (None, Some((_, out_path))) => {
                inputs.push(String::new());
                outputs.push(path_string(out_path));
                j += 1;
            }
            (None, None) => break,
        }
    }
    (inputs, outputs)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) {
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }

    #[test]
    fn finds_files_by_suffix_sorted_by_stem() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "b.in");
        touch(&dir, "a.in");
        touch(&dir, "notes.txt");
        let found = files_by_suffix(dir.path(), ".in").unwrap();
        let stems: Vec<&str> = found.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(stems, vec!["a", "b"]);
    }

    #[test]
    fn empty_suffix_matches_everything() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "alpha");
        touch(&dir, "beta");
        let found = files_by_suffix(dir.path(), "").unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn directories_are_not_test_files() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "real.in");
        std::fs::create_dir(dir.path().join("fake.in")).unwrap();
        let found = files_by_suffix(dir.path(), ".in").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "real");
    }

    #[test]
    fn unreadable_directory_is_a_config_error() {
        let err = files_by_suffix(Path::new("/no/such/dir"), ".in").unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }

    #[test]
    fn pairs_matching_stems_and_pads_the_rest() {
        let inputs_dir = TempDir::new().unwrap();
        let outputs_dir = TempDir::new().unwrap();
        touch(&inputs_dir, "a.in");
        touch(&inputs_dir, "b.in");
        touch(&inputs_dir, "c.in");
        touch(&outputs_dir, "a.out");
        touch(&outputs_dir, "c.out");
        touch(&outputs_dir, "d.out");

        let ins = files_by_suffix(inputs_dir.path(), ".in").unwrap();
        let outs = files_by_suffix(outputs_dir.path(), ".out").unwrap();
        let (inputs, outputs) = pair_stems(ins, outs);
        assert_eq!(inputs.len(), outputs.len());
        assert_eq!(inputs.len(), 4);

        // a pairs, b has no output, c pairs, d has no input
        assert!(inputs[0].ends_with("a.in") && outputs[0].ends_with("a.out"));
        assert!(inputs[1].ends_with("b.in") && outputs[1].is_empty());
        assert!(inputs[2].ends_with("c.in") && outputs[2].ends_with("c.out"));
        assert!(inputs[3].is_empty() && outputs[3].ends_with("d.out"));
    }

    #[test]
    fn inputs_without_an_output_scan_pair_with_the_sentinel() {
        let inputs_dir = TempDir::new().unwrap();
        touch(&inputs_dir, "a.in");
        touch(&inputs_dir, "b.in");
        let ins = files_by_suffix(inputs_dir.path(), ".in").unwrap();
        let (inputs, outputs) = pair_stems(ins, Vec::new());
        assert_eq!(inputs.len(), 2);
        assert!(outputs.iter().all(|o| o.is_empty()));
    }

    #[test]
    fn pairing_nothing_yields_no_cases() {
        let (inputs, outputs) = pair_stems(Vec::new(), Vec::new());
        assert!(inputs.is_empty());
        assert!(outputs.is_empty());
    }
}
