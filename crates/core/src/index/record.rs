//! Line codec for index records.
//!
//! A record is three fields joined by `||`: input path, output path, action
//! flag. Path fields escape literal `\` as `\\` and literal `|` as `\|`, so
//! a path containing the delimiter byte sequence round-trips exactly. The
//! decoder is a single left-to-right scan that only treats an *unescaped*
//! `||` as a field boundary; splitting naively on `||` would corrupt any
//! path ending in an escaped pipe.

use super::error::IndexError;
use super::types::{Job, JobAction};
use std::path::PathBuf;

/// Escapes separator characters in a path field.
pub fn escape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            c => out.push(c),
        }
    }
    out
}

/// Encodes a job as one index line (without trailing newline).
pub fn encode_job(job: &Job) -> String {
    format!(
        "{}||{}||{}",
        escape_field(&job.input_path.to_string_lossy()),
        escape_field(&job.output_path.to_string_lossy()),
        job.action.flag()
    )
}

/// Decodes one index line into a job. `line_number` is used for diagnostics.
pub fn decode_job(line: &str, line_number: u64) -> Result<Job, IndexError> {
    let fields = split_fields(line, line_number)?;
    if fields.len() != 3 {
        return Err(IndexError::malformed(
            line_number,
            format!("expected 3 fields, found {}", fields.len()),
        ));
    }

    let action = JobAction::from_flag(&fields[2]).ok_or_else(|| {
        IndexError::malformed(line_number, format!("invalid action flag {:?}", fields[2]))
    })?;

    Ok(Job {
        input_path: PathBuf::from(&fields[0]),
        output_path: PathBuf::from(&fields[1]),
        action,
    })
}

/// Splits a line on unescaped `||`, unescaping each field in the same pass.
fn split_fields(line: &str, line_number: u64) -> Result<Vec<String>, IndexError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\\') => current.push('\\'),
                Some('|') => current.push('|'),
                Some(other) => {
                    return Err(IndexError::malformed(
                        line_number,
                        format!("invalid escape sequence \\{}", other),
                    ))
                }
                None => {
                    return Err(IndexError::malformed(line_number, "dangling escape at end of line"))
                }
            },
            '|' => {
                if chars.peek() == Some(&'|') {
                    chars.next();
                    fields.push(std::mem::take(&mut current));
                } else {
                    return Err(IndexError::malformed(line_number, "unescaped '|' in field"));
                }
            }
            c => current.push(c),
        }
    }
    fields.push(current);

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn round_trip(job: &Job) -> Job {
        decode_job(&encode_job(job), 1).unwrap()
    }

    #[test]
    fn test_plain_record_round_trip() {
        let job = Job::convert("/music/track.mp3", "/out/track.flac");
        assert_eq!(round_trip(&job), job);
    }

    #[test]
    fn test_copy_record_round_trip() {
        let job = Job::copy("/music/cover.jpg", "/out/cover.jpg");
        assert_eq!(round_trip(&job), job);
    }

    #[test]
    fn test_pipe_in_path_round_trips() {
        let job = Job::convert("/music/a|b.mp3", "/out/a|b.flac");
        assert_eq!(round_trip(&job), job);
    }

    #[test]
    fn test_backslash_in_path_round_trips() {
        let job = Job::copy("/music/back\\slash.txt", "/out/back\\slash.txt");
        assert_eq!(round_trip(&job), job);
    }

    #[test]
    fn test_escaped_pipe_at_field_end_round_trips() {
        // The adversarial case: a path ending in backslash-pipe puts the
        // sequence `\|||` on disk, which a naive split("||") mis-parses.
        let job = Job::convert("/music/weird\\|", "/out/weird\\|.flac");
        assert_eq!(round_trip(&job), job);
    }

    #[test]
    fn test_double_pipe_in_path_round_trips() {
        let job = Job::copy("/music/a||b", "/out/a||b");
        assert_eq!(round_trip(&job), job);
    }

    #[test]
    fn test_unescaped_single_pipe_rejected() {
        let result = decode_job("/a|b||/out||1", 7);
        assert!(matches!(result, Err(IndexError::Malformed { line: 7, .. })));
    }

    #[test]
    fn test_dangling_escape_rejected() {
        let result = decode_job("/a||/out||1\\", 3);
        assert!(matches!(result, Err(IndexError::Malformed { line: 3, .. })));
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        let result = decode_job("/a||/out", 2);
        assert!(matches!(result, Err(IndexError::Malformed { line: 2, .. })));
    }

    #[test]
    fn test_bad_action_flag_rejected() {
        let result = decode_job("/a||/out||7", 4);
        assert!(matches!(result, Err(IndexError::Malformed { line: 4, .. })));
    }

    #[test]
    fn test_escape_field_examples() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a|b"), "a\\|b");
        assert_eq!(escape_field("a\\b"), "a\\\\b");
        assert_eq!(escape_field("\\|"), "\\\\\\|");
    }

    #[test]
    fn test_encoded_line_shape() {
        let job = Job::convert(Path::new("/in/x.mp3"), Path::new("/out/x.flac"));
        assert_eq!(encode_job(&job), "/in/x.mp3||/out/x.flac||1");
    }
}
