//! Recognition through an external helper process.
//!
//! The helper receives raw PCM on stdin and answers with a single JSON
//! object on stdout:
//!
//! ```text
//! {"status": "matched", "song": {"name": "...", "artists": [...], ...}}
//! {"status": "no_match"}
//! {"status": "error", "message": "..."}
//! ```

use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;
use std::process::{ChildStdin, Command, Stdio};
use std::thread;

use serde::Deserialize;

use crate::chapters::NS_PER_SEC;
use crate::tools::{ensure_resolvable, ToolError, RECOGNIZER};

use super::types::{AudioSample, Recognition, RecognitionError, SongInfo};
use super::RecognitionService;

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Reply {
    Matched { song: SongInfo },
    NoMatch,
    Error {
        #[serde(default)]
        message: String,
    },
}

/// Parse the helper's stdout into a recognition outcome.
pub fn parse_reply(stdout: &str) -> Result<Recognition, RecognitionError> {
    // Helpers may print log lines first; the reply is the last non-empty line.
    let line = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .ok_or_else(|| RecognitionError::InvalidResponse("empty output".to_string()))?;

    let reply: Reply = serde_json::from_str(line)
        .map_err(|e| RecognitionError::InvalidResponse(format!("{}: {}", e, line)))?;

    match reply {
        Reply::Matched { song } => Ok(Recognition::Match(song)),
        Reply::NoMatch => Ok(Recognition::NoMatch),
        Reply::Error { message } => Err(RecognitionError::Service(message)),
    }
}

/// Write the sample and close the pipe so the helper sees EOF.
///
/// A helper may answer without reading its input; the broken pipe that
/// leaves behind is not an error.
fn feed_stdin(stdin: Option<ChildStdin>, pcm: &[u8]) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(pcm) {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            tracing::debug!("Recognizer closed stdin early");
            Ok(())
        }
        other => other,
    }
}

/// [`RecognitionService`] that shells out to a recognizer program.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: PathBuf,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl RecognitionService for CommandRecognizer {
    fn recognize(&self, sample: &AudioSample) -> Result<Recognition, RecognitionError> {
        let duration_secs = sample.duration_ns as f64 / NS_PER_SEC as f64;

        let mut cmd = Command::new(&self.program);
        cmd.arg("--sample-rate")
            .arg(sample.sample_rate.to_string())
            .arg("--duration")
            .arg(format!("{:.3}", duration_secs))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!("Running recognizer: {:?}", cmd);

        let mut child = cmd.spawn()?;
        let stdin = child.stdin.take();

        // Feed stdin on its own thread so a chatty helper cannot block on a
        // full stdout pipe while we are still writing.
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || feed_stdin(stdin, &sample.pcm));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (output, written)
        });
        let output = output?;
        written?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            // A well-formed error reply is more useful than the exit code.
            if let Err(e @ RecognitionError::Service(_)) = parse_reply(&stdout) {
                return Err(e);
            }
            return Err(RecognitionError::ProcessFailed {
                exit_code: output.status.code().unwrap_or(-1),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_reply(&stdout)
    }

    fn check_available(&self) -> Result<(), ToolError> {
        ensure_resolvable(RECOGNIZER, &self.program).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_match_reply() {
        let out = r#"{"status":"matched","song":{"name":"Song","artists":["A"],"id":7}}"#;
        match parse_reply(out).unwrap() {
            Recognition::Match(song) => {
                assert_eq!(song.name, "Song");
                assert_eq!(song.id, "7");
            }
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[test]
    fn parses_no_match_after_log_lines() {
        let out = "loading fingerprint engine\n{\"status\":\"no_match\"}\n\n";
        assert_eq!(parse_reply(out).unwrap(), Recognition::NoMatch);
    }

    #[test]
    fn error_reply_is_service_error() {
        let out = r#"{"status":"error","message":"rate limited"}"#;
        let err = parse_reply(out).unwrap_err();
        assert!(matches!(err, RecognitionError::Service(ref m) if m == "rate limited"));
    }

    #[test]
    fn garbage_is_invalid_response() {
        assert!(matches!(
            parse_reply("not json").unwrap_err(),
            RecognitionError::InvalidResponse(_)
        ));
        assert!(matches!(
            parse_reply("").unwrap_err(),
            RecognitionError::InvalidResponse(_)
        ));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let recognizer = CommandRecognizer::new("/nonexistent/song-recognizer");
        let sample = AudioSample::new(vec![0; 16], 8000, NS_PER_SEC);
        assert!(matches!(
            recognizer.recognize(&sample).unwrap_err(),
            RecognitionError::Spawn(_)
        ));
    }

    #[cfg(unix)]
    fn helper_script(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("song-recognizer");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    fn three_second_sample() -> AudioSample {
        AudioSample::new(vec![0; 96_000], 8000, 3 * NS_PER_SEC)
    }

    #[cfg(unix)]
    #[test]
    fn helper_rejecting_without_reading_input_reports_its_error() {
        let dir = tempfile::tempdir().unwrap();
        let helper = helper_script(
            dir.path(),
            r#"echo '{"status":"error","message":"rate limited"}'; exit 3"#,
        );

        let err = CommandRecognizer::new(helper)
            .recognize(&three_second_sample())
            .unwrap_err();
        assert!(
            matches!(err, RecognitionError::Service(ref m) if m == "rate limited"),
            "got {:?}",
            err
        );
    }

    #[cfg(unix)]
    #[test]
    fn helper_reads_sample_and_sees_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let helper = helper_script(
            dir.path(),
            r#"bytes=$(wc -c | tr -d ' ')
echo "args: $*" >&2
echo "{\"status\":\"matched\",\"song\":{\"name\":\"$bytes\",\"artists\":\"$2\",\"id\":1}}""#,
        );

        match CommandRecognizer::new(helper)
            .recognize(&three_second_sample())
            .unwrap()
        {
            Recognition::Match(song) => {
                assert_eq!(song.name, "96000");
                assert_eq!(song.artists, vec!["8000".to_string()]);
            }
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn large_helper_output_does_not_block_the_sample_write() {
        let dir = tempfile::tempdir().unwrap();
        let helper = helper_script(
            dir.path(),
            r#"head -c 200000 /dev/zero | tr '\000' 'x'
echo
cat > /dev/null
echo '{"status":"no_match"}'"#,
        );

        assert_eq!(
            CommandRecognizer::new(helper)
                .recognize(&three_second_sample())
                .unwrap(),
            Recognition::NoMatch
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_helper_without_reply_is_process_failure() {
        let dir = tempfile::tempdir().unwrap();
        let helper = helper_script(dir.path(), "echo 'model missing' >&2; exit 2");

        match CommandRecognizer::new(helper)
            .recognize(&three_second_sample())
            .unwrap_err()
        {
            RecognitionError::ProcessFailed { exit_code, message } => {
                assert_eq!(exit_code, 2);
                assert_eq!(message, "model missing");
            }
            other => panic!("expected process failure, got {:?}", other),
        }
    }
}
