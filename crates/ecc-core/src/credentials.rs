//! Best-effort secret lookup for placeholder resolution.
//!
//! A lookup never aborts a merge: `Ok(None)` means "no value available" and
//! errors are reported by the caller as warnings.

use crate::error::{EccError, Result};
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

pub trait CredentialSource {
    /// Human-readable description used in progress and log lines.
    fn describe(&self) -> String;

    fn lookup(&self) -> Result<Option<String>>;
}

/// Runs an external command; its trimmed stdout is the credential.
#[derive(Debug, Clone)]
pub struct CommandCredential {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl CommandCredential {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `gh auth token`
    pub fn github_cli() -> Self {
        Self::new("gh", &["auth", "token"])
    }

    fn failed(&self, reason: impl Into<String>) -> EccError {
        EccError::CredentialLookupFailed {
            source_name: self.describe(),
            reason: reason.into(),
        }
    }
}

impl CredentialSource for CommandCredential {
    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn lookup(&self) -> Result<Option<String>> {
        let mut child = match Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            // Tool not installed: nothing to offer, not a failure.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.failed(e.to_string())),
        };

        // Drain stdout while waiting so a chatty command cannot fill the pipe
        // and stall until the deadline.
        let mut pipe = child.stdout.take();
        let reader = std::thread::spawn(move || {
            let mut buf = String::new();
            if let Some(out) = pipe.as_mut() {
                out.read_to_string(&mut buf)?;
            }
            Ok::<_, std::io::Error>(buf)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(self.failed(format!("timed out after {:?}", self.timeout)));
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(20)),
                Err(e) => return Err(self.failed(e.to_string())),
            }
        };

        if !status.success() {
            tracing::debug!(command = %self.describe(), %status, "credential command exited unsuccessfully");
            return Ok(None);
        }

        let stdout = reader
            .join()
            .map_err(|_| self.failed("stdout reader panicked"))?
            .map_err(|e| self.failed(e.to_string()))?;
        let value = stdout.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }
}

/// Reads the credential from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    pub var: String,
}

impl CredentialSource for EnvCredential {
    fn describe(&self) -> String {
        format!("${}", self.var)
    }

    fn lookup(&self) -> Result<Option<String>> {
        Ok(std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}

/// A fixed value.
#[derive(Debug, Clone)]
pub struct StaticCredential(pub Option<String>);

impl CredentialSource for StaticCredential {
    fn describe(&self) -> String {
        "static value".to_string()
    }

    fn lookup(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_yields_none() {
        let source = CommandCredential::new("ecc-definitely-not-installed", &[]);
        assert_eq!(source.lookup().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn command_stdout_is_trimmed() {
        let source = CommandCredential::new("sh", &["-c", "printf '  ghp_abc123 \\n'"]);
        assert_eq!(source.lookup().unwrap().as_deref(), Some("ghp_abc123"));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_yields_none() {
        let source = CommandCredential::new("sh", &["-c", "echo token; exit 1"]);
        assert_eq!(source.lookup().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn empty_output_yields_none() {
        let source = CommandCredential::new("true", &[]);
        assert_eq!(source.lookup().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn slow_command_times_out() {
        let source =
            CommandCredential::new("sleep", &["5"]).with_timeout(Duration::from_millis(100));
        let err = source.lookup().unwrap_err();
        assert!(matches!(err, EccError::CredentialLookupFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn large_output_is_read_before_the_deadline() {
        let source = CommandCredential::new("sh", &["-c", "head -c 200000 /dev/zero | tr '\\0' a"])
            .with_timeout(Duration::from_secs(5));
        let value = source.lookup().unwrap().unwrap();
        assert_eq!(value.len(), 200_000);
        assert!(value.bytes().all(|b| b == b'a'));
    }

    #[test]
    fn env_credential_reads_variable() {
        std::env::set_var("ECC_TEST_CREDENTIAL_SET", "  secret ");
        let source = EnvCredential {
            var: "ECC_TEST_CREDENTIAL_SET".into(),
        };
        assert_eq!(source.lookup().unwrap().as_deref(), Some("secret"));

        let unset = EnvCredential {
            var: "ECC_TEST_CREDENTIAL_NEVER_SET".into(),
        };
        assert_eq!(unset.lookup().unwrap(), None);
    }

    #[test]
    fn describe_joins_command() {
        assert_eq!(CommandCredential::github_cli().describe(), "gh auth token");
    }
}
