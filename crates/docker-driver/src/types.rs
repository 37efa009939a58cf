use std::fmt;

// ─── ImageRef ─────────────────────────────────────────────────────────────

/// An image name plus tag, displayed as `image:tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub image: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(image: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            tag: tag.into(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.image, self.tag)
    }
}

// ─── RegistryAuth ─────────────────────────────────────────────────────────

/// Credentials passed to `docker login` before a pull.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    pub username: String,
    pub password: String,
    /// Registry host; `None` means Docker Hub.
    pub server: Option<String>,
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server", &self.server)
            .finish()
    }
}

// ─── ExecOutput ───────────────────────────────────────────────────────────

/// What a command run inside a container produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit code of the command; `-1` when it was killed by a signal.
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

// ─── PullStatus ───────────────────────────────────────────────────────────

/// Outcome of a successful pull, read from docker's human-readable status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullStatus {
    /// A newer image was downloaded.
    Downloaded,
    /// The local image already matched the registry.
    UpToDate,
    /// Any other status text, kept verbatim.
    Unrecognised(String),
}

impl PullStatus {
    /// Classify the status text returned by a pull.
    ///
    /// The docker CLI does not offer a structured pull status, so this matches
    /// on the prefixes it prints. Keep every such match in this one function.
    pub fn classify(text: &str) -> Self {
        let text = text.trim();
        if text.starts_with("Status: Downloaded newer") {
            PullStatus::Downloaded
        } else if text.starts_with("Status: Image is up to date") {
            PullStatus::UpToDate
        } else {
            PullStatus::Unrecognised(text.to_string())
        }
    }
}

/// Pick the `Status:` line out of `docker pull` output, falling back to the
/// whole trimmed output.
pub(crate) fn status_line(output: &str) -> String {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("Status:"))
        .map(str::to_string)
        .unwrap_or_else(|| output.trim().to_string())
}
