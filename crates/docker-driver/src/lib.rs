//! `docker-driver`: the container runtime behind lurch.
//!
//! Lurch needs exactly two things from a container runtime: refresh the devops
//! image from its registry, and run a command inside a throwaway container of
//! that image. [`ContainerRuntime`] is that seam; [`DockerCli`] implements it
//! by driving the `docker` binary.
//!
//! ```text
//! ContainerRuntime::pull  ──► docker login --password-stdin (optional)
//!                             docker pull image:tag   → "Status: …" line
//! ContainerRuntime::exec  ──► docker run --rm -e K=V image:tag argv…
//!                             → ExecOutput { exit_code, stdout, stderr }
//! ```

pub mod error;
pub mod runtime;
pub mod types;

pub(crate) mod process;


pub use error::DockerError;
pub use runtime::{ContainerRuntime, DockerCli};
pub use types::{ExecOutput, ImageRef, PullStatus, RegistryAuth};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, DockerError>;
