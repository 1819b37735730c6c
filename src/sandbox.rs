//! Sandboxed filesystem I/O for `read-file`/`write-file`/`file-exists?`.
//! Capability-based: every allowed root is opened once as a `cap_std::fs::Dir`,
//! which rejects absolute paths and `..` traversal by construction. We also
//! reject them up front so the error message names the offending path.

use crate::config::FsConfig;
use cap_std::fs::Dir;

#[cfg(test)]
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum SandboxError {
    PathNotAllowed(String),
    FileNotFound(String),
    FileTooLarge(String),
    IoError(String),
}

impl std::fmt::Display for SandboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxError::PathNotAllowed(path) => {
                write!(f, "access denied: {} is not in allowed paths", path)
            }
            SandboxError::FileNotFound(path) => write!(f, "file not found: {}", path),
            SandboxError::FileTooLarge(msg) => write!(f, "file too large: {}", msg),
            SandboxError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SandboxError {}

/// Capability-based filesystem sandbox: one `Dir` per allowed root.
pub struct Sandbox {
    fs_roots: Vec<Dir>,
    fs_config: FsConfig,
}

impl Sandbox {
    pub fn new(fs_config: FsConfig) -> Result<Self, SandboxError> {
        let mut fs_roots = Vec::new();

        for path in &fs_config.allowed_paths {
            std::fs::create_dir_all(path).map_err(|e| {
                SandboxError::IoError(format!("cannot create {}: {}", path.display(), e))
            })?;

            let dir = Dir::open_ambient_dir(path, cap_std::ambient_authority()).map_err(|e| {
                SandboxError::IoError(format!("cannot open {}: {}", path.display(), e))
            })?;

            fs_roots.push(dir);
        }

        Ok(Self { fs_roots, fs_config })
    }

    fn validate_path(path: &str) -> Result<(), SandboxError> {
        if path.starts_with('/') || path.starts_with('\\') || path.contains("..") {
            return Err(SandboxError::PathNotAllowed(path.to_string()));
        }
        Ok(())
    }

    /// Writes always use the first root; reads search every root in order.
    fn find_root_for_path(&self, user_path: &str, write_mode: bool) -> Result<&Dir, SandboxError> {
        if write_mode {
            if let Some(root) = self.fs_roots.first() {
                return Ok(root);
            }
        } else {
            for root in &self.fs_roots {
                if root.metadata(user_path).is_ok() {
                    return Ok(root);
                }
            }
            if let Some(root) = self.fs_roots.first() {
                return Ok(root);
            }
        }
        Err(SandboxError::PathNotAllowed(user_path.to_string()))
    }

    pub fn read_file(&self, path: &str) -> Result<String, SandboxError> {
        Self::validate_path(path)?;
        let root = self.find_root_for_path(path, false)?;
        root.read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SandboxError::FileNotFound(path.to_string())
            } else {
                SandboxError::IoError(format!("cannot read {}: {}", path, e))
            }
        })
    }

    pub fn write_file(&self, path: &str, contents: &str) -> Result<(), SandboxError> {
        Self::validate_path(path)?;

        if contents.len() > self.fs_config.max_file_size {
            return Err(SandboxError::FileTooLarge(format!(
                "{} bytes exceeds limit of {} bytes",
                contents.len(),
                self.fs_config.max_file_size
            )));
        }

        let root = self.find_root_for_path(path, true)?;
        root.write(path, contents)
            .map_err(|e| SandboxError::IoError(format!("cannot write {}: {}", path, e)))
    }

    pub fn file_exists(&self, path: &str) -> Result<bool, SandboxError> {
        Self::validate_path(path)?;
        let root = self.find_root_for_path(path, false)?;
        match root.metadata(path) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SandboxError::IoError(format!("cannot check {}: {}", path, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn create_test_sandbox() -> (Sandbox, PathBuf) {
        let test_dir = PathBuf::from("./test_sandbox_temp");
        let _ = fs::remove_dir_all(&test_dir);
        fs::create_dir_all(&test_dir).unwrap();

        let fs_config = FsConfig {
            allowed_paths: vec![test_dir.clone()],
            ..Default::default()
        };

        let sandbox = Sandbox::new(fs_config).unwrap();
        (sandbox, test_dir)
    }

    fn cleanup_test_sandbox(test_dir: &PathBuf) {
        let _ = fs::remove_dir_all(test_dir);
    }

    #[test]
    #[serial]
    fn test_read_file_success() {
        let (sandbox, test_dir) = create_test_sandbox();
        fs::write(test_dir.join("test.txt"), "hello world").unwrap();
        let contents = sandbox.read_file("test.txt").unwrap();
        assert_eq!(contents, "hello world");
        cleanup_test_sandbox(&test_dir);
    }

    #[test]
    #[serial]
    fn test_write_file_success() {
        let (sandbox, test_dir) = create_test_sandbox();
        sandbox.write_file("output.txt", "test data").unwrap();
        let contents = sandbox.read_file("output.txt").unwrap();
        assert_eq!(contents, "test data");
        cleanup_test_sandbox(&test_dir);
    }

    #[test]
    #[serial]
    fn test_file_exists() {
        let (sandbox, test_dir) = create_test_sandbox();
        fs::write(test_dir.join("exists.txt"), "data").unwrap();
        assert!(sandbox.file_exists("exists.txt").unwrap());
        assert!(!sandbox.file_exists("nonexistent.txt").unwrap());
        cleanup_test_sandbox(&test_dir);
    }

    #[test]
    #[serial]
    fn test_path_traversal_rejected() {
        let (sandbox, test_dir) = create_test_sandbox();
        let result = sandbox.read_file("../../../etc/passwd");
        assert!(matches!(result, Err(SandboxError::PathNotAllowed(_))));
        cleanup_test_sandbox(&test_dir);
    }

    #[test]
    #[serial]
    fn test_absolute_path_rejected() {
        let (sandbox, test_dir) = create_test_sandbox();
        let result = sandbox.read_file("/etc/passwd");
        assert!(matches!(result, Err(SandboxError::PathNotAllowed(_))));
        cleanup_test_sandbox(&test_dir);
    }

    #[test]
    #[serial]
    fn test_write_file_too_large_is_rejected() {
        let (_sandbox, test_dir) = create_test_sandbox();
        let huge = "x".repeat(100);
        let small_sandbox = Sandbox::new(FsConfig {
            allowed_paths: vec![test_dir.clone()],
            max_file_size: 10,
        })
        .unwrap();
        let result = small_sandbox.write_file("big.txt", &huge);
        assert!(matches!(result, Err(SandboxError::FileTooLarge(_))));
        cleanup_test_sandbox(&test_dir);
    }
}
