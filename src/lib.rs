pub mod cleanup;
pub mod commands;
pub mod config;
pub mod distribute;
pub mod error;
pub mod install;
pub mod pack;
pub mod package;
pub mod runtime;
pub mod scripts;
pub mod sync;
pub mod watch;
pub mod workspace;

/// Shared fixtures for unit tests.
#[cfg(test)]
pub mod test_utils {
    use crate::runtime::ExecOutput;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs;
    use std::path::Path;

    /// Build a gzipped tarball in memory from `(path, content)` pairs.
    pub fn create_tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Captured output of a command that exited with `code`.
    pub fn exec_output(code: i32, stdout: &str) -> ExecOutput {
        ExecOutput {
            code: Some(code),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    /// Create `dir` with a `package.json` holding `manifest`.
    pub fn write_manifest(dir: &Path, manifest: serde_json::Value) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join("package.json"),
            serde_json::to_string_pretty(&manifest).unwrap(),
        )
        .unwrap();
    }
}
