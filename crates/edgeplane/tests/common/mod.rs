use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const RULES: &str = r#"
rules "v2023-01-05" {
    rule "default" {
        is-secure #false
        behavior {
            origin hostname="origin.example.com" http-port=80
        }
        rule "Static Content" {
            criterion {
                file-extension match-operator="IS_ONE_OF" {
                    values "css" "js"
                }
            }
            behavior {
                caching behavior="MAX_AGE" ttl="1d"
            }
        }
    }
}
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }
}
