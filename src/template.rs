use crate::version::VersionRecord;
use minijinja::{context, Environment};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the generated source file.
pub const TEMPLATE_FILE: &str = "version.rs";

static VERSION_TEMPLATE: &str = r#"// Generated by relic. Do not edit.

pub const VERSION: &str = {{ normalized }};
pub const VERSION_SHORT: &str = {{ short }};
pub const VERSION_LONG: &str = {{ long }};
pub const VERSION_DATE: &str = {{ date }};
pub const VERSION_DIRTY: bool = {{ dirty }};
pub const VERSION_COMMIT: &str = {{ commit }};
pub const VERSION_POST: i64 = {{ post }};
"#;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template error: {0}")]
    Render(#[from] minijinja::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders the record as Rust source.
pub fn render(record: &VersionRecord) -> Result<String, TemplateError> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_template("version", VERSION_TEMPLATE)?;
    //values are pre-quoted as rust string literals
    let out = env.get_template("version")?.render(context!(
        normalized => format!("{:?}", record.normalized),
        short => format!("{:?}", record.short),
        long => format!("{:?}", record.long),
        date => format!("{:?}", record.date),
        dirty => record.dirty,
        commit => format!("{:?}", record.commit),
        post => record.post_number()
    ))?;
    Ok(out)
}

/// Writes `dir/version.rs` and returns its path.
pub fn write_template<P: AsRef<Path>>(
    record: &VersionRecord,
    dir: P,
) -> Result<PathBuf, TemplateError> {
    let path = dir.as_ref().join(TEMPLATE_FILE);
    let source = render(record)?;
    let mut file = File::create(&path)?;
    file.write_all(source.as_bytes())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> VersionRecord {
        VersionRecord {
            normalized: "1.0.0.dev2+gabc".to_string(),
            short: "1.0.0".to_string(),
            long: "v1.0.0-2-gabc".to_string(),
            date: "2016-04-01 12:00:00 -0400".to_string(),
            dirty: true,
            commit: "abc".to_string(),
            post: "2".to_string(),
        }
    }

    #[test]
    fn test_render() {
        let out = render(&record()).unwrap();
        assert!(out.contains(r#"pub const VERSION: &str = "1.0.0.dev2+gabc";"#));
        assert!(out.contains(r#"pub const VERSION_SHORT: &str = "1.0.0";"#));
        assert!(out.contains("pub const VERSION_DIRTY: bool = true;"));
        assert!(out.contains("pub const VERSION_POST: i64 = 2;"));
    }

    #[test]
    fn test_render_fallback() {
        let out = render(&VersionRecord::fallback()).unwrap();
        assert!(out.contains(r#"pub const VERSION_COMMIT: &str = "";"#));
        assert!(out.contains("pub const VERSION_POST: i64 = -1;"));
    }

    #[test]
    fn test_render_escapes_quotes() {
        let mut v = record();
        v.short = "1.0\"beta".to_string();
        let out = render(&v).unwrap();
        assert!(out.contains(r#"pub const VERSION_SHORT: &str = "1.0\"beta";"#));
    }

    #[test]
    fn test_write_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(&record(), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("version.rs"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("// Generated by relic."));
        assert!(text.ends_with("pub const VERSION_POST: i64 = 2;\n"));
    }
}
