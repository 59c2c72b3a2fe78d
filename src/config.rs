//! Cascading subject configuration.
//!
//! Subjects are defined in JSON files with a single recognized top-level
//! key, `subjects`. Sources cascade lowest to highest precedence: the
//! `mine.json` in the current directory, `~/.mine.json`, then each `-c`
//! path in the order given. A later source overwrites a same-named subject
//! wholesale; subjects unique to earlier sources survive the merge.
//!
//! Missing files are skipped silently. A present-but-malformed source
//! contributes one entry to [`ConfigSet::errors`] and is otherwise ignored,
//! unless every present source is malformed, which is fatal.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{MineError, SourceError};

/// Config file name searched for in the current working directory.
pub const LOCAL_CONFIG_FILE: &str = "mine.json";

/// Config file name searched for in the user's home directory.
pub const HOME_CONFIG_FILE: &str = ".mine.json";

/// A named analysis target with fully resolved paths.
///
/// Constructed once during configuration load and immutable afterwards.
/// Shell-style variable references in path fields are expanded at load
/// time, not at use time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub base_dir: PathBuf,
    pub classpath: String,
    pub lib_dirs: Vec<PathBuf>,
    pub class_dirs: Vec<PathBuf>,
    pub target: PathBuf,
}

/// The merged view of every configuration source.
#[derive(Debug, Default)]
pub struct ConfigSet {
    pub subjects: BTreeMap<String, Subject>,
    /// Non-fatal problems encountered while loading, in source order.
    pub errors: Vec<SourceError>,
}

impl ConfigSet {
    pub fn subject_names(&self) -> Vec<String> {
        self.subjects.keys().cloned().collect()
    }
}

/// On-disk shape of one source. Unknown top-level keys are ignored.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    subjects: BTreeMap<String, RawSubject>,
}

#[derive(Debug, Deserialize)]
struct RawSubject {
    base_dir: String,
    classpath: String,
    #[serde(default)]
    lib_dirs: Vec<String>,
    #[serde(default)]
    class_dirs: Vec<String>,
    target: String,
}

impl RawSubject {
    fn resolve(self, name: &str) -> Result<Subject, String> {
        Ok(Subject {
            name: name.to_string(),
            base_dir: expand_path(&self.base_dir)?,
            classpath: expand(&self.classpath)?,
            lib_dirs: self
                .lib_dirs
                .iter()
                .map(|dir| expand_path(dir))
                .collect::<Result<_, _>>()?,
            class_dirs: self
                .class_dirs
                .iter()
                .map(|dir| expand_path(dir))
                .collect::<Result<_, _>>()?,
            target: expand_path(&self.target)?,
        })
    }
}

fn expand(raw: &str) -> Result<String, String> {
    shellexpand::full(raw)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| format!("cannot expand `{raw}`: {e}"))
}

fn expand_path(raw: &str) -> Result<PathBuf, String> {
    expand(raw).map(PathBuf::from)
}

fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

fn parse_source(contents: &str) -> Result<Vec<Subject>, String> {
    let file: ConfigFile =
        serde_json::from_str(contents).map_err(|e| format!("invalid config: {e}"))?;
    file.subjects
        .into_iter()
        .map(|(name, raw)| raw.resolve(&name))
        .collect()
}

/// Default search locations, lowest precedence first.
fn default_sources() -> Vec<PathBuf> {
    let mut sources = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(home) = dirs::home_dir() {
        sources.push(home.join(HOME_CONFIG_FILE));
    }
    sources
}

/// Load and merge the default sources plus `explicit_paths`, which take
/// precedence by being merged last.
pub fn load(explicit_paths: &[PathBuf]) -> Result<ConfigSet, MineError> {
    let mut sources = default_sources();
    sources.extend(explicit_paths.iter().cloned());
    load_sources(&sources)
}

/// Cascade an explicit list of sources. Exposed for tests that need full
/// control over the search path.
pub fn load_sources(sources: &[PathBuf]) -> Result<ConfigSet, MineError> {
    let mut set = ConfigSet::default();
    let mut present = 0usize;
    let mut usable = 0usize;

    for path in sources {
        let contents = match read_config_file(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}", path.display());
                continue;
            }
            Err(e) => {
                present += 1;
                set.errors.push(SourceError {
                    path: path.clone(),
                    message: format!("cannot read: {e}"),
                });
                continue;
            }
        };
        present += 1;
        match parse_source(&contents) {
            Ok(subjects) => {
                usable += 1;
                log::debug!(
                    "loaded {} subject(s) from {}",
                    subjects.len(),
                    path.display()
                );
                for subject in subjects {
                    set.subjects.insert(subject.name.clone(), subject);
                }
            }
            Err(message) => set.errors.push(SourceError {
                path: path.clone(),
                message,
            }),
        }
    }

    if present > 0 && usable == 0 {
        return Err(MineError::ConfigLoad { errors: set.errors });
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn write_source(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    const SIMPLE: &str = indoc! {r#"
        {
            "subjects": {
                "collections": {
                    "base_dir": "/src/collections",
                    "classpath": "/src/collections/build/classes",
                    "lib_dirs": ["/src/collections/lib"],
                    "class_dirs": ["/src/collections/build/classes"],
                    "target": "/tmp/collections"
                }
            }
        }
    "#};

    #[test]
    fn empty_source_list_yields_empty_set() {
        let set = load_sources(&[]).unwrap();
        assert!(set.subjects.is_empty());
        assert!(set.errors.is_empty());
    }

    #[test]
    fn missing_sources_are_not_errors() {
        let dir = tempfile::tempdir().unwrap();
        let set = load_sources(&[dir.path().join("absent.json")]).unwrap();
        assert!(set.subjects.is_empty());
        assert!(set.errors.is_empty());
    }

    #[test]
    fn later_source_wins_whole_subject() {
        let dir = tempfile::tempdir().unwrap();
        let earlier = write_source(
            dir.path(),
            "a.json",
            indoc! {r#"
                {
                    "subjects": {
                        "shared": {
                            "base_dir": "/old",
                            "classpath": "old.jar",
                            "lib_dirs": ["/old/lib"],
                            "class_dirs": [],
                            "target": "/old/target"
                        },
                        "only-in-a": {
                            "base_dir": "/a",
                            "classpath": "a.jar",
                            "lib_dirs": [],
                            "class_dirs": [],
                            "target": "/a/target"
                        }
                    }
                }
            "#},
        );
        let later = write_source(
            dir.path(),
            "b.json",
            indoc! {r#"
                {
                    "subjects": {
                        "shared": {
                            "base_dir": "/new",
                            "classpath": "new.jar",
                            "lib_dirs": [],
                            "class_dirs": ["/new/classes"],
                            "target": "/new/target"
                        }
                    }
                }
            "#},
        );

        let set = load_sources(&[earlier, later]).unwrap();
        assert_eq!(set.errors, vec![]);

        let shared = &set.subjects["shared"];
        assert_eq!(shared.base_dir, PathBuf::from("/new"));
        assert_eq!(shared.classpath, "new.jar");
        // whole-subject replacement, not field merge
        assert_eq!(shared.lib_dirs, Vec::<PathBuf>::new());
        assert!(set.subjects.contains_key("only-in-a"));
    }

    #[test]
    fn malformed_source_records_one_error_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_source(dir.path(), "bad.json", "{ not json");
        let good = write_source(dir.path(), "good.json", SIMPLE);

        let set = load_sources(&[bad.clone(), good]).unwrap();
        assert_eq!(set.errors.len(), 1);
        assert_eq!(set.errors[0].path, bad);
        assert!(set.subjects.contains_key("collections"));
    }

    #[test]
    fn all_present_sources_malformed_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bad1 = write_source(dir.path(), "one.json", "not json at all");
        let bad2 = write_source(dir.path(), "two.json", "[1, 2, 3");

        let err = load_sources(&[bad1, bad2]).unwrap_err();
        match err {
            MineError::ConfigLoad { errors } => assert_eq!(errors.len(), 2),
            other => panic!("expected ConfigLoad, got {other:?}"),
        }
    }

    #[test]
    fn shell_variables_expand_at_load_time() {
        std::env::set_var("GRAPHMINE_TEST_ROOT", "/opt/proj");
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(
            dir.path(),
            "env.json",
            indoc! {r#"
                {
                    "subjects": {
                        "proj": {
                            "base_dir": "$GRAPHMINE_TEST_ROOT",
                            "classpath": "$GRAPHMINE_TEST_ROOT/classes",
                            "lib_dirs": ["$GRAPHMINE_TEST_ROOT/lib"],
                            "class_dirs": [],
                            "target": "$GRAPHMINE_TEST_ROOT/target"
                        }
                    }
                }
            "#},
        );

        let set = load_sources(&[source]).unwrap();
        let proj = &set.subjects["proj"];
        assert_eq!(proj.base_dir, PathBuf::from("/opt/proj"));
        assert_eq!(proj.classpath, "/opt/proj/classes");
        assert_eq!(proj.lib_dirs, vec![PathBuf::from("/opt/proj/lib")]);
    }

    #[test]
    fn undefined_variable_marks_source_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_source(
            dir.path(),
            "dangling.json",
            indoc! {r#"
                {
                    "subjects": {
                        "proj": {
                            "base_dir": "$GRAPHMINE_TEST_NO_SUCH_VAR",
                            "classpath": "x",
                            "lib_dirs": [],
                            "class_dirs": [],
                            "target": "/t"
                        }
                    }
                }
            "#},
        );
        let good = write_source(dir.path(), "good.json", SIMPLE);

        let set = load_sources(&[bad.clone(), good]).unwrap();
        assert_eq!(set.errors.len(), 1);
        assert_eq!(set.errors[0].path, bad);
        assert!(set.subjects.contains_key("collections"));
        assert!(!set.subjects.contains_key("proj"));
    }
}
