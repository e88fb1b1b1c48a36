//! Declarative graph descriptions loaded from TOML or JSON.
//!
//! ```toml
//! [[users]]
//! name = "host"
//! students = ["alice", "bob"]
//!
//! [[users]]
//! name = "alice"
//!
//! [[users]]
//! name = "bob"
//! site_version = 2
//! ```

use std::path::Path;

use infection_core::{InfectionError, Result, SiteVersion, UserId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::UserGraph;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFixture {
    pub name: String,
    #[serde(default)]
    pub site_version: SiteVersion,
    /// Names of this user's students, in coaching order.
    #[serde(default)]
    pub students: Vec<String>,
}

impl UserFixture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            site_version: SiteVersion::UNTAGGED,
            students: Vec::new(),
        }
    }

    pub fn coaching<I, S>(mut self, students: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.students.extend(students.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFixture {
    #[serde(default)]
    pub users: Vec<UserFixture>,
}

/// A graph built from a fixture plus the name of every user in it.
#[derive(Debug)]
pub struct BuiltGraph {
    pub graph: UserGraph,
    names: FxHashMap<String, UserId>,
    labels: FxHashMap<UserId, String>,
}

impl BuiltGraph {
    pub fn id(&self, name: &str) -> Result<UserId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| InfectionError::invalid_argument(format!("unknown user '{}'", name)))
    }

    pub fn name(&self, id: UserId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    /// Names for `ids`, falling back to the numeric id for unnamed users.
    pub fn names_of(&self, ids: &[UserId]) -> Vec<String> {
        ids.iter()
            .map(|id| {
                self.name(*id)
                    .map(str::to_string)
                    .unwrap_or_else(|| id.to_string())
            })
            .collect()
    }
}

impl GraphFixture {
    /// The sample graph of the original demo page: `host` coaches `student1`
    /// and `student2`; `coach` coaches `student2` and `student3`.
    pub fn demo() -> Self {
        Self {
            users: vec![
                UserFixture::new("host").coaching(["student1", "student2"]),
                UserFixture::new("student1"),
                UserFixture::new("student2"),
                UserFixture::new("student3"),
                UserFixture::new("coach").coaching(["student2", "student3"]),
            ],
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read a fixture, choosing the format by extension (`.json` or TOML).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading graph fixture");
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Build the graph. Users are created in listing order, then edges are
    /// added coach by coach in listing order.
    pub fn build(&self) -> Result<BuiltGraph> {
        let mut graph = UserGraph::new();
        let mut names = FxHashMap::default();
        let mut labels = FxHashMap::default();

        for user in &self.users {
            if names.contains_key(&user.name) {
                return Err(InfectionError::invalid_argument(format!(
                    "duplicate user '{}'",
                    user.name
                )));
            }
            let id = graph.add_default_user();
            graph.set_site_version(id, user.site_version)?;
            names.insert(user.name.clone(), id);
            labels.insert(id, user.name.clone());
        }

        for user in &self.users {
            let coach = names[&user.name];
            for student in &user.students {
                let student_id = names.get(student).copied().ok_or_else(|| {
                    InfectionError::invalid_argument(format!(
                        "'{}' lists unknown student '{}'",
                        user.name, student
                    ))
                })?;
                graph.add_student(coach, student_id)?;
            }
        }

        Ok(BuiltGraph {
            graph,
            names,
            labels,
        })
    }
}
