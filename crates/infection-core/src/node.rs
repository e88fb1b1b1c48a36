use crate::{SiteVersion, UserId};
use serde::{Deserialize, Serialize};

/// Construction parameters for a new user.
///
/// Defaults: untagged, no students, no coaches. Listed students and coaches
/// must already exist in the graph; the reverse direction of each edge is
/// wired when the user is inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub site_version: SiteVersion,
    #[serde(default)]
    pub students: Vec<UserId>,
    #[serde(default)]
    pub coaches: Vec<UserId>,
}

impl UserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site_version(mut self, site_version: SiteVersion) -> Self {
        self.site_version = site_version;
        self
    }

    pub fn with_students(mut self, students: impl IntoIterator<Item = UserId>) -> Self {
        self.students.extend(students);
        self
    }

    pub fn with_coaches(mut self, coaches: impl IntoIterator<Item = UserId>) -> Self {
        self.coaches.extend(coaches);
        self
    }
}
