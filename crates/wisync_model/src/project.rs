//! Team projects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A team project as held by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project id.
    pub id: Uuid,
    /// Project name.
    pub name: String,
}

impl Project {
    /// Creates a project with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// Internal view of a team project.
///
/// Keeps only the identity; resolve it back through the store to reach the
/// project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectData {
    /// Project id, as text.
    pub id: String,
    /// Project name.
    pub name: String,
}

impl From<&Project> for ProjectData {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.to_string(),
            name: project.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_data_from_project() {
        let project = Project::new("Fabrikam");
        let data = ProjectData::from(&project);
        assert_eq!(data.name, "Fabrikam");
        assert_eq!(data.id, project.id.to_string());
    }
}
