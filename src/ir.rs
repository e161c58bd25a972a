use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Available,
    Pending,
    Scheduled,
    Retryable,
    #[serde(alias = "executing")]
    Running,
    Cancelled,
    Discarded,
    Completed,
}

/// Readiness of a dependency edge as seen by the dependent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    Blocked,
    Unblocked,
    Failed,
}

impl DependencyStatus {
    pub fn from_source(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Completed => Self::Unblocked,
            TaskStatus::Cancelled | TaskStatus::Discarded => Self::Failed,
            _ => Self::Blocked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "deserialize_task_id")]
    pub id: String,
    pub task_name: String,
    #[serde(default, alias = "deps")]
    pub dependency_names: Option<Vec<String>>,
    pub status: TaskStatus,
}

impl Task {
    pub fn new(id: impl Into<String>, task_name: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            task_name: task_name.into(),
            dependency_names: None,
            status,
        }
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependency_names = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    pub fn deps(&self) -> &[String] {
        self.dependency_names.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TaskDocument {
    List(Vec<Task>),
    Wrapped { tasks: Vec<Task> },
}

/// Accepts either a bare JSON array of tasks or `{ "tasks": [...] }`.
pub fn parse_tasks(contents: &str) -> crate::error::Result<Vec<Task>> {
    let document: TaskDocument = serde_json::from_str(contents)?;
    Ok(match document {
        TaskDocument::List(tasks) | TaskDocument::Wrapped { tasks } => tasks,
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Integer(i64),
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn into_id(self) -> String {
        match self {
            NumberOrString::Integer(val) => val.to_string(),
            NumberOrString::Number(val) => format!("{}", val),
            NumberOrString::String(val) => val,
        }
    }
}

fn deserialize_task_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer).map(NumberOrString::into_id)
}
