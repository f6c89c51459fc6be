use serde::Serialize;
use uuid::Uuid;

use super::Result;

pub const ARCHIVE_TASK_NAME: &str = "archiver.update";
pub const ARCHIVE_QUEUE: &str = "priority";

/// A named unit of work handed to the task queue. The queue owns it once sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskPayload {
    pub name: String,
    pub args: Vec<String>,
    pub task_id: String,
    pub queue: String,
}
impl TaskPayload {
    pub fn archive(context: String, resource: String) -> Self {
        Self {
            name: ARCHIVE_TASK_NAME.into(),
            args: vec![context, resource],
            task_id: Uuid::new_v4().to_string(),
            queue: ARCHIVE_QUEUE.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TaskDrivenQueue: Send + Sync {
    async fn send_task(&self, task: &TaskPayload) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_build_archive_task() {
        let task = TaskPayload::archive("{}".into(), "{}".into());

        assert_eq!(task.name, ARCHIVE_TASK_NAME);
        assert_eq!(task.queue, ARCHIVE_QUEUE);
        assert_eq!(task.args.len(), 2);
        assert!(Uuid::parse_str(&task.task_id).is_ok());
    }

    #[test]
    fn it_should_generate_distinct_task_ids() {
        let first = TaskPayload::archive("{}".into(), "{}".into());
        let second = TaskPayload::archive("{}".into(), "{}".into());

        assert_ne!(first.task_id, second.task_id);
    }
}
