use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AppError, require_field};
use crate::gateway::ApiGateway;
use crate::models::{Course, NewCourse, NewTask, Task, TaskPatch};

/// Local copy of the user's course collection. Reconciliation is
/// fetch-then-replace: after a create or update the whole collection is
/// re-fetched, so dashboard counters catch up to server truth on the next
/// refresh rather than in real time.
pub struct CourseCache {
    gateway: Arc<dyn ApiGateway>,
    token: String,
    courses: Vec<Course>,
}

impl CourseCache {
    pub fn new(gateway: Arc<dyn ApiGateway>, token: impl Into<String>) -> Self {
        Self {
            gateway,
            token: token.into(),
            courses: Vec::new(),
        }
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// Replaces the local collection wholesale with server truth.
    pub async fn refresh(&mut self) -> Result<(), AppError> {
        self.courses = self.gateway.fetch_courses(&self.token).await?;
        Ok(())
    }

    pub async fn create(&mut self, input: NewCourse) -> Result<(), AppError> {
        require_field("title", &input.title)?;
        self.gateway.create_course(&self.token, &input).await?;
        self.refresh().await
    }

    pub async fn update(&mut self, id: &str, input: NewCourse) -> Result<(), AppError> {
        require_field("title", &input.title)?;
        self.gateway.update_course(&self.token, id, &input).await?;
        self.refresh().await
    }

    /// Drops the entry locally after the gateway confirms; no re-fetch.
    pub async fn remove(&mut self, id: &str) -> Result<(), AppError> {
        self.gateway.delete_course(&self.token, id).await?;
        self.courses.retain(|c| c.id != id);
        Ok(())
    }
}

/// Local copy of one course's task list.
pub struct TaskCache {
    gateway: Arc<dyn ApiGateway>,
    token: String,
    course_id: String,
    tasks: Vec<Task>,
}

impl TaskCache {
    pub fn new(
        gateway: Arc<dyn ApiGateway>,
        token: impl Into<String>,
        course_id: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            token: token.into(),
            course_id: course_id.into(),
            tasks: Vec::new(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub async fn refresh(&mut self) -> Result<(), AppError> {
        self.tasks = self
            .gateway
            .fetch_tasks(&self.token, &self.course_id)
            .await?;
        Ok(())
    }

    pub async fn create(&mut self, goal: &str, deadline: DateTime<Utc>) -> Result<(), AppError> {
        require_field("goal", goal)?;
        let input = NewTask {
            goal: goal.to_string(),
            deadline,
            course_id: self.course_id.clone(),
        };
        self.gateway.create_task(&self.token, &input).await?;
        self.refresh().await
    }

    /// Toggles completion. The local entry is patched by id only after the
    /// gateway confirms, so a failed write leaves the collection unchanged
    /// and no rollback path is needed.
    pub async fn set_completed(&mut self, id: &str, completed: bool) -> Result<(), AppError> {
        let patch = TaskPatch {
            completed: Some(completed),
            ..TaskPatch::default()
        };
        self.gateway.update_task(&self.token, id, &patch).await?;
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.completed = completed;
        }
        Ok(())
    }

    pub async fn remove(&mut self, id: &str) -> Result<(), AppError> {
        self.gateway.delete_task(&self.token, id).await?;
        self.tasks.retain(|t| t.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::gateway::AuthSession;
    use crate::models::User;

    /// In-memory stand-in for the remote gateway.
    #[derive(Default)]
    struct FakeGateway {
        courses: Mutex<Vec<Course>>,
        tasks: Mutex<Vec<Task>>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeGateway {
        fn failing(&self) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::Gateway {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ApiGateway for FakeGateway {
        async fn register(
            &self,
            name: &str,
            email: &str,
            _password: &str,
        ) -> Result<AuthSession, AppError> {
            self.failing()?;
            Ok(AuthSession {
                token: "fake-token".to_string(),
                user: User {
                    id: "u1".to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                },
            })
        }

        async fn login(&self, email: &str, _password: &str) -> Result<AuthSession, AppError> {
            self.failing()?;
            Ok(AuthSession {
                token: "fake-token".to_string(),
                user: User {
                    id: "u1".to_string(),
                    name: "Fake".to_string(),
                    email: email.to_string(),
                },
            })
        }

        async fn fetch_courses(&self, _token: &str) -> Result<Vec<Course>, AppError> {
            self.failing()?;
            Ok(self.courses.lock().unwrap().clone())
        }

        async fn fetch_course(&self, _token: &str, id: &str) -> Result<Course, AppError> {
            self.failing()?;
            self.courses
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or(AppError::Gateway {
                    status: 404,
                    message: "Course not found".to_string(),
                })
        }

        async fn create_course(&self, _token: &str, input: &NewCourse) -> Result<Course, AppError> {
            self.failing()?;
            let course = Course {
                id: format!("c{}", self.courses.lock().unwrap().len() + 1),
                title: input.title.clone(),
                description: input.description.clone(),
                task_count: 0,
                completed_tasks: 0,
            };
            self.courses.lock().unwrap().push(course.clone());
            Ok(course)
        }

        async fn update_course(
            &self,
            _token: &str,
            id: &str,
            input: &NewCourse,
        ) -> Result<Course, AppError> {
            self.failing()?;
            let mut courses = self.courses.lock().unwrap();
            let course = courses
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(AppError::Gateway {
                    status: 404,
                    message: "Course not found".to_string(),
                })?;
            course.title = input.title.clone();
            course.description = input.description.clone();
            Ok(course.clone())
        }

        async fn delete_course(&self, _token: &str, id: &str) -> Result<(), AppError> {
            self.failing()?;
            self.courses.lock().unwrap().retain(|c| c.id != id);
            Ok(())
        }

        async fn fetch_tasks(&self, _token: &str, course_id: &str) -> Result<Vec<Task>, AppError> {
            self.failing()?;
            Ok(self
                .tasks
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.course_id == course_id)
                .cloned()
                .collect())
        }

        async fn create_task(&self, _token: &str, input: &NewTask) -> Result<Task, AppError> {
            self.failing()?;
            let task = Task {
                id: format!("t{}", self.tasks.lock().unwrap().len() + 1),
                goal: input.goal.clone(),
                deadline: input.deadline,
                completed: false,
                course_id: input.course_id.clone(),
            };
            self.tasks.lock().unwrap().push(task.clone());
            Ok(task)
        }

        async fn update_task(
            &self,
            _token: &str,
            id: &str,
            patch: &TaskPatch,
        ) -> Result<Task, AppError> {
            self.failing()?;
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(AppError::Gateway {
                    status: 404,
                    message: "Task not found".to_string(),
                })?;
            if let Some(goal) = &patch.goal {
                task.goal = goal.clone();
            }
            if let Some(deadline) = patch.deadline {
                task.deadline = deadline;
            }
            if let Some(completed) = patch.completed {
                task.completed = completed;
            }
            Ok(task.clone())
        }

        async fn delete_task(&self, _token: &str, id: &str) -> Result<(), AppError> {
            self.failing()?;
            self.tasks.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }

        async fn delete_account(&self, _token: &str) -> Result<(), AppError> {
            self.failing()
        }
    }

    fn gateway_with_tasks(tasks: Vec<Task>) -> Arc<FakeGateway> {
        let gateway = FakeGateway::default();
        *gateway.tasks.lock().unwrap() = tasks;
        Arc::new(gateway)
    }

    fn task(id: &str, goal: &str, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            goal: goal.to_string(),
            deadline: Utc::now(),
            completed,
            course_id: "c1".to_string(),
        }
    }

    #[tokio::test]
    async fn refresh_replaces_collection_wholesale() {
        let gateway = gateway_with_tasks(vec![task("t1", "read ch. 3", false)]);
        let mut cache = TaskCache::new(gateway.clone(), "tok", "c1");
        cache.refresh().await.unwrap();
        assert_eq!(cache.tasks().len(), 1);

        *gateway.tasks.lock().unwrap() = vec![
            task("t2", "problem set", false),
            task("t3", "flashcards", true),
        ];
        cache.refresh().await.unwrap();
        let ids: Vec<&str> = cache.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["t2", "t3"]);
    }

    #[tokio::test]
    async fn toggle_patches_only_the_matching_entry() {
        let gateway = gateway_with_tasks(vec![
            task("t1", "read ch. 3", false),
            task("t2", "problem set", false),
        ]);
        let mut cache = TaskCache::new(gateway, "tok", "c1");
        cache.refresh().await.unwrap();

        cache.set_completed("t1", true).await.unwrap();

        assert!(cache.tasks()[0].completed);
        assert!(!cache.tasks()[1].completed);
        assert_eq!(cache.tasks()[1].goal, "problem set");
    }

    #[tokio::test]
    async fn failed_toggle_leaves_collection_unchanged() {
        let gateway = gateway_with_tasks(vec![task("t1", "read ch. 3", false)]);
        let mut cache = TaskCache::new(gateway.clone(), "tok", "c1");
        cache.refresh().await.unwrap();

        gateway.fail.store(true, Ordering::SeqCst);
        let err = cache.set_completed("t1", true).await.unwrap_err();
        assert!(matches!(err, AppError::Gateway { status: 500, .. }));
        assert!(!cache.tasks()[0].completed);
    }

    #[tokio::test]
    async fn remove_matches_the_full_id_not_a_prefix() {
        let gateway = gateway_with_tasks(vec![
            task("task-1", "read ch. 3", false),
            task("task-10", "problem set", false),
        ]);
        let mut cache = TaskCache::new(gateway, "tok", "c1");
        cache.refresh().await.unwrap();

        cache.remove("task-1").await.unwrap();

        assert_eq!(cache.tasks().len(), 1);
        assert_eq!(cache.tasks()[0].id, "task-10");
    }

    #[tokio::test]
    async fn create_reconciles_by_refetching() {
        let gateway = Arc::new(FakeGateway::default());
        let mut cache = TaskCache::new(gateway, "tok", "c1");
        cache.refresh().await.unwrap();

        cache.create("read ch. 3", Utc::now()).await.unwrap();

        assert_eq!(cache.tasks().len(), 1);
        assert_eq!(cache.tasks()[0].goal, "read ch. 3");
    }

    #[tokio::test]
    async fn empty_goal_is_rejected_before_any_network_call() {
        let gateway = Arc::new(FakeGateway::default());
        let mut cache = TaskCache::new(gateway.clone(), "tok", "c1");

        let err = cache.create("  ", Utc::now()).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn course_create_refetches_and_keeps_ids_unique() {
        let gateway = Arc::new(FakeGateway::default());
        let mut cache = CourseCache::new(gateway, "tok");
        cache.refresh().await.unwrap();

        cache
            .create(NewCourse {
                title: "MTH 201".to_string(),
                description: "Linear algebra".to_string(),
            })
            .await
            .unwrap();
        cache
            .create(NewCourse {
                title: "PHY 101".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();

        let mut ids: Vec<&str> = cache.courses().iter().map(|c| c.id.as_str()).collect();
        let before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before);
        assert_eq!(cache.courses().len(), 2);
    }

    #[tokio::test]
    async fn course_remove_drops_exactly_one_entry_without_refetch() {
        let gateway = Arc::new(FakeGateway::default());
        let mut cache = CourseCache::new(gateway, "tok");
        cache
            .create(NewCourse {
                title: "MTH 201".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        cache
            .create(NewCourse {
                title: "PHY 101".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();

        cache.remove("c1").await.unwrap();

        assert_eq!(cache.courses().len(), 1);
        assert_eq!(cache.courses()[0].id, "c2");
    }
}
