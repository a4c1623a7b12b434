pub mod dto;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::models::{Course, NewCourse, NewTask, Task, TaskPatch, User};

/// Token and profile pair handed back by a successful register or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// The remote API, the sole source of truth for all persisted data.
/// Authenticated operations take the bearer token as an argument; the
/// session store owns where that token comes from.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn register(&self, name: &str, email: &str, password: &str)
    -> Result<AuthSession, AppError>;
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError>;

    async fn fetch_courses(&self, token: &str) -> Result<Vec<Course>, AppError>;
    async fn fetch_course(&self, token: &str, id: &str) -> Result<Course, AppError>;
    async fn create_course(&self, token: &str, input: &NewCourse) -> Result<Course, AppError>;
    async fn update_course(&self, token: &str, id: &str, input: &NewCourse)
    -> Result<Course, AppError>;
    async fn delete_course(&self, token: &str, id: &str) -> Result<(), AppError>;

    async fn fetch_tasks(&self, token: &str, course_id: &str) -> Result<Vec<Task>, AppError>;
    async fn create_task(&self, token: &str, input: &NewTask) -> Result<Task, AppError>;
    async fn update_task(&self, token: &str, id: &str, patch: &TaskPatch)
    -> Result<Task, AppError>;
    async fn delete_task(&self, token: &str, id: &str) -> Result<(), AppError>;

    async fn delete_account(&self, token: &str) -> Result<(), AppError>;
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder().build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = check_status(request.send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse gateway response: {}", e);
            e.into()
        })
    }

    async fn send_discard(&self, request: RequestBuilder) -> Result<(), AppError> {
        check_status(request.send().await?).await?;
        Ok(())
    }
}

/// Non-2xx responses carry `{message}`; anything unparseable degrades to a
/// generic failure message.
async fn check_status(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<dto::ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or_else(|_| "Request failed".to_string());
    Err(AppError::Gateway {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        let request = self
            .request(Method::POST, "/api/user/register", None)
            .json(&dto::RegisterRequest {
                name,
                email,
                password,
            });
        let response: dto::AuthResponse = self.send(request).await?;
        let payload = response.into_payload();
        Ok(AuthSession {
            token: payload.token,
            user: payload.user,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let request = self
            .request(Method::POST, "/api/user/login", None)
            .json(&dto::LoginRequest { email, password });
        let response: dto::AuthResponse = self.send(request).await?;
        let payload = response.into_payload();
        Ok(AuthSession {
            token: payload.token,
            user: payload.user,
        })
    }

    async fn fetch_courses(&self, token: &str) -> Result<Vec<Course>, AppError> {
        let request = self.request(Method::GET, "/api/courses", Some(token));
        self.send(request).await
    }

    async fn fetch_course(&self, token: &str, id: &str) -> Result<Course, AppError> {
        let request = self.request(Method::GET, &format!("/api/courses/{}", id), Some(token));
        self.send(request).await
    }

    async fn create_course(&self, token: &str, input: &NewCourse) -> Result<Course, AppError> {
        let request = self
            .request(Method::POST, "/api/courses", Some(token))
            .json(&dto::CoursePayload {
                course_title: &input.title,
                description: &input.description,
            });
        self.send(request).await
    }

    async fn update_course(
        &self,
        token: &str,
        id: &str,
        input: &NewCourse,
    ) -> Result<Course, AppError> {
        let request = self
            .request(Method::PUT, &format!("/api/courses/{}", id), Some(token))
            .json(&dto::CoursePayload {
                course_title: &input.title,
                description: &input.description,
            });
        self.send(request).await
    }

    async fn delete_course(&self, token: &str, id: &str) -> Result<(), AppError> {
        let request = self.request(Method::DELETE, &format!("/api/courses/{}", id), Some(token));
        self.send_discard(request).await
    }

    async fn fetch_tasks(&self, token: &str, course_id: &str) -> Result<Vec<Task>, AppError> {
        let request = self.request(
            Method::GET,
            &format!("/api/tasks/course/{}", course_id),
            Some(token),
        );
        self.send(request).await
    }

    async fn create_task(&self, token: &str, input: &NewTask) -> Result<Task, AppError> {
        let request = self
            .request(Method::POST, "/api/tasks", Some(token))
            .json(&dto::CreateTaskRequest {
                goal: &input.goal,
                deadline: input.deadline,
                course: &input.course_id,
            });
        self.send(request).await
    }

    async fn update_task(
        &self,
        token: &str,
        id: &str,
        patch: &TaskPatch,
    ) -> Result<Task, AppError> {
        let request = self
            .request(Method::PUT, &format!("/api/tasks/{}", id), Some(token))
            .json(&dto::UpdateTaskRequest {
                goal: patch.goal.clone(),
                deadline: patch.deadline,
                completed: patch.completed,
            });
        self.send(request).await
    }

    async fn delete_task(&self, token: &str, id: &str) -> Result<(), AppError> {
        let request = self.request(Method::DELETE, &format!("/api/tasks/{}", id), Some(token));
        self.send_discard(request).await
    }

    async fn delete_account(&self, token: &str) -> Result<(), AppError> {
        let request = self.request(Method::DELETE, "/api/settings/delete", Some(token));
        self.send_discard(request).await
    }
}
