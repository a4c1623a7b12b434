pub mod course;
pub mod task;
pub mod user;

pub use course::{Course, NewCourse};
pub use task::{NewTask, Task, TaskPatch};
pub use user::User;
