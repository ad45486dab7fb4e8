use crate::TaskError;
use std::future::Future;
use std::pin::Pin;

pub type TaskResult<T> = Result<T, TaskError>;
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = TaskResult<T>> + Send + 'a>>;
