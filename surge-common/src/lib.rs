pub mod codec;
pub mod config;
pub mod error;
pub mod logs;
pub mod resource;

pub type BoxFuture<T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send>>;
