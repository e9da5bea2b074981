use crate::domain::model::{ContainerStatus, ImageTag};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Registry: Send + Sync {
    /// Every tag published for the repository, in registry order.
    async fn list_tags(&self) -> Result<Vec<ImageTag>>;
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// `Ok(None)` when no container with that name exists.
    async fn inspect(&self, name: &str) -> Result<Option<ContainerStatus>>;
}

#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn up(&self, compose_file: &str) -> Result<()>;
}
