use crate::library::communication::implementation::kafka::{
    KafkaCommunicationFactory, KafkaConnection,
};
use crate::library::communication::source::ConsumerGroupDescriptor;
use crate::library::communication::CommunicationFactory;
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use jatsl::{Job, JobManager};

/// Structure which can be instantiated with a [`CommunicationFactory`]
pub trait Service<F: CommunicationFactory + Send + Sync> {
    /// Name of the service displayed in log messages
    const NAME: &'static str;
    /// Instance type which will be instantiated
    type Instance: Send + Sync;
    /// Configuration type passed to the service
    type Config: Send + Sync;

    /// Creates a new instance of the service
    ///
    /// Instantiation happens on every (re)start of the surrounding job so a
    /// crashed service gets a fresh set of connections.
    fn instantiate(factory: F, config: &Self::Config) -> Result<Self::Instance, BoxedError>;
}

/// Runner executing a [`Service`] whose instance is a [`Job`] itself
pub struct ServiceRunner<S: Service<KafkaCommunicationFactory>> {
    connection: KafkaConnection,
    group: ConsumerGroupDescriptor,
    config: <S as Service<KafkaCommunicationFactory>>::Config,
}

impl<S> ServiceRunner<S>
where
    S: Service<KafkaCommunicationFactory>,
{
    /// Creates a new runner which connects the service to the given brokers
    /// as a member of the given consumer group
    pub fn new(
        connection: KafkaConnection,
        group: ConsumerGroupDescriptor,
        config: <S as Service<KafkaCommunicationFactory>>::Config,
    ) -> Self {
        Self {
            connection,
            group,
            config,
        }
    }
}

#[async_trait]
impl<S> Job for ServiceRunner<S>
where
    S: Service<KafkaCommunicationFactory> + Send + Sync,
    S::Instance: Job,
{
    const NAME: &'static str = "ServiceRunner";
    const SUPPORTS_GRACEFUL_TERMINATION: bool =
        <S::Instance as Job>::SUPPORTS_GRACEFUL_TERMINATION;

    fn name(&self) -> String {
        format!("{}({})", Self::NAME, S::NAME)
    }

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let factory = KafkaCommunicationFactory::new(self.connection.clone(), self.group.clone());
        let service = S::instantiate(factory, &self.config)?;

        service.execute(manager).await?;

        Ok(())
    }
}
