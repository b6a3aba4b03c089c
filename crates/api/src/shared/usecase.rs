use barbershop_booking_infra::BarberContext;
use std::fmt::Debug;
use tracing::error;

/// A single operation of the booking core. Controllers and tests build the
/// use case and hand it to `execute`.
#[async_trait::async_trait(?Send)]
pub trait UseCase: Debug {
    type Response;
    type Error;

    const NAME: &'static str;

    async fn execute(&mut self, ctx: &BarberContext) -> Result<Self::Response, Self::Error>;
}

#[tracing::instrument(name = "Executing usecase", skip(usecase, ctx), fields(usecase = %U::NAME))]
pub async fn execute<U>(mut usecase: U, ctx: &BarberContext) -> Result<U::Response, U::Error>
where
    U: UseCase,
    U::Error: Debug,
{
    let res = usecase.execute(ctx).await;

    if let Err(e) = &res {
        error!("Use case error: {:?}", e);
    }

    res
}
