use erpa_core::action::{AggregateKind, AggregateParams};
use erpa_core::backend::{Backend, BackendRequest, Endpoint};
use erpa_core::error::Result;
use erpa_core::result::{Rendered, format};

use super::{call, require};

/// Runs one of the sales analytics queries.
pub(super) async fn run(
    backend: &dyn Backend,
    kind: AggregateKind,
    params: &AggregateParams,
) -> Result<Rendered> {
    if let Some(required) = kind.required_param() {
        require(params.get(required), required)?;
    }

    let request =
        BackendRequest::new(Endpoint::Aggregate(kind)).with_params(params.to_request(kind));

    let payload = call(backend, request).await?;
    Ok(format::aggregate(kind, &payload))
}
