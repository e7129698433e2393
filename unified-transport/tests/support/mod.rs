use in_memory_services::InMemoryCloud;
use std::sync::Arc;
use unified_transport::{TransportOptions, UnifiedTransport};

#[allow(dead_code)]
pub(crate) fn cloud() -> Arc<InMemoryCloud> {
    Arc::new(InMemoryCloud::new())
}

#[allow(dead_code)]
pub(crate) fn options_with_checks_disabled(disabled: bool) -> TransportOptions {
    TransportOptions {
        disable_access_policy_checks: disabled,
        ..TransportOptions::default()
    }
}

/// Builds and initializes a transport reading from `input`.
#[allow(dead_code)]
pub(crate) async fn transport(
    cloud: &Arc<InMemoryCloud>,
    input: Option<&str>,
    options: TransportOptions,
) -> UnifiedTransport {
    let transport = UnifiedTransport::new(input, options, cloud.clone(), cloud.clone())
        .expect("transport creation should succeed");
    transport
        .initialize()
        .await
        .expect("transport initialization should succeed");
    transport
}

#[allow(dead_code)]
pub(crate) async fn default_transport(
    cloud: &Arc<InMemoryCloud>,
    input: Option<&str>,
) -> UnifiedTransport {
    transport(cloud, input, TransportOptions::default()).await
}
