//! Provision a Tor proxy pool and run session workers over it.
//!
//! Needs a Tor SOCKS listener on localhost:9050.

use std::sync::Arc;
use std::time::Duration;
use tor_proxy_pool::{PoolConfig, PoolManager, ProxyValidator, ReqwestTransport, TorProxySource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = PoolConfig::builder()
        .target_count(20)
        .concurrency_limit(10)
        .probe_timeout(Duration::from_secs(15))
        .sessions_per_worker(2)
        .build()?;

    let transport = Arc::new(ReqwestTransport::new(config.probe_timeout));
    let source = TorProxySource::from_config(&config)?;
    let validator = ProxyValidator::from_config(Arc::clone(&transport), &config);
    let manager = PoolManager::new(transport, config);

    println!("Provisioning proxy pool...");
    let report = manager.provision_and_run(&source, &validator).await;

    println!("Run report: {}", report);
    for failure in report.start_failures.iter().chain(&report.close_failures) {
        println!("  {}", failure);
    }

    Ok(())
}
