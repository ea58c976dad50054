use super::*;
use crate::factories::{MemEngine, MemNetwork, MemWantManager};
use blockswap_test_utils::{
    block::create_block_list,
    id::{create_peer_id_list, random_content_id, random_peer_id},
    iter_check,
};
use std::time::Duration;

struct TestCase {
    scope: CancellationToken,
    engine: Arc<MemEngine>,
    want_manager: Arc<MemWantManager>,
    network: Arc<MemNetwork>,
    workers: CoreWorkers,
}

fn setup_test(config: CoreWorkersConfig) -> TestCase {
    let scope = CancellationToken::new();
    let engine = MemEngine::create();
    let want_manager = MemWantManager::create();
    let network = MemNetwork::create();
    let workers = CoreWorkers::spawn(
        config,
        scope.clone(),
        engine.clone(),
        want_manager.clone(),
        network.clone(),
    );
    TestCase {
        scope,
        engine,
        want_manager,
        network,
        workers,
    }
}

#[test]
fn default_config_round_trip() {
    let factory = CoreWorkersFactory::create();
    let mut config = Config::default();
    factory.default_config(&mut config).unwrap();
    factory.validate_config(&config).unwrap();

    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(8, json["coreWorkers"]["taskWorkerCount"]);
    assert_eq!(60_000, json["coreWorkers"]["defaultRebroadcastIntervalMs"]);
    assert_eq!(10_000, json["coreWorkers"]["providerRequestTimeoutMs"]);
    assert_eq!(3, json["coreWorkers"]["maxProvidersPerRequest"]);
    assert_eq!(0, json["coreWorkers"]["maxConcurrentConnects"]);
    assert_eq!(32, json["coreWorkers"]["intakeQueueSize"]);
}

#[test]
fn partial_config_takes_defaults() {
    let config: Config = serde_json::from_str(
        r#"{ "coreWorkers": { "taskWorkerCount": 2 } }"#,
    )
    .unwrap();
    let config: CoreWorkersModConfig = config.get_module_config().unwrap();
    assert_eq!(2, config.core_workers.task_worker_count);
    assert_eq!(3, config.core_workers.max_providers_per_request);
    assert_eq!(
        Duration::from_secs(10),
        config.core_workers.provider_request_timeout()
    );
}

#[test]
fn zero_values_are_rejected() {
    let factory = CoreWorkersFactory::create();
    for bad in [
        r#"{ "coreWorkers": { "taskWorkerCount": 0 } }"#,
        r#"{ "coreWorkers": { "providerRequestTimeoutMs": 0 } }"#,
        r#"{ "coreWorkers": { "defaultRebroadcastIntervalMs": 0 } }"#,
        r#"{ "coreWorkers": { "maxProvidersPerRequest": 0 } }"#,
        r#"{ "coreWorkers": { "intakeQueueSize": 0 } }"#,
    ] {
        let config: Config = serde_json::from_str(bad).unwrap();
        assert!(factory.validate_config(&config).is_err(), "{bad}");
    }

    // zero concurrent connects means unbounded
    let config: Config = serde_json::from_str(
        r#"{ "coreWorkers": { "maxConcurrentConnects": 0 } }"#,
    )
    .unwrap();
    factory.validate_config(&config).unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn hundred_units_across_five_peers_are_sent_once() {
    let TestCase {
        engine,
        want_manager,
        workers,
        ..
    } = setup_test(CoreWorkersConfig::default());

    let peers = create_peer_id_list(5);
    let blocks = create_block_list(100, 64);
    let total_bytes = blocks.iter().map(|b| b.len() as u64).sum::<u64>();

    let mut expected = Vec::new();
    for (i, block) in blocks.into_iter().enumerate() {
        let unit = DeliveryUnit::new(peers[i % peers.len()].clone(), block);
        expected.push(unit.clone());
        assert!(engine.publish(unit));
    }

    iter_check!(5000, {
        if workers.stat().blocks_sent == 100 {
            break;
        }
    });

    assert_eq!(
        Stat {
            blocks_sent: 100,
            data_sent: total_bytes,
        },
        workers.stat()
    );

    let mut sent = want_manager.sent();
    assert_eq!(100, sent.len());
    for unit in expected.iter() {
        let pos = sent.iter().position(|s| s == unit).unwrap();
        sent.swap_remove(pos);
    }
    assert!(sent.is_empty());

    for peer in peers.iter() {
        assert_eq!(20, engine.ledger(peer).blocks);
    }

    workers.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_every_worker() {
    let TestCase {
        want_manager,
        network,
        workers,
        ..
    } = setup_test(CoreWorkersConfig {
        default_rebroadcast_interval_ms: 1000,
        ..Default::default()
    });

    // keep a discovery in flight and the rebroadcast busy
    network.set_hold_lookups_open(true);
    want_manager.want(random_content_id(), 1);
    iter_check!(5000, {
        if workers.active_discovery_count() == 1 {
            break;
        }
    });

    tokio::time::timeout(Duration::from_millis(100), workers.shutdown())
        .await
        .unwrap();
    assert_eq!(0, workers.active_discovery_count());
}

#[tokio::test(start_paused = true)]
async fn external_scope_cancel_stops_workers() {
    let TestCase {
        scope,
        workers,
        ..
    } = setup_test(CoreWorkersConfig::default());

    scope.cancel();
    // every task exits on its own, shutdown only joins them
    tokio::time::timeout(Duration::from_millis(100), workers.shutdown())
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn rebroadcast_discovers_and_coalesces() {
    let TestCase {
        want_manager,
        network,
        workers,
        ..
    } = setup_test(CoreWorkersConfig {
        default_rebroadcast_interval_ms: 1000,
        ..Default::default()
    });

    let key = random_content_id();
    let provider = random_peer_id();
    want_manager.want(key.clone(), 1);
    network.add_provider(key.clone(), provider.clone());
    network.set_hold_lookups_open(true);

    iter_check!(5000, {
        if !network.lookups().is_empty() {
            break;
        }
    });
    assert_eq!(vec![key.clone()], network.lookups());

    // resubmitting the key while its discovery runs starts nothing new
    workers
        .find_providers(key.clone(), CancellationToken::new())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(vec![key.clone()], network.lookups());
    assert_eq!(1, network.max_running_lookups(&key));
    assert_eq!(1, workers.active_discovery_count());
    assert_eq!(vec![provider], network.connected());

    // after the request timeout the key is released and rediscovered
    iter_check!(20_000, {
        if network.lookups().len() >= 2 {
            break;
        }
    });
    assert!(network.lookups().iter().all(|k| k == &key));
    assert_eq!(1, network.max_running_lookups(&key));

    workers.shutdown().await;
}

#[tokio::test]
async fn factory_creates_running_workers() {
    let mut config = Config::default();
    let factory = CoreWorkersFactory::create();
    factory.default_config(&mut config).unwrap();

    let engine = MemEngine::create();
    let workers = factory
        .create(
            &config,
            CancellationToken::new(),
            engine.clone(),
            MemWantManager::create(),
            MemNetwork::create(),
        )
        .unwrap();

    let peer = random_peer_id();
    let block = create_block_list(1, 10).remove(0);
    engine.publish(DeliveryUnit::new(peer, block.clone()));
    iter_check!({
        if workers.stat().blocks_sent == 1 {
            break;
        }
    });
    assert_eq!(block.len() as u64, workers.stat().data_sent);

    workers.shutdown().await;
}

#[tokio::test]
async fn find_providers_reports_closed_intake() {
    let TestCase { workers, .. } = setup_test(CoreWorkersConfig::default());
    workers.shutdown().await;

    // the manager is gone, its intake receiver with it
    assert!(workers
        .find_providers(random_content_id(), CancellationToken::new())
        .await
        .is_err());
}
