//! Integration tests for the VM tracking core
//!
//! Drives `Fleet` against a scripted provider. Timer behavior runs on paused
//! tokio time, so delays resolve instantly and deterministically.

mod common;

use common::{vm_id, Call, ScriptedProvider};
use std::sync::Arc;
use std::time::Duration;
use tazvm::resource::{
    Action, DirectoryEvent, Fleet, FleetConfig, FleetError, PowerState, ProviderError, Scope,
    VmDescriptor,
};

const RUNNING: &str = "PowerState/running";
const DEALLOCATED: &str = "PowerState/deallocated";

fn config() -> FleetConfig {
    FleetConfig {
        call_timeout: Duration::from_secs(5),
        recheck_delay: Duration::from_secs(1),
        poll_concurrency: 4,
    }
}

fn fleet_with(provider: &Arc<ScriptedProvider>) -> Fleet {
    Fleet::new(provider.clone(), config())
}

/// Two subscriptions: web-1, web-2 in "prod"; db-1 in "dev"
fn two_subscriptions() -> Arc<ScriptedProvider> {
    let provider = ScriptedProvider::new();
    provider.add_subscription("sub-prod", "Production");
    provider.add_subscription("sub-dev", "Development");
    provider.add_vm("sub-prod", "web-rg", "web-1");
    provider.add_vm("sub-prod", "web-rg", "web-2");
    provider.add_vm("sub-dev", "data-rg", "db-1");
    Arc::new(provider)
}

fn ids(fleet_snapshot: &tazvm::resource::DirectorySnapshot) -> Vec<String> {
    fleet_snapshot.iter().map(|r| r.id.clone()).collect()
}

mod refresh {
    use super::*;

    #[tokio::test]
    async fn test_directory_matches_listing_order() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);

        let count = fleet.refresh(&Scope::All).await.unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            ids(&fleet.all().await),
            vec![
                vm_id("sub-prod", "web-rg", "web-1"),
                vm_id("sub-prod", "web-rg", "web-2"),
                vm_id("sub-dev", "data-rg", "db-1"),
            ]
        );
        let db = fleet.get(&vm_id("sub-dev", "data-rg", "db-1")).await.unwrap();
        assert_eq!(db.subscription_name, "Development");
        assert_eq!(db.resource_group.as_deref(), Some("data-rg"));
        assert_eq!(db.power_state, PowerState::Unknown);
    }

    #[tokio::test]
    async fn test_duplicate_identifiers_keep_first() {
        let provider = two_subscriptions();
        provider.add_descriptor(
            "sub-dev",
            VmDescriptor::new(&vm_id("sub-prod", "web-rg", "web-1"), "web-1"),
        );
        let fleet = fleet_with(&provider);

        assert_eq!(fleet.refresh(&Scope::All).await.unwrap(), 3);
        let snapshot = fleet.all().await;
        assert_eq!(snapshot.get(0).unwrap().subscription_id, "sub-prod");
    }

    #[tokio::test]
    async fn test_scope_by_display_name_or_id() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);

        let count = fleet
            .refresh(&Scope::Subscription("Development".to_string()))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(provider.count(|c| matches!(c, Call::ListVms(_))), 1);

        let count = fleet
            .refresh(&Scope::Subscription("sub-prod".to_string()))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_unknown_subscription_is_rejected() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        let err = fleet
            .refresh(&Scope::Subscription("nope".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, FleetError::UnknownSubscription(ref k) if k == "nope"));
        assert_eq!(fleet.all().await.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_listing_keeps_previous_content() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();
        let before = fleet.all().await;

        provider.fail_listing("sub-dev");
        let err = fleet.refresh(&Scope::All).await.unwrap_err();

        match err {
            FleetError::Enumeration { scope, source } => {
                assert_eq!(scope, "all");
                assert_eq!(source.status(), Some(403));
            },
            other => panic!("unexpected error: {other:?}"),
        }
        let after = fleet.all().await;
        assert_eq!(ids(&after), ids(&before));
        assert_eq!(after.generation, before.generation);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_report_own_count() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);
        fleet.list_subscriptions().await.unwrap();
        let mut events = fleet.subscribe();

        let prod = Scope::Subscription("Production".to_string());
        let dev = Scope::Subscription("Development".to_string());
        let (prod_count, dev_count) = tokio::join!(fleet.refresh(&prod), fleet.refresh(&dev));

        assert_eq!(prod_count.unwrap(), 2);
        assert_eq!(dev_count.unwrap(), 1);

        let mut counts = Vec::new();
        for _ in 0..2 {
            if let DirectoryEvent::Refreshed { count, .. } = events.recv().await.unwrap() {
                counts.push(count);
            }
        }
        counts.sort();
        assert_eq!(counts, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_refresh_publishes_event() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);
        let mut events = fleet.subscribe();

        fleet.refresh(&Scope::All).await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            DirectoryEvent::Refreshed {
                generation: 1,
                count: 3
            }
        );
    }

    #[tokio::test]
    async fn test_subscriptions_are_cached() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        let subs = fleet.subscriptions().await;
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].display_name, "Production");
    }
}

mod polling {
    use super::*;

    #[tokio::test]
    async fn test_poll_updates_state_and_address() {
        let provider = two_subscriptions();
        provider.set_status("web-1", &["ProvisioningState/succeeded", RUNNING]);
        provider.set_status("web-2", &[DEALLOCATED]);
        provider.set_address("web-1", "20.1.2.3");
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        let report = fleet.poll_once().await;

        assert_eq!(report.polled, 3);
        assert_eq!(report.changed, 2);
        assert_eq!(report.failures, 0);
        let web1 = fleet.get(&vm_id("sub-prod", "web-rg", "web-1")).await.unwrap();
        assert_eq!(web1.power_state, PowerState::Running);
        assert_eq!(web1.public_address.as_deref(), Some("20.1.2.3"));
        assert_eq!(
            provider.count(|c| matches!(c, Call::InstanceView { rg, .. } if rg == "web-rg")),
            2
        );
    }

    #[tokio::test]
    async fn test_poll_is_idempotent() {
        let provider = two_subscriptions();
        provider.set_status("web-1", &[RUNNING]);
        provider.set_status("db-1", &[DEALLOCATED]);
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        fleet.poll_once().await;
        let first = fleet.all().await.into_vec();
        let mut events = fleet.subscribe();

        let report = fleet.poll_once().await;

        assert_eq!(report.changed, 0);
        assert_eq!(fleet.all().await.into_vec(), first);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_last_matching_code_wins() {
        let provider = two_subscriptions();
        provider.set_status("web-1", &[RUNNING, DEALLOCATED]);
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        fleet.poll_once().await;

        let web1 = fleet.get(&vm_id("sub-prod", "web-rg", "web-1")).await.unwrap();
        assert_eq!(web1.power_state, PowerState::Stopped);
    }

    #[tokio::test]
    async fn test_failed_lookup_degrades_single_resource() {
        let provider = two_subscriptions();
        provider.set_status("web-1", &[RUNNING]);
        provider.set_status("web-2", &[RUNNING]);
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();
        fleet.poll_once().await;

        provider.fail_instance_view("web-2");
        let report = fleet.poll_once().await;

        assert_eq!(report.failures, 1);
        let snapshot = fleet.all().await;
        assert_eq!(snapshot.get(0).unwrap().power_state, PowerState::Running);
        assert_eq!(snapshot.get(1).unwrap().power_state, PowerState::Unknown);
    }

    #[tokio::test]
    async fn test_malformed_identifier_polls_as_unknown() {
        let provider = two_subscriptions();
        provider.add_descriptor("sub-dev", VmDescriptor::new("/subscriptions/sub-dev/orphan", "orphan"));
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        let report = fleet.poll_once().await;

        assert_eq!(report.failures, 1);
        assert_eq!(
            provider.count(|c| matches!(c, Call::InstanceView { name, .. } if name == "orphan")),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_lookup_counts_as_failure() {
        let provider = two_subscriptions();
        provider.set_status("web-1", &[RUNNING]);
        provider.set_view_delay(Duration::from_secs(60));
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        let report = fleet.poll_once().await;

        assert_eq!(report.failures, 3);
        assert!(fleet.all().await.iter().all(|r| r.power_state == PowerState::Unknown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_results_dropped_after_refresh() {
        let provider = two_subscriptions();
        provider.set_status("web-1", &[RUNNING]);
        provider.set_view_delay(Duration::from_secs(2));
        let fleet = Arc::new(fleet_with(&provider));
        fleet.refresh(&Scope::All).await.unwrap();

        let poll = tokio::spawn({
            let fleet = fleet.clone();
            async move { fleet.poll_once().await }
        });
        tokio::time::sleep(Duration::from_millis(500)).await;
        fleet.refresh(&Scope::All).await.unwrap();

        let report = poll.await.unwrap();

        assert_eq!(report.changed, 0);
        let web1 = fleet.get(&vm_id("sub-prod", "web-rg", "web-1")).await.unwrap();
        assert_eq!(web1.power_state, PowerState::Unknown);
    }

    #[tokio::test]
    async fn test_update_event_per_changed_resource() {
        let provider = two_subscriptions();
        provider.set_status("db-1", &[RUNNING]);
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();
        let mut events = fleet.subscribe();

        fleet.poll_once().await;

        assert_eq!(
            events.recv().await.unwrap(),
            DirectoryEvent::Updated {
                id: vm_id("sub-dev", "data-rg", "db-1")
            }
        );
        assert!(events.try_recv().is_err());
    }
}

mod auto_poll {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_pass_immediate_then_every_interval() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        fleet.start_auto_poll(Duration::from_secs(5)).await;
        assert!(fleet.is_auto_polling().await);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(provider.instance_view_count(), 3);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(provider.instance_view_count(), 6);

        fleet.stop_auto_poll().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_lets_in_flight_pass_finish() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.add_subscription("sub-prod", "Production");
        let id = provider.add_vm("sub-prod", "web-rg", "web-1");
        provider.set_status("web-1", &[RUNNING]);
        provider.set_view_delay(Duration::from_secs(1));
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        fleet.start_auto_poll(Duration::from_secs(5)).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(provider.instance_view_count(), 1);

        fleet.stop_auto_poll().await;
        assert!(!fleet.is_auto_polling().await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fleet.get(&id).await.unwrap().power_state, PowerState::Running);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(provider.instance_view_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_running_loop() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        fleet.start_auto_poll(Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        fleet.start_auto_poll(Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(fleet.is_auto_polling().await);
        // One immediate pass per loop, no more
        assert_eq!(provider.instance_view_count(), 6);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(provider.instance_view_count(), 9);
        fleet.stop_auto_poll().await;
    }
}

mod dispatch {
    use super::*;

    #[tokio::test]
    async fn test_unknown_resource_makes_no_call() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);

        let err = fleet.dispatch(Action::Start, "/subscriptions/x/vm").await.unwrap_err();

        assert!(matches!(err, FleetError::ResourceNotFound(_)));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_then_single_recheck() {
        let provider = two_subscriptions();
        provider.set_status("web-2", &["PowerState/restarting"]);
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();
        provider.clear_calls();
        let id = vm_id("sub-prod", "web-rg", "web-2");

        let receipt = fleet.dispatch(Action::Restart, &id).await.unwrap();

        assert_eq!(receipt.resource_id, id);
        assert_eq!(receipt.resource_name, "web-2");
        assert_eq!(receipt.action, Action::Restart);
        assert_eq!(
            provider.calls(),
            vec![Call::Restart {
                sub: "sub-prod".to_string(),
                rg: "web-rg".to_string(),
                name: "web-2".to_string(),
            }]
        );
        let pending = fleet.pending_commands().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].command_id, receipt.command_id);

        // Nothing polled before the delay
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(provider.instance_view_count(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            provider.count(|c| matches!(c, Call::InstanceView { .. })),
            1
        );
        assert_eq!(
            provider.count(|c| matches!(c, Call::InstanceView { name, .. } if name == "web-2")),
            1
        );
        assert_eq!(
            fleet.get(&id).await.unwrap().power_state,
            PowerState::Transitioning
        );
        assert!(fleet.pending_commands().await.is_empty());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(provider.instance_view_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recheck_of_removed_resource_is_noop() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();
        let id = vm_id("sub-prod", "web-rg", "web-1");

        fleet.dispatch(Action::Start, &id).await.unwrap();
        assert_eq!(fleet.pending_commands().await.len(), 1);

        // Switching scope drops web-1 before its recheck fires
        fleet
            .refresh(&Scope::Subscription("Development".to_string()))
            .await
            .unwrap();
        provider.clear_calls();

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(provider.instance_view_count(), 0);
        assert!(fleet.pending_commands().await.is_empty());
        assert_eq!(
            ids(&fleet.all().await),
            vec![vm_id("sub-dev", "data-rg", "db-1")]
        );
        assert!(matches!(
            fleet.get(&id).await.unwrap_err(),
            FleetError::NotFound(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_issues_deallocate() {
        let provider = two_subscriptions();
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        fleet
            .dispatch(Action::Stop, &vm_id("sub-dev", "data-rg", "db-1"))
            .await
            .unwrap();

        assert_eq!(
            provider.count(|c| matches!(c, Call::Deallocate { name, rg, .. } if name == "db-1" && rg == "data-rg")),
            1
        );
        assert_eq!(provider.count(Call::is_command), 1);
    }

    #[tokio::test]
    async fn test_malformed_identifier_is_rejected() {
        let provider = two_subscriptions();
        provider.add_descriptor("sub-dev", VmDescriptor::new("/subscriptions/sub-dev/orphan", "orphan"));
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        let err = fleet
            .dispatch(Action::Start, "/subscriptions/sub-dev/orphan")
            .await
            .unwrap_err();

        assert!(matches!(err, FleetError::MalformedIdentifier(_)));
        assert_eq!(provider.count(Call::is_command), 0);
    }

    #[tokio::test]
    async fn test_rejected_command_surfaces_provider_error() {
        let provider = two_subscriptions();
        provider.reject_commands();
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();

        let err = fleet
            .dispatch(Action::Start, &vm_id("sub-prod", "web-rg", "web-1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FleetError::Provider(ProviderError::Api { status: 409, .. })
        ));
        assert!(fleet.pending_commands().await.is_empty());
    }
}

mod summary {
    use super::*;

    #[tokio::test]
    async fn test_two_running_one_stopped() {
        let provider = two_subscriptions();
        provider.set_status("web-1", &[RUNNING]);
        provider.set_status("web-2", &[RUNNING]);
        provider.set_status("db-1", &[DEALLOCATED]);
        let fleet = fleet_with(&provider);
        fleet.refresh(&Scope::All).await.unwrap();
        fleet.poll_once().await;

        let summary = fleet.summary().await;

        assert_eq!(summary.total, 3);
        assert_eq!(summary.running, 2);
        assert_eq!(summary.stopped, 1);
        assert_eq!(summary.transitioning, 0);
        assert_eq!(summary.unknown, 0);
        assert_eq!(summary.by_subscription.len(), 2);
        assert_eq!(summary.by_subscription[0].count, 2);
        assert_eq!(summary.status_line(), "Machines: 3 | Running: 2 | Stopped: 1");
    }
}
