//! Unit tests for the namespace reconciler
//!
//! Scenario coverage mirrors the behaviors the controller guarantees:
//! legacy-label precedence, open-by-default selector, deletion precedence,
//! idempotent creation, stale-cache tolerance, and terminal handling of bad
//! or dangling keys.

#[cfg(test)]
mod tests {
    use crate::reconciler::{BROKER_CREATED_MESSAGE, BROKER_CREATED_REASON};
    use crate::resources::{default_broker, DEFAULT_BROKER_NAME};
    use crate::selector::{
        LEGACY_INJECTION_DISABLED, LEGACY_INJECTION_ENABLED, LEGACY_INJECTION_LABEL_KEY,
    };
    use crate::test_utils::*;
    use cluster_client::{CreateOutcome, MockCluster};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
    use kube::ResourceExt;

    const TEST_NS: &str = "test-namespace";
    const SOME_LABEL_KEY: &str = "eventing.knative.dev/somekey";
    const SOME_LABEL_VALUE: &str = "someValue";
    const SOME_OTHER_LABEL_VALUE: &str = "someOtherValue";

    fn assert_broker_created(cluster: &MockCluster) {
        let created = cluster.created_brokers();
        assert_eq!(created.len(), 1, "expected exactly one broker create");
        assert_eq!(created[0].name_any(), DEFAULT_BROKER_NAME);
        assert_eq!(created[0].namespace().as_deref(), Some(TEST_NS));

        let events = cluster.events();
        assert_eq!(events.len(), 1, "expected exactly one creation event");
        assert_eq!(events[0].namespace, TEST_NS);
        assert_eq!(events[0].reason, BROKER_CREATED_REASON);
        assert_eq!(events[0].message, BROKER_CREATED_MESSAGE);
    }

    fn assert_no_side_effects(cluster: &MockCluster) {
        assert!(cluster.created_brokers().is_empty(), "expected no broker creates");
        assert!(cluster.events().is_empty(), "expected no events");
    }

    #[tokio::test]
    async fn test_bad_workqueue_key() {
        let cluster = MockCluster::new();
        let (reconciler, _) = test_reconciler(&cluster, Some(LabelSelector::default()));

        let result = reconciler.reconcile("too/many/parts").await;

        assert!(result.is_ok(), "bad keys are terminal, not retried");
        assert_no_side_effects(&cluster);
    }

    #[tokio::test]
    async fn test_key_not_found() {
        let cluster = MockCluster::new();
        let (reconciler, _) = test_reconciler(&cluster, Some(LabelSelector::default()));

        let result = reconciler.reconcile("foo/not-found").await;

        assert!(result.is_ok(), "a vanished namespace is terminal");
        assert_no_side_effects(&cluster);
    }

    #[tokio::test]
    async fn test_unconfigured_selector_creates_nothing() {
        // No selector configured: closed by default
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(TEST_NS, &[]));
        let (reconciler, _) = test_reconciler(&cluster, None);

        reconciler.reconcile(TEST_NS).await.unwrap();

        assert_no_side_effects(&cluster);
    }

    #[tokio::test]
    async fn test_legacy_enabled_wins_over_unconfigured_selector() {
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(
            TEST_NS,
            &[(LEGACY_INJECTION_LABEL_KEY, LEGACY_INJECTION_ENABLED)],
        ));
        let (reconciler, _) = test_reconciler(&cluster, None);

        reconciler.reconcile(TEST_NS).await.unwrap();

        assert_broker_created(&cluster);
    }

    #[tokio::test]
    async fn test_enabled_for_all_namespaces() {
        // Empty selector: open-by-default policy
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(TEST_NS, &[]));
        let (reconciler, _) = test_reconciler(&cluster, Some(LabelSelector::default()));

        reconciler.reconcile(TEST_NS).await.unwrap();

        assert_broker_created(&cluster);
    }

    #[tokio::test]
    async fn test_labelled_namespace_with_matching_selector() {
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(TEST_NS, &[(SOME_LABEL_KEY, SOME_LABEL_VALUE)]));
        let (reconciler, _) =
            test_reconciler(&cluster, Some(selector_in(SOME_LABEL_KEY, &[SOME_LABEL_VALUE])));

        reconciler.reconcile(TEST_NS).await.unwrap();

        assert_broker_created(&cluster);
    }

    #[tokio::test]
    async fn test_legacy_enabled_wins_over_contradicting_selector() {
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(
            TEST_NS,
            &[(LEGACY_INJECTION_LABEL_KEY, LEGACY_INJECTION_ENABLED)],
        ));
        // The selector alone would reject this namespace
        let (reconciler, _) =
            test_reconciler(&cluster, Some(selector_in(SOME_LABEL_KEY, &[SOME_LABEL_VALUE])));

        reconciler.reconcile(TEST_NS).await.unwrap();

        assert_broker_created(&cluster);
    }

    #[tokio::test]
    async fn test_legacy_disabled_wins_over_matching_selector() {
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(
            TEST_NS,
            &[(LEGACY_INJECTION_LABEL_KEY, LEGACY_INJECTION_DISABLED)],
        ));
        // The selector alone would admit this namespace (the key exists)
        let (reconciler, _) = test_reconciler(
            &cluster,
            Some(selector_in(LEGACY_INJECTION_LABEL_KEY, &[LEGACY_INJECTION_DISABLED])),
        );

        reconciler.reconcile(TEST_NS).await.unwrap();

        assert_no_side_effects(&cluster);
    }

    #[tokio::test]
    async fn test_labelled_namespace_with_wrong_value() {
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(
            TEST_NS,
            &[(SOME_LABEL_KEY, SOME_OTHER_LABEL_VALUE)],
        ));
        let (reconciler, _) =
            test_reconciler(&cluster, Some(selector_in(SOME_LABEL_KEY, &[SOME_LABEL_VALUE])));

        let result = reconciler.reconcile(TEST_NS).await;

        assert!(result.is_ok());
        assert_no_side_effects(&cluster);
    }

    #[tokio::test]
    async fn test_deleted_namespace_never_creates() {
        // Deletion precedence beats even an open selector
        let cluster = MockCluster::new();
        cluster.add_namespace(deleted_namespace(TEST_NS));
        let (reconciler, _) = test_reconciler(&cluster, Some(LabelSelector::default()));

        reconciler.reconcile(TEST_NS).await.unwrap();

        assert_no_side_effects(&cluster);
    }

    #[tokio::test]
    async fn test_existing_broker_is_left_alone() {
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(TEST_NS, &[]));
        cluster.add_broker(default_broker(TEST_NS));
        let (reconciler, _) = test_reconciler(&cluster, Some(LabelSelector::default()));

        reconciler.reconcile(TEST_NS).await.unwrap();

        assert_no_side_effects(&cluster);
    }

    #[tokio::test]
    async fn test_no_retraction_when_namespace_stops_matching() {
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(TEST_NS, &[]));
        cluster.add_broker(default_broker(TEST_NS));
        // A selector this namespace does not satisfy
        let (reconciler, _) =
            test_reconciler(&cluster, Some(selector_in(SOME_LABEL_KEY, &[SOME_LABEL_VALUE])));

        reconciler.reconcile(TEST_NS).await.unwrap();

        assert_no_side_effects(&cluster);
        assert!(
            cluster.broker(TEST_NS, DEFAULT_BROKER_NAME).is_some(),
            "previously created broker must survive an un-match"
        );
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(TEST_NS, &[]));
        let (reconciler, _) = test_reconciler(&cluster, Some(LabelSelector::default()));

        reconciler.reconcile(TEST_NS).await.unwrap();
        reconciler.reconcile(TEST_NS).await.unwrap();
        reconciler.reconcile(TEST_NS).await.unwrap();

        // Replays converge: one broker, one event
        assert_broker_created(&cluster);
    }

    #[tokio::test]
    async fn test_already_exists_on_create_is_success() {
        // Stale cache: the lister misses the broker but the API has it
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(TEST_NS, &[]));
        cluster.set_create_outcome(CreateOutcome::AlreadyExists);
        let (reconciler, _) = test_reconciler(&cluster, Some(LabelSelector::default()));

        let result = reconciler.reconcile(TEST_NS).await;

        assert!(result.is_ok(), "losing the create race is success");
        assert_no_side_effects(&cluster);
    }

    #[tokio::test]
    async fn test_conflict_on_create_is_success() {
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(TEST_NS, &[]));
        cluster.set_create_outcome(CreateOutcome::Conflict);
        let (reconciler, _) = test_reconciler(&cluster, Some(LabelSelector::default()));

        let result = reconciler.reconcile(TEST_NS).await;

        assert!(result.is_ok());
        assert_no_side_effects(&cluster);
    }

    #[tokio::test]
    async fn test_transient_create_failure_is_retryable() {
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(TEST_NS, &[]));
        cluster.set_create_outcome(CreateOutcome::Transient);
        let (reconciler, _) = test_reconciler(&cluster, Some(LabelSelector::default()));

        let result = reconciler.reconcile(TEST_NS).await;

        let err = result.unwrap_err();
        assert!(err.is_retryable(), "transient create failures must requeue");
        assert_no_side_effects(&cluster);

        // The retry succeeds once the server recovers, with one event total
        cluster.set_create_outcome(CreateOutcome::Succeed);
        reconciler.reconcile(TEST_NS).await.unwrap();
        assert_broker_created(&cluster);
    }

    #[tokio::test]
    async fn test_selector_config_read_fresh_each_invocation() {
        let cluster = MockCluster::new();
        cluster.add_namespace(test_namespace(TEST_NS, &[]));
        let (reconciler, config) =
            test_reconciler(&cluster, Some(selector_in(SOME_LABEL_KEY, &[SOME_LABEL_VALUE])));

        reconciler.reconcile(TEST_NS).await.unwrap();
        assert_no_side_effects(&cluster);

        // Hot-swap to the open selector; the next invocation must see it
        config.update(crate::config::SugarConfig {
            namespace_selector: Some(LabelSelector::default()),
        });
        reconciler.reconcile(TEST_NS).await.unwrap();

        assert_broker_created(&cluster);
    }
}
