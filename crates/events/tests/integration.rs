//! Integration tests for the event channel

#[cfg(test)]
mod tests {
    use pkgmend_events::*;
    use pkgmend_types::{Dependency, FixAction};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_emit_through_sender() {
        let (tx, mut rx) = channel();
        tx.emit_warning_with_context("configure probe for blacklisted target answered no", "python2");

        match rx.recv().await {
            Some(AppEvent::General(GeneralEvent::Warning { message, context })) => {
                assert_eq!(message, "configure probe for blacklisted target answered no");
                assert_eq!(context.as_deref(), Some("python2"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_step_failure_is_a_warning() {
        let (tx, mut rx) = channel();
        tx.emit_step_failed("whatrequires", "query timed out");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.log_level(), tracing::Level::WARN);
        match event {
            AppEvent::General(GeneralEvent::StepFailed { step, error }) => {
                assert_eq!(step, "whatrequires");
                assert_eq!(error, "query timed out");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_missing_sender_is_silent() {
        let none: Option<EventSender> = None;
        none.emit_step_failed("configure_misses", "dropped");
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (tx, rx) = channel();
        drop(rx);
        tx.emit_warning_with_context("nobody listening", "test");
    }

    #[test]
    fn test_log_levels() {
        let session_id = Uuid::new_v4();
        let fix = AppEvent::Repair(RepairEvent::FixApplied {
            session_id,
            round: 1,
            fix: FixAction::AddBuildRequire {
                dependency: Dependency::bare("zlib-devel"),
            },
        });
        assert_eq!(fix.log_level(), tracing::Level::DEBUG);

        let unresolved = AppEvent::Repair(RepairEvent::SignatureUnresolved {
            session_id,
            round: 1,
            signature: "libfoo".into(),
        });
        assert_eq!(unresolved.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_event_json_shape() {
        let event = AppEvent::Repair(RepairEvent::RoundStarted {
            session_id: Uuid::nil(),
            round: 2,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "repair");
        assert_eq!(json["event"]["type"], "RoundStarted");
        assert_eq!(json["event"]["round"], 2);
    }
}
