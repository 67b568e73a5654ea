//! Integration tests for error types

#[cfg(test)]
mod tests {
    use pkgmend_errors::*;

    #[test]
    fn test_error_conversion() {
        let repair = RepairError::NoProgress { round: 3 };
        let err: Error = repair.into();
        assert!(matches!(err, Error::Repair(_)));
    }

    #[test]
    fn test_error_display() {
        let err = RepairError::RoundCapExceeded { rounds: 20 };
        assert_eq!(err.to_string(), "round cap exceeded after 20 rounds");

        let err = RepairError::UnresolvedSignature {
            signatures: vec!["foo".into(), "bar".into()],
        };
        assert_eq!(err.to_string(), "unresolved failure signatures: foo, bar");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(RepairError::BlacklistedMiss {
            target: "hal".into()
        }
        .is_fatal());
        assert!(RepairError::EnvironmentFailure {
            message: "no mock".into()
        }
        .is_fatal());
        assert!(!RepairError::NoProgress { round: 1 }.is_fatal());
        assert!(!RepairError::RoundCapExceeded { rounds: 20 }.is_fatal());
    }

    #[test]
    fn test_user_codes() {
        let err: Error = BuildError::TranscriptMissing {
            path: "/tmp/results/build.log".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("build.transcript_missing"));
        assert!(err.user_hint().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err = Error::io_with_path(&io_err, "/opt/buildroot");
        match err {
            Error::Io { kind, path, .. } => {
                assert_eq!(kind, std::io::ErrorKind::PermissionDenied);
                assert_eq!(path.as_deref(), Some(std::path::Path::new("/opt/buildroot")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
