//! Bounded optimistic read-modify-write loop
//!
//! Backends with external concurrent writers (git pushes racing from other
//! builds, conditional PUTs) expose their primitives through
//! [`OptimisticStore`]; the loop here is the system's only concurrency
//! mechanism. Each attempt re-reads authoritative state, so nothing carries
//! over between iterations except the snapshot the store itself re-reads.

use semvault_core::{Bump, Version};
use tracing::{debug, warn};

use crate::error::{DriverError, Result};

/// Total write attempts before a conflict is surfaced to the caller.
pub(crate) const MAX_BUMP_ATTEMPTS: u32 = 3;

/// Read/write primitives for a backend that can detect write conflicts.
#[async_trait::async_trait]
pub(crate) trait OptimisticStore: Send {
    /// Refresh the local view and read the stored version, `None` when no
    /// version exists yet.
    async fn load(&mut self) -> Result<Option<Version>>;

    /// Attempt to persist `version` against the state observed by the last
    /// `load`. Returns `DriverError::Conflict` when the backend detects a
    /// concurrent writer; any other error is fatal.
    async fn store(&mut self, version: &Version) -> Result<()>;
}

/// Apply `bump` to the stored version (falling back to `initial`) and
/// persist the result, retrying conflicts against freshly re-read state.
pub(crate) async fn bump_with_retry(
    store: &mut dyn OptimisticStore,
    initial: &Version,
    bump: &Bump,
) -> Result<Version> {
    let mut last_conflict = None;

    for attempt in 1..=MAX_BUMP_ATTEMPTS {
        let current = store.load().await?.unwrap_or_else(|| initial.clone());
        let next = bump.apply(&current);
        debug!(%current, %next, attempt, "attempting version write");

        match store.store(&next).await {
            Ok(()) => return Ok(next),
            Err(err) if err.is_conflict() => {
                warn!(attempt, %err, "write conflicted, re-reading");
                last_conflict = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_conflict.unwrap_or_else(|| {
        DriverError::Conflict("no write attempts were made".to_string())
    }))
}

/// Persist an exact version, retrying conflicts. Used by drivers whose plain
/// write can still race a concurrent writer (a rejected push); the version
/// written never changes between attempts, only the base state does.
pub(crate) async fn set_with_retry(
    store: &mut dyn OptimisticStore,
    version: &Version,
) -> Result<()> {
    let mut last_conflict = None;

    for attempt in 1..=MAX_BUMP_ATTEMPTS {
        store.load().await?;

        match store.store(version).await {
            Ok(()) => return Ok(()),
            Err(err) if err.is_conflict() => {
                warn!(attempt, %err, "write conflicted, re-reading");
                last_conflict = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_conflict.unwrap_or_else(|| {
        DriverError::Conflict("no write attempts were made".to_string())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A scripted store: a sequence of observed versions and per-attempt
    /// write outcomes.
    struct ScriptedStore {
        reads: Vec<Option<&'static str>>,
        write_results: Vec<std::result::Result<(), &'static str>>,
        writes: Vec<Version>,
        loads: usize,
    }

    impl ScriptedStore {
        fn new(
            reads: Vec<Option<&'static str>>,
            write_results: Vec<std::result::Result<(), &'static str>>,
        ) -> Self {
            Self {
                reads,
                write_results,
                writes: Vec::new(),
                loads: 0,
            }
        }
    }

    #[async_trait::async_trait]
    impl OptimisticStore for ScriptedStore {
        async fn load(&mut self) -> Result<Option<Version>> {
            let raw = self.reads.remove(0);
            self.loads += 1;
            Ok(raw.map(|s| Version::parse(s).unwrap()))
        }

        async fn store(&mut self, version: &Version) -> Result<()> {
            self.writes.push(version.clone());
            match self.write_results.remove(0) {
                Ok(()) => Ok(()),
                Err(msg) => Err(DriverError::Conflict(msg.to_string())),
            }
        }
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[tokio::test]
    async fn succeeds_first_attempt() {
        let mut store = ScriptedStore::new(vec![Some("1.2.3")], vec![Ok(())]);
        let result = bump_with_retry(&mut store, &v("0.0.0"), &Bump::Minor)
            .await
            .unwrap();
        assert_eq!(result.to_string(), "1.3.0");
        assert_eq!(store.writes, vec![v("1.3.0")]);
    }

    #[tokio::test]
    async fn missing_version_falls_back_to_initial() {
        let mut store = ScriptedStore::new(vec![None], vec![Ok(())]);
        let result = bump_with_retry(&mut store, &v("0.5.0"), &Bump::Patch)
            .await
            .unwrap();
        assert_eq!(result.to_string(), "0.5.1");
    }

    #[tokio::test]
    async fn conflict_retries_against_latest_read() {
        // Two racing writers land 1.2.4 and 1.2.5 under us; the third
        // attempt must bump the freshest state, not the stale first read.
        let mut store = ScriptedStore::new(
            vec![Some("1.2.3"), Some("1.2.4"), Some("1.2.5")],
            vec![Err("rejected"), Err("rejected"), Ok(())],
        );
        let result = bump_with_retry(&mut store, &v("0.0.0"), &Bump::Patch)
            .await
            .unwrap();
        assert_eq!(result.to_string(), "1.2.6");
        assert_eq!(store.writes, vec![v("1.2.4"), v("1.2.5"), v("1.2.6")]);
        assert_eq!(store.loads, 3);
    }

    #[tokio::test]
    async fn exhaustion_returns_last_conflict() {
        let mut store = ScriptedStore::new(
            vec![Some("1.0.0"); 3],
            vec![Err("first"), Err("second"), Err("third")],
        );
        let err = bump_with_retry(&mut store, &v("0.0.0"), &Bump::Patch)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("third"));
        assert_eq!(store.writes.len(), 3);
    }

    #[tokio::test]
    async fn fatal_error_aborts_immediately() {
        struct FatalStore;

        #[async_trait::async_trait]
        impl OptimisticStore for FatalStore {
            async fn load(&mut self) -> Result<Option<Version>> {
                Ok(Some(Version::parse("1.0.0").unwrap()))
            }

            async fn store(&mut self, _version: &Version) -> Result<()> {
                Err(DriverError::Storage("access denied".to_string()))
            }
        }

        let mut store = FatalStore;
        let err = bump_with_retry(&mut store, &v("0.0.0"), &Bump::Patch)
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Storage(_)));
    }

    #[tokio::test]
    async fn read_error_is_fatal() {
        struct BadReadStore;

        #[async_trait::async_trait]
        impl OptimisticStore for BadReadStore {
            async fn load(&mut self) -> Result<Option<Version>> {
                Err(DriverError::Storage("corrupt".to_string()))
            }

            async fn store(&mut self, _version: &Version) -> Result<()> {
                unreachable!("store must not run after a failed load")
            }
        }

        let mut store = BadReadStore;
        let err = bump_with_retry(&mut store, &v("0.0.0"), &Bump::Patch)
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Storage(_)));
    }

    #[tokio::test]
    async fn set_retries_conflicts_with_same_version() {
        let mut store = ScriptedStore::new(
            vec![Some("1.0.0"), Some("1.0.1")],
            vec![Err("rejected"), Ok(())],
        );
        set_with_retry(&mut store, &v("2.0.0")).await.unwrap();
        assert_eq!(store.writes, vec![v("2.0.0"), v("2.0.0")]);
    }
}
