mod common;

use migrato::{
    migration::{METADATA_COLLECTION, VERSION_DOCUMENT},
    ConfigBuilder, MemoryCache, MigrateError, MigrationKind, MigrationRunner, VersionCatalog,
};
use migrato_store::{
    Authorization, Database, Document, MemoryProvider, ProjectDatabaseProvider, StoreError,
};
use tracing_test::traced_test;

use crate::common::{
    add_project, platform, Platform, ReadOnlyProvider, RecordingCache, UnreachableProvider,
};

fn runner(platform: &Platform) -> MigrationRunner {
    MigrationRunner::new(
        platform.registry.clone(),
        platform.provider.clone(),
        platform.pool.clone(),
        platform.cache.clone(),
    )
}

async fn project_version(
    provider: &MemoryProvider,
    project: &Document,
) -> anyhow::Result<Option<String>> {
    let db = provider.get(project).await?;
    let version = match db
        .get_document(&Authorization::skip(), METADATA_COLLECTION, VERSION_DOCUMENT)
        .await
    {
        Ok(version) => version,
        Err(StoreError::CollectionNotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(version.and_then(|d| d.get_str("version").map(ToOwned::to_owned)))
}

#[tokio::test]
#[traced_test]
async fn migrate_all_projects() -> anyhow::Result<()> {
    let platform = platform(45).await?;
    let runner = runner(&platform).catalog(VersionCatalog::new([("1.0.0", MigrationKind::V1_0_0)]));

    let report = runner.run("1.0.0").await?;

    assert_eq!(report.version, "1.0.0");
    assert_eq!(report.processed, 46);
    assert_eq!(report.total, 46);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(platform.counter.finds(), 3);
    assert_eq!(platform.pool.acquired(), 46);

    assert!(logs_contain("Starting data migration to version 1.0.0"));
    assert!(logs_contain("Migrated 1/46 projects..."));
    assert!(logs_contain("Migrated 31/46 projects..."));
    assert!(logs_contain("Migrated 46/46 projects..."));
    assert!(logs_contain("Data migration completed"));

    let root = Document::with_internal_id("console", "console");
    assert_eq!(
        project_version(&platform.provider, &root).await?.as_deref(),
        Some("1.0.0")
    );

    let project = platform
        .registry
        .get_document(&Authorization::skip(), "projects", "project-45")
        .await?
        .unwrap();
    assert_eq!(project.get_str("version"), Some("1.0.0"));
    assert_eq!(
        project_version(&platform.provider, &project).await?.as_deref(),
        Some("1.0.0")
    );

    Ok(())
}

#[tokio::test]
async fn pages_end_on_first_empty_page() -> anyhow::Result<()> {
    for (projects, fetches) in [(0, 1), (1, 2), (29, 2), (30, 2), (31, 3), (60, 3), (61, 4)] {
        let platform = platform(projects).await?;
        let report = runner(&platform).run("1.0.0").await?;

        assert_eq!(report.pages_fetched, fetches, "{projects} projects");
        assert_eq!(report.processed, projects as u64 + 1);
        assert_eq!(report.total, projects as u64 + 1);
    }

    Ok(())
}

#[tokio::test]
async fn every_project_is_purged_twice() -> anyhow::Result<()> {
    let platform = platform(3).await?;
    runner(&platform).run("1.1.0").await?;

    assert_eq!(
        platform.cache.patterns(),
        vec![
            "cache-_console:*",
            "cache-_console:*",
            "cache-_1:*",
            "cache-_1:*",
            "cache-_2:*",
            "cache-_2:*",
            "cache-_3:*",
            "cache-_3:*",
        ]
    );

    Ok(())
}

#[tokio::test]
#[traced_test]
async fn unknown_version_has_no_side_effect() -> anyhow::Result<()> {
    let platform = platform(10).await?;

    let err = runner(&platform).run("9.9.9").await.unwrap_err();

    assert!(matches!(err, MigrateError::VersionNotFound(ref v) if v == "9.9.9"));
    assert_eq!(platform.counter.counts(), 0);
    assert_eq!(platform.counter.finds(), 0);
    assert_eq!(platform.pool.acquired(), 0);
    assert!(platform.cache.patterns().is_empty());
    assert!(logs_contain("Version 9.9.9 not found."));
    assert!(!logs_contain("Starting data migration"));

    Ok(())
}

#[tokio::test]
async fn root_impostor_is_skipped() -> anyhow::Result<()> {
    let platform = platform(2).await?;
    let impostor = add_project(&platform.registry, Document::new("console")).await?;
    add_project(&platform.registry, Document::new("project-3")).await?;

    assert_ne!(impostor.internal_id, "console");

    let report = runner(&platform).run("1.0.0").await?;

    assert_eq!(platform.cache.purges_of("console"), 2);
    assert_eq!(platform.cache.purges_of(&impostor.internal_id), 0);
    assert_eq!(platform.pool.acquired(), 4);
    assert_eq!(report.processed, 5);
    assert_eq!(report.total, 5);
    assert_eq!(
        project_version(&platform.provider, &impostor).await?,
        None
    );

    let impostor = platform
        .registry
        .get_document(&Authorization::skip(), "projects", "console")
        .await?
        .unwrap();
    assert_eq!(impostor.get_str("version"), None);

    Ok(())
}

#[tokio::test]
#[traced_test]
async fn failure_stops_the_batch() -> anyhow::Result<()> {
    let platform = platform(5).await?;
    let provider = UnreachableProvider::new(platform.provider.clone(), "project-3");
    let runner = MigrationRunner::new(
        platform.registry.clone(),
        provider.clone(),
        platform.pool.clone(),
        platform.cache.clone(),
    );

    let err = runner.run("1.0.0").await.unwrap_err();

    match err {
        MigrateError::Migration {
            project,
            processed,
            source,
        } => {
            assert_eq!(project, "project-3");
            assert_eq!(processed, 1);
            assert!(source.to_string().contains("unreachable"));
        }
        e => panic!("unexpected error {e}"),
    }

    assert_eq!(
        platform.cache.patterns(),
        vec![
            "cache-_console:*",
            "cache-_console:*",
            "cache-_1:*",
            "cache-_1:*",
            "cache-_2:*",
            "cache-_2:*",
            "cache-_3:*",
        ]
    );
    assert_eq!(
        provider.requested(),
        vec!["console", "project-1", "project-2", "project-3"]
    );
    assert_eq!(platform.pool.acquired(), 3);
    assert_eq!(platform.counter.finds(), 1);

    assert!(logs_contain(
        "Failed to update project (\"project-3\") version with error"
    ));
    assert!(!logs_contain("Data migration completed"));

    Ok(())
}

#[tokio::test]
async fn failure_inside_a_migration() -> anyhow::Result<()> {
    let platform = platform(40).await?;
    let runner = MigrationRunner::new(
        platform.registry.clone(),
        ReadOnlyProvider::new(platform.provider.clone(), "project-35"),
        platform.pool.clone(),
        platform.cache.clone(),
    );

    let err = runner.run("1.2.0").await.unwrap_err();

    assert!(matches!(
        err,
        MigrateError::Migration { ref project, processed: 31, .. } if project == "project-35"
    ));
    assert_eq!(platform.cache.purges_of("35"), 1);
    assert_eq!(platform.cache.purges_of("36"), 0);

    let migrated = Document::with_internal_id("project-34", "34");
    assert_eq!(
        project_version(&platform.provider, &migrated).await?.as_deref(),
        Some("1.2.0")
    );

    let untouched = Document::with_internal_id("project-36", "36");
    assert_eq!(project_version(&platform.provider, &untouched).await?, None);

    Ok(())
}

#[tokio::test]
#[traced_test]
async fn cache_failure_is_not_fatal() -> anyhow::Result<()> {
    let mut platform = platform(4).await?;
    platform.cache = RecordingCache::failing();

    let report = runner(&platform).run("1.0.0").await?;

    assert_eq!(report.processed, 5);
    assert_eq!(platform.pool.acquired(), 5);
    assert_eq!(platform.cache.patterns().len(), 10);
    assert!(logs_contain(
        "Failed to clear project (\"console\") cache with error"
    ));
    assert!(logs_contain(
        "Failed to clear project (\"project-4\") cache with error"
    ));
    assert!(logs_contain("Data migration completed"));

    Ok(())
}

#[tokio::test]
#[traced_test]
async fn count_is_retried_in_fallback_namespace() -> anyhow::Result<()> {
    let platform = platform(3).await?;
    let registry = Database::new(platform.engine.scoped("_unknown"));
    let runner = MigrationRunner::new(
        registry.clone(),
        platform.provider.clone(),
        platform.pool.clone(),
        platform.cache.clone(),
    );

    let report = runner.run("1.0.0").await?;

    assert_eq!(report.total, 4);
    assert_eq!(report.processed, 4);
    assert_eq!(registry.namespace().as_deref(), Some("_console"));
    assert!(logs_contain("retrying in namespace _console"));

    Ok(())
}

#[tokio::test]
async fn count_fails_twice() -> anyhow::Result<()> {
    let platform = platform(3).await?;
    let registry = Database::new(platform.engine.scoped("_unknown"));
    let runner = MigrationRunner::new(
        registry,
        platform.provider.clone(),
        platform.pool.clone(),
        platform.cache.clone(),
    )
    .config(ConfigBuilder::new().fallback_namespace("_missing").build());

    let err = runner.run("1.0.0").await.unwrap_err();

    assert!(matches!(err, MigrateError::Registry(_)));
    assert!(std::error::Error::source(&err)
        .is_some_and(|source| source.to_string().contains("_missing_projects")));
    assert!(platform.cache.patterns().is_empty());
    assert_eq!(platform.pool.acquired(), 0);

    Ok(())
}

#[tokio::test]
async fn private_projects_are_migrated() -> anyhow::Result<()> {
    let platform = platform(2).await?;
    add_project(
        &platform.registry,
        Document::new("private").read(["team:ops"]),
    )
    .await?;

    let report = runner(&platform).run("1.0.0").await?;

    assert_eq!(report.total, 4);
    assert_eq!(platform.pool.acquired(), 4);
    assert_eq!(platform.cache.purges_of("3"), 2);

    Ok(())
}

#[tokio::test]
async fn custom_page_size() -> anyhow::Result<()> {
    let platform = platform(10).await?;
    let report = runner(&platform)
        .config(ConfigBuilder::new().page_size(4).build())
        .run("1.0.0")
        .await?;

    assert_eq!(report.pages_fetched, 4);
    assert_eq!(report.processed, 11);

    Ok(())
}

#[tokio::test]
async fn rerun_is_idempotent() -> anyhow::Result<()> {
    let platform = platform(2).await?;
    let runner = runner(&platform);

    runner.run("1.0.0").await?;
    runner.run("1.2.0").await?;
    runner.run("1.2.0").await?;

    let project = Document::with_internal_id("project-1", "1");
    let db = platform.provider.get(&project).await?;
    let history = db
        .get_document(&Authorization::skip(), METADATA_COLLECTION, "history")
        .await?
        .unwrap();

    assert_eq!(
        history.get("versions"),
        Some(&serde_json::json!(["1.0.0", "1.2.0"]))
    );
    assert_eq!(
        project_version(&platform.provider, &project).await?.as_deref(),
        Some("1.2.0")
    );

    Ok(())
}

#[tokio::test]
async fn search_column_statements() -> anyhow::Result<()> {
    let platform = platform(1).await?;
    runner(&platform).run("1.1.0").await?;

    let statements = platform.pool.statements();

    assert_eq!(statements.len(), 4);
    assert_eq!(
        statements[0],
        "ALTER TABLE \"_console_metadata\" ADD COLUMN IF NOT EXISTS search TEXT"
    );
    assert!(statements[3].starts_with("UPDATE \"_1_metadata\" SET search"));

    Ok(())
}

#[tokio::test]
async fn memory_cache_is_purged_per_project() -> anyhow::Result<()> {
    use migrato::Cache;

    let platform = platform(2).await?;
    let cache = MemoryCache::new();

    for key in ["cache-_console:a", "cache-_1:a", "cache-_2:b", "other:c"] {
        cache.save(key, "{}".to_owned()).await?;
    }

    MigrationRunner::new(
        platform.registry.clone(),
        platform.provider.clone(),
        platform.pool.clone(),
        cache.clone(),
    )
    .run("1.0.0")
    .await?;

    assert_eq!(cache.keys(), vec!["other:c"]);

    Ok(())
}

#[tokio::test]
#[traced_test]
async fn zero_page_size_is_rejected_upfront() -> anyhow::Result<()> {
    let platform = platform(3).await?;

    let err = runner(&platform)
        .config(ConfigBuilder::new().page_size(0).build())
        .run("1.0.0")
        .await
        .unwrap_err();

    assert!(matches!(err, MigrateError::InvalidPageSize));
    assert_eq!(platform.counter.counts(), 0);
    assert_eq!(platform.counter.finds(), 0);
    assert_eq!(platform.pool.acquired(), 0);
    assert!(platform.cache.patterns().is_empty());
    assert!(!logs_contain("Starting data migration"));

    Ok(())
}
