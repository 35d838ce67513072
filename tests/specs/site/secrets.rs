//! Secrets reconciliation specs

use crate::prelude::*;
use libops_core::test_support::secret;
use similar_asserts::assert_eq;
use std::os::unix::fs::PermissionsExt;

#[tokio::test]
async fn env_file_is_rendered_quoted_and_restricted() {
    let h = SiteHarness::new();
    h.admin.set_secrets(
        SITE_ID,
        vec![
            secret(1, "DATABASE_URL", "postgres://app:hunter2@db/app"),
            secret(2, "MOTD", r#"say "hi" twice"#),
        ],
    );

    h.reconciler.secrets().await.unwrap();

    let content = std::fs::read_to_string(h.secrets_path()).unwrap();
    assert_eq!(
        content,
        "DATABASE_URL=\"postgres://app:hunter2@db/app\"\nMOTD=\"say \\\"hi\\\" twice\"\n"
    );

    let mode = std::fs::metadata(h.secrets_path()).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[tokio::test]
async fn unchanged_secrets_write_byte_identical_file() {
    let h = SiteHarness::new();
    h.admin.set_secrets(SITE_ID, vec![secret(1, "A", "1"), secret(2, "B", "2")]);

    h.reconciler.secrets().await.unwrap();
    let first = std::fs::read(h.secrets_path()).unwrap();
    h.reconciler.secrets().await.unwrap();
    let second = std::fs::read(h.secrets_path()).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn deleted_secret_disappears_from_the_file() {
    let h = SiteHarness::new();
    h.admin.set_secrets(SITE_ID, vec![secret(1, "KEEP", "1"), secret(2, "DROP", "2")]);
    h.reconciler.secrets().await.unwrap();

    h.admin.set_secrets(SITE_ID, vec![secret(1, "KEEP", "1")]);
    h.reconciler.secrets().await.unwrap();

    let content = std::fs::read_to_string(h.secrets_path()).unwrap();
    assert!(content.contains("KEEP"));
    assert!(!content.contains("DROP"));
}
