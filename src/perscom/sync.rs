//! Removes applicants whose application ended in one of the purge statuses.
//!
//! The walk is best-effort: a failing lookup or deletion is logged and
//! counted, and the remaining submissions are still processed.

use std::collections::HashSet;
use std::fmt::Display;

use tracing::instrument;

use super::PerscomClient;

/// What a sync did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Submission pages read.
    pub pages: u32,
    /// Submissions looked at.
    pub submissions: u32,
    /// Users deleted.
    pub deleted: u32,
    /// Requests that failed.
    pub failures: u32,
    /// Whether the cache was cleared at the end.
    pub cache_cleared: bool,
}

impl Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Checked {} submissions on {} pages, removed {} users.",
            self.submissions, self.pages, self.deleted
        )?;
        if self.failures > 0 {
            write!(f, " {} requests failed, see the logs.", self.failures)?;
        }
        if !self.cache_cleared {
            write!(f, " The PERSCOM cache was not cleared.")?;
        }
        Ok(())
    }
}

/// Does `status` match one of `purge_statuses`? Case-insensitive.
fn should_purge(status: &str, purge_statuses: &[String]) -> bool {
    purge_statuses
        .iter()
        .any(|purge| purge.eq_ignore_ascii_case(status.trim()))
}

/// Walk submissions from `start_page` to the last page and delete every user
/// whose latest submission status is in `purge_statuses`, then clear the cache.
#[instrument(skip(client))]
pub async fn sync_applicants(
    client: &PerscomClient,
    start_page: u32,
    purge_statuses: &[String],
) -> SyncReport {
    let mut report = SyncReport::default();
    let mut deleted_users = HashSet::new();
    let mut page = start_page.max(1);

    loop {
        let listing = match client.submissions_page(page).await {
            Ok(listing) => listing,
            Err(e) => {
                // The last page is unknown without a listing, so stop here.
                tracing::error!("Failed to fetch submissions page {page}. {e}");
                report.failures += 1;
                break;
            }
        };
        report.pages += 1;
        tracing::debug!(
            "Read submissions page {} of {}.",
            listing.meta.current_page,
            listing.meta.last_page
        );

        for submission in &listing.data {
            report.submissions += 1;

            let statuses = match client.submission_statuses(submission.id).await {
                Ok(statuses) => statuses,
                Err(e) => {
                    tracing::error!("Failed to fetch statuses of submission {}. {e}", submission.id);
                    report.failures += 1;
                    continue;
                }
            };

            // Statuses are listed oldest first.
            let Some(latest) = statuses.last() else {
                continue;
            };
            if !should_purge(&latest.name, purge_statuses) {
                continue;
            }
            let Some(user_id) = submission.user_id else {
                tracing::warn!("Submission {} has no user to remove.", submission.id);
                continue;
            };
            if deleted_users.contains(&user_id) {
                continue;
            }

            match client.delete_user(user_id).await {
                Ok(()) => {
                    tracing::info!(
                        "Removed user {user_id} (submission {} to form {:?} is '{}').",
                        submission.id,
                        submission.form_id,
                        latest.name
                    );
                    deleted_users.insert(user_id);
                    report.deleted += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to remove user {user_id}. {e}");
                    report.failures += 1;
                }
            }
        }

        if page >= listing.meta.last_page {
            break;
        }
        page += 1;
    }

    match client.clear_cache().await {
        Ok(()) => report.cache_cleared = true,
        Err(e) => {
            tracing::error!("Failed to clear PERSCOM cache. {e}");
            report.failures += 1;
        }
    }

    tracing::info!("{report}");
    report
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::matchers::path;
    use wiremock::matchers::query_param;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;

    use super::*;

    async fn client(server: &MockServer) -> PerscomClient {
        PerscomClient::new(&format!("{}/v2/", server.uri()), "secret", "42").unwrap()
    }

    async fn mount_page(server: &MockServer, page: u32, last_page: u32, submissions: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/v2/submissions"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": submissions,
                "meta": { "current_page": page, "last_page": last_page }
            })))
            .mount(server)
            .await;
    }

    async fn mount_statuses(server: &MockServer, submission: u64, names: &[&str]) {
        let statuses: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(id, name)| json!({ "id": id, "name": name }))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/v2/submissions/{submission}/statuses")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": statuses })))
            .mount(server)
            .await;
    }

    async fn mount_delete(server: &MockServer, user: u64, status: u16, times: u64) {
        Mock::given(method("DELETE"))
            .and(path(format!("/v2/users/{user}")))
            .respond_with(ResponseTemplate::new(status))
            .expect(times)
            .mount(server)
            .await;
    }

    async fn mount_cache(server: &MockServer, status: u16) {
        Mock::given(method("POST"))
            .and(path("/v2/cache"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(server)
            .await;
    }

    fn purge() -> Vec<String> {
        vec!["Denied".to_string()]
    }

    #[tokio::test]
    async fn removes_denied_applicants_across_pages() {
        let server = MockServer::start().await;
        mount_page(&server, 1, 2, json!([{ "id": 1, "user_id": 10 }, { "id": 2, "user_id": 20 }])).await;
        mount_page(&server, 2, 2, json!([{ "id": 3, "user_id": 30 }])).await;
        mount_statuses(&server, 1, &["Pending", "Denied"]).await;
        mount_statuses(&server, 2, &["Denied", "Accepted"]).await;
        mount_statuses(&server, 3, &["denied"]).await;
        mount_delete(&server, 10, 200, 1).await;
        mount_delete(&server, 20, 200, 0).await;
        mount_delete(&server, 30, 204, 1).await;
        mount_cache(&server, 200).await;

        let report = sync_applicants(&client(&server).await, 1, &purge()).await;

        assert_eq!(
            report,
            SyncReport {
                pages: 2,
                submissions: 3,
                deleted: 2,
                failures: 0,
                cache_cleared: true,
            }
        );
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_walk() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            1,
            1,
            json!([{ "id": 1, "user_id": 10 }, { "id": 2, "user_id": 20 }, { "id": 3, "user_id": 30 }]),
        )
        .await;
        mount_statuses(&server, 1, &["Denied"]).await;
        // No statuses mounted for submission 2, wiremock answers 404.
        mount_statuses(&server, 3, &["Denied"]).await;
        mount_delete(&server, 10, 500, 1).await;
        mount_delete(&server, 30, 200, 1).await;
        mount_cache(&server, 503).await;

        let report = sync_applicants(&client(&server).await, 1, &purge()).await;

        assert_eq!(report.submissions, 3);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failures, 3);
        assert!(!report.cache_cleared);
        assert!(report.to_string().contains("3 requests failed"));
    }

    #[tokio::test]
    async fn starts_from_the_configured_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/submissions"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        mount_page(&server, 3, 3, json!([])).await;
        mount_cache(&server, 200).await;

        let report = sync_applicants(&client(&server).await, 3, &purge()).await;

        assert_eq!(report.pages, 1);
        assert_eq!(report.submissions, 0);
        assert!(report.cache_cleared);
    }

    #[tokio::test]
    async fn same_user_is_deleted_once() {
        let server = MockServer::start().await;
        mount_page(&server, 1, 1, json!([{ "id": 1, "user_id": 10 }, { "id": 2, "user_id": 10 }])).await;
        mount_statuses(&server, 1, &["Denied"]).await;
        mount_statuses(&server, 2, &["Denied"]).await;
        mount_delete(&server, 10, 200, 1).await;
        mount_cache(&server, 200).await;

        let report = sync_applicants(&client(&server).await, 1, &purge()).await;

        assert_eq!(report.deleted, 1);
        assert_eq!(report.failures, 0);
    }

    #[tokio::test]
    async fn unreachable_listing_still_clears_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/submissions"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        mount_cache(&server, 200).await;

        let report = sync_applicants(&client(&server).await, 1, &purge()).await;

        assert_eq!(report.pages, 0);
        assert_eq!(report.failures, 1);
        assert!(report.cache_cleared);
    }

    #[test]
    fn purge_matching_ignores_case_and_whitespace() {
        assert!(should_purge("denied ", &purge()));
        assert!(!should_purge("Accepted", &purge()));
        assert!(!should_purge("Denied", &[]));
    }
}
