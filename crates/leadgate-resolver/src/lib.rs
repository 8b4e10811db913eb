// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead identity resolution.
//!
//! [`resolve_and_merge`] is the single entry point every capture channel
//! (chat tool call, voice tool webhook, web contact form) goes through to
//! turn a bundle of contact attributes into exactly one lead row.
//!
//! Lookup order is email first, then phone; a miss creates a new row. An
//! existing row is merged field by field:
//!
//! - `name` follows the configured [`NamePolicy`]; under first-wins a real
//!   stored name is never overwritten and only the `Unknown` placeholder
//!   yields.
//! - `email`/`phone` are set only when the stored column is null, and only
//!   if no other lead owns the value. A value owned by another lead is
//!   dropped from the write and reported as a conflict outcome while the
//!   rest of the merge still commits.
//! - `problem` is last-write-wins; `source` always records the latest
//!   channel.
//!
//! Pre-checks narrow the window but the UNIQUE constraints in storage are
//! the authoritative guard: a constraint violation at write time is
//! downgraded to the same conflict outcome, and a lost create race re-reads
//! the winning row and merges onto it.

use tracing::{debug, warn};

use leadgate_core::{
    ContactField, Lead, LeadPatch, LeadStore, LeadgateError, MergeOutcome, NamePolicy, NewLead,
    ResolveRequest, Resolution, UNKNOWN_NAME,
};

/// Bound on create/merge retries after losing a uniqueness race.
const MAX_ATTEMPTS: usize = 3;

/// Resolve a capture request to a lead row, creating or merging as needed.
///
/// Returns the surviving lead id plus the outcome of the merge. Conflicts on
/// a contact field drop that field but still commit the rest of the merge;
/// only storage failures surface as `Err`.
pub async fn resolve_and_merge(
    store: &dyn LeadStore,
    policy: NamePolicy,
    req: &ResolveRequest,
) -> Result<Resolution, LeadgateError> {
    if req.is_empty() {
        return Err(LeadgateError::Validation(
            "at least one of name, email, phone, or problem is required".to_string(),
        ));
    }

    for attempt in 0..MAX_ATTEMPTS {
        let existing = lookup(store, req).await?;

        match existing {
            Some(lead) => return merge_onto(store, policy, req, lead).await,
            None => match create(store, req).await {
                Ok(resolution) => return Ok(resolution),
                // Another writer inserted a row with this email or phone
                // between our lookup and the insert. Loop back, re-read the
                // winning row, and merge onto it.
                Err(LeadgateError::Conflict { field }) => {
                    warn!(%field, attempt, "lost create race, retrying as merge");
                }
                Err(e) => return Err(e),
            },
        }
    }

    Err(LeadgateError::Internal(
        "lead resolution did not converge".to_string(),
    ))
}

/// Find an existing lead by email first, then phone.
async fn lookup(store: &dyn LeadStore, req: &ResolveRequest) -> Result<Option<Lead>, LeadgateError> {
    if let Some(email) = &req.email
        && let Some(lead) = store.find_lead_by_email(email).await?
    {
        return Ok(Some(lead));
    }
    if let Some(phone) = &req.phone
        && let Some(lead) = store.find_lead_by_phone(phone).await?
    {
        return Ok(Some(lead));
    }
    Ok(None)
}

/// Insert a fresh lead row from the request.
async fn create(store: &dyn LeadStore, req: &ResolveRequest) -> Result<Resolution, LeadgateError> {
    let lead = NewLead {
        name: req
            .name
            .clone()
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        email: req.email.clone(),
        phone: req.phone.clone(),
        problem: req.problem.clone(),
        source: req.source,
    };
    let lead_id = store.insert_lead(&lead).await?;
    debug!(%lead_id, source = %req.source, "lead created");
    Ok(Resolution {
        lead_id,
        outcome: MergeOutcome::Created,
    })
}

/// Merge the request onto an existing lead row.
async fn merge_onto(
    store: &dyn LeadStore,
    policy: NamePolicy,
    req: &ResolveRequest,
    lead: Lead,
) -> Result<Resolution, LeadgateError> {
    let mut conflict_email = false;
    let mut conflict_phone = false;

    let mut patch = LeadPatch::default();

    if let Some(name) = &req.name {
        let takes = match policy {
            NamePolicy::FirstWins => lead.name.eq_ignore_ascii_case(UNKNOWN_NAME),
            NamePolicy::LastWins => true,
        };
        if takes && *name != lead.name {
            patch.name = Some(name.clone());
        }
    }

    if let Some(email) = &req.email
        && lead.email.as_deref() != Some(email)
    {
        // A stored, different email is never overwritten; only fill a null
        // column, and only when no other lead owns the value.
        if lead.email.is_none() {
            match store.find_lead_by_email(email).await? {
                Some(owner) if owner.id != lead.id => conflict_email = true,
                _ => patch.email = Some(email.clone()),
            }
        }
    }

    if let Some(phone) = &req.phone
        && lead.phone.as_deref() != Some(phone)
    {
        if lead.phone.is_none() {
            match store.find_lead_by_phone(phone).await? {
                Some(owner) if owner.id != lead.id => conflict_phone = true,
                _ => patch.phone = Some(phone.clone()),
            }
        }
    }

    if let Some(problem) = &req.problem
        && lead.problem.as_deref() != Some(problem)
    {
        patch.problem = Some(problem.clone());
    }

    if lead.source != req.source {
        patch.source = Some(req.source);
    }

    // The pre-checks above only narrow the race window; the UNIQUE
    // constraints are authoritative. Drop the offending field and retry
    // when a concurrent writer claimed it first.
    for _ in 0..MAX_ATTEMPTS {
        if patch.is_empty() {
            break;
        }
        match store.update_lead(lead.id, &patch).await {
            Ok(()) => break,
            Err(LeadgateError::Conflict { field }) => {
                warn!(lead_id = %lead.id, %field, "contact field claimed concurrently, dropping from merge");
                match field {
                    ContactField::Email => conflict_email = true,
                    ContactField::Phone => conflict_phone = true,
                }
                patch.clear(field);
            }
            Err(e) => return Err(e),
        }
    }

    let outcome = if conflict_email {
        MergeOutcome::ConflictEmail
    } else if conflict_phone {
        MergeOutcome::ConflictPhone
    } else {
        MergeOutcome::Updated
    };
    debug!(lead_id = %lead.id, ?outcome, source = %req.source, "lead merged");

    Ok(Resolution {
        lead_id: lead.id,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use leadgate_config::model::StorageConfig;
    use leadgate_core::SourceChannel;
    use leadgate_storage::SqliteStore;
    use tempfile::tempdir;

    async fn setup_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("resolver.db");
        let store = SqliteStore::new(StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
            wal_mode: true,
        });
        store.initialize().await.unwrap();
        (store, dir)
    }

    fn req(
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        problem: Option<&str>,
        source: SourceChannel,
    ) -> ResolveRequest {
        ResolveRequest::new(
            name.map(str::to_string),
            email.map(str::to_string),
            phone.map(str::to_string),
            problem.map(str::to_string),
            source,
        )
    }

    #[tokio::test]
    async fn miss_creates_lead_with_status_new() {
        let (store, _dir) = setup_store().await;

        let res = resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(
                Some("Sara"),
                Some("a@x.com"),
                None,
                Some("slow site"),
                SourceChannel::Chat,
            ),
        )
        .await
        .unwrap();

        assert_eq!(res.outcome, MergeOutcome::Created);
        let lead = store.get_lead(res.lead_id).await.unwrap().unwrap();
        assert_eq!(lead.name, "Sara");
        assert_eq!(lead.email.as_deref(), Some("a@x.com"));
        assert_eq!(lead.status, leadgate_core::LeadStatus::New);
    }

    #[tokio::test]
    async fn missing_name_defaults_to_placeholder() {
        let (store, _dir) = setup_store().await;

        let res = resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(None, Some("a@x.com"), None, None, SourceChannel::Form),
        )
        .await
        .unwrap();

        let lead = store.get_lead(res.lead_id).await.unwrap().unwrap();
        assert_eq!(lead.name, UNKNOWN_NAME);
    }

    #[tokio::test]
    async fn empty_request_is_rejected_before_touching_storage() {
        let (store, _dir) = setup_store().await;

        let err = resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(Some("  "), Some(""), None, None, SourceChannel::Chat),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LeadgateError::Validation(_)));
        assert!(store.list_leads(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn email_match_fills_placeholder_name_and_locks_it() {
        let (store, _dir) = setup_store().await;

        // Anonymous capture first, then the same email arrives with a name.
        resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(None, Some("a@x.com"), None, None, SourceChannel::Form),
        )
        .await
        .unwrap();

        let res = resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(Some("Sara"), Some("a@x.com"), None, None, SourceChannel::Chat),
        )
        .await
        .unwrap();
        assert_eq!(res.outcome, MergeOutcome::Updated);

        let lead = store.get_lead(res.lead_id).await.unwrap().unwrap();
        assert_eq!(lead.name, "Sara");

        // A later different name must not displace the first real one.
        let res = resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(
                Some("S. Ahmed"),
                Some("a@x.com"),
                None,
                None,
                SourceChannel::Voice,
            ),
        )
        .await
        .unwrap();
        assert_eq!(res.outcome, MergeOutcome::Updated);
        let lead = store.get_lead(res.lead_id).await.unwrap().unwrap();
        assert_eq!(lead.name, "Sara");
        assert_eq!(lead.source, SourceChannel::Voice);
    }

    #[tokio::test]
    async fn last_wins_policy_overwrites_name() {
        let (store, _dir) = setup_store().await;

        resolve_and_merge(
            &store,
            NamePolicy::LastWins,
            &req(Some("Sara"), Some("a@x.com"), None, None, SourceChannel::Chat),
        )
        .await
        .unwrap();

        let res = resolve_and_merge(
            &store,
            NamePolicy::LastWins,
            &req(
                Some("S. Ahmed"),
                Some("a@x.com"),
                None,
                None,
                SourceChannel::Chat,
            ),
        )
        .await
        .unwrap();

        let lead = store.get_lead(res.lead_id).await.unwrap().unwrap();
        assert_eq!(lead.name, "S. Ahmed");
    }

    #[tokio::test]
    async fn problem_is_last_write_wins() {
        let (store, _dir) = setup_store().await;

        resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(
                Some("Sara"),
                Some("a@x.com"),
                None,
                Some("slow site"),
                SourceChannel::Chat,
            ),
        )
        .await
        .unwrap();

        let res = resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(
                None,
                Some("a@x.com"),
                None,
                Some("needs full redesign"),
                SourceChannel::Form,
            ),
        )
        .await
        .unwrap();

        let lead = store.get_lead(res.lead_id).await.unwrap().unwrap();
        assert_eq!(lead.problem.as_deref(), Some("needs full redesign"));
        assert_eq!(lead.source, SourceChannel::Form);
    }

    #[tokio::test]
    async fn phone_lookup_backfills_email() {
        let (store, _dir) = setup_store().await;

        resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(Some("Omar"), None, Some("+100"), None, SourceChannel::Voice),
        )
        .await
        .unwrap();

        let res = resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(None, Some("omar@x.com"), Some("+100"), None, SourceChannel::Chat),
        )
        .await
        .unwrap();
        assert_eq!(res.outcome, MergeOutcome::Updated);

        let lead = store.get_lead(res.lead_id).await.unwrap().unwrap();
        assert_eq!(lead.email.as_deref(), Some("omar@x.com"));
        assert_eq!(lead.phone.as_deref(), Some("+100"));
    }

    #[tokio::test]
    async fn phone_owned_elsewhere_is_partial_success() {
        let (store, _dir) = setup_store().await;

        // Lead B owns the phone number.
        resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(Some("Omar"), None, Some("+100"), None, SourceChannel::Voice),
        )
        .await
        .unwrap();

        // Lead A matched by email tries to claim the same phone.
        resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(None, Some("a@x.com"), None, None, SourceChannel::Form),
        )
        .await
        .unwrap();
        let res = resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(
                Some("Sara"),
                Some("a@x.com"),
                Some("+100"),
                Some("broken cart"),
                SourceChannel::Chat,
            ),
        )
        .await
        .unwrap();

        assert_eq!(res.outcome, MergeOutcome::ConflictPhone);
        let lead = store.get_lead(res.lead_id).await.unwrap().unwrap();
        // The conflicting field was dropped, everything else committed.
        assert_eq!(lead.phone, None);
        assert_eq!(lead.name, "Sara");
        assert_eq!(lead.problem.as_deref(), Some("broken cart"));
        assert_eq!(lead.source, SourceChannel::Chat);
    }

    #[tokio::test]
    async fn email_owned_elsewhere_is_conflict_email() {
        let (store, _dir) = setup_store().await;

        resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(Some("Sara"), Some("a@x.com"), None, None, SourceChannel::Chat),
        )
        .await
        .unwrap();

        // Matched by phone, tries to claim an email another lead owns.
        resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(Some("Omar"), None, Some("+200"), None, SourceChannel::Voice),
        )
        .await
        .unwrap();
        let res = resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(None, Some("a@x.com"), Some("+200"), None, SourceChannel::Voice),
        )
        .await
        .unwrap();

        // Email lookup wins, so this resolves to Sara's lead, which already
        // owns the email; nothing conflicts there. Re-run against the phone
        // lead explicitly to exercise the conflict path.
        assert_eq!(res.outcome, MergeOutcome::ConflictPhone);

        let omar = store.find_lead_by_phone("+200").await.unwrap().unwrap();
        let merged = merge_onto(
            &store,
            NamePolicy::FirstWins,
            &req(None, Some("a@x.com"), None, None, SourceChannel::Voice),
            omar,
        )
        .await
        .unwrap();
        assert_eq!(merged.outcome, MergeOutcome::ConflictEmail);

        let omar = store.find_lead_by_phone("+200").await.unwrap().unwrap();
        assert_eq!(omar.email, None);
    }

    #[tokio::test]
    async fn stored_different_email_is_silently_kept() {
        let (store, _dir) = setup_store().await;

        resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(
                Some("Sara"),
                Some("a@x.com"),
                Some("+100"),
                None,
                SourceChannel::Chat,
            ),
        )
        .await
        .unwrap();

        // Matched by phone with a fresh, unowned email; the stored email is
        // non-null so the new value is ignored, not a conflict.
        let res = resolve_and_merge(
            &store,
            NamePolicy::FirstWins,
            &req(None, Some("new@x.com"), Some("+100"), None, SourceChannel::Chat),
        )
        .await
        .unwrap();

        assert_eq!(res.outcome, MergeOutcome::Updated);
        let lead = store.get_lead(res.lead_id).await.unwrap().unwrap();
        assert_eq!(lead.email.as_deref(), Some("a@x.com"));
    }

    #[tokio::test]
    async fn resubmit_is_idempotent() {
        let (store, _dir) = setup_store().await;

        let request = req(
            Some("Sara"),
            Some("a@x.com"),
            Some("+100"),
            Some("slow site"),
            SourceChannel::Form,
        );
        let first = resolve_and_merge(&store, NamePolicy::FirstWins, &request)
            .await
            .unwrap();
        let second = resolve_and_merge(&store, NamePolicy::FirstWins, &request)
            .await
            .unwrap();

        assert_eq!(first.outcome, MergeOutcome::Created);
        assert_eq!(second.outcome, MergeOutcome::Updated);
        assert_eq!(first.lead_id, second.lead_id);
        assert_eq!(store.list_leads(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_same_email_yields_single_lead() {
        let (store, _dir) = setup_store().await;
        let store = Arc::new(store);

        let a = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                resolve_and_merge(
                    store.as_ref(),
                    NamePolicy::FirstWins,
                    &req(Some("Sara"), Some("a@x.com"), None, None, SourceChannel::Chat),
                )
                .await
            })
        };
        let b = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                resolve_and_merge(
                    store.as_ref(),
                    NamePolicy::FirstWins,
                    &req(None, Some("a@x.com"), None, Some("slow"), SourceChannel::Form),
                )
                .await
            })
        };

        let ra = a.await.unwrap().unwrap();
        let rb = b.await.unwrap().unwrap();

        assert_eq!(ra.lead_id, rb.lead_id);
        assert_eq!(store.list_leads(None).await.unwrap().len(), 1);
        // Exactly one of the two created the row.
        let created = [ra.outcome, rb.outcome]
            .iter()
            .filter(|o| **o == MergeOutcome::Created)
            .count();
        assert_eq!(created, 1);
    }
}
