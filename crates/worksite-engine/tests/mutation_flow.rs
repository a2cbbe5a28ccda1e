use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;
use worksite_core::{
    BinaryStore, MediaTarget, MediaUpload, NewTeamMember, Phase, PhaseCategory, Result, Site,
    SiteStatus, SiteStore, Step, WorkStatus, WorksiteError,
};
use worksite_engine::SiteMutationService;
use worksite_store::{MemorySiteStore, NullBinaryStore};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn service(
    store: Arc<MemorySiteStore>,
) -> SiteMutationService<MemorySiteStore, NullBinaryStore> {
    SiteMutationService::new(store, Arc::new(NullBinaryStore))
}

/// Site with planned end a month out: one stepped structural phase, one leaf
/// finishing phase, one leaf structural phase gated on the first.
fn fixture_site() -> Site {
    let foundations = Phase::new("Fondations", PhaseCategory::Structural).with_steps(vec![
        Step::new("Terrassement"),
        Step::new("Coulage"),
        Step::new("Sechage"),
    ]);
    let painting = Phase::new("Peinture", PhaseCategory::Finishing);
    let walls = Phase::new("Elevation des murs", PhaseCategory::Structural);
    Site::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "3 impasse du Port, Brest",
        Utc::now(),
        Utc::now() + Duration::days(30),
        Uuid::new_v4(),
    )
    .with_phases(vec![foundations, painting, walls])
}

fn seeded(site: Site) -> (Arc<MemorySiteStore>, Site) {
    let store = Arc::new(MemorySiteStore::new());
    store.insert_site(site.clone());
    (store, site)
}

#[tokio::test]
async fn leaf_phase_progress_rolls_up_to_global() {
    init_tracing();
    let leafs = Site::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "chantier",
        Utc::now(),
        Utc::now() + Duration::days(10),
        Uuid::new_v4(),
    )
    .with_phases(vec![
        Phase::new("a", PhaseCategory::Finishing),
        Phase::new("b", PhaseCategory::Finishing),
        Phase::new("c", PhaseCategory::Finishing).with_progress(100),
    ]);
    let (store, site) = seeded(leafs);
    let svc = service(store.clone());
    let actor = Uuid::new_v4();

    let updated = svc
        .set_phase_progress(site.id, site.phases[1].id, 50, None, actor)
        .await
        .unwrap();

    assert_eq!(updated.global_progress, 50);
    assert_eq!(updated.status, SiteStatus::Active);
    assert_eq!(updated.phases[1].status, WorkStatus::InProgress);

    let persisted = store.fetch(site.id).await.unwrap();
    assert_eq!(persisted.global_progress, 50);
    assert_eq!(persisted.status, SiteStatus::Active);
}

#[tokio::test]
async fn out_of_range_input_is_clamped_not_rejected() {
    let (store, site) = seeded(fixture_site());
    let svc = service(store);
    let actor = Uuid::new_v4();

    let updated = svc
        .set_phase_progress(site.id, site.phases[1].id, 250, None, actor)
        .await
        .unwrap();
    assert_eq!(updated.phases[1].progress, 100);

    let updated = svc
        .set_phase_progress(site.id, site.phases[1].id, -40, None, actor)
        .await
        .unwrap();
    assert_eq!(updated.phases[1].progress, 0);
}

#[tokio::test]
async fn stepped_phase_rejects_direct_progress_writes() {
    let (store, site) = seeded(fixture_site());
    let svc = service(store.clone());
    let before = store.fetch(site.id).await.unwrap();

    let err = svc
        .set_phase_progress(site.id, site.phases[0].id, 80, None, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, WorksiteError::InvalidTarget { step_count: 3, .. }));

    // Rejected before any write: the document is untouched.
    let after = store.fetch(site.id).await.unwrap();
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(after.phases[0].progress, before.phases[0].progress);
}

#[tokio::test]
async fn steps_unlock_strictly_in_sequence() {
    let (store, site) = seeded(fixture_site());
    let svc = service(store);
    let actor = Uuid::new_v4();
    let phase = &site.phases[0];

    // Second step is locked while the first is below 100.
    let err = svc
        .set_step_progress(site.id, phase.id, phase.steps[1].id, 30, actor)
        .await
        .unwrap_err();
    assert!(matches!(err, WorksiteError::LockedDependency { what: "step", .. }));

    // Completing the first step unlocks exactly the second, not the third.
    svc.set_step_progress(site.id, phase.id, phase.steps[0].id, 100, actor)
        .await
        .unwrap();
    let updated = svc
        .set_step_progress(site.id, phase.id, phase.steps[1].id, 30, actor)
        .await
        .unwrap();
    assert_eq!(updated.phases[0].steps[1].progress, 30);

    let err = svc
        .set_step_progress(site.id, phase.id, phase.steps[2].id, 10, actor)
        .await
        .unwrap_err();
    assert!(matches!(err, WorksiteError::LockedDependency { .. }));
}

#[tokio::test]
async fn structural_phase_is_gated_across_interleaved_categories() {
    let (store, site) = seeded(fixture_site());
    let svc = service(store);
    let actor = Uuid::new_v4();
    let foundations = &site.phases[0];
    let walls = &site.phases[2];

    // Walls wait on foundations even with the finishing phase in between.
    let err = svc
        .set_phase_progress(site.id, walls.id, 10, None, actor)
        .await
        .unwrap_err();
    assert!(matches!(err, WorksiteError::LockedDependency { what: "phase", .. }));

    // The finishing phase is independent and editable right away.
    svc.set_phase_progress(site.id, site.phases[1].id, 40, None, actor)
        .await
        .unwrap();

    // The gate phase is stepped, so its own progress only moves through its
    // steps; finishing them all releases the walls.
    for step in &foundations.steps {
        svc.set_step_progress(site.id, foundations.id, step.id, 100, actor)
            .await
            .unwrap();
    }
    let updated = svc
        .set_phase_progress(site.id, walls.id, 10, None, actor)
        .await
        .unwrap();
    assert_eq!(updated.phases[2].progress, 10);
}

#[tokio::test]
async fn stale_session_cannot_commit_a_lock_violation() {
    // Session A and session B share the store. B computed its lock view when
    // walls were unlocked; A then pulls the gate back below 100. B's write
    // must be re-validated against fresh data and rejected.
    let gate = Phase::new("Gros oeuvre", PhaseCategory::Structural).with_progress(100);
    let walls = Phase::new("Elevation", PhaseCategory::Structural);
    let site = Site::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "chantier",
        Utc::now(),
        Utc::now() + Duration::days(30),
        Uuid::new_v4(),
    )
    .with_phases(vec![gate, walls]);
    let (store, site) = seeded(site);
    let session_a = service(store.clone());
    let session_b = service(store.clone());

    let b_view = session_b.lock_states(site.id).await.unwrap();
    assert!(!b_view[1].locked);

    session_a
        .set_phase_progress(site.id, site.phases[0].id, 60, None, Uuid::new_v4())
        .await
        .unwrap();

    let err = session_b
        .set_phase_progress(site.id, site.phases[1].id, 25, None, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, WorksiteError::LockedDependency { .. }));
}

#[tokio::test]
async fn repeating_a_write_is_idempotent_modulo_audit_metadata() {
    let (store, site) = seeded(fixture_site());
    let svc = service(store.clone());
    let actor = Uuid::new_v4();
    let phase = &site.phases[0];

    svc.set_step_progress(site.id, phase.id, phase.steps[0].id, 70, actor)
        .await
        .unwrap();
    let first = store.fetch(site.id).await.unwrap();

    svc.set_step_progress(site.id, phase.id, phase.steps[0].id, 70, actor)
        .await
        .unwrap();
    let second = store.fetch(site.id).await.unwrap();

    assert_eq!(first.global_progress, second.global_progress);
    assert_eq!(first.status, second.status);
    assert_eq!(
        first.phases[0].progress,
        second.phases[0].progress
    );
    assert_eq!(first.phases[0].status, second.phases[0].status);
    assert_eq!(
        first.phases[0].steps[0].progress,
        second.phases[0].steps[0].progress
    );
}

#[tokio::test]
async fn overdue_when_past_deadline_and_unfinished() {
    let site = Site::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "chantier",
        Utc::now() - Duration::days(60),
        Utc::now() - Duration::days(1),
        Uuid::new_v4(),
    )
    .with_phases(vec![
        Phase::new("a", PhaseCategory::Finishing).with_progress(70),
        Phase::new("b", PhaseCategory::Finishing).with_progress(70),
    ]);
    let (store, site) = seeded(site);
    let svc = service(store);

    let updated = svc
        .set_phase_progress(site.id, site.phases[0].id, 50, None, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(updated.global_progress, 60);
    assert_eq!(updated.status, SiteStatus::Overdue);
}

#[tokio::test]
async fn late_completion_reports_completed_not_overdue() {
    let site = Site::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "chantier",
        Utc::now() - Duration::days(60),
        Utc::now() - Duration::days(1),
        Uuid::new_v4(),
    )
    .with_phases(vec![
        Phase::new("a", PhaseCategory::Finishing).with_progress(100),
        Phase::new("b", PhaseCategory::Finishing).with_progress(90),
    ]);
    let (store, site) = seeded(site);
    let svc = service(store);

    let updated = svc
        .set_phase_progress(site.id, site.phases[1].id, 100, None, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(updated.global_progress, 100);
    assert_eq!(updated.status, SiteStatus::Completed);
}

#[tokio::test]
async fn media_attach_and_remove_purge_every_reference() {
    init_tracing();
    let (store, site) = seeded(fixture_site());
    let svc = service(store.clone());
    let actor = Uuid::new_v4();
    let phase = &site.phases[0];
    let step = &phase.steps[0];

    let entry = svc
        .add_media(
            site.id,
            Some(MediaTarget::Step {
                phase: phase.id,
                step: step.id,
            }),
            MediaUpload::image("https://cdn.example.com/chantier/coulage.jpg")
                .with_caption("Coulage de la dalle"),
            actor,
        )
        .await
        .unwrap();

    let doc = store.fetch(site.id).await.unwrap();
    assert_eq!(doc.gallery.len(), 1);
    assert!(doc.phases[0].photos.contains(&entry.url));
    assert!(doc.phases[0].steps[0].photos.contains(&entry.url));
    // Media never moves progress.
    assert_eq!(doc.global_progress, 0);
    assert_eq!(doc.status, SiteStatus::Awaiting);

    svc.remove_media(site.id, entry.id, actor).await.unwrap();
    let doc = store.fetch(site.id).await.unwrap();
    assert!(doc.gallery.is_empty());
    assert!(!doc.phases[0].photos.contains(&entry.url));
    assert!(!doc.phases[0].steps[0].photos.contains(&entry.url));
}

struct FailingBinaryStore;

#[async_trait]
impl BinaryStore for FailingBinaryStore {
    async fn delete(&self, _url: &str) -> Result<()> {
        Err(WorksiteError::Persistence("cdn unreachable".to_string()))
    }
}

#[tokio::test]
async fn binary_deletion_failure_does_not_abort_metadata_removal() {
    init_tracing();
    let (store, site) = seeded(fixture_site());
    let svc = SiteMutationService::new(store.clone(), Arc::new(FailingBinaryStore));
    let actor = Uuid::new_v4();

    let entry = svc
        .add_media(
            site.id,
            None,
            MediaUpload::video("https://cdn.example.com/chantier/visite.mp4", 95),
            actor,
        )
        .await
        .unwrap();

    svc.remove_media(site.id, entry.id, actor).await.unwrap();
    assert!(store.fetch(site.id).await.unwrap().gallery.is_empty());
}

#[tokio::test]
async fn roster_mutations_never_touch_progress() {
    let (store, site) = seeded(fixture_site());
    let svc = service(store.clone());
    let actor = Uuid::new_v4();

    let member = svc
        .add_team_member(
            site.id,
            NewTeamMember {
                name: "Karim Mansouri".to_string(),
                trade: "Maçon".to_string(),
                phone: Some("+33 6 12 34 56 78".to_string()),
                experience: None,
            },
            actor,
        )
        .await
        .unwrap();

    let doc = store.fetch(site.id).await.unwrap();
    assert_eq!(doc.team.len(), 1);
    assert_eq!(doc.global_progress, 0);

    svc.remove_team_member(site.id, member.id, actor).await.unwrap();
    assert!(store.fetch(site.id).await.unwrap().team.is_empty());

    let err = svc
        .remove_team_member(site.id, member.id, actor)
        .await
        .unwrap_err();
    assert!(matches!(err, WorksiteError::NotFound { .. }));
}

#[tokio::test]
async fn missing_targets_fail_before_any_write() {
    let (store, site) = seeded(fixture_site());
    let svc = service(store.clone());
    let actor = Uuid::new_v4();
    let before = store.fetch(site.id).await.unwrap();

    let err = svc
        .set_step_progress(Uuid::new_v4(), site.phases[0].id, Uuid::new_v4(), 10, actor)
        .await
        .unwrap_err();
    assert!(matches!(err, WorksiteError::NotFound { what: "site", .. }));

    let err = svc
        .set_step_progress(site.id, Uuid::new_v4(), Uuid::new_v4(), 10, actor)
        .await
        .unwrap_err();
    assert!(matches!(err, WorksiteError::NotFound { what: "phase", .. }));

    let err = svc
        .set_step_progress(site.id, site.phases[0].id, Uuid::new_v4(), 10, actor)
        .await
        .unwrap_err();
    assert!(matches!(err, WorksiteError::NotFound { what: "step", .. }));

    let err = svc
        .remove_media(site.id, Uuid::new_v4(), actor)
        .await
        .unwrap_err();
    assert!(matches!(err, WorksiteError::NotFound { .. }));

    let after = store.fetch(site.id).await.unwrap();
    assert_eq!(after.updated_at, before.updated_at);
}
