use crate::SiteMutationService;
use chrono::Utc;
use tracing::debug;
use worksite_core::{
    BinaryStore, MemberId, NewTeamMember, Result, SiteId, SiteStore, SiteUpdate, TeamMember,
    WorksiteError,
};

impl<S, B> SiteMutationService<S, B>
where
    S: SiteStore,
    B: BinaryStore,
{
    /// Appends a roster entry. Roster mutations never interact with progress.
    pub async fn add_team_member(
        &self,
        site_id: SiteId,
        meta: NewTeamMember,
        actor: MemberId,
    ) -> Result<TeamMember> {
        let mut site = self.store.fetch(site_id).await?;
        let now = Utc::now();
        let member = TeamMember::new(meta, actor);
        site.team.push(member.clone());

        let update = SiteUpdate {
            team: Some(site.team.clone()),
            updated_at: Some(now),
            updated_by: Some(actor),
            ..Default::default()
        };
        self.store.commit(site_id, update).await?;
        debug!(site = %site_id, member = %member.id, "team member added");
        Ok(member)
    }

    pub async fn remove_team_member(
        &self,
        site_id: SiteId,
        member_id: MemberId,
        actor: MemberId,
    ) -> Result<()> {
        let mut site = self.store.fetch(site_id).await?;
        let now = Utc::now();

        let position = site
            .team
            .iter()
            .position(|m| m.id == member_id)
            .ok_or_else(|| WorksiteError::not_found("team member", member_id))?;
        site.team.remove(position);

        let update = SiteUpdate {
            team: Some(site.team.clone()),
            updated_at: Some(now),
            updated_by: Some(actor),
            ..Default::default()
        };
        self.store.commit(site_id, update).await?;
        debug!(site = %site_id, member = %member_id, "team member removed");
        Ok(())
    }
}
