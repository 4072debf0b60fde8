//! Team capacity and recruiting rules.
//!
//! These are side-effect free predicates evaluated before a mutating request is
//! sent so obviously invalid actions fail fast. The server enforces the same
//! rules; passing them here never guarantees the server will accept.

use thiserror::Error;

use crate::config::RulesConfig;
use crate::models::{Profile, RecruitRequest, RecruitStatus, Team};

/// Hard limit on team size.
pub const MAX_TEAM_MEMBERS: usize = 5;

/// Default cap on the sum of member scores.
pub const MAX_TEAM_SCORE: i32 = 50;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("only the team leader can do this")]
    NotTeamLeader,
    #[error("this recruit request was sent to someone else")]
    NotRecruitTarget,
    #[error("recruit request is already {0:?}")]
    RequestNotPending(RecruitStatus),
    #[error("team already has {members} members")]
    TeamFull { members: usize },
    #[error("team score would be {projected}, above the cap of {cap}")]
    ScoreCapExceeded { projected: i64, cap: i32 },
    #[error("player already belongs to a team")]
    AlreadyOnTeam,
    #[error("you are not on a team")]
    NotOnTeam,
    #[error("user {0} is not a member of this team")]
    NotAMember(i64),
    #[error("the leader cannot be removed from their own team")]
    CannotKickLeader,
    #[error("team name must not be empty")]
    EmptyTeamName,
    #[error("rejected by server: {0}")]
    RejectedByServer(String),
}

/// Limits a check runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamLimits {
    pub max_score: i32,
}

impl Default for TeamLimits {
    fn default() -> Self {
        Self {
            max_score: MAX_TEAM_SCORE,
        }
    }
}

impl From<&RulesConfig> for TeamLimits {
    fn from(config: &RulesConfig) -> Self {
        Self {
            max_score: config.max_team_score,
        }
    }
}

/// True iff adding the candidate keeps the team at or under `cap`.
pub fn can_afford_recruit(current_team_score: i32, candidate_score: i32, cap: i32) -> bool {
    i64::from(current_team_score) + i64::from(candidate_score) <= i64::from(cap)
}

pub fn member_count(team: &Team) -> usize {
    team.roster_size()
}

/// True iff the team has room for one more member.
pub fn can_recruit(team: &Team) -> bool {
    member_count(team) < MAX_TEAM_MEMBERS
}

fn check_capacity(team: &Team) -> Result<(), RuleViolation> {
    if can_recruit(team) {
        Ok(())
    } else {
        Err(RuleViolation::TeamFull {
            members: member_count(team),
        })
    }
}

fn check_score(team: &Team, candidate_score: i32, limits: TeamLimits) -> Result<(), RuleViolation> {
    let current = team.member_score_sum();
    if can_afford_recruit(current, candidate_score, limits.max_score) {
        Ok(())
    } else {
        Err(RuleViolation::ScoreCapExceeded {
            projected: i64::from(current) + i64::from(candidate_score),
            cap: limits.max_score,
        })
    }
}

fn check_pending(request: &RecruitRequest) -> Result<(), RuleViolation> {
    if request.is_actionable() {
        Ok(())
    } else {
        Err(RuleViolation::RequestNotPending(request.status))
    }
}

/// A leader invites `candidate` into `team`.
pub fn check_send_recruit(
    actor: &Profile,
    team: &Team,
    candidate: &Profile,
    limits: TeamLimits,
) -> Result<(), RuleViolation> {
    if !actor.is_team_leader || !team.is_led_by(actor.id) {
        return Err(RuleViolation::NotTeamLeader);
    }
    if candidate.has_team() || team.has_member(candidate.id) {
        return Err(RuleViolation::AlreadyOnTeam);
    }
    check_capacity(team)?;
    check_score(team, candidate.score, limits)
}

/// The invited player accepts; the team in the request must still have room.
pub fn check_accept_recruit(
    actor: &Profile,
    request: &RecruitRequest,
    limits: TeamLimits,
) -> Result<(), RuleViolation> {
    if request.target_user.id != actor.id {
        return Err(RuleViolation::NotRecruitTarget);
    }
    check_pending(request)?;
    check_capacity(&request.team)?;
    check_score(&request.team, actor.score, limits)
}

pub fn check_reject_recruit(actor: &Profile, request: &RecruitRequest) -> Result<(), RuleViolation> {
    if request.target_user.id != actor.id {
        return Err(RuleViolation::NotRecruitTarget);
    }
    check_pending(request)
}

pub fn check_kick(actor: &Profile, team: &Team, user_id: i64) -> Result<(), RuleViolation> {
    if !team.is_led_by(actor.id) {
        return Err(RuleViolation::NotTeamLeader);
    }
    if user_id == team.leader.id {
        return Err(RuleViolation::CannotKickLeader);
    }
    if !team.has_member(user_id) {
        return Err(RuleViolation::NotAMember(user_id));
    }
    Ok(())
}

pub fn check_leave(actor: &Profile) -> Result<(), RuleViolation> {
    if actor.has_team() {
        Ok(())
    } else {
        Err(RuleViolation::NotOnTeam)
    }
}

pub fn check_create_team(actor: &Profile, name: &str) -> Result<(), RuleViolation> {
    if actor.has_team() {
        return Err(RuleViolation::AlreadyOnTeam);
    }
    if name.trim().is_empty() {
        return Err(RuleViolation::EmptyTeamName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recruit::fixtures::{pending_request, target};
    use crate::models::team::fixtures::team_with_scores;
    use crate::models::user::fixtures::profile;

    #[test]
    fn afford_boundaries() {
        assert!(can_afford_recruit(40, 15, 55));
        assert!(can_afford_recruit(35, 15, 50));
        assert!(can_afford_recruit(40, 10, 50));
        assert!(!can_afford_recruit(45, 15, 50));
        assert!(!can_afford_recruit(48, 5, 50));
        assert!(!can_afford_recruit(i32::MAX, 1, i32::MAX));
    }

    #[test]
    fn capacity_boundary() {
        assert!(can_recruit(&team_with_scores(1, &[1, 1, 1, 1])));
        assert!(!can_recruit(&team_with_scores(1, &[1, 1, 1, 1, 1])));
    }

    #[test]
    fn leader_can_send_within_limits() {
        let team = team_with_scores(1, &[10, 10]);
        let leader = team.leader.clone();
        let candidate = profile(9, 20);
        assert_eq!(
            check_send_recruit(&leader, &team, &candidate, TeamLimits::default()),
            Ok(())
        );
    }

    #[test]
    fn non_leader_cannot_send() {
        let team = team_with_scores(1, &[10, 10]);
        let member = team.members[1].clone();
        let candidate = profile(9, 5);
        assert_eq!(
            check_send_recruit(&member, &team, &candidate, TeamLimits::default()),
            Err(RuleViolation::NotTeamLeader)
        );
    }

    #[test]
    fn send_respects_capacity_and_cap() {
        let full = team_with_scores(1, &[1, 1, 1, 1, 1]);
        let candidate = profile(9, 1);
        assert_eq!(
            check_send_recruit(&full.leader, &full, &candidate, TeamLimits::default()),
            Err(RuleViolation::TeamFull { members: 5 })
        );

        let heavy = team_with_scores(1, &[30, 15]);
        let candidate = profile(9, 10);
        assert_eq!(
            check_send_recruit(&heavy.leader, &heavy, &candidate, TeamLimits::default()),
            Err(RuleViolation::ScoreCapExceeded {
                projected: 55,
                cap: 50
            })
        );
    }

    #[test]
    fn cannot_recruit_someone_on_a_team() {
        let team = team_with_scores(1, &[10]);
        let mut candidate = profile(9, 1);
        candidate.team_name = Some("Blue".into());
        assert_eq!(
            check_send_recruit(&team.leader, &team, &candidate, TeamLimits::default()),
            Err(RuleViolation::AlreadyOnTeam)
        );
    }

    #[test]
    fn accept_over_cap_is_rejected() {
        let me = target(42, 5);
        let request = pending_request(1, &[20, 20, 8], me.clone());
        assert_eq!(request.team.member_score_sum(), 48);
        assert_eq!(
            check_accept_recruit(&me, &request, TeamLimits::default()),
            Err(RuleViolation::ScoreCapExceeded {
                projected: 53,
                cap: 50
            })
        );
    }

    #[test]
    fn accept_requires_being_the_target() {
        let me = target(42, 1);
        let someone_else = target(43, 1);
        let request = pending_request(1, &[10], someone_else);
        assert_eq!(
            check_accept_recruit(&me, &request, TeamLimits::default()),
            Err(RuleViolation::NotRecruitTarget)
        );
        assert_eq!(
            check_reject_recruit(&me, &request),
            Err(RuleViolation::NotRecruitTarget)
        );
    }

    #[test]
    fn terminal_requests_are_not_actionable() {
        let me = target(42, 1);
        let mut request = pending_request(1, &[10], me.clone());
        request.status = RecruitStatus::Accepted;
        assert_eq!(
            check_accept_recruit(&me, &request, TeamLimits::default()),
            Err(RuleViolation::RequestNotPending(RecruitStatus::Accepted))
        );
        assert_eq!(
            check_reject_recruit(&me, &request),
            Err(RuleViolation::RequestNotPending(RecruitStatus::Accepted))
        );
    }

    #[test]
    fn rejecting_ignores_capacity() {
        let me = target(42, 30);
        let request = pending_request(1, &[10, 10, 10, 10, 10], me.clone());
        assert_eq!(check_reject_recruit(&me, &request), Ok(()));
    }

    #[test]
    fn kick_rules() {
        let team = team_with_scores(1, &[10, 10, 10]);
        let leader = team.leader.clone();
        assert_eq!(check_kick(&leader, &team, 2), Ok(()));
        assert_eq!(
            check_kick(&leader, &team, 1),
            Err(RuleViolation::CannotKickLeader)
        );
        assert_eq!(
            check_kick(&leader, &team, 7),
            Err(RuleViolation::NotAMember(7))
        );
        assert_eq!(
            check_kick(&team.members[1], &team, 3),
            Err(RuleViolation::NotTeamLeader)
        );
    }

    #[test]
    fn create_and_leave_rules() {
        let free = profile(1, 10);
        assert_eq!(check_create_team(&free, "Red"), Ok(()));
        assert_eq!(
            check_create_team(&free, "   "),
            Err(RuleViolation::EmptyTeamName)
        );
        assert_eq!(check_leave(&free), Err(RuleViolation::NotOnTeam));

        let mut taken = profile(2, 10);
        taken.team_name = Some("Red".into());
        assert_eq!(
            check_create_team(&taken, "Blue"),
            Err(RuleViolation::AlreadyOnTeam)
        );
        assert_eq!(check_leave(&taken), Ok(()));
    }

    #[test]
    fn limits_follow_config() {
        let limits = TeamLimits::from(&RulesConfig { max_team_score: 60 });
        assert_eq!(limits.max_score, 60);
    }
}
