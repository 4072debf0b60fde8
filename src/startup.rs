//! Application startup and command execution.
//!
//! Builds the shared state, restores any persisted session, lets the guard
//! decide whether the command's page may be shown, then runs the command.
//! The guard keeps watching while the command runs; if it redirects, the
//! command's view is unmounted and its remaining output is dropped.

use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::join;
use tracing::{debug, info, warn};

use crate::cli::{joined, Command};
use crate::config::ConfigV1;
use crate::error::{Error, Result};
use crate::guard::{AuthGuard, GuardDecision, Navigator, Route};
use crate::models::{LoginRequest, Profile, RecruitList, RiotAccountRequest, Team, UserQuery};
use crate::session::SessionState;
use crate::state::AppState;
use crate::views::{MountGuard, ViewHandle};

/// Remembers where the guard sent us so the command can report it.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn replace(&self, route: Route) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(route);
        }
    }
}

/// What happened to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ran,
    Redirected(Route),
    ConnectionError,
}

/// Builds the application state and runs one command against it.
pub async fn run(config: Arc<ConfigV1>, command: Command) -> Result<Outcome> {
    let state = AppState::new(config)?;
    execute(&state, command).await
}

pub async fn execute(state: &AppState, command: Command) -> Result<Outcome> {
    match state.auth.restore().await {
        Ok(s) => debug!(state = ?s, "session restored"),
        Err(Error::Connectivity(_)) => {}
        Err(e) => warn!("Restoring the session failed: {}", e),
    }
    if state.auth.expire_if_stale().await? {
        info!("Session token lapsed; signed out");
    }

    let view = ViewHandle::mount(command.name());
    let mounted = view.guard();

    let Some(route) = command.route() else {
        info!(command = command.name(), "running command");
        run_command(state, command, &mounted).await?;
        return Ok(Outcome::Ran);
    };

    let navigator = Arc::new(RecordingNavigator::default());
    let mut guard = AuthGuard::new(
        state.session.subscribe(),
        navigator.clone(),
        state.config.session.guard_loading_timeout(),
        route,
    );
    match guard.settle().await {
        GuardDecision::Render => {}
        GuardDecision::Redirect(target) => {
            report_redirect(target);
            return Ok(Outcome::Redirected(target));
        }
        GuardDecision::ConnectionError | GuardDecision::Loading => {
            println!("Could not reach the league server. Run `leaguedesk retry` to try again.");
            return Ok(Outcome::ConnectionError);
        }
    }
    guard.attach(view);

    info!(command = command.name(), "running command");
    let running = run_command(state, command, &mounted);
    tokio::pin!(running);
    // the guard keeps watching the session while the command's requests are out
    let result = loop {
        tokio::select! {
            result = &mut running => break result,
            alive = guard.changed() => {
                if !alive {
                    break (&mut running).await;
                }
                guard.evaluate();
            }
        }
    };
    guard.evaluate();

    if !mounted.is_mounted() {
        // finishing the link is what moves the guard on from the link page
        if route == Route::LinkGameAccount && guard.route() == Route::Home && result.is_ok() {
            return Ok(Outcome::Ran);
        }
        if let Err(e) = &result {
            debug!("command abandoned after the session changed: {}", e);
        }
        report_redirect(guard.route());
        return Ok(Outcome::Redirected(guard.route()));
    }
    result?;
    Ok(Outcome::Ran)
}

/// Awaits `fut` for the command's view; `None` once the view is gone.
async fn shown<T, F>(view: &MountGuard, fut: F) -> Result<Option<T>>
where
    F: Future<Output = Result<T>>,
{
    view.deliver(fut).await.transpose()
}

fn report_redirect(target: Route) {
    match target {
        Route::Login => println!("Not signed in. Run `leaguedesk login <account> <password>`."),
        Route::LinkGameAccount => {
            println!("Link your game account first: `leaguedesk link <gameName> <tagLine>`.")
        }
        other => println!("Nothing to do here; go to {} instead.", other),
    }
}

async fn run_command(state: &AppState, command: Command, view: &MountGuard) -> Result<()> {
    let league = &state.league;
    match command {
        Command::Status => {
            let Some((team, pending)) = view
                .deliver(join(league.my_team(), league.pending_requests()))
                .await
            else {
                return Ok(());
            };
            if let Some(profile) = state.auth.profile() {
                print_profile(&profile);
            }
            match team? {
                Some(team) => print_team(&team),
                None => println!("Not on a team."),
            }
            print_requests(&pending?);
        }
        Command::Login {
            account_id,
            password,
        } => {
            let next = state
                .auth
                .login(&LoginRequest {
                    account_id,
                    password,
                })
                .await?;
            print_session_state(next);
        }
        Command::Link {
            game_name,
            tag_line,
        } => {
            let request = RiotAccountRequest {
                game_name,
                tag_line,
                summoner_name: None,
            };
            // linking is what changes the session, so its result is shown either way
            print_session_state(state.auth.link_game_account(&request).await?);
        }
        Command::Logout => {
            state.auth.logout().await?;
            println!("Signed out.");
        }
        Command::Retry => {
            let next = match state.auth.state() {
                SessionState::Unreachable => state.auth.retry().await?,
                other => other,
            };
            print_session_state(next);
        }
        Command::Teams => {
            let Some(list) = shown(view, league.teams()).await? else {
                return Ok(());
            };
            for team in list.teams {
                println!(
                    "{:>4}  {:<20} {}/5  score {}",
                    team.id,
                    team.name,
                    team.roster_size(),
                    team.member_score_sum()
                );
            }
        }
        Command::Team { id } => {
            if let Some(team) = shown(view, league.team(id)).await? {
                print_team(&team);
            }
        }
        Command::MyTeam => match shown(view, league.my_team()).await? {
            Some(Some(team)) => print_team(&team),
            Some(None) => println!("Not on a team."),
            None => {}
        },
        Command::Players => {
            let query = UserQuery::default();
            let Some(list) = shown(view, league.available_users(&query)).await? else {
                return Ok(());
            };
            let mut players = list.users;
            players.sort_by(|a, b| b.standing().cmp(&a.standing()));
            for player in &players {
                print_player(player);
            }
        }
        Command::Pending => {
            if let Some(list) = shown(view, league.pending_requests()).await? {
                print_requests(&list);
            }
        }
        Command::TeamRequests => {
            if let Some(list) = shown(view, league.team_requests()).await? {
                print_requests(&list);
            }
        }
        Command::CreateTeam { name } => {
            let name = joined(&name).unwrap_or_default();
            if let Some(team) = shown(view, league.create_team(&name)).await? {
                println!("Created team {} ({}).", team.name, team.id);
            }
        }
        Command::Recruit { user_id, message } => {
            let candidate = find_player(state, user_id).await?;
            let sent = shown(view, league.send_recruit(&candidate, joined(&message))).await?;
            if let Some(request) = sent {
                println!(
                    "Invited {} (request {}).",
                    request.target_user.display_name, request.id
                );
            }
        }
        Command::Accept { request_id } => respond(state, view, request_id, true).await?,
        Command::Reject { request_id } => respond(state, view, request_id, false).await?,
        Command::Leave => {
            if let Some(message) = shown(view, league.leave_team()).await? {
                println!("{}", message);
            }
        }
        Command::Kick { user_id } => {
            if let Some(message) = shown(view, league.kick_member(user_id)).await? {
                println!("{}", message);
            }
        }
    }
    Ok(())
}

async fn respond(state: &AppState, view: &MountGuard, request_id: i64, accept: bool) -> Result<()> {
    let request = state
        .league
        .pending_requests()
        .await?
        .requests
        .into_iter()
        .find(|r| r.id == request_id)
        .ok_or_else(|| Error::Rejected(format!("no pending request with id {}", request_id)))?;
    if let Some(message) = shown(view, state.league.respond(&request, accept)).await? {
        println!("{}", message);
    }
    Ok(())
}

/// Looks a player up among free agents first, then among everyone.
async fn find_player(state: &AppState, user_id: i64) -> Result<Profile> {
    let query = UserQuery::default();
    let free = state.league.available_users(&query).await?.users;
    if let Some(player) = free.into_iter().find(|p| p.id == user_id) {
        return Ok(player);
    }
    state
        .league
        .users(&query)
        .await?
        .users
        .into_iter()
        .find(|p| p.id == user_id)
        .ok_or_else(|| Error::Rejected(format!("no player with id {}", user_id)))
}

fn print_session_state(state: SessionState) {
    match state {
        SessionState::AuthenticatedComplete => println!("Signed in."),
        SessionState::AuthenticatedIncomplete => {
            println!("Signed in. Link your game account with `leaguedesk link <gameName> <tagLine>`.")
        }
        SessionState::Unreachable => {
            println!("Signed in, but the profile could not be loaded. Run `leaguedesk retry`.")
        }
        other => println!("Session is {:?}.", other),
    }
}

fn standing_label(profile: &Profile) -> String {
    profile
        .standing()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unranked".to_string())
}

fn print_profile(profile: &Profile) {
    println!(
        "{} ({})  {}  score {}",
        profile.display_name,
        profile
            .linked_game_account_name
            .as_deref()
            .unwrap_or("no game account"),
        standing_label(profile),
        profile.score
    );
}

fn print_player(profile: &Profile) {
    println!(
        "{:>4}  {:<16} {:<16} score {}",
        profile.id,
        profile.display_name,
        standing_label(profile),
        profile.score
    );
}

fn print_team(team: &Team) {
    println!(
        "{} ({})  {}/5 members  score {}",
        team.name,
        team.id,
        team.roster_size(),
        team.member_score_sum()
    );
    for member in &team.members {
        let marker = if team.is_led_by(member.id) { "*" } else { " " };
        print!("{}", marker);
        print_player(member);
    }
}

fn print_requests(list: &RecruitList) {
    if list.requests.is_empty() {
        println!("No recruit requests.");
        return;
    }
    for request in &list.requests {
        println!(
            "{:>4}  {} -> {}  {:?}{}",
            request.id,
            request.team.name,
            request.target_user.display_name,
            request.status,
            request
                .message
                .as_deref()
                .map(|m| format!("  \"{}\"", m))
                .unwrap_or_default()
        );
    }
}
