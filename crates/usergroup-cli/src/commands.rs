//! Subcommand implementations.

use anyhow::{bail, Context};
use usergroup_sdk::{
    password_hash, AuthError, ClientConfig, GroupApi, NewGroup, NewUser, SessionManager,
    SessionStore, UserApi,
};

use crate::{Commands, GroupAction, UserAction};

pub async fn run<S: SessionStore>(
    session: &SessionManager<S>,
    config: &ClientConfig,
    command: Commands,
) -> anyhow::Result<()> {
    let url = config.backend_url.as_str();

    match command {
        Commands::Login { username, password } => {
            let acquired = session
                .acquire(url, &username, &password_hash(&password))
                .await
                .with_context(|| format!("login as {username} failed"))?;
            if session.is_session_valid() {
                println!(
                    "Logged in as {} ({}), session valid until {}",
                    acquired.name, acquired.login, acquired.expires_at
                );
            } else {
                println!(
                    "Logged in as {}, but the session could not be kept (expired or no storage)",
                    acquired.login
                );
            }
        }

        Commands::Status => {
            if !session.is_session_valid() {
                println!("No valid local session");
                return Ok(());
            }
            println!("Local session valid for {}", session.current_user_login());
            match session.check_remote_status(url).await {
                Ok(status) => match status.expires_at {
                    Some(exp) => println!("Backend accepts the token until {exp}"),
                    None => println!("Backend accepts the token"),
                },
                Err(AuthError::ServerRejected { status, message, .. }) => {
                    println!("Backend rejects the token ({status}): {message}");
                }
                Err(e) => return Err(e).context("status check failed"),
            }
        }

        Commands::Whoami => {
            let Some(current) = session.current_session() else {
                bail!("not logged in");
            };
            println!("id:          {}", current.user_id);
            println!("login:       {}", current.login);
            println!("name:        {}", current.name);
            println!("email:       {}", current.email);
            if !current.external_id.is_empty() {
                println!("external id: {}", current.external_id);
            }
            println!("admin:       {}", current.is_admin);
            match session.current_user_group_ids() {
                Some(ids) => println!("groups:      {ids:?}"),
                None => println!("groups:      none"),
            }
            println!("expires:     {}", current.expires_at);
        }

        Commands::Logout => {
            let result = session.logout(url).await;
            println!("Local session cleared");
            result.context("backend logout failed")?;
        }

        Commands::Users { action } => users(session, url, action).await?,
        Commands::Groups { action } => groups(session, url, action).await?,
    }

    Ok(())
}

async fn users<S: SessionStore>(
    session: &SessionManager<S>,
    url: &str,
    action: UserAction,
) -> anyhow::Result<()> {
    let api = UserApi::new(session, url);
    match action {
        UserAction::List => {
            for user in api.list().await? {
                let flags = match (user.is_admin, user.is_locked) {
                    (true, true) => " [admin, locked]",
                    (true, false) => " [admin]",
                    (false, true) => " [locked]",
                    (false, false) => "",
                };
                println!("{:>5}  {:<16} {}{flags}", user.id, user.username, user.name);
            }
        }
        UserAction::Get { id } => {
            println!("{}", serde_json::to_string_pretty(&api.get(id).await?)?);
        }
        UserAction::Create(args) => {
            let created = api
                .create(&NewUser {
                    name: args.name,
                    email: args.email,
                    username: args.username,
                    password_hash: password_hash(&args.password),
                    external_id: args.external_id,
                    is_admin: args.admin,
                })
                .await?;
            println!("Created user {} ({})", created.id, created.username);
        }
        UserAction::Lock { id, unlock } => {
            let mut user = api.get(id).await?;
            user.is_locked = !unlock;
            let user = api.update(&user).await?;
            let state = if user.is_locked { "locked" } else { "unlocked" };
            println!("User {} {state}", user.username);
        }
        UserAction::Delete { id } => {
            api.delete(id).await?;
            println!("Deleted user {id}");
        }
    }
    Ok(())
}

async fn groups<S: SessionStore>(
    session: &SessionManager<S>,
    url: &str,
    action: GroupAction,
) -> anyhow::Result<()> {
    let api = GroupApi::new(session, url);
    match action {
        GroupAction::List => {
            for group in api.list().await? {
                let state = if group.is_active { "" } else { " [inactive]" };
                println!("{:>5}  {}{state}", group.id, group.name);
            }
        }
        GroupAction::Get { id } => {
            println!("{}", serde_json::to_string_pretty(&api.get(id).await?)?);
        }
        GroupAction::Create { name, comment } => {
            let created = api.create(&NewGroup { name, comment }).await?;
            println!("Created group {} ({})", created.id, created.name);
        }
        GroupAction::Deactivate { id, reason } => {
            let mut group = api.get(id).await?;
            group.is_active = false;
            group.inactivation_reason = Some(reason);
            api.update(&group).await?;
            println!("Group {id} deactivated");
        }
        GroupAction::Delete { id } => {
            api.delete(id).await?;
            println!("Deleted group {id}");
        }
    }
    Ok(())
}
