//! Operator bootstrap for the first overlord.
//!
//! Either grants overlord+admin to a known account id immediately, or arms
//! the pending-promotion marker so a username is promoted the first time the
//! bot sees them.

use clap::Parser;
use std::path::PathBuf;

use roombot::pending::{PendingPromotion, PENDING_FILE};
use roombot::roles::{RoleRegistry, ADMINS_FILE, OVERLORDS_FILE};

#[derive(Parser, Debug)]
#[command(name = "seed-roles", version, about)]
struct Args {
    /// Directory holding the persisted JSON collections
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Grant overlord+admin to this account id right away
    #[arg(long, conflicts_with = "username")]
    user_id: Option<String>,

    /// Arm the pending-promotion marker for this display name
    #[arg(long)]
    username: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();

    match (args.user_id, args.username) {
        (Some(user_id), _) => {
            let mut roles = RoleRegistry::load(&args.data_dir);
            roles.promote(&user_id);
            println!("Granted overlord and admin to account id '{}'.", user_id);
            println!(
                "Wrote {} and {}.",
                args.data_dir.join(ADMINS_FILE).display(),
                args.data_dir.join(OVERLORDS_FILE).display()
            );
        }
        (None, Some(username)) => {
            PendingPromotion::arm(
                &args.data_dir,
                &username,
                "promote to overlord on first sighting",
            );
            println!(
                "Armed pending promotion for '{}' in {}.",
                username,
                args.data_dir.join(PENDING_FILE).display()
            );
            println!("The bot will promote them the first time they join or chat.");
        }
        (None, None) => {
            return Err("pass --user-id <id> or --username <name>".into());
        }
    }
    Ok(())
}
