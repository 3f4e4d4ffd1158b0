//! clubctl - command-line companion for the club ledger
//!
//! - validate and print the effective configuration
//! - look up the level for a points balance
//! - evaluate role hierarchy predicates

use anyhow::Context;
use clap::{Parser, Subcommand};
use club_roles::RoleHierarchy;
use club_service::{init_tracing, ClubConfig};
use club_types::Role;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "clubctl")]
#[command(about = "Inspect club configuration and evaluate role and level rules", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CLUB_CONFIG", default_value = "club.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate and print the effective configuration
    Config,

    /// Show the level for a points balance
    Level {
        #[arg(allow_negative_numbers = true)]
        points: i64,
    },

    /// Evaluate role hierarchy rules
    Roles {
        #[command(subcommand)]
        command: RoleCommands,
    },
}

#[derive(Subcommand, Debug)]
enum RoleCommands {
    /// Roles the given role may assign
    Assignable { role: Role },

    /// Whether `actor` may change the role of a member holding `target`
    CanManage { actor: Role, target: Role },

    /// Whether `actor` may record contributions for a member holding `target`
    CanRecord { actor: Role, target: Role },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ClubConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    debug!(path = %cli.config.display(), "Configuration loaded");

    let output = execute(&cli.command, &config)?;
    print!("{output}");
    Ok(())
}

fn execute(command: &Commands, config: &ClubConfig) -> anyhow::Result<String> {
    config.validate().context("invalid configuration")?;
    let mut out = String::new();

    match command {
        Commands::Config => {
            out.push_str(&config.to_toml_string()?);
        }
        Commands::Level { points } => {
            let levels = config.level_table()?;
            let level = levels.level_of(*points);
            match levels.points_to_next(*points) {
                Some((next, missing)) => {
                    writeln!(out, "{level} ({missing} points to {next})")?;
                }
                None => writeln!(out, "{level} (top tier)")?,
            }
        }
        Commands::Roles { command } => {
            let hierarchy = config.role_hierarchy()?;
            roles(command, &hierarchy, &mut out)?;
        }
    }

    Ok(out)
}

fn roles(command: &RoleCommands, hierarchy: &RoleHierarchy, out: &mut String) -> anyhow::Result<()> {
    match command {
        RoleCommands::Assignable { role } => {
            hierarchy.rank_of(*role)?;
            let assignable = hierarchy.assignable_roles(*role);
            if assignable.is_empty() {
                writeln!(out, "{role} cannot assign any role")?;
            }
            for assignable in assignable {
                writeln!(out, "{assignable}")?;
            }
        }
        RoleCommands::CanManage { actor, target } => {
            writeln!(out, "{}", yes_no(hierarchy.can_manage_role(*actor, *target)))?;
        }
        RoleCommands::CanRecord { actor, target } => {
            writeln!(
                out,
                "{}",
                yes_no(hierarchy.can_record_contribution_for(*actor, *target))
            )?;
        }
    }
    Ok(())
}

fn yes_no(answer: bool) -> &'static str {
    if answer {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn run(args: &[&str]) -> String {
        let cli = Cli::try_parse_from(std::iter::once("clubctl").chain(args.iter().copied())).unwrap();
        execute(&cli.command, &ClubConfig::default()).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn level_lookup() {
        assert_eq!(run(&["level", "80"]), "Silver (20 points to Gold)\n");
        assert_eq!(run(&["level", "250"]), "Platinum (top tier)\n");
    }

    #[test]
    fn assignable_roles_for_admin_exclude_admin() {
        let out = run(&["roles", "assignable", "admin"]);
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec!["member", "senior_executive", "treasurer", "vice_president", "president"]
        );
        assert_eq!(
            run(&["roles", "assignable", "member"]),
            "member cannot assign any role\n"
        );
    }

    #[test]
    fn predicates() {
        assert_eq!(run(&["roles", "can-manage", "treasurer", "treasurer"]), "no\n");
        assert_eq!(run(&["roles", "can-manage", "president", "treasurer"]), "yes\n");
        assert_eq!(run(&["roles", "can-record", "senior_executive", "treasurer"]), "no\n");
    }

    #[test]
    fn unknown_role_is_a_parse_error() {
        assert!(Cli::try_parse_from(["clubctl", "roles", "assignable", "chancellor"]).is_err());
    }

    #[test]
    fn config_prints_toml() {
        assert!(run(&["config"]).contains("[ledger]"));
    }
}
