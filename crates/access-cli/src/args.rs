//! CLI argument definitions using clap
//!
//! - rbac init                      # Create the assignment storage
//! - rbac assign <role> <uid>       # Assign a role to a user
//! - rbac revoke <role> <uid>       # Revoke a role from a user
//! - rbac empty                     # Delete all assignments
//! - rbac check <uid> <permission>  # Resolve a permission

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use access_rbac::config::DEFAULT_ASSIGNMENT_FILE;

#[derive(Debug, Parser)]
#[command(name = "rbac")]
#[command(about = "Manage role and permission assignments")]
#[command(version)]
pub struct Cli {
    /// Hierarchy definition file (JSON or YAML)
    #[arg(long, global = true, env = "RBAC_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Assignment storage file
    #[arg(long, global = true, env = "RBAC_ASSIGNMENT_FILE", default_value = DEFAULT_ASSIGNMENT_FILE)]
    pub assignment_file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the assignment storage if it does not exist
    Init,

    /// Assign a role to a user
    Assign {
        /// Role (or permission) name
        role: String,
        /// User identifier
        uid: String,
        /// Identifier of the granting actor
        #[arg(long = "by")]
        created_by: Option<String>,
    },

    /// Revoke a role from a user (`*` revokes every role of the user)
    Revoke {
        /// Role (or permission) name
        role: String,
        /// User identifier
        uid: String,
    },

    /// Delete all assignments of all users
    Empty {
        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Check whether a user holds a permission
    Check {
        /// User identifier
        uid: String,
        /// Permission name
        permission: String,
        /// Authenticated caller, for the `@` and `!` pseudo-permissions
        #[arg(long = "caller")]
        caller: Option<String>,
        /// Context entries passed to rules, as key=value (value parsed as JSON when possible)
        #[arg(short = 'c', long = "context", value_name = "KEY=VALUE")]
        context: Vec<String>,
    },

    /// List role names
    Roles,

    /// List all items with their links
    Items {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the assignments of a user
    Assignments {
        /// User identifier
        uid: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assign() {
        let cli = Cli::try_parse_from([
            "rbac", "--data-file", "rbac.json", "assign", "admin", "u1", "--by", "root",
        ])
        .unwrap();

        assert_eq!(cli.data_file, Some(PathBuf::from("rbac.json")));
        match cli.command {
            Commands::Assign { role, uid, created_by } => {
                assert_eq!(role, "admin");
                assert_eq!(uid, "u1");
                assert_eq!(created_by.as_deref(), Some("root"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_check_with_context() {
        let cli = Cli::try_parse_from([
            "rbac", "check", "u1", "dept/123", "-c", "dept=123", "--context", "site=main",
        ])
        .unwrap();

        match cli.command {
            Commands::Check { context, caller, .. } => {
                assert_eq!(context, vec!["dept=123", "site=main"]);
                assert!(caller.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["rbac", "empty", "--yes", "--assignment-file", "a.json"]).unwrap();
        assert_eq!(cli.assignment_file, PathBuf::from("a.json"));
        assert!(matches!(cli.command, Commands::Empty { yes: true }));
    }

    #[test]
    fn test_assign_requires_uid() {
        assert!(Cli::try_parse_from(["rbac", "assign", "admin"]).is_err());
    }
}
