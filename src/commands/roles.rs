/// `roles` command: list the accepted `--role` values.
use crate::cli::OutputCtx;
use crate::cli::output::write_roles;
use crate::mastr::Role;
use crate::types::RoleOutput;

/// Run `mastr-fetch roles`. Needs no credentials.
pub fn run(ctx: &OutputCtx) {
    let roles: Vec<RoleOutput> = Role::ALL.into_iter().map(RoleOutput::from).collect();
    write_roles(&roles, ctx);
}
