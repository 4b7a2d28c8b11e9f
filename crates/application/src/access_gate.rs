use quicklink_core::{AppResult, Principal};
use quicklink_domain::{AccessDenial, AccessRequirement, Authorization};
use tracing::debug;

use crate::{AdminContext, AuthorizationService};

/// Result of an access gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is granted; carries the context the check was made against.
    Granted(Box<AdminContext>),
    /// Access is denied with a displayable reason.
    Denied(AccessDenial),
}

/// Request-time guard composing authentication, account status and permissions.
///
/// Checks run in order and the first failure wins: authentication, then
/// account status, then the requirement itself. A check never writes.
#[derive(Clone)]
pub struct AccessGate {
    authorization_service: AuthorizationService,
}

impl AccessGate {
    /// Creates a gate over the provided authorization service.
    #[must_use]
    pub fn new(authorization_service: AuthorizationService) -> Self {
        Self {
            authorization_service,
        }
    }

    /// Evaluates the requirement for the principal.
    ///
    /// Store failures are returned as errors, never as denials.
    pub async fn check_access(
        &self,
        principal: &Principal,
        requirement: AccessRequirement,
    ) -> AppResult<AccessDecision> {
        if !principal.is_authenticated() {
            return Ok(AccessDecision::Denied(AccessDenial::unauthenticated(
                "sign in to continue",
            )));
        }

        let Some(context) = self.authorization_service.load_context(principal).await? else {
            return Ok(AccessDecision::Denied(AccessDenial::unauthenticated(
                "no admin account is registered for this sign-in",
            )));
        };

        if !context.account.is_active() {
            return Ok(AccessDecision::Denied(AccessDenial::account_inactive(
                context.account.status,
            )));
        }

        if let Some(denial) = requirement_denial(&context, requirement) {
            debug!(
                admin_id = %context.account.id,
                reason = %denial.message,
                "access gate denied request"
            );
            return Ok(AccessDecision::Denied(denial));
        }

        Ok(AccessDecision::Granted(Box::new(context)))
    }

    /// Evaluates the requirement and converts denials into `AppError`.
    pub async fn require(
        &self,
        principal: &Principal,
        requirement: AccessRequirement,
    ) -> AppResult<AdminContext> {
        match self.check_access(principal, requirement).await? {
            AccessDecision::Granted(context) => Ok(*context),
            AccessDecision::Denied(denial) => Err(denial.into()),
        }
    }
}

fn requirement_denial(
    context: &AdminContext,
    requirement: AccessRequirement,
) -> Option<AccessDenial> {
    match requirement {
        AccessRequirement::Authenticated => None,
        AccessRequirement::MaxLevel { level } => match context.role.as_ref() {
            None => Some(AccessDenial::insufficient_permission(
                "your account has no role assigned",
            )),
            Some(role) if role.level() > level => {
                Some(AccessDenial::insufficient_permission(format!(
                    "this area requires a role at level {level} or above; your role '{}' is level {}",
                    role.display_name(),
                    role.level()
                )))
            }
            Some(_) => None,
        },
        AccessRequirement::Permission { resource, action } => {
            match context.authorize(resource, action) {
                Authorization::Allowed { .. } => None,
                Authorization::Denied { reason } => {
                    Some(AccessDenial::insufficient_permission(reason))
                }
            }
        }
    }
}
