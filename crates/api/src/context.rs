use taskflow_auth::Principal;

/// Per-request authentication context.
///
/// Inserted by the principal middleware on every request; `None` means the
/// caller is anonymous. Handlers pass it down explicitly to the services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    principal: Option<Principal>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}
