use finledger_domain::OwnerId;

/// Resolves the owner every engine call acts on behalf of.
pub trait Session {
    /// `None` when nobody is signed in.
    fn owner(&self) -> Option<OwnerId>;
}

/// A session whose owner is fixed up front, e.g. from the environment in script mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticSession {
    owner: Option<OwnerId>,
}

impl StaticSession {
    pub fn authenticated(owner: OwnerId) -> Self {
        Self { owner: Some(owner) }
    }

    pub fn anonymous() -> Self {
        Self { owner: None }
    }
}

impl Session for StaticSession {
    fn owner(&self) -> Option<OwnerId> {
        self.owner
    }
}
