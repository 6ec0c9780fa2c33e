use crate::Error;
use hearth_core::{
    config::HearthConfig,
    db::{
        access::{
            AccessContributor, AccessFilterChain, AccessPolicyContext, Account, PermissionChecker,
        },
        buffer::EntityBuffer,
        connection::{
            Connection, ConnectionDefinition, ConnectionQueryHelper, ConnectionRegistry,
            ConnectionTarget, PaginationArgs, PendingConnection,
        },
        search::SearchQuery,
        store::EntityStore,
    },
    obs::AccessOutcome,
};

///
/// Hearth
///
/// Process-wide runtime: validated configuration, the registered
/// connections, and the search access chain. Build once at startup.
///

pub struct Hearth {
    config: HearthConfig,
    registry: ConnectionRegistry,
    access: AccessFilterChain,
}

impl Hearth {
    pub fn from_config(config: HearthConfig) -> Result<Self, Error> {
        config.validate()?;

        let registry = ConnectionRegistry::from_config(&config.connections)?;
        let access = AccessFilterChain::from_config(&config.access);

        tracing::info!(
            connections = config.connections.len(),
            bundles = config.access.bundles.len(),
            "hearth runtime configured"
        );

        Ok(Self {
            config,
            registry,
            access,
        })
    }

    pub fn from_toml_str(input: &str) -> Result<Self, Error> {
        Self::from_config(HearthConfig::from_toml_str(input)?)
    }

    /// Register a connection defined in code rather than configuration.
    pub fn register(&mut self, definition: ConnectionDefinition) -> Result<(), Error> {
        self.registry.register(definition)?;

        Ok(())
    }

    /// Append a contributor to the search access chain.
    #[must_use]
    pub fn with_access_contributor(mut self, contributor: impl AccessContributor + 'static) -> Self {
        self.access = self.access.with(contributor);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &HearthConfig {
        &self.config
    }

    #[must_use]
    pub const fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Open a request scope for one account against one store.
    #[must_use]
    pub fn request<'s, S: EntityStore>(&self, store: &'s S, account: Account) -> Request<'_, 's, S> {
        Request {
            hearth: self,
            buffer: EntityBuffer::new(store),
            account,
        }
    }

    /// Restrict a search query to content `account` may see.
    pub fn secure_search(
        &self,
        query: &mut SearchQuery,
        account: &Account,
        permissions: &dyn PermissionChecker,
    ) -> Vec<(&'static str, AccessOutcome)> {
        self.access
            .apply(query, &AccessPolicyContext::new(account, permissions))
    }
}

///
/// Request
///
/// One request's scope: the viewing account and the entity buffer every
/// connection resolved in this request shares.
///

pub struct Request<'h, 's, S: EntityStore> {
    hearth: &'h Hearth,
    buffer: EntityBuffer<'s, S>,
    account: Account,
}

impl<'s, S: EntityStore> Request<'_, 's, S> {
    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    #[must_use]
    pub const fn buffer(&self) -> &EntityBuffer<'s, S> {
        &self.buffer
    }

    /// Run a connection's id query and queue its page for loading.
    pub fn prepare(
        &self,
        connection: &str,
        target: ConnectionTarget,
        args: &PaginationArgs,
    ) -> Result<PendingConnection, Error> {
        let definition = self.hearth.registry.get(connection)?;
        let helper = ConnectionQueryHelper::new(
            definition,
            target,
            &args.sort_key,
            Some(self.account.clone()),
        )?;
        let window = args.window(&self.hearth.config.pagination)?;

        Ok(helper.prepare(&self.buffer, &window)?)
    }

    /// Load a prepared page. Pages prepared earlier in the request share
    /// one store call per entity type.
    pub fn finish(&self, pending: PendingConnection) -> Result<Connection<S::Entity>, Error> {
        Ok(pending.finish(&self.buffer)?)
    }

    pub fn connection(
        &self,
        connection: &str,
        target: ConnectionTarget,
        args: &PaginationArgs,
    ) -> Result<Connection<S::Entity>, Error> {
        let pending = self.prepare(connection, target, args)?;

        self.finish(pending)
    }
}
