//! Application state wiring all services together.
//!
//! Services are generic over repository/hasher/codec traits; AppState pins
//! them to the concrete infra implementations.

use std::sync::Arc;

use supportdesk_core::chat::gateway::{CompletionGateway, GatewaySettings};
use supportdesk_core::chat::orchestrator::ChatOrchestrator;
use supportdesk_core::chat::store::ConversationStore;
use supportdesk_core::llm::box_provider::BoxCompletionProvider;
use supportdesk_core::service::auth::AuthService;
use supportdesk_infra::crypto::password::Argon2PasswordHasher;
use supportdesk_infra::crypto::token::JwtTokenCodec;
use supportdesk_infra::llm::create_provider;
use supportdesk_infra::sqlite::conversation::SqliteConversationRepository;
use supportdesk_infra::sqlite::pool::DatabasePool;
use supportdesk_infra::sqlite::user::SqliteUserRepository;
use supportdesk_types::config::AppConfig;

use crate::http::middleware::rate_limit::RateLimiters;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAuthService =
    AuthService<SqliteUserRepository, Argon2PasswordHasher, JwtTokenCodec>;

pub type ConcreteChatOrchestrator = ChatOrchestrator<SqliteConversationRepository>;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_service: Arc<ConcreteAuthService>,
    pub chat: Arc<ConcreteChatOrchestrator>,
    pub limiters: Arc<RateLimiters>,
}

impl AppState {
    /// Connect to the database, build the completion provider, wire services.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&config.database.url).await?;
        let provider = create_provider(&config.completion)?;
        Ok(Self::from_parts(
            config,
            db_pool,
            provider,
            Argon2PasswordHasher::new(),
        ))
    }

    /// Wire services from already-built parts.
    pub fn from_parts(
        config: AppConfig,
        db_pool: DatabasePool,
        provider: BoxCompletionProvider,
        hasher: Argon2PasswordHasher,
    ) -> Self {
        let tokens = JwtTokenCodec::new(
            &config.auth.secret,
            config.auth.token_ttl_secs,
            config.auth.issuer.clone(),
        );
        let auth_service = AuthService::new(
            SqliteUserRepository::new(db_pool.clone()),
            hasher,
            tokens,
        );

        let gateway = CompletionGateway::new(provider, GatewaySettings::from(&config.completion));
        let chat = ChatOrchestrator::new(
            ConversationStore::new(SqliteConversationRepository::new(db_pool)),
            Arc::new(gateway),
            config.chat.max_message_chars,
        );

        let limiters = RateLimiters::from_config(&config.rate_limit, config.environment);

        Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
            chat: Arc::new(chat),
            limiters: Arc::new(limiters),
        }
    }
}
